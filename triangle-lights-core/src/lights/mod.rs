//! Patterns draw into a `&mut [RGB8]` frame. The [`PatternRunner`] owns the lifecycle so the patterns only have to draw.
//!
//! Ideas for more patterns:
//! - A perfect game of snake around the triangle using a hamiltonian cycle

mod color_correction;
mod gradient;
mod layout;
pub mod math8;
mod palettes;
mod pattern;
pub mod patterns;
mod pool;
#[cfg(test)]
mod test_driver;

pub use color_correction::{convert_color, corrected};
pub use gradient::Gradient;
pub use layout::StripLayout;
pub use palettes::{GRADIENT_PALETTE_COUNT, Palette16, PaletteDrift, gradient_palette, random_palette};
pub use pattern::{FrameContext, Pattern, PatternRunner, RunState};
pub use pool::{Pool, PoolEntity};
