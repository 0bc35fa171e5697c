//! Everything the driver can play.
mod bits;
mod droplets;
mod pink_flash;
mod smooth_palettes;
mod standing_waves;

use alloc::boxed::Box;

pub use bits::{BitColor, Bits, BitsPreset};
pub use droplets::Droplets;
pub use pink_flash::PinkFlash;
pub use smooth_palettes::SmoothPalettes;
pub use standing_waves::StandingWaves;

use super::Pattern;

pub const PATTERN_NAMES: [&str; 5] = [
    "bits",
    "standing-waves",
    "pink-flash",
    "droplets",
    "smooth-palettes",
];

/// a fresh, not yet started pattern. names are the ones in [`PATTERN_NAMES`]
pub fn pattern_by_name(name: &str) -> Option<Box<dyn Pattern>> {
    let pattern: Box<dyn Pattern> = match name {
        "bits" => Box::new(Bits::new(None)),
        "standing-waves" => Box::new(StandingWaves::new()),
        "pink-flash" => Box::new(PinkFlash::new()),
        "droplets" => Box::new(Droplets::new()),
        "smooth-palettes" => Box::new(SmoothPalettes::new()),
        _ => return None,
    };

    Some(pattern)
}
