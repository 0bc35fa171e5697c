//! Converting colors for the strip. Patterns draw in full brightness sRGB and the output stage dims and gamma corrects.
use palette::{Hsluv, IsWithinBounds, LinSrgb, chromatic_adaptation::AdaptInto, white_point};
use smart_leds::{RGB8, brightness, gamma};

use crate::logging::warn;

/// TODO: generic input color (and whitepoint)
pub fn convert_color(color: Hsluv<white_point::E, f32>) -> RGB8 {
    let rgb: LinSrgb<f32> = color.adapt_into();

    if !rgb.is_within_bounds() {
        // into_format clamps for us. the spline probably went somewhere strange
        warn!("rgb is out of bounds!");
    }

    let rgb: LinSrgb<u8> = rgb.into_format();

    rgb.into_components().into()
}

/// what actually gets written to the leds. gamma first, then dim
pub fn corrected(frame: &[RGB8], level: u8) -> impl Iterator<Item = RGB8> + '_ {
    brightness(gamma(frame.iter().copied()), level)
}
