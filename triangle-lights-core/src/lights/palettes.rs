//! 16 color palettes with linear blending between entries, and the one palette that slowly drifts for everyone.
use core::time::Duration;

use rand::RngCore;
use smart_leds::{RGB8, colors::BLACK};

use super::Gradient;
use super::math8::{addmod8, blend, nscale8, random8_below, rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette16(pub [RGB8; 16]);

impl Palette16 {
    pub const BLACK: Self = Self([BLACK; 16]);

    pub const OCEAN: Self = Self([
        rgb(0x191970),
        rgb(0x00008B),
        rgb(0x191970),
        rgb(0x000080),
        rgb(0x00008B),
        rgb(0x0000CD),
        rgb(0x2E8B57),
        rgb(0x008080),
        rgb(0x5F9EA0),
        rgb(0x0000FF),
        rgb(0x008B8B),
        rgb(0x6495ED),
        rgb(0x7FFFD4),
        rgb(0x2E8B57),
        rgb(0x00FFFF),
        rgb(0x87CEFA),
    ]);

    pub const LAVA: Self = Self([
        rgb(0x000000),
        rgb(0x800000),
        rgb(0x000000),
        rgb(0x800000),
        rgb(0x8B0000),
        rgb(0x800000),
        rgb(0x8B0000),
        rgb(0x8B0000),
        rgb(0x8B0000),
        rgb(0x8B0000),
        rgb(0xFF0000),
        rgb(0xFFA500),
        rgb(0xFFFFFF),
        rgb(0xFFA500),
        rgb(0xFF0000),
        rgb(0x8B0000),
    ]);

    pub const FOREST: Self = Self([
        rgb(0x006400),
        rgb(0x006400),
        rgb(0x556B2F),
        rgb(0x006400),
        rgb(0x008000),
        rgb(0x228B22),
        rgb(0x6B8E23),
        rgb(0x008000),
        rgb(0x2E8B57),
        rgb(0x66CDAA),
        rgb(0x32CD32),
        rgb(0x9ACD32),
        rgb(0x90EE90),
        rgb(0x7CFC00),
        rgb(0x66CDAA),
        rgb(0x228B22),
    ]);

    pub const PARTY: Self = Self([
        rgb(0x5500AB),
        rgb(0x84007C),
        rgb(0xB5004B),
        rgb(0xE5001B),
        rgb(0xE81700),
        rgb(0xB84700),
        rgb(0xAB7700),
        rgb(0xABAB00),
        rgb(0xAB5500),
        rgb(0xDD2200),
        rgb(0xF2000E),
        rgb(0xC2003E),
        rgb(0x8F0071),
        rgb(0x5F00A1),
        rgb(0x2F00D0),
        rgb(0x0007F9),
    ]);

    pub fn from_gradient(gradient: &Gradient<16>) -> Self {
        Self(gradient.colors)
    }

    /// like FastLED's ColorFromPalette with LINEARBLEND. the top 4 bits pick the entry and the bottom 4 blend toward the next one
    pub fn color_at(&self, index: u8, brightness: u8) -> RGB8 {
        let hi4 = (index >> 4) as usize;
        let lo4 = index & 0x0F;

        let entry = self.0[hi4];

        let color = if lo4 == 0 {
            entry
        } else {
            // the last entry blends back around to the first
            blend(entry, self.0[(hi4 + 1) % 16], lo4 << 4)
        };

        if brightness == 255 {
            color
        } else {
            nscale8(color, brightness)
        }
    }

    /// step every channel one closer to `target`, changing at most `max_changes` channels.
    /// returns how many channels changed. 0 means we already match
    pub fn blend_toward(&mut self, target: &Self, max_changes: u8) -> u8 {
        let mut changes = 0;

        for (current, target) in self.0.iter_mut().zip(target.0.iter()) {
            for (x, t) in [
                (&mut current.r, target.r),
                (&mut current.g, target.g),
                (&mut current.b, target.b),
            ] {
                if changes >= max_changes {
                    return changes;
                }

                if *x < t {
                    *x += 1;
                    changes += 1;
                } else if *x > t {
                    // fade down faster than up
                    *x -= 1;
                    if *x > t {
                        *x = t + (*x - t) / 2;
                    }
                    changes += 1;
                }
            }
        }

        changes
    }
}

impl Default for Palette16 {
    fn default() -> Self {
        Self::BLACK
    }
}

/// how many palettes `gradient_palette` can build
pub const GRADIENT_PALETTE_COUNT: u8 = 3;

/// palettes sampled from the hsluv splines. `i` wraps around
pub fn gradient_palette(i: u8) -> Palette16 {
    let gradient = match i % GRADIENT_PALETTE_COUNT {
        0 => Gradient::new_mermaid(),
        1 => Gradient::new_sunset(),
        _ => Gradient::new_jade_sea(),
    };

    Palette16::from_gradient(&gradient)
}

/// any palette a pattern might pick at random
pub fn random_palette(rng: &mut dyn RngCore) -> Palette16 {
    match random8_below(rng, 5) {
        0 => Palette16::OCEAN,
        1 => Palette16::LAVA,
        2 => Palette16::FOREST,
        3 => Palette16::PARTY,
        _ => gradient_palette(random8_below(rng, GRADIENT_PALETTE_COUNT)),
    }
}

const SECONDS_PER_PALETTE: u64 = 20;
const PALETTE_BLEND_MS: u64 = 40;

/// The current palette slowly blends toward a target palette that changes every 20 seconds.
///
/// This is shared by every pattern that wants the "ambient" colors, so the driver owns it and lends it out in the
/// [`FrameContext`](super::FrameContext). Only one pattern writes to it per frame.
#[derive(Debug)]
pub struct PaletteDrift {
    pub current: Palette16,
    pub target: Palette16,
    target_number: u8,
    last_target_change: Option<Duration>,
    last_blend: Option<Duration>,
}

impl Default for PaletteDrift {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteDrift {
    /// starts black and fades into the first gradient
    pub fn new() -> Self {
        Self {
            current: Palette16::BLACK,
            target: gradient_palette(0),
            target_number: 0,
            last_target_change: None,
            last_blend: None,
        }
    }

    pub fn target_number(&self) -> u8 {
        self.target_number
    }

    pub fn set_target(&mut self, target: Palette16) {
        self.target = target;
    }

    /// change the target every SECONDS_PER_PALETTE and blend toward it every PALETTE_BLEND_MS
    pub fn tick(&mut self, now: Duration, rng: &mut dyn RngCore) {
        match self.last_target_change {
            None => self.last_target_change = Some(now),
            Some(last) if now.saturating_sub(last) >= Duration::from_secs(SECONDS_PER_PALETTE) => {
                self.target_number =
                    addmod8(self.target_number, random8_below(rng, 16), GRADIENT_PALETTE_COUNT);
                self.target = gradient_palette(self.target_number);
                self.last_target_change = Some(now);
            }
            Some(_) => {}
        }

        let blend_due = self.last_blend.is_none_or(|last| {
            now.saturating_sub(last) >= Duration::from_millis(PALETTE_BLEND_MS)
        });

        if blend_due {
            self.current.blend_toward(&self.target, 16);
            self.last_blend = Some(now);
        }
    }
}
