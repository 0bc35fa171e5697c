//! Two sine waves with drifting hues, cross faded back and forth. Pink bits run on top.
use alloc::boxed::Box;
use core::time::Duration;

use smart_leds::RGB8;

use super::Bits;
use crate::errors::LightsResult;
use crate::lights::math8::{beatsin8, blend, chsv, mod_wrap, nscale8, random8, random8_below, sin8};
use crate::lights::{FrameContext, Pattern, RunState};

/// pixels per wave
const WAVE_SIZE: usize = 6;
/// hue steps per second
const HUE_DRIFT: f32 = 8.0;
const FADE_OUT: Duration = Duration::from_millis(1_000);

pub struct StandingWaves {
    initial_hue1: u8,
    initial_hue2: u8,
    direction: f32,
    faded_out: bool,
}

impl Default for StandingWaves {
    fn default() -> Self {
        Self::new()
    }
}

impl StandingWaves {
    pub fn new() -> Self {
        Self {
            initial_hue1: 0,
            initial_hue2: 0,
            direction: 1.0,
            faded_out: false,
        }
    }
}

/// waves too dim to see are turned all the way off
#[inline]
fn cutoff(brightness: u8) -> u8 {
    if brightness < 40 { 0 } else { brightness }
}

impl Pattern for StandingWaves {
    fn description(&self) -> &'static str {
        "StandingWaves"
    }

    fn setup(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        self.initial_hue1 = random8(ctx.rng);
        self.initial_hue2 = random8(ctx.rng);
        self.direction = if random8_below(ctx.rng, 2) == 0 { 1.0 } else { -1.0 };
        self.faded_out = false;

        Ok(())
    }

    fn make_sub_pattern(&mut self, _ctx: &mut FrameContext<'_>) -> Option<Box<dyn Pattern>> {
        // pink triangle
        Some(Box::new(Bits::new(Some(0))))
    }

    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState) {
        let started_at = state.started_at().unwrap_or_default();
        let runtime = state.elapsed(ctx.now).unwrap_or_default().as_secs_f32();

        let fade_speed = beatsin8(24, 0, 255, ctx.now, started_at, 0);

        let drift = self.direction * runtime * HUE_DRIFT;
        let hue1 = mod_wrap((self.initial_hue1 as f32 + drift) as isize, 255) as u8;
        let hue2 = mod_wrap((self.initial_hue2 as f32 + drift + 120.0) as isize, 255) as u8;

        let start_blend = (runtime * 255.0).min(255.0) as u8;

        let level = match state.stop_elapsed(ctx.now) {
            None => 255,
            Some(x) if x >= FADE_OUT => {
                self.faded_out = true;
                0
            }
            Some(x) => (255 - x.as_millis() * 255 / FADE_OUT.as_millis()) as u8,
        };

        let sin8_ratio = 255 / WAVE_SIZE;

        for (i, pixel) in frame.iter_mut().enumerate() {
            let offset = (i * sin8_ratio) as u8;

            let brightness1 = cutoff(sin8(offset));
            let brightness2 = cutoff(sin8(offset.wrapping_add(0x7F)));

            let c1 = chsv(hue1, 255, brightness1);
            let c2 = chsv(hue2, 255, brightness2);

            let mix = nscale8(blend(c1, c2, fade_speed), level);

            *pixel = blend(*pixel, mix, start_blend);
        }
    }

    fn ready_to_stop(&self) -> bool {
        self.faded_out
    }
}
