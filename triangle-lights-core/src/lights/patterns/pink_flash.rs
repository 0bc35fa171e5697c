//! Every side of the triangle randomly flashes pink and then slowly fades.
use alloc::vec::Vec;
use core::mem::size_of;
use core::time::Duration;

use smart_leds::{RGB8, colors::BLACK};

use super::bits::DEEP_PINK;
use crate::errors::{LightsError, LightsResult};
use crate::lights::math8::{fade_to_black_by, luma, nscale8, random8};
use crate::lights::{FrameContext, Pattern, RunState};

const FADE_UP: Duration = Duration::from_millis(100);

#[derive(Default)]
pub struct PinkFlash {
    /// one per segment. `None` unless that segment is fading up
    fadeup_started: Vec<Option<Duration>>,
}

impl PinkFlash {
    pub fn new() -> Self {
        Self::default()
    }

    fn flashing(&self) -> usize {
        self.fadeup_started.iter().filter(|x| x.is_some()).count()
    }
}

impl Pattern for PinkFlash {
    fn description(&self) -> &'static str {
        "Pink Flash"
    }

    fn setup(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        let num_segments = ctx.layout.num_segments();

        let mut fadeup_started = Vec::new();
        fadeup_started
            .try_reserve_exact(num_segments)
            .map_err(|source| LightsError::ScratchAllocation {
                requested: num_segments * size_of::<Option<Duration>>(),
                source,
            })?;
        fadeup_started.resize(num_segments, None);

        self.fadeup_started = fadeup_started;

        Ok(())
    }

    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState) {
        let now = ctx.now;
        let layout = ctx.layout;

        for (fadeup_started, segment) in self.fadeup_started.iter_mut().zip(layout.segments()) {
            if state.is_running() && random8(ctx.rng) == 0 {
                *fadeup_started = Some(now);
            }

            let Some(started) = *fadeup_started else {
                continue;
            };

            let fadeup = now.saturating_sub(started);

            if fadeup >= FADE_UP {
                *fadeup_started = None;
                continue;
            }

            let level = (fadeup.as_millis() * 255 / FADE_UP.as_millis()) as u8;
            let color = nscale8(DEEP_PINK, level);

            // never dim a side that is already brighter
            if luma(color) > luma(frame[segment.start]) {
                frame[segment].fill(color);
            }
        }

        fade_to_black_by(frame, 3);

        for pixel in frame.iter_mut() {
            if pixel.b == 0 {
                *pixel = BLACK;
            }
        }
    }

    fn ready_to_stop(&self) -> bool {
        self.flashing() == 0
    }

    fn release_resources(&mut self) {
        self.fadeup_started = Vec::new();
    }
}
