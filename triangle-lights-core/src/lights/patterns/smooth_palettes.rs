//! Mark Kriegsman's "color waves with palettes", drawn from the shared drifting palette.
use core::time::Duration;

use smart_leds::RGB8;

use crate::errors::LightsResult;
use crate::lights::math8::{beatsin88, nblend, random8_below, scale8, sin16};
use crate::lights::{FrameContext, GRADIENT_PALETTE_COUNT, Pattern, RunState, gradient_palette};

const DRAW_INTERVAL: Duration = Duration::from_millis(20);
const BLEND_IN: Duration = Duration::from_millis(2_000);

#[derive(Default)]
pub struct SmoothPalettes {
    pseudotime: u16,
    hue16: u16,
    last_ms: u16,
    last_draw: Option<Duration>,
}

impl SmoothPalettes {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, runtime: Duration) {
        let now = ctx.now;

        ctx.palette.tick(now, ctx.rng);

        let wave = |bpm88: u16, low: u16, high: u16| beatsin88(bpm88, low, high, now, Duration::ZERO, 0);

        let brightdepth = wave(341, 96, 224) as u8;
        let brightness_theta_inc16 = wave(203, 25 * 256, 40 * 256);
        let ms_multiplier = wave(147, 23, 60);

        let mut hue16 = self.hue16;
        let hue_inc16 = wave(113, 300, 1500);

        // these all wrap on purpose
        let ms = now.as_millis() as u16;
        let delta_ms = ms.wrapping_sub(self.last_ms);
        self.last_ms = ms;
        self.pseudotime = self
            .pseudotime
            .wrapping_add(delta_ms.wrapping_mul(ms_multiplier));
        self.hue16 = self
            .hue16
            .wrapping_add(delta_ms.wrapping_mul(wave(400, 5, 9)));

        let mut brightness_theta16 = self.pseudotime;

        let blend_amount = if runtime < BLEND_IN {
            (runtime.as_millis() / 15) as u8
        } else {
            128
        };

        let palette = &ctx.palette.current;
        let num_leds = frame.len();

        for i in 0..num_leds {
            hue16 = hue16.wrapping_add(hue_inc16);

            let h16_128 = hue16 >> 7;
            let hue8 = if h16_128 & 0x100 != 0 {
                255 - (h16_128 >> 1) as u8
            } else {
                (h16_128 >> 1) as u8
            };

            brightness_theta16 = brightness_theta16.wrapping_add(brightness_theta_inc16);
            let b16 = (sin16(brightness_theta16) as i32 + 32768) as u32;

            let bri16 = b16 * b16 / 65536;
            let mut bri8 = (bri16 * brightdepth as u32 / 65536) as u8;
            bri8 = bri8.wrapping_add(255 - brightdepth);

            let index = scale8(hue8, 240);

            let new_color = palette.color_at(index, bri8);

            // drawn back to front
            nblend(&mut frame[num_leds - 1 - i], new_color, blend_amount);
        }
    }
}

impl Pattern for SmoothPalettes {
    fn description(&self) -> &'static str {
        "Smooth palettes"
    }

    fn setup(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        let target = random8_below(ctx.rng, GRADIENT_PALETTE_COUNT);
        ctx.palette.set_target(gradient_palette(target));

        self.last_ms = ctx.now.as_millis() as u16;
        self.last_draw = None;

        Ok(())
    }

    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState) {
        let due = self
            .last_draw
            .is_none_or(|x| ctx.now.saturating_sub(x) >= DRAW_INTERVAL);

        if due {
            let runtime = state.elapsed(ctx.now).unwrap_or_default();

            self.draw(frame, ctx, runtime);
            self.last_draw = Some(ctx.now);
        }
    }
}
