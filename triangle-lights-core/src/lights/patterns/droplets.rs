//! Drops of color land on the strip and then flow into their neighbors like ink spreading in water.
use alloc::vec::Vec;
use core::mem::size_of;
use core::time::Duration;

use smart_leds::{RGB8, colors::BLACK};

use crate::errors::{LightsError, LightsResult};
use crate::lights::math8::{chsv, mod_wrap, random8, random8_below, random16};
use crate::lights::{
    FrameContext, GRADIENT_PALETTE_COUNT, Palette16, Pattern, RunState, gradient_palette,
};
use crate::logging::trace;

const DROP_INTERVAL: Duration = Duration::from_millis(450);
const FLOW_INTERVAL: Duration = Duration::from_millis(30);
/// how much of the brighter neighbor flows every interval
const K_FLOW: f32 = 0.2;
/// how much of the flow survives the trip
const K_EFF: f32 = 0.97;
const MIN_LOSS: u8 = 1;
/// pixels on either side of the center of a drop
const DROP_RADIUS: isize = 2;

#[derive(Default)]
pub struct Droplets {
    scratch: Vec<RGB8>,
    /// `None` uses random hues
    palette: Option<Palette16>,
    last_drop: Option<Duration>,
    last_flow: Option<Duration>,
    next_drop_interval: Duration,
}

impl Droplets {
    pub fn new() -> Self {
        Self::default()
    }

    fn drop_color(&self, ctx: &mut FrameContext<'_>) -> RGB8 {
        let index = random8(ctx.rng);

        match self.palette.as_ref() {
            Some(palette) => palette.color_at(index, 255),
            None => chsv(index, 255, 255),
        }
    }

    fn drip(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>) {
        // vary the drops
        self.next_drop_interval = if random8_below(ctx.rng, 2) == 1 {
            DROP_INTERVAL - DROP_INTERVAL / 2
        } else {
            DROP_INTERVAL + DROP_INTERVAL / 2
        };

        let num_leds = frame.len();
        let center = (random16(ctx.rng) as usize % num_leds) as isize;
        let color = self.drop_color(ctx);

        trace!("drop at {}", center);

        for i in -DROP_RADIUS..=DROP_RADIUS {
            frame[mod_wrap(center + i, num_leds)] = color;
        }
    }

    /// every pair of neighbors moves some of each channel from the brighter one to the dimmer one
    fn flow(&mut self, frame: &mut [RGB8]) {
        let scratch = &mut self.scratch;
        let num_leds = frame.len();

        if scratch.len() != num_leds {
            // the layout changed out from under us. nothing sane to do
            return;
        }

        scratch.copy_from_slice(frame);

        for i in 0..num_leds {
            let i2 = (i + 1) % num_leds;

            let led1 = frame[i];
            let led2 = frame[i2];

            for channel in 0..3 {
                let a = component(&led1, channel);
                let b = component(&led2, channel);

                let (reference, src, dst) = if a < b {
                    (b, i2, i)
                } else if a > b {
                    (a, i, i2)
                } else {
                    continue;
                };

                let src_value = component(&scratch[src], channel);
                let dst_value = component(&scratch[dst], channel);

                let flow = src_value
                    .min((K_FLOW * reference as f32) as u8)
                    .min(255 - dst_value);

                *component_mut(&mut scratch[dst], channel) =
                    (dst_value as f32 + K_EFF * flow as f32) as u8;

                *component_mut(&mut scratch[src], channel) =
                    if src_value > flow && src_value > MIN_LOSS {
                        src_value - MIN_LOSS.max(flow)
                    } else {
                        0
                    };
            }
        }

        frame.copy_from_slice(scratch);
    }
}

#[inline]
fn component(color: &RGB8, channel: usize) -> u8 {
    match channel {
        0 => color.r,
        1 => color.g,
        _ => color.b,
    }
}

#[inline]
fn component_mut(color: &mut RGB8, channel: usize) -> &mut u8 {
    match channel {
        0 => &mut color.r,
        1 => &mut color.g,
        _ => &mut color.b,
    }
}

impl Pattern for Droplets {
    fn description(&self) -> &'static str {
        "Droplets"
    }

    fn setup(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        let num_leds = ctx.layout.num_leds();

        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(num_leds)
            .map_err(|source| LightsError::ScratchAllocation {
                requested: num_leds * size_of::<RGB8>(),
                source,
            })?;
        scratch.resize(num_leds, BLACK);
        self.scratch = scratch;

        // two out of three use a palette
        self.palette = if random8_below(ctx.rng, 3) > 0 {
            Some(gradient_palette(random8_below(ctx.rng, GRADIENT_PALETTE_COUNT)))
        } else {
            None
        };

        self.next_drop_interval = DROP_INTERVAL;
        self.last_drop = None;
        self.last_flow = None;

        Ok(())
    }

    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState) {
        let now = ctx.now;

        if state.is_running() {
            let drop_due = self
                .last_drop
                .is_none_or(|x| now.saturating_sub(x) > self.next_drop_interval);

            if drop_due {
                self.drip(frame, ctx);
                self.last_drop = Some(now);
            }
        }

        let flow_due = self
            .last_flow
            .is_none_or(|x| now.saturating_sub(x) > FLOW_INTERVAL);

        if flow_due {
            self.flow(frame);
            self.last_flow = Some(now);
        }
    }

    fn release_resources(&mut self) {
        self.scratch = Vec::new();
    }
}
