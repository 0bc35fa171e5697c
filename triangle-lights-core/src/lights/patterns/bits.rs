//! Dots that wander around the strip, leaving a fading trail behind them.
use core::time::Duration;

use rand::RngCore;
use smart_leds::{
    RGB8,
    colors::{BLACK, WHITE},
};

use crate::errors::LightsResult;
use crate::lights::math8::{
    blend, chsv, fade_to_black_by, mod_wrap, random8, random8_below, random8_between, random16,
    rgb,
};
use crate::lights::{FrameContext, Palette16, Pattern, Pool, PoolEntity, RunState, random_palette};
use crate::logging::{debug, info};

pub(crate) const DEEP_PINK: RGB8 = rgb(0xFF1493);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitColor {
    /// one color picked at setup
    Monotone,
    /// every bit gets a random color from a random palette
    FromPalette,
    /// every bit gets a random saturated hue
    Mix,
    White,
    Pink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitsPreset {
    pub max_bits: usize,
    pub lifespan: Duration,
    /// how long a bit waits before moving one pixel
    pub update_interval: Duration,
    /// how much the whole frame fades every update. bigger means shorter trails
    pub fadedown: u8,
    pub color: BitColor,
}

impl BitsPreset {
    pub const PINK_TRIANGLE: Self = Self::new(5, 8, 12, BitColor::Pink);
    pub const CHILL_STREAMERS: Self = Self::new(5, 16, 5, BitColor::Monotone);
    pub const PALETTE_STREAMERS: Self = Self::new(5, 16, 5, BitColor::FromPalette);
    pub const MOVING_DOTS: Self = Self::new(10, 16, 30, BitColor::Monotone);
    pub const CHASE: Self = Self::new(3, 8, 50, BitColor::Monotone);

    pub const ALL: [Self; 5] = [
        Self::PINK_TRIANGLE,
        Self::CHILL_STREAMERS,
        Self::PALETTE_STREAMERS,
        Self::MOVING_DOTS,
        Self::CHASE,
    ];

    /// every built in preset lives for 3 seconds
    const fn new(max_bits: usize, update_interval_ms: u64, fadedown: u8, color: BitColor) -> Self {
        Self {
            max_bits,
            lifespan: Duration::from_millis(3_000),
            update_interval: Duration::from_millis(update_interval_ms),
            fadedown,
            color,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Bit {
    pos: usize,
    direction: isize,
    born_at: Duration,
    last_tick: Duration,
    alive: bool,
    color: RGB8,
}

impl PoolEntity for Bit {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl Bit {
    fn new(color: RGB8, now: Duration, num_leds: usize, rng: &mut dyn RngCore) -> Self {
        let pos = random16(rng) as usize % num_leds;
        let direction = if random8_below(rng, 2) == 0 { 1 } else { -1 };

        Self {
            pos,
            direction,
            born_at: now,
            last_tick: now,
            alive: true,
            color,
        }
    }

    fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.born_at)
    }

    /// fade in over the first sixth of the lifespan and out over the last sixth
    fn age_brightness(&self, now: Duration, lifespan: Duration) -> u8 {
        let age = self.age(now).as_millis() as u64;
        let lifespan = lifespan.as_millis() as u64;
        let edge = (lifespan / 6).max(1);

        let brightness = if age < edge {
            age * 255 / edge
        } else if age > lifespan.saturating_sub(edge) {
            lifespan.saturating_sub(age) * 255 / edge
        } else {
            255
        };

        brightness.min(255) as u8
    }

    fn tick(&mut self, now: Duration, num_leds: usize) {
        self.pos = mod_wrap(self.pos as isize + self.direction, num_leds);
        self.last_tick = now;
    }
}

pub struct Bits {
    fixed_preset: Option<BitsPreset>,
    preset: BitsPreset,
    bits: Pool<Bit>,
    last_bit_created: Option<Duration>,
    /// for `BitColor::Monotone`
    color: RGB8,
    /// for `BitColor::FromPalette`
    palette: Palette16,
}

impl Bits {
    /// `Some` picks one of the built in presets. `None` (or an index that is out of range) picks a random one every start
    pub fn new(preset: Option<usize>) -> Self {
        let fixed_preset = preset.and_then(|i| BitsPreset::ALL.get(i).copied());

        Self::from_parts(fixed_preset)
    }

    pub fn with_preset(preset: BitsPreset) -> Self {
        Self::from_parts(Some(preset))
    }

    fn from_parts(fixed_preset: Option<BitsPreset>) -> Self {
        Self {
            fixed_preset,
            preset: fixed_preset.unwrap_or(BitsPreset::PINK_TRIANGLE),
            bits: Pool::new(),
            last_bit_created: None,
            color: WHITE,
            palette: Palette16::default(),
        }
    }

    pub fn preset(&self) -> &BitsPreset {
        &self.preset
    }
}

fn bit_color(
    mode: BitColor,
    monotone: RGB8,
    palette: &Palette16,
    rng: &mut dyn RngCore,
) -> RGB8 {
    match mode {
        BitColor::Monotone => monotone,
        BitColor::FromPalette => palette.color_at(random8(rng), 255),
        BitColor::Mix => {
            let hue = random8(rng);
            let sat = random8_between(rng, 200, 255);
            chsv(hue, sat, 255)
        }
        BitColor::White => WHITE,
        BitColor::Pink => DEEP_PINK,
    }
}

impl Pattern for Bits {
    fn description(&self) -> &'static str {
        "Bits"
    }

    fn setup(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        self.preset = match self.fixed_preset {
            Some(preset) => {
                info!("Using const Bits preset {:?}", preset.color);
                preset
            }
            None => {
                let pick = random8_below(ctx.rng, BitsPreset::ALL.len() as u8) as usize;
                info!("Picked Bits preset {}", pick);
                BitsPreset::ALL[pick]
            }
        };

        self.palette = random_palette(ctx.rng);

        // an occasional white
        let hue = random8(ctx.rng);
        let sat = if random8_below(ctx.rng, 8) == 0 {
            0
        } else {
            random8_between(ctx.rng, 200, 255)
        };
        self.color = chsv(hue, sat, 255);

        self.last_bit_created = None;

        self.bits.allocate(self.preset.max_bits)
    }

    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState) {
        let now = ctx.now;
        let num_leds = frame.len();
        let preset = self.preset;
        let stopping = state.is_stop_requested();

        let Self {
            bits,
            color,
            palette,
            ..
        } = self;

        for bit in bits.iter_mut() {
            if bit.age(now) > preset.lifespan {
                bit.alive = false;
            }

            if bit.alive {
                frame[bit.pos] = blend(BLACK, bit.color, bit.age_brightness(now, preset.lifespan));

                if now.saturating_sub(bit.last_tick) > preset.update_interval {
                    bit.tick(now, num_leds);
                }
            } else if !stopping {
                let reborn = bit_color(preset.color, *color, palette, ctx.rng);

                *bit = Bit::new(reborn, now, num_leds, ctx.rng);
            }
        }

        if state.is_running() && !self.bits.is_full() {
            let spacing = preset.lifespan / preset.max_bits.max(1) as u32;

            let due = self
                .last_bit_created
                .is_none_or(|last| now.saturating_sub(last) > spacing);

            if due {
                let color = bit_color(preset.color, self.color, &self.palette, ctx.rng);
                let bit = Bit::new(color, now, num_leds, ctx.rng);

                if self.bits.push(bit).is_ok() {
                    self.last_bit_created = Some(now);
                }
            }
        }

        fade_to_black_by(frame, preset.fadedown);
    }

    fn ready_to_stop(&self) -> bool {
        !self.bits.any_alive()
    }

    fn release_resources(&mut self) {
        if self.bits.release() {
            debug!("released {} bits", self.preset.max_bits);
        }
        self.last_bit_created = None;
    }
}
