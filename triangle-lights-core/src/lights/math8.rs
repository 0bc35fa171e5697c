//! 8 and 16 bit fixed point helpers for animations. These follow FastLED's math so the patterns look like they did on the teensy.
//!
//! Everything that depends on time takes the driver's `now` instead of reading a clock.
use core::time::Duration;

use rand::RngCore;
use smart_leds::{
    RGB8,
    hsv::{Hsv, hsv2rgb},
};

/// scale `i` by `scale / 256`. 255 leaves `i` alone
#[inline]
pub const fn scale8(i: u8, scale: u8) -> u8 {
    ((i as u16 * (1 + scale as u16)) >> 8) as u8
}

#[inline]
pub const fn scale16(i: u16, scale: u16) -> u16 {
    ((i as u32 * (1 + scale as u32)) >> 16) as u16
}

#[inline]
pub const fn nscale8(color: RGB8, scale: u8) -> RGB8 {
    RGB8 {
        r: scale8(color.r, scale),
        g: scale8(color.g, scale),
        b: scale8(color.b, scale),
    }
}

/// 0 is all `a`. 255 is all `b`
#[inline]
pub const fn blend8(a: u8, b: u8, amount: u8) -> u8 {
    scale8(a, 255 - amount).saturating_add(scale8(b, amount))
}

#[inline]
pub const fn blend(a: RGB8, b: RGB8, amount: u8) -> RGB8 {
    RGB8 {
        r: blend8(a.r, b.r, amount),
        g: blend8(a.g, b.g, amount),
        b: blend8(a.b, b.b, amount),
    }
}

/// blend `overlay` into `existing` in place
#[inline]
pub fn nblend(existing: &mut RGB8, overlay: RGB8, amount: u8) {
    *existing = blend(*existing, overlay, amount);
}

pub fn fade_to_black_by(frame: &mut [RGB8], amount: u8) {
    for x in frame.iter_mut() {
        *x = nscale8(*x, 255 - amount);
    }
}

/// perceived brightness
#[inline]
pub const fn luma(color: RGB8) -> u8 {
    scale8(color.r, 54) + scale8(color.g, 183) + scale8(color.b, 18)
}

/// like FastLED's CHSV
#[inline]
pub fn chsv(hue: u8, sat: u8, val: u8) -> RGB8 {
    hsv2rgb(Hsv { hue, sat, val })
}

#[inline]
pub const fn rgb(hex: u32) -> RGB8 {
    RGB8 {
        r: (hex >> 16) as u8,
        g: (hex >> 8) as u8,
        b: hex as u8,
    }
}

const B_M16_INTERLEAVE: [u8; 8] = [0, 49, 49, 41, 90, 27, 117, 10];

/// a full sine wave over 0-255. returns 1-255 centered on 128
pub const fn sin8(theta: u8) -> u8 {
    let mut offset = theta;
    if theta & 0x40 != 0 {
        offset = 255 - offset;
    }
    offset &= 0x3F;

    let mut secoffset = offset & 0x0F;
    if theta & 0x40 != 0 {
        secoffset += 1;
    }

    let s2 = (offset >> 4) as usize * 2;
    let b = B_M16_INTERLEAVE[s2] as i16;
    let m16 = B_M16_INTERLEAVE[s2 + 1] as i16;

    let mx = (m16 * secoffset as i16) >> 4;

    let mut y = mx + b;
    if theta & 0x80 != 0 {
        y = -y;
    }

    (y + 128) as u8
}

const SIN16_BASE: [u16; 8] = [0, 6393, 12539, 18204, 23170, 27245, 30273, 32137];
const SIN16_SLOPE: [u8; 8] = [49, 48, 44, 38, 31, 23, 14, 4];

/// a full sine wave over 0-65535. returns roughly -32645 to 32645
pub const fn sin16(theta: u16) -> i16 {
    let mut offset = (theta & 0x3FFF) >> 3;
    if theta & 0x4000 != 0 {
        offset = 2047 - offset;
    }

    let section = (offset / 256) as usize;
    let b = SIN16_BASE[section];
    let m = SIN16_SLOPE[section] as u16;

    let secoffset8 = (offset as u8 / 2) as u16;

    let y = (m * secoffset8 + b) as i16;

    if theta & 0x8000 != 0 { -y } else { y }
}

/// `bpm88` is beats per minute in Q8.8
pub fn beat88(bpm88: u16, now: Duration, timebase: Duration) -> u16 {
    let ms = now.saturating_sub(timebase).as_millis() as u64;

    (ms.wrapping_mul(bpm88 as u64).wrapping_mul(280) >> 16) as u16
}

/// whole number bpm below 256 are shifted into Q8.8 for you
pub fn beat16(bpm: u16, now: Duration, timebase: Duration) -> u16 {
    let bpm88 = if bpm < 256 { bpm << 8 } else { bpm };

    beat88(bpm88, now, timebase)
}

pub fn beat8(bpm: u8, now: Duration, timebase: Duration) -> u8 {
    (beat16(bpm as u16, now, timebase) >> 8) as u8
}

/// a sine wave between `low` and `high` at `bpm`
pub fn beatsin8(bpm: u8, low: u8, high: u8, now: Duration, timebase: Duration, phase: u8) -> u8 {
    let beat = beat8(bpm, now, timebase);

    let beatsin = sin8(beat.wrapping_add(phase));

    low.wrapping_add(scale8(beatsin, high.wrapping_sub(low)))
}

pub fn beatsin88(
    bpm88: u16,
    low: u16,
    high: u16,
    now: Duration,
    timebase: Duration,
    phase: u16,
) -> u16 {
    let beat = beat88(bpm88, now, timebase);

    let beatsin = (sin16(beat.wrapping_add(phase)) as i32 + 32768) as u16;

    low.wrapping_add(scale16(beatsin, high.wrapping_sub(low)))
}

/// `(a + b) % m` without overflowing
#[inline]
pub const fn addmod8(a: u8, b: u8, m: u8) -> u8 {
    ((a as u16 + b as u16) % m as u16) as u8
}

#[inline]
pub fn random8(rng: &mut dyn RngCore) -> u8 {
    rng.next_u32() as u8
}

/// 0..lim. 0 if lim is 0
#[inline]
pub fn random8_below(rng: &mut dyn RngCore, lim: u8) -> u8 {
    ((random8(rng) as u16 * lim as u16) >> 8) as u8
}

/// min..lim
#[inline]
pub fn random8_between(rng: &mut dyn RngCore, min: u8, lim: u8) -> u8 {
    min + random8_below(rng, lim.saturating_sub(min))
}

#[inline]
pub fn random16(rng: &mut dyn RngCore) -> u16 {
    rng.next_u32() as u16
}

/// modulo that is never negative. `m` must not be 0
#[inline]
pub fn mod_wrap(x: isize, m: usize) -> usize {
    x.rem_euclid(m as isize) as usize
}
