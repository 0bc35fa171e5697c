use core::time::Duration;

use crate::errors::LightsResult;
use crate::lights::StripLayout;

pub struct Config {
    /// 3 sides of 16 for the triangle
    pub num_leds: usize,
    /// physical strips. every segment must be the same length
    pub num_segments: usize,
    pub default_brightness: u8,
    pub frames_per_second: u16,
    /// how long the driver lets a pattern run before asking it to stop
    pub ms_per_light_pattern: u32,
    /// if a graceful stop takes longer than this, the driver force stops
    pub max_wind_down_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_leds: 48,
            num_segments: 3,
            default_brightness: 32,
            frames_per_second: 50,
            ms_per_light_pattern: 30 * 1000,
            max_wind_down_ms: 10 * 1000,
        }
    }
}

impl Config {
    pub fn layout(&self) -> LightsResult<StripLayout> {
        StripLayout::new(self.num_leds, self.num_segments)
    }

    /// zero fps is treated as 1 fps
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.frames_per_second.max(1) as u64)
    }

    pub fn pattern_duration(&self) -> Duration {
        Duration::from_millis(self.ms_per_light_pattern as u64)
    }

    pub fn max_wind_down(&self) -> Duration {
        Duration::from_millis(self.max_wind_down_ms as u64)
    }
}
