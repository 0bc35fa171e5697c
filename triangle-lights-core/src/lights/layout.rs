use core::ops::Range;

use crate::errors::{LightsError, LightsResult};

/// The strip is one long buffer, but it is physically wired as equal-length segments (the sides of the triangle).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StripLayout {
    num_leds: usize,
    num_segments: usize,
}

impl StripLayout {
    pub fn new(num_leds: usize, num_segments: usize) -> LightsResult<Self> {
        if num_leds == 0 || num_segments == 0 || num_leds % num_segments != 0 {
            return Err(LightsError::Layout {
                num_leds,
                num_segments,
            });
        }

        Ok(Self {
            num_leds,
            num_segments,
        })
    }

    #[inline]
    pub fn num_leds(&self) -> usize {
        self.num_leds
    }

    #[inline]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    #[inline]
    pub fn segment_len(&self) -> usize {
        self.num_leds / self.num_segments
    }

    /// the pixel indexes of one segment. panics if `i` is not a segment
    pub fn segment(&self, i: usize) -> Range<usize> {
        assert!(i < self.num_segments);

        let len = self.segment_len();

        (i * len)..((i + 1) * len)
    }

    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_segments).map(|i| self.segment(i))
    }
}
