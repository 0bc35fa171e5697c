//! A fake driver for the tests. Owns the frame, the clock, and the shared palette like a real driver would.
use core::time::Duration;

use rand::{SeedableRng, rngs::SmallRng};
use smart_leds::{RGB8, colors::BLACK};

use super::{FrameContext, PaletteDrift, PatternRunner, StripLayout};
use crate::errors::LightsResult;

pub(crate) struct TestDriver {
    pub now: Duration,
    pub frame_interval: Duration,
    pub rng: SmallRng,
    pub layout: StripLayout,
    pub palette: PaletteDrift,
    pub frame: Vec<RGB8>,
}

impl TestDriver {
    /// a 48 led triangle at ~60 fps
    pub fn new(seed: u64) -> Self {
        let layout = StripLayout::new(48, 3).unwrap();

        Self {
            now: Duration::ZERO,
            frame_interval: Duration::from_millis(16),
            rng: SmallRng::seed_from_u64(seed),
            layout,
            palette: PaletteDrift::new(),
            frame: vec![BLACK; layout.num_leds()],
        }
    }

    pub fn ctx(&mut self) -> FrameContext<'_> {
        FrameContext::new(self.now, &mut self.rng, self.layout, &mut self.palette)
    }

    pub fn start(&mut self, runner: &mut PatternRunner) -> LightsResult<()> {
        let mut ctx = self.ctx();

        runner.start(&mut ctx)
    }

    /// draw one frame without moving the clock
    pub fn update(&mut self, runner: &mut PatternRunner) {
        let mut ctx = FrameContext::new(self.now, &mut self.rng, self.layout, &mut self.palette);

        runner.update(&mut self.frame, &mut ctx);
    }

    /// draw one frame and then move the clock forward one frame
    pub fn tick(&mut self, runner: &mut PatternRunner) {
        self.update(runner);
        self.now += self.frame_interval;
    }

    pub fn request_stop(&mut self, runner: &mut PatternRunner) {
        runner.request_stop(self.now);
    }

    pub fn run_for(&mut self, runner: &mut PatternRunner, duration: Duration) {
        let end = self.now + duration;

        while self.now < end && !runner.is_stopped() {
            self.tick(runner);
        }
    }

    /// tick until the runner stops. returns how many frames that took
    pub fn wind_down(&mut self, runner: &mut PatternRunner, max_frames: usize) -> usize {
        for frames in 1..=max_frames {
            self.tick(runner);

            if runner.is_stopped() {
                return frames;
            }
        }

        panic!(
            "{} was still {} after {} frames",
            runner.description(),
            runner.run_state().name(),
            max_frames
        );
    }

    pub fn lit(&self) -> usize {
        self.frame.iter().filter(|x| **x != BLACK).count()
    }
}
