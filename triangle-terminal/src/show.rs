//! Plays patterns one after another. Every pattern gets a time slot, then a graceful stop, then a forced one if it
//! takes too long to wind down.
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use log::*;
use rand::rngs::SmallRng;
use smart_leds::{RGB8, colors::BLACK};
use triangle_lights_core::config::Config;
use triangle_lights_core::fps::FpsTracker;
use triangle_lights_core::lights::{FrameContext, PaletteDrift, PatternRunner, StripLayout};

use crate::render::TerminalRenderer;

pub trait Clock {
    /// time since the show started
    fn now(&self) -> Duration;

    fn sleep_until(&mut self, t: Duration);
}

pub struct RealClock {
    epoch: Instant,
}

impl RealClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RealClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&mut self, t: Duration) {
        if let Some(x) = t.checked_sub(self.now()) {
            thread::sleep(x);
        }
    }
}

/// how a pattern's time slot ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Stopped,
    ForceStopped,
    FailedToStart,
}

pub struct Show<C: Clock, W: Write> {
    config: Config,
    layout: StripLayout,
    clock: C,
    rng: SmallRng,
    palette: PaletteDrift,
    frame: Vec<RGB8>,
    renderer: TerminalRenderer<W>,
    fps: FpsTracker,
    frames_drawn: u64,
}

impl<C: Clock, W: Write> Show<C, W> {
    pub fn new(config: Config, clock: C, rng: SmallRng, out: W) -> anyhow::Result<Self> {
        let layout = config.layout().context("bad led layout")?;

        let renderer = TerminalRenderer::new(out, layout, config.default_brightness);

        Ok(Self {
            layout,
            clock,
            rng,
            palette: PaletteDrift::new(),
            frame: vec![BLACK; layout.num_leds()],
            renderer,
            fps: FpsTracker::new("lights"),
            frames_drawn: 0,
            config,
        })
    }

    pub fn renderer(&self) -> &TerminalRenderer<W> {
        &self.renderer
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// play every runner in order, `cycles` times. 0 cycles plays forever
    pub fn run(&mut self, runners: &mut [PatternRunner], cycles: u32) -> anyhow::Result<()> {
        let mut lap = 0;

        loop {
            for runner in runners.iter_mut() {
                let outcome = self.play(runner)?;

                debug!("{}: {:?}", runner.description(), outcome);
            }

            lap += 1;

            if cycles != 0 && lap >= cycles {
                break;
            }
        }

        Ok(())
    }

    /// start the pattern, give it its time slot, and then stop it
    pub fn play(&mut self, runner: &mut PatternRunner) -> anyhow::Result<Outcome> {
        let started_at = self.clock.now();

        // patterns that blend in start from black, not from the last pattern
        self.frame.fill(BLACK);

        let mut ctx = FrameContext::new(started_at, &mut self.rng, self.layout, &mut self.palette);

        if let Err(err) = runner.start(&mut ctx) {
            error!("unable to start {}: {}", runner.description(), err);
            return Ok(Outcome::FailedToStart);
        }

        let slot_end = started_at + self.config.pattern_duration();
        let frame_interval = self.config.frame_interval();

        let mut stop_deadline = None;
        let mut next_frame = started_at;

        loop {
            let now = self.clock.now();

            if runner.is_running() && now >= slot_end && runner.wants_to_idle_stop() {
                runner.request_stop(now);
                stop_deadline = Some(now + self.config.max_wind_down());
            }

            if let Some(deadline) = stop_deadline {
                if now >= deadline && !runner.is_stopped() {
                    warn!(
                        "{} did not stop within {:?}",
                        runner.description(),
                        self.config.max_wind_down()
                    );

                    runner.force_stop();

                    return Ok(Outcome::ForceStopped);
                }
            }

            let mut ctx = FrameContext::new(now, &mut self.rng, self.layout, &mut self.palette);
            runner.update(&mut self.frame, &mut ctx);

            self.renderer
                .render(&self.frame)
                .context("unable to draw the frame")?;
            self.frames_drawn += 1;

            self.fps.tick(now);

            if runner.is_stopped() {
                return Ok(Outcome::Stopped);
            }

            next_frame += frame_interval;
            self.clock.sleep_until(next_frame);
        }
    }
}
