//! The lifecycle every pattern goes through: not started -> running -> stop requested -> stopped.
//!
//! A [`Pattern`] only draws. The [`PatternRunner`] wrapped around it owns the state machine, the optional sub-pattern,
//! and the promise that whatever `setup` allocated gets released exactly once.
//!
//! Stopping is cooperative. `request_stop` only changes what the next `update` sees. The pattern keeps drawing its
//! wind-down until [`Pattern::ready_to_stop`] says it is done and its sub-pattern has stopped too. `force_stop` skips
//! all of that.
use alloc::boxed::Box;
use core::fmt;
use core::time::Duration;

use rand::RngCore;
use smart_leds::RGB8;

use super::{PaletteDrift, StripLayout};
use crate::errors::LightsResult;
use crate::logging::{debug, error, info, trace, warn};

/// Everything a pattern gets besides the frame. The driver builds one of these for every call.
pub struct FrameContext<'a> {
    /// time since the driver's epoch. the core never reads a clock itself
    pub now: Duration,
    pub rng: &'a mut dyn RngCore,
    pub layout: StripLayout,
    /// the slowly changing palette that every pattern shares
    pub palette: &'a mut PaletteDrift,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        now: Duration,
        rng: &'a mut dyn RngCore,
        layout: StripLayout,
        palette: &'a mut PaletteDrift,
    ) -> Self {
        Self {
            now,
            rng,
            layout,
            palette,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    NotStarted,
    Running {
        started_at: Duration,
    },
    StopRequested {
        started_at: Duration,
        stop_requested_at: Duration,
    },
    /// terminal until `start` is called again
    Stopped,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Running { .. } => "running",
            Self::StopRequested { .. } => "stop requested",
            Self::Stopped => "stopped",
        }
    }

    #[inline]
    pub fn is_not_started(&self) -> bool {
        matches!(self, Self::NotStarted)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        matches!(self, Self::StopRequested { .. })
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// running or winding down. these are the only states that get `update` calls
    #[inline]
    pub fn is_active(&self) -> bool {
        self.started_at().is_some()
    }

    pub fn started_at(&self) -> Option<Duration> {
        match *self {
            Self::Running { started_at } | Self::StopRequested { started_at, .. } => {
                Some(started_at)
            }
            Self::NotStarted | Self::Stopped => None,
        }
    }

    pub fn stop_requested_at(&self) -> Option<Duration> {
        match *self {
            Self::StopRequested {
                stop_requested_at, ..
            } => Some(stop_requested_at),
            _ => None,
        }
    }

    /// how long since `start`. None unless active
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.started_at().map(|x| now.saturating_sub(x))
    }

    /// how long since `request_stop`. None unless winding down
    pub fn stop_elapsed(&self, now: Duration) -> Option<Duration> {
        self.stop_requested_at().map(|x| now.saturating_sub(x))
    }
}

/// The hooks a concrete pattern implements. Only `description` and `update` are required.
pub trait Pattern {
    /// stable name for the logs
    fn description(&self) -> &'static str;

    /// Called once per `start`. Allocate dynamic state here and not in `new` so that starting the same pattern again
    /// does not leak. If this fails, `release_resources` is called and the pattern is left stopped.
    fn setup(&mut self, _ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        Ok(())
    }

    /// Draw one frame. Called while running and while stopping. Check `state.is_stop_requested()` to draw the
    /// wind-down instead of the normal animation.
    fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>, state: RunState);

    /// Called once per `start`, right after `setup`.
    fn make_sub_pattern(&mut self, _ctx: &mut FrameContext<'_>) -> Option<Box<dyn Pattern>> {
        None
    }

    /// Checked after every `update` while stopping. Patterns with things still fading out should return false until
    /// they are gone. The runner separately waits for the sub-pattern.
    fn ready_to_stop(&self) -> bool {
        true
    }

    /// Called exactly once every time the pattern becomes stopped. The sub-pattern is already gone by now.
    /// This may run without a successful `setup` first, so it must be safe to call on an empty pattern.
    fn release_resources(&mut self) {}

    /// if false, a scheduler should leave this pattern running when its time is up
    fn wants_to_idle_stop(&self) -> bool {
        true
    }
}

/// Drives one pattern (and its chain of sub-patterns) through the lifecycle.
pub struct PatternRunner {
    pattern: Box<dyn Pattern>,
    state: RunState,
    sub: Option<Box<PatternRunner>>,
}

impl fmt::Debug for PatternRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRunner")
            .field("pattern", &self.description())
            .field("state", &self.state)
            .field("sub", &self.sub)
            .finish()
    }
}

impl PatternRunner {
    pub fn new(pattern: Box<dyn Pattern>) -> Self {
        Self {
            pattern,
            state: RunState::NotStarted,
            sub: None,
        }
    }

    pub fn from_pattern<P: Pattern + 'static>(pattern: P) -> Self {
        Self::new(Box::new(pattern))
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.pattern.description()
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.state
    }

    #[inline]
    pub fn is_not_started(&self) -> bool {
        self.state.is_not_started()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.state.is_stop_requested()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.state.elapsed(now)
    }

    pub fn sub_pattern(&self) -> Option<&PatternRunner> {
        self.sub.as_deref()
    }

    pub fn wants_to_idle_stop(&self) -> bool {
        self.pattern.wants_to_idle_stop()
    }

    /// the pattern is done winding down and so is its sub-pattern
    pub fn ready_to_stop(&self) -> bool {
        let sub_done = self.sub.as_ref().is_none_or(|x| x.is_stopped());

        sub_done && self.pattern.ready_to_stop()
    }

    /// Run `setup`, then create and start the sub-pattern.
    ///
    /// Works from `NotStarted` or `Stopped`. Starting an active pattern is a bug in the driver.
    pub fn start(&mut self, ctx: &mut FrameContext<'_>) -> LightsResult<()> {
        debug_assert!(
            !self.state.is_active(),
            "{} started while {}",
            self.description(),
            self.state.name()
        );
        if self.state.is_active() {
            warn!("{} is already {}", self.description(), self.state.name());
            return Ok(());
        }

        info!("Starting {}", self.description());

        if let Err(err) = self.pattern.setup(ctx) {
            error!("Setup failed for {}", self.description());

            // setup might have gotten partway
            self.retire_sub_pattern();
            self.pattern.release_resources();
            self.state = RunState::Stopped;

            return Err(err);
        }

        self.state = RunState::Running {
            started_at: ctx.now,
        };

        if let Some(pattern) = self.pattern.make_sub_pattern(ctx) {
            self.retire_sub_pattern();
            self.sub = Some(Box::new(PatternRunner::new(pattern)));
        }

        if let Some(sub) = self.sub.as_mut() {
            if !sub.state.is_active() {
                if let Err(err) = sub.start(ctx) {
                    // the sub-pattern already stopped and released itself
                    self.sub = None;
                    self.force_stop();

                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Draw one frame. The pattern draws first and then the sub-pattern draws on top of the same frame.
    ///
    /// While stopping, this is also where the pattern becomes stopped once it and its sub-pattern are ready.
    pub fn update(&mut self, frame: &mut [RGB8], ctx: &mut FrameContext<'_>) {
        debug_assert!(
            self.state.is_active(),
            "{} updated while {}",
            self.description(),
            self.state.name()
        );
        if !self.state.is_active() {
            warn!(
                "ignoring update for {} while {}",
                self.description(),
                self.state.name()
            );
            return;
        }

        debug_assert_eq!(frame.len(), ctx.layout.num_leds());

        self.pattern.update(frame, ctx, self.state);

        if let Some(sub) = self.sub.as_mut() {
            // a sub-pattern that finished first just waits for the parent
            if sub.state.is_active() {
                sub.update(frame, ctx);
            }
        }

        if self.state.is_stop_requested() && self.ready_to_stop() {
            debug!("{} is ready to stop", self.description());

            self.complete_stop();
        }
    }

    /// Start a graceful stop. The sub-pattern hears about it first.
    pub fn request_stop(&mut self, now: Duration) {
        if let Some(sub) = self.sub.as_mut() {
            sub.request_stop(now);
        }

        match self.state {
            RunState::Running { started_at } => {
                info!("Stopping {}", self.description());

                self.state = RunState::StopRequested {
                    started_at,
                    stop_requested_at: now,
                };
            }
            RunState::StopRequested { .. } => {
                trace!("{} is already stopping", self.description());
            }
            RunState::NotStarted | RunState::Stopped => {
                debug!("{} is not running. nothing to stop", self.description());
            }
        }
    }

    /// Stop right now, ready or not. Calling this on a stopped pattern does nothing.
    pub fn force_stop(&mut self) {
        if self.state.is_stopped() {
            return;
        }

        if self.state.is_not_started() {
            // setup never ran, so there is nothing to release
            debug!("{} was never started", self.description());

            self.retire_sub_pattern();
            self.state = RunState::Stopped;

            return;
        }

        info!("Force stopping {}", self.description());

        self.complete_stop();
    }

    /// Swap in a new sub-pattern. The old one is fully stopped and dropped first.
    ///
    /// If we are running, the new one starts immediately. If we are stopping, it starts and is told to stop.
    pub fn set_sub_pattern(
        &mut self,
        pattern: Box<dyn Pattern>,
        ctx: &mut FrameContext<'_>,
    ) -> LightsResult<()> {
        self.retire_sub_pattern();

        let mut sub = PatternRunner::new(pattern);

        match self.state {
            RunState::Running { .. } => sub.start(ctx)?,
            RunState::StopRequested { .. } => {
                sub.start(ctx)?;
                sub.request_stop(ctx.now);
            }
            RunState::NotStarted | RunState::Stopped => {}
        }

        self.sub = Some(Box::new(sub));

        Ok(())
    }

    pub fn clear_sub_pattern(&mut self) {
        self.retire_sub_pattern();
    }

    fn retire_sub_pattern(&mut self) {
        if let Some(mut sub) = self.sub.take() {
            sub.force_stop();
        }
    }

    /// the only way into `Stopped`
    fn complete_stop(&mut self) {
        if let Some(sub) = self.sub.as_ref() {
            if sub.state.is_active() {
                warn!(
                    "WARNING: stopped {} before {} was stopped",
                    self.description(),
                    sub.description()
                );
            }
        }

        self.retire_sub_pattern();

        self.pattern.release_resources();

        self.state = RunState::Stopped;

        info!("Stopped {}", self.description());
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameContext, Pattern, PatternRunner, RunState};
    use crate::errors::LightsResult;
    use crate::lights::Pool;
    use crate::lights::test_driver::TestDriver;
    use alloc::boxed::Box;
    use core::cell::Cell;
    use core::time::Duration;
    use proptest::prelude::*;
    use smart_leds::RGB8;
    use smart_leds::colors::{BLACK, WHITE};
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        setups: Cell<u32>,
        updates: Cell<u32>,
        releases: Cell<u32>,
    }

    impl Counters {
        fn bump(x: &Cell<u32>) {
            x.set(x.get() + 1);
        }
    }

    /// no entities, no sub-pattern. ready as soon as it is asked to stop
    struct Blink {
        counters: Rc<Counters>,
    }

    impl Pattern for Blink {
        fn description(&self) -> &'static str {
            "Blink"
        }

        fn setup(&mut self, _ctx: &mut FrameContext<'_>) -> LightsResult<()> {
            Counters::bump(&self.counters.setups);
            Ok(())
        }

        fn update(&mut self, frame: &mut [RGB8], _ctx: &mut FrameContext<'_>, state: RunState) {
            Counters::bump(&self.counters.updates);

            let color = if state.is_stop_requested() { BLACK } else { WHITE };
            frame.fill(color);
        }

        fn release_resources(&mut self) {
            Counters::bump(&self.counters.releases);
        }
    }

    /// takes `linger` wind-down frames before it is ready
    struct Linger {
        counters: Rc<Counters>,
        linger: u32,
        remaining: u32,
    }

    impl Linger {
        fn new(counters: Rc<Counters>, linger: u32) -> Self {
            Self {
                counters,
                linger,
                remaining: 0,
            }
        }
    }

    impl Pattern for Linger {
        fn description(&self) -> &'static str {
            "Linger"
        }

        fn setup(&mut self, _ctx: &mut FrameContext<'_>) -> LightsResult<()> {
            Counters::bump(&self.counters.setups);
            self.remaining = self.linger;
            Ok(())
        }

        fn update(&mut self, _frame: &mut [RGB8], _ctx: &mut FrameContext<'_>, state: RunState) {
            Counters::bump(&self.counters.updates);

            if state.is_stop_requested() {
                self.remaining = self.remaining.saturating_sub(1);
            }
        }

        fn ready_to_stop(&self) -> bool {
            self.remaining == 0
        }

        fn release_resources(&mut self) {
            Counters::bump(&self.counters.releases);
        }
    }

    /// a Blink with a Linger on top
    struct Parent {
        counters: Rc<Counters>,
        child_counters: Rc<Counters>,
        child_linger: u32,
    }

    impl Pattern for Parent {
        fn description(&self) -> &'static str {
            "Parent"
        }

        fn setup(&mut self, _ctx: &mut FrameContext<'_>) -> LightsResult<()> {
            Counters::bump(&self.counters.setups);
            Ok(())
        }

        fn update(&mut self, frame: &mut [RGB8], _ctx: &mut FrameContext<'_>, _state: RunState) {
            Counters::bump(&self.counters.updates);
            frame.fill(WHITE);
        }

        fn make_sub_pattern(&mut self, _ctx: &mut FrameContext<'_>) -> Option<Box<dyn Pattern>> {
            Some(Box::new(Linger::new(
                self.child_counters.clone(),
                self.child_linger,
            )))
        }

        fn release_resources(&mut self) {
            Counters::bump(&self.counters.releases);
        }
    }

    /// asks for far more memory than exists
    struct Greedy {
        pool: Pool<u8>,
        counters: Rc<Counters>,
    }

    impl Pattern for Greedy {
        fn description(&self) -> &'static str {
            "Greedy"
        }

        fn setup(&mut self, _ctx: &mut FrameContext<'_>) -> LightsResult<()> {
            Counters::bump(&self.counters.setups);
            self.pool.allocate(usize::MAX)
        }

        fn update(&mut self, _frame: &mut [RGB8], _ctx: &mut FrameContext<'_>, _state: RunState) {
            Counters::bump(&self.counters.updates);
        }

        fn release_resources(&mut self) {
            self.pool.release();
            Counters::bump(&self.counters.releases);
        }
    }

    fn blink() -> (PatternRunner, Rc<Counters>) {
        let counters = Rc::new(Counters::default());

        let runner = PatternRunner::from_pattern(Blink {
            counters: counters.clone(),
        });

        (runner, counters)
    }

    fn parent(child_linger: u32) -> (PatternRunner, Rc<Counters>, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let child_counters = Rc::new(Counters::default());

        let runner = PatternRunner::from_pattern(Parent {
            counters: counters.clone(),
            child_counters: child_counters.clone(),
            child_linger,
        });

        (runner, counters, child_counters)
    }

    #[test_log::test]
    fn test_starts_inert() {
        let (runner, counters) = blink();

        assert!(runner.is_not_started());
        assert!(!runner.is_running());
        assert!(!runner.is_stopped());
        assert_eq!(runner.elapsed(Duration::from_secs(1)), None);
        assert_eq!(counters.setups.get(), 0);
    }

    #[test_log::test]
    fn test_single_wind_down_frame() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        driver.start(&mut runner).unwrap();
        assert!(runner.is_running());
        assert_eq!(counters.setups.get(), 1);

        driver.tick(&mut runner);
        assert_eq!(driver.frame[0], WHITE);

        driver.request_stop(&mut runner);
        assert!(runner.is_stop_requested());
        // nothing is released until the next frame
        assert_eq!(counters.releases.get(), 0);

        driver.tick(&mut runner);
        assert!(runner.is_stopped());
        assert_eq!(driver.frame[0], BLACK);
        assert_eq!(counters.updates.get(), 2);
        assert_eq!(counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_start_then_force_stop() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        driver.start(&mut runner).unwrap();
        runner.force_stop();

        assert!(runner.is_stopped());
        assert_eq!(counters.updates.get(), 0);
        assert_eq!(counters.releases.get(), 1);

        // the second one is a no-op
        runner.force_stop();
        assert!(runner.is_stopped());
        assert_eq!(counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_force_stop_before_start_releases_nothing() {
        let (mut runner, counters) = blink();

        runner.force_stop();

        assert!(runner.is_stopped());
        assert_eq!(counters.setups.get(), 0);
        assert_eq!(counters.releases.get(), 0);

        // still usable
        let mut driver = TestDriver::new(1);
        driver.start(&mut runner).unwrap();
        runner.force_stop();
        assert_eq!(counters.setups.get(), 1);
        assert_eq!(counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_force_stop_before_start_drops_waiting_sub_pattern() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        let child_counters = Rc::new(Counters::default());
        let mut ctx = driver.ctx();
        runner
            .set_sub_pattern(Box::new(Linger::new(child_counters.clone(), 2)), &mut ctx)
            .unwrap();

        runner.force_stop();

        assert!(runner.is_stopped());
        assert!(runner.sub_pattern().is_none());
        assert_eq!(counters.releases.get(), 0);
        assert_eq!(child_counters.releases.get(), 0);
    }

    #[test_log::test]
    fn test_restart_after_stop() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        for i in 1..=3 {
            driver.start(&mut runner).unwrap();
            driver.tick(&mut runner);
            driver.request_stop(&mut runner);
            driver.tick(&mut runner);

            assert!(runner.is_stopped());
            assert_eq!(counters.setups.get(), i);
            assert_eq!(counters.releases.get(), i);
        }
    }

    #[test_log::test]
    fn test_elapsed() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _) = blink();

        driver.now = Duration::from_millis(1_000);
        driver.start(&mut runner).unwrap();

        driver.now = Duration::from_millis(1_500);
        assert_eq!(
            runner.elapsed(driver.now),
            Some(Duration::from_millis(500))
        );

        driver.request_stop(&mut runner);
        driver.now = Duration::from_millis(1_600);
        assert_eq!(
            runner.run_state().stop_elapsed(driver.now),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            runner.elapsed(driver.now),
            Some(Duration::from_millis(600))
        );

        driver.tick(&mut runner);
        assert_eq!(runner.elapsed(driver.now), None);
    }

    #[test_log::test]
    fn test_request_stop_before_start() {
        let (mut runner, counters) = blink();

        runner.request_stop(Duration::ZERO);

        assert!(runner.is_not_started());
        assert_eq!(counters.releases.get(), 0);
    }

    #[test_log::test]
    fn test_sub_pattern_starts_with_parent() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _, child_counters) = parent(3);

        driver.start(&mut runner).unwrap();

        let sub = runner.sub_pattern().unwrap();
        assert_eq!(sub.description(), "Linger");
        assert!(sub.is_running());
        assert_eq!(child_counters.setups.get(), 1);

        driver.tick(&mut runner);
        assert_eq!(child_counters.updates.get(), 1);
    }

    #[test_log::test]
    fn test_parent_waits_for_sub_pattern() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters, child_counters) = parent(5);

        driver.start(&mut runner).unwrap();
        driver.tick(&mut runner);

        driver.request_stop(&mut runner);
        assert!(runner.is_stop_requested());
        assert!(runner.sub_pattern().unwrap().is_stop_requested());

        for _ in 0..4 {
            driver.tick(&mut runner);

            assert!(runner.is_stop_requested());
            assert!(!runner.sub_pattern().unwrap().is_stopped());
            assert_eq!(counters.releases.get(), 0);
        }

        driver.tick(&mut runner);

        assert!(runner.is_stopped());
        assert!(runner.sub_pattern().is_none());
        assert_eq!(counters.releases.get(), 1);
        assert_eq!(child_counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_force_stop_mid_wind_down() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters, child_counters) = parent(100);

        driver.start(&mut runner).unwrap();
        driver.request_stop(&mut runner);
        driver.tick(&mut runner);

        // logs a warning, but everything is still released
        runner.force_stop();

        assert!(runner.is_stopped());
        assert!(runner.sub_pattern().is_none());
        assert_eq!(counters.releases.get(), 1);
        assert_eq!(child_counters.releases.get(), 1);

        runner.force_stop();
        assert_eq!(counters.releases.get(), 1);
        assert_eq!(child_counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_set_sub_pattern_while_running() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _, first_counters) = parent(1);

        driver.start(&mut runner).unwrap();

        let second_counters = Rc::new(Counters::default());
        let mut ctx = driver.ctx();
        runner
            .set_sub_pattern(
                Box::new(Blink {
                    counters: second_counters.clone(),
                }),
                &mut ctx,
            )
            .unwrap();

        // the old one is gone before the new one starts
        assert_eq!(first_counters.releases.get(), 1);

        let sub = runner.sub_pattern().unwrap();
        assert_eq!(sub.description(), "Blink");
        assert!(sub.is_running());
        assert_eq!(second_counters.setups.get(), 1);
    }

    #[test_log::test]
    fn test_set_sub_pattern_while_stopping() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _) = blink();

        driver.start(&mut runner).unwrap();
        driver.request_stop(&mut runner);

        let child_counters = Rc::new(Counters::default());
        let mut ctx = driver.ctx();
        runner
            .set_sub_pattern(Box::new(Linger::new(child_counters.clone(), 2)), &mut ctx)
            .unwrap();

        assert!(runner.sub_pattern().unwrap().is_stop_requested());

        driver.tick(&mut runner);
        assert!(runner.is_stop_requested());

        driver.tick(&mut runner);
        assert!(runner.is_stopped());
        assert_eq!(child_counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_set_sub_pattern_before_start() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _) = blink();

        let child_counters = Rc::new(Counters::default());
        let mut ctx = driver.ctx();
        runner
            .set_sub_pattern(Box::new(Linger::new(child_counters.clone(), 2)), &mut ctx)
            .unwrap();

        assert!(runner.sub_pattern().unwrap().is_not_started());
        assert_eq!(child_counters.setups.get(), 0);

        driver.start(&mut runner).unwrap();
        assert!(runner.sub_pattern().unwrap().is_running());
        assert_eq!(child_counters.setups.get(), 1);

        runner.clear_sub_pattern();
        assert!(runner.sub_pattern().is_none());
        assert_eq!(child_counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_setup_failure_leaves_pattern_stopped() {
        let mut driver = TestDriver::new(1);
        let counters = Rc::new(Counters::default());
        let mut runner = PatternRunner::from_pattern(Greedy {
            pool: Pool::new(),
            counters: counters.clone(),
        });

        assert!(driver.start(&mut runner).is_err());

        assert!(runner.is_stopped());
        assert!(!runner.is_running());
        assert_eq!(counters.setups.get(), 1);
        assert_eq!(counters.releases.get(), 1);
        assert_eq!(counters.updates.get(), 0);
    }

    #[test_log::test]
    fn test_sub_pattern_setup_failure_stops_parent() {
        struct GreedyParent {
            counters: Rc<Counters>,
        }

        impl Pattern for GreedyParent {
            fn description(&self) -> &'static str {
                "Greedy Parent"
            }

            fn update(&mut self, _frame: &mut [RGB8], _ctx: &mut FrameContext<'_>, _state: RunState) {}

            fn make_sub_pattern(&mut self, _ctx: &mut FrameContext<'_>) -> Option<Box<dyn Pattern>> {
                Some(Box::new(Greedy {
                    pool: Pool::new(),
                    counters: self.counters.clone(),
                }))
            }
        }

        let mut driver = TestDriver::new(1);
        let counters = Rc::new(Counters::default());
        let mut runner = PatternRunner::from_pattern(GreedyParent {
            counters: counters.clone(),
        });

        assert!(driver.start(&mut runner).is_err());
        assert!(runner.is_stopped());
        assert!(runner.sub_pattern().is_none());
        assert_eq!(counters.releases.get(), 1);
    }

    #[test_log::test]
    fn test_idle_stop_default() {
        let (runner, _) = blink();

        assert!(runner.wants_to_idle_stop());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "updated while not started")]
    fn test_update_before_start_panics_in_debug() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _) = blink();

        driver.tick(&mut runner);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "started while running")]
    fn test_double_start_panics_in_debug() {
        let mut driver = TestDriver::new(1);
        let (mut runner, _) = blink();

        driver.start(&mut runner).unwrap();
        driver.start(&mut runner).unwrap();
    }

    #[cfg(not(debug_assertions))]
    #[test_log::test]
    fn test_update_before_start_is_ignored() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        driver.frame.fill(RGB8::new(1, 2, 3));
        driver.tick(&mut runner);

        assert!(runner.is_not_started());
        assert!(driver.frame.iter().all(|x| *x == RGB8::new(1, 2, 3)));
        assert_eq!(counters.updates.get(), 0);
    }

    #[cfg(not(debug_assertions))]
    #[test_log::test]
    fn test_double_start_is_ignored() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        driver.now = Duration::from_millis(100);
        driver.start(&mut runner).unwrap();

        driver.now = Duration::from_millis(300);
        driver.start(&mut runner).unwrap();

        assert!(runner.is_running());
        assert_eq!(counters.setups.get(), 1);
        // the first start time is kept
        assert_eq!(
            runner.elapsed(driver.now),
            Some(Duration::from_millis(200))
        );
    }

    #[cfg(not(debug_assertions))]
    #[test_log::test]
    fn test_update_after_stop_is_ignored() {
        let mut driver = TestDriver::new(1);
        let (mut runner, counters) = blink();

        driver.start(&mut runner).unwrap();
        runner.force_stop();

        driver.frame.fill(BLACK);
        driver.tick(&mut runner);

        assert!(runner.is_stopped());
        assert_eq!(driver.lit(), 0);
        assert_eq!(counters.updates.get(), 0);
        assert_eq!(counters.releases.get(), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Start,
        Update,
        RequestStop,
        ForceStop,
        Advance(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            1 => Just(Op::Start),
            6 => Just(Op::Update),
            1 => Just(Op::RequestStop),
            1 => Just(Op::ForceStop),
            2 => any::<u16>().prop_map(Op::Advance),
        ]
    }

    fn check_invariants(runner: &PatternRunner, now: Duration) {
        let state = runner.run_state();

        let exactly_one = [
            runner.is_not_started(),
            runner.is_running(),
            runner.is_stop_requested(),
            runner.is_stopped(),
        ]
        .into_iter()
        .filter(|x| *x)
        .count();
        assert_eq!(exactly_one, 1);

        assert!(!(runner.is_running() && runner.is_stopped()));
        assert_eq!(runner.elapsed(now).is_some(), state.is_active());

        match runner.sub_pattern() {
            None => {}
            Some(sub) => {
                // a stopped parent has already dropped its sub-pattern
                assert!(!runner.is_stopped());

                if runner.is_stop_requested() {
                    assert!(!sub.is_running());
                }
                if sub.is_running() || sub.is_stop_requested() {
                    assert!(state.is_active());
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_lifecycle_invariants(ops in proptest::collection::vec(op(), 1..200), linger in 0u32..5) {
            let mut driver = TestDriver::new(9);
            let (mut runner, counters, child_counters) = parent(linger);

            for op in ops {
                match op {
                    Op::Start => {
                        if !runner.run_state().is_active() {
                            driver.start(&mut runner).unwrap();
                        }
                    }
                    Op::Update => {
                        if runner.run_state().is_active() {
                            driver.update(&mut runner);
                        }
                    }
                    Op::RequestStop => driver.request_stop(&mut runner),
                    Op::ForceStop => runner.force_stop(),
                    Op::Advance(ms) => driver.now += Duration::from_millis(ms as u64),
                }

                check_invariants(&runner, driver.now);

                // every setup is matched by exactly one release once stopped
                if runner.is_stopped() {
                    prop_assert_eq!(counters.setups.get(), counters.releases.get());
                    prop_assert_eq!(child_counters.setups.get(), child_counters.releases.get());
                }
            }
        }
    }
}
