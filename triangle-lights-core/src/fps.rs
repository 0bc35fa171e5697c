//! Count frames against the driver's clock and log the rate every couple of seconds.
//!
//! The driver passes in its own "now" so this works the same on a microcontroller, in the terminal, and in tests.
use core::time::Duration;

use crate::logging::info;

pub struct FpsTracker {
    name: &'static str,
    last: Option<Duration>,
    count: u32,
    pub print_interval: Duration,
}

impl FpsTracker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            last: None,
            count: 0,
            print_interval: Duration::from_secs(2),
        }
    }

    /// returns the frames per second whenever a full interval has passed
    pub fn tick(&mut self, now: Duration) -> Option<u32> {
        let Some(last) = self.last else {
            // the first tick only starts the clock
            self.last = Some(now);
            self.count = 1;
            return None;
        };

        let elapsed = now.saturating_sub(last);

        let mut fps = None;

        if elapsed > self.print_interval {
            let x = (self.count as u128 * 1_000 / elapsed.as_millis()) as u32;

            info!("{} FPS: {}", self.name, x);

            self.count = 0;
            self.last = Some(now);

            fps = Some(x);
        }

        self.count += 1;

        fps
    }
}
