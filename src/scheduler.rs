//! Caller-driven device loop.

use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::device::Device;
use crate::error::Result;

/// Minimum sleep per loop iteration; bounds CPU usage regardless of the
/// delegate's requested interval.
pub const LOOP_MIN_INTERVAL: Duration = Duration::from_millis(5);

/// Delegate driven by [`Device::run`].
pub trait LoopDelegate {
    /// Minimum time between [`tick`](Self::tick) invocations.
    fn interval(&self) -> Duration;

    /// Invoked once per elapsed interval with the running device.
    /// Calling [`Device::stop`] from here ends the loop after this
    /// iteration finishes.
    fn tick(&mut self, device: &mut Device) -> Result<()>;
}

impl Device {
    /// Runs the device loop until [`stop`](Self::stop) is called.
    ///
    /// Enables reporting on every analog-capable pin, then repeatedly: when
    /// at least the delegate's interval has elapsed since the previous tick,
    /// invokes the delegate and drains one pending protocol message; sleeps
    /// [`LOOP_MIN_INTERVAL`] each iteration. The loop is non-preemptive: the
    /// post-tick drain may block on at most one pending message before the
    /// stop flag is observed again.
    pub fn run<D: LoopDelegate>(&mut self, delegate: &mut D) -> Result<()> {
        debug!("starting device loop");
        self.report_analog_pin_all(true)?;
        self.running = true;
        let interval = delegate.interval();
        let mut last_tick: Option<Instant> = None;
        while self.running {
            if last_tick.is_none_or(|t| t.elapsed() >= interval) {
                delegate.tick(self)?;
                last_tick = Some(Instant::now());
                self.drain()?;
            }
            thread::sleep(LOOP_MIN_INTERVAL);
        }
        debug!("device loop stopped");
        Ok(())
    }

    /// Requests loop termination; observed at the next iteration boundary.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Consumes one pending protocol message, unless a synchronous query
    /// already consumed traffic since the previous drain. Keeps unsolicited
    /// reports flowing between delegate ticks.
    pub fn drain(&mut self) -> Result<()> {
        if self.idle {
            self.dispatch_message()?;
        }
        self.idle = true;
        Ok(())
    }
}
