use std::time::{Duration, Instant};

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Time source driving the render loop.
///
/// `elapsed` is measured from the last `start`; `next_frame` returns when the next frame
/// callback is due.
pub trait Clock {
    /// Reset the origin to now.
    fn start(&mut self);
    /// Seconds since `start`.
    fn elapsed(&self) -> f64;
    /// Block (or advance) until the next frame callback.
    fn next_frame(&mut self);
}

/// Wall clock that sleeps to the next frame boundary.
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
    interval: Duration,
}

impl SystemClock {
    /// Clock ticking at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self {
            origin: Instant::now(),
            interval: Duration::from_secs_f64(fps.frame_duration_secs()),
        }
    }
}

impl Clock for SystemClock {
    fn start(&mut self) {
        self.origin = Instant::now();
    }

    fn elapsed(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn next_frame(&mut self) {
        let interval = self.interval.as_secs_f64();
        if interval <= 0.0 {
            return;
        }
        let elapsed = self.elapsed();
        let next = ((elapsed / interval).floor() + 1.0) * interval;
        let wait = next - elapsed;
        if wait > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(wait));
        }
    }
}

/// Deterministic clock advancing exactly one step per frame callback.
#[derive(Clone, Debug, PartialEq)]
pub struct SteppedClock {
    step_secs: f64,
    ticks: u64,
}

impl SteppedClock {
    /// One step per frame at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self {
            step_secs: fps.frame_duration_secs(),
            ticks: 0,
        }
    }

    /// Arbitrary step in seconds.
    ///
    /// The step must be finite and positive, otherwise `elapsed` would never reach the end of
    /// a render.
    pub fn with_step(step_secs: f64) -> ReelcastResult<Self> {
        if !step_secs.is_finite() || step_secs <= 0.0 {
            return Err(ReelcastError::validation(format!(
                "clock step must be finite and positive, got {step_secs}"
            )));
        }
        Ok(Self {
            step_secs,
            ticks: 0,
        })
    }

    /// Callbacks since `start`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Clock for SteppedClock {
    fn start(&mut self) {
        self.ticks = 0;
    }

    fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.step_secs
    }

    fn next_frame(&mut self) {
        self.ticks += 1;
    }
}
