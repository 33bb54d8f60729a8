use crate::encode::sink::Recorder;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::render::backend::FrameRGBA;

/// Constant-rate frame stream sampled from the drawing surface.
///
/// Every capture tick `k` (at `k / fps` seconds) receives exactly one frame: the latest frame
/// drawn at or before it. A late draw fills the ticks it missed by repeating itself; a second
/// draw inside an already captured tick is not recorded.
#[derive(Clone, Debug)]
pub struct CaptureStream {
    fps: Fps,
    next_index: u64,
    live: bool,
}

impl CaptureStream {
    /// Live stream at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            next_index: 0,
            live: true,
        }
    }

    /// Capture rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Frames handed to the recorder so far.
    pub fn frames_captured(&self) -> u64 {
        self.next_index
    }

    /// `false` once [`CaptureStream::stop`] has run.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Push `frame`, drawn at `t` seconds, into every capture tick now due.
    ///
    /// Returns how many ticks it filled.
    pub fn capture(
        &mut self,
        t: f64,
        frame: &FrameRGBA,
        recorder: &mut dyn Recorder,
    ) -> ReelcastResult<u64> {
        if !self.live {
            return Err(ReelcastError::render("capture stream is stopped"));
        }
        let due = self.fps.secs_to_frames_floor(t.max(0.0)) + 1;
        let mut pushed = 0;
        while self.next_index < due {
            recorder.push_frame(FrameIndex(self.next_index), frame)?;
            self.next_index += 1;
            pushed += 1;
        }
        Ok(pushed)
    }

    /// Stop the stream's tracks. Idempotent.
    pub fn stop(&mut self) {
        self.live = false;
    }
}
