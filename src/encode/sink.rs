use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::mix::MixedTrack;
use crate::encode::plan::{Container, EncoderCapabilities, EncodingPlan};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::render::backend::FrameRGBA;

/// One finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// MIME type the recorder produced.
    pub mime: String,
}

impl Blob {
    /// File extension implied by the produced MIME type.
    pub fn extension(&self) -> &'static str {
        Container::from_mime(&self.mime).extension()
    }
}

/// Recorder lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecorderState {
    /// Not started, stopped or aborted.
    #[default]
    Inactive,
    /// Accepting frames.
    Recording,
}

/// Encodes a captured frame stream plus an optional audio track into one [`Blob`].
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order between
/// `start` and `stop`.
pub trait Recorder {
    /// Begin recording with the negotiated plan and the merged audio track.
    fn start(&mut self, plan: &EncodingPlan, audio: Option<&MixedTrack>) -> ReelcastResult<()>;
    /// Append one captured frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelcastResult<()>;
    /// Finish and return every captured chunk as one blob.
    fn stop(&mut self) -> ReelcastResult<Blob>;
    /// Stop without producing output. Safe to call in any state.
    fn abort(&mut self);
    /// Current state.
    fn state(&self) -> RecorderState;
}

/// Host media pipeline: reports what it can encode and creates recorders.
pub trait MediaRuntime {
    /// What this runtime can record.
    fn capabilities(&self) -> EncoderCapabilities;
    /// Create a recorder for `plan`.
    fn create_recorder(&self, plan: &EncodingPlan) -> ReelcastResult<Box<dyn Recorder>>;
}

/// Where an [`InMemoryRecorder`] should fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePoint {
    /// Never fail.
    #[default]
    None,
    /// Fail in `start`.
    Start,
    /// Fail when this frame index is pushed.
    Frame(u64),
    /// Fail in `stop`.
    Stop,
}

/// What an [`InMemoryRecorder`] saw, readable after the recorder is gone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecorderLog {
    /// Plan passed to `start`.
    pub plan: Option<EncodingPlan>,
    /// Frames accepted.
    pub frames: u64,
    /// Last accepted frame index.
    pub last_index: Option<FrameIndex>,
    /// Audio sample frames attached at start.
    pub audio_frames: usize,
    /// `stop` produced a blob.
    pub stopped: bool,
    /// `abort` was called while recording.
    pub aborted: bool,
    /// Current state.
    pub state: RecorderState,
}

/// Shared handle to a [`RecorderLog`].
#[derive(Clone, Debug, Default)]
pub struct RecorderProbe(Arc<Mutex<RecorderLog>>);

impl RecorderProbe {
    /// Snapshot of the log.
    pub fn snapshot(&self) -> RecorderLog {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderLog> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Recorder that keeps counts instead of encoding; for tests and dry runs.
///
/// The produced blob is a short text summary tagged with the plan's MIME type.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    fail_at: FailurePoint,
    probe: RecorderProbe,
}

impl InMemoryRecorder {
    /// Recorder that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that fails at `point`.
    pub fn failing_at(point: FailurePoint) -> Self {
        Self {
            fail_at: point,
            probe: RecorderProbe::default(),
        }
    }

    /// Handle for inspecting the recorder after it has been moved into a render.
    pub fn probe(&self) -> RecorderProbe {
        self.probe.clone()
    }
}

impl Recorder for InMemoryRecorder {
    fn start(&mut self, plan: &EncodingPlan, audio: Option<&MixedTrack>) -> ReelcastResult<()> {
        if self.fail_at == FailurePoint::Start {
            return Err(ReelcastError::encode("recorder failed to start"));
        }
        let mut log = self.probe.lock();
        if log.state == RecorderState::Recording {
            return Err(ReelcastError::encode("recorder already started"));
        }
        *log = RecorderLog {
            plan: Some(plan.clone()),
            audio_frames: audio.map_or(0, MixedTrack::frames),
            state: RecorderState::Recording,
            ..RecorderLog::default()
        };
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelcastResult<()> {
        if self.fail_at == FailurePoint::Frame(idx.0) {
            return Err(ReelcastError::encode(format!(
                "recorder failed on frame {}",
                idx.0
            )));
        }
        let mut log = self.probe.lock();
        if log.state != RecorderState::Recording {
            return Err(ReelcastError::encode("recorder is not recording"));
        }
        if log.last_index.is_some_and(|last| idx <= last) {
            return Err(ReelcastError::encode("recorder received out-of-order frame index"));
        }
        if let Some(plan) = log.plan.as_ref()
            && (frame.width != plan.canvas.width || frame.height != plan.canvas.height)
        {
            return Err(ReelcastError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, plan.canvas.width, plan.canvas.height
            )));
        }
        log.frames += 1;
        log.last_index = Some(idx);
        Ok(())
    }

    fn stop(&mut self) -> ReelcastResult<Blob> {
        let mut log = self.probe.lock();
        if log.state != RecorderState::Recording {
            return Err(ReelcastError::encode("recorder is not recording"));
        }
        log.state = RecorderState::Inactive;
        if self.fail_at == FailurePoint::Stop {
            return Err(ReelcastError::encode("recorder failed while finalizing"));
        }
        log.stopped = true;
        let mime = log
            .plan
            .as_ref()
            .map(|p| p.mime.clone())
            .unwrap_or_default();
        let bytes = format!(
            "{mime}\nframes={}\naudio_frames={}\n",
            log.frames, log.audio_frames
        )
        .into_bytes();
        Ok(Blob { bytes, mime })
    }

    fn abort(&mut self) {
        let mut log = self.probe.lock();
        if log.state == RecorderState::Recording {
            log.aborted = true;
        }
        log.state = RecorderState::Inactive;
    }

    fn state(&self) -> RecorderState {
        self.probe.lock().state
    }
}

/// Runtime handing out [`InMemoryRecorder`]s.
#[derive(Clone, Debug)]
pub struct InMemoryRuntime {
    caps: EncoderCapabilities,
    fail_at: FailurePoint,
    probes: Arc<Mutex<Vec<RecorderProbe>>>,
}

impl Default for InMemoryRuntime {
    fn default() -> Self {
        Self::new(EncoderCapabilities::all())
    }
}

impl InMemoryRuntime {
    /// Runtime advertising `caps`.
    pub fn new(caps: EncoderCapabilities) -> Self {
        Self {
            caps,
            fail_at: FailurePoint::None,
            probes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every recorder created from now on fails at `point`.
    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.fail_at = point;
        self
    }

    /// Probes of every recorder created so far, oldest first.
    pub fn probes(&self) -> Vec<RecorderProbe> {
        self.probes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MediaRuntime for InMemoryRuntime {
    fn capabilities(&self) -> EncoderCapabilities {
        self.caps.clone()
    }

    fn create_recorder(&self, _plan: &EncodingPlan) -> ReelcastResult<Box<dyn Recorder>> {
        let rec = InMemoryRecorder::failing_at(self.fail_at);
        self.probes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(rec.probe());
        Ok(Box::new(rec))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
