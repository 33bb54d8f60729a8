use std::sync::Arc;

use crate::assets::decode::MediaDecoder;
use crate::assets::loader::{AssetFailure, AssetLoader, LoadedAssets};
use crate::assets::media::MIX_SAMPLE_RATE;
use crate::assets::source::ResourceFetcher;
use crate::audio::mix::{AudioGraph, MUSIC_GAIN, NARRATION_GAIN};
use crate::audio::timeline::TimelineBuilder;
use crate::encode::plan::{EncodingPlan, negotiate};
use crate::encode::sink::{Blob, MediaRuntime, Recorder, RecorderState};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::request::RenderRequest;
use crate::render::backend::{RenderSurface, SurfaceKind, create_surface};
use crate::render::compositor::{CompositorInput, compose_frame};
use crate::session::capture::CaptureStream;
use crate::session::clock::Clock;
use crate::session::progress::ProgressTracker;

const MIX_CHANNELS: u16 = 2;

/// Lifecycle of one render attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Created, nothing loaded.
    Idle,
    /// Decoding assets and audio, negotiating the encoding.
    Loading,
    /// Recorder running; frames are being drawn.
    Recording,
    /// Duration reached; recorder stopping.
    Finalizing,
    /// Blob available.
    Done,
    /// Aborted by an error.
    Failed,
}

impl RenderPhase {
    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Result of one [`RenderJob::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Phase after the step.
    pub phase: RenderPhase,
    /// A frame was composed and captured.
    pub frame_drawn: bool,
    /// Progress after the step, 0..=100.
    pub progress: u8,
}

/// What the release of a render job tore down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// No frame callback remains scheduled.
    pub frame_callback_cancelled: bool,
    /// No recorder remains active.
    pub recorder_inactive: bool,
    /// The capture stream's tracks are stopped.
    pub tracks_stopped: bool,
    /// No audio graph remains open.
    pub audio_graph_closed: bool,
}

impl CleanupReport {
    /// Every native resource is released.
    pub fn is_complete(&self) -> bool {
        self.frame_callback_cancelled
            && self.recorder_inactive
            && self.tracks_stopped
            && self.audio_graph_closed
    }
}

/// Receives render lifecycle events.
pub trait RenderObserver {
    /// Called on every phase transition.
    fn on_phase(&mut self, _phase: RenderPhase) {}
    /// Called whenever progress moves forward.
    fn on_progress(&mut self, _percent: u8) {}
    /// Called exactly once per render job, when its resources are released.
    fn on_cleanup(&mut self, _report: &CleanupReport) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RenderObserver for NoopObserver {}

/// Observer that keeps every event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObserverLog {
    /// Phases in transition order.
    pub phases: Vec<RenderPhase>,
    /// Progress reports in order.
    pub progress: Vec<u8>,
    /// Cleanup reports.
    pub cleanups: Vec<CleanupReport>,
}

impl RenderObserver for ObserverLog {
    fn on_phase(&mut self, phase: RenderPhase) {
        self.phases.push(phase);
    }

    fn on_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn on_cleanup(&mut self, report: &CleanupReport) {
        self.cleanups.push(*report);
    }
}

/// Collaborators a render needs.
#[derive(Clone)]
pub struct RenderServices<'a> {
    /// Resolves image and audio references.
    pub fetcher: Arc<dyn ResourceFetcher>,
    /// Decodes fetched bytes.
    pub decoder: Arc<dyn MediaDecoder>,
    /// Encodes the captured stream.
    pub runtime: &'a dyn MediaRuntime,
    /// Drawing surface implementation.
    pub surface: SurfaceKind,
}

impl<'a> RenderServices<'a> {
    /// Services drawing on the CPU surface.
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        decoder: Arc<dyn MediaDecoder>,
        runtime: &'a dyn MediaRuntime,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            runtime,
            surface: SurfaceKind::Cpu,
        }
    }

    /// Use `kind` for drawing.
    pub fn with_surface(mut self, kind: SurfaceKind) -> Self {
        self.surface = kind;
        self
    }
}

/// A finished render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedVideo {
    /// Encoded output.
    pub blob: Blob,
    /// Negotiated encoding.
    pub plan: EncodingPlan,
    /// Authoritative duration in seconds.
    pub total_duration: f64,
    /// Frames handed to the recorder.
    pub frames_captured: u64,
    /// Assets that degraded to placeholders.
    pub asset_failures: Vec<AssetFailure>,
    /// Resources released at the end of the render.
    pub cleanup: CleanupReport,
}

/// One in-flight render: the state machine behind [`run_render`].
///
/// Owns the surface, capture stream, recorder and audio graph exclusively. Resources are
/// released exactly once, by [`RenderJob::release`] or on drop.
pub struct RenderJob<'a> {
    request: RenderRequest,
    services: &'a RenderServices<'a>,
    observer: &'a mut dyn RenderObserver,
    phase: RenderPhase,
    assets: LoadedAssets,
    total_duration: f64,
    plan: Option<EncodingPlan>,
    surface: Option<Box<dyn RenderSurface>>,
    recorder: Option<Box<dyn Recorder>>,
    graph: Option<AudioGraph>,
    capture: Option<CaptureStream>,
    progress: ProgressTracker,
    frame_callback_pending: bool,
    blob: Option<Blob>,
    cleanup: Option<CleanupReport>,
}

impl<'a> RenderJob<'a> {
    /// Idle job over a snapshot of `request`.
    pub fn new(
        request: RenderRequest,
        services: &'a RenderServices<'a>,
        observer: &'a mut dyn RenderObserver,
    ) -> Self {
        Self {
            request,
            services,
            observer,
            phase: RenderPhase::Idle,
            assets: LoadedAssets::default(),
            total_duration: 0.0,
            plan: None,
            surface: None,
            recorder: None,
            graph: None,
            capture: None,
            progress: ProgressTracker::new(),
            frame_callback_pending: false,
            blob: None,
            cleanup: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Last reported progress.
    pub fn progress(&self) -> u8 {
        self.progress.current()
    }

    /// Authoritative duration; 0 until loaded.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Negotiated encoding, once loaded.
    pub fn plan(&self) -> Option<&EncodingPlan> {
        self.plan.as_ref()
    }

    fn set_phase(&mut self, phase: RenderPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "render phase");
        self.phase = phase;
        self.observer.on_phase(phase);
    }

    fn fail(&mut self, err: ReelcastError) -> ReelcastError {
        self.set_phase(RenderPhase::Failed);
        err
    }

    /// Load everything the render needs and start recording.
    ///
    /// Precondition failures (no scenes, missing narration, invalid duration, missing avatar
    /// layers) are raised here, before any recorder is started.
    pub fn load(&mut self) -> ReelcastResult<()> {
        if self.phase != RenderPhase::Idle {
            return Err(ReelcastError::render(format!(
                "cannot load a render job in phase {:?}",
                self.phase
            )));
        }
        self.set_phase(RenderPhase::Loading);
        match self.try_load() {
            Ok(()) => {
                self.set_phase(RenderPhase::Recording);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn try_load(&mut self) -> ReelcastResult<()> {
        let services = self.services;
        self.request.validate()?;

        let timeline = TimelineBuilder::new(
            Arc::clone(&services.fetcher),
            Arc::clone(&services.decoder),
        )
        .build(&self.request)?;
        self.total_duration = timeline.total_duration;

        let assets = AssetLoader::new(
            Arc::clone(&services.fetcher),
            Arc::clone(&services.decoder),
        )
        .load(&self.request);
        assets.require_for_mode(self.request.mode)?;
        self.assets = assets;

        let plan = negotiate(&self.request.settings, &services.runtime.capabilities())?;
        self.surface = Some(create_surface(
            services.surface,
            plan.canvas,
            self.assets.caption_font.as_deref().map(Vec::as_slice),
        )?);

        let graph = self
            .graph
            .insert(AudioGraph::open(MIX_SAMPLE_RATE, MIX_CHANNELS)?);
        if let Some(narration) = timeline.narration.as_ref() {
            graph.schedule(Arc::clone(narration), NARRATION_GAIN, false)?;
        }
        if let Some(music) = timeline.music.as_ref() {
            graph.schedule(Arc::clone(music), MUSIC_GAIN, true)?;
        }
        let audio = if graph.source_count() > 0 {
            Some(graph.render_merged(self.total_duration)?)
        } else {
            None
        };

        let recorder = self
            .recorder
            .insert(services.runtime.create_recorder(&plan)?);
        recorder.start(&plan, audio.as_ref())?;
        self.capture = Some(CaptureStream::new(plan.fps));

        tracing::info!(
            mode = ?self.request.mode,
            width = plan.canvas.width,
            height = plan.canvas.height,
            duration = self.total_duration,
            mime = %plan.mime,
            bitrate = plan.video_bitrate,
            fell_back = plan.fell_back,
            "recording started"
        );
        self.plan = Some(plan);
        Ok(())
    }

    /// Advance the render to `elapsed` seconds after recording started.
    ///
    /// Draws and captures one frame while `elapsed < total_duration`; at or past the duration it
    /// stops the recorder and moves to [`RenderPhase::Done`].
    pub fn step(&mut self, elapsed: f64) -> ReelcastResult<StepOutcome> {
        match self.phase {
            RenderPhase::Recording => {}
            RenderPhase::Done => {
                return Ok(StepOutcome {
                    phase: RenderPhase::Done,
                    frame_drawn: false,
                    progress: self.progress.current(),
                });
            }
            other => {
                return Err(ReelcastError::render(format!(
                    "cannot step a render job in phase {other:?}"
                )));
            }
        }

        if elapsed >= self.total_duration {
            return self.finalize();
        }

        if let Err(e) = self.draw_and_capture(elapsed) {
            return Err(self.fail(e));
        }
        if let Some(p) = self.progress.update(elapsed, self.total_duration) {
            self.observer.on_progress(p);
        }
        self.frame_callback_pending = true;
        Ok(StepOutcome {
            phase: self.phase,
            frame_drawn: true,
            progress: self.progress.current(),
        })
    }

    fn draw_and_capture(&mut self, elapsed: f64) -> ReelcastResult<()> {
        let (Some(surface), Some(recorder), Some(capture)) = (
            self.surface.as_mut(),
            self.recorder.as_mut(),
            self.capture.as_mut(),
        ) else {
            return Err(ReelcastError::render("render job is missing its pipeline"));
        };
        let input = CompositorInput::from_request(&self.request, &self.assets, self.total_duration);
        let plan = compose_frame(&input, elapsed, surface.measurer());
        let frame = surface.execute(&plan)?;
        capture.capture(elapsed, &frame, recorder.as_mut())?;
        Ok(())
    }

    fn finalize(&mut self) -> ReelcastResult<StepOutcome> {
        self.frame_callback_pending = false;
        self.set_phase(RenderPhase::Finalizing);
        let stopped = match self.recorder.as_mut() {
            Some(rec) => rec.stop(),
            None => Err(ReelcastError::render("render job has no recorder")),
        };
        if let Some(capture) = self.capture.as_mut() {
            capture.stop();
        }
        match stopped {
            Ok(blob) => {
                self.blob = Some(blob);
                if let Some(p) = self.progress.finish() {
                    self.observer.on_progress(p);
                }
                self.set_phase(RenderPhase::Done);
                Ok(StepOutcome {
                    phase: RenderPhase::Done,
                    frame_drawn: false,
                    progress: self.progress.current(),
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Hand out the finished video. Only valid in [`RenderPhase::Done`], and only once.
    pub fn take_output(&mut self) -> ReelcastResult<RenderedVideo> {
        if self.phase != RenderPhase::Done {
            return Err(ReelcastError::render(format!(
                "render output is not available in phase {:?}",
                self.phase
            )));
        }
        let blob = self
            .blob
            .take()
            .ok_or_else(|| ReelcastError::render("render output was already taken"))?;
        let plan = self
            .plan
            .clone()
            .ok_or_else(|| ReelcastError::render("render job has no encoding plan"))?;
        Ok(RenderedVideo {
            blob,
            plan,
            total_duration: self.total_duration,
            frames_captured: self.capture.as_ref().map_or(0, CaptureStream::frames_captured),
            asset_failures: self.assets.failures.clone(),
            cleanup: self.cleanup.unwrap_or_default(),
        })
    }

    /// Release every native resource. Runs once; later calls return the first report.
    pub fn release(&mut self) -> CleanupReport {
        if let Some(report) = self.cleanup {
            return report;
        }

        self.frame_callback_pending = false;

        let recorder_inactive = match self.recorder.as_mut() {
            Some(rec) => {
                if rec.state() != RecorderState::Inactive {
                    tracing::warn!("aborting active recorder during cleanup");
                    rec.abort();
                }
                rec.state() == RecorderState::Inactive
            }
            None => true,
        };

        let tracks_stopped = match self.capture.as_mut() {
            Some(capture) => {
                capture.stop();
                !capture.is_live()
            }
            None => true,
        };

        let audio_graph_closed = match self.graph.as_mut() {
            Some(graph) => {
                graph.close();
                !graph.is_open()
            }
            None => true,
        };

        let report = CleanupReport {
            frame_callback_cancelled: !self.frame_callback_pending,
            recorder_inactive,
            tracks_stopped,
            audio_graph_closed,
        };
        tracing::debug!(?report, phase = ?self.phase, "render resources released");
        self.cleanup = Some(report);
        self.observer.on_cleanup(&report);
        report
    }
}

impl Drop for RenderJob<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Render `request` from loading to a finished blob.
///
/// The request is snapshotted up front. Resources are released exactly once on every path,
/// and no output is returned unless the render reached its duration.
#[tracing::instrument(
    skip_all,
    fields(mode = ?request.mode, preview = request.preview, scenes = request.content.scenes.len())
)]
pub fn run_render(
    request: &RenderRequest,
    services: &RenderServices<'_>,
    clock: &mut dyn Clock,
    observer: &mut dyn RenderObserver,
) -> ReelcastResult<RenderedVideo> {
    let mut job = RenderJob::new(request.clone(), services, observer);
    let result = drive(&mut job, clock);
    let cleanup = job.release();
    match result {
        Ok(mut video) => {
            video.cleanup = cleanup;
            tracing::info!(
                frames = video.frames_captured,
                bytes = video.blob.bytes.len(),
                mime = %video.blob.mime,
                "render finished"
            );
            Ok(video)
        }
        Err(e) => {
            tracing::warn!(error = %e, "render failed");
            Err(e)
        }
    }
}

fn drive(job: &mut RenderJob<'_>, clock: &mut dyn Clock) -> ReelcastResult<RenderedVideo> {
    job.load()?;
    clock.start();
    loop {
        let outcome = job.step(clock.elapsed())?;
        if outcome.phase == RenderPhase::Done {
            break;
        }
        clock.next_frame();
    }
    job.take_output()
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_job.rs"]
mod tests;
