use super::*;
use crate::assets::decode::NativeDecoder;
use crate::assets::source::{LocalFetcher, to_data_url};
use crate::audio::pcm::RawPcm;
use crate::encode::plan::{EncoderCapabilities, MIME_MP4, MIME_MP4_AVC1, MIME_WEBM_VP9};
use crate::encode::sink::{FailurePoint, InMemoryRuntime};
use crate::model::content::{RenderableContent, Scene};
use crate::model::settings::{OutputFormat, RenderMode, VideoSettings};
use crate::session::clock::SteppedClock;

fn content(n: usize) -> RenderableContent {
    RenderableContent::new(
        "Deck",
        (0..n)
            .map(|i| Scene::new(format!("s{i}"), format!("scene number {i}")))
            .collect(),
    )
}

fn settings() -> VideoSettings {
    VideoSettings {
        frame_rate: 2,
        ..VideoSettings::default()
    }
}

fn wav_url(secs: f64) -> String {
    let samples = (secs * 24_000.0).round() as usize;
    let wav = RawPcm::speech(vec![0u8; samples * 2]).to_wav().unwrap();
    to_data_url("audio/wav", &wav)
}

fn services(runtime: &InMemoryRuntime) -> RenderServices<'_> {
    RenderServices::new(
        Arc::new(LocalFetcher::default()),
        Arc::new(NativeDecoder),
        runtime,
    )
    .with_surface(SurfaceKind::Headless)
}

fn clock() -> SteppedClock {
    SteppedClock::with_step(0.5).unwrap()
}

#[test]
fn preview_renders_one_frame_per_tick_and_finishes_at_100() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);
    let req = RenderRequest::preview(content(3), settings());
    let mut log = ObserverLog::default();

    let video = run_render(&req, &services, &mut clock(), &mut log).unwrap();

    assert_eq!(video.total_duration, 12.0);
    assert_eq!(video.frames_captured, 24);
    assert_eq!(video.blob.mime, MIME_WEBM_VP9);
    assert!(video.cleanup.is_complete());
    assert_eq!(
        log.phases,
        vec![
            RenderPhase::Loading,
            RenderPhase::Recording,
            RenderPhase::Finalizing,
            RenderPhase::Done
        ]
    );
    assert_eq!(log.progress.last(), Some(&100));
    assert!(log.progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(log.cleanups.len(), 1);

    let rec = runtime.probes()[0].snapshot();
    assert!(rec.stopped);
    assert_eq!(rec.audio_frames, 0);
}

#[test]
fn full_render_attaches_audio_and_follows_narration_length() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);
    let mut req = RenderRequest::full(content(2), settings(), wav_url(1.5));
    req.music = Some(wav_url(0.25));

    let video = run_render(&req, &services, &mut clock(), &mut NoopObserver).unwrap();

    assert_eq!(video.total_duration, 1.5);
    assert_eq!(video.frames_captured, 3);
    let rec = runtime.probes()[0].snapshot();
    assert_eq!(rec.audio_frames, 72_000);
}

#[test]
fn mp4_preference_is_honoured_when_supported_and_falls_back_otherwise() {
    let mut s = settings();
    s.format = Some(OutputFormat::Mp4);
    let req = RenderRequest::preview(content(1), s);

    let runtime = InMemoryRuntime::default();
    let video = run_render(&req, &services(&runtime), &mut clock(), &mut NoopObserver).unwrap();
    assert_eq!(video.blob.mime, MIME_MP4);
    assert_eq!(video.blob.extension(), "mp4");

    let runtime = InMemoryRuntime::new(EncoderCapabilities::webm_only());
    let video = run_render(&req, &services(&runtime), &mut clock(), &mut NoopObserver).unwrap();
    assert_eq!(video.blob.mime, MIME_WEBM_VP9);
    assert!(video.plan.fell_back);
}

#[test]
fn preconditions_fail_before_any_recorder_exists() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);

    let empty = RenderRequest::preview(content(0), settings());
    let mut log = ObserverLog::default();
    let err = run_render(&empty, &services, &mut clock(), &mut log).unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(log.phases.last(), Some(&RenderPhase::Failed));
    assert_eq!(log.cleanups.len(), 1);
    assert!(log.cleanups[0].is_complete());

    let mut no_narration = RenderRequest::preview(content(1), settings());
    no_narration.preview = false;
    assert!(
        run_render(&no_narration, &services, &mut clock(), &mut NoopObserver)
            .unwrap_err()
            .is_precondition()
    );

    let mut avatar = RenderRequest::preview(content(1), settings());
    avatar.mode = RenderMode::Avatar;
    assert!(
        run_render(&avatar, &services, &mut clock(), &mut NoopObserver)
            .unwrap_err()
            .is_precondition()
    );

    assert!(runtime.probes().is_empty());
}

#[test]
fn runtime_without_webm_records_mp4_instead() {
    let runtime = InMemoryRuntime::new(EncoderCapabilities::new([MIME_MP4, MIME_MP4_AVC1]));
    let req = RenderRequest::preview(content(1), settings());
    let mut log = ObserverLog::default();

    let video = run_render(&req, &services(&runtime), &mut clock(), &mut log).unwrap();

    assert!(video.plan.fell_back);
    assert_eq!(video.plan.mime, MIME_MP4);
    assert_eq!(video.blob.extension(), "mp4");
    assert!(log.cleanups[0].is_complete());
}

#[test]
fn runtime_without_any_format_is_an_error() {
    let runtime = InMemoryRuntime::new(EncoderCapabilities::new(Vec::<String>::new()));
    let req = RenderRequest::preview(content(1), settings());
    let mut log = ObserverLog::default();
    assert!(run_render(&req, &services(&runtime), &mut clock(), &mut log).is_err());
    assert!(log.cleanups[0].is_complete());
    assert!(runtime.probes().is_empty());
}

#[test]
fn every_recorder_failure_point_still_cleans_up_once() {
    for point in [
        FailurePoint::Start,
        FailurePoint::Frame(0),
        FailurePoint::Frame(5),
        FailurePoint::Stop,
    ] {
        let runtime = InMemoryRuntime::default().failing_at(point);
        let req = RenderRequest::preview(content(2), settings());
        let mut log = ObserverLog::default();

        let res = run_render(&req, &services(&runtime), &mut clock(), &mut log);

        assert!(res.is_err(), "{point:?} should fail the render");
        assert_eq!(log.phases.last(), Some(&RenderPhase::Failed), "{point:?}");
        assert_eq!(log.cleanups.len(), 1, "{point:?}");
        assert!(log.cleanups[0].is_complete(), "{point:?}");
        assert_eq!(
            runtime.probes()[0].snapshot().state,
            RecorderState::Inactive,
            "{point:?}"
        );
        assert!(!log.progress.contains(&100), "{point:?}");
    }
}

#[test]
fn dropping_a_recording_job_aborts_the_recorder() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);
    let mut log = ObserverLog::default();
    {
        let mut job = RenderJob::new(
            RenderRequest::preview(content(1), settings()),
            &services,
            &mut log,
        );
        job.load().unwrap();
        let out = job.step(0.0).unwrap();
        assert!(out.frame_drawn);
        assert_eq!(job.phase(), RenderPhase::Recording);
        assert!(job.take_output().is_err());
    }
    let rec = runtime.probes()[0].snapshot();
    assert!(rec.aborted);
    assert!(!rec.stopped);
    assert_eq!(log.cleanups.len(), 1);
    assert!(log.cleanups[0].is_complete());
}

#[test]
fn release_is_idempotent_and_steps_after_done_are_inert() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);
    let mut log = ObserverLog::default();
    {
        let mut job = RenderJob::new(
            RenderRequest::preview(content(1), settings()),
            &services,
            &mut log,
        );
        assert!(job.step(0.0).is_err());
        job.load().unwrap();
        assert!(job.load().is_err());
        let done = job.step(4.0).unwrap();
        assert_eq!(done.phase, RenderPhase::Done);
        assert_eq!(done.progress, 100);
        let again = job.step(5.0).unwrap();
        assert!(!again.frame_drawn);

        let first = job.release();
        let second = job.release();
        assert_eq!(first, second);
        assert!(job.take_output().is_ok());
        assert!(job.take_output().is_err());
    }
    assert_eq!(log.cleanups.len(), 1);
}

#[test]
fn late_steps_fill_missed_capture_ticks() {
    let runtime = InMemoryRuntime::default();
    let services = services(&runtime);
    let mut log = ObserverLog::default();
    let mut job = RenderJob::new(
        RenderRequest::preview(content(1), settings()),
        &services,
        &mut log,
    );
    job.load().unwrap();
    job.step(0.0).unwrap();
    job.step(2.1).unwrap();
    job.step(4.0).unwrap();
    let video = job.take_output().unwrap();
    assert_eq!(video.frames_captured, 5);
}
