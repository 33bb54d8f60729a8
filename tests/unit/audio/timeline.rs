use super::*;
use crate::assets::decode::NativeDecoder;
use crate::assets::source::{FetchedResource, LocalFetcher, to_data_url};
use crate::audio::pcm::RawPcm;
use crate::model::content::{RenderableContent, Scene};
use crate::model::settings::VideoSettings;

fn content(n: usize) -> RenderableContent {
    RenderableContent::new(
        "t",
        (0..n).map(|i| Scene::new(format!("{i}"), "x")).collect(),
    )
}

fn wav_url(secs: f64) -> String {
    let samples = (secs * 24_000.0).round() as usize;
    let wav = RawPcm::speech(vec![0u8; samples * 2]).to_wav().unwrap();
    to_data_url("audio/wav", &wav)
}

fn builder() -> TimelineBuilder {
    TimelineBuilder::new(Arc::new(LocalFetcher::default()), Arc::new(NativeDecoder))
}

struct NanDecoder;

impl MediaDecoder for NanDecoder {
    fn decode_image(
        &self,
        _res: &FetchedResource,
    ) -> ReelcastResult<crate::assets::decode::Bitmap> {
        Err(ReelcastError::decode("unused"))
    }

    fn decode_audio(&self, _res: &FetchedResource) -> ReelcastResult<AudioPcm> {
        Ok(AudioPcm {
            sample_rate: 0,
            channels: 1,
            interleaved_f32: Vec::new(),
        })
    }
}

#[test]
fn preview_duration_is_four_seconds_per_scene() {
    let req = RenderRequest::preview(content(3), VideoSettings::default());
    let tl = builder().build(&req).unwrap();
    assert_eq!(tl.total_duration, 12.0);
    assert!(!tl.has_audio());
    assert_eq!(
        tl.source,
        DurationSource::Preview {
            scenes: 3,
            secs_per_scene: 4.0
        }
    );
}

#[test]
fn full_duration_equals_narration_exactly() {
    let req = RenderRequest::full(content(1), VideoSettings::default(), wav_url(17.5));
    let tl = builder().build(&req).unwrap();
    assert_eq!(tl.total_duration, 17.5);
    assert_eq!(tl.source, DurationSource::Narration);
    assert!(tl.music.is_none());
}

#[test]
fn music_does_not_change_duration_and_bad_music_is_skipped() {
    let mut req = RenderRequest::full(content(2), VideoSettings::default(), wav_url(1.5));
    req.music = Some(wav_url(0.25));
    let tl = builder().build(&req).unwrap();
    assert_eq!(tl.total_duration, 1.5);
    assert!(tl.music.is_some());

    req.music = Some("data:audio/wav;base64,AAAA".to_string());
    let tl = builder().build(&req).unwrap();
    assert!(tl.music.is_none());
}

#[test]
fn nan_narration_duration_is_rejected() {
    let req = RenderRequest::full(content(1), VideoSettings::default(), wav_url(1.0));
    let b = TimelineBuilder::new(Arc::new(LocalFetcher::default()), Arc::new(NanDecoder));
    let err = b.build(&req).unwrap_err();
    assert!(matches!(err, ReelcastError::InvalidAudioDuration(d) if d.is_nan()));
    assert!(err.to_string().contains("invalid audio duration"));
}

#[test]
fn missing_or_broken_narration_is_fatal() {
    let mut req = RenderRequest::full(content(1), VideoSettings::default(), "");
    assert!(builder().build(&req).unwrap_err().is_precondition());
    req.narration = Some("data:audio/wav;base64,AAAA".to_string());
    assert!(builder().build(&req).is_err());
}

#[test]
fn validate_duration_rules() {
    assert!(validate_duration(f64::INFINITY).is_err());
    assert!(validate_duration(0.0).is_err());
    assert!(validate_duration(-1.0).is_err());
    assert_eq!(validate_duration(0.5).unwrap(), 0.5);
}
