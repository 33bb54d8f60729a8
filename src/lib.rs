//! Reelcast renders narrated slideshow and talking-avatar videos.
//!
//! A render takes an immutable [`RenderRequest`] snapshot and runs it through a small state
//! machine:
//!
//! - Decode scene images, avatar layers and the watermark ([`assets`])
//! - Derive the authoritative duration from the narration ([`audio`])
//! - Negotiate an [`EncodingPlan`] and start a [`Recorder`] ([`encode`])
//! - Compose every frame on a [`RenderSurface`] and capture it at a constant rate ([`session`])
//!
//! [`Studio`] wraps this for hosts: previews, full renders, the one-click pipeline and downloads.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Resource fetching and media decoding.
pub mod assets;
/// Duration, mixing and PCM helpers.
pub mod audio;
/// Encoding negotiation and recorders.
pub mod encode;
/// Content, settings and render requests.
pub mod model;
/// Frame layout, composition and drawing surfaces.
pub mod render;
/// Render sessions: the frame loop, its clock, capture stream and progress reporting.
pub mod session;
/// Host-facing orchestration: previews, full renders, the one-click pipeline and downloads.
pub mod studio;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8, Size, Vec2};
pub use crate::foundation::error::{ReelcastError, ReelcastResult};

pub use crate::assets::decode::{MediaDecoder, NativeDecoder};
pub use crate::assets::loader::{AssetLoader, LoadedAssets};
pub use crate::assets::source::{ChainFetcher, LocalFetcher, ResourceFetcher};
pub use crate::audio::timeline::{AudioTimeline, TimelineBuilder};
pub use crate::encode::ffmpeg::{FfmpegRecorder, FfmpegRuntime};
pub use crate::encode::plan::{EncoderCapabilities, EncodingPlan, negotiate};
pub use crate::encode::sink::{Blob, InMemoryRecorder, InMemoryRuntime, MediaRuntime, Recorder};
pub use crate::model::content::{RenderableContent, Scene};
pub use crate::model::request::RenderRequest;
pub use crate::model::settings::{
    AspectRatio, AvatarConfig, OutputFormat, RenderMode, Resolution, VideoSettings,
    WatermarkPosition, WatermarkSettings,
};
pub use crate::render::backend::{FrameRGBA, RenderSurface, SurfaceKind};
pub use crate::render::compositor::{CompositorInput, render_still};
pub use crate::render::cpu::CpuSurface;
pub use crate::session::clock::{Clock, SteppedClock, SystemClock};
pub use crate::session::render_job::{
    CleanupReport, RenderJob, RenderObserver, RenderPhase, RenderServices, RenderedVideo,
    run_render,
};
pub use crate::studio::orchestrator::{Pacing, Studio, StudioState, download_file_name};
