use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::decode::{MediaDecoder, NativeDecoder};
use crate::assets::source::{ChainFetcher, LocalFetcher, ResourceFetcher};
use crate::encode::sink::{Blob, MediaRuntime};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::content::RenderableContent;
use crate::model::request::RenderRequest;
use crate::model::settings::{
    AspectRatio, AvatarConfig, RenderMode, Resolution, VideoSettings, WatermarkSettings,
};
use crate::render::backend::SurfaceKind;
use crate::session::clock::{Clock, SteppedClock, SystemClock};
use crate::session::render_job::{RenderObserver, RenderServices, RenderedVideo, run_render};
use crate::studio::generator::{AudioPayload, GenerativeBackend, ImagePrompt};
use crate::studio::object_url::ObjectUrlRegistry;

/// How the frame loop is paced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// One frame per capture tick, as fast as the machine allows.
    #[default]
    Offline,
    /// Wall-clock pacing.
    Realtime,
}

/// What the active project remembers between sessions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectState {
    /// Content including any generated scene images.
    pub content: Option<RenderableContent>,
    /// Generated narration reference.
    pub narration_url: Option<String>,
    /// Last full render.
    pub video_url: Option<String>,
}

/// Host-owned, editable session state. Renders only ever see a snapshot of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudioState {
    /// Content being produced.
    pub content: Option<RenderableContent>,
    /// Slideshow or avatar.
    pub mode: RenderMode,
    /// Narration reference.
    pub narration_url: Option<String>,
    /// Background music reference.
    pub music_url: Option<String>,
    /// Avatar bitmap reference.
    pub avatar_image: Option<String>,
    /// Avatar-mode background reference.
    pub avatar_background: Option<String>,
    /// Avatar placement.
    pub avatar_config: AvatarConfig,
    /// Watermark bitmap reference.
    pub watermark_image: Option<String>,
    /// Watermark placement.
    pub watermark_settings: WatermarkSettings,
    /// Caption font reference.
    pub caption_font: Option<String>,
    /// Playable reference of the last render.
    pub video_url: Option<String>,
    /// `true` while the last render was a silent preview.
    pub is_video_preview: bool,
    /// `true` only while a render is running.
    pub is_rendering: bool,
    /// Progress of the running (or last) render.
    pub progress: u8,
    /// Message of the last failure.
    pub error: Option<String>,
    /// Persisted project.
    pub project: ProjectState,
}

struct ProgressMirror<'s> {
    progress: &'s mut u8,
}

impl RenderObserver for ProgressMirror<'_> {
    fn on_progress(&mut self, percent: u8) {
        *self.progress = percent;
    }
}

/// File name for a downloaded video: title with every whitespace character replaced by `_`
/// (`video` when that leaves nothing), the resolution tier, and the produced container extension.
pub fn download_file_name(title: Option<&str>, resolution: Resolution, extension: &str) -> String {
    let stem: String = title
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "video" } else { stem.as_str() };
    format!("{stem}_{}.{extension}", resolution.as_str())
}

/// Top-level entry points a UI drives: previews, full renders, the one-click pipeline and
/// downloads.
///
/// Every public operation clears `is_rendering` on return and records its failure in
/// [`StudioState::error`].
pub struct Studio {
    state: StudioState,
    urls: Arc<ObjectUrlRegistry>,
    fetcher: Arc<dyn ResourceFetcher>,
    decoder: Arc<dyn MediaDecoder>,
    runtime: Box<dyn MediaRuntime>,
    generator: Option<Arc<dyn GenerativeBackend>>,
    surface: SurfaceKind,
    pacing: Pacing,
}

impl Studio {
    /// Studio recording through `runtime`, resolving relative paths against the working directory.
    pub fn new(runtime: Box<dyn MediaRuntime>) -> Self {
        Self::with_root(runtime, ".")
    }

    /// Studio resolving relative asset paths against `root`.
    pub fn with_root(runtime: Box<dyn MediaRuntime>, root: impl Into<PathBuf>) -> Self {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let fetcher = ChainFetcher::new()
            .with(Arc::clone(&urls) as Arc<dyn ResourceFetcher>)
            .with(Arc::new(LocalFetcher::new(root)));
        Self {
            state: StudioState::default(),
            urls,
            fetcher: Arc::new(fetcher),
            decoder: Arc::new(NativeDecoder),
            runtime,
            generator: None,
            surface: SurfaceKind::Cpu,
            pacing: Pacing::Offline,
        }
    }

    /// Use `backend` for missing images and narration.
    pub fn with_generator(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.generator = Some(backend);
        self
    }

    /// Replace the media decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn MediaDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Draw on `kind`.
    pub fn with_surface(mut self, kind: SurfaceKind) -> Self {
        self.surface = kind;
        self
    }

    /// Pace the frame loop with `pacing`.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Current state.
    pub fn state(&self) -> &StudioState {
        &self.state
    }

    /// Editable state.
    pub fn state_mut(&mut self) -> &mut StudioState {
        &mut self.state
    }

    /// Replace the content, keeping the project in sync.
    pub fn set_content(&mut self, content: RenderableContent) {
        self.state.project.content = Some(content.clone());
        self.state.content = Some(content);
    }

    /// `blob:` references produced by this studio.
    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    /// Snapshot the state into a render request.
    pub fn request(
        &self,
        settings: &VideoSettings,
        preview: bool,
        narration_override: Option<&str>,
        content_override: Option<&RenderableContent>,
    ) -> ReelcastResult<RenderRequest> {
        let content = content_override
            .or(self.state.content.as_ref())
            .cloned()
            .ok_or_else(|| ReelcastError::precondition("no content to render"))?;
        let mut req = RenderRequest::preview(content, settings.clone());
        req.preview = preview;
        req.mode = self.state.mode;
        if !preview {
            req.narration = narration_override
                .map(str::to_string)
                .or_else(|| self.state.narration_url.clone());
            req.music = self.state.music_url.clone();
        }
        req.avatar_image = self.state.avatar_image.clone();
        req.avatar_background = self.state.avatar_background.clone();
        req.avatar_config = self.state.avatar_config;
        req.watermark_image = self.state.watermark_image.clone();
        req.watermark_settings = self.state.watermark_settings;
        req.caption_font = self.state.caption_font.clone();
        Ok(req)
    }

    fn render(&mut self, request: &RenderRequest) -> ReelcastResult<RenderedVideo> {
        if self.state.is_rendering {
            return Err(ReelcastError::precondition("a render is already in progress"));
        }
        self.state.is_rendering = true;
        self.state.error = None;
        self.state.progress = 0;

        let result = self.render_inner(request);

        self.state.is_rendering = false;
        if let Err(e) = result.as_ref() {
            self.state.error = Some(e.to_string());
            tracing::error!(error = %e, "render failed");
        }
        result
    }

    fn render_inner(&mut self, request: &RenderRequest) -> ReelcastResult<RenderedVideo> {
        let fps = request.settings.fps()?;
        let mut clock: Box<dyn Clock> = match self.pacing {
            Pacing::Offline => Box::new(SteppedClock::new(fps)),
            Pacing::Realtime => Box::new(SystemClock::new(fps)),
        };
        let services = RenderServices::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.decoder),
            self.runtime.as_ref(),
        )
        .with_surface(self.surface);
        let mut observer = ProgressMirror {
            progress: &mut self.state.progress,
        };
        run_render(request, &services, clock.as_mut(), &mut observer)
    }

    fn record<T>(&mut self, result: ReelcastResult<T>) -> ReelcastResult<T> {
        if let Err(e) = result.as_ref()
            && self.state.error.is_none()
        {
            self.state.error = Some(e.to_string());
        }
        result
    }

    /// Render a silent rough cut and expose it as the current video.
    #[tracing::instrument(skip_all)]
    pub fn generate_silent_preview(&mut self, settings: &VideoSettings) -> ReelcastResult<String> {
        self.state.is_video_preview = true;
        let req = self.request(settings, true, None, None);
        let req = self.record(req)?;
        let video = self.render(&req)?;
        let url = self.urls.create_from_blob(&video.blob);
        let old = self.state.video_url.replace(url.clone());
        self.release_unreferenced(old);
        Ok(url)
    }

    /// Drop the current preview and revoke its reference unless the project still uses it.
    pub fn clear_video_preview(&mut self) {
        self.state.is_video_preview = false;
        let old = self.state.video_url.take();
        self.release_unreferenced(old);
    }

    /// Revoke `url` once neither the current video nor the project points at it.
    fn release_unreferenced(&self, url: Option<String>) {
        let Some(url) = url else { return };
        let in_use = self.state.video_url.as_deref() == Some(url.as_str())
            || self.state.project.video_url.as_deref() == Some(url.as_str());
        if !in_use {
            self.urls.revoke(&url);
        }
    }

    /// Render and expose the result; full renders are also stored in the project.
    #[tracing::instrument(skip_all, fields(preview = preview))]
    pub fn combine_image_and_audio(
        &mut self,
        settings: &VideoSettings,
        preview: bool,
        narration_override: Option<&str>,
        content_override: Option<&RenderableContent>,
    ) -> ReelcastResult<String> {
        let req = self.request(settings, preview, narration_override, content_override);
        let req = self.record(req)?;
        let video = self.render(&req)?;
        let url = self.urls.create_from_blob(&video.blob);
        let old_video = self.state.video_url.replace(url.clone());
        let old_project = if preview {
            None
        } else {
            self.state.project.video_url.replace(url.clone())
        };
        self.release_unreferenced(old_video);
        self.release_unreferenced(old_project);
        Ok(url)
    }

    /// Generate whatever is missing (scene images, slideshow narration) and run a full render
    /// with default settings.
    #[tracing::instrument(skip_all)]
    pub fn auto_generate_video(&mut self) -> ReelcastResult<String> {
        self.state.error = None;
        let prepared = self.prepare_missing();
        let narration = self.record(prepared)?;
        self.combine_image_and_audio(&VideoSettings::default(), false, narration.as_deref(), None)
    }

    fn prepare_missing(&mut self) -> ReelcastResult<Option<String>> {
        let mut content = self
            .state
            .content
            .clone()
            .ok_or_else(|| ReelcastError::precondition("no content to render"))?;

        let missing = content.scenes_missing_images();
        if !missing.is_empty() {
            let generator = self.generator()?;
            tracing::info!(count = missing.len(), "generating missing scene images");
            for id in &missing {
                let Some(scene) = content.scenes.iter().find(|s| &s.id == id) else {
                    continue;
                };
                let url = generator.generate_scene_image(&ImagePrompt {
                    title: &content.title,
                    scene_text: &scene.text,
                    suggestion: &scene.visual_suggestion,
                    aspect_ratio: AspectRatio::Landscape,
                })?;
                content.set_scene_image(id, url);
                // Keep partial progress so a retry only generates what is still missing.
                self.set_content(content.clone());
            }
        }

        let has_narration = self
            .state
            .narration_url
            .as_deref()
            .is_some_and(|u| !u.is_empty());
        if has_narration || self.state.mode != RenderMode::Slideshow {
            return Ok(None);
        }
        let generator = self.generator()?;
        tracing::info!("generating narration");
        let url = match generator.generate_narration(&content.script())? {
            AudioPayload::Reference(url) => url,
            AudioPayload::Pcm(pcm) => self.urls.create(pcm.to_wav()?, "audio/wav"),
        };
        self.state.narration_url = Some(url.clone());
        self.state.project.narration_url = Some(url.clone());
        Ok(Some(url))
    }

    fn generator(&self) -> ReelcastResult<Arc<dyn GenerativeBackend>> {
        self.generator
            .clone()
            .ok_or_else(|| ReelcastError::generation("no generative backend configured"))
    }

    /// Full render written to `dir` under [`download_file_name`]. Returns the written path.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn download_video(
        &mut self,
        settings: &VideoSettings,
        dir: &Path,
    ) -> ReelcastResult<PathBuf> {
        let req = self.request(settings, false, None, None);
        let req = self.record(req)?;
        let video = self.render(&req)?;
        let written = self.save_blob(&video.blob, settings.resolution, dir);
        self.record(written)
    }

    fn save_blob(
        &self,
        blob: &Blob,
        resolution: Resolution,
        dir: &Path,
    ) -> ReelcastResult<PathBuf> {
        let url = self.urls.create_from_blob(blob);
        let title = self.state.content.as_ref().map(|c| c.title.as_str());
        let path = dir.join(download_file_name(title, resolution, blob.extension()));
        let written = std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, &blob.bytes))
            .with_context(|| format!("write video '{}'", path.display()));
        self.urls.revoke(&url);
        written?;
        tracing::info!(path = %path.display(), bytes = blob.bytes.len(), "video saved");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/orchestrator.rs"]
mod tests;
