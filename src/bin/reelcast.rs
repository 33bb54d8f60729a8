use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelcast::{
    AssetLoader, Clock, CompositorInput, CpuSurface, FfmpegRuntime, LocalFetcher, MediaDecoder,
    NativeDecoder, RenderObserver, RenderRequest, RenderServices, ResourceFetcher, SteppedClock,
    SystemClock, TimelineBuilder, download_file_name, render_still, run_render,
};

#[derive(Parser, Debug)]
#[command(name = "reelcast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the whole video (requires `ffmpeg` on PATH or `REELCAST_FFMPEG`).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time of the frame in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file, or a directory to save under the download file name.
    #[arg(long)]
    out: PathBuf,

    /// Render a silent preview (no narration, fixed seconds per scene).
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Pace the frame loop with the wall clock instead of stepping offline.
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

#[derive(Default)]
struct ProgressLog {
    decade: Option<u8>,
}

impl RenderObserver for ProgressLog {
    fn on_progress(&mut self, percent: u8) {
        let decade = percent / 10;
        if self.decade != Some(decade) {
            self.decade = Some(decade);
            tracing::info!(percent, "progress");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_request(in_path: &Path) -> anyhow::Result<(RenderRequest, PathBuf)> {
    let req = RenderRequest::from_json_path(in_path)?;
    let root = in_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((req, root))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (req, root) = load_request(&args.in_path)?;
    req.validate()?;
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(LocalFetcher::new(root));
    let decoder: Arc<dyn MediaDecoder> = Arc::new(NativeDecoder);

    let timeline = TimelineBuilder::new(Arc::clone(&fetcher), Arc::clone(&decoder)).build(&req)?;
    let assets = AssetLoader::new(fetcher, decoder).load(&req);
    assets.require_for_mode(req.mode)?;

    let canvas = req.settings.canvas();
    let mut surface = CpuSurface::new(canvas, assets.caption_font.as_deref().map(Vec::as_slice))?;
    let input = CompositorInput::from_request(&req, &assets, timeline.total_duration);
    let frame = render_still(&mut surface, &input, args.time)?;
    let rgba = frame.to_opaque_rgba8()?;

    ensure_parent(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut req, root) = load_request(&args.in_path)?;
    if args.preview {
        req.preview = true;
    }

    let runtime = FfmpegRuntime::new();
    let services = RenderServices::new(
        Arc::new(LocalFetcher::new(root)),
        Arc::new(NativeDecoder),
        &runtime,
    );
    let fps = req.settings.fps()?;
    let mut clock: Box<dyn Clock> = if args.realtime {
        Box::new(SystemClock::new(fps))
    } else {
        Box::new(SteppedClock::new(fps))
    };
    let mut observer = ProgressLog::default();

    let video = run_render(&req, &services, clock.as_mut(), &mut observer)?;

    let out = if args.out.is_dir() {
        args.out.join(download_file_name(
            Some(&req.content.title),
            req.settings.resolution,
            video.blob.extension(),
        ))
    } else {
        args.out
    };
    ensure_parent(&out)?;
    std::fs::write(&out, &video.blob.bytes)
        .with_context(|| format!("write video '{}'", out.display()))?;

    for failure in &video.asset_failures {
        eprintln!(
            "warning: {:?} '{}' was replaced by a placeholder: {}",
            failure.role, failure.reference, failure.error
        );
    }
    eprintln!(
        "wrote {} ({}, {} frames)",
        out.display(),
        video.blob.mime,
        video.frames_captured
    );
    Ok(())
}
