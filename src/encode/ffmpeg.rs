use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::OnceLock;

use crate::assets::media::{ffmpeg_bin, scratch_path};
use crate::audio::mix::{MixedTrack, write_f32le_file};
use crate::encode::plan::{Container, EncoderCapabilities, EncodingPlan};
use crate::encode::sink::{Blob, MediaRuntime, Recorder, RecorderState};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::backend::FrameRGBA;

struct Session {
    plan: EncodingPlan,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    out_path: PathBuf,
    audio_path: Option<PathBuf>,
    last_idx: Option<FrameIndex>,
}

impl Session {
    fn remove_files(&self) {
        let _ = std::fs::remove_file(&self.out_path);
        if let Some(p) = self.audio_path.as_ref() {
            let _ = std::fs::remove_file(p);
        }
    }
}

/// Recorder that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Output goes to a scratch file that is read back into a [`Blob`] on stop. Audio is written to a
/// raw `f32le` scratch file and muxed as a second input.
pub struct FfmpegRecorder {
    session: Option<Session>,
    scratch: Vec<u8>,
}

impl Default for FfmpegRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRecorder {
    /// Idle recorder.
    pub fn new() -> Self {
        Self {
            session: None,
            scratch: Vec::new(),
        }
    }
}

impl Recorder for FfmpegRecorder {
    fn start(&mut self, plan: &EncodingPlan, audio: Option<&MixedTrack>) -> ReelcastResult<()> {
        if self.session.is_some() {
            return Err(ReelcastError::encode("recorder already started"));
        }
        let (w, h) = (plan.canvas.width, plan.canvas.height);
        if w == 0 || h == 0 {
            return Err(ReelcastError::validation(
                "recorder width/height must be non-zero",
            ));
        }
        if !w.is_multiple_of(2) || !h.is_multiple_of(2) {
            return Err(ReelcastError::validation(
                "recorder width/height must be even (required for yuv420p output)",
            ));
        }

        let out_path = scratch_path("recording", plan.extension());
        let audio_path = match audio.filter(|a| a.frames() > 0) {
            Some(track) => {
                let p = scratch_path("mix", "f32le");
                write_f32le_file(&track.interleaved_f32, &p)?;
                Some(p)
            }
            None => None,
        };

        let mut cmd = Command::new(ffmpeg_bin());
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // Input: raw RGBA8 frames, already flattened to opaque in push_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{w}x{h}"),
        ]);
        push_input_fps(&mut cmd, plan.fps);
        cmd.args(["-i", "pipe:0"]);

        if let (Some(path), Some(track)) = (audio_path.as_ref(), audio) {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &track.sample_rate.to_string(),
                "-ac",
                &track.channels.to_string(),
                "-i",
            ])
            .arg(path);
        }

        let bitrate = plan.video_bitrate.to_string();
        match plan.container {
            Container::Webm => {
                cmd.args([
                    "-c:v",
                    "libvpx-vp9",
                    "-b:v",
                    &bitrate,
                    "-deadline",
                    "realtime",
                    "-cpu-used",
                    "8",
                    "-pix_fmt",
                    "yuv420p",
                ]);
                if audio_path.is_some() {
                    cmd.args(["-c:a", "libopus"]);
                }
            }
            Container::Mp4 => {
                cmd.args([
                    "-c:v",
                    "libx264",
                    "-b:v",
                    &bitrate,
                    "-pix_fmt",
                    "yuv420p",
                    "-movflags",
                    "+faststart",
                ]);
                if audio_path.is_some() {
                    cmd.args(["-c:a", "aac"]);
                }
            }
        }
        if audio_path.is_none() {
            cmd.arg("-an");
        }
        cmd.arg(&out_path);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                if let Some(p) = audio_path.as_ref() {
                    let _ = std::fs::remove_file(p);
                }
                return Err(ReelcastError::encode(format!(
                    "failed to spawn ffmpeg (is it installed, or REELCAST_FFMPEG set?): {e}"
                )));
            }
        };
        let stdin = child.stdin.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });

        tracing::debug!(mime = %plan.mime, out = %out_path.display(), "ffmpeg recorder started");
        self.scratch = vec![0u8; w as usize * h as usize * 4];
        self.session = Some(Session {
            plan: plan.clone(),
            child,
            stdin,
            stderr_drain,
            out_path,
            audio_path,
            last_idx: None,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelcastResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ReelcastError::encode("recorder is not recording"))?;
        if let Some(last) = session.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelcastError::encode(
                "recorder received out-of-order frame index",
            ));
        }
        let canvas = session.plan.canvas;
        if frame.width != canvas.width || frame.height != canvas.height {
            return Err(ReelcastError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, canvas.width, canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelcastError::encode(
                "frame.data size mismatch with width*height*4",
            ));
        }
        session.last_idx = Some(idx);

        flatten_premul_over_bg(&mut self.scratch, &frame.data, [0, 0, 0]);
        let stdin = session
            .stdin
            .as_mut()
            .ok_or_else(|| ReelcastError::encode("recorder stdin is closed"))?;
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelcastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn stop(&mut self) -> ReelcastResult<Blob> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| ReelcastError::encode("recorder is not recording"))?;
        drop(session.stdin.take());

        let status = session.child.wait().map_err(|e| {
            ReelcastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        });
        let stderr_bytes = match session.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };

        let result = match status {
            Ok(status) if status.success() => std::fs::read(&session.out_path)
                .map(|bytes| Blob {
                    bytes,
                    mime: session.plan.mime.clone(),
                })
                .map_err(|e| {
                    ReelcastError::encode(format!(
                        "failed to read recording '{}': {e}",
                        session.out_path.display()
                    ))
                }),
            Ok(status) => Err(ReelcastError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            ))),
            Err(e) => Err(e),
        };
        session.remove_files();
        result
    }

    fn abort(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        drop(session.stdin.take());
        let _ = session.child.kill();
        let _ = session.child.wait();
        if let Some(handle) = session.stderr_drain.take() {
            let _ = handle.join();
        }
        session.remove_files();
    }

    fn state(&self) -> RecorderState {
        if self.session.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Inactive
        }
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        self.abort();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Media runtime backed by the system `ffmpeg`.
///
/// Encoder support is probed once per runtime.
#[derive(Debug, Default)]
pub struct FfmpegRuntime {
    caps: OnceLock<EncoderCapabilities>,
}

impl FfmpegRuntime {
    /// Runtime that probes `ffmpeg` lazily.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaRuntime for FfmpegRuntime {
    fn capabilities(&self) -> EncoderCapabilities {
        self.caps
            .get_or_init(EncoderCapabilities::probe_ffmpeg)
            .clone()
    }

    fn create_recorder(&self, _plan: &EncodingPlan) -> ReelcastResult<Box<dyn Recorder>> {
        Ok(Box::new(FfmpegRecorder::new()))
    }
}
