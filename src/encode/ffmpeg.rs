use std::{
    io::{Read, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    foundation::{
        color::Rgba8,
        error::{PointCloudError, PointCloudResult},
    },
    surface::paint::FrameRGBA,
};

/// Settings for an [`FfmpegEncoder`] run.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Frame width in pixels; must be even.
    pub width: u32,
    /// Frame height in pixels; must be even.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Destination `.mp4` path.
    pub out_path: PathBuf,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Colour the transparent parts of each frame are flattened onto.
    pub background: Rgba8,
}

impl EncodeConfig {
    /// Settings that refuse to overwrite and flatten onto black.
    pub fn new(width: u32, height: u32, fps: u32, out_path: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps,
            out_path: out_path.into(),
            overwrite: true,
            background: Rgba8::rgb(0, 0, 0),
        }
    }

    /// Reject a zero rate and zero or odd dimensions.
    pub fn validate(&self) -> PointCloudResult<()> {
        if self.fps == 0 {
            return Err(PointCloudError::validation("fps must be non-zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PointCloudError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(PointCloudError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

/// Spawns the system `ffmpeg` and streams opaque RGBA8 frames to its stdin.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    frames: u64,
}

impl FfmpegEncoder {
    /// Spawn `ffmpeg` writing to `cfg.out_path`.
    #[tracing::instrument(skip(cfg), fields(out = %cfg.out_path.display(), w = cfg.width, h = cfg.height, fps = cfg.fps))]
    pub fn start(cfg: EncodeConfig) -> PointCloudResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;
        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(PointCloudError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(PointCloudError::render(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg(if cfg.overwrite { "-y" } else { "-n" })
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &cfg.fps.to_string(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            PointCloudError::render(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PointCloudError::render("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PointCloudError::render("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::debug!("ffmpeg started");
        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            frames: 0,
        })
    }

    /// Flatten `frame` and write it to the encoder.
    pub fn push(&mut self, frame: &FrameRGBA) -> PointCloudResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(PointCloudError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.cfg.background,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PointCloudError::render("ffmpeg encoder is already finished"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            PointCloudError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close stdin, wait for `ffmpeg`, and return the number of frames written.
    pub fn finish(mut self) -> PointCloudResult<u64> {
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|e| {
            PointCloudError::render(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PointCloudError::render("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| PointCloudError::render(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PointCloudError::render(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        tracing::info!(frames = self.frames, out = %self.cfg.out_path.display(), "mp4 written");
        Ok(self.frames)
    }
}

/// Composite `src` over the opaque `background` into `dst`, leaving every pixel fully opaque.
pub fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    premultiplied: bool,
    background: Rgba8,
) -> PointCloudResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PointCloudError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(background.r),
        u16::from(background.g),
        u16::from(background.b),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if premultiplied {
                u16::from(s[c])
            } else {
                mul_div255(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

fn ensure_parent_dir(path: &Path) -> PointCloudResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
