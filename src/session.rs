//! Headless playback of a scripted scene: a source, a config, and a pointer script on a fixed
//! frame clock.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    config::PointCloudConfig,
    encode::ffmpeg::{EncodeConfig, FfmpegEncoder},
    foundation::{
        color::Rgba8,
        error::{PointCloudError, PointCloudResult},
    },
    surface::{
        InteractionSurface,
        loader::Source,
        paint::FrameRGBA,
        pointer::PointerEvent,
    },
};

fn default_fps() -> u32 {
    60
}

/// Pointer event applied just before frame `frame` is produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPointer {
    /// Frame index the event lands on.
    pub frame: u64,
    /// The event itself, flattened into the same JSON object.
    #[serde(flatten)]
    pub event: PointerEvent,
}

/// JSON scene description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Inline markup or a path relative to the scene file.
    pub source: String,
    /// Surface settings.
    #[serde(default)]
    pub config: PointCloudConfig,
    /// Playback rate; defaults to 60.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Number of frames in the scene.
    pub frames: u64,
    /// Pointer events keyed by frame index.
    #[serde(default)]
    pub pointer: Vec<ScriptedPointer>,
}

impl Scene {
    /// Parse and validate a scene.
    pub fn from_json(text: &str) -> PointCloudResult<Self> {
        let scene: Self = serde_json::from_str(text)
            .map_err(|e| PointCloudError::validation(format!("scene json: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Read, parse, and validate a scene file.
    pub fn from_path(path: &Path) -> PointCloudResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PointCloudError::load(format!("read '{}': {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Check the rate, the frame count, and the surface config.
    pub fn validate(&self) -> PointCloudResult<()> {
        if self.fps == 0 {
            return Err(PointCloudError::validation("fps must be non-zero"));
        }
        if self.frames == 0 {
            return Err(PointCloudError::validation("frames must be non-zero"));
        }
        if self.source.trim().is_empty() {
            return Err(PointCloudError::validation("source must not be empty"));
        }
        self.config.validate()
    }
}

/// Deterministic frame-by-frame driver over an [`InteractionSurface`].
///
/// Frame `n` is produced at `n / fps` seconds. Seeking backwards replays from frame 0, so a
/// given frame index always renders the same pixels.
pub struct Session {
    scene: Scene,
    source: Source,
    surface: InteractionSurface,
    next_frame: u64,
    cursor: usize,
}

impl Session {
    /// Load the scene's source, resolving a relative path against `base_dir`.
    #[tracing::instrument(skip(scene), fields(frames = scene.frames, fps = scene.fps))]
    pub fn open(mut scene: Scene, base_dir: &Path) -> PointCloudResult<Self> {
        scene.validate()?;
        // Replays must reproduce the same origins.
        if scene.config.seed.is_none() {
            scene.config.seed = Some(rand::random());
        }
        scene.pointer.sort_by_key(|p| p.frame);

        let source = Source::from_reference(&scene.source).relative_to(base_dir);
        let surface = Self::fresh_surface(&scene, &source)?;
        Ok(Self {
            scene,
            source,
            surface,
            next_frame: 0,
            cursor: 0,
        })
    }

    fn fresh_surface(scene: &Scene, source: &Source) -> PointCloudResult<InteractionSurface> {
        let mut surface = InteractionSurface::new(scene.config.clone())?;
        surface.load_blocking(source)?;
        Ok(surface)
    }

    /// The scene being played.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The surface frames are produced by.
    pub fn surface(&self) -> &InteractionSurface {
        &self.surface
    }

    /// Index of the frame [`advance`](Self::advance) will produce next.
    pub fn next_frame(&self) -> u64 {
        self.next_frame
    }

    /// Produce the next frame, or `None` once the scene is exhausted.
    pub fn advance(&mut self) -> PointCloudResult<Option<FrameRGBA>> {
        if self.next_frame >= self.scene.frames {
            return Ok(None);
        }
        let idx = self.next_frame;
        while let Some(scripted) = self.scene.pointer.get(self.cursor) {
            if scripted.frame > idx {
                break;
            }
            self.surface.apply_pointer(scripted.event);
            self.cursor += 1;
        }
        let now = idx as f64 / f64::from(self.scene.fps);
        let frame = self.surface.frame(now)?;
        self.next_frame += 1;
        Ok(Some(frame))
    }

    /// Produce frame `frame`, simulating every frame before it.
    pub fn seek(&mut self, frame: u64) -> PointCloudResult<FrameRGBA> {
        if frame >= self.scene.frames {
            return Err(PointCloudError::validation(format!(
                "frame {frame} is out of range (scene has {} frames)",
                self.scene.frames
            )));
        }
        if frame < self.next_frame {
            self.surface.teardown();
            self.surface = Self::fresh_surface(&self.scene, &self.source)?;
            self.next_frame = 0;
            self.cursor = 0;
        }
        loop {
            let idx = self.next_frame;
            match self.advance()? {
                Some(rendered) if idx == frame => return Ok(rendered),
                Some(_) => {}
                None => {
                    return Err(PointCloudError::lifecycle(
                        "scene ended before the requested frame",
                    ));
                }
            }
        }
    }
}

/// Render `scene` start to finish into an MP4 at `out`.
pub fn render_scene_to_mp4(scene: Scene, base_dir: &Path, out: PathBuf) -> PointCloudResult<u64> {
    let background = scene.config.background.unwrap_or(Rgba8::rgb(0, 0, 0));
    let mut cfg = EncodeConfig::new(scene.config.width, scene.config.height, scene.fps, out);
    cfg.background = background;

    let mut session = Session::open(scene, base_dir)?;
    let mut encoder = FfmpegEncoder::start(cfg)?;
    while let Some(frame) = session.advance()? {
        encoder.push(&frame)?;
    }
    encoder.finish()
}
