use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::mpsc,
};

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::PointCloudConfig,
    field::ParticleField,
    foundation::{
        core::ColoredPoint,
        error::{PointCloudError, PointCloudResult},
    },
    normalize::{Fit, normalize_points},
    sampler::{self, SamplingMode, markup, resolved},
};

/// Where the vector markup comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Markup text.
    Inline(String),
    /// Markup file to read.
    File(PathBuf),
}

impl Source {
    /// Inline when `reference` looks like markup (starts with `<`), a file path otherwise.
    pub fn from_reference(reference: &str) -> Self {
        if reference.trim_start().starts_with('<') {
            Self::Inline(reference.to_string())
        } else {
            Self::File(PathBuf::from(reference))
        }
    }

    /// Anchor a relative file path at `base`. Inline sources are unchanged.
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::File(p) if p.is_relative() => Self::File(base.join(p)),
            other => other,
        }
    }

    /// The markup text, reading the file if needed.
    pub fn read(&self) -> PointCloudResult<Cow<'_, str>> {
        match self {
            Self::Inline(s) => Ok(Cow::Borrowed(s)),
            Self::File(p) => std::fs::read_to_string(p)
                .map(Cow::Owned)
                .map_err(|e| PointCloudError::load(format!("read '{}': {e}", p.display()))),
        }
    }
}

/// Normalised targets produced by the load pipeline.
#[derive(Clone, Debug)]
pub struct LoadedTargets {
    /// Number of shapes that contributed points.
    pub shapes: usize,
    /// Particle targets in canvas coordinates.
    pub targets: Vec<ColoredPoint>,
    /// Scale applied by normalisation.
    pub scale: f64,
    /// How the scale was chosen.
    pub fit: Fit,
}

/// Read, sample, flatten, and normalise `source` into the configured box.
#[tracing::instrument(skip(config), fields(density = config.density, mode = ?config.sampling))]
pub fn load_targets(source: &Source, config: &PointCloudConfig) -> PointCloudResult<LoadedTargets> {
    let canvas = config.canvas()?;
    let markup_text = source.read()?;

    let shapes = match config.sampling {
        SamplingMode::Markup => markup::sample_markup(&markup_text, config.density)?,
        SamplingMode::Resolved => {
            let tree = resolved::parse_tree(markup_text.as_bytes())?;
            resolved::sample_tree(&tree, config.density, config.point_color)?
        }
    };
    tracing::info!(shapes = shapes.len(), "svg sampled");

    let flat = sampler::flatten(&shapes);
    let normalized = normalize_points(&flat, canvas);
    tracing::info!(
        before = flat.len(),
        after = normalized.points.len(),
        scale = normalized.scale,
        "points normalised"
    );

    Ok(LoadedTargets {
        shapes: shapes.len(),
        targets: normalized.points,
        scale: normalized.scale,
        fit: normalized.fit,
    })
}

/// Run the whole pipeline and build a fresh field whose origins come from `seed`.
pub fn build_field(
    source: &Source,
    config: &PointCloudConfig,
    seed: u64,
) -> PointCloudResult<ParticleField> {
    config.validate()?;
    let loaded = load_targets(source, config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(ParticleField::new(
        &loaded.targets,
        config.canvas()?,
        config.entry_timing(),
        config.physics_params(),
        &mut rng,
    ))
}

/// Message sent back by a background load.
pub(crate) struct LoadDone {
    pub(crate) generation: u64,
    pub(crate) result: PointCloudResult<ParticleField>,
}

/// In-flight background load. Dropping it abandons the result.
pub(crate) struct PendingLoad {
    pub(crate) generation: u64,
    rx: mpsc::Receiver<LoadDone>,
}

impl PendingLoad {
    pub(crate) fn spawn(
        source: Source,
        config: PointCloudConfig,
        seed: u64,
        generation: u64,
    ) -> PointCloudResult<Self> {
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name(format!("pointcloud-load-{generation}"))
            .spawn(move || {
                let result = build_field(&source, &config, seed);
                // The surface may have moved on; a closed channel just drops the result.
                let _ = tx.send(LoadDone { generation, result });
            })
            .map_err(|e| PointCloudError::load(format!("spawn load thread: {e}")))?;
        Ok(Self { generation, rx })
    }

    /// Non-blocking check for completion.
    pub(crate) fn try_take(&self) -> Option<LoadDone> {
        match self.rx.try_recv() {
            Ok(done) => Some(done),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(self.lost()),
        }
    }

    /// Block until the load finishes.
    pub(crate) fn wait(self) -> LoadDone {
        self.rx.recv().unwrap_or_else(|_| self.lost())
    }

    fn lost(&self) -> LoadDone {
        LoadDone {
            generation: self.generation,
            result: Err(PointCloudError::load("load thread exited without a result")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <path fill="red" d="M0,0 L300,0 L300,100 Z"/>
    </svg>"#;

    #[test]
    fn reference_detection() {
        assert!(matches!(Source::from_reference("  <svg/>"), Source::Inline(_)));
        assert_eq!(
            Source::from_reference("logo.svg").relative_to(Path::new("/assets")),
            Source::File(PathBuf::from("/assets/logo.svg"))
        );
        assert_eq!(
            Source::from_reference("/abs/logo.svg").relative_to(Path::new("/assets")),
            Source::File(PathBuf::from("/abs/logo.svg"))
        );
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let src = Source::File(PathBuf::from("/definitely/not/here.svg"));
        assert!(matches!(src.read(), Err(PointCloudError::Load(_))));
    }

    #[test]
    fn pipeline_fits_the_box() {
        let cfg = PointCloudConfig::default();
        let loaded = load_targets(&Source::Inline(TRIANGLE.into()), &cfg).unwrap();
        assert_eq!(loaded.shapes, 1);
        assert_eq!(loaded.fit, Fit::Uniform);
        let max_x = loaded.targets.iter().map(|t| t.point.x).fold(0.0, f64::max);
        assert!((max_x - 800.0).abs() < 1e-6);
    }

    #[test]
    fn oversampling_fails_the_load_instead_of_allocating() {
        let line = Source::Inline(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L100,0"/></svg>"#.into(),
        );
        let cfg = PointCloudConfig {
            density: 1e12,
            ..PointCloudConfig::default()
        };
        assert!(matches!(
            load_targets(&line, &cfg),
            Err(PointCloudError::Load(_))
        ));
        assert!(matches!(
            build_field(&line, &cfg, 1),
            Err(PointCloudError::Validation(_))
        ));

        // A legal density on a huge outline still hits the per-shape limit.
        let huge = Source::Inline(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L100000000,0"/></svg>"#
                .into(),
        );
        assert!(matches!(
            load_targets(&huge, &PointCloudConfig::default()),
            Err(PointCloudError::Load(_))
        ));
    }

    #[test]
    fn build_is_reproducible_for_a_seed() {
        let cfg = PointCloudConfig::default();
        let src = Source::Inline(TRIANGLE.into());
        let a = build_field(&src, &cfg, 42).unwrap();
        let b = build_field(&src, &cfg, 42).unwrap();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn background_load_reports_its_generation() {
        let pending = PendingLoad::spawn(
            Source::Inline(TRIANGLE.into()),
            PointCloudConfig::default(),
            1,
            9,
        )
        .unwrap();
        let done = pending.wait();
        assert_eq!(done.generation, 9);
        assert!(!done.result.unwrap().is_empty());
    }
}
