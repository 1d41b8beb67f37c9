//! pointcloud turns vector markup into an interactive particle silhouette.
//!
//! Every drawable outline is sampled at arc-length-uniform positions, the samples are scaled
//! into the output box, and one particle per sample flies in from a random origin. Once it has
//! landed the field runs a small spring simulation that pushes particles away from the pointer
//! and lets them settle back.
//!
//! - Sample markup with [`sample_markup`] (raw document walk) or [`sample_tree`] (resolved tree)
//! - Drive a live [`InteractionSurface`] from a host loop
//! - Or play a scripted [`Scene`] headlessly through a [`Session`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Surface configuration.
pub mod config;
/// MP4 export.
pub mod encode;
/// Particle simulation.
pub mod field;
/// Fitting sampled points into the output box.
pub mod normalize;
/// Outline sampling.
pub mod sampler;
/// Scripted headless playback.
pub mod session;
/// The interactive surface.
pub mod surface;

pub use crate::foundation::color::Rgba8;
pub use crate::foundation::core::{Affine, BezPath, Canvas, ColoredPoint, Point, Rect, Vec2};
pub use crate::foundation::error::{PointCloudError, PointCloudResult};

pub use crate::config::{MAX_DENSITY, PointCloudConfig};
pub use crate::encode::ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::field::{
    ParticleField, Phase,
    entry::{Ease, EntryTiming},
    particle::Particle,
    physics::PhysicsParams,
};
pub use crate::normalize::{Fit, Normalized, normalize_points};
pub use crate::sampler::{
    MAX_LOAD_POINTS, MAX_SHAPE_POINTS, PointBudget, SampledShape, SamplingMode, flatten,
    markup::sample_markup, resolved::sample_tree,
};
pub use crate::session::{Scene, ScriptedPointer, Session, render_scene_to_mp4};
pub use crate::surface::{
    InteractionSurface,
    loader::{LoadedTargets, Source, build_field, load_targets},
    paint::{FrameRGBA, ParticleStyle},
    pointer::PointerEvent,
};
