use serde::{Deserialize, Serialize};

use crate::{
    field::{
        entry::{Ease, EntryTiming},
        physics::{FRICTION, PhysicsParams, RETURN_SPEED},
    },
    foundation::{
        color::Rgba8,
        core::Canvas,
        error::{PointCloudError, PointCloudResult},
    },
    sampler::SamplingMode,
};

/// Highest accepted `density`: one hundred points per unit of path length.
pub const MAX_DENSITY: f64 = 10_000.0;

/// Construction-time settings of a point cloud surface.
///
/// Every field has a default, so a JSON object may name only what it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointCloudConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Disc radius of each particle, in pixels.
    pub point_size: f64,
    /// Fill of particles away from the pointer.
    pub point_color: Rgba8,
    /// Points sampled per 100 units of path length.
    pub density: f64,
    /// Seconds each particle takes to fly in.
    pub entry_duration: f64,
    /// Extra delay per particle index, in seconds.
    pub entry_stagger: f64,
    /// Easing applied to each particle's flight.
    pub entry_ease: Ease,
    /// Pointer influence radius in pixels; colour reveal reaches twice as far.
    pub mouse_radius: f64,
    /// Peak repulsion per reference frame, reached at the pointer.
    pub mouse_force: f64,
    /// Spring constant pulling particles back to their targets, in `(0, 1)`.
    pub return_speed: f64,
    /// Velocity retained per reference frame, in `(0, 1)`.
    pub friction: f64,
    /// Opaque backdrop; transparent when absent.
    pub background: Option<Rgba8>,
    /// Seed for particle origins; random per load when absent.
    pub seed: Option<u64>,
    /// Which front end reads the markup.
    pub sampling: SamplingMode,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        let entry = EntryTiming::default();
        let physics = PhysicsParams::default();
        Self {
            width: 800,
            height: 600,
            point_size: 2.0,
            point_color: Rgba8::WHITE,
            density: 100.0,
            entry_duration: entry.duration,
            entry_stagger: entry.stagger,
            entry_ease: entry.ease,
            mouse_radius: physics.mouse_radius,
            mouse_force: physics.mouse_force,
            return_speed: RETURN_SPEED,
            friction: FRICTION,
            background: None,
            seed: None,
            sampling: SamplingMode::Markup,
        }
    }
}

impl PointCloudConfig {
    /// Check every field is in range.
    pub fn validate(&self) -> PointCloudResult<()> {
        Canvas::new(self.width, self.height)?;

        fn positive(name: &str, v: f64) -> PointCloudResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PointCloudError::validation(format!("{name} must be > 0")))
            }
        }
        fn non_negative(name: &str, v: f64) -> PointCloudResult<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(PointCloudError::validation(format!("{name} must be >= 0")))
            }
        }
        fn unit_open(name: &str, v: f64) -> PointCloudResult<()> {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(PointCloudError::validation(format!(
                    "{name} must be in the open interval (0, 1)"
                )))
            }
        }

        positive("point_size", self.point_size)?;
        positive("density", self.density)?;
        if self.density > MAX_DENSITY {
            return Err(PointCloudError::validation(format!(
                "density must be <= {MAX_DENSITY}"
            )));
        }
        non_negative("entry_duration", self.entry_duration)?;
        non_negative("entry_stagger", self.entry_stagger)?;
        non_negative("mouse_radius", self.mouse_radius)?;
        non_negative("mouse_force", self.mouse_force)?;
        unit_open("return_speed", self.return_speed)?;
        unit_open("friction", self.friction)?;
        Ok(())
    }

    /// The output box as a validated [`Canvas`].
    pub fn canvas(&self) -> PointCloudResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Entry-phase settings.
    pub fn entry_timing(&self) -> EntryTiming {
        EntryTiming {
            duration: self.entry_duration,
            stagger: self.entry_stagger,
            ease: self.entry_ease,
        }
    }

    /// Physics-phase settings.
    pub fn physics_params(&self) -> PhysicsParams {
        PhysicsParams {
            return_speed: self.return_speed,
            friction: self.friction,
            mouse_radius: self.mouse_radius,
            mouse_force: self.mouse_force,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_validate() {
        let cfg = PointCloudConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.physics_params(), PhysicsParams::default());
        assert_eq!(cfg.entry_timing(), EntryTiming::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PointCloudConfig = serde_json::from_value(json!({
            "width": 600,
            "height": 468,
            "point_color": "#faecde",
            "density": 60,
            "entry_ease": "out_quad",
            "sampling": "resolved"
        }))
        .unwrap();
        assert_eq!(cfg.width, 600);
        assert_eq!(cfg.point_color, Rgba8::rgb(0xfa, 0xec, 0xde));
        assert_eq!(cfg.entry_ease, Ease::OutQuad);
        assert_eq!(cfg.sampling, SamplingMode::Resolved);
        assert_eq!(cfg.friction, FRICTION);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_value::<PointCloudConfig>(json!({"widht": 10})).is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        let bad = [
            PointCloudConfig {
                width: 0,
                ..PointCloudConfig::default()
            },
            PointCloudConfig {
                friction: 1.0,
                ..PointCloudConfig::default()
            },
            PointCloudConfig {
                return_speed: 0.0,
                ..PointCloudConfig::default()
            },
            PointCloudConfig {
                density: -5.0,
                ..PointCloudConfig::default()
            },
            PointCloudConfig {
                density: 1e12,
                ..PointCloudConfig::default()
            },
            PointCloudConfig {
                entry_duration: f64::NAN,
                ..PointCloudConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn density_is_capped() {
        let at_cap = PointCloudConfig {
            density: MAX_DENSITY,
            ..PointCloudConfig::default()
        };
        at_cap.validate().unwrap();
        let over = PointCloudConfig {
            density: MAX_DENSITY * 1.5,
            ..PointCloudConfig::default()
        };
        assert!(matches!(over.validate(), Err(PointCloudError::Validation(_))));
    }
}
