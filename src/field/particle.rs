use crate::foundation::{
    color::Rgba8,
    core::{Point, Vec2},
};

/// One simulated point of the cloud.
///
/// `origin`, `target`, and `color` are fixed at construction; only the field mutates
/// `position` and `velocity`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub(crate) position: Point,
    pub(crate) velocity: Vec2,
    origin: Point,
    target: Point,
    color: Rgba8,
}

impl Particle {
    /// A particle at rest at `origin`.
    pub fn new(origin: Point, target: Point, color: Rgba8) -> Self {
        Self {
            position: origin,
            velocity: Vec2::ZERO,
            origin,
            target,
            color,
        }
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Velocity in pixels per reference frame.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Where the entry flight starts.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Where the entry flight ends and the spring pulls back to.
    pub fn target(&self) -> Point {
        self.target
    }

    /// Fill of the shape the particle was sampled from.
    pub fn color(&self) -> Rgba8 {
        self.color
    }

    /// Entry-phase position for eased progress `eased`; a pure function of origin and target.
    pub fn entry_position(&self, eased: f64) -> Point {
        if eased >= 1.0 {
            return self.target;
        }
        self.origin.lerp(self.target, eased)
    }

    /// Distance between the current position and the target.
    pub fn distance_to_target(&self) -> f64 {
        self.position.distance(self.target)
    }
}
