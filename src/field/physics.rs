use crate::{
    field::particle::Particle,
    foundation::core::{Point, Vec2},
};

/// Spring stiffness toward the target, per reference frame.
pub const RETURN_SPEED: f64 = 0.05;
/// Velocity retained per reference frame.
pub const FRICTION: f64 = 0.85;
/// Frame rate the per-frame constants are expressed in.
pub const REFERENCE_FPS: f64 = 60.0;
/// Longest time step integrated in one call; longer gaps are truncated.
pub const MAX_STEP_SECS: f64 = 0.1;

/// Constants of the physics phase, all expressed per reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    /// Fraction of the offset to the target added to velocity each frame.
    pub return_speed: f64,
    /// Fraction of velocity kept each frame.
    pub friction: f64,
    /// Distance in pixels within which the pointer repels.
    pub mouse_radius: f64,
    /// Impulse applied to a particle sitting right next to the pointer.
    pub mouse_force: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            return_speed: RETURN_SPEED,
            friction: FRICTION,
            mouse_radius: 100.0,
            mouse_force: 6.0,
        }
    }
}

impl PhysicsParams {
    /// Per-reference-frame impulse the pointer applies to a particle at `at`.
    ///
    /// Zero when the pointer is absent, outside `mouse_radius`, or exactly on the particle.
    pub fn repulsion(&self, at: Point, pointer: Option<Point>) -> Vec2 {
        let Some(pointer) = pointer else {
            return Vec2::ZERO;
        };
        let away = at - pointer;
        let d = away.hypot();
        if d <= 0.0 || d >= self.mouse_radius {
            return Vec2::ZERO;
        }
        let magnitude = (self.mouse_radius - d) / self.mouse_radius * self.mouse_force;
        away / d * magnitude
    }

    /// Advance `particle` by `dt` seconds.
    ///
    /// `dt` is cut into equal slices of at most one reference frame. For a slice of
    /// `k = slice * 60` frames the impulse and spring scale by `k`, friction becomes
    /// `friction^k`, and the position moves by `velocity * k`. At `dt = 1/60` this is the plain
    /// per-frame rule. Slices never exceed one frame, so every `return_speed` and `friction`
    /// in `(0, 1)` stays stable however long the gap between ticks.
    pub fn step(&self, particle: &mut Particle, pointer: Option<Point>, dt: f64) {
        let frames = dt.clamp(0.0, MAX_STEP_SECS) * REFERENCE_FPS;
        if frames <= 0.0 {
            return;
        }
        // Absorb rounding so a 1/60 s tick stays a single slice.
        let slices = (frames - 1e-9).ceil().max(1.0);
        let k = frames / slices;
        for _ in 0..slices as u32 {
            self.integrate(particle, pointer, k);
        }
    }

    fn integrate(&self, particle: &mut Particle, pointer: Option<Point>, k: f64) {
        particle.velocity += self.repulsion(particle.position, pointer) * k;
        particle.velocity += (particle.target() - particle.position) * (self.return_speed * k);
        particle.velocity *= self.friction.powf(k);
        particle.position += particle.velocity * k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Rgba8;

    const FRAME: f64 = 1.0 / 60.0;

    fn resting_at(x: f64, y: f64) -> Particle {
        Particle::new(Point::new(x, y), Point::new(x, y), Rgba8::WHITE)
    }

    #[test]
    fn repulsion_profile() {
        let params = PhysicsParams::default();
        let at = Point::new(100.0, 100.0);
        assert_eq!(params.repulsion(at, None), Vec2::ZERO);
        assert_eq!(params.repulsion(at, Some(at)), Vec2::ZERO);
        assert_eq!(params.repulsion(at, Some(Point::new(300.0, 100.0))), Vec2::ZERO);

        let push = params.repulsion(at, Some(Point::new(150.0, 100.0)));
        assert!((push.x + 3.0).abs() < 1e-12);
        assert_eq!(push.y, 0.0);
    }

    #[test]
    fn one_reference_frame_matches_the_per_frame_rule() {
        let params = PhysicsParams::default();
        let mut p = Particle::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Rgba8::WHITE);
        params.step(&mut p, None, FRAME);
        let v = 10.0 * RETURN_SPEED * FRICTION;
        assert!((p.velocity().x - v).abs() < 1e-9);
        assert!((p.position().x - v).abs() < 1e-9);
    }

    #[test]
    fn non_positive_dt_is_a_no_op() {
        let params = PhysicsParams::default();
        let mut p = Particle::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Rgba8::WHITE);
        let before = p;
        params.step(&mut p, None, 0.0);
        params.step(&mut p, None, -1.0);
        assert_eq!(p, before);
    }

    #[test]
    fn settles_at_target_for_any_frame_rate() {
        let params = PhysicsParams::default();
        for fps in [30.0, 60.0, 144.0, 5.0] {
            let mut p = resting_at(50.0, 50.0);
            p.position = Point::new(120.0, -30.0);
            for _ in 0..(fps as usize * 20) {
                params.step(&mut p, None, 1.0 / fps);
            }
            assert!(p.distance_to_target() < 1e-3, "fps={fps} d={}", p.distance_to_target());
        }
    }

    #[test]
    fn stiff_low_friction_params_stay_bounded_at_ten_fps() {
        let params = PhysicsParams {
            return_speed: 0.9,
            friction: 0.99,
            ..PhysicsParams::default()
        };
        let mut p = resting_at(50.0, 50.0);
        p.position = Point::new(60.0, 50.0);
        let mut worst: f64 = 0.0;
        for _ in 0..400 {
            params.step(&mut p, None, 0.1);
            worst = worst.max(p.distance_to_target());
        }
        assert!(worst.is_finite() && worst < 100.0, "worst={worst}");
        assert!(p.distance_to_target() < 0.01, "d={}", p.distance_to_target());
    }

    #[test]
    fn long_gaps_are_sliced_into_reference_frames() {
        let params = PhysicsParams::default();
        let mut sliced = Particle::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Rgba8::WHITE);
        let mut framed = sliced;
        params.step(&mut sliced, None, 3.0 * FRAME);
        for _ in 0..3 {
            params.step(&mut framed, None, FRAME);
        }
        assert!((sliced.position().x - framed.position().x).abs() < 1e-9);
        assert!((sliced.velocity().x - framed.velocity().x).abs() < 1e-9);
    }

    #[test]
    fn stays_put_when_pointer_is_outside_radius() {
        let params = PhysicsParams::default();
        let mut p = resting_at(200.0, 200.0);
        let pointer = Some(Point::new(200.0 + params.mouse_radius + 1.0, 200.0));
        for _ in 0..500 {
            params.step(&mut p, pointer, FRAME);
            assert!(p.distance_to_target() < 1e-9);
        }
    }
}
