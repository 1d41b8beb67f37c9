//! The particle field and its two-phase state machine.

/// Entry-phase timing and easing.
pub mod entry;
/// Per-particle state.
pub mod particle;
/// Repulsion, spring, and friction.
pub mod physics;

use rand::Rng;

use crate::{
    field::{entry::EntryTiming, particle::Particle, physics::PhysicsParams},
    foundation::core::{Canvas, ColoredPoint, Point},
};

/// Lifecycle phase of a [`ParticleField`]. `Entry -> Physics` is one-way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Particles interpolate from their random origin to their target.
    Entry,
    /// Pointer repulsion, spring return, and friction, indefinitely.
    Physics,
}

/// One particle per normalised point, built once per load and replaced wholesale.
#[derive(Clone, Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    canvas: Canvas,
    entry: EntryTiming,
    physics: PhysicsParams,
    phase: Phase,
    started_at: Option<f64>,
    last_tick: Option<f64>,
}

impl ParticleField {
    /// Build particles for `targets`, each starting at a uniformly random point of `canvas`.
    pub fn new<R: Rng>(
        targets: &[ColoredPoint],
        canvas: Canvas,
        entry: EntryTiming,
        physics: PhysicsParams,
        rng: &mut R,
    ) -> Self {
        let (w, h) = (canvas.width_f64(), canvas.height_f64());
        let particles = targets
            .iter()
            .map(|t| {
                let origin = Point::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h));
                Particle::new(origin, t.point, t.color)
            })
            .collect();

        Self {
            particles,
            canvas,
            entry,
            physics,
            phase: Phase::Entry,
            started_at: None,
            last_tick: None,
        }
    }

    /// Particles in target order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the field has no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Box the targets were normalised into.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Physics constants.
    pub fn physics(&self) -> &PhysicsParams {
        &self.physics
    }

    /// Entry timing.
    pub fn entry(&self) -> &EntryTiming {
        &self.entry
    }

    /// Seconds since the first tick, or zero before it.
    pub fn elapsed(&self, now: f64) -> f64 {
        self.started_at.map_or(0.0, |s| (now - s).max(0.0))
    }

    /// Advance to time `now` (seconds on any monotonic clock) and return the phase afterwards.
    ///
    /// The first tick starts the entry clock. During entry every position is re-derived from
    /// origin, target, and elapsed time, so dropped or repeated frames do not accumulate error.
    /// The tick on which the last particle arrives snaps everything onto its target and switches
    /// to physics; integration starts with the following tick.
    pub fn tick(&mut self, now: f64, pointer: Option<Point>) -> Phase {
        let started = *self.started_at.get_or_insert(now);
        let dt = self.last_tick.map_or(0.0, |last| now - last);
        self.last_tick = Some(now);

        match self.phase {
            Phase::Entry => {
                let elapsed = (now - started).max(0.0);
                self.apply_entry(elapsed);
                if elapsed >= self.entry.total(self.particles.len()) {
                    self.phase = Phase::Physics;
                    tracing::debug!(
                        particles = self.particles.len(),
                        elapsed,
                        "entry finished, physics running"
                    );
                }
            }
            Phase::Physics => self.step_physics(dt, pointer),
        }
        self.phase
    }

    /// Set every position from entry progress at `elapsed` seconds. Velocities stay zero.
    pub fn apply_entry(&mut self, elapsed: f64) {
        let entry = self.entry;
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.position = p.entry_position(entry.eased(i, elapsed));
        }
    }

    /// Integrate `dt` seconds of physics. Does nothing while the entry phase is running.
    pub fn step_physics(&mut self, dt: f64, pointer: Option<Point>) {
        if self.phase != Phase::Physics {
            return;
        }
        let physics = self.physics;
        for p in &mut self.particles {
            physics.step(p, pointer, dt);
        }
    }
}
