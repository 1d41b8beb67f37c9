/// Easing applied to entry progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant speed.
    Linear,
    /// Quadratic deceleration.
    OutQuad,
    /// Cubic deceleration.
    #[default]
    OutCubic,
    /// Cubic acceleration, then deceleration.
    InOutCubic,
}

impl Ease {
    /// Eased progress for `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Timing of the entry phase.
///
/// Particle `i` starts `i * stagger` seconds after the phase begins and takes `duration`
/// seconds to arrive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntryTiming {
    /// Flight time of one particle, in seconds.
    pub duration: f64,
    /// Start delay between consecutive particles, in seconds.
    pub stagger: f64,
    /// Easing of each flight.
    pub ease: Ease,
}

impl Default for EntryTiming {
    fn default() -> Self {
        Self {
            duration: 2.5,
            stagger: 0.0,
            ease: Ease::OutCubic,
        }
    }
}

impl EntryTiming {
    /// Linear progress of particle `index` at `elapsed` seconds, in `0..=1`.
    pub fn progress(&self, index: usize, elapsed: f64) -> f64 {
        let local = elapsed - index as f64 * self.stagger;
        if self.duration <= 0.0 {
            return if local >= 0.0 { 1.0 } else { 0.0 };
        }
        (local / self.duration).clamp(0.0, 1.0)
    }

    /// Eased progress of particle `index`.
    pub fn eased(&self, index: usize, elapsed: f64) -> f64 {
        self.ease.apply(self.progress(index, elapsed))
    }

    /// Seconds until every one of `count` particles has arrived.
    pub fn total(&self, count: usize) -> f64 {
        self.duration.max(0.0) + count.saturating_sub(1) as f64 * self.stagger.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 4] = [Ease::Linear, Ease::OutQuad, Ease::OutCubic, Ease::InOutCubic];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
            assert_eq!(ease.apply(7.0), 1.0);
        }
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in ALL {
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b);
            assert!(b < c);
        }
    }

    #[test]
    fn out_cubic_matches_closed_form() {
        assert!((Ease::OutCubic.apply(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn progress_clamps_and_staggers() {
        let timing = EntryTiming {
            duration: 2.0,
            stagger: 0.5,
            ease: Ease::Linear,
        };
        assert_eq!(timing.progress(0, -1.0), 0.0);
        assert_eq!(timing.progress(0, 1.0), 0.5);
        assert_eq!(timing.progress(0, 9.0), 1.0);
        assert_eq!(timing.progress(2, 1.0), 0.0);
        assert_eq!(timing.progress(2, 2.0), 0.5);
        assert_eq!(timing.total(3), 3.0);
    }

    #[test]
    fn zero_duration_arrives_immediately() {
        let timing = EntryTiming {
            duration: 0.0,
            ..EntryTiming::default()
        };
        assert_eq!(timing.progress(0, 0.0), 1.0);
        assert_eq!(timing.total(10), 0.0);
    }
}
