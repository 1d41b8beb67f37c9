//! The host-facing surface: pointer slot, current field, background load, and painter.
//!
//! A surface owns everything it mutates. Loads run on a worker thread and report back tagged
//! with a generation number; starting another load or tearing down bumps the generation and
//! drops the receiver, so a stale result can never replace a newer particle set.

/// Reading markup and building particle fields.
pub mod loader;
/// Frame painting.
pub mod paint;
/// Pointer input.
pub mod pointer;

use crate::{
    config::PointCloudConfig,
    field::ParticleField,
    foundation::{
        core::{Canvas, Point},
        error::{PointCloudError, PointCloudResult},
    },
    surface::{
        loader::{LoadDone, PendingLoad, Source, build_field},
        paint::{FrameRGBA, Painter, ParticleStyle},
        pointer::{PointerEvent, PointerSlot},
    },
};

/// A fixed-size particle canvas driven by a host frame loop.
///
/// The host feeds pointer events, calls [`frame`](Self::frame) once per display frame, and
/// presents the returned pixels. Markup is swapped in with [`load`](Self::load) without
/// interrupting the animation of the previous particle set.
pub struct InteractionSurface {
    config: PointCloudConfig,
    canvas: Canvas,
    style: ParticleStyle,
    painter: Painter,
    pointer: PointerSlot,
    field: Option<ParticleField>,
    pending: Option<PendingLoad>,
    generation: u64,
    torn_down: bool,
}

impl InteractionSurface {
    /// Validate `config` and allocate the frame buffer. No markup is loaded yet.
    pub fn new(config: PointCloudConfig) -> PointCloudResult<Self> {
        config.validate()?;
        let canvas = config.canvas()?;
        let painter = Painter::new(canvas)?;
        let style = ParticleStyle {
            point_size: config.point_size,
            point_color: config.point_color,
            mouse_radius: config.mouse_radius,
        };
        Ok(Self {
            config,
            canvas,
            style,
            painter,
            pointer: PointerSlot::default(),
            field: None,
            pending: None,
            generation: 0,
            torn_down: false,
        })
    }

    /// Configuration the surface was built with.
    pub fn config(&self) -> &PointCloudConfig {
        &self.config
    }

    /// Output box.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// The particle set currently on screen, if any load has completed.
    pub fn field(&self) -> Option<&ParticleField> {
        self.field.as_ref()
    }

    /// Generation of the latest load; bumped by every load and by teardown.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a background load is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Start loading `source` in the background and return its generation.
    ///
    /// Any load still in flight is abandoned. The current field keeps animating until the new
    /// one arrives through [`poll_load`](Self::poll_load) or [`frame`](Self::frame).
    pub fn load(&mut self, source: Source) -> PointCloudResult<u64> {
        self.ensure_live()?;
        self.generation += 1;
        self.pending = None;
        let pending = PendingLoad::spawn(
            source,
            self.config.clone(),
            self.next_seed(),
            self.generation,
        )?;
        self.pending = Some(pending);
        tracing::debug!(generation = self.generation, "load started");
        Ok(self.generation)
    }

    /// Load `source` on the calling thread.
    ///
    /// On failure the previous field stays in place and the error is returned.
    pub fn load_blocking(&mut self, source: &Source) -> PointCloudResult<()> {
        self.ensure_live()?;
        self.generation += 1;
        self.pending = None;
        let result = build_field(source, &self.config, self.next_seed());
        self.install(LoadDone {
            generation: self.generation,
            result,
        })
        .map(|_| ())
    }

    /// Swap in a finished background load. Returns `true` when a new field was installed.
    pub fn poll_load(&mut self) -> bool {
        let Some(done) = self.pending.as_ref().and_then(PendingLoad::try_take) else {
            return false;
        };
        self.pending = None;
        matches!(self.install(done), Ok(true))
    }

    /// Block until the in-flight load, if any, has finished and been applied.
    pub fn wait_for_load(&mut self) -> PointCloudResult<()> {
        match self.pending.take() {
            Some(pending) => self.install(pending.wait()).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Last pointer position, `None` while off the surface.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer.position()
    }

    /// Record the pointer at `(x, y)`.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.pointer.apply(PointerEvent::Move { x, y });
    }

    /// Record that the pointer left the surface.
    pub fn pointer_leave(&mut self) {
        self.pointer.apply(PointerEvent::Leave);
    }

    /// Record a pointer event.
    pub fn apply_pointer(&mut self, event: PointerEvent) {
        self.pointer.apply(event);
    }

    /// Produce the frame for time `now` (seconds on a monotonic clock).
    ///
    /// Polls the background load, advances the field, and paints it. Without a field the frame
    /// holds only the background.
    pub fn frame(&mut self, now: f64) -> PointCloudResult<FrameRGBA> {
        self.ensure_live()?;
        self.poll_load();

        let pointer = self.pointer.position();
        let particles = match self.field.as_mut() {
            Some(field) => {
                field.tick(now, pointer);
                field.particles()
            }
            None => &[],
        };
        Ok(self
            .painter
            .paint(particles, pointer, &self.style, self.config.background))
    }

    /// Stop the surface. Pending loads are abandoned and later frames fail.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.generation += 1;
        self.pending = None;
        self.field = None;
        self.torn_down = true;
        tracing::debug!(generation = self.generation, "surface torn down");
    }

    fn ensure_live(&self) -> PointCloudResult<()> {
        if self.torn_down {
            Err(PointCloudError::lifecycle("surface has been torn down"))
        } else {
            Ok(())
        }
    }

    fn next_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(rand::random)
    }

    /// Apply a finished load. `Ok(false)` means the result was stale and dropped.
    fn install(&mut self, done: LoadDone) -> PointCloudResult<bool> {
        if done.generation != self.generation || self.torn_down {
            tracing::debug!(
                generation = done.generation,
                current = self.generation,
                "stale load discarded"
            );
            return Ok(false);
        }
        match done.result {
            Ok(field) => {
                tracing::info!(
                    generation = done.generation,
                    particles = field.len(),
                    "particle field replaced"
                );
                self.field = Some(field);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(
                    generation = done.generation,
                    error = %err,
                    "load failed, keeping previous particles"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> InteractionSurface {
        InteractionSurface::new(PointCloudConfig {
            width: 100,
            height: 80,
            seed: Some(3),
            entry_duration: 0.0,
            ..PointCloudConfig::default()
        })
        .unwrap()
    }

    fn line(len: u32) -> Source {
        Source::Inline(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0,0 L{len},0"/></svg>"#
        ))
    }

    #[test]
    fn frame_without_field_is_blank() {
        let mut s = surface();
        let frame = s.frame(0.0).unwrap();
        assert_eq!((frame.width, frame.height), (100, 80));
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn background_load_is_swapped_in_by_frames() {
        let mut s = surface();
        let generation = s.load(line(100)).unwrap();
        assert_eq!(generation, 1);
        assert!(s.is_loading());
        s.wait_for_load().unwrap();
        assert!(!s.is_loading());
        assert_eq!(s.field().unwrap().len(), 101);
        s.frame(0.0).unwrap();
    }

    #[test]
    fn pointer_events_update_the_slot() {
        let mut s = surface();
        s.pointer_move(10.0, 20.0);
        assert_eq!(s.pointer(), Some(Point::new(10.0, 20.0)));
        s.apply_pointer(PointerEvent::Leave);
        assert_eq!(s.pointer(), None);
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut s = surface();
        s.load_blocking(&line(100)).unwrap();
        let stale = LoadDone {
            generation: s.generation() - 1,
            result: build_field(&line(300), s.config(), 1),
        };
        assert!(!s.install(stale).unwrap());
        assert_eq!(s.field().unwrap().len(), 101);

        s.teardown();
        let late = LoadDone {
            generation: s.generation(),
            result: build_field(&line(300), s.config(), 1),
        };
        assert!(!s.install(late).unwrap());
        assert!(s.field().is_none());
    }

    #[test]
    fn poll_reports_a_swap_exactly_once() {
        let mut s = surface();
        assert!(!s.poll_load());
        s.load(line(100)).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let mut swaps = 0;
        while s.is_loading() && std::time::Instant::now() < deadline {
            if s.poll_load() {
                swaps += 1;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(swaps, 1);
        assert_eq!(s.field().unwrap().len(), 101);
        assert!(!s.poll_load());

        s.load(Source::Inline("<svg".into())).unwrap();
        while s.is_loading() && std::time::Instant::now() < deadline {
            assert!(!s.poll_load());
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!(!s.is_loading());
        assert_eq!(s.field().unwrap().len(), 101);
    }

    #[test]
    fn teardown_stops_everything() {
        let mut s = surface();
        s.load(line(100)).unwrap();
        s.teardown();
        assert!(!s.is_loading());
        assert!(s.field().is_none());
        assert!(matches!(s.frame(1.0), Err(PointCloudError::Lifecycle(_))));
        assert!(matches!(s.load(line(10)), Err(PointCloudError::Lifecycle(_))));
    }
}
