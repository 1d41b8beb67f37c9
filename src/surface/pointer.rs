use serde::{Deserialize, Serialize};

use crate::foundation::core::Point;

/// Pointer input consumed by a surface, in surface-local pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    /// The pointer is over the surface at `(x, y)`.
    Move {
        /// Horizontal position in pixels.
        x: f64,
        /// Vertical position in pixels.
        y: f64,
    },
    /// The pointer left the surface.
    Leave,
}

/// Last-write-wins pointer position; `None` while the pointer is off the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSlot {
    position: Option<Point>,
}

impl PointerSlot {
    /// Latest position, `None` after a leave.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Apply `event`; the latest one wins.
    pub fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move { x, y } => {
                // A non-finite position would poison every particle it touches.
                if x.is_finite() && y.is_finite() {
                    self.position = Some(Point::new(x, y));
                }
            }
            PointerEvent::Leave => self.position = None,
        }
    }
}
