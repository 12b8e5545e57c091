//! # Virtual Pointer
//!
//! The pointer lives in device-pixel space and is always clamped to
//! `[0, width] × [0, height]`. A drag is represented by its anchor alone:
//! the pointer is dragging exactly when an anchor is recorded.

use std::fmt;

use crate::core::geometry::DeviceGeometry;

/// A position in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rejected drag transitions. The pointer is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragError {
    AlreadyDragging,
    NotDragging,
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragError::AlreadyDragging => write!(f, "already dragging"),
            DragError::NotDragging => write!(f, "not dragging"),
        }
    }
}

impl std::error::Error for DragError {}

#[derive(Debug, Clone)]
pub struct PointerState {
    bounds: DeviceGeometry,
    position: Point,
    drag_anchor: Option<Point>,
}

impl PointerState {
    /// Creates a pointer at the center of the device screen.
    pub fn centered(bounds: DeviceGeometry) -> Self {
        Self {
            bounds,
            position: Point {
                x: bounds.width / 2,
                y: bounds.height / 2,
            },
            drag_anchor: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn drag_anchor(&self) -> Option<Point> {
        self.drag_anchor
    }

    /// Moves the pointer, saturating at the screen edges.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.position = Point {
            x: offset_clamped(self.position.x, dx, self.bounds.width),
            y: offset_clamped(self.position.y, dy, self.bounds.height),
        };
    }

    /// Anchors a drag at the current position.
    pub fn begin_drag(&mut self) -> Result<Point, DragError> {
        if self.drag_anchor.is_some() {
            return Err(DragError::AlreadyDragging);
        }
        self.drag_anchor = Some(self.position);
        Ok(self.position)
    }

    /// Finishes the drag, returning `(anchor, current)` for the swipe.
    pub fn end_drag(&mut self) -> Result<(Point, Point), DragError> {
        let anchor = self.drag_anchor.take().ok_or(DragError::NotDragging)?;
        Ok((anchor, self.position))
    }

    /// Drops the drag anchor. Returns whether a drag was in progress.
    pub fn cancel_drag(&mut self) -> bool {
        self.drag_anchor.take().is_some()
    }
}

fn offset_clamped(value: u32, delta: i32, max: u32) -> u32 {
    (i64::from(value) + i64::from(delta)).clamp(0, i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer() -> PointerState {
        PointerState::centered(DeviceGeometry::new(1080, 1920).unwrap())
    }

    #[test]
    fn test_starts_centered() {
        let p = pointer();
        assert_eq!(p.position(), Point { x: 540, y: 960 });
        assert!(!p.is_dragging());
    }

    #[test]
    fn test_move_saturates_at_edges() {
        let mut p = pointer();
        for _ in 0..200 {
            p.move_by(-15, -15);
            assert!(p.position().x <= 1080 && p.position().y <= 1920);
        }
        assert_eq!(p.position(), Point { x: 0, y: 0 });

        for _ in 0..200 {
            p.move_by(15, 15);
        }
        assert_eq!(p.position(), Point { x: 1080, y: 1920 });
    }

    #[test]
    fn test_extreme_deltas_do_not_wrap() {
        let mut p = pointer();
        p.move_by(i32::MIN, i32::MAX);
        assert_eq!(p.position(), Point { x: 0, y: 1920 });
    }

    #[test]
    fn test_double_begin_drag_keeps_anchor() {
        let mut p = pointer();
        assert_eq!(p.begin_drag(), Ok(Point { x: 540, y: 960 }));
        p.move_by(30, 0);
        assert_eq!(p.begin_drag(), Err(DragError::AlreadyDragging));
        assert_eq!(p.drag_anchor(), Some(Point { x: 540, y: 960 }));
        assert!(p.is_dragging());
    }

    #[test]
    fn test_end_drag_without_movement() {
        let mut p = pointer();
        p.begin_drag().unwrap();
        let (anchor, current) = p.end_drag().unwrap();
        assert_eq!(anchor, current);
        assert!(!p.is_dragging());
        assert_eq!(p.drag_anchor(), None);
    }

    #[test]
    fn test_end_drag_returns_both_points() {
        let mut p = pointer();
        p.begin_drag().unwrap();
        p.move_by(0, -60);
        assert_eq!(
            p.end_drag(),
            Ok((Point { x: 540, y: 960 }, Point { x: 540, y: 900 }))
        );
    }

    #[test]
    fn test_end_drag_when_idle_fails() {
        let mut p = pointer();
        assert_eq!(p.end_drag(), Err(DragError::NotDragging));
    }

    #[test]
    fn test_cancel_drag() {
        let mut p = pointer();
        assert!(!p.cancel_drag());
        p.begin_drag().unwrap();
        assert!(p.cancel_drag());
        assert!(!p.is_dragging());
    }
}
