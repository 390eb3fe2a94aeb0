use crate::types::{Offset, ViewportSize};

/// Tracks the pointer as an offset from the viewport center.
///
/// The stored offset is unclamped and undamped; damping happens at upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputTracker {
    offset: Offset,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recenters a pointer position (physical pixels, top-left origin).
    pub fn pointer_moved(&mut self, x: f64, y: f64, viewport: ViewportSize) -> Offset {
        self.offset = Offset::new(
            x - f64::from(viewport.width) / 2.0,
            y - f64::from(viewport.height) / 2.0,
        );
        self.offset
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_relative_to_center() {
        let mut tracker = InputTracker::new();
        let offset = tracker.pointer_moved(724.0, 568.0, ViewportSize::new(1024, 768));
        assert_eq!(offset, Offset::new(212.0, 184.0));
        assert_eq!(tracker.offset(), offset);
    }

    #[test]
    fn positions_outside_viewport_are_not_clamped() {
        let mut tracker = InputTracker::new();
        let offset = tracker.pointer_moved(-50.0, 2000.0, ViewportSize::new(800, 600));
        assert_eq!(offset, Offset::new(-450.0, 1700.0));
    }

    #[test]
    fn odd_dimensions_keep_fractional_center() {
        let mut tracker = InputTracker::new();
        let offset = tracker.pointer_moved(0.0, 0.0, ViewportSize::new(801, 601));
        assert_eq!(offset, Offset::new(-400.5, -300.5));
    }
}
