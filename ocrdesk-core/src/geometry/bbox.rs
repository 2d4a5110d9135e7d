use serde::{Deserialize, Serialize};

/// A 2D axis-aligned rectangle in page coordinates (origin top-left,
/// Y increasing downward), represented by minimum and maximum points.
///
/// Used for region geometry, the OCR result hierarchy and the containment
/// tests of the layout analyzer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    /// The minimum point (top-left corner).
    pub min: glam::Vec2,
    /// The maximum point (bottom-right corner).
    pub max: glam::Vec2,
}

impl Bbox {
    pub fn new(min: glam::Vec2, max: glam::Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from a minimum point and a size vector.
    pub fn from_min_size(min: glam::Vec2, size: glam::Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Builds the box spanned by two arbitrary drag corners.
    ///
    /// Pointer drags may travel up/left, so the corners are normalized
    /// into proper min/max points.
    pub fn from_corners(a: glam::Vec2, b: glam::Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> glam::Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Calculates the area of intersection with another box, 0.0 if the
    /// boxes do not overlap.
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Checks if this box completely contains another box.
    ///
    /// All four edges of the contained box must lie within or on the
    /// boundary of this box. This is the test the layout analyzer uses to
    /// drop duplicate nested detections.
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Checks if a point lies within or on the boundary of this box.
    pub fn contains_point(&self, point: glam::Vec2) -> bool {
        self.min.x <= point.x && point.x <= self.max.x && self.min.y <= point.y && point.y <= self.max.y
    }

    /// The smallest box that encompasses both this box and another.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns this box moved by `delta`.
    pub fn translated(&self, delta: glam::Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Returns this box grown by `margin` on every side.
    ///
    /// Used when a recognition split positions new regions: recognizer
    /// boxes are tight and re-cropping them exactly clips glyph extents.
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - glam::Vec2::splat(margin),
            max: self.max + glam::Vec2::splat(margin),
        }
    }

    /// True when both dimensions reach `min_size`.
    ///
    /// Drawn rectangles below this are discarded as accidental clicks.
    pub fn exceeds_min_size(&self, min_size: f32) -> bool {
        self.width() > min_size && self.height() > min_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_bbox_dimensions() {
        let bbox = Bbox::from_min_size(Vec2::ZERO, Vec2::new(4.0, 3.0));
        assert_eq!(bbox.width(), 4.0);
        assert_eq!(bbox.height(), 3.0);
        assert_eq!(bbox.area(), 12.0);
        assert_eq!(bbox.center(), Vec2::new(2.0, 1.5));

        // Degenerate line has no area
        let line = Bbox::new(Vec2::ZERO, Vec2::new(5.0, 0.0));
        assert_eq!(line.area(), 0.0);
    }

    #[test]
    fn test_bbox_from_corners_normalizes() {
        // Drag up-left: corners arrive reversed
        let bbox = Bbox::from_corners(Vec2::new(10.0, 8.0), Vec2::new(2.0, 3.0));
        assert_eq!(bbox.min, Vec2::new(2.0, 3.0));
        assert_eq!(bbox.max, Vec2::new(10.0, 8.0));

        // Mixed corners (down-left drag)
        let mixed = Bbox::from_corners(Vec2::new(10.0, 1.0), Vec2::new(2.0, 9.0));
        assert_eq!(mixed.min, Vec2::new(2.0, 1.0));
        assert_eq!(mixed.max, Vec2::new(10.0, 9.0));
    }

    #[test]
    fn test_bbox_intersection() {
        let bbox1 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
        let bbox2 = Bbox::new(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0));
        assert_eq!(bbox1.intersection(&bbox2), 4.0);

        let separate = Bbox::new(Vec2::new(5.0, 5.0), Vec2::new(7.0, 7.0));
        assert_eq!(bbox1.intersection(&separate), 0.0);

        // Edge touching counts as no intersection
        let right = Bbox::new(Vec2::new(4.0, 0.0), Vec2::new(8.0, 4.0));
        assert_eq!(bbox1.intersection(&right), 0.0);
    }

    #[test]
    fn test_bbox_contains() {
        let outer = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let inner = Bbox::new(Vec2::new(2.0, 3.0), Vec2::new(7.0, 8.0));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));

        // Identical boxes contain each other
        assert!(outer.contains(&outer));

        // Partial overlap is not containment
        let overlapping = Bbox::new(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0));
        assert!(!outer.contains(&overlapping));
    }

    #[test]
    fn test_bbox_union() {
        let bbox1 = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
        let bbox2 = Bbox::new(Vec2::new(3.0, 3.0), Vec2::new(8.0, 8.0));
        let union = bbox1.union(&bbox2);
        assert_eq!(union.min, Vec2::new(0.0, 0.0));
        assert_eq!(union.max, Vec2::new(8.0, 8.0));
    }

    #[test]
    fn test_bbox_translated() {
        let bbox = Bbox::new(Vec2::new(1.0, 2.0), Vec2::new(4.0, 6.0));
        let moved = bbox.translated(Vec2::new(10.0, -2.0));
        assert_eq!(moved.min, Vec2::new(11.0, 0.0));
        assert_eq!(moved.max, Vec2::new(14.0, 4.0));
        // Input untouched
        assert_eq!(bbox.min, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_bbox_expanded() {
        let bbox = Bbox::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        let grown = bbox.expanded(5.0);
        assert_eq!(grown.min, Vec2::new(5.0, 5.0));
        assert_eq!(grown.max, Vec2::new(25.0, 25.0));
    }

    #[test]
    fn test_default_is_empty_box_at_origin() {
        let bbox = Bbox::default();
        assert_eq!(bbox.min, Vec2::ZERO);
        assert_eq!(bbox.max, Vec2::ZERO);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_bbox_min_size() {
        let ok = Bbox::from_min_size(Vec2::ZERO, Vec2::new(11.0, 12.0));
        assert!(ok.exceeds_min_size(10.0));

        // One dimension too small is enough to reject
        let flat = Bbox::from_min_size(Vec2::ZERO, Vec2::new(100.0, 4.0));
        assert!(!flat.exceeds_min_size(10.0));
    }
}
