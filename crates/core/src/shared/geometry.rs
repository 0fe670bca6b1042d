/// A point in frame pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle locating a detected shape.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Builds a box from `(x1, y1)`–`(x2, y2)` corners in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let left = x1.min(x2);
        let top = y1.min(y2);
        Self {
            top,
            left,
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Smallest box enclosing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            x1 = x1.min(p.x);
            y1 = y1.min(p.y);
            x2 = x2.max(p.x);
            y2 = y2.max(p.y);
        }
        Some(Self::from_corners(x1, y1, x2, y2))
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.left.max(other.left);
        let iy1 = self.top.max(other.top);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_from_corners_normalizes_order() {
        let b = BoundingBox::from_corners(120.0, 90.0, 20.0, 10.0);
        assert_eq!(b, BoundingBox::new(10.0, 20.0, 100.0, 80.0));
        assert_relative_eq!(b.right(), 120.0);
        assert_relative_eq!(b.bottom(), 90.0);
    }

    #[test]
    fn test_enclosing_points() {
        let pts = [
            Point::new(12.0, 5.0),
            Point::new(40.0, 9.0),
            Point::new(38.0, 30.0),
            Point::new(10.0, 26.0),
        ];
        let b = BoundingBox::enclosing(&pts).unwrap();
        assert_eq!(b, BoundingBox::new(5.0, 10.0, 30.0, 25.0));
    }

    #[test]
    fn test_enclosing_empty_is_none() {
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 15000
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(0.0, 50.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::identical(BoundingBox::new(10.0, 10.0, 50.0, 50.0), 1.0)]
    #[case::disjoint(BoundingBox::new(200.0, 200.0, 10.0, 10.0), 0.0)]
    #[case::touching(BoundingBox::new(10.0, 60.0, 50.0, 50.0), 0.0)]
    fn test_iou_cases(#[case] other: BoundingBox, #[case] expected: f64) {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&other), expected);
    }
}
