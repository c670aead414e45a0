//! Geometry kernel for chart reconstruction
//!
//! Value types for points, rectangles, line segments and paths, plus the
//! oriented bounding box and the tolerance-based overlap tests used by the
//! content-group classifier. Coordinates are page-relative with the origin at
//! the top-left corner and y growing downward.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point
    pub fn l1_distance(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Rotate around the origin by `angle` radians
    fn rotate(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Bounding rectangle of a point set, `None` if empty
    pub fn from_points<'a, I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::from_bounds(min_x, min_y, max_x, max_y))
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Grow every side by an absolute amount
    pub fn extend(&self, amount: f64) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    /// Closed-interval overlap, so touching edges intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_bounds(
            self.min_x().max(other.min_x()),
            self.min_y().max(other.min_y()),
            self.max_x().min(other.max_x()),
            self.max_y().min(other.max_y()),
        ))
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.min_x() <= other.min_x()
            && other.max_x() <= self.max_x()
            && self.min_y() <= other.min_y()
            && other.max_y() <= self.max_y()
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.min_x() <= p.x && p.x <= self.max_x() && self.min_y() <= p.y && p.y <= self.max_y()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_bounds(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }
}

/// Whether two boxes overlap almost completely: the intersection covers the
/// smaller box up to a relative error of `eps`
pub fn nearly_overlap(a: &Rect, b: &Rect, eps: f64) -> bool {
    let min_area = a.area().min(b.area());
    if min_area <= 0.0 {
        return false;
    }
    match a.intersection(b) {
        Some(inter) => (1.0 - inter.area() / min_area).abs() <= eps,
        None => false,
    }
}

/// A straight line segment, used for axes and tick marks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_bounds(
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            self.start.x.max(self.end.x),
            self.start.y.max(self.end.y),
        )
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn is_horizontal(&self, tol: f64) -> bool {
        (self.start.y - self.end.y).abs() <= tol
    }

    pub fn is_vertical(&self, tol: f64) -> bool {
        (self.start.x - self.end.x).abs() <= tol
    }
}

/// Segment type tag shared by segments and extracted points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    MoveTo,
    LineTo,
    QuadTo,
    CubicTo,
    Close,
}

/// One drawing operation of a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    /// Control point, end point
    QuadTo(Point, Point),
    /// Two control points, end point
    CubicTo(Point, Point, Point),
    Close,
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::MoveTo(_) => SegmentKind::MoveTo,
            Segment::LineTo(_) => SegmentKind::LineTo,
            Segment::QuadTo(..) => SegmentKind::QuadTo,
            Segment::CubicTo(..) => SegmentKind::CubicTo,
            Segment::Close => SegmentKind::Close,
        }
    }

    /// End point of the segment, `None` for close
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            Segment::MoveTo(p) | Segment::LineTo(p) => Some(p),
            Segment::QuadTo(_, p) => Some(p),
            Segment::CubicTo(_, _, p) => Some(p),
            Segment::Close => None,
        }
    }
}

/// A vector path as an ordered segment list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Closed axis-aligned rectangle path
    pub fn rect(r: Rect) -> Self {
        let mut path = Path::new();
        path.move_to(r.min_x(), r.min_y());
        path.line_to(r.max_x(), r.min_y());
        path.line_to(r.max_x(), r.max_y());
        path.line_to(r.min_x(), r.max_y());
        path.close();
        path
    }

    /// Open polyline through the given points
    pub fn polyline(points: &[Point]) -> Self {
        let mut path = Path::new();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                path.move_to(p.x, p.y);
            } else {
                path.line_to(p.x, p.y);
            }
        }
        path
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(Segment::MoveTo(Point::new(x, y)));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(Segment::LineTo(Point::new(x, y)));
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.segments.push(Segment::CubicTo(c1, c2, end));
    }

    pub fn close(&mut self) {
        self.segments.push(Segment::Close);
    }

    pub fn append(&mut self, other: &Path) {
        self.segments.extend_from_slice(&other.segments);
    }

    /// Split at every move-to into independent subpaths
    pub fn subpaths(&self) -> Vec<Path> {
        let mut out: Vec<Path> = Vec::new();
        for seg in &self.segments {
            if matches!(seg, Segment::MoveTo(_)) || out.is_empty() {
                out.push(Path::from_segments(vec![*seg]));
            } else if let Some(last) = out.last_mut() {
                last.segments.push(*seg);
            }
        }
        out
    }

    /// The rectangle this path draws, if it is a single closed axis-aligned
    /// quadrilateral
    pub fn as_rect(&self, tol: f64) -> Option<Rect> {
        if self.has_curves() {
            return None;
        }
        let mut pts: Vec<Point> = key_points(self)
            .into_iter()
            .filter(|p| p.kind != SegmentKind::Close)
            .map(|p| p.point)
            .collect();
        if pts.len() == 5 && pts[0].l1_distance(&pts[4]) <= tol {
            pts.pop();
        }
        if pts.len() != 4 {
            return None;
        }
        let straight = (0..4).all(|i| {
            let line = Line::new(pts[i], pts[(i + 1) % 4]);
            line.is_horizontal(tol) || line.is_vertical(tol)
        });
        if !straight {
            return None;
        }
        Rect::from_points(pts.iter())
    }

    /// Straight segments of the path, close segments included
    pub fn straight_segments(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current: Option<Point> = None;
        let mut start: Option<Point> = None;
        for seg in &self.segments {
            match *seg {
                Segment::MoveTo(p) => {
                    current = Some(p);
                    start = Some(p);
                }
                Segment::LineTo(p) => {
                    if let Some(c) = current {
                        lines.push(Line::new(c, p));
                    }
                    current = Some(p);
                }
                Segment::Close => {
                    if let (Some(c), Some(s)) = (current, start) {
                        if c.l1_distance(&s) > 0.0 {
                            lines.push(Line::new(c, s));
                        }
                    }
                    current = start;
                }
                other => current = other.end_point(),
            }
        }
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn has_curves(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::QuadTo(..) | Segment::CubicTo(..)))
    }

    /// First coordinate of the path
    pub fn first_point(&self) -> Option<Point> {
        self.segments.iter().find_map(|s| s.end_point())
    }

    /// Pen position after the last segment
    pub fn current_point(&self) -> Option<Point> {
        let mut current = None;
        let mut start = None;
        for seg in &self.segments {
            match seg {
                Segment::MoveTo(p) => {
                    start = Some(*p);
                    current = Some(*p);
                }
                Segment::Close => current = start,
                other => current = other.end_point(),
            }
        }
        current
    }

    /// Bounds over every coordinate, control points included
    pub fn bounds(&self) -> Option<Rect> {
        let pts: Vec<Point> = all_points(self).into_iter().map(|p| p.point).collect();
        Rect::from_points(pts.iter())
    }
}

/// A coordinate pulled out of a path, tagged with its segment type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub kind: SegmentKind,
    pub point: Point,
}

/// One representative coordinate per segment: the end point of move, line
/// and curve segments, the subpath start for close
pub fn key_points(path: &Path) -> Vec<PathPoint> {
    let mut pts = Vec::with_capacity(path.len());
    let mut start = Point::default();
    for seg in &path.segments {
        match *seg {
            Segment::MoveTo(p) => {
                start = p;
                pts.push(PathPoint {
                    kind: SegmentKind::MoveTo,
                    point: p,
                });
            }
            Segment::Close => pts.push(PathPoint {
                kind: SegmentKind::Close,
                point: start,
            }),
            other => {
                if let Some(p) = other.end_point() {
                    pts.push(PathPoint {
                        kind: other.kind(),
                        point: p,
                    });
                }
            }
        }
    }
    pts
}

/// Every coordinate of a path including curve control points
pub fn all_points(path: &Path) -> Vec<PathPoint> {
    let mut pts = Vec::with_capacity(path.len() * 2);
    let mut start = Point::default();
    for seg in &path.segments {
        let kind = seg.kind();
        match *seg {
            Segment::MoveTo(p) => {
                start = p;
                pts.push(PathPoint { kind, point: p });
            }
            Segment::LineTo(p) => pts.push(PathPoint { kind, point: p }),
            Segment::QuadTo(c, p) => {
                pts.push(PathPoint { kind, point: c });
                pts.push(PathPoint { kind, point: p });
            }
            Segment::CubicTo(c1, c2, p) => {
                pts.push(PathPoint { kind, point: c1 });
                pts.push(PathPoint { kind, point: c2 });
                pts.push(PathPoint { kind, point: p });
            }
            Segment::Close => pts.push(PathPoint { kind, point: start }),
        }
    }
    pts
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    Point::new(
        b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
        b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
    )
}

/// Replace curve segments by straight lines through `samples` points of the
/// cubic Bezier (start point included). Returns `None` for `samples <= 1`.
pub fn refine_curve(path: &Path, samples: usize) -> Option<Path> {
    if samples <= 1 {
        return None;
    }
    let dt = 1.0 / (samples - 1) as f64;
    let mut out = Path::new();
    let mut current = Point::default();
    let mut start = Point::default();

    for seg in &path.segments {
        let curve = match *seg {
            Segment::CubicTo(c1, c2, end) => Some((c1, c2, end)),
            Segment::QuadTo(c, end) => Some((current, c, end)),
            _ => None,
        };
        match (seg, curve) {
            (_, Some((c1, c2, end))) => {
                for i in 1..samples - 1 {
                    let p = cubic_point(current, c1, c2, end, i as f64 * dt);
                    out.line_to(p.x, p.y);
                }
                out.line_to(end.x, end.y);
                current = end;
            }
            (Segment::MoveTo(p), None) => {
                out.move_to(p.x, p.y);
                start = *p;
                current = *p;
            }
            (Segment::LineTo(p), None) => {
                out.line_to(p.x, p.y);
                current = *p;
            }
            (_, None) => {
                out.close();
                current = start;
            }
        }
    }
    Some(out)
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by Andrew's monotone chain. Collinear points are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::new();
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Oriented bounding box, corners in drawing order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub corners: [Point; 4],
}

impl OrientedBox {
    /// Length of the first edge
    pub fn width(&self) -> f64 {
        self.corners[0].distance(&self.corners[1])
    }

    /// Length of the second edge
    pub fn height(&self) -> f64 {
        self.corners[1].distance(&self.corners[2])
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn short_side(&self) -> f64 {
        self.width().min(self.height())
    }

    /// Angle of the first edge in radians
    pub fn angle(&self) -> f64 {
        let d = Point::new(
            self.corners[1].x - self.corners[0].x,
            self.corners[1].y - self.corners[0].y,
        );
        d.y.atan2(d.x)
    }

    /// Whether the box edges run parallel to the page axes within `tol`
    pub fn is_axis_aligned(&self, tol: f64) -> bool {
        let (a, b) = (self.corners[0], self.corners[1]);
        (a.x - b.x).abs() <= tol || (a.y - b.y).abs() <= tol
    }

    pub fn bounds(&self) -> Rect {
        // corners is never empty
        Rect::from_points(self.corners.iter()).unwrap_or_default()
    }
}

/// Minimum-area oriented bounding box by rotating calipers over the convex
/// hull edges. `None` when the hull has fewer than 3 points.
pub fn minimum_oriented_bounding_box(points: &[Point]) -> Option<OrientedBox> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, OrientedBox)> = None;
    for i in 0..hull.len() {
        let origin = hull[i];
        let next = hull[(i + 1) % hull.len()];
        let angle = (next.y - origin.y).atan2(next.x - origin.x);

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let q = Point::new(p.x - origin.x, p.y - origin.y).rotate(-angle);
            min_x = min_x.min(q.x);
            min_y = min_y.min(q.y);
            max_x = max_x.max(q.x);
            max_y = max_y.max(q.y);
        }
        let area = (max_x - min_x) * (max_y - min_y);

        // Later edges must be clearly smaller, rotation noise does not count
        let better = match &best {
            Some((best_area, _)) => area < best_area - 1e-9 * best_area.max(1.0),
            None => true,
        };
        if better {
            let local = [
                Point::new(min_x, min_y),
                Point::new(max_x, min_y),
                Point::new(max_x, max_y),
                Point::new(min_x, max_y),
            ];
            let corners = local.map(|c| {
                let r = if angle == 0.0 { c } else { c.rotate(angle) };
                Point::new(r.x + origin.x, r.y + origin.y)
            });
            best = Some((area, OrientedBox { corners }));
        }
    }
    best.map(|(_, obb)| obb)
}

/// Render scale for OCR glyph images: 24 over the mean short side of the
/// fragments' oriented boxes
pub fn ocr_path_coef(boxes: &[OrientedBox]) -> Option<f64> {
    if boxes.is_empty() {
        return None;
    }
    let mean = boxes.iter().map(|b| b.short_side()).sum::<f64>() / boxes.len() as f64;
    if mean < 1e-6 {
        return None;
    }
    Some(24.0 / mean)
}

/// Point-overlap test of two paths: the first `n = min(|a|, |b|, max_points)`
/// key points of `a` must each have a key point of `b` within L1 distance `eps`
pub fn is_approximation_overlap_path(a: &Path, b: &Path, max_points: usize, eps: f64) -> bool {
    let pts_a = key_points(a);
    let pts_b = key_points(b);
    let n = pts_a.len().min(pts_b.len()).min(max_points);
    if n <= 1 {
        return false;
    }
    let (box_a, box_b) = match (a.bounds(), b.bounds()) {
        (Some(ba), Some(bb)) => (ba.extend(0.1), bb.extend(0.1)),
        _ => return false,
    };
    if !box_a.intersects(&box_b) {
        return false;
    }
    pts_a[..n]
        .iter()
        .all(|pa| pts_b.iter().any(|pb| pa.point.l1_distance(&pb.point) < eps))
}

/// Near-equal boxes: `a` grown by 0.2 must contain `b` grown by 0.1, then
/// `b` grown by 0.5 must contain the grown `a`
pub fn is_approximation_overlap_box(a: &Rect, b: &Rect) -> bool {
    let coarse = a.extend(0.2);
    if !coarse.contains_rect(&b.extend(0.1)) {
        return false;
    }
    b.extend(0.5).contains_rect(&coarse)
}

/// Whether two paths describe the same shape
pub fn is_same_path(a: &Path, b: &Path) -> bool {
    let (box_a, box_b) = match (a.bounds(), b.bounds()) {
        (Some(ba), Some(bb)) => (ba.extend(1.0), bb.extend(1.0)),
        _ => return false,
    };
    if (box_a.area() - box_b.area()).abs() > 1e-4 {
        return false;
    }
    if !nearly_overlap(&box_a, &box_b, 0.01) {
        return false;
    }
    let pts_a = key_points(a);
    let pts_b = key_points(b);
    let contains = |xs: &[PathPoint], ys: &[PathPoint]| {
        xs.iter()
            .all(|p| ys.iter().any(|q| p.point.distance_sq(&q.point) < 0.01))
    };
    contains(&pts_a, &pts_b) && contains(&pts_b, &pts_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bezier() -> Path {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.cubic_to(
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        );
        path
    }

    #[test]
    fn test_obb_axis_aligned_points() {
        let pts = vec![
            Point::new(2.0, 3.0),
            Point::new(12.0, 3.0),
            Point::new(12.0, 8.0),
            Point::new(2.0, 8.0),
            Point::new(5.0, 5.0),
            Point::new(7.0, 3.0),
        ];
        let obb = minimum_oriented_bounding_box(&pts).unwrap();
        assert!(obb.angle().abs() < 1e-12);
        assert_eq!(obb.bounds(), Rect::from_bounds(2.0, 3.0, 12.0, 8.0));
        assert!((obb.area() - 50.0).abs() < 1e-9);
        assert!(obb.is_axis_aligned(0.1));
    }

    #[test]
    fn test_obb_rotated_square() {
        let pts = vec![
            Point::new(0.0, 5.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 10.0),
        ];
        let obb = minimum_oriented_bounding_box(&pts).unwrap();
        assert!((obb.area() - 50.0).abs() < 1e-6);
        assert!(!obb.is_axis_aligned(0.1));
    }

    #[test]
    fn test_obb_degenerate() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        assert!(minimum_oriented_bounding_box(&pts).is_none());
    }

    #[test]
    fn test_key_points_close_repeats_start() {
        let path = Path::rect(Rect::new(0.0, 0.0, 4.0, 2.0));
        let pts = key_points(&path);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[4].kind, SegmentKind::Close);
        assert_eq!(pts[4].point, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_all_points_includes_controls() {
        let pts = all_points(&bezier());
        assert_eq!(pts.len(), 4);
        assert!(pts[1..].iter().all(|p| p.kind == SegmentKind::CubicTo));
        assert_eq!(key_points(&bezier()).len(), 2);
    }

    #[test]
    fn test_refine_curve() {
        assert!(refine_curve(&bezier(), 1).is_none());
        let refined = refine_curve(&bezier(), 5).unwrap();
        assert!(!refined.has_curves());
        assert_eq!(refined.len(), 5);
        let mid = refined.segments[2].end_point().unwrap();
        assert!((mid.x - 5.0).abs() < 1e-9);
        assert!((mid.y - 7.5).abs() < 1e-9);
        assert_eq!(refined.current_point(), Some(Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_rect_extend_and_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.05, 0.0, 5.0, 5.0);
        assert!(!a.intersects(&b));
        assert!(a.extend(0.1).intersects(&b));
        let c = a.extend(1.0);
        assert_eq!(c, Rect::new(-1.0, -1.0, 12.0, 12.0));
    }

    #[test]
    fn test_approximation_overlap_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 5.0);
        let b = Rect::new(0.05, 0.05, 9.9, 4.9);
        assert!(is_approximation_overlap_box(&a, &b));
        // a true superset is rejected by the fine pass
        let big = Rect::new(-2.0, -2.0, 14.0, 9.0);
        assert!(!is_approximation_overlap_box(&big, &a));
        // a slightly larger outer box still matches the inner one
        let outer = Rect::new(9.85, 9.85, 4.3, 4.3);
        let inner = Rect::new(10.0, 10.0, 4.0, 4.0);
        assert!(is_approximation_overlap_box(&outer, &inner));
        assert!(!is_approximation_overlap_box(&inner, &outer));
    }

    #[test]
    fn test_approximation_overlap_path_caps_points() {
        let a = Path::polyline(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        ]);
        let b = Path::polyline(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(5.0, 5.0),
        ]);
        assert!(!is_approximation_overlap_path(&a, &b, 8, 1e-2));
        assert!(is_approximation_overlap_path(&a, &b, 2, 1e-2));
        let single = Path::polyline(&[Point::new(0.0, 0.0)]);
        assert!(!is_approximation_overlap_path(&single, &single, 8, 1e-2));
    }

    #[test]
    fn test_same_path() {
        let a = Path::rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        let b = Path::rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        let c = Path::rect(Rect::new(0.0, 0.0, 5.0, 6.0));
        assert!(is_same_path(&a, &b));
        assert!(!is_same_path(&a, &c));
    }

    #[test]
    fn test_ocr_path_coef() {
        let obb = minimum_oriented_bounding_box(&[
            Point::new(0.0, 0.0),
            Point::new(12.0, 0.0),
            Point::new(12.0, 6.0),
            Point::new(0.0, 6.0),
        ])
        .unwrap();
        let coef = ocr_path_coef(&[obb]).unwrap();
        assert!((coef - 4.0).abs() < 1e-9);
        assert!(ocr_path_coef(&[]).is_none());
    }

    #[test]
    fn test_subpaths_and_rects() {
        let mut path = Path::rect(Rect::new(0.0, 0.0, 10.0, 20.0));
        path.append(&Path::rect(Rect::new(20.0, 5.0, 10.0, 15.0)));
        let subs = path.subpaths();
        assert_eq!(subs.len(), 2);
        let r = subs[1].as_rect(0.01).unwrap();
        assert!((r.x - 20.0).abs() < 1e-9);
        assert!((r.height - 15.0).abs() < 1e-9);
        assert!(bezier().as_rect(0.01).is_none());
        assert!(Path::polyline(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)])
            .as_rect(0.01)
            .is_none());
    }

    #[test]
    fn test_straight_segments_include_close() {
        let segs = Path::rect(Rect::new(0.0, 0.0, 10.0, 20.0)).straight_segments();
        assert_eq!(segs.len(), 4);
        assert!(segs[3].is_vertical(1e-9));
    }
}
