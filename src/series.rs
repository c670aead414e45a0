//! Chart element extraction
//!
//! Recognizes axes, legend swatches, bar, line and area series and pie
//! slices in the path runs of a region, assigns the region's text chunks to
//! axis sides, titles and value labels, and reads series values through the
//! quantified scales.

use crate::chart::{
    AxisSide, Axes, Axis, ChartType, Color, Legend, PathRole, PathSeries, PieGroup, PieSlice, ScaleKind,
};
use crate::classify::PathRun;
use crate::geometry::{key_points, Line, Path, Point, Rect, Segment, SegmentKind};
use crate::patterns::{is_numeric_text, RIGHT_AXIS_KEY};
use crate::scale::{
    build_axis_scale, format_number, interpolate_number, interpolate_time, nearest_label,
    ScaleConfig, ScaleSet,
};
use crate::text::TextChunk;
use log::debug;
use std::cmp::Ordering;

/// Configuration for element extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum axis length relative to the chart width or height (default: 0.5)
    pub axis_min_ratio: f64,
    /// Maximum length of a tick mark (default: 8.0)
    pub tick_max_length: f64,
    /// Distance from an axis counted as touching it (default: 1.5)
    pub axis_touch_tolerance: f64,
    /// Maximum legend swatch side relative to the larger chart side (default: 0.03)
    pub legend_max_ratio: f64,
    /// Gap between swatch and legend text, in swatch widths (default: 2.0)
    pub legend_text_gap: f64,
    /// Distance of a bar foot from its axis (default: 1.0)
    pub anchor_tolerance: f64,
    /// Minimum line series width relative to the chart width (default: 0.1)
    pub line_min_width_ratio: f64,
    /// Minimum area series width relative to the chart width (default: 0.3)
    pub area_min_width_ratio: f64,
    /// Search distance for value labels next to bars, in font sizes (default: 2.0)
    pub nearby_text_factor: f64,
    /// Slack for horizontal and vertical segments (default: 0.5)
    pub straight_tolerance: f64,
    /// Farthest tick label distance from its axis, in font sizes (default: 4.0)
    pub tick_text_distance: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            axis_min_ratio: 0.5,
            tick_max_length: 8.0,
            axis_touch_tolerance: 1.5,
            legend_max_ratio: 0.03,
            legend_text_gap: 2.0,
            anchor_tolerance: 1.0,
            line_min_width_ratio: 0.1,
            area_min_width_ratio: 0.3,
            nearby_text_factor: 2.0,
            straight_tolerance: 0.5,
            tick_text_distance: 4.0,
        }
    }
}

/// One subpath of a run, the unit elements are recognized on
#[derive(Debug, Clone)]
struct Shape {
    run: usize,
    color: Color,
    fill: bool,
    dashed: bool,
    path: Path,
    bounds: Rect,
}

/// Elements recognized in a region
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub axes: Axes,
    pub legends: Vec<Legend>,
    pub series: Vec<PathSeries>,
    pub pies: Vec<PieGroup>,
    /// Runs that contributed to an axis, legend, series or pie
    pub used_runs: Vec<bool>,
    /// Chunks used as legend or pie label text
    pub used_chunks: Vec<bool>,
}

impl Extraction {
    /// Bounds of everything plotted, axes included
    pub fn plot_bounds(&self) -> Option<Rect> {
        let axes = self.axes.lines().into_iter().map(|l| l.bounds());
        let series = self.series.iter().filter_map(|s| s.path.bounds());
        let pies = self
            .pies
            .iter()
            .map(|p| Rect::new(p.center.x - p.radius, p.center.y - p.radius, 2.0 * p.radius, 2.0 * p.radius));
        axes.chain(series).chain(pies).reduce(|a, b| a.union(&b))
    }
}

/// Run every extractor over the runs of one region
pub fn extract_elements(
    runs: &[PathRun],
    chunks: &[TextChunk],
    area: &Rect,
    config: &ExtractConfig,
) -> Extraction {
    let (axes, mut used_runs) = detect_axes(runs, area, config);

    let mut shapes = Vec::new();
    for (i, run) in runs.iter().enumerate() {
        if used_runs[i] {
            continue;
        }
        for item in run.items() {
            for path in item.path.subpaths() {
                if let Some(bounds) = path.bounds() {
                    shapes.push(Shape {
                        run: i,
                        color: item.color,
                        fill: item.fill,
                        dashed: item.is_dashed(),
                        path,
                        bounds,
                    });
                }
            }
        }
    }
    let mut used_shapes = vec![false; shapes.len()];
    let mut used_chunks = vec![false; chunks.len()];

    let legends = detect_legends(&shapes, &mut used_shapes, chunks, &mut used_chunks, area, config);
    let mut pies = extract_pies(&shapes, &mut used_shapes);
    let mut series = extract_bars(&shapes, &mut used_shapes, &axes, area, config);
    series.extend(extract_areas(&shapes, &mut used_shapes, area, config));
    series.extend(extract_lines(&shapes, &mut used_shapes, area, config));

    for s in series.iter_mut() {
        if let Some(legend) = legends.iter().find(|l| l.color == s.color) {
            s.text = legend.text.clone();
        }
    }
    for pie in pies.iter_mut() {
        label_pie_slices(pie, &legends, chunks, &mut used_chunks);
    }

    for (shape, used) in shapes.iter().zip(&used_shapes) {
        if *used {
            used_runs[shape.run] = true;
        }
    }
    debug!(
        "extracted {} legends, {} series, {} pies",
        legends.len(),
        series.len(),
        pies.len()
    );

    Extraction {
        axes,
        legends,
        series,
        pies,
        used_runs,
        used_chunks,
    }
}

// ============================================================================
// Axes
// ============================================================================

/// A thin filled rectangle drawn in place of a line
fn thin_rect_line(r: &Rect) -> Option<Line> {
    if r.height <= 1.5 && r.width > r.height {
        Some(Line::new(
            Point::new(r.min_x(), r.center_y()),
            Point::new(r.max_x(), r.center_y()),
        ))
    } else if r.width <= 1.5 && r.height > r.width {
        Some(Line::new(
            Point::new(r.center_x(), r.min_y()),
            Point::new(r.center_x(), r.max_y()),
        ))
    } else {
        None
    }
}

fn run_lines(run: &PathRun, tol: f64) -> Vec<Line> {
    run.items()
        .flat_map(|item| {
            if item.fill {
                item.path
                    .subpaths()
                    .iter()
                    .filter_map(|p| p.as_rect(tol))
                    .filter_map(|r| thin_rect_line(&r))
                    .collect::<Vec<_>>()
            } else {
                item.path.straight_segments()
            }
        })
        .collect()
}

/// Orient a line left to right, or top to bottom
fn normalized(line: Line) -> Line {
    if line.start.x > line.end.x || (line.start.x == line.end.x && line.start.y > line.end.y) {
        Line::new(line.end, line.start)
    } else {
        line
    }
}

fn touches_axis(seg: &Line, axis: &Line, tol: f64) -> bool {
    let horizontal_axis = axis.is_horizontal(tol);
    [seg.start, seg.end].iter().any(|p| {
        if horizontal_axis {
            (p.y - axis.start.y).abs() <= tol
                && p.x >= axis.start.x.min(axis.end.x) - tol
                && p.x <= axis.start.x.max(axis.end.x) + tol
        } else {
            (p.x - axis.start.x).abs() <= tol
                && p.y >= axis.start.y.min(axis.end.y) - tol
                && p.y <= axis.start.y.max(axis.end.y) + tol
        }
    })
}

/// Find the axis lines and their tick marks. Returns the axes and a flag per
/// run telling whether it only draws axes.
pub fn detect_axes(runs: &[PathRun], area: &Rect, config: &ExtractConfig) -> (Axes, Vec<bool>) {
    let tol = config.straight_tolerance;
    let mut horizontal: Vec<Line> = Vec::new();
    let mut vertical: Vec<Line> = Vec::new();
    let lines_per_run: Vec<Vec<Line>> = runs.iter().map(|r| run_lines(r, tol)).collect();

    for line in lines_per_run.iter().flatten() {
        let b = line.bounds();
        if line.is_horizontal(tol) && b.width >= config.axis_min_ratio * area.width {
            horizontal.push(normalized(*line));
        } else if line.is_vertical(tol) && b.height >= config.axis_min_ratio * area.height {
            vertical.push(normalized(*line));
        }
    }

    let by_y = |a: &&Line, b: &&Line| a.start.y.partial_cmp(&b.start.y).unwrap_or(Ordering::Equal);
    let by_x = |a: &&Line, b: &&Line| a.start.x.partial_cmp(&b.start.x).unwrap_or(Ordering::Equal);

    let mut axes = Axes::default();
    if let (Some(bottom), Some(top)) = (horizontal.iter().max_by(by_y), horizontal.iter().min_by(by_y)) {
        axes.bottom = Some(Axis::new(*bottom));
        if bottom.start.y - top.start.y > 1.0 {
            axes.top = Some(Axis::new(*top));
        }
    }
    if let (Some(left), Some(right)) = (vertical.iter().min_by(by_x), vertical.iter().max_by(by_x)) {
        if right.start.x - left.start.x > 1.0 {
            axes.left = Some(Axis::new(*left));
            axes.right = Some(Axis::new(*right));
        } else if left.start.x > area.center_x() {
            axes.right = Some(Axis::new(*left));
        } else {
            axes.left = Some(Axis::new(*left));
        }
    }

    // Tick marks, and runs made only of axes and marks
    let axis_lines: Vec<(AxisSide, Line)> = AxisSide::ALL
        .iter()
        .filter_map(|s| axes.get(*s).map(|a| (*s, a.line)))
        .collect();
    let mut flags = vec![false; runs.len()];
    for (i, lines) in lines_per_run.iter().enumerate() {
        if lines.is_empty() {
            continue;
        }
        let mut all_axis = true;
        for seg in lines {
            if axis_lines.iter().any(|(_, a)| a == &normalized(*seg)) {
                continue;
            }
            let short = seg.length() <= config.tick_max_length
                && (seg.is_horizontal(tol) || seg.is_vertical(tol));
            let touched = axis_lines
                .iter()
                .find(|(_, a)| short && touches_axis(seg, a, config.axis_touch_tolerance));
            match touched {
                Some((side, _)) => {
                    if let Some(axis) = axes.get_mut(*side) {
                        axis.marks.push(*seg);
                    }
                }
                None => all_axis = false,
            }
        }
        flags[i] = all_axis;
    }
    debug!(
        "axes: bottom {} top {} left {} right {}",
        axes.bottom.is_some(),
        axes.top.is_some(),
        axes.left.is_some(),
        axes.right.is_some()
    );
    (axes, flags)
}

// ============================================================================
// Legends
// ============================================================================

fn detect_legends(
    shapes: &[Shape],
    used_shapes: &mut [bool],
    chunks: &[TextChunk],
    used_chunks: &mut [bool],
    area: &Rect,
    config: &ExtractConfig,
) -> Vec<Legend> {
    let max_side = config.legend_max_ratio * area.width.max(area.height);
    let mut legends = Vec::new();

    for (si, shape) in shapes.iter().enumerate() {
        let swatch = if shape.fill {
            match shape.path.as_rect(config.straight_tolerance) {
                Some(r)
                    if r.width <= max_side && r.height <= max_side && r.width >= 1.0 && r.height >= 1.0 =>
                {
                    r
                }
                _ => continue,
            }
        } else {
            let segs = shape.path.straight_segments();
            match segs.as_slice() {
                [seg] if seg.is_horizontal(config.straight_tolerance)
                    && seg.length() <= 0.05 * area.width
                    && seg.length() >= 1.0 =>
                {
                    let b = seg.bounds();
                    Rect::new(b.x, b.y - 1.0, b.width, 2.0)
                }
                _ => continue,
            }
        };

        let reach = config.legend_text_gap * swatch.width.max(1.0);
        let text = chunks
            .iter()
            .enumerate()
            .filter(|(j, c)| {
                let dx = c.bounds.min_x() - swatch.max_x();
                !used_chunks[*j]
                    && !c.is_blank()
                    && dx >= -0.5
                    && dx <= reach
                    && c.bounds.min_y() - 1.0 <= swatch.center_y()
                    && swatch.center_y() <= c.bounds.max_y() + 1.0
            })
            .min_by(|a, b| {
                a.1.bounds
                    .min_x()
                    .partial_cmp(&b.1.bounds.min_x())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(j, _)| j);

        if let Some(j) = text {
            used_chunks[j] = true;
            used_shapes[si] = true;
            legends.push(Legend {
                text: chunks[j].text().trim().to_string(),
                color: shape.color,
                bounds: swatch,
            });
        }
    }
    legends
}

// ============================================================================
// Bars
// ============================================================================

/// Group items by key, keeping first-seen order
fn group_by_key<K: PartialEq + Copy, T>(items: Vec<(K, T)>) -> Vec<(K, Vec<T>)> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for (key, item) in items {
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(item),
            None => groups.push((key, vec![item])),
        }
    }
    groups
}

fn extract_bars(
    shapes: &[Shape],
    used_shapes: &mut [bool],
    axes: &Axes,
    area: &Rect,
    config: &ExtractConfig,
) -> Vec<PathSeries> {
    let mut rects = Vec::new();
    for (si, shape) in shapes.iter().enumerate() {
        if used_shapes[si] || !shape.fill {
            continue;
        }
        let r = match shape.path.as_rect(config.straight_tolerance) {
            Some(r) => r,
            None => continue,
        };
        let background = r.width >= 0.9 * area.width && r.height >= 0.9 * area.height;
        let speck = r.width < 0.5 && r.height < 0.5;
        let long_rule = thin_rect_line(&r).is_some()
            && r.width.max(r.height) >= config.axis_min_ratio * area.width.min(area.height);
        if background || speck || long_rule {
            continue;
        }
        rects.push((shape.color, (si, r)));
    }

    let h_axis = axes.horizontal().map(|a| a.line.start.y);
    let v_axis = axes.vertical().map(|a| a.line.start.x);
    let tol = config.anchor_tolerance;

    let mut series = Vec::new();
    for (color, members) in group_by_key(rects) {
        let on_h = |r: &Rect| {
            h_axis
                .map(|y| (r.max_y() - y).abs() <= tol || (r.min_y() - y).abs() <= tol)
                .unwrap_or(false)
        };
        let on_v = |r: &Rect| {
            v_axis
                .map(|x| (r.min_x() - x).abs() <= tol || (r.max_x() - x).abs() <= tol)
                .unwrap_or(false)
        };
        let vertical_votes = members.iter().filter(|(_, r)| on_h(r)).count();
        let horizontal_votes = members.iter().filter(|(_, r)| on_v(r)).count();
        let horizontal = if horizontal_votes != vertical_votes {
            horizontal_votes > vertical_votes
        } else {
            let tall = members.iter().filter(|(_, r)| r.height >= r.width).count();
            tall * 2 < members.len()
        };

        let mut members = members;
        if horizontal {
            // Bottom to top, matching the vertical label order
            members.sort_by(|a, b| b.1.center_y().partial_cmp(&a.1.center_y()).unwrap_or(Ordering::Equal));
        } else {
            members.sort_by(|a, b| a.1.center_x().partial_cmp(&b.1.center_x()).unwrap_or(Ordering::Equal));
        }

        let role = if horizontal { PathRole::Columnar } else { PathRole::Bar };
        let mut path = Path::new();
        let mut s = PathSeries::new(role, color, Path::new());
        for (si, r) in &members {
            used_shapes[*si] = true;
            path.append(&Path::rect(*r));
            if horizontal {
                // Bars growing left of the axis end on their left edge
                let x = match v_axis {
                    Some(ax) if (r.max_x() - ax).abs() <= tol && (r.min_x() - ax).abs() > tol => r.min_x(),
                    _ => r.max_x(),
                };
                s.points.push(Point::new(x, r.center_y()));
                s.positions.push(r.center_y());
            } else {
                // Negative bars hang below the axis
                let y = match h_axis {
                    Some(ay) if (r.min_y() - ay).abs() <= tol && (r.max_y() - ay).abs() > tol => r.max_y(),
                    _ => r.min_y(),
                };
                s.points.push(Point::new(r.center_x(), y));
                s.positions.push(r.center_x());
            }
        }
        s.path = path;
        if horizontal {
            s.side_x = AxisSide::Bottom;
            s.side_y = AxisSide::Left;
        }
        series.push(s);
    }
    series
}

/// Two bar series with rectangles stacked on the same category
pub fn is_stacked_bar(series: &[PathSeries]) -> bool {
    let bars: Vec<&PathSeries> = series.iter().filter(|s| s.role.is_bar()).collect();
    if bars.len() < 2 {
        return false;
    }
    let rects = |s: &PathSeries| -> Vec<Rect> {
        s.path.subpaths().iter().filter_map(|p| p.as_rect(0.5)).collect()
    };
    let (a, b) = (rects(bars[0]), rects(bars[1]));
    let vertical = bars[0].role == PathRole::Bar;
    a.iter().any(|ra| {
        b.iter().any(|rb| {
            if vertical {
                (ra.center_x() - rb.center_x()).abs() < 0.5
                    && ((ra.min_y() - rb.max_y()).abs() < 1.0 || (rb.min_y() - ra.max_y()).abs() < 1.0)
            } else {
                (ra.center_y() - rb.center_y()).abs() < 0.5
                    && ((ra.min_x() - rb.max_x()).abs() < 1.0 || (rb.min_x() - ra.max_x()).abs() < 1.0)
            }
        })
    })
}

// ============================================================================
// Lines and areas
// ============================================================================

/// Key points sorted by x with repeated x positions removed
fn sorted_vertices(path: &Path) -> Vec<Point> {
    let mut pts: Vec<Point> = key_points(path)
        .into_iter()
        .filter(|p| p.kind != SegmentKind::Close)
        .map(|p| p.point)
        .collect();
    pts.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    pts.dedup_by(|b, a| (b.x - a.x).abs() < 0.01);
    pts
}

fn extract_lines(
    shapes: &[Shape],
    used_shapes: &mut [bool],
    area: &Rect,
    config: &ExtractConfig,
) -> Vec<PathSeries> {
    let tol = config.straight_tolerance;
    let candidates: Vec<((Color, bool), usize)> = shapes
        .iter()
        .enumerate()
        .filter(|(i, s)| !used_shapes[*i] && !s.fill)
        .map(|(i, s)| ((s.color, s.dashed), i))
        .collect();

    let mut series = Vec::new();
    for ((color, dashed), members) in group_by_key(candidates) {
        // Gridlines: every member is one straight horizontal or vertical stroke
        let grid = members.iter().all(|i| {
            let p = &shapes[*i].path;
            !p.has_curves()
                && matches!(
                    p.straight_segments().as_slice(),
                    [seg] if seg.is_horizontal(tol) || seg.is_vertical(tol)
                )
        });
        if grid {
            continue;
        }
        let mut path = Path::new();
        for i in &members {
            path.append(&shapes[*i].path);
        }
        let width = path.bounds().map(|b| b.width).unwrap_or(0.0);
        let points = sorted_vertices(&path);
        if points.len() < 2 || width < config.line_min_width_ratio * area.width {
            continue;
        }
        let role = if path.has_curves() {
            PathRole::Curve
        } else if dashed {
            PathRole::DashLine
        } else {
            PathRole::Line
        };
        for i in &members {
            used_shapes[*i] = true;
        }
        let mut s = PathSeries::new(role, color, path);
        s.positions = points.iter().map(|p| p.x).collect();
        s.points = points;
        series.push(s);
    }
    series
}

/// Top edge of a filled polygon: the highest point at each distinct x
fn upper_boundary(path: &Path) -> Vec<Point> {
    let mut pts: Vec<Point> = key_points(path)
        .into_iter()
        .filter(|p| p.kind != SegmentKind::Close)
        .map(|p| p.point)
        .collect();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    pts.dedup_by(|b, a| (b.x - a.x).abs() < 0.01);
    pts
}

fn extract_areas(
    shapes: &[Shape],
    used_shapes: &mut [bool],
    area: &Rect,
    config: &ExtractConfig,
) -> Vec<PathSeries> {
    let mut series = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        if used_shapes[i] || !shape.fill || shape.path.as_rect(config.straight_tolerance).is_some() {
            continue;
        }
        if shape.bounds.width < config.area_min_width_ratio * area.width {
            continue;
        }
        let points = upper_boundary(&shape.path);
        if points.len() < 2 {
            continue;
        }
        used_shapes[i] = true;
        let mut s = PathSeries::new(PathRole::Area, shape.color, shape.path.clone());
        s.positions = points.iter().map(|p| p.x).collect();
        s.points = points;
        series.push(s);
    }
    series
}

// ============================================================================
// Pies
// ============================================================================

/// Circle sector described by a slice outline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcShape {
    pub center: Point,
    pub radius: f64,
    /// Degrees, counter-clockwise as seen on the page
    pub start_angle: f64,
    pub end_angle: f64,
    pub sweep: f64,
    /// Has an apex at the centre, false for ring segments
    pub is_pie: bool,
}

#[derive(Debug, Clone, Copy)]
struct CurvePiece {
    start: Point,
    mid: Point,
    end: Point,
}

/// Page angle of `p` around `c` in degrees
fn page_angle(c: &Point, p: &Point) -> f64 {
    (c.y - p.y).atan2(p.x - c.x).to_degrees()
}

fn normalize_delta(d: f64) -> f64 {
    let d = d % 360.0;
    if d > 180.0 {
        d - 360.0
    } else if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

fn circumcenter(a: Point, b: Point, c: Point) -> Option<Point> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-9 {
        return None;
    }
    let (a2, b2, c2) = (
        a.x * a.x + a.y * a.y,
        b.x * b.x + b.y * b.y,
        c.x * c.x + c.y * c.y,
    );
    Some(Point::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    ))
}

/// Fit a circle sector to a slice outline. The outer arc is the longest run
/// of consecutive curve segments.
pub fn arc_of(path: &Path) -> Option<ArcShape> {
    let mut chains: Vec<Vec<CurvePiece>> = Vec::new();
    let mut in_chain = false;
    let mut current: Option<Point> = None;
    let mut start: Option<Point> = None;
    let mut corners: Vec<Point> = Vec::new();

    for seg in &path.segments {
        match *seg {
            Segment::MoveTo(p) => {
                current = Some(p);
                start = Some(p);
                in_chain = false;
                corners.push(p);
            }
            Segment::LineTo(p) => {
                in_chain = false;
                corners.push(p);
                current = Some(p);
            }
            Segment::CubicTo(..) | Segment::QuadTo(..) => {
                let s = current?;
                let (mid, p) = match *seg {
                    Segment::CubicTo(c1, c2, p) => (
                        Point::new(
                            0.125 * s.x + 0.375 * c1.x + 0.375 * c2.x + 0.125 * p.x,
                            0.125 * s.y + 0.375 * c1.y + 0.375 * c2.y + 0.125 * p.y,
                        ),
                        p,
                    ),
                    Segment::QuadTo(c, p) => (
                        Point::new(0.25 * s.x + 0.5 * c.x + 0.25 * p.x, 0.25 * s.y + 0.5 * c.y + 0.25 * p.y),
                        p,
                    ),
                    _ => continue,
                };
                let piece = CurvePiece { start: s, mid, end: p };
                match chains.last_mut() {
                    Some(chain) if in_chain => chain.push(piece),
                    _ => chains.push(vec![piece]),
                }
                in_chain = true;
                current = Some(p);
            }
            Segment::Close => {
                in_chain = false;
                current = start;
            }
        }
    }

    let chord = |chain: &Vec<CurvePiece>| chain.iter().map(|c| c.start.distance(&c.end)).sum::<f64>();
    let outer = chains
        .iter()
        .max_by(|a, b| chord(a).partial_cmp(&chord(b)).unwrap_or(Ordering::Equal))?;
    let first = outer.first()?;
    let center = circumcenter(first.start, first.mid, first.end)?;
    let radius = center.distance(&first.start);
    if radius < 1e-6 {
        return None;
    }

    let total: f64 = outer
        .iter()
        .map(|c| normalize_delta(page_angle(&center, &c.end) - page_angle(&center, &c.start)))
        .sum();
    let start_angle = page_angle(&center, &first.start).rem_euclid(360.0);
    Some(ArcShape {
        center,
        radius,
        start_angle,
        end_angle: start_angle + total,
        sweep: total.abs().min(360.0),
        is_pie: corners.iter().any(|p| p.distance(&center) < 0.2 * radius),
    })
}

fn extract_pies(shapes: &[Shape], used_shapes: &mut [bool]) -> Vec<PieGroup> {
    let mut pies: Vec<PieGroup> = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        if used_shapes[i] || !shape.fill || !shape.path.has_curves() {
            continue;
        }
        let arc = match arc_of(&shape.path) {
            Some(a) if a.sweep > 1e-6 => a,
            _ => continue,
        };
        used_shapes[i] = true;
        let slice = PieSlice {
            text: String::new(),
            color: shape.color,
            weight: (arc.sweep / 360.0).clamp(0.0, 1.0),
            path: shape.path.clone(),
            is_pie: arc.is_pie,
            start_angle: arc.start_angle,
            end_angle: arc.end_angle,
            id: 0,
            number_text: None,
        };
        let group = pies.iter_mut().find(|g| {
            g.center.distance(&arc.center) < 0.5 * g.radius && (arc.radius - g.radius).abs() < 0.2 * g.radius
        });
        match group {
            Some(g) => g.slices.push(PieSlice { id: g.id, ..slice }),
            None => {
                let id = pies.len();
                pies.push(PieGroup {
                    id,
                    center: arc.center,
                    radius: arc.radius,
                    slices: vec![PieSlice { id, ..slice }],
                });
            }
        }
    }
    pies
}

/// Chunk nearest to `target` within `limit`
fn nearest_chunk(
    chunks: &[TextChunk],
    used: &[bool],
    target: &Point,
    limit: f64,
    numeric: bool,
) -> Option<usize> {
    chunks
        .iter()
        .enumerate()
        .filter(|(j, c)| !used[*j] && !c.is_blank() && c.text().contains('%') == numeric)
        .map(|(j, c)| (j, c.center().distance(target)))
        .filter(|(_, d)| *d < limit)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(j, _)| j)
}

fn label_pie_slices(pie: &mut PieGroup, legends: &[Legend], chunks: &[TextChunk], used: &mut [bool]) {
    for slice in pie.slices.iter_mut() {
        let mid = ((slice.start_angle + slice.end_angle) / 2.0).to_radians();
        let target = Point::new(
            pie.center.x + pie.radius * mid.cos(),
            pie.center.y - pie.radius * mid.sin(),
        );
        if let Some(j) = nearest_chunk(chunks, used, &target, pie.radius, true) {
            used[j] = true;
            slice.number_text = Some(chunks[j].text().trim().to_string());
        }
        if let Some(legend) = legends.iter().find(|l| l.color == slice.color) {
            slice.text = legend.text.clone();
        } else if let Some(j) = nearest_chunk(chunks, used, &target, pie.radius, false) {
            used[j] = true;
            slice.text = chunks[j].text().trim().to_string();
        }
    }
}

// ============================================================================
// Chart type
// ============================================================================

/// Chart type from the extracted elements, with the types of a combo chart
pub fn decide_chart_type(series: &[PathSeries], pies: &[PieGroup]) -> (ChartType, Vec<ChartType>) {
    if !pies.is_empty() {
        return (ChartType::Pie, Vec::new());
    }
    let has = |f: fn(&PathRole) -> bool| series.iter().any(|s| f(&s.role));
    let bars = has(PathRole::is_bar);
    let lines = has(PathRole::is_line);
    let areas: Vec<&PathSeries> = series.iter().filter(|s| s.role == PathRole::Area).collect();
    let bar_type = if series.iter().any(|s| s.role == PathRole::Bar) {
        ChartType::Bar
    } else {
        ChartType::Column
    };
    let area_type = {
        let bounds: Vec<Rect> = areas.iter().filter_map(|s| s.path.bounds()).collect();
        let overlapping = bounds.len() >= 2
            && bounds.iter().all(|b| (b.max_y() - bounds[0].max_y()).abs() < 1.0);
        if overlapping {
            ChartType::AreaOverlap
        } else {
            ChartType::Area
        }
    };

    if bars && (lines || !areas.is_empty()) {
        let mut subs = vec![bar_type];
        if lines {
            subs.push(ChartType::Line);
        }
        if !areas.is_empty() {
            subs.push(ChartType::Area);
        }
        (ChartType::Combo, subs)
    } else if bars {
        (bar_type, Vec::new())
    } else if !areas.is_empty() {
        (area_type, Vec::new())
    } else if lines {
        (ChartType::Line, Vec::new())
    } else {
        (ChartType::Unknown, Vec::new())
    }
}

// ============================================================================
// Text layout
// ============================================================================

/// Text chunks sorted onto the chart's parts, by chunk index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub sides: [Vec<usize>; 4],
    pub units: [Option<usize>; 2],
    pub title: Option<usize>,
    pub subtitle: Option<usize>,
    /// Chunks inside the plot, candidates for value labels
    pub inner: Vec<usize>,
}

/// Tick position of a label along its axis
pub fn label_position(chunk: &TextChunk, side: AxisSide) -> f64 {
    if side.is_vertical() {
        chunk.center().y
    } else {
        chunk.center().x
    }
}

/// Assign chunks to axis sides, units, title and plot interior
pub fn layout_text(
    chunks: &[TextChunk],
    used: &[bool],
    axes: &Axes,
    plot: &Rect,
    chart_type: ChartType,
    config: &ExtractConfig,
) -> TextLayout {
    let mut layout = TextLayout::default();
    let mut taken = used.to_vec();
    let reach = |c: &TextChunk| config.tick_text_distance * c.font_size().max(1.0);

    // Bottom
    let bottom_y = axes.bottom.as_ref().map(|a| a.line.start.y).unwrap_or(plot.max_y());
    let (x_lo, x_hi) = (plot.min_x() - 0.1 * plot.width, plot.max_x() + 0.1 * plot.width);
    for (j, c) in chunks.iter().enumerate() {
        if taken[j] || c.is_blank() {
            continue;
        }
        let gap = c.bounds.min_y() - bottom_y;
        let cx = c.center().x;
        if gap >= -0.5 && gap <= reach(c) && cx >= x_lo && cx <= x_hi {
            layout.sides[AxisSide::Bottom.index()].push(j);
            taken[j] = true;
        }
    }

    // Top, numbers and dates only
    if let Some(top) = &axes.top {
        let top_y = top.line.start.y;
        for (j, c) in chunks.iter().enumerate() {
            if taken[j] || c.is_blank() {
                continue;
            }
            let gap = top_y - c.bounds.max_y();
            let text = c.text();
            let quantity = is_numeric_text(&text)
                || crate::patterns::DATE_PATTERNS.iter().any(|p| p.parse(&text).is_some());
            if quantity && gap >= -0.5 && gap <= reach(c) && c.center().x >= x_lo && c.center().x <= x_hi {
                layout.sides[AxisSide::Top.index()].push(j);
                taken[j] = true;
            }
        }
    }

    // Left and right
    let labels_vertical = chart_type.swaps_axes();
    let (y_lo, y_hi) = (plot.min_y(), plot.max_y());
    for side in [AxisSide::Left, AxisSide::Right] {
        let reference = match side {
            AxisSide::Left => axes.left.as_ref().map(|a| a.line.start.x).unwrap_or(plot.min_x()),
            _ => axes.right.as_ref().map(|a| a.line.start.x).unwrap_or(plot.max_x()),
        };
        if side == AxisSide::Right && axes.right.is_none() {
            // Without a right axis only numbers right of the plot qualify
            if !chunks.iter().enumerate().any(|(j, c)| {
                !taken[j] && c.is_numeric() && c.bounds.min_x() >= reference - 1.0
            }) {
                continue;
            }
        }
        let mut column: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(j, c)| {
                if taken[*j] || c.is_blank() {
                    return false;
                }
                let font = c.font_size().max(1.0);
                let inside_y = c.center().y >= y_lo - 2.0 * font && c.center().y <= y_hi + font;
                let near = match side {
                    AxisSide::Left => {
                        (c.bounds.max_x() <= reference + 1.0)
                            && (reference - c.bounds.max_x() <= 0.25 * plot.width.max(1.0))
                    }
                    _ => {
                        (c.bounds.min_x() >= reference - 1.0)
                            && (c.bounds.min_x() - reference <= 0.25 * plot.width.max(1.0))
                    }
                };
                inside_y && near
            })
            .map(|(j, _)| j)
            .collect();
        column.sort_by(|a, b| {
            chunks[*a]
                .center()
                .y
                .partial_cmp(&chunks[*b].center().y)
                .unwrap_or(Ordering::Equal)
        });
        for j in column {
            taken[j] = true;
            if labels_vertical || chunks[j].is_numeric() {
                layout.sides[side.index()].push(j);
            } else if layout.units[side.index()].is_none() {
                layout.units[side.index()] = Some(j);
            }
        }
    }

    // Title and subtitle above the plot
    let mut above: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(j, c)| !taken[*j] && !c.is_blank() && !c.is_numeric() && c.center().y < plot.min_y())
        .map(|(j, _)| j)
        .collect();
    above.sort_by(|a, b| {
        chunks[*b]
            .font_size()
            .partial_cmp(&chunks[*a].font_size())
            .unwrap_or(Ordering::Equal)
            .then(
                chunks[*a]
                    .center()
                    .y
                    .partial_cmp(&chunks[*b].center().y)
                    .unwrap_or(Ordering::Equal),
            )
    });
    if let Some(&title) = above.first() {
        layout.title = Some(title);
        taken[title] = true;
        let title_chunk = &chunks[title];
        layout.subtitle = above
            .iter()
            .skip(1)
            .copied()
            .filter(|j| {
                let c = &chunks[*j];
                c.font_size() < title_chunk.font_size() && c.center().y > title_chunk.bounds.max_y()
            })
            .min_by(|a, b| {
                chunks[*a]
                    .center()
                    .y
                    .partial_cmp(&chunks[*b].center().y)
                    .unwrap_or(Ordering::Equal)
            });
        if let Some(sub) = layout.subtitle {
            taken[sub] = true;
        }
    }

    layout.inner = chunks
        .iter()
        .enumerate()
        .filter(|(j, c)| !taken[*j] && !c.is_blank() && plot.extend(1.0).contains_point(&c.center()))
        .map(|(j, _)| j)
        .collect();
    layout
}

// ============================================================================
// Subdivision and values
// ============================================================================

/// Decide which series sample the X axis finer than its ticks.
///
/// Lines with more vertices than labels and all areas subdivide. A label X
/// axis with lines and no bars switches to only-match mode: the axis gets an
/// extended tick set and the line values are matched to it. Returns whether
/// only-match mode is on.
pub fn judge_subdivide(
    series: &mut [PathSeries],
    scales: &mut ScaleSet,
    x_range: (f64, f64),
    config: &ScaleConfig,
) -> bool {
    let x_side = scales.first_of(AxisSide::Bottom, AxisSide::Top);
    let has_bars = series.iter().any(|s| s.role.is_bar());
    let mut subdivided = false;
    for s in series.iter_mut() {
        if s.role == PathRole::Area {
            s.subdivide_x = true;
        } else if s.role.is_line() {
            if let Some(side) = x_side {
                s.subdivide_x = s.points.len() > scales[side].len();
            }
        }
        subdivided |= s.subdivide_x && (s.role.is_line() || s.role == PathRole::Area);
    }

    let side = match x_side {
        Some(side) if !has_bars && subdivided && scales[side].is_kind(ScaleKind::Label) => side,
        _ => return false,
    };
    let q = &scales[side];
    let extended = match build_axis_scale(&q.xs, &q.infos, x_range.0, x_range.1, config.extended_samples) {
        Some(e) => e,
        None => return false,
    };
    scales[side] = extended;
    for s in series.iter_mut() {
        if s.role.is_line() || s.role == PathRole::Area {
            s.only_match_x_scale = true;
            s.side_x = side;
        }
    }
    debug!("label axis extended for only-match sampling");
    true
}

/// What series values are read against
pub struct ValueContext<'a> {
    pub scales: &'a ScaleSet,
    pub axes: &'a Axes,
    pub plot: Rect,
    pub inner: Vec<&'a TextChunk>,
    pub scale_config: &'a ScaleConfig,
    pub config: &'a ExtractConfig,
}

/// Numeric chunk next to the value end of a bar
fn nearby_value(point: &Point, horizontal: bool, inner: &[&TextChunk], factor: f64) -> Option<String> {
    inner
        .iter()
        .filter(|c| c.is_numeric())
        .find(|c| {
            let font = c.font_size().max(1.0);
            let b = c.bounds;
            if horizontal {
                b.min_x() >= point.x - 1.0
                    && b.min_x() - point.x <= factor * font
                    && (b.center_y() - point.y).abs() <= (b.height / 2.0).max(font)
            } else {
                b.max_y() <= point.y + 1.0
                    && point.y - b.max_y() <= factor * font
                    && (b.center_x() - point.x).abs() <= (b.width / 2.0).max(font)
            }
        })
        .map(|c| c.text().trim().to_string())
}

/// Read one coordinate of every point through a quantity scale
fn read_numbers(scales: &ScaleSet, side: AxisSide, coords: &[f64], config: &ScaleConfig) -> Option<Vec<String>> {
    let q = &scales[side];
    if !q.is_kind(ScaleKind::Number) {
        return None;
    }
    coords
        .iter()
        .map(|c| interpolate_number(&q.xs, &q.nums_d, *c, config.max_extrapolation).map(format_number))
        .collect()
}

/// Read the category coordinate of every point through a tick scale.
/// Returns the values and the scale kind they were read as.
fn read_categories(
    s: &PathSeries,
    scales: &ScaleSet,
    side: AxisSide,
    coords: &[f64],
    config: &ScaleConfig,
) -> Option<(Vec<String>, ScaleKind)> {
    let q = &scales[side];
    if q.is_empty() {
        return None;
    }
    let labels = || -> Option<Vec<String>> {
        coords
            .iter()
            .map(|c| nearest_label(&q.xs, *c).map(|i| q.infos[i].clone()))
            .collect()
    };
    let label_mode = q.is_kind(ScaleKind::Label) || s.role.is_bar() || coords.len() <= q.len();
    if label_mode {
        return labels().map(|v| (v, ScaleKind::Label));
    }
    match q.kind {
        Some(ScaleKind::Time) => coords
            .iter()
            .map(|c| interpolate_time(&q.xs, &q.nums_l, *c, config.max_extrapolation).map(|t| t.to_string()))
            .collect::<Option<Vec<String>>>()
            .map(|v| (v, ScaleKind::Time))
            .or_else(|| labels().map(|v| (v, ScaleKind::Label))),
        _ => read_numbers(scales, side, coords, config).map(|v| (v, ScaleKind::Number)),
    }
}

/// Keep one point per tick: the nearest one
fn resample_at_ticks(s: &mut PathSeries, tick_xs: &[f64], horizontal: bool) {
    let coord = |p: &Point| if horizontal { p.y } else { p.x };
    let mut picked = Vec::new();
    for t in tick_xs {
        let best = s
            .points
            .iter()
            .min_by(|a, b| {
                (coord(a) - t)
                    .abs()
                    .partial_cmp(&(coord(b) - t).abs())
                    .unwrap_or(Ordering::Equal)
            })
            .copied();
        if let Some(p) = best {
            picked.push(p);
        }
    }
    s.positions = picked.iter().map(|p| coord(p)).collect();
    s.points = picked;
}

/// Fill `values_x`/`values_y` of a series from its sampled points
pub fn assign_values(s: &mut PathSeries, ctx: &ValueContext) {
    let horizontal = s.role == PathRole::Columnar;
    let scales = ctx.scales;

    let category_side = if horizontal {
        scales.first_of(AxisSide::Left, AxisSide::Right)
    } else {
        scales.first_of(AxisSide::Bottom, AxisSide::Top)
    };
    if let Some(side) = category_side {
        let q = &scales[side];
        if !s.only_match_x_scale && s.role.is_line() && s.points.len() > q.len() && q.is_kind(ScaleKind::Label) {
            let ticks = q.xs.clone();
            resample_at_ticks(s, &ticks, horizontal);
        }
    }

    let along: Vec<f64> = s.points.iter().map(|p| if horizontal { p.y } else { p.x }).collect();
    let across: Vec<f64> = s.points.iter().map(|p| if horizontal { p.x } else { p.y }).collect();

    // Category coordinate
    let origin = if horizontal { ctx.plot.max_y() } else { ctx.plot.min_x() };
    let raw_categories = || -> Vec<String> {
        along
            .iter()
            .map(|c| format_number(if horizontal { origin - c } else { c - origin }))
            .collect()
    };
    let (categories, category_kind) = match category_side {
        Some(_) if s.only_match_x_scale => (
            along.iter().map(|c| format_number(*c)).collect(),
            ScaleKind::Label,
        ),
        Some(side) => {
            read_categories(s, scales, side, &along, ctx.scale_config)
                .unwrap_or_else(|| (raw_categories(), ScaleKind::Number))
        }
        None => (raw_categories(), ScaleKind::Number),
    };

    // Quantity coordinate
    let value_side = if horizontal {
        scales.first_of(AxisSide::Bottom, AxisSide::Top)
    } else if RIGHT_AXIS_KEY.is_match(&s.text) && !scales[AxisSide::Right].is_empty() {
        Some(AxisSide::Right)
    } else {
        scales.first_of(AxisSide::Left, AxisSide::Right)
    };
    let mut from_text = false;
    let values = value_side
        .and_then(|side| read_numbers(scales, side, &across, ctx.scale_config))
        .or_else(|| {
            if !s.role.is_bar() {
                return None;
            }
            let found: Option<Vec<String>> = s
                .points
                .iter()
                .map(|p| nearby_value(p, horizontal, &ctx.inner, ctx.config.nearby_text_factor))
                .collect();
            from_text = found.is_some();
            found
        })
        .unwrap_or_else(|| {
            let base = if horizontal {
                ctx.axes.vertical().map(|a| a.line.start.x).unwrap_or(ctx.plot.min_x())
            } else {
                ctx.axes.horizontal().map(|a| a.line.start.y).unwrap_or(ctx.plot.max_y())
            };
            across
                .iter()
                .map(|c| format_number(if horizontal { c - base } else { base - c }))
                .collect()
        });
    s.value_from_nearby_text = from_text;

    if s.role == PathRole::Area {
        if let (Some(side), Some(b)) = (value_side, s.path.bounds()) {
            let q = &scales[side];
            if let Some(v) = interpolate_number(&q.xs, &q.nums_d, b.max_y(), ctx.scale_config.max_extrapolation) {
                if v.abs() > 1e-6 {
                    s.area_threshold = Some(format_number(v));
                }
            }
        }
    }

    if horizontal {
        s.values_y = categories;
        s.scale_y = category_kind;
        s.values_x = values;
        s.scale_x = ScaleKind::Number;
        if let Some(side) = category_side {
            s.side_y = side;
        }
        if let Some(side) = value_side {
            s.side_x = side;
        }
    } else {
        s.values_x = categories;
        s.scale_x = category_kind;
        s.values_y = values;
        s.scale_y = ScaleKind::Number;
        if let Some(side) = category_side {
            s.side_x = side;
        }
        if let Some(side) = value_side {
            s.side_y = side;
        }
    }
}
