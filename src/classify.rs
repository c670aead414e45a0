//! Content-group classification
//!
//! The drawing content of a chart region arrives as ordered content groups.
//! Consecutive path-only groups with the same style are collected into runs,
//! and each run is labeled against the chart elements already recognized.

use crate::chart::{ChartDocument, ChartType, Color, PathRole};
use crate::geometry::{
    is_approximation_overlap_box, is_approximation_overlap_path, is_same_path, key_points, Line, Path,
    Rect, SegmentKind,
};
use crate::text::TextElement;
use crate::ChartError;
use serde::{Deserialize, Serialize};

fn default_line_width() -> f64 {
    1.0
}

fn default_blend_mode() -> String {
    "Normal".to_string()
}

/// Graphics state a content group was drawn with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsState {
    #[serde(default)]
    pub stroke_color: Color,
    #[serde(default)]
    pub fill_color: Color,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    /// Dash array, empty for solid strokes
    #[serde(default)]
    pub dash: Vec<f64>,
    #[serde(default = "default_blend_mode")]
    pub blend_mode: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
            line_width: default_line_width(),
            dash: Vec::new(),
            blend_mode: default_blend_mode(),
        }
    }
}

/// A filled or stroked path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    pub path: Path,
    /// Filled when true, stroked otherwise
    #[serde(default)]
    pub fill: bool,
    pub color: Color,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default)]
    pub dash: Vec<f64>,
}

impl PathItem {
    pub fn filled(path: Path, color: Color) -> Self {
        Self {
            path,
            fill: true,
            color,
            line_width: default_line_width(),
            dash: Vec::new(),
        }
    }

    pub fn stroked(path: Path, color: Color, line_width: f64) -> Self {
        Self {
            path,
            fill: false,
            color,
            line_width,
            dash: Vec::new(),
        }
    }

    pub fn is_dashed(&self) -> bool {
        !self.dash.is_empty()
    }
}

/// One drawing primitive of a content group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Path(PathItem),
    Text(TextElement),
    Image { bounds: Rect },
}

/// A group of drawing primitives sharing one graphics state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGroup {
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub state: GraphicsState,
}

impl ContentGroup {
    /// Group holding a single path, with a state derived from it
    pub fn from_path(item: PathItem) -> Self {
        let state = GraphicsState {
            stroke_color: item.color,
            fill_color: item.color,
            line_width: item.line_width,
            dash: item.dash.clone(),
            blend_mode: default_blend_mode(),
        };
        Self {
            items: vec![ContentItem::Path(item)],
            state,
        }
    }

    pub fn is_path_only(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| matches!(i, ContentItem::Path(_)))
    }

    pub fn path_items(&self) -> impl Iterator<Item = &PathItem> {
        self.items.iter().filter_map(|i| match i {
            ContentItem::Path(p) => Some(p),
            _ => None,
        })
    }

    pub fn first_path(&self) -> Option<&PathItem> {
        self.path_items().next()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .iter()
            .filter_map(|i| match i {
                ContentItem::Path(p) => p.path.bounds(),
                ContentItem::Text(t) => Some(t.bounds),
                ContentItem::Image { bounds } => Some(*bounds),
            })
            .reduce(|a, b| a.union(&b))
    }
}

/// Consecutive similar path-only groups
#[derive(Debug, Clone, PartialEq)]
pub struct PathRun {
    pub groups: Vec<ContentGroup>,
}

impl PathRun {
    pub fn items(&self) -> impl Iterator<Item = &PathItem> {
        self.groups.iter().flat_map(|g| g.path_items())
    }

    pub fn first_item(&self) -> Option<&PathItem> {
        self.items().next()
    }

    pub fn color(&self) -> Color {
        self.first_item().map(|i| i.color).unwrap_or_default()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.groups.iter().filter_map(|g| g.bounds()).reduce(|a, b| a.union(&b))
    }
}

/// Configuration for run building and classification
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Key points compared by the point-overlap test (default: 8)
    pub max_match_points: usize,
    /// L1 distance under which two key points coincide (default: 1e-2)
    pub point_tolerance: f64,
    /// Line width difference tolerated between similar groups (default: 1e-2)
    pub line_width_tolerance: f64,
    /// L1 distance from an axis endpoint for axis membership (default: 1.0)
    pub axis_endpoint_tolerance: f64,
    /// Slack for axis-aligned segments (default: 0.01)
    pub axis_segment_tolerance: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            max_match_points: 8,
            point_tolerance: 1e-2,
            line_width_tolerance: 1e-2,
            axis_endpoint_tolerance: 1.0,
            axis_segment_tolerance: 0.01,
        }
    }
}

/// Role of a path run inside the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentGroupType {
    Axis,
    Legend,
    Line,
    ColumnarVertical,
    ColumnarHorizon,
    Area,
    Arc,
    Text,
    Other,
}

/// Chart elements a run is checked against
#[derive(Debug, Clone, Default)]
pub struct KnownElements<'a> {
    pub chart_type: ChartType,
    pub pie_paths: Vec<&'a Path>,
    pub series: Vec<(PathRole, &'a Path)>,
    pub legend_boxes: Vec<Rect>,
    pub axis_lines: Vec<Line>,
    pub ocr_boxes: Vec<Rect>,
}

impl<'a> KnownElements<'a> {
    pub fn from_document(doc: &'a ChartDocument) -> Self {
        Self {
            chart_type: doc.chart_type,
            pie_paths: doc
                .pies
                .iter()
                .flat_map(|g| g.slices.iter().map(|s| &s.path))
                .collect(),
            series: doc.series.iter().map(|s| (s.role, &s.path)).collect(),
            legend_boxes: doc.legends.iter().map(|l| l.bounds).collect(),
            axis_lines: doc.axes.lines(),
            ocr_boxes: doc.ocrs.iter().map(|o| o.bounds).collect(),
        }
    }
}

/// External chart-type model working on a rendering of the region
pub trait ChartTypeClassifier: Send + Sync {
    /// Raw labels for the region, most likely first
    fn classify(&self, area: &Rect) -> Result<Vec<String>, ChartError>;
}

/// Same fill mode, color, line width and dash pattern
pub fn is_same_path_item(a: &PathItem, b: &PathItem, config: &ClassifyConfig) -> bool {
    a.fill == b.fill
        && a.color == b.color
        && (a.line_width - b.line_width).abs() <= config.line_width_tolerance
        && a.dash == b.dash
}

pub fn is_same_graphics_state(a: &GraphicsState, b: &GraphicsState, config: &ClassifyConfig) -> bool {
    a.stroke_color == b.stroke_color
        && a.fill_color == b.fill_color
        && (a.line_width - b.line_width).abs() <= config.line_width_tolerance
        && a.dash == b.dash
        && a.blend_mode == b.blend_mode
}

/// The second group redraws the first one
pub fn is_overlap_content_group(a: &ContentGroup, b: &ContentGroup, config: &ClassifyConfig) -> bool {
    let items_a: Vec<&PathItem> = a.path_items().collect();
    let items_b: Vec<&PathItem> = b.path_items().collect();
    if items_a.is_empty() || items_a.len() != items_b.len() {
        return false;
    }
    items_a
        .iter()
        .zip(&items_b)
        .all(|(x, y)| is_same_path_item(x, y, config) && is_same_path(&x.path, &y.path))
}

fn is_similar_group(a: &ContentGroup, b: &ContentGroup, config: &ClassifyConfig) -> bool {
    match (a.first_path(), b.first_path()) {
        (Some(x), Some(y)) => {
            is_same_path_item(x, y, config) && is_same_graphics_state(&a.state, &b.state, config)
        }
        _ => false,
    }
}

/// Build path runs with the default configuration
pub fn mark_chart_path(groups: &[ContentGroup], area: &Rect) -> Vec<PathRun> {
    mark_chart_path_with_config(groups, area, &ClassifyConfig::default())
}

/// Collect consecutive path-only groups of the same style into runs.
///
/// White fills are skipped without breaking a run. Groups that carry text or
/// images, or that fall outside the chart area, close the current run. A
/// group that merely redraws the previous one is dropped.
pub fn mark_chart_path_with_config(
    groups: &[ContentGroup],
    area: &Rect,
    config: &ClassifyConfig,
) -> Vec<PathRun> {
    let mut runs = Vec::new();
    let mut current: Vec<ContentGroup> = Vec::new();

    fn flush(current: &mut Vec<ContentGroup>, runs: &mut Vec<PathRun>) {
        if !current.is_empty() {
            runs.push(PathRun {
                groups: std::mem::take(current),
            });
        }
    }

    for group in groups {
        if !group.is_path_only() {
            flush(&mut current, &mut runs);
            continue;
        }
        let item = match group.first_path() {
            Some(item) => item,
            None => {
                flush(&mut current, &mut runs);
                continue;
            }
        };
        if item.fill && item.color == Color::WHITE {
            continue;
        }
        let inside = group
            .bounds()
            .map(|b| b.extend(0.01).intersects(area))
            .unwrap_or(false);
        if !inside {
            flush(&mut current, &mut runs);
            continue;
        }

        if let Some(last) = current.last() {
            if is_overlap_content_group(last, group, config) {
                continue;
            }
            if !is_similar_group(last, group, config) {
                flush(&mut current, &mut runs);
            }
        }
        current.push(group.clone());
    }
    flush(&mut current, &mut runs);
    runs
}

/// Every key point lies near an axis or tick line endpoint
fn is_approximation_overlap_axis_path(path: &Path, lines: &[Line], config: &ClassifyConfig) -> bool {
    let bounds = match lines
        .iter()
        .map(|l| l.bounds())
        .reduce(|a, b| a.union(&b))
    {
        Some(b) => b.extend(0.1),
        None => return false,
    };
    let pts = key_points(path);
    if pts.is_empty() {
        return false;
    }
    pts.iter().all(|p| {
        bounds.contains_point(&p.point)
            && lines.iter().any(|l| {
                p.point.l1_distance(&l.start) < config.axis_endpoint_tolerance
                    || p.point.l1_distance(&l.end) < config.axis_endpoint_tolerance
            })
    })
}

/// Path made of horizontal and vertical segments only. Jumps to a new
/// subpath are not segments.
fn is_xy_axis_line(path: &Path, config: &ClassifyConfig) -> bool {
    let pts = key_points(path);
    if pts.len() < 2 {
        return false;
    }
    pts.windows(2)
        .filter(|w| w[1].kind != SegmentKind::MoveTo)
        .all(|w| {
            let line = Line::new(w[0].point, w[1].point);
            line.is_horizontal(config.axis_segment_tolerance)
                || line.is_vertical(config.axis_segment_tolerance)
        })
}

fn role_group_type(role: PathRole) -> ContentGroupType {
    match role {
        PathRole::Line | PathRole::Curve | PathRole::DashLine => ContentGroupType::Line,
        PathRole::Bar => ContentGroupType::ColumnarVertical,
        PathRole::Columnar => ContentGroupType::ColumnarHorizon,
        PathRole::Area => ContentGroupType::Area,
        PathRole::Unknown => ContentGroupType::Other,
    }
}

/// Label a run with the default configuration
pub fn judge_content_group_type(run: &PathRun, known: &KnownElements) -> ContentGroupType {
    judge_content_group_type_with_config(run, known, &ClassifyConfig::default())
}

/// Label a run against the recognized elements.
///
/// Pie charts only know arcs and legends. Otherwise series paths win over
/// legend swatches, which win over axes, which win over outline text.
pub fn judge_content_group_type_with_config(
    run: &PathRun,
    known: &KnownElements,
    config: &ClassifyConfig,
) -> ContentGroupType {
    if known.chart_type == ChartType::Bitmap {
        return ContentGroupType::Other;
    }
    let (item, bounds) = match (run.first_item(), run.bounds()) {
        (Some(item), Some(bounds)) => (item, bounds),
        _ => return ContentGroupType::Other,
    };
    let overlaps = |other: &Path| {
        is_approximation_overlap_path(&item.path, other, config.max_match_points, config.point_tolerance)
    };
    let is_legend = || {
        known
            .legend_boxes
            .iter()
            .any(|b| is_approximation_overlap_box(&bounds, b))
    };

    if known.chart_type == ChartType::Pie {
        if known.pie_paths.iter().any(|p| overlaps(*p)) {
            return ContentGroupType::Arc;
        }
        if is_legend() {
            return ContentGroupType::Legend;
        }
        return ContentGroupType::Other;
    }

    if let Some((role, _)) = known.series.iter().find(|(_, p)| overlaps(*p)) {
        return role_group_type(*role);
    }
    if is_legend() {
        return ContentGroupType::Legend;
    }
    if is_approximation_overlap_axis_path(&item.path, &known.axis_lines, config)
        && is_xy_axis_line(&item.path, config)
    {
        return ContentGroupType::Axis;
    }
    if known
        .ocr_boxes
        .iter()
        .any(|b| b.extend(0.1).contains_rect(&bounds))
    {
        return ContentGroupType::Text;
    }
    ContentGroupType::Other
}

/// Map raw model labels to chart types.
///
/// `BAR_CHART` means horizontal bars and maps to `Column`; `COLUMN_CHART`
/// maps to `Bar`. A single unknown label collapses the result to `[Unknown]`.
pub fn map_classifier_labels(labels: &[String]) -> Vec<ChartType> {
    let mut types = Vec::with_capacity(labels.len());
    for label in labels {
        let t = match label.trim().to_uppercase().as_str() {
            "LINE_CHART" | "LINE_POINT_CHART" | "CURVE_CHART" => ChartType::Line,
            "BAR_CHART" => ChartType::Column,
            "COLUMN_CHART" => ChartType::Bar,
            "AREA_CHART" | "AREA_OVERLAP_CHART" => ChartType::Area,
            "PIE_CHART" | "DONUT_CHART" => ChartType::Pie,
            "SCATTER_CHART" => ChartType::Scatter,
            "RADAR_CHART" => ChartType::Radar,
            "CANDLESTICK_CHART" => ChartType::Candlestick,
            "DISCRETE_PLOT" => ChartType::Discrete,
            "COMBO_CHART" => ChartType::Combo,
            _ => return vec![ChartType::Unknown],
        };
        types.push(t);
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn area() -> Rect {
        Rect::new(0.0, 0.0, 200.0, 200.0)
    }

    fn bar(x: f64, color: Color) -> ContentGroup {
        ContentGroup::from_path(PathItem::filled(Path::rect(Rect::new(x, 50.0, 10.0, 50.0)), color))
    }

    fn axis_path() -> Path {
        Path::polyline(&[Point::new(10.0, 100.0), Point::new(190.0, 100.0)])
    }

    #[test]
    fn test_runs_split_on_style() {
        let green = Color::new(0, 128, 0);
        let red = Color::new(200, 0, 0);
        let groups = vec![bar(10.0, green), bar(30.0, green), bar(50.0, red)];
        let runs = mark_chart_path(&groups, &area());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].groups.len(), 2);
        assert_eq!(runs[1].color(), red);
    }

    #[test]
    fn test_runs_skip_white_and_redraws() {
        let green = Color::new(0, 128, 0);
        let groups = vec![
            bar(10.0, green),
            bar(10.0, Color::WHITE),
            bar(10.0, green),
            bar(30.0, green),
        ];
        let runs = mark_chart_path(&groups, &area());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].groups.len(), 2);
    }

    #[test]
    fn test_runs_break_on_text_and_outside() {
        let green = Color::new(0, 128, 0);
        let text = ContentGroup {
            items: vec![ContentItem::Text(TextElement::new(
                "A",
                Rect::new(0.0, 0.0, 5.0, 5.0),
                5.0,
            ))],
            state: GraphicsState::default(),
        };
        let outside = bar(500.0, green);
        let groups = vec![bar(10.0, green), text, bar(30.0, green), outside, bar(50.0, green)];
        let runs = mark_chart_path(&groups, &area());
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn test_judge_axis_is_stable() {
        let run = PathRun {
            groups: vec![ContentGroup::from_path(PathItem::stroked(axis_path(), Color::BLACK, 1.0))],
        };
        let known = KnownElements {
            chart_type: ChartType::Bar,
            axis_lines: vec![Line::new(Point::new(10.0, 100.0), Point::new(190.0, 100.0))],
            ..Default::default()
        };
        assert_eq!(judge_content_group_type(&run, &known), ContentGroupType::Axis);
        assert_eq!(judge_content_group_type(&run, &known), ContentGroupType::Axis);
    }

    #[test]
    fn test_judge_axis_with_two_subpaths() {
        let mut path = Path::new();
        path.move_to(20.0, 180.0);
        path.line_to(190.0, 180.0);
        path.move_to(20.0, 10.0);
        path.line_to(20.0, 180.0);
        let run = PathRun {
            groups: vec![ContentGroup::from_path(PathItem::stroked(path, Color::BLACK, 1.0))],
        };
        let known = KnownElements {
            chart_type: ChartType::Column,
            axis_lines: vec![
                Line::new(Point::new(20.0, 180.0), Point::new(190.0, 180.0)),
                Line::new(Point::new(20.0, 10.0), Point::new(20.0, 180.0)),
            ],
            ..Default::default()
        };
        assert_eq!(judge_content_group_type(&run, &known), ContentGroupType::Axis);
    }

    #[test]
    fn test_judge_legend_swatch_slightly_larger() {
        let run = PathRun {
            groups: vec![ContentGroup::from_path(PathItem::filled(
                Path::rect(Rect::new(9.85, 9.85, 4.3, 4.3)),
                Color::new(0, 128, 0),
            ))],
        };
        let known = KnownElements {
            chart_type: ChartType::Bar,
            legend_boxes: vec![Rect::new(10.0, 10.0, 4.0, 4.0)],
            ..Default::default()
        };
        assert_eq!(judge_content_group_type(&run, &known), ContentGroupType::Legend);
    }

    #[test]
    fn test_judge_series_before_legend() {
        let green = Color::new(0, 128, 0);
        let bar_path = Path::rect(Rect::new(10.0, 50.0, 10.0, 50.0));
        let run = PathRun {
            groups: vec![bar(10.0, green)],
        };
        let known = KnownElements {
            chart_type: ChartType::Bar,
            series: vec![(PathRole::Bar, &bar_path)],
            legend_boxes: vec![Rect::new(10.0, 50.0, 10.0, 50.0)],
            ..Default::default()
        };
        assert_eq!(
            judge_content_group_type(&run, &known),
            ContentGroupType::ColumnarVertical
        );
    }

    #[test]
    fn test_judge_bitmap_is_other() {
        let run = PathRun {
            groups: vec![bar(10.0, Color::BLACK)],
        };
        let known = KnownElements {
            chart_type: ChartType::Bitmap,
            ..Default::default()
        };
        assert_eq!(judge_content_group_type(&run, &known), ContentGroupType::Other);
    }

    #[test]
    fn test_map_classifier_labels() {
        let labels = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        assert_eq!(
            map_classifier_labels(&labels(&["BAR_CHART", "column_chart", "DONUT_CHART"])),
            vec![ChartType::Column, ChartType::Bar, ChartType::Pie]
        );
        assert_eq!(
            map_classifier_labels(&labels(&["LINE_CHART", "nonsense"])),
            vec![ChartType::Unknown]
        );
    }
}
