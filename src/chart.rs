//! Chart data model
//!
//! The reconstructed chart: axes, legends, data series or pie slices, and the
//! quantified scales they were read against.

use crate::geometry::{Line, Path, Point, Rect};
use crate::ocr::{OcrDiagnostics, OcrPathInfo};
use crate::scale::ScaleSet;
use crate::text::TextChunk;
use serde::{Deserialize, Serialize};

/// Chart classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartType {
    Line,
    /// Vertical bars standing on the horizontal axis
    Bar,
    /// Horizontal bars, category axis on the left
    Column,
    Area,
    AreaOverlap,
    Pie,
    Scatter,
    Radar,
    Candlestick,
    Discrete,
    Combo,
    /// Raster chart with no usable vector content
    Bitmap,
    #[default]
    Unknown,
}

impl ChartType {
    /// Category axis is vertical, value axis horizontal
    pub fn swaps_axes(&self) -> bool {
        matches!(self, ChartType::Column)
    }
}

/// Geometric role of a data series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathRole {
    Line,
    Curve,
    DashLine,
    /// Vertical bar
    Bar,
    /// Horizontal bar
    Columnar,
    Area,
    Unknown,
}

impl PathRole {
    pub fn is_line(&self) -> bool {
        matches!(self, PathRole::Line | PathRole::Curve | PathRole::DashLine)
    }

    pub fn is_bar(&self) -> bool {
        matches!(self, PathRole::Bar | PathRole::Columnar)
    }

    /// Series type name in the emitted document
    pub fn series_type(&self) -> &'static str {
        match self {
            PathRole::Line | PathRole::DashLine => "line",
            PathRole::Curve => "spline",
            PathRole::Bar => "column",
            PathRole::Columnar => "bar",
            PathRole::Area => "area",
            PathRole::Unknown => "",
        }
    }
}

/// How tick labels (and series values) along one axis are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    Number,
    Label,
    Time,
}

/// One of the four axis sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisSide {
    Left,
    Right,
    Bottom,
    Top,
}

impl AxisSide {
    pub const ALL: [AxisSide; 4] = [AxisSide::Left, AxisSide::Right, AxisSide::Bottom, AxisSide::Top];

    pub fn index(self) -> usize {
        match self {
            AxisSide::Left => 0,
            AxisSide::Right => 1,
            AxisSide::Bottom => 2,
            AxisSide::Top => 3,
        }
    }

    /// Left and right axes run vertically
    pub fn is_vertical(self) -> bool {
        matches!(self, AxisSide::Left | AxisSide::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// An axis line with its tick marks and tick labels
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub line: Line,
    pub marks: Vec<Line>,
    pub ticks: Vec<TextChunk>,
}

impl Axis {
    pub fn new(line: Line) -> Self {
        Self {
            line,
            marks: Vec::new(),
            ticks: Vec::new(),
        }
    }
}

/// Up to one axis per side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axes {
    pub left: Option<Axis>,
    pub right: Option<Axis>,
    pub bottom: Option<Axis>,
    pub top: Option<Axis>,
}

impl Axes {
    pub fn get(&self, side: AxisSide) -> Option<&Axis> {
        match side {
            AxisSide::Left => self.left.as_ref(),
            AxisSide::Right => self.right.as_ref(),
            AxisSide::Bottom => self.bottom.as_ref(),
            AxisSide::Top => self.top.as_ref(),
        }
    }

    pub fn get_mut(&mut self, side: AxisSide) -> Option<&mut Axis> {
        match side {
            AxisSide::Left => self.left.as_mut(),
            AxisSide::Right => self.right.as_mut(),
            AxisSide::Bottom => self.bottom.as_mut(),
            AxisSide::Top => self.top.as_mut(),
        }
    }

    /// The horizontal axis the data stands on
    pub fn horizontal(&self) -> Option<&Axis> {
        self.bottom.as_ref().or(self.top.as_ref())
    }

    /// The vertical axis horizontal bars start from
    pub fn vertical(&self) -> Option<&Axis> {
        self.left.as_ref().or(self.right.as_ref())
    }

    /// Axis lines plus tick marks
    pub fn lines(&self) -> Vec<Line> {
        AxisSide::ALL
            .iter()
            .filter_map(|s| self.get(*s))
            .flat_map(|a| std::iter::once(a.line).chain(a.marks.iter().copied()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        AxisSide::ALL.iter().all(|s| self.get(*s).is_none())
    }
}

/// A legend entry
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub text: String,
    pub color: Color,
    /// Swatch box
    pub bounds: Rect,
}

/// One data series of a non-pie chart
#[derive(Debug, Clone, PartialEq)]
pub struct PathSeries {
    pub role: PathRole,
    pub color: Color,
    pub path: Path,
    /// Representative points sampled from the path, in page coordinates
    pub points: Vec<Point>,
    pub values_x: Vec<String>,
    pub values_y: Vec<String>,
    /// Page position of each value along the category direction
    pub positions: Vec<f64>,
    pub scale_x: ScaleKind,
    pub scale_y: ScaleKind,
    pub side_x: AxisSide,
    pub side_y: AxisSide,
    /// Legend text, empty when not shown in the legend
    pub text: String,
    /// Only points directly over a tick carry a value
    pub only_match_x_scale: bool,
    /// Values were read from labels next to the shapes
    pub value_from_nearby_text: bool,
    pub subdivide_x: bool,
    pub subdivide_y: bool,
    pub area_threshold: Option<String>,
}

impl PathSeries {
    pub fn new(role: PathRole, color: Color, path: Path) -> Self {
        Self {
            role,
            color,
            path,
            points: Vec::new(),
            values_x: Vec::new(),
            values_y: Vec::new(),
            positions: Vec::new(),
            scale_x: ScaleKind::Label,
            scale_y: ScaleKind::Number,
            side_x: AxisSide::Bottom,
            side_y: AxisSide::Left,
            text: String::new(),
            only_match_x_scale: false,
            value_from_nearby_text: false,
            subdivide_x: false,
            subdivide_y: false,
            area_threshold: None,
        }
    }

    /// Side and values of the quantity axis: Y for everything except
    /// horizontal bars, whose values run along X
    pub fn value_axis(&self) -> (AxisSide, &[String]) {
        if self.role == PathRole::Columnar {
            (self.side_x, &self.values_x)
        } else {
            (self.side_y, &self.values_y)
        }
    }
}

/// One wedge of a pie or ring
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub text: String,
    pub color: Color,
    /// Share of the full circle in [0, 1]
    pub weight: f64,
    pub path: Path,
    /// Full pie wedge, false for a ring segment
    pub is_pie: bool,
    /// Degrees, counter-clockwise from the positive x axis
    pub start_angle: f64,
    pub end_angle: f64,
    /// Pie this slice belongs to
    pub id: usize,
    /// Percent or number text found next to the slice
    pub number_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieGroup {
    pub id: usize,
    pub center: Point,
    pub radius: f64,
    pub slices: Vec<PieSlice>,
}

impl PieGroup {
    pub fn is_ring(&self) -> bool {
        self.slices.first().map(|s| !s.is_pie).unwrap_or(false)
    }
}

/// Which detection path produced the region, plus parser flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub detect_model_area: bool,
    pub hint_area: bool,
    pub recall_area: bool,
    pub legend_match_path: bool,
    pub only_match_x_scale: bool,
    pub ocr: OcrDiagnostics,
}

/// A reconstructed chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDocument {
    pub area: Rect,
    pub chart_type: ChartType,
    pub sub_types: Vec<ChartType>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub legends: Vec<Legend>,
    pub axes: Axes,
    /// Populated for every non-pie chart
    pub series: Vec<PathSeries>,
    /// Populated for pie charts only
    pub pies: Vec<PieGroup>,
    pub confidence: f64,
    pub ocrs: Vec<OcrPathInfo>,
    pub scales: ScaleSet,
    /// Unit labels of the left and right value axes
    pub units: [Option<TextChunk>; 2],
    pub diagnostics: Diagnostics,
}

impl ChartDocument {
    pub fn new(area: Rect, chart_type: ChartType) -> Self {
        Self {
            area,
            chart_type,
            sub_types: Vec::new(),
            title: None,
            subtitle: None,
            legends: Vec::new(),
            axes: Axes::default(),
            series: Vec::new(),
            pies: Vec::new(),
            confidence: 1.0,
            ocrs: Vec::new(),
            scales: ScaleSet::default(),
            units: [None, None],
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn is_pie(&self) -> bool {
        self.chart_type == ChartType::Pie
    }

    pub fn has_ocr_text(&self) -> bool {
        self.ocrs.iter().any(|o| !o.text.trim().is_empty())
    }

    /// Whether any series or legend carries text
    pub fn has_legend(&self) -> bool {
        (self.is_pie() && !self.legends.is_empty()) || self.series.iter().any(|s| !s.text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::new(0, 128, 255).to_hex(), "#0080ff");
        assert_eq!(Color::WHITE.to_hex(), "#ffffff");
    }

    #[test]
    fn test_role_series_types() {
        assert_eq!(PathRole::Bar.series_type(), "column");
        assert_eq!(PathRole::Columnar.series_type(), "bar");
        assert_eq!(PathRole::Curve.series_type(), "spline");
        assert!(PathRole::DashLine.is_line());
        assert!(!PathRole::Area.is_bar());
    }

    #[test]
    fn test_value_axis_of_horizontal_bars() {
        let mut series = PathSeries::new(PathRole::Columnar, Color::BLACK, Path::new());
        series.values_x = vec!["5".into()];
        series.values_y = vec!["A".into()];
        assert_eq!(series.value_axis().1, &["5".to_string()]);
        series.role = PathRole::Bar;
        assert_eq!(series.value_axis().1, &["A".to_string()]);
    }

    #[test]
    fn test_axes_lines_include_marks() {
        let mut axis = Axis::new(Line::new(Point::new(0.0, 100.0), Point::new(100.0, 100.0)));
        axis.marks.push(Line::new(Point::new(50.0, 100.0), Point::new(50.0, 104.0)));
        let axes = Axes {
            bottom: Some(axis),
            ..Default::default()
        };
        assert_eq!(axes.lines().len(), 2);
        assert!(axes.horizontal().is_some());
        assert!(axes.vertical().is_none());
    }
}
