//! Scale quantification
//!
//! Turns the tick labels of each axis side into numbers, timestamps or plain
//! categories, and provides the lookups series values are read through.

use crate::chart::{AxisSide, ChartType, PathSeries, ScaleKind};
use crate::patterns::{TimeFormat, DATE_PATTERNS, NUMBER_AUXILIARY, NUMBER_SUFFIX};
use chrono::{DateTime, NaiveTime, Timelike};
use log::debug;
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

/// Configuration for scale quantification
#[derive(Debug, Clone)]
pub struct ScaleConfig {
    /// Share of the tick interval the data may exceed the axis by before a tick is added (default: 0.05)
    pub expand_tolerance: f64,
    /// Samples of the extended label scale (default: 400)
    pub extended_samples: usize,
    /// Relative step tolerance of arithmetic tick sequences (default: 0.2)
    pub arithmetic_tolerance: f64,
    /// Tick intervals of extrapolation allowed beyond the outer ticks (default: 10.0)
    pub max_extrapolation: f64,
    /// Minimum labels a time format must keep (default: 2)
    pub min_time_values: usize,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            expand_tolerance: 0.05,
            extended_samples: 400,
            arithmetic_tolerance: 0.2,
            max_extrapolation: 10.0,
            min_time_values: 2,
        }
    }
}

/// Quantified tick labels of one axis side.
///
/// `infos` and `xs` are always co-indexed, and so is `nums_d` (Number) or
/// `nums_l` (Time) when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleQuantification {
    pub kind: Option<ScaleKind>,
    /// Page position of each tick along the axis
    pub xs: Vec<f64>,
    pub nums_d: Vec<f64>,
    /// Epoch milliseconds
    pub nums_l: Vec<i64>,
    pub infos: Vec<String>,
    pub suffix: String,
    pub time_format: Option<TimeFormat>,
    /// Extended tick set for sampled label axes
    pub infos_ext: Vec<String>,
    pub xs_ext: Vec<f64>,
}

impl ScaleQuantification {
    pub fn labels(infos: Vec<String>, xs: Vec<f64>) -> Self {
        Self {
            kind: Some(ScaleKind::Label),
            xs,
            infos,
            ..Default::default()
        }
    }

    pub fn numbers(infos: Vec<String>, xs: Vec<f64>, nums: Vec<f64>, suffix: &str) -> Self {
        Self {
            kind: Some(ScaleKind::Number),
            xs,
            nums_d: nums,
            infos,
            suffix: suffix.to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_kind(&self, kind: ScaleKind) -> bool {
        self.kind == Some(kind)
    }

    /// Same label text on more than one tick
    pub fn has_duplicate_labels(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        !self.infos.iter().all(|s| seen.insert(s.as_str()))
    }

    pub fn has_extension(&self) -> bool {
        !self.xs_ext.is_empty()
    }
}

/// Quantified scales of the four sides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleSet {
    pub sides: [ScaleQuantification; 4],
}

impl ScaleSet {
    /// First non-empty side of the two, in order
    pub fn first_of(&self, a: AxisSide, b: AxisSide) -> Option<AxisSide> {
        [a, b].into_iter().find(|s| !self[*s].is_empty())
    }
}

impl Index<AxisSide> for ScaleSet {
    type Output = ScaleQuantification;

    fn index(&self, side: AxisSide) -> &ScaleQuantification {
        &self.sides[side.index()]
    }
}

impl IndexMut<AxisSide> for ScaleSet {
    fn index_mut(&mut self, side: AxisSide) -> &mut ScaleQuantification {
        &mut self.sides[side.index()]
    }
}

/// Parse a numeric label into its value and unit suffix.
///
/// Decorations like currency signs, percent, thousands separators and
/// multipliers are stripped. `(n)` is negative, and a lone dash reads as 0.
pub fn parse_number(text: &str) -> Option<(f64, String)> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == "-" || compact == "‐" {
        return Some((0.0, String::new()));
    }
    if !compact.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let suffix = NUMBER_SUFFIX
        .find(&compact)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let negative = compact.starts_with('(') && compact.ends_with(')');
    let cleaned = NUMBER_AUXILIARY.replace_all(&compact, "");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((if negative { -value } else { value }, suffix))
}

pub fn round_off(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let r = (value * factor).round() / factor;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Shortest text for a value rounded to 4 decimals
pub fn format_number(value: f64) -> String {
    format!("{}", round_off(value, 4))
}

/// Constant-step sequence within `tolerance` of the first step
pub fn is_arithmetic_sequence(nums: &[f64], tolerance: f64) -> bool {
    if nums.len() <= 2 {
        return true;
    }
    let step = nums[1] - nums[0];
    if step.abs() < 1e-5 {
        return false;
    }
    nums.windows(2).all(|w| {
        let d = w[1] - w[0];
        d.signum() == step.signum() && (d - step).abs() <= tolerance * step.abs()
    })
}

/// Parse tick labels as numbers, repairing sequences that are not arithmetic.
///
/// Values whose successor is smaller get their sign flipped (labels that lost
/// a minus sign). If that does not help the sequence is rebuilt from the
/// first value and step.
pub fn strings_to_numbers(labels: &[String], config: &ScaleConfig) -> Option<(Vec<f64>, String)> {
    if labels.is_empty() {
        return None;
    }
    let mut values = Vec::with_capacity(labels.len());
    let mut suffix = String::new();
    for label in labels {
        let (v, s) = parse_number(label)?;
        if suffix.is_empty() {
            suffix = s;
        }
        values.push(v);
    }

    let tol = config.arithmetic_tolerance;
    if is_arithmetic_sequence(&values, tol) {
        return Some((values, suffix));
    }

    let mut flipped = values.clone();
    for i in 0..values.len() - 1 {
        if values[i + 1] < values[i] {
            flipped[i] = -values[i];
        }
    }
    if is_arithmetic_sequence(&flipped, tol) {
        debug!("tick labels {:?} repaired by sign", labels);
        return Some((flipped, suffix));
    }

    let step = values[1] - values[0];
    if step.abs() < 1e-5 {
        return Some((values, suffix));
    }
    debug!("tick labels {:?} rebuilt with step {}", labels, step);
    let rebuilt = (0..values.len()).map(|i| values[0] + i as f64 * step).collect();
    Some((rebuilt, suffix))
}

/// Labels of a time axis parsed with one date format
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    /// Epoch milliseconds of the kept labels
    pub timestamps: Vec<i64>,
    /// Indices of the kept labels
    pub kept: Vec<usize>,
    pub format: TimeFormat,
}

/// Drop timestamps that do not increase, keeping the first
pub fn remove_invalid_scale(timestamps: &[i64]) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for (i, ts) in timestamps.iter().enumerate() {
        match kept.last() {
            Some(&last) if *ts <= timestamps[last] => {}
            _ => kept.push(i),
        }
    }
    kept
}

fn interval_variance(timestamps: &[i64]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }
    let steps: Vec<f64> = timestamps.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let mean = steps.iter().sum::<f64>() / steps.len() as f64;
    steps.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / steps.len() as f64
}

/// Parse labels as dates.
///
/// A format qualifies when it parses every label and keeps at least
/// `min_values` increasing timestamps. Formats with a year win, then the most
/// regular spacing.
pub fn parse_time_labels(labels: &[String], min_values: usize) -> Option<TimeScale> {
    if labels.is_empty() {
        return None;
    }
    let candidates = DATE_PATTERNS.iter().filter_map(|pattern| {
        let all: Option<Vec<i64>> = labels
            .iter()
            .map(|l| pattern.parse(l).map(|d| d.and_utc().timestamp_millis()))
            .collect();
        let all = all?;
        let kept = remove_invalid_scale(&all);
        if kept.len() < min_values {
            return None;
        }
        let timestamps: Vec<i64> = kept.iter().map(|&i| all[i]).collect();
        Some(TimeScale {
            timestamps,
            kept,
            format: pattern.format,
        })
    });

    candidates.min_by(|a, b| {
        b.format
            .has_year()
            .cmp(&a.format.has_year())
            .then_with(|| {
                interval_variance(&a.timestamps)
                    .partial_cmp(&interval_variance(&b.timestamps))
                    .unwrap_or(Ordering::Equal)
            })
    })
}

/// Linear value at page position `x` through the outer ticks.
///
/// Positions more than `max_extrapolation` tick intervals beyond the ends
/// have no value.
pub fn interpolate_number(xs: &[f64], nums: &[f64], x: f64, max_extrapolation: f64) -> Option<f64> {
    let n = xs.len();
    if n < 2 || nums.len() != n {
        return None;
    }
    let span = xs[n - 1] - xs[0];
    if span.abs() < 1e-9 {
        return None;
    }
    let spacing = span.abs() / (n - 1) as f64;
    let lo = xs[0].min(xs[n - 1]) - max_extrapolation * spacing;
    let hi = xs[0].max(xs[n - 1]) + max_extrapolation * spacing;
    if x < lo || x > hi {
        return None;
    }
    Some(nums[0] + (x - xs[0]) * (nums[n - 1] - nums[0]) / span)
}

pub fn interpolate_time(xs: &[f64], nums: &[i64], x: f64, max_extrapolation: f64) -> Option<i64> {
    let as_f64: Vec<f64> = nums.iter().map(|&v| v as f64).collect();
    interpolate_number(xs, &as_f64, x, max_extrapolation).map(|v| v.round() as i64)
}

/// Index of the tick nearest to `x`
pub fn nearest_label(xs: &[f64], x: f64) -> Option<usize> {
    xs.iter()
        .enumerate()
        .min_by(|a, b| {
            (a.1 - x)
                .abs()
                .partial_cmp(&(b.1 - x).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Quantify the labels of one side. `labels` pairs each text with its page
/// position along the axis.
pub fn quantize_labels(
    labels: &[(String, f64)],
    side: AxisSide,
    chart_type: ChartType,
    config: &ScaleConfig,
) -> ScaleQuantification {
    let mut items: Vec<(String, f64)> = labels
        .iter()
        .map(|(t, x)| (t.trim().to_string(), *x))
        .filter(|(t, _)| !t.is_empty())
        .collect();
    if items.is_empty() {
        return ScaleQuantification::default();
    }
    // Vertical sides run bottom to top
    if side.is_vertical() {
        items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    } else {
        items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    }
    let (infos, xs): (Vec<String>, Vec<f64>) = items.into_iter().unzip();

    let kinds: &[ScaleKind] = match (chart_type.swaps_axes(), side.is_vertical()) {
        (true, true) => &[ScaleKind::Label],
        (true, false) => &[ScaleKind::Number],
        (false, true) => &[ScaleKind::Number],
        (false, false) if chart_type == ChartType::Line => &[ScaleKind::Label],
        (false, false) => &[ScaleKind::Time, ScaleKind::Number, ScaleKind::Label],
    };

    for kind in kinds {
        let scale = match kind {
            ScaleKind::Number => strings_to_numbers(&infos, config)
                .map(|(nums, suffix)| ScaleQuantification::numbers(infos.clone(), xs.clone(), nums, &suffix)),
            ScaleKind::Time => parse_time_labels(&infos, config.min_time_values).map(|ts| ScaleQuantification {
                kind: Some(ScaleKind::Time),
                xs: ts.kept.iter().map(|&i| xs[i]).collect(),
                infos: ts.kept.iter().map(|&i| infos[i].clone()).collect(),
                nums_l: ts.timestamps,
                time_format: Some(ts.format),
                ..Default::default()
            }),
            ScaleKind::Label => Some(ScaleQuantification::labels(infos.clone(), xs.clone())),
        };
        if let Some(scale) = scale {
            return scale;
        }
    }
    debug!("{:?} axis labels {:?} are not usable", side, infos);
    ScaleQuantification::default()
}

/// Label scale plus an extended tick set of `samples` evenly spaced ticks
/// over `[min, max]`. Real ticks carry their label on the nearest sample, all
/// other samples are blank.
pub fn build_axis_scale(
    xs: &[f64],
    infos: &[String],
    min: f64,
    max: f64,
    samples: usize,
) -> Option<ScaleQuantification> {
    if samples < 2 || max <= min || xs.len() != infos.len() {
        return None;
    }
    let step = (max - min) / (samples - 1) as f64;
    let xs_ext: Vec<f64> = (0..samples).map(|i| min + i as f64 * step).collect();
    let mut infos_ext = vec![String::new(); samples];
    for (x, info) in xs.iter().zip(infos) {
        let idx = ((x - min) / step).round();
        if idx >= 0.0 && (idx as usize) < samples {
            infos_ext[idx as usize] = info.clone();
        }
    }
    let mut scale = ScaleQuantification::labels(infos.to_vec(), xs.to_vec());
    scale.xs_ext = xs_ext;
    scale.infos_ext = infos_ext;
    Some(scale)
}

fn format_tick(value: f64, reference: &str, suffix: &str) -> String {
    let number = format_number(value);
    if suffix.is_empty() {
        number
    } else if reference.starts_with(suffix) {
        format!("{}{}", suffix, number)
    } else if reference.ends_with(suffix) {
        format!("{}{}", number, suffix)
    } else {
        number
    }
}

/// Add one tick to a numeric axis the data runs past.
///
/// The first series on `side` with numeric values decides: data above the
/// highest tick by more than `expand_tolerance` of the interval adds a tick
/// above, otherwise data below the lowest tick adds one below. Returns
/// whether a tick was added.
pub fn expand_axis_range(
    scale: &mut ScaleQuantification,
    series: &[PathSeries],
    side: AxisSide,
    config: &ScaleConfig,
) -> bool {
    let n = scale.nums_d.len();
    if n < 2 || scale.xs.len() != n || scale.infos.len() != n {
        return false;
    }
    let interval = (scale.nums_d[1] - scale.nums_d[0]).abs();
    if interval < 1e-9 {
        return false;
    }
    let increasing = scale.nums_d[1] > scale.nums_d[0];
    let max_axis = scale.nums_d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_axis = scale.nums_d.iter().copied().fold(f64::INFINITY, f64::min);
    let tolerance = config.expand_tolerance * interval;

    let data = series
        .iter()
        .filter(|s| s.value_axis().0 == side)
        .map(|s| {
            s.value_axis()
                .1
                .iter()
                .filter_map(|v| parse_number(v).map(|(n, _)| n))
                .collect::<Vec<f64>>()
        })
        .find(|values| !values.is_empty());
    let data = match data {
        Some(d) => d,
        None => return false,
    };
    let max_graph = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_graph = data.iter().copied().fold(f64::INFINITY, f64::min);

    // (value, append at the end of the tick list)
    let added = if max_graph > max_axis + tolerance {
        (round_off(max_axis + interval, 2), increasing)
    } else if min_graph < min_axis - tolerance {
        (round_off(min_axis - interval, 2), !increasing)
    } else {
        return false;
    };

    let (value, at_end) = added;
    let label = format_tick(value, &scale.infos[0], &scale.suffix);
    if at_end {
        let x = scale.xs[n - 1] + (scale.xs[n - 1] - scale.xs[n - 2]);
        scale.nums_d.push(value);
        scale.infos.push(label);
        scale.xs.push(x);
    } else {
        let x = scale.xs[0] - (scale.xs[1] - scale.xs[0]);
        scale.nums_d.insert(0, value);
        scale.infos.insert(0, label);
        scale.xs.insert(0, x);
    }
    debug!("{:?} axis extended with tick {}", side, value);
    true
}

/// Values of a line sampled at the extended ticks.
///
/// `points` are `(x, y)` in page positions and values. Each tick takes the
/// nearest point within half a tick spacing, or no value.
pub fn map_points_to_x_scale(points: &[(f64, f64)], scale: &ScaleQuantification) -> Option<Vec<Option<f64>>> {
    let xs = &scale.xs_ext;
    if points.is_empty() || xs.len() < 2 {
        return None;
    }
    let dx = 0.5 * (xs[1] - xs[0]).abs();
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let values = xs
        .iter()
        .map(|&x| {
            let mut best: Option<(f64, f64)> = None;
            for &(px, py) in &sorted {
                if px > x + 4.0 * dx {
                    break;
                }
                let d = (px - x).abs();
                if d < dx && best.map(|(bd, _)| d < bd).unwrap_or(true) {
                    best = Some((d, py));
                }
            }
            best.map(|(_, y)| y)
        })
        .collect();
    Some(values)
}

/// Assign points to tick windows of a label axis with repeated labels.
///
/// Each tick owns the window between the midpoints to its neighbors, and the
/// outer windows reach two tick spacings beyond the end ticks. Each window
/// takes the first unassigned point inside it. Returns the point index per
/// tick.
pub fn reset_path_label(tick_xs: &[f64], point_xs: &[f64]) -> Option<Vec<Option<usize>>> {
    let n = tick_xs.len();
    if n < 2 {
        return None;
    }
    let mut used = vec![false; point_xs.len()];
    let mut assigned = Vec::with_capacity(n);
    let mut left = tick_xs[0] - 2.0 * (tick_xs[1] - tick_xs[0]);
    for i in 0..n {
        let right = if i + 1 < n {
            0.5 * (tick_xs[i] + tick_xs[i + 1])
        } else {
            tick_xs[n - 1] + 2.0 * (tick_xs[n - 1] - tick_xs[n - 2])
        };
        let (lo, hi) = if left <= right { (left, right) } else { (right, left) };
        let hit = point_xs
            .iter()
            .enumerate()
            .find(|(j, x)| !used[*j] && lo <= **x && **x < hi)
            .map(|(j, _)| j);
        if let Some(j) = hit {
            used[j] = true;
        }
        assigned.push(hit);
        left = right;
    }
    Some(assigned)
}

/// Drop timestamp precision the label format cannot show
pub fn simplify_timestamp(ts: i64, pattern: &str) -> i64 {
    if pattern.contains('m') {
        return ts;
    }
    let nanos = (ts.rem_euclid(1000) * 1_000_000) as u32;
    let dt = match DateTime::from_timestamp(ts.div_euclid(1000), nanos) {
        Some(dt) => dt,
        None => return ts,
    };
    if !pattern.contains('M') && !pattern.contains('d') {
        dt.date_naive().and_time(NaiveTime::MIN).and_utc().timestamp_millis()
    } else {
        dt.with_nanosecond(0).map(|d| d.timestamp_millis()).unwrap_or(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Color, PathRole};
    use crate::geometry::Path;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn series_with_values(values: &[&str]) -> PathSeries {
        let mut s = PathSeries::new(PathRole::Bar, Color::BLACK, Path::new());
        s.values_y = strings(values);
        s.side_y = AxisSide::Left;
        s
    }

    // ============================================================================
    // Number parsing
    // ============================================================================

    #[test]
    fn test_parse_number_decorations() {
        assert_eq!(parse_number("1,234"), Some((1234.0, String::new())));
        assert_eq!(parse_number("45%"), Some((45.0, "%".to_string())));
        assert_eq!(parse_number("$12"), Some((12.0, "$".to_string())));
        assert_eq!(parse_number("(3.5)"), Some((-3.5, String::new())));
        assert_eq!(parse_number(" - "), Some((0.0, String::new())));
        assert_eq!(parse_number("Q1"), None);
    }

    #[test]
    fn test_arithmetic_repair_by_sign() {
        let config = ScaleConfig::default();
        let (nums, _) = strings_to_numbers(&strings(&["20", "10", "0", "10", "20"]), &config).unwrap();
        assert_eq!(nums, vec![-20.0, -10.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_arithmetic_rebuild() {
        let config = ScaleConfig::default();
        let (nums, _) = strings_to_numbers(&strings(&["0", "10", "70", "30"]), &config).unwrap();
        assert_eq!(nums, vec![0.0, 10.0, 20.0, 30.0]);
    }

    // ============================================================================
    // Time parsing
    // ============================================================================

    #[test]
    fn test_time_labels_prefer_year() {
        let ts = parse_time_labels(&strings(&["2019", "2020", "2021"]), 2).unwrap();
        assert_eq!(ts.format.common, "yyyy");
        assert_eq!(ts.kept, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_invalid_scale_keeps_first() {
        assert_eq!(remove_invalid_scale(&[10, 20, 15, 30, 30]), vec![0, 1, 3]);
    }

    #[test]
    fn test_time_labels_need_two_values() {
        assert!(parse_time_labels(&strings(&["2019"]), 2).is_none());
        assert!(parse_time_labels(&strings(&["2019", "Foo"]), 2).is_none());
    }

    #[test]
    fn test_simplify_timestamp() {
        let ts = 1_577_934_245_123; // 2020-01-02T03:04:05.123Z
        assert_eq!(simplify_timestamp(ts, "HH:mm"), ts);
        assert_eq!(simplify_timestamp(ts, "yyyy"), 1_577_923_200_000);
        assert_eq!(simplify_timestamp(ts, "yyyy-MM"), 1_577_934_245_000);
    }

    // ============================================================================
    // Lookups
    // ============================================================================

    #[test]
    fn test_interpolate_number() {
        let xs = [100.0, 50.0, 0.0];
        let nums = [0.0, 10.0, 20.0];
        assert!((interpolate_number(&xs, &nums, 75.0, 10.0).unwrap() - 5.0).abs() < 1e-9);
        assert!((interpolate_number(&xs, &nums, -25.0, 10.0).unwrap() - 25.0).abs() < 1e-9);
        assert!(interpolate_number(&xs, &nums, -600.0, 10.0).is_none());
    }

    #[test]
    fn test_nearest_label() {
        assert_eq!(nearest_label(&[0.0, 10.0, 20.0], 13.0), Some(1));
        assert_eq!(nearest_label(&[], 13.0), None);
    }

    // ============================================================================
    // Side quantification
    // ============================================================================

    #[test]
    fn test_quantize_bottom_years_as_time() {
        let labels = vec![("2020".to_string(), 30.0), ("2019".to_string(), 10.0)];
        let q = quantize_labels(&labels, AxisSide::Bottom, ChartType::Bar, &ScaleConfig::default());
        assert_eq!(q.kind, Some(ScaleKind::Time));
        assert_eq!(q.infos, strings(&["2019", "2020"]));
        assert_eq!(q.xs, vec![10.0, 30.0]);
        assert_eq!(q.nums_l.len(), 2);
    }

    #[test]
    fn test_quantize_left_numbers_bottom_up() {
        let labels = vec![
            ("20".to_string(), 0.0),
            ("10".to_string(), 50.0),
            ("0".to_string(), 100.0),
        ];
        let q = quantize_labels(&labels, AxisSide::Left, ChartType::Bar, &ScaleConfig::default());
        assert_eq!(q.kind, Some(ScaleKind::Number));
        assert_eq!(q.nums_d, vec![0.0, 10.0, 20.0]);
        assert_eq!(q.xs, vec![100.0, 50.0, 0.0]);
    }

    #[test]
    fn test_quantize_left_text_is_cleared() {
        let labels = vec![("North".to_string(), 0.0), ("South".to_string(), 50.0)];
        let q = quantize_labels(&labels, AxisSide::Left, ChartType::Bar, &ScaleConfig::default());
        assert!(q.is_empty());
        let q = quantize_labels(&labels, AxisSide::Left, ChartType::Column, &ScaleConfig::default());
        assert_eq!(q.kind, Some(ScaleKind::Label));
    }

    #[test]
    fn test_quantize_line_bottom_is_label() {
        let labels = vec![("2019".to_string(), 10.0), ("2020".to_string(), 30.0)];
        let q = quantize_labels(&labels, AxisSide::Bottom, ChartType::Line, &ScaleConfig::default());
        assert_eq!(q.kind, Some(ScaleKind::Label));
    }

    #[test]
    fn test_build_axis_scale() {
        let q = build_axis_scale(&[0.0, 50.0, 100.0], &strings(&["A", "B", "C"]), 0.0, 100.0, 5).unwrap();
        assert_eq!(q.xs_ext, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(q.infos_ext, strings(&["A", "", "B", "", "C"]));
    }

    // ============================================================================
    // Range expansion and point mapping
    // ============================================================================

    #[test]
    fn test_expand_axis_range_once() {
        let mut scale = ScaleQuantification::numbers(
            strings(&["0", "10", "20"]),
            vec![100.0, 50.0, 0.0],
            vec![0.0, 10.0, 20.0],
            "",
        );
        let series = vec![series_with_values(&["5", "23"])];
        let config = ScaleConfig::default();
        assert!(expand_axis_range(&mut scale, &series, AxisSide::Left, &config));
        assert_eq!(scale.nums_d, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(scale.infos.last().map(String::as_str), Some("30"));
        assert!((scale.xs[3] + 50.0).abs() < 1e-9);
        assert!(!expand_axis_range(&mut scale, &series, AxisSide::Left, &config));
        assert_eq!(scale.nums_d.len(), 4);
    }

    #[test]
    fn test_expand_axis_range_below_with_suffix() {
        let mut scale = ScaleQuantification::numbers(
            strings(&["0%", "10%"]),
            vec![100.0, 50.0],
            vec![0.0, 10.0],
            "%",
        );
        let series = vec![series_with_values(&["-4%"])];
        assert!(expand_axis_range(&mut scale, &series, AxisSide::Left, &ScaleConfig::default()));
        assert_eq!(scale.infos[0], "-10%");
        assert_eq!(scale.nums_d[0], -10.0);
    }

    #[test]
    fn test_map_points_to_x_scale() {
        let mut scale = ScaleQuantification::default();
        scale.xs_ext = vec![0.0, 10.0, 20.0, 30.0];
        let values = map_points_to_x_scale(&[(1.0, 5.0), (19.0, 7.0), (21.0, 8.0)], &scale).unwrap();
        assert_eq!(values, vec![Some(5.0), None, Some(7.0), None]);
    }

    #[test]
    fn test_reset_path_label_partitions() {
        let assigned = reset_path_label(&[0.0, 10.0, 20.0], &[1.0, 9.0, 19.0]).unwrap();
        assert_eq!(assigned, vec![Some(0), Some(1), Some(2)]);
        let assigned = reset_path_label(&[0.0, 10.0, 20.0], &[1.0, 19.0]).unwrap();
        assert_eq!(assigned, vec![Some(0), None, Some(1)]);
    }
}
