//! Chart document emission
//!
//! Writes a [`ChartDocument`] as a chart-library JSON document: title, axes,
//! legend, plot options, series data and parser diagnostics.

use crate::chart::{AxisSide, ChartDocument, ChartType, PathRole, PathSeries, PieGroup, ScaleKind};
use crate::scale::{map_points_to_x_scale, parse_number, reset_path_label, round_off};
use crate::series::is_stacked_bar;
use crate::text::{TextChunk, TextDirection};
use crate::ChartError;
use log::debug;
use serde_json::{json, Map, Value};

/// Options for document emission
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Also write tick texts and the region box
    pub detail: bool,
}

/// Serializes chart documents
#[derive(Debug, Clone, Default)]
pub struct ChartWriter {
    options: WriterOptions,
}

/// Per-document state shared by the writing steps
struct WriteContext<'a> {
    doc: &'a ChartDocument,
    x_type: &'static str,
    /// Suffix of each emitted value axis
    y_suffix: [String; 2],
    /// Value axes were derived from series suffixes, not from ticks
    suffix_axes: bool,
    /// Value axis index per series in that case
    fallback_axis: Vec<usize>,
    two_axes: bool,
}

impl ChartWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Emit the document, failing when no series carries data
    pub fn write(&self, doc: &ChartDocument) -> Result<Value, ChartError> {
        let mut root = Map::new();
        let mut ctx = WriteContext {
            doc,
            x_type: x_axis_type(doc),
            y_suffix: [String::new(), String::new()],
            suffix_axes: false,
            fallback_axis: vec![0; doc.series.len()],
            two_axes: false,
        };

        write_diagnostics(doc, &mut root);
        if self.options.detail {
            write_detail(doc, &mut root);
        }
        write_title(doc, &mut root);
        root.insert("xAxis".to_string(), write_x_axis(&ctx));
        if !doc.is_pie() {
            let y_axes = write_y_axes(&mut ctx);
            root.insert("yAxis".to_string(), Value::Array(y_axes));
        }
        root.insert("legend".to_string(), json!({ "enabled": doc.has_legend() }));
        if let Some(options) = write_plot_options(&ctx) {
            root.insert("plotOptions".to_string(), options);
        }

        let series = if doc.is_pie() {
            write_pies(doc)?
        } else {
            write_series(&ctx)?
        };
        root.insert("series".to_string(), Value::Array(series));
        debug!("chart document written for {:?} chart", doc.chart_type);
        Ok(Value::Object(root))
    }
}

// ============================================================================
// Header fields
// ============================================================================

fn write_diagnostics(doc: &ChartDocument, root: &mut Map<String, Value>) {
    let d = &doc.diagnostics;
    root.insert(
        "credits".to_string(),
        json!({
            "parserDetectModelArea": d.detect_model_area,
            "parserHintArea": d.hint_area,
            "parserRecallArea": d.recall_area,
            "onlyMatchXScale": d.only_match_x_scale,
            "legendMatchPath": d.legend_match_path,
        }),
    );
    root.insert(
        "ocrEngine".to_string(),
        json!({
            "clientValid": d.ocr.client_valid,
            "detectedImages": d.ocr.detected_images,
            "recognizedTexts": d.ocr.recognized_texts,
        }),
    );
}

fn write_detail(doc: &ChartDocument, root: &mut Map<String, Value>) {
    let texts = |side: AxisSide| -> Value {
        let ticks = doc
            .axes
            .get(side)
            .map(|a| a.ticks.iter().map(|c| c.text()).collect::<Vec<_>>())
            .unwrap_or_default();
        json!(ticks)
    };
    root.insert("vAxisTextDown".to_string(), texts(AxisSide::Bottom));
    root.insert("vAxisTextUp".to_string(), texts(AxisSide::Top));
    root.insert("vAxisTextLeft".to_string(), texts(AxisSide::Left));
    root.insert("vAxisTextRight".to_string(), texts(AxisSide::Right));
    let a = &doc.area;
    root.insert(
        "bndbox".to_string(),
        json!({ "xmin": a.min_x(), "xmax": a.max_x(), "ymin": a.min_y(), "ymax": a.max_y() }),
    );
}

fn write_title(doc: &ChartDocument, root: &mut Map<String, Value>) {
    root.insert(
        "title".to_string(),
        json!({ "text": doc.title.clone().unwrap_or_default() }),
    );
    if let Some(sub) = &doc.subtitle {
        root.insert("subtitle".to_string(), json!({ "text": sub }));
    }
}

// ============================================================================
// Axes
// ============================================================================

/// `category`, `datetime` or `linear` from the category scale of the series
pub fn x_axis_type(doc: &ChartDocument) -> &'static str {
    if doc.is_pie() {
        return "category";
    }
    let swapped = doc.chart_type.swaps_axes();
    for s in &doc.series {
        let (kind, subdivided) = if swapped {
            (s.scale_y, s.subdivide_y)
        } else {
            (s.scale_x, s.subdivide_x)
        };
        match kind {
            ScaleKind::Label => return "category",
            ScaleKind::Time if subdivided => return "datetime",
            ScaleKind::Time => return "category",
            ScaleKind::Number => {}
        }
    }
    "linear"
}

/// Side holding the category ticks
fn category_side(doc: &ChartDocument) -> Option<AxisSide> {
    if doc.chart_type.swaps_axes() {
        doc.scales.first_of(AxisSide::Left, AxisSide::Right)
    } else {
        doc.scales.first_of(AxisSide::Bottom, AxisSide::Top)
    }
}

/// Category labels in display order, with their tick positions
fn category_ticks(doc: &ChartDocument) -> Option<(Vec<String>, Vec<f64>)> {
    let side = category_side(doc)?;
    let q = &doc.scales[side];
    let mut infos = q.infos.clone();
    let mut xs = q.xs.clone();
    // Vertical sides run bottom to top, bar charts list categories top down
    if side.is_vertical() {
        infos.reverse();
        xs.reverse();
    }
    Some((infos, xs))
}

/// Label angle of a rotated chunk, from its element layout
fn rotated_chunk_angle(chunk: &TextChunk) -> f64 {
    let angle = chunk.bounds.height.atan2(chunk.bounds.width).to_degrees();
    match (chunk.elements.first(), chunk.elements.last()) {
        (Some(first), Some(last)) if chunk.elements.len() > 1 => {
            if first.bounds.center_y() >= last.bounds.center_y() {
                -angle
            } else {
                angle
            }
        }
        _ => -45.0,
    }
}

fn label_rotation(doc: &ChartDocument) -> Option<f64> {
    let chunk = doc
        .axes
        .bottom
        .as_ref()
        .and_then(|a| a.ticks.first())
        .or_else(|| doc.axes.top.as_ref().and_then(|a| a.ticks.first()));
    match chunk.map(|c| c.direction) {
        Some(TextDirection::VerticalUp) => Some(270.0),
        Some(TextDirection::VerticalDown) => Some(90.0),
        Some(TextDirection::Rotated) => chunk.map(rotated_chunk_angle),
        _ => doc.ocrs.first().map(|ocr| {
            let angle = ocr.bounds.height.atan2(ocr.bounds.width).to_degrees();
            if ocr.ccw {
                -angle
            } else {
                angle
            }
        }),
    }
}

fn time_scale(doc: &ChartDocument) -> Option<&crate::scale::ScaleQuantification> {
    [AxisSide::Bottom, AxisSide::Top]
        .into_iter()
        .map(|s| &doc.scales[s])
        .find(|q| q.is_kind(ScaleKind::Time))
}

fn tick_interval(doc: &ChartDocument) -> i64 {
    time_scale(doc)
        .filter(|q| q.nums_l.len() >= 2)
        .map(|q| q.nums_l[1] - q.nums_l[0])
        .unwrap_or(0)
}

fn write_x_axis(ctx: &WriteContext) -> Value {
    let doc = ctx.doc;
    let mut axis = Map::new();
    axis.insert("type".to_string(), json!(ctx.x_type));

    if ctx.x_type == "datetime" {
        let interval = tick_interval(doc);
        if interval > 0 {
            axis.insert("tickInterval".to_string(), json!(interval));
        }
    }

    if doc.chart_type != ChartType::Column {
        let mut labels = Map::new();
        if let Some(rotation) = label_rotation(doc) {
            labels.insert("rotation".to_string(), json!(rotation));
        }
        labels.insert("textalign".to_string(), json!("center"));
        if ctx.x_type == "datetime" {
            let format = time_scale(doc)
                .and_then(|q| q.time_format)
                .map(|f| format!("{{value: {}}}", f.highchart))
                .unwrap_or_else(|| "{value}".to_string());
            labels.insert("format".to_string(), json!(format));
        }
        axis.insert("labels".to_string(), Value::Object(labels));
    }

    if doc.is_pie() {
        return Value::Object(axis);
    }

    if doc.diagnostics.only_match_x_scale {
        if let Some(q) = category_side(doc).map(|s| &doc.scales[s]).filter(|q| q.has_extension()) {
            let positions: Vec<usize> = q
                .infos_ext
                .iter()
                .enumerate()
                .filter(|(_, l)| !l.is_empty())
                .map(|(i, _)| i)
                .collect();
            axis.insert("categories".to_string(), json!(q.infos_ext));
            axis.insert("tickPositions".to_string(), json!(positions));
            axis.insert("categoriesXValue".to_string(), json!(q.xs_ext));
            return Value::Object(axis);
        }
    }

    if ctx.x_type == "category" {
        match category_ticks(doc) {
            Some((labels, _)) => {
                axis.insert("categories".to_string(), json!(labels));
            }
            None => {
                if let Some(h) = doc.axes.horizontal() {
                    let b = h.line.bounds();
                    axis.insert("minRange".to_string(), json!(b.width + 10.0));
                }
            }
        }
    }
    Value::Object(axis)
}

/// Value axis with its label format, unit title and ticks
fn write_one_y_axis(suffix: &str, infos: Option<&[String]>, unit: Option<&TextChunk>) -> Map<String, Value> {
    let format = match infos.and_then(|i| i.first()) {
        Some(first) if !suffix.is_empty() && first.starts_with(suffix) => format!("{}{{value}}", suffix),
        _ => format!("{{value}}{}", suffix),
    };
    let title = match unit {
        Some(chunk) => {
            let (align, rotation) = match chunk.direction {
                TextDirection::Ltr => ("high", 0),
                TextDirection::VerticalUp => ("middle", 270),
                _ => ("middle", 90),
            };
            json!({ "text": chunk.text().trim(), "align": align, "rotation": rotation, "style": {} })
        }
        None => json!({ "text": "", "style": {} }),
    };

    let mut axis = Map::new();
    axis.insert("labels".to_string(), json!({ "format": format, "style": {} }));
    axis.insert("title".to_string(), title);
    if let Some(infos) = infos {
        let ticks: Vec<f64> = infos.iter().filter_map(|t| parse_number(t).map(|(n, _)| n)).collect();
        if !ticks.is_empty() {
            axis.insert("tickPositions".to_string(), json!(ticks));
        }
    }
    axis
}

/// Suffix of the first value of a series
fn own_suffix(s: &PathSeries) -> Option<String> {
    s.value_axis()
        .1
        .first()
        .and_then(|v| parse_number(v))
        .map(|(_, suffix)| suffix)
}

fn write_y_axes(ctx: &mut WriteContext) -> Vec<Value> {
    let doc = ctx.doc;
    let sides = if doc.chart_type.swaps_axes() {
        [AxisSide::Bottom, AxisSide::Top]
    } else {
        [AxisSide::Left, AxisSide::Right]
    };

    let mut axes = Vec::new();
    for (i, side) in sides.iter().enumerate() {
        let q = &doc.scales[*side];
        if q.is_empty() {
            continue;
        }
        let unit = if doc.chart_type.swaps_axes() {
            None
        } else {
            doc.units[i].as_ref()
        };
        let mut axis = write_one_y_axis(&q.suffix, Some(&q.infos), unit);
        axis.insert("tickAmount".to_string(), json!(q.len()));
        if i == 1 {
            axis.insert("opposite".to_string(), json!(true));
        }
        ctx.y_suffix[i] = q.suffix.clone();
        axes.push(axis);
    }

    if axes.is_empty() {
        ctx.suffix_axes = true;
        // One axis per distinct value suffix, at most two
        let mut suffixes: Vec<String> = Vec::new();
        for (k, s) in doc.series.iter().enumerate() {
            if let Some(suffix) = own_suffix(s) {
                let ith = match suffixes.iter().position(|x| *x == suffix) {
                    Some(p) => p,
                    None => {
                        suffixes.push(suffix);
                        suffixes.len() - 1
                    }
                };
                ctx.fallback_axis[k] = ith % 2;
            }
        }
        if suffixes.is_empty() {
            suffixes.push(String::new());
        }
        axes.push(write_one_y_axis(&suffixes[0], None, doc.units[0].as_ref()));
        ctx.y_suffix[0] = suffixes[0].clone();
        if suffixes.len() >= 2 {
            let mut right = write_one_y_axis(&suffixes[1], None, None);
            right.insert("opposite".to_string(), json!(true));
            axes.push(right);
            ctx.y_suffix[1] = suffixes[1].clone();
        }
    }

    ctx.two_axes = axes.len() == 2;
    if ctx.two_axes {
        for axis in axes.iter_mut() {
            axis.insert("gridLineWidth".to_string(), json!(0));
        }
    }
    axes.into_iter().map(Value::Object).collect()
}

// ============================================================================
// Plot options
// ============================================================================

fn pie_plot_options(doc: &ChartDocument) -> Value {
    let mut labels = Map::new();
    labels.insert("enabled".to_string(), json!(true));
    let mut pie = Map::new();
    pie.insert("allowPointSelect".to_string(), json!(true));
    pie.insert("cursor".to_string(), json!("pointer"));
    if !doc.legends.is_empty() {
        pie.insert("showInLegend".to_string(), json!(true));
        labels.insert("format".to_string(), json!("{point.percentage:.2f} %"));
    }
    pie.insert("dataLabels".to_string(), Value::Object(labels));
    pie.insert(
        "tooltip".to_string(),
        json!({ "pointFormat": "{series.name}: {point.percentage:,.2f}%" }),
    );
    Value::Object(pie)
}

fn write_plot_options(ctx: &WriteContext) -> Option<Value> {
    let doc = ctx.doc;
    let mut options = Map::new();
    if doc.is_pie() {
        options.insert("pie".to_string(), pie_plot_options(doc));
    } else if let Some(threshold) = doc
        .series
        .iter()
        .filter(|s| s.role == PathRole::Area)
        .find_map(|s| s.area_threshold.as_ref())
    {
        let value = parse_number(threshold)
            .map(|(n, _)| json!(round_off(n, 4)))
            .unwrap_or_else(|| json!(threshold));
        options.insert("area".to_string(), json!({ "threshold": value }));
    }

    if ctx.x_type == "datetime" {
        let interval = tick_interval(doc);
        if interval > 0 {
            let start = time_scale(doc).and_then(|q| q.nums_l.first().copied()).unwrap_or(0);
            options.insert(
                "series".to_string(),
                json!({ "pointInterval": interval, "pointStart": start }),
            );
        }
    }

    if options.is_empty() {
        None
    } else {
        Some(Value::Object(options))
    }
}

// ============================================================================
// Series
// ============================================================================

/// Slice name for an unnamed slice: its share as a percentage
fn percent_name(weight: f64) -> String {
    let text = format!("{:.2}", weight * 100.0);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", text)
}

fn write_pie(pie: &PieGroup) -> Option<Map<String, Value>> {
    let mut data = Vec::new();
    let mut colors = Vec::new();
    for slice in &pie.slices {
        let name = if slice.text.is_empty() {
            if slice.weight < 1e-4 {
                continue;
            }
            percent_name(slice.weight)
        } else {
            slice.text.clone()
        };
        data.push(json!([name, slice.weight]));
        colors.push(json!(slice.color.to_hex()));
    }
    if data.is_empty() {
        return None;
    }
    let mut serie = Map::new();
    serie.insert("name".to_string(), json!(""));
    if pie.is_ring() {
        serie.insert("innerSize".to_string(), json!("50%"));
    }
    serie.insert("type".to_string(), json!("pie"));
    serie.insert("data".to_string(), Value::Array(data));
    serie.insert("colors".to_string(), Value::Array(colors));
    Some(serie)
}

fn write_pies(doc: &ChartDocument) -> Result<Vec<Value>, ChartError> {
    let several = doc.pies.len() >= 2;
    let mut out = Vec::new();
    for (i, pie) in doc.pies.iter().enumerate() {
        let mut serie = write_pie(pie)
            .ok_or_else(|| ChartError::Assembly(format!("pie {} has no slices to write", pie.id)))?;
        serie.insert("plotOptions".to_string(), pie_plot_options(doc));
        if several {
            serie.insert("center".to_string(), json!([i * 300 + 250, 150]));
            serie.insert("size".to_string(), json!(150));
            if i >= 1 {
                serie.insert("showInLegend".to_string(), json!(false));
            }
        }
        out.push(Value::Object(serie));
    }
    if out.is_empty() {
        return Err(ChartError::Assembly("pie chart without pies".to_string()));
    }
    Ok(out)
}

/// Value axis index of a series: 0 for left/bottom, 1 for right/top
fn value_axis_index(ctx: &WriteContext, k: usize, s: &PathSeries) -> usize {
    if ctx.suffix_axes {
        return ctx.fallback_axis.get(k).copied().unwrap_or(0);
    }
    match s.value_axis().0 {
        AxisSide::Right | AxisSide::Top => 1,
        _ => 0,
    }
}

/// Unit suffix shown in tooltips and data labels
fn series_suffix(doc: &ChartDocument, s: &PathSeries) -> String {
    let side = s.value_axis().0;
    let q = &doc.scales[side];
    if !q.is_empty() {
        q.suffix.clone()
    } else {
        own_suffix(s).unwrap_or_default()
    }
}

fn parse_value(text: &str, series: &str) -> Result<(f64, String), ChartError> {
    parse_number(text).ok_or_else(|| ChartError::Assembly(format!("series {:?} has value {:?}", series, text)))
}

/// `[x, y|null]` pairs of one series, or the per-tick values in only-match mode
fn series_data(ctx: &WriteContext, s: &PathSeries, axis_suffix: &str) -> Result<Vec<Value>, ChartError> {
    let horizontal = s.role == PathRole::Columnar;
    let (xs, ys, kind_x, kind_y) = if horizontal {
        (&s.values_y, &s.values_x, s.scale_y, s.scale_x)
    } else {
        (&s.values_x, &s.values_y, s.scale_x, s.scale_y)
    };

    let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(xs.len());
    let mut raw_points: Vec<(f64, f64)> = Vec::new();
    for (j, x) in xs.iter().enumerate() {
        let y_text = ys.get(j).map(String::as_str).unwrap_or("");
        let y = match kind_y {
            ScaleKind::Number => {
                let (mut value, suffix) = parse_value(y_text, &s.text)?;
                if suffix != axis_suffix && suffix == "%" {
                    value /= 100.0;
                }
                Some(round_off(value, 4))
            }
            _ => None,
        };
        let x_value = if s.only_match_x_scale {
            let (value, _) = parse_value(x, &s.text)?;
            if let Some(y) = y {
                raw_points.push((value, y));
            }
            json!(value)
        } else {
            match kind_x {
                ScaleKind::Time => json!(x
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ChartError::Assembly(format!("bad timestamp {:?}", x)))?),
                ScaleKind::Label => json!(x),
                ScaleKind::Number => json!(round_off(parse_value(x, &s.text)?.0, 4)),
            }
        };
        pairs.push((x_value, y.map(|v| json!(v)).unwrap_or(Value::Null)));
    }

    if s.only_match_x_scale {
        let scale = &ctx.doc.scales[s.side_x];
        let values = map_points_to_x_scale(&raw_points, scale)
            .ok_or_else(|| ChartError::Assembly(format!("series {:?} does not map onto its ticks", s.text)))?;
        return Ok(values.into_iter().map(|v| v.map(|y| json!(y)).unwrap_or(Value::Null)).collect());
    }

    if ctx.x_type == "category" {
        if let Some((labels, tick_xs)) = category_ticks(ctx.doc) {
            let duplicated = category_side(ctx.doc)
                .map(|side| ctx.doc.scales[side].has_duplicate_labels())
                .unwrap_or(false);
            if duplicated && s.positions.len() == pairs.len() {
                if let Some(assigned) = reset_path_label(&tick_xs, &s.positions) {
                    return Ok(labels
                        .iter()
                        .zip(assigned)
                        .map(|(l, a)| json!([l, a.map(|j| pairs[j].1.clone()).unwrap_or(Value::Null)]))
                        .collect());
                }
            }
            if let Some(filled) = fill_null_labels(&labels, &pairs) {
                return Ok(filled);
            }
        }
    }
    Ok(pairs.into_iter().map(|(x, y)| json!([x, y])).collect())
}

/// One entry per category, null where the series has no value. `None` when
/// a value's label is not a category.
fn fill_null_labels(labels: &[String], pairs: &[(Value, Value)]) -> Option<Vec<Value>> {
    let mut full: Vec<Option<Value>> = vec![None; labels.len()];
    for (x, y) in pairs {
        let label = x.as_str()?;
        let slot = labels
            .iter()
            .enumerate()
            .position(|(j, l)| l == label && full[j].is_none())?;
        full[slot] = Some(y.clone());
    }
    Some(
        labels
            .iter()
            .zip(full)
            .map(|(l, y)| json!([l, y.unwrap_or(Value::Null)]))
            .collect(),
    )
}

/// Series in emission order: stacked bars reversed, lines last
fn ordered_series(doc: &ChartDocument, stacked: bool) -> Vec<(usize, &PathSeries)> {
    let mut items: Vec<(usize, &PathSeries)> = doc.series.iter().enumerate().collect();
    if doc.chart_type == ChartType::AreaOverlap {
        items.reverse();
    }
    if stacked {
        let bars: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, (_, s))| s.role.is_bar())
            .map(|(i, _)| i)
            .collect();
        if let (Some(&first), Some(&last)) = (bars.first(), bars.last()) {
            items[first..=last].reverse();
        }
    }
    let (lines, mut others): (Vec<_>, Vec<_>) = items.into_iter().partition(|(_, s)| s.role.is_line());
    others.extend(lines);
    others
}

fn write_series(ctx: &WriteContext) -> Result<Vec<Value>, ChartError> {
    let doc = ctx.doc;
    let stacked = is_stacked_bar(&doc.series);
    let mut out = Vec::new();
    let mut has_data = false;

    for (k, s) in ordered_series(doc, stacked) {
        if s.role == PathRole::Unknown {
            continue;
        }
        let axis = value_axis_index(ctx, k, s);
        let data = series_data(ctx, s, &ctx.y_suffix[axis])?;
        has_data |= !data.is_empty();
        let suffix = series_suffix(doc, s);

        let mut serie = Map::new();
        serie.insert("name".to_string(), json!(s.text));
        if s.text.is_empty() {
            serie.insert("showInLegend".to_string(), json!(false));
        }
        serie.insert("type".to_string(), json!(s.role.series_type()));
        serie.insert("color".to_string(), json!(s.color.to_hex()));
        if axis == 1 && ctx.two_axes {
            serie.insert("yAxis".to_string(), json!(1));
        }
        serie.insert("data".to_string(), Value::Array(data));
        serie.insert(
            "tooltip".to_string(),
            json!({ "pointFormat": format!("{{series.name}}: {{point.y:,.2f}}{}", suffix) }),
        );
        serie.insert(
            "dataLabels".to_string(),
            json!({
                "enabled": s.value_from_nearby_text,
                "format": format!("{{point.y:,.f}}{}", suffix),
            }),
        );
        if stacked && s.role.is_bar() {
            serie.insert("stacking".to_string(), json!("normal"));
        }
        if matches!(s.role, PathRole::Line | PathRole::Curve) {
            serie.insert("marker".to_string(), json!({ "enabled": false }));
        }
        out.push(Value::Object(serie));
    }

    if !has_data {
        return Err(ChartError::Assembly("no series carries data".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Color, PieSlice};
    use crate::geometry::{Path, Point, Rect};
    use crate::patterns::TimeFormat;
    use crate::scale::ScaleQuantification;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn bar_chart() -> ChartDocument {
        let mut doc = ChartDocument::new(Rect::new(0.0, 0.0, 200.0, 200.0), ChartType::Bar);
        doc.scales[AxisSide::Bottom] = ScaleQuantification::labels(strings(&["2019", "2020"]), vec![5.0, 25.0]);
        doc.scales[AxisSide::Left] = ScaleQuantification::numbers(
            strings(&["0%", "50%", "100%"]),
            vec![180.0, 100.0, 20.0],
            vec![0.0, 50.0, 100.0],
            "%",
        );
        let mut s = PathSeries::new(PathRole::Bar, Color::new(0, 128, 0), Path::new());
        s.text = "Share".to_string();
        s.values_x = strings(&["2019", "2020"]);
        s.values_y = strings(&["40", "75"]);
        s.positions = vec![5.0, 25.0];
        doc.series.push(s);
        doc
    }

    fn pie_chart(slices: &[(&str, f64)], ring: bool) -> ChartDocument {
        let mut doc = ChartDocument::new(Rect::new(0.0, 0.0, 200.0, 200.0), ChartType::Pie);
        doc.pies.push(PieGroup {
            id: 0,
            center: Point::new(100.0, 100.0),
            radius: 50.0,
            slices: slices
                .iter()
                .map(|(text, weight)| PieSlice {
                    text: text.to_string(),
                    color: Color::new(200, 0, 0),
                    weight: *weight,
                    path: Path::new(),
                    is_pie: !ring,
                    start_angle: 0.0,
                    end_angle: 0.0,
                    id: 0,
                    number_text: None,
                })
                .collect(),
        });
        doc
    }

    // ============================================================================
    // Axes
    // ============================================================================

    #[test]
    fn test_bar_chart_axes() {
        let value = ChartWriter::default().write(&bar_chart()).unwrap();
        assert_eq!(value["xAxis"]["type"], "category");
        assert_eq!(value["xAxis"]["categories"], json!(["2019", "2020"]));
        assert_eq!(value["yAxis"][0]["labels"]["format"], "{value}%");
        assert_eq!(value["yAxis"][0]["tickPositions"], json!([0.0, 50.0, 100.0]));
        assert_eq!(value["yAxis"][0]["tickAmount"], 3);
        assert_eq!(value["legend"]["enabled"], true);
    }

    #[test]
    fn test_prefix_suffix_format() {
        let axis = write_one_y_axis("$", Some(&strings(&["$10", "$20"])), None);
        assert_eq!(axis["labels"]["format"], "${value}");
    }

    #[test]
    fn test_two_axes_hide_grid() {
        let mut doc = bar_chart();
        doc.scales[AxisSide::Right] =
            ScaleQuantification::numbers(strings(&["0", "10"]), vec![180.0, 20.0], vec![0.0, 10.0], "");
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["yAxis"][1]["opposite"], true);
        assert_eq!(value["yAxis"][0]["gridLineWidth"], 0);
    }

    // ============================================================================
    // Series
    // ============================================================================

    #[test]
    fn test_bar_series_data() {
        let value = ChartWriter::default().write(&bar_chart()).unwrap();
        let serie = &value["series"][0];
        assert_eq!(serie["type"], "column");
        assert_eq!(serie["color"], "#008000");
        assert_eq!(serie["data"], json!([["2019", 40.0], ["2020", 75.0]]));
        assert_eq!(serie["tooltip"]["pointFormat"], "{series.name}: {point.y:,.2f}%");
    }

    #[test]
    fn test_percent_divided_when_axis_differs() {
        let mut doc = bar_chart();
        doc.scales[AxisSide::Left].suffix = String::new();
        doc.series[0].values_y = strings(&["40%", "75%"]);
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["series"][0]["data"][0][1], json!(0.4));
    }

    #[test]
    fn test_null_filled_categories() {
        let mut doc = bar_chart();
        doc.scales[AxisSide::Bottom] =
            ScaleQuantification::labels(strings(&["2018", "2019", "2020"]), vec![0.0, 5.0, 25.0]);
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(
            value["series"][0]["data"],
            json!([["2018", null], ["2019", 40.0], ["2020", 75.0]])
        );
    }

    #[test]
    fn test_unparsable_value_fails() {
        let mut doc = bar_chart();
        doc.series[0].values_y = strings(&["40", "n/a"]);
        assert!(matches!(
            ChartWriter::default().write(&doc),
            Err(ChartError::Assembly(_))
        ));
    }

    #[test]
    fn test_no_series_fails() {
        let mut doc = bar_chart();
        doc.series.clear();
        assert!(ChartWriter::default().write(&doc).is_err());
    }

    #[test]
    fn test_lines_written_last() {
        let mut doc = bar_chart();
        let mut line = doc.series[0].clone();
        line.role = PathRole::Line;
        line.text = "Trend".to_string();
        doc.series.insert(0, line);
        doc.chart_type = ChartType::Combo;
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["series"][0]["type"], "column");
        assert_eq!(value["series"][1]["type"], "line");
        assert_eq!(value["series"][1]["marker"]["enabled"], false);
    }

    #[test]
    fn test_stacked_bars_reversed() {
        let mut doc = bar_chart();
        doc.series[0].path = Path::rect(Rect::new(0.0, 100.0, 10.0, 80.0));
        let mut upper = doc.series[0].clone();
        upper.text = "Cost".to_string();
        upper.color = Color::new(200, 0, 0);
        upper.path = Path::rect(Rect::new(0.0, 60.0, 10.0, 40.0));
        upper.values_y = strings(&["20", "30"]);
        doc.series.push(upper);
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["series"][0]["name"], "Cost");
        assert_eq!(value["series"][1]["name"], "Share");
        assert_eq!(value["series"][0]["stacking"], "normal");
        assert_eq!(value["series"][1]["stacking"], "normal");
        assert_eq!(value["series"][0]["data"], json!([["2019", 20.0], ["2020", 30.0]]));
    }

    #[test]
    fn test_side_by_side_bars_not_stacked() {
        let mut doc = bar_chart();
        doc.series[0].path = Path::rect(Rect::new(0.0, 100.0, 10.0, 80.0));
        let mut other = doc.series[0].clone();
        other.text = "Cost".to_string();
        other.path = Path::rect(Rect::new(12.0, 100.0, 10.0, 80.0));
        doc.series.push(other);
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["series"][0]["name"], "Share");
        assert!(value["series"][0].get("stacking").is_none());
    }

    // ============================================================================
    // Time axes
    // ============================================================================

    const JAN_2019: i64 = 1_546_300_800_000;
    const JAN_2020: i64 = 1_577_836_800_000;

    fn yearly_line_chart() -> ChartDocument {
        let mut doc = ChartDocument::new(Rect::new(0.0, 0.0, 200.0, 200.0), ChartType::Line);
        doc.scales[AxisSide::Bottom] = ScaleQuantification {
            kind: Some(ScaleKind::Time),
            xs: vec![20.0, 180.0],
            nums_l: vec![JAN_2019, JAN_2020],
            infos: strings(&["2019", "2020"]),
            time_format: Some(TimeFormat {
                common: "yyyy",
                highchart: "%Y",
            }),
            ..Default::default()
        };
        doc.scales[AxisSide::Left] =
            ScaleQuantification::numbers(strings(&["0", "50"]), vec![180.0, 20.0], vec![0.0, 50.0], "");
        let mut s = PathSeries::new(PathRole::Line, Color::new(0, 0, 200), Path::new());
        s.text = "Visits".to_string();
        s.scale_x = ScaleKind::Time;
        s.subdivide_x = true;
        s.values_x = vec![JAN_2019.to_string(), JAN_2020.to_string()];
        s.values_y = strings(&["10", "42.5"]);
        doc.series.push(s);
        doc
    }

    #[test]
    fn test_datetime_axis() {
        let doc = yearly_line_chart();
        assert_eq!(x_axis_type(&doc), "datetime");
        let value = ChartWriter::default().write(&doc).unwrap();
        assert_eq!(value["xAxis"]["type"], "datetime");
        assert_eq!(value["xAxis"]["tickInterval"], json!(JAN_2020 - JAN_2019));
        assert_eq!(value["xAxis"]["labels"]["format"], "{value: %Y}");
        assert!(value["xAxis"].get("categories").is_none());
        assert_eq!(value["plotOptions"]["series"]["pointStart"], json!(JAN_2019));
        assert_eq!(value["plotOptions"]["series"]["pointInterval"], json!(JAN_2020 - JAN_2019));
        assert_eq!(value["series"][0]["data"], json!([[JAN_2019, 10.0], [JAN_2020, 42.5]]));
    }

    #[test]
    fn test_time_labels_without_subdivision_are_categories() {
        let mut doc = yearly_line_chart();
        doc.series[0].subdivide_x = false;
        assert_eq!(x_axis_type(&doc), "category");
        let value = ChartWriter::default().write(&doc).unwrap();
        assert!(value["xAxis"].get("tickInterval").is_none());
        assert!(value.get("plotOptions").is_none());
    }

    // ============================================================================
    // Pies and diagnostics
    // ============================================================================

    #[test]
    fn test_pie_names_default_to_percent() {
        let doc = pie_chart(&[("", 0.25), ("Rest", 0.75), ("", 0.00001)], true);
        let value = ChartWriter::default().write(&doc).unwrap();
        let serie = &value["series"][0];
        assert_eq!(serie["innerSize"], "50%");
        assert_eq!(serie["data"], json!([["25%", 0.25], ["Rest", 0.75]]));
        assert_eq!(value["plotOptions"]["pie"]["cursor"], "pointer");
        assert!(value.get("yAxis").is_none());
    }

    #[test]
    fn test_percent_name_trims_zeros() {
        assert_eq!(percent_name(0.125), "12.5%");
        assert_eq!(percent_name(0.3333), "33.33%");
        assert_eq!(percent_name(1.0), "100%");
    }

    #[test]
    fn test_detail_fields() {
        let writer = ChartWriter::new(WriterOptions { detail: true });
        let value = writer.write(&bar_chart()).unwrap();
        assert_eq!(value["bndbox"]["xmax"], json!(200.0));
        assert_eq!(value["vAxisTextDown"], json!([]));
        assert_eq!(value["credits"]["onlyMatchXScale"], false);
        assert_eq!(value["ocrEngine"]["detectedImages"], 0);
    }
}
