//! Label recognition for text drawn as vector outlines
//!
//! Some producers draw axis labels as filled glyph outlines instead of text.
//! The outline paths under the horizontal axis are grouped into one group per
//! label, sanity checked, and sent to an external recognizer.

use crate::geometry::{Line, Path, Rect};
use crate::ChartError;
use log::{info, warn};
use std::time::Instant;

/// Which x coordinate of a label group marks its tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XPosition {
    Left,
    Center,
    Right,
}

/// One label drawn as outline paths
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPathInfo {
    pub path: Path,
    pub bounds: Rect,
    /// Recognized text, empty until recognition ran
    pub text: String,
    pub group: usize,
    /// Label is rotated counter-clockwise
    pub ccw: bool,
    /// Tick position of the label
    pub x: f64,
    pub x_position: XPosition,
}

/// Configuration for outline grouping
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Gap between consecutive paths that starts a new group, relative to the chart height (default: 0.05)
    pub group_gap_ratio: f64,
    /// Minimum group width and height relative to the chart (default: 0.02)
    pub min_size_ratio: f64,
    /// Groups whose steepest path stays below this angle in radians count as horizontal (default: 0.45)
    pub small_angle: f64,
    /// Minimum number of groups for a usable scale (default: 3)
    pub min_groups: usize,
    /// Minimum horizontal span of the groups relative to the axis length (default: 0.4)
    pub min_span_width: f64,
    /// Minimum vertical span of the groups relative to the chart height (default: 0.05)
    pub min_span_height: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            group_gap_ratio: 0.05,
            min_size_ratio: 0.02,
            small_angle: 0.45,
            min_groups: 3,
            min_span_width: 0.4,
            min_span_height: 0.05,
        }
    }
}

/// Recognition service for label images
pub trait OcrService: Send + Sync {
    /// Recognize one string per label group, in request order
    fn recognize(&self, groups: &[OcrPathInfo]) -> Result<Vec<String>, ChartError>;
}

/// Outcome of a recognition round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrDiagnostics {
    pub client_valid: bool,
    pub detected_images: usize,
    pub recognized_texts: usize,
}

/// Group label outline paths with the default configuration
pub fn group_ocr_paths(paths: &[Path], area: &Rect) -> Vec<OcrPathInfo> {
    group_ocr_paths_with_config(paths, area, &OcrConfig::default())
}

/// Group consecutive outline paths into one group per label.
///
/// Paths arrive in drawing order. A new group starts whenever the trailing
/// corner of the previous path is farther than `group_gap_ratio` of the chart
/// height (L1) from the leading corner of the next one. Groups too small to
/// be a label are dropped. When any outline box has a diagonal steeper than
/// `small_angle` the labels are taken as rotated and keep the tick at their
/// axis-side end.
pub fn group_ocr_paths_with_config(paths: &[Path], area: &Rect, config: &OcrConfig) -> Vec<OcrPathInfo> {
    let items: Vec<(&Path, Rect)> = paths
        .iter()
        .filter_map(|p| p.bounds().map(|b| (p, b)))
        .collect();
    let (first, last) = match (items.first(), items.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Vec::new(),
    };

    let first_y = first.0.first_point().map(|p| p.y).unwrap_or(first.1.min_y());
    let last_y = last.0.current_point().map(|p| p.y).unwrap_or(last.1.max_y());
    let ccw = first_y > last_y;

    let leading = |r: &Rect| {
        if ccw {
            (r.min_x(), r.max_y())
        } else {
            (r.min_x(), r.min_y())
        }
    };
    let trailing = |r: &Rect| {
        if ccw {
            (r.max_x(), r.min_y())
        } else {
            (r.max_x(), r.max_y())
        }
    };
    let gap = config.group_gap_ratio * area.height;
    // Steepest box diagonal over all outlines
    let steepest = items
        .iter()
        .map(|(_, b)| b.height.atan2(b.width))
        .fold(0.0, f64::max);

    let mut grouped: Vec<Vec<(&Path, Rect)>> = Vec::new();
    let mut current: Vec<(&Path, Rect)> = Vec::new();
    for item in items {
        if let Some(prev) = current.last() {
            let (px, py) = trailing(&prev.1);
            let (nx, ny) = leading(&item.1);
            if (px - nx).abs() + (py - ny).abs() >= gap {
                grouped.push(std::mem::take(&mut current));
            }
        }
        current.push(item);
    }
    if !current.is_empty() {
        grouped.push(current);
    }

    let x_position = if steepest < config.small_angle {
        XPosition::Center
    } else if ccw {
        XPosition::Right
    } else {
        XPosition::Left
    };

    let mut infos = Vec::new();
    for members in grouped {
        let mut path = Path::new();
        let mut bounds = members[0].1;
        for (p, b) in &members {
            path.append(p);
            bounds = bounds.union(b);
        }
        if bounds.width < config.min_size_ratio * area.width
            || bounds.height < config.min_size_ratio * area.height
        {
            continue;
        }
        let x = match x_position {
            XPosition::Center => {
                members.iter().map(|(_, b)| b.center_x()).sum::<f64>() / members.len() as f64
            }
            XPosition::Right => bounds.max_x(),
            XPosition::Left => members[0].1.min_x(),
        };
        infos.push(OcrPathInfo {
            path,
            bounds,
            text: String::new(),
            group: infos.len(),
            ccw,
            x,
            x_position,
        });
    }
    infos
}

/// Whether the groups can form a horizontal-axis scale
pub fn is_valid_scale_ocr(
    groups: &[OcrPathInfo],
    h_axis: Option<&Line>,
    area: &Rect,
    config: &OcrConfig,
) -> bool {
    let axis = match h_axis {
        Some(a) => a,
        None => return false,
    };
    if groups.len() < config.min_groups {
        return false;
    }
    let min_y = groups.iter().map(|g| g.bounds.min_y()).fold(f64::INFINITY, f64::min);
    let max_y = groups.iter().map(|g| g.bounds.max_y()).fold(f64::NEG_INFINITY, f64::max);
    let min_x = groups.iter().map(|g| g.bounds.min_x()).fold(f64::INFINITY, f64::min);
    let max_x = groups.iter().map(|g| g.bounds.max_x()).fold(f64::NEG_INFINITY, f64::max);

    max_y - min_y >= config.min_span_height * area.height
        && max_x - min_x >= config.min_span_width * axis.bounds().width
}

/// Send the groups to the recognizer and attach the returned texts.
///
/// Failures never abort parsing: the groups come back without text and the
/// diagnostics record what happened.
pub fn recognize_labels(
    service: &dyn OcrService,
    mut groups: Vec<OcrPathInfo>,
) -> (Vec<OcrPathInfo>, OcrDiagnostics) {
    let start = Instant::now();
    let mut diag = OcrDiagnostics {
        detected_images: groups.len(),
        ..Default::default()
    };
    if groups.is_empty() {
        return (groups, diag);
    }

    match service.recognize(&groups) {
        Ok(texts) if texts.len() == groups.len() => {
            diag.client_valid = true;
            for (group, text) in groups.iter_mut().zip(texts) {
                group.text = text.trim().to_string();
            }
            diag.recognized_texts = groups.iter().filter(|g| !g.text.is_empty()).count();
        }
        Ok(texts) => {
            diag.client_valid = true;
            warn!(
                "OCR returned {} texts for {} label images, ignoring",
                texts.len(),
                groups.len()
            );
        }
        Err(e) => warn!("OCR service unavailable: {}", e),
    }

    info!(
        "OCR of {} label images took {} ms",
        groups.len(),
        start.elapsed().as_millis()
    );
    (groups, diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn glyph(x: f64, y: f64, w: f64, h: f64) -> Path {
        Path::rect(Rect::new(x, y, w, h))
    }

    fn area() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 200.0)
    }

    struct FixedOcr(Vec<&'static str>);

    impl OcrService for FixedOcr {
        fn recognize(&self, _groups: &[OcrPathInfo]) -> Result<Vec<String>, ChartError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingOcr;

    impl OcrService for FailingOcr {
        fn recognize(&self, _groups: &[OcrPathInfo]) -> Result<Vec<String>, ChartError> {
            Err(ChartError::Collaborator("timeout".to_string()))
        }
    }

    fn three_labels() -> Vec<Path> {
        let mut paths = Vec::new();
        for base in [20.0, 150.0, 280.0] {
            paths.push(glyph(base, 180.0, 10.0, 4.4));
            paths.push(glyph(base + 11.0, 180.0, 10.0, 4.4));
        }
        paths
    }

    /// Three labels rising to the right, four glyphs each
    fn rotated_labels() -> Vec<Path> {
        let mut paths = Vec::new();
        for base in [100.0, 200.0, 300.0] {
            for i in 0..4 {
                let step = 4.0 * i as f64;
                paths.push(glyph(base + step, 196.0 - step, 4.0, 4.0));
            }
        }
        paths
    }

    #[test]
    fn test_group_horizontal_labels() {
        let groups = group_ocr_paths(&three_labels(), &area());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].x_position, XPosition::Center);
        assert!((groups[0].x - 30.5).abs() < 1e-9);
        assert_eq!(groups[2].group, 2);
    }

    #[test]
    fn test_group_drops_specks() {
        let mut paths = three_labels();
        paths.push(glyph(390.0, 10.0, 2.0, 0.5));
        let groups = group_ocr_paths(&paths, &area());
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_group_rotated_labels() {
        let groups = group_ocr_paths(&rotated_labels(), &area());
        assert_eq!(groups.len(), 3);
        assert!(groups[0].ccw);
        assert_eq!(groups[0].x_position, XPosition::Right);
        assert!((groups[1].x - 216.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_rotated_single_outline_labels() {
        // One tall outline per label, drawn top to bottom
        let paths: Vec<Path> = [20.0, 80.0, 140.0]
            .iter()
            .map(|x| glyph(*x, 150.0, 8.0, 30.0))
            .collect();
        let groups = group_ocr_paths(&paths, &Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(groups.len(), 3);
        for (group, x) in groups.iter().zip([20.0, 80.0, 140.0]) {
            assert!(!group.ccw);
            assert_eq!(group.x_position, XPosition::Left);
            assert!((group.x - x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_valid_scale_needs_axis_and_span() {
        let groups = group_ocr_paths(&rotated_labels(), &area());
        let axis = Line::new(Point::new(0.0, 175.0), Point::new(400.0, 175.0));
        let config = OcrConfig::default();
        assert!(is_valid_scale_ocr(&groups, Some(&axis), &area(), &config));
        assert!(!is_valid_scale_ocr(&groups, None, &area(), &config));
        assert!(!is_valid_scale_ocr(&groups[..2], Some(&axis), &area(), &config));
        // Horizontal labels are too flat to span the required height
        let flat = group_ocr_paths(&three_labels(), &area());
        assert!(!is_valid_scale_ocr(&flat, Some(&axis), &area(), &config));
    }

    #[test]
    fn test_recognize_assigns_texts() {
        let groups = group_ocr_paths(&three_labels(), &area());
        let (groups, diag) = recognize_labels(&FixedOcr(vec!["A", " B ", ""]), groups);
        assert!(diag.client_valid);
        assert_eq!(diag.detected_images, 3);
        assert_eq!(diag.recognized_texts, 2);
        assert_eq!(groups[1].text, "B");
    }

    #[test]
    fn test_recognize_failure_keeps_groups() {
        let groups = group_ocr_paths(&three_labels(), &area());
        let (groups, diag) = recognize_labels(&FailingOcr, groups);
        assert!(!diag.client_valid);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.text.is_empty()));
    }
}
