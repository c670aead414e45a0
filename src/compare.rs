//! Ranking of competing reconstructions of the same region

use crate::chart::ChartDocument;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Confidence gap that decides outright
const CONFIDENCE_MARGIN: f64 = 0.2;

/// Whether `a` is at least as good as `b`.
///
/// Tie-breaks run in order and the first decisive one wins: a clear
/// confidence gap, pie and slice counts when both are pies, the number of
/// distinct legend names, series that out-sample their counterpart, total
/// OCR text, and finally plain confidence with ties going to `a`.
pub fn better_chart(a: &ChartDocument, b: &ChartDocument) -> bool {
    if (a.confidence - b.confidence).abs() > CONFIDENCE_MARGIN {
        return a.confidence > b.confidence;
    }

    if a.is_pie() && b.is_pie() {
        if a.pies.len() != b.pies.len() {
            return a.pies.len() > b.pies.len();
        }
        for (pa, pb) in a.pies.iter().zip(&b.pies) {
            if pa.slices.len() != pb.slices.len() {
                return pa.slices.len() > pb.slices.len();
            }
        }
        return true;
    }

    match legend_names(a).cmp(&legend_names(b)) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }

    match richer_series(a, b).cmp(&richer_series(b, a)) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }

    if a.has_ocr_text() && b.has_ocr_text() {
        match ocr_text_len(a).cmp(&ocr_text_len(b)) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }

    a.confidence >= b.confidence
}

/// Number of distinct non-empty series names
fn legend_names(doc: &ChartDocument) -> usize {
    doc.series
        .iter()
        .filter(|s| !s.text.is_empty())
        .map(|s| s.text.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Series of `a` that have a counterpart in `b` (same role, name and color)
/// with fewer values
fn richer_series(a: &ChartDocument, b: &ChartDocument) -> usize {
    a.series
        .iter()
        .filter(|sa| {
            b.series.iter().any(|sb| {
                sa.role == sb.role
                    && sa.text == sb.text
                    && sa.color == sb.color
                    && sa.values_y.len() > sb.values_y.len()
            })
        })
        .count()
}

fn ocr_text_len(doc: &ChartDocument) -> usize {
    doc.ocrs.iter().map(|o| o.text.trim().chars().count()).sum()
}

/// Best candidate of a list, folding left with [`better_chart`]
pub fn select_best(candidates: Vec<ChartDocument>) -> Option<ChartDocument> {
    candidates
        .into_iter()
        .reduce(|best, c| if better_chart(&best, &c) { best } else { c })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartType, Color, PathRole, PathSeries, PieGroup, PieSlice};
    use crate::geometry::{Path, Point, Rect};

    fn doc(confidence: f64) -> ChartDocument {
        let mut d = ChartDocument::new(Rect::new(0.0, 0.0, 100.0, 100.0), ChartType::Line);
        d.confidence = confidence;
        d
    }

    fn named(role: PathRole, text: &str, values: usize) -> PathSeries {
        let mut s = PathSeries::new(role, Color::BLACK, Path::new());
        s.text = text.to_string();
        s.values_y = vec!["1".to_string(); values];
        s
    }

    fn pie(slices: usize) -> PieGroup {
        PieGroup {
            id: 0,
            center: Point::new(50.0, 50.0),
            radius: 20.0,
            slices: (0..slices)
                .map(|_| PieSlice {
                    text: String::new(),
                    color: Color::BLACK,
                    weight: 1.0 / slices as f64,
                    path: Path::new(),
                    is_pie: true,
                    start_angle: 0.0,
                    end_angle: 0.0,
                    id: 0,
                    number_text: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_confidence_gap_decides() {
        let mut a = doc(0.9);
        a.series.push(named(PathRole::Line, "x", 1));
        let mut b = doc(0.5);
        b.series.push(named(PathRole::Line, "y", 1));
        b.series.push(named(PathRole::Line, "z", 1));
        assert!(better_chart(&a, &b));
        assert!(!better_chart(&b, &a));
    }

    #[test]
    fn test_confidence_chain() {
        let (a, b, c) = (doc(0.9), doc(0.6), doc(0.3));
        assert!(better_chart(&a, &b));
        assert!(better_chart(&b, &c));
        assert!(better_chart(&a, &c));
        assert!(better_chart(&a, &a.clone()));
    }

    #[test]
    fn test_pies_by_slice_count() {
        let mut a = doc(0.8);
        a.chart_type = ChartType::Pie;
        a.pies.push(pie(3));
        let mut b = a.clone();
        b.pies[0] = pie(4);
        assert!(!better_chart(&a, &b));
        assert!(better_chart(&b, &a));
    }

    #[test]
    fn test_more_legend_names_win() {
        let mut a = doc(0.7);
        a.series.push(named(PathRole::Line, "North", 3));
        a.series.push(named(PathRole::Line, "South", 3));
        let mut b = doc(0.8);
        b.series.push(named(PathRole::Line, "North", 3));
        assert!(better_chart(&a, &b));
    }

    #[test]
    fn test_richer_series_win() {
        let mut a = doc(0.7);
        a.series.push(named(PathRole::Bar, "North", 5));
        let mut b = doc(0.7);
        b.series.push(named(PathRole::Bar, "North", 3));
        assert!(better_chart(&a, &b));
        assert!(!better_chart(&b, &a));
    }

    #[test]
    fn test_select_best() {
        let best = select_best(vec![doc(0.3), doc(0.9), doc(0.6)]);
        assert!((best.map(|d| d.confidence).unwrap_or(0.0) - 0.9).abs() < 1e-9);
        assert!(select_best(Vec::new()).is_none());
    }
}
