//! Text chunk merging for chart labels
//!
//! Raw text elements (glyphs or short runs) are merged into chunks with
//! direction-aware proximity windows, then cleaned up: blank chunks dropped,
//! runs of spaces split, equal-interval numeric runs split apart and
//! right-to-left chunks put in reading order.

use crate::geometry::{Point, Rect};
use crate::patterns::is_numeric_text;
use serde::{Deserialize, Serialize};

/// Reading direction of a text element or chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextDirection {
    Ltr,
    Rtl,
    VerticalUp,
    VerticalDown,
    Rotated,
    #[default]
    Unknown,
}

impl TextDirection {
    pub fn is_vertical(&self) -> bool {
        matches!(self, TextDirection::VerticalUp | TextDirection::VerticalDown)
    }
}

/// A positioned piece of text as delivered by the page content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub text: String,
    pub bounds: Rect,
    pub font_size: f64,
    /// Width of a space in the element's font, 0 if unknown
    #[serde(default)]
    pub width_of_space: f64,
    /// Rotation in degrees, counter-clockwise as seen on the page
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub direction: TextDirection,
}

impl TextElement {
    pub fn new(text: &str, bounds: Rect, font_size: f64) -> Self {
        Self {
            text: text.to_string(),
            bounds,
            font_size,
            width_of_space: 0.0,
            rotation: 0.0,
            direction: TextDirection::Unknown,
        }
    }

    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Space width, estimated from the font size when not supplied
    pub fn space_width(&self) -> f64 {
        if self.width_of_space > 0.0 {
            self.width_of_space
        } else {
            self.font_size * 0.25
        }
    }
}

/// A merged run of text elements treated as one label
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub elements: Vec<TextElement>,
    pub direction: TextDirection,
    pub bounds: Rect,
}

/// The four proximity windows around a chunk
#[derive(Debug, Clone, Copy)]
struct SearchRects {
    left: Rect,
    right: Rect,
    top: Rect,
    bottom: Rect,
}

impl TextChunk {
    pub fn from_element(element: TextElement) -> Self {
        Self {
            direction: element.direction,
            bounds: element.bounds,
            elements: vec![element],
        }
    }

    /// Chunk from a non-empty element list
    pub fn from_elements(elements: Vec<TextElement>, direction: TextDirection) -> Option<Self> {
        let first = elements.first()?.bounds;
        let bounds = elements.iter().fold(first, |acc, e| acc.union(&e.bounds));
        Some(Self {
            elements,
            direction,
            bounds,
        })
    }

    pub fn text(&self) -> String {
        self.elements.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.elements.iter().all(|e| e.is_blank())
    }

    pub fn is_numeric(&self) -> bool {
        is_numeric_text(&self.text())
    }

    pub fn font_size(&self) -> f64 {
        self.elements.iter().map(|e| e.font_size).fold(0.0, f64::max)
    }

    /// Average space width over the elements
    pub fn width_of_space(&self) -> f64 {
        if self.elements.is_empty() {
            return 0.0;
        }
        self.elements.iter().map(|e| e.space_width()).sum::<f64>() / self.elements.len() as f64
    }

    pub fn rotation(&self) -> f64 {
        self.elements.first().map(|e| e.rotation).unwrap_or(0.0)
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    fn absorb(&mut self, other: TextChunk) {
        self.bounds = self.bounds.union(&other.bounds);
        self.elements.extend(other.elements);
    }

    /// Put elements in reading order for the chunk's direction
    fn order_elements(&mut self, direction: TextDirection) {
        if direction == TextDirection::Rotated {
            return;
        }
        let key = |e: &TextElement| -> f64 {
            match direction {
                TextDirection::Rtl => -e.bounds.center_x(),
                TextDirection::VerticalUp => -e.bounds.center_y(),
                TextDirection::VerticalDown => e.bounds.center_y(),
                _ => e.bounds.center_x(),
            }
        };
        self.elements
            .sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal));
    }

    fn search_rects(&self, merge_factor: f64) -> SearchRects {
        let delta = self.width_of_space() * merge_factor / 2.0;
        let b = self.bounds;
        SearchRects {
            left: Rect::new(b.min_x() - delta, b.min_y(), 2.0 * delta, b.height),
            right: Rect::new(b.max_x() - delta, b.min_y(), 2.0 * delta, b.height),
            top: Rect::new(b.min_x(), b.min_y() - delta, b.width, 2.0 * delta),
            bottom: Rect::new(b.min_x(), b.max_y() - delta, b.width, 2.0 * delta),
        }
    }
}

/// Configuration for chunk merging
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Multiple of the space width searched around a chunk (default: 1.2)
    pub merge_factor: f64,
    /// Cross-axis stagger allowed in pie mode, relative to the smaller chunk (default: 0.8)
    pub pie_stagger_ratio: f64,
    /// Maximum rotation difference for rotated chunks in degrees (default: 5.0)
    pub max_rotation_delta: f64,
    /// Maximum angle between the centre vector and the rotation in degrees (default: 10.0)
    pub max_center_angle_delta: f64,
    /// Number of consecutive spaces that splits a chunk (default: 3)
    pub space_run_split: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            merge_factor: 1.2,
            pie_stagger_ratio: 0.8,
            max_rotation_delta: 5.0,
            max_center_angle_delta: 10.0,
            space_run_split: 3,
        }
    }
}

/// Merges text chunks of one chart region
#[derive(Debug, Clone, Default)]
pub struct ChunkMerger {
    config: MergeConfig,
    pie_mode: bool,
}

/// Absolute difference between two angles in degrees, in [0, 180]
fn angle_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

impl ChunkMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            pie_mode: false,
        }
    }

    /// Pie labels sit around a curve, so a baseline stagger is tolerated
    pub fn with_pie_mode(mut self, pie_mode: bool) -> Self {
        self.pie_mode = pie_mode;
        self
    }

    /// Direction both chunks are read in, `None` when they disagree
    fn search_direction(prev: &TextChunk, next: &TextChunk) -> Option<TextDirection> {
        use TextDirection::*;
        match (prev.direction, next.direction) {
            (Unknown, d) | (d, Unknown) => Some(d),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    fn can_merge_rotated(&self, prev: &TextChunk, next: &TextChunk) -> bool {
        if prev.direction != TextDirection::Rotated || next.direction != TextDirection::Rotated {
            return false;
        }
        if angle_delta(prev.rotation(), next.rotation()) >= self.config.max_rotation_delta {
            return false;
        }
        let delta = prev.width_of_space().max(next.width_of_space()) * self.config.merge_factor;
        if !prev.bounds.extend(delta).intersects(&next.bounds.extend(delta)) {
            return false;
        }
        // hyphenated number split into two runs
        if prev.text().trim_end().ends_with('-') && next.is_numeric() {
            return true;
        }
        let (a, b) = (prev.center(), next.center());
        let angle = (a.y - b.y).atan2(b.x - a.x).to_degrees();
        angle_delta(angle, prev.rotation()) <= self.config.max_center_angle_delta
    }

    fn within_stagger(&self, a: &Rect, b: &Rect, horizontal: bool) -> bool {
        if !self.pie_mode {
            return true;
        }
        let ratio = self.config.pie_stagger_ratio;
        if horizontal {
            (a.min_y() - b.min_y()).abs() <= ratio * a.height.min(b.height)
        } else {
            (a.min_x() - b.min_x()).abs() <= ratio * a.width.min(b.width)
        }
    }

    /// Whether `next` continues `prev` in reading order
    pub fn can_merge(&self, prev: &TextChunk, next: &TextChunk) -> bool {
        let direction = match Self::search_direction(prev, next) {
            Some(d) => d,
            None => return false,
        };
        if direction == TextDirection::Rotated {
            return self.can_merge_rotated(prev, next);
        }

        let p = prev.search_rects(self.config.merge_factor);
        let n = next.search_rects(self.config.merge_factor);
        let numeric = prev.is_numeric() && next.is_numeric();

        // (window of prev, window of next, horizontal pair)
        let mut pairs: Vec<(Rect, Rect, bool)> = Vec::with_capacity(4);
        match direction {
            TextDirection::Ltr => pairs.push((p.right, n.left, true)),
            TextDirection::Rtl => pairs.push((p.left, n.right, true)),
            TextDirection::VerticalUp => pairs.push((p.top, n.bottom, false)),
            TextDirection::VerticalDown => pairs.push((p.bottom, n.top, false)),
            TextDirection::Unknown => {
                pairs.push((p.right, n.left, true));
                pairs.push((p.left, n.right, true));
                // numbers stacked vertically are separate tick labels
                if !numeric {
                    pairs.push((p.top, n.bottom, false));
                    pairs.push((p.bottom, n.top, false));
                }
            }
            TextDirection::Rotated => {}
        }

        pairs.iter().any(|(a, b, horizontal)| {
            a.intersects(b) && self.within_stagger(&prev.bounds, &next.bounds, *horizontal)
        })
    }

    /// Single left-to-right merge pass. The predecessor only advances on
    /// non-blank chunks.
    pub fn merge(&self, chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        let mut merged: Vec<TextChunk> = Vec::with_capacity(chunks.len());
        let mut prev: Option<usize> = None;

        for chunk in chunks {
            if let Some(idx) = prev {
                if self.can_merge(&merged[idx], &chunk) {
                    let direction = Self::search_direction(&merged[idx], &chunk)
                        .unwrap_or(merged[idx].direction);
                    let target = &mut merged[idx];
                    target.absorb(chunk);
                    target.direction = direction;
                    target.order_elements(direction);
                    continue;
                }
            }
            let blank = chunk.is_blank();
            merged.push(chunk);
            if !blank {
                prev = Some(merged.len() - 1);
            }
        }
        merged
    }

    /// Full merge pipeline from raw elements to cleaned-up chunks
    pub fn merge_text_chunks(&self, elements: Vec<TextElement>) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = elements.into_iter().map(TextChunk::from_element).collect();
        let merged = self.merge(chunks);
        let count = merged.len();

        let result: Vec<TextChunk> = merged
            .into_iter()
            .filter(|c| !c.is_blank())
            .map(|mut c| {
                if c.direction == TextDirection::Unknown {
                    c.direction = TextDirection::Ltr;
                }
                c
            })
            .flat_map(|c| squeeze_spaces(c, self.config.space_run_split))
            .flat_map(|c| {
                if c.direction == TextDirection::Ltr {
                    if let Some(parts) = split_number_pattern(&c) {
                        return parts;
                    }
                }
                vec![c]
            })
            .map(|mut c| {
                if c.direction == TextDirection::Rtl {
                    c.order_elements(TextDirection::Rtl);
                }
                c
            })
            .collect();

        log::debug!("merged {} text chunks into {}", count, result.len());
        result
    }
}

/// Split a chunk at runs of `min_run` or more blank elements
pub fn squeeze_spaces(chunk: TextChunk, min_run: usize) -> Vec<TextChunk> {
    let min_run = min_run.max(1);
    let mut pieces: Vec<Vec<TextElement>> = vec![Vec::new()];
    let mut blanks: Vec<TextElement> = Vec::new();
    let direction = chunk.direction;

    for element in chunk.elements {
        if element.is_blank() {
            blanks.push(element);
            continue;
        }
        if blanks.len() >= min_run {
            pieces.push(Vec::new());
            blanks.clear();
        } else if let Some(current) = pieces.last_mut() {
            current.append(&mut blanks);
        }
        if let Some(current) = pieces.last_mut() {
            current.push(element);
        }
    }

    pieces
        .into_iter()
        .filter_map(|els| TextChunk::from_elements(els, direction))
        .collect()
}

/// Split a numeric chunk made of equal-length tick labels glued together,
/// e.g. `"$12.$34.$56"` into `"$12."`, `"$34."`, `"$56"`.
///
/// A delimiter qualifies when it occurs at least twice at a constant step
/// `s`, its first occurrence lies within the first step and the text length
/// fits `count` pieces of length `s`. Blank elements around the text are
/// dropped first.
pub fn split_number_pattern(chunk: &TextChunk) -> Option<Vec<TextChunk>> {
    let start = chunk.elements.iter().position(|e| !e.is_blank())?;
    let end = chunk.elements.iter().rposition(|e| !e.is_blank())? + 1;
    let elements = &chunk.elements[start..end];
    let text: String = elements.iter().map(|e| e.text.as_str()).collect();
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n <= 4 || !is_numeric_text(&text) {
        return None;
    }
    // need one element per character to cut geometry
    if elements.len() != n {
        return None;
    }

    for delimiter in ['%', '-', '$', '.', '('] {
        let idx: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == delimiter)
            .map(|(i, _)| i)
            .collect();
        if idx.len() < 2 {
            continue;
        }
        let step = idx[1] - idx[0];
        if step <= 1 || idx[0] >= step || !idx.windows(2).all(|w| w[1] - w[0] == step) {
            continue;
        }
        let count = idx.len();
        if !((count - 1) * step < n && n <= count * step) {
            continue;
        }

        let parts: Vec<TextChunk> = elements
            .chunks(step)
            .filter_map(|els| TextChunk::from_elements(els.to_vec(), chunk.direction))
            .collect();
        return Some(parts);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One element per character, 6 units wide, starting at `x`
    fn glyphs(text: &str, x: f64, y: f64) -> Vec<TextElement> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                TextElement::new(
                    &c.to_string(),
                    Rect::new(x + i as f64 * 6.0, y, 6.0, 10.0),
                    10.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_merge_glyphs_into_words() {
        let mut elements = glyphs("Sales", 0.0, 0.0);
        elements.extend(glyphs("2019", 200.0, 0.0));
        let chunks = ChunkMerger::default().merge_text_chunks(elements);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text(), "Sales");
        assert_eq!(chunks[1].text(), "2019");
        assert_eq!(chunks[0].direction, TextDirection::Ltr);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut elements = glyphs("Revenue", 0.0, 0.0);
        elements.extend(glyphs("10", 0.0, 40.0));
        elements.extend(glyphs("20", 0.0, 80.0));
        let merger = ChunkMerger::default();
        let once = merger.merge_text_chunks(elements);
        let twice = merger.merge(once.clone());
        assert_eq!(once.len(), twice.len());
        let texts: Vec<String> = twice.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["Revenue", "10", "20"]);
    }

    #[test]
    fn test_numbers_do_not_merge_vertically() {
        let merger = ChunkMerger::default();
        let a = TextChunk::from_element(TextElement::new("10", Rect::new(0.0, 0.0, 12.0, 10.0), 10.0));
        let b = TextChunk::from_element(TextElement::new("20", Rect::new(0.0, 10.5, 12.0, 10.0), 10.0));
        assert!(!merger.can_merge(&a, &b));
        let c = TextChunk::from_element(TextElement::new("ab", Rect::new(0.0, 0.0, 12.0, 10.0), 10.0));
        let d = TextChunk::from_element(TextElement::new("cd", Rect::new(0.0, 10.5, 12.0, 10.0), 10.0));
        assert!(merger.can_merge(&c, &d));
    }

    #[test]
    fn test_conflicting_directions_never_merge() {
        let merger = ChunkMerger::default();
        let a = TextChunk::from_element(
            TextElement::new("a", Rect::new(0.0, 0.0, 6.0, 10.0), 10.0).with_direction(TextDirection::Ltr),
        );
        let b = TextChunk::from_element(
            TextElement::new("b", Rect::new(6.0, 0.0, 6.0, 10.0), 10.0)
                .with_direction(TextDirection::VerticalUp),
        );
        assert!(!merger.can_merge(&a, &b));
    }

    #[test]
    fn test_pie_mode_limits_stagger() {
        let a = TextChunk::from_element(TextElement::new("ab", Rect::new(0.0, 0.0, 12.0, 10.0), 10.0));
        let b = TextChunk::from_element(TextElement::new("cd", Rect::new(12.5, 9.0, 12.0, 10.0), 10.0));
        assert!(ChunkMerger::default().can_merge(&a, &b));
        let pie = ChunkMerger::default().with_pie_mode(true);
        assert!(!pie.can_merge(&a, &b));
    }

    #[test]
    fn test_rotated_chunks_follow_rotation() {
        let merger = ChunkMerger::default();
        let e = |text: &str, x: f64, y: f64, rot: f64| {
            TextChunk::from_element(
                TextElement::new(text, Rect::new(x, y, 6.0, 6.0), 10.0)
                    .with_direction(TextDirection::Rotated)
                    .with_rotation(rot),
            )
        };
        // 45 degrees up-right: next glyph is right and higher on the page
        let a = e("J", 0.0, 10.0, 45.0);
        let b = e("a", 5.0, 5.0, 45.0);
        assert!(merger.can_merge(&a, &b));
        let c = e("a", 5.0, 5.0, 60.0);
        assert!(!merger.can_merge(&a, &c));
        let d = e("a", 6.0, 10.0, 45.0);
        assert!(!merger.can_merge(&a, &d));
    }

    #[test]
    fn test_split_number_pattern() {
        let chunk = TextChunk::from_elements(glyphs("$12.$34.$56", 0.0, 0.0), TextDirection::Ltr).unwrap();
        let parts = split_number_pattern(&chunk).unwrap();
        let texts: Vec<String> = parts.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["$12.", "$34.", "$56"]);
        assert_eq!(texts.concat(), "$12.$34.$56");
        assert!((parts[1].bounds.min_x() - 24.0).abs() < 1e-9);

        let pct = TextChunk::from_elements(glyphs("12.5%13.5%", 0.0, 0.0), TextDirection::Ltr).unwrap();
        assert_eq!(split_number_pattern(&pct).unwrap().len(), 2);

        let plain = TextChunk::from_elements(glyphs("1,234.56", 0.0, 0.0), TextDirection::Ltr).unwrap();
        assert!(split_number_pattern(&plain).is_none());
        let date = TextChunk::from_elements(glyphs("2019-12-31", 0.0, 0.0), TextDirection::Ltr).unwrap();
        assert!(split_number_pattern(&date).is_none());
    }

    #[test]
    fn test_split_number_pattern_padded() {
        let chunk = TextChunk::from_elements(glyphs(" $12.$34.$56  ", 0.0, 0.0), TextDirection::Ltr).unwrap();
        let parts = split_number_pattern(&chunk).unwrap();
        let texts: Vec<String> = parts.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["$12.", "$34.", "$56"]);
        assert!((parts[0].bounds.min_x() - 6.0).abs() < 1e-9);

        let blank = TextChunk::from_elements(glyphs("     ", 0.0, 0.0), TextDirection::Ltr).unwrap();
        assert!(split_number_pattern(&blank).is_none());
    }

    #[test]
    fn test_squeeze_spaces() {
        let mut elements = glyphs("ab", 0.0, 0.0);
        elements.extend(glyphs("   ", 12.0, 0.0));
        elements.extend(glyphs("cd", 30.0, 0.0));
        let chunk = TextChunk::from_elements(elements, TextDirection::Ltr).unwrap();
        let parts = squeeze_spaces(chunk, 3);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].text(), "cd");

        let mut elements = glyphs("ab", 0.0, 0.0);
        elements.extend(glyphs(" ", 12.0, 0.0));
        elements.extend(glyphs("cd", 18.0, 0.0));
        let chunk = TextChunk::from_elements(elements, TextDirection::Ltr).unwrap();
        let parts = squeeze_spaces(chunk, 3);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text(), "ab cd");
    }

    #[test]
    fn test_rtl_chunk_reads_right_to_left() {
        let elements = vec![
            TextElement::new("a", Rect::new(16.0, 0.0, 6.0, 10.0), 10.0).with_direction(TextDirection::Rtl),
            TextElement::new("b", Rect::new(10.0, 0.0, 6.0, 10.0), 10.0).with_direction(TextDirection::Rtl),
        ];
        let chunks = ChunkMerger::default().merge_text_chunks(elements);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text(), "ab");
    }
}
