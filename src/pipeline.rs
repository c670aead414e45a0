//! Staged chart reconstruction
//!
//! A region runs through text merging, path classification and element
//! extraction, a draft with the chart type and text layout, then scale
//! quantification, and ends as a [`ChartDocument`]. Each stage consumes the
//! value of the previous one.

use crate::chart::{AxisSide, ChartDocument, ChartType, Diagnostics, ScaleKind};
use crate::classify::{
    judge_content_group_type_with_config, map_classifier_labels, mark_chart_path_with_config, ChartTypeClassifier,
    ClassifyConfig, ContentGroup, ContentGroupType, ContentItem, KnownElements, PathRun,
};
use crate::geometry::{Path, Rect};
use crate::ocr::{
    group_ocr_paths_with_config, is_valid_scale_ocr, recognize_labels, OcrConfig, OcrDiagnostics, OcrPathInfo,
    OcrService,
};
use crate::scale::{expand_axis_range, quantize_labels, simplify_timestamp, ScaleConfig, ScaleSet};
use crate::series::{
    assign_values, decide_chart_type, extract_elements, judge_subdivide, label_position, layout_text, ExtractConfig,
    Extraction, TextLayout, ValueContext,
};
use crate::text::{ChunkMerger, MergeConfig, TextChunk, TextElement};
use crate::writer::{ChartWriter, WriterOptions};
use crate::ChartError;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::time::Instant;

/// Every tunable threshold of the engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub merge: MergeConfig,
    pub ocr: OcrConfig,
    pub classify: ClassifyConfig,
    pub scale: ScaleConfig,
    pub extract: ExtractConfig,
    pub writer: WriterOptions,
}

fn default_confidence() -> f64 {
    1.0
}

/// Primitives of one candidate chart region
#[derive(Debug, Clone, Deserialize)]
pub struct RegionInput {
    pub area: Rect,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Content groups in drawing order
    #[serde(default)]
    pub groups: Vec<ContentGroup>,
    #[serde(default)]
    pub texts: Vec<TextElement>,
    /// Label glyphs drawn as outlines, in drawing order
    #[serde(default)]
    pub ocr_paths: Vec<Path>,
    #[serde(default)]
    pub detect_model_area: bool,
    #[serde(default)]
    pub hint_area: bool,
    #[serde(default)]
    pub recall_area: bool,
}

impl RegionInput {
    pub fn new(area: Rect) -> Self {
        Self {
            area,
            confidence: default_confidence(),
            groups: Vec::new(),
            texts: Vec::new(),
            ocr_paths: Vec::new(),
            detect_model_area: false,
            hint_area: false,
            recall_area: false,
        }
    }

    /// Loose text elements plus the text items of the content groups
    fn text_elements(&self) -> Vec<TextElement> {
        let grouped = self.groups.iter().flat_map(|g| {
            g.items.iter().filter_map(|i| match i {
                ContentItem::Text(t) => Some(t.clone()),
                _ => None,
            })
        });
        self.texts.iter().cloned().chain(grouped).collect()
    }
}

/// Read a region description from a JSON file
pub fn load_region<P: AsRef<std::path::Path>>(path: P) -> Result<RegionInput, ChartError> {
    let bytes = std::fs::read(path)?;
    load_region_mem(&bytes)
}

/// Read a region description from JSON bytes
pub fn load_region_mem(bytes: &[u8]) -> Result<RegionInput, ChartError> {
    let region: RegionInput = serde_json::from_slice(bytes)?;
    if !(region.area.width > 0.0 && region.area.height > 0.0) {
        return Err(ChartError::InvalidRegion(format!(
            "region area {}x{} is empty",
            region.area.width, region.area.height
        )));
    }
    Ok(region)
}

// ============================================================================
// Stages
// ============================================================================

/// Text of the region merged into chunks
#[derive(Debug, Clone)]
pub struct MergedText {
    pub elements: Vec<TextElement>,
    pub chunks: Vec<TextChunk>,
}

/// Path runs of the region with the elements recognized in them
#[derive(Debug, Clone)]
pub struct ClassifiedRegion {
    pub runs: Vec<PathRun>,
    pub chunks: Vec<TextChunk>,
    pub extraction: Extraction,
    pub ocrs: Vec<OcrPathInfo>,
    pub ocr_diagnostics: OcrDiagnostics,
}

/// Classified region with a chart type and its text laid out
#[derive(Debug, Clone)]
pub struct ChartDraft {
    pub classified: ClassifiedRegion,
    pub chart_type: ChartType,
    pub sub_types: Vec<ChartType>,
    pub plot: Rect,
    pub layout: TextLayout,
}

/// Draft whose series values were read through the quantified scales
#[derive(Debug, Clone)]
pub struct QuantifiedChart {
    pub document: ChartDocument,
    pub runs: Vec<PathRun>,
    pub used_runs: Vec<bool>,
}

/// Chart reconstruction engine with its optional collaborators
#[derive(Default)]
pub struct ChartEngine<'a> {
    config: EngineConfig,
    ocr: Option<&'a dyn OcrService>,
    classifier: Option<&'a dyn ChartTypeClassifier>,
}

impl<'a> ChartEngine<'a> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ocr: None,
            classifier: None,
        }
    }

    pub fn with_ocr(mut self, service: &'a dyn OcrService) -> Self {
        self.ocr = Some(service);
        self
    }

    pub fn with_classifier(mut self, classifier: &'a dyn ChartTypeClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconstruct one region. `None` when nothing chart-like was found.
    pub fn parse_region(&self, region: &RegionInput) -> Option<ChartDocument> {
        let start = Instant::now();
        let merged = self.merge_text(region);
        let classified = self.classify(region, merged);
        let draft = self.draft(region, classified);
        if draft.chart_type == ChartType::Bitmap {
            let mut doc = ChartDocument::new(region.area, ChartType::Bitmap);
            doc.sub_types = draft.sub_types;
            doc.confidence = region.confidence;
            doc.diagnostics = region_diagnostics(region);
            return Some(doc);
        }
        let extraction = &draft.classified.extraction;
        if extraction.series.is_empty() && extraction.pies.is_empty() {
            debug!("region {:?} has no series", region.area);
            return None;
        }
        let quantified = self.quantify(region, draft);
        let doc = self.finish(quantified);
        info!(
            "parsed {:?} chart with {} series in {} ms",
            doc.chart_type,
            doc.series.len(),
            start.elapsed().as_millis()
        );
        Some(doc)
    }

    /// Reconstruct independent regions in parallel
    pub fn parse_regions(&self, regions: &[RegionInput]) -> Vec<Option<ChartDocument>> {
        regions.par_iter().map(|r| self.parse_region(r)).collect()
    }

    /// Emit a document as chart-library JSON
    pub fn write_document(&self, doc: &ChartDocument) -> Result<serde_json::Value, ChartError> {
        ChartWriter::new(self.config.writer.clone()).write(doc)
    }

    pub fn merge_text(&self, region: &RegionInput) -> MergedText {
        let elements = region.text_elements();
        let chunks = ChunkMerger::new(self.config.merge.clone()).merge_text_chunks(elements.clone());
        MergedText { elements, chunks }
    }

    pub fn classify(&self, region: &RegionInput, merged: MergedText) -> ClassifiedRegion {
        let area = region.area;
        let runs = mark_chart_path_with_config(&region.groups, &area, &self.config.classify);
        let mut chunks = merged.chunks;
        let mut extraction = extract_elements(&runs, &chunks, &area, &self.config.extract);

        // Pie labels stagger around the circle, merge again with that in mind
        if !extraction.pies.is_empty() {
            chunks = ChunkMerger::new(self.config.merge.clone())
                .with_pie_mode(true)
                .merge_text_chunks(merged.elements);
            extraction = extract_elements(&runs, &chunks, &area, &self.config.extract);
        }

        let (ocrs, ocr_diagnostics) = self.recognize_ocr_labels(region, &extraction);
        debug!(
            "{} runs, {} chunks, {} OCR labels in region",
            runs.len(),
            chunks.len(),
            ocrs.len()
        );
        ClassifiedRegion {
            runs,
            chunks,
            extraction,
            ocrs,
            ocr_diagnostics,
        }
    }

    fn recognize_ocr_labels(
        &self,
        region: &RegionInput,
        extraction: &Extraction,
    ) -> (Vec<OcrPathInfo>, OcrDiagnostics) {
        if region.ocr_paths.is_empty() {
            return (Vec::new(), OcrDiagnostics::default());
        }
        let groups = group_ocr_paths_with_config(&region.ocr_paths, &region.area, &self.config.ocr);
        let h_axis = extraction.axes.horizontal().map(|a| &a.line);
        if !is_valid_scale_ocr(&groups, h_axis, &region.area, &self.config.ocr) {
            debug!("{} outline label groups do not form a scale", groups.len());
            return (Vec::new(), OcrDiagnostics::default());
        }
        match self.ocr {
            Some(service) => recognize_labels(service, groups),
            None => {
                let diag = OcrDiagnostics {
                    detected_images: groups.len(),
                    ..Default::default()
                };
                (groups, diag)
            }
        }
    }

    /// Chart type from the drawn elements, falling back to the classifier
    fn resolve_chart_type(&self, area: &Rect, extraction: &Extraction) -> (ChartType, Vec<ChartType>) {
        let (chart_type, sub_types) = decide_chart_type(&extraction.series, &extraction.pies);
        let no_paths = extraction.series.is_empty() && extraction.pies.is_empty();
        if chart_type != ChartType::Unknown && !no_paths {
            return (chart_type, sub_types);
        }
        let classifier = match self.classifier {
            Some(c) => c,
            None => return (chart_type, sub_types),
        };
        let mapped = match classifier.classify(area) {
            Ok(labels) => map_classifier_labels(&labels),
            Err(e) => {
                warn!("chart classifier unavailable: {}", e);
                return (chart_type, sub_types);
            }
        };
        match mapped.first() {
            Some(&first) if first != ChartType::Unknown => {
                if no_paths {
                    (ChartType::Bitmap, mapped)
                } else {
                    (first, mapped[1..].to_vec())
                }
            }
            _ => (chart_type, sub_types),
        }
    }

    pub fn draft(&self, region: &RegionInput, classified: ClassifiedRegion) -> ChartDraft {
        let (chart_type, sub_types) = self.resolve_chart_type(&region.area, &classified.extraction);
        let plot = classified.extraction.plot_bounds().unwrap_or(region.area);
        let layout = layout_text(
            &classified.chunks,
            &classified.extraction.used_chunks,
            &classified.extraction.axes,
            &plot,
            chart_type,
            &self.config.extract,
        );
        ChartDraft {
            classified,
            chart_type,
            sub_types,
            plot,
            layout,
        }
    }

    pub fn quantify(&self, region: &RegionInput, draft: ChartDraft) -> QuantifiedChart {
        let ChartDraft {
            classified,
            chart_type,
            sub_types,
            plot,
            layout,
        } = draft;
        let ClassifiedRegion {
            runs,
            chunks,
            extraction,
            ocrs,
            ocr_diagnostics,
        } = classified;
        let Extraction {
            mut axes,
            legends,
            mut series,
            pies,
            used_runs,
            ..
        } = extraction;

        let mut scales = ScaleSet::default();
        for side in AxisSide::ALL {
            let mut labels: Vec<(String, f64)> = layout.sides[side.index()]
                .iter()
                .map(|&j| (chunks[j].text(), label_position(&chunks[j], side)))
                .collect();
            if side == AxisSide::Bottom && labels.is_empty() {
                labels = ocrs
                    .iter()
                    .filter(|o| !o.text.is_empty())
                    .map(|o| (o.text.clone(), o.x))
                    .collect();
            }
            scales[side] = quantize_labels(&labels, side, chart_type, &self.config.scale);
            if let Some(axis) = axes.get_mut(side) {
                axis.ticks = layout.sides[side.index()].iter().map(|&j| chunks[j].clone()).collect();
            }
        }
        let units = [
            layout.units[0].map(|j| chunks[j].clone()),
            layout.units[1].map(|j| chunks[j].clone()),
        ];

        let x_range = axes
            .horizontal()
            .map(|a| {
                let b = a.line.bounds();
                (b.min_x(), b.max_x())
            })
            .unwrap_or((plot.min_x(), plot.max_x()));
        let only_match = judge_subdivide(&mut series, &mut scales, x_range, &self.config.scale);

        {
            let ctx = ValueContext {
                scales: &scales,
                axes: &axes,
                plot,
                inner: layout.inner.iter().map(|&j| &chunks[j]).collect(),
                scale_config: &self.config.scale,
                config: &self.config.extract,
            };
            for s in series.iter_mut() {
                assign_values(s, &ctx);
            }
        }

        for side in AxisSide::ALL {
            if scales[side].is_kind(ScaleKind::Number) {
                expand_axis_range(&mut scales[side], &series, side, &self.config.scale);
            }
        }

        for s in series.iter_mut() {
            simplify_time_values(s, &scales);
        }

        let mut document = ChartDocument::new(region.area, chart_type);
        document.sub_types = sub_types;
        document.title = layout.title.map(|j| chunks[j].text().trim().to_string());
        document.subtitle = layout.subtitle.map(|j| chunks[j].text().trim().to_string());
        document.legends = legends;
        document.axes = axes;
        document.series = series;
        document.pies = pies;
        document.confidence = region.confidence;
        document.ocrs = ocrs;
        document.scales = scales;
        document.units = units;
        document.diagnostics = Diagnostics {
            only_match_x_scale: only_match,
            ocr: ocr_diagnostics,
            ..region_diagnostics(region)
        };
        QuantifiedChart {
            document,
            runs,
            used_runs,
        }
    }

    /// Check the leftover runs against the finished elements
    pub fn finish(&self, quantified: QuantifiedChart) -> ChartDocument {
        let QuantifiedChart {
            mut document,
            runs,
            used_runs,
        } = quantified;
        let legend_runs = {
            let known = KnownElements::from_document(&document);
            runs.iter()
                .zip(&used_runs)
                .filter(|(run, used)| {
                    !**used
                        && judge_content_group_type_with_config(run, &known, &self.config.classify)
                            == ContentGroupType::Legend
                })
                .count()
        };
        let named_by_legend = document
            .series
            .iter()
            .any(|s| !s.text.is_empty() && document.legends.iter().any(|l| l.color == s.color));
        document.diagnostics.legend_match_path = named_by_legend || legend_runs > 0;
        debug!("{} leftover runs match a legend", legend_runs);
        document
    }
}

fn region_diagnostics(region: &RegionInput) -> Diagnostics {
    Diagnostics {
        detect_model_area: region.detect_model_area,
        hint_area: region.hint_area,
        recall_area: region.recall_area,
        ..Default::default()
    }
}

/// Round time values down to the grain their label format shows
fn simplify_time_values(s: &mut crate::chart::PathSeries, scales: &ScaleSet) {
    let (kind, side, values) = if s.role == crate::chart::PathRole::Columnar {
        (s.scale_y, s.side_y, &mut s.values_y)
    } else {
        (s.scale_x, s.side_x, &mut s.values_x)
    };
    if kind != ScaleKind::Time {
        return;
    }
    let pattern = match &scales[side].time_format {
        Some(f) => f.common,
        None => return,
    };
    for v in values.iter_mut() {
        match v.parse::<i64>() {
            Ok(ts) => *v = simplify_timestamp(ts, pattern).to_string(),
            Err(_) => warn!("time value {:?} is not a timestamp", v),
        }
    }
}
