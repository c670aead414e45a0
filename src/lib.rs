//! Chart reconstruction from vector drawing primitives
//!
//! This crate provides:
//! - Text chunk merging and outline label grouping for axis labels
//! - Classification of path runs into axes, legends, series and pie slices
//! - Scale quantification of number, time and category tick labels
//! - Emission of the reconstructed chart as a chart-library JSON document
//! - Ranking of competing reconstructions of the same region

pub mod chart;
pub mod classify;
pub mod compare;
pub mod geometry;
pub mod ocr;
pub mod patterns;
pub mod pipeline;
pub mod scale;
pub mod series;
pub mod text;
pub mod writer;

pub use chart::{ChartDocument, ChartType, PathRole, PathSeries, PieGroup, PieSlice, ScaleKind};
pub use classify::{ChartTypeClassifier, ContentGroup, PathItem};
pub use compare::{better_chart, select_best};
pub use ocr::OcrService;
pub use pipeline::{load_region, load_region_mem, ChartEngine, EngineConfig, RegionInput};
pub use writer::{ChartWriter, WriterOptions};

use std::path::Path;

/// High-level region processing result
#[derive(Debug)]
pub struct ChartProcessResult {
    /// The reconstructed chart, if the region holds one
    pub document: Option<ChartDocument>,
    /// Emitted chart document
    pub chart: Option<serde_json::Value>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Process a region description file with the default engine
///
/// This function will:
/// 1. Load the region primitives from JSON
/// 2. Reconstruct the chart
/// 3. Emit it, failing if the chart has no data to write
pub fn process_region<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<ChartProcessResult, ChartError> {
    let start = std::time::Instant::now();
    let region = load_region(path)?;
    process(&region, options, start)
}

/// Process a region description from a memory buffer
pub fn process_region_mem(buffer: &[u8], options: WriterOptions) -> Result<ChartProcessResult, ChartError> {
    let start = std::time::Instant::now();
    let region = load_region_mem(buffer)?;
    process(&region, options, start)
}

fn process(
    region: &RegionInput,
    options: WriterOptions,
    start: std::time::Instant,
) -> Result<ChartProcessResult, ChartError> {
    let engine = ChartEngine::new(EngineConfig {
        writer: options,
        ..Default::default()
    });
    let document = engine.parse_region(region);
    let chart = match &document {
        Some(doc) => Some(engine.write_document(doc)?),
        None => None,
    };
    Ok(ChartProcessResult {
        document,
        chart,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Region parsing error: {0}")]
    Parse(String),
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("Collaborator error: {0}")]
    Collaborator(String),
    #[error("Chart assembly failed: {0}")]
    Assembly(String),
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::Parse(e.to_string())
    }
}
