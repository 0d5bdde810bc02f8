//! Output formatting for run summaries and network export.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use lcp_allpairs_lib::{AllPairsOutcome, FoldStep, VectorLayer};

/// Format of the summary printed after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON summary.
    Json,
}

/// What the CLI reports about a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub path: String,
    pub layer: String,
    pub points: usize,
    pub iterations: usize,
    pub raw_lines: usize,
    pub lines: usize,
    pub cost_model: String,
    pub folds: Vec<FoldStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates_removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dangles_removed: Option<usize>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn new(outcome: &AllPairsOutcome, path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            layer: outcome.output.clone(),
            points: outcome.points,
            iterations: outcome.iterations,
            raw_lines: outcome.raw_lines,
            lines: outcome.lines,
            cost_model: outcome.model.to_string(),
            folds: outcome.folds.clone(),
            duplicates_removed: outcome.clean_report.map(|r| r.duplicates_removed),
            dangles_removed: outcome.clean_report.map(|r| r.dangles_removed),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Render a summary in text format.
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "All-pairs network written to {} (layer {}):",
        summary.path, summary.layer
    );
    let _ = writeln!(out, "  points: {}", summary.points);
    let _ = writeln!(out, "  iterations: {}", summary.iterations);
    let _ = writeln!(out, "  raw traced lines: {}", summary.raw_lines);
    let _ = writeln!(out, "  delivered lines: {}", summary.lines);
    let _ = writeln!(out, "  cost model: {}", summary.cost_model);
    if let (Some(duplicates), Some(dangles)) = (summary.duplicates_removed, summary.dangles_removed)
    {
        let _ = writeln!(
            out,
            "  removed: {duplicates} duplicate(s), {dangles} degenerate line(s)"
        );
    }
    for warning in &summary.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

/// Render a summary as pretty-printed JSON.
pub fn render_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize run summary")
}

/// Write the delivered network as a GeoJSON `FeatureCollection`.
pub fn write_geojson(path: &Path, layer: &VectorLayer, name: &str) -> Result<()> {
    let document = layer.to_geojson(name);
    let text = serde_json::to_string_pretty(&document).context("failed to serialize network")?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Layer name derived from an output path: its file stem.
pub fn layer_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a layer name from {}", path.display()))
}
