use std::collections::HashSet;

use geo::{Euclidean, Length, LineString};
use serde::Serialize;

use crate::error::Result;
use crate::vector::VectorLayer;
use crate::workspace::Workspace;

use super::CleanEngine;

/// Cleaning operations understood by [`CleanEngine`] implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanTool {
    /// Drop zero-length fragments, such as the trace of a source to itself.
    RemoveDangles,
    /// Drop lines whose vertices repeat an earlier line, in either direction.
    RemoveDuplicates,
}

/// Tools applied whenever a traced network is cleaned.
pub const NETWORK_CLEAN: [CleanTool; 2] = [CleanTool::RemoveDangles, CleanTool::RemoveDuplicates];

/// Counts of what a clean pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub input_lines: usize,
    pub dangles_removed: usize,
    pub duplicates_removed: usize,
}

impl CleanReport {
    pub fn output_lines(&self) -> usize {
        self.input_lines - self.dangles_removed - self.duplicates_removed
    }

    pub fn is_noop(&self) -> bool {
        self.dangles_removed == 0 && self.duplicates_removed == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeClean;

impl CleanEngine for NativeClean {
    fn clean(
        &self,
        workspace: &mut Workspace,
        input: &str,
        output: &str,
        tools: &[CleanTool],
    ) -> Result<CleanReport> {
        let source = workspace.vector(input)?;
        let (cleaned, report) = clean_layer(source, tools);
        workspace.insert_vector(output, cleaned, true)?;
        tracing::debug!(
            input,
            output,
            removed_dangles = report.dangles_removed,
            removed_duplicates = report.duplicates_removed,
            "cleaned line layer"
        );
        Ok(report)
    }
}

/// Apply the cleaning tools to a layer, in order.
pub(crate) fn clean_layer(layer: &VectorLayer, tools: &[CleanTool]) -> (VectorLayer, CleanReport) {
    let mut report = CleanReport {
        input_lines: layer.len(),
        ..CleanReport::default()
    };
    let mut lines: Vec<LineString<f64>> = layer.lines().to_vec();

    for tool in tools {
        let before = lines.len();
        match tool {
            CleanTool::RemoveDangles => {
                lines.retain(|line| line.length::<Euclidean>() > 0.0);
                report.dangles_removed += before - lines.len();
            }
            CleanTool::RemoveDuplicates => {
                let mut seen = HashSet::new();
                lines.retain(|line| seen.insert(geometry_key(line)));
                report.duplicates_removed += before - lines.len();
            }
        }
    }

    (VectorLayer::new(lines), report)
}

/// Direction-independent identity of a line's vertex sequence.
fn geometry_key(line: &LineString<f64>) -> Vec<(u64, u64)> {
    let forward: Vec<(u64, u64)> = line
        .coords()
        .map(|c| (normalize(c.x).to_bits(), normalize(c.y).to_bits()))
        .collect();
    let mut backward = forward.clone();
    backward.reverse();
    forward.min(backward)
}

fn normalize(value: f64) -> f64 {
    // -0.0 and 0.0 are the same position.
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
