//! Engine seams used by the all-pairs run.
//!
//! The run talks to four collaborators through traits so that each can be
//! swapped independently:
//! - [`CostFieldEngine`] - cumulative cost and movement direction from one source
//! - [`PathTracer`] - least-cost lines from stop points back to that source
//! - [`MergeEngine`] - union of line layers held in the [`Workspace`]
//! - [`CleanEngine`] - removal of degenerate and duplicate lines
//!
//! [`Engines::native`] wires up the in-process implementations.

mod clean;
mod cost;
mod drain;
mod patch;

pub use clean::{CleanReport, CleanTool, NativeClean, NETWORK_CLEAN};
pub use cost::{NativeCostField, NEIGHBOURS};
pub use drain::NativeDrain;
pub use patch::{NativePatch, PatchMode};

use std::sync::Arc;

use geo::Coord;

use crate::config::CostModel;
use crate::error::Result;
use crate::raster::Raster;
use crate::vector::VectorLayer;
use crate::workspace::Workspace;

/// Inputs for one cost-field computation.
#[derive(Debug, Clone, Copy)]
pub struct CostRequest<'a> {
    pub friction: &'a Raster<f64>,
    /// Required when `model` is [`CostModel::Walking`].
    pub elevation: Option<&'a Raster<f64>>,
    pub model: CostModel,
    pub source: Coord<f64>,
    pub stops: &'a [Coord<f64>],
    pub max_cost: Option<f64>,
    pub memory_mb: usize,
    pub knight_moves: bool,
}

/// Cumulative cost and direction fields rooted at one source.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSurface {
    /// Cumulative cost per cell; NaN where the cell was not reached.
    pub cumulative: Raster<f64>,
    /// Direction code per cell: `0` at the source and unreached cells,
    /// otherwise `k` such that `NEIGHBOURS[k - 1]` steps toward the source.
    pub direction: Raster<u8>,
}

/// Result of tracing every stop back to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Drainage {
    /// One line per stop inside the region, in stop order.
    pub lines: VectorLayer,
    /// Cells visited by any traced path set to `1`.
    pub raster: Raster<u8>,
}

/// Accumulates traversal cost outward from a single source.
pub trait CostFieldEngine: Send + Sync {
    fn accumulate(&self, request: &CostRequest<'_>) -> Result<CostSurface>;
}

/// Follows a direction field downhill from stop points to its source.
pub trait PathTracer: Send + Sync {
    fn trace(
        &self,
        cumulative: &Raster<f64>,
        direction: &Raster<u8>,
        stops: &[Coord<f64>],
    ) -> Result<Drainage>;
}

/// Unions named line layers held in the workspace.
pub trait MergeEngine: Send + Sync {
    /// Merge `inputs` into `output`. In [`PatchMode::Append`] the output
    /// must already exist and is extended in place.
    fn patch(
        &self,
        workspace: &mut Workspace,
        inputs: &[&str],
        output: &str,
        mode: PatchMode,
    ) -> Result<()>;
}

/// Removes unwanted line geometry from a named layer.
pub trait CleanEngine: Send + Sync {
    /// Write the cleaned copy of `input` to `output`, overwriting it.
    fn clean(
        &self,
        workspace: &mut Workspace,
        input: &str,
        output: &str,
        tools: &[CleanTool],
    ) -> Result<CleanReport>;
}

/// The set of collaborators used by a run.
#[derive(Clone)]
pub struct Engines {
    pub cost: Arc<dyn CostFieldEngine>,
    pub tracer: Arc<dyn PathTracer>,
    pub merge: Arc<dyn MergeEngine>,
    pub clean: Arc<dyn CleanEngine>,
}

impl Engines {
    /// In-process engines for every collaborator.
    pub fn native() -> Self {
        Self {
            cost: Arc::new(NativeCostField),
            tracer: Arc::new(NativeDrain),
            merge: Arc::new(NativePatch),
            clean: Arc::new(NativeClean),
        }
    }
}

impl Default for Engines {
    fn default() -> Self {
        Self::native()
    }
}
