//! All-pairs run orchestration.
//!
//! [`run_allpairs`] treats every input point in turn as a source, accumulates a
//! cost field from it, traces the least-cost line from every point back to it,
//! and folds that batch into the running network. The finished network is
//! cleaned once more and stored in the workspace under the requested name.
//!
//! # Example
//!
//! ```ignore
//! use lcp_allpairs_lib::{run_allpairs, AllPairsRequest, Engines, Workspace};
//!
//! let mut workspace = Workspace::new();
//! let request = AllPairsRequest::new(&points, &friction, "paths");
//! let outcome = run_allpairs(&mut workspace, &request, &Engines::native())?;
//! println!("{} lines from {} raw traces", outcome.lines, outcome.raw_lines);
//! ```

use geo::Coord;
use serde::Serialize;

use crate::assembler::{FoldStep, NetworkAssembler};
use crate::config::{CostModel, RunConfig, RunWarning};
use crate::engine::{CleanReport, CostRequest, Engines};
use crate::error::{EngineKind, Error, Result};
use crate::finisher::Finisher;
use crate::points::PointSet;
use crate::raster::Raster;
use crate::workspace::{validate_output_name, Workspace};

/// Inputs of one all-pairs run.
#[derive(Debug, Clone)]
pub struct AllPairsRequest<'a> {
    pub points: &'a PointSet,
    pub friction: &'a Raster<f64>,
    /// Elevation model for the walking cost model. Must share the friction region.
    pub elevation: Option<&'a Raster<f64>>,
    /// Name of the delivered line layer.
    pub output: String,
    pub config: RunConfig,
}

impl<'a> AllPairsRequest<'a> {
    pub fn new(points: &'a PointSet, friction: &'a Raster<f64>, output: impl Into<String>) -> Self {
        Self {
            points,
            friction,
            elevation: None,
            output: output.into(),
            config: RunConfig::default(),
        }
    }

    pub fn with_elevation(mut self, elevation: &'a Raster<f64>) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }
}

/// Summary of a completed run. The network itself lives in the workspace
/// under [`AllPairsOutcome::output`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllPairsOutcome {
    pub output: String,
    pub points: usize,
    pub model: CostModel,
    pub warnings: Vec<RunWarning>,
    pub iterations: usize,
    /// Lines traced across all iterations, before any cleaning.
    pub raw_lines: usize,
    pub folds: Vec<FoldStep>,
    /// Report of the final clean pass; absent for two-point runs.
    pub clean_report: Option<CleanReport>,
    /// Lines in the delivered layer.
    pub lines: usize,
}

/// Build the all-pairs least-cost network for `request`.
///
/// Input checks run before any engine is invoked. On failure the run stops at
/// the failing iteration: transient artifacts are released, and a network
/// that was already partially assembled stays in the workspace.
pub fn run_allpairs(
    workspace: &mut Workspace,
    request: &AllPairsRequest<'_>,
    engines: &Engines,
) -> Result<AllPairsOutcome> {
    let total = request.points.len();
    if total < 2 {
        return Err(Error::InsufficientInput { found: total });
    }
    validate_output_name(&request.output)?;
    if workspace.contains(&request.output) {
        return Err(Error::ArtifactExists {
            name: request.output.clone(),
        });
    }
    request.config.validate()?;

    let mut warnings = Vec::new();
    let (model, warning) = request.config.resolve_model(request.elevation.is_some());
    if let Some(warning) = warning {
        tracing::warn!("{warning}");
        warnings.push(warning);
    }
    // The elevation raster only matters to the walking model.
    let elevation = request.elevation.filter(|_| model.is_walking());
    if let Some(elevation) = elevation {
        if elevation.region() != request.friction.region() {
            return Err(Error::RegionMismatch {
                name: "elevation".to_string(),
            });
        }
    }

    let stops: Vec<Coord<f64>> = request.points.coords();
    let mut assembler = NetworkAssembler::new(workspace, engines, total)?;
    let mut raw_lines = 0;

    tracing::info!(points = total, %model, "creating individual least-cost paths");
    for (index, point) in request.points.iter().enumerate() {
        let iteration = index + 1;
        let span = tracing::debug_span!("iteration", iteration, source = point.id);
        let _guard = span.enter();

        let mut scope = assembler.begin(iteration)?;
        let cost_request = CostRequest {
            friction: request.friction,
            elevation,
            model,
            source: point.coord(),
            stops: &stops,
            max_cost: request.config.cost_limit(),
            memory_mb: request.config.memory_mb,
            knight_moves: request.config.knight_moves,
        };
        let surface = engines
            .cost
            .accumulate(&cost_request)
            .map_err(|error| Error::engine_invocation(EngineKind::CostField, iteration, error))?;
        scope.store_surface(surface)?;

        let drainage = {
            let (cumulative, direction) = scope.surface()?;
            engines
                .tracer
                .trace(cumulative, direction, &stops)
                .map_err(|error| Error::engine_invocation(EngineKind::PathTracing, iteration, error))?
        };
        raw_lines += scope.store_drainage(drainage)?;
        let step = scope.accumulate()?;
        tracing::debug!(?step, raw_lines, "iteration complete");
    }

    let iterations = assembler.completed();
    let folds = assembler.folds().to_vec();
    let clean_report = Finisher::new(engines).finish(assembler, &request.output)?;
    let lines = workspace.vector(&request.output)?.len();
    tracing::info!(output = %request.output, lines, "network delivered");

    Ok(AllPairsOutcome {
        output: request.output.clone(),
        points: total,
        model,
        warnings,
        iterations,
        raw_lines,
        folds,
        clean_report,
        lines,
    })
}
