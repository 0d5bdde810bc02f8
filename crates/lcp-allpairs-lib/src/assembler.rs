//! Incremental assembly of traced line batches into one running network.
//!
//! The network moves through an explicit state machine:
//!
//! ```text
//! N > 2:   Empty --seed(1)--> Seeded --base merge(2)--> Merged --append(i > 2)--> Merged
//! N == 2:  Empty --replace(1)--> Pair --replace(2)--> Pair
//! ```
//!
//! With two points each iteration discards the previous network and keeps the
//! cleaned batch of the most recent source only.
//!
//! Transient artifacts are confined to an [`IterationScope`], which releases
//! its slots when dropped, whether the iteration succeeded or not.

use std::sync::Arc;

use serde::Serialize;

use crate::engine::{
    CleanEngine, CostSurface, Drainage, Engines, MergeEngine, PatchMode, NETWORK_CLEAN,
};
use crate::error::{EngineKind, Error, Result};
use crate::raster::Raster;
use crate::workspace::{IterationSlots, RasterLayer, Workspace, NETWORK_NAME};

/// How one iteration's batch was folded into the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStep {
    /// First batch held as-is, not yet merged.
    Seed,
    /// First and second batches merged into a new network layer.
    BaseMerge,
    /// Batch appended to the existing network in place.
    Append,
    /// Network replaced by the cleaned batch (two-point runs).
    Replace,
}

/// State of the running network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkState {
    Empty,
    /// First batch retained under its iteration-scoped name.
    Seeded { seed: String },
    /// Network layer exists under [`NETWORK_NAME`].
    Merged,
    /// Two-point run; [`NETWORK_NAME`] holds the latest cleaned batch.
    Pair,
}

/// Owner of the running network and of every per-iteration slot.
pub struct NetworkAssembler<'w> {
    workspace: &'w mut Workspace,
    merge: Arc<dyn MergeEngine>,
    clean: Arc<dyn CleanEngine>,
    total_points: usize,
    completed: usize,
    state: NetworkState,
    folds: Vec<FoldStep>,
}

impl<'w> NetworkAssembler<'w> {
    pub fn new(workspace: &'w mut Workspace, engines: &Engines, total_points: usize) -> Result<Self> {
        if total_points < 2 {
            return Err(Error::InsufficientInput {
                found: total_points,
            });
        }
        if workspace.contains(NETWORK_NAME) {
            return Err(Error::ArtifactExists {
                name: NETWORK_NAME.to_string(),
            });
        }
        Ok(Self {
            workspace,
            merge: Arc::clone(&engines.merge),
            clean: Arc::clone(&engines.clean),
            total_points,
            completed: 0,
            state: NetworkState::Empty,
            folds: Vec::with_capacity(total_points),
        })
    }

    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Number of iterations folded so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// Fold steps taken so far, one per completed iteration.
    pub fn folds(&self) -> &[FoldStep] {
        &self.folds
    }

    pub fn workspace(&self) -> &Workspace {
        &*self.workspace
    }

    pub(crate) fn workspace_mut(&mut self) -> &mut Workspace {
        &mut *self.workspace
    }

    /// Open the slots for the next iteration. Iterations are 1-based and must
    /// arrive in order.
    pub fn begin(&mut self, iteration: usize) -> Result<IterationScope<'_, 'w>> {
        let expected = self.completed + 1;
        if iteration != expected || iteration > self.total_points {
            return Err(Error::AssemblerSequence {
                expected,
                found: iteration,
            });
        }
        let slots = IterationSlots::for_iteration(iteration);
        if slots.names().contains(&NETWORK_NAME) {
            return Err(Error::ReservedName {
                name: NETWORK_NAME.to_string(),
            });
        }
        Ok(IterationScope {
            assembler: self,
            slots,
            keep_lines: false,
            folded: false,
        })
    }

    /// Fold the batch stored in `slots` into the network. Returns the step
    /// taken and whether the batch must outlive its iteration.
    fn fold(&mut self, slots: &IterationSlots) -> Result<(FoldStep, bool)> {
        let iteration = slots.iteration;
        let batch = slots.lines.as_str();
        // Surface a missing batch before touching any state.
        self.workspace.vector(batch)?;

        if self.total_points == 2 {
            self.clean
                .clean(&mut *self.workspace, batch, NETWORK_NAME, &NETWORK_CLEAN)
                .map_err(|error| Error::engine_invocation(EngineKind::Clean, iteration, error))?;
            self.state = NetworkState::Pair;
            return Ok((FoldStep::Replace, false));
        }

        match &self.state {
            NetworkState::Empty => {
                self.state = NetworkState::Seeded {
                    seed: batch.to_string(),
                };
                Ok((FoldStep::Seed, true))
            }
            NetworkState::Seeded { seed } => {
                let seed = seed.clone();
                self.merge
                    .patch(
                        &mut *self.workspace,
                        &[seed.as_str(), batch],
                        NETWORK_NAME,
                        PatchMode::Base,
                    )
                    .map_err(|error| Error::merge(iteration, error))?;
                self.workspace.remove_vector(&seed);
                self.state = NetworkState::Merged;
                Ok((FoldStep::BaseMerge, false))
            }
            NetworkState::Merged => {
                self.merge
                    .patch(&mut *self.workspace, &[batch], NETWORK_NAME, PatchMode::Append)
                    .map_err(|error| Error::merge(iteration, error))?;
                Ok((FoldStep::Append, false))
            }
            NetworkState::Pair => Err(Error::AssemblerSequence {
                expected: self.completed + 1,
                found: iteration,
            }),
        }
    }
}

/// Transient storage of a single iteration.
///
/// Dropping the scope releases the cost, direction and drain rasters, and the
/// traced lines unless the assembler retained them as the network seed.
pub struct IterationScope<'a, 'w> {
    assembler: &'a mut NetworkAssembler<'w>,
    slots: IterationSlots,
    keep_lines: bool,
    folded: bool,
}

impl IterationScope<'_, '_> {
    pub fn slots(&self) -> &IterationSlots {
        &self.slots
    }

    pub fn iteration(&self) -> usize {
        self.slots.iteration
    }

    /// Store the cost field in this iteration's raster slots, overwriting
    /// whatever the previous iteration left there.
    pub fn store_surface(&mut self, surface: CostSurface) -> Result<()> {
        let workspace = self.assembler.workspace_mut();
        workspace.insert_raster(&self.slots.cost, RasterLayer::Float(surface.cumulative), true)?;
        workspace.insert_raster(&self.slots.direction, RasterLayer::Code(surface.direction), true)
    }

    /// Cumulative cost and direction rasters stored for this iteration.
    pub fn surface(&self) -> Result<(&Raster<f64>, &Raster<u8>)> {
        let workspace = self.assembler.workspace();
        Ok((
            workspace.float_raster(&self.slots.cost)?,
            workspace.code_raster(&self.slots.direction)?,
        ))
    }

    /// Store the traced lines and drain raster. Returns the number of lines.
    pub fn store_drainage(&mut self, drainage: Drainage) -> Result<usize> {
        let count = drainage.lines.len();
        let workspace = self.assembler.workspace_mut();
        workspace.insert_raster(&self.slots.drain_raster, RasterLayer::Code(drainage.raster), true)?;
        workspace.insert_vector(&self.slots.lines, drainage.lines, false)?;
        Ok(count)
    }

    /// Fold this iteration's stored lines into the running network.
    pub fn accumulate(&mut self) -> Result<FoldStep> {
        if self.folded {
            return Err(Error::AssemblerSequence {
                expected: self.slots.iteration + 1,
                found: self.slots.iteration,
            });
        }
        let (step, keep_lines) = self.assembler.fold(&self.slots)?;
        self.keep_lines = keep_lines;
        self.folded = true;
        self.assembler.completed += 1;
        self.assembler.folds.push(step);
        tracing::debug!(iteration = self.slots.iteration, ?step, "folded traced lines");
        Ok(step)
    }

    /// Release this iteration's transient artifacts now.
    pub fn release(self) {}
}

impl Drop for IterationScope<'_, '_> {
    fn drop(&mut self) {
        self.assembler
            .workspace_mut()
            .release(&self.slots, self.keep_lines);
    }
}
