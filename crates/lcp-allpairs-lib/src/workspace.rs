//! Named artifact store shared by the engines of a run.
//!
//! The running network lives under [`NETWORK_NAME`]. Every iteration works in
//! its own [`IterationSlots`]: three fixed raster slots that successive
//! iterations overwrite, plus an iteration-scoped line slot. None of these
//! names can ever alias the network or a caller-chosen output name.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::vector::VectorLayer;

/// Stable name of the running merged network.
pub const NETWORK_NAME: &str = "network";
/// Slot for the cumulative cost raster of the current iteration.
pub const COST_SLOT: &str = "cost_cumul";
/// Slot for the movement direction raster of the current iteration.
pub const DIRECTION_SLOT: &str = "movement_dir";
/// Slot for the raster of cells visited while tracing paths.
pub const DRAIN_RASTER_SLOT: &str = "drain_rast";
/// Prefix of the per-iteration traced line slots.
pub const DRAIN_LINES_PREFIX: &str = "drain_lines_";

/// Raster artifact kinds held in the workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterLayer {
    /// Continuous values such as cumulative cost.
    Float(Raster<f64>),
    /// Small integer codes such as movement directions or path masks.
    Code(Raster<u8>),
}

/// Whether `name` is reserved for the network or a transient slot.
pub fn is_reserved(name: &str) -> bool {
    name == NETWORK_NAME
        || name == COST_SLOT
        || name == DIRECTION_SLOT
        || name == DRAIN_RASTER_SLOT
        || name.starts_with(DRAIN_LINES_PREFIX)
}

/// Reject caller-supplied layer names that collide with internal artifacts.
pub fn validate_output_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidConfiguration {
            message: "output name must not be empty".to_string(),
        });
    }
    if is_reserved(name) {
        return Err(Error::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Names of the transient artifacts owned by one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSlots {
    pub iteration: usize,
    pub cost: String,
    pub direction: String,
    pub drain_raster: String,
    pub lines: String,
}

impl IterationSlots {
    pub fn for_iteration(iteration: usize) -> Self {
        Self {
            iteration,
            cost: COST_SLOT.to_string(),
            direction: DIRECTION_SLOT.to_string(),
            drain_raster: DRAIN_RASTER_SLOT.to_string(),
            lines: format!("{DRAIN_LINES_PREFIX}{iteration}"),
        }
    }

    pub fn names(&self) -> [&str; 4] {
        [
            self.cost.as_str(),
            self.direction.as_str(),
            self.drain_raster.as_str(),
            self.lines.as_str(),
        ]
    }
}

/// In-memory store of named raster and vector artifacts.
#[derive(Debug, Default)]
pub struct Workspace {
    rasters: BTreeMap<String, RasterLayer>,
    vectors: BTreeMap<String, VectorLayer>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raster(&mut self, name: &str, layer: RasterLayer, overwrite: bool) -> Result<()> {
        if !overwrite && self.rasters.contains_key(name) {
            return Err(Error::ArtifactExists {
                name: name.to_string(),
            });
        }
        self.rasters.insert(name.to_string(), layer);
        Ok(())
    }

    pub fn raster(&self, name: &str) -> Result<&RasterLayer> {
        self.rasters.get(name).ok_or_else(|| missing(name))
    }

    pub fn float_raster(&self, name: &str) -> Result<&Raster<f64>> {
        match self.raster(name)? {
            RasterLayer::Float(raster) => Ok(raster),
            RasterLayer::Code(_) => Err(Error::ArtifactKind {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }

    pub fn code_raster(&self, name: &str) -> Result<&Raster<u8>> {
        match self.raster(name)? {
            RasterLayer::Code(raster) => Ok(raster),
            RasterLayer::Float(_) => Err(Error::ArtifactKind {
                name: name.to_string(),
                expected: "code",
            }),
        }
    }

    pub fn remove_raster(&mut self, name: &str) -> Option<RasterLayer> {
        self.rasters.remove(name)
    }

    pub fn insert_vector(&mut self, name: &str, layer: VectorLayer, overwrite: bool) -> Result<()> {
        if !overwrite && self.vectors.contains_key(name) {
            return Err(Error::ArtifactExists {
                name: name.to_string(),
            });
        }
        self.vectors.insert(name.to_string(), layer);
        Ok(())
    }

    pub fn vector(&self, name: &str) -> Result<&VectorLayer> {
        self.vectors.get(name).ok_or_else(|| missing(name))
    }

    pub fn vector_mut(&mut self, name: &str) -> Result<&mut VectorLayer> {
        self.vectors.get_mut(name).ok_or_else(|| missing(name))
    }

    pub fn remove_vector(&mut self, name: &str) -> Option<VectorLayer> {
        self.vectors.remove(name)
    }

    /// Move a vector layer to a new name, replacing any layer already there.
    pub fn rename_vector(&mut self, from: &str, to: &str) -> Result<()> {
        let layer = self.vectors.remove(from).ok_or_else(|| missing(from))?;
        self.vectors.insert(to.to_string(), layer);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rasters.contains_key(name) || self.vectors.contains_key(name)
    }

    pub fn raster_names(&self) -> impl Iterator<Item = &str> {
        self.rasters.keys().map(String::as_str)
    }

    pub fn vector_names(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(String::as_str)
    }

    /// Every artifact name currently held, rasters and vectors together.
    pub fn names(&self) -> BTreeSet<&str> {
        self.raster_names().chain(self.vector_names()).collect()
    }

    /// Drop the transient artifacts of an iteration. The line slot is kept
    /// when `keep_lines` is set because the assembler still needs it.
    pub fn release(&mut self, slots: &IterationSlots, keep_lines: bool) {
        self.rasters.remove(&slots.cost);
        self.rasters.remove(&slots.direction);
        self.rasters.remove(&slots.drain_raster);
        if !keep_lines {
            self.vectors.remove(&slots.lines);
        }
        tracing::trace!(iteration = slots.iteration, keep_lines, "released iteration slots");
    }
}

fn missing(name: &str) -> Error {
    Error::ArtifactMissing {
        name: name.to_string(),
    }
}
