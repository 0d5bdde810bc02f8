//! All-pairs least-cost path network library.
//!
//! This crate loads point locations and cost rasters, runs one cost
//! accumulation per point, traces least-cost lines between every pair, and
//! assembles them into a single cleaned line network. Higher-level consumers
//! (the CLI) should only depend on the items exported here instead of
//! reimplementing behavior.
//!

pub mod allpairs;
pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod finisher;
pub mod points;
pub mod raster;
pub mod vector;
pub mod workspace;

pub use allpairs::{run_allpairs, AllPairsOutcome, AllPairsRequest};
pub use assembler::{FoldStep, IterationScope, NetworkAssembler, NetworkState};
pub use config::{CostModel, RunConfig, RunWarning, WalkingCoefficients, DEFAULT_MEMORY_MB};
pub use engine::{
    CleanEngine, CleanReport, CleanTool, CostFieldEngine, CostRequest, CostSurface, Drainage,
    Engines, MergeEngine, PatchMode, PathTracer,
};
pub use error::{EngineKind, Error, Result};
pub use finisher::Finisher;
pub use points::{load_points, read_points, Point, PointId, PointSet};
pub use raster::{parse_ascii_grid, read_ascii_grid, Region, Raster};
pub use vector::{AttributeTable, VectorLayer};
pub use workspace::{IterationSlots, RasterLayer, Workspace, NETWORK_NAME};
