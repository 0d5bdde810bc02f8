use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the all-pairs library.
pub type Result<T> = std::result::Result<T, Error>;

/// External collaborator that an engine failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    CostField,
    PathTracing,
    Merge,
    Clean,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EngineKind::CostField => "cost-field",
            EngineKind::PathTracing => "path-tracing",
            EngineKind::Merge => "merge",
            EngineKind::Clean => "clean",
        };
        f.write_str(value)
    }
}

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer than two input points were supplied; raised before any engine runs.
    #[error("there are too few or no point features in the input ({found}); at least two are required")]
    InsufficientInput { found: usize },

    /// An external engine call failed during an iteration.
    #[error("{engine} engine failed during iteration {iteration}: {source}")]
    EngineInvocation {
        engine: EngineKind,
        iteration: usize,
        #[source]
        source: Box<Error>,
    },

    /// The assembler could not fold an iteration's lines into the network.
    #[error("failed to merge traced lines of iteration {iteration} into the network: {source}")]
    Merge {
        iteration: usize,
        #[source]
        source: Box<Error>,
    },

    /// Raised by engines for failures that have no more specific variant.
    #[error("{0}")]
    Engine(String),

    /// Run configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A name is reserved for the running network or transient slots.
    #[error("layer name {name} is reserved for internal artifacts")]
    ReservedName { name: String },

    /// A named artifact was expected in the workspace but is absent.
    #[error("artifact {name} not found in workspace")]
    ArtifactMissing { name: String },

    /// A named artifact already exists and overwriting was not requested.
    #[error("artifact {name} already exists in workspace")]
    ArtifactExists { name: String },

    /// A raster artifact had a different kind than the caller expected.
    #[error("artifact {name} is not a {expected} raster")]
    ArtifactKind { name: String, expected: &'static str },

    /// The assembler received iterations out of sequence.
    #[error("assembler expected iteration {expected}, got {found}")]
    AssemblerSequence { expected: usize, found: usize },

    /// The finisher was asked to deliver a network that was never fully assembled.
    #[error("network is incomplete after {iterations} of {total} iterations")]
    IncompleteNetwork { iterations: usize, total: usize },

    /// A coordinate does not fall inside the raster region.
    #[error("coordinate ({x}, {y}) lies outside the raster region")]
    CoordinateOutsideRegion { x: f64, y: f64 },

    /// The source cell carries no friction value.
    #[error("source coordinate ({x}, {y}) lies on a no-data cell")]
    SourceOnNoData { x: f64, y: f64 },

    /// Two rasters that must share a region do not.
    #[error("raster {name} does not match the friction raster region")]
    RegionMismatch { name: String },

    /// Raster text could not be parsed.
    #[error("invalid raster {path}: {message}")]
    InvalidRaster { path: PathBuf, message: String },

    /// Point input could not be parsed.
    #[error("invalid point input at record {record}: {message}")]
    InvalidPoints { record: usize, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an engine failure with the engine and iteration it occurred in.
    pub fn engine_invocation(engine: EngineKind, iteration: usize, source: Error) -> Self {
        Error::EngineInvocation {
            engine,
            iteration,
            source: Box::new(source),
        }
    }

    /// Wrap a merge failure with the iteration that was being folded.
    pub fn merge(iteration: usize, source: Error) -> Self {
        Error::Merge {
            iteration,
            source: Box::new(source),
        }
    }
}
