#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use geo::Coord;
use lcp_allpairs_lib::engine::{NativeClean, NativeCostField, NativeDrain, NativePatch};
use lcp_allpairs_lib::{
    read_ascii_grid, CleanEngine, CleanReport, CleanTool, CostFieldEngine, CostRequest,
    CostSurface, Drainage, Engines, Error, MergeEngine, PatchMode, PathTracer, Raster, Result,
    Workspace,
};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_raster(name: &str) -> Raster<f64> {
    read_ascii_grid(&fixtures_dir().join(name)).expect("fixture raster loads")
}

pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Log of every engine call made during a run, in order.
#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn record(&self, entry: String) {
        self.0.lock().expect("call log lock").push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("call log lock").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

struct RecordingCost {
    log: CallLog,
    fail_on_call: Option<usize>,
}

impl CostFieldEngine for RecordingCost {
    fn accumulate(&self, request: &CostRequest<'_>) -> Result<CostSurface> {
        self.log.record(format!(
            "cost {} {} {}",
            request.model, request.source.x, request.source.y
        ));
        if self.fail_on_call == Some(self.log.count("cost")) {
            return Err(Error::Engine("cost surface not written".to_string()));
        }
        NativeCostField.accumulate(request)
    }
}

struct RecordingTracer {
    log: CallLog,
    fail_on_call: Option<usize>,
}

impl PathTracer for RecordingTracer {
    fn trace(
        &self,
        cumulative: &Raster<f64>,
        direction: &Raster<u8>,
        stops: &[Coord<f64>],
    ) -> Result<Drainage> {
        self.log.record(format!("trace {}", stops.len()));
        if self.fail_on_call == Some(self.log.count("trace")) {
            return Err(Error::Engine("drain lines not written".to_string()));
        }
        NativeDrain.trace(cumulative, direction, stops)
    }
}

struct RecordingMerge {
    log: CallLog,
    fail_on_input: Option<String>,
}

impl MergeEngine for RecordingMerge {
    fn patch(
        &self,
        workspace: &mut Workspace,
        inputs: &[&str],
        output: &str,
        mode: PatchMode,
    ) -> Result<()> {
        self.log
            .record(format!("patch {:?} {} -> {output}", mode, inputs.join("+")));
        if let Some(name) = &self.fail_on_input {
            if inputs.contains(&name.as_str()) {
                return Err(Error::Engine(format!("cannot write {output}")));
            }
        }
        NativePatch.patch(workspace, inputs, output, mode)
    }
}

struct RecordingClean(CallLog);

impl CleanEngine for RecordingClean {
    fn clean(
        &self,
        workspace: &mut Workspace,
        input: &str,
        output: &str,
        tools: &[CleanTool],
    ) -> Result<CleanReport> {
        self.0.record(format!("clean {input} -> {output}"));
        NativeClean.clean(workspace, input, output, tools)
    }
}

/// Where a recording run should break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure<'a> {
    None,
    /// The merge engine fails whenever the named layer is one of its inputs.
    MergeInput(&'a str),
    /// The n-th cost-field call fails, counting from 1.
    CostCall(usize),
    /// The n-th path-tracing call fails, counting from 1.
    TraceCall(usize),
}

/// Native engines wrapped so every call lands in the returned log.
pub fn recording_engines() -> (Engines, CallLog) {
    recording_engines_with(InjectedFailure::None)
}

/// Like [`recording_engines`], but the merge engine fails whenever the named
/// layer is one of its inputs.
pub fn recording_engines_failing_on(layer: Option<&str>) -> (Engines, CallLog) {
    recording_engines_with(layer.map_or(InjectedFailure::None, InjectedFailure::MergeInput))
}

/// Recording engines that break at the given point.
pub fn recording_engines_with(failure: InjectedFailure<'_>) -> (Engines, CallLog) {
    let log = CallLog::default();
    let (cost_call, trace_call, merge_input) = match failure {
        InjectedFailure::None => (None, None, None),
        InjectedFailure::MergeInput(layer) => (None, None, Some(layer.to_string())),
        InjectedFailure::CostCall(call) => (Some(call), None, None),
        InjectedFailure::TraceCall(call) => (None, Some(call), None),
    };
    let engines = Engines {
        cost: Arc::new(RecordingCost {
            log: log.clone(),
            fail_on_call: cost_call,
        }),
        tracer: Arc::new(RecordingTracer {
            log: log.clone(),
            fail_on_call: trace_call,
        }),
        merge: Arc::new(RecordingMerge {
            log: log.clone(),
            fail_on_input: merge_input,
        }),
        clean: Arc::new(RecordingClean(log.clone())),
    };
    (engines, log)
}
