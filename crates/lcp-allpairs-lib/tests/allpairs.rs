mod common;

use common::{
    fixture_path, fixture_raster, recording_engines, recording_engines_failing_on,
    recording_engines_with, InjectedFailure,
};
use geo::Coord;
use lcp_allpairs_lib::engine::{NativeClean, NETWORK_CLEAN};
use lcp_allpairs_lib::{
    load_points, run_allpairs, AllPairsRequest, CleanEngine, CostModel, EngineKind, Engines, Error,
    FoldStep,
    IterationSlots, PointSet, RunConfig, RunWarning, VectorLayer, Workspace, NETWORK_NAME,
};

fn endpoints(layer: &VectorLayer) -> Vec<((f64, f64), (f64, f64))> {
    let mut pairs: Vec<_> = layer
        .lines()
        .iter()
        .map(|line| {
            let first = line.0.first().copied().expect("line has vertices");
            let last = line.0.last().copied().expect("line has vertices");
            let (a, b) = ((first.x, first.y), (last.x, last.y));
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        })
        .collect();
    pairs.sort_by(|l, r| l.partial_cmp(r).expect("finite coordinates"));
    pairs
}

#[test]
fn three_points_yield_three_distinct_paths() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines();
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let outcome = run_allpairs(&mut workspace, &request, &engines).expect("run succeeds");

    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.raw_lines, 9);
    assert_eq!(
        outcome.folds,
        vec![FoldStep::Seed, FoldStep::BaseMerge, FoldStep::Append]
    );
    assert_eq!(outcome.lines, 3);
    let report = outcome.clean_report.expect("merged network is cleaned");
    assert_eq!(report.input_lines, 9);
    assert_eq!(report.dangles_removed, 3);
    assert_eq!(report.duplicates_removed, 3);

    let delivered = workspace.vector("paths").expect("output exists");
    assert_eq!(
        endpoints(delivered),
        vec![
            ((0.5, 0.5), (10.5, 0.5)),
            ((0.5, 0.5), (10.5, 10.5)),
            ((10.5, 0.5), (10.5, 10.5)),
        ]
    );

    assert_eq!(log.count("cost"), 3);
    assert_eq!(log.count("trace"), 3);
    assert_eq!(
        log.entries()
            .into_iter()
            .filter(|e| e.starts_with("patch") || e.starts_with("clean"))
            .collect::<Vec<_>>(),
        vec![
            "patch Base drain_lines_1+drain_lines_2 -> network".to_string(),
            "patch Append drain_lines_3 -> network".to_string(),
            "clean network -> paths".to_string(),
        ]
    );
}

#[test]
fn successful_run_leaves_only_the_output() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    run_allpairs(&mut workspace, &request, &Engines::native()).expect("run succeeds");

    let names: Vec<_> = workspace.names().into_iter().collect();
    assert_eq!(names, vec!["paths"]);
    let table = workspace
        .vector("paths")
        .unwrap()
        .table()
        .expect("attribute table attached");
    assert_eq!(table.columns, vec!["cat".to_string()]);
}

#[test]
fn cleaning_the_delivered_network_again_changes_nothing() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    run_allpairs(&mut workspace, &request, &Engines::native()).expect("run succeeds");
    let before = workspace.vector("paths").unwrap().lines().to_vec();

    let report = NativeClean
        .clean(&mut workspace, "paths", "paths_again", &NETWORK_CLEAN)
        .expect("clean succeeds");
    assert!(report.is_noop());
    assert_eq!(workspace.vector("paths_again").unwrap().lines(), &before[..]);
}

#[test]
fn two_points_keep_only_the_second_direction() {
    let points = load_points(&fixture_path("points_pair.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let elevation = fixture_raster("elevation_ramp.asc");
    let (engines, log) = recording_engines();
    let mut workspace = Workspace::new();

    let config = RunConfig {
        walking: true,
        ..RunConfig::default()
    };
    let request = AllPairsRequest::new(&points, &friction, "paths")
        .with_elevation(&elevation)
        .with_config(config);
    let outcome = run_allpairs(&mut workspace, &request, &engines).expect("run succeeds");

    assert!(outcome.model.is_walking());
    assert_eq!(outcome.folds, vec![FoldStep::Replace, FoldStep::Replace]);
    assert!(outcome.clean_report.is_none());
    assert_eq!(log.count("patch"), 0);
    assert_eq!(log.count("clean drain_lines_"), 2);

    // Traced toward B, the source of iteration 2: the line runs from A to B.
    let delivered = workspace.vector("paths").expect("output exists");
    assert_eq!(delivered.len(), 1);
    let line = &delivered.lines()[0];
    assert_eq!(line.0.first().copied(), Some(Coord { x: 0.5, y: 5.5 }));
    assert_eq!(line.0.last().copied(), Some(Coord { x: 10.5, y: 5.5 }));
    assert_eq!(line.0.len(), 11);
}

#[test]
fn single_point_fails_before_any_engine_call() {
    let points = load_points(&fixture_path("points_single.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines();
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("too few points");

    assert!(matches!(error, Error::InsufficientInput { found: 1 }));
    assert!(log.entries().is_empty());
    assert!(workspace.names().is_empty());
}

#[test]
fn walking_without_elevation_warns_once_and_uses_plain_cost() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines();
    let mut workspace = Workspace::new();

    let config = RunConfig {
        walking: true,
        ..RunConfig::default()
    };
    let request = AllPairsRequest::new(&points, &friction, "paths").with_config(config);
    let outcome = run_allpairs(&mut workspace, &request, &engines).expect("run succeeds");

    assert_eq!(outcome.model, CostModel::Isotropic);
    assert_eq!(
        outcome.warnings,
        vec![RunWarning::WalkingModelWithoutElevation]
    );
    assert_eq!(log.count("cost cost"), 3);
    assert_eq!(outcome.lines, 3);
}

#[test]
fn merge_failure_keeps_partial_network_for_diagnostics() {
    let points = PointSet::from_coords([(0.5, 0.5), (10.5, 0.5), (10.5, 10.5), (0.5, 10.5)]);
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, _log) = recording_engines_failing_on(Some("drain_lines_3"));
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("merge fails");

    assert!(matches!(error, Error::Merge { iteration: 3, .. }));
    let names: Vec<_> = workspace.names().into_iter().collect();
    assert_eq!(names, vec![NETWORK_NAME]);
    // Batches 1 and 2, four raw lines each.
    assert_eq!(workspace.vector(NETWORK_NAME).unwrap().len(), 8);
}

#[test]
fn cost_field_failure_names_engine_and_iteration() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines_with(InjectedFailure::CostCall(2));
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("cost field fails");

    assert!(matches!(
        error,
        Error::EngineInvocation {
            engine: EngineKind::CostField,
            iteration: 2,
            ..
        }
    ));
    assert_eq!(log.count("cost"), 2);
    assert_eq!(log.count("trace"), 1);
    assert_eq!(log.count("patch"), 0);
    // Only the seed batch of iteration 1 survives; no output is written.
    let names: Vec<_> = workspace.names().into_iter().collect();
    assert_eq!(names, vec!["drain_lines_1"]);
}

#[test]
fn path_tracing_failure_releases_iteration_slots() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines_with(InjectedFailure::TraceCall(2));
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("tracing fails");

    assert!(matches!(
        error,
        Error::EngineInvocation {
            engine: EngineKind::PathTracing,
            iteration: 2,
            ..
        }
    ));
    assert_eq!(log.count("trace"), 2);
    assert_eq!(log.count("clean"), 0);
    // The cost and direction rasters stored for iteration 2 are gone.
    let slots = IterationSlots::for_iteration(2);
    for name in slots.names() {
        assert!(!workspace.contains(name), "{name} left behind");
    }
    let names: Vec<_> = workspace.names().into_iter().collect();
    assert_eq!(names, vec!["drain_lines_1"]);
    assert!(!workspace.contains("paths"));
}

#[test]
fn two_point_failure_leaves_nothing_behind() {
    let points = load_points(&fixture_path("points_pair.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, _log) = recording_engines_with(InjectedFailure::CostCall(1));
    let mut workspace = Workspace::new();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("cost field fails");

    assert!(matches!(
        error,
        Error::EngineInvocation {
            engine: EngineKind::CostField,
            iteration: 1,
            ..
        }
    ));
    assert!(workspace.names().is_empty());
}

#[test]
fn existing_output_layer_is_not_overwritten() {
    let points = load_points(&fixture_path("points_triangle.csv")).expect("points load");
    let friction = fixture_raster("friction_uniform.asc");
    let (engines, log) = recording_engines();
    let mut workspace = Workspace::new();
    workspace
        .insert_vector("paths", VectorLayer::default(), false)
        .unwrap();

    let request = AllPairsRequest::new(&points, &friction, "paths");
    let error = run_allpairs(&mut workspace, &request, &engines).expect_err("output exists");

    assert!(matches!(error, Error::ArtifactExists { .. }));
    assert!(log.entries().is_empty());
}

#[test]
fn iteration_slots_never_alias_the_network() {
    for iteration in 1..=64 {
        let current = IterationSlots::for_iteration(iteration);
        let next = IterationSlots::for_iteration(iteration + 1);
        assert!(!current.names().contains(&NETWORK_NAME));
        assert!(!next.names().contains(&NETWORK_NAME));
        assert_ne!(current.lines, next.lines);
    }
}
