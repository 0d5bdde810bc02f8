use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lcp_allpairs_cli::output::{
    layer_name, render_json, render_text, write_geojson, OutputFormat, RunSummary,
};
use lcp_allpairs_lib::{
    load_points, read_ascii_grid, run_allpairs, AllPairsRequest, Engines, RunConfig,
    WalkingCoefficients, Workspace, DEFAULT_MEMORY_MB,
};

/// Creates an approximate all-pairs least-cost path network between points.
#[derive(Parser, Debug)]
#[command(author, version, about, allow_negative_numbers = true)]
struct Cli {
    /// Input points file (x,y per line).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Friction raster (ESRI ASCII grid).
    #[arg(long = "frict")]
    friction: PathBuf,

    /// Output network file (GeoJSON); its stem names the layer.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Use knight's moves; more accurate but slower.
    #[arg(short = 'k')]
    knight_moves: bool,

    /// Use the walking-energy cost model (needs --elev).
    #[arg(short = 'w')]
    walking: bool,

    /// Maximum cumulative cost; 0 means unbounded.
    #[arg(short = 'm', long = "max-cost", default_value_t = 0)]
    max_cost: u64,

    /// Memory budget for the cost engine in MB.
    #[arg(long = "memory", default_value_t = DEFAULT_MEMORY_MB)]
    memory_mb: usize,

    /// Elevation raster (ESRI ASCII grid) for the walking model.
    #[arg(long = "elev")]
    elevation: Option<PathBuf>,

    /// Walking coefficient for horizontal distance.
    #[arg(short = 'a', long = "walk-a", default_value_t = 0.72)]
    walk_a: f64,

    /// Walking coefficient for uphill climb.
    #[arg(short = 'b', long = "walk-b", default_value_t = 6.0)]
    walk_b: f64,

    /// Walking coefficient for moderate descent.
    #[arg(short = 'c', long = "walk-c", default_value_t = 1.9998)]
    walk_c: f64,

    /// Walking coefficient for steep descent.
    #[arg(short = 'd', long = "walk-d", default_value_t = -1.9998)]
    walk_d: f64,

    /// Weight of the friction cost in the walking model.
    #[arg(short = 'l', long = "lambda", default_value_t = 1.0)]
    lambda: f64,

    /// Slope separating moderate from steep descent.
    #[arg(short = 's', long = "slope-factor", default_value_t = -0.2125)]
    slope_factor: f64,

    /// Replace the output file if it exists.
    #[arg(long = "overwrite")]
    overwrite: bool,

    /// Summary format printed after the run.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            max_cost: self.max_cost,
            memory_mb: self.memory_mb,
            knight_moves: self.knight_moves,
            walking: self.walking,
            coefficients: WalkingCoefficients {
                a: self.walk_a,
                b: self.walk_b,
                c: self.walk_c,
                d: self.walk_d,
                lambda: self.lambda,
                slope_factor: self.slope_factor,
            },
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    handle_run(&cli)
}

fn handle_run(cli: &Cli) -> Result<()> {
    let layer = layer_name(&cli.output)?;
    if cli.output.exists() && !cli.overwrite {
        bail!(
            "output {} already exists; pass --overwrite to replace it",
            cli.output.display()
        );
    }

    let points = load_points(&cli.input)
        .with_context(|| format!("failed to read points from {}", cli.input.display()))?;
    let friction = read_ascii_grid(&cli.friction).with_context(|| {
        format!("failed to read friction raster {}", cli.friction.display())
    })?;
    let elevation = match &cli.elevation {
        Some(path) => Some(
            read_ascii_grid(path)
                .with_context(|| format!("failed to read elevation raster {}", path.display()))?,
        ),
        None => None,
    };

    let mut request = AllPairsRequest::new(&points, &friction, layer).with_config(cli.run_config());
    if let Some(elevation) = elevation.as_ref() {
        request = request.with_elevation(elevation);
    }

    let mut workspace = Workspace::new();
    let outcome = run_allpairs(&mut workspace, &request, &Engines::native())
        .context("failed to build the least-cost path network")?;
    let network = workspace.vector(&outcome.output)?;
    write_geojson(&cli.output, network, &outcome.output)?;

    let summary = RunSummary::new(&outcome, &cli.output);
    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&summary)),
        OutputFormat::Json => println!("{}", render_json(&summary)?),
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
