use std::{
    env::current_dir,
    fs::write,
    path::{Path, PathBuf},
};

use clap::Parser;
use common::{
    aggregate::{Aggregator, PanelGrid},
    config::Settings,
    locate::LogLocator,
    matrix::Library,
    plot::Plot,
};
use eyre::{Context, ContextCompat, Result};
use panel_grid::GridPlot;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MODULES: &[&str] = &["common", "panel_grid"];

/// Plot an IO benchmark matrix (workload x file mode x library x operation x
/// trial) into a single chart grid
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Benchmark log tree, relative to the current directory
    dir: PathBuf,
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Library whose timing breakdown feeds the ratio lines
    #[arg(long)]
    reference: Option<Library>,
    /// Image file name inside the benchmark folder
    #[arg(short, long)]
    output: Option<String>,
    /// Also write the aggregated series as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
    /// Only aggregate, do not draw
    #[arg(long, default_value_t = false)]
    skip_plot: bool,
    #[arg(short, long)]
    log: Vec<String>,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let _guard = init_logging(&args)?;

    if let Err(err) = run(args) {
        error!("{err:#?}");
        return Err(err);
    }
    Ok(())
}

fn init_logging(args: &Cli) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let mut env_filter = EnvFilter::new(format!("iomatrix={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let filename = path.file_name().context("Log file needs a file name")?;
            let file_appender = tracing_appender::rolling::never(dir, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(layer().with_writer(non_blocking).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_writer(std::io::stderr)
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn run(args: Cli) -> Result<()> {
    let base_path = current_dir()?.join(&args.dir);
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .with_overrides(args.reference, args.output);
    settings.validate()?;
    debug!("{settings:#?}");

    let locator = LogLocator::new(&base_path, &settings.log_suffix);
    let aggregator = Aggregator::new(locator, settings.reference_library)?;
    let grid = aggregator
        .run()
        .context(format!("Aggregating {}", base_path.display()))?;
    info!(
        "Aggregated {} panels, ratios from {}",
        grid.panels().len(),
        grid.reference
    );

    if let Some(dump) = &args.dump {
        dump_grid(&grid, dump)?;
    }

    if args.skip_plot {
        for panel in grid.panels() {
            println!("{}", panel.title());
        }
        return Ok(());
    }

    let plots: Vec<Box<dyn Plot>> = vec![Box::new(GridPlot::from_settings(&settings))];
    common::plot::plot(&plots, &grid, &base_path.join(&settings.output))
}

fn dump_grid(grid: &PanelGrid, path: &Path) -> Result<()> {
    write(path, serde_json::to_string_pretty(grid)?)
        .context(format!("Writing {}", path.display()))?;
    info!("Wrote series to {}", path.display());
    Ok(())
}
