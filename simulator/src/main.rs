use anyhow::Context;
use clap::Parser;
use focalcore::tensor::Mechanism;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use workflow::benchmark::Benchmark;
use workflow::config::{DataSource, DegradeConfig, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Focal mechanism grid-search workflow driver")]
struct Args {
    /// Load a workflow config from YAML; the data and grid flags below are then ignored
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 50)]
    stations: usize,
    #[arg(long, default_value_t = 1500)]
    n_model: usize,
    #[arg(long, default_value_t = 2000)]
    n_obs: usize,
    /// Spread stations over the whole focal sphere instead of the upper half
    #[arg(long, default_value_t = false)]
    full_sphere: bool,
    /// Station-free cone aperture around East, radians or degrees above pi
    #[arg(long, default_value_t = 0.0)]
    gap: f64,
    /// Synthetic source as strike,dip,rake or six tensor components
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    mechanism: Option<Vec<f64>>,
    /// Inclusive SNR range as low,high; enables degradation
    #[arg(long, value_delimiter = ',', num_args = 2)]
    snr: Option<Vec<f64>>,
    /// Inclusive time-shift range as low,high fractions of the wavelet length
    #[arg(long, value_delimiter = ',', num_args = 2, allow_hyphen_values = true)]
    shift: Option<Vec<f64>>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    grid_root: Option<PathBuf>,
    /// Rebuild the mechanism grid even when a cached one exists
    #[arg(long, default_value_t = false)]
    reset: bool,
    /// Use the five-sample artificial wavelets instead of synthetic ones
    #[arg(long, default_value_t = false)]
    artificial: bool,
    /// Observed data as JSON
    #[arg(long)]
    data: Option<PathBuf>,
    /// Write the P/T axis surfaces of the scan as JSON
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Run the robustness sweeps instead of a single scan
    #[arg(long, default_value_t = false)]
    benchmark: bool,
    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        config_from_flags(&args)?
    };
    workflow_config.pt_pdf |= args.pdf.is_some();

    let runner = Runner::new(workflow_config.clone());
    if args.benchmark {
        let mut scan = runner.prepare()?;
        let rng = StdRng::seed_from_u64(workflow_config.data.seed);
        let rows = Benchmark::new(&mut scan, workflow_config.benchmark.clone(), rng).run()?;
        info!("benchmark finished with {} rows", rows.len());
        return emit(&rows, args.output.as_deref());
    }

    let mut result = runner.execute()?;
    if let (Some(path), Some(pdf)) = (args.pdf.as_ref(), result.pt_pdf.take()) {
        write_json(&pdf, path)?;
        info!("P/T axis surfaces written to {}", path.display());
    }
    info!(
        "best {:?} at P(Mt|d) {:.4} from {} stations",
        result.best.mechanism, result.best.probability, result.stations
    );
    emit(&result, args.output.as_deref())
}

fn config_from_flags(args: &Args) -> anyhow::Result<WorkflowConfig> {
    let mut config = WorkflowConfig::from_args(args.stations, args.n_model, args.n_obs);
    config.scan.reset = args.reset;
    if let Some(root) = args.grid_root.as_ref() {
        config.scan.grid_root = root.clone();
    }
    config.data.full_sphere = args.full_sphere;
    config.data.gap = args.gap;
    config.data.seed = args.seed;
    if let Some(values) = args.mechanism.as_ref() {
        config.data.mechanism =
            Some(Mechanism::from_slice(values).context("parsing --mechanism")?);
    }
    if args.snr.is_some() || args.shift.is_some() {
        let defaults = DegradeConfig::default();
        config.data.degrade = Some(DegradeConfig {
            shift: args.shift.as_deref().map_or(defaults.shift, |v| pair(v, defaults.shift)),
            snr: args.snr.as_deref().map_or(defaults.snr, |v| pair(v, defaults.snr)),
        });
    }
    if args.artificial {
        config.data.source = DataSource::Artificial;
    }
    if let Some(path) = args.data.as_ref() {
        config.data.source = DataSource::File;
        config.data.path = Some(path.clone());
    }
    config.scan.validate().context("validating scan flags")?;
    Ok(config)
}

fn pair(values: &[f64], fallback: [f64; 2]) -> [f64; 2] {
    match values {
        [value] => [*value, *value],
        [low, high] => [*low, *high],
        _ => fallback,
    }
}

fn emit<T: Serialize>(report: &T, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => write_json(report, path),
        None => {
            let json = serde_json::to_string_pretty(report).context("serializing the report")?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serializing the report")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
