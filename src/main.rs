use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use treesum::charts::{build_ensemble, vaf_values, ChartConfig};
use treesum::render::{plan_charts, write_chart, OutputFormat};
use treesum::report::report_representative;
use treesum::summary::{Mutations, TreeSummary};

#[derive(Parser)]
#[command(name = "treesum")]
#[command(about = "Render summary charts for a set of sampled tumor phylogenies.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Load the tree summary JSON from this FILE.
    #[arg(short = 's', long = "summary", value_name = "FILE")]
    summary: PathBuf,

    /// Write the charts into this DIR (created if missing).
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    out_dir: PathBuf,

    // Input Options
    /// Load SSM read counts from this FILE to plot the VAF histogram.
    #[arg(short = 'm', long = "muts", value_name = "FILE")]
    muts: Option<PathBuf>,

    // Visualization Options
    /// Image format of the written charts.
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Set the width in pixels of every chart.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 1500)]
    width: u32,

    /// Number of cancerous populations, after the clonal one, to chart.
    #[arg(long = "pops-to-examine", value_name = "N", default_value_t = 3)]
    pops_to_examine: usize,

    /// Minimum SSMs for a population without CNVs to count as cancerous.
    #[arg(long = "min-ssms", value_name = "N", default_value_t = 3)]
    min_ssms: u64,

    /// Bucket width of the VAF histogram.
    #[arg(long = "vaf-bucket-size", value_name = "FLOAT", default_value_t = 0.03)]
    vaf_bucket_size: f64,

    /// Grid resolution of the density overlay on the index scatter plot.
    #[arg(long = "density-bins", value_name = "N", default_value_t = 40)]
    density_bins: usize,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

impl Args {
    fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            pops_to_examine: self.pops_to_examine,
            min_ssms: self.min_ssms,
            vaf_bucket_size: self.vaf_bucket_size,
            density_bins: self.density_bins,
            ..ChartConfig::default()
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if !(args.vaf_bucket_size > 0.0) {
        anyhow::bail!("--vaf-bucket-size must be positive, got {}", args.vaf_bucket_size);
    }

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let config = args.chart_config();

    let summary = TreeSummary::from_path(&args.summary)
        .with_context(|| format!("Error loading tree summary {:?}", args.summary))?;
    let ensemble = build_ensemble(&summary, &config).context("Error reading trees")?;
    if ensemble.tree_ids.is_empty() {
        warn!("No trees found in the summary.");
    }

    let vafs = match &args.muts {
        Some(path) => {
            let muts = Mutations::from_path(path).with_context(|| format!("Error loading mutations {:?}", path))?;
            Some(vaf_values(&muts))
        }
        None => None,
    };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Error creating output directory {:?}", args.out_dir))?;

    let scatter = report_representative(&ensemble, &args.out_dir).context("Error writing representative tree")?;

    let specs = plan_charts(&ensemble, vafs.as_deref(), scatter, &config, args.width);
    info!("Rendering {} charts...", specs.len());

    let written: Vec<PathBuf> = specs
        .par_iter()
        .map(|spec| {
            write_chart(spec, &args.out_dir, args.format).with_context(|| format!("Error writing chart {}", spec.name))
        })
        .collect::<Result<_>>()?;

    for path in &written {
        debug!("Saved {:?}", path);
    }
    info!("Saved {} charts to {:?}", written.len(), args.out_dir);

    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    info!("Starting tree summary...");

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
