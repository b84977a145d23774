use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use logspike::config::{LoggingConfig, LogspikeConfig};
use logspike::{parse, report, series, Analyzer, DetectorSettings, Report};

#[derive(Parser)]
#[command(
    name = "logspike",
    about = "Request-rate anomaly detection for web server logs",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults: $LOGSPIKE_CONFIG, then ./logspike.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect anomalous seconds against a robust regression baseline
    Analyze {
        /// Log file to read, or `-` for stdin
        log: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Also write the annotated per-second series as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Z-score above which a second is anomalous
        #[arg(long)]
        threshold: Option<f64>,

        /// Residual quantile that separates baseline points from spikes
        #[arg(long)]
        quantile: Option<f64>,
    },

    /// Print the per-second request counts without fitting
    Series {
        /// Log file to read, or `-` for stdin
        log: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = LogspikeConfig::resolve(cli.config.as_deref())?;
    init_tracing(&resolved.config.logging);
    resolved.log_outcome();
    let config = resolved.config;

    match cli.command {
        Commands::Analyze {
            log,
            json,
            csv,
            threshold,
            quantile,
        } => {
            let mut settings = DetectorSettings::from(&config.detector);
            if let Some(t) = threshold {
                settings.z_threshold = t;
            }
            if let Some(q) = quantile {
                settings.filter_quantile = q;
            }
            tracing::info!(
                log = %log.display(),
                z_threshold = settings.z_threshold,
                filter_quantile = settings.filter_quantile,
                "Running analysis"
            );

            let analyzer = Analyzer::new(settings)?;
            let report = if is_stdin(&log) {
                analyzer.run_reader(io::stdin().lock())?
            } else {
                analyzer.run_path(&log)?
            };

            if let Some(path) = csv {
                write_csv(&report, &path)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n=== logspike Traffic Report ===");
                print!("{}", report::format_summary(&report));
                println!("===============================\n");
            }
        }
        Commands::Series { log, json } => {
            let (timestamps, stats) = if is_stdin(&log) {
                parse::parse_reader(io::stdin().lock())?
            } else {
                parse::parse_path(&log)?
            };
            let points = series::aggregate(&timestamps);

            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                println!("{:<20} | {:>8} | Requests", "Time", "Seconds");
                println!("{:-<20}-|-{:->8}-|-{:-<8}", "", "", "");
                for p in &points {
                    println!("{:<20} | {:>8} | {}", p.time.to_string(), p.seconds, p.requests);
                }
                println!(
                    "\n{} seconds, {} requests ({} of {} lines matched)",
                    points.len(),
                    series::total_requests(&points),
                    stats.matched,
                    stats.lines
                );
            }
        }
    }

    Ok(())
}

fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create CSV output: {}", path.display()))?;
    report::write_series_csv(report, BufWriter::new(file))
        .with_context(|| format!("failed to write CSV output: {}", path.display()))?;
    tracing::info!(path = %path.display(), points = report.points.len(), "wrote series CSV");
    Ok(())
}
