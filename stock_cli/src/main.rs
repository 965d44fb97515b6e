mod cli;
mod csv_io;

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use stock_core::{MetricConfig, Ratio, ReturnMetrics, StockAnalyzer, TimeSeriesTable};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{Cli, Commands, MetricsArgs};

fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Metrics(args) => run_metrics(args),
    }
}

fn run_metrics(args: MetricsArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MetricConfig::from_json_file(path)?,
        None => MetricConfig::default(),
    };
    config.returns |= args.returns;
    let analyzer = StockAnalyzer::new(config);

    let mut table = csv_io::read_table(&args.csv_path, args.strict)?;
    info!(path = %args.csv_path.display(), rows = table.len(), "processing file");

    analyzer.pre_process(&mut table)?;
    for name in &args.metrics {
        analyzer
            .manager()
            .ensure_named(&mut table, name)
            .with_context(|| format!("failed to compute {name}"))?;
    }

    print_summary(&table);

    if let Some(baseline_path) = &args.baseline {
        let mut baseline = csv_io::read_table(baseline_path, args.strict)?;
        let mut risk_free = args
            .risk_free
            .as_deref()
            .map(|p| csv_io::read_table(p, args.strict))
            .transpose()?;

        let metrics = match args.start {
            Some(start) => {
                analyzer.return_metrics_since(start, &table, &baseline, risk_free.as_ref())?
            }
            None => analyzer.return_metrics(&mut table, &mut baseline, risk_free.as_mut())?,
        };
        print_return_metrics(&metrics);
    }

    if let Some(output) = &args.output {
        csv_io::write_table(output, &table)?;
        info!(path = %output.display(), "wrote table");
    }

    Ok(())
}

fn print_summary(table: &TimeSeriesTable) {
    println!("Number of rows: {}", table.len());
    if let (Some(first), Some(last)) = (table.first_date(), table.last_date()) {
        println!("First date: {first}");
        println!("Last date: {last}");
    }
    println!("Columns:");
    for column in table.columns() {
        let latest = column.values.last().copied().unwrap_or(f64::NAN);
        println!("  {:<24} {}", column.name, format_value(latest));
    }
}

fn print_return_metrics(metrics: &ReturnMetrics) {
    println!("Beta: {}", format_ratio(metrics.beta));
    println!("Alpha (%): {}", format_ratio(metrics.alpha));
    println!("Sharpe: {}", format_ratio(metrics.sharpe));
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "undefined".to_string()
    } else {
        format!("{v:.4}")
    }
}

fn format_ratio(ratio: Ratio) -> String {
    ratio.map_or_else(|| "undefined".to_string(), format_value)
}
