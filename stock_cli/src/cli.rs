use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "stock_cli",
    about = "Technical and risk/return indicators over daily OHLCV data"
)]
pub struct Cli {
    /// Optional log file, written in addition to stdout
    #[arg(long = "log-file", global = true, value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute indicator columns for one stock, optionally with return
    /// metrics against a baseline
    #[command(name = "metrics")]
    Metrics(MetricsArgs),
}

#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// OHLCV CSV with columns Date,Open,High,Low,Close,AdjClose,Volume
    #[arg(long = "csv", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub csv_path: PathBuf,

    /// JSON metric configuration; defaults to the standard set
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra derived columns by name, e.g. Close_EMA_50 or Returns_MA_20
    #[arg(long = "metric", value_name = "NAME")]
    pub metrics: Vec<String>,

    /// Add the cumulative Returns column and its moving averages
    #[arg(long, default_value_t = false)]
    pub returns: bool,

    /// Baseline OHLCV CSV (e.g. an index tracker) for beta and alpha
    #[arg(long = "baseline", value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Risk-free reference OHLCV CSV; falls back to the configured rate
    #[arg(long = "risk-free", value_name = "FILE", requires = "baseline")]
    pub risk_free: Option<PathBuf>,

    /// First date (YYYY-MM-DD) of the return metrics period
    #[arg(long = "start", value_name = "DATE", requires = "baseline")]
    pub start: Option<NaiveDate>,

    /// Reject bars whose high/low do not bound open/close instead of fixing them
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Write the enriched table as CSV
    #[arg(long = "output", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_metrics_args() {
        let cli = Cli::try_parse_from([
            "stock_cli",
            "metrics",
            "--csv",
            "prices.csv",
            "--metric",
            "Close_EMA_50",
            "--metric",
            "Returns_MA_20",
            "--baseline",
            "ftse.csv",
            "--start",
            "2020-01-02",
        ])
        .unwrap();

        let Commands::Metrics(args) = cli.command;
        assert_eq!(args.csv_path, PathBuf::from("prices.csv"));
        assert_eq!(args.metrics, vec!["Close_EMA_50", "Returns_MA_20"]);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2020, 1, 2));
        assert!(!args.returns);
    }

    #[test]
    fn test_risk_free_requires_baseline() {
        let res = Cli::try_parse_from([
            "stock_cli",
            "metrics",
            "--csv",
            "prices.csv",
            "--risk-free",
            "gilts.csv",
        ]);
        assert!(res.is_err());
    }
}
