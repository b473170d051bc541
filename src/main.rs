use anyhow::{Context, Result};
use clap::Parser;
use logcore::logging::{format_plain, FileStorage, HistoryFilter, Outcome};
use logcore::{Logger, LoggerConfig, Severity};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and maintain persisted log history", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the persisted history (overrides storage.dir)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// JSON5 logger configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Default, PartialEq)]
struct FilterArgs {
    /// Only entries of exactly this severity
    #[arg(long)]
    level: Option<Severity>,
    /// Only entries from this module
    #[arg(long)]
    module: Option<String>,
    /// Only entries at or after this time (RFC 3339 or epoch milliseconds)
    #[arg(long, value_parser = parse_since)]
    since: Option<i64>,
    /// Keep only the most recent N matches
    #[arg(long)]
    limit: Option<usize>,
}

impl FilterArgs {
    fn to_filter(&self) -> HistoryFilter {
        HistoryFilter {
            level: self.level,
            module: self.module.clone(),
            since: self.since,
            limit: self.limit,
        }
    }
}

#[derive(Parser, Debug, PartialEq)]
enum Command {
    /// Print persisted history
    History {
        #[command(flatten)]
        filter: FilterArgs,
        /// One JSON object per line instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write filtered history to a timestamped JSON file
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete persisted history
    Clear,
    /// Run the logger self-checks
    Diagnose,
    /// Print logger statistics as JSON
    Stats,
}

fn parse_since(s: &str) -> Result<i64, String> {
    if let Ok(millis) = s.parse::<i64>() {
        return Ok(millis);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("Invalid time '{}': {}", s, e))
}

fn build_logger(args: &Args) -> Result<Logger> {
    let config = match &args.config {
        Some(path) => LoggerConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LoggerConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(dir) = &args.store_dir {
        config.storage.dir = Some(dir.clone());
    }
    config.validate()?;

    let dir = config
        .storage
        .dir
        .clone()
        .context("no history directory: pass --store-dir or set storage.dir")?;
    let store = FileStorage::open(&dir)?;

    Ok(Logger::builder()
        .config(config)
        .storage(Arc::new(store))
        .build())
}

fn run(logger: &Logger, command: Command) -> Result<ExitCode> {
    match command {
        Command::History { filter, json } => {
            for entry in logger.history(&filter.to_filter()) {
                if json {
                    println!("{}", serde_json::to_string(&entry)?);
                    continue;
                }
                println!(
                    "{}",
                    format_plain(entry.timestamp, entry.level, &entry.module, &entry.message)
                );
                if let Some(stack) = &entry.stack_trace {
                    println!("{}", stack);
                }
            }
        }
        Command::Export { filter, out } => {
            let export = logger.export_logs(&filter.to_filter());
            let path = export.write_to(&out)?;
            println!("Exported {} entries to {}", export.count, path.display());
        }
        Command::Clear => {
            logger.clear_history()?;
            println!("History cleared");
        }
        Command::Diagnose => {
            let report = logger.run_diagnostics();
            for finding in report.findings() {
                let tag = match finding.outcome {
                    Outcome::Pass => "PASS",
                    Outcome::Warn => "WARN",
                    Outcome::Fail => "FAIL",
                    Outcome::Info => "INFO",
                };
                println!("[{}] {}: {}", tag, finding.check.as_str(), finding.message);
            }
            println!("{}", report.summary());
            if !report.healthy() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&logger.statistics())?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let logger = build_logger(&args)?;
    let result = run(&logger, args.command);
    logger.shutdown();
    result
}
