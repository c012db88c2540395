//! ledger-smoke - connectivity and response-shape checks for the core service API.

mod checks;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ledger_api::{AppConfig, AppPaths, LedgerClient};
use log::{LevelFilter, debug};

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:?}");
            std::process::exit(1);
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run the smoke checks against a Ledger core service."
)]
struct Cli {
    /// Base URL of the core service API
    #[arg(long, value_name = "URL", env = "LEDGER_API")]
    api: Option<String>,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long = "timeout", value_name = "SECONDS")]
    timeout: Option<u64>,
    /// Emit the records as a JSON report instead of text
    #[arg(long)]
    json: bool,
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(&cli);

    let paths = AppPaths::discover(cli.config.clone()).context("resolving config paths")?;
    let mut config = AppConfig::load(&paths, cli.api.as_deref()).context("loading configuration")?;
    if let Some(secs) = cli.timeout.filter(|secs| *secs > 0) {
        config.timeout_secs = secs;
    }
    debug!("checking {}", config.api_url);

    let client = LedgerClient::new(&config.api_url, Some(config.timeout()))
        .context("building HTTP client")?;

    let report = if cli.json {
        let report = checks::run_checks(&client, &mut io::sink())?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        report
    } else {
        let mut stdout = io::stdout().lock();
        checks::print_banner(&mut stdout, client.base_url())?;
        let report = checks::run_checks(&client, &mut stdout)?;
        checks::print_summary(&mut stdout, &report)?;
        report
    };

    Ok(report.exit_code())
}

fn init_logging(cli: &Cli) {
    if cli.quiet {
        log::set_max_level(LevelFilter::Off);
        return;
    }
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match cli.verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    let _ = builder.try_init();
}
