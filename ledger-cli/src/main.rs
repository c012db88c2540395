//! ledger - operator console for the Ledger core service.

mod command;
mod console;
mod render;
mod terminal;

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use ledger_api::{AppConfig, AppPaths, LedgerClient};
use log::{LevelFilter, debug};

use crate::console::{Console, Outcome};
use crate::render::Style;
use crate::terminal::StdTerminal;

const APP_NAME: &str = "ledger";

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:?}");
            std::process::exit(1);
        }
    }
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("api url {}", ctx.config.api_url);

    match cli.command {
        None => handle_console(&ctx),
        Some(Command::Run { words }) => handle_run(&ctx, &words),
        Some(Command::Config { command }) => handle_config(&ctx, command).map(|()| 0),
        Some(Command::Completions { shell }) => handle_completions(shell).map(|()| 0),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Interactive console for the Ledger core service API.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, clap::Args)]
struct CommonOpts {
    /// Base URL of the core service API
    #[arg(long, value_name = "URL", global = true, env = "LEDGER_API")]
    api: Option<String>,
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[arg(long = "timeout", value_name = "SECONDS", global = true)]
    timeout: Option<u64>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true)]
    trace: bool,
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single console command and exit
    Run {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        words: Vec<String>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the global config path
    Path,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.clone()).context("resolving config paths")?;
        let mut config =
            AppConfig::load(&paths, common.api.as_deref()).context("loading configuration")?;
        if let Some(secs) = common.timeout.filter(|secs| *secs > 0) {
            config.timeout_secs = secs;
        }
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

        if let Some(level) = self.flag_log_level() {
            builder.filter_level(level);
        }

        let force_color = matches!(self.common.color, ColorOption::Always)
            || env::var_os("FORCE_COLOR").is_some();

        if self.color_disabled() {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        if self.common.diagnostics {
            builder.format_timestamp_millis();
            builder.format_module_path(true);
            builder.format_target(true);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    /// Level requested on the command line; `None` defers to `RUST_LOG`.
    fn flag_log_level(&self) -> Option<LevelFilter> {
        if self.common.trace {
            Some(LevelFilter::Trace)
        } else if self.common.debug {
            Some(LevelFilter::Debug)
        } else {
            match self.common.verbose {
                0 => None,
                1 => Some(LevelFilter::Info),
                2 => Some(LevelFilter::Debug),
                _ => Some(LevelFilter::Trace),
            }
        }
    }

    fn color_disabled(&self) -> bool {
        self.common.no_color
            || self.common.color == ColorOption::Never
            || env::var_os("NO_COLOR").is_some()
    }

    fn output_style(&self) -> Style {
        let color = match self.common.color {
            _ if self.color_disabled() => false,
            ColorOption::Always => true,
            _ => self.config.console.color && io::stdout().is_terminal(),
        };
        Style { color }
    }

    fn client(&self) -> Result<LedgerClient> {
        LedgerClient::new(&self.config.api_url, Some(self.config.timeout()))
            .context("building HTTP client")
    }

    fn console<'a>(&self, client: &'a LedgerClient) -> Console<'a, StdTerminal, io::Stdout> {
        Console::new(client, StdTerminal::new(), io::stdout())
            .with_style(self.output_style())
            .with_prompt(self.config.console.prompt.clone())
            .with_default_mode(self.config.console.default_mode)
    }
}

fn handle_console(ctx: &RuntimeContext) -> Result<i32> {
    let client = ctx.client()?;
    println!();
    println!("  Ledger Console");
    println!("  ──────────────");
    println!("  Type 'help' for commands, 'quit' to exit.");
    ctx.console(&client).run().context("console I/O")?;
    Ok(0)
}

fn handle_run(ctx: &RuntimeContext, words: &[String]) -> Result<i32> {
    let client = ctx.client()?;
    let line = words.join(" ");
    let outcome = ctx.console(&client).execute(&line).context("console I/O")?;
    Ok(match outcome {
        Outcome::Done { ok: false } => 1,
        _ => 0,
    })
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let text = toml::to_string_pretty(&ctx.config).context("serializing configuration")?;
            print!("{text}");
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.global_config.display());
            Ok(())
        }
        ConfigCommand::Init { force } => {
            let path = &ctx.paths.global_config;
            if path.exists() && !force {
                anyhow::bail!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            AppConfig::write_default(path).context("writing default config")?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}
