mod cli_logger;

use anyhow::Result;
use clap::{Parser, Subcommand};

use std::path::PathBuf;
use std::process::ExitCode;

use cli_logger::CliLogger;
use wasmperf::{AnalyzeCommand, Config, analyze_command, schema_doc};

#[derive(Debug, Parser)]
#[command(
    name = "wasmperf",
    version,
    about = "Benchmark trace analysis and cross-environment reports"
)]
struct Cli {
    /// Print machine-readable JSON instead of the pretty rendering.
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors.
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to wasmperf.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze recorded traces and write report datasets.
    Analyze(AnalyzeCommand),
    /// Print the trace-format and artifact schema document.
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let logger = CliLogger::new(cli.json, cli.no_color);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("wasmperf.toml"));
    let config = Config::load_optional(&config_path);

    match run(&cli, &config, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &Config, logger: &CliLogger) -> Result<()> {
    match &cli.command {
        Command::Analyze(cmd) => {
            let value = analyze_command(config, cmd)?;
            logger.print_serialized(&value)
        }
        Command::Schema => logger.print_serialized(&schema_doc()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "wasmperf=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
