use clap::{Parser, Subcommand};
use exn::ResultExt;
use podshelf::FeedService;
use podshelf::error::{ErrorKind, Result};
use podshelf_config::Config;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Publish a directory of audio files as a podcast feed.
#[derive(Parser)]
#[command(name = "podshelf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file, layered over the built-in defaults.
    #[arg(short, long, env = "PODSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the feed and print it as JSON
    Build,
    /// Print the current library signature
    Signature,
    /// Force a rebuild and print the item count and build time
    Refresh,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let service = FeedService::from_config(config)?;
    match command {
        Command::Build => print_json(&*service.feed().await?),
        Command::Signature => {
            println!("{}", service.signature().await);
            Ok(())
        },
        Command::Refresh => print_json(&service.refresh().await?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());
    init_tracing(cli.verbose || config.as_ref().is_ok_and(|config| config.verbose));
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "Invalid configuration");
            return ExitCode::FAILURE;
        },
    };
    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, retryable = err.is_retryable(), "Command failed");
            ExitCode::FAILURE
        },
    }
}
