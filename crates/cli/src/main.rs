use clap::Parser;
use onair_config::{Config, ConfigLoader};
use onair_core::{Result, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod commands;
mod completion;
mod execute;

use commands::Commands;

#[derive(Parser)]
#[command(name = "onair")]
#[command(about = "Supervise a broadcast engine and drive its control socket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Control socket path, overriding configuration
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // clap reports usage errors as 2, which is our transport code
            return if e.use_stderr() {
                exit_code(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = onair_utils::tracing::init(cli.verbose) {
        eprintln!("onair: failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(()) => exit_code(EXIT_SUCCESS),
        Err(e) => {
            tracing::debug!(error = ?e, class = ?e.class(), "command failed");
            eprintln!("onair: {e}");
            exit_code(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = if cli.command.needs_config() {
        load_config(&cli)?
    } else {
        Config::default()
    };
    cli.command.execute(Arc::new(config)).await
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(socket) = &cli.socket {
        loader = loader.socket_path(socket);
    }
    let config = loader.load()?;
    tracing::debug!(
        socket = %config.socket_path.display(),
        kill_switch = %config.kill_switch_path.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
