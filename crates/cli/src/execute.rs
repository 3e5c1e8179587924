use crate::commands::{queue, run, Commands};
use onair_config::Config;
use onair_core::Result;
use std::sync::Arc;

impl Commands {
    pub async fn execute(self, config: Arc<Config>) -> Result<()> {
        match self {
            Commands::Run { seed, library } => run::execute(&config, seed, library).await,
            Commands::Probe => queue::probe(&config).await,
            Commands::Push {
                path,
                random,
                ignore_kill_switch,
            } => queue::push(&config, path, random, ignore_kill_switch).await,
            Commands::Skip => queue::skip(&config).await,
            Commands::Clear { ephemeral } => queue::clear(&config, ephemeral).await,
            Commands::Queue { json } => queue::list(&config, json).await,
            Commands::Metadata { rid, json } => queue::metadata(&config, &rid, json).await,
            Commands::Send { verb, args } => queue::send(&config, &verb, args).await,
            Commands::KillSwitch { command } => command.execute(&config),
            Commands::Completion { shell } => {
                crate::completion::generate_completion(shell);
                Ok(())
            }
        }
    }

    /// Whether the command needs a loaded configuration
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Completion { .. })
    }
}
