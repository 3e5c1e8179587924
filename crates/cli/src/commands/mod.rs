use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

pub mod kill_switch;
pub mod queue;
pub mod run;

use self::kill_switch::KillSwitchCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the engine, wait for its socket, seed the queue and supervise
    Run {
        /// Track to enqueue once the engine is up
        #[arg(long, value_name = "PATH")]
        seed: Option<PathBuf>,

        /// Pick the seed track at random from this directory
        #[arg(long, value_name = "DIR")]
        library: Option<PathBuf>,
    },

    /// Check whether the control socket answers
    Probe,

    /// Enqueue a track
    Push {
        /// Absolute path of the track
        #[arg(required_unless_present = "random", conflicts_with = "random")]
        path: Option<PathBuf>,

        /// Push a random audio file from this directory instead
        #[arg(long, value_name = "DIR")]
        random: Option<PathBuf>,

        /// Push even while the kill switch is engaged
        #[arg(long)]
        ignore_kill_switch: bool,
    },

    /// Skip the track currently on air
    Skip,

    /// Remove every queued request
    Clear {
        /// Use a fresh connection for every removal
        #[arg(long)]
        ephemeral: bool,
    },

    /// List queued requests
    #[command(visible_alias = "ls")]
    Queue {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the metadata of a request
    Metadata {
        /// Request ID
        rid: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Send a raw command and print the answer
    Send {
        /// Command verb, e.g. `help`
        verb: String,

        /// Command arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Inspect or flip the generation kill switch
    KillSwitch {
        #[command(subcommand)]
        command: KillSwitchCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        shell: Shell,
    },
}
