use clap::Subcommand;
use onair_config::Config;
use onair_core::Result;
use onair_queue::KillSwitch;

#[derive(Subcommand)]
pub enum KillSwitchCommands {
    /// Print whether generation is disabled
    Status,
    /// Disable automated generation
    Engage,
    /// Re-enable automated generation
    Disengage,
}

impl KillSwitchCommands {
    pub fn execute(self, config: &Config) -> Result<()> {
        let switch = KillSwitch::from_config(config);
        match self {
            KillSwitchCommands::Status => {
                let state = if switch.is_engaged() {
                    "engaged"
                } else {
                    "disengaged"
                };
                println!("{state} ({})", switch.sentinel().display());
            }
            KillSwitchCommands::Engage => {
                switch.engage()?;
                println!("engaged ({})", switch.sentinel().display());
            }
            KillSwitchCommands::Disengage => {
                if switch.disengage()? {
                    println!("disengaged ({})", switch.sentinel().display());
                } else {
                    println!("already disengaged ({})", switch.sentinel().display());
                }
            }
        }
        Ok(())
    }
}
