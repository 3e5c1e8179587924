use clap::CommandFactory;
use clap_complete::{generate, Shell};

pub fn generate_completion(shell: Shell) {
    let mut command = crate::Cli::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, &mut std::io::stdout());
}
