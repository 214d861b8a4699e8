//! Corten VM launcher
//!
//! Entry point for the VM. Parses CLI arguments, installs logging and
//! delegates to the Launcher for bring-up and teardown.

use bootstrap::BootPlan;
use clap::Parser as ClapParser;
use vm_cli::{init_logging, list_steps, Cli, Launcher};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_steps {
        if let Err(e) = list_steps(&BootPlan::standard(), &mut std::io::stdout().lock()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let result = Launcher::from_cli(&cli).and_then(Launcher::run);
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
