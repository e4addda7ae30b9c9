//! nickelconf CLI - Read and change front light settings in Kobo eReader.conf.

use clap::Parser;
use nickelconf::cli::{Cli, Commands};
use nickelconf::commands::{self, CommandResult};
use nickelconf::config::{LOG_FILTER_ENV, resolve_config_path};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    init_logging();

    let resolved = resolve_config_path(cli.config_path);
    tracing::debug!(
        path = %resolved.value.display(),
        source = %resolved.source,
        command = cli.command.name(),
        "resolved config file"
    );

    let result = run_command(cli.command, &resolved, human);

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Log to stderr so stdout stays parseable. Quiet unless NICKELCONF_LOG is set.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_command(
    command: Commands,
    resolved: &nickelconf::config::Resolved<std::path::PathBuf>,
    human: bool,
) -> Result<(), nickelconf::Error> {
    let path = resolved.value.as_path();
    match command {
        Commands::Get { setting } => output(&commands::get(path, setting)?, human),
        Commands::Set { setting, value } => output(&commands::set(path, setting, &value)?, human),
        Commands::Show => output(&commands::show(path)?, human),
        Commands::Where => output(&commands::locate(resolved), human),
    }
    Ok(())
}

fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
