//! Typeconvert CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use typeconvert_cli::commands::{dispatch, resolve_config, Cli};

fn main() {
    let cli = Cli::parse();

    let config = match resolve_config(&cli.args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing
    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level.into()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase())),
        )
        .with_target(false)
        .init();

    if let Err(e) = dispatch(cli, config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
