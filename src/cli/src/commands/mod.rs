//! CLI definition and dispatch.

mod convert;

pub use convert::{resolve_config, ConvertArgs};

use clap::Parser;
use typeconvert_core::CodegenConfig;

/// Typeconvert: convert a Dockerfile into typebuild modules.
#[derive(Parser)]
#[command(name = "typeconvert", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub args: ConvertArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Run the conversion described by `cli` with a resolved configuration.
pub fn dispatch(cli: Cli, config: CodegenConfig) -> Result<(), Box<dyn std::error::Error>> {
    let report = convert::execute(&cli.args, &config)?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if cli.verbose {
        for file in &report.files {
            println!("{}", file.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_positionals() {
        let cli = Cli::try_parse_from(["typeconvert", "Dockerfile", "out"]).unwrap();
        assert_eq!(cli.args.dockerfile.to_str(), Some("Dockerfile"));
        assert_eq!(cli.args.output_dir.to_str(), Some("out"));
        assert!(!cli.args.format);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from([
            "typeconvert",
            "--format",
            "--extension",
            "mts",
            "-v",
            "Dockerfile",
            "out",
        ])
        .unwrap();
        assert!(cli.args.format);
        assert_eq!(cli.args.extension.as_deref(), Some("mts"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_requires_both_positionals() {
        assert!(Cli::try_parse_from(["typeconvert"]).is_err());
        assert!(Cli::try_parse_from(["typeconvert", "Dockerfile"]).is_err());
    }
}
