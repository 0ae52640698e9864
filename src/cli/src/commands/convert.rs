//! Parse a Dockerfile and write one typebuild module per stage.

use std::path::PathBuf;

use clap::Args;
use typeconvert_codegen::{generate, CodegenReport, Dockerfile};
use typeconvert_core::CodegenConfig;

#[derive(Args)]
pub struct ConvertArgs {
    /// Path to the Dockerfile
    pub dockerfile: PathBuf,

    /// Directory the modules are written to
    pub output_dir: PathBuf,

    /// Run the configured formatter over the output
    #[arg(long)]
    pub format: bool,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Extension of generated files (default: ts)
    #[arg(short, long)]
    pub extension: Option<String>,
}

/// Build the effective configuration: file values first, then flags.
pub fn resolve_config(args: &ConvertArgs) -> Result<CodegenConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => CodegenConfig::from_file(path)?,
        None => CodegenConfig::default(),
    };

    config.output_dir = args.output_dir.clone();
    if let Some(extension) = &args.extension {
        config.extension = extension.clone();
    }
    if args.format {
        config.formatter.enabled = true;
    }

    config.validate()?;
    Ok(config)
}

pub fn execute(
    args: &ConvertArgs,
    config: &CodegenConfig,
) -> Result<CodegenReport, Box<dyn std::error::Error>> {
    let dockerfile = Dockerfile::from_file(&args.dockerfile)?;
    tracing::debug!(
        path = %args.dockerfile.display(),
        stages = dockerfile.stages.len(),
        global_args = dockerfile.meta_args.len(),
        "Parsed Dockerfile"
    );

    let report = generate(&dockerfile.stages, &dockerfile.meta_args, config)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path) -> ConvertArgs {
        ConvertArgs {
            dockerfile: dir.join("Dockerfile"),
            output_dir: dir.join("out"),
            format: false,
            config: None,
            extension: None,
        }
    }

    #[test]
    fn test_resolve_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(&args(dir.path())).unwrap();
        assert_eq!(config.output_dir, dir.path().join("out"));
        assert_eq!(config.extension, "ts");
        assert!(!config.formatter.enabled);
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("typeconvert.yaml");
        std::fs::write(
            &config_path,
            "extension: js\nargs_module: buildargs\nformatter:\n  enabled: false\n",
        )
        .unwrap();

        let mut cli_args = args(dir.path());
        cli_args.config = Some(config_path);
        cli_args.extension = Some("mts".to_string());
        cli_args.format = true;

        let config = resolve_config(&cli_args).unwrap();
        assert_eq!(config.extension, "mts");
        assert_eq!(config.args_module, "buildargs");
        assert!(config.formatter.enabled);
    }

    #[test]
    fn test_resolve_config_rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli_args = args(dir.path());
        cli_args.extension = Some(".ts".to_string());
        assert!(resolve_config(&cli_args).is_err());
    }

    #[test]
    fn test_execute_missing_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        let cli_args = args(dir.path());
        let config = resolve_config(&cli_args).unwrap();
        assert!(execute(&cli_args, &config).is_err());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_execute_writes_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\nRUN echo hi\n").unwrap();
        let cli_args = args(dir.path());
        let config = resolve_config(&cli_args).unwrap();

        let report = execute(&cli_args, &config).unwrap();
        assert_eq!(report.files, vec![dir.path().join("out").join("alpine.ts")]);
    }
}
