//! External source formatter run over the output directory.

use std::path::Path;
use std::process::Command;

use typeconvert_core::error::{ConvertError, Result};
use typeconvert_core::{CodegenConfig, FormatterConfig};

/// Run the configured formatter over the output directory of `config`.
pub fn format_output(config: &CodegenConfig) -> Result<()> {
    run_formatter(&config.formatter, &config.output_dir, &config.extension)
}

/// Run the formatter with `dir` as its working directory.
///
/// `{dir}` in the arguments is replaced with the absolute path of `dir`
/// and `{ext}` with `extension`.
pub fn run_formatter(config: &FormatterConfig, dir: &Path, extension: &str) -> Result<()> {
    let dir = dir.canonicalize()?;
    let args = config.resolved_args(&dir, extension);

    tracing::debug!(program = %config.program, ?args, "Running formatter");

    let output = Command::new(&config.program)
        .args(&args)
        .current_dir(&dir)
        .output()
        .map_err(|e| {
            ConvertError::Other(format!("Failed to run formatter {}: {}", config.program, e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::Other(format!(
            "Formatter exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormatterConfig {
            enabled: true,
            program: "typeconvert-no-such-formatter".to_string(),
            args: vec![],
        };
        assert!(run_formatter(&config, dir.path(), "ts").is_err());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let config = FormatterConfig::default();
        assert!(run_formatter(&config, Path::new("/nonexistent/typeconvert/out"), "ts").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_formatter_runs_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormatterConfig {
            enabled: true,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "touch {dir}/formatted".to_string()],
        };
        run_formatter(&config, dir.path(), "ts").unwrap();
        assert!(dir.path().join("formatted").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_formatter_failure_status() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormatterConfig {
            enabled: true,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };
        let err = run_formatter(&config, dir.path(), "ts").unwrap_err();
        assert!(err.to_string().contains("3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_format_output_uses_configured_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = CodegenConfig {
            output_dir: dir.path().to_path_buf(),
            extension: "mts".to_string(),
            formatter: FormatterConfig {
                enabled: true,
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "touch {dir}/glob-{ext}".to_string()],
            },
            ..Default::default()
        };
        format_output(&config).unwrap();
        assert!(dir.path().join("glob-mts").exists());
    }
}
