use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Code generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Directory the generated modules are written to
    pub output_dir: PathBuf,

    /// File extension of generated modules (without the dot)
    pub extension: String,

    /// First line of every generated file
    pub syntax_header: String,

    /// Module URL the typebuild runtime is imported from
    pub library_url: String,

    /// File stem of the shared build-argument module
    pub args_module: String,

    /// External formatter run over the output directory
    pub formatter: FormatterConfig,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            extension: "ts".to_string(),
            syntax_header: "//syntax=rumpl/typebuild".to_string(),
            library_url: "https://raw.githubusercontent.com/rumpl/typebuild-node/main/index.ts"
                .to_string(),
            args_module: "args".to_string(),
            formatter: FormatterConfig::default(),
            log_level: LogLevel::Warn,
        }
    }
}

impl CodegenConfig {
    /// Load a configuration file. `.json` files are read as JSON,
    /// everything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: CodegenConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would produce unusable output.
    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.contains(['.', '/']) {
            return Err(ConvertError::ConfigError(format!(
                "Invalid extension '{}'",
                self.extension
            )));
        }
        if self.args_module.is_empty() || self.args_module.contains('/') {
            return Err(ConvertError::ConfigError(format!(
                "Invalid args module name '{}'",
                self.args_module
            )));
        }
        Ok(())
    }

    /// File name of a generated module, e.g. `builder.ts`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension)
    }

    /// Path of a generated module inside the output directory.
    pub fn module_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(self.file_name(stem))
    }
}

/// External formatter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Run the formatter after generation
    pub enabled: bool,

    /// Program to execute
    pub program: String,

    /// Arguments; `{dir}` is replaced with the absolute output directory
    /// and `{ext}` with the module extension
    pub args: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: "docker".to_string(),
            args: [
                "run",
                "--rm",
                "-v",
                "{dir}:/work",
                "tmknom/prettier",
                "--write",
                "--parser=typescript",
                "*.{ext}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FormatterConfig {
    /// Arguments with `{dir}` and `{ext}` substituted.
    pub fn resolved_args(&self, dir: &Path, extension: &str) -> Vec<String> {
        let dir = dir.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{dir}", &dir).replace("{ext}", extension))
            .collect()
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodegenConfig::default();
        assert_eq!(config.extension, "ts");
        assert_eq!(config.args_module, "args");
        assert_eq!(config.syntax_header, "//syntax=rumpl/typebuild");
        assert!(!config.formatter.enabled);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_module_path() {
        let config = CodegenConfig {
            output_dir: PathBuf::from("/out"),
            ..Default::default()
        };
        assert_eq!(config.file_name("builder"), "builder.ts");
        assert_eq!(config.module_path("builder"), PathBuf::from("/out/builder.ts"));
    }

    #[test]
    fn test_formatter_resolved_args() {
        let formatter = FormatterConfig::default();
        let args = formatter.resolved_args(Path::new("/tmp/out"), "ts");
        assert!(args.contains(&"/tmp/out:/work".to_string()));
        assert!(args.contains(&"*.ts".to_string()));
        assert_eq!(args[0], "run");
    }

    #[test]
    fn test_formatter_glob_follows_extension() {
        let formatter = FormatterConfig::default();
        let args = formatter.resolved_args(Path::new("/tmp/out"), "mts");
        assert_eq!(args.last().map(String::as_str), Some("*.mts"));
        assert!(!args.iter().any(|a| a.contains("{ext}")));
    }

    #[test]
    fn test_from_yaml_file_partial() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("typeconvert.yaml");
        std::fs::write(&path, "extension: mts\nformatter:\n  enabled: true\n").unwrap();

        let config = CodegenConfig::from_file(&path).unwrap();
        assert_eq!(config.extension, "mts");
        assert!(config.formatter.enabled);
        assert_eq!(config.formatter.program, "docker");
        assert_eq!(config.args_module, "args");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("typeconvert.json");
        std::fs::write(&path, r#"{"args_module": "buildArgs", "log_level": "debug"}"#).unwrap();

        let config = CodegenConfig::from_file(&path).unwrap();
        assert_eq!(config.args_module, "buildArgs");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_from_file_missing() {
        let err = CodegenConfig::from_file(Path::new("/nonexistent/typeconvert.yaml")).unwrap_err();
        assert!(matches!(err, ConvertError::ConfigError(_)));
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let config = CodegenConfig {
            extension: ".ts".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }
}
