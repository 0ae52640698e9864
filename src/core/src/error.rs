use std::path::PathBuf;

use thiserror::Error;

/// Typeconvert error types
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Dockerfile could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Variable or mount expansion failed on an instruction
    #[error("Expansion error: {0}")]
    Expansion(String),

    /// Two stages resolve to the same output module
    #[error("Stage collision: '{first}' and '{second}' both map to '{identifier}'")]
    StageCollision {
        identifier: String,
        first: String,
        second: String,
    },

    /// A build argument cannot become a `const` in the generated module
    #[error("Build argument '{name}' in {stage} clashes with a reserved word or identifier")]
    ReservedArgument { name: String, stage: String },

    /// Writing a generated file failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ConvertError {
    /// Build a parse error for the given logical line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ConvertError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConvertError {
    fn from(err: serde_yaml::Error) -> Self {
        ConvertError::SerializationError(err.to_string())
    }
}

/// Result type alias for typeconvert operations
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ConvertError::parse(3, "COPY requires a destination");
        assert_eq!(
            error.to_string(),
            "Parse error at line 3: COPY requires a destination"
        );
    }

    #[test]
    fn test_expansion_error_display() {
        let error = ConvertError::Expansion("unterminated reference in 'echo ${A'".to_string());
        assert_eq!(
            error.to_string(),
            "Expansion error: unterminated reference in 'echo ${A'"
        );
    }

    #[test]
    fn test_stage_collision_display() {
        let error = ConvertError::StageCollision {
            identifier: "alpine".to_string(),
            first: "stage 0 (alpine)".to_string(),
            second: "stage 2 (alpine)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Stage collision: 'stage 0 (alpine)' and 'stage 2 (alpine)' both map to 'alpine'"
        );
    }

    #[test]
    fn test_reserved_argument_display() {
        let error = ConvertError::ReservedArgument {
            name: "new".to_string(),
            stage: "stage 0 (alpine)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Build argument 'new' in stage 0 (alpine) clashes with a reserved word or identifier"
        );
    }

    #[test]
    fn test_write_error_display() {
        let error = ConvertError::Write {
            path: PathBuf::from("/out/app.ts"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.to_string(), "Failed to write /out/app.ts: denied");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ConvertError = io_error.into();
        assert!(matches!(error, ConvertError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConvertError::ConfigError("unknown field".to_string());
        assert_eq!(error.to_string(), "Configuration error: unknown field");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let error: ConvertError = result.unwrap_err().into();
        assert!(matches!(error, ConvertError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: ConvertError = result.unwrap_err().into();
        assert!(matches!(error, ConvertError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = ConvertError::Other("something odd".to_string());
        assert_eq!(error.to_string(), "something odd");
    }
}
