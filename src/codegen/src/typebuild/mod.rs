//! typebuild code generator.
//!
//! Turns the stages of a Dockerfile into typebuild modules: one module per
//! stage, named after the stage identifier, plus a shared module exporting
//! the global build arguments.

pub mod args;
pub mod emit;
pub mod format;
pub mod interpolate;
pub mod literal;
pub mod naming;
pub mod refs;
pub mod stage;

use std::fs;
use std::path::{Path, PathBuf};

use typeconvert_core::error::{ConvertError, Result};
use typeconvert_core::CodegenConfig;

use crate::dockerfile::{ArgCommand, Stage};
use args::GlobalArgs;
use naming::StageNames;
use stage::{render_stage, StageContext};

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenReport {
    /// Files written, in order
    pub files: Vec<PathBuf>,
    /// Non-fatal problems, such as skipped instructions
    pub warnings: Vec<String>,
}

/// Generate typebuild modules for `stages` into `config.output_dir`.
///
/// Stage identifiers are validated before anything is written. Stages are
/// then written in order and the run stops at the first failure; files
/// already written stay on disk. Formatter failures only log a warning.
pub fn generate(
    stages: &[Stage],
    meta_args: &[ArgCommand],
    config: &CodegenConfig,
) -> Result<CodegenReport> {
    let globals = GlobalArgs::from_meta(meta_args);
    let reserved = (!globals.is_empty()).then_some(config.args_module.as_str());
    let names = StageNames::new(stages, reserved)?;

    fs::create_dir_all(&config.output_dir).map_err(|source| ConvertError::Write {
        path: config.output_dir.clone(),
        source,
    })?;

    let mut report = CodegenReport::default();

    if !globals.is_empty() {
        let path = config.module_path(&config.args_module);
        write_module(&path, &globals.render_module(config))?;
        tracing::debug!(path = %path.display(), args = globals.len(), "Wrote build arguments");
        report.files.push(path);
    }

    let ctx = StageContext {
        names: &names,
        globals: &globals,
        config,
    };
    for stage in stages {
        let rendered = render_stage(stage, &ctx)?;
        let path = config.module_path(&rendered.identifier);
        write_module(&path, &rendered.text)?;
        tracing::debug!(stage = %stage.display_name(), path = %path.display(), "Wrote stage");
        report.files.push(path);
        report.warnings.extend(rendered.warnings);
    }

    if config.formatter.enabled {
        if let Err(e) = format::format_output(config) {
            tracing::warn!(error = %e, "Formatter failed, output left unformatted");
        }
    }

    tracing::info!(
        files = report.files.len(),
        warnings = report.warnings.len(),
        output = %config.output_dir.display(),
        "Generated typebuild modules"
    );

    Ok(report)
}

fn write_module(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::{Instruction, RunCommand};

    fn stage(index: usize, name: Option<&str>, base: &str, commands: Vec<Instruction>) -> Stage {
        Stage {
            index,
            name: name.map(str::to_string),
            base_name: base.to_string(),
            platform: None,
            commands,
        }
    }

    fn config_in(dir: &Path) -> CodegenConfig {
        CodegenConfig {
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_single_stage() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![stage(
            0,
            None,
            "alpine",
            vec![Instruction::Run(RunCommand::shell("echo hi"))],
        )];
        let report = generate(&stages, &[], &config_in(dir.path())).unwrap();

        assert_eq!(report.files, vec![dir.path().join("alpine.ts")]);
        assert!(report.warnings.is_empty());
        assert!(!dir.path().join("args.ts").exists());

        let text = fs::read_to_string(dir.path().join("alpine.ts")).unwrap();
        assert!(text.contains("const alpine = new Image(`alpine`);"));
        assert!(text.contains(".run(`echo hi`);"));
        assert!(!text.contains("args.ts"));
    }

    #[test]
    fn test_generate_writes_args_first() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![stage(0, None, "app:$VERSION", vec![])];
        let meta = vec![ArgCommand::single("VERSION", Some("1.0"))];
        let report = generate(&stages, &meta, &config_in(dir.path())).unwrap();

        assert_eq!(report.files[0], dir.path().join("args.ts"));
        assert_eq!(report.files[1], dir.path().join("appVersion.ts"));
        let args = fs::read_to_string(dir.path().join("args.ts")).unwrap();
        assert!(args.contains("export const VERSION = buildArg(\"VERSION\", \"1.0\");"));
    }

    #[test]
    fn test_generate_collision_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let stages = vec![stage(0, None, "alpine", vec![]), stage(1, None, "alpine", vec![])];
        let err = generate(&stages, &[], &config_in(&out)).unwrap_err();
        assert!(matches!(err, ConvertError::StageCollision { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_generate_stops_at_failing_stage() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![
            stage(0, Some("first"), "alpine", vec![]),
            stage(
                1,
                Some("second"),
                "alpine",
                vec![Instruction::Run(RunCommand::shell("echo ${BROKEN"))],
            ),
            stage(2, Some("third"), "alpine", vec![]),
        ];
        let err = generate(&stages, &[], &config_in(dir.path())).unwrap_err();
        assert!(matches!(err, ConvertError::Expansion(_)));
        assert!(dir.path().join("first.ts").exists());
        assert!(!dir.path().join("second.ts").exists());
        assert!(!dir.path().join("third.ts").exists());
    }

    #[test]
    fn test_generate_records_unknown_instruction() {
        let dir = tempfile::tempdir().unwrap();
        let stages = vec![stage(
            0,
            None,
            "alpine",
            vec![Instruction::Unknown {
                keyword: "STOPSIGNAL".to_string(),
                original: "SIGTERM".to_string(),
            }],
        )];
        let report = generate(&stages, &[], &config_in(dir.path())).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("STOPSIGNAL"));
    }

    #[test]
    fn test_generate_formatter_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.formatter.enabled = true;
        config.formatter.program = "typeconvert-no-such-formatter".to_string();

        let stages = vec![stage(0, None, "alpine", vec![])];
        let report = generate(&stages, &[], &config).unwrap();
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_generate_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.extension = "mts".to_string();

        let stages = vec![
            stage(0, Some("builder"), "golang", vec![]),
            stage(1, None, "builder", vec![]),
        ];
        generate(&stages, &[], &config).unwrap();
        let text = fs::read_to_string(dir.path().join("stage1.mts")).unwrap();
        assert!(text.contains("import builder from \"./builder.mts\";"));
    }
}
