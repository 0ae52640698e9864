//! Stage and instruction model produced by the Dockerfile parser.

use typeconvert_core::error::Result;

use super::expand::expand_word;
use super::mount::{parse_mount, Mount};

/// One stage of a (possibly multi-stage) Dockerfile.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// Position of the stage in the Dockerfile, assigned at parse time
    pub index: usize,
    /// `AS <name>` alias, if any
    pub name: Option<String>,
    /// Base image reference (may name a previous stage)
    pub base_name: String,
    /// `--platform` value, if any
    pub platform: Option<String>,
    /// Instructions following the FROM line
    pub commands: Vec<Instruction>,
}

impl Stage {
    /// Human-readable label used in logs and errors.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("stage {} ({} AS {})", self.index, self.base_name, name),
            None => format!("stage {} ({})", self.index, self.base_name),
        }
    }
}

/// A `key=value` pair from ENV or LABEL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single `name[=default]` declaration of an ARG instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    pub key: String,
    pub value: Option<String>,
}

/// `ARG <name>[=<default>] ...`
///
/// Also used for the global ARGs that precede the first FROM.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgCommand {
    pub args: Vec<ArgDecl>,
}

impl ArgCommand {
    /// Convenience constructor for a single declaration.
    pub fn single(key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            args: vec![ArgDecl {
                key: key.into(),
                value: value.map(str::to_string),
            }],
        }
    }
}

/// `RUN [--mount=...] <command>`
///
/// Mount flags are kept in their raw form; they become typed [`Mount`]s
/// only through [`RunCommand::expand`], because mount values may contain
/// variable references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    /// Command line tokens (a single token for the shell form)
    pub cmd_line: Vec<String>,
    /// Raw `--mount` flag values
    pub mount_specs: Vec<String>,
}

/// A RUN instruction after variable expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRun {
    pub cmd_line: Vec<String>,
    pub mounts: Vec<Mount>,
}

impl RunCommand {
    /// Shell-form RUN without mounts.
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            cmd_line: vec![command.into()],
            mount_specs: Vec::new(),
        }
    }

    /// Expand variable references in the command line and mount flags,
    /// then parse the mounts.
    ///
    /// `lookup` returns the value for a variable name; references it does
    /// not know are kept verbatim. Malformed references and invalid mount
    /// specifications fail with `ConvertError::Expansion`.
    pub fn expand<F>(&self, lookup: F) -> Result<ExpandedRun>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cmd_line = self
            .cmd_line
            .iter()
            .map(|word| expand_word(word, &lookup))
            .collect::<Result<Vec<_>>>()?;

        let mounts = self
            .mount_specs
            .iter()
            .map(|spec| expand_word(spec, &lookup).and_then(|s| parse_mount(&s)))
            .collect::<Result<Vec<_>>>()?;

        Ok(ExpandedRun { cmd_line, mounts })
    }
}

/// `COPY [--from=<ref>] <src>... <dst>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand {
    pub source_paths: Vec<String>,
    pub dest_path: String,
    pub from: Option<String>,
}

/// A single Dockerfile instruction inside a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `ENTRYPOINT ["exec", "form"]` or `ENTRYPOINT command`
    Entrypoint { cmd_line: Vec<String> },
    /// `WORKDIR <path>`
    Workdir { path: String },
    /// `RUN [--mount=...] <command>`
    Run(RunCommand),
    /// `ENV <key>=<value> ...`
    Env { env: Vec<KeyValue> },
    /// `COPY [--from=<ref>] <src>... <dst>`
    Copy(CopyCommand),
    /// `LABEL <key>=<value> ...`
    Label { labels: Vec<KeyValue> },
    /// `USER <user>[:<group>]`
    User { user: String },
    /// `VOLUME <path>...`
    Volume { volumes: Vec<String> },
    /// `ARG <name>[=<default>] ...`
    Arg(ArgCommand),
    /// `CMD ["exec", "form"]` or `CMD command`
    Cmd { cmd_line: Vec<String> },
    /// `EXPOSE <port>[/<proto>] ...`
    Expose { ports: Vec<String> },
    /// Any instruction the generator has no mapping for
    Unknown { keyword: String, original: String },
}

impl Instruction {
    /// Upper-case Dockerfile keyword of this instruction.
    pub fn keyword(&self) -> &str {
        match self {
            Instruction::Entrypoint { .. } => "ENTRYPOINT",
            Instruction::Workdir { .. } => "WORKDIR",
            Instruction::Run(_) => "RUN",
            Instruction::Env { .. } => "ENV",
            Instruction::Copy(_) => "COPY",
            Instruction::Label { .. } => "LABEL",
            Instruction::User { .. } => "USER",
            Instruction::Volume { .. } => "VOLUME",
            Instruction::Arg(_) => "ARG",
            Instruction::Cmd { .. } => "CMD",
            Instruction::Expose { .. } => "EXPOSE",
            Instruction::Unknown { keyword, .. } => keyword,
        }
    }
}
