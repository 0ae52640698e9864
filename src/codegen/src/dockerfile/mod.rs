//! Dockerfile parser.
//!
//! Parses a Dockerfile into global build arguments and a list of stages.
//! Supports line continuations (`\`), comments, instruction flags, and both
//! shell and JSON (exec) forms for RUN/CMD/ENTRYPOINT.

pub mod expand;
pub mod instruction;
pub mod mount;

pub use instruction::{
    ArgCommand, ArgDecl, CopyCommand, ExpandedRun, Instruction, KeyValue, RunCommand, Stage,
};
pub use mount::{
    BindMount, CacheMount, CacheSharing, Mount, MountKind, SecretMount, SshMount, TmpfsMount,
};

use typeconvert_core::error::{ConvertError, Result};

/// Parsed Dockerfile: global ARGs and stages in order.
#[derive(Debug, Clone, Default)]
pub struct Dockerfile {
    /// ARG instructions that precede the first FROM
    pub meta_args: Vec<ArgCommand>,
    pub stages: Vec<Stage>,
}

impl Dockerfile {
    /// Parse a Dockerfile from its text content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut dockerfile = Dockerfile::default();

        let escape = escape_directive(content)?;
        for (line_num, line) in join_continuation_lines(content, escape) {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (keyword, rest) = split_first_word(trimmed);
            let keyword_upper = keyword.to_uppercase();

            if keyword_upper == "FROM" {
                let index = dockerfile.stages.len();
                dockerfile.stages.push(parse_from(rest, index, line_num)?);
                continue;
            }

            let instruction = parse_instruction(&keyword_upper, rest, line_num)?;
            match (dockerfile.stages.last_mut(), instruction) {
                (Some(stage), instruction) => stage.commands.push(instruction),
                (None, Instruction::Arg(arg)) => dockerfile.meta_args.push(arg),
                (None, _) => {
                    return Err(ConvertError::parse(
                        line_num,
                        "First instruction must be FROM (or ARG before FROM)",
                    ))
                }
            }
        }

        if dockerfile.stages.is_empty() {
            return Err(ConvertError::parse(
                0,
                "Dockerfile is empty or contains no FROM instruction",
            ));
        }

        Ok(dockerfile)
    }

    /// Parse a Dockerfile from a file path.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::Other(format!(
                "Failed to read Dockerfile at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }
}

/// Default line continuation character.
const DEFAULT_ESCAPE: char = '\\';

/// Read the `# escape=` parser directive.
///
/// Directives are only recognized in the leading `# key=value` comments;
/// the first blank line, other comment or instruction ends them.
fn escape_directive(content: &str) -> Result<char> {
    for (idx, line) in content.lines().enumerate() {
        let Some(body) = line.trim().strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = body.split_once('=') else {
            break;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            break;
        }
        if key.eq_ignore_ascii_case("escape") {
            return match value.trim() {
                "\\" => Ok('\\'),
                "`" => Ok('`'),
                other => Err(ConvertError::parse(
                    idx + 1,
                    format!("Invalid escape directive '{}': must be ` or \\", other),
                )),
            };
        }
    }
    Ok(DEFAULT_ESCAPE)
}

/// Join lines ending with the escape character (optionally followed by
/// spaces or tabs) into single logical lines, keeping the number of the
/// physical line each logical line starts on.
///
/// Only the escape character, its trailing blanks and the newline are
/// removed; the joined text is otherwise kept verbatim.
fn join_continuation_lines(content: &str, escape: char) -> Vec<(usize, String)> {
    let mut logical_lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;
    let mut start = 0;

    for (idx, line) in content.lines().enumerate() {
        if !continuing {
            start = idx + 1;
            // A comment never continues onto the next line
            if line.trim_start().starts_with('#') {
                logical_lines.push((start, line.to_string()));
                continue;
            }
        } else {
            // Comments and blank lines inside a continuation are dropped
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
        }

        match line.trim_end_matches([' ', '\t']).strip_suffix(escape) {
            Some(stripped) => {
                current.push_str(stripped);
                continuing = true;
            }
            None => {
                current.push_str(line);
                logical_lines.push((start, std::mem::take(&mut current)));
                continuing = false;
            }
        }
    }

    // Handle trailing continuation without final line
    if continuing {
        logical_lines.push((start, current));
    }

    logical_lines
}

/// Parse a single non-FROM logical line into an Instruction.
fn parse_instruction(keyword: &str, rest: &str, line_num: usize) -> Result<Instruction> {
    match keyword {
        "RUN" => parse_run(rest, line_num),
        "COPY" => parse_copy(rest, line_num),
        "WORKDIR" => parse_workdir(rest, line_num),
        "ENV" => parse_env(rest, line_num),
        "ENTRYPOINT" => {
            parse_exec_or_shell(rest, "ENTRYPOINT", line_num)
                .map(|cmd_line| Instruction::Entrypoint { cmd_line })
        }
        "CMD" => parse_exec_or_shell(rest, "CMD", line_num)
            .map(|cmd_line| Instruction::Cmd { cmd_line }),
        "EXPOSE" => parse_expose(rest, line_num),
        "LABEL" => parse_label(rest, line_num),
        "USER" => parse_user(rest, line_num),
        "VOLUME" => parse_volume(rest, line_num),
        "ARG" => parse_arg(rest, line_num),
        _ => {
            tracing::debug!(
                line = line_num,
                instruction = keyword,
                "Instruction has no typebuild mapping"
            );
            Ok(Instruction::Unknown {
                keyword: keyword.to_string(),
                original: rest.to_string(),
            })
        }
    }
}

/// Split a string into the first word and the rest.
fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

/// Strip leading `--name[=value]` flags.
fn split_flags(rest: &str) -> (Vec<(String, Option<String>)>, &str) {
    let mut flags = Vec::new();
    let mut remaining = rest.trim_start();

    while remaining.starts_with("--") {
        let (flag, after) = split_first_word(remaining);
        let body = &flag[2..];
        match body.split_once('=') {
            Some((name, value)) => flags.push((name.to_ascii_lowercase(), Some(value.to_string()))),
            None => flags.push((body.to_ascii_lowercase(), None)),
        }
        remaining = after;
    }

    (flags, remaining)
}

fn unknown_flag(instruction: &str, flag: &str, line_num: usize) -> ConvertError {
    ConvertError::parse(
        line_num,
        format!("Unknown flag for {}: --{}", instruction, flag),
    )
}

fn require_value(
    instruction: &str,
    flag: &str,
    value: Option<String>,
    line_num: usize,
) -> Result<String> {
    value.ok_or_else(|| {
        ConvertError::parse(
            line_num,
            format!("{} flag --{} requires a value", instruction, flag),
        )
    })
}

// --- Individual instruction parsers ---

fn parse_from(rest: &str, index: usize, line_num: usize) -> Result<Stage> {
    let (flags, rest) = split_flags(rest);
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "FROM requires an image argument"));
    }

    let mut platform = None;
    for (flag, value) in flags {
        match flag.as_str() {
            "platform" => platform = Some(require_value("FROM", &flag, value, line_num)?),
            _ => return Err(unknown_flag("FROM", &flag, line_num)),
        }
    }

    // Check for AS alias: FROM image AS alias
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let (base_name, name) = match parts.as_slice() {
        [image] => (image.to_string(), None),
        [image, as_kw, alias] if as_kw.eq_ignore_ascii_case("AS") => {
            (image.to_string(), Some(alias.to_string()))
        }
        _ => {
            return Err(ConvertError::parse(
                line_num,
                format!("Invalid FROM '{}': expected FROM <image> [AS <name>]", rest),
            ))
        }
    };

    Ok(Stage {
        index,
        name,
        base_name,
        platform,
        commands: Vec::new(),
    })
}

fn parse_run(rest: &str, line_num: usize) -> Result<Instruction> {
    let (flags, rest) = split_flags(rest);
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "RUN requires a command"));
    }

    let mut mount_specs = Vec::new();
    for (flag, value) in flags {
        match flag.as_str() {
            "mount" => mount_specs.push(require_value("RUN", &flag, value, line_num)?),
            "network" | "security" => {
                tracing::debug!(line = line_num, flag = flag.as_str(), "Ignoring RUN flag");
            }
            _ => return Err(unknown_flag("RUN", &flag, line_num)),
        }
    }

    let cmd_line = if rest.starts_with('[') {
        parse_json_array(rest, line_num)?
    } else {
        vec![rest.to_string()]
    };

    Ok(Instruction::Run(RunCommand {
        cmd_line,
        mount_specs,
    }))
}

fn parse_copy(rest: &str, line_num: usize) -> Result<Instruction> {
    let (flags, rest) = split_flags(rest);
    if rest.is_empty() {
        return Err(ConvertError::parse(
            line_num,
            "COPY requires source and destination",
        ));
    }

    let mut from = None;
    for (flag, value) in flags {
        match flag.as_str() {
            "from" => from = Some(require_value("COPY", &flag, value, line_num)?),
            "chown" | "chmod" | "link" | "parents" | "exclude" => {
                tracing::debug!(line = line_num, flag = flag.as_str(), "Ignoring COPY flag");
            }
            _ => return Err(unknown_flag("COPY", &flag, line_num)),
        }
    }

    // Split remaining into src... dst (last element is dst)
    let mut parts = if rest.starts_with('[') {
        parse_json_array(rest, line_num)?
    } else {
        split_words(rest)
    };
    if parts.len() < 2 {
        return Err(ConvertError::parse(
            line_num,
            "COPY requires at least one source and a destination",
        ));
    }

    let dest_path = parts.pop().unwrap_or_default();
    Ok(Instruction::Copy(CopyCommand {
        source_paths: parts,
        dest_path,
        from,
    }))
}

fn parse_workdir(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "WORKDIR requires a path"));
    }
    Ok(Instruction::Workdir {
        path: rest.to_string(),
    })
}

fn parse_env(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "ENV requires a key and value"));
    }
    Ok(Instruction::Env {
        env: parse_key_values(rest, "ENV", line_num)?,
    })
}

fn parse_label(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "LABEL requires key=value"));
    }
    Ok(Instruction::Label {
        labels: parse_key_values(rest, "LABEL", line_num)?,
    })
}

/// Parse `k=v k2="v 2"` pairs, or the legacy single `KEY value` form.
fn parse_key_values(rest: &str, instruction: &str, line_num: usize) -> Result<Vec<KeyValue>> {
    let (first, remainder) = split_first_word(rest);
    if !first.contains('=') {
        // Legacy form: KEY VALUE
        if remainder.is_empty() {
            return Err(ConvertError::parse(
                line_num,
                format!("{} {} is missing a value", instruction, first),
            ));
        }
        return Ok(vec![KeyValue::new(first, unquote(remainder))]);
    }

    split_words(rest)
        .into_iter()
        .map(|word| match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(KeyValue::new(key, value)),
            _ => Err(ConvertError::parse(
                line_num,
                format!("{} expects key=value, got '{}'", instruction, word),
            )),
        })
        .collect()
}

fn parse_exec_or_shell(rest: &str, instruction: &str, line_num: usize) -> Result<Vec<String>> {
    if rest.is_empty() {
        return Err(ConvertError::parse(
            line_num,
            format!("{} requires an argument", instruction),
        ));
    }

    if rest.starts_with('[') {
        parse_json_array(rest, line_num)
    } else {
        // Shell form: wrap in sh -c
        Ok(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            rest.to_string(),
        ])
    }
}

fn parse_expose(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "EXPOSE requires a port"));
    }
    Ok(Instruction::Expose {
        ports: rest.split_whitespace().map(str::to_string).collect(),
    })
}

fn parse_user(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "USER requires a username"));
    }
    Ok(Instruction::User {
        user: rest.split_whitespace().next().unwrap_or(rest).to_string(),
    })
}

fn parse_volume(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "VOLUME requires a path"));
    }
    let volumes = if rest.starts_with('[') {
        parse_json_array(rest, line_num)?
    } else {
        split_words(rest)
    };
    Ok(Instruction::Volume { volumes })
}

fn parse_arg(rest: &str, line_num: usize) -> Result<Instruction> {
    if rest.is_empty() {
        return Err(ConvertError::parse(line_num, "ARG requires a name"));
    }

    let args = split_words(rest)
        .into_iter()
        .map(|word| match word.split_once('=') {
            Some((key, value)) => ArgDecl {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
            None => ArgDecl {
                key: word,
                value: None,
            },
        })
        .collect();

    Ok(Instruction::Arg(ArgCommand { args }))
}

// --- Helpers ---

/// Parse a JSON array string like `["a", "b", "c"]` into a Vec<String>.
fn parse_json_array(s: &str, line_num: usize) -> Result<Vec<String>> {
    serde_json::from_str(s).map_err(|e| {
        ConvertError::parse(line_num, format!("Invalid JSON array '{}': {}", s, e))
    })
}

/// Remove surrounding quotes from a string.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Whitespace split that respects quotes and backslash escapes.
///
/// Quotes are removed; an escaped character is kept without its backslash
/// outside single quotes.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => current.push(c),
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, _) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}
