//! Instruction emitter: one chained builder call per instruction.

use typeconvert_core::error::Result;

use super::literal::{literal, quoted, template, value};
use super::naming::StageNames;
use super::refs::is_image_reference;
use crate::dockerfile::{
    BindMount, CacheMount, CacheSharing, CopyCommand, Instruction, Mount, MountKind, RunCommand,
    SecretMount, SshMount, TmpfsMount,
};
use crate::dockerfile::mount::{
    CACHE_DEFAULT_MODE, SECRET_DEFAULT_MODE, SSH_DEFAULT_ID, SSH_DEFAULT_MODE,
};

/// Runtime class implementing a mount flavor.
pub fn mount_class(kind: MountKind) -> &'static str {
    match kind {
        MountKind::Bind => "BindMount",
        MountKind::Cache => "CacheMount",
        MountKind::Tmpfs => "TmpfsMount",
        MountKind::Secret => "SecretMount",
        MountKind::Ssh => "SshMount",
    }
}

/// Emitted instruction chain of a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    /// Concatenated `\n  .call(...)` fragments
    pub text: String,
    /// Instructions that were skipped
    pub warnings: Vec<String>,
}

/// Emit the chained calls for `commands`, in order.
pub fn emit_chain(commands: &[Instruction], names: &StageNames, stage_id: &str) -> Result<Chain> {
    let mut chain = Chain::default();

    for command in commands {
        match command {
            Instruction::Entrypoint { cmd_line } => {
                call(&mut chain.text, "entrypoint", &command_array(cmd_line));
            }
            Instruction::Workdir { path } => call(&mut chain.text, "workdir", &quoted(path)),
            Instruction::Run(run) => call(&mut chain.text, "run", &run_arguments(run, names)?),
            Instruction::Env { env } => {
                for kv in env {
                    let args = format!("{}, {}", literal(&kv.key), literal(&kv.value));
                    call(&mut chain.text, "env", &args);
                }
            }
            Instruction::Copy(copy) => chain.text.push_str(&copy_call(copy, names)),
            Instruction::Label { labels } => {
                for kv in labels {
                    let args = format!("{}, {}", literal(&kv.key), literal(&kv.value));
                    call(&mut chain.text, "label", &args);
                }
            }
            Instruction::User { user } => call(&mut chain.text, "user", &literal(user)),
            Instruction::Volume { volumes } => {
                for volume in volumes {
                    call(&mut chain.text, "volume", &literal(volume));
                }
            }
            // Declared in the stage preamble
            Instruction::Arg(_) => {}
            Instruction::Cmd { cmd_line } => call(&mut chain.text, "cmd", &command_array(cmd_line)),
            Instruction::Expose { ports } => {
                for port in ports {
                    call(&mut chain.text, "expose", &literal(port));
                }
            }
            Instruction::Unknown { keyword, original } => {
                tracing::warn!(
                    stage = stage_id,
                    instruction = keyword.as_str(),
                    "Unknown instruction, skipping"
                );
                chain.warnings.push(format!(
                    "{}: skipped unsupported instruction {} {}",
                    stage_id, keyword, original
                ));
            }
        }
    }

    Ok(chain)
}

/// Append `\n  .method(args)`.
pub fn call(out: &mut String, method: &str, args: &str) {
    out.push_str(&format!("\n  .{}({})", method, args));
}

fn command_array(cmd_line: &[String]) -> String {
    let items: Vec<String> = cmd_line.iter().map(|c| literal(c)).collect();
    format!("[{}]", items.join(", "))
}

/// Arguments of a `.run(...)` call. Tokens are joined without a separator.
fn run_arguments(run: &RunCommand, names: &StageNames) -> Result<String> {
    let expanded = run.expand(|_| None)?;
    let command = template(&expanded.cmd_line.concat());

    if expanded.mounts.is_empty() {
        return Ok(command);
    }

    let mounts: Vec<String> = expanded
        .mounts
        .iter()
        .map(|m| render_mount(m, names))
        .collect();
    Ok(format!("{}, [{}]", command, mounts.join(", ")))
}

fn copy_call(copy: &CopyCommand, names: &StageNames) -> String {
    let mut out = String::from("\n  .copy({\n");
    if let Some(from) = &copy.from {
        let from = if is_image_reference(from) {
            format!("new Image({})", quoted(from))
        } else {
            names.resolve(from)
        };
        out.push_str(&format!("    from: {},\n", from));
    }
    out.push_str(&format!(
        "    source: {},\n    destination: {}\n  }})",
        literal(&copy.source_paths.join(",")),
        literal(&copy.dest_path)
    ));
    out
}

/// `new <Class>({ ... })` with only the fields that differ from the
/// flavor's defaults.
pub fn render_mount(mount: &Mount, names: &StageNames) -> String {
    let fields = match mount {
        Mount::Bind(m) => bind_fields(m, names),
        Mount::Cache(m) => cache_fields(m, names),
        Mount::Tmpfs(m) => tmpfs_fields(m),
        Mount::Secret(m) => secret_fields(m),
        Mount::Ssh(m) => ssh_fields(m),
    };

    let class = mount_class(mount.kind());
    if fields.is_empty() {
        format!("new {}({{}})", class)
    } else {
        let body: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        format!("new {}({{ {} }})", class, body.join(", "))
    }
}

type Fields = Vec<(&'static str, String)>;

fn push_text(fields: &mut Fields, key: &'static str, text: Option<&str>) {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        fields.push((key, value(text)));
    }
}

fn push_from(fields: &mut Fields, from: Option<&str>, names: &StageNames) {
    if let Some(from) = from.filter(|f| !f.is_empty()) {
        fields.push(("from", names.resolve(from)));
    }
}

fn push_ownership(fields: &mut Fields, mode: u32, default_mode: u32, uid: u32, gid: u32) {
    if mode != default_mode {
        fields.push(("mode", format!("0o{:o}", mode)));
    }
    if uid != 0 {
        fields.push(("uid", uid.to_string()));
    }
    if gid != 0 {
        fields.push(("gid", gid.to_string()));
    }
}

fn bind_fields(m: &BindMount, names: &StageNames) -> Fields {
    let mut fields = Fields::new();
    push_from(&mut fields, m.from.as_deref(), names);
    push_text(&mut fields, "source", m.source.as_deref());
    push_text(&mut fields, "target", Some(&m.target));
    if !m.read_only {
        fields.push(("readonly", "false".to_string()));
    }
    fields
}

fn cache_fields(m: &CacheMount, names: &StageNames) -> Fields {
    let mut fields = Fields::new();
    push_text(&mut fields, "id", m.id.as_deref());
    push_from(&mut fields, m.from.as_deref(), names);
    push_text(&mut fields, "source", m.source.as_deref());
    push_text(&mut fields, "target", Some(&m.target));
    if m.read_only {
        fields.push(("readonly", "true".to_string()));
    }
    if m.sharing != CacheSharing::Shared {
        fields.push(("sharing", quoted(m.sharing.as_str())));
    }
    push_ownership(&mut fields, m.mode, CACHE_DEFAULT_MODE, m.uid, m.gid);
    fields
}

fn tmpfs_fields(m: &TmpfsMount) -> Fields {
    let mut fields = Fields::new();
    push_text(&mut fields, "target", Some(&m.target));
    if m.size != 0 {
        fields.push(("size", m.size.to_string()));
    }
    fields
}

fn secret_fields(m: &SecretMount) -> Fields {
    let mut fields = Fields::new();
    push_text(&mut fields, "id", m.id.as_deref());
    push_text(&mut fields, "target", m.target.as_deref());
    push_ownership(&mut fields, m.mode, SECRET_DEFAULT_MODE, m.uid, m.gid);
    if m.required {
        fields.push(("required", "true".to_string()));
    }
    fields
}

fn ssh_fields(m: &SshMount) -> Fields {
    let mut fields = Fields::new();
    if m.id != SSH_DEFAULT_ID {
        push_text(&mut fields, "id", Some(&m.id));
    }
    push_text(&mut fields, "target", m.target.as_deref());
    push_ownership(&mut fields, m.mode, SSH_DEFAULT_MODE, m.uid, m.gid);
    if m.required {
        fields.push(("required", "true".to_string()));
    }
    fields
}
