//! Cross-stage and argument references of a single stage.

use std::collections::BTreeSet;

use typeconvert_core::error::Result;

use super::naming::StageNames;
use crate::dockerfile::{Instruction, MountKind, Stage};

/// Whether a COPY `--from` value names an image rather than a stage.
pub fn is_image_reference(from: &str) -> bool {
    from.contains('/')
}

/// Everything a stage pulls in from outside its own instruction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    /// Sibling stage this stage is built on
    pub base_stage: Option<usize>,
    /// Identifiers of stages used by COPY `--from` or mount `from`, in
    /// order of first use
    pub stage_imports: Vec<String>,
    /// Mount flavors used by RUN instructions
    pub mount_kinds: BTreeSet<MountKind>,
    /// Names declared by the stage's own ARG instructions, in order
    pub local_args: Vec<String>,
    /// A COPY reads from an external image
    pub copies_from_image: bool,
}

impl References {
    /// Scan `stage`. RUN instructions are expanded before their mounts are
    /// inspected, so expansion errors surface here.
    pub fn extract(stage: &Stage, names: &StageNames) -> Result<Self> {
        let mut refs = References {
            base_stage: names.base_stage(stage),
            ..Default::default()
        };

        for command in &stage.commands {
            match command {
                Instruction::Copy(copy) => {
                    if let Some(from) = &copy.from {
                        if is_image_reference(from) {
                            refs.copies_from_image = true;
                        } else {
                            push_unique(&mut refs.stage_imports, names.resolve(from));
                        }
                    }
                }
                Instruction::Run(run) => {
                    let expanded = run.expand(|_| None)?;
                    for mount in &expanded.mounts {
                        refs.mount_kinds.insert(mount.kind());
                        if let Some(from) = mount.from() {
                            push_unique(&mut refs.stage_imports, names.resolve(from));
                        }
                    }
                }
                Instruction::Arg(arg) => {
                    for decl in &arg.args {
                        push_unique(&mut refs.local_args, decl.key.clone());
                    }
                }
                _ => {}
            }
        }

        Ok(refs)
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
