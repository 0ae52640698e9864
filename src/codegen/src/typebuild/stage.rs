//! Stage emitter: assembles one complete typebuild module per stage.

use typeconvert_core::error::{ConvertError, Result};
use typeconvert_core::CodegenConfig;

use super::args::{import_alias, ArgScope, GlobalArgs};
use super::emit::{call, emit_chain, mount_class};
use super::interpolate::referenced_names;
use super::literal::{literal, quoted, template};
use super::naming::{is_reserved, StageNames};
use super::refs::References;
use crate::dockerfile::Stage;

/// Shared inputs for rendering every stage of a run.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub names: &'a StageNames,
    pub globals: &'a GlobalArgs,
    pub config: &'a CodegenConfig,
}

/// Source of one generated stage module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStage {
    /// Variable name and file stem
    pub identifier: String,
    pub text: String,
    pub warnings: Vec<String>,
}

/// Lines separated into groups; every non-empty group is followed by a
/// blank line, empty groups leave no trace.
#[derive(Debug, Default)]
struct Sections {
    out: String,
    current: Vec<String>,
}

impl Sections {
    fn line(&mut self, line: String) {
        self.current.push(line);
    }

    fn close(&mut self) {
        if self.current.is_empty() {
            return;
        }
        for line in self.current.drain(..) {
            self.out.push_str(&line);
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        self.close();
        self.out
    }
}

/// Render `stage` into module source.
pub fn render_stage(stage: &Stage, ctx: &StageContext<'_>) -> Result<RenderedStage> {
    let identifier = ctx.names.identifier(stage.index).to_string();
    let refs = References::extract(stage, ctx.names)?;
    let chain = emit_chain(&stage.commands, ctx.names, &identifier)?;

    let base_id = refs
        .base_stage
        .map(|idx| ctx.names.identifier(idx).to_string());

    // Variables referenced by the base image and platform strings
    let mut image_vars: Vec<String> = Vec::new();
    if base_id.is_none() {
        let platform = stage.platform.as_deref().unwrap_or_default();
        for name in referenced_names(&stage.base_name)
            .into_iter()
            .chain(referenced_names(platform))
        {
            if !image_vars.contains(&name) {
                image_vars.push(name);
            }
        }
    }

    let mut declared: Vec<&str> = Vec::new();
    let mut needs_build_arg = false;
    let mut promoted: Vec<&str> = Vec::new();
    for name in image_vars.iter().chain(refs.local_args.iter()) {
        if declared.contains(&name.as_str()) {
            continue;
        }
        declared.push(name);
        if ctx.globals.scope(name) == ArgScope::Local {
            needs_build_arg = true;
        }
    }
    for name in &refs.local_args {
        if ctx.globals.scope(name) == ArgScope::Local {
            promoted.push(name);
        }
    }

    // Sibling stage imports, base first
    let mut siblings: Vec<&str> = Vec::new();
    for sibling in base_id.iter().chain(refs.stage_imports.iter()) {
        if sibling != &identifier && !siblings.contains(&sibling.as_str()) {
            siblings.push(sibling);
        }
    }

    // Every argument becomes a module-level const
    if let Some(name) = declared
        .iter()
        .find(|name| is_reserved(name) || **name == identifier || siblings.contains(name))
    {
        return Err(ConvertError::ReservedArgument {
            name: name.to_string(),
            stage: stage.display_name(),
        });
    }

    let mut sections = Sections::default();
    sections.line(ctx.config.syntax_header.clone());
    sections.close();

    // Runtime imports
    let mut runtime = Vec::new();
    if base_id.is_none() || refs.copies_from_image {
        runtime.push("Image");
    }
    if needs_build_arg {
        runtime.push("buildArg");
    }
    if !runtime.is_empty() {
        sections.line(format!(
            "import {{ {} }} from {};",
            runtime.join(", "),
            quoted(&ctx.config.library_url)
        ));
    }
    sections.close();

    for kind in &refs.mount_kinds {
        sections.line(format!(
            "import {{ {} }} from {};",
            mount_class(*kind),
            quoted(&ctx.config.library_url)
        ));
    }
    sections.close();

    // Sibling stage imports
    for sibling in &siblings {
        sections.line(format!(
            "import {} from {};",
            sibling,
            quoted(&format!("./{}", ctx.config.file_name(sibling)))
        ));
    }
    sections.close();

    let imported: Vec<String> = declared
        .iter()
        .filter(|name| ctx.globals.scope(name) == ArgScope::Global)
        .map(|name| format!("{} as {}", name, import_alias(name)))
        .collect();
    if !imported.is_empty() {
        sections.line(format!(
            "import {{ {} }} from {};",
            imported.join(", "),
            quoted(&format!("./{}", ctx.config.file_name(&ctx.config.args_module)))
        ));
    }
    sections.close();

    match &base_id {
        Some(base) => {
            sections.line(format!("const {} = {};", identifier, base));
            sections.close();
        }
        None => {
            for name in &image_vars {
                sections.line(declaration(name, ctx.globals));
            }
            sections.close();

            let platform = match &stage.platform {
                Some(platform) => format!(", {}", template(platform)),
                None => String::new(),
            };
            sections.line(format!(
                "const {} = new Image({}{});",
                identifier,
                template(&stage.base_name),
                platform
            ));
            sections.close();
        }
    }

    for name in &refs.local_args {
        if !image_vars.contains(name) {
            sections.line(declaration(name, ctx.globals));
        }
    }
    sections.close();

    let mut text = sections.finish();
    text.push_str(&format!("export default {}", identifier));
    for name in &promoted {
        call(&mut text, "env", &format!("{}, {}", literal(name), name));
    }
    text.push_str(&chain.text);
    text.push_str(";\n");

    tracing::debug!(
        stage = identifier.as_str(),
        siblings = siblings.len(),
        args = declared.len(),
        "Rendered stage"
    );

    Ok(RenderedStage {
        identifier,
        text,
        warnings: chain.warnings,
    })
}

fn declaration(name: &str, globals: &GlobalArgs) -> String {
    match globals.scope(name) {
        ArgScope::Global => format!("const {} = {};", name, import_alias(name)),
        ArgScope::Local => format!("const {} = buildArg({});", name, quoted(name)),
    }
}
