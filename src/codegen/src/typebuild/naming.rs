//! Stage identifiers.
//!
//! Every stage gets one lowerCamel identifier, used as its variable name,
//! its module file stem and its import path. All identifiers are computed
//! up front so references always resolve to the same text.

use std::collections::{HashMap, HashSet};

use typeconvert_core::error::{ConvertError, Result};

use crate::dockerfile::Stage;

/// Convert text to lowerCamel case.
///
/// `_`, `-`, `.` and spaces start a new capitalized word, digits are kept
/// and capitalize the following letter, any other punctuation is dropped,
/// and runs of capitals are lowered (`golang:1.21-alpine` → `golang121Alpine`).
pub fn to_lower_camel(s: &str) -> String {
    let s = s.trim();
    let mut out = String::with_capacity(s.len());
    let mut cap_next = false;
    let mut prev_is_cap = false;

    for (i, c) in s.chars().enumerate() {
        let is_cap = c.is_ascii_uppercase();
        let is_low = c.is_ascii_lowercase();

        let c = if cap_next {
            c.to_ascii_uppercase()
        } else if i == 0 || (prev_is_cap && is_cap) {
            c.to_ascii_lowercase()
        } else {
            c
        };
        prev_is_cap = is_cap;

        if is_cap || is_low {
            out.push(c);
            cap_next = false;
        } else if c.is_ascii_digit() {
            out.push(c);
            cap_next = true;
        } else {
            cap_next = matches!(c, '_' | ' ' | '-' | '.');
        }
    }

    out
}

/// Words that cannot name a `const` in a generated module: ECMAScript
/// reserved words (strict mode included) and the runtime symbols every
/// module may import.
const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "with", "yield", "Image", "buildArg", "BindMount", "CacheMount", "TmpfsMount",
    "SecretMount", "SshMount",
];

/// Whether `name` cannot be declared as a module-level `const`.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Identifier table for a stage set.
#[derive(Debug, Clone)]
pub struct StageNames {
    identifiers: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl StageNames {
    /// Assign identifiers to `stages`.
    ///
    /// `reserved` names a module stem that no stage may take (the shared
    /// arguments module). Two stages resolving to the same identifier is
    /// an error.
    pub fn new(stages: &[Stage], reserved: Option<&str>) -> Result<Self> {
        let mut identifiers = Vec::with_capacity(stages.len());
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut by_name = HashMap::new();

        if let Some(reserved) = reserved {
            owners.insert(reserved.to_string(), "the build-argument module".to_string());
        }

        let declared: HashSet<&str> = stages.iter().filter_map(|s| s.name.as_deref()).collect();

        for stage in stages {
            let identifier = stage_identifier(stage, &declared);
            if let Some(first) = owners.get(&identifier) {
                return Err(ConvertError::StageCollision {
                    identifier,
                    first: first.clone(),
                    second: stage.display_name(),
                });
            }
            owners.insert(identifier.clone(), stage.display_name());

            if let Some(name) = &stage.name {
                by_name.entry(name.clone()).or_insert(identifiers.len());
            }
            identifiers.push(identifier);
        }

        Ok(Self {
            identifiers,
            by_name,
        })
    }

    /// Identifier of the stage at `index`.
    pub fn identifier(&self, index: usize) -> &str {
        &self.identifiers[index]
    }

    /// Index of the stage declared as `name`.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Index of the stage a `--from` value refers to: a declared name, or
    /// a positional index.
    pub fn find(&self, reference: &str) -> Option<usize> {
        self.lookup(reference).or_else(|| {
            reference
                .parse::<usize>()
                .ok()
                .filter(|idx| *idx < self.identifiers.len())
        })
    }

    /// Identifier to use for a `--from` value.
    pub fn resolve(&self, reference: &str) -> String {
        match self.find(reference) {
            Some(idx) => self.identifiers[idx].clone(),
            None => to_lower_camel(reference),
        }
    }

    /// Index of the sibling stage `stage` is built on, if its base image
    /// names another stage.
    pub fn base_stage(&self, stage: &Stage) -> Option<usize> {
        self.lookup(&stage.base_name)
            .filter(|idx| *idx != stage.index)
    }
}

/// An unnamed stage built on a sibling would take the sibling's
/// identifier, so it is numbered instead, as is any identifier that is a
/// reserved word.
fn stage_identifier(stage: &Stage, declared: &HashSet<&str>) -> String {
    let identifier = match &stage.name {
        Some(name) => to_lower_camel(name),
        None if declared.contains(stage.base_name.as_str()) => String::new(),
        None => to_lower_camel(&stage.base_name),
    };
    match identifier.chars().next() {
        Some(c) if !c.is_ascii_digit() && !is_reserved(&identifier) => identifier,
        _ => format!("stage{}", stage.index),
    }
}
