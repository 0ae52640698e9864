//! Global build arguments.
//!
//! ARGs declared before the first FROM are exported once from a shared
//! module; stages import the ones they reference under an `ARG_` alias.

use std::collections::BTreeMap;

use typeconvert_core::CodegenConfig;

use super::literal::quoted;
use crate::dockerfile::ArgCommand;

/// Prefix applied to global arguments on import.
pub const IMPORT_PREFIX: &str = "ARG_";

/// Scope an argument name resolves to inside a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgScope {
    /// Imported from the shared arguments module
    Global,
    /// Declared in the stage with `buildArg`
    Local,
}

/// Global argument name → default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    defaults: BTreeMap<String, String>,
}

impl GlobalArgs {
    /// Collect the global ARG declarations that carry a default value.
    ///
    /// A later declaration of the same name replaces the earlier default.
    pub fn from_meta(meta_args: &[ArgCommand]) -> Self {
        let defaults = meta_args
            .iter()
            .flat_map(|cmd| cmd.args.iter())
            .filter_map(|arg| arg.value.as_ref().map(|v| (arg.key.clone(), v.clone())))
            .collect();
        Self { defaults }
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    pub fn scope(&self, name: &str) -> ArgScope {
        if self.defaults.contains_key(name) {
            ArgScope::Global
        } else {
            ArgScope::Local
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Source of the shared arguments module.
    pub fn render_module(&self, config: &CodegenConfig) -> String {
        let mut out = format!("{}\n\n", config.syntax_header);
        out.push_str(&format!(
            "import {{ buildArg }} from {};\n\n",
            quoted(&config.library_url)
        ));

        for (name, default) in self.iter() {
            out.push_str(&format!(
                "export const {} = buildArg({}, {});\n",
                name,
                quoted(name),
                quoted(default)
            ));
        }

        out
    }
}

/// Local alias of an imported global argument, e.g. `ARG_VERSION`.
pub fn import_alias(name: &str) -> String {
    format!("{}{}", IMPORT_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::ArgDecl;

    #[test]
    fn test_from_meta_skips_missing_defaults() {
        let meta = vec![
            ArgCommand::single("VERSION", Some("1.0")),
            ArgCommand::single("NO_DEFAULT", None),
        ];
        let globals = GlobalArgs::from_meta(&meta);
        assert_eq!(globals.len(), 1);
        assert_eq!(globals.get("VERSION"), Some("1.0"));
        assert_eq!(globals.get("NO_DEFAULT"), None);
        assert_eq!(globals.scope("VERSION"), ArgScope::Global);
        assert_eq!(globals.scope("NO_DEFAULT"), ArgScope::Local);
    }

    #[test]
    fn test_from_meta_later_default_wins() {
        let meta = vec![ArgCommand {
            args: vec![
                ArgDecl {
                    key: "TAG".to_string(),
                    value: Some("a".to_string()),
                },
                ArgDecl {
                    key: "TAG".to_string(),
                    value: Some("b".to_string()),
                },
            ],
        }];
        assert_eq!(GlobalArgs::from_meta(&meta).get("TAG"), Some("b"));
    }

    #[test]
    fn test_from_meta_empty() {
        assert!(GlobalArgs::from_meta(&[]).is_empty());
    }

    #[test]
    fn test_render_module() {
        let meta = vec![
            ArgCommand::single("VERSION", Some("1.0")),
            ArgCommand::single("BASE", Some("alpine")),
        ];
        let rendered = GlobalArgs::from_meta(&meta).render_module(&CodegenConfig::default());
        assert_eq!(
            rendered,
            "//syntax=rumpl/typebuild\n\n\
             import { buildArg } from \"https://raw.githubusercontent.com/rumpl/typebuild-node/main/index.ts\";\n\n\
             export const BASE = buildArg(\"BASE\", \"alpine\");\n\
             export const VERSION = buildArg(\"VERSION\", \"1.0\");\n"
        );
    }

    #[test]
    fn test_import_alias() {
        assert_eq!(import_alias("VERSION"), "ARG_VERSION");
    }
}
