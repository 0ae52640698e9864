//! String literal rendering for generated TypeScript.

use super::interpolate::{convert, used_vars};

/// Double-quoted string literal.
pub fn quoted(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Template literal whose `$NAME` / `${NAME}` references become
/// interpolations of the generated constants.
pub fn template(text: &str) -> String {
    format!("`{}`", convert(&escape_template(text)))
}

/// Template literal that reproduces `text` verbatim, including any `${`
/// sequences, which are left for the builder to expand.
pub fn literal(text: &str) -> String {
    format!("`{}`", escape_template(text).replace("${", "\\${"))
}

/// Plain string when `text` references no variables, template otherwise.
pub fn value(text: &str) -> String {
    if used_vars(&convert(text)).is_empty() {
        quoted(text)
    } else {
        template(text)
    }
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}
