//! Shell-style variable expansion for instruction words.
//!
//! Recognises `$NAME`, `${NAME}`, `${NAME:-word}`, `${NAME-word}`,
//! `${NAME:+word}` and `${NAME+word}`. A reference is replaced only when the
//! lookup knows the name; every other reference is copied verbatim, so an
//! always-`None` lookup validates the word without changing it.

use typeconvert_core::error::{ConvertError, Result};

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Expand the variable references in `word`.
pub fn expand_word<F>(word: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(word.len());
    let mut rest = word;

    while let Some(pos) = rest.find(['$', '\\']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        // Escaped character: keep both the backslash and what follows
        if let Some(after) = tail.strip_prefix('\\') {
            match after.chars().next() {
                Some(c) => {
                    out.push('\\');
                    out.push(c);
                    rest = &after[c.len_utf8()..];
                }
                None => {
                    out.push('\\');
                    rest = after;
                }
            }
            continue;
        }

        let after = &tail[1..];
        if let Some(inner_start) = after.strip_prefix('{') {
            let close = inner_start.find('}').ok_or_else(|| {
                ConvertError::Expansion(format!("missing '}}' in '{}'", word))
            })?;
            let inner = &inner_start[..close];
            if inner.is_empty() {
                return Err(ConvertError::Expansion(format!(
                    "bad substitution '${{}}' in '{}'",
                    word
                )));
            }
            let original = &tail[..close + 3];
            out.push_str(&expand_braced(inner, original, &lookup));
            rest = &inner_start[close + 1..];
        } else {
            let name_len: usize = after
                .chars()
                .take_while(|c| is_name_char(*c))
                .map(char::len_utf8)
                .sum();
            if name_len == 0 {
                out.push('$');
                rest = after;
                continue;
            }
            let name = &after[..name_len];
            match lookup(name) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&tail[..name_len + 1]),
            }
            rest = &after[name_len..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Expand the body of a `${...}` reference. `original` is the full
/// reference text, returned when the name is unknown or the operator is
/// not one we evaluate.
fn expand_braced<F>(inner: &str, original: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let name_len: usize = inner
        .chars()
        .take_while(|c| is_name_char(*c))
        .map(char::len_utf8)
        .sum();
    if name_len == 0 {
        // ${#VAR} and friends
        return original.to_string();
    }

    let (name, op) = inner.split_at(name_len);
    let Some(value) = lookup(name) else {
        return original.to_string();
    };

    if op.is_empty() {
        value
    } else if let Some(word) = op.strip_prefix(":-") {
        if value.is_empty() {
            word.to_string()
        } else {
            value
        }
    } else if let Some(word) = op.strip_prefix(":+") {
        if value.is_empty() {
            String::new()
        } else {
            word.to_string()
        }
    } else if op.starts_with('-') {
        value
    } else if let Some(word) = op.strip_prefix('+') {
        word.to_string()
    } else {
        original.to_string()
    }
}
