//! Shell variable references to typebuild template interpolation.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Rewrite every bare `$NAME` reference into `${NAME}`.
///
/// Already-braced references are left alone; a literal `$` that is not
/// followed by an ASCII word character is untouched.
pub fn convert(text: &str) -> String {
    static BARE_REF: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\$([A-Za-z0-9_]+)").expect("bare reference pattern is valid")
    });

    BARE_REF
        .replace_all(text, |caps: &Captures| format!("${{{}}}", &caps[1]))
        .into_owned()
}

/// Names referenced as `${NAME}`, in order of appearance, duplicates kept.
pub fn used_vars(text: &str) -> Vec<String> {
    static BRACED_REF: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("braced reference pattern is valid")
    });

    BRACED_REF
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Names a string references once converted, duplicates removed.
pub fn referenced_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in used_vars(&convert(text)) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_bare_references() {
        assert_eq!(convert("app:$VERSION"), "app:${VERSION}");
        assert_eq!(convert("$A-$B_2"), "${A}-${B_2}");
        assert_eq!(convert("echo hi"), "echo hi");
    }

    #[test]
    fn test_convert_is_idempotent_on_braced_text() {
        let braced = "app:${VERSION} on ${PLATFORM}";
        assert_eq!(convert(braced), braced);
        assert_eq!(convert(&convert("x $Y z")), convert("x $Y z"));
    }

    #[test]
    fn test_convert_leaves_lone_dollar() {
        assert_eq!(convert("costs 5$ or $ 6"), "costs 5$ or $ 6");
    }

    #[test]
    fn test_names_are_ascii_words() {
        assert_eq!(convert("$FOOé"), "${FOO}é");
        assert_eq!(used_vars("${FOO}é ${BÄR}"), vec!["FOO".to_string()]);
    }

    #[test]
    fn test_used_vars_order_and_duplicates() {
        assert_eq!(
            used_vars(&convert("$B ${A} $B")),
            vec!["B".to_string(), "A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_used_vars_ignores_bare_and_operators() {
        assert!(used_vars("$PLAIN ${WITH:-default}").is_empty());
        assert!(used_vars("").is_empty());
    }

    #[test]
    fn test_referenced_names_dedup() {
        assert_eq!(
            referenced_names("$REGISTRY/app:${TAG}-$TAG"),
            vec!["REGISTRY".to_string(), "TAG".to_string()]
        );
    }
}
