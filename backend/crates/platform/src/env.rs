//! Environment Variable Expansion
//!
//! Expands `$NAME` and `${NAME}` placeholders in configuration text.
//! Lookups go through a caller-supplied function so expansion stays pure;
//! pass [`process_env`] to read the real process environment.
//!
//! Unknown variables are left as written, matching shell `expandvars`.
//! `$$` stands for a literal `$`; [`escape_vars`] produces text that
//! [`expand_vars`] turns back into the original.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("placeholder pattern is valid")
});

/// Expand placeholders in `text` using `lookup`.
///
/// ## Examples
/// ```rust
/// use platform::env::expand_vars;
///
/// let lookup = |name: &str| (name == "HOME").then(|| "/home/alice".to_string());
/// assert_eq!(expand_vars("${HOME}/runs", lookup), "/home/alice/runs");
/// assert_eq!(expand_vars("$MISSING/runs", lookup), "$MISSING/runs");
/// assert_eq!(expand_vars("$${HOME}", lookup), "${HOME}");
/// ```
pub fn expand_vars<'a, F>(text: &'a str, lookup: F) -> Cow<'a, str>
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            return "$".to_string();
        };
        lookup(name.as_str()).unwrap_or_else(|| caps[0].to_string())
    })
}

/// Double every `$` so that [`expand_vars`] yields `text` unchanged.
pub fn escape_vars(text: &str) -> Cow<'_, str> {
    if text.contains('$') {
        Cow::Owned(text.replace('$', "$$"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Lookup backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed(name: &str) -> Option<String> {
        match name {
            "DATA_ROOT" => Some("/data".to_string()),
            "PORT" => Some("9000".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_braced_and_bare_forms() {
        assert_eq!(expand_vars("${DATA_ROOT}/runs", fixed), "/data/runs");
        assert_eq!(expand_vars("$DATA_ROOT/runs", fixed), "/data/runs");
        assert_eq!(expand_vars("http://minio:$PORT", fixed), "http://minio:9000");
    }

    #[test]
    fn test_unknown_left_untouched() {
        assert_eq!(expand_vars("${NOPE}/x", fixed), "${NOPE}/x");
        assert_eq!(expand_vars("$NOPE", fixed), "$NOPE");
    }

    #[test]
    fn test_no_placeholders_borrows() {
        let out = expand_vars("plain text", fixed);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_lone_dollar() {
        assert_eq!(expand_vars("cost: $5", fixed), "cost: $5");
        assert_eq!(expand_vars("trailing $", fixed), "trailing $");
    }

    #[test]
    fn test_double_dollar_is_literal() {
        assert_eq!(expand_vars("$$DATA_ROOT/runs", fixed), "$DATA_ROOT/runs");
        assert_eq!(expand_vars("$${DATA_ROOT}", fixed), "${DATA_ROOT}");
        assert_eq!(expand_vars("$$$DATA_ROOT", fixed), "$/data");
    }

    #[test]
    fn test_escaped_text_expands_to_itself() {
        for text in [
            "${DATA_ROOT}/rnaseq",
            "costs $DATA_ROOT dollars",
            "run_\\d+$",
            "$$",
            "$5 and $$PORT",
            "plain",
        ] {
            assert_eq!(expand_vars(&escape_vars(text), fixed), text, "{text}");
        }
        assert!(matches!(escape_vars("plain"), Cow::Borrowed(_)));
    }

    proptest! {
        #[test]
        fn prop_escape_then_expand_is_identity(text in "[a-zA-Z_{}$/ 0-9]{0,40}") {
            let escaped = escape_vars(&text);
            prop_assert_eq!(expand_vars(&escaped, fixed), text.as_str());
        }
    }
}
