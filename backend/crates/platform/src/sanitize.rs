//! Text Sanitization
//!
//! Strips markup and script content from untrusted free text before it is
//! accepted into a model instance.
//!
//! ## Pipeline
//! 1. NFKC normalization (folds full-width `＜` and friends into ASCII)
//! 2. `<script>` / `<style>` blocks are removed together with their content;
//!    an unclosed block swallows the rest of the input
//! 3. every remaining tag is removed, then stray `<` / `>`
//! 4. control characters other than `\n` and `\t` are removed
//! 5. surrounding whitespace is trimmed
//!
//! The pipeline is repeated until the output stops changing, so
//! `sanitize_text(sanitize_text(x)) == sanitize_text(x)` for every `x`.
//! Removal can join fragments (`<scr<script>…`), which is why a single pass
//! is not enough.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Upper bound on pipeline passes. Converges in at most three.
const MAX_PASSES: usize = 8;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*(?:script|style)\b[^>]*>.*?(?:<\s*/\s*(?:script|style)\s*>|\z)")
        .expect("script block pattern is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^<>]*>").expect("tag pattern is valid"));

/// Strip disallowed markup and script content. Never fails.
pub fn sanitize_text(raw: &str) -> String {
    let mut current = single_pass(raw);
    for _ in 1..MAX_PASSES {
        let next = single_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current != raw {
        tracing::trace!(
            input_len = raw.len(),
            output_len = current.len(),
            "sanitized untrusted text"
        );
    }
    current
}

/// `true` when the text is already in sanitized form.
pub fn is_clean(text: &str) -> bool {
    sanitize_text(text) == text
}

fn single_pass(input: &str) -> String {
    let normalized: String = input.nfkc().collect();
    let without_blocks = SCRIPT_BLOCK.replace_all(&normalized, "");
    let without_tags = TAG.replace_all(&without_blocks, "");
    without_tags
        .chars()
        .filter(|&c| c != '<' && c != '>')
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}
