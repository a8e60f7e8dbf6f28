use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid separator pattern"));

/// Splits `text` into runs of ASCII letters and digits, in order.
///
/// Case is preserved; the index folds case on both sides of a lookup.
pub fn tokenize(text: &str) -> Vec<String> {
    SEPARATORS
        .split(text)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens of `text`, lowercased. Used for both indexing and querying.
pub fn tokenize_folded(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .map(|token| token.to_ascii_lowercase())
        .collect()
}
