//! Filename sanitizing and token helpers.
//!
//! Everything here is total: any input string yields a usable answer, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Returned whenever sanitizing leaves nothing behind.
pub const FALLBACK_NAME: &str = "untitled";

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Reserved on at least one common filesystem, or awkward in shells.
static RE_RESERVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|()\[\]{},;`'~!#$%^&+=]+"#).unwrap());

// Whitelist: ASCII alphanumerics, Hangul syllables and `._@-`.
static RE_OUTSIDE_WHITELIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z\x{AC00}-\x{D7A3}._@-]+").unwrap());

static RE_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

const OPENING_DECORATIONS: &[char] = &['"', '\'', '`', '<', '(', '[', '{'];
const CLOSING_DECORATIONS: &[char] = &['"', '\'', '`', '>', ')', ']', '}'];

/// Map arbitrary text to a filesystem-safe filename token.
///
/// The result is never empty, holds no path separators or reserved characters,
/// and feeding it back in returns it unchanged.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    // Whitespace and punctuation go first so that decorated or path-like input
    // degrades to underscores instead of vanishing in the whitelist pass.
    let out = RE_WHITESPACE.replace_all(trimmed, "_");
    let out = RE_RESERVED.replace_all(&out, "_");
    let out = RE_OUTSIDE_WHITELIST.replace_all(&out, "_");
    let out = RE_UNDERSCORES.replace_all(&out, "_");
    let out = out.trim_matches('_');

    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out.to_string()
    }
}

/// Pull a plausible file name out of a decorated token.
///
/// Strips surrounding quotes/brackets, then keeps the last non-empty path
/// segment: `` `"src/app.py"` `` becomes `app.py`.
pub fn basename_like(token: &str) -> String {
    let stripped = token
        .trim()
        .trim_start_matches(OPENING_DECORATIONS)
        .trim_end_matches(CLOSING_DECORATIONS);

    stripped
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Syntactic extension guess: the word characters right after the last `.`.
///
/// Returns an empty string when there is no dot or nothing word-like follows it.
pub fn extract_ext_from_token(token: &str) -> String {
    let token = token.trim();
    let Some(dot) = token.rfind('.') else {
        return String::new();
    };
    token[dot + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
