// src/normalize.rs
//! Title comparison keys.
//!
//! `normalize` lower-cases, drops everything that is neither a word character
//! nor whitespace, collapses whitespace runs and trims. It is pure and cheap;
//! the clusterer calls it once per item per run.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_non_word() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // (?u): word characters include non-Latin scripts, so Devanagari titles keep their text.
    RE.get_or_init(|| Regex::new(r"(?u)[^\w\s]").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Comparison key for a headline. Empty input yields an empty key.
pub fn normalize(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }
    let lower = title.to_lowercase();
    let stripped = re_non_word().replace_all(&lower, "");
    re_ws().replace_all(&stripped, " ").trim().to_string()
}

/// Same as [`normalize`] for optional titles.
pub fn normalize_opt(title: Option<&str>) -> String {
    title.map(normalize).unwrap_or_default()
}
