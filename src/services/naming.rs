//! Report file naming

use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fmt::Display;
use std::sync::OnceLock;

const MAX_NAME_CHARS: usize = 100;

struct Patterns {
    disallowed: Regex,
    underscores: Regex,
    dots: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        disallowed: Regex::new(r"[^\w.\-]").expect("valid regex"),
        underscores: Regex::new(r"_{2,}").expect("valid regex"),
        dots: Regex::new(r"\.{2,}").expect("valid regex"),
    })
}

/// Turn free text into a safe file name stem
///
/// Spaces become underscores, anything outside word characters, `.` and `-`
/// is dropped, runs of `_` or `.` collapse, and leading or trailing `_.-`
/// are trimmed. The result is at most 100 characters.
pub fn sanitize_filename(base: &str) -> String {
    if base.is_empty() {
        return "documento_sin_titulo".to_string();
    }

    let p = patterns();
    let s = base.replace(' ', "_");
    let s = p.disallowed.replace_all(&s, "");
    let s = p.underscores.replace_all(&s, "_");
    let s = p.dots.replace_all(&s, ".");
    let s = s.trim_matches(|c: char| c == '_' || c == '.' || c == '-');

    if s.is_empty() {
        return "doc_procesado".to_string();
    }
    s.chars().take(MAX_NAME_CHARS).collect()
}

/// `InformeEditado_<topic>_<YYYYmmddHHMMSS>`
pub fn report_file_name<Tz>(topic: &str, at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "InformeEditado_{}_{}.md",
        sanitize_filename(topic),
        at.format("%Y%m%d%H%M%S")
    )
}
