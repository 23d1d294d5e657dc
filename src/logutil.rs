//! Log helpers for chat text.
//!
//! Rendered boxes and admin dumps are multi-line and full of emoji; logs stay
//! one line per event by escaping control characters and capping length.

/// Longest chat text preview written to the log, in characters.
pub const MAX_PREVIEW: usize = 120;

/// Single-line, length-capped rendering of `s` for logging.
pub fn preview(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW * 4) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
