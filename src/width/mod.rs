//! Display-width helpers for tab labels and breadcrumb trails.
//!
//! Labels can arrive with ANSI escapes or wide glyphs; everything that ends
//! up in a log line or a rendered trail is measured on stripped text.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Visible width of `text` with ANSI escape sequences removed.
pub fn display_width(text: &str) -> usize {
    let stripped = strip_ansi_escapes::strip(text);
    let clean = String::from_utf8_lossy(&stripped);
    UnicodeWidthStr::width(clean.as_ref())
}

/// Truncates `text` to at most `max_width` columns, appending an ellipsis
/// when anything was cut. Zero-width input or budget yields an empty string.
pub fn truncate_display(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let stripped = strip_ansi_escapes::strip(text);
    let clean = String::from_utf8_lossy(&stripped);

    let mut out = String::new();
    let mut used = 0usize;
    let budget = max_width.saturating_sub(1);
    for ch in clean.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if used < max_width {
        out.push('…');
    }
    out
}

/// Normalizes a human-facing label: ANSI stripped, surrounding space trimmed.
pub fn sanitize_label(label: &str) -> String {
    let stripped = strip_ansi_escapes::strip(label);
    String::from_utf8_lossy(&stripped).trim().to_string()
}
