//! Anchor id derivation for section headings and subnav items.

/// Derive a fragment id from heading text.
///
/// Whitespace is trimmed and every character outside `[A-Za-z0-9_]` becomes
/// an underscore, so `"Wrap Up"` yields `"Wrap_Up"`.
pub fn anchor_id(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
