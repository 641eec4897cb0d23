//! Line-level view of one candidate block.
//!
//! A block is expected to be `{` on its own line, one key/value pair per
//! line, and `}` on the last line. Position matters: the first line and the
//! final two trailer lines (the last pair, which carries no trailing comma,
//! and the closing brace) are structural and exempt from per-line scrutiny.

/// Split a block into its ordered lines.
pub fn split_block(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Re-join lines into block text.
pub fn reassemble(lines: &[String]) -> String {
    lines.join("\n")
}

/// The interior lines subject to per-line rules: everything except the
/// opening brace line and the two trailer lines. Empty for short blocks.
pub fn scrutinized<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    lines
        .get(1..lines.len().saturating_sub(2))
        .unwrap_or_default()
}
