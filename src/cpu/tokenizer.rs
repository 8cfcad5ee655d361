//! Splits `/proc/cpuinfo`-style text into blocks and key/value fields.

/// Splits raw text into per-processor blocks.
///
/// Blocks are separated by a blank line; blocks holding only whitespace are
/// dropped.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let separator = if text.contains("\r\n\r\n") {
        "\r\n\r\n"
    } else {
        "\n\n"
    };

    text.split(separator)
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Splits a block into `(name, value)` pairs on the first colon of each line.
///
/// Both sides are trimmed. Lines without a colon are ignored. Key casing is
/// left untouched.
pub fn split_fields(block: &str) -> impl Iterator<Item = (&str, &str)> {
    block.lines().filter_map(|line| {
        let (name, value) = line.split_once(':')?;
        Some((name.trim(), value.trim()))
    })
}
