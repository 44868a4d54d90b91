//! Field tokenizer for keybind text lines
//!
//! Line grammar: `<fieldName>[: <value>]`. The first colon is the delimiter;
//! a line without any colon is not an assignment.

use crate::models::FieldRecord;

/// Split one raw line into a [`FieldRecord`]
///
/// Never fails. A line without a colon yields `has_colon = false`, the whole
/// trimmed line as `field_name` and an empty `value`.
pub fn tokenize_line(line: &str) -> FieldRecord {
    match line.split_once(':') {
        Some((name, value)) => FieldRecord {
            field_name: name.trim().to_string(),
            has_colon: true,
            value: value.trim().to_string(),
        },
        None => FieldRecord {
            field_name: line.trim().to_string(),
            has_colon: false,
            value: String::new(),
        },
    }
}

/// Tokenize every line of a text, paired with its 1-based line number
pub fn tokenize_lines(text: &str) -> impl Iterator<Item = (usize, FieldRecord)> + '_ {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, tokenize_line(line)))
}
