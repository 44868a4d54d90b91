//! Command chain splitting
//!
//! Game commands bound to one key are stored either as a list or as a single
//! string joined with `$$`. Both shapes reduce to the same [`CommandChain`].

use serde_json::Value;

use crate::models::CommandChain;

/// Literal delimiter between commands in chain text
pub const COMMAND_DELIMITER: &str = "$$";

/// Split `$$`-delimited chain text into commands
///
/// Segments are trimmed and empty segments are discarded; relative order is kept.
pub fn split(raw: &str) -> CommandChain {
    CommandChain::from_commands(raw.split(COMMAND_DELIMITER))
}

/// Treat an already-split list as a chain, trimming each element and dropping empties
///
/// Elements are not split again, so `split_commands(chain.commands())` returns
/// an identical chain.
pub fn split_commands<I, S>(commands: I) -> CommandChain
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CommandChain::from_commands(commands)
}

/// Split a loosely-typed JSON value
///
/// Strings are split on `$$`, arrays are passed through element by element
/// (non-string elements are skipped), everything else yields an empty chain.
pub fn split_value(raw: &Value) -> CommandChain {
    match raw {
        Value::String(text) => split(text),
        Value::Array(items) => split_commands(items.iter().filter_map(Value::as_str)),
        other => {
            tracing::trace!("Cannot read commands from {}, using empty chain", other);
            CommandChain::empty()
        }
    }
}

pub(crate) fn clean_segments<I, S>(segments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|segment| segment.as_ref().trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}
