//! `{name}` placeholders filled in right before a shortcut runs.
//!
//! Shell parameter expansions such as `${HOME}` and the `find -exec ... {}`
//! marker are left alone.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{Result, YaError};

fn is_variable_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn placeholders(command: &str) -> Vec<(Range<usize>, &str)> {
    let bytes = command.as_bytes();
    let mut found = Vec::new();
    let mut index = 0usize;

    while index < bytes.len() {
        let opens_placeholder = bytes[index] == b'{' && (index == 0 || bytes[index - 1] != b'$');
        if opens_placeholder {
            if let Some(offset) = command[index + 1..].find('}') {
                let close = index + 1 + offset;
                let name = &command[index + 1..close];
                if is_variable_name(name) {
                    found.push((index..close + 1, name));
                    index = close + 1;
                    continue;
                }
            }
        }
        index += 1;
    }

    found
}

/// Placeholder names in first-appearance order, without duplicates.
pub fn extract_variables(command: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (_, name) in placeholders(command) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn substitute_variables(command: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut resolved = String::with_capacity(command.len());
    let mut cursor = 0usize;

    for (range, name) in placeholders(command) {
        let value = values
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| YaError::MissingVariable(name.to_string()))?;
        resolved.push_str(&command[cursor..range.start]);
        resolved.push_str(value);
        cursor = range.end;
    }

    resolved.push_str(&command[cursor..]);
    Ok(resolved)
}
