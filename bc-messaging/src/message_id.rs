// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use rand::RngCore;

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a message id of the form `<id-left@id-right>`, where
/// `id-right` is the node's configured id and `id-left` is
/// `base36(timestamp_ms) "." hex(16-random-bytes)` (spec §4.10).
pub fn generate_message_id(node_id: &str, timestamp_ms: u64) -> Result<String, Error> {
    validate_node_id(node_id)?;
    let mut random_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    let id_left = format!("{}.{}", to_base36(timestamp_ms), hex::encode(random_bytes));
    Ok(format!("<{id_left}@{node_id}>"))
}

fn validate_node_id(node_id: &str) -> Result<(), Error> {
    if node_id.is_empty() {
        return Err(Error::FieldEmpty("nodeId"));
    }
    if !node_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
        return Err(Error::InvalidMessageId(format!(
            "nodeId '{node_id}' contains characters outside [A-Za-z0-9.-]"
        )));
    }
    Ok(())
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ASCII")
}

/// Validates the `<id-left@id-right>` shape: exactly one `@` between
/// brackets, both halves non-empty.
pub fn validate_message_id(id: &str) -> Result<(), Error> {
    let inner = id
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| Error::InvalidMessageId(id.to_string()))?;

    let mut parts = inner.splitn(2, '@');
    let left = parts.next().unwrap_or("");
    let right = match parts.next() {
        Some(r) if !r.contains('@') => r,
        _ => return Err(Error::InvalidMessageId(id.to_string())),
    };

    if left.is_empty() || right.is_empty() {
        return Err(Error::InvalidMessageId(id.to_string()));
    }
    Ok(())
}
