//! Repeating-key XOR. Self-inverse, so the same call encodes and decodes.

use crate::error::DecodeError;

/// `output[i] = input[i] ^ key[i % key.len()]`.
pub fn apply(key: &[u8], input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if key.is_empty() {
        return Err(DecodeError::InvalidKey("XOR key is empty".to_string()));
    }
    Ok(input
        .iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect())
}
