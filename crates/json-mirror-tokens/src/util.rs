//! Byte scanners shared by the reader. String scanning and decoding follow
//! json-joy-json-pack's `JsonDecoder`: escapes are left to serde_json.

use crate::error::TokenError;

/// Finds the closing quote of a JSON string whose body starts at `x`.
///
/// Returns the index of the closing `"`.
pub(crate) fn find_ending_quote(data: &[u8], mut x: usize) -> Result<usize, TokenError> {
    while x < data.len() {
        match data[x] {
            b'"' => return Ok(x),
            b'\\' => x += 2,
            _ => x += 1,
        }
    }
    Err(TokenError::Invalid(x.min(data.len())))
}

/// Finds the byte just past the `]` matching the `[` at `x`.
pub(crate) fn find_array_end(data: &[u8], x: usize) -> Result<usize, TokenError> {
    let mut depth = 0usize;
    let mut i = x;
    while i < data.len() {
        match data[i] {
            b'"' => {
                i = find_ending_quote(data, i + 1)? + 1;
                continue;
            }
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(TokenError::Invalid(data.len()))
}

/// Decodes a JSON string body (between the quotes), handling escapes.
pub(crate) fn decode_json_string(bytes: &[u8]) -> Result<String, TokenError> {
    if !bytes.contains(&b'\\') {
        return std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| TokenError::InvalidUtf8);
    }
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    quoted.extend_from_slice(bytes);
    quoted.push(b'"');
    let s: String = serde_json::from_slice(&quoted)?;
    Ok(s)
}
