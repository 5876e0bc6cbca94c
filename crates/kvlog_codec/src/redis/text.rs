//! Single-byte text mapping for AOF lines.

/// Maps each byte to the char with the same code point (ISO 8859-1).
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
