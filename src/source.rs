//! The character source: hands the framer decoded lines in file order.
//!
//! Charset sniffing lives here. Only UTF-8 input is decoded; a UTF-8
//! BOM is stripped, and UTF-16/32 byte-order marks are rejected with a
//! descriptive error since multi-byte stream decoding is out of scope.

use crate::error::{ParseError, Result};
use std::fs;
use std::path::Path;

/// Decode a byte buffer into text suitable for line iteration.
pub fn decode_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) || bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF])
    {
        return Err(ParseError::Encoding {
            message: "UTF-32 input is not supported".to_string(),
            line: 1,
            column: 1,
        });
    }
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(ParseError::Encoding {
            message: "UTF-16 input is not supported".to_string(),
            line: 1,
            column: 1,
        });
    }
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding {
        message: format!("Input is not valid UTF-8: {}", e),
        line: 1,
        column: 1,
    })?;
    Ok(strip_bom(text).to_string())
}

/// Read and decode a file.
pub fn read_path(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    decode_bytes(&bytes)
}

/// Strip a leading UTF-8 BOM.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Iterate decoded lines with their 1-based line numbers.
///
/// Splits on `\n` and strips a trailing `\r` so CRLF input parses the
/// same as LF input. A trailing newline does not produce a final empty
/// line.
pub fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    trimmed.split('\n').enumerate().map(|(i, raw)| {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        (i + 1, raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}a: 1"), "a: 1");
        assert_eq!(strip_bom("a: 1"), "a: 1");
    }

    #[test]
    fn test_decode_rejects_utf16() {
        let err = decode_bytes(&[0xFF, 0xFE, 0x61, 0x00]).unwrap_err();
        assert!(err.to_string().contains("UTF-16"));
    }

    #[test]
    fn test_lines_crlf() {
        let collected: Vec<_> = lines("a: 1\r\nb: 2\n").collect();
        assert_eq!(collected, vec![(1, "a: 1"), (2, "b: 2")]);
    }

    #[test]
    fn test_lines_empty_input() {
        let collected: Vec<_> = lines("").collect();
        assert_eq!(collected, vec![(1, "")]);
    }
}
