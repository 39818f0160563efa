//! Shared PDF object helpers used by the analyzer and the remover.

use lopdf::{Dictionary, Document, Object};

/// Resolve a value that might be inline or a reference to a dictionary.
pub fn resolve_dict<'a>(document: &'a Document, value: &'a Object) -> Option<&'a Dictionary> {
    match value.as_reference() {
        Ok(id) => document.get_object(id).ok()?.as_dict().ok(),
        Err(_) => value.as_dict().ok(),
    }
}

/// Decode a PDF text string into a Rust `String`.
///
/// Strings starting with the UTF-16BE byte order mark are decoded as UTF-16;
/// anything else is treated as PDFDocEncoding, which agrees with Latin-1 for
/// the characters that show up in document-info entries.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Extract a string value from a PDF dictionary for a given key, following
/// an indirect reference if the entry is one.
///
/// Returns `Some(String)` if the key exists and holds a non-empty string,
/// `None` otherwise.
pub fn extract_string_from_dict(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let value = dict.get(key).ok()?;
    let value = match value.as_reference() {
        Ok(id) => document.get_object(id).ok()?,
        Err(_) => value,
    };
    value
        .as_str()
        .ok()
        .map(decode_text_string)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i', 0x00, 0xE9];
        assert_eq!(decode_text_string(&bytes), "Hié");
    }

    #[test]
    fn decodes_single_byte_strings() {
        assert_eq!(decode_text_string(b"Quarterly report"), "Quarterly report");
        assert_eq!(decode_text_string(&[b'c', b'a', b'f', 0xE9]), "café");
    }
}
