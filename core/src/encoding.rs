//! Decoding the raw payload bytes into text.
//!
//! Attempts run in a fixed order: strict UTF-8, UTF-16, then Latin-1. Latin-1
//! maps every byte to a code point and cannot fail, so decoding always
//! produces text; a result that only Latin-1 accepted is flagged as low
//! confidence because non-ASCII content was probably mangled.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl Encoding {
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Latin1 => "latin-1",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A rejected decode attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeAttempt {
    pub encoding: Encoding,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub text: String,
    pub encoding: Encoding,
    /// Attempts that failed before `encoding` succeeded, in order.
    pub attempts: Vec<DecodeAttempt>,
}

impl DecodedPayload {
    pub fn low_confidence(&self) -> bool {
        self.encoding == Encoding::Latin1
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

pub fn decode_payload(bytes: &[u8]) -> DecodedPayload {
    let mut attempts = Vec::new();

    match decode_utf8_strict(bytes) {
        Ok(text) => {
            return DecodedPayload {
                text,
                encoding: Encoding::Utf8,
                attempts,
            }
        }
        Err(reason) => attempts.push(DecodeAttempt {
            encoding: Encoding::Utf8,
            reason,
        }),
    }

    let (wide, little_endian, has_bom) = detect_utf16_order(bytes);
    match decode_utf16(bytes, little_endian, has_bom) {
        Ok(text) => {
            return DecodedPayload {
                text,
                encoding: wide,
                attempts,
            }
        }
        Err(reason) => attempts.push(DecodeAttempt {
            encoding: wide,
            reason,
        }),
    }

    DecodedPayload {
        text: decode_latin1(bytes),
        encoding: Encoding::Latin1,
        attempts,
    }
}

/// UTF-8 that also refuses NUL: raw NUL never appears in JSON text, while it
/// shows up in every other byte of UTF-16 encoded ASCII.
fn decode_utf8_strict(bytes: &[u8]) -> Result<String, String> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(body).map_err(|e| e.to_string())?;
    if let Some(pos) = text.find('\0') {
        return Err(format!("NUL character at byte {}", pos));
    }
    Ok(text.to_string())
}

fn detect_utf16_order(bytes: &[u8]) -> (Encoding, bool, bool) {
    if bytes.starts_with(UTF16_LE_BOM) {
        return (Encoding::Utf16Le, true, true);
    }
    if bytes.starts_with(UTF16_BE_BOM) {
        return (Encoding::Utf16Be, false, true);
    }
    if bytes.len() >= 2 && bytes[0] == 0 && bytes[1] != 0 {
        return (Encoding::Utf16Be, false, false);
    }
    (Encoding::Utf16Le, true, false)
}

fn decode_utf16(bytes: &[u8], little_endian: bool, has_bom: bool) -> Result<String, String> {
    let body = if has_bom { &bytes[2..] } else { bytes };
    if body.len() % 2 != 0 {
        return Err("odd byte length".to_string());
    }

    let mut code_units = Vec::with_capacity(body.len() / 2);
    for chunk in body.chunks_exact(2) {
        let unit = if little_endian {
            u16::from_le_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_be_bytes([chunk[0], chunk[1]])
        };
        code_units.push(unit);
    }

    if !has_bom {
        looks_like_utf16(&code_units)?;
    }

    String::from_utf16(&code_units).map_err(|_| "unpaired surrogate".to_string())
}

/// Without a BOM any even-length input splits into code units, so require the
/// shape of mostly-ASCII wide text: at least half the units carry a zero high
/// byte and none is a control character other than whitespace.
fn looks_like_utf16(code_units: &[u16]) -> Result<(), String> {
    if code_units.is_empty() {
        return Err("empty payload".to_string());
    }
    let ascii = code_units.iter().filter(|&&unit| unit < 0x80).count();
    if ascii * 2 < code_units.len() {
        return Err(format!(
            "no BOM and only {} of {} code units are ASCII",
            ascii,
            code_units.len()
        ));
    }
    if let Some(pos) = code_units
        .iter()
        .position(|&unit| unit < 0x20 && !matches!(unit, 0x09 | 0x0A | 0x0D))
    {
        return Err(format!("control character at code unit {}", pos));
    }
    Ok(())
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut out = Vec::new();
        if bom {
            out.extend_from_slice(UTF16_LE_BOM);
        }
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn plain_utf8_decodes_first_try() {
        let decoded = decode_payload("{\"name\":\"Año\"}".as_bytes());
        assert_eq!(decoded.encoding, Encoding::Utf8);
        assert_eq!(decoded.text, "{\"name\":\"Año\"}");
        assert!(decoded.attempts.is_empty());
        assert!(!decoded.low_confidence());
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"{}");
        assert_eq!(decode_payload(&bytes).text, "{}");
    }

    #[test]
    fn utf16_without_bom_falls_through_utf8() {
        let decoded = decode_payload(&utf16le("{\"model\":{}}", false));
        assert_eq!(decoded.encoding, Encoding::Utf16Le);
        assert_eq!(decoded.text, "{\"model\":{}}");
        assert_eq!(decoded.attempts.len(), 1);
        assert_eq!(decoded.attempts[0].encoding, Encoding::Utf8);
        assert!(!decoded.low_confidence());
    }

    #[test]
    fn utf16_with_bom_keeps_non_ascii() {
        let decoded = decode_payload(&utf16le("{\"n\":\"Categoría\"}", true));
        assert_eq!(decoded.encoding, Encoding::Utf16Le);
        assert_eq!(decoded.text, "{\"n\":\"Categoría\"}");
    }

    #[test]
    fn big_endian_is_detected_from_leading_zero() {
        let mut bytes = Vec::new();
        for unit in "{}".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let decoded = decode_payload(&bytes);
        assert_eq!(decoded.encoding, Encoding::Utf16Be);
        assert_eq!(decoded.text, "{}");
    }

    #[test]
    fn undecodable_bytes_fall_back_to_latin1() {
        // invalid UTF-8 lead byte and an odd length rule out both primary encodings
        let bytes = [b'{', 0xE9, b'}'];
        let decoded = decode_payload(&bytes);
        assert_eq!(decoded.encoding, Encoding::Latin1);
        assert_eq!(decoded.text, "{é}");
        assert_eq!(decoded.attempts.len(), 2);
        assert!(decoded.low_confidence());
    }

    #[test]
    fn even_length_latin1_is_not_taken_for_utf16() {
        let bytes = b"{\"name\": \"Caf\xE9\"}";
        assert_eq!(bytes.len() % 2, 0);
        let decoded = decode_payload(bytes);
        assert_eq!(decoded.encoding, Encoding::Latin1);
        assert_eq!(decoded.text, "{\"name\": \"Café\"}");
        assert_eq!(decoded.attempts.len(), 2);
        assert_eq!(decoded.attempts[1].encoding, Encoding::Utf16Le);
        assert!(decoded.low_confidence());
    }

    #[test]
    fn utf16_without_bom_rejects_control_characters() {
        let mut bytes = utf16le("{}", false);
        bytes.extend_from_slice(&[0x01, 0x00]);
        let decoded = decode_payload(&bytes);
        assert_eq!(decoded.encoding, Encoding::Latin1);
    }
}
