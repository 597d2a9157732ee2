//! Plain-text decoding.
//!
//! Uploaded `.txt` and `.csv` files arrive in whatever encoding the
//! author's editor used; for IPT staff that is usually UTF-8 or
//! Windows-1252. Decoding tries, in order:
//!
//! 1. the encoding announced by a byte-order mark, if any;
//! 2. the encoding guessed by `chardetng`;
//! 3. each configured fallback encoding.
//!
//! Every candidate decodes strictly; the first that succeeds with a
//! non-empty string wins. If none does, the bytes are decoded as UTF-8
//! with replacement characters.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use super::{ExtractError, ExtractOptions};
use crate::traits::TextExtractor;

/// Top-level domain hint for detection: uploads come from `ipt.br` users.
const DETECTION_TLD: &[u8] = b"br";

/// Decoded text plus the name of the encoding that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// Resolve an encoding label, accepting Python-style spellings such as
/// `latin-1` in addition to WHATWG labels.
pub fn resolve_encoding(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    Encoding::for_label(label.as_bytes()).or_else(|| {
        let compact: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();
        Encoding::for_label(compact.as_bytes())
    })
}

/// Guess the encoding of `bytes` statistically.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(Some(DETECTION_TLD), true)
}

/// Decode `bytes` with the detection-then-fallback chain.
pub fn decode_text(bytes: &[u8], fallbacks: &[&'static Encoding]) -> Decoded {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return Decoded {
            text: text.into_owned(),
            encoding: encoding.name(),
        };
    }

    let mut candidates: Vec<&'static Encoding> = vec![detect_encoding(bytes)];
    for &encoding in fallbacks {
        if !candidates.contains(&encoding) {
            candidates.push(encoding);
        }
    }

    for encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            if !text.is_empty() {
                debug!(encoding = encoding.name(), "decoded text");
                return Decoded {
                    text: text.into_owned(),
                    encoding: encoding.name(),
                };
            }
        }
    }

    Decoded {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: UTF_8.name(),
    }
}

/// `.txt` extraction: decode and return the text as is.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "text-decode"
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Empty("empty file".to_string()));
        }
        Ok(decode_text(bytes, &options.encodings).text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn latin1(s: &str) -> Vec<u8> {
        s.chars().map(|c| c as u32 as u8).collect()
    }

    #[test]
    fn resolves_python_style_labels() {
        assert_eq!(resolve_encoding("utf-8"), Some(UTF_8));
        assert_eq!(resolve_encoding("latin-1"), Some(WINDOWS_1252));
        assert_eq!(resolve_encoding("cp1252"), Some(WINDOWS_1252));
        assert_eq!(resolve_encoding("ISO-8859-1"), Some(WINDOWS_1252));
        assert_eq!(resolve_encoding("no-such-encoding"), None);
    }

    #[test]
    fn decodes_utf8() {
        let decoded = decode_text("Relatório técnico: ação e coração.".as_bytes(), &[UTF_8]);
        assert_eq!(decoded.text, "Relatório técnico: ação e coração.");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn decodes_latin1_with_accents_intact() {
        let original = "Relatório de análise técnica: ação, conclusão e coração.";
        let bytes = latin1(original);
        assert!(std::str::from_utf8(&bytes).is_err());
        let decoded = decode_text(&bytes, &[UTF_8, WINDOWS_1252]);
        assert_eq!(decoded.text, original);
    }

    #[test]
    fn strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("olá".as_bytes());
        assert_eq!(decode_text(&bytes, &[]).text, "olá");
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = PlainTextExtractor
            .extract(b"", &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExtractError::Empty(_)));
    }
}
