//! Transfer and header decoding utilities.
//!
//! Supports standard and URL-safe Base64 and RFC 2047 encoded words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::warn;

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data. Padding is optional.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    LENIENT.decode(data).map_err(Into::into)
}

/// Decodes URL-safe Base64 (`-` and `_`, padding usually stripped).
///
/// The URL-safe alphabet is mapped onto the standard one first, so input
/// that already uses `+` and `/` decodes too. Whitespace is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64 after mapping.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    decode_base64(&to_standard_alphabet(data))
}

fn to_standard_alphabet(data: &str) -> String {
    data.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect()
}

/// Longest leading run of Base64 symbols that can decode on its own.
fn decodable_prefix(standard: &str) -> &str {
    let valid = standard
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '+' || c == '/'))
        .unwrap_or(standard.len());
    // A single symbol left over after full quads carries no whole byte.
    let cut = if valid % 4 == 1 { valid - 1 } else { valid };
    &standard[..cut]
}

/// Best-effort bytes from URL-safe Base64.
///
/// Absent or empty input yields nothing. If the data does not decode as a
/// whole, the longest decodable prefix is kept and the rest is logged and
/// dropped. Never fails.
#[must_use]
pub fn decode_base64url_lossy(data: Option<&str>) -> Vec<u8> {
    let Some(data) = data.filter(|d| !d.is_empty()) else {
        return Vec::new();
    };

    let standard = to_standard_alphabet(data);
    match decode_base64(&standard) {
        Ok(bytes) => bytes,
        Err(e) => {
            let prefix = decodable_prefix(&standard);
            match decode_base64(prefix) {
                Ok(bytes) if !bytes.is_empty() => {
                    warn!(
                        error = %e,
                        kept = prefix.len(),
                        len = standard.len(),
                        "body data truncated at first undecodable symbol"
                    );
                    bytes
                }
                _ => {
                    warn!(error = %e, len = data.len(), "discarding undecodable body data");
                    Vec::new()
                }
            }
        }
    }
}

/// Best-effort UTF-8 text from URL-safe Base64.
///
/// See [`decode_base64url_lossy`]; invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode_base64url_text(data: Option<&str>) -> String {
    decode_text_lossy(decode_base64url_lossy(data), None)
}

/// Interprets bytes in an optional charset, replacing invalid sequences.
///
/// Latin-1 maps byte to char; everything else is read as UTF-8.
#[must_use]
pub fn decode_text_lossy(bytes: Vec<u8>, charset: Option<&str>) -> String {
    if charset.is_some_and(is_latin1) {
        return bytes.into_iter().map(char::from).collect();
    }
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Decodes the RFC 2047 "Q" encoding: `_` is a space and `=HH` a raw byte.
///
/// # Errors
///
/// Returns an error on a truncated or non-hex escape.
pub fn decode_q(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".into()))?;
                let hex = std::str::from_utf8(hex)
                    .ok()
                    .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                    .ok_or_else(|| Error::InvalidEncoding("Invalid hex escape".into()))?;
                let byte = u8::from_str_radix(hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                result.push(byte);
                i += 3;
            }
            other => {
                result.push(other);
                i += 1;
            }
        }
    }

    Ok(result)
}

/// One `=?charset?encoding?payload?=` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EncodedWord<'a> {
    charset: &'a str,
    encoding: &'a str,
    payload: &'a str,
}

impl EncodedWord<'_> {
    fn decode(&self) -> Result<String> {
        let bytes = match self.encoding {
            "B" | "b" => decode_base64(self.payload)?,
            "Q" | "q" => decode_q(self.payload)?,
            other => {
                return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
            }
        };
        decode_charset(self.charset, bytes)
    }
}

fn is_latin1(charset: &str) -> bool {
    // RFC 2231 language suffix: `UTF-8*en`
    let name = charset.split('*').next().unwrap_or(charset);
    name.eq_ignore_ascii_case("iso-8859-1") || name.eq_ignore_ascii_case("latin1")
}

/// Interprets bytes in the given charset. Latin-1 maps byte to char; every
/// other charset is read as UTF-8 (a superset of US-ASCII).
fn decode_charset(charset: &str, bytes: Vec<u8>) -> Result<String> {
    if is_latin1(charset) {
        return Ok(bytes.into_iter().map(char::from).collect());
    }
    String::from_utf8(bytes).map_err(Into::into)
}

/// Parses an encoded word at the start of `s`, returning its byte length.
fn parse_encoded_word(s: &str) -> Option<(usize, EncodedWord<'_>)> {
    let body = s.strip_prefix("=?")?;
    let (charset, rest) = body.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let payload_len = rest.find("?=")?;
    let payload = &rest[..payload_len];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || !matches!(encoding, "B" | "b" | "Q" | "q")
        || payload.contains(char::is_whitespace)
    {
        return None;
    }

    let len = 2 + charset.len() + 1 + encoding.len() + 1 + payload_len + 2;
    Some((
        len,
        EncodedWord {
            charset,
            encoding,
            payload,
        },
    ))
}

/// Finds the next encoded word, returning its byte span.
fn find_encoded_word(s: &str) -> Option<(usize, usize, EncodedWord<'_>)> {
    let mut from = 0;
    while let Some(offset) = s[from..].find("=?") {
        let start = from + offset;
        if let Some((len, word)) = parse_encoded_word(&s[start..]) {
            return Some((start, start + len, word));
        }
        from = start + 2;
    }
    None
}

/// Decodes every RFC 2047 encoded word in `text`.
///
/// Linear whitespace between two adjacent encoded words is dropped
/// (RFC 2047 section 6.2); all other text is copied through.
///
/// # Errors
///
/// Returns an error if any encoded word fails to decode.
pub fn try_decode_encoded_words(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some((start, end, word)) = find_encoded_word(rest) {
        let between = &rest[..start];
        if !(after_word && between.chars().all(char::is_whitespace)) {
            out.push_str(between);
        }
        out.push_str(&word.decode()?);
        after_word = true;
        rest = &rest[end..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Decodes every RFC 2047 encoded word in `text`, best effort.
///
/// If any encoded word is malformed the original input is returned
/// unchanged. Never fails.
#[must_use]
pub fn decode_encoded_words(text: &str) -> String {
    try_decode_encoded_words(text).unwrap_or_else(|e| {
        warn!(error = %e, "leaving header with undecodable encoded word as-is");
        text.to_string()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(decode_base64("SGVsbG8sIFdvcmxkIQ").unwrap(), data);
    }

    #[test]
    fn test_base64url_alphabet_and_padding() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(decode_base64url("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64url("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64url("+/8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_base64url_text() {
        assert_eq!(decode_base64url_text(Some("SGVsbG8gV29ybGQ")), "Hello World");
        assert_eq!(decode_base64url_text(Some("SGVs\r\nbG8=")), "Hello");
        assert_eq!(decode_base64url_text(None), "");
        assert_eq!(decode_base64url_text(Some("")), "");
        assert_eq!(decode_base64url_text(Some("!!!not base64!!!")), "");
    }

    #[test]
    fn test_base64url_text_keeps_decodable_prefix() {
        // 17 symbols: the last one cannot form a byte
        assert_eq!(decode_base64url_text(Some("SGVsbG8gV29ybGQxA")), "Hello World1");
        assert_eq!(decode_base64url_text(Some("SGVsbG8gV29ybGQx")), "Hello World1");
        assert_eq!(decode_base64url_text(Some("SGVsbG8*garbage")), "Hello");
    }

    #[test]
    fn test_decode_text_lossy_charset() {
        assert_eq!(decode_text_lossy(vec![0x63, 0x61, 0x66, 0xe9], Some("ISO-8859-1")), "café");
        assert_eq!(decode_text_lossy("café".as_bytes().to_vec(), Some("utf-8")), "café");
        assert_eq!(decode_text_lossy(vec![0xff], None), "\u{fffd}");
    }

    #[test]
    fn test_base64url_text_lossy_utf8() {
        // 0xff is never valid UTF-8
        assert_eq!(decode_base64url_text(Some("_w")), "\u{fffd}");
    }

    #[test]
    fn test_decode_q() {
        assert_eq!(decode_q("Hi_there").unwrap(), b"Hi there");
        assert_eq!(decode_q("H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert!(decode_q("bad=Z1").is_err());
        assert!(decode_q("trunc=4").is_err());
    }

    #[test]
    fn test_encoded_word_base64() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SGVsbG8=?="), "Hello");
        assert_eq!(decode_encoded_words("=?utf-8?b?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_encoded_word_q() {
        assert_eq!(decode_encoded_words("=?UTF-8?Q?Hi_there?="), "Hi there");
        assert_eq!(decode_encoded_words("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
    }

    #[test]
    fn test_encoded_word_embedded() {
        assert_eq!(
            decode_encoded_words("Re: =?UTF-8?Q?caf=C3=A9?= tomorrow"),
            "Re: café tomorrow"
        );
        assert_eq!(
            decode_encoded_words("\"=?UTF-8?B?Sm9zw6k=?=\" <jose@example.com>"),
            "\"José\" <jose@example.com>"
        );
    }

    #[test]
    fn test_adjacent_words_join() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?Q?Hello,?= =?UTF-8?Q?_world?="),
            "Hello, world"
        );
        assert_eq!(
            decode_encoded_words("=?UTF-8?B?SGVs?=\r\n =?UTF-8?B?bG8=?= there"),
            "Hello there"
        );
    }

    #[test]
    fn test_unknown_encoding_is_plain_text() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?X?abc?= =?UTF-8?B?SGVsbG8=?="),
            "=?UTF-8?X?abc?= Hello"
        );
        assert_eq!(decode_encoded_words("=?UTF-8?X?abc?="), "=?UTF-8?X?abc?=");
        assert_eq!(
            try_decode_encoded_words("Re: =?UTF-8?BB?x?= =?UTF-8?Q?ok?=").unwrap(),
            "Re: =?UTF-8?BB?x?= ok"
        );
    }

    #[test]
    fn test_latin1_charset() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(decode_encoded_words("Quarterly report"), "Quarterly report");
        assert_eq!(decode_encoded_words("a =? b ?= c"), "a =? b ?= c");
        assert_eq!(decode_encoded_words(""), "");
    }

    #[test]
    fn test_malformed_word_returns_original() {
        let input = "Hi =?UTF-8?B?@@@@?= and =?UTF-8?Q?ok?=";
        assert_eq!(decode_encoded_words(input), input);
        assert!(try_decode_encoded_words(input).is_err());


        let bad_utf8 = "=?UTF-8?Q?=FF?=";
        assert_eq!(decode_encoded_words(bad_utf8), bad_utf8);
    }
}
