use crate::common::errors::ResolveError;
use crate::formats::Format;
use crate::util::parse_query;

/// One primitive transformation of the obfuscated signature. Replaying the
/// extracted sequence in order recovers the real signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecipherOp {
    /// Reverse the whole string.
    Reverse,
    /// Swap the character at `i % len` with the character at position 0.
    Swap(usize),
    /// Drop the first `i` characters.
    Splice(usize),
}

/// Replays `ops` against an obfuscated signature. Pure and deterministic.
pub fn apply_operations(ops: &[DecipherOp], signature: &str) -> String {
    let mut chars: Vec<char> = signature.chars().collect();
    for op in ops {
        match *op {
            DecipherOp::Reverse => chars.reverse(),
            DecipherOp::Swap(i) => {
                if !chars.is_empty() {
                    let j = i % chars.len();
                    chars.swap(0, j);
                }
            }
            DecipherOp::Splice(i) => {
                chars.drain(..i.min(chars.len()));
            }
        }
    }
    chars.into_iter().collect()
}

/// Resolves a format's stream URL in place.
///
/// Formats that already carry a plain `url` pass through untouched. Formats
/// carrying a `signatureCipher`/`cipher` field get their signature
/// deciphered and reinserted under the parameter name the cipher names
/// (`sp`, defaulting to `signature`).
///
/// A failure here only affects this format; the pipeline drops it and
/// keeps the rest.
pub fn decipher_format(format: &mut Format, ops: &[DecipherOp]) -> Result<(), ResolveError> {
    if format.url.is_some() {
        return Ok(());
    }

    let cipher = format
        .signature_cipher
        .as_deref()
        .ok_or_else(|| ResolveError::Decipher(format!("itag {} has no url and no cipher", format.itag)))?;

    if ops.is_empty() {
        return Err(ResolveError::Decipher("empty operation sequence".to_string()));
    }

    let fields = parse_query(cipher);
    let base_url = fields
        .get("url")
        .ok_or_else(|| ResolveError::Decipher("cipher field has no url".to_string()))?;
    let obfuscated = fields
        .get("s")
        .ok_or_else(|| ResolveError::Decipher("cipher field has no signature".to_string()))?;
    let param = fields.get("sp").map(String::as_str).unwrap_or("signature");

    let signature = apply_operations(ops, obfuscated);
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format.url = Some(format!(
        "{}{}{}={}",
        base_url,
        separator,
        param,
        urlencoding::encode(&signature)
    ));
    format.signature_cipher = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_then_reverse_matches_reference() {
        // swap(2): "abcdef" -> "cbadef"; reverse -> "fedabc"
        let ops = [DecipherOp::Swap(2), DecipherOp::Reverse];
        assert_eq!(apply_operations(&ops, "abcdef"), "fedabc");
    }

    #[test]
    fn splice_drops_leading_chars() {
        assert_eq!(apply_operations(&[DecipherOp::Splice(2)], "abcdef"), "cdef");
        assert_eq!(apply_operations(&[DecipherOp::Splice(9)], "abc"), "");
    }

    #[test]
    fn swap_index_wraps_modulo_length() {
        assert_eq!(apply_operations(&[DecipherOp::Swap(7)], "abcdef"), "bacdef");
    }

    #[test]
    fn replay_is_deterministic() {
        let ops = [DecipherOp::Swap(3), DecipherOp::Splice(1), DecipherOp::Reverse];
        let once = apply_operations(&ops, "0123456789");
        let again = apply_operations(&ops, "0123456789");
        assert_eq!(once, again);
    }

    #[test]
    fn plain_url_formats_pass_through() {
        let mut format = Format::from_manifest(18, "https://a.example/stream");
        decipher_format(&mut format, &[DecipherOp::Reverse]).unwrap();
        assert_eq!(format.url.as_deref(), Some("https://a.example/stream"));
    }

    #[test]
    fn cipher_field_rebuilds_url() {
        let mut format = Format {
            itag: 137,
            signature_cipher: Some(
                "s=abcdef&sp=sig&url=https%3A%2F%2Fr1.example%2Fplayback%3Fitag%3D137".to_string(),
            ),
            ..Default::default()
        };
        decipher_format(&mut format, &[DecipherOp::Swap(2), DecipherOp::Reverse]).unwrap();
        assert_eq!(
            format.url.as_deref(),
            Some("https://r1.example/playback?itag=137&sig=fedabc")
        );
        assert!(format.signature_cipher.is_none());
    }

    #[test]
    fn cipher_defaults_to_signature_param() {
        let mut format = Format {
            itag: 22,
            signature_cipher: Some("s=ab&url=https%3A%2F%2Fr1.example%2Fv".to_string()),
            ..Default::default()
        };
        decipher_format(&mut format, &[DecipherOp::Reverse]).unwrap();
        assert_eq!(
            format.url.as_deref(),
            Some("https://r1.example/v?signature=ba")
        );
    }

    #[test]
    fn malformed_cipher_is_an_error() {
        let mut format = Format {
            itag: 22,
            signature_cipher: Some("sp=sig".to_string()),
            ..Default::default()
        };
        let err = decipher_format(&mut format, &[DecipherOp::Reverse]).unwrap_err();
        assert!(matches!(err, ResolveError::Decipher(_)));
    }

    #[test]
    fn empty_operations_are_an_error() {
        let mut format = Format {
            itag: 22,
            signature_cipher: Some("s=ab&url=https%3A%2F%2Fa".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            decipher_format(&mut format, &[]),
            Err(ResolveError::Decipher(_))
        ));
    }
}
