// Injection-safe encoding of host strings into generated engine source.
//
// Stage 1 percent-encodes everything except ASCII alphanumerics; stage 2
// base64-encodes the ASCII result, collapsing the payload to [A-Za-z0-9+/=].
// The engine reverses both stages with atob + decodeURIComponent. Both
// stages are required: percent-encoding alone leaves quotes reachable after
// decoding, and bare base64 output is not delimiter-safe in every engine.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

/// Encodes `s` into a payload drawn from the base64 alphabet.
///
/// The payload is safe to splice into a single-quoted engine string literal
/// without further escaping.
pub fn encode_payload(s: &str) -> String {
    let ascii = utf8_percent_encode(s, NON_ALPHANUMERIC).to_string();
    STANDARD.encode(ascii.as_bytes())
}

/// Emits the engine expression that evaluates back to exactly `s`.
pub fn decode_expr(s: &str) -> String {
    format!("decodeURIComponent(atob('{}'))", encode_payload(s))
}

/// Host-side mirror of the engine's decode pipeline.
///
/// `decode_payload(&encode_payload(s)) == Some(s)` for every `s`; used by
/// tests to prove the round trip without an engine in the loop.
pub fn decode_payload(payload: &str) -> Option<String> {
    let ascii = STANDARD.decode(payload).ok()?;
    let ascii = std::str::from_utf8(&ascii).ok()?;
    percent_decode_str(ascii)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::{decode_expr, decode_payload, encode_payload};
    use proptest::prelude::*;

    fn payload_alphabet_only(payload: &str) {
        assert!(
            payload
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')),
            "payload escaped the base64 alphabet: {payload:?}"
        );
    }

    #[test]
    fn round_trips_adversarial_strings() {
        let cases = [
            "",
            "http://example.com/a b",
            "it's a 'quoted' string",
            "\"double\" and `backtick`",
            "back\\slash",
            "line\nbreak\r\n",
            "null\u{0}byte",
            "emoji \u{1F980} and \u{4F60}\u{597D}",
            "percent %41 literal",
            "atob('injected')//",
        ];
        for case in cases {
            let payload = encode_payload(case);
            payload_alphabet_only(&payload);
            assert_eq!(decode_payload(&payload).as_deref(), Some(case));
        }
    }

    #[test]
    fn decode_expr_wraps_payload() {
        let expr = decode_expr("a'b");
        assert!(expr.starts_with("decodeURIComponent(atob('"));
        assert!(expr.ends_with("'))"));
        assert!(!expr.contains("a'b"));
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_strings(s in "\\PC*") {
            let payload = encode_payload(&s);
            payload_alphabet_only(&payload);
            let decoded = decode_payload(&payload);
            prop_assert_eq!(decoded.as_deref(), Some(s.as_str()));
        }
    }
}
