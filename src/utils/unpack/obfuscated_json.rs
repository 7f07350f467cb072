//! Reverses the layered JSON obfuscation used by voe embed pages.
//!
//! The page ships a `["<payload>"]` JSON array; the payload is ROT13 text with
//! noise tokens sprinkled in, wrapping a base64 string whose bytes are shifted
//! by 3 and reversed around a second base64 layer holding the real JSON.

use serde_json::Value;

use super::{decode_base64, UnpackError};

const NOISE_TOKENS: [&str; 8] = ["@$", "^^", "~@", "%?", "*~", "!!", "#&", "@#"];
const CHAR_SHIFT: u8 = 3;

pub fn decode_payload(raw_json: &str) -> Result<Value, UnpackError> {
    let obfuscated = first_string(raw_json)?;

    let step1 = rot13(&obfuscated);
    let step2 = remove_noise(&step1);
    let step3 = decode_base64(&step2)
        .map_err(|err| UnpackError::UnexpectedPayloadShape(format!("outer base64: {err}")))?;
    let step4 = shift_bytes(&step3, CHAR_SHIFT);
    let step5: Vec<u8> = step4.into_iter().rev().collect();

    let step5 = String::from_utf8_lossy(&step5);
    let step6 = decode_base64(&step5)
        .map_err(|err| UnpackError::FinalPayloadParse(format!("inner base64: {err}")))?;

    serde_json::from_slice(&step6).map_err(|err| UnpackError::FinalPayloadParse(err.to_string()))
}

fn first_string(raw_json: &str) -> Result<String, UnpackError> {
    let data: Value = serde_json::from_str(raw_json.trim())
        .map_err(|err| UnpackError::UnexpectedPayloadShape(format!("invalid json input: {err}")))?;

    let first = match data {
        Value::Array(items) => items.into_iter().next(),
        _ => None,
    };

    match first {
        Some(Value::String(payload)) => Ok(payload),
        _ => Err(UnpackError::UnexpectedPayloadShape(
            "expected an array starting with a string".into(),
        )),
    }
}

pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'a'..='z' => (((ch as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((ch as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => ch,
        })
        .collect()
}

fn remove_noise(text: &str) -> String {
    NOISE_TOKENS
        .iter()
        .fold(text.to_owned(), |acc, token| acc.replace(token, ""))
}

fn shift_bytes(bytes: &[u8], shift: u8) -> Vec<u8> {
    bytes.iter().map(|b| b.wrapping_sub(shift)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use base64::{prelude::BASE64_STANDARD, Engine};
    use serde_json::json;

    use super::*;

    const FIXTURE: &str = r#"["CR1JH@$TcLFy15^^HIgxryyh~@GQyZIy12II#&gxZ01TG2p0p!!HkgGIcpCSD2HmqLAyO3BTkzo1H2Mzf0AH99r0cxrIujMKAapTIiCSMqqxIoMJgeJ114JQIyAGuJnUkMpTqmr1cqowk8GmyDF2LmIHgxoUWgGUMAJ2qcHGMzo1R1KTf8FJqgJKOzp1IjGQc7Izy2r1carUAgGUMAJ2qcHGMzo1R1KTf8FJqgJKOzp1IjGQc3o1WfJQIpsSx2MK1AsTt="]"#;

    pub(crate) fn obfuscate(value: &Value) -> String {
        let inner = BASE64_STANDARD.encode(value.to_string());
        let shifted: Vec<u8> = inner.bytes().rev().map(|b| b + CHAR_SHIFT).collect();
        let outer = BASE64_STANDARD.encode(shifted);
        let (head, tail) = outer.split_at(outer.len() / 2);
        let noisy = format!("%?{head}*~{tail}");
        serde_json::to_string(&[rot13(&noisy)]).unwrap()
    }

    #[test]
    fn should_decode_fixture() {
        let result = decode_payload(FIXTURE).unwrap();
        assert_eq!(
            result,
            json!({
                "source": [
                    {"direct_access_url": null},
                    {"direct_access_url": "https://delivery.voe.example/engine/hls/master.m3u8?t=abc"}
                ],
                "title": "Episode 1"
            })
        );
    }

    #[test]
    fn should_be_deterministic() {
        let first = decode_payload(FIXTURE).unwrap();
        for _ in 0..5 {
            assert_eq!(decode_payload(FIXTURE).unwrap(), first);
        }
    }

    #[test]
    fn should_decode_obfuscated_value() {
        let value = json!({"direct_access_url": "https://cdn.example/v.mp4", "n": "ü"});
        assert_eq!(decode_payload(&obfuscate(&value)).unwrap(), value);
    }

    #[test]
    fn should_rot13_letters_only() {
        assert_eq!(rot13("Hello, World! 123"), "Uryyb, Jbeyq! 123");
        assert_eq!(rot13(&rot13("abcXYZ")), "abcXYZ");
    }

    #[test]
    fn should_reject_unexpected_shape() {
        for input in ["{}", "[1, \"a\"]", "[]", "not json", "\"text\""] {
            assert!(
                matches!(
                    decode_payload(input),
                    Err(UnpackError::UnexpectedPayloadShape(_))
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn should_fail_on_broken_inner_payload() {
        let outer = BASE64_STANDARD.encode(b"not-json-at-all");
        let input = serde_json::to_string(&[rot13(&outer)]).unwrap();
        assert!(matches!(
            decode_payload(&input),
            Err(UnpackError::FinalPayloadParse(_))
        ));
    }
}
