pub mod obfuscated_json;
pub mod packerjs;
pub mod unbaser;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    DecodeError, Engine,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnpackError {
    #[error("could not make sense of p.a.c.k.e.r. data (unexpected code structure)")]
    UnrecognizedFormat,
    #[error("malformed p.a.c.k.e.r. symtab: expected {expected} symbols, found {found}")]
    MalformedSymbolTable { expected: usize, found: usize },
    #[error("unsupported radix {0}")]
    UnsupportedRadix(u32),
    #[error("unexpected payload shape: {0}")]
    UnexpectedPayloadShape(String),
    #[error("final payload parse error: {0}")]
    FinalPayloadParse(String),
}

// Accepts padded and unpadded input, like browser `atob`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub fn decode_base64(input: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = input.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
    LENIENT_BASE64.decode(cleaned)
}
