//! `data:image/...;base64,` URLs into image payloads

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use rand::Rng;
use thiserror::Error;

use crate::upload::ImagePayload;

const PREFIX: &str = "data:image/";
const MARKER: &str = ";base64,";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a base64 image data URL")]
    Malformed,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("decoded image of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: u64 },
}

/// Decode a data URL, refusing anything that would exceed `max_bytes`.
///
/// The size is estimated before decoding so oversized input is rejected
/// without allocating the full buffer.
pub fn decode_data_url(input: &str, max_bytes: u64) -> Result<ImagePayload, DecodeError> {
    let (subtype, encoded) = split_data_url(input.trim()).ok_or(DecodeError::Malformed)?;

    let estimate = estimated_len(encoded);
    if estimate as u64 > max_bytes {
        return Err(DecodeError::TooLarge {
            size: estimate,
            limit: max_bytes,
        });
    }

    let bytes = LENIENT
        .decode(encoded)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DecodeError::Malformed);
    }
    if bytes.len() as u64 > max_bytes {
        return Err(DecodeError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let subtype = subtype.to_ascii_lowercase();
    let filename = format!(
        "image_{}_{}.{subtype}",
        chrono::Utc::now().timestamp_millis(),
        random_base36(9)
    );
    Ok(ImagePayload::new(bytes, filename, format!("image/{subtype}")))
}

fn split_data_url(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix(PREFIX)?;
    let (subtype, encoded) = rest.split_once(MARKER)?;
    let valid_subtype = !subtype.is_empty() && subtype.bytes().all(|b| b.is_ascii_alphabetic());
    (valid_subtype && !encoded.is_empty()).then_some((subtype, encoded))
}

fn estimated_len(encoded: &str) -> usize {
    let padding = encoded.bytes().rev().take_while(|b| *b == b'=').count();
    (encoded.len() / 4 * 3 + (encoded.len() % 4) * 3 / 4).saturating_sub(padding)
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}
