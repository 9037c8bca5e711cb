//! # Payload Codecs
//!
//! Each action carries one payload type, fixed by convention. The type picks
//! its serialization format; the channel prefixes every frame with a one-byte
//! format tag so a receiver registered with the wrong type fails loudly
//! instead of misreading bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Serialization format of an action payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// UTF-8 text.
    Text,
    /// Opaque bytes (ciphertexts, blobs).
    Binary,
    /// JSON document.
    Json,
}

impl PayloadFormat {
    /// One-byte tag written ahead of the payload.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::Text => 0x01,
            Self::Binary => 0x02,
            Self::Json => 0x03,
        }
    }

    /// Parse a format tag.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Text),
            0x02 => Some(Self::Binary),
            0x03 => Some(Self::Json),
            _ => None,
        }
    }
}

/// Errors from encoding or decoding payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Frame carried no bytes at all.
    #[error("Empty frame")]
    EmptyFrame,

    /// Frame tag is not a known format.
    #[error("Unknown payload format tag: {0:#04x}")]
    UnknownFormat(u8),

    /// Frame was encoded in a different format than the receiver expects.
    #[error("Payload format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch {
        /// Format the registered type decodes.
        expected: PayloadFormat,
        /// Format found on the frame.
        actual: PayloadFormat,
    },

    /// Text payload was not valid UTF-8.
    #[error("Invalid UTF-8 payload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// JSON (de)serialization failed.
    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A type that can travel as an action payload.
pub trait ActionPayload: Sized + Send + 'static {
    /// Format this type is carried in.
    const FORMAT: PayloadFormat;

    /// Serialize the payload body.
    fn encode_body(&self) -> Result<Vec<u8>, CodecError>;

    /// Deserialize the payload body.
    fn decode_body(body: &[u8]) -> Result<Self, CodecError>;

    /// Serialize into a tagged frame.
    fn to_frame(&self) -> Result<Vec<u8>, CodecError> {
        let body = self.encode_body()?;
        let mut frame = Vec::with_capacity(body.len() + 1);
        frame.push(Self::FORMAT.tag());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Deserialize from a tagged frame.
    fn from_frame(frame: &[u8]) -> Result<Self, CodecError> {
        let (&tag, body) = frame.split_first().ok_or(CodecError::EmptyFrame)?;
        let actual = PayloadFormat::from_tag(tag).ok_or(CodecError::UnknownFormat(tag))?;
        if actual != Self::FORMAT {
            return Err(CodecError::FormatMismatch {
                expected: Self::FORMAT,
                actual,
            });
        }
        Self::decode_body(body)
    }
}

impl ActionPayload for String {
    const FORMAT: PayloadFormat = PayloadFormat::Text;

    fn encode_body(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode_body(body: &[u8]) -> Result<Self, CodecError> {
        Ok(String::from_utf8(body.to_vec())?)
    }
}

impl ActionPayload for Vec<u8> {
    const FORMAT: PayloadFormat = PayloadFormat::Binary;

    fn encode_body(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.clone())
    }

    fn decode_body(body: &[u8]) -> Result<Self, CodecError> {
        Ok(body.to_vec())
    }
}

/// Wrapper carrying any serde type as a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> ActionPayload for Json<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    const FORMAT: PayloadFormat = PayloadFormat::Json;

    fn encode_body(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    fn decode_body(body: &[u8]) -> Result<Self, CodecError> {
        Ok(Json(serde_json::from_slice(body)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Hello {
        name: String,
    }

    #[test]
    fn test_text_frame_is_tagged() {
        let frame = "abc123".to_string().to_frame().unwrap();
        assert_eq!(frame[0], PayloadFormat::Text.tag());
        assert_eq!(&frame[1..], b"abc123");
        assert_eq!(String::from_frame(&frame).unwrap(), "abc123");
    }

    #[test]
    fn test_json_payload() {
        let frame = Json(Hello { name: "bob".into() }).to_frame().unwrap();
        let Json(decoded) = Json::<Hello>::from_frame(&frame).unwrap();
        assert_eq!(decoded.name, "bob");
    }

    #[test]
    fn test_format_mismatch_rejected() {
        let frame = vec![0xde, 0xad].to_frame().unwrap();
        let err = String::from_frame(&frame).unwrap_err();
        assert!(matches!(
            err,
            CodecError::FormatMismatch {
                expected: PayloadFormat::Text,
                actual: PayloadFormat::Binary
            }
        ));
    }

    #[test]
    fn test_empty_and_unknown_frames() {
        assert!(matches!(Vec::<u8>::from_frame(&[]), Err(CodecError::EmptyFrame)));
        assert!(matches!(
            Vec::<u8>::from_frame(&[0x7f, 1, 2]),
            Err(CodecError::UnknownFormat(0x7f))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let frame = [PayloadFormat::Text.tag(), 0xff, 0xfe];
        assert!(matches!(String::from_frame(&frame), Err(CodecError::InvalidUtf8(_))));
    }
}
