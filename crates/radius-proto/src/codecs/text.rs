use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;

/// Codec for `text` values: UTF-8 checked on decode.
pub struct TextCodec;

impl AvpCodec for TextCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let text = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)?;
        Ok((AvpValue::Text(text.to_string()), text.to_string()))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        let text = value.as_str().ok_or(CodecError::TypeMismatch {
            expected: "text",
            actual: value.type_name(),
        })?;
        Ok(text.as_bytes().to_vec())
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        Ok(display.as_bytes().to_vec())
    }
}
