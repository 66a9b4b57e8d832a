use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;

/// Codec for `string` values: bytes pass through without a UTF-8 check.
pub struct StringCodec;

impl AvpCodec for StringCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let s = String::from_utf8_lossy(raw).into_owned();
        Ok((AvpValue::String(s.clone()), s))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        let s = value.as_str().ok_or(CodecError::TypeMismatch {
            expected: "string",
            actual: value.type_name(),
        })?;
        Ok(s.as_bytes().to_vec())
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        Ok(display.as_bytes().to_vec())
    }
}
