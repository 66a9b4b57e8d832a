use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;

/// Codec for `octets` values: raw bytes pass through unchanged.
pub struct OctetsCodec;

impl AvpCodec for OctetsCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let display = String::from_utf8_lossy(raw).into_owned();
        Ok((AvpValue::Octets(raw.to_vec()), display))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        match value {
            AvpValue::Octets(bytes) => Ok(bytes.clone()),
            other => Err(CodecError::TypeMismatch {
                expected: "octets",
                actual: other.type_name(),
            }),
        }
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        Ok(display.as_bytes().to_vec())
    }
}
