use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;

/// Codec for `integer` values: 32-bit unsigned big-endian on the wire.
pub struct IntegerCodec;

impl AvpCodec for IntegerCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let bytes: [u8; 4] = raw.try_into().map_err(|_| CodecError::InvalidLength {
            expected: 4,
            actual: raw.len(),
        })?;
        let n = u32::from_be_bytes(bytes);
        Ok((AvpValue::Integer(n), n.to_string()))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        match value {
            AvpValue::Integer(n) => Ok(n.to_be_bytes().to_vec()),
            other => Err(CodecError::TypeMismatch {
                expected: "integer",
                actual: other.type_name(),
            }),
        }
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        let n: u32 = display
            .parse()
            .map_err(|_| CodecError::InvalidDisplay(display.to_string()))?;
        self.encode(&AvpValue::Integer(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_decimal_display() {
        let (value, display) = IntegerCodec.decode(&[0x00, 0x00, 0x05, 0xdc]).unwrap();
        assert_eq!(value, AvpValue::Integer(1500));
        assert_eq!(display, "1500");
    }

    #[test]
    fn test_decode_wrong_length() {
        assert!(IntegerCodec.decode(&[0x01]).is_err());
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(
            IntegerCodec.encode_string("123").unwrap(),
            vec![0, 0, 0, 123]
        );
        assert!(IntegerCodec.encode_string("PPP").is_err());
    }
}
