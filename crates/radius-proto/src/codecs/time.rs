use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;
use chrono::{DateTime, SecondsFormat, Utc};

/// Codec for `time` values: 32-bit big-endian seconds since the UNIX epoch,
/// displayed as RFC 3339.
pub struct TimeCodec;

impl AvpCodec for TimeCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let bytes: [u8; 4] = raw.try_into().map_err(|_| CodecError::InvalidLength {
            expected: 4,
            actual: raw.len(),
        })?;
        let secs = u32::from_be_bytes(bytes);
        let t = DateTime::<Utc>::from_timestamp(i64::from(secs), 0)
            .ok_or(CodecError::TimestampOutOfRange)?;
        let display = t.to_rfc3339_opts(SecondsFormat::Secs, true);
        Ok((AvpValue::Time(t), display))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        match value {
            AvpValue::Time(t) => {
                let secs =
                    u32::try_from(t.timestamp()).map_err(|_| CodecError::TimestampOutOfRange)?;
                Ok(secs.to_be_bytes().to_vec())
            }
            other => Err(CodecError::TypeMismatch {
                expected: "time",
                actual: other.type_name(),
            }),
        }
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        let t = DateTime::parse_from_rfc3339(display)
            .map_err(|_| CodecError::InvalidDisplay(display.to_string()))?;
        self.encode(&AvpValue::Time(t.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rfc3339_display() {
        let (value, display) = TimeCodec.decode(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(display, "1970-01-01T00:00:00Z");
        assert_eq!(
            value,
            AvpValue::Time(DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        );
    }

    #[test]
    fn test_round_trip() {
        let raw = [0x5f, 0x00, 0x00, 0x01];
        let (value, _) = TimeCodec.decode(&raw).unwrap();
        assert_eq!(TimeCodec.encode(&value).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_encode_string() {
        let raw = TimeCodec.encode_string("1970-01-01T00:01:00Z").unwrap();
        assert_eq!(raw, vec![0, 0, 0, 60]);
        assert!(TimeCodec.encode_string("yesterday").is_err());
    }
}
