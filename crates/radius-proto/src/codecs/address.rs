use super::{AvpCodec, CodecError};
use crate::attributes::AvpValue;
use std::net::IpAddr;

/// Codec for `address`/`ipaddr` values: four raw IPv4 octets on the wire.
pub struct AddressCodec;

impl AvpCodec for AddressCodec {
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        let octets: [u8; 4] = raw.try_into().map_err(|_| CodecError::InvalidLength {
            expected: 4,
            actual: raw.len(),
        })?;
        let ip = IpAddr::from(octets);
        Ok((AvpValue::Address(ip), ip.to_string()))
    }

    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        let ip = match value {
            AvpValue::Address(ip) => *ip,
            other => {
                return Err(CodecError::TypeMismatch {
                    expected: "address",
                    actual: other.type_name(),
                })
            }
        };
        match ip {
            IpAddr::V4(v4) => Ok(v4.octets().to_vec()),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Ok(v4.octets().to_vec()),
                None => Err(CodecError::NotIpv4(ip)),
            },
        }
    }

    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError> {
        let ip: IpAddr = display
            .parse()
            .map_err(|_| CodecError::InvalidDisplay(display.to_string()))?;
        self.encode(&AvpValue::Address(ip))
    }
}
