//! Per-attribute validation applied while decoding a packet.
//!
//! Each entry carries length bounds and an optional post-decode transform;
//! User-Password is unscrambled in place as its transform.

use crate::attributes::{self, Avp};
use crate::auth::{self, AuthError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("value too short for attribute {number}: {actual} < {min}")]
    ValueTooShort {
        number: u8,
        actual: usize,
        min: usize,
    },
    #[error("value too long for attribute {number}: {actual} > {max}")]
    ValueTooLong {
        number: u8,
        actual: usize,
        max: usize,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
}

type DecodeFn = fn(&mut Avp, &str, &[u8; 16]) -> Result<(), ValidationError>;

/// Length bounds and optional post-decode transform for one attribute
/// number.
pub struct Validation {
    pub min_length: usize,
    /// `None` means unbounded.
    pub max_length: Option<usize>,
    decode: Option<DecodeFn>,
}

impl Validation {
    /// Checks the bounds against the AVP's raw value and runs the
    /// post-decode transform.
    pub fn validate(
        &self,
        avp: &mut Avp,
        secret: &str,
        authenticator: &[u8; 16],
    ) -> Result<(), ValidationError> {
        let actual = avp.raw_value.as_deref().map_or(0, <[u8]>::len);
        if actual < self.min_length {
            return Err(ValidationError::ValueTooShort {
                number: avp.number,
                actual,
                min: self.min_length,
            });
        }
        if let Some(max) = self.max_length {
            if actual > max {
                return Err(ValidationError::ValueTooLong {
                    number: avp.number,
                    actual,
                    max,
                });
            }
        }
        if let Some(decode) = self.decode {
            return decode(avp, secret, authenticator);
        }
        Ok(())
    }
}

fn decode_user_password(
    avp: &mut Avp,
    secret: &str,
    authenticator: &[u8; 16],
) -> Result<(), ValidationError> {
    let scrambled = avp.raw_value.take().unwrap_or_default();
    let plain = auth::decode_user_password(&scrambled, secret, authenticator)?;
    avp.raw_value = Some(plain);
    Ok(())
}

const USER_NAME: Validation = Validation {
    min_length: 1,
    max_length: None,
    decode: None,
};
const USER_PASSWORD: Validation = Validation {
    min_length: 16,
    max_length: Some(128),
    decode: Some(decode_user_password),
};
const CHAP_PASSWORD: Validation = Validation {
    min_length: 17,
    max_length: Some(17),
    decode: None,
};
const NAS_IP_ADDRESS: Validation = Validation {
    min_length: 4,
    max_length: Some(4),
    decode: None,
};
const NAS_PORT: Validation = Validation {
    min_length: 1,
    max_length: Some(4),
    decode: None,
};

/// Returns the validation entry for an attribute number, if any.
pub fn lookup(attr_nr: u8) -> Option<&'static Validation> {
    match attr_nr {
        attributes::USER_NAME => Some(&USER_NAME),
        attributes::USER_PASSWORD => Some(&USER_PASSWORD),
        attributes::CHAP_PASSWORD => Some(&CHAP_PASSWORD),
        attributes::NAS_IP_ADDRESS => Some(&NAS_IP_ADDRESS),
        attributes::NAS_PORT => Some(&NAS_PORT),
        _ => None,
    }
}
