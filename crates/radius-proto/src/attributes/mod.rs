//! RADIUS attributes.
//!
//! An [`Avp`] carries the raw wire bytes of one attribute and, lazily, its
//! typed value and display string as resolved through a
//! [`Dictionary`](crate::dictionary::Dictionary). A [`Vsa`] is the
//! vendor-scoped sub-attribute nested inside an AVP of type 26.

mod avp;
mod vsa;

pub use avp::{Avp, AvpError};
pub use vsa::Vsa;

use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// User-Name (1)
pub const USER_NAME: u8 = 1;
/// User-Password (2)
pub const USER_PASSWORD: u8 = 2;
/// CHAP-Password (3)
pub const CHAP_PASSWORD: u8 = 3;
/// NAS-IP-Address (4)
pub const NAS_IP_ADDRESS: u8 = 4;
/// NAS-Port (5)
pub const NAS_PORT: u8 = 5;
/// Reply-Message (18)
pub const REPLY_MESSAGE: u8 = 18;
/// Vendor-Specific (26)
pub const VENDOR_SPECIFIC: u8 = 26;

/// Dictionary name of attribute 26.
pub const VENDOR_SPECIFIC_NAME: &str = "Vendor-Specific";

/// Name given to an AVP whose type tag has no registered codec. The raw
/// bytes are preserved for the application to interpret.
pub const UNSUPPORTED_ATTRIBUTE_TYPE: &str = "unsupported attribute type";

/// Typed attribute value, the concrete form of an AVP's raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AvpValue {
    /// UTF-8 text.
    Text(String),
    /// Opaque string (no UTF-8 requirement on the wire).
    String(String),
    /// IPv4 address (`address`/`ipaddr` types).
    Address(IpAddr),
    /// 32-bit unsigned integer.
    Integer(u32),
    /// Seconds since the UNIX epoch.
    Time(DateTime<Utc>),
    /// Raw octets.
    Octets(Vec<u8>),
    /// Vendor-specific sub-attribute.
    Vsa(Box<Vsa>),
}

impl AvpValue {
    /// Returns the string payload for text/string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AvpValue::Text(s) | AvpValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Variant name, used in codec mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            AvpValue::Text(_) => "text",
            AvpValue::String(_) => "string",
            AvpValue::Address(_) => "address",
            AvpValue::Integer(_) => "integer",
            AvpValue::Time(_) => "time",
            AvpValue::Octets(_) => "octets",
            AvpValue::Vsa(_) => "vsa",
        }
    }
}

impl From<&str> for AvpValue {
    fn from(s: &str) -> Self {
        AvpValue::String(s.to_string())
    }
}

impl From<u32> for AvpValue {
    fn from(n: u32) -> Self {
        AvpValue::Integer(n)
    }
}

impl From<IpAddr> for AvpValue {
    fn from(ip: IpAddr) -> Self {
        AvpValue::Address(ip)
    }
}

impl From<Vsa> for AvpValue {
    fn from(vsa: Vsa) -> Self {
        AvpValue::Vsa(Box::new(vsa))
    }
}
