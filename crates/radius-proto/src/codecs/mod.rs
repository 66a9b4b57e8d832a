//! Attribute value codecs.
//!
//! A [`Coder`] maps dictionary type tags (`text`, `string`, `address`,
//! `ipaddr`, `integer`, `time`, `octets`) to the codec that converts between
//! wire bytes and typed values. Applications can register additional codecs
//! for vendor-defined type tags at client or server construction time.

mod address;
mod integer;
mod octets;
mod string;
mod text;
mod time;

pub use address::AddressCodec;
pub use integer::IntegerCodec;
pub use octets::OctetsCodec;
pub use string::StringCodec;
pub use text::TextCodec;
pub use time::TimeCodec;

use crate::attributes::AvpValue;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

/// Type tag for UTF-8 text values.
pub const TEXT: &str = "text";
/// Type tag for opaque string values (no UTF-8 requirement on the wire).
pub const STRING: &str = "string";
/// Type tag for IPv4 address values.
pub const ADDRESS: &str = "address";
/// Type tag for IPv4 address values (RFC 2865 spelling).
pub const IPADDR: &str = "ipaddr";
/// Type tag for 32-bit big-endian unsigned integers.
pub const INTEGER: &str = "integer";
/// Type tag for 32-bit big-endian UNIX timestamps.
pub const TIME: &str = "time";
/// Type tag for raw octet values.
pub const OCTETS: &str = "octets";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported attribute type <{0}>")]
    UnsupportedAttributeType(String),
    #[error("value is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("cannot encode {expected} value from {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("cannot enforce IPv4 on {0}")]
    NotIpv4(IpAddr),
    #[error("timestamp out of range")]
    TimestampOutOfRange,
    #[error("cannot parse display value <{0}>")]
    InvalidDisplay(String),
}

/// Converts a single attribute type between wire bytes and typed values.
pub trait AvpCodec: Send + Sync {
    /// Decodes raw wire bytes into the typed value and its display string.
    fn decode(&self, raw: &[u8]) -> Result<(AvpValue, String), CodecError>;

    /// Encodes a typed value into raw wire bytes.
    fn encode(&self, value: &AvpValue) -> Result<Vec<u8>, CodecError>;

    /// Parses a display string and encodes it into raw wire bytes.
    fn encode_string(&self, display: &str) -> Result<Vec<u8>, CodecError>;
}

/// Registry of value codecs keyed by dictionary type tag.
#[derive(Clone, Default)]
pub struct Coder {
    codecs: HashMap<String, Arc<dyn AvpCodec>>,
}

impl Coder {
    /// Creates a registry populated with the RFC 2865 type set.
    pub fn new() -> Self {
        let mut coder = Coder {
            codecs: HashMap::new(),
        };
        coder.register(TEXT, Arc::new(TextCodec));
        coder.register(STRING, Arc::new(StringCodec));
        coder.register(ADDRESS, Arc::new(AddressCodec));
        coder.register(IPADDR, Arc::new(AddressCodec));
        coder.register(INTEGER, Arc::new(IntegerCodec));
        coder.register(TIME, Arc::new(TimeCodec));
        coder.register(OCTETS, Arc::new(OctetsCodec));
        coder
    }

    /// Registers (or replaces) the codec for a type tag.
    pub fn register(&mut self, attr_type: impl Into<String>, codec: Arc<dyn AvpCodec>) {
        self.codecs.insert(attr_type.into(), codec);
    }

    fn get(&self, attr_type: &str) -> Result<&Arc<dyn AvpCodec>, CodecError> {
        self.codecs
            .get(attr_type)
            .ok_or_else(|| CodecError::UnsupportedAttributeType(attr_type.to_string()))
    }

    /// Decodes raw wire bytes via the codec registered for `attr_type`.
    pub fn decode(&self, attr_type: &str, raw: &[u8]) -> Result<(AvpValue, String), CodecError> {
        self.get(attr_type)?.decode(raw)
    }

    /// Encodes a typed value via the codec registered for `attr_type`.
    pub fn encode(&self, attr_type: &str, value: &AvpValue) -> Result<Vec<u8>, CodecError> {
        self.get(attr_type)?.encode(value)
    }

    /// Encodes a display string via the codec registered for `attr_type`.
    pub fn encode_string(&self, attr_type: &str, display: &str) -> Result<Vec<u8>, CodecError> {
        self.get(attr_type)?.encode_string(display)
    }
}

impl std::fmt::Debug for Coder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("Coder").field("types", &tags).finish()
    }
}
