//! RADIUS Protocol Engine
//!
//! This crate implements the RADIUS protocol as defined in RFC 2865, 2866,
//! and 5176: the wire codec for packets and attributes, authenticator
//! computation and verification, User-Password and CHAP credential
//! primitives, and a runtime-loaded attribute dictionary with typed value
//! codecs.
//!
//! # Example
//!
//! ```rust
//! use radius_proto::auth::generate_request_authenticator;
//! use radius_proto::{Coder, Dictionary, Packet, PacketCode};
//! use std::sync::Arc;
//!
//! let dict = Arc::new(Dictionary::rfc2865());
//! let mut req = Packet::new(
//!     PacketCode::AccessRequest,
//!     1,
//!     dict,
//!     Coder::new(),
//!     "shared-secret",
//! );
//! req.authenticator = generate_request_authenticator();
//! req.add_avp_with_name("User-Name", "flopsy", "").unwrap();
//!
//! let mut buf = [0u8; 4096];
//! let n = req.encode(&mut buf).unwrap();
//! assert_eq!(usize::from(u16::from_be_bytes([buf[2], buf[3]])), n);
//! ```

pub mod attributes;
pub mod auth;
pub mod codecs;
pub mod dictionary;
pub mod packet;
pub mod validation;

pub use attributes::{Avp, AvpError, AvpValue, Vsa};
pub use codecs::{AvpCodec, CodecError, Coder};
pub use dictionary::{
    Dictionary, DictionaryAttribute, DictionaryError, DictionaryValue, DictionaryVendor,
    NO_VENDOR,
};
pub use packet::{Packet, PacketCode, PacketError, MAX_PACKET_LEN};
pub use validation::{Validation, ValidationError};
