use super::PacketCode;
use crate::attributes::{Avp, AvpError, AvpValue, Vsa, REPLY_MESSAGE, VENDOR_SPECIFIC};
use crate::auth;
use crate::codecs::{self, Coder};
use crate::dictionary::{Dictionary, NO_VENDOR};
use crate::validation::{self, ValidationError};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Maximum RADIUS packet length on the wire (RFC 2865 Section 3).
pub const MAX_PACKET_LEN: usize = 4095;

/// Fixed header size: code, identifier, length, authenticator.
const HEADER_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("packet too short: {0} bytes")]
    TooShort(usize),
    #[error("invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("invalid length")]
    InvalidLength,
    #[error("packet too large: {0} bytes")]
    PacketTooLarge(usize),
    #[error("unsupported packet code name: <{0}>")]
    UnsupportedPacketCode(String),
    #[error(transparent)]
    Avp(#[from] AvpError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A RADIUS packet: header plus an ordered list of AVPs, bound to the
/// shared secret, dictionary, and codec registry it is interpreted
/// against.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Authenticator                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
#[derive(Debug, Clone)]
pub struct Packet {
    pub code: PacketCode,
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub avps: Vec<Avp>,
    secret: String,
    dict: Arc<Dictionary>,
    coder: Coder,
    addr: Option<SocketAddr>,
}

impl Packet {
    /// Creates a fresh packet bound to a dictionary, codec registry, and
    /// shared secret. The authenticator starts zeroed; request builders
    /// fill it with random bytes.
    pub fn new(
        code: PacketCode,
        identifier: u8,
        dict: Arc<Dictionary>,
        coder: Coder,
        secret: impl Into<String>,
    ) -> Self {
        Packet {
            code,
            identifier,
            authenticator: [0u8; 16],
            avps: Vec::new(),
            secret: secret.into(),
            dict,
            coder,
            addr: None,
        }
    }

    /// Decodes a packet from wire bytes, running the per-attribute
    /// validation table on each AVP. Trailing bytes shorter than an AVP
    /// header are ignored.
    pub fn decode(
        buf: &[u8],
        dict: Arc<Dictionary>,
        coder: Coder,
        secret: impl Into<String>,
    ) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort(buf.len()));
        }
        let code = PacketCode::from_u8(buf[0]).ok_or(PacketError::InvalidCode(buf[0]))?;
        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&buf[4..20]);
        let mut pkt = Packet {
            code,
            identifier: buf[1],
            authenticator,
            avps: Vec::new(),
            secret: secret.into(),
            dict,
            coder,
            addr: None,
        };
        let mut rest = &buf[HEADER_LEN..];
        while rest.len() >= 2 {
            let number = rest[0];
            let length = usize::from(rest[1]);
            if length < 2 || length > rest.len() {
                return Err(PacketError::InvalidLength);
            }
            let mut avp = Avp::from_raw(number, rest[2..length].to_vec());
            if let Some(entry) = validation::lookup(number) {
                entry.validate(&mut avp, &pkt.secret, &pkt.authenticator)?;
            }
            pkt.avps.push(avp);
            rest = &rest[length..];
        }
        Ok(pkt)
    }

    /// Encodes the packet into `buf`, materializing raw AVP values,
    /// writing the length field, and stamping the authenticator. Returns
    /// the number of bytes written.
    pub fn encode(&mut self, buf: &mut [u8]) -> Result<usize, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(AvpError::BufferExhausted.into());
        }
        buf[0] = self.code.as_u8();
        buf[1] = self.identifier;
        buf[2..4].fill(0);
        buf[4..20].copy_from_slice(&self.authenticator);
        let mut written = HEADER_LEN;
        for avp in &mut self.avps {
            if avp.raw_value.is_none() {
                avp.set_raw_value(&self.dict, &self.coder)?;
            }
            written += avp.encode_into(&mut buf[written..])?;
        }
        if written > MAX_PACKET_LEN {
            return Err(PacketError::PacketTooLarge(written));
        }
        buf[2..4].copy_from_slice(&(written as u16).to_be_bytes());
        self.authenticator = auth::compute_authenticator(&mut buf[..written], &self.secret);
        buf[4..20].copy_from_slice(&self.authenticator);
        Ok(written)
    }

    /// Creates an empty reply sharing the request's identifier,
    /// authenticator, and bound context. The caller sets the reply code.
    pub fn reply(&self) -> Packet {
        Packet {
            code: self.code,
            identifier: self.identifier,
            authenticator: self.authenticator,
            avps: Vec::new(),
            secret: self.secret.clone(),
            dict: Arc::clone(&self.dict),
            coder: self.coder.clone(),
            addr: None,
        }
    }

    /// Creates the negative reply for a request, carrying `err_msg` as a
    /// Reply-Message attribute. Codes without a negative counterpart
    /// produce an empty reply.
    pub fn negative_reply(&self, err_msg: &str) -> Packet {
        let mut rply = self.reply();
        let code = match self.code {
            PacketCode::AccessRequest => Some(PacketCode::AccessReject),
            // RFC 2866 advises against errors in Accounting-Response;
            // carrying the message keeps the exchange RFC-agnostic.
            PacketCode::AccountingRequest => Some(PacketCode::AccountingResponse),
            PacketCode::CoARequest => Some(PacketCode::CoANAK),
            PacketCode::DisconnectRequest => Some(PacketCode::DisconnectNAK),
            _ => None,
        };
        if let Some(code) = code {
            rply.code = code;
            rply.avps
                .push(Avp::from_raw(REPLY_MESSAGE, err_msg.as_bytes().to_vec()));
        }
        rply
    }

    /// Whether any AVP carries the given attribute number.
    pub fn has(&self, attr_nr: u8) -> bool {
        self.avps.iter().any(|avp| avp.number == attr_nr)
    }

    /// Sets the packet code from its configuration name.
    pub fn set_code_from_name(&mut self, name: &str) -> Result<(), PacketError> {
        self.code = PacketCode::from_name(name)
            .ok_or_else(|| PacketError::UnsupportedPacketCode(name.to_string()))?;
        Ok(())
    }

    /// Materializes the typed value of every AVP, logging and skipping the
    /// ones the dictionary cannot resolve.
    pub fn set_avp_values(&mut self) {
        let dict = Arc::clone(&self.dict);
        let coder = self.coder.clone();
        for avp in &mut self.avps {
            if let Err(err) = avp.set_value(&dict, &coder) {
                warn!(number = avp.number, error = %err, "failed setting value for avp");
            }
        }
    }

    /// Queries AVPs by attribute number; a non-zero `vendor_code` queries
    /// the VSAs nested inside Vendor-Specific AVPs instead.
    pub fn attributes_with_number(&mut self, attr_nr: u8, vendor_code: u32) -> Vec<&Avp> {
        let query_nr = if vendor_code != NO_VENDOR {
            VENDOR_SPECIFIC
        } else {
            attr_nr
        };
        let dict = Arc::clone(&self.dict);
        let coder = self.coder.clone();
        let mut matches = Vec::new();
        for (idx, avp) in self.avps.iter_mut().enumerate() {
            if avp.number != query_nr {
                continue;
            }
            if let Err(err) = avp.set_value(&dict, &coder) {
                warn!(number = avp.number, error = %err, "failed setting value for avp");
                continue;
            }
            if vendor_code != NO_VENDOR {
                match &avp.value {
                    Some(AvpValue::Vsa(vsa)) if vsa.number == attr_nr => {}
                    _ => continue,
                }
            }
            matches.push(idx);
        }
        matches.into_iter().map(|idx| &self.avps[idx]).collect()
    }

    /// Queries AVPs by attribute name, resolving the number (and vendor)
    /// through the dictionary.
    pub fn attributes_with_name(&mut self, attr_name: &str, vendor_name: &str) -> Vec<&Avp> {
        let Some(da) = self.dict.attribute_with_name(attr_name, vendor_name) else {
            return Vec::new();
        };
        let mut vendor_code = NO_VENDOR;
        if !vendor_name.is_empty() {
            match self.dict.vendor_with_name(vendor_name) {
                Some(vendor) => vendor_code = vendor.vendor_number,
                None => return Vec::new(),
            }
        }
        self.attributes_with_number(da.attribute_number, vendor_code)
    }

    /// Appends an AVP built from a typed value, wrapping it in a
    /// Vendor-Specific AVP when `vendor_code` is non-zero.
    pub fn add_avp_with_number(
        &mut self,
        attr_nr: u8,
        value: impl Into<AvpValue>,
        vendor_code: u32,
    ) -> Result<(), PacketError> {
        let da = self.dict.attribute_with_number(attr_nr, vendor_code).ok_or(
            AvpError::DictionaryNotFound {
                attribute: attr_nr,
                vendor: vendor_code,
            },
        )?;
        let mut avp = if vendor_code == NO_VENDOR {
            Avp {
                number: attr_nr,
                name: da.attribute_name,
                attr_type: da.attribute_type,
                value: Some(value.into()),
                ..Avp::default()
            }
        } else {
            Avp {
                number: VENDOR_SPECIFIC,
                name: crate::attributes::VENDOR_SPECIFIC_NAME.to_string(),
                attr_type: codecs::STRING.to_string(),
                value: Some(AvpValue::Vsa(Box::new(Vsa {
                    vendor: vendor_code,
                    number: attr_nr,
                    name: da.attribute_name,
                    attr_type: da.attribute_type,
                    value: Some(value.into()),
                    ..Vsa::default()
                }))),
                ..Avp::default()
            }
        };
        avp.set_raw_value(&self.dict, &self.coder)?;
        self.avps.push(avp);
        Ok(())
    }

    /// Appends an AVP built from an attribute name and display string.
    pub fn add_avp_with_name(
        &mut self,
        attr_name: &str,
        display: &str,
        vendor_name: &str,
    ) -> Result<(), PacketError> {
        let da = self.dict.attribute_with_name(attr_name, vendor_name).ok_or_else(|| {
            AvpError::DictionaryNameNotFound {
                name: attr_name.to_string(),
                vendor: vendor_name.to_string(),
            }
        })?;
        let mut avp = if vendor_name.is_empty() {
            Avp {
                number: da.attribute_number,
                name: attr_name.to_string(),
                attr_type: da.attribute_type,
                string_value: display.to_string(),
                ..Avp::default()
            }
        } else {
            Avp {
                number: VENDOR_SPECIFIC,
                name: crate::attributes::VENDOR_SPECIFIC_NAME.to_string(),
                attr_type: codecs::STRING.to_string(),
                value: Some(AvpValue::Vsa(Box::new(Vsa {
                    vendor_name: vendor_name.to_string(),
                    number: da.attribute_number,
                    name: attr_name.to_string(),
                    attr_type: da.attribute_type,
                    string_value: display.to_string(),
                    ..Vsa::default()
                }))),
                ..Avp::default()
            }
        };
        avp.set_raw_value(&self.dict, &self.coder)?;
        self.avps.push(avp);
        Ok(())
    }

    /// The shared secret this packet is bound to.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Rebinds the packet to a different shared secret.
    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = secret.into();
    }

    /// The dictionary this packet resolves attributes against.
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// The codec registry this packet encodes values with.
    pub fn coder(&self) -> &Coder {
        &self.coder
    }

    /// Remote address the packet arrived from, when received by a server.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Binds the remote address, used by the server receive path.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::USER_NAME;

    // Sample packet from RFC 2865 Section 7.2.
    const RFC2865_ACCESS_REQUEST: [u8; 90] = [
        0x01, 0x01, 0x00, 0x47, 0x2a, 0xee, 0x86, 0xf0, 0x8d, 0x0d, 0x55, 0x96, 0x9c, 0xa5, 0x97,
        0x8e, 0x0d, 0x33, 0x67, 0xa2, 0x01, 0x08, 0x66, 0x6c, 0x6f, 0x70, 0x73, 0x79, 0x03, 0x13,
        0x16, 0xe9, 0x75, 0x57, 0xc3, 0x16, 0x18, 0x58, 0x95, 0xf2, 0x93, 0xff, 0x63, 0x44, 0x07,
        0x72, 0x75, 0x04, 0x06, 0xc0, 0xa8, 0x01, 0x10, 0x05, 0x06, 0x00, 0x00, 0x00, 0x14, 0x06,
        0x06, 0x00, 0x00, 0x00, 0x02, 0x07, 0x06, 0x00, 0x00, 0x00, 0x01, 0x1a, 0x13, 0x00, 0x00,
        0x00, 0x09, 0x17, 0x0d, 0x43, 0x47, 0x52, 0x61, 0x74, 0x65, 0x53, 0x2e, 0x6f, 0x72, 0x67,
    ];

    const SAMPLE_AUTHENTICATOR: [u8; 16] = [
        0x2a, 0xee, 0x86, 0xf0, 0x8d, 0x0d, 0x55, 0x96, 0x9c, 0xa5, 0x97, 0x8e, 0x0d, 0x33, 0x67,
        0xa2,
    ];

    fn test_packet(code: PacketCode, identifier: u8) -> Packet {
        Packet::new(
            code,
            identifier,
            Arc::new(Dictionary::rfc2865()),
            Coder::new(),
            "",
        )
    }

    #[test]
    fn test_packet_decode_rfc2865_sample() {
        let pkt = Packet::decode(
            &RFC2865_ACCESS_REQUEST,
            Arc::new(Dictionary::rfc2865()),
            Coder::new(),
            "",
        )
        .unwrap();
        assert_eq!(pkt.code, PacketCode::AccessRequest);
        assert_eq!(pkt.identifier, 1);
        assert_eq!(pkt.authenticator, SAMPLE_AUTHENTICATOR);

        let numbers: Vec<u8> = pkt.avps.iter().map(|avp| avp.number).collect();
        assert_eq!(numbers, vec![1, 3, 4, 5, 6, 7, 26]);

        assert_eq!(pkt.avps[0].raw_value, Some(b"flopsy".to_vec()));
        assert_eq!(
            pkt.avps[2].raw_value,
            Some(vec![0xc0, 0xa8, 0x01, 0x10]) // 192.168.1.16
        );
        assert_eq!(pkt.avps[3].raw_value, Some(vec![0x00, 0x00, 0x00, 0x14]));
        assert_eq!(
            pkt.avps[6].raw_value,
            Some(vec![
                0x00, 0x00, 0x00, 0x09, 0x17, 0x0d, 0x43, 0x47, 0x52, 0x61, 0x74, 0x65, 0x53,
                0x2e, 0x6f, 0x72, 0x67,
            ])
        );
    }

    #[test]
    fn test_packet_encode_access_accept() {
        let mut pkt = test_packet(PacketCode::AccessAccept, 1);
        // Authenticator out of the originating request.
        pkt.authenticator = SAMPLE_AUTHENTICATOR;
        pkt.avps = vec![
            Avp::from_raw(6, vec![0x00, 0x00, 0x00, 0x02]),  // Service-Type
            Avp::from_raw(7, vec![0x00, 0x00, 0x00, 0x01]),  // Framed-Protocol
            Avp::from_raw(8, vec![0xff, 0xff, 0xff, 0xfe]),  // Framed-IP-Address
            Avp::from_raw(10, vec![0x00, 0x00, 0x00, 0x02]), // Framed-Routing
            Avp::from_raw(13, vec![0x00, 0x00, 0x00, 0x01]), // Framed-Compression
            Avp::from_raw(12, vec![0x00, 0x00, 0x05, 0xdc]), // Framed-MTU
            Avp::from_raw(
                26,
                vec![
                    0x00, 0x00, 0x00, 0x09, 0x17, 0x0d, 0x43, 0x47, 0x52, 0x61, 0x74, 0x65, 0x53,
                    0x2e, 0x6f, 0x72, 0x67,
                ],
            ),
        ];
        let expected: [u8; 75] = [
            0x02, 0x01, 0x00, 0x4b, 0x0c, 0x51, 0xfd, 0x77, 0xec, 0xb6, 0x5a, 0xac, 0x43, 0x8b,
            0x79, 0x99, 0xe4, 0x12, 0x55, 0x18, 0x06, 0x06, 0x00, 0x00, 0x00, 0x02, 0x07, 0x06,
            0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0xff, 0xff, 0xff, 0xfe, 0x0a, 0x06, 0x00, 0x00,
            0x00, 0x02, 0x0d, 0x06, 0x00, 0x00, 0x00, 0x01, 0x0c, 0x06, 0x00, 0x00, 0x05, 0xdc,
            0x1a, 0x13, 0x00, 0x00, 0x00, 0x09, 0x17, 0x0d, 0x43, 0x47, 0x52, 0x61, 0x74, 0x65,
            0x53, 0x2e, 0x6f, 0x72, 0x67,
        ];
        let mut buf = [0u8; 4096];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(&buf[..n], &expected[..]);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut pkt = test_packet(PacketCode::AccountingRequest, 7);
        pkt.set_secret("CGRateS.org");
        pkt.avps = vec![
            Avp::from_raw(1, b"flopsy".to_vec()),
            Avp::from_raw(5, vec![0, 0, 0, 20]),
        ];
        let mut buf = [0u8; 4096];
        let n = pkt.encode(&mut buf).unwrap();

        let decoded = Packet::decode(
            &buf[..n],
            Arc::new(Dictionary::rfc2865()),
            Coder::new(),
            "CGRateS.org",
        )
        .unwrap();
        assert_eq!(decoded.code, pkt.code);
        assert_eq!(decoded.identifier, pkt.identifier);
        assert_eq!(decoded.authenticator, pkt.authenticator);
        assert_eq!(decoded.avps.len(), 2);
        assert_eq!(decoded.avps[0].raw_value, Some(b"flopsy".to_vec()));
    }

    #[test]
    fn test_access_request_authenticator_survives_encode() {
        let mut pkt = test_packet(PacketCode::AccessRequest, 1);
        pkt.set_secret("CGRateS.org");
        pkt.authenticator = SAMPLE_AUTHENTICATOR;
        pkt.avps = vec![Avp::from_raw(1, b"flopsy".to_vec())];
        let mut buf = [0u8; 4096];
        let n = pkt.encode(&mut buf).unwrap();
        assert_eq!(pkt.authenticator, SAMPLE_AUTHENTICATOR);
        assert_eq!(&buf[4..20], &SAMPLE_AUTHENTICATOR[..]);
        assert_eq!(n, 28);
    }

    #[test]
    fn test_accounting_request_is_authentic_round_trip() {
        let mut pkt = test_packet(PacketCode::AccountingRequest, 3);
        pkt.set_secret("CGRateS.org");
        pkt.avps = vec![Avp::from_raw(1, b"flopsy".to_vec())];
        let mut buf = [0u8; 4096];
        let n = pkt.encode(&mut buf).unwrap();

        assert!(auth::is_authentic_request(&buf[..n], "CGRateS.org"));
        assert!(!auth::is_authentic_request(&buf[..n], "other-secret"));
        // Byte 0 is exempt: flipping the code byte turns the packet into a
        // non-accounting code, which skips this pre-check entirely.
        for idx in 1..n {
            let mut tampered = buf[..n].to_vec();
            tampered[idx] ^= 0xff;
            assert!(
                !auth::is_authentic_request(&tampered, "CGRateS.org"),
                "byte {idx} flip not detected"
            );
        }
    }

    #[test]
    fn test_decode_too_short() {
        let err = Packet::decode(
            &[0u8; 19],
            Arc::new(Dictionary::new()),
            Coder::new(),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, PacketError::TooShort(19)));
    }

    #[test]
    fn test_decode_invalid_avp_length() {
        let mut buf = vec![0u8; 23];
        buf[0] = PacketCode::AccessRequest.as_u8();
        buf[1] = 255;
        buf[20] = 6;
        buf[21] = 0x22; // runs past the remaining three bytes
        let err = Packet::decode(&buf, Arc::new(Dictionary::new()), Coder::new(), "")
            .unwrap_err();
        assert!(matches!(err, PacketError::InvalidLength));
    }

    #[test]
    fn test_decode_validation_failure() {
        let mut buf = vec![0u8; 23];
        buf[0] = PacketCode::AccessRequest.as_u8();
        buf[1] = 1;
        // CHAP-Password with an empty value: below the 17-byte minimum.
        buf[20] = 3;
        buf[21] = 2;
        buf[22] = 7;
        let err = Packet::decode(&buf, Arc::new(Dictionary::new()), Coder::new(), "")
            .unwrap_err();
        assert!(matches!(
            err,
            PacketError::Validation(ValidationError::ValueTooShort { number: 3, .. })
        ));
    }

    #[test]
    fn test_decode_ignores_trailing_byte() {
        let mut buf = vec![0u8; 29];
        buf[0] = PacketCode::AccessRequest.as_u8();
        buf[20] = 1;
        buf[21] = 8;
        buf[22..28].copy_from_slice(b"flopsy");
        buf[28] = 7; // dangling byte, shorter than an AVP header
        let pkt = Packet::decode(&buf, Arc::new(Dictionary::new()), Coder::new(), "")
            .unwrap();
        assert_eq!(pkt.avps.len(), 1);
    }

    #[test]
    fn test_decode_unscrambles_user_password() {
        let mut request = test_packet(PacketCode::AccessRequest, 1);
        request.set_secret("CGRateS.org");
        request.authenticator = SAMPLE_AUTHENTICATOR;
        request.avps = vec![Avp::from_raw(
            2,
            auth::encode_user_password(
                b"CGRateSPassword1",
                b"CGRateS.org",
                &SAMPLE_AUTHENTICATOR,
            ),
        )];
        let mut buf = [0u8; 4096];
        let n = request.encode(&mut buf).unwrap();

        let decoded = Packet::decode(
            &buf[..n],
            Arc::new(Dictionary::rfc2865()),
            Coder::new(),
            "CGRateS.org",
        )
        .unwrap();
        assert_eq!(decoded.avps[0].raw_value, Some(b"CGRateSPassword1".to_vec()));
    }

    #[test]
    fn test_encode_missing_value() {
        let mut pkt = test_packet(PacketCode::Reserved, 5);
        pkt.avps = vec![Avp::default()];
        let mut buf = [0u8; 128];
        assert!(matches!(
            pkt.encode(&mut buf).unwrap_err(),
            PacketError::Avp(AvpError::MissingValue(0))
        ));
    }

    #[test]
    fn test_encode_oversized_avp() {
        let mut pkt = test_packet(PacketCode::Reserved, 5);
        pkt.avps = vec![Avp::from_raw(1, vec![0u8; 260])];
        let mut buf = [0u8; 512];
        assert!(matches!(
            pkt.encode(&mut buf).unwrap_err(),
            PacketError::Avp(AvpError::ValueTooLarge(260))
        ));
    }

    #[test]
    fn test_reply_shares_identifier_and_authenticator() {
        let mut req = test_packet(PacketCode::AccessRequest, 9);
        req.authenticator = SAMPLE_AUTHENTICATOR;
        let rply = req.reply();
        assert_eq!(rply.identifier, 9);
        assert_eq!(rply.authenticator, SAMPLE_AUTHENTICATOR);
        assert!(rply.avps.is_empty());
    }

    #[test]
    fn test_negative_reply_mapping() {
        for (request, expected) in [
            (PacketCode::AccessRequest, PacketCode::AccessReject),
            (PacketCode::AccountingRequest, PacketCode::AccountingResponse),
            (PacketCode::CoARequest, PacketCode::CoANAK),
            (PacketCode::DisconnectRequest, PacketCode::DisconnectNAK),
        ] {
            let pkt = test_packet(request, 1);
            let rply = pkt.negative_reply("testError");
            assert_eq!(rply.code, expected);
            assert_eq!(rply.avps.len(), 1);
            assert_eq!(rply.avps[0].number, REPLY_MESSAGE);
            assert_eq!(rply.avps[0].raw_value, Some(b"testError".to_vec()));
        }

        let rply = test_packet(PacketCode::StatusServer, 1).negative_reply("testError");
        assert!(rply.avps.is_empty());
    }

    #[test]
    fn test_has() {
        let mut pkt = test_packet(PacketCode::AccessRequest, 1);
        pkt.avps = vec![
            Avp::from_raw(1, vec![]),
            Avp::from_raw(25, vec![]),
            Avp::from_raw(5, vec![]),
        ];
        assert!(pkt.has(5));
        assert!(!pkt.has(6));
    }

    #[test]
    fn test_set_code_from_name() {
        let mut pkt = test_packet(PacketCode::Reserved, 1);
        pkt.set_code_from_name("AccessChallenge").unwrap();
        assert_eq!(pkt.code, PacketCode::AccessChallenge);
        assert!(matches!(
            pkt.set_code_from_name("Invalid").unwrap_err(),
            PacketError::UnsupportedPacketCode(_)
        ));
    }

    #[test]
    fn test_attributes_with_number_and_name() {
        let dict = Dictionary::rfc2865();
        dict.parse_from_reader(
            "
VENDOR    Cisco    9
BEGIN-VENDOR    Cisco
ATTRIBUTE    Cisco-NAS-Port    2    string
END-VENDOR    Cisco
"
            .as_bytes(),
        )
        .unwrap();
        let mut pkt = Packet::new(
            PacketCode::AccessRequest,
            1,
            Arc::new(dict),
            Coder::new(),
            "",
        );
        pkt.add_avp_with_name("User-Name", "flopsy", "").unwrap();
        pkt.add_avp_with_name("Cisco-NAS-Port", "CGR1", "Cisco").unwrap();

        let user = pkt.attributes_with_number(USER_NAME, NO_VENDOR);
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].display_value(), "flopsy");

        let ports = pkt.attributes_with_name("Cisco-NAS-Port", "Cisco");
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].display_value(), "CGR1");

        assert!(pkt.attributes_with_name("No-Such", "").is_empty());
    }

    #[test]
    fn test_add_avp_with_number_vsa() {
        let dict = Dictionary::new();
        dict.parse_from_reader(
            "
VENDOR    Cisco    9
BEGIN-VENDOR    Cisco
ATTRIBUTE    Cisco-Port-Count    5    integer
END-VENDOR    Cisco
"
            .as_bytes(),
        )
        .unwrap();
        let mut pkt = Packet::new(
            PacketCode::AccessRequest,
            1,
            Arc::new(dict),
            Coder::new(),
            "",
        );
        pkt.add_avp_with_number(5, 8u32, 9).unwrap();
        let avp = &pkt.avps[0];
        assert_eq!(avp.number, VENDOR_SPECIFIC);
        assert_eq!(
            avp.raw_value,
            Some(vec![0, 0, 0, 9, 5, 6, 0, 0, 0, 8])
        );
        match &avp.value {
            Some(AvpValue::Vsa(vsa)) => {
                assert_eq!(vsa.vendor, 9);
                assert_eq!(vsa.number, 5);
                assert_eq!(vsa.value, Some(AvpValue::Integer(8)));
            }
            other => panic!("expected VSA, got {other:?}"),
        }
    }

    #[test]
    fn test_add_avp_with_number_dictionary_miss() {
        let mut pkt = test_packet(PacketCode::AccessRequest, 1);
        let err = pkt.add_avp_with_number(200, 1u32, NO_VENDOR).unwrap_err();
        assert!(matches!(
            err,
            PacketError::Avp(AvpError::DictionaryNotFound {
                attribute: 200,
                vendor: NO_VENDOR
            })
        ));
    }

    #[test]
    fn test_alias_resolution_encodes_enum_number() {
        let dict = Dictionary::rfc2865();
        dict.parse_from_reader("VALUE    Framed-Protocol    PPP    1\n".as_bytes())
            .unwrap();
        let mut pkt = Packet::new(
            PacketCode::AccessRequest,
            1,
            Arc::new(dict),
            Coder::new(),
            "",
        );
        pkt.add_avp_with_name("Framed-Protocol", "PPP", "").unwrap();
        assert_eq!(pkt.avps[0].raw_value, Some(vec![0x00, 0x00, 0x00, 0x01]));
    }
}
