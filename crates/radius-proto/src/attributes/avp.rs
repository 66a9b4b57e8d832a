use super::{
    AvpValue, Vsa, UNSUPPORTED_ATTRIBUTE_TYPE, VENDOR_SPECIFIC, VENDOR_SPECIFIC_NAME,
};
use crate::codecs::{self, CodecError, Coder};
use crate::dictionary::{Dictionary, NO_VENDOR};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvpError {
    #[error("value too big for attribute: {0} bytes")]
    ValueTooLarge(usize),
    #[error("encode buffer exhausted")]
    BufferExhausted,
    #[error("no value set for attribute {0}")]
    MissingValue(u8),
    #[error("no raw value set for attribute {0}")]
    MissingRawValue(u8),
    #[error("no dictionary entry for attribute {attribute}, vendor {vendor}")]
    DictionaryNotFound { attribute: u8, vendor: u32 },
    #[error("no dictionary entry for attribute name <{name}>, vendor <{vendor}>")]
    DictionaryNameNotFound { name: String, vendor: String },
    #[error("no vendor in dictionary for id {0}")]
    VendorNotFound(u32),
    #[error("attribute {0} is not vendor specific")]
    NotVsa(u8),
    #[error("vendor specific attribute carries a non-VSA value")]
    VsaValueExpected,
    #[error("vendor specific value too short: {0} bytes")]
    VsaTooShort(usize),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A single Attribute-Value Pair.
///
/// Exactly one of `raw_value` or (`value`/`string_value`) is authoritative
/// at any step; [`set_value`](Avp::set_value) and
/// [`set_raw_value`](Avp::set_raw_value) derive the missing projection and
/// are no-ops once their target is populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Avp {
    /// Attribute number (wire type byte).
    pub number: u8,
    /// Attribute name, resolved from the dictionary.
    pub name: String,
    /// Dictionary type tag (`text`, `integer`, ...), empty until resolved.
    pub attr_type: String,
    /// Wire form of the value.
    pub raw_value: Option<Vec<u8>>,
    /// Typed form of the value.
    pub value: Option<AvpValue>,
    /// Human-readable form; the enum label for dictionary-enumerated
    /// integers.
    pub string_value: String,
}

impl Avp {
    /// Creates an AVP from wire bytes, as the packet decoder does.
    pub fn from_raw(number: u8, raw_value: impl Into<Vec<u8>>) -> Self {
        Avp {
            number,
            raw_value: Some(raw_value.into()),
            ..Avp::default()
        }
    }

    /// Creates an AVP from a typed value, to be materialized on encode.
    pub fn with_value(number: u8, value: impl Into<AvpValue>) -> Self {
        Avp {
            number,
            value: Some(value.into()),
            ..Avp::default()
        }
    }

    /// Creates an AVP from an attribute name and display string; the number
    /// and type are resolved from the dictionary on encode.
    pub fn with_display(name: impl Into<String>, display: impl Into<String>) -> Self {
        Avp {
            name: name.into(),
            string_value: display.into(),
            ..Avp::default()
        }
    }

    /// Writes `number ‖ length ‖ raw` into `buf`, returning bytes written.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize, AvpError> {
        let raw = self
            .raw_value
            .as_deref()
            .ok_or(AvpError::MissingRawValue(self.number))?;
        let full_len = raw.len() + 2;
        if full_len > 255 {
            return Err(AvpError::ValueTooLarge(raw.len()));
        }
        if buf.len() < full_len {
            return Err(AvpError::BufferExhausted);
        }
        buf[0] = self.number;
        buf[1] = full_len as u8;
        buf[2..full_len].copy_from_slice(raw);
        Ok(full_len)
    }

    /// Populates the typed value and display string from the raw bytes.
    ///
    /// No-op when the value is already set. Vendor-Specific AVPs recurse
    /// into [`Vsa::set_value`]. A type tag without a registered codec keeps
    /// the raw bytes and names the AVP `unsupported attribute type` without
    /// failing.
    pub fn set_value(&mut self, dict: &Dictionary, coder: &Coder) -> Result<(), AvpError> {
        if self.value.is_some() {
            return Ok(());
        }
        if self.number == VENDOR_SPECIFIC {
            let mut vsa = Vsa::from_avp(self)?;
            vsa.set_value(dict, coder)?;
            self.name = VENDOR_SPECIFIC_NAME.to_string();
            self.attr_type = codecs::STRING.to_string();
            self.value = Some(AvpValue::Vsa(Box::new(vsa)));
            return Ok(());
        }
        let da = dict.attribute_with_number(self.number, NO_VENDOR).ok_or(
            AvpError::DictionaryNotFound {
                attribute: self.number,
                vendor: NO_VENDOR,
            },
        )?;
        let raw = self
            .raw_value
            .as_deref()
            .ok_or(AvpError::MissingRawValue(self.number))?;
        match coder.decode(&da.attribute_type, raw) {
            Ok((value, display)) => {
                self.name = da.attribute_name.clone();
                self.string_value = display;
                if let AvpValue::Integer(n) = value {
                    if let Ok(value_nr) = u8::try_from(n) {
                        if let Some(dv) =
                            dict.value_with_number(&da.attribute_name, value_nr, NO_VENDOR)
                        {
                            self.string_value = dv.value_name;
                        }
                    }
                }
                self.value = Some(value);
            }
            Err(CodecError::UnsupportedAttributeType(_)) => {
                self.name = UNSUPPORTED_ATTRIBUTE_TYPE.to_string();
            }
            Err(err) => return Err(err.into()),
        }
        self.attr_type = da.attribute_type;
        Ok(())
    }

    /// Populates the raw bytes from the typed value or display string.
    ///
    /// No-op when the raw bytes are already set. Missing dictionary
    /// metadata is resolved by name first, then by number. Vendor-Specific
    /// AVPs materialize the inner VSA and wrap it in the 6-byte vendor
    /// layout.
    pub fn set_raw_value(&mut self, dict: &Dictionary, coder: &Coder) -> Result<(), AvpError> {
        if self.raw_value.is_some() {
            return Ok(());
        }
        if self.value.is_none() && self.string_value.is_empty() {
            return Err(AvpError::MissingValue(self.number));
        }
        if self.attr_type.is_empty() {
            let da = if !self.name.is_empty() {
                dict.attribute_with_name(&self.name, "")
            } else if self.number != 0 {
                dict.attribute_with_number(self.number, NO_VENDOR)
            } else {
                None
            };
            let da = da.ok_or_else(|| AvpError::DictionaryNameNotFound {
                name: self.name.clone(),
                vendor: String::new(),
            })?;
            self.name = da.attribute_name;
            self.attr_type = da.attribute_type;
            self.number = da.attribute_number;
        }
        if self.number == VENDOR_SPECIFIC {
            let Some(AvpValue::Vsa(vsa)) = self.value.as_mut() else {
                return Err(AvpError::VsaValueExpected);
            };
            vsa.set_raw_value(dict, coder)?;
            self.raw_value = vsa.to_avp()?.raw_value;
            return Ok(());
        }
        if let Some(value) = &self.value {
            self.raw_value = Some(coder.encode(&self.attr_type, value)?);
            return Ok(());
        }
        // Only the display string is present; a dictionary enum label wins
        // over the codec's display parser.
        if let Some(dv) = dict.value_with_name(&self.name, &self.string_value, "") {
            self.raw_value = Some(coder.encode(
                &self.attr_type,
                &AvpValue::Integer(u32::from(dv.value_number)),
            )?);
            return Ok(());
        }
        self.raw_value = Some(coder.encode_string(&self.attr_type, &self.string_value)?);
        Ok(())
    }

    /// The display string, looking through Vendor-Specific nesting.
    pub fn display_value(&self) -> &str {
        if self.number == VENDOR_SPECIFIC {
            if let Some(AvpValue::Vsa(vsa)) = &self.value {
                return &vsa.string_value;
            }
        }
        &self.string_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::NAS_IP_ADDRESS;
    use std::net::IpAddr;

    fn cisco_dict() -> Dictionary {
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
        dict
    }

    #[test]
    fn test_encode_into() {
        let avp = Avp::from_raw(1, b"flopsy".to_vec());
        let mut buf = [0u8; 64];
        let n = avp.encode_into(&mut buf).unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buf[..n], &[0x01, 0x08, 0x66, 0x6c, 0x6f, 0x70, 0x73, 0x79]);
    }

    #[test]
    fn test_encode_into_value_too_large() {
        let avp = Avp::from_raw(1, vec![0u8; 254]);
        let mut buf = [0u8; 512];
        assert!(matches!(
            avp.encode_into(&mut buf).unwrap_err(),
            AvpError::ValueTooLarge(254)
        ));
    }

    #[test]
    fn test_encode_into_buffer_exhausted() {
        let avp = Avp::from_raw(1, b"flopsy".to_vec());
        let mut buf = [0u8; 4];
        assert!(matches!(
            avp.encode_into(&mut buf).unwrap_err(),
            AvpError::BufferExhausted
        ));
    }

    #[test]
    fn test_set_value_address() {
        let mut avp = Avp::from_raw(NAS_IP_ADDRESS, vec![0xc0, 0xa8, 0x01, 0x10]);
        avp.set_value(&Dictionary::rfc2865(), &Coder::new()).unwrap();
        assert_eq!(avp.name, "NAS-IP-Address");
        assert_eq!(avp.attr_type, codecs::IPADDR);
        let expected: IpAddr = "192.168.1.16".parse().unwrap();
        assert_eq!(avp.value, Some(AvpValue::Address(expected)));
        assert_eq!(avp.string_value, "192.168.1.16");
    }

    #[test]
    fn test_set_value_is_noop_when_set() {
        let mut avp = Avp::with_value(1, "kept");
        avp.set_value(&Dictionary::new(), &Coder::new()).unwrap();
        assert_eq!(avp.value, Some(AvpValue::String("kept".to_string())));
    }

    #[test]
    fn test_set_value_no_dictionary_entry() {
        let mut avp = Avp::from_raw(200, vec![1, 2, 3]);
        let err = avp.set_value(&Dictionary::rfc2865(), &Coder::new()).unwrap_err();
        assert!(matches!(
            err,
            AvpError::DictionaryNotFound {
                attribute: 200,
                vendor: NO_VENDOR
            }
        ));
    }

    #[test]
    fn test_set_value_unsupported_type_keeps_raw() {
        let dict = Dictionary::new();
        dict.parse_from_reader("ATTRIBUTE    Odd-One    77    abinary\n".as_bytes())
            .unwrap();
        let mut avp = Avp::from_raw(77, vec![0xde, 0xad]);
        avp.set_value(&dict, &Coder::new()).unwrap();
        assert_eq!(avp.name, UNSUPPORTED_ATTRIBUTE_TYPE);
        assert_eq!(avp.attr_type, "abinary");
        assert_eq!(avp.raw_value, Some(vec![0xde, 0xad]));
        assert!(avp.value.is_none());
    }

    #[test]
    fn test_set_value_integer_enum_display() {
        let dict = Dictionary::rfc2865();
        dict.parse_from_reader("VALUE    Framed-Protocol    PPP    1\n".as_bytes())
            .unwrap();
        let mut avp = Avp::from_raw(7, vec![0, 0, 0, 1]);
        avp.set_value(&dict, &Coder::new()).unwrap();
        assert_eq!(avp.value, Some(AvpValue::Integer(1)));
        assert_eq!(avp.string_value, "PPP");

        // Without an enum entry the display stays decimal.
        let mut avp = Avp::from_raw(7, vec![0, 0, 0, 2]);
        avp.set_value(&dict, &Coder::new()).unwrap();
        assert_eq!(avp.string_value, "2");
    }

    #[test]
    fn test_set_raw_value_with_alias() {
        let dict = Dictionary::rfc2865();
        dict.parse_from_reader("VALUE    Framed-Protocol    PPP    1\n".as_bytes())
            .unwrap();
        let mut avp = Avp::with_display("Framed-Protocol", "PPP");
        avp.set_raw_value(&dict, &Coder::new()).unwrap();
        assert_eq!(avp.raw_value, Some(vec![0x00, 0x00, 0x00, 0x01]));
        assert_eq!(avp.number, 7);
    }

    #[test]
    fn test_set_raw_value_display_without_alias() {
        let mut avp = Avp::with_display("NAS-Port-Id", "20");
        avp.set_raw_value(&Dictionary::rfc2865(), &Coder::new()).unwrap();
        assert_eq!(avp.raw_value, Some(vec![0, 0, 0, 20]));
    }

    #[test]
    fn test_set_raw_value_no_value() {
        let mut avp = Avp::default();
        assert!(matches!(
            avp.set_raw_value(&Dictionary::new(), &Coder::new())
                .unwrap_err(),
            AvpError::MissingValue(0)
        ));
    }

    #[test]
    fn test_set_raw_value_missing_dictionary_data() {
        let mut avp = Avp::with_display("No-Such-Attribute", "x");
        assert!(matches!(
            avp.set_raw_value(&Dictionary::rfc2865(), &Coder::new())
                .unwrap_err(),
            AvpError::DictionaryNameNotFound { .. }
        ));
    }

    #[test]
    fn test_vsa_round_trip_through_avp() {
        let dict = cisco_dict();
        let coder = Coder::new();
        let mut avp = Avp {
            number: VENDOR_SPECIFIC,
            value: Some(AvpValue::Vsa(Box::new(Vsa {
                vendor_name: "Cisco".to_string(),
                name: "Cisco-NAS-Port".to_string(),
                string_value: "CGR1".to_string(),
                ..Vsa::default()
            }))),
            ..Avp::default()
        };
        avp.attr_type = codecs::STRING.to_string();
        avp.set_raw_value(&dict, &coder).unwrap();

        let mut decoded = Avp::from_raw(VENDOR_SPECIFIC, avp.raw_value.clone().unwrap());
        decoded.set_value(&dict, &coder).unwrap();
        assert_eq!(decoded.display_value(), "CGR1");
        match decoded.value {
            Some(AvpValue::Vsa(vsa)) => {
                assert_eq!(vsa.vendor, 9);
                assert_eq!(vsa.number, 2);
                assert_eq!(vsa.raw_value, Some(b"CGR1".to_vec()));
            }
            other => panic!("expected VSA value, got {other:?}"),
        }
    }
}
