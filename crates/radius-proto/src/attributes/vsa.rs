use super::avp::{Avp, AvpError};
use super::{AvpValue, UNSUPPORTED_ATTRIBUTE_TYPE, VENDOR_SPECIFIC};
use crate::codecs::{CodecError, Coder};
use crate::dictionary::Dictionary;

/// Vendor-Specific Attribute, the sub-attribute nested inside an AVP of
/// type 26. On the wire the AVP value is
/// `vendor_id(4) ‖ vendor_type(1) ‖ vendor_length(1) ‖ value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vsa {
    /// IANA enterprise number.
    pub vendor: u32,
    /// Attribute number inside the vendor namespace.
    pub number: u8,
    /// Wire form of the inner value.
    pub raw_value: Option<Vec<u8>>,
    /// Vendor name, resolved from the dictionary.
    pub vendor_name: String,
    /// Attribute name inside the vendor namespace.
    pub name: String,
    /// Dictionary type tag, empty until resolved.
    pub attr_type: String,
    /// Typed form of the inner value.
    pub value: Option<AvpValue>,
    /// Human-readable form of the inner value.
    pub string_value: String,
}

impl Vsa {
    /// Extracts the VSA nested inside a Vendor-Specific AVP's raw bytes.
    pub fn from_avp(avp: &Avp) -> Result<Self, AvpError> {
        if avp.number != VENDOR_SPECIFIC {
            return Err(AvpError::NotVsa(avp.number));
        }
        let raw = avp
            .raw_value
            .as_deref()
            .ok_or(AvpError::MissingRawValue(avp.number))?;
        if raw.len() < 6 {
            return Err(AvpError::VsaTooShort(raw.len()));
        }
        let vendor = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let number = raw[4];
        // The vendor length byte covers the vendor type and length fields.
        let value_len = usize::from(raw[5]).saturating_sub(2);
        if raw.len() < 6 + value_len {
            return Err(AvpError::VsaTooShort(raw.len()));
        }
        Ok(Vsa {
            vendor,
            number,
            raw_value: Some(raw[6..6 + value_len].to_vec()),
            ..Vsa::default()
        })
    }

    /// Wraps the VSA back into a Vendor-Specific AVP.
    pub fn to_avp(&self) -> Result<Avp, AvpError> {
        let raw = self
            .raw_value
            .as_deref()
            .ok_or(AvpError::MissingRawValue(self.number))?;
        if raw.len() + 2 > 255 {
            return Err(AvpError::ValueTooLarge(raw.len()));
        }
        let mut value = Vec::with_capacity(raw.len() + 6);
        value.extend_from_slice(&self.vendor.to_be_bytes());
        value.push(self.number);
        value.push((raw.len() + 2) as u8);
        value.extend_from_slice(raw);
        Ok(Avp::from_raw(VENDOR_SPECIFIC, value))
    }

    /// Populates the typed value and display string from the raw bytes,
    /// resolving metadata through the vendor's dictionary namespace.
    pub fn set_value(&mut self, dict: &Dictionary, coder: &Coder) -> Result<(), AvpError> {
        if self.value.is_some() {
            return Ok(());
        }
        let da = dict.attribute_with_number(self.number, self.vendor).ok_or(
            AvpError::DictionaryNotFound {
                attribute: self.number,
                vendor: self.vendor,
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
                            dict.value_with_number(&da.attribute_name, value_nr, self.vendor)
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
    pub fn set_raw_value(&mut self, dict: &Dictionary, coder: &Coder) -> Result<(), AvpError> {
        if self.raw_value.is_some() {
            return Ok(());
        }
        if self.value.is_none() && self.string_value.is_empty() {
            return Err(AvpError::MissingValue(self.number));
        }
        if self.vendor == 0 && !self.vendor_name.is_empty() {
            if let Some(vendor) = dict.vendor_with_name(&self.vendor_name) {
                self.vendor = vendor.vendor_number;
            }
        }
        if self.attr_type.is_empty() {
            let da = if !self.name.is_empty() {
                if self.vendor_name.is_empty() {
                    let vendor = dict
                        .vendor_with_code(self.vendor)
                        .ok_or(AvpError::VendorNotFound(self.vendor))?;
                    self.vendor_name = vendor.vendor_name;
                }
                dict.attribute_with_name(&self.name, &self.vendor_name)
            } else if self.number != 0 {
                dict.attribute_with_number(self.number, self.vendor)
            } else {
                None
            };
            let da = da.ok_or_else(|| AvpError::DictionaryNameNotFound {
                name: self.name.clone(),
                vendor: self.vendor_name.clone(),
            })?;
            self.name = da.attribute_name;
            self.attr_type = da.attribute_type;
            self.number = da.attribute_number;
        }
        if let Some(value) = &self.value {
            self.raw_value = Some(coder.encode(&self.attr_type, value)?);
            return Ok(());
        }
        if let Some(dv) =
            dict.value_with_name(&self.name, &self.string_value, &self.vendor_name)
        {
            self.raw_value = Some(coder.encode(
                &self.attr_type,
                &AvpValue::Integer(u32::from(dv.value_number)),
            )?);
            return Ok(());
        }
        self.raw_value = Some(coder.encode_string(&self.attr_type, &self.string_value)?);
        Ok(())
    }
}
