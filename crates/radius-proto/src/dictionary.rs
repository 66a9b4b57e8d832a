//! RADIUS attribute dictionary.
//!
//! A [`Dictionary`] is an in-memory database mapping attribute numbers,
//! names, enumerated values, and vendors, built by parsing the line-oriented
//! FreeRADIUS dictionary grammar:
//!
//! ```text
//! ATTRIBUTE  <name>  <number>  <type>
//! VALUE      <attribute-name>  <value-name>  <number>
//! VENDOR     <name>  <number>  [<format>]
//! BEGIN-VENDOR <vendor-name>
//! END-VENDOR   <vendor-name>
//! ```
//!
//! Malformed lines are logged and skipped so one broken definition never
//! poisons a whole dictionary file. Readers may query concurrently; parsing
//! takes the write lock.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;
use tracing::warn;

/// Vendor id of the unnamed global namespace.
pub const NO_VENDOR: u32 = 0;

/// Built-in RFC 2865 attribute set, kept loadable so callers can extend it
/// from `dictionary.*` files at runtime.
pub const RFC2865_DICTIONARY: &str = r#"
# Originally copied from FreeRADIUS dictionary

ATTRIBUTE	User-Name		1	string
ATTRIBUTE	Password		2	string
ATTRIBUTE	CHAP-Password		3	string
ATTRIBUTE	NAS-IP-Address		4	ipaddr
ATTRIBUTE	NAS-Port-Id		5	integer
ATTRIBUTE	Service-Type		6	integer
ATTRIBUTE	Framed-Protocol		7	integer
ATTRIBUTE	Framed-IP-Address	8	ipaddr
ATTRIBUTE	Framed-IP-Netmask	9	ipaddr
ATTRIBUTE	Framed-Routing		10	integer
ATTRIBUTE	Filter-Id		11	string
ATTRIBUTE	Framed-MTU		12	integer
ATTRIBUTE	Framed-Compression	13	integer
ATTRIBUTE	Login-IP-Host		14	ipaddr
ATTRIBUTE	Login-Service		15	integer
ATTRIBUTE	Login-TCP-Port		16	integer
ATTRIBUTE	Reply-Message		18	string
ATTRIBUTE	Callback-Number		19	string
ATTRIBUTE	Callback-Id		20	string
ATTRIBUTE	Framed-Route		22	string
ATTRIBUTE	Framed-IPX-Network	23	ipaddr
ATTRIBUTE	State			24	string
ATTRIBUTE	Class			25	string
ATTRIBUTE	Vendor-Specific		26	string
ATTRIBUTE	Session-Timeout		27	integer
ATTRIBUTE	Idle-Timeout		28	integer
ATTRIBUTE	Termination-Action	29	integer
ATTRIBUTE	Called-Station-Id	30	string
ATTRIBUTE	Calling-Station-Id	31	string
ATTRIBUTE	NAS-Identifier		32	string
ATTRIBUTE	Proxy-State		33	string
ATTRIBUTE	Login-LAT-Service	34	string
ATTRIBUTE	Login-LAT-Node		35	string
ATTRIBUTE	Login-LAT-Group		36	string
ATTRIBUTE	Framed-AppleTalk-Link	37	integer
ATTRIBUTE	Framed-AppleTalk-Network	38	integer
ATTRIBUTE	Framed-AppleTalk-Zone	39	string
ATTRIBUTE	Acct-Status-Type	40	integer
ATTRIBUTE	Acct-Delay-Time		41	integer
ATTRIBUTE	Acct-Input-Octets	42	integer
ATTRIBUTE	Acct-Output-Octets	43	integer
ATTRIBUTE	Acct-Session-Id		44	string
ATTRIBUTE	Acct-Authentic		45	integer
ATTRIBUTE	Acct-Session-Time	46	integer
ATTRIBUTE	Acct-Input-Packets	47	integer
ATTRIBUTE	Acct-Output-Packets	48	integer
ATTRIBUTE	Acct-Terminate-Cause	49	integer
ATTRIBUTE	Acct-Multi-Session-Id	50	string
ATTRIBUTE	Acct-Link-Count		51	integer
ATTRIBUTE	Acct-Input-Gigawords	52	integer
ATTRIBUTE	Acct-Output-Gigawords	53	integer
ATTRIBUTE	Event-Timestamp		55	integer
ATTRIBUTE	Egress-VLANID		56	string
ATTRIBUTE	Ingress-Filters		57	integer
ATTRIBUTE	Egress-VLAN-Name	58	string
ATTRIBUTE	User-Priority-Table	59	string
ATTRIBUTE	CHAP-Challenge		60	string
ATTRIBUTE	NAS-Port-Type		61	integer
ATTRIBUTE	Port-Limit		62	integer
ATTRIBUTE	Login-LAT-Port		63	integer
"#;

const ATTRIBUTE_KEYWORD: &str = "ATTRIBUTE";
const VALUE_KEYWORD: &str = "VALUE";
const VENDOR_KEYWORD: &str = "VENDOR";
const BEGIN_VENDOR_KEYWORD: &str = "BEGIN-VENDOR";
const END_VENDOR_KEYWORD: &str = "END-VENDOR";
const INCLUDE_KEYWORD: &str = "$INCLUDE";

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("path {0} is not a directory")]
    NotADirectory(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Per-line parse failures. These are logged and skipped, never propagated.
#[derive(Error, Debug)]
enum LineError {
    #[error("invalid attribute definition: {0}")]
    InvalidAttribute(String),
    #[error("invalid value definition: {0}")]
    InvalidValue(String),
    #[error("invalid vendor definition: {0}")]
    InvalidVendor(String),
    #[error("attribute number <{0}> must be lower than 256")]
    AttributeNumberRange(String),
    #[error("vendor name missing")]
    MissingVendorName,
    #[error("unknown vendor name: {0}")]
    UnknownVendor(String),
    #[error("no BEGIN-VENDOR for vendor name: {0}")]
    UnbalancedEndVendor(String),
    #[error("unsupported keyword: {0}")]
    UnsupportedKeyword(String),
}

/// Attribute definition: name, number, and value type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryAttribute {
    pub attribute_name: String,
    pub attribute_number: u8,
    pub attribute_type: String,
}

/// Enumerated value definition for an integer attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryValue {
    pub attribute_name: String,
    pub value_name: String,
    pub value_number: u8,
}

/// Vendor definition. The format string is parsed but unused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryVendor {
    pub vendor_name: String,
    pub vendor_number: u32,
    pub format: String,
}

/// `ATTRIBUTE <name> <number> <type>`; a `[n]` size annotation on the type
/// tag (e.g. `octets[50]`) is stripped.
fn parse_attribute(fields: &[&str]) -> Result<DictionaryAttribute, LineError> {
    if fields.len() < 4 {
        return Err(LineError::InvalidAttribute(fields.join(" ")));
    }
    let number: u16 = fields[2]
        .parse()
        .map_err(|_| LineError::InvalidAttribute(fields.join(" ")))?;
    let number =
        u8::try_from(number).map_err(|_| LineError::AttributeNumberRange(fields[2].to_string()))?;
    let attr_type = match fields[3].find('[') {
        Some(idx) => &fields[3][..idx],
        None => fields[3],
    };
    Ok(DictionaryAttribute {
        attribute_name: fields[1].to_string(),
        attribute_number: number,
        attribute_type: attr_type.to_string(),
    })
}

/// `VALUE <attribute-name> <value-name> <number>`
fn parse_value(fields: &[&str]) -> Result<DictionaryValue, LineError> {
    if fields.len() < 4 {
        return Err(LineError::InvalidValue(fields.join(" ")));
    }
    let number: u8 = fields[3]
        .parse()
        .map_err(|_| LineError::InvalidValue(fields.join(" ")))?;
    Ok(DictionaryValue {
        attribute_name: fields[1].to_string(),
        value_name: fields[2].to_string(),
        value_number: number,
    })
}

/// `VENDOR <name> <number> [<format>]`
fn parse_vendor(fields: &[&str]) -> Result<DictionaryVendor, LineError> {
    if fields.len() < 3 {
        return Err(LineError::InvalidVendor(fields.join(" ")));
    }
    let number: u32 = fields[2]
        .parse()
        .map_err(|_| LineError::InvalidVendor(fields.join(" ")))?;
    Ok(DictionaryVendor {
        vendor_name: fields[1].to_string(),
        vendor_number: number,
        format: fields.get(3).unwrap_or(&"").to_string(),
    })
}

#[derive(Debug, Default)]
struct Indices {
    /// (vendor id, attribute number) -> attribute
    by_number: HashMap<u32, HashMap<u8, DictionaryAttribute>>,
    /// (vendor name, attribute name) -> attribute
    by_name: HashMap<String, HashMap<String, DictionaryAttribute>>,
    /// (vendor name, attribute name, value name) -> value
    value_by_name: HashMap<String, HashMap<String, HashMap<String, DictionaryValue>>>,
    /// (vendor id, attribute name, value number) -> value
    value_by_number: HashMap<u32, HashMap<String, HashMap<u8, DictionaryValue>>>,
    vendor_by_id: HashMap<u32, DictionaryVendor>,
    vendor_by_name: HashMap<String, DictionaryVendor>,
    /// Vendor the parser is currently filing definitions under.
    active_vendor: DictionaryVendor,
}

impl Indices {
    fn apply(&mut self, line_nr: usize, fields: &[&str]) -> Result<(), LineError> {
        match fields[0] {
            ATTRIBUTE_KEYWORD => {
                let attr = parse_attribute(fields)?;
                self.by_number
                    .entry(self.active_vendor.vendor_number)
                    .or_default()
                    .insert(attr.attribute_number, attr.clone());
                self.by_name
                    .entry(self.active_vendor.vendor_name.clone())
                    .or_default()
                    .insert(attr.attribute_name.clone(), attr);
            }
            VALUE_KEYWORD => {
                let value = parse_value(fields)?;
                self.value_by_name
                    .entry(self.active_vendor.vendor_name.clone())
                    .or_default()
                    .entry(value.attribute_name.clone())
                    .or_default()
                    .insert(value.value_name.clone(), value.clone());
                self.value_by_number
                    .entry(self.active_vendor.vendor_number)
                    .or_default()
                    .entry(value.attribute_name.clone())
                    .or_default()
                    .insert(value.value_number, value);
            }
            VENDOR_KEYWORD => {
                let vendor = parse_vendor(fields)?;
                self.vendor_by_id.insert(vendor.vendor_number, vendor.clone());
                self.vendor_by_name
                    .insert(vendor.vendor_name.clone(), vendor);
            }
            BEGIN_VENDOR_KEYWORD => {
                let name = fields.get(1).ok_or(LineError::MissingVendorName)?;
                let vendor = self
                    .vendor_by_name
                    .get(*name)
                    .ok_or_else(|| LineError::UnknownVendor(name.to_string()))?;
                self.active_vendor = vendor.clone();
            }
            END_VENDOR_KEYWORD => {
                let name = fields.get(1).ok_or(LineError::MissingVendorName)?;
                let vendor = self
                    .vendor_by_name
                    .get(*name)
                    .ok_or_else(|| LineError::UnknownVendor(name.to_string()))?;
                if self.active_vendor.vendor_number != vendor.vendor_number {
                    return Err(LineError::UnbalancedEndVendor(name.to_string()));
                }
                self.active_vendor = DictionaryVendor::default();
            }
            INCLUDE_KEYWORD => {
                // Inclusion is resolved by directory loading, not inline.
                warn!(line = line_nr, "$INCLUDE directive skipped");
            }
            keyword => return Err(LineError::UnsupportedKeyword(keyword.to_string())),
        }
        Ok(())
    }
}

/// Translates between attribute numbers, names, and value types, grouped by
/// vendor. Safe to share behind an `Arc` between clients, servers, and
/// packets.
#[derive(Debug, Default)]
pub struct Dictionary {
    indices: RwLock<Indices>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Creates a dictionary preloaded with the RFC 2865 attribute set.
    pub fn rfc2865() -> Self {
        let dict = Dictionary::new();
        // The built-in literal always parses; I/O cannot fail on a slice.
        let _ = dict.parse_from_reader(RFC2865_DICTIONARY.as_bytes());
        dict
    }

    /// Parses dictionary lines from a reader, merging into the existing
    /// indices (later definitions overwrite earlier ones).
    ///
    /// Content errors are logged with their line number and skipped; only
    /// I/O errors propagate.
    pub fn parse_from_reader(&self, reader: impl BufRead) -> io::Result<()> {
        let mut indices = match self.indices.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_nr = idx + 1;
            if line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if let Err(err) = indices.apply(line_nr, &fields) {
                warn!(line = line_nr, error = %err, "skipping dictionary line");
            }
        }
        Ok(())
    }

    /// Walks a directory tree and parses every `dictionary.*` file found.
    pub fn parse_from_folder(&self, dir_path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let dir_path = dir_path.as_ref();
        if !dir_path.is_dir() {
            return Err(DictionaryError::NotADirectory(
                dir_path.display().to_string(),
            ));
        }
        self.parse_dir(dir_path)
    }

    fn parse_dir(&self, dir: &Path) -> Result<(), DictionaryError> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.parse_dir(&path)?;
                continue;
            }
            let is_dict_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("dictionary."));
            if is_dict_file {
                self.parse_from_reader(BufReader::new(File::open(&path)?))?;
            }
        }
        Ok(())
    }

    /// Creates an RFC 2865 dictionary supplemented from `dictionary.*` files
    /// under the given directory.
    pub fn from_folder_with_rfc2865(dir_path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let dict = Dictionary::rfc2865();
        dict.parse_from_folder(dir_path)?;
        Ok(dict)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Indices> {
        match self.indices.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Looks up an attribute by number within a vendor namespace
    /// (vendor id 0 = global).
    pub fn attribute_with_number(
        &self,
        attr_nr: u8,
        vendor_code: u32,
    ) -> Option<DictionaryAttribute> {
        self.read().by_number.get(&vendor_code)?.get(&attr_nr).cloned()
    }

    /// Looks up an attribute by name within a vendor namespace
    /// (empty vendor name = global).
    pub fn attribute_with_name(
        &self,
        attr_name: &str,
        vendor_name: &str,
    ) -> Option<DictionaryAttribute> {
        self.read().by_name.get(vendor_name)?.get(attr_name).cloned()
    }

    /// Looks up an enumerated value by name.
    pub fn value_with_name(
        &self,
        attr_name: &str,
        value_name: &str,
        vendor_name: &str,
    ) -> Option<DictionaryValue> {
        self.read()
            .value_by_name
            .get(vendor_name)?
            .get(attr_name)?
            .get(value_name)
            .cloned()
    }

    /// Looks up an enumerated value by number.
    pub fn value_with_number(
        &self,
        attr_name: &str,
        value_nr: u8,
        vendor_code: u32,
    ) -> Option<DictionaryValue> {
        self.read()
            .value_by_number
            .get(&vendor_code)?
            .get(attr_name)?
            .get(&value_nr)
            .cloned()
    }

    /// Looks up a vendor by name.
    pub fn vendor_with_name(&self, vendor_name: &str) -> Option<DictionaryVendor> {
        self.read().vendor_by_name.get(vendor_name).cloned()
    }

    /// Looks up a vendor by id.
    pub fn vendor_with_code(&self, vendor_code: u32) -> Option<DictionaryVendor> {
        self.read().vendor_by_id.get(&vendor_code).cloned()
    }
}
