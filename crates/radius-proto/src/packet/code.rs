use std::fmt;

/// RADIUS packet codes from RFC 2865, RFC 2866, RFC 5176, and RFC 5997.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketCode {
    /// Access-Request (1)
    AccessRequest = 1,
    /// Access-Accept (2)
    AccessAccept = 2,
    /// Access-Reject (3)
    AccessReject = 3,
    /// Accounting-Request (4) - RFC 2866
    AccountingRequest = 4,
    /// Accounting-Response (5) - RFC 2866
    AccountingResponse = 5,
    /// Access-Challenge (11)
    AccessChallenge = 11,
    /// Status-Server (12) - RFC 5997, experimental
    StatusServer = 12,
    /// Status-Client (13) - RFC 5997, experimental
    StatusClient = 13,
    /// Disconnect-Request (40) - RFC 5176
    DisconnectRequest = 40,
    /// Disconnect-ACK (41) - RFC 5176
    DisconnectACK = 41,
    /// Disconnect-NAK (42) - RFC 5176
    DisconnectNAK = 42,
    /// CoA-Request (43) - RFC 5176
    CoARequest = 43,
    /// CoA-ACK (44) - RFC 5176
    CoAACK = 44,
    /// CoA-NAK (45) - RFC 5176
    CoANAK = 45,
    /// Reserved (255)
    Reserved = 255,
}

impl PacketCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(PacketCode::AccessRequest),
            2 => Some(PacketCode::AccessAccept),
            3 => Some(PacketCode::AccessReject),
            4 => Some(PacketCode::AccountingRequest),
            5 => Some(PacketCode::AccountingResponse),
            11 => Some(PacketCode::AccessChallenge),
            12 => Some(PacketCode::StatusServer),
            13 => Some(PacketCode::StatusClient),
            40 => Some(PacketCode::DisconnectRequest),
            41 => Some(PacketCode::DisconnectACK),
            42 => Some(PacketCode::DisconnectNAK),
            43 => Some(PacketCode::CoARequest),
            44 => Some(PacketCode::CoAACK),
            45 => Some(PacketCode::CoANAK),
            255 => Some(PacketCode::Reserved),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Maps a configuration name to its code, compared case-sensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AccessRequest" => Some(PacketCode::AccessRequest),
            "AccessAccept" => Some(PacketCode::AccessAccept),
            "AccessReject" => Some(PacketCode::AccessReject),
            "AccountingRequest" => Some(PacketCode::AccountingRequest),
            "AccountingResponse" => Some(PacketCode::AccountingResponse),
            "AccessChallenge" => Some(PacketCode::AccessChallenge),
            "StatusServer" => Some(PacketCode::StatusServer),
            "StatusClient" => Some(PacketCode::StatusClient),
            "DisconnectRequest" => Some(PacketCode::DisconnectRequest),
            "DisconnectACK" => Some(PacketCode::DisconnectACK),
            "DisconnectNAK" => Some(PacketCode::DisconnectNAK),
            "CoARequest" => Some(PacketCode::CoARequest),
            "CoAACK" => Some(PacketCode::CoAACK),
            "CoANAK" => Some(PacketCode::CoANAK),
            "Reserved" => Some(PacketCode::Reserved),
            _ => None,
        }
    }
}

impl fmt::Display for PacketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PacketCode::AccessRequest => "AccessRequest",
            PacketCode::AccessAccept => "AccessAccept",
            PacketCode::AccessReject => "AccessReject",
            PacketCode::AccountingRequest => "AccountingRequest",
            PacketCode::AccountingResponse => "AccountingResponse",
            PacketCode::AccessChallenge => "AccessChallenge",
            PacketCode::StatusServer => "StatusServer",
            PacketCode::StatusClient => "StatusClient",
            PacketCode::DisconnectRequest => "DisconnectRequest",
            PacketCode::DisconnectACK => "DisconnectACK",
            PacketCode::DisconnectNAK => "DisconnectNAK",
            PacketCode::CoARequest => "CoARequest",
            PacketCode::CoAACK => "CoAACK",
            PacketCode::CoANAK => "CoANAK",
            PacketCode::Reserved => "Reserved",
        };
        f.write_str(name)
    }
}
