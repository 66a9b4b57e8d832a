//! RADIUS packet header, codes, and wire codec.

mod code;
#[allow(clippy::module_inception)]
mod packet;

pub use code::PacketCode;
pub use packet::{Packet, PacketError, MAX_PACKET_LEN};
