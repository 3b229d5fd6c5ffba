//! Art-Net transport for WLED matrix devices
//!
//! Split into the deterministic channel layout, the ArtDmx wire encoding,
//! and the node handler owning the UDP socket.

mod error;
mod layout;
mod node;
mod packet;

pub use error::{ConfigError, TransportError};
pub use layout::{ChannelLayout, DeviceMode};
pub use node::ArtNetNode;
pub use packet::PACKET_LEN;
