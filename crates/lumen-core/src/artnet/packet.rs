//! ArtDmx datagram encoding
//!
//! One fixed-size packet per universe per frame: the 18-byte ArtDmx header
//! followed by a full 512-channel payload. Fire-and-forget UDP, no
//! acknowledgement and no retry.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::types::CHANNELS_PER_UNIVERSE;

const ARTNET_ID: &[u8; 8] = b"Art-Net\0";
const OP_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;
const HEADER_LEN: usize = 18;

/// Total size of an ArtDmx packet carrying a full universe.
pub const PACKET_LEN: usize = HEADER_LEN + CHANNELS_PER_UNIVERSE;

/// Per-universe wrapping sequence counter. Zero means "sequence disabled"
/// on the wire, so the counter runs 1..=255 and skips 0 when wrapping.
#[derive(Debug, Default)]
pub struct Sequence(AtomicU8);

impl Sequence {
    pub fn advance(&self) -> u8 {
        let prev = self.0.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
            Some(if s == u8::MAX { 1 } else { s + 1 })
        });
        match prev {
            Ok(u8::MAX) | Err(_) => 1,
            Ok(p) => p + 1,
        }
    }
}

/// Encodes one ArtDmx packet for `universe`.
pub fn encode_dmx(
    universe: u16,
    sequence: u8,
    channels: &[u8; CHANNELS_PER_UNIVERSE],
) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[..8].copy_from_slice(ARTNET_ID);
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet[12] = sequence;
    packet[13] = 0; // physical input port, informational only
    packet[14..16].copy_from_slice(&universe.to_le_bytes());
    packet[16..18].copy_from_slice(&(CHANNELS_PER_UNIVERSE as u16).to_be_bytes());
    packet[HEADER_LEN..].copy_from_slice(channels);
    packet
}
