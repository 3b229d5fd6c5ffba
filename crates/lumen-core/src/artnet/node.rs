//! Art-Net node handler
//!
//! Owns the UDP transport and the cached channel layout for one device.
//! Each frame is scaled, split across universes, and fanned out as one
//! concurrent send per universe; the caller regains control only once
//! every universe write has finished, so pacing starts after the whole
//! frame is on the wire.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use super::error::{ConfigError, TransportError};
use super::layout::ChannelLayout;
use super::packet::{encode_dmx, Sequence};
use crate::types::{PixelGrid, CHANNELS_PER_UNIVERSE};

pub struct ArtNetNode {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    layout: ChannelLayout,
    sequences: Vec<Sequence>,
    /// Written to the reserved channel of universe 0 on every frame when
    /// the mode reserves one.
    brightness: AtomicU8,
}

impl ArtNetNode {
    /// Binds an ephemeral local socket for the given device. The layout is
    /// computed once by the caller and cached here for every frame.
    pub async fn bind(target: SocketAddr, layout: ChannelLayout) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(TransportError::Bind)?;
        let sequences = (0..layout.universes()).map(|_| Sequence::default()).collect();

        log::info!(
            "Art-Net node ready: {} pixels across {} universes at {}",
            layout.leds(),
            layout.universes(),
            target
        );

        Ok(Self {
            socket: Arc::new(socket),
            target,
            layout,
            sequences,
            brightness: AtomicU8::new(u8::MAX),
        })
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Scales the grid by `factor` and transmits one datagram per universe,
    /// all dispatched concurrently and joined before returning. On failure
    /// the first error is reported; the frame is simply dropped, a fresher
    /// one follows within a frame period.
    pub async fn set_pixels(&self, grid: &PixelGrid, factor: f32) -> Result<(), TransportError> {
        let pixels = grid.pixels();
        let mut sends = Vec::with_capacity(self.layout.universes());

        for universe in 0..self.layout.universes() {
            let mut channels = [0u8; CHANNELS_PER_UNIVERSE];
            if universe == 0 && self.layout.mode().reserves_brightness() {
                channels[0] = self.brightness.load(Ordering::Relaxed);
            }

            let base = self.layout.pixel_base(universe);
            let width = self.layout.mode().channel_width();
            for (slot, index) in self.layout.universe_pixels(universe).enumerate() {
                let Some(pixel) = pixels.get(index) else {
                    break;
                };
                let scaled = pixel.scaled(factor);
                let channel = base + slot * width;
                channels[channel] = scaled.r;
                channels[channel + 1] = scaled.g;
                channels[channel + 2] = scaled.b;
            }

            let packet = encode_dmx(
                universe as u16,
                self.sequences[universe].advance(),
                &channels,
            );
            let socket = Arc::clone(&self.socket);
            let target = self.target;
            sends.push(tokio::spawn(async move {
                socket
                    .send_to(&packet, target)
                    .await
                    .map(|_| ())
                    .map_err(|source| TransportError::Send {
                        universe: universe as u16,
                        source,
                    })
            }));
        }

        // Join barrier: every universe write finishes before pacing starts
        let mut first_error = None;
        for send in sends {
            match send.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => log::warn!("universe send task failed: {}", e),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Sets the value carried by the reserved brightness channel. Takes
    /// effect on the next transmitted frame.
    pub fn set_brightness(&self, value: u8) -> Result<(), ConfigError> {
        if !self.layout.mode().reserves_brightness() {
            return Err(ConfigError::NotDimmable {
                mode: self.layout.mode(),
            });
        }
        self.brightness.store(value, Ordering::Relaxed);
        Ok(())
    }

    /// Fades the brightness channel linearly to `target` over `duration`,
    /// retransmitting `grid` at the frame rate. Blocks until the fade has
    /// finished, animation starts only afterwards.
    pub async fn fade_brightness(
        &self,
        grid: &PixelGrid,
        target: u8,
        duration: Duration,
        fps: u32,
    ) -> Result<(), ConfigError> {
        if !self.layout.mode().reserves_brightness() {
            return Err(ConfigError::NotDimmable {
                mode: self.layout.mode(),
            });
        }

        let start = f32::from(self.brightness.load(Ordering::Relaxed));
        let end = f32::from(target);
        let steps = ((duration.as_secs_f32() * fps as f32) as u32).max(1);

        for step in 1..=steps {
            let value = start + (end - start) * step as f32 / steps as f32;
            self.brightness.store(value as u8, Ordering::Relaxed);
            if let Err(e) = self.set_pixels(grid, 1.0).await {
                log::warn!("fade frame dropped: {}", e);
            }
            tokio::time::sleep(duration / steps).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artnet::layout::DeviceMode;
    use crate::types::Rgb;

    async fn receiver() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    async fn recv_frame(socket: &UdpSocket, universes: usize) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        for _ in 0..universes {
            let mut buf = vec![0u8; 1024];
            let len = tokio::time::timeout(Duration::from_secs(2), socket.recv(&mut buf))
                .await
                .expect("timed out waiting for frame")
                .unwrap();
            buf.truncate(len);
            packets.push(buf);
        }
        // Concurrent fan-out has no ordering guarantee, sort by universe
        packets.sort_by_key(|p| u16::from_le_bytes([p[14], p[15]]));
        packets
    }

    #[tokio::test]
    async fn test_frame_spans_all_universes() {
        let (device, addr) = receiver().await;
        let layout = ChannelLayout::compute(256, DeviceMode::MultiRgb).unwrap();
        let node = ArtNetNode::bind(addr, layout).await.unwrap();

        let grid = PixelGrid::solid(16, 16, Rgb::new(255, 255, 255));
        node.set_pixels(&grid, 0.5).await.unwrap();

        let packets = recv_frame(&device, 2).await;
        assert_eq!(packets[0].len(), 530);
        assert_eq!(&packets[0][..8], b"Art-Net\0");
        // 255 * 0.5 floors to 127
        assert_eq!(packets[0][18], 127);
        assert_eq!(packets[1][18], 127);
        // Universe 1 carries 86 pixels; its trailing channels stay zero
        assert_eq!(packets[1][18 + 86 * 3], 0);
    }

    #[tokio::test]
    async fn test_near_black_pixels_unscaled() {
        let (device, addr) = receiver().await;
        let layout = ChannelLayout::compute(4, DeviceMode::MultiRgb).unwrap();
        let node = ArtNetNode::bind(addr, layout).await.unwrap();

        let pixels = vec![
            Rgb::new(29, 29, 29),
            Rgb::new(200, 100, 50),
            Rgb::new(0, 0, 0),
            Rgb::new(30, 30, 30),
        ];
        let grid = PixelGrid::new(2, 2, pixels).unwrap();
        node.set_pixels(&grid, 0.5).await.unwrap();

        let packet = &recv_frame(&device, 1).await[0];
        assert_eq!(&packet[18..21], &[29, 29, 29]);
        assert_eq!(&packet[21..24], &[100, 50, 25]);
        assert_eq!(&packet[27..30], &[15, 15, 15]);
    }

    #[tokio::test]
    async fn test_dim_mode_carries_brightness_channel() {
        let (device, addr) = receiver().await;
        let layout = ChannelLayout::compute(4, DeviceMode::DimMultiRgb).unwrap();
        let node = ArtNetNode::bind(addr, layout).await.unwrap();
        node.set_brightness(128).unwrap();

        let grid = PixelGrid::solid(2, 2, Rgb::new(255, 0, 0));
        node.set_pixels(&grid, 1.0).await.unwrap();

        let packet = &recv_frame(&device, 1).await[0];
        assert_eq!(packet[18], 128); // reserved brightness channel
        assert_eq!(&packet[19..22], &[255, 0, 0]); // first pixel, shifted by one
    }

    #[tokio::test]
    async fn test_brightness_rejected_without_dim_mode() {
        let (_device, addr) = receiver().await;
        let layout = ChannelLayout::compute(4, DeviceMode::MultiRgb).unwrap();
        let node = ArtNetNode::bind(addr, layout).await.unwrap();

        assert!(matches!(
            node.set_brightness(10),
            Err(ConfigError::NotDimmable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fade_reaches_target() {
        let (device, addr) = receiver().await;
        let layout = ChannelLayout::compute(4, DeviceMode::DimMultiRgb).unwrap();
        let node = ArtNetNode::bind(addr, layout).await.unwrap();
        node.set_brightness(0).unwrap();

        let grid = PixelGrid::solid(2, 2, Rgb::new(255, 255, 255));
        node.fade_brightness(&grid, 200, Duration::from_millis(40), 50)
            .await
            .unwrap();

        let packets = recv_frame(&device, 2).await;
        let mut last = 0;
        for packet in &packets {
            assert!(packet[18] >= last, "brightness must be monotonic");
            last = packet[18];
        }
        assert_eq!(last, 200);
    }
}
