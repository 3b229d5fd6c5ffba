//! Lumen Display - drives a WLED matrix over Art-Net from playback state
//!
//! The daemon resolves the device once at startup, fades the panel in on
//! dimming-capable modes, then hands control to the reconciliation loop
//! until Ctrl-C. The wall is blanked on the way out so a stopped daemon
//! never leaves a frozen frame glowing.
//!
//! ## Command line flags
//!
//! - `--config <path>`: read configuration from `path` instead of the
//!   default `~/.config/lumen/display.yaml`

mod config;
mod cover;
mod reconcile;
mod script;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use lumen_core::artnet::{ArtNetNode, ChannelLayout};
use lumen_core::config::{default_config_path, load_config, save_config};
use lumen_core::player::CoverSource;
use lumen_core::types::{PixelGrid, Rgb};

use config::AppConfig;
use cover::FileCover;
use reconcile::Reconciler;
use script::ScriptedPlayer;

const FADE_IN: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| default_config_path(config::CONFIG_FILE));

    log::info!("lumen-display starting, config at {}", config_path.display());
    let config: AppConfig = load_config(&config_path);

    // First run: materialise the defaults so there is a file to edit
    if !config_path.exists() {
        if let Err(e) = save_config(&config, &config_path) {
            log::warn!("could not write default config: {e:#}");
        }
    }

    let layout = ChannelLayout::compute(config.device.led_count(), config.device.mode)
        .context("device geometry is not addressable")?;
    let target = resolve(&config.device.address, config.device.port).await?;
    log::info!("device {} resolved to {target}", config.device.address);

    let node = Arc::new(ArtNetNode::bind(target, layout).await?);

    let covers = FileCover::load(
        config.cover_path.as_deref(),
        config.device.width,
        config.device.height,
    );

    // On dimming modes, come up from black instead of slamming to full
    if config.device.mode.reserves_brightness() {
        let grid = covers.cover(None).await?;
        node.set_brightness(0)?;
        node.fade_brightness(&grid, config.device.brightness, FADE_IN, config.animation.target_fps)
            .await?;
    }

    let player = match &config.script_path {
        Some(path) => ScriptedPlayer::from_file(path)?,
        None => {
            log::info!("no script configured, running the built-in demo timeline");
            ScriptedPlayer::demo()
        }
    };

    let reconciler = Reconciler::new(
        Arc::clone(&node),
        Arc::new(player),
        covers,
        config.clone(),
    );

    // run() only returns once the active session has stopped and its last
    // frame has flushed, so the blanking frame below is the final datagram
    reconciler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("signal handler failed: {e}");
            }
            log::info!("shutdown requested");
        })
        .await;

    let black = PixelGrid::solid(config.device.width, config.device.height, Rgb::new(0, 0, 0));
    if let Err(e) = node.set_pixels(&black, 1.0).await {
        log::warn!("could not blank the display: {e}");
    }

    Ok(())
}

/// Resolves the configured device name, mDNS names included, to the
/// first address the resolver offers. Unresolvable devices are fatal;
/// there is nothing to animate without a target.
async fn resolve(address: &str, port: u16) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host((address, port))
        .await
        .with_context(|| format!("resolving {address}:{port}"))?
        .next()
        .with_context(|| format!("{address} resolved to no addresses"))
}
