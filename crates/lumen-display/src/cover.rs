//! Cover image source
//!
//! Decodes one image at startup, resizes it to the device grid and
//! serves that grid for every track. A missing or undecodable file
//! falls back to a generated gradient so the engine always has
//! something to pulse.

use std::future::Future;
use std::path::Path;

use image::imageops::FilterType;

use lumen_core::player::{CoverSource, TrackId};
use lumen_core::types::{PixelGrid, Rgb};

pub struct FileCover {
    grid: PixelGrid,
}

impl FileCover {
    /// Decodes and resizes `path` once. Falls back to the placeholder
    /// gradient when the path is absent or the decode fails, so startup
    /// never dies over a bad image.
    pub fn load(path: Option<&Path>, width: usize, height: usize) -> Self {
        let grid = match path {
            Some(path) => match decode(path, width, height) {
                Ok(grid) => grid,
                Err(e) => {
                    log::warn!("cover {} unusable, using placeholder: {e:#}", path.display());
                    placeholder(width, height)
                }
            },
            None => placeholder(width, height),
        };
        Self { grid }
    }
}

impl CoverSource for FileCover {
    fn cover(
        &self,
        _track: Option<&TrackId>,
    ) -> impl Future<Output = anyhow::Result<PixelGrid>> + Send {
        let grid = self.grid.clone();
        async move { Ok(grid) }
    }
}

fn decode(path: &Path, width: usize, height: usize) -> anyhow::Result<PixelGrid> {
    let image = image::open(path)?
        .resize_exact(width as u32, height as u32, FilterType::Lanczos3)
        .into_rgb8();
    let pixels = image
        .pixels()
        .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
        .collect();
    PixelGrid::new(width, height, pixels)
        .ok_or_else(|| anyhow::anyhow!("decoded image does not cover the {width}x{height} grid"))
}

/// Diagonal two-axis gradient, bright enough to clear the near-black
/// threshold everywhere.
fn placeholder(width: usize, height: usize) -> PixelGrid {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let ramp = |v: usize, max: usize| {
                    (64 + (v * 191) / max.saturating_sub(1).max(1)) as u8
                };
                Rgb::new(ramp(x, width), ramp(y, height), 160)
            })
        })
        .collect();
    match PixelGrid::new(width, height, pixels) {
        Some(grid) => grid,
        None => PixelGrid::solid(width, height, Rgb::new(64, 64, 160)),
    }
}
