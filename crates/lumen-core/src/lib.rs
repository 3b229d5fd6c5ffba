//! Lumen Core - ArtNet animation engine for LED matrix displays

pub mod animation;
pub mod artnet;
pub mod config;
pub mod effects;
pub mod player;
pub mod types;

pub use types::*;
