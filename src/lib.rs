//! Generative canvas backdrops: a reaction-diffusion "liquid ink" field,
//! a curl-noise particle flow and a pixel-art terrain scroller, driven by a
//! frame-throttled engine and presented through Bevy.

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod ink;
pub mod noise;
pub mod palette;
pub mod particles;
pub mod pointer;
pub mod raster;
pub mod render;
pub mod terrain;

// Bevy host
pub mod canvas;
pub mod host;
pub mod state;
pub mod ui;

pub use config::{BackdropMode, EngineConfig};
pub use engine::{Engine, FrameOutcome, InputEvent};
pub use error::EngineError;
