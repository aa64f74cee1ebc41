use crate::engine::{Engine, FrameOutcome, InputEvent};
use crate::raster::{Compositor, PixelBuffer};
use bevy::prelude::*;

/// The composited surface and the texture it is uploaded to.
pub struct Surface {
    pub buffer: PixelBuffer,
    pub image: Handle<Image>,
}

#[derive(Resource)]
pub struct BackdropState {
    pub engine: Option<Engine>,
    pub surface: Option<Surface>,
    pub compositor: Compositor,
    pub attach_requested: bool,
    pub pending: Vec<InputEvent>,
    pub last_outcome: Option<FrameOutcome>,

    // Host-side memory used to turn polled state into events
    pub last_cursor: Option<Vec2>,
    pub last_size: UVec2,
    pub hidden: bool,
    pub reduced_motion: bool,
    pub reduced_motion_override: Option<bool>,
}

impl Default for BackdropState {
    fn default() -> Self {
        Self {
            engine: None,
            surface: None,
            compositor: Compositor::new(),
            attach_requested: true,
            pending: Vec::new(),
            last_outcome: None,
            last_cursor: None,
            last_size: UVec2::ZERO,
            hidden: false,
            reduced_motion: false,
            reduced_motion_override: None,
        }
    }
}
