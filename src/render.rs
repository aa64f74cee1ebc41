use crate::raster::PixelBuffer;
use bevy::math::{UVec2, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Screen,
    Overlay,
}

/// Blur + saturate pass applied to a blit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowFilter {
    /// Blur radius in canvas pixels.
    pub blur: f32,
    pub saturate: f32,
}

/// One drawing operation, in canvas pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Paint the whole canvas; `alpha < 1` leaves trails.
    Fill { color: Vec3, alpha: f32 },
    /// Stretch the frame's field image over the canvas.
    Blit {
        blend: BlendMode,
        glow: Option<GlowFilter>,
        smooth: bool,
        alpha: f32,
    },
    /// Sparse random grey pixels.
    Grain { density: f32, alpha: f32, seed: u64 },
    Segment {
        from: Vec2,
        to: Vec2,
        color: Vec3,
        alpha: f32,
    },
    /// Radial gradient, opaque at the centre and clear at `radius`.
    Glow {
        center: Vec2,
        radius: f32,
        color: Vec3,
        alpha: f32,
    },
}

/// Everything a surface needs to present one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub canvas: UVec2,
    pub commands: &'a [DrawCommand],
    pub image: Option<&'a PixelBuffer>,
}

impl Frame<'_> {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
