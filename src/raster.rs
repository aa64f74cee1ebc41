//! Software compositor: executes a [`Frame`]'s draw commands onto an RGBA8
//! pixel buffer that the host uploads as a texture.

use crate::error::EngineError;
use crate::render::{BlendMode, DrawCommand, Frame, GlowFilter};
use bevy::math::{UVec2, Vec2, Vec3};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Opaque RGBA8 image, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

#[inline]
fn to_rgba(color: Vec3) -> Rgba<u8> {
    let c = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + Vec3::splat(0.5);
    Rgba([c.x as u8, c.y as u8, c.z as u8, 255])
}

#[inline]
fn to_vec3(px: &Rgba<u8>) -> Vec3 {
    Vec3::new(px[0] as f32, px[1] as f32, px[2] as f32) / 255.0
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptySurface { width, height });
        }
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        to_vec3(self.image.get_pixel(x, y))
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, color: Vec3) {
        self.image.put_pixel(x, y, to_rgba(color));
    }

    pub fn fill(&mut self, color: Vec3) {
        let px = to_rgba(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: Vec3, alpha: f32, mode: BlendMode) {
        let dst = self.get(x, y);
        self.put(x, y, blend(dst, src, alpha, mode));
    }
}

/// Blends `src` over `dst` at `alpha` with the canvas blend modes.
pub fn blend(dst: Vec3, src: Vec3, alpha: f32, mode: BlendMode) -> Vec3 {
    let alpha = alpha.clamp(0.0, 1.0);
    match mode {
        BlendMode::Normal => dst.lerp(src, alpha),
        BlendMode::Screen => dst.lerp(Vec3::ONE - (Vec3::ONE - dst) * (Vec3::ONE - src), alpha),
        BlendMode::Overlay => {
            let ch = |d: f32, s: f32| {
                if d < 0.5 {
                    2.0 * d * s
                } else {
                    1.0 - 2.0 * (1.0 - d) * (1.0 - s)
                }
            };
            let over = Vec3::new(ch(dst.x, src.x), ch(dst.y, src.y), ch(dst.z, src.z));
            dst.lerp(over, alpha)
        }
    }
}

/// Pushes a colour away from (or toward) its grey value.
pub fn saturate(color: Vec3, amount: f32) -> Vec3 {
    let luma = crate::palette::luminance(color);
    (Vec3::splat(luma) + (color - Vec3::splat(luma)) * amount).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Runs draw commands against a surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compositor;

impl Compositor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&mut self, frame: &Frame, surface: &mut PixelBuffer) {
        if frame.canvas.x == 0 || frame.canvas.y == 0 {
            return;
        }
        let scale = surface.size().as_vec2() / frame.canvas.as_vec2();

        for command in frame.commands {
            match *command {
                DrawCommand::Fill { color, alpha } => {
                    for y in 0..surface.height() {
                        for x in 0..surface.width() {
                            surface.blend(x, y, color, alpha, BlendMode::Normal);
                        }
                    }
                }
                DrawCommand::Blit {
                    blend,
                    glow,
                    smooth,
                    alpha,
                } => {
                    if let Some(image) = frame.image {
                        blit(image, frame.canvas, surface, blend, glow, smooth, alpha);
                    }
                }
                DrawCommand::Grain {
                    density,
                    alpha,
                    seed,
                } => grain(surface, density, alpha, seed),
                DrawCommand::Segment {
                    from,
                    to,
                    color,
                    alpha,
                } => segment(surface, from * scale, to * scale, color, alpha),
                DrawCommand::Glow {
                    center,
                    radius,
                    color,
                    alpha,
                } => radial_glow(surface, center * scale, radius * scale.x, color, alpha),
            }
        }
    }
}

fn blit(
    image: &PixelBuffer,
    canvas: UVec2,
    surface: &mut PixelBuffer,
    mode: BlendMode,
    glow: Option<GlowFilter>,
    smooth: bool,
    alpha: f32,
) {
    // 1. Optional glow filter, at image resolution
    let filtered;
    let mut source = image.as_image();
    if let Some(filter) = glow {
        let sigma = filter.blur * image.width() as f32 / canvas.x as f32;
        let mut glowing = if sigma >= 0.5 {
            imageops::fast_blur(source, sigma)
        } else {
            source.clone()
        };
        for px in glowing.pixels_mut() {
            *px = to_rgba(saturate(to_vec3(px), filter.saturate));
        }
        filtered = glowing;
        source = &filtered;
    }

    // 2. Resample onto the surface
    let filter = if smooth {
        FilterType::Triangle
    } else {
        FilterType::Nearest
    };
    let scaled = imageops::resize(source, surface.width(), surface.height(), filter);
    for (x, y, px) in scaled.enumerate_pixels() {
        surface.blend(x, y, to_vec3(px), alpha, mode);
    }
}

fn grain(surface: &mut PixelBuffer, density: f32, alpha: f32, seed: u64) {
    let total = surface.width() as f32 * surface.height() as f32;
    let count = (total * density.clamp(0.0, 1.0)) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..count {
        let x = rng.gen_range(0..surface.width());
        let y = rng.gen_range(0..surface.height());
        let grey = Vec3::splat(rng.r#gen::<f32>());
        surface.blend(x, y, grey, alpha, BlendMode::Overlay);
    }
}

fn segment(surface: &mut PixelBuffer, from: Vec2, to: Vec2, color: Vec3, alpha: f32) {
    let delta = to - from;
    let steps = delta.abs().max_element().ceil().max(1.0) as usize;
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    for i in 0..=steps {
        let p = from + delta * (i as f32 / steps as f32);
        if p.x < 0.0 || p.y < 0.0 || p.x >= w || p.y >= h {
            continue;
        }
        surface.blend(p.x as u32, p.y as u32, color, alpha, BlendMode::Normal);
    }
}

fn radial_glow(surface: &mut PixelBuffer, center: Vec2, radius: f32, color: Vec3, alpha: f32) {
    if radius <= 0.0 || alpha <= 0.0 {
        return;
    }
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(surface.width());
    let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(surface.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let d = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center).length() / radius;
            if d < 1.0 {
                let falloff = (1.0 - d) * (1.0 - d);
                surface.blend(x, y, color, alpha * falloff, BlendMode::Screen);
            }
        }
    }
}
