use crate::config::TerrainConfig;
use crate::error::EngineError;
use crate::noise::{fbm, hash};
use crate::raster::PixelBuffer;
use crate::render::{BlendMode, DrawCommand};
use bevy::math::{UVec2, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const SUN: Vec3 = Vec3::new(1.0, 0.86, 0.45);
const MOON: Vec3 = Vec3::new(0.92, 0.92, 0.85);

// (parallax, base height, amplitude, horizontal frequency) per ridge, far to near
const RIDGES: [(f32, f32, f32, f32); 3] = [
    (0.25, 0.52, 0.22, 0.012),
    (0.55, 0.64, 0.20, 0.020),
    (1.00, 0.78, 0.16, 0.034),
];

/// Pixel-art landscape scrolling under a day/night sky.
pub struct TerrainScroller {
    image: PixelBuffer,
    scroll: f32,
    time: f32,
}

impl TerrainScroller {
    pub fn new(canvas: UVec2, config: &TerrainConfig) -> Result<Self, EngineError> {
        let size = Self::pixel_size(canvas, config);
        Ok(Self {
            image: PixelBuffer::new(size.x, size.y)?,
            scroll: 0.0,
            time: 0.0,
        })
    }

    pub fn pixel_size(canvas: UVec2, config: &TerrainConfig) -> UVec2 {
        let p = config.pixel_size.max(1);
        UVec2::new(canvas.x.div_ceil(p), canvas.y.div_ceil(p))
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// 0 at midnight, 1 at noon.
    pub fn daylight(&self, config: &TerrainConfig) -> f32 {
        0.5 - 0.5 * (self.phase(config) * TAU).cos()
    }

    fn phase(&self, config: &TerrainConfig) -> f32 {
        (self.time / config.day_length.max(1.0)).fract()
    }

    /// Sun between 6:00 and 18:00, moon otherwise. Each rises at the left
    /// horizon and tops out halfway through its half of the cycle.
    /// Returns centre, radius and colour in image pixels.
    fn disc(&self, config: &TerrainConfig) -> (Vec2, f32, Vec3) {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let phase = self.phase(config);
        let is_day = (0.25..0.75).contains(&phase);
        let arc = (phase - 0.25).rem_euclid(0.5) * 2.0;
        let center = Vec2::new(arc * w, h * (0.55 - 0.4 * (arc * PI).sin()));
        let color = if is_day { SUN } else { MOON };
        (center, (h * 0.06).max(2.0), color)
    }

    pub fn step(&mut self, dt: f32, config: &TerrainConfig) {
        self.time += dt;
        self.scroll += dt * config.scroll_speed;
    }

    pub fn render(&mut self, config: &TerrainConfig, out: &mut Vec<DrawCommand>) {
        let (w, h) = (self.image.width(), self.image.height());
        let light = self.daylight(config);
        let night = 1.0 - light;

        let (disc, disc_r, disc_color) = self.disc(config);

        for y in 0..h {
            let ty = y as f32 / h as f32;
            let top = config.sky_night[0].lerp(config.sky_day[0], light);
            let bottom = config.sky_night[1].lerp(config.sky_day[1], light);
            let sky = top.lerp(bottom, ty);
            for x in 0..w {
                let mut c = sky;
                if hash(x as i32, y as i32) > 0.992 && ty < 0.6 {
                    c = c.lerp(Vec3::ONE, night * 0.8);
                }
                if Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance_squared(disc) <= disc_r * disc_r {
                    c = disc_color;
                }
                self.image.put(x, y, c);
            }
        }

        for (layer, &(parallax, base, amplitude, frequency)) in RIDGES.iter().enumerate() {
            let shade = 0.35 + 0.65 * light;
            let color = config.ridges[layer] * shade;
            let offset = self.scroll * parallax;
            for x in 0..w {
                let sx = (x as f32 + offset) * frequency;
                let height = base - amplitude * (fbm(sx, layer as f32 * 17.0) - 0.5);
                let top = (height.clamp(0.0, 1.0) * h as f32) as u32;
                for y in top.min(h)..h {
                    self.image.put(x, y, color);
                }
            }
        }

        out.push(DrawCommand::Blit {
            blend: BlendMode::Normal,
            glow: None,
            smooth: false,
            alpha: 1.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_rounds_up() {
        let cfg = TerrainConfig {
            pixel_size: 6,
            ..TerrainConfig::default()
        };
        assert_eq!(TerrainScroller::pixel_size(UVec2::new(400, 300), &cfg), UVec2::new(67, 50));
    }

    #[test]
    fn day_cycle_spans_night_to_noon() {
        let cfg = TerrainConfig::default();
        let mut t = TerrainScroller::new(UVec2::new(120, 90), &cfg).unwrap();
        assert!(t.daylight(&cfg) < 1e-6);
        t.step(cfg.day_length / 2.0, &cfg);
        assert!((t.daylight(&cfg) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn bottom_row_is_ground() {
        let cfg = TerrainConfig::default();
        let mut t = TerrainScroller::new(UVec2::new(120, 90), &cfg).unwrap();
        let mut out = Vec::new();
        t.render(&cfg, &mut out);
        let h = t.image().height();
        let near = cfg.ridges[2] * 0.35;
        let px = t.image().get(0, h - 1);
        assert!((px - near).length() < 0.01, "got {px}, want {near}");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn scrolling_changes_the_skyline() {
        let cfg = TerrainConfig::default();
        let mut t = TerrainScroller::new(UVec2::new(240, 120), &cfg).unwrap();
        let mut out = Vec::new();
        t.render(&cfg, &mut out);
        let before = t.image().clone();
        t.step(3.0, &cfg);
        t.render(&cfg, &mut out);
        assert_ne!(&before, t.image());
    }

    fn disc_pixel(t: &mut TerrainScroller, cfg: &TerrainConfig) -> Vec3 {
        let mut out = Vec::new();
        t.render(cfg, &mut out);
        let (center, _, _) = t.disc(cfg);
        t.image().get(center.x as u32, center.y as u32)
    }

    #[test]
    fn sun_by_day_moon_by_night() {
        let cfg = TerrainConfig::default();

        let mut morning = TerrainScroller::new(UVec2::new(240, 120), &cfg).unwrap();
        morning.step(cfg.day_length * 0.4, &cfg);
        assert!(morning.daylight(&cfg) > 0.5);
        let px = disc_pixel(&mut morning, &cfg);
        assert!((px - SUN).length() < 0.01, "got {px}");

        let mut late = TerrainScroller::new(UVec2::new(240, 120), &cfg).unwrap();
        late.step(cfg.day_length * 0.9, &cfg);
        assert!(late.daylight(&cfg) < 0.5);
        let px = disc_pixel(&mut late, &cfg);
        assert!((px - MOON).length() < 0.01, "got {px}");
    }

    #[test]
    fn noon_sun_is_high_and_centred() {
        let cfg = TerrainConfig::default();
        let mut t = TerrainScroller::new(UVec2::new(240, 120), &cfg).unwrap();
        t.step(cfg.day_length * 0.5, &cfg);
        let (center, _, color) = t.disc(&cfg);
        let size = t.image().size().as_vec2();
        assert_eq!(color, SUN);
        assert!((center.x - size.x * 0.5).abs() < 1.0);
        assert!(center.y < size.y * 0.2);
    }
}
