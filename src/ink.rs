use crate::config::{InkConfig, RenderConfig};
use crate::error::EngineError;
use crate::grid::{SimulationGrid, laplacian, sample_bilinear};
use crate::palette::Palette;
use crate::pointer::PointerSample;
use crate::raster::PixelBuffer;
use crate::render::{BlendMode, DrawCommand, GlowFilter};
use bevy::math::{UVec2, Vec2};
use rand::Rng;

/// Frames are normalised against this rate before being split into passes.
const REFERENCE_HZ: f32 = 60.0;
/// A pass never integrates more than this much reaction time.
const MAX_PASS_GAIN: f32 = 1.0;

/// Reaction-diffusion "liquid ink" background.
pub struct InkField {
    grid: SimulationGrid,
    image: PixelBuffer,
    time: f32,
}

/// The brush for one pass, already in grid coordinates.
#[derive(Debug, Clone, Copy)]
struct Brush {
    center: Vec2,
    radius: f32,
    /// Scales the vortex with how fast the pointer has been moving.
    swirl: f32,
}

impl InkField {
    pub fn new(size: UVec2, config: &InkConfig, rng: &mut impl Rng) -> Result<Self, EngineError> {
        let mut grid = SimulationGrid::new(size.x as usize, size.y as usize)?;
        grid.seed(rng, config.seed_spots);
        let image = PixelBuffer::new(size.x, size.y)?;
        Ok(Self {
            grid,
            image,
            time: 0.0,
        })
    }

    pub fn grid(&self) -> &SimulationGrid {
        &self.grid
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// Advances the simulation by `dt` seconds: one pass for a normal frame,
    /// two when the frame ran long.
    pub fn step(&mut self, dt: f32, pointer: PointerSample, config: &InkConfig) {
        let frame_scale = (dt * REFERENCE_HZ).max(0.0) * config.time_scale;
        let passes = if frame_scale > MAX_PASS_GAIN { 2 } else { 1 };
        let gain = (frame_scale / passes as f32).min(MAX_PASS_GAIN);
        let brush = pointer.active.then(|| Brush::from_pointer(pointer, config));

        for _ in 0..passes {
            self.time += dt / passes as f32;
            self.pass(gain, brush, config);
        }
    }

    fn pass(&mut self, gain: f32, brush: Option<Brush>, config: &InkConfig) {
        let (w, h) = (self.grid.width(), self.grid.height());
        let t = self.time;
        let bufs = self.grid.buffers();

        for y in 0..h {
            let ny = y as f32 / h as f32;
            for x in 0..w {
                let nx = x as f32 / w as f32;
                let idx = y * w + x;
                let cell = Vec2::new(x as f32, y as f32);

                // 1. Diffusion
                let lap_u = laplacian(bufs.u, w, h, x, y);
                let lap_v = laplacian(bufs.v, w, h, x, y);

                // 2. Flow field plus pointer vortex
                let mut velocity = flow(nx, ny, t * config.flow_speed) * config.flow_strength;
                let mut falloff = 0.0;
                if let Some(brush) = brush {
                    let offset = cell - brush.center;
                    let dist = offset.length();
                    if dist < brush.radius {
                        falloff = 1.0 - dist / brush.radius;
                        if dist > 1e-4 {
                            let tangent = Vec2::new(-offset.y, offset.x) / dist;
                            velocity += tangent * config.vortex_strength * brush.swirl * falloff;
                        }
                    }
                }

                // 3. Advect v by tracing backwards
                let back = cell - velocity * config.advect;
                let v_adv = sample_bilinear(bufs.v, w, h, back.x, back.y);

                // 4. Reaction, with slowly wandering feed/kill
                let u = bufs.u[idx];
                let feed = config.feed + config.feed_wobble * (nx * 4.1 + t * 0.13).sin() * (ny * 3.3 - t * 0.11).cos();
                let kill = config.kill + config.kill_wobble * (nx * 2.7 - ny * 3.9 + t * 0.07).sin();
                let uvv = u * v_adv * v_adv;
                let mut next_u = u + (config.diffusion_u * lap_u - uvv + feed * (1.0 - u)) * gain;
                let mut next_v = v_adv + (config.diffusion_v * lap_v + uvv - (feed + kill) * v_adv) * gain;

                // 5. Ink injection under the brush
                if falloff > 0.0 {
                    let d = 1.0 - falloff;
                    let q = 1.0 - d * d;
                    next_v += config.ink_strength * q * gain;
                    next_u -= config.ink_strength * 0.5 * q * gain;
                }

                // 6. Clamp
                bufs.next_u[idx] = clamp_unit(next_u);
                bufs.next_v[idx] = clamp_unit(next_v);
            }
        }

        self.grid.swap();
    }

    /// Shades `v` into the low-res image and queues the composite.
    pub fn render(&mut self, render: &RenderConfig, frame_seed: u64, out: &mut Vec<DrawCommand>) {
        let palette = Palette::new(render.palette, render.base);
        let w = self.grid.width();
        let v = self.grid.v();
        for y in 0..self.image.height() {
            for x in 0..self.image.width() {
                let value = v[y as usize * w + x as usize];
                self.image.put(x, y, palette.shade(value, render.v_scale, render.power));
            }
        }

        out.push(DrawCommand::Fill {
            color: render.base,
            alpha: 1.0,
        });
        out.push(DrawCommand::Blit {
            blend: BlendMode::Normal,
            glow: None,
            smooth: true,
            alpha: 1.0,
        });
        out.push(DrawCommand::Blit {
            blend: BlendMode::Screen,
            glow: Some(GlowFilter {
                blur: render.glow_blur,
                saturate: render.glow_saturate,
            }),
            smooth: true,
            alpha: render.glow_alpha,
        });
        out.push(DrawCommand::Grain {
            density: render.grain_density,
            alpha: render.grain_alpha,
            seed: frame_seed,
        });
    }
}

impl Brush {
    fn from_pointer(pointer: PointerSample, config: &InkConfig) -> Self {
        let speed = pointer.speed / 1000.0;
        let radius = (config.brush_radius + config.brush_speed_radius * speed).min(config.brush_radius_max);
        Self {
            center: pointer.position,
            radius: radius.max(1.0),
            swirl: 0.35 + speed.min(2.0),
        }
    }
}

/// Cheap deterministic drift field over normalised coordinates.
fn flow(nx: f32, ny: f32, t: f32) -> Vec2 {
    let vx = 0.5 * (ny * 6.0 + t).sin() + 0.5 * ((nx + ny) * 3.1 - t * 0.6).sin();
    let vy = 0.5 * (nx * 5.0 - t * 0.8).cos() + 0.5 * ((nx - ny) * 2.7 + t * 0.5).cos();
    Vec2::new(vx, vy)
}

#[inline]
fn clamp_unit(x: f32) -> f32 {
    // NaN collapses to 0 rather than poisoning neighbours
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field(w: u32, h: u32) -> InkField {
        let mut rng = StdRng::seed_from_u64(3);
        InkField::new(UVec2::new(w, h), &InkConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn empty_size_is_an_error() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(InkField::new(UVec2::new(0, 4), &InkConfig::default(), &mut rng).is_err());
    }

    #[test]
    fn long_frames_take_two_passes() {
        let mut ink = field(32, 24);
        ink.step(1.0 / 60.0, PointerSample::default(), &InkConfig::default());
        assert!((ink.time - 1.0 / 60.0).abs() < 1e-6);
        ink.step(1.0 / 20.0, PointerSample::default(), &InkConfig::default());
        assert!((ink.time - (1.0 / 60.0 + 1.0 / 20.0)).abs() < 1e-6);
    }

    #[test]
    fn values_stay_in_unit_interval_under_heavy_ink() {
        let mut ink = field(48, 32);
        let cfg = InkConfig {
            ink_strength: 5.0,
            ..InkConfig::default()
        };
        let pointer = PointerSample {
            position: Vec2::new(24.0, 16.0),
            active: true,
            speed: 4000.0,
        };
        for _ in 0..40 {
            ink.step(1.0 / 20.0, pointer, &cfg);
        }
        let grid = ink.grid();
        assert!(grid.u().iter().chain(grid.v()).all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn empty_field_stays_empty_without_pointer() {
        let mut ink = field(24, 24);
        let mut rng = StdRng::seed_from_u64(1);
        ink.grid.seed(&mut rng, 0);
        for _ in 0..20 {
            ink.step(1.0 / 45.0, PointerSample::default(), &InkConfig::default());
        }
        assert!(ink.grid().v().iter().all(|&v| v.abs() < 1e-6));
        assert!(ink.grid().u().iter().all(|&u| (u - 1.0).abs() < 1e-6));
    }

    #[test]
    fn render_queues_crisp_then_glow_then_grain() {
        let mut ink = field(16, 12);
        let mut out = Vec::new();
        ink.render(&RenderConfig::default(), 9, &mut out);
        assert_eq!(out.len(), 4);
        assert!(matches!(out[1], DrawCommand::Blit { blend: BlendMode::Normal, glow: None, .. }));
        assert!(matches!(out[2], DrawCommand::Blit { blend: BlendMode::Screen, glow: Some(_), .. }));
        assert!(matches!(out[3], DrawCommand::Grain { seed: 9, .. }));
    }

    fn v_centroid(grid: &SimulationGrid) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut mass = 0.0;
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let v = grid.v()[grid.index(x, y)];
                sum += Vec2::new(x as f32, y as f32) * v;
                mass += v;
            }
        }
        sum / mass
    }

    #[test]
    fn vortex_carries_v_around_the_brush() {
        // Advection only: no diffusion, reaction, ink or background flow
        let cfg = InkConfig {
            diffusion_u: 0.0,
            diffusion_v: 0.0,
            feed: 0.0,
            kill: 0.0,
            feed_wobble: 0.0,
            kill_wobble: 0.0,
            flow_strength: 0.0,
            ink_strength: 0.0,
            advect: 1.0,
            vortex_strength: 4.0,
            brush_radius: 12.0,
            ..InkConfig::default()
        };
        let mut ink = field(32, 32);
        ink.grid.splat(Vec2::splat(16.0), 64.0, 0.0, 0.0);
        // A drop of activator above the brush and a marker of u below it
        ink.grid.splat(Vec2::new(16.5, 10.5), 0.5, 1.0, 0.0);
        ink.grid.splat(Vec2::new(16.5, 24.5), 0.5, 0.0, 0.5);
        let u_before = ink.grid().u().to_vec();
        let start = v_centroid(ink.grid());

        let pointer = PointerSample {
            position: Vec2::splat(16.0),
            active: true,
            speed: 0.0,
        };
        for _ in 0..3 {
            ink.step(1.0 / 120.0, pointer, &cfg);
        }

        let moved = v_centroid(ink.grid()) - start;
        // Above the centre the swirl points along +x
        assert!(moved.x > 1.0, "moved {moved}");
        assert!(moved.y.abs() < moved.x * 0.5, "moved {moved}");
        assert_eq!(ink.grid().u(), &u_before[..]);
    }

    #[test]
    fn flow_is_bounded() {
        for i in 0..100 {
            let f = flow(i as f32 * 0.01, 1.0 - i as f32 * 0.01, i as f32);
            assert!(f.x.abs() <= 1.0 + 1e-6 && f.y.abs() <= 1.0 + 1e-6);
        }
    }
}
