use crate::config::ParticleConfig;
use crate::noise::curl;
use crate::palette::hsl_to_rgb;
use crate::pointer::PointerSample;
use crate::render::DrawCommand;
use bevy::math::{UVec2, Vec2, Vec3};
use rand::Rng;

const REFERENCE_HZ: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub previous: Vec2,
    pub velocity: Vec2,
    /// Degrees added to the field's base hue.
    pub hue: f32,
    /// Fades the particle in after (re)spawn; `0..=1`.
    pub life: f32,
}

/// A transient radial flash left by a pointer press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub center: Vec2,
    pub radius: f32,
    pub alpha: f32,
    pub hue: f32,
}

/// Curl-noise particle background.
pub struct ParticleField {
    particles: Vec<Particle>,
    bursts: Vec<Burst>,
    size: Vec2,
    time: f32,
}

impl ParticleField {
    pub fn new(canvas: UVec2, count: usize, config: &ParticleConfig, rng: &mut impl Rng) -> Self {
        let size = canvas.as_vec2();
        let particles = (0..count).map(|_| spawn(size, config, rng)).collect();
        Self {
            particles,
            bursts: Vec::with_capacity(config.max_bursts),
            size,
            time: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn base_hue(&self, config: &ParticleConfig) -> f32 {
        (config.base_hue + self.time * config.hue_drift).rem_euclid(360.0)
    }

    /// Spawns a burst, evicting the oldest once the cap is reached.
    pub fn burst(&mut self, center: Vec2, config: &ParticleConfig) {
        if config.max_bursts == 0 {
            return;
        }
        if self.bursts.len() >= config.max_bursts {
            self.bursts.remove(0);
        }
        let hue = self.base_hue(config);
        self.bursts.push(Burst {
            center,
            radius: config.burst_radius,
            alpha: 1.0,
            hue,
        });
    }

    pub fn step(&mut self, dt: f32, pointer: PointerSample, config: &ParticleConfig, rng: &mut impl Rng) {
        let frame_scale = (dt * REFERENCE_HZ).max(0.0);
        self.time += dt;

        let blend = 1.0 - (1.0 - config.friction.clamp(0.0, 1.0)).powf(frame_scale);
        let drift = self.time * config.drift;
        let reach = config.pointer_radius * self.size.min_element();
        let swirl_gain = 1.0 + (pointer.speed / 1000.0).min(3.0);
        let margin = config.margin;
        let size = self.size;

        for p in &mut self.particles {
            p.previous = p.position;

            // Curl field sample, relaxed into the current velocity
            let n = p.position / size * config.field_scale + Vec2::splat(drift);
            let target = curl(n.x, n.y) * config.flow_strength;
            p.velocity += (target - p.velocity) * blend;

            // Pointer attraction + swirl
            if pointer.active && reach > 0.0 {
                let to_pointer = pointer.position - p.position;
                let dist = to_pointer.length();
                if dist < reach && dist > 1e-3 {
                    let dir = to_pointer / dist;
                    let falloff = 1.0 - dist / reach;
                    let pull = dir * config.attraction * falloff;
                    let spin = Vec2::new(-dir.y, dir.x) * config.swirl * falloff * swirl_gain;
                    p.velocity += (pull + spin) * frame_scale;
                }
            }

            p.position += p.velocity * frame_scale;
            p.life = (p.life + config.life_rate * frame_scale).min(1.0);

            let outside = p.position.x < -margin
                || p.position.y < -margin
                || p.position.x > size.x + margin
                || p.position.y > size.y + margin;
            if outside {
                *p = spawn(size, config, rng);
            }
        }

        let decay = config.burst_decay.clamp(0.0, 1.0).powf(frame_scale);
        for b in &mut self.bursts {
            b.radius *= decay;
            b.alpha *= decay;
        }
        self.bursts.retain(|b| b.alpha > 0.02 && b.radius > 0.5);
    }

    pub fn render(&self, background: Vec3, config: &ParticleConfig, out: &mut Vec<DrawCommand>) {
        out.push(DrawCommand::Fill {
            color: background,
            alpha: config.trail_alpha,
        });

        let base = self.base_hue(config);
        for p in &self.particles {
            if p.life <= 0.0 {
                continue;
            }
            let hue = base + p.hue + p.velocity.length() * config.hue_speed;
            out.push(DrawCommand::Segment {
                from: p.previous,
                to: p.position,
                color: hsl_to_rgb(hue, 0.8, 0.62),
                alpha: config.alpha * p.life,
            });
        }

        for b in &self.bursts {
            out.push(DrawCommand::Glow {
                center: b.center,
                radius: b.radius,
                color: hsl_to_rgb(b.hue, 0.9, 0.6),
                alpha: b.alpha * 0.6,
            });
        }
    }
}

fn spawn(size: Vec2, config: &ParticleConfig, rng: &mut impl Rng) -> Particle {
    let position = Vec2::new(rng.gen_range(0.0..size.x.max(1.0)), rng.gen_range(0.0..size.y.max(1.0)));
    Particle {
        position,
        previous: position,
        velocity: Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)),
        hue: rng.gen_range(-0.5..0.5) * config.hue_spread,
        life: 0.0,
    }
}
