use bevy::math::{UVec2, Vec3};
use bevy::prelude::Resource;

/// Which background strategy an engine runs. Only one is ever active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackdropMode {
    #[default]
    Ink,
    Particles,
    Terrain,
}

impl BackdropMode {
    pub const ALL: [BackdropMode; 3] = [BackdropMode::Ink, BackdropMode::Particles, BackdropMode::Terrain];

    pub fn label(self) -> &'static str {
        match self {
            BackdropMode::Ink => "Liquid ink",
            BackdropMode::Particles => "Curl particles",
            BackdropMode::Terrain => "Pixel terrain",
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    pub mode: BackdropMode,
    pub fps_cap: f32,
    pub reduced_fps_cap: f32,
    /// Upper bound on a frame's dt in seconds (tab-resume jumps).
    pub max_dt: f32,
    pub ink: InkConfig,
    pub particles: ParticleConfig,
    pub terrain: TerrainConfig,
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: BackdropMode::default(),
            fps_cap: 45.0,
            reduced_fps_cap: 20.0,
            max_dt: 1.0 / 20.0,
            ink: InkConfig::default(),
            particles: ParticleConfig::default(),
            terrain: TerrainConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn fps_cap(&self, reduced_motion: bool) -> f32 {
        if reduced_motion {
            self.reduced_fps_cap.min(self.fps_cap)
        } else {
            self.fps_cap
        }
    }

    pub fn frame_interval_ms(&self, reduced_motion: bool) -> f64 {
        1000.0 / self.fps_cap(reduced_motion).max(1.0) as f64
    }
}

#[derive(Debug, Clone)]
pub struct InkConfig {
    // Canvas pixels per grid cell; wide canvases use the coarse end
    pub downsample_min: f32,
    pub downsample_max: f32,
    pub min_width: u32,
    pub max_width: u32,

    pub diffusion_u: f32,
    pub diffusion_v: f32,
    pub feed: f32,
    pub kill: f32,
    pub feed_wobble: f32,
    pub kill_wobble: f32,
    /// Reaction gain per 60Hz-equivalent frame.
    pub time_scale: f32,

    pub advect: f32,
    pub flow_strength: f32,
    pub flow_speed: f32,
    pub vortex_strength: f32,

    // Brush, in grid cells
    pub brush_radius: f32,
    pub brush_speed_radius: f32,
    pub brush_radius_max: f32,
    pub ink_strength: f32,

    pub seed_spots: usize,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            downsample_min: 3.0,
            downsample_max: 6.0,
            min_width: 96,
            max_width: 320,
            diffusion_u: 1.0,
            diffusion_v: 0.5,
            feed: 0.037,
            kill: 0.06,
            feed_wobble: 0.004,
            kill_wobble: 0.0015,
            time_scale: 1.0,
            advect: 0.6,
            flow_strength: 0.35,
            flow_speed: 0.25,
            vortex_strength: 0.9,
            brush_radius: 6.0,
            brush_speed_radius: 4.0,
            brush_radius_max: 16.0,
            ink_strength: 0.35,
            seed_spots: 14,
        }
    }
}

impl InkConfig {
    /// Canvas pixels per simulation cell for a canvas of this width.
    pub fn downsample(&self, canvas_width: u32, reduced_motion: bool) -> f32 {
        if reduced_motion {
            return self.downsample_max;
        }
        let t = ((canvas_width as f32 - 640.0) / (1920.0 - 640.0)).clamp(0.0, 1.0);
        self.downsample_min + (self.downsample_max - self.downsample_min) * t
    }

    pub fn grid_size(&self, canvas: UVec2, reduced_motion: bool) -> UVec2 {
        if canvas.x == 0 || canvas.y == 0 {
            return UVec2::ZERO;
        }
        let factor = self.downsample(canvas.x, reduced_motion).max(1.0);
        let width = ((canvas.x as f32 / factor).round() as u32).clamp(self.min_width, self.max_width);
        // Keep the canvas aspect ratio so cells stay square; portrait strips
        // stop at twice the widest grid
        let height = ((width as f32 * canvas.y as f32 / canvas.x as f32).round() as u32).clamp(1, self.max_width * 2);
        UVec2::new(width, height)
    }
}

#[derive(Debug, Clone)]
pub struct ParticleConfig {
    /// Canvas area in px² per particle.
    pub density: f32,
    pub min_count: usize,
    pub max_count: usize,
    pub reduced_scale: f32,

    pub field_scale: f32,
    pub drift: f32,
    pub friction: f32,
    pub flow_strength: f32,

    /// Fraction of the canvas's shorter side.
    pub pointer_radius: f32,
    pub attraction: f32,
    pub swirl: f32,

    pub life_rate: f32,
    pub margin: f32,

    pub base_hue: f32,
    pub hue_drift: f32,
    pub hue_spread: f32,
    pub hue_speed: f32,
    pub alpha: f32,
    pub trail_alpha: f32,

    pub max_bursts: usize,
    pub burst_radius: f32,
    pub burst_decay: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            density: 1400.0,
            min_count: 160,
            max_count: 1600,
            reduced_scale: 0.45,
            field_scale: 2.4,
            drift: 0.04,
            friction: 0.08,
            flow_strength: 1.4,
            pointer_radius: 0.3,
            attraction: 0.35,
            swirl: 0.6,
            life_rate: 0.02,
            margin: 24.0,
            base_hue: 195.0,
            hue_drift: 6.0,
            hue_spread: 60.0,
            hue_speed: 18.0,
            alpha: 0.55,
            trail_alpha: 0.08,
            max_bursts: 6,
            burst_radius: 90.0,
            burst_decay: 0.92,
        }
    }
}

impl ParticleConfig {
    pub fn count(&self, canvas: UVec2, reduced_motion: bool) -> usize {
        let area = canvas.x as f32 * canvas.y as f32;
        let mut count = (area / self.density.max(1.0)) as usize;
        count = count.clamp(self.min_count, self.max_count);
        if reduced_motion {
            count = ((count as f32 * self.reduced_scale) as usize).min(count);
        }
        count
    }
}

#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// Canvas pixels per terrain pixel.
    pub pixel_size: u32,
    /// Terrain pixels per second for the nearest ridge.
    pub scroll_speed: f32,
    /// Seconds per full day/night cycle.
    pub day_length: f32,
    pub sky_day: [Vec3; 2],
    pub sky_night: [Vec3; 2],
    pub ridges: [Vec3; 3],
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            pixel_size: 6,
            scroll_speed: 9.0,
            day_length: 90.0,
            sky_day: [Vec3::new(0.36, 0.62, 0.90), Vec3::new(0.86, 0.90, 0.95)],
            sky_night: [Vec3::new(0.02, 0.03, 0.09), Vec3::new(0.10, 0.09, 0.22)],
            ridges: [
                Vec3::new(0.42, 0.50, 0.62),
                Vec3::new(0.24, 0.36, 0.40),
                Vec3::new(0.10, 0.20, 0.18),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub palette: [Vec3; 3],
    pub base: Vec3,
    pub v_scale: f32,
    pub power: f32,

    /// Glow blur radius in canvas pixels.
    pub glow_blur: f32,
    pub glow_saturate: f32,
    pub glow_alpha: f32,

    pub grain_density: f32,
    pub grain_alpha: f32,

    pub surface_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            palette: [
                Vec3::new(0.10, 0.12, 0.38),
                Vec3::new(0.16, 0.55, 0.72),
                Vec3::new(0.86, 0.95, 0.98),
            ],
            base: Vec3::new(0.02, 0.02, 0.05),
            v_scale: 2.2,
            power: 0.72,
            glow_blur: 14.0,
            glow_saturate: 1.4,
            glow_alpha: 0.55,
            grain_density: 0.015,
            grain_alpha: 0.06,
            surface_scale: 0.5,
        }
    }
}
