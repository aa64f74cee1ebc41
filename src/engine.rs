//! The per-canvas animation state and its frame state machine.
//!
//! The host feeds timestamps and input events into [`Engine::tick`] once per
//! display refresh, then presents [`Engine::frame`]. The engine never touches
//! a window or a GPU, so it runs the same in tests.

use crate::config::{BackdropMode, EngineConfig};
use crate::error::EngineError;
use crate::ink::InkField;
use crate::particles::ParticleField;
use crate::pointer::PointerState;
use crate::raster::PixelBuffer;
use crate::render::{DrawCommand, Frame};
use crate::terrain::TerrainScroller;
use bevy::log::{debug, info};
use bevy::math::{UVec2, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Slack when comparing elapsed time against the frame interval.
const THROTTLE_TOLERANCE_MS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { position: Vec2, time_ms: f64 },
    PointerDown { position: Vec2, time_ms: f64 },
    PointerLeave,
    Resize { width: u32, height: u32 },
    Visibility { hidden: bool },
    ReducedMotion(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Simulated and produced new draw commands.
    Rendered,
    /// Under the frame budget; nothing changed.
    Throttled,
    /// The page is hidden.
    Suspended,
    /// No buffers to work with (zero-sized canvas).
    Skipped,
}

/// Simulation buffers of the active mode.
pub enum Background {
    Ink(InkField),
    Particles(ParticleField),
    Terrain(TerrainScroller),
}

pub struct Engine {
    config: EngineConfig,
    canvas: UVec2,
    background: Option<Background>,
    pointer: PointerState,
    last_timestamp: Option<f64>,
    running: bool,
    reduced_motion: bool,
    rng: StdRng,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl Engine {
    pub fn new(canvas: UVec2, config: EngineConfig, seed: u64) -> Result<Self, EngineError> {
        if canvas.x == 0 || canvas.y == 0 {
            return Err(EngineError::EmptySurface {
                width: canvas.x,
                height: canvas.y,
            });
        }
        let mut engine = Self {
            config,
            canvas,
            background: None,
            pointer: PointerState::default(),
            last_timestamp: None,
            running: true,
            reduced_motion: false,
            rng: StdRng::seed_from_u64(seed),
            commands: Vec::new(),
            frames: 0,
        };
        engine.reallocate();
        Ok(engine)
    }

    /// Starts an engine on `surface`, or quietly does nothing without one.
    pub fn attach(surface: Option<UVec2>, config: EngineConfig, seed: u64) -> Option<Self> {
        let result = surface
            .ok_or(EngineError::MissingSurface)
            .and_then(|canvas| Self::new(canvas, config, seed));
        match result {
            Ok(engine) => {
                info!(
                    "Backdrop attached: {}x{} canvas, mode {:?}",
                    engine.canvas.x, engine.canvas.y, engine.config.mode
                );
                Some(engine)
            }
            Err(err) => {
                debug!("Backdrop not started: {err}");
                None
            }
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live tuning; size-dependent settings apply at the next reallocation.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn canvas(&self) -> UVec2 {
        self.canvas
    }

    pub fn mode(&self) -> BackdropMode {
        self.config.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn background_mut(&mut self) -> Option<&mut Background> {
        self.background.as_mut()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_mode(&mut self, mode: BackdropMode) {
        if self.config.mode != mode {
            self.config.mode = mode;
            self.reallocate();
        }
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { position, time_ms } => self.pointer.on_move(position, time_ms),
            InputEvent::PointerDown { position, time_ms } => {
                self.pointer.on_move(position, time_ms);
                if let Some(Background::Particles(field)) = &mut self.background {
                    field.burst(position, &self.config.particles);
                }
            }
            InputEvent::PointerLeave => self.pointer.on_leave(),
            InputEvent::Resize { width, height } => {
                let canvas = UVec2::new(width, height);
                if canvas != self.canvas {
                    self.canvas = canvas;
                    self.reallocate();
                }
            }
            InputEvent::Visibility { hidden } => {
                if hidden == self.running {
                    debug!("Backdrop {}", if hidden { "paused" } else { "resumed" });
                }
                self.running = !hidden;
                if !hidden {
                    // No dt spike after a long pause
                    self.last_timestamp = None;
                }
            }
            InputEvent::ReducedMotion(reduced) => {
                if reduced != self.reduced_motion {
                    debug!("Reduced motion: {reduced}");
                    self.reduced_motion = reduced;
                    self.reallocate();
                }
            }
        }
    }

    /// One display refresh: apply input, then simulate + render unless the
    /// frame is throttled, suspended or has nothing to draw on.
    pub fn tick(&mut self, now_ms: f64, events: &[InputEvent]) -> FrameOutcome {
        for &event in events {
            self.apply(event);
        }

        if !self.running {
            return FrameOutcome::Suspended;
        }

        let interval = self.config.frame_interval_ms(self.reduced_motion);
        let dt = match self.last_timestamp {
            Some(last) => {
                let elapsed = now_ms - last;
                if elapsed + THROTTLE_TOLERANCE_MS < interval {
                    return FrameOutcome::Throttled;
                }
                (elapsed / 1000.0) as f32
            }
            None => (interval / 1000.0) as f32,
        };
        self.last_timestamp = Some(now_ms);

        self.advance(dt)
    }

    /// Steps and renders with an explicit `dt` (seconds), ignoring the clock.
    pub fn advance(&mut self, dt: f32) -> FrameOutcome {
        let dt = dt.clamp(0.0, self.config.max_dt);
        self.commands.clear();

        let Some(background) = self.background.as_mut() else {
            return FrameOutcome::Skipped;
        };

        let frame_seed: u64 = self.rng.r#gen();
        match background {
            Background::Ink(ink) => {
                let grid = ink.grid().size().as_vec2();
                let sample = self.pointer.scaled(grid / self.canvas.as_vec2());
                ink.step(dt, sample, &self.config.ink);
                ink.render(&self.config.render, frame_seed, &mut self.commands);
            }
            Background::Particles(field) => {
                let sample = self.pointer.scaled(Vec2::ONE);
                field.step(dt, sample, &self.config.particles, &mut self.rng);
                field.render(self.config.render.base, &self.config.particles, &mut self.commands);
            }
            Background::Terrain(terrain) => {
                terrain.step(dt, &self.config.terrain);
                terrain.render(&self.config.terrain, &mut self.commands);
            }
        }

        self.pointer.settle(dt * 60.0);
        self.frames += 1;
        FrameOutcome::Rendered
    }

    /// Draw commands of the last rendered frame.
    pub fn frame(&self) -> Frame<'_> {
        let image = match &self.background {
            Some(Background::Ink(ink)) => Some(ink.image()),
            Some(Background::Terrain(terrain)) => Some(terrain.image()),
            _ => None,
        };
        Frame {
            canvas: self.canvas,
            commands: &self.commands,
            image,
        }
    }

    /// Rebuilds the active mode's buffers for the current canvas. Runs
    /// synchronously between frames, so no frame sees a half-built buffer.
    fn reallocate(&mut self) {
        self.commands.clear();
        self.background = match self.build_background() {
            Ok(background) => Some(background),
            Err(err) => {
                debug!("Backdrop buffers dropped: {err}");
                None
            }
        };
    }

    fn build_background(&mut self) -> Result<Background, EngineError> {
        let canvas = self.canvas;
        if canvas.x == 0 || canvas.y == 0 {
            return Err(EngineError::EmptySurface {
                width: canvas.x,
                height: canvas.y,
            });
        }
        let background = match self.config.mode {
            BackdropMode::Ink => {
                let size = self.config.ink.grid_size(canvas, self.reduced_motion);
                let ink = InkField::new(size, &self.config.ink, &mut self.rng)?;
                info!("Ink grid {}x{} for {}x{} canvas", size.x, size.y, canvas.x, canvas.y);
                Background::Ink(ink)
            }
            BackdropMode::Particles => {
                let count = self.config.particles.count(canvas, self.reduced_motion);
                info!("Spawning {} particles for {}x{} canvas", count, canvas.x, canvas.y);
                Background::Particles(ParticleField::new(canvas, count, &self.config.particles, &mut self.rng))
            }
            BackdropMode::Terrain => {
                let terrain = TerrainScroller::new(canvas, &self.config.terrain)?;
                let size = terrain.image().size();
                info!("Terrain {}x{} pixels for {}x{} canvas", size.x, size.y, canvas.x, canvas.y);
                Background::Terrain(terrain)
            }
        };
        Ok(background)
    }

    /// The low-res buffer backing the current frame, if the mode has one.
    pub fn image(&self) -> Option<&PixelBuffer> {
        self.frame().image
    }
}
