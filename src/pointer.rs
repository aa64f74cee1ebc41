use bevy::math::Vec2;

/// Smallest interval used for the velocity finite difference.
const MIN_INTERVAL_MS: f64 = 1.0;
/// Per 60Hz frame decay of the remembered speed once the pointer rests.
const SPEED_DECAY: f32 = 0.9;

/// Last known pointer, in canvas pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    pub position: Vec2,
    pub active: bool,
    /// Pixels per millisecond.
    pub velocity: Vec2,
    pub speed: f32,
    last_time_ms: Option<f64>,
}

impl PointerState {
    pub fn on_move(&mut self, position: Vec2, time_ms: f64) {
        if let Some(last) = self.last_time_ms
            && self.active
        {
            let elapsed = (time_ms - last).max(MIN_INTERVAL_MS) as f32;
            self.velocity = (position - self.position) / elapsed;
            self.speed = self.velocity.length();
        } else {
            self.velocity = Vec2::ZERO;
            self.speed = 0.0;
        }
        self.position = position;
        self.last_time_ms = Some(time_ms);
        self.active = true;
    }

    pub fn on_leave(&mut self) {
        self.active = false;
        self.velocity = Vec2::ZERO;
        self.speed = 0.0;
        self.last_time_ms = None;
    }

    /// Lets the speed fade so "recent" motion matters, not stale motion.
    pub fn settle(&mut self, frame_scale: f32) {
        let k = SPEED_DECAY.powf(frame_scale);
        self.velocity *= k;
        self.speed *= k;
    }

    /// Speed in pixels per second.
    pub fn speed_px_per_sec(&self) -> f32 {
        self.speed * 1000.0
    }

    /// The pointer expressed in another coordinate space.
    pub fn scaled(&self, scale: Vec2) -> PointerSample {
        PointerSample {
            position: self.position * scale,
            active: self.active,
            speed: self.speed_px_per_sec(),
        }
    }
}

/// What a stepper needs from the pointer for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSample {
    pub position: Vec2,
    pub active: bool,
    /// Canvas pixels per second, regardless of `position`'s space.
    pub speed: f32,
}
