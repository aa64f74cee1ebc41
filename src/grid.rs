use crate::error::EngineError;
use bevy::math::{UVec2, Vec2};
use rand::Rng;

/// Two chemical layers (`u`, `v`), each stored as a ping-pong pair.
///
/// `front` selects the readable half of both pairs; a step writes into the
/// other half and then flips the index. Nothing is reallocated per frame.
#[derive(Debug, Clone)]
pub struct SimulationGrid {
    width: usize,
    height: usize,
    u: [Vec<f32>; 2],
    v: [Vec<f32>; 2],
    front: usize,
}

/// Borrowed view of one step: read the current layers, write the next ones.
pub struct StepBuffers<'a> {
    pub u: &'a [f32],
    pub v: &'a [f32],
    pub next_u: &'a mut [f32],
    pub next_v: &'a mut [f32],
}

impl SimulationGrid {
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::EmptySurface {
                width: width as u32,
                height: height as u32,
            });
        }
        let len = width * height;
        Ok(Self {
            width,
            height,
            u: [vec![1.0; len], vec![1.0; len]],
            v: [vec![0.0; len], vec![0.0; len]],
            front: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width as u32, self.height as u32)
    }

    pub fn u(&self) -> &[f32] {
        &self.u[self.front]
    }

    pub fn v(&self) -> &[f32] {
        &self.v[self.front]
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Resets both layers: `u = 1`, `v = 0`, then drops `spots` blobs of
    /// activator at random positions.
    pub fn seed(&mut self, rng: &mut impl Rng, spots: usize) {
        for buf in &mut self.u {
            buf.fill(1.0);
        }
        for buf in &mut self.v {
            buf.fill(0.0);
        }
        self.front = 0;

        let radius = (self.width.min(self.height) as f32 * 0.04).max(2.0);
        for _ in 0..spots {
            let cx = rng.gen_range(0.0..self.width as f32);
            let cy = rng.gen_range(0.0..self.height as f32);
            let r = radius * rng.gen_range(0.6..1.4);
            self.splat(Vec2::new(cx, cy), r, 0.5, 0.25);
        }
    }

    /// Writes a disc of the given concentrations into the readable layers.
    pub fn splat(&mut self, center: Vec2, radius: f32, v: f32, u: f32) {
        let (w, h) = (self.width as i32, self.height as i32);
        let x0 = ((center.x - radius).floor() as i32).clamp(0, w - 1);
        let x1 = ((center.x + radius).ceil() as i32).clamp(0, w - 1);
        let y0 = ((center.y - radius).floor() as i32).clamp(0, h - 1);
        let y1 = ((center.y + radius).ceil() as i32).clamp(0, h - 1);
        let r2 = radius * radius;
        let front = self.front;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if d.length_squared() <= r2 {
                    let idx = y as usize * self.width + x as usize;
                    self.v[front][idx] = v;
                    self.u[front][idx] = u;
                }
            }
        }
    }

    pub fn buffers(&mut self) -> StepBuffers<'_> {
        let (front_u, back_u) = split_pair(&mut self.u, self.front);
        let (front_v, back_v) = split_pair(&mut self.v, self.front);
        StepBuffers {
            u: front_u,
            v: front_v,
            next_u: back_u,
            next_v: back_v,
        }
    }

    /// Makes the freshly written layers readable.
    pub fn swap(&mut self) {
        self.front ^= 1;
    }

    /// Mean `v` over the cells within `radius` of `center` (grid coords).
    pub fn mean_v_around(&self, center: Vec2, radius: f32) -> f32 {
        let v = self.v();
        let mut sum = 0.0;
        let mut count = 0usize;
        for y in 0..self.height {
            for x in 0..self.width {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if d.length() <= radius {
                    sum += v[self.index(x, y)];
                    count += 1;
                }
            }
        }
        if count == 0 { 0.0 } else { sum / count as f32 }
    }

    /// (min, max) of the readable `v` layer.
    pub fn v_range(&self) -> (f32, f32) {
        self.v()
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

fn split_pair(pair: &mut [Vec<f32>; 2], front: usize) -> (&[f32], &mut [f32]) {
    let [a, b] = pair;
    if front == 0 {
        (a.as_slice(), b.as_mut_slice())
    } else {
        (b.as_slice(), a.as_mut_slice())
    }
}

/// Value at `(x, y)` with out-of-range indices clamped to the nearest edge cell.
#[inline]
pub fn sample_clamped(data: &[f32], width: usize, height: usize, x: isize, y: isize) -> f32 {
    let cx = x.clamp(0, width as isize - 1) as usize;
    let cy = y.clamp(0, height as isize - 1) as usize;
    data[cy * width + cx]
}

/// Bilinear sample at cell-space position `(x, y)`, edges clamped.
pub fn sample_bilinear(data: &[f32], width: usize, height: usize, x: f32, y: f32) -> f32 {
    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;
    let (x0, y0) = (x0 as isize, y0 as isize);

    let a = sample_clamped(data, width, height, x0, y0);
    let b = sample_clamped(data, width, height, x0 + 1, y0);
    let c = sample_clamped(data, width, height, x0, y0 + 1);
    let d = sample_clamped(data, width, height, x0 + 1, y0 + 1);

    let top = a + (b - a) * tx;
    let bottom = c + (d - c) * tx;
    top + (bottom - top) * ty
}

/// 9-sample Laplacian with clamped (Neumann-like) borders.
///
/// ```text
///   0.05  0.2  0.05
///   0.2  -1.0  0.2
///   0.05  0.2  0.05
/// ```
#[inline]
pub fn laplacian(data: &[f32], width: usize, height: usize, x: usize, y: usize) -> f32 {
    let (xi, yi) = (x as isize, y as isize);
    let at = |dx: isize, dy: isize| sample_clamped(data, width, height, xi + dx, yi + dy);

    let orthogonal = at(0, -1) + at(0, 1) + at(-1, 0) + at(1, 0);
    let diagonal = at(-1, -1) + at(1, -1) + at(-1, 1) + at(1, 1);
    0.2 * orthogonal + 0.05 * diagonal - data[y * width + x]
}
