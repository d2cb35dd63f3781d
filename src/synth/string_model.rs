//! Explicit finite-difference model of a damped, fixed-end string.
//!
//! Each call to [`StringModel::step`] advances the displacement grid by one
//! sample:
//!
//! ```text
//! next[x] = λ²·(u[x-1] - 2u[x] + u[x+1])
//!         + 2u[x] - prev[x]
//!         - 2·s0·dt·(u[x] - prev[x])
//!         + 2·s1·dt/dx²·(δ²u[x] - δ²prev[x])
//!         - κ²·dt²/dx⁴·δ⁴u[x]            (only when stiffness is enabled)
//! ```
//!
//! with `λ = c·dt/dx`. Index 0 and `X` are held at zero.

use super::strings::{PhysicalParameters, MAX_LOSS_PER_SAMPLE};

pub struct StringModel {
    prev: Vec<f32>,
    current: Vec<f32>,
    next: Vec<f32>,
    segments: usize,
    read_index: usize,
    dt: f32,
    /// λ² = c²·dt²/dx²
    courant_sq: f32,
    /// s0, kept raw so note-off can rescale it.
    uniform_loss: f32,
    /// 2·s1·dt/dx²
    frequency_loss: f32,
    /// κ²·dt²/dx⁴, zero when disabled.
    stiffness: f32,
}

impl StringModel {
    /// Creates an empty model whose buffers can hold `max_points` without
    /// reallocating.
    pub fn with_capacity(max_points: usize) -> Self {
        Self {
            prev: Vec::with_capacity(max_points),
            current: Vec::with_capacity(max_points),
            next: Vec::with_capacity(max_points),
            segments: 0,
            read_index: 0,
            dt: 0.0,
            courant_sq: 0.0,
            uniform_loss: 0.0,
            frequency_loss: 0.0,
            stiffness: 0.0,
        }
    }

    /// Reserves room for `max_points` per buffer. Call outside the audio path.
    pub fn reserve(&mut self, max_points: usize) {
        for buffer in [&mut self.prev, &mut self.current, &mut self.next] {
            buffer.reserve(max_points.saturating_sub(buffer.len()));
        }
    }

    /// Loads a note: sizes the grid and sets the initial state from an initial
    /// velocity profile (`current = velocity·dt`, `prev = 0`).
    pub fn excite(&mut self, params: &PhysicalParameters, velocity_profile: &[f32]) {
        let points = params.points();
        debug_assert_eq!(velocity_profile.len(), points);

        self.segments = params.segments;
        self.read_index = params.read_index;
        self.dt = params.dt;

        let dt = f64::from(params.dt);
        let dx = f64::from(params.dx);
        let c = f64::from(params.wave_speed);
        self.courant_sq = (c * c * dt * dt / (dx * dx)) as f32;
        self.uniform_loss = params.uniform_loss;
        self.frequency_loss = (2.0 * f64::from(params.frequency_loss) * dt / (dx * dx)) as f32;
        self.stiffness = params
            .stiffness
            .map(|kappa| {
                let kappa = f64::from(kappa);
                (kappa * kappa * dt * dt / dx.powi(4)) as f32
            })
            .unwrap_or(0.0);

        self.prev.clear();
        self.prev.resize(points, 0.0);
        self.next.clear();
        self.next.resize(points, 0.0);
        self.current.clear();
        self.current
            .extend(velocity_profile.iter().map(|v| v * params.dt));
        self.current[0] = 0.0;
        self.current[self.segments] = 0.0;
    }

    /// Multiplies the uniform loss, capped at `MAX_LOSS_PER_SAMPLE / dt`.
    pub fn scale_damping(&mut self, factor: f32) {
        let ceiling = MAX_LOSS_PER_SAMPLE / self.dt.max(f32::MIN_POSITIVE);
        self.uniform_loss = (self.uniform_loss * factor).min(ceiling);
    }

    pub fn uniform_loss(&self) -> f32 {
        self.uniform_loss
    }

    /// Advances one sample and returns the displacement at the read point
    /// before the advance.
    pub fn step(&mut self) -> f32 {
        let x_end = self.segments;
        if x_end < 2 {
            return 0.0;
        }

        let u = &self.current;
        let p = &self.prev;
        let next = &mut self.next;
        let damping = 2.0 * self.uniform_loss * self.dt;

        for x in 1..x_end {
            let lap = u[x - 1] - 2.0 * u[x] + u[x + 1];
            let lap_prev = p[x - 1] - 2.0 * p[x] + p[x + 1];

            let mut value = self.courant_sq * lap + 2.0 * u[x]
                - p[x]
                - damping * (u[x] - p[x])
                + self.frequency_loss * (lap - lap_prev);

            if self.stiffness != 0.0 {
                value -= self.stiffness * biharmonic(u, x);
            }
            next[x] = value;
        }
        next[0] = 0.0;
        next[x_end] = 0.0;

        let tap = self.current[self.read_index];

        // prev <- current, current <- next; the old prev becomes scratch.
        std::mem::swap(&mut self.prev, &mut self.current);
        std::mem::swap(&mut self.current, &mut self.next);

        tap
    }

    /// Current displacement of every grid point, endpoints included.
    pub fn displacement(&self) -> &[f32] {
        &self.current
    }

    pub fn segments(&self) -> usize {
        self.segments
    }
}

/// Fourth spatial difference with simply supported ends (`u[-1] = -u[1]`,
/// `u[X+1] = -u[X-1]`).
fn biharmonic(u: &[f32], x: usize) -> f32 {
    let last = u.len() - 1;
    let at = |i: isize| -> f32 {
        if i < 0 {
            -u[(-i) as usize]
        } else if i as usize > last {
            -u[2 * last - i as usize]
        } else {
            u[i as usize]
        }
    };
    let x = x as isize;
    at(x + 2) - 4.0 * at(x + 1) + 6.0 * at(x) - 4.0 * at(x - 1) + at(x - 2)
}
