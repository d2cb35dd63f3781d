//! Physical string registers and the per-note parameter derivation.
//!
//! A note frequency selects one of sixteen string registers, and from that
//! register's wave speed the string length, spatial grid and the two loss
//! coefficients of the damped wave equation are derived.

use crate::error::{Result, SynthError};
use std::f64::consts::{LN_10, PI};

/// Lowest playable frequency (inclusive).
pub const MIN_PLAYABLE_HZ: f32 = 65.4;
/// Highest playable frequency (exclusive).
pub const MAX_PLAYABLE_HZ: f32 = 1047.0;

pub const NUM_REGISTERS: usize = 16;

/// Lowest frequency of each string register, ascending.
pub const REGISTER_MIN_HZ: [f32; NUM_REGISTERS] = [
    65.4, 73.4, 82.4, 92.5, 103.8, 116.5, 130.8, 146.8, 164.8, 185.0, 207.6, 233.0, 261.6, 293.6,
    329.6, 369.9,
];

/// Scale length in meters.
pub const SCALE_LENGTH: f64 = 1.0;

/// Grid stability constant (lambda = c·dt/dx).
const LAMBDA: f64 = 1.0;

/// Two-point loss model: reference angular frequencies and their T60 decay times.
const LOSS_FREQUENCIES: [f64; 2] = [200.0 * 2.0 * PI, 10_000.0 * 2.0 * PI];
const LOSS_DECAY_TIMES: [f64; 2] = [9.0, 6.0];

/// Smallest grid that still has room for an interior pluck and read point.
pub const MIN_SEGMENTS: usize = 4;

/// Ceiling on the uniform loss per sample, `s0·dt`.
pub const MAX_LOSS_PER_SAMPLE: f32 = 0.25;

pub const MIN_TENSION: f32 = 0.1;
pub const MAX_TENSION: f32 = 1.4;
pub const MIN_SUSTAIN: f32 = 0.1;
pub const MAX_SUSTAIN: f32 = 1.0;

pub fn is_playable(frequency: f32) -> bool {
    (MIN_PLAYABLE_HZ..MAX_PLAYABLE_HZ).contains(&frequency)
}

/// Everything the string model needs for one note. Fixed from note-on until
/// the voice goes idle, apart from the note-off damping boost.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalParameters {
    pub frequency: f32,
    pub register: usize,
    pub fret: i32,
    /// Wave propagation speed `c` (m/s), tension multiplier applied.
    pub wave_speed: f32,
    /// String length `L` in meters.
    pub length: f32,
    /// Segment count `X`; the buffers hold `X + 1` points.
    pub segments: usize,
    pub dx: f32,
    pub dt: f32,
    pub read_index: usize,
    pub pluck_index: usize,
    /// Stability constant `k` used by the xi-transform.
    pub stability: f32,
    /// Uniform loss `s0`.
    pub uniform_loss: f32,
    /// Frequency dependent loss `s1`.
    pub frequency_loss: f32,
    /// Stiffness coefficient, `None` when the term is disabled.
    pub stiffness: Option<f32>,
}

impl PhysicalParameters {
    /// Courant number `c·dt/dx`.
    pub fn courant(&self) -> f32 {
        self.wave_speed * self.dt / self.dx
    }

    /// Wave number of the fundamental mode, `2πf/c`.
    pub fn wave_number(&self) -> f32 {
        2.0 * std::f32::consts::PI * self.frequency / self.wave_speed
    }

    pub fn points(&self) -> usize {
        self.segments + 1
    }
}

/// Register-independent inputs of the mapping.
#[derive(Debug, Clone, Copy)]
pub struct MappingInput {
    pub sample_rate: f32,
    pub tension: f32,
    pub sustain: f32,
    pub playing_position: u32,
    pub pluck_position: f32,
    pub read_position: f32,
    pub stiffness: Option<f32>,
    /// Factor the uniform loss may be raised by on note-off.
    pub note_off_damping: f32,
}

/// Picks the lowest register whose playing-position window reaches `frequency`.
/// Returns `(register, fret)`.
pub fn select_register(frequency: f32, playing_position: u32) -> (usize, i32) {
    let frequency = f64::from(frequency);
    let window = 2f64.powf(3.0 * f64::from(playing_position) / 12.0);

    let mut register = 0;
    while register < NUM_REGISTERS - 1
        && frequency > f64::from(REGISTER_MIN_HZ[register]) * window
    {
        register += 1;
    }

    let ratio = frequency / f64::from(REGISTER_MIN_HZ[register]);
    let fret = (12.0 * ratio.log2()).round() as i32 + 1;
    (register, fret)
}

/// Maps a damping reference frequency to the decay-rate variable used by the
/// two-point loss model.
fn xi(w: f64, gamma: f64, k: f64) -> f64 {
    let k2 = k * k;
    (-gamma.powi(2) + (gamma.powi(4) + 4.0 * k2 * w * w).sqrt()) / (2.0 * k2)
}

/// Returns `(s0, s1)` for a note at `frequency`, scaled by the sustain multiplier.
pub fn loss_coefficients(frequency: f64, sustain: f64) -> (f64, f64) {
    let gamma = 2.0 * frequency;
    let k = 0.001f64.sqrt() * gamma;
    let xi_low = xi(LOSS_FREQUENCIES[0], gamma, k);
    let xi_high = xi(LOSS_FREQUENCIES[1], gamma, k);
    let span = xi_high - xi_low;
    let [t_low, t_high] = LOSS_DECAY_TIMES;

    let s0 = (xi_high / t_low - xi_low / t_high) * 6.0 * LN_10 / span;
    let s1 = (-1.0 / t_low + 1.0 / t_high) * 6.0 * LN_10 / span;
    (s0 / sustain, s1 / sustain)
}

/// Smallest grid spacing for which the explicit scheme stays bounded when
/// the uniform loss reaches `s0_max`:
/// `λ² + 4·s1·dt/dx² + 4·κ²·dt²/dx⁴ ≤ 1 - s0_max·dt`.
fn min_grid_spacing(c: f64, dt: f64, s1: f64, s0_max: f64, stiffness: Option<f64>) -> f64 {
    let a = c * c * dt * dt + 4.0 * s1 * dt;
    let d = 1.0 - s0_max * dt;
    let b = stiffness.map_or(0.0, |kappa| 16.0 * d * kappa * kappa * dt * dt);
    ((a + (a * a + b).sqrt()) / (2.0 * d)).sqrt()
}

/// Derives the physical parameter set for one note.
///
/// Fails when the frequency is outside the playable range or the resulting
/// grid is too coarse to simulate; callers treat either as a rejected note.
pub fn map_frequency(frequency: f32, input: &MappingInput) -> Result<PhysicalParameters> {
    if !is_playable(frequency) {
        return Err(SynthError::OutOfRange(frequency));
    }
    if !(input.sample_rate.is_finite() && input.sample_rate > 0.0) {
        return Err(SynthError::InvalidSampleRate(input.sample_rate));
    }

    let tension = f64::from(input.tension.clamp(MIN_TENSION, MAX_TENSION));
    let sustain = f64::from(input.sustain.clamp(MIN_SUSTAIN, MAX_SUSTAIN));
    let dt = 1.0 / f64::from(input.sample_rate);
    let f = f64::from(frequency);

    let (register, fret) = select_register(frequency, input.playing_position);

    let c0 = 2.0 * SCALE_LENGTH * f64::from(REGISTER_MIN_HZ[register]);
    let c = c0 * tension;
    let length = c / (2.0 * f);

    let (s0, s1) = loss_coefficients(f, sustain);
    let stiffness = input.stiffness.map(f64::from).filter(|kappa| *kappa > 0.0);

    let dx0 = c * dt / LAMBDA;
    let mut segments = (length / dx0).floor() as usize;
    let s0_max = (s0 * f64::from(input.note_off_damping.max(1.0)))
        .min(f64::from(MAX_LOSS_PER_SAMPLE) / dt);
    let dx_min = min_grid_spacing(c, dt, s1, s0_max, stiffness);
    if segments > 0 && length / (segments as f64) < dx_min {
        let clamped = (length / dx_min).floor() as usize;
        tracing::debug!(
            frequency,
            from = segments,
            to = clamped,
            "grid too fine for a stable step, coarsening"
        );
        segments = clamped;
    }
    if segments < MIN_SEGMENTS {
        return Err(SynthError::TooFewSegments {
            frequency,
            segments,
        });
    }
    let dx = length / segments as f64;
    debug_assert!(c * dt / dx <= 1.0 + 1e-6, "Courant number above 1");

    let interior = |position: f32| {
        ((segments as f64 * f64::from(position.clamp(0.0, 1.0))).floor() as usize)
            .clamp(1, segments - 1)
    };

    Ok(PhysicalParameters {
        frequency,
        register,
        fret,
        wave_speed: c as f32,
        length: length as f32,
        segments,
        dx: dx as f32,
        dt: dt as f32,
        read_index: interior(input.read_position),
        pluck_index: interior(input.pluck_position),
        stability: (0.001f64.sqrt() * 2.0 * f) as f32,
        uniform_loss: s0 as f32,
        frequency_loss: s1 as f32,
        stiffness: stiffness.map(|kappa| kappa as f32),
    })
}

/// Largest segment count any playable note can need at `sample_rate`.
pub fn max_segments(sample_rate: f32) -> usize {
    (f64::from(sample_rate) / (2.0 * f64::from(MIN_PLAYABLE_HZ))).ceil() as usize + 1
}
