use super::strings::PhysicalParameters;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Below this the fundamental-mode projection is treated as degenerate.
const MIN_PROJECTION: f32 = 1e-12;

/// Initial velocity distribution applied along the string at note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcitationShape {
    /// Linear rise from the nut to the bridge.
    Ramp,
    /// Raised cosine peaking at the pluck point.
    RaisedCosine,
    /// Same velocity at every interior point.
    Uniform,
    /// Two asymmetric projectile trajectories blended by velocity: a sharp,
    /// percussive one for hard notes and a softer one for quiet notes.
    #[default]
    Projectile,
}

impl ExcitationShape {
    /// Writes the un-normalized shape into `out`, which must hold `X + 1` points.
    fn fill(self, velocity: f32, pluck_index: usize, out: &mut [f32]) {
        let segments = out.len() - 1;
        let x_max = segments as f32;
        out.fill(0.0);

        match self {
            ExcitationShape::Ramp => {
                for (x, v) in out.iter_mut().enumerate().take(segments).skip(1) {
                    *v = x as f32 / x_max;
                }
            }
            ExcitationShape::RaisedCosine => {
                let centre = pluck_index as f32;
                for (x, v) in out.iter_mut().enumerate() {
                    let x = x as f32;
                    *v = if x <= centre {
                        0.5 - 0.5 * (x / centre * PI).cos()
                    } else {
                        0.5 + 0.5 * ((x - centre) * PI / (x_max - centre)).cos()
                    };
                }
            }
            ExcitationShape::Uniform => {
                for v in out.iter_mut().take(segments).skip(1) {
                    *v = 1.0;
                }
            }
            ExcitationShape::Projectile => {
                for x in 1..segments {
                    let position = x as f32 / x_max;

                    let t_hard = -10.0 * (1.0 - 30.0 * position / 92.388).ln();
                    let hard = (-t_hard + (1.0 - (-10.0 * t_hard).exp()) * 3.92683) / 3.4597;

                    let t_soft = -3.0 * (1.0 - 0.74936 * position).ln();
                    let soft =
                        (-1.6667 * t_soft + (1.0 - (-3.0 * t_soft).exp()) * 6.8964) / 4.9411;

                    out[segments - x] = velocity * hard + (1.0 - velocity) * soft;
                }
            }
        }
        out[0] = 0.0;
        out[segments] = 0.0;
    }
}

/// Displacement amplitude of the fundamental mode that a velocity profile
/// produces, `b_n = 2·∫v(x)·sin(kx)dx / (L·2πf)`.
pub fn fundamental_amplitude(profile: &[f32], params: &PhysicalParameters) -> f32 {
    let kn = params.wave_number();
    let dx = params.dx;
    let integral: f32 = profile
        .iter()
        .take(params.segments)
        .enumerate()
        .map(|(x, v)| v * (kn * x as f32 * dx).sin() * dx)
        .sum();
    2.0 * integral / (params.length * 2.0 * PI * params.frequency)
}

/// Fills `out` with the normalized initial velocity profile for a note.
///
/// The profile is scaled so its fundamental-mode amplitude equals `velocity`,
/// which keeps loudness independent of pitch. `out` is resized to `X + 1`
/// points; it only reallocates when the note needs more room than it has.
pub fn synthesize(
    shape: ExcitationShape,
    velocity: f32,
    params: &PhysicalParameters,
    out: &mut Vec<f32>,
) {
    let velocity = velocity.clamp(0.0, 1.0);
    out.resize(params.points(), 0.0);
    shape.fill(velocity, params.pluck_index, out);

    let b_n = fundamental_amplitude(out, params);
    let gain = if b_n.is_finite() && b_n.abs() > MIN_PROJECTION {
        velocity / b_n
    } else {
        tracing::warn!(
            frequency = params.frequency,
            b_n,
            "degenerate excitation projection, skipping normalization"
        );
        velocity
    };

    for v in out.iter_mut() {
        *v *= gain;
    }
}
