use super::excitation::ExcitationShape;
use serde::{Deserialize, Serialize};

/// Per-voice tuning of the string model.
/// Shared by every voice in the engine; loaded as part of `SynthConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub excitation: ExcitationShape,
    /// Point of maximum initial velocity for the raised-cosine shape (0-1).
    pub pluck_position: f32,
    /// Where the output is read along the string (0-1).
    pub read_position: f32,
    /// Hand position on the neck; widens each register's window by three
    /// semitones per step.
    pub playing_position: u32,
    pub detector_reaction_ms: f32,
    pub silence_threshold: f32,
    /// Multiplier applied to the uniform loss on note-off.
    pub note_off_damping: f32,
    /// Samples between visualization captures.
    pub visual_interval: usize,
    /// Stiffness coefficient κ; `None` keeps the ideal-string model.
    pub stiffness: Option<f32>,
    pub velocity_sensitive: bool,
    pub velocity_curve: f32,
}

impl VoiceConfig {
    /// Compute the note velocity (0.0-1.0) from a MIDI velocity.
    pub fn velocity_to_scale(&self, velocity: u8) -> f32 {
        let vel = if self.velocity_sensitive {
            velocity.clamp(1, 127)
        } else {
            100
        };

        let normalized = vel as f32 / 127.0;
        normalized.powf(self.velocity_curve)
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            excitation: ExcitationShape::Projectile,
            pluck_position: 0.6,
            read_position: 0.8,
            playing_position: 1,
            detector_reaction_ms: 1.0,
            silence_threshold: 5e-9,
            note_off_damping: 200.0,
            visual_interval: 200,
            stiffness: None,
            velocity_sensitive: true,
            velocity_curve: 1.0,
        }
    }
}
