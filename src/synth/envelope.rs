/// Smoothed energy follower on the voice output, used to detect when a
/// string has decayed to silence.
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    pub reaction_ms: f32,
    pub threshold: f32,
    alpha: f32,
    level: f32,
}

impl EnvelopeDetector {
    pub fn new(reaction_ms: f32, threshold: f32) -> Self {
        Self {
            reaction_ms,
            threshold,
            ..Default::default()
        }
    }

    /// Recomputes the smoothing coefficient for a sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let reaction = self.reaction_ms.max(f32::EPSILON);
        self.alpha = ((1000.0 / reaction) / sample_rate).clamp(0.0, 1.0);
    }

    /// Starts a new note. The level starts at 1 so the detector cannot fire
    /// before the string has produced any output.
    pub fn reset(&mut self) {
        self.level = 1.0;
    }

    /// Feeds one output sample; returns `true` once the level is below the
    /// silence threshold.
    pub fn update(&mut self, sample: f32) -> bool {
        self.level = self.alpha * sample * sample + (1.0 - self.alpha) * self.level;
        self.is_silent()
    }

    pub fn is_silent(&self) -> bool {
        self.level < self.threshold
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for EnvelopeDetector {
    fn default() -> Self {
        Self {
            reaction_ms: 1.0,
            threshold: 5e-9,
            alpha: 0.0,
            level: 0.0,
        }
    }
}
