use std::f32::consts::PI;

/// First-order (one-pole, one-zero) low-pass from the bilinear transform.
/// Used as the output "tone" control.
#[derive(Clone, Debug, Default)]
pub struct OnePoleLowPass {
    cutoff: f32,
    b0: f32,
    b1: f32,
    a1: f32,
    x1: f32,
    y1: f32,
}

impl OnePoleLowPass {
    pub fn new(cutoff: f32, sample_rate: f32) -> Self {
        let mut filter = Self::default();
        filter.set_cutoff(cutoff, sample_rate);
        filter
    }

    /// Recomputes coefficients, keeping the filter state.
    pub fn set_cutoff(&mut self, cutoff: f32, sample_rate: f32) {
        // Keep the prewarped frequency below Nyquist.
        let sample_rate = sample_rate.max(1.0);
        let cutoff = cutoff.max(1.0).min(sample_rate * 0.49);

        let n = 1.0 / (PI * cutoff / sample_rate).tan();
        let a0 = 1.0 + n;

        self.cutoff = cutoff;
        self.b0 = 1.0 / a0;
        self.b1 = 1.0 / a0;
        self.a1 = (1.0 - n) / a0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// y[n] = b0·x[n] + b1·x[n-1] - a1·y[n-1]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 - self.a1 * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
