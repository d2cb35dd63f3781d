use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    Tension,
    Sustain,
    Tone,
    Gain,
}

impl ParamId {
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            ParamId::Tension => 0.1..=1.4,
            ParamId::Sustain => 0.1..=1.0,
            ParamId::Tone => 10.0..=5000.0,
            ParamId::Gain => -60.0..=0.0,
        }
    }

    /// Increment used when nudging the parameter from the keyboard.
    pub fn step(self) -> f32 {
        match self {
            ParamId::Tension | ParamId::Sustain => 0.1,
            ParamId::Tone => 10.0,
            ParamId::Gain => 0.1,
        }
    }

    fn clamp(self, value: f32) -> f32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamEvent {
    Set { param: ParamId, value: f32 },
    Nudge { param: ParamId, direction: StepDirection },
}

/// Host-automatable parameters of the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    /// Multiplier on the string wave speed.
    pub tension: f32,
    /// Multiplier on decay time.
    pub sustain: f32,
    /// Cutoff of the output low-pass, Hz.
    pub tone: f32,
    /// Output gain, dB.
    pub gain_db: f32,
}

impl SynthParams {
    pub fn get(&self, param: ParamId) -> f32 {
        match param {
            ParamId::Tension => self.tension,
            ParamId::Sustain => self.sustain,
            ParamId::Tone => self.tone,
            ParamId::Gain => self.gain_db,
        }
    }

    /// Sets a parameter, clamped into its range. Returns the stored value.
    pub fn set(&mut self, param: ParamId, value: f32) -> f32 {
        let value = param.clamp(value);
        match param {
            ParamId::Tension => self.tension = value,
            ParamId::Sustain => self.sustain = value,
            ParamId::Tone => self.tone = value,
            ParamId::Gain => self.gain_db = value,
        }
        value
    }

    pub fn apply(&mut self, event: &ParamEvent) -> (ParamId, f32) {
        match *event {
            ParamEvent::Set { param, value } => (param, self.set(param, value)),
            ParamEvent::Nudge { param, direction } => {
                let delta = match direction {
                    StepDirection::Up => param.step(),
                    StepDirection::Down => -param.step(),
                };
                (param, self.set(param, self.get(param) + delta))
            }
        }
    }

    /// Every value clamped into range.
    pub fn clamped(mut self) -> Self {
        for param in [ParamId::Tension, ParamId::Sustain, ParamId::Tone, ParamId::Gain] {
            self.set(param, self.get(param));
        }
        self
    }

    pub fn gain_linear(&self) -> f32 {
        10f32.powf(self.gain_db / 20.0)
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            tension: 1.0,
            sustain: 1.0,
            // The tone control tops out at 5 kHz.
            tone: 5000.0,
            gain_db: -12.0,
        }
    }
}
