use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::params::ParamId;
use crate::synth::{Synth, SynthConfig};
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

/// WASM Synth runtime (no threads, no channels, direct API)
#[wasm_bindgen]
pub struct WasmSynth {
    synth: Synth,
    buffer: Vec<Vec<f32>>,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32, buffer_size: usize) -> Result<WasmSynth, JsValue> {
        let config = SynthConfig {
            channels: 1,
            ..SynthConfig::default()
        };
        let mut synth = Synth::new(config);
        synth
            .prepare(sample_rate, buffer_size)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmSynth {
            synth,
            buffer: vec![vec![0.0; buffer_size]],
        })
    }

    /// Render a mono block into a JS-friendly Float32Array
    #[wasm_bindgen]
    pub fn render(&mut self, length: usize) -> Float32Array {
        if self.buffer[0].len() != length {
            self.buffer[0].resize(length, 0.0);
        }
        self.synth.process(&mut self.buffer);
        Float32Array::from(self.buffer[0].as_slice())
    }

    #[wasm_bindgen]
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if let Ok(event) = NoteEvent::new(note, velocity, true, NoteSource::Midi) {
            self.synth.note_on(&event);
        }
    }

    #[wasm_bindgen]
    pub fn note_off(&mut self, note: u8) {
        if let Ok(event) = NoteEvent::new(note, 0, false, NoteSource::Midi) {
            self.synth.note_off(&event);
        }
    }

    /// 0 = tension, 1 = sustain, 2 = tone, 3 = gain (dB).
    #[wasm_bindgen]
    pub fn set_param(&mut self, param: u8, value: f32) {
        let param = match param {
            0 => ParamId::Tension,
            1 => ParamId::Sustain,
            2 => ParamId::Tone,
            3 => ParamId::Gain,
            _ => return,
        };
        self.synth.set_param(param, value);
    }

    /// Latest string shape of a voice; empty when that voice is idle.
    #[wasm_bindgen]
    pub fn visual(&self, voice: usize) -> Float32Array {
        let shape = self
            .synth
            .voices()
            .nth(voice)
            .map(|v| v.visualization_snapshot())
            .unwrap_or(&[]);
        Float32Array::from(shape)
    }
}
