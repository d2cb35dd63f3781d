use super::config::SynthConfig;
use super::filter::OnePoleLowPass;
use super::note::{NoteEvent, NoteSource};
use super::params::{ParamEvent, ParamId, SynthParams};
use super::visual::VisualObserver;
use super::voice::{PlayableVoice, Sound, StringVoice, Voice};
use crate::error::Result;
use tracing::{debug, info};

/// A voice together with the key currently holding it.
struct VoiceSlot {
    voice: Voice,
    note: Option<(u8, NoteSource)>,
}

/// The instrument: a fixed pool of string voices followed by the tone filter
/// and output gain.
pub struct Synth {
    voices: Vec<VoiceSlot>,
    pub config: SynthConfig,
    params: SynthParams,
    tone_filters: Vec<OnePoleLowPass>,
    sample_rate: f32,
    current_gain: f32,
    max_block_size: usize,
}

impl Synth {
    pub fn new(config: SynthConfig) -> Self {
        let voices = (0..config.max_voices)
            .map(|_| VoiceSlot {
                voice: Voice::String(StringVoice::new(config.voice.clone())),
                note: None,
            })
            .collect();
        let params = config.params.clamped();

        Self {
            voices,
            params,
            tone_filters: Vec::new(),
            sample_rate: 0.0,
            current_gain: params.gain_linear(),
            max_block_size: 0,
            config,
        }
    }

    /// Prepares every voice and the output stage. Must be called before
    /// rendering and again whenever the sample rate changes.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()> {
        for slot in self.voices.iter_mut() {
            slot.voice.prepare(sample_rate)?;
            slot.note = None;
        }
        self.tone_filters = (0..self.config.channels)
            .map(|_| OnePoleLowPass::new(self.params.tone, sample_rate))
            .collect();
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.current_gain = self.params.gain_linear();
        info!(
            sample_rate,
            max_block_size,
            voices = self.voices.len(),
            "synth prepared"
        );
        Ok(())
    }

    pub fn note_on(&mut self, event: &NoteEvent) {
        let velocity = self.config.voice.velocity_to_scale(event.velocity);
        let key = (event.note_number, event.source);

        // A key struck again while its previous note still rings releases
        // that note first.
        for slot in self.voices.iter_mut().filter(|s| s.note == Some(key)) {
            slot.voice.note_off(0.0, true);
            slot.note = None;
        }

        let Some(slot) = self
            .voices
            .iter_mut()
            .find(|s| !s.voice.is_active() && s.voice.can_play(Sound::PluckedString))
        else {
            debug!(note = event.note_number, "no free voice, note dropped");
            return;
        };

        slot.voice
            .update_params(self.params.tension, self.params.sustain);
        slot.voice.note_on(event.frequency, velocity, 0);
        if slot.voice.is_active() {
            slot.note = Some(key);
        }
    }

    pub fn note_off(&mut self, event: &NoteEvent) {
        let key = (event.note_number, event.source);
        let velocity = self.config.voice.velocity_to_scale(event.velocity);
        for slot in self.voices.iter_mut().filter(|s| s.note == Some(key)) {
            slot.voice.note_off(velocity, true);
            slot.note = None;
        }
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn set_param(&mut self, param: ParamId, value: f32) {
        self.apply_param_event(&ParamEvent::Set { param, value });
    }

    pub fn apply_param_event(&mut self, event: &ParamEvent) {
        let (param, value) = self.params.apply(event);
        if param == ParamId::Tone {
            for filter in self.tone_filters.iter_mut() {
                filter.set_cutoff(value, self.sample_rate);
            }
        }
        debug!(?param, value, "parameter changed");
    }

    /// Collects the visualization observers of every voice, for a display
    /// thread. Each observer is handed out once.
    pub fn take_visual_observers(&mut self) -> Vec<VisualObserver> {
        self.voices
            .iter_mut()
            .filter_map(|slot| slot.voice.take_observer())
            .collect()
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().map(|slot| &slot.voice)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|s| s.voice.is_active()).count()
    }

    /// Renders one block into planar `output` (one buffer per channel).
    /// Buffers are cleared first.
    pub fn process(&mut self, output: &mut [Vec<f32>]) {
        for channel in output.iter_mut() {
            channel.fill(0.0);
        }
        let buffer_len = output.iter().map(Vec::len).min().unwrap_or(0);

        for slot in self.voices.iter_mut() {
            slot.voice
                .update_params(self.params.tension, self.params.sustain);
            if slot.voice.is_active() {
                slot.voice.render(output, 0, buffer_len);
                if !slot.voice.is_active() {
                    slot.note = None;
                }
            }
        }

        for (channel, filter) in output.iter_mut().zip(self.tone_filters.iter_mut()) {
            filter.process_block(&mut channel[..buffer_len]);
        }

        self.apply_gain(output, buffer_len);
    }

    /// Applies the output gain, crossfading from the previous block's gain.
    fn apply_gain(&mut self, output: &mut [Vec<f32>], buffer_len: usize) {
        let target_gain = self.params.gain_linear();

        // Crossfade over ~5 ms, never longer than the block.
        let crossfade_samples = ((0.005 * self.sample_rate).round() as usize).min(buffer_len);
        let inv_crossfade_len = if crossfade_samples > 0 {
            1.0 / crossfade_samples as f32
        } else {
            0.0
        };

        for i in 0..buffer_len {
            let gain = if i < crossfade_samples && self.current_gain != target_gain {
                let t = (i + 1) as f32 * inv_crossfade_len;
                let smooth_t = t * t * (3.0 - 2.0 * t);
                self.current_gain
                    .mul_add(1.0 - smooth_t, target_gain * smooth_t)
            } else {
                target_gain
            };
            for channel in output.iter_mut() {
                channel[i] *= gain;
            }
        }

        self.current_gain = target_gain;
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

impl Default for Synth {
    fn default() -> Self {
        Self::new(SynthConfig::default())
    }
}
