use super::envelope::EnvelopeDetector;
use super::excitation;
use super::string_model::StringModel;
use super::strings::{self, MappingInput, PhysicalParameters};
use super::visual::{self, VisualObserver, VisualizationSampler};
use super::voice_config::VoiceConfig;
use crate::error::{Result, SynthError};
use tracing::{debug, warn};

/// Highest sample rate a voice can be prepared for. Buffers are sized for it
/// up front so no rate change needs the audio path to allocate.
pub const MAX_SAMPLE_RATE: f32 = 192_000.0;

/// Sounds a voice may be asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    PluckedString,
}

/// What the engine needs from any voice it schedules.
pub trait PlayableVoice {
    fn can_play(&self, sound: Sound) -> bool;
    fn note_on(&mut self, frequency: f32, velocity: f32, pitch_bend: i32);
    fn note_off(&mut self, velocity: f32, allow_tail_off: bool);
    /// Adds `num_samples` of output, starting at `start_sample`, to every channel.
    fn render(&mut self, output: &mut [Vec<f32>], start_sample: usize, num_samples: usize);
    fn is_active(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Sounding,
}

/// A single simulated string.
pub struct StringVoice {
    state: VoiceState,
    config: VoiceConfig,
    sample_rate: Option<f32>,
    tension: f32,
    sustain: f32,
    params: Option<PhysicalParameters>,
    excitation: Vec<f32>,
    model: StringModel,
    detector: EnvelopeDetector,
    sampler: VisualizationSampler,
    observer: Option<VisualObserver>,
}

impl StringVoice {
    /// Creates an idle voice. It refuses notes until [`prepare`](Self::prepare).
    pub fn new(config: VoiceConfig) -> Self {
        let max_points = strings::max_segments(MAX_SAMPLE_RATE) + 1;
        let (sampler, observer) = visual::channel(config.visual_interval, max_points);
        let detector = EnvelopeDetector::new(config.detector_reaction_ms, config.silence_threshold);

        Self {
            state: VoiceState::Idle,
            config,
            sample_rate: None,
            tension: 1.0,
            sustain: 1.0,
            params: None,
            excitation: Vec::new(),
            model: StringModel::with_capacity(0),
            detector,
            sampler,
            observer: Some(observer),
        }
    }

    /// Sets the sample rate and sizes every buffer for the longest string
    /// playable at that rate.
    pub fn prepare(&mut self, sample_rate: f32) -> Result<()> {
        if !(sample_rate.is_finite() && sample_rate > 0.0 && sample_rate <= MAX_SAMPLE_RATE) {
            return Err(SynthError::InvalidSampleRate(sample_rate));
        }
        let max_points = strings::max_segments(sample_rate) + 1;

        self.model.reserve(max_points);
        self.excitation
            .reserve(max_points.saturating_sub(self.excitation.len()));
        self.sampler.reserve(max_points);
        self.detector.set_sample_rate(sample_rate);
        self.sample_rate = Some(sample_rate);
        self.finish();
        Ok(())
    }

    /// Hands out the observer end of the visualization channel. Only the
    /// first call returns it.
    pub fn take_observer(&mut self) -> Option<VisualObserver> {
        self.observer.take()
    }

    /// Stores the multipliers used by the next note-on. A sounding note keeps
    /// the coefficients it started with.
    pub fn update_params(&mut self, tension: f32, sustain: f32) {
        self.tension = tension.clamp(strings::MIN_TENSION, strings::MAX_TENSION);
        self.sustain = sustain.clamp(strings::MIN_SUSTAIN, strings::MAX_SUSTAIN);
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn parameters(&self) -> Option<&PhysicalParameters> {
        self.params.as_ref()
    }

    /// Most recent captured string shape, empty when idle.
    pub fn visualization_snapshot(&self) -> &[f32] {
        self.sampler.snapshot()
    }

    pub fn current_register(&self) -> Option<usize> {
        self.sampler.register()
    }

    pub fn current_fret(&self) -> Option<i32> {
        self.sampler.fret()
    }

    /// Live displacement grid of the running simulation.
    pub fn displacement(&self) -> &[f32] {
        self.model.displacement()
    }

    pub fn envelope_level(&self) -> f32 {
        self.detector.level()
    }

    pub fn uniform_loss(&self) -> f32 {
        self.model.uniform_loss()
    }

    fn start(&mut self, frequency: f32, velocity: f32) -> Result<()> {
        let sample_rate = self
            .sample_rate
            .ok_or(SynthError::InvalidSampleRate(0.0))?;
        let input = MappingInput {
            sample_rate,
            tension: self.tension,
            sustain: self.sustain,
            playing_position: self.config.playing_position,
            pluck_position: self.config.pluck_position,
            read_position: self.config.read_position,
            stiffness: self.config.stiffness,
            note_off_damping: self.config.note_off_damping,
        };
        let params = strings::map_frequency(frequency, &input)?;

        excitation::synthesize(self.config.excitation, velocity, &params, &mut self.excitation);
        self.model.excite(&params, &self.excitation);
        self.detector.reset();
        self.sampler.begin(params.register, params.fret);

        debug!(
            frequency,
            velocity,
            register = params.register,
            fret = params.fret,
            segments = params.segments,
            courant = params.courant(),
            "note started"
        );
        self.params = Some(params);
        self.state = VoiceState::Sounding;
        Ok(())
    }

    /// Returns the voice to idle and withdraws its visualization.
    fn finish(&mut self) {
        self.state = VoiceState::Idle;
        self.params = None;
        self.sampler.clear();
    }
}

impl PlayableVoice for StringVoice {
    fn can_play(&self, sound: Sound) -> bool {
        matches!(sound, Sound::PluckedString)
    }

    fn note_on(&mut self, frequency: f32, velocity: f32, _pitch_bend: i32) {
        if let Err(e) = self.start(frequency, velocity) {
            debug!(frequency, error = %e, "note rejected");
            self.finish();
        }
    }

    /// Always forces a fast decay; a tail-off release and a hard stop sound
    /// the same on a string.
    fn note_off(&mut self, _velocity: f32, _allow_tail_off: bool) {
        if self.state == VoiceState::Sounding {
            self.model.scale_damping(self.config.note_off_damping);
            debug!(uniform_loss = self.model.uniform_loss(), "note released");
        }
    }

    fn render(&mut self, output: &mut [Vec<f32>], start_sample: usize, num_samples: usize) {
        if self.state == VoiceState::Idle {
            return;
        }

        let available = output.iter().map(Vec::len).min().unwrap_or(0);
        let end = (start_sample + num_samples).min(available);

        for i in start_sample..end {
            // Capture the shape whose read point is this sample's tap.
            self.sampler.tick(self.model.displacement());
            let sample = self.model.step();

            if !sample.is_finite() {
                warn!("string output diverged, silencing voice");
                self.finish();
                return;
            }
            if self.detector.update(sample) {
                debug!("string decayed to silence");
                self.finish();
                return;
            }

            for channel in output.iter_mut() {
                channel[i] += sample;
            }
        }
    }

    fn is_active(&self) -> bool {
        self.state == VoiceState::Sounding
    }
}

/// Every voice type the engine can schedule.
pub enum Voice {
    String(StringVoice),
}

impl Voice {
    pub fn prepare(&mut self, sample_rate: f32) -> Result<()> {
        match self {
            Voice::String(voice) => voice.prepare(sample_rate),
        }
    }

    pub fn update_params(&mut self, tension: f32, sustain: f32) {
        match self {
            Voice::String(voice) => voice.update_params(tension, sustain),
        }
    }

    pub fn take_observer(&mut self) -> Option<VisualObserver> {
        match self {
            Voice::String(voice) => voice.take_observer(),
        }
    }

    pub fn visualization_snapshot(&self) -> &[f32] {
        match self {
            Voice::String(voice) => voice.visualization_snapshot(),
        }
    }

    pub fn current_register(&self) -> Option<usize> {
        match self {
            Voice::String(voice) => voice.current_register(),
        }
    }

    pub fn current_fret(&self) -> Option<i32> {
        match self {
            Voice::String(voice) => voice.current_fret(),
        }
    }
}

impl PlayableVoice for Voice {
    fn can_play(&self, sound: Sound) -> bool {
        match self {
            Voice::String(voice) => voice.can_play(sound),
        }
    }

    fn note_on(&mut self, frequency: f32, velocity: f32, pitch_bend: i32) {
        match self {
            Voice::String(voice) => voice.note_on(frequency, velocity, pitch_bend),
        }
    }

    fn note_off(&mut self, velocity: f32, allow_tail_off: bool) {
        match self {
            Voice::String(voice) => voice.note_off(velocity, allow_tail_off),
        }
    }

    fn render(&mut self, output: &mut [Vec<f32>], start_sample: usize, num_samples: usize) {
        match self {
            Voice::String(voice) => voice.render(output, start_sample, num_samples),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Voice::String(voice) => voice.is_active(),
        }
    }
}
