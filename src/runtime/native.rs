use crate::audio::{AudioBackend, CpalBackend};
use crate::error::Result;
use crate::input::{KeyboardHandler, MidiHandler};
use crate::synth::note::NoteEvent;
use crate::synth::params::ParamEvent;
use crate::synth::visual::VisualObserver;
use crate::synth::{Synth, SynthConfig};
use std::sync::mpsc::channel;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tracing::{info, trace};

/// Refresh period of the string-shape display.
const DISPLAY_PERIOD: Duration = Duration::from_millis(16);

/// Native runtime synth implementation for desktop/CPAL backends.
/// Owned by the audio callback; events arrive over channels.
pub struct NativeSynth {
    synth: Synth,
    note_receiver: Receiver<NoteEvent>,
    param_receiver: Receiver<ParamEvent>,
    planar: Vec<Vec<f32>>,
}

impl NativeSynth {
    pub fn new(
        synth: Synth,
        note_receiver: Receiver<NoteEvent>,
        param_receiver: Receiver<ParamEvent>,
    ) -> Self {
        Self {
            synth,
            note_receiver,
            param_receiver,
            planar: Vec::new(),
        }
    }

    /// Prepares the engine and preallocates the planar mix buffer.
    pub fn prepare(&mut self, sample_rate: f32, buffer_size: usize) -> Result<()> {
        self.synth.prepare(sample_rate, buffer_size)?;
        self.planar = vec![vec![0.0; buffer_size]; self.synth.config.channels];
        Ok(())
    }

    pub fn take_visual_observers(&mut self) -> Vec<VisualObserver> {
        self.synth.take_visual_observers()
    }

    /// Renders into an interleaved device buffer with `channels` channels.
    pub fn process(&mut self, data: &mut [f32], channels: usize) {
        self.process_note_events();
        self.process_param_events();

        let frames = data.len() / channels.max(1);
        if self.planar.iter().any(|channel| channel.len() != frames) {
            // Only happens when the device changes its block size.
            for channel in self.planar.iter_mut() {
                channel.resize(frames, 0.0);
            }
        }
        self.synth.process(&mut self.planar);

        let last = self.planar.len().saturating_sub(1);
        for (i, frame) in data.chunks_mut(channels.max(1)).enumerate() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = self.planar.get(ch.min(last)).map_or(0.0, |buf| buf[i]);
            }
        }
    }

    fn process_note_events(&mut self) {
        while let Ok(event) = self.note_receiver.try_recv() {
            if event.is_on {
                self.synth.note_on(&event);
            } else {
                self.synth.note_off(&event);
            }
        }
    }

    fn process_param_events(&mut self) {
        while let Ok(event) = self.param_receiver.try_recv() {
            self.synth.apply_param_event(&event);
        }
    }
}

/// Polls every voice's visualization at display rate and traces what it sees.
fn spawn_display(mut observers: Vec<VisualObserver>) {
    std::thread::spawn(move || loop {
        for (voice, observer) in observers.iter_mut().enumerate() {
            if let Some(frame) = observer.snapshot() {
                let peak = frame
                    .displacement()
                    .iter()
                    .fold(0.0f32, |peak, x| peak.max(x.abs()));
                trace!(
                    voice,
                    register = frame.register(),
                    fret = frame.fret(),
                    peak,
                    "string shape"
                );
            }
        }
        std::thread::sleep(DISPLAY_PERIOD);
    });
}

pub fn start(config: SynthConfig) -> Result<()> {
    let (note_tx, note_rx) = channel();
    let (param_tx, param_rx) = channel();

    let mut synth = NativeSynth::new(Synth::new(config), note_rx, param_rx);
    spawn_display(synth.take_visual_observers());

    let mut audio_backend = CpalBackend::new(synth);
    audio_backend.start()?;
    info!("audio started");

    let mut keyboard_handler = KeyboardHandler::new(note_tx.clone(), param_tx);
    let mut midi_handler = MidiHandler::new(note_tx);

    loop {
        keyboard_handler.update();
        midi_handler.update();
        std::thread::sleep(Duration::from_millis(5));
    }
}
