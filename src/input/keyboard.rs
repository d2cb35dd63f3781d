use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::params::{ParamEvent, ParamId, StepDirection};
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use tracing::{debug, error};

/// Keys that nudge a parameter, with the parameter and direction.
const CONTROL_KEYS: [(Keycode, ParamId, StepDirection); 4] = [
    (Keycode::Comma, ParamId::Tension, StepDirection::Down),
    (Keycode::Dot, ParamId::Tension, StepDirection::Up),
    (Keycode::Minus, ParamId::Sustain, StepDirection::Down),
    (Keycode::Equal, ParamId::Sustain, StepDirection::Up),
];

pub struct KeyboardHandler {
    device_state: DeviceState,
    key_states: HashMap<Keycode, bool>,
    key_to_note: HashMap<Keycode, u8>,
    control_keys: HashMap<Keycode, bool>, // Track control keys separately
    note_sender: Sender<NoteEvent>,
    param_sender: Sender<ParamEvent>,
}

impl KeyboardHandler {
    pub fn new(note_sender: Sender<NoteEvent>, param_sender: Sender<ParamEvent>) -> Self {
        let device_state = DeviceState::new();

        // Define keyboard to note mapping
        let key_to_note: HashMap<Keycode, u8> = [
            // Bottom row - natural notes (A, B, C, D, E, F, G, A, B, C)
            (Keycode::A, 57),         // A3
            (Keycode::S, 59),         // B3
            (Keycode::D, 60),         // C4
            (Keycode::F, 62),         // D4
            (Keycode::G, 64),         // E4
            (Keycode::H, 65),         // F4
            (Keycode::J, 67),         // G4
            (Keycode::K, 69),         // A4
            (Keycode::L, 71),         // B4
            (Keycode::Semicolon, 72), // C5
            // Top row - sharp/flat notes
            (Keycode::W, 58),           // A#3/Bb3
            (Keycode::R, 61),           // C#4/Db4
            (Keycode::T, 63),           // D#4/Eb4
            (Keycode::U, 66),           // F#4/Gb4
            (Keycode::I, 68),           // G#4/Ab4
            (Keycode::O, 70),           // A#4/Bb4
            (Keycode::LeftBracket, 73), // C#5/Db5
        ]
        .iter()
        .cloned()
        .collect();

        let key_states = key_to_note.keys().map(|key| (*key, false)).collect();
        let control_keys = CONTROL_KEYS.iter().map(|(key, _, _)| (*key, false)).collect();

        Self {
            device_state,
            key_states,
            key_to_note,
            control_keys,
            note_sender,
            param_sender,
        }
    }

    pub fn update(&mut self) {
        let keys: Vec<Keycode> = self.device_state.get_keys();

        for (key, note) in &self.key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = self.key_states.get(key).cloned().unwrap_or(false);

            if is_pressed != was_pressed {
                debug!(?key, note, pressed = is_pressed, "note key");
                let velocity = if is_pressed { 100 } else { 0 };
                if let Ok(event) = NoteEvent::new(*note, velocity, is_pressed, NoteSource::Keyboard) {
                    if let Err(e) = self.note_sender.send(event) {
                        error!("error sending note event: {}", e);
                    }
                }
                self.key_states.insert(*key, is_pressed);
            }
        }

        for (key, param, direction) in CONTROL_KEYS {
            let is_pressed = keys.contains(&key);
            let was_pressed = self.control_keys.get(&key).cloned().unwrap_or(false);

            if is_pressed && !was_pressed {
                debug!(?param, ?direction, "parameter key");
                if let Err(e) = self.param_sender.send(ParamEvent::Nudge { param, direction }) {
                    error!("error sending parameter event: {}", e);
                }
            }

            self.control_keys.insert(key, is_pressed);
        }
    }
}
