use crate::error::{Result, SynthError};

/// Where a note event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSource {
    Keyboard,
    Midi,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note_number: u8,
    pub velocity: u8,
    pub frequency: f32,
    pub is_on: bool,
    pub source: NoteSource,
}

impl NoteEvent {
    pub fn new(note_number: u8, velocity: u8, is_on: bool, source: NoteSource) -> Result<Self> {
        if note_number > 127 {
            return Err(SynthError::InvalidNote(note_number));
        }
        Ok(Self {
            note_number,
            velocity: velocity.min(127),
            frequency: note_to_hz(note_number),
            is_on,
            source,
        })
    }
}

/// Equal-tempered frequency of a MIDI note, A4 = 440 Hz.
pub fn note_to_hz(note_number: u8) -> f32 {
    440.0 * 2f32.powf((f32::from(note_number) - 69.0) / 12.0)
}
