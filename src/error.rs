use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("frequency {0} Hz is outside the playable range")]
    OutOfRange(f32),

    #[error("string at {frequency} Hz resolves to {segments} segments, too few to simulate")]
    TooFewSegments { frequency: f32, segments: usize },

    #[error("invalid MIDI note number {0}")]
    InvalidNote(u8),

    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f32),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("audio device error: {0}")]
    Audio(String),

    #[error("MIDI input error: {0}")]
    Midi(String),
}

pub type Result<T> = std::result::Result<T, SynthError>;
