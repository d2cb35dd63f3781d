//! The plucked-string voice engine.
//!
//! - [`strings`]: register selection and per-note physical parameters
//! - [`excitation`]: initial velocity profiles and loudness normalization
//! - [`string_model`]: finite-difference string simulation
//! - [`envelope`]: silence detection on the voice output
//! - [`visual`]: lock-free string-shape snapshots for displays
//! - [`voice`]: the voice lifecycle
//! - [`core`](self::core): voice pool, tone filter and output gain

pub mod config;
pub mod core;
pub mod envelope;
pub mod excitation;
pub mod filter;
pub mod note;
pub mod params;
pub mod string_model;
pub mod strings;
pub mod visual;
pub mod voice;
pub mod voice_config;

pub use self::config::SynthConfig;
pub use self::core::Synth;
pub use self::voice::{PlayableVoice, Sound, StringVoice, Voice, VoiceState};
