pub mod error;
pub mod runtime;
pub mod synth;

#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
pub mod audio;
#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
pub mod input;

pub use error::{Result, SynthError};
