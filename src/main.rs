use rustfdtdsynth::runtime::native;
use rustfdtdsynth::synth::SynthConfig;
use tracing_subscriber::EnvFilter;

fn main() -> rustfdtdsynth::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Optional JSON config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => SynthConfig::from_json_file(path)?,
        None => SynthConfig::default(),
    };

    native::start(config)
}
