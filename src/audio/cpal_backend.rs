use crate::audio::AudioBackend;
use crate::error::{Result, SynthError};
use crate::runtime::NativeSynth;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use tracing::{error, info};

fn audio_err(e: impl std::fmt::Display) -> SynthError {
    SynthError::Audio(e.to_string())
}

pub struct CpalBackend {
    stream: Option<Stream>,
    synth: Option<NativeSynth>,
}

impl CpalBackend {
    pub fn new(synth: NativeSynth) -> Self {
        Self {
            stream: None,
            synth: Some(synth),
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device> {
        if cfg!(target_os = "linux") {
            self.select_linux_output_device(host)
        } else {
            host.default_output_device()
                .ok_or_else(|| audio_err("no output device available"))
        }
    }

    fn select_linux_output_device(&self, host: &cpal::Host) -> Result<cpal::Device> {
        let mut device_names = Vec::new();

        for device in host.devices().map_err(audio_err)? {
            let name = device.name().unwrap_or_default();
            if name.to_lowercase().starts_with("default:")
                || name.to_lowercase().contains("pipewire")
            {
                device_names.push(name);
            }
        }

        if device_names.is_empty() {
            return host
                .default_output_device()
                .ok_or_else(|| audio_err("no output device available"));
        }

        println!("Available output devices:");
        for (i, name) in device_names.iter().enumerate() {
            println!("{}. {}", i + 1, name);
        }

        println!("Select device (default 1): ");
        let mut choice = String::new();
        std::io::stdin().read_line(&mut choice).map_err(audio_err)?;
        let choice = choice
            .trim()
            .parse::<usize>()
            .unwrap_or(1)
            .saturating_sub(1);

        let selected_name = device_names
            .get(choice)
            .ok_or_else(|| audio_err("invalid device selection"))?;

        host.devices()
            .map_err(audio_err)?
            .find(|d| d.name().map(|n| n == *selected_name).unwrap_or(false))
            .ok_or_else(|| audio_err("selected output device not found"))
    }

    /// Plays a silent stream briefly to learn the block size the device uses.
    fn determine_buffer_size(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        sample_format: SampleFormat,
    ) -> Result<usize> {
        let channels = config.channels as usize;
        let (buffer_size_sender, buffer_size_receiver) = std::sync::mpsc::channel();

        let stream = match sample_format {
            SampleFormat::F32 => device
                .build_output_stream(
                    config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        data.fill(0.0);
                        let _ = buffer_size_sender.send(data.len() / channels);
                    },
                    |err| error!("stream error: {}", err),
                    None,
                )
                .map_err(audio_err)?,
            _ => return Err(audio_err("unsupported sample format")),
        };

        stream.play().map_err(audio_err)?;
        let buffer_size = buffer_size_receiver.recv().map_err(audio_err)?;
        stream.pause().map_err(audio_err)?;

        Ok(buffer_size)
    }

    fn build_stream(&mut self) -> Result<Stream> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!(device = %device.name().unwrap_or_default(), "selected output device");

        let supported_config = device.default_output_config().map_err(audio_err)?;
        let mut stream_config: cpal::StreamConfig = supported_config.clone().into();
        stream_config.buffer_size = cpal::BufferSize::Fixed(256);

        let buffer_size =
            self.determine_buffer_size(&device, &stream_config, supported_config.sample_format())?;

        let sample_rate = stream_config.sample_rate.0 as f32;
        let channels = stream_config.channels as usize;
        let mut synth = self
            .synth
            .take()
            .ok_or_else(|| audio_err("stream already started"))?;
        synth.prepare(sample_rate, buffer_size)?;
        info!(sample_rate, channels, buffer_size, "stream configured");

        let stream = match supported_config.sample_format() {
            SampleFormat::F32 => device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        synth.process(data, channels);
                    },
                    |err| error!("stream error: {}", err),
                    None,
                )
                .map_err(audio_err)?,
            _ => return Err(audio_err("unsupported sample format")),
        };

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<()> {
        let stream = self.build_stream()?;
        stream.play().map_err(audio_err)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream.pause().map_err(audio_err)?;
        }
        Ok(())
    }
}
