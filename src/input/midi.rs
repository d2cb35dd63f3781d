use crate::error::{Result, SynthError};
use crate::synth::note::{NoteEvent, NoteSource};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use std::io::{stdin, stdout, Write};
use std::sync::mpsc::Sender;
use std::sync::mpsc::{self, Receiver};
use tracing::{error, info, warn};

fn midi_err(e: impl std::fmt::Display) -> SynthError {
    SynthError::Midi(e.to_string())
}

pub struct MidiHandler {
    /// Holds the connection to keep it alive
    #[allow(dead_code)]
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<(u8, u8, u8)>>, // (status, data1, data2)
    note_sender: Sender<NoteEvent>,
}

impl MidiHandler {
    pub fn new(note_sender: Sender<NoteEvent>) -> Self {
        match Self::try_new(note_sender.clone()) {
            Ok(handler) => handler,
            Err(e) => {
                warn!("failed to initialize MIDI: {}; MIDI input disabled", e);
                Self {
                    connection: None,
                    receiver: None,
                    note_sender,
                }
            }
        }
    }

    fn try_new(note_sender: Sender<NoteEvent>) -> Result<Self> {
        let midi_in = MidiInput::new("RustFDTDSynth Input").map_err(midi_err)?;
        let port = Self::select_input_port(&midi_in)?;
        let port_name = midi_in.port_name(&port).map_err(midi_err)?;

        let (sender, receiver) = mpsc::channel();

        let connection = midi_in
            .connect(
                &port,
                "midir-read-input",
                move |_, message, _| {
                    if message.len() >= 3 {
                        let _ = sender.send((message[0], message[1], message[2]));
                    }
                },
                (),
            )
            .map_err(midi_err)?;

        info!(port = %port_name, "opened MIDI port");

        Ok(Self {
            connection: Some(connection),
            receiver: Some(receiver),
            note_sender,
        })
    }

    fn select_input_port(midi_in: &MidiInput) -> Result<MidiInputPort> {
        let in_ports = midi_in.ports();
        if in_ports.is_empty() {
            return Err(midi_err("no input ports found"));
        }

        println!("Available MIDI input ports:");
        for (i, port) in in_ports.iter().enumerate() {
            println!("{}: {}", i, midi_in.port_name(port).map_err(midi_err)?);
        }

        print!("Select MIDI input port: ");
        stdout().flush().map_err(midi_err)?;
        let mut input = String::new();
        stdin().read_line(&mut input).map_err(midi_err)?;
        let selection = input.trim().parse::<usize>().unwrap_or(0);

        in_ports
            .get(selection)
            .cloned()
            .ok_or_else(|| midi_err("invalid port selection"))
    }

    pub fn update(&mut self) {
        if let Some(receiver) = &self.receiver {
            while let Ok((status, data1, data2)) = receiver.try_recv() {
                let note_on = status & 0xF0 == 0x90 && data2 > 0;
                let note_off = (status & 0xF0 == 0x80) || (status & 0xF0 == 0x90 && data2 == 0);

                let result = if note_on {
                    NoteEvent::new(data1, data2, true, NoteSource::Midi)
                } else if note_off {
                    NoteEvent::new(data1, data2, false, NoteSource::Midi)
                } else {
                    continue;
                };

                if let Ok(event) = result {
                    if let Err(e) = self.note_sender.send(event) {
                        error!("failed to send MIDI note event: {}", e);
                    }
                }
            }
        }
    }
}
