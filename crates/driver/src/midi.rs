use anyhow::{Context, anyhow};
use keylab_library::io::Transport;
use keylab_library::{Error, RawFrame, Result};
use midir::os::unix::{VirtualInput, VirtualOutput};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::mpsc::{self, Receiver};
use tracing::{info, warn};

/// A pair of virtual ports named like the emulated product, so the DAW finds
/// them the way it finds the real keyboard.
pub(crate) struct MidirTransport {
    port: MidiOutputConnection,
    _input: MidiInputConnection<()>,
    inbox: Receiver<RawFrame>,
}

impl MidirTransport {
    pub fn open(client_name: &str, port_name: &str) -> anyhow::Result<Self> {
        let output = MidiOutput::new(client_name).context("Couldn't open MIDI output")?;
        let port = output
            .create_virtual(port_name)
            .map_err(|e| anyhow!("Couldn't create virtual output port: {e}"))?;

        let mut input =
            MidiInput::new(&format!("{client_name} In")).context("Couldn't open MIDI input")?;
        // SysEx is the whole point.
        input.ignore(Ignore::None);

        let (tx, inbox) = mpsc::channel();
        let connection = input
            .create_virtual(
                port_name,
                move |_stamp, message, _| {
                    if tx.send(RawFrame::from(message)).is_err() {
                        warn!("MIDI message dropped, receiver is gone");
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Couldn't create virtual input port: {e}"))?;

        info!(client = client_name, port = port_name, "MIDI ports created");
        Ok(Self {
            port,
            _input: connection,
            inbox,
        })
    }
}

impl Transport for MidirTransport {
    fn receive(&mut self) -> Option<RawFrame> {
        self.inbox.try_recv().ok()
    }

    fn send(&mut self, frame: &RawFrame) -> Result<()> {
        self.port
            .send(frame.as_bytes())
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
