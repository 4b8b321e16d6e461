//! The cooperative main loop: controls in, MIDI in, MIDI and display out.

use crate::controls::{self, Button, ControllerState, InputEvent, Rotation, UiMode};
use crate::debounce::{DEFAULT_SETTLE, Debouncer, Edge};
use crate::display::render;
use crate::error::Result;
use crate::frame::RawFrame;
use crate::identity::{self, DeviceProfile};
use crate::io::{InputSurface, TextDisplay, Transport, show_notice};
use crate::sysex::{APP_CLOSING_BUTTON, Codec, MessageKind, SetTextDisplay};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Parameter write sent right after the inquiry reply; selects the DAW program.
pub const DAW_MODE_SELECT: MessageKind = MessageKind::WriteParameter {
    param: 0x40,
    button: 0x51,
    value: 0x00,
};

/// Value every echoed parameter write carries, whatever was received.
pub const ECHO_VALUE: u8 = 0x01;

/// Largest encoder movement acted on in one pass, in steps either way.
pub const MAX_ENCODER_STEPS: i32 = 16;

/// Any frame carrying this text puts the controller into DAW mode.
pub const DAW_DETECT_TEXT: &str = "MiniDexed";

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Answer every parameter write with a write of [`ECHO_VALUE`] to the same button.
    pub echo_parameter_writes: bool,
    /// Button debounce interval.
    pub settle: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            echo_parameter_writes: false,
            settle: DEFAULT_SETTLE,
        }
    }
}

pub struct Dispatcher {
    profile: &'static DeviceProfile,
    codec: Codec,
    options: DispatchOptions,
    buttons: [(Button, Debouncer); 3],
    last_encoder: Option<i32>,
}

impl Dispatcher {
    pub fn new(profile: &'static DeviceProfile, options: DispatchOptions) -> Self {
        Self {
            profile,
            codec: profile.codec(),
            options,
            buttons: Button::ALL.map(|b| (b, Debouncer::new(options.settle))),
            last_encoder: None,
        }
    }

    pub fn profile(&self) -> &'static DeviceProfile {
        self.profile
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Takes the current control levels as the starting point, so buttons
    /// held at boot and the encoder's resting position produce no events.
    pub fn prime<I: InputSurface + ?Sized>(&mut self, input: &I) {
        for (button, debouncer) in self.buttons.iter_mut() {
            *debouncer = Debouncer::with_level(self.options.settle, input.button_state(*button));
        }
        self.last_encoder = Some(input.encoder_position());
    }

    pub fn show_splash<D: TextDisplay + ?Sized>(
        &self,
        state: &ControllerState,
        display: &mut D,
    ) -> Result<()> {
        show_notice(display, self.profile.product_name, &format!("{} mode", state.mode))
    }

    /// One pass of the loop: encoder, buttons, then at most one inbound frame.
    pub fn run_once<T, D, I>(
        &mut self,
        state: &mut ControllerState,
        transport: &mut T,
        display: &mut D,
        input: &mut I,
        now: Instant,
    ) -> Result<()>
    where
        T: Transport + ?Sized,
        D: TextDisplay + ?Sized,
        I: InputSurface + ?Sized,
    {
        input.poll()?;

        let position = input.encoder_position();
        if let Some(last) = self.last_encoder {
            let delta = position
                .wrapping_sub(last)
                .clamp(-MAX_ENCODER_STEPS, MAX_ENCODER_STEPS);
            for rotation in Rotation::steps(delta) {
                self.handle_input(state, InputEvent::Turned(rotation), transport)?;
            }
        }
        self.last_encoder = Some(position);

        let mut events = Vec::new();
        for (button, debouncer) in self.buttons.iter_mut() {
            match debouncer.update(input.button_state(*button), now) {
                Some(Edge::Pressed) => events.push(InputEvent::Pressed(*button)),
                Some(Edge::Released) => events.push(InputEvent::Released(*button)),
                None => {}
            }
        }
        for event in events {
            self.handle_input(state, event, transport)?;
        }

        if let Some(frame) = transport.receive() {
            self.handle_frame(state, &frame, transport, display)?;
        }
        Ok(())
    }

    pub fn handle_input<T: Transport + ?Sized>(
        &self,
        state: &mut ControllerState,
        event: InputEvent,
        transport: &mut T,
    ) -> Result<()> {
        let (next, out) = controls::step(*state, event);
        debug!(?event, ?out, "input");
        if next.in_menu != state.in_menu {
            debug!(in_menu = next.in_menu, "menu");
        }
        *state = next;
        for message in &out {
            self.send(transport, message)?;
        }
        Ok(())
    }

    /// Acts on one inbound frame and returns what it decoded to.
    pub fn handle_frame<T, D>(
        &self,
        state: &mut ControllerState,
        frame: &RawFrame,
        transport: &mut T,
        display: &mut D,
    ) -> Result<MessageKind>
    where
        T: Transport + ?Sized,
        D: TextDisplay + ?Sized,
    {
        trace!(%frame, "received");

        if frame.contains_text(DAW_DETECT_TEXT) && state.mode != UiMode::Daw {
            info!(from = %state.mode, "{DAW_DETECT_TEXT} detected, switching to DAW mode");
            state.mode = UiMode::Daw;
        }

        let kind = self.codec.decode(frame);
        match &kind {
            MessageKind::DeviceInquiryRequest => self.answer_inquiry(transport, display)?,
            MessageKind::SetTextDisplay(text) => self.show_text(text, display)?,
            MessageKind::WriteParameter { button, .. } if *button == APP_CLOSING_BUTTON => {
                info!("AnalogLab is closing");
                show_notice(display, "AnalogLab", "closing...")?;
            }
            MessageKind::WriteParameter { param, button, value } => {
                debug!(param, button, value, "parameter write");
                if self.options.echo_parameter_writes {
                    let echo = MessageKind::WriteParameter {
                        param: *param,
                        button: *button,
                        value: ECHO_VALUE,
                    };
                    self.send(transport, &echo)?;
                }
            }
            MessageKind::ReadParameter { param, button } => {
                debug!(param, button, "parameter read");
            }
            MessageKind::MackieTerminate => {
                info!("Mackie Control session terminated");
                show_notice(display, "Mackie session", "terminated")?;
            }
            MessageKind::DeviceInquiryResponse(reply) => {
                debug!(?reply, "inquiry reply from another device");
            }
            MessageKind::ControlChange { .. }
            | MessageKind::NoteOn { .. }
            | MessageKind::NoteOff { .. } => {
                trace!(?kind, "channel message");
            }
            MessageKind::Unrecognized => {
                debug!(%frame, "unrecognized frame");
            }
        }
        Ok(kind)
    }

    fn answer_inquiry<T, D>(&self, transport: &mut T, display: &mut D) -> Result<()>
    where
        T: Transport + ?Sized,
        D: TextDisplay + ?Sized,
    {
        show_notice(display, "Received device", "inquiry")?;
        match identity::response_for(self.profile) {
            Ok(reply) => {
                info!(product = self.profile.product_name, "answering device inquiry");
                self.send(transport, &MessageKind::DeviceInquiryResponse(reply))?;
                self.send(transport, &DAW_MODE_SELECT)
            }
            Err(err) => {
                warn!(%err, "cannot answer device inquiry");
                show_notice(display, "Unsupported model", self.profile.product_name)
            }
        }
    }

    fn show_text<D>(&self, text: &SetTextDisplay, display: &mut D) -> Result<()>
    where
        D: TextDisplay + ?Sized,
    {
        let rendered = render(text, self.profile);
        debug!(line1 = %rendered.line1, line2 = %rendered.line2, "set text");
        for glyph in &rendered.glyphs {
            display.define_glyph(glyph.slot, glyph.bitmap)?;
        }
        show_notice(display, &rendered.line1, &rendered.line2)
    }

    fn send<T: Transport + ?Sized>(&self, transport: &mut T, message: &MessageKind) -> Result<()> {
        match self.codec.encode(message) {
            Some(frame) => {
                trace!(%frame, "sending");
                transport.send(&frame)
            }
            None => Ok(()),
        }
    }
}
