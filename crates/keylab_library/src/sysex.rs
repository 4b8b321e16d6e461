//! Arturia SysEx codec.
//!
//! AnalogLab talks to the controller with a small vendor family of SysEx
//! messages (`F0 00 20 6B 7F 42 ...`), the universal device inquiry and one
//! Mackie Control message. Everything else that arrives is treated as a plain
//! channel-voice message or ignored. Decoding never fails: anything that does
//! not match a known shape becomes [`MessageKind::Unrecognized`].

use crate::frame::RawFrame;
use midly::live::LiveEvent;
use midly::num::{u4, u7};
use midly::MidiMessage;
use std::fmt;

/// `F0`, Arturia manufacturer id, "all devices", Arturia message family.
pub const VENDOR_HEADER: [u8; 6] = [0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42];
pub const DEVICE_INQUIRY_REQUEST: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];
pub const MACKIE_TERMINATE: [u8; 8] = [0xF0, 0x00, 0x00, 0x66, 0x14, 0x08, 0x00, 0xF7];

/// `button` value of a parameter write that means AnalogLab is shutting down.
pub const APP_CLOSING_BUTTON: u8 = 89;

const SYSEX_END: u8 = 0xF7;
const ARTURIA_ID: [u8; 3] = [0x00, 0x20, 0x6B];
const INQUIRY_REPLY_PREFIX: [u8; 5] = [0xF0, 0x7E, 0x7F, 0x06, 0x02];
const INQUIRY_REPLY_LEN: usize = 17;

const CMD_READ: [u8; 2] = [0x01, 0x00];
const CMD_WRITE: [u8; 2] = [0x02, 0x00];

const TEXT_COMMAND: u8 = 0x04;
const TEXT_MARKER: u8 = 0x60;

const FIELD_INSTRUMENT: u8 = 0x01;
const FIELD_NAME: u8 = 0x02;
const FIELD_KIND: u8 = 0x03;
const FIELD_HEART: u8 = 0x04;
const FIELD_END: [u8; 2] = [0x00, SYSEX_END];
const HEART_ON: [u8; 2] = [0x46, 0x20];

/// How a set-text message is introduced after the vendor header: the `04`
/// command, then the `60` marker at a product-specific index.
///
/// Essential and MkII share the standard layout (`04 xx 60`, marker at 8)
/// and accept any byte between command and marker; they only differ in what
/// they write there. Compact products put the marker right after the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFraming {
    /// `04 00 60`
    Essential,
    /// `04 02 60`
    MkII,
    /// `04 60`
    Compact,
}

impl TextFraming {
    fn prefix(self) -> &'static [u8] {
        match self {
            TextFraming::Essential => &[TEXT_COMMAND, 0x00, TEXT_MARKER],
            TextFraming::MkII => &[TEXT_COMMAND, 0x02, TEXT_MARKER],
            TextFraming::Compact => &[TEXT_COMMAND, TEXT_MARKER],
        }
    }

    /// Index of the `60` marker in a full frame.
    pub fn marker_at(self) -> usize {
        match self {
            TextFraming::Essential | TextFraming::MkII => 8,
            TextFraming::Compact => 7,
        }
    }

    /// Index of the first field byte if `frame` is a set-text message in this framing.
    fn fields_start(self, frame: &RawFrame) -> Option<usize> {
        let marker_at = self.marker_at();
        let is_text = frame.get(VENDOR_HEADER.len()) == Some(TEXT_COMMAND)
            && frame.get(marker_at) == Some(TEXT_MARKER);
        is_text.then_some(marker_at + 1)
    }
}

/// Text carried by one set-text field, one character per received byte.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct TextField(String);

impl TextField {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|&b| char::from(b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire bytes; characters outside a single byte are sent as `?`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect()
    }
}

impl From<&str> for TextField {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetTextDisplay {
    pub instrument: Option<TextField>,
    pub name: Option<TextField>,
    pub kind: Option<TextField>,
    pub heart: bool,
}

/// Identification bytes of a device inquiry reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InquiryReply {
    /// Family (2 bytes) followed by model (2 bytes).
    pub model_code: [u8; 4],
    pub firmware: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    DeviceInquiryRequest,
    DeviceInquiryResponse(InquiryReply),
    SetTextDisplay(SetTextDisplay),
    ReadParameter { param: u8, button: u8 },
    WriteParameter { param: u8, button: u8, value: u8 },
    MackieTerminate,
    ControlChange { number: u8, value: u8 },
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    Unrecognized,
}

/// Decoder and encoder for one emulated product's dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    framing: TextFraming,
}

impl Codec {
    pub fn new(framing: TextFraming) -> Self {
        Self { framing }
    }

    pub fn framing(&self) -> TextFraming {
        self.framing
    }

    pub fn decode(&self, frame: &RawFrame) -> MessageKind {
        let bytes = frame.as_bytes();

        if bytes == DEVICE_INQUIRY_REQUEST {
            return MessageKind::DeviceInquiryRequest;
        }
        if bytes == MACKIE_TERMINATE {
            return MessageKind::MackieTerminate;
        }
        if let Some(reply) = decode_inquiry_reply(bytes) {
            return MessageKind::DeviceInquiryResponse(reply);
        }
        if frame.starts_with(&VENDOR_HEADER) {
            return self.decode_vendor(frame);
        }
        decode_channel_voice(bytes)
    }

    fn decode_vendor(&self, frame: &RawFrame) -> MessageKind {
        if let Some(start) = self.framing.fields_start(frame) {
            return MessageKind::SetTextDisplay(decode_set_text(frame, start));
        }

        let bytes = frame.as_bytes();
        let command = &bytes[VENDOR_HEADER.len()..];
        match (command.get(..2), command.get(2..)) {
            (Some(cmd), Some(&[param, button, ..])) if cmd == CMD_READ => {
                MessageKind::ReadParameter { param, button }
            }
            (Some(cmd), Some(&[param, button, value, ..])) if cmd == CMD_WRITE => {
                MessageKind::WriteParameter { param, button, value }
            }
            _ => MessageKind::Unrecognized,
        }
    }

    /// Wire form of `kind`, or `None` for [`MessageKind::Unrecognized`].
    ///
    /// Channel messages go out on MIDI channel 1; data bytes above 127 are
    /// masked to seven bits.
    pub fn encode(&self, kind: &MessageKind) -> Option<RawFrame> {
        let mut out = Vec::new();
        match kind {
            MessageKind::DeviceInquiryRequest => out.extend_from_slice(&DEVICE_INQUIRY_REQUEST),
            MessageKind::DeviceInquiryResponse(reply) => {
                out.extend_from_slice(&INQUIRY_REPLY_PREFIX);
                out.extend_from_slice(&ARTURIA_ID);
                out.extend_from_slice(&reply.model_code);
                out.extend_from_slice(&reply.firmware);
                out.push(SYSEX_END);
            }
            MessageKind::SetTextDisplay(text) => {
                out.extend_from_slice(&VENDOR_HEADER);
                out.extend_from_slice(self.framing.prefix());
                for (marker, field) in [
                    (FIELD_INSTRUMENT, &text.instrument),
                    (FIELD_NAME, &text.name),
                    (FIELD_KIND, &text.kind),
                ] {
                    if let Some(field) = field {
                        out.push(marker);
                        out.extend(field.to_bytes());
                        out.push(0x00);
                    }
                }
                if text.heart {
                    out.push(FIELD_HEART);
                    out.extend_from_slice(&HEART_ON);
                    out.push(0x00);
                }
                out.push(SYSEX_END);
            }
            MessageKind::ReadParameter { param, button } => {
                out.extend_from_slice(&VENDOR_HEADER);
                out.extend_from_slice(&CMD_READ);
                out.extend_from_slice(&[*param, *button, SYSEX_END]);
            }
            MessageKind::WriteParameter { param, button, value } => {
                out.extend_from_slice(&VENDOR_HEADER);
                out.extend_from_slice(&CMD_WRITE);
                out.extend_from_slice(&[*param, *button, *value, SYSEX_END]);
            }
            MessageKind::MackieTerminate => out.extend_from_slice(&MACKIE_TERMINATE),
            MessageKind::ControlChange { number, value } => write_channel(
                &mut out,
                MidiMessage::Controller {
                    controller: u7::from_int_lossy(*number),
                    value: u7::from_int_lossy(*value),
                },
            )?,
            MessageKind::NoteOn { note, velocity } => write_channel(
                &mut out,
                MidiMessage::NoteOn {
                    key: u7::from_int_lossy(*note),
                    vel: u7::from_int_lossy(*velocity),
                },
            )?,
            MessageKind::NoteOff { note } => write_channel(
                &mut out,
                MidiMessage::NoteOff {
                    key: u7::from_int_lossy(*note),
                    vel: u7::from_int_lossy(0),
                },
            )?,
            MessageKind::Unrecognized => return None,
        }
        Some(RawFrame::new(out))
    }
}

fn decode_set_text(frame: &RawFrame, start: usize) -> SetTextDisplay {
    let mut cursor = frame.cursor(start);
    let instrument = cursor
        .field_after(FIELD_INSTRUMENT, &FIELD_END)
        .map(TextField::from_bytes);
    let name = cursor
        .field_after(FIELD_NAME, &FIELD_END)
        .map(TextField::from_bytes);
    let kind = cursor
        .field_after(FIELD_KIND, &FIELD_END)
        .map(TextField::from_bytes);
    let heart = cursor
        .field_after(FIELD_HEART, &FIELD_END)
        .is_some_and(|payload| payload == HEART_ON);

    SetTextDisplay {
        instrument,
        name,
        kind,
        heart,
    }
}

fn decode_inquiry_reply(bytes: &[u8]) -> Option<InquiryReply> {
    if bytes.len() != INQUIRY_REPLY_LEN || bytes[INQUIRY_REPLY_LEN - 1] != SYSEX_END {
        return None;
    }
    // Byte 2 is the device id, any value is accepted.
    if bytes[..2] != INQUIRY_REPLY_PREFIX[..2] || bytes[3..5] != INQUIRY_REPLY_PREFIX[3..] {
        return None;
    }
    if bytes[5..8] != ARTURIA_ID {
        return None;
    }
    let mut reply = InquiryReply {
        model_code: [0; 4],
        firmware: [0; 4],
    };
    reply.model_code.copy_from_slice(&bytes[8..12]);
    reply.firmware.copy_from_slice(&bytes[12..16]);
    Some(reply)
}

fn decode_channel_voice(bytes: &[u8]) -> MessageKind {
    // No running status: a frame always starts with its own status byte.
    if bytes.first().is_none_or(|&status| status < 0x80) {
        return MessageKind::Unrecognized;
    }
    match LiveEvent::parse(bytes) {
        Ok(LiveEvent::Midi { message, .. }) => match message {
            MidiMessage::Controller { controller, value } => MessageKind::ControlChange {
                number: controller.as_int(),
                value: value.as_int(),
            },
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => MessageKind::NoteOff {
                note: key.as_int(),
            },
            MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, .. } => MessageKind::NoteOff { note: key.as_int() },
            _ => MessageKind::Unrecognized,
        },
        _ => MessageKind::Unrecognized,
    }
}

fn write_channel(out: &mut Vec<u8>, message: MidiMessage) -> Option<()> {
    let event = LiveEvent::Midi {
        channel: u4::from_int_lossy(0),
        message,
    };
    event.write_std(out).ok()
}
