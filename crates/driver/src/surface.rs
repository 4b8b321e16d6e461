//! The Maschine Mikro MK3 as a KeyLab: three of its buttons, its encoder and
//! its screen.

use crate::lcd::Lcd;
use hidapi::{HidDevice, HidError};
use keylab_library::controls::Button;
use keylab_library::io::{InputSurface, TextDisplay};
use keylab_library::{Error, Result};
use tracing::trace;

pub(crate) const VID: u16 = 0x17cc;
pub(crate) const PID: u16 = 0x1700;

const BUTTON_REPORT: u8 = 0x01;
pub(crate) const BUTTON_BITS: usize = 48;

/// Bit positions of the emulated buttons in the button report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ButtonMap {
    pub category: usize,
    pub preset: usize,
    pub enter: usize,
}

impl ButtonMap {
    fn bit(&self, button: Button) -> usize {
        match button {
            Button::Category => self.category,
            Button::Preset => self.preset,
            Button::Enter => self.enter,
        }
    }
}

/// Decoded button report: raw button bits plus the 4-bit absolute encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ButtonReport {
    bits: [bool; BUTTON_BITS],
    encoder: u8,
}

impl ButtonReport {
    fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < 8 || buf[0] != BUTTON_REPORT {
            return None;
        }
        let mut bits = [false; BUTTON_BITS];
        for i in 0..6 {
            // bytes
            for j in 0..8 {
                // bits
                bits[i * 8 + j] = (buf[i + 1] & (1 << j)) > 0;
            }
        }
        Some(Self {
            bits,
            encoder: buf[7] & 0x0f,
        })
    }
}

/// Signed step between two absolute 4-bit encoder readings, in -8..=7.
fn encoder_delta(prev: u8, cur: u8) -> i32 {
    let diff = cur.wrapping_sub(prev) & 0x0f;
    if diff < 8 { diff as i32 } else { diff as i32 - 16 }
}

pub(crate) struct MaschineControls<'a> {
    device: &'a HidDevice,
    map: ButtonMap,
    bits: [bool; BUTTON_BITS],
    encoder_raw: Option<u8>,
    encoder_position: i32,
}

impl<'a> MaschineControls<'a> {
    pub fn new(device: &'a HidDevice, map: ButtonMap) -> Self {
        Self {
            device,
            map,
            bits: [false; BUTTON_BITS],
            encoder_raw: None,
            encoder_position: 0,
        }
    }

    fn apply(&mut self, report: ButtonReport) {
        self.bits = report.bits;
        if let Some(prev) = self.encoder_raw {
            let delta = encoder_delta(prev, report.encoder);
            self.encoder_position = self.encoder_position.wrapping_add(delta);
        }
        self.encoder_raw = Some(report.encoder);
    }
}

fn input_error(err: HidError) -> Error {
    Error::Input(err.to_string())
}

impl InputSurface for MaschineControls<'_> {
    /// Drains every pending HID report.
    fn poll(&mut self) -> Result<()> {
        let mut buf = [0u8; 64];
        loop {
            let size = self.device.read_timeout(&mut buf, 0).map_err(input_error)?;
            if size < 1 {
                return Ok(());
            }
            match ButtonReport::parse(&buf[..size]) {
                Some(report) => self.apply(report),
                None => trace!(report = buf[0], "ignoring HID report"),
            }
        }
    }

    fn button_state(&self, button: Button) -> bool {
        self.bits[self.map.bit(button)]
    }

    fn encoder_position(&self) -> i32 {
        self.encoder_position
    }
}

pub(crate) struct MaschineDisplay<'a> {
    device: &'a HidDevice,
    lcd: Lcd,
}

impl<'a> MaschineDisplay<'a> {
    pub fn new(device: &'a HidDevice) -> Self {
        Self {
            device,
            lcd: Lcd::new(),
        }
    }

    fn flush(&self) -> Result<()> {
        self.lcd
            .write(self.device)
            .map_err(|e| Error::Display(e.to_string()))
    }
}

impl TextDisplay for MaschineDisplay<'_> {
    fn clear(&mut self) -> Result<()> {
        self.lcd.clear();
        self.flush()
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<()> {
        self.lcd.write_line(row, text);
        self.flush()
    }

    fn define_glyph(&mut self, slot: u8, bitmap: [u8; 8]) -> Result<()> {
        self.lcd.define_glyph(slot, bitmap);
        self.flush()
    }
}
