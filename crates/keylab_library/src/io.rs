//! Services the emulator core runs against. The driver provides real ones,
//! tests provide in-memory fakes.

use crate::controls::Button;
use crate::error::Result;
use crate::frame::RawFrame;

/// MIDI connection to the DAW.
pub trait Transport {
    /// Next complete inbound message, if one is waiting. Never blocks.
    fn receive(&mut self) -> Option<RawFrame>;

    fn send(&mut self, frame: &RawFrame) -> Result<()>;
}

/// Two-line character display with user-definable glyph slots.
pub trait TextDisplay {
    fn clear(&mut self) -> Result<()>;

    /// Replaces `row` with `text`. Characters `'\0'..='\u{7}'` show glyph slots;
    /// text wider than the display is cut by the display.
    fn write_line(&mut self, row: usize, text: &str) -> Result<()>;

    fn define_glyph(&mut self, slot: u8, bitmap: [u8; 8]) -> Result<()>;
}

/// Raw, undebounced state of the physical controls.
pub trait InputSurface {
    /// Refreshes the cached control state. Never blocks.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    fn button_state(&self, button: Button) -> bool;

    /// Accumulated encoder position; only differences matter.
    fn encoder_position(&self) -> i32;
}

/// Shows a two-line notice, replacing whatever was on the display.
pub fn show_notice<D>(display: &mut D, line1: &str, line2: &str) -> Result<()>
where
    D: TextDisplay + ?Sized,
{
    display.clear()?;
    display.write_line(0, line1)?;
    display.write_line(1, line2)
}
