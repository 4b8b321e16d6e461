//! Headless stand-ins: the display prints to stdout and there are no controls.

use crate::lcd::{COLUMNS, ROWS};
use keylab_library::Result;
use keylab_library::controls::Button;
use keylab_library::io::{InputSurface, TextDisplay};

#[derive(Default)]
pub(crate) struct ConsoleDisplay {
    pub lines: [String; ROWS],
}

impl ConsoleDisplay {
    /// Slot characters are printed as their slot number in brackets.
    fn printable(text: &str) -> String {
        text.chars()
            .take(COLUMNS)
            .map(|c| match c {
                '\u{0}'..='\u{7}' => format!("[{}]", c as u8),
                c => c.to_string(),
            })
            .collect()
    }
}

impl TextDisplay for ConsoleDisplay {
    fn clear(&mut self) -> Result<()> {
        self.lines = Default::default();
        Ok(())
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<()> {
        if let Some(line) = self.lines.get_mut(row) {
            *line = Self::printable(text);
            println!("Screen {}: {}", row + 1, line);
        }
        Ok(())
    }

    fn define_glyph(&mut self, _slot: u8, _bitmap: [u8; 8]) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct NoControls;

impl InputSurface for NoControls {
    fn button_state(&self, _button: Button) -> bool {
        false
    }

    fn encoder_position(&self) -> i32 {
        0
    }
}
