use crate::font::{self, Glyph};
use hidapi::{HidDevice, HidResult};

pub(crate) const COLUMNS: usize = 16;
pub(crate) const ROWS: usize = 2;

const HEADER_HI: [u8; 9] = [0xe0, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x02, 0x00];
const HEADER_LO: [u8; 9] = [0xe0, 0x00, 0x00, 0x02, 0x00, 0x80, 0x00, 0x02, 0x00];

const CELL_WIDTH: usize = 8;
/// Top pixel row of each text row on the 128x32 panel.
const ROW_TOP: [usize; ROWS] = [4, 20];

/// A 16x2 character LCD drawn onto the Mikro's 128x32 monochrome screen.
/// Characters 0..=7 come from the user-defined glyph slots.
pub(crate) struct Lcd {
    buffer: [u8; 512],
    cells: [[char; COLUMNS]; ROWS],
    slots: [Glyph; 8],
}

impl Lcd {
    pub fn new() -> Self {
        Self {
            buffer: [0xff; 512],
            cells: [[' '; COLUMNS]; ROWS],
            slots: [[0; 8]; 8],
        }
    }

    pub fn clear(&mut self) {
        self.cells = [[' '; COLUMNS]; ROWS];
        self.redraw();
    }

    /// Replaces a row, truncating to the panel width. Rows past the last are ignored.
    pub fn write_line(&mut self, row: usize, text: &str) {
        let Some(cells) = self.cells.get_mut(row) else {
            return;
        };
        let mut chars = text.chars();
        for cell in cells.iter_mut() {
            *cell = chars.next().unwrap_or(' ');
        }
        self.redraw();
    }

    pub fn define_glyph(&mut self, slot: u8, bitmap: Glyph) {
        self.slots[usize::from(slot & 0x07)] = bitmap;
        self.redraw();
    }

    #[cfg(test)]
    pub fn line(&self, row: usize) -> String {
        self.cells[row].iter().collect::<String>().trim_end().to_string()
    }

    fn glyph_for(&self, ch: char) -> Glyph {
        match ch {
            '\u{0}'..='\u{7}' => self.slots[ch as usize],
            _ => font::glyph(ch),
        }
    }

    fn redraw(&mut self) {
        self.buffer.fill(0xff);
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                let glyph = self.glyph_for(self.cells[row][col]);
                for (y, bits) in glyph.iter().enumerate() {
                    for x in 0..5 {
                        let on = bits & (0x10 >> x) != 0;
                        self.set(ROW_TOP[row] + y, col * CELL_WIDTH + 1 + x, on);
                    }
                }
            }
        }
    }

    #[allow(dead_code)]
    pub fn get(&self, i: usize, j: usize) -> bool {
        let chunk = i / 8;
        let imod = i % 8;
        let idx = chunk * 128 + j;
        let val = self.buffer[idx] & (1 << imod);
        val == 0
    }

    fn set(&mut self, i: usize, j: usize, val: bool) {
        let chunk = i / 8;
        let imod: u8 = (i % 8) as u8;
        let idx = chunk * 128 + j;
        let mask: u8 = 1 << imod;
        if val {
            self.buffer[idx] &= !mask;
        } else {
            self.buffer[idx] |= mask;
        }
    }

    pub fn write(&self, h: &HidDevice) -> HidResult<()> {
        let mut buf = [0u8; 265];
        buf[..9].copy_from_slice(&HEADER_HI);
        buf[9..].copy_from_slice(&self.buffer[..256]);
        h.write(&buf)?;

        buf[..9].copy_from_slice(&HEADER_LO);
        buf[9..].copy_from_slice(&self.buffer[256..]);
        h.write(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(lcd: &Lcd) -> usize {
        (0..32).flat_map(|i| (0..128).map(move |j| (i, j))).filter(|&(i, j)| lcd.get(i, j)).count()
    }

    #[test]
    fn starts_blank() {
        assert_eq!(lit_pixels(&Lcd::new()), 0);
    }

    #[test]
    fn lines_are_truncated_and_padded() {
        let mut lcd = Lcd::new();
        lcd.write_line(0, "Bloody Swing and more");
        lcd.write_line(1, "ARP");
        assert_eq!(lcd.line(0), "Bloody Swing and");
        assert_eq!(lcd.line(1), "ARP");
        lcd.write_line(2, "ignored");
        lcd.clear();
        assert_eq!(lcd.line(0), "");
        assert_eq!(lit_pixels(&lcd), 0);
    }

    #[test]
    fn custom_slot_is_drawn_in_place() {
        let mut lcd = Lcd::new();
        lcd.write_line(1, "\u{0}");
        assert_eq!(lit_pixels(&lcd), 0);

        lcd.define_glyph(0, [0x10, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(lit_pixels(&lcd), 1);
        assert!(lcd.get(ROW_TOP[1], 1));
    }

    #[test]
    fn character_lands_in_its_cell() {
        let mut lcd = Lcd::new();
        lcd.write_line(0, " -");
        // '-' is a full-width bar on the fourth glyph row.
        for x in 0..5 {
            assert!(lcd.get(ROW_TOP[0] + 3, CELL_WIDTH + 1 + x));
        }
        assert_eq!(lit_pixels(&lcd), 5);
    }
}
