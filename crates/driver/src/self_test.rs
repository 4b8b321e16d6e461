use keylab_library::Result;
use keylab_library::display::{HEART_BITMAP, HEART_SLOT};
use keylab_library::io::{TextDisplay, show_notice};
use std::{thread, time};

/// Flashes every printable character across the display so dead pixels and
/// a broken glyph slot show up before the DAW connects.
pub(crate) fn self_test<D: TextDisplay + ?Sized>(display: &mut D) -> Result<()> {
    display.define_glyph(HEART_SLOT, HEART_BITMAP)?;

    let charset: Vec<char> = ('0'..='9').chain('A'..='Z').chain("!#&()*+-./:=?".chars()).collect();
    for page in charset.chunks(16) {
        let line: String = page.iter().collect();
        show_notice(display, &line, "\u{0} self test \u{0}")?;
        thread::sleep(time::Duration::from_millis(120));
    }

    display.clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleDisplay;

    #[test]
    fn ends_with_a_clear_display() {
        let mut display = ConsoleDisplay::default();
        self_test(&mut display).unwrap();
        assert!(display.lines.iter().all(String::is_empty));
    }
}
