//! Turns set-text messages into the two lines shown on the character display.

use crate::identity::DeviceProfile;
use crate::sysex::SetTextDisplay;

/// Glyph slot used for the "liked preset" heart.
pub const HEART_SLOT: u8 = 0;

/// 5x8 heart, one byte per row, low five bits used.
pub const HEART_BITMAP: [u8; 8] = [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0x00];

/// A user-definable glyph the display has to load before showing the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomGlyph {
    pub slot: u8,
    pub bitmap: [u8; 8],
}

/// Text ready for the display. Characters `'\0'..='\u{7}'` reference glyph slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedText {
    pub line1: String,
    pub line2: String,
    pub glyphs: Vec<CustomGlyph>,
}

pub fn render(msg: &SetTextDisplay, profile: &DeviceProfile) -> RenderedText {
    let mut line1 = msg
        .instrument
        .as_ref()
        .map(|f| f.as_str().to_string())
        .unwrap_or_default();
    let mut line2 = msg
        .name
        .as_ref()
        .map(|f| f.as_str().to_string())
        .unwrap_or_default();
    // The preset kind is decoded but there is no room for it on two lines.

    let mut glyphs = Vec::new();
    if msg.heart {
        line2 = line2.replace('*', &char::from(HEART_SLOT).to_string());
        glyphs.push(CustomGlyph {
            slot: HEART_SLOT,
            bitmap: HEART_BITMAP,
        });
    }

    if profile.trim_extra_spaces {
        line1 = trim_extra_spaces(&line1);
        line2 = trim_extra_spaces(&line2);
    }

    RenderedText {
        line1,
        line2,
        glyphs,
    }
}

/// Shortens the first run of two or more spaces: by one space if the run is
/// exactly two long, by two otherwise. Later runs are left alone.
pub fn trim_extra_spaces(line: &str) -> String {
    let Some(start) = line.find("  ") else {
        return line.to_string();
    };
    let run = line[start..].bytes().take_while(|&b| b == b' ').count();
    let remove = if run == 2 { 1 } else { 2 };

    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..start]);
    out.push_str(&line[start + remove..]);
    out
}
