//! Physical controls and what they send in each operating mode.
//!
//! Three controls are emulated: the Category button, the Preset button and the
//! main encoder with its push button (Enter). What they send depends on the
//! [`UiMode`] and on whether the vendor menu is open. The mapping is a pure
//! function of `(state, event)` so it can be tested without any hardware.

use crate::sysex::MessageKind;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

// Arturia mode
const CATEGORY_CC: u8 = 116;
const PRESET_CC: u8 = 117;
const BROWSE_CC: u8 = 114;
const BROWSE_ENTER_CC: u8 = 115;
const MENU_CC: u8 = 112;
const MENU_ENTER_CC: u8 = 113;

// Generic DAW mode
const DAW_ENCODER_CC: u8 = 28;

// Mackie Control
const MACKIE_CATEGORY_NOTE: u8 = 0x65;
const MACKIE_PRESET_NOTE: u8 = 0x64;
const MACKIE_ENTER_NOTE: u8 = 0x53;
const MACKIE_JOG_CC: u8 = 0x3C;
const MACKIE_JOG_CW: u8 = 1;
const MACKIE_JOG_CCW: u8 = 127;

const PRESSED: u8 = 127;
const RELEASED: u8 = 0;
// Relative encoder: the center value is sent first, then the step.
const ENCODER_CENTER: u8 = 64;
const ENCODER_CW: u8 = 65;
const ENCODER_CCW: u8 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Arturia,
    Daw,
    Mackie,
}

impl UiMode {
    /// Mode chosen at power-on: holding the encoder button selects DAW mode,
    /// holding Category selects Mackie, otherwise the configured mode is used.
    pub fn at_boot(enter_held: bool, category_held: bool, configured: UiMode) -> UiMode {
        if enter_held {
            UiMode::Daw
        } else if category_held {
            UiMode::Mackie
        } else {
            configured
        }
    }
}

impl FromStr for UiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arturia" => Ok(UiMode::Arturia),
            "daw" => Ok(UiMode::Daw),
            "mackie" => Ok(UiMode::Mackie),
            other => Err(format!(
                "invalid mode {other:?} (expected: \"arturia\", \"daw\", \"mackie\")"
            )),
        }
    }
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UiMode::Arturia => "Arturia",
            UiMode::Daw => "DAW",
            UiMode::Mackie => "Mackie",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Category,
    Preset,
    /// Encoder push button.
    Enter,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Category, Button::Preset, Button::Enter];

    fn mackie_note(self) -> u8 {
        match self {
            Button::Category => MACKIE_CATEGORY_NOTE,
            Button::Preset => MACKIE_PRESET_NOTE,
            Button::Enter => MACKIE_ENTER_NOTE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// One rotation step per unit of `delta`, positive meaning clockwise.
    pub fn steps(delta: i32) -> impl Iterator<Item = Rotation> {
        let rotation = if delta >= 0 {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        };
        std::iter::repeat_n(rotation, delta.unsigned_abs() as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Button),
    Released(Button),
    Turned(Rotation),
}

/// Mode plus menu flag. The menu flag mirrors the menu LED on the real device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub mode: UiMode,
    pub in_menu: bool,
}

impl ControllerState {
    pub fn new(mode: UiMode) -> Self {
        Self {
            mode,
            in_menu: false,
        }
    }
}

fn cc(number: u8, value: u8) -> MessageKind {
    MessageKind::ControlChange { number, value }
}

fn relative(number: u8, rotation: Rotation) -> Vec<MessageKind> {
    let step = match rotation {
        Rotation::Clockwise => ENCODER_CW,
        Rotation::CounterClockwise => ENCODER_CCW,
    };
    vec![cc(number, ENCODER_CENTER), cc(number, step)]
}

/// Applies one input event, returning the new state and the messages to send.
///
/// Enter only ever sends 127 on press and 0 on release; AnalogLab itself
/// decides between "enter" and "like" from the value it sees.
pub fn step(state: ControllerState, event: InputEvent) -> (ControllerState, Vec<MessageKind>) {
    let mut next = state;
    let out = match (state.mode, event) {
        (UiMode::Mackie, InputEvent::Pressed(button)) => {
            match button {
                Button::Category => next.in_menu = true,
                Button::Preset => next.in_menu = false,
                Button::Enter => {}
            }
            let note = button.mackie_note();
            vec![
                MessageKind::NoteOn {
                    note,
                    velocity: PRESSED,
                },
                MessageKind::NoteOff { note },
            ]
        }
        (UiMode::Mackie, InputEvent::Released(button)) => vec![MessageKind::NoteOff {
            note: button.mackie_note(),
        }],
        (UiMode::Mackie, InputEvent::Turned(rotation)) => {
            let value = match rotation {
                Rotation::Clockwise => MACKIE_JOG_CW,
                Rotation::CounterClockwise => MACKIE_JOG_CCW,
            };
            vec![cc(MACKIE_JOG_CC, value)]
        }
        (UiMode::Daw, InputEvent::Turned(rotation)) => relative(DAW_ENCODER_CC, rotation),
        (UiMode::Arturia, InputEvent::Turned(rotation)) => {
            let number = if state.in_menu { MENU_CC } else { BROWSE_CC };
            relative(number, rotation)
        }

        // Arturia and DAW modes share the button CCs.
        (_, InputEvent::Pressed(Button::Category)) => {
            if state.in_menu {
                // TODO: find out what Category should do while the menu is open
                // (close it, or step to the next category) and send that.
                vec![]
            } else {
                next.in_menu = true;
                vec![cc(CATEGORY_CC, PRESSED)]
            }
        }
        (_, InputEvent::Released(Button::Category)) => vec![cc(CATEGORY_CC, RELEASED)],
        (_, InputEvent::Pressed(Button::Preset)) => {
            next.in_menu = false;
            vec![cc(PRESET_CC, PRESSED)]
        }
        (_, InputEvent::Released(Button::Preset)) => vec![cc(PRESET_CC, RELEASED)],
        (_, InputEvent::Pressed(Button::Enter)) => vec![cc(enter_cc(state.in_menu), PRESSED)],
        (_, InputEvent::Released(Button::Enter)) => {
            // Picking an entry closes the menu once the button is let go.
            next.in_menu = false;
            vec![cc(enter_cc(state.in_menu), RELEASED)]
        }
    };
    (next, out)
}

fn enter_cc(in_menu: bool) -> u8 {
    if in_menu { MENU_ENTER_CC } else { BROWSE_ENTER_CC }
}
