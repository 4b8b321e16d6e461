use keylab_library::controls::{Button, ControllerState, UiMode};
use keylab_library::dispatcher::{DispatchOptions, Dispatcher, MAX_ENCODER_STEPS};
use keylab_library::display::HEART_BITMAP;
use keylab_library::identity::Model;
use keylab_library::io::{InputSurface, TextDisplay, Transport};
use keylab_library::sysex::MessageKind;
use keylab_library::{RawFrame, Result};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Default)]
struct FakeTransport {
    inbox: VecDeque<RawFrame>,
    sent: Vec<RawFrame>,
}

impl Transport for FakeTransport {
    fn receive(&mut self) -> Option<RawFrame> {
        self.inbox.pop_front()
    }

    fn send(&mut self, frame: &RawFrame) -> Result<()> {
        self.sent.push(frame.clone());
        Ok(())
    }
}

#[derive(Default)]
struct FakeDisplay {
    lines: [String; 2],
    glyphs: HashMap<u8, [u8; 8]>,
    writes: usize,
}

impl TextDisplay for FakeDisplay {
    fn clear(&mut self) -> Result<()> {
        self.lines = Default::default();
        Ok(())
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<()> {
        self.lines[row] = text.to_string();
        self.writes += 1;
        Ok(())
    }

    fn define_glyph(&mut self, slot: u8, bitmap: [u8; 8]) -> Result<()> {
        self.glyphs.insert(slot, bitmap);
        Ok(())
    }
}

#[derive(Default)]
struct FakeInput {
    pressed: Vec<Button>,
    encoder: i32,
}

impl InputSurface for FakeInput {
    fn button_state(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    fn encoder_position(&self) -> i32 {
        self.encoder
    }
}

struct Rig {
    dispatcher: Dispatcher,
    state: ControllerState,
    transport: FakeTransport,
    display: FakeDisplay,
    input: FakeInput,
    t0: Instant,
}

impl Rig {
    fn new(model: Model, mode: UiMode) -> Self {
        Self::with_options(model, mode, DispatchOptions::default())
    }

    fn with_options(model: Model, mode: UiMode, options: DispatchOptions) -> Self {
        let input = FakeInput::default();
        let mut dispatcher = Dispatcher::new(model.profile(), options);
        dispatcher.prime(&input);
        Self {
            dispatcher,
            state: ControllerState::new(mode),
            transport: FakeTransport::default(),
            display: FakeDisplay::default(),
            input,
            t0: Instant::now(),
        }
    }

    fn run_at(&mut self, ms: u64) {
        self.dispatcher
            .run_once(
                &mut self.state,
                &mut self.transport,
                &mut self.display,
                &mut self.input,
                self.t0 + Duration::from_millis(ms),
            )
            .unwrap();
    }

    fn receive(&mut self, bytes: &[u8]) {
        self.transport.inbox.push_back(RawFrame::from(bytes));
        self.run_at(0);
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.transport
            .sent
            .iter()
            .map(|f| f.as_bytes().to_vec())
            .collect()
    }
}

const ARP_2600: [u8; 46] = [
    0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x04, 0x00, 0x60, 0x01, 0x41, 0x52, 0x50, 0x20, 0x32, 0x36,
    0x30, 0x30, 0x00, 0x02, 0x2A, 0x42, 0x6C, 0x6F, 0x6F, 0x64, 0x79, 0x20, 0x53, 0x77, 0x69, 0x6E,
    0x67, 0x00, 0x03, 0x4E, 0x6F, 0x69, 0x73, 0x65, 0x00, 0x04, 0x46, 0x20, 0x00, 0xF7,
];

#[test]
fn device_inquiry_gets_reply_and_daw_mode_select() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    rig.receive(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
    assert_eq!(
        rig.sent(),
        vec![
            vec![
                0xF0, 0x7E, 0x7F, 0x06, 0x02, 0x00, 0x20, 0x6B, 0x02, 0x00, 0x05, 0x54, 0x01, 0x01,
                0x01, 0x01, 0xF7
            ],
            vec![0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x02, 0x00, 0x40, 0x51, 0x00, 0xF7],
        ]
    );
    assert_eq!(rig.display.lines, ["Received device".to_string(), "inquiry".to_string()]);
}

#[test]
fn unknown_model_is_shown_instead_of_answered() {
    let mut rig = Rig::new(Model::KeyLab61, UiMode::Arturia);
    rig.receive(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
    assert!(rig.transport.sent.is_empty());
    assert_eq!(rig.display.lines, ["Unsupported model".to_string(), "KeyLab 61".to_string()]);
}

#[test]
fn set_text_reaches_display_with_heart() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    rig.receive(&ARP_2600);
    assert_eq!(rig.display.lines[0], "ARP 2600");
    assert_eq!(rig.display.lines[1], "\u{0}Bloody Swing");
    assert_eq!(rig.display.glyphs.get(&0), Some(&HEART_BITMAP));
    assert!(rig.transport.sent.is_empty());
}

#[test]
fn mkii_shows_text_framed_for_essential() {
    for model in [Model::KeyLabMkII61, Model::KeyLab61] {
        let mut rig = Rig::new(model, UiMode::Arturia);
        rig.receive(&ARP_2600);
        assert_eq!(rig.display.lines[0], "ARP 2600", "{model}");
        assert_eq!(rig.display.lines[1], "\u{0}Bloody Swing", "{model}");
    }
}

#[test]
fn minidexed_switches_to_daw_mode() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Mackie);
    let mut frame = vec![0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x04, 0x00, 0x60, 0x01];
    frame.extend_from_slice(b"MiniDexed");
    frame.extend_from_slice(&[0x00, 0xF7]);
    rig.receive(&frame);
    assert_eq!(rig.state.mode, UiMode::Daw);
    assert_eq!(rig.display.lines[0], "MiniDexed");
}

#[test]
fn minidexed_in_unknown_frame_still_switches() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    let mut frame = vec![0xF0, 0x43, 0x10];
    frame.extend_from_slice(b"MiniDexed");
    frame.push(0xF7);
    let kind = rig
        .dispatcher
        .handle_frame(
            &mut rig.state,
            &RawFrame::from(frame),
            &mut rig.transport,
            &mut rig.display,
        )
        .unwrap();
    assert_eq!(kind, MessageKind::Unrecognized);
    assert_eq!(rig.state.mode, UiMode::Daw);
}

#[test]
fn garbage_changes_nothing() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    let before = rig.state;
    rig.receive(&[0xF0, 0x41, 0x10, 0x42, 0x12, 0xF7]);
    rig.receive(&[0x13, 0x37]);
    rig.receive(&[]);
    assert_eq!(rig.state, before);
    assert!(rig.transport.sent.is_empty());
    assert_eq!(rig.display.writes, 0);
}

#[test]
fn closing_signal_shows_notice() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    rig.receive(&[0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x02, 0x00, 0x00, 89, 0x00, 0xF7]);
    assert_eq!(rig.display.lines, ["AnalogLab".to_string(), "closing...".to_string()]);
    assert!(rig.transport.sent.is_empty());
}

#[test]
fn parameter_writes_echo_only_when_enabled() {
    let write = [0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x02, 0x00, 0x03, 0x10, 0x22, 0xF7];

    let mut quiet = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    quiet.receive(&write);
    assert!(quiet.transport.sent.is_empty());

    let options = DispatchOptions {
        echo_parameter_writes: true,
        ..DispatchOptions::default()
    };
    let mut echo = Rig::with_options(Model::KeyLabEssential61, UiMode::Arturia, options);
    echo.receive(&write);
    assert_eq!(
        echo.sent(),
        vec![vec![0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x02, 0x00, 0x03, 0x10, 0x01, 0xF7]]
    );
}

#[test]
fn mackie_terminate_keeps_mode() {
    let mut rig = Rig::new(Model::KeyLabMkII61, UiMode::Mackie);
    rig.receive(&[0xF0, 0x00, 0x00, 0x66, 0x14, 0x08, 0x00, 0xF7]);
    assert_eq!(rig.state.mode, UiMode::Mackie);
    assert_eq!(rig.display.lines, ["Mackie session".to_string(), "terminated".to_string()]);
}

#[test]
fn category_button_is_debounced_and_opens_menu() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    rig.input.pressed.push(Button::Category);
    rig.run_at(0);
    rig.run_at(20);
    assert!(rig.transport.sent.is_empty());

    rig.run_at(60);
    assert_eq!(rig.sent(), vec![vec![0xB0, 116, 127]]);
    assert!(rig.state.in_menu);

    rig.input.pressed.clear();
    rig.run_at(100);
    rig.run_at(200);
    assert_eq!(rig.sent().last(), Some(&vec![0xB0, 116, 0]));

    let sent_before = rig.transport.sent.len();
    rig.input.pressed.push(Button::Category);
    rig.run_at(300);
    rig.run_at(400);
    assert_eq!(rig.transport.sent.len(), sent_before);
    assert!(rig.state.in_menu);
}

#[test]
fn encoder_turns_become_relative_ccs() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Arturia);
    rig.input.encoder = 2;
    rig.run_at(0);
    assert_eq!(
        rig.sent(),
        vec![
            vec![0xB0, 114, 64],
            vec![0xB0, 114, 65],
            vec![0xB0, 114, 64],
            vec![0xB0, 114, 65],
        ]
    );

    rig.transport.sent.clear();
    rig.input.encoder = 1;
    rig.run_at(10);
    assert_eq!(rig.sent(), vec![vec![0xB0, 114, 64], vec![0xB0, 114, 63]]);
}

#[test]
fn encoder_jump_is_capped_per_pass() {
    let mut rig = Rig::new(Model::KeyLabEssential61, UiMode::Mackie);
    rig.input.encoder = i32::MIN;
    rig.run_at(0);
    assert_eq!(rig.transport.sent.len(), MAX_ENCODER_STEPS as usize);
    assert!(rig.sent().iter().all(|m| m == &vec![0xB0, 0x3C, 127]));

    rig.transport.sent.clear();
    rig.input.encoder = i32::MIN + 3;
    rig.run_at(10);
    assert_eq!(rig.sent(), vec![vec![0xB0, 0x3C, 1]; 3]);
}

#[test]
fn buttons_held_at_boot_are_not_pressed_again() {
    let input = FakeInput {
        pressed: vec![Button::Enter],
        encoder: 7,
    };
    let mut dispatcher =
        Dispatcher::new(Model::KeyLabEssential61.profile(), DispatchOptions::default());
    dispatcher.prime(&input);

    let mut state = ControllerState::new(UiMode::at_boot(true, false, UiMode::Arturia));
    let mut transport = FakeTransport::default();
    let mut display = FakeDisplay::default();
    let mut input = input;
    let t0 = Instant::now();
    for ms in [0, 100, 200] {
        dispatcher
            .run_once(
                &mut state,
                &mut transport,
                &mut display,
                &mut input,
                t0 + Duration::from_millis(ms),
            )
            .unwrap();
    }
    assert_eq!(state.mode, UiMode::Daw);
    assert!(transport.sent.is_empty());
}

#[test]
fn splash_names_product_and_mode() {
    let rig = Rig::new(Model::MiniLab3, UiMode::Mackie);
    let mut display = FakeDisplay::default();
    rig.dispatcher.show_splash(&rig.state, &mut display).unwrap();
    assert_eq!(display.lines, ["Arturia MiniLab 3".to_string(), "Mackie mode".to_string()]);
}
