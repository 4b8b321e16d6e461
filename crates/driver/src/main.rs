mod console;
mod font;
mod lcd;
mod midi;
mod self_test;
mod settings;
mod surface;

use crate::console::{ConsoleDisplay, NoControls};
use crate::midi::MidirTransport;
use crate::self_test::self_test;
use crate::settings::Settings;
use crate::surface::{MaschineControls, MaschineDisplay, PID, VID};
use anyhow::Context;
use clap::Parser;
use config::Config;
use keylab_library::controls::{Button, ControllerState, UiMode};
use keylab_library::dispatcher::{DispatchOptions, Dispatcher};
use keylab_library::identity::{Model, PROFILES};
use keylab_library::io::{InputSurface, TextDisplay, Transport};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "KeyLab emulator for the Maschine Mikro MK3",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Args {
    #[clap(short, long, help = "Config file (see example_config.toml)")]
    config: Option<String>,

    #[clap(short, long, help = "Product to emulate, overrides the config file")]
    profile: Option<Model>,

    #[clap(short, long, help = "Mode after boot: arturia, daw or mackie")]
    mode: Option<UiMode>,

    #[clap(long, help = "Run without the Maschine, printing the display to stdout")]
    headless: bool,

    #[clap(long, help = "List the products that can be emulated and exit")]
    list_profiles: bool,
}

fn list_profiles() {
    for profile in PROFILES.iter() {
        let reply = match profile.model_code {
            Some(code) => format!("{code:02X?}"),
            None => "no inquiry reply".to_string(),
        };
        println!("{:<30} port \"{}\", {}", profile.product_name, profile.port_name, reply);
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut cfg = Config::builder();

    if let Some(config_fn) = &args.config {
        cfg = cfg.add_source(config::File::with_name(config_fn.as_str()));
    }
    cfg = cfg.add_source(config::Environment::with_prefix("KEYLAB").try_parsing(true));

    let settings: Settings = cfg
        .build()
        .context("Can't create settings")?
        .try_deserialize()
        .context("Can't parse settings")?;

    settings.validate().map_err(anyhow::Error::msg)?;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("keylab_driver=info,keylab_library=info")),
        )
        .init();

    let args = Args::parse();

    if args.list_profiles {
        list_profiles();
        return Ok(());
    }

    let settings = load_settings(&args)?;
    println!("Running with settings:");
    println!("{settings:?}");

    let model = args.profile.unwrap_or(settings.profile);
    let configured_mode = args.mode.unwrap_or(settings.boot_mode);
    let profile = model.profile();

    let mut transport = MidirTransport::open(&settings.client_name_for(model), profile.port_name)?;
    let mut dispatcher = Dispatcher::new(
        profile,
        DispatchOptions {
            echo_parameter_writes: settings.echo_parameter_writes,
            settle: settings.settle(),
        },
    );

    if args.headless {
        let mut display = ConsoleDisplay::default();
        let mut controls = NoControls;
        return run(
            &mut dispatcher,
            configured_mode,
            &mut transport,
            &mut display,
            &mut controls,
            &settings,
        );
    }

    let api = hidapi::HidApi::new()?;
    let device = api
        .open(VID, PID)
        .context("Couldn't open the Maschine Mikro MK3")?;
    device.set_blocking_mode(false)?;

    let mut display = MaschineDisplay::new(&device);
    self_test(&mut display)?;

    let mut controls = MaschineControls::new(&device, settings.button_map());
    run(
        &mut dispatcher,
        configured_mode,
        &mut transport,
        &mut display,
        &mut controls,
        &settings,
    )
}

fn run<T, D, I>(
    dispatcher: &mut Dispatcher,
    configured_mode: UiMode,
    transport: &mut T,
    display: &mut D,
    controls: &mut I,
    settings: &Settings,
) -> anyhow::Result<()>
where
    T: Transport,
    D: TextDisplay,
    I: InputSurface,
{
    controls.poll()?;
    let mode = UiMode::at_boot(
        controls.button_state(Button::Enter),
        controls.button_state(Button::Category),
        configured_mode,
    );
    let profile = dispatcher.profile();
    println!(
        "Emulating {} on port \"{}\" in {} mode",
        profile.product_name, profile.port_name, mode
    );
    info!(product = profile.product_name, %mode, "starting");

    let mut state = ControllerState::new(mode);
    dispatcher.prime(&*controls);
    dispatcher.show_splash(&state, display)?;

    let poll_interval: Duration = settings.poll_interval();
    loop {
        dispatcher.run_once(&mut state, transport, display, controls, Instant::now())?;
        thread::sleep(poll_interval);
    }
}
