use crate::surface::{BUTTON_BITS, ButtonMap};
use keylab_library::controls::UiMode;
use keylab_library::identity::Model;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub(crate) struct Settings {
    /// Product to impersonate, by product name ("Arturia KeyLab Essential 61", ...).
    pub profile: Model,
    /// Mode after boot unless Enter or Category is held: "arturia", "daw" or "mackie".
    pub boot_mode: UiMode,
    /// MIDI client name. If empty, the product name is used.
    pub client_name: String,
    /// Answer every parameter write from the DAW with a write of 0x01 to the same button.
    pub echo_parameter_writes: bool,
    /// Button report bit used as Category.
    pub category_button: usize,
    /// Button report bit used as Preset.
    pub preset_button: usize,
    /// Button report bit used as the encoder's Enter push.
    pub enter_button: usize,
    /// Button debounce interval.
    pub settle_ms: u64,
    /// Sleep between loop passes.
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Model::default(),
            boot_mode: UiMode::Arturia,
            client_name: "".to_string(),
            echo_parameter_writes: false,
            category_button: 8,
            preset_button: 9,
            enter_button: 24,
            settle_ms: 50,
            poll_interval_ms: 1,
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let map = self.button_map();
        let bits = [map.category, map.preset, map.enter];

        if bits.iter().any(|b| *b >= BUTTON_BITS) {
            return Err(format!("Button bits should be 0 to {}", BUTTON_BITS - 1));
        }

        if bits[0] == bits[1] || bits[0] == bits[2] || bits[1] == bits[2] {
            return Err("Category, Preset and Enter must use different buttons".to_string());
        }

        if !(1..=1000).contains(&self.settle_ms) {
            return Err(format!("settle_ms should be 1 to 1000 (found {})", self.settle_ms));
        }

        if self.poll_interval_ms > 100 {
            return Err(format!(
                "poll_interval_ms should be at most 100 (found {})",
                self.poll_interval_ms
            ));
        }

        Ok(())
    }

    pub(crate) fn button_map(&self) -> ButtonMap {
        ButtonMap {
            category: self.category_button,
            preset: self.preset_button,
            enter: self.enter_button,
        }
    }

    pub(crate) fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub(crate) fn client_name_for(&self, model: Model) -> String {
        if self.client_name.is_empty() {
            model.profile().product_name.to_string()
        } else {
            self.client_name.clone()
        }
    }
}
