//! Emulated products and the identification each one answers with.

use crate::error::{Error, Result};
use crate::sysex::{Codec, InquiryReply, TextFraming};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

const FIRMWARE_1_1_1_1: [u8; 4] = [0x01, 0x01, 0x01, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Model {
    #[default]
    KeyLabEssential61,
    KeyLabMkII61,
    KeyLab61,
    MiniLab3,
}

/// Everything that differs between emulated products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub model: Model,
    /// USB product string AnalogLab matches on.
    pub product_name: &'static str,
    /// Name the MIDI port must carry for AnalogLab to pick the device.
    pub port_name: &'static str,
    /// Family and model bytes of the inquiry reply, if known for this product.
    pub model_code: Option<[u8; 4]>,
    pub firmware: [u8; 4],
    pub text_framing: TextFraming,
    /// The product's own display is wider, so its strings carry padding we drop.
    pub trim_extra_spaces: bool,
}

pub static PROFILES: [DeviceProfile; 4] = [
    DeviceProfile {
        model: Model::KeyLabEssential61,
        product_name: "Arturia KeyLab Essential 61",
        port_name: "Arturia KeyLab Essential 61",
        model_code: Some([0x02, 0x00, 0x05, 0x54]),
        firmware: FIRMWARE_1_1_1_1,
        text_framing: TextFraming::Essential,
        trim_extra_spaces: false,
    },
    DeviceProfile {
        model: Model::KeyLabMkII61,
        product_name: "KeyLab mkII 61",
        port_name: "KeyLab mkII 61 MIDI",
        model_code: Some([0x02, 0x00, 0x05, 0x74]),
        firmware: FIRMWARE_1_1_1_1,
        text_framing: TextFraming::MkII,
        trim_extra_spaces: false,
    },
    // Recognized by AnalogLab but its inquiry reply has not been captured yet.
    DeviceProfile {
        model: Model::KeyLab61,
        product_name: "KeyLab 61",
        port_name: "KeyLab 61",
        model_code: None,
        firmware: FIRMWARE_1_1_1_1,
        text_framing: TextFraming::MkII,
        trim_extra_spaces: false,
    },
    DeviceProfile {
        model: Model::MiniLab3,
        product_name: "Arturia MiniLab 3",
        port_name: "Minilab3 MIDI",
        model_code: Some([0x02, 0x00, 0x04, 0x04]),
        firmware: FIRMWARE_1_1_1_1,
        text_framing: TextFraming::Compact,
        trim_extra_spaces: true,
    },
];

impl Model {
    pub fn profile(self) -> &'static DeviceProfile {
        match self {
            Model::KeyLabEssential61 => &PROFILES[0],
            Model::KeyLabMkII61 => &PROFILES[1],
            Model::KeyLab61 => &PROFILES[2],
            Model::MiniLab3 => &PROFILES[3],
        }
    }

    pub fn from_product_name(name: &str) -> Option<Model> {
        PROFILES
            .iter()
            .find(|p| p.product_name == name)
            .map(|p| p.model)
    }
}

/// Registered product names, comma separated.
pub(crate) fn product_names() -> String {
    PROFILES
        .iter()
        .map(|p| p.product_name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Model::from_product_name(s.trim()).ok_or_else(|| Error::UnknownProduct(s.to_string()))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().product_name)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl DeviceProfile {
    pub fn codec(&self) -> Codec {
        Codec::new(self.text_framing)
    }
}

/// The inquiry reply the active product sends back.
///
/// Products without a captured model code fail with [`Error::UnknownModel`];
/// the caller is expected to tell the user rather than stay silent.
pub fn response_for(profile: &DeviceProfile) -> Result<InquiryReply> {
    let model_code = profile
        .model_code
        .ok_or_else(|| Error::UnknownModel(profile.product_name.to_string()))?;
    Ok(InquiryReply {
        model_code,
        firmware: profile.firmware,
    })
}
