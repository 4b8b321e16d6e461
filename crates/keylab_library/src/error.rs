use thiserror::Error;

/// Errors surfaced by the emulator core and its collaborators.
///
/// Frame decoding never produces one of these; a frame that cannot be
/// understood decodes to `MessageKind::Unrecognized` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI transport error: {0}")]
    Transport(String),

    #[error("display error: {0}")]
    Display(String),

    #[error("input surface error: {0}")]
    Input(String),

    #[error("no device inquiry reply registered for {0:?}")]
    UnknownModel(String),

    #[error(
        "unknown product {0:?}, expected one of: {names}",
        names = crate::identity::product_names()
    )]
    UnknownProduct(String),
}

pub type Result<T> = std::result::Result<T, Error>;
