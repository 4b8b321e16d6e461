//! Core of the KeyLab emulator: makes a generic control surface look like an
//! Arturia keyboard to AnalogLab.
//!
//! Hardware lives behind the traits in [`io`]; everything here runs and tests
//! on the host.

pub mod controls;
pub mod debounce;
pub mod dispatcher;
pub mod display;
pub mod error;
pub mod frame;
pub mod identity;
pub mod io;
pub mod sysex;

pub use error::{Error, Result};
pub use frame::RawFrame;
