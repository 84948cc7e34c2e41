//! Core traits for the ZX Spectrum emulator.

mod bus;
mod trace;

pub use bus::{Bus, IoBus};
pub use trace::Trace;
