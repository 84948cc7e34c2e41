//! ZX Spectrum 48K emulator core.
//!
//! Ties an instruction-level Z80 to the 48K memory map and a ULA model
//! that paces 69,888-T-state frames, services port 0xFE, and materialises
//! one bordered frame buffer per frame for the host to render.

mod bus;
#[cfg(feature = "native")]
pub mod capture;
pub mod input;
mod keyboard;
mod memory;
mod palette;
mod render;
mod snapshot;
mod spectrum;
mod ula;

pub use bus::SpectrumBus;
pub use input::{KeyScript, SpectrumKey};
pub use keyboard::KeyboardState;
pub use memory::{Memory, ROM_SIZE};
pub use palette::PALETTE;
pub use render::{FRAME_HEIGHT, FRAME_WIDTH, render_rgba};
pub use snapshot::Snapshot;
pub use spectrum::{Spectrum, T_STATES_PER_FRAME};
pub use ula::{FRAME_BUFFER_SIZE, Ula};
