//! ULA: port $FE, border, flash, and the end-of-frame buffer.
//!
//! The ULA's observable behaviour within a frame is port $FE (keyboard
//! scan in, border/MIC/speaker out). At the frame boundary it snapshots
//! the bitmap and attribute views into an externally renderable frame
//! buffer and advances the flash counter. Contention and per-pixel beam
//! state are deliberately not modelled; the frame buffer is materialised
//! once per frame from the final memory contents.
//!
//! # Frame buffer layout (26,112 bytes, scan order)
//!
//! - 24 top border lines × 160 bytes (one border-colour byte per 2 pixels)
//! - 192 main lines: 16 border bytes, 32 × (bitmap byte, attribute byte),
//!   16 border bytes
//! - 24 bottom border lines × 160 bytes
//!
//! Bitmap addresses interleave as `010Y7Y6 Y2Y1Y0 Y5Y4Y3 X4..X0`;
//! attributes are linear at 32 bytes per character row.

use crate::keyboard::KeyboardState;

/// Border lines above and below the 192-line screen.
const BORDER_LINES: usize = 24;

/// Bytes per full border line (2 pixels per byte across 320).
const BORDER_LINE_BYTES: usize = 160;

/// Border bytes on each side of a main line (32 pixels).
const SIDE_BORDER_BYTES: usize = 16;

/// Screen lines.
const SCREEN_LINES: usize = 192;

/// Character cells per line.
const CELLS_PER_LINE: usize = 32;

/// Total size of the produced frame buffer.
pub const FRAME_BUFFER_SIZE: usize = 2 * BORDER_LINES * BORDER_LINE_BYTES
    + SCREEN_LINES * (2 * SIDE_BORDER_BYTES + 2 * CELLS_PER_LINE);

/// The ULA state: port $FE latches, flash phase, keyboard matrix and the
/// frame buffer it regenerates each frame.
pub struct Ula {
    /// Border colour, 0-7.
    border: u8,
    /// MIC output (port $FE bit 3). Observable, not rendered.
    mic: bool,
    /// Speaker output (port $FE bit 4). Observable, not rendered.
    speaker: bool,
    /// EAR input level; reads as bit 6 of port $FE. High with no tape.
    ear_in: bool,
    /// 5-bit flash counter; bit 4 is the ink/paper swap phase.
    flash: u8,
    pub keyboard: KeyboardState,
    frame_buffer: Vec<u8>,
}

impl Ula {
    #[must_use]
    pub fn new() -> Self {
        Self {
            border: 7, // white on power-up
            mic: false,
            speaker: false,
            ear_in: true,
            flash: 0,
            keyboard: KeyboardState::new(),
            frame_buffer: vec![0; FRAME_BUFFER_SIZE],
        }
    }

    /// Port $FE read: bits 0-4 keyboard scan (active low), bit 5 high,
    /// bit 6 EAR, bit 7 high.
    #[must_use]
    pub fn read_fe(&self, addr_high: u8) -> u8 {
        let keys = self.keyboard.scan(addr_high);
        let ear = if self.ear_in { 0x40 } else { 0x00 };
        keys | 0xA0 | ear
    }

    /// Port $FE write: bits 0-2 border, bit 3 MIC, bit 4 speaker.
    pub fn write_fe(&mut self, value: u8) {
        self.border = value & 0x07;
        self.mic = value & 0x08 != 0;
        self.speaker = value & 0x10 != 0;
    }

    #[must_use]
    pub fn border_colour(&self) -> u8 {
        self.border
    }

    /// Restore the border directly (snapshots).
    pub fn set_border_colour(&mut self, colour: u8) {
        self.border = colour & 0x07;
    }

    #[must_use]
    pub fn mic(&self) -> bool {
        self.mic
    }

    #[must_use]
    pub fn speaker(&self) -> bool {
        self.speaker
    }

    /// Drive the EAR input (a tape interface would toggle this).
    pub fn set_ear_in(&mut self, level: bool) {
        self.ear_in = level;
    }

    /// Current 5-bit flash counter.
    #[must_use]
    pub fn flash_phase(&self) -> u8 {
        self.flash
    }

    /// Restore the flash counter directly (snapshots).
    pub fn set_flash_phase(&mut self, phase: u8) {
        self.flash = phase & 0x1F;
    }

    /// Should flashing cells currently swap ink and paper?
    #[must_use]
    pub fn flash_swap(&self) -> bool {
        self.flash & 0x10 != 0
    }

    /// The frame buffer produced by the last `end_frame`.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// Materialise the frame buffer from the video memory views and
    /// advance the flash counter. Called once per frame after the CPU has
    /// consumed its T-state budget.
    ///
    /// `bitmap` is the 6144-byte region at $4000, `attributes` the
    /// 768-byte region at $5800.
    pub fn end_frame(&mut self, bitmap: &[u8], attributes: &[u8]) {
        let border = self.border;
        let mut pos = 0;

        for _ in 0..BORDER_LINES * BORDER_LINE_BYTES {
            self.frame_buffer[pos] = border;
            pos += 1;
        }

        for y in 0..SCREEN_LINES {
            for _ in 0..SIDE_BORDER_BYTES {
                self.frame_buffer[pos] = border;
                pos += 1;
            }
            let line = bitmap_line_offset(y);
            let attr_row = (y >> 3) * CELLS_PER_LINE;
            for x in 0..CELLS_PER_LINE {
                self.frame_buffer[pos] = bitmap[line + x];
                self.frame_buffer[pos + 1] = attributes[attr_row + x];
                pos += 2;
            }
            for _ in 0..SIDE_BORDER_BYTES {
                self.frame_buffer[pos] = border;
                pos += 1;
            }
        }

        for _ in 0..BORDER_LINES * BORDER_LINE_BYTES {
            self.frame_buffer[pos] = border;
            pos += 1;
        }

        self.flash = (self.flash + 1) & 0x1F;
    }
}

impl Default for Ula {
    fn default() -> Self {
        Self::new()
    }
}

/// Offset of screen line `y` within the bitmap region:
/// `(Y2Y1Y0 << 8) | (Y5Y4Y3 << 2) | (Y7Y6 << 5)` applied to the address
/// bits, relative to $4000.
#[must_use]
pub fn bitmap_line_offset(y: usize) -> usize {
    ((y & 0x07) << 8) | ((y & 0x38) << 2) | ((y & 0xC0) << 5)
}
