//! Host input: logical key names and scripted key holds.
//!
//! `SpectrumKey` encodes its matrix position directly in the enum
//! discriminant (`row << 3 | column bit`), so the press path is a shift
//! and a mask instead of a lookup table. `KeyScript` lets tests and
//! headless runs schedule keys ahead of time as held intervals measured
//! in frames.

use crate::keyboard::KeyboardState;

/// Logical key on the 48K keyboard.
///
/// The discriminant packs the matrix position: bits 3-5 are the half-row
/// (0-7, selected by address lines A8-A15), bits 0-2 the column (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpectrumKey {
    // Row 0 (A8): Caps Shift, Z, X, C, V
    CapsShift = 0o00,
    Z = 0o01,
    X = 0o02,
    C = 0o03,
    V = 0o04,
    // Row 1 (A9): A, S, D, F, G
    A = 0o10,
    S = 0o11,
    D = 0o12,
    F = 0o13,
    G = 0o14,
    // Row 2 (A10): Q, W, E, R, T
    Q = 0o20,
    W = 0o21,
    E = 0o22,
    R = 0o23,
    T = 0o24,
    // Row 3 (A11): 1, 2, 3, 4, 5
    N1 = 0o30,
    N2 = 0o31,
    N3 = 0o32,
    N4 = 0o33,
    N5 = 0o34,
    // Row 4 (A12): 0, 9, 8, 7, 6
    N0 = 0o40,
    N9 = 0o41,
    N8 = 0o42,
    N7 = 0o43,
    N6 = 0o44,
    // Row 5 (A13): P, O, I, U, Y
    P = 0o50,
    O = 0o51,
    I = 0o52,
    U = 0o53,
    Y = 0o54,
    // Row 6 (A14): Enter, L, K, J, H
    Enter = 0o60,
    L = 0o61,
    K = 0o62,
    J = 0o63,
    H = 0o64,
    // Row 7 (A15): Space, Sym Shift, M, N, B
    Space = 0o70,
    SymShift = 0o71,
    M = 0o72,
    N = 0o73,
    B = 0o74,
}

impl SpectrumKey {
    /// Half-row index, 0-7.
    #[must_use]
    pub const fn row(self) -> usize {
        (self as u8 >> 3) as usize
    }

    /// Column bit within the half-row, 0-4.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8 & 0x07
    }
}

/// One scheduled key hold: down at `from`, up again at `until`
/// (half-open, in frame numbers).
#[derive(Debug, Clone)]
struct KeyHold {
    key: SpectrumKey,
    from: u64,
    until: u64,
}

/// Scripted keyboard input.
///
/// Holds are intervals, not edge events: `apply` asserts every key whose
/// interval covers the current frame and releases holds that have
/// expired, so a skipped frame number can never leave a key stuck down.
pub struct KeyScript {
    holds: Vec<KeyHold>,
}

impl KeyScript {
    #[must_use]
    pub fn new() -> Self {
        Self { holds: Vec::new() }
    }

    /// Hold `key` down starting at `at_frame` for `frames` frames.
    pub fn hold(&mut self, key: SpectrumKey, at_frame: u64, frames: u64) {
        self.holds.push(KeyHold {
            key,
            from: at_frame,
            until: at_frame.saturating_add(frames),
        });
    }

    /// Bring the keyboard matrix up to date for `frame`.
    pub fn apply(&mut self, frame: u64, keyboard: &mut KeyboardState) {
        self.holds.retain(|hold| {
            if frame >= hold.until {
                keyboard.set_key(hold.key.row(), hold.key.bit(), false);
                return false;
            }
            if frame >= hold.from {
                keyboard.set_key(hold.key.row(), hold.key.bit(), true);
            }
            true
        });
    }

    /// Number of holds that have not yet expired.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.holds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }
}

impl Default for KeyScript {
    fn default() -> Self {
        Self::new()
    }
}
