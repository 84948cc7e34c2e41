//! The fixed 16-colour Spectrum palette.

/// ARGB palette, indexed `bright << 3 | colour`.
///
/// Normal colours sit at 0xD7 intensity, bright at 0xFF; bright black is
/// black again, so the ULA really produces 15 distinct colours.
pub const PALETTE: [u32; 16] = [
    // Normal
    0xFF00_0000, // black
    0xFF00_00D7, // blue
    0xFFD7_0000, // red
    0xFFD7_00D7, // magenta
    0xFF00_D700, // green
    0xFF00_D7D7, // cyan
    0xFFD7_D700, // yellow
    0xFFD7_D7D7, // white
    // Bright
    0xFF00_0000, // black
    0xFF00_00FF, // bright blue
    0xFFFF_0000, // bright red
    0xFFFF_00FF, // bright magenta
    0xFF00_FF00, // bright green
    0xFF00_FFFF, // bright cyan
    0xFFFF_FF00, // bright yellow
    0xFFFF_FFFF, // bright white
];
