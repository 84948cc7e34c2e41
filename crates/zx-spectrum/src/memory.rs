//! The 48K memory map: 16K ROM + 48K RAM.
//!
//! Layout:
//! - $0000-$3FFF: ROM (CPU writes silently ignored)
//! - $4000-$57FF: bitmap (6144 bytes, shared with the ULA)
//! - $5800-$5AFF: attributes (768 bytes)
//! - $5B00-$FFFF: free RAM (system variables from $5C00)

/// ROM image size in bytes.
pub const ROM_SIZE: usize = 0x4000;

/// RAM size in bytes ($4000-$FFFF).
const RAM_SIZE: usize = 0xC000;

/// Bitmap length within RAM (offset 0).
const BITMAP_LEN: usize = 0x1800;

/// Attribute length within RAM (offset `BITMAP_LEN`).
const ATTR_LEN: usize = 0x0300;

/// The 64K address space. The bus owns the backing storage exclusively;
/// the ULA borrows read-only views of the video region at end of frame.
#[derive(Debug)]
pub struct Memory {
    rom: [u8; ROM_SIZE],
    ram: [u8; RAM_SIZE],
}

impl Memory {
    /// Create the memory map from a ROM image.
    ///
    /// # Errors
    ///
    /// The ROM must be exactly 16,384 bytes; anything else fails
    /// construction.
    pub fn new(rom: &[u8]) -> Result<Self, String> {
        if rom.len() != ROM_SIZE {
            return Err(format!(
                "48K ROM must be exactly {ROM_SIZE} bytes, got {}",
                rom.len()
            ));
        }
        let mut memory = Self {
            rom: [0; ROM_SIZE],
            ram: [0; RAM_SIZE],
        };
        memory.rom.copy_from_slice(rom);
        Ok(memory)
    }

    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        let addr = addr as usize;
        if addr < ROM_SIZE {
            self.rom[addr]
        } else {
            self.ram[addr - ROM_SIZE]
        }
    }

    /// CPU-visible write: ROM addresses are silently dropped.
    pub fn write(&mut self, addr: u16, value: u8) {
        let addr = addr as usize;
        if addr >= ROM_SIZE {
            self.ram[addr - ROM_SIZE] = value;
        }
    }

    /// Side-effect-free read for tools and observers.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Write-through for tools: unlike `write`, this reaches ROM too.
    pub fn poke(&mut self, addr: u16, value: u8) {
        let addr = addr as usize;
        if addr < ROM_SIZE {
            self.rom[addr] = value;
        } else {
            self.ram[addr - ROM_SIZE] = value;
        }
    }

    /// Read-only view of the bitmap region ($4000-$57FF).
    #[must_use]
    pub fn bitmap(&self) -> &[u8] {
        &self.ram[..BITMAP_LEN]
    }

    /// Read-only view of the attribute region ($5800-$5AFF).
    #[must_use]
    pub fn attributes(&self) -> &[u8] {
        &self.ram[BITMAP_LEN..BITMAP_LEN + ATTR_LEN]
    }

    /// Full RAM contents (offset 0 = address $4000), for state capture.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// The ROM image, for state capture.
    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Overwrite RAM from a snapshot (offset 0 = address $4000).
    pub fn load_ram(&mut self, data: &[u8]) {
        let len = data.len().min(RAM_SIZE);
        self.ram[..len].copy_from_slice(&data[..len]);
    }
}
