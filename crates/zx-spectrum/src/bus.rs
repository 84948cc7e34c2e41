//! Spectrum bus: memory and I/O port routing.
//!
//! The bus is the single owner of the address space and the only path
//! between the CPU and the ULA. Port routing matches the 48K wiring the
//! ROM relies on: the ULA answers ports with low byte $FE; everything
//! else is unattached and reads $FF.

use zx_core::{Bus, IoBus};

use crate::memory::Memory;
use crate::ula::Ula;

/// The 48K bus, implementing `zx_core::Bus` + `IoBus` for the CPU.
pub struct SpectrumBus {
    pub memory: Memory,
    pub ula: Ula,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            ula: Ula::new(),
        }
    }

    /// Produce the frame buffer from the current video memory and advance
    /// the flash counter.
    pub fn end_frame(&mut self) {
        let Self { memory, ula } = self;
        ula.end_frame(memory.bitmap(), memory.attributes());
    }
}

impl Bus for SpectrumBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.memory.write(addr, value);
    }
}

impl IoBus for SpectrumBus {
    fn io_read(&mut self, port: u16) -> u8 {
        if port & 0xFF == 0xFE {
            self.ula.read_fe((port >> 8) as u8)
        } else {
            0xFF
        }
    }

    fn io_write(&mut self, port: u16, value: u8) {
        if port & 0xFF == 0xFE {
            self.ula.write_fe(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bus() -> SpectrumBus {
        let rom = vec![0u8; 0x4000];
        SpectrumBus::new(Memory::new(&rom).expect("valid ROM"))
    }

    #[test]
    fn memory_read_write() {
        let mut bus = make_bus();
        bus.write(0x8000, 0xAB);
        assert_eq!(bus.read(0x8000), 0xAB);
    }

    #[test]
    fn rom_write_ignored() {
        let mut bus = make_bus();
        bus.write(0x0000, 0xFF);
        assert_eq!(bus.read(0x0000), 0x00);
    }

    #[test]
    fn keyboard_read_via_port_fe() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(0xFEFE), 0xFF);

        bus.ula.keyboard.set_key(0, 0, true); // Caps Shift
        assert_eq!(bus.io_read(0xFEFE), 0xFE);
    }

    #[test]
    fn border_via_port_fe_write() {
        let mut bus = make_bus();
        bus.io_write(0x00FE, 0x12); // speaker on, border 2
        assert_eq!(bus.ula.border_colour(), 2);
        assert!(bus.ula.speaker());
    }

    #[test]
    fn unattached_port_reads_ff() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(0x00FF), 0xFF);
        assert_eq!(bus.io_read(0x001F), 0xFF);
    }

    #[test]
    fn unattached_port_write_is_dropped() {
        let mut bus = make_bus();
        bus.io_write(0x00FF, 0x02);
        assert_eq!(bus.ula.border_colour(), 7, "border untouched");
    }

    #[test]
    fn end_frame_snapshots_video_memory() {
        let mut bus = make_bus();
        bus.write(0x4000, 0xAA);
        bus.write(0x5800, 0x47);
        bus.end_frame();

        let fb = bus.ula.frame_buffer();
        let line0 = 24 * 160;
        assert_eq!(fb[line0 + 16], 0xAA);
        assert_eq!(fb[line0 + 17], 0x47);
    }
}
