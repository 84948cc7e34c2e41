//! Whole-machine state capture and restore.
//!
//! A snapshot holds everything needed to resume execution bit-exactly at
//! a frame boundary: the full register file including shadows, all 64K of
//! memory, the ULA border and flash phase, and the pending interrupt
//! latch. File formats are a host concern; this is the in-memory contract
//! they would serialise.

use crate::spectrum::Spectrum;

/// A complete machine state.
pub struct Snapshot {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    pub ei_pending: bool,
    pub irq_pending: bool,

    /// The full 64K address space, ROM included.
    pub memory: Vec<u8>,

    pub border: u8,
    pub flash_phase: u8,
}

impl Snapshot {
    /// Capture the current machine state.
    #[must_use]
    pub fn capture(spectrum: &Spectrum) -> Self {
        let cpu = spectrum.cpu();
        let bus = spectrum.bus();

        let mut memory = Vec::with_capacity(0x10000);
        memory.extend_from_slice(bus.memory.rom());
        memory.extend_from_slice(bus.memory.ram());

        Self {
            af: cpu.regs.af(),
            bc: cpu.regs.bc(),
            de: cpu.regs.de(),
            hl: cpu.regs.hl(),
            af_alt: cpu.regs.af_alt(),
            bc_alt: cpu.regs.bc_alt(),
            de_alt: cpu.regs.de_alt(),
            hl_alt: cpu.regs.hl_alt(),
            ix: cpu.regs.ix,
            iy: cpu.regs.iy,
            sp: cpu.regs.sp,
            pc: cpu.regs.pc,
            i: cpu.regs.i,
            r: cpu.regs.r,
            iff1: cpu.regs.iff1,
            iff2: cpu.regs.iff2,
            im: cpu.regs.im,
            halted: cpu.regs.halted,
            ei_pending: cpu.ei_delay,
            irq_pending: cpu.interrupt_requested(),
            memory,
            border: bus.ula.border_colour(),
            flash_phase: bus.ula.flash_phase(),
        }
    }

    /// Restore this state onto a machine.
    ///
    /// # Errors
    ///
    /// Fails if the captured memory image is not 65,536 bytes.
    pub fn restore(&self, spectrum: &mut Spectrum) -> Result<(), String> {
        if self.memory.len() != 0x10000 {
            return Err(format!(
                "snapshot memory must be 65536 bytes, got {}",
                self.memory.len()
            ));
        }

        let cpu = spectrum.cpu_mut();
        cpu.reset();
        cpu.regs.set_af(self.af);
        cpu.regs.set_bc(self.bc);
        cpu.regs.set_de(self.de);
        cpu.regs.set_hl(self.hl);
        cpu.regs.set_af_alt(self.af_alt);
        cpu.regs.set_bc_alt(self.bc_alt);
        cpu.regs.set_de_alt(self.de_alt);
        cpu.regs.set_hl_alt(self.hl_alt);
        cpu.regs.ix = self.ix;
        cpu.regs.iy = self.iy;
        cpu.regs.sp = self.sp;
        cpu.regs.pc = self.pc;
        cpu.regs.i = self.i;
        cpu.regs.r = self.r;
        cpu.regs.iff1 = self.iff1;
        cpu.regs.iff2 = self.iff2;
        cpu.regs.im = self.im;
        cpu.regs.halted = self.halted;
        cpu.ei_delay = self.ei_pending;
        cpu.set_interrupt_requested(self.irq_pending);

        let bus = spectrum.bus_mut();
        for (offset, &byte) in self.memory.iter().enumerate() {
            bus.memory.poke(offset as u16, byte);
        }
        bus.ula.set_border_colour(self.border);
        bus.ula.set_flash_phase(self.flash_phase);

        Ok(())
    }
}
