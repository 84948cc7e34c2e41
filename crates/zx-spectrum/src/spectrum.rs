//! Top-level Spectrum system and the frame loop.
//!
//! One frame is 69,888 T-states at the nominal 3.5 MHz clock (50.08 Hz).
//! Each `run_frame`:
//!
//! 1. applies queued input to the keyboard matrix,
//! 2. latches the maskable interrupt on the CPU (the ULA's frame
//!    interrupt — raised here so the causality runs one way per frame),
//! 3. runs the CPU for the frame's T-state budget, carrying any
//!    instruction overshoot into the next frame's budget,
//! 4. has the ULA materialise the frame buffer and advance flash.
//!
//! The host consumes the frame buffer and feeds the keyboard between
//! frames.

use zx_core::Trace;
use zx_z80::Z80;

use crate::bus::SpectrumBus;
use crate::input::{KeyScript, SpectrumKey};
use crate::memory::Memory;

/// T-states per 48K frame.
pub const T_STATES_PER_FRAME: u32 = 69_888;

/// ZX Spectrum 48K system: CPU + bus + frame pacing.
pub struct Spectrum {
    cpu: Z80,
    bus: SpectrumBus,
    /// Completed frame counter.
    frame_count: u64,
    /// T-states the previous frame ran over its budget.
    overshoot: u32,
    /// Scripted key holds applied at the start of each frame.
    script: KeyScript,
}

impl Spectrum {
    /// Create a machine with the given 16K ROM image.
    ///
    /// # Errors
    ///
    /// Fails if the ROM is not exactly 16,384 bytes.
    pub fn new(rom: &[u8]) -> Result<Self, String> {
        let memory = Memory::new(rom)?;
        Ok(Self {
            cpu: Z80::new(),
            bus: SpectrumBus::new(memory),
            frame_count: 0,
            overshoot: 0,
            script: KeyScript::new(),
        })
    }

    /// Create a machine with a trace sink attached to the CPU, observing
    /// fetches, memory, ports and undocumented opcodes.
    ///
    /// # Errors
    ///
    /// Fails if the ROM is not exactly 16,384 bytes.
    pub fn with_trace(rom: &[u8], trace: Box<dyn Trace>) -> Result<Self, String> {
        let mut spectrum = Self::new(rom)?;
        spectrum.cpu.set_trace(trace);
        Ok(spectrum)
    }

    /// Run one complete frame. Returns the T-states executed.
    pub fn run_frame(&mut self) -> u32 {
        self.script
            .apply(self.frame_count, &mut self.bus.ula.keyboard);

        // One maskable interrupt per frame, latched at frame start.
        self.cpu.request_interrupt();

        let budget = T_STATES_PER_FRAME.saturating_sub(self.overshoot);
        let elapsed = self.cpu.run_for(&mut self.bus, budget);
        self.overshoot = elapsed - budget;

        self.bus.end_frame();
        self.frame_count += 1;
        elapsed
    }

    /// Reset the machine to the cold-boot state. Memory is preserved the
    /// way hardware would preserve it; the ROM restarts regardless.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.overshoot = 0;
    }

    /// The frame buffer produced by the last completed frame.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        self.bus.ula.frame_buffer()
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }

    /// Mutable access to the scripted key holds.
    pub fn key_script(&mut self) -> &mut KeyScript {
        &mut self.script
    }

    /// Press a key immediately (held until released).
    pub fn press_key(&mut self, key: SpectrumKey) {
        self.bus.ula.keyboard.set_key(key.row(), key.bit(), true);
    }

    /// Release a key.
    pub fn release_key(&mut self, key: SpectrumKey) {
        self.bus.ula.keyboard.set_key(key.row(), key.bit(), false);
    }

    /// Release every key.
    pub fn release_all_keys(&mut self) {
        self.bus.ula.keyboard.release_all();
    }

    /// Replace the whole keyboard matrix with a host snapshot
    /// (active-low rows, bits 0-4).
    pub fn set_keyboard_rows(&mut self, rows: [u8; 8]) {
        self.bus.ula.keyboard.set_rows(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ula::FRAME_BUFFER_SIZE;

    /// A minimal ROM that disables interrupts and halts.
    fn make_spectrum() -> Spectrum {
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0xF3; // DI
        rom[1] = 0x76; // HALT
        Spectrum::new(&rom).expect("valid ROM")
    }

    #[test]
    fn rejects_wrong_rom_size() {
        assert!(Spectrum::new(&[0u8; 100]).is_err());
    }

    #[test]
    fn run_frame_consumes_the_budget() {
        let mut spec = make_spectrum();
        let elapsed = spec.run_frame();
        assert!(
            (T_STATES_PER_FRAME..T_STATES_PER_FRAME + 30).contains(&elapsed),
            "expected ~one frame of T-states, got {elapsed}"
        );
        assert_eq!(spec.frame_count(), 1);
    }

    #[test]
    fn overshoot_carries_into_the_next_frame() {
        let mut spec = make_spectrum();
        let first = spec.run_frame();
        let second = spec.run_frame();
        let total = u64::from(first) + u64::from(second);
        // Two frames stay within one instruction of the nominal pace
        assert!(total >= 2 * u64::from(T_STATES_PER_FRAME));
        assert!(total < 2 * u64::from(T_STATES_PER_FRAME) + 30);
    }

    #[test]
    fn one_interrupt_latched_per_frame_and_masked_requests_stall() {
        let mut spec = make_spectrum();
        // The DI/HALT ROM never accepts: the latch must still be pending
        spec.run_frame();
        assert!(spec.cpu().interrupt_requested());
        assert!(spec.cpu().regs.halted);
    }

    #[test]
    fn interrupt_serviced_when_enabled() {
        // EI; HALT — the ROM idles until the frame interrupt
        let mut rom = vec![0u8; 0x4000];
        rom[0] = 0xFB; // EI
        rom[1] = 0x76; // HALT
        // 0x0038: the IM 1 handler returns immediately after re-enabling
        rom[0x38] = 0xFB; // EI
        rom[0x39] = 0xC9; // RET
        let mut spec = Spectrum::new(&rom).expect("valid ROM");

        spec.run_frame();
        assert!(
            !spec.cpu().interrupt_requested(),
            "frame interrupt was accepted"
        );
    }

    #[test]
    fn frame_buffer_has_the_documented_size() {
        let mut spec = make_spectrum();
        spec.run_frame();
        assert_eq!(spec.frame_buffer().len(), FRAME_BUFFER_SIZE);
    }

    #[test]
    fn key_presses_reach_the_matrix() {
        let mut spec = make_spectrum();
        spec.press_key(SpectrumKey::L);
        assert_eq!(spec.bus().ula.read_fe(0xBF), 0xFD);
        spec.release_key(SpectrumKey::L);
        assert_eq!(spec.bus().ula.read_fe(0xBF), 0xFF);
    }

    #[test]
    fn scripted_hold_applies_at_its_frame() {
        let mut spec = make_spectrum();
        spec.key_script().hold(SpectrumKey::A, 1, 2);

        spec.run_frame(); // frame 0: nothing yet
        assert_eq!(spec.bus().ula.read_fe(0xFD), 0xFF);

        spec.run_frame(); // frame 1: held
        assert_eq!(spec.bus().ula.read_fe(0xFD), 0xFE);

        spec.run_frame();
        spec.run_frame(); // frame 3: released
        assert_eq!(spec.bus().ula.read_fe(0xFD), 0xFF);
        assert!(spec.key_script().is_empty());
    }

    #[test]
    fn trace_sink_observes_machine_port_writes() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct PortLog(Rc<RefCell<Vec<(u16, u8, bool)>>>);

        impl Trace for PortLog {
            fn on_port(&mut self, port: u16, value: u8, is_read: bool) {
                self.0.borrow_mut().push((port, value, is_read));
            }
        }

        // DI; LD A,2; OUT ($FE),A; HALT
        let mut rom = vec![0u8; 0x4000];
        rom[..6].copy_from_slice(&[0xF3, 0x3E, 0x02, 0xD3, 0xFE, 0x76]);

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut spec = Spectrum::with_trace(&rom, Box::new(PortLog(Rc::clone(&log))))
            .expect("valid ROM");
        spec.run_frame();

        assert_eq!(log.borrow().as_slice(), &[(0x02FE, 0x02, false)]);
        assert_eq!(spec.bus().ula.border_colour(), 2);
    }

    #[test]
    fn flash_advances_once_per_frame() {
        let mut spec = make_spectrum();
        assert_eq!(spec.bus().ula.flash_phase(), 0);
        spec.run_frame();
        spec.run_frame();
        assert_eq!(spec.bus().ula.flash_phase(), 2);
    }
}
