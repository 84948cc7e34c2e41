//! Execution of the CB prefix group: rotates, shifts and bit operations.
//!
//! Under DD/FD the byte order differs from every other prefix: the
//! displacement is the third byte and the operation byte is the fourth, and
//! every operation acts on (IX+d)/(IY+d) regardless of its register field.
//! A non-6 register field additionally receives a copy of the result (the
//! undocumented "store" forms).

use zx_core::IoBus;

use crate::alu::{self, AluResult};
use crate::flags::{CF, HF, PF, SF, XF, YF, ZF};

use super::{Index, Z80};

impl Z80 {
    /// Execute one CB-space instruction. Returns T-states consumed
    /// (excluding the 4 charged for a DD/FD prefix).
    pub(super) fn execute_cb<B: IoBus>(&mut self, bus: &mut B, idx: Index) -> u32 {
        if idx == Index::Hl {
            let op = self.fetch_opcode(bus);
            let r = op & 7;
            let b = (op >> 3) & 7;

            match op >> 6 {
                // Rotates and shifts
                0 => {
                    if r == 6 {
                        let addr = self.regs.hl();
                        let value = self.read8(bus, addr);
                        let result = self.rotate_op(b, value);
                        self.write8(bus, addr, result.value);
                        self.regs.f = result.flags;
                        15
                    } else {
                        let result = self.rotate_op(b, self.reg8_plain(r));
                        self.set_reg8_plain(r, result.value);
                        self.regs.f = result.flags;
                        8
                    }
                }

                // BIT b, r
                1 => {
                    if r == 6 {
                        let addr = self.regs.hl();
                        let value = self.read8(bus, addr);
                        // X/Y leak from the internal address latch
                        self.bit_flags(b, value, (self.regs.wz >> 8) as u8);
                        12
                    } else {
                        let value = self.reg8_plain(r);
                        self.bit_flags(b, value, value);
                        8
                    }
                }

                // RES b, r
                2 => {
                    if r == 6 {
                        let addr = self.regs.hl();
                        let value = self.read8(bus, addr) & !(1 << b);
                        self.write8(bus, addr, value);
                        15
                    } else {
                        let value = self.reg8_plain(r) & !(1 << b);
                        self.set_reg8_plain(r, value);
                        8
                    }
                }

                // SET b, r
                _ => {
                    if r == 6 {
                        let addr = self.regs.hl();
                        let value = self.read8(bus, addr) | (1 << b);
                        self.write8(bus, addr, value);
                        15
                    } else {
                        let value = self.reg8_plain(r) | (1 << b);
                        self.set_reg8_plain(r, value);
                        8
                    }
                }
            }
        } else {
            // DDCB/FDCB: displacement first, then the operation byte
            let d = self.fetch_byte(bus) as i8;
            let addr = self.idx_reg(idx).wrapping_add(d as u16);
            self.regs.wz = addr;
            let op = self.fetch_byte(bus);
            let r = op & 7;
            let b = (op >> 3) & 7;

            match op >> 6 {
                0 => {
                    let value = self.read8(bus, addr);
                    let result = self.rotate_op(b, value);
                    self.write8(bus, addr, result.value);
                    if r != 6 {
                        self.set_reg8_plain(r, result.value);
                    }
                    self.regs.f = result.flags;
                    19
                }

                1 => {
                    let value = self.read8(bus, addr);
                    self.bit_flags(b, value, (addr >> 8) as u8);
                    16
                }

                2 => {
                    let value = self.read8(bus, addr) & !(1 << b);
                    self.write8(bus, addr, value);
                    if r != 6 {
                        self.set_reg8_plain(r, value);
                    }
                    19
                }

                _ => {
                    let value = self.read8(bus, addr) | (1 << b);
                    self.write8(bus, addr, value);
                    if r != 6 {
                        self.set_reg8_plain(r, value);
                    }
                    19
                }
            }
        }
    }

    /// Rotate/shift selected by opcode bits 3-5:
    /// RLC, RRC, RL, RR, SLA, SRA, SLL, SRL.
    fn rotate_op(&self, kind: u8, value: u8) -> AluResult {
        match kind {
            0 => alu::rlc(value),
            1 => alu::rrc(value),
            2 => alu::rl(value, self.carry()),
            3 => alu::rr(value, self.carry()),
            4 => alu::sla(value),
            5 => alu::sra(value),
            6 => alu::sll(value),
            7 => alu::srl(value),
            _ => unreachable!("rotate selector is three bits"),
        }
    }

    /// BIT b: Z (and P/V) from the complement of the tested bit, H set,
    /// N clear, C preserved, S only for a set bit 7. X/Y come from
    /// `xy_source` — the operand for registers, the address high byte for
    /// memory forms.
    fn bit_flags(&mut self, b: u8, value: u8, xy_source: u8) {
        let tested = value & (1 << b);
        let mut f = (self.regs.f & CF) | HF | (xy_source & (YF | XF));
        if tested == 0 {
            f |= ZF | PF;
        }
        if b == 7 && tested != 0 {
            f |= SF;
        }
        self.regs.f = f;
    }
}
