//! Execution of the ED prefix group.
//!
//! Covers 16-bit ADC/SBC, the ED-form 16-bit loads, register/interrupt
//! plumbing (LD A,I, IM n, RETN/RETI), RLD/RRD, port I/O through BC, and
//! the block transfer/compare/I-O family. The repeating variants rewind PC
//! by two so the instruction is re-fetched on the next step — that keeps
//! them interruptible and single-step visible, and matches the documented
//! 21/16 T-state split between repeating and terminating iterations.
//!
//! Anything undefined in the ED space executes as an 8 T-state NOP,
//! reported only to the trace sink.

use zx_core::IoBus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};

use super::Z80;

impl Z80 {
    /// Execute one ED-space instruction. Returns T-states consumed.
    pub(super) fn execute_ed<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let pc = self.regs.pc;
        let op = self.fetch_opcode(bus);

        match op {
            // IN r, (C) — port is BC; r=6 sets flags and discards
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc();
                let value = self.port_in(bus, port);
                self.regs.wz = port.wrapping_add(1);
                let r = (op >> 3) & 7;
                if r != 6 {
                    self.set_reg8_plain(r, value);
                }
                self.regs.f = (self.regs.f & CF) | sz53p(value);
                12
            }

            // OUT (C), r — r=6 outputs 0
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let port = self.regs.bc();
                let r = (op >> 3) & 7;
                let value = if r == 6 { 0 } else { self.reg8_plain(r) };
                self.port_out(bus, port, value);
                self.regs.wz = port.wrapping_add(1);
                12
            }

            // SBC HL, rr (42=BC, 52=DE, 62=HL, 72=SP)
            0x42 | 0x52 | 0x62 | 0x72 => {
                let hl = self.regs.hl();
                let rr = self.ed_rp((op >> 4) & 3);
                self.regs.wz = hl.wrapping_add(1);
                let (value, flags) = alu::sbc16(hl, rr, self.carry());
                self.regs.set_hl(value);
                self.regs.f = flags;
                15
            }

            // ADC HL, rr (4A=BC, 5A=DE, 6A=HL, 7A=SP)
            0x4A | 0x5A | 0x6A | 0x7A => {
                let hl = self.regs.hl();
                let rr = self.ed_rp((op >> 4) & 3);
                self.regs.wz = hl.wrapping_add(1);
                let (value, flags) = alu::adc16(hl, rr, self.carry());
                self.regs.set_hl(value);
                self.regs.f = flags;
                15
            }

            // LD (nn), rr (43=BC, 53=DE, 63=HL, 73=SP)
            0x43 | 0x53 | 0x63 | 0x73 => {
                let addr = self.fetch_word(bus);
                let value = self.ed_rp((op >> 4) & 3);
                self.write16(bus, addr, value);
                self.regs.wz = addr.wrapping_add(1);
                20
            }

            // LD rr, (nn) (4B=BC, 5B=DE, 6B=HL, 7B=SP)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let addr = self.fetch_word(bus);
                let value = self.read16(bus, addr);
                self.set_ed_rp((op >> 4) & 3, value);
                self.regs.wz = addr.wrapping_add(1);
                20
            }

            // NEG (44 plus undocumented mirrors)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
                8
            }

            // RETN (45 plus mirrors) / RETI (4D) — both restore IFF1 from IFF2
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.pc = self.pop16(bus);
                self.regs.wz = self.regs.pc;
                self.regs.iff1 = self.regs.iff2;
                14
            }

            // IM 0 (46, 4E, 66, 6E)
            0x46 | 0x4E | 0x66 | 0x6E => {
                self.regs.im = 0;
                8
            }

            // IM 1 (56, 76)
            0x56 | 0x76 => {
                self.regs.im = 1;
                8
            }

            // IM 2 (5E, 7E)
            0x5E | 0x7E => {
                self.regs.im = 2;
                8
            }

            // LD I, A
            0x47 => {
                self.regs.i = self.regs.a;
                9
            }

            // LD R, A
            0x4F => {
                self.regs.r = self.regs.a;
                9
            }

            // LD A, I — P/V reads IFF2
            0x57 => {
                self.regs.a = self.regs.i;
                self.regs.f = (self.regs.f & CF)
                    | sz53(self.regs.a)
                    | if self.regs.iff2 { PF } else { 0 };
                9
            }

            // LD A, R — P/V reads IFF2
            0x5F => {
                self.regs.a = self.regs.r;
                self.regs.f = (self.regs.f & CF)
                    | sz53(self.regs.a)
                    | if self.regs.iff2 { PF } else { 0 };
                9
            }

            // RRD — low nibble of (HL) into A, nibbles rotate right
            0x67 => {
                let addr = self.regs.hl();
                let value = self.read8(bus, addr);
                let a = self.regs.a;
                let new_value = ((a & 0x0F) << 4) | (value >> 4);
                self.regs.a = (a & 0xF0) | (value & 0x0F);
                self.write8(bus, addr, new_value);
                self.regs.wz = addr.wrapping_add(1);
                self.regs.f = (self.regs.f & CF) | sz53p(self.regs.a);
                18
            }

            // RLD — low nibble of A into (HL), nibbles rotate left
            0x6F => {
                let addr = self.regs.hl();
                let value = self.read8(bus, addr);
                let a = self.regs.a;
                let new_value = (value << 4) | (a & 0x0F);
                self.regs.a = (a & 0xF0) | (value >> 4);
                self.write8(bus, addr, new_value);
                self.regs.wz = addr.wrapping_add(1);
                self.regs.f = (self.regs.f & CF) | sz53p(self.regs.a);
                18
            }

            // LDI / LDD
            0xA0 => {
                self.block_ld(bus, 1);
                16
            }
            0xA8 => {
                self.block_ld(bus, -1);
                16
            }

            // LDIR / LDDR — rewind PC while BC != 0
            0xB0 | 0xB8 => {
                let delta = if op == 0xB0 { 1 } else { -1 };
                self.block_ld(bus, delta);
                if self.regs.bc() != 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                    21
                } else {
                    16
                }
            }

            // CPI / CPD
            0xA1 => {
                self.block_cp(bus, 1);
                16
            }
            0xA9 => {
                self.block_cp(bus, -1);
                16
            }

            // CPIR / CPDR — rewind while BC != 0 and no match
            0xB1 | 0xB9 => {
                let delta = if op == 0xB1 { 1 } else { -1 };
                self.block_cp(bus, delta);
                if self.regs.bc() != 0 && self.regs.f & ZF == 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    self.regs.wz = self.regs.pc.wrapping_add(1);
                    21
                } else {
                    16
                }
            }

            // INI / IND
            0xA2 => {
                self.block_in(bus, 1);
                16
            }
            0xAA => {
                self.block_in(bus, -1);
                16
            }

            // INIR / INDR — rewind while B != 0
            0xB2 | 0xBA => {
                let delta = if op == 0xB2 { 1 } else { -1 };
                self.block_in(bus, delta);
                if self.regs.b != 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            // OUTI / OUTD
            0xA3 => {
                self.block_out(bus, 1);
                16
            }
            0xAB => {
                self.block_out(bus, -1);
                16
            }

            // OTIR / OTDR — rewind while B != 0
            0xB3 | 0xBB => {
                let delta = if op == 0xB3 { 1 } else { -1 };
                self.block_out(bus, delta);
                if self.regs.b != 0 {
                    self.regs.pc = self.regs.pc.wrapping_sub(2);
                    21
                } else {
                    16
                }
            }

            // Everything else in the ED space is a two-byte NOP
            _ => {
                self.note_invalid(pc.wrapping_sub(1), op);
                8
            }
        }
    }

    /// ED-group register pair decode (always the real HL).
    fn ed_rp(&self, p: u8) -> u16 {
        match p {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!("register pair index is two bits"),
        }
    }

    fn set_ed_rp(&mut self, p: u8, value: u16) {
        match p {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!("register pair index is two bits"),
        }
    }

    /// One LDI/LDD iteration: (DE) ← (HL), both advance by `delta`,
    /// BC decrements. P/V reports BC != 0; X/Y derive from
    /// `transferred + A`.
    fn block_ld<B: IoBus>(&mut self, bus: &mut B, delta: i16) {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.read8(bus, hl);
        self.write8(bus, de, value);
        self.regs.set_hl(hl.wrapping_add(delta as u16));
        self.regs.set_de(de.wrapping_add(delta as u16));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        let mut f = self.regs.f & (SF | ZF | CF);
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;
    }

    /// One CPI/CPD iteration: compare A with (HL), HL advances by `delta`,
    /// BC decrements. Carry is preserved; Z reports a match; X/Y derive
    /// from the difference less the half-borrow.
    fn block_cp<B: IoBus>(&mut self, bus: &mut B, delta: i16) {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        let result = alu::sub8(self.regs.a, value, false);
        self.regs.set_hl(hl.wrapping_add(delta as u16));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.regs.wz = self.regs.wz.wrapping_add(delta as u16);

        let mut n = result.value;
        if result.flags & HF != 0 {
            n = n.wrapping_sub(1);
        }
        let mut f = (self.regs.f & CF) | NF | (result.flags & (SF | ZF | HF));
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;
    }

    /// One INI/IND iteration: (HL) ← port BC, B decrements, HL advances.
    fn block_in<B: IoBus>(&mut self, bus: &mut B, delta: i16) {
        let port = self.regs.bc();
        self.regs.wz = port.wrapping_add(delta as u16);
        let value = self.port_in(bus, port);
        let hl = self.regs.hl();
        self.write8(bus, hl, value);
        self.regs.set_hl(hl.wrapping_add(delta as u16));
        self.regs.b = self.regs.b.wrapping_sub(1);

        let k = u16::from(value) + u16::from(self.regs.c.wrapping_add(delta as u8));
        self.regs.f = Self::block_io_flags(self.regs.b, value, k);
    }

    /// One OUTI/OUTD iteration: port BC ← (HL) with B already decremented,
    /// HL advances.
    fn block_out<B: IoBus>(&mut self, bus: &mut B, delta: i16) {
        let hl = self.regs.hl();
        let value = self.read8(bus, hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let port = self.regs.bc();
        self.port_out(bus, port, value);
        self.regs.wz = port.wrapping_add(delta as u16);
        self.regs.set_hl(hl.wrapping_add(delta as u16));

        let k = u16::from(value) + u16::from(self.regs.l);
        self.regs.f = Self::block_io_flags(self.regs.b, value, k);
    }

    /// Shared flag rule for the block I/O group: S/Z/X/Y from the new B,
    /// N from bit 7 of the transferred byte, H and C from the 9-bit sum,
    /// P/V from the parity of `(k & 7) ^ B`.
    fn block_io_flags(b: u8, value: u8, k: u16) -> u8 {
        let mut f = sz53(b);
        if value & 0x80 != 0 {
            f |= NF;
        }
        if k > 0xFF {
            f |= HF | CF;
        }
        f | parity((k as u8 & 0x07) ^ b)
    }
}
