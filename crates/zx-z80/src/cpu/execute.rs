//! Execution of the unprefixed instruction group.
//!
//! The DD/FD index marker arrives as `idx`: it redirects HL operands to IX
//! or IY, turns (HL) into (IX+d)/(IY+d), and maps the H/L register slots to
//! the index-register halves except beside an indexed memory operand. The
//! prefix's own 4 T-states are charged by `step()`; the values returned
//! here are the unprefixed costs plus any displacement overhead.

use zx_core::IoBus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53p};

use super::{Index, Z80};

impl Z80 {
    /// Execute one unprefixed instruction. Returns T-states consumed.
    pub(super) fn execute_main<B: IoBus>(&mut self, bus: &mut B, op: u8, idx: Index) -> u32 {
        match op {
            // NOP
            0x00 => 4,

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word(bus);
                self.set_rp((op >> 4) & 3, idx, value);
                10
            }

            // LD (BC), A
            0x02 => {
                let addr = self.regs.bc();
                let a = self.regs.a;
                self.write8(bus, addr, a);
                self.regs.wz = (u16::from(a) << 8) | (addr.wrapping_add(1) & 0xFF);
                7
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP)
            0x03 | 0x13 | 0x23 | 0x33 => {
                let p = (op >> 4) & 3;
                let value = self.rp(p, idx).wrapping_add(1);
                self.set_rp(p, idx, value);
                6
            }

            // INC r (04=B, 0C=C, 14=D, 1C=E, 24=H, 2C=L, 34=(HL), 3C=A)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (op >> 3) & 7;
                if r == 6 {
                    let addr = self.mem_addr(bus, idx);
                    let value = self.read8(bus, addr);
                    let result = alu::inc8(value);
                    self.write8(bus, addr, result.value);
                    self.regs.f = (self.regs.f & CF) | result.flags;
                    if idx == Index::Hl { 11 } else { 19 }
                } else {
                    let result = alu::inc8(self.reg8(r, idx));
                    self.set_reg8(r, idx, result.value);
                    self.regs.f = (self.regs.f & CF) | result.flags;
                    4
                }
            }

            // DEC r (05=B, 0D=C, 15=D, 1D=E, 25=H, 2D=L, 35=(HL), 3D=A)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (op >> 3) & 7;
                if r == 6 {
                    let addr = self.mem_addr(bus, idx);
                    let value = self.read8(bus, addr);
                    let result = alu::dec8(value);
                    self.write8(bus, addr, result.value);
                    self.regs.f = (self.regs.f & CF) | result.flags;
                    if idx == Index::Hl { 11 } else { 19 }
                } else {
                    let result = alu::dec8(self.reg8(r, idx));
                    self.set_reg8(r, idx, result.value);
                    self.regs.f = (self.regs.f & CF) | result.flags;
                    4
                }
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 36=(HL), 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let r = (op >> 3) & 7;
                if r == 6 {
                    // LD (HL), n — for (IX+d) the displacement precedes n
                    let addr = self.mem_addr(bus, idx);
                    let value = self.fetch_byte(bus);
                    self.write8(bus, addr, value);
                    if idx == Index::Hl { 10 } else { 15 }
                } else {
                    let value = self.fetch_byte(bus);
                    self.set_reg8(r, idx, value);
                    7
                }
            }

            // RLCA
            0x07 => {
                let carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // EX AF, AF'
            0x08 => {
                self.regs.swap_af();
                4
            }

            // ADD HL, rr (09=BC, 19=DE, 29=HL, 39=SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let hl = self.idx_reg(idx);
                let rr = self.rp((op >> 4) & 3, idx);
                self.regs.wz = hl.wrapping_add(1);
                let (value, flags) = alu::add16(hl, rr);
                self.set_idx_reg(idx, value);
                self.regs.f = (self.regs.f & (SF | ZF | PF)) | flags;
                11
            }

            // LD A, (BC)
            0x0A => {
                let addr = self.regs.bc();
                self.regs.a = self.read8(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
                7
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                let p = (op >> 4) & 3;
                let value = self.rp(p, idx).wrapping_sub(1);
                self.set_rp(p, idx, value);
                6
            }

            // RRCA
            0x0F => {
                let carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (carry << 7);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | carry;
                4
            }

            // DJNZ e
            0x10 => {
                let offset = self.fetch_byte(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.regs.wz = self.regs.pc;
                    13
                } else {
                    8
                }
            }

            // LD (DE), A
            0x12 => {
                let addr = self.regs.de();
                let a = self.regs.a;
                self.write8(bus, addr, a);
                self.regs.wz = (u16::from(a) << 8) | (addr.wrapping_add(1) & 0xFF);
                7
            }

            // RLA
            0x17 => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a >> 7;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | new_carry;
                4
            }

            // JR e
            0x18 => {
                let offset = self.fetch_byte(bus) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                self.regs.wz = self.regs.pc;
                12
            }

            // LD A, (DE)
            0x1A => {
                let addr = self.regs.de();
                self.regs.a = self.read8(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
                7
            }

            // RRA
            0x1F => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a & 1;
                self.regs.a = (self.regs.a >> 1) | (old_carry << 7);
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | (self.regs.a & (YF | XF)) | new_carry;
                4
            }

            // JR cc, e (20=NZ, 28=Z, 30=NC, 38=C)
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch_byte(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.regs.wz = self.regs.pc;
                    12
                } else {
                    7
                }
            }

            // LD (nn), HL
            0x22 => {
                let addr = self.fetch_word(bus);
                let value = self.idx_reg(idx);
                self.write16(bus, addr, value);
                self.regs.wz = addr.wrapping_add(1);
                16
            }

            // DAA
            0x27 => {
                self.daa();
                4
            }

            // LD HL, (nn)
            0x2A => {
                let addr = self.fetch_word(bus);
                let value = self.read16(bus, addr);
                self.set_idx_reg(idx, value);
                self.regs.wz = addr.wrapping_add(1);
                16
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.f = (self.regs.f & (SF | ZF | PF | CF))
                    | HF
                    | NF
                    | (self.regs.a & (YF | XF));
                4
            }

            // LD (nn), A
            0x32 => {
                let addr = self.fetch_word(bus);
                let a = self.regs.a;
                self.write8(bus, addr, a);
                self.regs.wz = (u16::from(a) << 8) | (addr.wrapping_add(1) & 0xFF);
                13
            }

            // SCF
            0x37 => {
                self.regs.f =
                    (self.regs.f & (SF | ZF | PF)) | CF | (self.regs.a & (YF | XF));
                4
            }

            // LD A, (nn)
            0x3A => {
                let addr = self.fetch_word(bus);
                self.regs.a = self.read8(bus, addr);
                self.regs.wz = addr.wrapping_add(1);
                13
            }

            // CCF
            0x3F => {
                let old_carry = self.regs.f & CF;
                self.regs.f = (self.regs.f & (SF | ZF | PF))
                    | (self.regs.a & (YF | XF))
                    | if old_carry != 0 { HF } else { CF };
                4
            }

            // HALT
            0x76 => {
                self.regs.halted = true;
                4
            }

            // LD r, r' (40-7F except 76)
            0x40..=0x7F => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    // LD r, (HL) — destination register is never remapped
                    let addr = self.mem_addr(bus, idx);
                    let value = self.read8(bus, addr);
                    self.set_reg8_plain(dst, value);
                    if idx == Index::Hl { 7 } else { 15 }
                } else if dst == 6 {
                    // LD (HL), r
                    let addr = self.mem_addr(bus, idx);
                    let value = self.reg8_plain(src);
                    self.write8(bus, addr, value);
                    if idx == Index::Hl { 7 } else { 15 }
                } else {
                    let value = self.reg8(src, idx);
                    self.set_reg8(dst, idx, value);
                    4
                }
            }

            // ALU A, r (80-BF: ADD/ADC/SUB/SBC/AND/XOR/OR/CP)
            0x80..=0xBF => {
                let r = op & 7;
                if r == 6 {
                    let addr = self.mem_addr(bus, idx);
                    let value = self.read8(bus, addr);
                    self.alu_a(op, value);
                    if idx == Index::Hl { 7 } else { 15 }
                } else {
                    let value = self.reg8(r, idx);
                    self.alu_a(op, value);
                    4
                }
            }

            // RET cc (C0=NZ, C8=Z, D0=NC, D8=C, E0=PO, E8=PE, F0=P, F8=M)
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = self.pop16(bus);
                    self.regs.wz = self.regs.pc;
                    11
                } else {
                    5
                }
            }

            // POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus);
                self.set_rp2((op >> 4) & 3, idx, value);
                10
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = addr;
                }
                10
            }

            // JP nn
            0xC3 => {
                let addr = self.fetch_word(bus);
                self.regs.pc = addr;
                self.regs.wz = addr;
                10
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.fetch_word(bus);
                self.regs.wz = addr;
                if self.condition((op >> 3) & 7) {
                    let ret = self.regs.pc;
                    self.push16(bus, ret);
                    self.regs.pc = addr;
                    17
                } else {
                    10
                }
            }

            // PUSH rr (C5=BC, D5=DE, E5=HL, F5=AF)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.rp2((op >> 4) & 3, idx);
                self.push16(bus, value);
                11
            }

            // ALU A, n (C6=ADD, CE=ADC, D6=SUB, DE=SBC, E6=AND, EE=XOR, F6=OR, FE=CP)
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch_byte(bus);
                self.alu_a(op, value);
                7
            }

            // RST p (C7=00, CF=08, D7=10, DF=18, E7=20, EF=28, F7=30, FF=38)
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = u16::from(op & 0x38);
                let ret = self.regs.pc;
                self.push16(bus, ret);
                self.regs.pc = target;
                self.regs.wz = target;
                11
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop16(bus);
                self.regs.wz = self.regs.pc;
                10
            }

            // CALL nn
            0xCD => {
                let addr = self.fetch_word(bus);
                let ret = self.regs.pc;
                self.push16(bus, ret);
                self.regs.pc = addr;
                self.regs.wz = addr;
                17
            }

            // OUT (n), A — port is A<<8 | n
            0xD3 => {
                let n = self.fetch_byte(bus);
                let a = self.regs.a;
                let port = (u16::from(a) << 8) | u16::from(n);
                self.port_out(bus, port, a);
                self.regs.wz =
                    (u16::from(a) << 8) | (u16::from(n.wrapping_add(1)) & 0xFF);
                11
            }

            // EXX
            0xD9 => {
                self.regs.exx();
                4
            }

            // IN A, (n) — port is A<<8 | n; no flags
            0xDB => {
                let n = self.fetch_byte(bus);
                let port = (u16::from(self.regs.a) << 8) | u16::from(n);
                self.regs.a = self.port_in(bus, port);
                self.regs.wz = port.wrapping_add(1);
                11
            }

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let from_stack = self.read16(bus, sp);
                let from_reg = self.idx_reg(idx);
                self.write16(bus, sp, from_reg);
                self.set_idx_reg(idx, from_stack);
                self.regs.wz = from_stack;
                19
            }

            // JP (HL)
            0xE9 => {
                self.regs.pc = self.idx_reg(idx);
                4
            }

            // EX DE, HL — always the real HL, even under DD/FD
            0xEB => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
                4
            }

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
                4
            }

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.idx_reg(idx);
                6
            }

            // EI — interrupt acceptance is deferred by one instruction
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.ei_delay = true;
                4
            }

            _ => unreachable!("prefix bytes are decoded in step()"),
        }
    }

    /// The eight accumulator operations, selected by opcode bits 3-5.
    pub(super) fn alu_a(&mut self, op: u8, value: u8) {
        match (op >> 3) & 7 {
            0 => {
                // ADD
                let result = alu::add8(self.regs.a, value, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            1 => {
                // ADC
                let result = alu::add8(self.regs.a, value, self.carry());
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            2 => {
                // SUB
                let result = alu::sub8(self.regs.a, value, false);
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            3 => {
                // SBC
                let result = alu::sub8(self.regs.a, value, self.carry());
                self.regs.a = result.value;
                self.regs.f = result.flags;
            }
            4 => {
                // AND
                self.regs.a &= value;
                self.regs.f = sz53p(self.regs.a) | HF;
            }
            5 => {
                // XOR
                self.regs.a ^= value;
                self.regs.f = sz53p(self.regs.a);
            }
            6 => {
                // OR
                self.regs.a |= value;
                self.regs.f = sz53p(self.regs.a);
            }
            7 => {
                // CP — undocumented bits come from the operand, not the result
                let result = alu::sub8(self.regs.a, value, false);
                self.regs.f = (result.flags & !(YF | XF)) | (value & (YF | XF));
            }
            _ => unreachable!("operation selector is three bits"),
        }
    }

    /// Decimal adjust after addition or subtraction.
    fn daa(&mut self) {
        let a = self.regs.a;
        let nf = self.regs.f & NF != 0;
        let cf = self.regs.f & CF != 0;
        let hf = self.regs.f & HF != 0;

        let mut correction: u8 = 0;
        let mut new_cf = cf;

        if hf || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if cf || a > 0x99 {
            correction |= 0x60;
            new_cf = true;
        }

        let result = if nf {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let new_hf = if nf {
            hf && (a & 0x0F) < 6
        } else {
            (a & 0x0F) > 9
        };

        self.regs.a = result;
        self.regs.f = sz53p(result)
            | if nf { NF } else { 0 }
            | if new_cf { CF } else { 0 }
            | if new_hf { HF } else { 0 };
    }
}
