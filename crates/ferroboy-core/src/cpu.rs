use crate::mmu::Mmu;
use crate::registers::{Registers, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

// Interrupt vectors (gbdev.io/pandocs/Interrupts.html)
const INTERRUPT_VBLANK: u16 = 0x40;
const INTERRUPT_STAT: u16 = 0x48;
const INTERRUPT_TIMER: u16 = 0x50;
const INTERRUPT_SERIAL: u16 = 0x58;
const INTERRUPT_JOYPAD: u16 = 0x60;

// T-cycles per machine cycle, and the fixed cost of an interrupt dispatch.
const M_CYCLE: u32 = 4;
const DISPATCH_CYCLES: u32 = 20;

/// The Sharp LR35902 CPU core.
///
/// [`Cpu::step`] executes one instruction (or one idle slot while halted
/// or stopped), advances the timer by the consumed T-cycles, services a
/// pending interrupt, and returns the total cost. Costs are charged at
/// one M-cycle per memory access or internal delay, so per-instruction
/// totals match the documented timing tables without a separate cost
/// table.
pub struct Cpu {
    pub regs: Registers,
    /// Monotonic T-cycle counter across the whole run.
    pub cycles: u64,
    /// Interrupt master enable.
    pub ime: bool,
    /// Set by EI; promoted to `ime` after the following instruction.
    pub ime_pending: bool,
    pub halted: bool,
    pub stopped: bool,
    /// Set when HALT is executed with IME clear and an interrupt already
    /// pending: the next fetch reads its byte without advancing PC.
    pub halt_bug: bool,
    step_cycles: u32,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            cycles: 0,
            ime: false,
            ime_pending: false,
            halted: false,
            stopped: false,
            halt_bug: false,
            step_cycles: 0,
        }
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    /// Execute one fetch/decode/execute cycle and return the T-cycles
    /// consumed, including a trailing interrupt dispatch if one occurred.
    pub fn step(&mut self, mmu: &mut Mmu) -> u32 {
        if self.stopped {
            self.advance(mmu, M_CYCLE);
            return M_CYCLE;
        }

        if self.halted {
            if mmu.interrupt_pending() {
                self.halted = false;
            } else {
                self.advance(mmu, M_CYCLE);
                return M_CYCLE;
            }
        }

        // EI takes effect after the instruction that follows it, so latch
        // the pending state before executing.
        let enable_after = self.ime_pending;
        self.step_cycles = 0;

        let opcode = if self.halt_bug {
            // The bugged fetch does not advance PC, so the byte after HALT
            // executes twice.
            self.halt_bug = false;
            self.read8(mmu, self.regs.pc)
        } else {
            self.fetch8(mmu)
        };

        self.execute(opcode, mmu);

        if enable_after && self.ime_pending {
            self.ime = true;
            self.ime_pending = false;
        }

        let mut consumed = self.step_cycles;
        self.advance(mmu, consumed);
        consumed += self.service_interrupts(mmu);
        consumed
    }

    fn advance(&mut self, mmu: &mut Mmu, t_cycles: u32) {
        self.cycles += t_cycles as u64;
        mmu.timer.step(t_cycles, &mut mmu.if_reg);
    }

    fn next_interrupt(pending: u8) -> (u8, u16) {
        if pending & 0x01 != 0 {
            (0x01, INTERRUPT_VBLANK)
        } else if pending & 0x02 != 0 {
            (0x02, INTERRUPT_STAT)
        } else if pending & 0x04 != 0 {
            (0x04, INTERRUPT_TIMER)
        } else if pending & 0x08 != 0 {
            (0x08, INTERRUPT_SERIAL)
        } else {
            (0x10, INTERRUPT_JOYPAD)
        }
    }

    fn service_interrupts(&mut self, mmu: &mut Mmu) -> u32 {
        if !self.ime {
            return 0;
        }
        let pending = (mmu.if_reg & mmu.ie_reg) & 0x1F;
        if pending == 0 {
            return 0;
        }

        let (bit, vector) = Self::next_interrupt(pending);
        self.ime = false;
        mmu.if_reg &= !bit;

        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, (self.regs.pc >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write_byte(self.regs.sp, self.regs.pc as u8);

        core_trace!(target: "cpu", "interrupt {bit:02X} dispatched to {vector:04X}");
        self.regs.pc = vector;
        self.advance(mmu, DISPATCH_CYCLES);
        DISPATCH_CYCLES
    }

    #[inline(always)]
    fn tick(&mut self, m_cycles: u8) {
        self.step_cycles += M_CYCLE * m_cycles as u32;
    }

    #[inline(always)]
    fn fetch8(&mut self, mmu: &mut Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.tick(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    #[inline(always)]
    fn read8(&mut self, mmu: &mut Mmu, addr: u16) -> u8 {
        let val = mmu.read_byte(addr);
        self.tick(1);
        val
    }

    #[inline(always)]
    fn write8(&mut self, mmu: &mut Mmu, addr: u16, val: u8) {
        mmu.write_byte(addr, val);
        self.tick(1);
    }

    fn push_stack(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, val as u8);
    }

    fn pop_stack(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.read8(mmu, self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read8(mmu, self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    // Operand index decode shared by the regular opcode blocks: indices
    // 0-7 select B, C, D, E, H, L, (HL), A, where 6 is the memory byte at
    // HL and charges its access cycle.
    fn read_reg(&mut self, mmu: &mut Mmu, index: u8) -> u8 {
        match index {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => {
                let addr = self.regs.hl();
                self.read8(mmu, addr)
            }
            7 => self.regs.a,
            _ => unreachable!(),
        }
    }

    fn write_reg(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index {
            0 => self.regs.b = val,
            1 => self.regs.c = val,
            2 => self.regs.d = val,
            3 => self.regs.e = val,
            4 => self.regs.h = val,
            5 => self.regs.l = val,
            6 => {
                let addr = self.regs.hl();
                self.write8(mmu, addr, val);
            }
            7 => self.regs.a = val,
            _ => unreachable!(),
        }
    }

    // Register-pair decode for the 16-bit load/arithmetic rows (BC, DE,
    // HL, SP).
    fn read_pair(&self, index: u8) -> u16 {
        match index {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    fn write_pair(&mut self, index: u8, val: u16) {
        match index {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            3 => self.regs.sp = val,
            _ => unreachable!(),
        }
    }

    // Branch condition decode: NZ, Z, NC, C.
    fn condition(&self, index: u8) -> bool {
        match index {
            0 => self.regs.f & FLAG_Z == 0,
            1 => self.regs.f & FLAG_Z != 0,
            2 => self.regs.f & FLAG_C == 0,
            3 => self.regs.f & FLAG_C != 0,
            _ => unreachable!(),
        }
    }

    fn inc8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        self.regs.f = (self.regs.f & FLAG_C)
            | if res == 0 { FLAG_Z } else { 0 }
            | if (val & 0x0F) + 1 > 0x0F { FLAG_H } else { 0 };
        res
    }

    fn dec8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        self.regs.f = (self.regs.f & FLAG_C)
            | FLAG_N
            | if res == 0 { FLAG_Z } else { 0 }
            | if val & 0x0F == 0 { FLAG_H } else { 0 };
        res
    }

    fn add_a(&mut self, val: u8) {
        let (res, carry) = self.regs.a.overflowing_add(val);
        self.regs.f = if res == 0 { FLAG_Z } else { 0 }
            | if (self.regs.a & 0x0F) + (val & 0x0F) > 0x0F {
                FLAG_H
            } else {
                0
            }
            | if carry { FLAG_C } else { 0 };
        self.regs.a = res;
    }

    fn adc_a(&mut self, val: u8) {
        let carry_in = if self.regs.f & FLAG_C != 0 { 1 } else { 0 };
        let (res1, carry1) = self.regs.a.overflowing_add(val);
        let (res2, carry2) = res1.overflowing_add(carry_in);
        self.regs.f = if res2 == 0 { FLAG_Z } else { 0 }
            | if (self.regs.a & 0x0F) + (val & 0x0F) + carry_in > 0x0F {
                FLAG_H
            } else {
                0
            }
            | if carry1 || carry2 { FLAG_C } else { 0 };
        self.regs.a = res2;
    }

    fn sub_a(&mut self, val: u8) {
        let (res, borrow) = self.regs.a.overflowing_sub(val);
        self.regs.f = FLAG_N
            | if res == 0 { FLAG_Z } else { 0 }
            | if (self.regs.a & 0x0F) < (val & 0x0F) {
                FLAG_H
            } else {
                0
            }
            | if borrow { FLAG_C } else { 0 };
        self.regs.a = res;
    }

    fn sbc_a(&mut self, val: u8) {
        let carry_in = if self.regs.f & FLAG_C != 0 { 1 } else { 0 };
        let (res1, borrow1) = self.regs.a.overflowing_sub(val);
        let (res2, borrow2) = res1.overflowing_sub(carry_in);
        self.regs.f = FLAG_N
            | if res2 == 0 { FLAG_Z } else { 0 }
            | if (self.regs.a & 0x0F) < (val & 0x0F) + carry_in {
                FLAG_H
            } else {
                0
            }
            | if borrow1 || borrow2 { FLAG_C } else { 0 };
        self.regs.a = res2;
    }

    fn and_a(&mut self, val: u8) {
        self.regs.a &= val;
        self.regs.f = if self.regs.a == 0 { FLAG_Z } else { 0 } | FLAG_H;
    }

    fn xor_a(&mut self, val: u8) {
        self.regs.a ^= val;
        self.regs.f = if self.regs.a == 0 { FLAG_Z } else { 0 };
    }

    fn or_a(&mut self, val: u8) {
        self.regs.a |= val;
        self.regs.f = if self.regs.a == 0 { FLAG_Z } else { 0 };
    }

    fn cp_a(&mut self, val: u8) {
        let res = self.regs.a.wrapping_sub(val);
        self.regs.f = FLAG_N
            | if res == 0 { FLAG_Z } else { 0 }
            | if (self.regs.a & 0x0F) < (val & 0x0F) {
                FLAG_H
            } else {
                0
            }
            | if self.regs.a < val { FLAG_C } else { 0 };
    }

    fn alu_a(&mut self, op: u8, val: u8) {
        match op & 0x07 {
            0 => self.add_a(val),
            1 => self.adc_a(val),
            2 => self.sub_a(val),
            3 => self.sbc_a(val),
            4 => self.and_a(val),
            5 => self.xor_a(val),
            6 => self.or_a(val),
            _ => self.cp_a(val),
        }
    }

    fn add_hl(&mut self, val: u16) {
        let hl = self.regs.hl();
        let res = hl.wrapping_add(val);
        self.regs.f = (self.regs.f & FLAG_Z)
            | if ((hl & 0x0FFF) + (val & 0x0FFF)) & 0x1000 != 0 {
                FLAG_H
            } else {
                0
            }
            | if (hl as u32 + val as u32) > 0xFFFF {
                FLAG_C
            } else {
                0
            };
        self.regs.set_hl(res);
        self.tick(1);
    }

    // Shared by ADD SP,e8 and LD HL,SP+e8. H and C come from the unsigned
    // low bits regardless of the sign of the offset.
    fn sp_plus_e8(&mut self, mmu: &mut Mmu) -> u16 {
        let val = self.fetch8(mmu) as i8 as i16 as u16;
        let sp = self.regs.sp;
        self.regs.f = if ((sp & 0x0F) + (val & 0x0F)) > 0x0F {
            FLAG_H
        } else {
            0
        } | if ((sp & 0xFF) + (val & 0xFF)) > 0xFF {
            FLAG_C
        } else {
            0
        };
        sp.wrapping_add(val)
    }

    fn execute(&mut self, opcode: u8, mmu: &mut Mmu) {
        match opcode {
            0x00 => {}
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(mmu);
                self.write_pair((opcode >> 4) & 0x03, val);
            }
            0x02 => {
                let addr = self.regs.bc();
                self.write8(mmu, addr, self.regs.a);
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.read_pair(idx).wrapping_add(1);
                self.write_pair(idx, val);
                self.tick(1);
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (opcode >> 3) & 0x07;
                let val = self.read_reg(mmu, r);
                let res = self.inc8(val);
                self.write_reg(mmu, r, res);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (opcode >> 3) & 0x07;
                let val = self.read_reg(mmu, r);
                let res = self.dec8(val);
                self.write_reg(mmu, r, res);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let val = self.fetch8(mmu);
                self.write_reg(mmu, (opcode >> 3) & 0x07, val);
            }
            0x07 => {
                // RLCA; unlike CB RLC A, Z is forced to 0.
                let carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                self.regs.f = if carry { FLAG_C } else { 0 };
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                self.write8(mmu, addr, self.regs.sp as u8);
                self.write8(mmu, addr.wrapping_add(1), (self.regs.sp >> 8) as u8);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let val = self.read_pair((opcode >> 4) & 0x03);
                self.add_hl(val);
            }
            0x0A => {
                let addr = self.regs.bc();
                self.regs.a = self.read8(mmu, addr);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let idx = (opcode >> 4) & 0x03;
                let val = self.read_pair(idx).wrapping_sub(1);
                self.write_pair(idx, val);
                self.tick(1);
            }
            0x0F => {
                let carry = self.regs.a & 0x01 != 0;
                self.regs.a = self.regs.a.rotate_right(1);
                self.regs.f = if carry { FLAG_C } else { 0 };
            }
            0x10 => {
                // STOP is a two-byte opcode; the operand byte is consumed
                // and ignored.
                let _ = self.fetch8(mmu);
                self.stopped = true;
            }
            0x12 => {
                let addr = self.regs.de();
                self.write8(mmu, addr, self.regs.a);
            }
            0x17 => {
                let carry = self.regs.a & 0x80 != 0;
                let carry_in = if self.regs.f & FLAG_C != 0 { 1 } else { 0 };
                self.regs.a = (self.regs.a << 1) | carry_in;
                self.regs.f = if carry { FLAG_C } else { 0 };
            }
            0x18 => {
                let offset = self.fetch8(mmu) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                self.tick(1);
            }
            0x1A => {
                let addr = self.regs.de();
                self.regs.a = self.read8(mmu, addr);
            }
            0x1F => {
                let carry = self.regs.a & 0x01 != 0;
                let carry_in = if self.regs.f & FLAG_C != 0 { 0x80 } else { 0 };
                self.regs.a = (self.regs.a >> 1) | carry_in;
                self.regs.f = if carry { FLAG_C } else { 0 };
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                // The offset is consumed whether or not the branch is taken.
                let offset = self.fetch8(mmu) as i8;
                if self.condition((opcode >> 3) & 0x03) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    self.tick(1);
                }
            }
            0x22 => {
                let addr = self.regs.hl();
                self.write8(mmu, addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_add(1));
            }
            0x27 => {
                // DAA corrects A into packed BCD using N/H/C left by the
                // previous arithmetic op (gbdev.io/pandocs/CPU_Instruction_Set.html).
                let mut correction = 0u8;
                let mut carry = false;
                if self.regs.f & FLAG_H != 0
                    || (self.regs.f & FLAG_N == 0 && self.regs.a & 0x0F > 0x09)
                {
                    correction |= 0x06;
                }
                if self.regs.f & FLAG_C != 0 || (self.regs.f & FLAG_N == 0 && self.regs.a > 0x99) {
                    correction |= 0x60;
                    carry = true;
                }
                if self.regs.f & FLAG_N == 0 {
                    self.regs.a = self.regs.a.wrapping_add(correction);
                } else {
                    self.regs.a = self.regs.a.wrapping_sub(correction);
                }
                self.regs.f = if self.regs.a == 0 { FLAG_Z } else { 0 }
                    | (self.regs.f & FLAG_N)
                    | if carry { FLAG_C } else { 0 };
            }
            0x2A => {
                let addr = self.regs.hl();
                self.regs.a = self.read8(mmu, addr);
                self.regs.set_hl(addr.wrapping_add(1));
            }
            0x2F => {
                self.regs.a ^= 0xFF;
                self.regs.f = (self.regs.f & (FLAG_Z | FLAG_C)) | FLAG_N | FLAG_H;
            }
            0x32 => {
                let addr = self.regs.hl();
                self.write8(mmu, addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_sub(1));
            }
            0x37 => {
                self.regs.f = (self.regs.f & FLAG_Z) | FLAG_C;
            }
            0x3A => {
                let addr = self.regs.hl();
                self.regs.a = self.read8(mmu, addr);
                self.regs.set_hl(addr.wrapping_sub(1));
            }
            0x3F => {
                self.regs.f =
                    (self.regs.f & FLAG_Z) | if self.regs.f & FLAG_C != 0 { 0 } else { FLAG_C };
            }
            0x76 => {
                // HALT. With IME clear and an interrupt already pending the
                // CPU does not halt; instead the next fetch re-reads its
                // byte (the DMG halt bug). The pending check happens here,
                // at HALT's execution, not at the later fetch.
                if self.ime || !mmu.interrupt_pending() {
                    self.halted = true;
                } else {
                    self.halt_bug = true;
                }
            }
            opcode @ 0x40..=0x7F => {
                let val = self.read_reg(mmu, opcode & 0x07);
                self.write_reg(mmu, (opcode >> 3) & 0x07, val);
            }
            opcode @ 0x80..=0xBF => {
                let val = self.read_reg(mmu, opcode & 0x07);
                self.alu_a((opcode >> 3) & 0x07, val);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                self.tick(1);
                if self.condition((opcode >> 3) & 0x03) {
                    self.regs.pc = self.pop_stack(mmu);
                    self.tick(1);
                }
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let val = self.pop_stack(mmu);
                match (opcode >> 4) & 0x03 {
                    0 => self.regs.set_bc(val),
                    1 => self.regs.set_de(val),
                    2 => self.regs.set_hl(val),
                    // POP AF: the flag register has no low nibble.
                    _ => self.regs.set_af(val),
                }
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let addr = self.fetch16(mmu);
                if self.condition((opcode >> 3) & 0x03) {
                    self.regs.pc = addr;
                    self.tick(1);
                }
            }
            0xC3 => {
                let addr = self.fetch16(mmu);
                self.regs.pc = addr;
                self.tick(1);
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let addr = self.fetch16(mmu);
                if self.condition((opcode >> 3) & 0x03) {
                    self.tick(1);
                    self.push_stack(mmu, self.regs.pc);
                    self.regs.pc = addr;
                }
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let val = match (opcode >> 4) & 0x03 {
                    0 => self.regs.bc(),
                    1 => self.regs.de(),
                    2 => self.regs.hl(),
                    _ => self.regs.af(),
                };
                self.tick(1);
                self.push_stack(mmu, val);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.fetch8(mmu);
                self.alu_a((opcode >> 3) & 0x07, val);
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = (opcode & 0x38) as u16;
                self.tick(1);
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = target;
            }
            0xC9 => {
                self.regs.pc = self.pop_stack(mmu);
                self.tick(1);
            }
            0xCB => {
                let op = self.fetch8(mmu);
                self.handle_cb(op, mmu);
            }
            0xCD => {
                let addr = self.fetch16(mmu);
                self.tick(1);
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = addr;
            }
            0xD9 => {
                // RETI enables interrupts immediately, without EI's delay.
                self.regs.pc = self.pop_stack(mmu);
                self.ime = true;
                self.tick(1);
            }
            0xE0 => {
                let offset = self.fetch8(mmu);
                let addr = 0xFF00 | offset as u16;
                self.write8(mmu, addr, self.regs.a);
            }
            0xE2 => {
                let addr = 0xFF00 | self.regs.c as u16;
                self.write8(mmu, addr, self.regs.a);
            }
            0xE8 => {
                let res = self.sp_plus_e8(mmu);
                self.regs.sp = res;
                self.tick(2);
            }
            0xE9 => {
                self.regs.pc = self.regs.hl();
            }
            0xEA => {
                let addr = self.fetch16(mmu);
                self.write8(mmu, addr, self.regs.a);
            }
            0xF0 => {
                let offset = self.fetch8(mmu);
                let addr = 0xFF00 | offset as u16;
                self.regs.a = self.read8(mmu, addr);
            }
            0xF2 => {
                let addr = 0xFF00 | self.regs.c as u16;
                self.regs.a = self.read8(mmu, addr);
            }
            0xF3 => {
                self.ime = false;
                self.ime_pending = false;
            }
            0xF8 => {
                let res = self.sp_plus_e8(mmu);
                self.regs.set_hl(res);
                self.tick(1);
            }
            0xF9 => {
                self.regs.sp = self.regs.hl();
                self.tick(1);
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                self.regs.a = self.read8(mmu, addr);
            }
            0xFB => {
                self.ime_pending = true;
            }
            _ => {
                // 0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4,
                // 0xFC, 0xFD: not instructions on the LR35902.
                panic!(
                    "illegal opcode {opcode:02X} at PC={:04X}",
                    self.regs.pc.wrapping_sub(1)
                );
            }
        }
    }

    fn set_shift_flags(&mut self, res: u8, carry: bool) {
        self.regs.f = if res == 0 { FLAG_Z } else { 0 } | if carry { FLAG_C } else { 0 };
    }

    fn handle_cb(&mut self, opcode: u8, mmu: &mut Mmu) {
        let r = opcode & 0x07;
        match opcode {
            0x00..=0x07 => {
                // RLC
                let val = self.read_reg(mmu, r);
                let res = val.rotate_left(1);
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x80 != 0);
            }
            0x08..=0x0F => {
                // RRC
                let val = self.read_reg(mmu, r);
                let res = val.rotate_right(1);
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x01 != 0);
            }
            0x10..=0x17 => {
                // RL
                let val = self.read_reg(mmu, r);
                let carry_in = if self.regs.f & FLAG_C != 0 { 1 } else { 0 };
                let res = (val << 1) | carry_in;
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x80 != 0);
            }
            0x18..=0x1F => {
                // RR
                let val = self.read_reg(mmu, r);
                let carry_in = if self.regs.f & FLAG_C != 0 { 0x80 } else { 0 };
                let res = (val >> 1) | carry_in;
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x01 != 0);
            }
            0x20..=0x27 => {
                // SLA
                let val = self.read_reg(mmu, r);
                let res = val << 1;
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x80 != 0);
            }
            0x28..=0x2F => {
                // SRA keeps the sign bit.
                let val = self.read_reg(mmu, r);
                let res = (val >> 1) | (val & 0x80);
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x01 != 0);
            }
            0x30..=0x37 => {
                // SWAP also forces C to 0.
                let val = self.read_reg(mmu, r);
                let res = val.rotate_left(4);
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, false);
            }
            0x38..=0x3F => {
                // SRL
                let val = self.read_reg(mmu, r);
                let res = val >> 1;
                self.write_reg(mmu, r, res);
                self.set_shift_flags(res, val & 0x01 != 0);
            }
            0x40..=0x7F => {
                // BIT only reads; C is preserved.
                let bit = (opcode - 0x40) >> 3;
                let val = self.read_reg(mmu, r);
                self.regs.f = (self.regs.f & FLAG_C)
                    | FLAG_H
                    | if val & (1 << bit) == 0 { FLAG_Z } else { 0 };
            }
            0x80..=0xBF => {
                // RES; no flag change.
                let bit = (opcode - 0x80) >> 3;
                let val = self.read_reg(mmu, r) & !(1 << bit);
                self.write_reg(mmu, r, val);
            }
            0xC0..=0xFF => {
                // SET; no flag change.
                let bit = (opcode - 0xC0) >> 3;
                let val = self.read_reg(mmu, r) | (1 << bit);
                self.write_reg(mmu, r, val);
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
