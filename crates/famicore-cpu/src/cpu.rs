//! 6502 CPU core implementation.
//!
//! One [`Cpu::step`] call executes exactly one instruction (or a 7-cycle
//! interrupt sequence taken at the instruction boundary) and returns the
//! cycles it consumed. Timing follows the NESdev specifications: base
//! cycles from the opcode table, plus one cycle for read-type indexed
//! accesses that cross a page, plus the taken/page-cross extras on
//! branches.
//!
//! Interrupt polling happens only at instruction boundaries: the NMI edge
//! latch is checked first, then the level-triggered IRQ line gated by the I
//! flag. The interrupt sequence is computed atomically; there is no
//! per-cycle state machine.

use crate::addressing::AddrMode;
use crate::bus::CpuBus;
use crate::opcodes::{is_jam, OpcodeInfo, OPCODE_TABLE};
use crate::status::Status;
use crate::{vectors, CpuError};

/// Resolved effective address for one operand.
struct Resolved {
    addr: u16,
    /// Base address before indexing, for dummy-read accounting.
    base: u16,
    crossed: bool,
}

/// NES 6502 CPU (2A03 core: binary ALU only, D flag stored but ignored).
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator register.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer (within $0100-$01FF).
    pub sp: u8,
    /// Status flags.
    pub status: Status,
    /// Total cycles executed since reset (local bookkeeping; the bus
    /// counter is authoritative).
    pub cycles: u64,
    /// NMI edge latch, set by the bus when the PPU NMI line rises.
    nmi_pending: bool,
    /// IRQ line level.
    irq_pending: bool,
    /// Set after a trapped halt opcode; every further step fails.
    jammed: bool,
}

impl Cpu {
    /// Create a new CPU in power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::POWER_ON,
            cycles: 0,
            nmi_pending: false,
            irq_pending: false,
            jammed: false,
        }
    }

    /// Reset the CPU.
    ///
    /// Loads PC from the RESET vector, forces SP to $FD and I to 1, clears
    /// A/X/Y and the cycle counter. The D flag is left as-is (the hardware
    /// does not touch it on reset).
    pub fn reset(&mut self, bus: &mut impl CpuBus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status.insert(Status::I | Status::U);
        self.pc = bus.read_u16(vectors::RESET);
        self.cycles = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.jammed = false;
    }

    /// Execute one instruction and return the cycles it consumed.
    ///
    /// A pending NMI (or unmasked IRQ) is serviced instead, consuming 7
    /// cycles.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::IllegalOpcode`] when a halt (JAM) opcode is
    /// fetched; the CPU stays jammed and every further `step` fails the
    /// same way.
    pub fn step(&mut self, bus: &mut impl CpuBus) -> Result<u8, CpuError> {
        if self.jammed {
            // PC still points one past the halt opcode.
            let pc = self.pc.wrapping_sub(1);
            return Err(CpuError::IllegalOpcode(bus.peek(pc), pc));
        }

        // Interrupt polling at the instruction boundary. NMI is an edge
        // latch and wins over IRQ; IRQ is level-triggered and masked by I.
        if self.nmi_pending {
            self.nmi_pending = false;
            let cycles = self.service_interrupt(bus, vectors::NMI);
            self.cycles += u64::from(cycles);
            return Ok(cycles);
        }
        if self.irq_pending && !self.status.contains(Status::I) {
            let cycles = self.service_interrupt(bus, vectors::IRQ);
            self.cycles += u64::from(cycles);
            return Ok(cycles);
        }

        let opcode_pc = self.pc;
        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        if is_jam(opcode) {
            self.jammed = true;
            log::warn!("CPU jammed by opcode {opcode:02X} at {opcode_pc:04X}");
            return Err(CpuError::IllegalOpcode(opcode, opcode_pc));
        }

        let info = &OPCODE_TABLE[opcode as usize];
        let extra = self.execute(opcode, info, bus);
        let total = info.cycles + extra;
        self.cycles += u64::from(total);
        Ok(total)
    }

    /// Latch an NMI (edge-triggered; one service per latch).
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Set the IRQ line level (serviced every boundary while high and I=0).
    pub fn set_irq(&mut self, active: bool) {
        self.irq_pending = active;
    }

    /// Whether an NMI is latched and waiting for the next boundary.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Whether the IRQ line is held active.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Whether the CPU has trapped on a halt opcode.
    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    /// Total cycles executed since reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Interrupt sequence: push PC and P (B=0), set I, load the vector.
    fn service_interrupt(&mut self, bus: &mut impl CpuBus, vector: u16) -> u8 {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
        7
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Resolve the effective address for a memory-operand mode, advancing PC.
    fn operand_addr(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> Resolved {
        match mode {
            AddrMode::Imm => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Resolved {
                    addr,
                    base: addr,
                    crossed: false,
                }
            }
            AddrMode::Zpg => {
                let addr = u16::from(bus.read(self.pc));
                self.pc = self.pc.wrapping_add(1);
                Resolved {
                    addr,
                    base: addr,
                    crossed: false,
                }
            }
            AddrMode::ZpgX | AddrMode::ZpgY => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                // Indexing happens during a dummy read of the base.
                let _ = bus.read(u16::from(base));
                let index = if mode == AddrMode::ZpgX { self.x } else { self.y };
                let addr = u16::from(base.wrapping_add(index));
                Resolved {
                    addr,
                    base: u16::from(base),
                    crossed: false,
                }
            }
            AddrMode::Abs => {
                let addr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                Resolved {
                    addr,
                    base: addr,
                    crossed: false,
                }
            }
            AddrMode::AbsX | AddrMode::AbsY => {
                let base = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let index = if mode == AddrMode::AbsX { self.x } else { self.y };
                let addr = base.wrapping_add(u16::from(index));
                Resolved {
                    addr,
                    base,
                    crossed: (base & 0xFF00) != (addr & 0xFF00),
                }
            }
            AddrMode::Ind => {
                let ptr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                let addr = bus.read_u16_wrap(ptr);
                Resolved {
                    addr,
                    base: ptr,
                    crossed: false,
                }
            }
            AddrMode::IndX => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let _ = bus.read(u16::from(zp));
                let ptr = zp.wrapping_add(self.x);
                let lo = u16::from(bus.read(u16::from(ptr)));
                let hi = u16::from(bus.read(u16::from(ptr.wrapping_add(1))));
                let addr = (hi << 8) | lo;
                Resolved {
                    addr,
                    base: addr,
                    crossed: false,
                }
            }
            AddrMode::IndY => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = u16::from(bus.read(u16::from(zp)));
                let hi = u16::from(bus.read(u16::from(zp.wrapping_add(1))));
                let base = (hi << 8) | lo;
                let addr = base.wrapping_add(u16::from(self.y));
                Resolved {
                    addr,
                    base,
                    crossed: (base & 0xFF00) != (addr & 0xFF00),
                }
            }
            AddrMode::Imp | AddrMode::Acc | AddrMode::Rel => unreachable!(
                "mode {mode:?} has no memory operand"
            ),
        }
    }

    /// Read the operand for a read-type instruction.
    ///
    /// Returns the value and whether indexing crossed a page. A crossing
    /// read performs the hardware's dummy read of the un-fixed address.
    fn read_operand(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> (u8, bool) {
        if mode == AddrMode::Acc {
            return (self.a, false);
        }
        let resolved = self.operand_addr(bus, mode);
        if resolved.crossed {
            let wrong = (resolved.base & 0xFF00) | (resolved.addr & 0x00FF);
            let _ = bus.read(wrong);
        }
        (bus.read(resolved.addr), resolved.crossed)
    }

    /// Resolve the target for a write-type instruction.
    ///
    /// Indexed writes always spend the fix-up cycle with a dummy read of
    /// the un-fixed address, crossing or not.
    fn write_target(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> u16 {
        let resolved = self.operand_addr(bus, mode);
        if mode.can_cross_page() {
            let wrong = (resolved.base & 0xFF00) | (resolved.addr & 0x00FF);
            let _ = bus.read(wrong);
        }
        resolved.addr
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Execute one decoded opcode; returns extra cycles beyond the table's.
    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, opcode: u8, info: &OpcodeInfo, bus: &mut impl CpuBus) -> u8 {
        let mode = info.mode;
        match opcode {
            // Load/Store
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => self.lda(bus, mode),
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => self.ldx(bus, mode),
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => self.ldy(bus, mode),
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.store(bus, mode, self.a),
            0x86 | 0x96 | 0x8E => self.store(bus, mode, self.x),
            0x84 | 0x94 | 0x8C => self.store(bus, mode, self.y),

            // Transfers
            0xAA => self.transfer_to(TransferReg::X, self.a),
            0xA8 => self.transfer_to(TransferReg::Y, self.a),
            0x8A => self.transfer_to(TransferReg::A, self.x),
            0x98 => self.transfer_to(TransferReg::A, self.y),
            0xBA => self.transfer_to(TransferReg::X, self.sp),
            0x9A => {
                // TXS does not touch flags.
                self.sp = self.x;
                0
            }

            // Stack
            0x48 => {
                self.push(bus, self.a);
                0
            }
            0x08 => {
                self.push(bus, self.status.to_stack_byte(true));
                0
            }
            0x68 => {
                let value = self.pop(bus);
                self.a = value;
                self.status.set_zn(value);
                0
            }
            0x28 => {
                let value = self.pop(bus);
                self.status = Status::from_stack_byte(value);
                0
            }

            // Arithmetic
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.adc(value);
                u8::from(crossed)
            }
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 | 0xEB => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.adc(!value);
                u8::from(crossed)
            }

            // Logic
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.a &= value;
                self.status.set_zn(self.a);
                u8::from(crossed)
            }
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.a |= value;
                self.status.set_zn(self.a);
                u8::from(crossed)
            }
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.a ^= value;
                self.status.set_zn(self.a);
                u8::from(crossed)
            }
            0x24 | 0x2C => {
                let (value, _) = self.read_operand(bus, mode);
                self.status.set(Status::Z, self.a & value == 0);
                self.status.set(Status::V, value & 0x40 != 0);
                self.status.set(Status::N, value & 0x80 != 0);
                0
            }

            // Shifts/rotates
            0x0A => self.rmw_acc(Self::op_asl),
            0x06 | 0x16 | 0x0E | 0x1E => self.rmw(bus, mode, Self::op_asl),
            0x4A => self.rmw_acc(Self::op_lsr),
            0x46 | 0x56 | 0x4E | 0x5E => self.rmw(bus, mode, Self::op_lsr),
            0x2A => self.rmw_acc(Self::op_rol),
            0x26 | 0x36 | 0x2E | 0x3E => self.rmw(bus, mode, Self::op_rol),
            0x6A => self.rmw_acc(Self::op_ror),
            0x66 | 0x76 | 0x6E | 0x7E => self.rmw(bus, mode, Self::op_ror),

            // Increment/decrement
            0xE6 | 0xF6 | 0xEE | 0xFE => self.rmw(bus, mode, Self::op_inc),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.rmw(bus, mode, Self::op_dec),
            0xE8 => self.transfer_to(TransferReg::X, self.x.wrapping_add(1)),
            0xC8 => self.transfer_to(TransferReg::Y, self.y.wrapping_add(1)),
            0xCA => self.transfer_to(TransferReg::X, self.x.wrapping_sub(1)),
            0x88 => self.transfer_to(TransferReg::Y, self.y.wrapping_sub(1)),

            // Compare
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => {
                let (value, crossed) = self.read_operand(bus, mode);
                self.compare(self.a, value);
                u8::from(crossed)
            }
            0xE0 | 0xE4 | 0xEC => {
                let (value, _) = self.read_operand(bus, mode);
                self.compare(self.x, value);
                0
            }
            0xC0 | 0xC4 | 0xCC => {
                let (value, _) = self.read_operand(bus, mode);
                self.compare(self.y, value);
                0
            }

            // Branches
            0x10 => self.branch(bus, !self.status.contains(Status::N)),
            0x30 => self.branch(bus, self.status.contains(Status::N)),
            0x50 => self.branch(bus, !self.status.contains(Status::V)),
            0x70 => self.branch(bus, self.status.contains(Status::V)),
            0x90 => self.branch(bus, !self.status.contains(Status::C)),
            0xB0 => self.branch(bus, self.status.contains(Status::C)),
            0xD0 => self.branch(bus, !self.status.contains(Status::Z)),
            0xF0 => self.branch(bus, self.status.contains(Status::Z)),

            // Jumps / subroutines / interrupts
            0x4C | 0x6C => {
                let resolved = self.operand_addr(bus, mode);
                self.pc = resolved.addr;
                0
            }
            0x20 => {
                let target = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                // Return address is the last byte of the JSR operand.
                self.push_u16(bus, self.pc.wrapping_sub(1));
                self.pc = target;
                0
            }
            0x60 => {
                self.pc = self.pop_u16(bus).wrapping_add(1);
                0
            }
            0x40 => {
                let value = self.pop(bus);
                self.status = Status::from_stack_byte(value);
                self.pc = self.pop_u16(bus);
                0
            }
            0x00 => {
                // BRK skips its padding byte: push PC+1, push P with B=1.
                self.push_u16(bus, self.pc.wrapping_add(1));
                self.push(bus, self.status.to_stack_byte(true));
                self.status.insert(Status::I);
                self.pc = bus.read_u16(vectors::IRQ);
                0
            }

            // Flag operations
            0x18 => self.flag(Status::C, false),
            0x38 => self.flag(Status::C, true),
            0x58 => self.flag(Status::I, false),
            0x78 => self.flag(Status::I, true),
            0xB8 => self.flag(Status::V, false),
            0xD8 => self.flag(Status::D, false),
            0xF8 => self.flag(Status::D, true),

            // NOP (official)
            0xEA => 0,

            // Everything else is an unofficial opcode executing as a NOP of
            // its documented shape (JAM already trapped in step()).
            _ => self.unofficial_nop(bus, info),
        }
    }

    // =========================================================================
    // Instruction helpers
    // =========================================================================

    fn lda(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.a = value;
        self.status.set_zn(value);
        u8::from(crossed)
    }

    fn ldx(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.x = value;
        self.status.set_zn(value);
        u8::from(crossed)
    }

    fn ldy(&mut self, bus: &mut impl CpuBus, mode: AddrMode) -> u8 {
        let (value, crossed) = self.read_operand(bus, mode);
        self.y = value;
        self.status.set_zn(value);
        u8::from(crossed)
    }

    fn store(&mut self, bus: &mut impl CpuBus, mode: AddrMode, value: u8) -> u8 {
        let addr = self.write_target(bus, mode);
        bus.write(addr, value);
        0
    }

    fn transfer_to(&mut self, reg: TransferReg, value: u8) -> u8 {
        match reg {
            TransferReg::A => self.a = value,
            TransferReg::X => self.x = value,
            TransferReg::Y => self.y = value,
        }
        self.status.set_zn(value);
        0
    }

    fn flag(&mut self, flag: Status, on: bool) -> u8 {
        self.status.set(flag, on);
        0
    }

    /// ADC with the 6502 carry/overflow rules; SBC is `adc(!value)`.
    fn adc(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        self.status
            .set(Status::V, (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::C, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    /// Taken branches add 1 cycle, 2 if the target is on another page.
    fn branch(&mut self, bus: &mut impl CpuBus, condition: bool) -> u8 {
        let offset = bus.read(self.pc) as i8;
        self.pc = self.pc.wrapping_add(1);
        if !condition {
            return 0;
        }
        let old_pc = self.pc;
        self.pc = self.pc.wrapping_add(offset as u16);
        if (old_pc & 0xFF00) == (self.pc & 0xFF00) {
            1
        } else {
            2
        }
    }

    /// Read-modify-write on memory: read, dummy write-back, write result.
    fn rmw(&mut self, bus: &mut impl CpuBus, mode: AddrMode, op: fn(&mut Self, u8) -> u8) -> u8 {
        let addr = self.write_target(bus, mode);
        let value = bus.read(addr);
        // The hardware writes the unmodified value back first.
        bus.write(addr, value);
        let result = op(self, value);
        bus.write(addr, result);
        0
    }

    /// Read-modify-write on the accumulator.
    fn rmw_acc(&mut self, op: fn(&mut Self, u8) -> u8) -> u8 {
        let result = op(self, self.a);
        self.a = result;
        0
    }

    fn op_asl(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn op_lsr(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn op_rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.status.set_zn(result);
        result
    }

    fn op_ror(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        self.status.set_zn(result);
        result
    }

    fn op_inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.status.set_zn(result);
        result
    }

    fn op_dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.status.set_zn(result);
        result
    }

    /// Unofficial-opcode policy: decode the operand, consume the documented
    /// cycles, change no architectural state beyond PC.
    fn unofficial_nop(&mut self, bus: &mut impl CpuBus, info: &OpcodeInfo) -> u8 {
        match info.mode {
            AddrMode::Imp | AddrMode::Acc => 0,
            mode => {
                let (_, crossed) = self.read_operand(bus, mode);
                u8::from(crossed && info.page_penalty)
            }
        }
    }

    // =========================================================================
    // Stack
    // =========================================================================

    pub(crate) fn push(&mut self, bus: &mut impl CpuBus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop(&mut self, bus: &mut impl CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    pub(crate) fn push_u16(&mut self, bus: &mut impl CpuBus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    pub(crate) fn pop_u16(&mut self, bus: &mut impl CpuBus) -> u16 {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        (hi << 8) | lo
    }
}

/// Destination register for transfer-style implied instructions.
#[derive(Debug, Clone, Copy)]
enum TransferReg {
    A,
    X,
    Y,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        memory: [u8; 0x10000],
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                memory: [0; 0x10000],
            }
        }

        fn load_program(&mut self, addr: u16, program: &[u8]) {
            for (i, &byte) in program.iter().enumerate() {
                self.memory[addr as usize + i] = byte;
            }
            // Reset vector points at the program.
            self.memory[0xFFFC] = (addr & 0xFF) as u8;
            self.memory[0xFFFD] = (addr >> 8) as u8;
        }
    }

    impl CpuBus for TestBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.memory[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.memory[addr as usize] = value;
        }

        fn peek(&self, addr: u16) -> u8 {
            self.memory[addr as usize]
        }
    }

    fn setup(program: &[u8]) -> (Cpu, TestBus) {
        let mut bus = TestBus::new();
        bus.load_program(0x8000, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn reset_state() {
        let (cpu, _) = setup(&[0xEA]);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.cycles, 0);
        assert!(cpu.status.contains(Status::I));
        assert!(cpu.status.contains(Status::U));
        assert_eq!(cpu.a, 0);
        assert_eq!(cpu.x, 0);
        assert_eq!(cpu.y, 0);
    }

    #[test]
    fn lda_immediate_flags() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x42, 0xA9, 0x00, 0xA9, 0x80]);

        assert_eq!(cpu.step(&mut bus).unwrap(), 2);
        assert_eq!(cpu.a, 0x42);
        assert!(!cpu.status.contains(Status::Z));
        assert!(!cpu.status.contains(Status::N));

        cpu.step(&mut bus).unwrap();
        assert!(cpu.status.contains(Status::Z));

        cpu.step(&mut bus).unwrap();
        assert!(cpu.status.contains(Status::N));
        assert_eq!(cpu.cycles, 6);
    }

    #[test]
    fn sta_zero_page() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x42, 0x85, 0x10]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 3);
        assert_eq!(bus.memory[0x10], 0x42);
    }

    #[test]
    fn adc_carry_and_overflow() {
        // LDA #$50, ADC #$50 -> 0xA0, V set, C clear
        let (mut cpu, mut bus) = setup(&[0xA9, 0x50, 0x69, 0x50]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.status.contains(Status::V));
        assert!(!cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::N));

        // LDA #$FF, ADC #$02 -> 0x01 with carry out
        let (mut cpu, mut bus) = setup(&[0xA9, 0xFF, 0x69, 0x02]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::V));
    }

    #[test]
    fn sbc_borrow() {
        // SEC, LDA #$10, SBC #$08 -> 0x08, C set (no borrow)
        let (mut cpu, mut bus) = setup(&[0x38, 0xA9, 0x10, 0xE9, 0x08]);
        for _ in 0..3 {
            cpu.step(&mut bus).unwrap();
        }
        assert_eq!(cpu.a, 0x08);
        assert!(cpu.status.contains(Status::C));

        // CLC, LDA #$00, SBC #$01 -> 0xFE (borrow in), C clear
        let (mut cpu, mut bus) = setup(&[0x18, 0xA9, 0x00, 0xE9, 0x01]);
        for _ in 0..3 {
            cpu.step(&mut bus).unwrap();
        }
        assert_eq!(cpu.a, 0xFE);
        assert!(!cpu.status.contains(Status::C));
    }

    #[test]
    fn page_cross_penalty_reads_only() {
        // LDA $80FF,X with X=1 crosses into $8100: 4+1 cycles.
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0xBD, 0xFF, 0x80]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 5);

        // STA $80FF,X with X=1: always 5, no extra.
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0x9D, 0xFF, 0x80]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 5);
    }

    #[test]
    fn zero_page_indexed_wraps() {
        // LDA $FF,X with X=2 reads $01, not $0101.
        let (mut cpu, mut bus) = setup(&[0xA2, 0x02, 0xB5, 0xFF]);
        bus.memory[0x0001] = 0x77;
        bus.memory[0x0101] = 0x55;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x77);
    }

    #[test]
    fn jmp_indirect_page_bug() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x10]);
        bus.memory[0x10FF] = 0x34;
        bus.memory[0x1100] = 0x56; // would be correct
        bus.memory[0x1000] = 0x12; // actually fetched
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn jsr_rts_round_trip() {
        let (mut cpu, mut bus) = setup(&[0x20, 0x10, 0x80]);
        bus.memory[0x8010] = 0x60; // RTS
        let initial_sp = cpu.sp;

        assert_eq!(cpu.step(&mut bus).unwrap(), 6);
        assert_eq!(cpu.pc, 0x8010);
        assert_eq!(cpu.sp, initial_sp.wrapping_sub(2));

        assert_eq!(cpu.step(&mut bus).unwrap(), 6);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, initial_sp);
    }

    #[test]
    fn branch_cycle_accounting() {
        // Not taken: 2 cycles.
        let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0xF0, 0x05]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 2);
        assert_eq!(cpu.pc, 0x8004);

        // Taken, same page: 3 cycles.
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xF0, 0x05]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 3);
        assert_eq!(cpu.pc, 0x8009);

        // Taken, crossing back a page: 4 cycles.
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xF0, 0xFA]);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), 4);
        assert_eq!(cpu.pc, 0x7FFE);
    }

    #[test]
    fn rmw_inc_memory() {
        let (mut cpu, mut bus) = setup(&[0xE6, 0x10, 0xE6, 0x10]);
        bus.memory[0x10] = 0xFE;
        assert_eq!(cpu.step(&mut bus).unwrap(), 5);
        assert_eq!(bus.memory[0x10], 0xFF);
        cpu.step(&mut bus).unwrap();
        assert_eq!(bus.memory[0x10], 0x00);
        assert!(cpu.status.contains(Status::Z));
    }

    #[test]
    fn asl_rotate_chain() {
        // LDA #$81, ASL A -> 0x02, carry out; ROL A -> 0x05 (carry in)
        let (mut cpu, mut bus) = setup(&[0xA9, 0x81, 0x0A, 0x2A]);
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.status.contains(Status::C));
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x05);
        assert!(!cpu.status.contains(Status::C));
    }

    #[test]
    fn php_plp_round_trip() {
        let (mut cpu, mut bus) = setup(&[0x38, 0x08, 0x18, 0x28]);
        cpu.step(&mut bus).unwrap(); // SEC
        cpu.step(&mut bus).unwrap(); // PHP
        cpu.step(&mut bus).unwrap(); // CLC
        assert!(!cpu.status.contains(Status::C));
        cpu.step(&mut bus).unwrap(); // PLP
        assert!(cpu.status.contains(Status::C));
        assert!(!cpu.status.contains(Status::B));
        assert!(cpu.status.contains(Status::U));
    }

    #[test]
    fn brk_and_rti() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF, 0xEA]);
        // IRQ/BRK vector -> $9000 with an RTI there.
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        bus.memory[0x9000] = 0x40;

        assert_eq!(cpu.step(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.status.contains(Status::I));
        // Pushed status has B set.
        assert_eq!(bus.memory[0x01FB] & Status::B.bits(), Status::B.bits());

        cpu.step(&mut bus).unwrap(); // RTI
        // BRK pushed PC+1, skipping the padding byte.
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn nmi_service() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0xEA]);
        bus.memory[0xFFFA] = 0x00;
        bus.memory[0xFFFB] = 0x90;

        cpu.step(&mut bus).unwrap();
        cpu.trigger_nmi();
        assert_eq!(cpu.step(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc, 0x9000);
        // One service per latch.
        assert!(!cpu.nmi_pending());
        // Pushed status has B clear.
        assert_eq!(bus.memory[0x01FB] & Status::B.bits(), 0);
    }

    #[test]
    fn irq_masked_by_i_flag() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0x58, 0xEA]);
        bus.memory[0xFFFE] = 0x00;
        bus.memory[0xFFFF] = 0x90;
        cpu.set_irq(true);

        // I is set after reset: IRQ ignored.
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x8001);

        cpu.step(&mut bus).unwrap(); // CLI
        assert_eq!(cpu.step(&mut bus).unwrap(), 7);
        assert_eq!(cpu.pc, 0x9000);
    }

    #[test]
    fn jam_opcode_traps_and_stays_jammed() {
        let (mut cpu, mut bus) = setup(&[0x02]);
        let err = cpu.step(&mut bus).unwrap_err();
        assert!(matches!(err, CpuError::IllegalOpcode(0x02, 0x8000)));
        assert!(cpu.is_jammed());
        assert!(cpu.step(&mut bus).is_err());
    }

    #[test]
    fn unofficial_nop_lengths() {
        // 0x04 (NOP zpg, 3 cycles, 2 bytes), 0x0C (NOP abs, 4 cycles, 3 bytes),
        // 0x80 (NOP imm, 2 cycles, 2 bytes)
        let (mut cpu, mut bus) = setup(&[0x04, 0x10, 0x0C, 0x00, 0x90, 0x80, 0x42]);
        assert_eq!(cpu.step(&mut bus).unwrap(), 3);
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(cpu.step(&mut bus).unwrap(), 4);
        assert_eq!(cpu.pc, 0x8005);
        assert_eq!(cpu.step(&mut bus).unwrap(), 2);
        assert_eq!(cpu.pc, 0x8007);
        // No architectural state disturbed.
        assert_eq!(cpu.a, 0);
        assert_eq!(cpu.x, 0);
    }

    #[test]
    fn decimal_flag_stored_but_ignored() {
        // SED, SEC, LDA #$09, ADC #$01 -> binary 0x0B, not BCD 0x10.
        let (mut cpu, mut bus) = setup(&[0xF8, 0x38, 0xA9, 0x09, 0x69, 0x01]);
        for _ in 0..4 {
            cpu.step(&mut bus).unwrap();
        }
        assert!(cpu.status.contains(Status::D));
        assert_eq!(cpu.a, 0x0B);
    }

    #[test]
    fn indirect_indexed_wraps_pointer() {
        // LDA ($FF),Y: pointer low at $FF, high at $00.
        let (mut cpu, mut bus) = setup(&[0xA0, 0x01, 0xB1, 0xFF]);
        bus.memory[0x00FF] = 0x00;
        bus.memory[0x0000] = 0x20;
        bus.memory[0x2001] = 0x99;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x99);
    }
}
