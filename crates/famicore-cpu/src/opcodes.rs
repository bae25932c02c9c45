//! Opcode definitions and the 256-entry dispatch table.
//!
//! Each entry carries the mnemonic (for tracing), the addressing mode, the
//! base cycle count, and whether the opcode pays the extra cycle when a
//! read-type indexed access crosses a page. Branch extras (taken / page
//! cross) are added by the branch handler, not through the penalty bit.
//!
//! Unofficial opcodes are present with their documented lengths and cycle
//! counts so that the NOP fallback consumes exactly what the hardware
//! would; the 12 JAM opcodes are the only entries the CPU refuses to run.

use crate::addressing::AddrMode;
use crate::addressing::AddrMode::{
    Abs, AbsX, AbsY, Acc, Imm, Imp, Ind, IndX, IndY, Rel, Zpg, ZpgX, ZpgY,
};

/// Opcode table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Instruction mnemonic (for tracing and diagnostics).
    pub mnemonic: &'static str,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Extra cycle when an indexed read crosses a page boundary.
    pub page_penalty: bool,
}

const fn op(mnemonic: &'static str, mode: AddrMode, cycles: u8, page_penalty: bool) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        page_penalty,
    }
}

/// Complete 256-entry opcode lookup table, indexed by opcode byte.
#[rustfmt::skip]
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    // 0x00-0x0F
    op("BRK", Imp, 7, false), op("ORA", IndX, 6, false), op("JAM", Imp, 0, false), op("SLO", IndX, 8, false),
    op("NOP", Zpg, 3, false), op("ORA", Zpg, 3, false), op("ASL", Zpg, 5, false), op("SLO", Zpg, 5, false),
    op("PHP", Imp, 3, false), op("ORA", Imm, 2, false), op("ASL", Acc, 2, false), op("ANC", Imm, 2, false),
    op("NOP", Abs, 4, false), op("ORA", Abs, 4, false), op("ASL", Abs, 6, false), op("SLO", Abs, 6, false),
    // 0x10-0x1F
    op("BPL", Rel, 2, true),  op("ORA", IndY, 5, true), op("JAM", Imp, 0, false), op("SLO", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("ORA", ZpgX, 4, false), op("ASL", ZpgX, 6, false), op("SLO", ZpgX, 6, false),
    op("CLC", Imp, 2, false), op("ORA", AbsY, 4, true), op("NOP", Imp, 2, false), op("SLO", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("ORA", AbsX, 4, true), op("ASL", AbsX, 7, false), op("SLO", AbsX, 7, false),
    // 0x20-0x2F
    op("JSR", Abs, 6, false), op("AND", IndX, 6, false), op("JAM", Imp, 0, false), op("RLA", IndX, 8, false),
    op("BIT", Zpg, 3, false), op("AND", Zpg, 3, false), op("ROL", Zpg, 5, false), op("RLA", Zpg, 5, false),
    op("PLP", Imp, 4, false), op("AND", Imm, 2, false), op("ROL", Acc, 2, false), op("ANC", Imm, 2, false),
    op("BIT", Abs, 4, false), op("AND", Abs, 4, false), op("ROL", Abs, 6, false), op("RLA", Abs, 6, false),
    // 0x30-0x3F
    op("BMI", Rel, 2, true),  op("AND", IndY, 5, true), op("JAM", Imp, 0, false), op("RLA", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("AND", ZpgX, 4, false), op("ROL", ZpgX, 6, false), op("RLA", ZpgX, 6, false),
    op("SEC", Imp, 2, false), op("AND", AbsY, 4, true), op("NOP", Imp, 2, false), op("RLA", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("AND", AbsX, 4, true), op("ROL", AbsX, 7, false), op("RLA", AbsX, 7, false),
    // 0x40-0x4F
    op("RTI", Imp, 6, false), op("EOR", IndX, 6, false), op("JAM", Imp, 0, false), op("SRE", IndX, 8, false),
    op("NOP", Zpg, 3, false), op("EOR", Zpg, 3, false), op("LSR", Zpg, 5, false), op("SRE", Zpg, 5, false),
    op("PHA", Imp, 3, false), op("EOR", Imm, 2, false), op("LSR", Acc, 2, false), op("ALR", Imm, 2, false),
    op("JMP", Abs, 3, false), op("EOR", Abs, 4, false), op("LSR", Abs, 6, false), op("SRE", Abs, 6, false),
    // 0x50-0x5F
    op("BVC", Rel, 2, true),  op("EOR", IndY, 5, true), op("JAM", Imp, 0, false), op("SRE", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("EOR", ZpgX, 4, false), op("LSR", ZpgX, 6, false), op("SRE", ZpgX, 6, false),
    op("CLI", Imp, 2, false), op("EOR", AbsY, 4, true), op("NOP", Imp, 2, false), op("SRE", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("EOR", AbsX, 4, true), op("LSR", AbsX, 7, false), op("SRE", AbsX, 7, false),
    // 0x60-0x6F
    op("RTS", Imp, 6, false), op("ADC", IndX, 6, false), op("JAM", Imp, 0, false), op("RRA", IndX, 8, false),
    op("NOP", Zpg, 3, false), op("ADC", Zpg, 3, false), op("ROR", Zpg, 5, false), op("RRA", Zpg, 5, false),
    op("PLA", Imp, 4, false), op("ADC", Imm, 2, false), op("ROR", Acc, 2, false), op("ARR", Imm, 2, false),
    op("JMP", Ind, 5, false), op("ADC", Abs, 4, false), op("ROR", Abs, 6, false), op("RRA", Abs, 6, false),
    // 0x70-0x7F
    op("BVS", Rel, 2, true),  op("ADC", IndY, 5, true), op("JAM", Imp, 0, false), op("RRA", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("ADC", ZpgX, 4, false), op("ROR", ZpgX, 6, false), op("RRA", ZpgX, 6, false),
    op("SEI", Imp, 2, false), op("ADC", AbsY, 4, true), op("NOP", Imp, 2, false), op("RRA", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("ADC", AbsX, 4, true), op("ROR", AbsX, 7, false), op("RRA", AbsX, 7, false),
    // 0x80-0x8F
    op("NOP", Imm, 2, false), op("STA", IndX, 6, false), op("NOP", Imm, 2, false), op("SAX", IndX, 6, false),
    op("STY", Zpg, 3, false), op("STA", Zpg, 3, false), op("STX", Zpg, 3, false), op("SAX", Zpg, 3, false),
    op("DEY", Imp, 2, false), op("NOP", Imm, 2, false), op("TXA", Imp, 2, false), op("XAA", Imm, 2, false),
    op("STY", Abs, 4, false), op("STA", Abs, 4, false), op("STX", Abs, 4, false), op("SAX", Abs, 4, false),
    // 0x90-0x9F
    op("BCC", Rel, 2, true),  op("STA", IndY, 6, false), op("JAM", Imp, 0, false), op("SHA", IndY, 6, false),
    op("STY", ZpgX, 4, false), op("STA", ZpgX, 4, false), op("STX", ZpgY, 4, false), op("SAX", ZpgY, 4, false),
    op("TYA", Imp, 2, false), op("STA", AbsY, 5, false), op("TXS", Imp, 2, false), op("TAS", AbsY, 5, false),
    op("SHY", AbsX, 5, false), op("STA", AbsX, 5, false), op("SHX", AbsY, 5, false), op("SHA", AbsY, 5, false),
    // 0xA0-0xAF
    op("LDY", Imm, 2, false), op("LDA", IndX, 6, false), op("LDX", Imm, 2, false), op("LAX", IndX, 6, false),
    op("LDY", Zpg, 3, false), op("LDA", Zpg, 3, false), op("LDX", Zpg, 3, false), op("LAX", Zpg, 3, false),
    op("TAY", Imp, 2, false), op("LDA", Imm, 2, false), op("TAX", Imp, 2, false), op("LXA", Imm, 2, false),
    op("LDY", Abs, 4, false), op("LDA", Abs, 4, false), op("LDX", Abs, 4, false), op("LAX", Abs, 4, false),
    // 0xB0-0xBF
    op("BCS", Rel, 2, true),  op("LDA", IndY, 5, true), op("JAM", Imp, 0, false), op("LAX", IndY, 5, true),
    op("LDY", ZpgX, 4, false), op("LDA", ZpgX, 4, false), op("LDX", ZpgY, 4, false), op("LAX", ZpgY, 4, false),
    op("CLV", Imp, 2, false), op("LDA", AbsY, 4, true), op("TSX", Imp, 2, false), op("LAS", AbsY, 4, true),
    op("LDY", AbsX, 4, true), op("LDA", AbsX, 4, true), op("LDX", AbsY, 4, true), op("LAX", AbsY, 4, true),
    // 0xC0-0xCF
    op("CPY", Imm, 2, false), op("CMP", IndX, 6, false), op("NOP", Imm, 2, false), op("DCP", IndX, 8, false),
    op("CPY", Zpg, 3, false), op("CMP", Zpg, 3, false), op("DEC", Zpg, 5, false), op("DCP", Zpg, 5, false),
    op("INY", Imp, 2, false), op("CMP", Imm, 2, false), op("DEX", Imp, 2, false), op("AXS", Imm, 2, false),
    op("CPY", Abs, 4, false), op("CMP", Abs, 4, false), op("DEC", Abs, 6, false), op("DCP", Abs, 6, false),
    // 0xD0-0xDF
    op("BNE", Rel, 2, true),  op("CMP", IndY, 5, true), op("JAM", Imp, 0, false), op("DCP", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("CMP", ZpgX, 4, false), op("DEC", ZpgX, 6, false), op("DCP", ZpgX, 6, false),
    op("CLD", Imp, 2, false), op("CMP", AbsY, 4, true), op("NOP", Imp, 2, false), op("DCP", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("CMP", AbsX, 4, true), op("DEC", AbsX, 7, false), op("DCP", AbsX, 7, false),
    // 0xE0-0xEF
    op("CPX", Imm, 2, false), op("SBC", IndX, 6, false), op("NOP", Imm, 2, false), op("ISC", IndX, 8, false),
    op("CPX", Zpg, 3, false), op("SBC", Zpg, 3, false), op("INC", Zpg, 5, false), op("ISC", Zpg, 5, false),
    op("INX", Imp, 2, false), op("SBC", Imm, 2, false), op("NOP", Imp, 2, false), op("SBC", Imm, 2, false),
    op("CPX", Abs, 4, false), op("SBC", Abs, 4, false), op("INC", Abs, 6, false), op("ISC", Abs, 6, false),
    // 0xF0-0xFF
    op("BEQ", Rel, 2, true),  op("SBC", IndY, 5, true), op("JAM", Imp, 0, false), op("ISC", IndY, 8, false),
    op("NOP", ZpgX, 4, false), op("SBC", ZpgX, 4, false), op("INC", ZpgX, 6, false), op("ISC", ZpgX, 6, false),
    op("SED", Imp, 2, false), op("SBC", AbsY, 4, true), op("NOP", Imp, 2, false), op("ISC", AbsY, 7, false),
    op("NOP", AbsX, 4, true), op("SBC", AbsX, 4, true), op("INC", AbsX, 7, false), op("ISC", AbsX, 7, false),
];

/// The halt ("JAM"/"KIL") opcodes; executing one traps.
pub const JAM_OPCODES: [u8; 12] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
];

/// Returns true for an opcode that halts the hardware.
#[must_use]
pub const fn is_jam(opcode: u8) -> bool {
    matches!(
        opcode,
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2
    )
}
