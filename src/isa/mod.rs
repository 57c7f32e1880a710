//! MIPS32 instruction field layout and the opcode/function constants needed
//! to decode the ISA surface this simulator implements.

pub mod decode;

/// Instruction field bit layout for all three MIPS encodings (R/I/J-type).
///
/// ```text
/// R-type: [ opcode:6 | rs:5 | rt:5 | rd:5 | shamt:5 | funct:6 ]
/// I-type: [ opcode:6 | rs:5 | rt:5 | imm:16                  ]
/// J-type: [ opcode:6 | target:26                             ]
/// ```
pub mod fields {
    /// Extracts the 6-bit opcode (bits 31-26).
    #[must_use]
    pub const fn opcode(inst: u32) -> u32 {
        (inst >> 26) & 0x3F
    }

    /// Extracts `rs` (bits 25-21).
    #[must_use]
    pub const fn rs(inst: u32) -> usize {
        ((inst >> 21) & 0x1F) as usize
    }

    /// Extracts `rt` (bits 20-16).
    #[must_use]
    pub const fn rt(inst: u32) -> usize {
        ((inst >> 16) & 0x1F) as usize
    }

    /// Extracts `rd` (bits 15-11).
    #[must_use]
    pub const fn rd(inst: u32) -> usize {
        ((inst >> 11) & 0x1F) as usize
    }

    /// Extracts the shift amount `sa` (bits 10-6).
    #[must_use]
    pub const fn shamt(inst: u32) -> u32 {
        (inst >> 6) & 0x1F
    }

    /// Extracts the R-type function code (bits 5-0).
    #[must_use]
    pub const fn funct(inst: u32) -> u32 {
        inst & 0x3F
    }

    /// Extracts the 16-bit immediate (bits 15-0), sign-extended to 32 bits.
    #[must_use]
    pub const fn imm_sign_ext(inst: u32) -> i32 {
        (inst as i16) as i32
    }

    /// Extracts the 16-bit immediate (bits 15-0), zero-extended to 32 bits.
    #[must_use]
    pub const fn imm_zero_ext(inst: u32) -> u32 {
        inst & 0xFFFF
    }

    /// Extracts the 26-bit jump target (bits 25-0).
    #[must_use]
    pub const fn jump_target(inst: u32) -> u32 {
        inst & 0x03FF_FFFF
    }
}

/// Primary opcode values (bits 31-26) that are not `SPECIAL` (0x00).
pub mod opcodes {
    pub const SPECIAL: u32 = 0x00;
    pub const REGIMM: u32 = 0x01; // BLTZ/BGEZ
    pub const J: u32 = 0x02;
    pub const JAL: u32 = 0x03;
    pub const BEQ: u32 = 0x04;
    pub const BNE: u32 = 0x05;
    pub const BLEZ: u32 = 0x06;
    pub const BGTZ: u32 = 0x07;
    pub const ADDI: u32 = 0x08;
    pub const ADDIU: u32 = 0x09;
    pub const SLTI: u32 = 0x0A;
    pub const ANDI: u32 = 0x0C;
    pub const ORI: u32 = 0x0D;
    pub const XORI: u32 = 0x0E;
    pub const LUI: u32 = 0x0F;
    pub const LB: u32 = 0x20;
    pub const LH: u32 = 0x21;
    pub const LW: u32 = 0x23;
    pub const SB: u32 = 0x28;
    pub const SH: u32 = 0x29;
    pub const SW: u32 = 0x2B;
}

/// `SPECIAL` (R-type) function codes, bits 5-0.
pub mod function {
    pub const SLL: u32 = 0x00;
    pub const SRL: u32 = 0x02;
    pub const SRA: u32 = 0x03;
    pub const JR: u32 = 0x08;
    pub const JALR: u32 = 0x09;
    pub const SYSCALL: u32 = 0x0C;
    pub const MFHI: u32 = 0x10;
    pub const MTHI: u32 = 0x11;
    pub const MFLO: u32 = 0x12;
    pub const MTLO: u32 = 0x13;
    pub const MULT: u32 = 0x18;
    pub const MULTU: u32 = 0x19;
    pub const DIV: u32 = 0x1A;
    pub const DIVU: u32 = 0x1B;
    pub const ADD: u32 = 0x20;
    pub const ADDU: u32 = 0x21;
    pub const SUB: u32 = 0x22;
    pub const SUBU: u32 = 0x23;
    pub const AND: u32 = 0x24;
    pub const OR: u32 = 0x25;
    pub const XOR: u32 = 0x26;
    pub const NOR: u32 = 0x27;
    pub const SLT: u32 = 0x2A;
}

/// `REGIMM` (opcode 0x01) `rt` field selectors.
pub mod regimm {
    pub const BLTZ: usize = 0x00;
    pub const BGEZ: usize = 0x01;
}

/// The all-zero word is SLL $zero, $zero, 0 — architecturally a NOP, and the
/// sentinel this simulator uses for a flushed/bubbled latch slot.
pub const NOP: u32 = 0x0000_0000;
