//! The four pipeline latches (IF/ID, ID/EX, EX/MEM, MEM/WB).
//!
//! Each is a plain record; stages read from the upstream latch and write the
//! downstream one. A latch's `valid` flag marks a bubble — one that advances
//! but contributes no architectural state change downstream. Flushing a
//! latch means overwriting it with its `Default`, which zeros `inst` to
//! [`crate::isa::NOP`] and clears `valid`.

use crate::cpu::control::ControlSignals;

#[derive(Clone, Copy)]
pub struct IfId {
    pub pc: u32,
    pub inst: u32,
}

impl Default for IfId {
    fn default() -> Self {
        Self { inst: crate::isa::NOP, pc: 0 }
    }
}

#[derive(Default, Clone)]
pub struct IdEx {
    pub pc: u32,
    pub inst: u32,
    pub rs: usize,
    pub rt: usize,
    /// Destination register: `rd` for R-type, `rt` for I-type/loads.
    pub rd: usize,
    pub shamt: u32,
    pub imm: i32,
    /// Operand A (value of `rs`), already routed through the forwarding mux.
    pub rv1: u32,
    /// Operand B (value of `rt`), already routed through the forwarding mux.
    pub rv2: u32,
    pub ctrl: ControlSignals,
    /// `false` for a bubble: the downstream stages must not retire it.
    pub valid: bool,
}

#[derive(Default, Clone)]
pub struct ExMem {
    pub pc: u32,
    pub inst: u32,
    pub rd: usize,
    /// ALU result, effective address (loads/stores), or DIV/DIVU quotient.
    pub alu: u32,
    /// Value to store, for SB/SH/SW.
    pub store_data: u32,
    /// DIV/DIVU remainder, routed to HI at WB.
    pub remainder: u32,
    /// MULT/MULTU 64-bit product, routed to HI:LO at WB.
    pub product: u64,
    pub ctrl: ControlSignals,
    pub valid: bool,
}

#[derive(Default, Clone)]
pub struct MemWb {
    pub pc: u32,
    pub inst: u32,
    pub rd: usize,
    pub alu: u32,
    /// Load-memory-data, sign/zero-extended to the load's width already.
    pub lmd: u32,
    pub remainder: u32,
    pub product: u64,
    pub ctrl: ControlSignals,
    pub valid: bool,
}
