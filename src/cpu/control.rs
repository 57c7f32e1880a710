//! Control-signal vocabulary, hazard detection and the forwarding unit.

use crate::cpu::pipeline::{ExMem, IdEx, MemWb};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AluOp {
    #[default]
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    Sll,
    Srl,
    Sra,
    Lui,
}

/// Width of a load/store access; `Nop` means the instruction touches no memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemWidth {
    #[default]
    Nop,
    Byte,
    Half,
    Word,
}

/// Which conditional-branch test EX should evaluate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BranchKind {
    #[default]
    None,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Bltz,
    Bgez,
}

/// Which jump EX should resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JumpKind {
    #[default]
    None,
    J,
    Jal,
    Jr,
    Jalr,
}

/// HI/LO-touching operations, resolved in EX and committed in WB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HiLoOp {
    #[default]
    None,
    Mfhi,
    Mflo,
    Mthi,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
}

/// Decoded control bits for one instruction, carried alongside it through
/// every downstream latch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlSignals {
    pub reg_write: bool,
    pub mem_read: bool,
    pub mem_write: bool,
    pub alu: AluOp,
    pub width: MemWidth,
    pub signed_load: bool,
    pub branch: BranchKind,
    pub jump: JumpKind,
    pub hi_lo: HiLoOp,
    pub is_syscall: bool,
    pub link: bool,
    /// ANDI/ORI/XORI zero-extend their immediate instead of sign-extending it.
    pub zero_extend_imm: bool,
    /// I-type ALU ops (ADDI.../ANDI/ORI/XORI/LUI/SLTI) take the sign- or
    /// zero-extended immediate as operand B instead of `rv2`.
    pub use_imm: bool,
}

/// SYSCALL reads `$v0` (register 2) rather than the `rs` field the
/// assembler leaves as `$zero` — decode.rs applies this same remap when it
/// actually reads the operand (§6.3); the hazard checks below must agree on
/// which register a not-yet-decoded instruction will read, or a SYSCALL
/// right behind a `$v0` writer slips through unstalled.
fn effective_rs(inst: u32) -> usize {
    let opcode = crate::isa::fields::opcode(inst);
    let funct = crate::isa::fields::funct(inst);
    if opcode == crate::isa::opcodes::SPECIAL && funct == crate::isa::function::SYSCALL {
        2
    } else {
        crate::isa::fields::rs(inst)
    }
}

/// Load-use hazard: one stall cycle even with forwarding enabled (§4.5).
///
/// `id_ex` is the instruction about to enter EX this cycle; `if_id_inst` is
/// the raw word currently being decoded.
#[must_use]
pub fn need_stall_load_use(id_ex: &IdEx, if_id_inst: u32) -> bool {
    if !id_ex.valid || !id_ex.ctrl.mem_read || id_ex.rd == 0 {
        return false;
    }
    let rs = effective_rs(if_id_inst);
    let rt = crate::isa::fields::rt(if_id_inst) as usize;
    id_ex.rd == rs || id_ex.rd == rt
}

/// Pure stall-on-RAW, used when forwarding is disabled (§4.5). Checked fresh
/// every cycle against the instruction currently in EX, MEM, and WB; the
/// distance to the producer naturally shrinks by one stage per cycle the
/// consumer is held, producing the exact 3/2/1-cycle stall lengths.
#[must_use]
pub fn need_stall_raw(id_ex: &IdEx, ex_mem: &ExMem, mem_wb: &MemWb, if_id_inst: u32) -> bool {
    let rs = effective_rs(if_id_inst);
    let rt = crate::isa::fields::rt(if_id_inst) as usize;
    let depends_on = |writes: bool, rd: usize| writes && rd != 0 && (rd == rs || rd == rt);

    depends_on(id_ex.valid && id_ex.ctrl.reg_write, id_ex.rd)
        || depends_on(ex_mem.valid && ex_mem.ctrl.reg_write, ex_mem.rd)
        || depends_on(mem_wb.valid && mem_wb.ctrl.reg_write, mem_wb.rd)
}

/// HI/LO interlock (§4.4.3): neither MFHI nor MFLO is forwarded — they read
/// `current.hi`/`current.lo` straight out of architectural state in EX — so
/// a MULT/MULTU/DIV/DIVU/MTHI/MTLO that hasn't yet cleared EX and MEM must
/// stall a trailing MFHI/MFLO rather than let it read a stale HI/LO. Once
/// the producer reaches MEM/WB it has already been checked the cycle before
/// the consumer's own EX, so that stage no longer needs to hold it back.
#[must_use]
pub fn need_stall_hilo(id_ex: &IdEx, ex_mem: &ExMem, if_id_inst: u32) -> bool {
    let opcode = crate::isa::fields::opcode(if_id_inst);
    let funct = crate::isa::fields::funct(if_id_inst);
    let is_hilo_move = opcode == crate::isa::opcodes::SPECIAL
        && (funct == crate::isa::function::MFHI || funct == crate::isa::function::MFLO);
    if !is_hilo_move {
        return false;
    }

    let writes_hilo = |hi_lo: HiLoOp| {
        matches!(hi_lo, HiLoOp::Mult | HiLoOp::Multu | HiLoOp::Div | HiLoOp::Divu | HiLoOp::Mthi | HiLoOp::Mtlo)
    };

    (id_ex.valid && writes_hilo(id_ex.ctrl.hi_lo)) || (ex_mem.valid && writes_hilo(ex_mem.ctrl.hi_lo))
}

/// Selects the write-back value a downstream latch would commit for `rd`,
/// used by the forwarding unit. Loads forward their `lmd`; jumps (JAL/JALR)
/// forward `pc + 8`; everything else forwards `alu`.
fn commit_value(pc: u32, alu: u32, lmd: u32, ctrl: &ControlSignals) -> u32 {
    if ctrl.mem_read {
        lmd
    } else if matches!(ctrl.jump, JumpKind::Jal | JumpKind::Jalr) {
        pc.wrapping_add(8)
    } else {
        alu
    }
}

/// Applies the `ForwardA`/`ForwardB` muxes (§4.5) to the raw register-file
/// values `(raw_rs, raw_rt)` for an instruction decoding with sources
/// `rs`/`rt`, given the EX/MEM and MEM/WB latches plus the instruction
/// retiring in WB this very cycle.
///
/// Stages run WB, MEM, EX, ID, IF within one [`tick`](crate::cpu::Cpu::tick),
/// so by the time ID runs, MEM has already overwritten `mem_wb` with the
/// instruction now leaving MEM, and EX has already overwritten `ex_mem` with
/// the instruction now leaving EX. The instruction that was in MEM/WB at the
/// *start* of this cycle — the one WB just committed to architectural state
/// — has fallen out of both latches, even though ID still needs its value.
/// `retiring` is that instruction's latch as captured right after WB ran,
/// before MEM overwrote it. Priority is nearest-producer-wins: EX/MEM beats
/// MEM/WB beats the retiring snapshot, matching Hennessy & Patterson mux
/// ordering extended with this one extra stage of reach. A load sitting in
/// EX/MEM never forwards through this path — its data is not ready until
/// MEM runs (`need_stall_load_use` is what covers that case).
#[must_use]
pub fn forward_rs(
    rs: usize,
    rt: usize,
    raw_rs: u32,
    raw_rt: u32,
    ex_mem: &ExMem,
    mem_wb: &MemWb,
    retiring: &MemWb,
) -> (u32, u32) {
    let mut a = raw_rs;
    let mut b = raw_rt;

    if retiring.valid && retiring.ctrl.reg_write && retiring.rd != 0 {
        let val = commit_value(retiring.pc, retiring.alu, retiring.lmd, &retiring.ctrl);
        if retiring.rd == rs {
            a = val;
        }
        if retiring.rd == rt {
            b = val;
        }
    }

    if mem_wb.valid && mem_wb.ctrl.reg_write && mem_wb.rd != 0 {
        let val = commit_value(mem_wb.pc, mem_wb.alu, mem_wb.lmd, &mem_wb.ctrl);
        if mem_wb.rd == rs {
            a = val;
        }
        if mem_wb.rd == rt {
            b = val;
        }
    }

    if ex_mem.valid && ex_mem.ctrl.reg_write && ex_mem.rd != 0 && !ex_mem.ctrl.mem_read {
        let val = commit_value(ex_mem.pc, ex_mem.alu, 0, &ex_mem.ctrl);
        if ex_mem.rd == rs {
            a = val;
        }
        if ex_mem.rd == rt {
            b = val;
        }
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_entry(rd: usize) -> IdEx {
        IdEx { valid: true, rd, ctrl: ControlSignals { mem_read: true, reg_write: true, ..Default::default() }, ..Default::default() }
    }

    fn alu_entry(rd: usize) -> IdEx {
        IdEx { valid: true, rd, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() }
    }

    fn inst_with(rs: usize, rt: usize) -> u32 {
        ((rs as u32) << 21) | ((rt as u32) << 16)
    }

    // 1. Load-use hazard detection.
    #[test]
    fn load_use_stalls_on_rs_match() {
        let producer = load_entry(8);
        assert!(need_stall_load_use(&producer, inst_with(8, 1)));
    }

    #[test]
    fn load_use_stalls_on_rt_match() {
        let producer = load_entry(8);
        assert!(need_stall_load_use(&producer, inst_with(1, 8)));
    }

    #[test]
    fn load_use_does_not_stall_for_non_load_producer() {
        let producer = alu_entry(8);
        assert!(!need_stall_load_use(&producer, inst_with(8, 1)));
    }

    #[test]
    fn load_use_ignores_register_zero() {
        let producer = load_entry(0);
        assert!(!need_stall_load_use(&producer, inst_with(0, 1)));
    }

    #[test]
    fn load_use_ignores_bubbles() {
        let mut producer = load_entry(8);
        producer.valid = false;
        assert!(!need_stall_load_use(&producer, inst_with(8, 1)));
    }

    // 2. Forwarding priority: EX/MEM beats MEM/WB.
    #[test]
    fn forwarding_prefers_ex_mem_over_mem_wb() {
        let ex_mem = ExMem { valid: true, rd: 8, alu: 111, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let mem_wb = MemWb { valid: true, rd: 8, alu: 222, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let (a, _) = forward_rs(8, 1, 0, 0, &ex_mem, &mem_wb, &MemWb::default());
        assert_eq!(a, 111);
    }

    #[test]
    fn forwarding_falls_back_to_mem_wb() {
        let ex_mem = ExMem::default();
        let mem_wb = MemWb { valid: true, rd: 8, alu: 222, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let (a, _) = forward_rs(8, 1, 0, 0, &ex_mem, &mem_wb, &MemWb::default());
        assert_eq!(a, 222);
    }

    #[test]
    fn ex_mem_load_never_forwards_its_alu_as_data() {
        let ex_mem = ExMem { valid: true, rd: 8, alu: 999, ctrl: ControlSignals { reg_write: true, mem_read: true, ..Default::default() }, ..Default::default() };
        let mem_wb = MemWb::default();
        let (a, _) = forward_rs(8, 1, 5, 0, &ex_mem, &mem_wb, &MemWb::default());
        assert_eq!(a, 5, "load in EX/MEM must not forward its effective address as data");
    }

    #[test]
    fn register_zero_is_never_forwarded() {
        let ex_mem = ExMem { valid: true, rd: 0, alu: 123, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let (a, b) = forward_rs(0, 0, 7, 9, &ex_mem, &MemWb::default(), &MemWb::default());
        assert_eq!((a, b), (7, 9));
    }

    #[test]
    fn mem_wb_load_forwards_its_lmd() {
        let mem_wb = MemWb { valid: true, rd: 9, lmd: 64, ctrl: ControlSignals { reg_write: true, mem_read: true, ..Default::default() }, ..Default::default() };
        let (_, b) = forward_rs(1, 9, 0, 0, &ExMem::default(), &mem_wb, &MemWb::default());
        assert_eq!(b, 64);
    }

    #[test]
    fn mem_wb_jump_forwards_link_address() {
        let mem_wb = MemWb { valid: true, rd: 31, pc: 0x0040_0000, ctrl: ControlSignals { reg_write: true, jump: JumpKind::Jal, ..Default::default() }, ..Default::default() };
        let (a, _) = forward_rs(31, 0, 0, 0, &ExMem::default(), &mem_wb, &MemWb::default());
        assert_eq!(a, 0x0040_0008);
    }

    #[test]
    fn retiring_wb_forwards_when_ex_mem_and_mem_wb_have_moved_on() {
        // The producer has already cleared both live latches (EX/MEM and
        // MEM/WB now hold younger, unrelated instructions); only the
        // start-of-cycle WB snapshot still carries its result.
        let ex_mem = ExMem { valid: true, rd: 11, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let mem_wb = MemWb { valid: true, rd: 12, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let retiring = MemWb { valid: true, rd: 8, alu: 0x1001_0000, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let (a, _) = forward_rs(8, 1, 0, 0, &ex_mem, &mem_wb, &retiring);
        assert_eq!(a, 0x1001_0000);
    }

    #[test]
    fn ex_mem_still_outranks_retiring_wb_on_a_shared_destination() {
        let ex_mem = ExMem { valid: true, rd: 8, alu: 111, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let retiring = MemWb { valid: true, rd: 8, alu: 222, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        let (a, _) = forward_rs(8, 1, 0, 0, &ex_mem, &MemWb::default(), &retiring);
        assert_eq!(a, 111);
    }

    // 3. Full RAW-stall (forwarding disabled) at every producer distance.
    #[test]
    fn raw_stall_when_producer_in_ex() {
        let id_ex = alu_entry(8);
        assert!(need_stall_raw(&id_ex, &ExMem::default(), &MemWb::default(), inst_with(8, 0)));
    }

    #[test]
    fn raw_stall_when_producer_in_mem() {
        let ex_mem = ExMem { valid: true, rd: 8, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        assert!(need_stall_raw(&IdEx::default(), &ex_mem, &MemWb::default(), inst_with(8, 0)));
    }

    #[test]
    fn raw_stall_when_producer_in_wb() {
        let mem_wb = MemWb { valid: true, rd: 8, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        assert!(need_stall_raw(&IdEx::default(), &ExMem::default(), &mem_wb, inst_with(8, 0)));
    }

    #[test]
    fn raw_no_stall_without_dependency() {
        let id_ex = alu_entry(8);
        assert!(!need_stall_raw(&id_ex, &ExMem::default(), &MemWb::default(), inst_with(2, 3)));
    }

    // 4. SYSCALL's $v0 remap must be honored by the hazard checks too.
    fn syscall_inst() -> u32 {
        crate::isa::function::SYSCALL
    }

    #[test]
    fn raw_stall_sees_syscalls_v0_read_even_though_its_rs_field_is_zero() {
        let mem_wb = MemWb { valid: true, rd: 2, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        assert!(need_stall_raw(&IdEx::default(), &ExMem::default(), &mem_wb, syscall_inst()));
    }

    #[test]
    fn raw_no_stall_for_syscall_when_v0_is_untouched() {
        let mem_wb = MemWb { valid: true, rd: 8, ctrl: ControlSignals { reg_write: true, ..Default::default() }, ..Default::default() };
        assert!(!need_stall_raw(&IdEx::default(), &ExMem::default(), &mem_wb, syscall_inst()));
    }

    #[test]
    fn load_use_stalls_for_syscall_reading_v0_from_a_pending_load() {
        let producer = load_entry(2);
        assert!(need_stall_load_use(&producer, syscall_inst()));
    }

    // 5. HI/LO interlock for MFHI/MFLO.
    fn hilo_producer_entry(hi_lo: HiLoOp) -> IdEx {
        IdEx { valid: true, rd: 0, ctrl: ControlSignals { hi_lo, ..Default::default() }, ..Default::default() }
    }

    fn mfhi_inst() -> u32 {
        (crate::isa::function::MFHI) | (10 << 11)
    }

    #[test]
    fn hilo_stalls_while_mult_is_in_ex() {
        let id_ex = hilo_producer_entry(HiLoOp::Mult);
        assert!(need_stall_hilo(&id_ex, &ExMem::default(), mfhi_inst()));
    }

    #[test]
    fn hilo_stalls_while_div_is_in_mem() {
        let ex_mem = ExMem { valid: true, ctrl: ControlSignals { hi_lo: HiLoOp::Div, ..Default::default() }, ..Default::default() };
        assert!(need_stall_hilo(&IdEx::default(), &ex_mem, mfhi_inst()));
    }

    #[test]
    fn hilo_does_not_stall_once_the_producer_has_cleared_mem() {
        assert!(!need_stall_hilo(&IdEx::default(), &ExMem::default(), mfhi_inst()));
    }

    #[test]
    fn hilo_ignores_a_non_move_consumer() {
        let id_ex = hilo_producer_entry(HiLoOp::Mult);
        assert!(!need_stall_hilo(&id_ex, &ExMem::default(), inst_with(8, 9)));
    }

    #[test]
    fn hilo_ignores_a_reg_write_producer() {
        let id_ex = alu_entry(8);
        assert!(!need_stall_hilo(&id_ex, &ExMem::default(), mfhi_inst()));
    }
}
