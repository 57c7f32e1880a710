//! WB: commits architectural state for the instruction leaving the
//! pipeline (§4.4.5) — the only stage allowed to mutate `cpu.next`'s
//! registers, HI/LO, and `run_flag`.

use crate::cpu::control::HiLoOp;
use crate::cpu::Cpu;

pub fn run(cpu: &mut Cpu) {
    let wb = cpu.mem_wb.clone();

    if !wb.valid {
        return;
    }

    if cpu.trace {
        eprintln!("WB  pc={:#010x} inst={:#010x}", wb.pc, wb.inst);
    }

    cpu.stats.instructions_retired += 1;
    if wb.ctrl.mem_read {
        cpu.stats.inst_load += 1;
    } else if wb.ctrl.mem_write {
        cpu.stats.inst_store += 1;
    } else if wb.ctrl.branch != crate::cpu::control::BranchKind::None
        || wb.ctrl.jump != crate::cpu::control::JumpKind::None
    {
        cpu.stats.inst_branch += 1;
    } else if wb.ctrl.is_syscall {
        cpu.stats.inst_system += 1;
    } else {
        cpu.stats.inst_alu += 1;
    }

    if wb.ctrl.reg_write && wb.rd != 0 {
        let val = if wb.ctrl.mem_read { wb.lmd } else { wb.alu };
        cpu.next.write_reg(wb.rd, val);
    }

    match wb.ctrl.hi_lo {
        HiLoOp::None | HiLoOp::Mfhi | HiLoOp::Mflo => {}
        HiLoOp::Mthi => cpu.next.hi = wb.alu,
        HiLoOp::Mtlo => cpu.next.lo = wb.alu,
        HiLoOp::Mult | HiLoOp::Multu => {
            cpu.next.lo = wb.product as u32;
            cpu.next.hi = (wb.product >> 32) as u32;
        }
        HiLoOp::Div | HiLoOp::Divu => {
            cpu.next.lo = wb.alu;
            cpu.next.hi = wb.remainder;
        }
    }

    if wb.ctrl.is_syscall && wb.alu == cpu.config.v0_halt_value {
        cpu.run_flag = false;
    }
}
