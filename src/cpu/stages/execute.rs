//! EX: the ALU, HI/LO multiply-divide unit, and branch/jump resolution
//! (§4.4.3). A taken branch or jump sets `cpu.pending_flush`, which ID and
//! IF consume this same cycle to drop the two younger instructions.

use crate::cpu::control::{AluOp, BranchKind, HiLoOp, JumpKind};
use crate::cpu::pipeline::ExMem;
use crate::cpu::Cpu;
use crate::error::SimDiagnostic;

fn alu(op: AluOp, a: u32, b: u32, shamt: u32) -> u32 {
    match op {
        AluOp::Add => (a as i32).wrapping_add(b as i32) as u32,
        AluOp::Addu => a.wrapping_add(b),
        AluOp::Sub => (a as i32).wrapping_sub(b as i32) as u32,
        AluOp::Subu => a.wrapping_sub(b),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Nor => !(a | b),
        AluOp::Slt => ((a as i32) < (b as i32)) as u32,
        AluOp::Sltu => (a < b) as u32,
        AluOp::Sll => b.wrapping_shl(shamt),
        AluOp::Srl => b.wrapping_shr(shamt),
        // Arithmetic shift: sign-extend, not the bit-trick the original
        // source used that broke for large shift amounts (§9 ambiguity a).
        AluOp::Sra => ((b as i32) >> shamt) as u32,
        AluOp::Lui => b << 16,
    }
}

pub fn run(cpu: &mut Cpu) {
    let id = cpu.id_ex.clone();

    if !id.valid {
        cpu.ex_mem = ExMem::default();
        return;
    }

    if cpu.trace {
        eprintln!("EX  pc={:#010x} inst={:#010x} rv1={:#010x} rv2={:#010x}", id.pc, id.inst, id.rv1, id.rv2);
    }

    let ctrl = id.ctrl;
    let imm_u = id.imm as u32;

    let mut alu_out = 0u32;
    let mut remainder = 0u32;
    let mut product = 0u64;

    match ctrl.hi_lo {
        HiLoOp::None => {}
        HiLoOp::Mfhi => alu_out = cpu.current.hi,
        HiLoOp::Mflo => alu_out = cpu.current.lo,
        HiLoOp::Mthi | HiLoOp::Mtlo => alu_out = id.rv1,
        HiLoOp::Mult => product = ((id.rv1 as i32 as i64) * (id.rv2 as i32 as i64)) as u64,
        HiLoOp::Multu => product = (id.rv1 as u64) * (id.rv2 as u64),
        HiLoOp::Div => {
            if id.rv2 == 0 {
                cpu.diagnostics.push(SimDiagnostic::DivideByZero { pc: id.pc });
            } else {
                alu_out = ((id.rv1 as i32).wrapping_div(id.rv2 as i32)) as u32;
                remainder = ((id.rv1 as i32).wrapping_rem(id.rv2 as i32)) as u32;
            }
        }
        HiLoOp::Divu => {
            if id.rv2 == 0 {
                cpu.diagnostics.push(SimDiagnostic::DivideByZero { pc: id.pc });
            } else {
                alu_out = id.rv1 / id.rv2;
                remainder = id.rv1 % id.rv2;
            }
        }
    }

    if ctrl.is_syscall {
        // $v0 flows through as an ordinary operand; WB decides whether to halt.
        alu_out = id.rv1;
    } else if ctrl.mem_read || ctrl.mem_write {
        alu_out = id.rv1.wrapping_add(imm_u);
    } else if matches!(ctrl.hi_lo, HiLoOp::None) {
        let op_b = if ctrl.use_imm { imm_u } else { id.rv2 };
        alu_out = alu(ctrl.alu, id.rv1, op_b, id.shamt);
    }

    if ctrl.branch != BranchKind::None {
        let taken = match ctrl.branch {
            BranchKind::Beq => id.rv1 == id.rv2,
            BranchKind::Bne => id.rv1 != id.rv2,
            BranchKind::Blez => (id.rv1 as i32) <= 0,
            BranchKind::Bgtz => (id.rv1 as i32) > 0,
            BranchKind::Bltz => (id.rv1 as i32) < 0,
            BranchKind::Bgez => (id.rv1 as i32) >= 0,
            BranchKind::None => false,
        };
        if taken {
            let target = id.pc.wrapping_add(4).wrapping_add((id.imm as u32).wrapping_shl(2));
            cpu.pending_flush = Some(target);
            cpu.stats.stalls_control += 2;
        }
    }

    match ctrl.jump {
        JumpKind::None => {}
        JumpKind::J => {
            let target = (id.pc.wrapping_add(4) & 0xF000_0000) | raw_target(id.inst);
            cpu.pending_flush = Some(target);
            cpu.stats.stalls_control += 2;
        }
        JumpKind::Jal => {
            let target = (id.pc.wrapping_add(4) & 0xF000_0000) | raw_target(id.inst);
            alu_out = id.pc.wrapping_add(8);
            cpu.pending_flush = Some(target);
            cpu.stats.stalls_control += 2;
        }
        JumpKind::Jr => {
            cpu.pending_flush = Some(id.rv1);
            cpu.stats.stalls_control += 2;
        }
        JumpKind::Jalr => {
            alu_out = id.pc.wrapping_add(8);
            cpu.pending_flush = Some(id.rv1);
            cpu.stats.stalls_control += 2;
        }
    }

    cpu.ex_mem = ExMem {
        pc: id.pc,
        inst: id.inst,
        rd: id.rd,
        alu: alu_out,
        store_data: id.rv2,
        remainder,
        product,
        ctrl,
        valid: true,
    };
}

/// The 26-bit jump target field (bits 25-0), already shifted left by 2.
fn raw_target(inst: u32) -> u32 {
    (inst & 0x03FF_FFFF) << 2
}
