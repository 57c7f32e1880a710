//! ID: split the IR into fields, build control signals for the opcode
//! class, and read operands through the forwarding mux (§4.4.2).

use crate::cpu::control::{self, AluOp, BranchKind, ControlSignals, HiLoOp, JumpKind, MemWidth};
use crate::cpu::pipeline::IdEx;
use crate::cpu::Cpu;
use crate::error::SimDiagnostic;
use crate::isa::decode::Decoded;
use crate::isa::{function, opcodes, regimm};

pub fn run(cpu: &mut Cpu) {
    if cpu.pending_flush.is_some() {
        // A branch/jump just resolved taken in EX this cycle: whatever is
        // sitting in IF/ID right now must never retire.
        cpu.id_ex = IdEx::default();
        return;
    }

    let inst = cpu.if_id.inst;
    let pc = cpu.if_id.pc;

    if inst == crate::isa::NOP {
        cpu.id_ex = IdEx::default();
        return;
    }

    if cpu.trace {
        eprintln!("ID  pc={pc:#010x} inst={inst:#010x}");
    }

    let d = Decoded::new(inst);
    let built = build_control(&d);

    let (ctrl, dest, valid) = match built {
        Some((ctrl, dest)) => (ctrl, dest, true),
        None => {
            cpu.diagnostics.push(SimDiagnostic::UnimplementedOpcode { pc, word: inst });
            (ControlSignals::default(), 0, false)
        }
    };

    // SYSCALL reads $v0 (register 2) regardless of the instruction's rs
    // field, which the assembler leaves as $zero.
    let rs = if ctrl.is_syscall { 2 } else { d.rs };

    let raw_rs = cpu.current.read_reg(rs);
    let raw_rt = cpu.current.read_reg(d.rt);

    let (rv1, rv2) = if cpu.forwarding_enabled {
        control::forward_rs(rs, d.rt, raw_rs, raw_rt, &cpu.ex_mem, &cpu.mem_wb, &cpu.retiring_wb)
    } else {
        (raw_rs, raw_rt)
    };

    cpu.id_ex = IdEx {
        pc,
        inst,
        rs,
        rt: d.rt,
        rd: dest,
        shamt: d.shamt,
        imm: if ctrl.zero_extend_imm { d.imm_zero as i32 } else { d.imm_sign },
        rv1,
        rv2,
        ctrl,
        valid,
    };
}

/// Builds control signals and the destination register index for `d`.
/// Returns `None` for an unimplemented opcode/function combination.
fn build_control(d: &Decoded) -> Option<(ControlSignals, usize)> {
    let mut c = ControlSignals::default();

    match d.opcode {
        opcodes::SPECIAL => return build_special(d, &mut c),

        opcodes::REGIMM => {
            c.branch = match d.rt {
                regimm::BLTZ => BranchKind::Bltz,
                regimm::BGEZ => BranchKind::Bgez,
                _ => return None,
            };
            return Some((c, 0));
        }

        opcodes::J => {
            c.jump = JumpKind::J;
            return Some((c, 0));
        }
        opcodes::JAL => {
            c.jump = JumpKind::Jal;
            c.reg_write = true;
            c.link = true;
            return Some((c, 31));
        }

        opcodes::BEQ => c.branch = BranchKind::Beq,
        opcodes::BNE => c.branch = BranchKind::Bne,
        opcodes::BLEZ => c.branch = BranchKind::Blez,
        opcodes::BGTZ => c.branch = BranchKind::Bgtz,

        opcodes::ADDI => {
            c.reg_write = true;
            c.alu = AluOp::Add;
            c.use_imm = true;
        }
        opcodes::ADDIU => {
            c.reg_write = true;
            c.alu = AluOp::Addu;
            c.use_imm = true;
        }
        opcodes::SLTI => {
            c.reg_write = true;
            c.alu = AluOp::Slt;
            c.use_imm = true;
        }
        opcodes::ANDI => {
            c.reg_write = true;
            c.alu = AluOp::And;
            c.zero_extend_imm = true;
            c.use_imm = true;
        }
        opcodes::ORI => {
            c.reg_write = true;
            c.alu = AluOp::Or;
            c.zero_extend_imm = true;
            c.use_imm = true;
        }
        opcodes::XORI => {
            c.reg_write = true;
            c.alu = AluOp::Xor;
            c.zero_extend_imm = true;
            c.use_imm = true;
        }
        opcodes::LUI => {
            c.reg_write = true;
            c.alu = AluOp::Lui;
            c.use_imm = true;
        }

        opcodes::LB => {
            c.reg_write = true;
            c.mem_read = true;
            c.width = MemWidth::Byte;
            c.signed_load = true;
        }
        opcodes::LH => {
            c.reg_write = true;
            c.mem_read = true;
            c.width = MemWidth::Half;
            c.signed_load = true;
        }
        opcodes::LW => {
            c.reg_write = true;
            c.mem_read = true;
            c.width = MemWidth::Word;
        }
        opcodes::SB => {
            c.mem_write = true;
            c.width = MemWidth::Byte;
        }
        opcodes::SH => {
            c.mem_write = true;
            c.width = MemWidth::Half;
        }
        opcodes::SW => {
            c.mem_write = true;
            c.width = MemWidth::Word;
        }

        _ => return None,
    }

    let dest = match d.opcode {
        opcodes::BEQ | opcodes::BNE | opcodes::BLEZ | opcodes::BGTZ | opcodes::SB | opcodes::SH
        | opcodes::SW => 0,
        _ => d.rt,
    };
    Some((c, dest))
}

fn build_special(d: &Decoded, c: &mut ControlSignals) -> Option<(ControlSignals, usize)> {
    let dest = match d.funct {
        function::SLL | function::SRL | function::SRA => {
            c.reg_write = true;
            c.alu = match d.funct {
                function::SLL => AluOp::Sll,
                function::SRL => AluOp::Srl,
                _ => AluOp::Sra,
            };
            d.rd
        }
        function::JR => {
            c.jump = JumpKind::Jr;
            0
        }
        function::JALR => {
            c.jump = JumpKind::Jalr;
            c.reg_write = true;
            c.link = true;
            d.rd
        }
        function::SYSCALL => {
            c.is_syscall = true;
            0
        }
        function::MFHI => {
            c.reg_write = true;
            c.hi_lo = HiLoOp::Mfhi;
            d.rd
        }
        function::MFLO => {
            c.reg_write = true;
            c.hi_lo = HiLoOp::Mflo;
            d.rd
        }
        function::MTHI => {
            c.hi_lo = HiLoOp::Mthi;
            0
        }
        function::MTLO => {
            c.hi_lo = HiLoOp::Mtlo;
            0
        }
        function::MULT => {
            c.hi_lo = HiLoOp::Mult;
            0
        }
        function::MULTU => {
            c.hi_lo = HiLoOp::Multu;
            0
        }
        function::DIV => {
            c.hi_lo = HiLoOp::Div;
            0
        }
        function::DIVU => {
            c.hi_lo = HiLoOp::Divu;
            0
        }
        function::ADD => {
            c.reg_write = true;
            c.alu = AluOp::Add;
            d.rd
        }
        function::ADDU => {
            c.reg_write = true;
            c.alu = AluOp::Addu;
            d.rd
        }
        function::SUB => {
            c.reg_write = true;
            c.alu = AluOp::Sub;
            d.rd
        }
        function::SUBU => {
            c.reg_write = true;
            c.alu = AluOp::Subu;
            d.rd
        }
        function::AND => {
            c.reg_write = true;
            c.alu = AluOp::And;
            d.rd
        }
        function::OR => {
            c.reg_write = true;
            c.alu = AluOp::Or;
            d.rd
        }
        function::XOR => {
            c.reg_write = true;
            c.alu = AluOp::Xor;
            d.rd
        }
        function::NOR => {
            c.reg_write = true;
            c.alu = AluOp::Nor;
            d.rd
        }
        function::SLT => {
            c.reg_write = true;
            c.alu = AluOp::Slt;
            d.rd
        }
        _ => return None,
    };
    Some((*c, dest))
}
