//! IF: fetch the instruction word at `current.pc` (§4.4.1).
//!
//! Instruction memory is flat and never misses (documented non-goal), so
//! this stage has nothing to stall on except a pending branch/jump flush,
//! which is handled by writing a bubble and redirecting `next.pc` instead of
//! fetching normally.

use crate::cpu::pipeline::IfId;
use crate::cpu::Cpu;

pub fn run(cpu: &mut Cpu) {
    if let Some(target) = cpu.pending_flush.take() {
        cpu.if_id = IfId::default();
        cpu.next.pc = target;
        return;
    }

    let pc = cpu.current.pc;
    let inst = cpu.mem.read_word(pc);

    if cpu.trace {
        eprintln!("IF  pc={pc:#010x} inst={inst:#010x}");
    }

    cpu.if_id = IfId { pc, inst };
    cpu.next.pc = pc.wrapping_add(4);
}
