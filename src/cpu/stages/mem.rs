//! MEM: the only stage that talks to the L1 data cache (§4.4.4). The cache
//! is word-granular, so byte/halfword accesses fetch or read-modify-write
//! the containing word and slice out the bytes they need.

use crate::cpu::control::MemWidth;
use crate::cpu::pipeline::MemWb;
use crate::cpu::Cpu;

fn word_aligned(addr: u32) -> u32 {
    addr & !0x3
}

fn fetch_word(cpu: &mut Cpu, addr: u32) -> u32 {
    let aligned = word_aligned(addr);
    if cpu.cache.is_hit(aligned) {
        cpu.cache.read_word(aligned)
    } else {
        let mem = cpu.mem.clone();
        cpu.cache.load_line(aligned, &mem)
    }
}

pub fn run(cpu: &mut Cpu) {
    let ex = cpu.ex_mem.clone();

    if !ex.valid {
        cpu.mem_wb = MemWb::default();
        return;
    }

    if cpu.trace {
        eprintln!("MEM pc={:#010x} inst={:#010x} ea={:#010x}", ex.pc, ex.inst, ex.alu);
    }

    let ea = ex.alu;
    let mut lmd = 0u32;

    if ex.ctrl.mem_read {
        let word = fetch_word(cpu, ea);
        let shift = (ea & 0x3) * 8;
        lmd = match ex.ctrl.width {
            MemWidth::Byte => {
                let byte = (word >> shift) as u8;
                if ex.ctrl.signed_load { byte as i8 as i32 as u32 } else { byte as u32 }
            }
            MemWidth::Half => {
                let half = (word >> shift) as u16;
                if ex.ctrl.signed_load { half as i16 as i32 as u32 } else { half as u32 }
            }
            MemWidth::Word => word,
            MemWidth::Nop => 0,
        };
    } else if ex.ctrl.mem_write {
        let aligned = word_aligned(ea);
        let shift = (ea & 0x3) * 8;
        let value = match ex.ctrl.width {
            MemWidth::Word => ex.store_data,
            MemWidth::Half => {
                let current = fetch_word(cpu, ea);
                let mask = !(0xFFFFu32 << shift);
                (current & mask) | ((ex.store_data & 0xFFFF) << shift)
            }
            MemWidth::Byte => {
                let current = fetch_word(cpu, ea);
                let mask = !(0xFFu32 << shift);
                (current & mask) | ((ex.store_data & 0xFF) << shift)
            }
            MemWidth::Nop => 0,
        };
        cpu.cache.write_word(aligned, value, &mut cpu.mem);
    }

    cpu.mem_wb = MemWb {
        pc: ex.pc,
        inst: ex.inst,
        rd: ex.rd,
        alu: ex.alu,
        lmd,
        remainder: ex.remainder,
        product: ex.product,
        ctrl: ex.ctrl,
        valid: true,
    };
}
