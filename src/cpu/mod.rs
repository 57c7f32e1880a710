//! The CPU: architectural state, pipeline latches, and the per-cycle
//! driver that calls the five stages in WB, MEM, EX, ID, IF order so each
//! stage reads the previous cycle's latch values before anything downstream
//! overwrites them (§5).

pub mod arch;
pub mod cache;
pub mod control;
pub mod pipeline;
pub mod stages;

use self::arch::ArchState;
use self::cache::L1DataCache;
use self::pipeline::{ExMem, IdEx, IfId, MemWb};
use crate::config::Config;
use crate::error::SimDiagnostic;
use crate::memory::{self, Memory};
use crate::stats::SimStats;

pub struct Cpu {
    pub current: ArchState,
    pub next: ArchState,
    pub mem: Memory,
    pub cache: L1DataCache,

    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,

    /// Snapshot of `mem_wb` taken right after WB consumes it each cycle,
    /// before MEM overwrites it with the next instruction's result. ID reads
    /// this to forward from the instruction retiring in WB this very cycle
    /// (§4.4.2) — a distance the live `mem_wb` latch can no longer see by
    /// the time ID runs.
    pub retiring_wb: MemWb,

    /// Set by EX on a taken branch/jump; peeked by ID (forces a bubble) and
    /// consumed by IF (forces a bubble and redirects `next.pc`) this same
    /// cycle — the mechanism behind the 2-instruction flush (§4.6).
    pub pending_flush: Option<u32>,

    pub config: Config,
    pub trace: bool,
    pub forwarding_enabled: bool,
    pub run_flag: bool,

    pub stats: SimStats,
    pub diagnostics: Vec<SimDiagnostic>,
}

impl Cpu {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut current = ArchState::default();
        current.pc = memory::TEXT_BEGIN;

        Self {
            current,
            next: ArchState::default(),
            mem: Memory::new(),
            cache: L1DataCache::new(),

            if_id: IfId::default(),
            id_ex: IdEx::default(),
            ex_mem: ExMem::default(),
            mem_wb: MemWb::default(),
            retiring_wb: MemWb::default(),

            pending_flush: None,

            trace: config.trace,
            forwarding_enabled: config.forwarding_enabled,
            config,
            run_flag: true,

            stats: SimStats::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Returns the program's loaded memory to a fresh [`Cpu`] for re-running,
    /// matching the REPL's `reset` command (§6.4). Memory contents are left
    /// untouched; the caller reloads the program if it wants a clean image.
    pub fn reset(&mut self) {
        self.current = ArchState::default();
        self.current.pc = memory::TEXT_BEGIN;
        self.next = ArchState::default();
        self.cache.reset();

        self.if_id = IfId::default();
        self.id_ex = IdEx::default();
        self.ex_mem = ExMem::default();
        self.mem_wb = MemWb::default();
        self.retiring_wb = MemWb::default();
        self.pending_flush = None;

        self.run_flag = true;
        self.stats = SimStats::default();
        self.diagnostics.clear();
    }

    /// Advances the simulator by exactly one clock cycle.
    pub fn tick(&mut self) {
        if self.trace {
            self.print_pipeline_diagram();
        }

        self.stats.cycles += 1;
        self.next = self.current.clone();

        stages::write_back::run(self);
        self.retiring_wb = self.mem_wb.clone();

        stages::mem::run(self);
        let ex_mem_snapshot = self.ex_mem.clone();

        stages::execute::run(self);

        if self.pending_flush.is_some() {
            stages::decode::run(self);
            stages::fetch::run(self);
        } else {
            let hilo_stall = control::need_stall_hilo(&self.id_ex, &ex_mem_snapshot, self.if_id.inst);
            let stall = hilo_stall
                || if self.forwarding_enabled {
                    control::need_stall_load_use(&self.id_ex, self.if_id.inst)
                } else {
                    control::need_stall_raw(&self.id_ex, &ex_mem_snapshot, &self.retiring_wb, self.if_id.inst)
                };

            if stall {
                self.id_ex = IdEx::default();
                self.stats.stalls_data += 1;
            } else {
                stages::decode::run(self);
                stages::fetch::run(self);
            }
        }

        self.current = self.next.clone();
    }

    /// Runs until [`Self::run_flag`] drops (a SYSCALL halt) or `max_cycles`
    /// is reached, whichever comes first. Returns the number of cycles run.
    pub fn run(&mut self, max_cycles: u64) -> u64 {
        let mut ran = 0;
        while self.run_flag && ran < max_cycles {
            self.tick();
            ran += 1;
        }
        ran
    }

    pub fn print_stats(&self) {
        self.stats.print(self.cache.hits, self.cache.misses);
    }

    fn print_pipeline_diagram(&self) {
        let fmt = |pc: u32, inst: u32| {
            if inst == crate::isa::NOP { format!("[{:^8}]", "bubble") } else { format!("[{pc:08x}]") }
        };
        eprintln!(
            "IF:[{:08x}] -> ID:{} -> EX:{} -> MEM:{} -> WB:{}",
            self.current.pc,
            fmt(self.if_id.pc, self.if_id.inst),
            fmt(self.id_ex.pc, self.id_ex.inst),
            fmt(self.ex_mem.pc, self.ex_mem.inst),
            fmt(self.mem_wb.pc, self.mem_wb.inst),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_r(funct: u32, rs: usize, rt: usize, rd: usize) -> u32 {
        ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | funct
    }

    fn encode_i(opcode: u32, rs: usize, rt: usize, imm: u16) -> u32 {
        (opcode << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | imm as u32
    }

    // ADDI $8, $0, 5; ADDI $9, $0, 7; ADD $10, $8, $9; SYSCALL (v0 preloaded).
    fn load_program(cpu: &mut Cpu, words: &[u32]) {
        let mut addr = memory::TEXT_BEGIN;
        for &w in words {
            cpu.mem.write_word(addr, w);
            addr += 4;
        }
    }

    #[test]
    fn straight_line_arithmetic_commits_in_order_without_forwarding() {
        let mut cpu = Cpu::new(Config { forwarding_enabled: false, ..Config::default() });
        load_program(
            &mut cpu,
            &[
                encode_i(crate::isa::opcodes::ADDI, 0, 8, 5),
                encode_i(crate::isa::opcodes::ADDI, 0, 9, 7),
                encode_r(crate::isa::function::ADD, 8, 9, 10),
            ],
        );
        // Drain enough cycles for the third instruction to clear WB: with no
        // forwarding, ADD stalls on both RAW dependencies.
        cpu.run(20);
        assert_eq!(cpu.current.read_reg(10), 12);
    }

    #[test]
    fn forwarding_avoids_stalling_a_back_to_back_dependency() {
        let mut cpu = Cpu::new(Config { forwarding_enabled: true, ..Config::default() });
        load_program(
            &mut cpu,
            &[
                encode_i(crate::isa::opcodes::ADDI, 0, 8, 5),
                encode_r(crate::isa::function::ADD, 8, 8, 9), // $9 = $8 + $8, uses $8 fresh out of EX
            ],
        );
        cpu.run(10);
        assert_eq!(cpu.current.read_reg(9), 10);
    }

    #[test]
    fn syscall_with_v0_halt_value_stops_the_run() {
        let mut cpu = Cpu::new(Config::default());
        load_program(
            &mut cpu,
            &[
                encode_i(crate::isa::opcodes::ADDI, 0, 2, 0xA), // $v0 = 10
                encode_r(crate::isa::function::SYSCALL, 0, 0, 0),
            ],
        );
        cpu.run(30);
        assert!(!cpu.run_flag);
    }

    #[test]
    fn register_zero_never_changes_even_when_targeted() {
        let mut cpu = Cpu::new(Config::default());
        load_program(&mut cpu, &[encode_i(crate::isa::opcodes::ADDI, 0, 0, 5)]);
        cpu.run(10);
        assert_eq!(cpu.current.read_reg(0), 0);
    }
}
