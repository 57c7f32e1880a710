//! Run statistics: cycle/instruction counts, stall breakdown, instruction
//! mix, and cache hit rate — printed by the `print` REPL command.

#[derive(Default, Debug)]
pub struct SimStats {
    pub cycles: u64,
    pub instructions_retired: u64,

    pub stalls_data: u64,
    pub stalls_control: u64,

    pub inst_load: u64,
    pub inst_store: u64,
    pub inst_branch: u64,
    pub inst_alu: u64,
    pub inst_system: u64,
}

impl SimStats {
    pub fn print(&self, cache_hits: u64, cache_misses: u64) {
        println!("\n=========================================================");

        println!("\n[General]");
        println!("  Cycles:               {}", self.cycles);
        println!("  Instructions Retired: {}", self.instructions_retired);

        let ipc =
            if self.cycles > 0 { self.instructions_retired as f64 / self.cycles as f64 } else { 0.0 };
        println!("  IPC:                  {ipc:.4}");

        println!("\n[Pipeline Stalls]");
        let total_stalls = self.stalls_data + self.stalls_control;
        if total_stalls > 0 {
            println!("  Total Stalled Cycles: {total_stalls}");
            println!(
                "    Data Hazards:       {:<10} ({:.2}%)",
                self.stalls_data,
                (self.stalls_data as f64 / total_stalls as f64) * 100.0
            );
            println!(
                "    Control Hazards:    {:<10} ({:.2}%)",
                self.stalls_control,
                (self.stalls_control as f64 / total_stalls as f64) * 100.0
            );
        } else {
            println!("  Total Stalled Cycles: 0");
        }

        println!("\n[Instruction Mix]");
        let total_inst = self.instructions_retired as f64;
        if total_inst > 0.0 {
            println!(
                "  ALU Operations:       {:<10} ({:.2}%)",
                self.inst_alu,
                (self.inst_alu as f64 / total_inst) * 100.0
            );
            println!(
                "  Loads:                {:<10} ({:.2}%)",
                self.inst_load,
                (self.inst_load as f64 / total_inst) * 100.0
            );
            println!(
                "  Stores:               {:<10} ({:.2}%)",
                self.inst_store,
                (self.inst_store as f64 / total_inst) * 100.0
            );
            println!(
                "  Branches/Jumps:       {:<10} ({:.2}%)",
                self.inst_branch,
                (self.inst_branch as f64 / total_inst) * 100.0
            );
            println!(
                "  System:               {:<10} ({:.2}%)",
                self.inst_system,
                (self.inst_system as f64 / total_inst) * 100.0
            );
        }

        println!("\n[Memory Hierarchy]");
        let total = cache_hits + cache_misses;
        if total > 0 {
            let rate = cache_hits as f64 / total as f64;
            println!("  L1 D-Cache:          {:.2}% hit rate ({} / {})", rate * 100.0, cache_hits, total);
        } else {
            println!("  L1 D-Cache:          No Accesses");
        }

        println!("=========================================================\n");
    }
}
