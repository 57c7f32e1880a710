//! Interactive command loop (§6.4), grounded in the original simulator's
//! read-a-line-then-dispatch REPL: `sim`/`runAll`, `run <n>`, `rdump`,
//! `mdump <start> <stop>`, `input <reg> <val>`, `high <v>`, `low <v>`,
//! `print`, `show`, `f <0|1>`, `reset`, `?`, `quit`.

use std::io::{self, BufRead, Write};

use crate::cpu::Cpu;

const REGISTER_NAMES: [&str; 32] = [
    "$0", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Runs the interactive loop against `cpu`, reading commands from stdin
/// until `quit` or EOF. Returns normally in either case.
pub fn run(cpu: &mut Cpu) {
    print_help();
    let stdin = io::stdin();

    loop {
        print!("MIPS-SIM> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["quit"] | ["q"] => break,
            ["?"] | ["help"] => print_help(),
            ["sim"] | ["runAll"] => {
                let ran = cpu.run(u64::MAX);
                println!("Ran {ran} cycles.");
            }
            ["run", n] => match n.parse::<u64>() {
                Ok(n) => {
                    let ran = cpu.run(n);
                    println!("Ran {ran} cycles.");
                }
                Err(_) => println!("usage: run <cycle-count>"),
            },
            ["rdump"] => dump_registers(cpu),
            ["mdump", start, stop] => match (parse_addr(start), parse_addr(stop)) {
                (Some(s), Some(e)) => dump_memory(cpu, s, e),
                _ => println!("usage: mdump <start> <stop> (hex or decimal)"),
            },
            ["input", reg, val] => match (reg.parse::<usize>(), parse_addr(val)) {
                (Ok(r), Some(v)) if r < 32 => {
                    cpu.current.write_reg(r, v);
                    cpu.next.write_reg(r, v);
                }
                _ => println!("usage: input <register 0-31> <value>"),
            },
            ["high", v] => match parse_addr(v) {
                Some(v) => {
                    cpu.current.hi = v;
                    cpu.next.hi = v;
                }
                None => println!("usage: high <value>"),
            },
            ["low", v] => match parse_addr(v) {
                Some(v) => {
                    cpu.current.lo = v;
                    cpu.next.lo = v;
                }
                None => println!("usage: low <value>"),
            },
            ["print"] => {
                cpu.print_stats();
                print_diagnostics(cpu);
            }
            ["show"] => println!(
                "forwarding={} trace={} pc={:#010x} run_flag={}",
                cpu.forwarding_enabled, cpu.trace, cpu.current.pc, cpu.run_flag
            ),
            ["f", "0"] => cpu.forwarding_enabled = false,
            ["f", "1"] => cpu.forwarding_enabled = true,
            ["reset"] => cpu.reset(),
            other => println!("unrecognized command: {}", other.join(" ")),
        }
    }
}

fn parse_addr(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u32>().ok().or_else(|| u32::from_str_radix(s, 16).ok())
    }
}

fn dump_registers(cpu: &Cpu) {
    println!("PC   = {:#010x}", cpu.current.pc);
    println!("HI   = {:#010x}    LO = {:#010x}", cpu.current.hi, cpu.current.lo);
    for i in (0..32).step_by(2) {
        println!(
            "R{:<2} ({:<4}) = {:#010x}    R{:<2} ({:<4}) = {:#010x}",
            i,
            REGISTER_NAMES[i],
            cpu.current.regs()[i],
            i + 1,
            REGISTER_NAMES[i + 1],
            cpu.current.regs()[i + 1],
        );
    }
}

/// Surfaces the non-fatal diagnostics (§7 items 2-4) collected since the
/// last reset — the CLI's only window into conditions the core itself
/// never aborts for.
fn print_diagnostics(cpu: &Cpu) {
    if cpu.diagnostics.is_empty() {
        return;
    }
    println!("\n[Diagnostics]");
    for d in &cpu.diagnostics {
        println!("  {d}");
    }
}

fn dump_memory(cpu: &Cpu, start: u32, stop: u32) {
    let mut addr = start & !0x3;
    while addr <= stop {
        println!("{:#010x}: {:#010x}", addr, cpu.mem.read_word(addr));
        addr = addr.wrapping_add(4);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  sim | runAll         run until halt");
    println!("  run <n>              run n cycles");
    println!("  rdump                dump registers, HI/LO, PC");
    println!("  mdump <lo> <hi>      dump memory words in [lo, hi]");
    println!("  input <reg> <val>    set a register");
    println!("  high <val>           set HI");
    println!("  low <val>            set LO");
    println!("  print                print run statistics");
    println!("  show                 show simulator settings");
    println!("  f <0|1>              disable/enable forwarding");
    println!("  reset                reset architectural state");
    println!("  quit                 exit");
}
