use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mips_pipe_sim::config::Config;
use mips_pipe_sim::cpu::Cpu;
use mips_pipe_sim::{loader, repl};

/// A cycle-accurate five-stage MIPS32 pipeline simulator with an
/// integrated L1 data cache.
#[derive(Parser)]
#[command(name = "mipssim", version, about)]
struct Cli {
    /// Program file to load before starting (ASCII-hex instruction words).
    program: Option<PathBuf>,

    /// JSON config file overriding the default knobs.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable operand forwarding (default: pure stall-on-RAW).
    #[arg(long)]
    forwarding: bool,

    /// Emit a per-cycle pipeline trace to stderr.
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the loaded program non-interactively and print final statistics.
    Run {
        program: PathBuf,
        #[arg(long, default_value_t = 1_000_000)]
        cycles: u64,
        #[arg(long)]
        trace: bool,
        #[arg(long)]
        forwarding: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Config {
    match path {
        None => Config::default(),
        Some(p) => match fs::read_to_string(p) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("warning: could not parse config {}: {e}, using defaults", p.display());
                Config::default()
            }),
            Err(e) => {
                eprintln!("warning: could not read config {}: {e}, using defaults", p.display());
                Config::default()
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Command::Run { program, cycles, trace, forwarding, config }) = cli.command {
        let mut cfg = load_config(config.as_ref());
        cfg.trace |= trace;
        cfg.forwarding_enabled |= forwarding;

        let mut cpu = Cpu::new(cfg);
        if let Err(e) = loader::load_program(&program, &mut cpu.mem) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }

        let ran = cpu.run(cycles);
        println!("Halted after {ran} cycles (run_flag={}).", cpu.run_flag);
        cpu.print_stats();
        return ExitCode::SUCCESS;
    }

    let mut cfg = load_config(cli.config.as_ref());
    cfg.trace |= cli.trace;
    cfg.forwarding_enabled |= cli.forwarding;

    let mut cpu = Cpu::new(cfg);

    if let Some(program) = &cli.program {
        if let Err(e) = loader::load_program(program, &mut cpu.mem) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    } else {
        eprintln!("no program given; starting with an empty TEXT segment");
    }

    repl::run(&mut cpu);
    ExitCode::SUCCESS
}
