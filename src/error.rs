//! The error taxonomy (§7). Only program load failure is a real,
//! propagating error — the rest are "log and keep going" conditions that get
//! appended to an in-memory diagnostics log rather than unwinding `tick()`.

use std::fmt;

/// A non-fatal condition observed during simulation. Collected by [`crate::cpu::Cpu`]
/// and surfaced on demand (the `print` REPL command, or a caller inspecting
/// `Cpu::diagnostics()`), never by aborting the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimDiagnostic {
    /// Opcode/function combination this simulator does not implement.
    UnimplementedOpcode { pc: u32, word: u32 },
    /// DIV/DIVU with a zero divisor: HI/LO left unchanged, per §7 item 3.
    DivideByZero { pc: u32 },
    /// A memory access fell outside every region; already handled silently
    /// by [`crate::memory::Memory`], logged here only for diagnostics.
    OutOfRegionAccess { addr: u32, write: bool },
}

impl fmt::Display for SimDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnimplementedOpcode { pc, word } => {
                write!(f, "unimplemented opcode 0x{word:08x} at pc=0x{pc:08x}")
            }
            Self::DivideByZero { pc } => write!(f, "divide by zero at pc=0x{pc:08x}, HI/LO unchanged"),
            Self::OutOfRegionAccess { addr, write } => {
                let verb = if *write { "write to" } else { "read from" };
                write!(f, "{verb} out-of-region address 0x{addr:08x}")
            }
        }
    }
}

/// Fatal: the program file could not be loaded (§7 item 1). The only error
/// category that actually propagates as a `Result`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not open program file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("{path}:{line}: not a valid hexadecimal instruction word: {text:?}")]
    MalformedWord { path: String, line: usize, text: String },
}
