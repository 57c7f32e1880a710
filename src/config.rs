//! Runtime-configurable knobs, optionally loaded from a JSON file via
//! `--config` (the host crate's `Config`/`serde::Deserialize` pattern,
//! scaled down to the three knobs this simulator exposes).

use serde::Deserialize;

mod defaults {
    /// Forwarding is disabled by default (§4.5): the baseline mode is pure
    /// stall-on-RAW, matching the original source's `ENABLE_FORWARDING = 0`.
    pub const FORWARDING_ENABLED: bool = false;
    /// Per-cycle pipeline-diagram tracing is off by default.
    pub const TRACE: bool = false;
    /// `$v0` value that triggers a SYSCALL halt (§4.4.3, §7 item 5).
    pub const V0_HALT_VALUE: u32 = 0xA;
}

/// Simulator-wide configuration. All fields have defaults matching §4.5/§7,
/// so an empty `{}` config file is valid.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forwarding_enabled: bool,
    pub trace: bool,
    pub v0_halt_value: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forwarding_enabled: defaults::FORWARDING_ENABLED,
            trace: defaults::TRACE,
            v0_halt_value: defaults::V0_HALT_VALUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let cfg = Config::default();
        assert!(!cfg.forwarding_enabled);
        assert!(!cfg.trace);
        assert_eq!(cfg.v0_halt_value, 0xA);
    }

    #[test]
    fn partial_json_fills_in_remaining_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"forwarding_enabled": true}"#).unwrap();
        assert!(cfg.forwarding_enabled);
        assert_eq!(cfg.v0_halt_value, 0xA);
    }
}
