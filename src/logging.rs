use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Log verbosity fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
}

impl LogConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// CLI verbosity: `--quiet` wins over `--verbose`; warnings only otherwise.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        let level = if quiet {
            LevelFilter::OFF
        } else if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };
        Self::new(level)
    }

    /// CLI verbosity once settings are resolved: the flags win, otherwise a
    /// `debug` setting from the environment or profile enables debug logs.
    pub fn for_cli(verbose: bool, quiet: bool, debug: bool) -> Self {
        if debug && !verbose && !quiet {
            Self::new(LevelFilter::DEBUG)
        } else {
            Self::from_flags(verbose, quiet)
        }
    }

    /// Server verbosity: debug when enabled, info otherwise.
    pub fn from_debug(debug: bool) -> Self {
        Self::new(if debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    // A subscriber may already be installed by an embedding process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

pub fn format_bytes(bytes: usize) -> String {
    const UNIT: usize = 1024;
    const SUFFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / UNIT as f64;
    let mut exp = 0;
    while value >= UNIT as f64 && exp < SUFFIXES.len() - 1 {
        value /= UNIT as f64;
        exp += 1;
    }
    format!("{value:.1} {}B", SUFFIXES[exp])
}

#[cfg(test)]
mod tests {
    use super::{LogConfig, format_bytes};
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(LogConfig::from_flags(true, true).level, LevelFilter::OFF);
        assert_eq!(LogConfig::from_flags(true, false).level, LevelFilter::DEBUG);
        assert_eq!(LogConfig::from_flags(false, false).level, LevelFilter::WARN);
    }

    #[test]
    fn debug_setting_applies_only_without_flags() {
        assert_eq!(LogConfig::for_cli(false, false, true).level, LevelFilter::DEBUG);
        assert_eq!(LogConfig::for_cli(false, true, true).level, LevelFilter::OFF);
        assert_eq!(LogConfig::for_cli(true, false, false).level, LevelFilter::DEBUG);
        assert_eq!(LogConfig::for_cli(false, false, false).level, LevelFilter::WARN);
    }

    #[test]
    fn debug_flag_selects_server_level() {
        assert_eq!(LogConfig::from_debug(true).level, LevelFilter::DEBUG);
        assert_eq!(LogConfig::from_debug(false).level, LevelFilter::INFO);
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(20 * 1024 * 1024), "20.0 MB");
    }
}
