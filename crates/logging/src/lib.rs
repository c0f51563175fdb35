#![warn(missing_docs)]

//! Shared logging setup and CLI log flags for the altq workspace.
//!
//! Binaries flatten [`LogArgs`] into their CLI, then call [`init`] once at
//! startup. Filters are crate-scoped so dependency noise stays quiet unless
//! asked for with `--log-filter` or `RUST_LOG`.

use std::env;

use clap::Args;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "altq_engine=trace,altq_server=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter spec for these flags. See [`compute_spec`].
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &[
        "altq",
        "altq_engine",
        "altq_store",
        "altq_server",
        "altq_overlay",
        "altq_protocol",
        "altq_layout",
        "logging",
    ]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{t}={lvl}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    env::var("RUST_LOG").unwrap_or_else(|_| level_spec_for("info"))
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Install the global subscriber: env filter plus compact output without
/// timestamps. Later calls are no-ops.
pub fn init(args: &LogArgs) {
    let spec = args.spec();
    let installed = tracing_subscriber::registry()
        .with(env_filter_from_spec(&spec))
        .with(fmt::layer().without_time())
        .try_init()
        .is_ok();
    if installed {
        debug!(%spec, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let spec = compute_spec(false, false, Some("warn"), Some("altq_engine=trace"));
        assert_eq!(spec, "altq_engine=trace");
    }

    #[test]
    fn flags_are_crate_scoped() {
        let spec = compute_spec(true, false, None, None);
        for krate in our_crates() {
            assert!(spec.contains(&format!("{krate}=trace")), "{spec}");
        }
        assert_eq!(compute_spec(false, true, None, None), level_spec_for("debug"));
        assert_eq!(compute_spec(false, false, Some("WARN"), None), level_spec_for("warn"));
    }

    #[test]
    fn args_delegate_to_compute_spec() {
        let args = LogArgs {
            log_filter: Some("altq=debug".into()),
            ..LogArgs::default()
        };
        assert_eq!(args.spec(), "altq=debug");
    }

    #[test]
    fn specs_parse_as_filters() {
        let spec = level_spec_for("info");
        let filter = env_filter_from_spec(&spec);
        assert!(filter.to_string().contains("altq_engine=info"));
    }
}
