//! Logging setup for processes embedding the generator.
//!
//! The generator core only emits `tracing` events; installing a subscriber is
//! left to the host process, which calls [`init_tracing`] once at startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Build a filter spec from a plain level or a full directive list.
///
/// A plain level (`"debug"`) is scoped to `crate_root`; anything else is
/// treated as a complete `tracing` filter spec (`"hookgen_core=trace,warn"`).
pub fn filter_spec(crate_root: &str, level_or_spec: Option<&str>) -> String {
    match level_or_spec {
        Some(level) if is_plain_level(level) => {
            format!("{crate_root}={}", level.to_ascii_lowercase())
        }
        Some(spec) => spec.to_string(),
        None => format!("{crate_root}=info"),
    }
}

/// Install a stderr fmt subscriber with the given filter spec.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init_tracing(filter: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_level_is_scoped() {
        assert_eq!(filter_spec("hookgen_core", Some("DEBUG")), "hookgen_core=debug");
        assert_eq!(filter_spec("hookgen_core", None), "hookgen_core=info");
    }

    #[test]
    fn test_full_spec_passes_through() {
        assert_eq!(
            filter_spec("hookgen_core", Some("hookgen_core=trace,warn")),
            "hookgen_core=trace,warn"
        );
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing("hookgen_common=debug");
        init_tracing("hookgen_common=debug");
    }
}
