//! Diagnostics go to stderr so stdout stays reserved for the resolved name.
use std::io::Write;

/// Log target that is rendered as `FATAL` instead of `ERROR`.
pub const FATAL: &str = "fatal";

const PROGRAM: &str = "cgroup-name";

/// Installs the global logger.
///
/// The filter defaults to `info` and can be changed through `RUST_LOG`. Lines look like
/// `2025-01-01T00:00:00Z : cgroup-name : WARNING : message`.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "{} : {} : {} : {}",
                timestamp,
                PROGRAM,
                level_label(record.level(), record.target()),
                record.args()
            )
        })
        .init();
}

fn level_label(level: log::Level, target: &str) -> &'static str {
    match level {
        log::Level::Error if target == FATAL => "FATAL",
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARNING",
        log::Level::Info => "INFO",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}
