//! File logging for the terminal binary.
//!
//! The terminal belongs to the renderer, so log records go to a rotating
//! file instead of stderr.

use std::path::Path;

use flexi_logger::{detailed_format, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};

/// Spec used when neither `--log-level` nor `RUST_LOG` is given.
pub const DEFAULT_LOG_SPEC: &str = "info";

/// Start logging into `log_dir`.
///
/// `level` overrides `RUST_LOG`. Keep the returned handle alive for the
/// lifetime of the program.
pub fn setup_logging(log_dir: &Path, level: Option<&str>) -> anyhow::Result<LoggerHandle> {
    let logger = match level {
        Some(spec) => Logger::try_with_str(spec)?,
        None => Logger::try_with_env_or_str(DEFAULT_LOG_SPEC)?,
    };

    let handle = logger
        .log_to_file(FileSpec::default().directory(log_dir).basename("math-tiles"))
        .format(detailed_format)
        .rotate(
            Criterion::Size(4 * 1024 * 1024),
            Naming::Numbers,
            Cleanup::KeepLogFiles(3),
        )
        .start()?;
    Ok(handle)
}
