//! File logging. The terminal belongs to the TUI, so log output goes to a file.

use std::path::Path;

use anyhow::{Context, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to `log_path`.
///
/// Returns `None` when no path is available, in which case nothing is
/// logged. The returned guard must be kept alive until exit so buffered lines
/// are flushed.
pub fn init(log_path: Option<&Path>, verbose: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let Some(path) = log_path else {
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path {path:?} has no file name"))?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating log directory {dir:?}"))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("cannot install log subscriber: {e}"))?;

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_means_no_logging() {
        assert!(init(None, false).unwrap().is_none());
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let err = init(Some(Path::new("/")), true).unwrap_err();
        assert!(err.to_string().contains("no file name"));
    }
}
