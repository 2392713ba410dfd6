use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;

use crate::cli::Args;
use crate::config;
use crate::library::{Catalog, scan};

/// Command line flags win over config file and environment.
pub fn apply_cli_overrides(settings: &mut config::Settings, args: &Args) {
    if let Some(mode) = args.mode {
        settings.visualizer.mode = mode;
    }
}

/// Directory to scan: `--directory`, else the working directory.
pub fn library_dir(args: &Args) -> PathBuf {
    args.directory
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Scan `dir` once; the result is shared read-only for the process lifetime.
pub fn load_catalog(dir: &Path, settings: &config::Settings) -> anyhow::Result<Arc<Catalog>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    Ok(Arc::new(scan(dir, &settings.library)))
}
