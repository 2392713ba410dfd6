use std::path::PathBuf;

use clap::Parser;

use crate::playback::VisualizerMode;

/// cadenza - terminal music player with a live visualizer
#[derive(Parser, Debug)]
#[command(name = "cadenza", version, about)]
pub struct Args {
    /// Music directory to scan (defaults to the current directory)
    #[arg(long, short = 'd')]
    pub directory: Option<PathBuf>,

    /// Visualizer mode to start with (overrides the config file)
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<VisualizerMode>,

    /// Log file (default: $XDG_STATE_HOME/cadenza/cadenza.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
