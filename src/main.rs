mod audio;
mod cli;
mod config;
mod library;
mod logging;
mod playback;
mod runtime;
mod ui;
mod visualizer;

fn main() -> anyhow::Result<()> {
    runtime::run()
}
