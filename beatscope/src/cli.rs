use std::path::PathBuf;

use clap::Parser;

/// Terminal beat sequencer and audio-reactive visualizer.
#[derive(Parser, Debug)]
#[command(name = "beatscope", version, about)]
pub struct Args {
    /// Project directory; drum samples are read from here and state is kept in .beatscope/
    #[arg(value_name = "PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Seed for the auto composer and the visualizer
    #[arg(long)]
    pub seed: Option<u64>,

    /// Visualizer frame cap (0 disables it)
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Log file (default: PROJECT_DIR/.beatscope/beatscope.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
