use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zrle-replay")]
#[command(about = "Replay a captured ZRLE byte stream into a PNG")]
#[command(version)]
pub struct Args {
    /// Capture file: 12-byte rectangle headers, each followed by its ZRLE body
    pub capture: PathBuf,

    /// Framebuffer width in pixels
    #[arg(long)]
    pub width: u16,

    /// Framebuffer height in pixels
    #[arg(long)]
    pub height: u16,

    /// Bytes delivered per simulated socket read (overrides the config file)
    #[arg(long, value_name = "BYTES")]
    pub fragment_size: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the decoded framebuffer
    #[arg(short, long, default_value = "replay.png")]
    pub output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
