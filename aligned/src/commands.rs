use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aligned", version, about = "Synchronised time-series and video annotation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a session in the desktop viewer
    View {
        session: PathBuf,
        /// Viewer settings (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of time-series views sharing the playhead
        #[arg(long, default_value_t = 1)]
        views: usize,
    },
    /// Print what one frame would show, without opening a window
    Inspect {
        session: PathBuf,
        /// Playhead time in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,
        /// Window width in seconds (defaults to the configured window)
        #[arg(long)]
        window: Option<f64>,
        /// Canvas width in pixels
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, alias = "jq")]
        json_query: bool,
    },
    /// Build a session from raw little-endian f64 files
    Import {
        #[arg(long)]
        times: PathBuf,
        #[arg(long)]
        values: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        /// Channel name, repeat once per channel
        #[arg(long = "channel")]
        channels: Vec<String>,
        #[arg(long)]
        video: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Manage viewer settings
    Config {
        /// Write the default settings to this path
        #[arg(long)]
        write: PathBuf,
    },
}
