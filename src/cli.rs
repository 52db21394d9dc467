use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory tree to scan for rear-camera recordings
    pub source_video_dir: PathBuf,

    /// Directory that receives matched pairs
    pub dest_dir: PathBuf,

    /// Path to the detection model weights
    #[arg(long, env = "DASHSIFT_MODEL", default_value = "rtdetr-l.onnx")]
    pub model: String,

    /// JSON file with logging settings
    #[arg(long, env = "DASHSIFT_LOG_CONFIG")]
    pub log_config: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
