mod cli;
mod error;
mod logging;
mod pairing;
mod pipeline;
mod video;

use anyhow::Result;
use cli::Args;
use pipeline::classifier::DetectionClassifier;
use pipeline::detection::ObjectDetector;
use pipeline::walker;

/// Object class a pair must contain to be copied.
const TARGET_CLASS: &str = "person";
/// Minimum bounding-box width or height, in source-frame pixels.
const SIZE_THRESHOLD: f32 = 300.0;

fn main() {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    let log_config = match args.log_config.as_deref() {
        Some(path) => match logging::load_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("dashsift: {:#}", err);
                return;
            }
        },
        None => logging::LogConfig::default(),
    };

    if let Err(err) = logging::init(&log_config) {
        eprintln!("dashsift: {:#}", err);
        return;
    }

    // Every fatal condition lands here: log once and stop.
    if let Err(err) = run(&args) {
        tracing::error!("{:#}", err);
    }
}

fn run(args: &Args) -> Result<()> {
    tracing::info!("Loading detection model {}", args.model);
    let detector = ObjectDetector::new(&args.model)?;
    let mut classifier = DetectionClassifier::new(detector, TARGET_CLASS, SIZE_THRESHOLD);

    walker::process_tree(&args.source_video_dir, &args.dest_dir, &mut classifier)
}
