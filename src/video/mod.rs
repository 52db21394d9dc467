pub mod ffmpeg_reader;

use anyhow::Result;
use image::DynamicImage;

/// A lazy, forward-only stream of decoded frames from one video file.
///
/// Implementations hold the decoding handle for as long as the value
/// lives and release it on drop, so abandoning the stream early (after
/// a positive classification, say) frees the file immediately.
pub trait FrameSource {
    /// Decode and return the next frame, or `None` once the stream is
    /// exhausted.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}
