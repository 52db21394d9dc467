use super::FrameSource;
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::path::Path;

use ffmpeg_next::ffi;

/// Frame source backed by FFmpeg via ffmpeg-next. Decodes the best
/// video stream front to back; no seeking, no sampling. All contexts
/// are released when the value is dropped.
pub struct FfmpegReader {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::codec::decoder::Video,
    video_stream_index: usize,
    /// Lazily created on first frame (source format is only known then).
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    /// Persistent packet object to avoid allocations.
    reuse_packet: ffmpeg_next::codec::packet::Packet,
    /// Whether we've sent EOF to the decoder.
    eof_sent: bool,
}

impl FfmpegReader {
    pub fn new(path: &Path) -> Result<Self> {
        ffmpeg_next::init().context("failed to initialize FFmpeg")?;

        let input_ctx = ffmpeg_next::format::input(&path)
            .with_context(|| format!("failed to open video file {}", path.display()))?;

        let video_stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| anyhow!("no video stream found in {}", path.display()))?;

        let video_stream_index = video_stream.index();

        let decoder_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())
                .context("failed to create decoder context")?;

        let decoder = decoder_ctx
            .decoder()
            .video()
            .context("failed to open video decoder")?;

        let width = decoder.width();
        let height = decoder.height();

        tracing::debug!(
            "FfmpegReader: opened {} ({}x{})",
            path.display(),
            width,
            height
        );

        Ok(Self {
            input_ctx,
            decoder,
            video_stream_index,
            scaler: None, // created lazily on first frame
            width,
            height,
            reuse_packet: ffmpeg_next::codec::packet::Packet::empty(),
            eof_sent: false,
        })
    }

    /// Core receive/feed loop. `Ok(false)` means the stream is exhausted
    /// and the decoder has been fully drained.
    fn decode_loop(&mut self, target_frame: &mut ffmpeg_next::util::frame::Video) -> Result<bool> {
        loop {
            // 1. Try to receive a decoded frame
            match self.decoder.receive_frame(target_frame) {
                Ok(()) => return Ok(true),
                Err(ffmpeg_next::Error::Other { errno: ffi::EAGAIN }) => {
                    if self.eof_sent {
                        return Ok(false);
                    }
                    // Continue to feeding packets
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(false),
                Err(e) => return Err(anyhow!("decoder error: {}", e)),
            }

            // 2. Feed packets until we find a video packet OR reach EOF
            let mut found_packet = false;
            while self.reuse_packet.read(&mut self.input_ctx).is_ok() {
                if self.reuse_packet.stream() == self.video_stream_index {
                    self.decoder
                        .send_packet(&self.reuse_packet)
                        .context("failed to send packet to decoder")?;
                    found_packet = true;
                    break;
                }
            }

            if !found_packet {
                // EOF reached in input file — notify decoder to flush
                self.decoder
                    .send_eof()
                    .context("failed to send EOF to decoder")?;
                self.eof_sent = true;
                // Loop back to drain the remaining frames
            }
        }
    }

    fn get_or_create_scaler(
        &mut self,
        src_format: ffmpeg_next::format::Pixel,
    ) -> Result<&mut ffmpeg_next::software::scaling::Context> {
        if self.scaler.is_none() {
            let scaler = ffmpeg_next::software::scaling::Context::get(
                src_format,
                self.width,
                self.height,
                ffmpeg_next::format::Pixel::RGB24,
                self.width,
                self.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .context("failed to create scaler")?;
            self.scaler = Some(scaler);
        }
        Ok(self.scaler.as_mut().unwrap())
    }
}

/// Copy an RGB24 frame into an owned image, honoring row padding.
fn rgb_frame_to_image(frame: &ffmpeg_next::util::frame::Video) -> Result<DynamicImage> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let data = frame.data(0);
    let stride = frame.stride(0);
    let row_len = width * 3;

    let mut buffer = Vec::with_capacity(row_len * height);
    for y in 0..height {
        let src_offset = y * stride;
        buffer.extend_from_slice(&data[src_offset..src_offset + row_len]);
    }

    let img_buffer = ImageBuffer::<Rgb<u8>, _>::from_vec(width as u32, height as u32, buffer)
        .ok_or_else(|| anyhow!("frame buffer does not match frame dimensions"))?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

impl FrameSource for FfmpegReader {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        let mut raw_frame = ffmpeg_next::util::frame::Video::empty();
        if !self.decode_loop(&mut raw_frame)? {
            return Ok(None);
        }

        let scaler = self.get_or_create_scaler(raw_frame.format())?;
        let mut rgb_frame = ffmpeg_next::util::frame::Video::empty();
        scaler
            .run(&raw_frame, &mut rgb_frame)
            .context("scaler failed")?;

        Ok(Some(rgb_frame_to_image(&rgb_frame)?))
    }
}
