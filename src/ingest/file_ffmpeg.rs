//! FFmpeg-backed frame source.
//!
//! Demuxes and decodes a local video file, converting each frame to packed
//! RGB24. The decoder is flushed at end of stream so trailing buffered frames
//! are not dropped.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::{SourceConfig, SourceStats};
use crate::frame::{Frame, BYTES_PER_PIXEL};

pub(crate) struct FfmpegFrameSource {
    config: SourceConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    time_base: ffmpeg::Rational,
    frame_rate: f64,
    frame_count: Option<u64>,
    frames_read: u64,
    eof_sent: bool,
}

impl FfmpegFrameSource {
    pub(crate) fn open(config: SourceConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open video input '{}'", config.path))?;
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("'{}' has no video track", config.path))?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let rate = stream.avg_frame_rate();
        let frame_rate = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        // nb_frames is container metadata and may be absent (0).
        let frame_count = match stream.frames() {
            n if n > 0 => Some(n as u64),
            _ => None,
        };

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "FrameSource: {} ({}x{} @ {:.2} fps, {} frames)",
            config.path,
            decoder.width(),
            decoder.height(),
            frame_rate,
            frame_count.map_or_else(|| "?".to_string(), |n| n.to_string()),
        );

        Ok(Self {
            config,
            input,
            stream_index,
            decoder,
            scaler,
            time_base,
            frame_rate,
            frame_count,
            frames_read: 0,
            eof_sent: false,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            // Drain buffered output before feeding the decoder more packets.
            let mut decoded = ffmpeg::frame::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(Some(self.convert(&decoded)?));
            }
            if self.eof_sent {
                return Ok(None);
            }
            match self.read_video_packet()? {
                Some(packet) => self
                    .decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?,
                None => {
                    self.decoder
                        .send_eof()
                        .context("flush ffmpeg decoder at end of stream")?;
                    self.eof_sent = true;
                }
            }
        }
    }

    pub(crate) fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    pub(crate) fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_read: self.frames_read,
            path: self.config.path.clone(),
        }
    }

    fn read_video_packet(&mut self) -> Result<Option<ffmpeg::Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        return Ok(Some(packet));
                    }
                }
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => return Err(e).context("read packet from container"),
            }
        }
    }

    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<Frame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;

        let index = self.frames_read;
        self.frames_read += 1;

        let timestamp_ms = decoded
            .pts()
            .map(|pts| {
                pts * 1000 * self.time_base.numerator() as i64
                    / self.time_base.denominator() as i64
            })
            .unwrap_or_else(|| {
                if self.frame_rate > 0.0 {
                    (index as f64 * 1000.0 / self.frame_rate) as i64
                } else {
                    0
                }
            });

        Frame::new(pixels, width, height, index, timestamp_ms)
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
