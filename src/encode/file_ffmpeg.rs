//! FFmpeg-backed video sink.
//!
//! Encodes RGB24 frames to H.264 in whatever container the destination
//! extension selects. Frames are converted to YUV420P, stamped with
//! monotonically increasing presentation timestamps at the configured rate,
//! and written interleaved. `finish` flushes the encoder and writes the
//! container trailer.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::SinkConfig;
use crate::frame::{Frame, BYTES_PER_PIXEL};

pub(crate) struct FfmpegVideoSink {
    config: SinkConfig,
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::codec::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    frames_written: u64,
}

impl FfmpegVideoSink {
    pub(crate) fn open(config: SinkConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let mut output = ffmpeg::format::output(&config.path)
            .with_context(|| format!("failed to open video output '{}'", config.path))?;
        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::H264)
            .ok_or_else(|| anyhow!("H.264 encoder not available in this ffmpeg build"))?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::flag::Flags::GLOBAL_HEADER);

        let mut stream = output.add_stream(codec).context("add video stream")?;
        let stream_index = stream.index();

        // 1/fps with millisecond precision so fractional rates survive.
        let encoder_time_base =
            ffmpeg::Rational::new(1000, (config.fps * 1000.0).round() as i32);

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .context("create H.264 encoder")?;
        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(ffmpeg::util::format::pixel::Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(encoder_time_base.invert()));
        if global_header {
            encoder.set_flags(ffmpeg::codec::flag::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg::Dictionary::new();
        options.set("preset", "medium");
        let encoder = encoder
            .open_with(options)
            .context("open H.264 encoder")?;
        stream.set_parameters(&encoder);

        output.write_header().context("write container header")?;
        // The muxer may rewrite the stream time base during write_header.
        let stream_time_base = output
            .stream(stream_index)
            .ok_or_else(|| anyhow!("output stream disappeared"))?
            .time_base();

        let scaler = ffmpeg::software::scaling::context::Context::get(
            ffmpeg::util::format::pixel::Pixel::RGB24,
            config.width,
            config.height,
            ffmpeg::util::format::pixel::Pixel::YUV420P,
            config.width,
            config.height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "VideoSink: {} ({}x{} @ {:.2} fps, h264)",
            config.path,
            config.width,
            config.height,
            config.fps
        );

        Ok(Self {
            config,
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base,
            stream_time_base,
            frames_written: 0,
        })
    }

    pub(crate) fn write(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.config.width || frame.height() != self.config.height {
            return Err(anyhow!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width(),
                frame.height(),
                self.config.width,
                self.config.height
            ));
        }

        let rgb = rgb_to_video_frame(frame)?;
        let mut yuv = ffmpeg::frame::Video::empty();
        self.scaler
            .run(&rgb, &mut yuv)
            .context("convert frame to YUV420P")?;
        yuv.set_pts(Some(self.frames_written as i64));

        self.encoder
            .send_frame(&yuv)
            .context("send frame to H.264 encoder")?;
        self.drain_packets()?;

        self.frames_written += 1;
        Ok(())
    }

    pub(crate) fn finish(&mut self) -> Result<u64> {
        self.encoder.send_eof().context("flush H.264 encoder")?;
        self.drain_packets()?;
        self.output.write_trailer().context("write container trailer")?;
        Ok(self.frames_written)
    }

    pub(crate) fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn drain_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .context("write packet to container")?;
        }
        Ok(())
    }
}

/// Copy a packed RGB24 frame into an FFmpeg video frame, honoring the
/// destination stride.
fn rgb_to_video_frame(frame: &Frame) -> Result<ffmpeg::frame::Video> {
    let width = frame.width();
    let height = frame.height();
    let mut video = ffmpeg::frame::Video::new(
        ffmpeg::util::format::pixel::Pixel::RGB24,
        width,
        height,
    );
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let stride = video.stride(0);
    let data = video.data_mut(0);
    let pixels = frame.pixels();
    for row in 0..height as usize {
        let src = &pixels[row * row_bytes..(row + 1) * row_bytes];
        data[row * stride..row * stride + row_bytes].copy_from_slice(src);
    }
    Ok(video)
}
