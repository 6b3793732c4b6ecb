//! FFmpeg-backed decode capability.
//!
//! [`FfmpegOpener`] opens files with `ffmpeg-next` and yields
//! [`FfmpegSource`]s that decode the best video stream into RGB frames.
//! [`set_ffmpeg_log_level`] tunes FFmpeg's own stderr chatter, which is
//! separate from the Rust-side [`log`](https://crates.io/crates/log) output.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framepick::{DecodeSource, FfmpegLogLevel, FfmpegOpener, MediaOpener};
//!
//! framepick::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//!
//! let mut source = FfmpegOpener.open(Path::new("input.mp4"))?;
//! source.seek(10_000)?;
//! if let Some(frame) = source.next_frame()? {
//!     frame.image.save("at_10s.jpg")?;
//! }
//! # Ok::<(), framepick::FrameError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::{DynamicImage, RgbImage};

use crate::{
    decode::{DecodeSource, DecodedFrame, MediaOpener},
    error::FrameError,
    utilities,
};

/// FFmpeg internal log verbosity.
///
/// Setting a level suppresses every FFmpeg message below that severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's internal log level.
///
/// This does **not** affect the `log` crate output of this library.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into());
}

/// Opens media files through FFmpeg.
///
/// Initialises FFmpeg on every open (the call is idempotent).
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl MediaOpener for FfmpegOpener {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource, FrameError> {
        FfmpegSource::open(path)
    }
}

/// An open FFmpeg demuxer plus a video decoder for its best video stream.
///
/// Frames are converted to RGB24 at the source resolution. Dropping the
/// source closes the demuxer and frees the decoder.
pub struct FfmpegSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    frames_per_second: f64,
    frame_count: u64,
    width: u32,
    height: u32,
    codec: String,
    /// Frames before this position are decoded but not returned.
    seek_target_ms: u64,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
    file_path: PathBuf,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("file_path", &self.file_path)
            .field("video_stream_index", &self.video_stream_index)
            .field("frames_per_second", &self.frames_per_second)
            .field("frame_count", &self.frame_count)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// - [`FrameError::FileOpen`] if FFmpeg cannot open the file or build a
    ///   decoder for it.
    /// - [`FrameError::NoVideoStream`] if the file has no video.
    pub fn open(path: &Path) -> Result<Self, FrameError> {
        let file_path = path.to_path_buf();
        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FrameError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FrameError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let (video_stream_index, time_base, frames_per_second, reported_frames, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FrameError::NoVideoStream)?;

            let mut frames_per_second =
                utilities::rational_to_frames_per_second(stream.avg_frame_rate());
            if frames_per_second == 0.0 {
                frames_per_second = utilities::rational_to_frames_per_second(stream.rate());
            }

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| FrameError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                })?;
            let decoder =
                decoder_context
                    .decoder()
                    .video()
                    .map_err(|error| FrameError::FileOpen {
                        path: file_path.clone(),
                        reason: format!("Failed to create video decoder: {error}"),
                    })?;

            (
                stream.index(),
                stream.time_base(),
                frames_per_second,
                stream.frames(),
                decoder,
            )
        };

        // Containers that do not store a frame count get an estimate from
        // the container duration.
        let frame_count = if reported_frames > 0 {
            reported_frames as u64
        } else if input_context.duration() > 0 {
            // Container duration is in AV_TIME_BASE (microseconds).
            let seconds = input_context.duration() as f64 / 1_000_000.0;
            (seconds * frames_per_second) as u64
        } else {
            0
        };

        let width = decoder.width();
        let height = decoder.height();
        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Video stream {video_stream_index}: {codec} {width}x{height} @ {frames_per_second:.3} fps, {frame_count} frames"
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            frames_per_second,
            frame_count,
            width,
            height,
            codec,
            seek_target_ms: 0,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
            file_path,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Codec name (e.g. `"h264"`).
    pub fn codec(&self) -> &str {
        &self.codec
    }

    fn convert_current_frame(&mut self) -> Result<DynamicImage, FrameError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        let buffer = utilities::frame_to_rgb_buffer(&self.rgb_frame, self.width, self.height);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            FrameError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl DecodeSource for FfmpegSource {
    fn frame_rate(&self) -> f64 {
        self.frames_per_second
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), FrameError> {
        let timestamp = utilities::milliseconds_to_seek_timestamp(position_ms);
        log::debug!("Seeking {} to {position_ms} ms", self.file_path.display());

        // Lands on the keyframe at or before the target; `next_frame`
        // decodes forward from there.
        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.seek_target_ms = position_ms;
        self.eof_sent = false;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FrameError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let pts = self
                    .decoded_frame
                    .timestamp()
                    .or_else(|| self.decoded_frame.pts())
                    .unwrap_or(0);
                let position_ms = utilities::pts_to_milliseconds(pts, self.time_base);
                if position_ms < self.seek_target_ms {
                    continue;
                }

                let image = self.convert_current_frame()?;
                return Ok(Some(DecodedFrame { position_ms, image }));
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}
