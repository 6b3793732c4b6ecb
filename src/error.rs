//! Error types for the `framepick` crate.
//!
//! This module defines [`FrameError`], the unified error type returned by all
//! fallible operations in the crate. Variants carry the paths, timestamps,
//! and upstream messages needed to explain the failure to a user.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framepick` operations.
///
/// Every public function that can fail returns `Result<T, FrameError>`.
/// The first four variants are the user-facing validation failures; the
/// rest wrap problems coming from FFmpeg, the filesystem, or image encoding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// A time string was not in `hh:mm:ss` form.
    #[error("Invalid time format {input:?}: {reason}. Please use hh:mm:ss format.")]
    Format {
        /// The text that failed to parse.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The media reported no usable frame rate, or could not be opened.
    #[error("Invalid video file {path}: {reason}")]
    UnreadableMedia {
        /// Path passed to the probe.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The requested window lies (partly) outside the video.
    #[error(
        "Start or end time exceeds video length! (start {start_ms} ms, end {end_ms} ms, video {duration_ms} ms)"
    )]
    RangeExceeded {
        /// Requested start in milliseconds.
        start_ms: u64,
        /// Requested end in milliseconds.
        end_ms: u64,
        /// Probed duration in milliseconds.
        duration_ms: u64,
    },

    /// The window is too short to hold a single frame at one-second spacing.
    #[error("No frames can be extracted between {start_ms} ms and {end_ms} ms")]
    EmptyRange {
        /// Requested start in milliseconds.
        start_ms: u64,
        /// Requested end in milliseconds.
        end_ms: u64,
    },

    /// The media file could not be opened by FFmpeg.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::FfmpegOpener`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A decoded frame could not be turned into an image.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The output folder must exist before extraction starts.
    #[error("Output folder does not exist: {}", .0.display())]
    OutputDirectoryMissing(PathBuf),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for FrameError {
    fn from(error: FfmpegError) -> Self {
        FrameError::FfmpegError(error.to_string())
    }
}

impl FrameError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        FrameError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
