//! Duration probing.
//!
//! The probe opens a video, reads what the container reports about it, and
//! releases the handle before doing anything with the numbers. Nothing is
//! kept open between calls.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{FfmpegOpener, format_milliseconds, probe_duration};
//!
//! let duration_ms = probe_duration(&FfmpegOpener, "input.mp4")?;
//! println!("Video duration: {}", format_milliseconds(duration_ms));
//! # Ok::<(), framepick::FrameError>(())
//! ```

use std::path::Path;

use crate::{
    decode::{DecodeSource, MediaOpener},
    error::FrameError,
    ffmpeg::FfmpegOpener,
};

/// What a probe learned about a video.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct MediaSummary {
    /// Frames per second reported by the container.
    pub frames_per_second: f64,
    /// Total frames reported by the container.
    pub frame_count: u64,
    /// `round(frame_count / frames_per_second * 1000)`.
    pub duration_ms: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

/// Duration in milliseconds from a frame count and frame rate.
///
/// Returns `None` when the frame rate is zero, negative, or not finite.
pub fn duration_from_frames(frame_count: u64, frames_per_second: f64) -> Option<u64> {
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return None;
    }
    Some((frame_count as f64 / frames_per_second * 1_000.0).round() as u64)
}

/// Probe the total playable duration of a video, in milliseconds.
///
/// # Errors
///
/// Returns [`FrameError::UnreadableMedia`] when the file cannot be opened
/// or reports no usable frame rate. The decode handle is released before
/// this function returns on every path.
pub fn probe_duration<O, P>(opener: &O, path: P) -> Result<u64, FrameError>
where
    O: MediaOpener + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let (frames_per_second, frame_count) = {
        let source = open_for_probe(opener, path)?;
        (source.frame_rate(), source.frame_count())
    };

    let duration_ms = duration_from_frames(frame_count, frames_per_second).ok_or_else(|| {
        FrameError::UnreadableMedia {
            path: path.to_path_buf(),
            reason: "Unable to get FPS information".to_string(),
        }
    })?;

    log::debug!(
        "Probed {}: {frame_count} frames @ {frames_per_second:.3} fps = {duration_ms} ms",
        path.display()
    );
    Ok(duration_ms)
}

/// Probe a video through FFmpeg and report its stream details.
///
/// # Errors
///
/// Same as [`probe_duration`].
pub fn probe_media<P: AsRef<Path>>(path: P) -> Result<MediaSummary, FrameError> {
    let path = path.as_ref();
    let source = open_for_probe(&FfmpegOpener, path)?;
    let frames_per_second = source.frame_rate();
    let frame_count = source.frame_count();
    let width = source.width();
    let height = source.height();
    let codec = source.codec().to_string();
    drop(source);

    let duration_ms = duration_from_frames(frame_count, frames_per_second).ok_or_else(|| {
        FrameError::UnreadableMedia {
            path: path.to_path_buf(),
            reason: "Unable to get FPS information".to_string(),
        }
    })?;

    Ok(MediaSummary {
        frames_per_second,
        frame_count,
        duration_ms,
        width,
        height,
        codec,
    })
}

fn open_for_probe<O>(opener: &O, path: &Path) -> Result<O::Source, FrameError>
where
    O: MediaOpener + ?Sized,
{
    opener.open(path).map_err(|error| match error {
        FrameError::UnreadableMedia { .. } => error,
        other => FrameError::UnreadableMedia {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
