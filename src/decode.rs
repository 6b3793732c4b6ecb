//! The decode capability.
//!
//! The sampler, the probe, and the preview never talk to FFmpeg directly.
//! They open a [`DecodeSource`] through a [`MediaOpener`], and the source is
//! released when it is dropped. [`FfmpegOpener`](crate::FfmpegOpener) is the
//! production implementation; tests substitute scripted sources.

use std::path::Path;

use image::DynamicImage;

use crate::error::FrameError;

/// A decoded frame together with the position it was decoded at.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Presentation position of the frame, in milliseconds from the start of
    /// the media.
    pub position_ms: u64,
    /// The frame pixels.
    pub image: DynamicImage,
}

/// An open, seekable handle to a video.
///
/// Dropping the source releases every resource it holds. Callers rely on
/// this for scoped acquisition: a source never outlives the operation that
/// opened it.
pub trait DecodeSource {
    /// Frames per second reported by the container. Zero when unknown.
    fn frame_rate(&self) -> f64;

    /// Total number of frames reported by the container. Zero when unknown.
    fn frame_count(&self) -> u64;

    /// Position the cursor so that the next decoded frame is the first one
    /// at or after `position_ms`.
    fn seek(&mut self, position_ms: u64) -> Result<(), FrameError>;

    /// Decode the next frame.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FrameError>;
}

/// Opens [`DecodeSource`]s by path.
pub trait MediaOpener {
    /// The source type this opener produces.
    type Source: DecodeSource;

    /// Open the video at `path`.
    fn open(&self, path: &Path) -> Result<Self::Source, FrameError>;
}

impl<O: MediaOpener + ?Sized> MediaOpener for &O {
    type Source = O::Source;

    fn open(&self, path: &Path) -> Result<Self::Source, FrameError> {
        (**self).open(path)
    }
}
