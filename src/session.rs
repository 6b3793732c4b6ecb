//! One user request, end to end.
//!
//! An [`ExtractionSession`] carries everything a single "extract frames"
//! action needs: the video, the window, the output folder, and the frame
//! budget. Running it probes the video, validates the window, and samples
//! frames with a freshly opened decoder. Nothing is shared between runs.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{ExtractOptions, ExtractionSession, FfmpegOpener};
//!
//! let session = ExtractionSession::from_input("input.mp4", "0:1:53", "0:2:23", "frames", 10)?;
//! let result = session.run(&FfmpegOpener, &ExtractOptions::new())?;
//! println!("Frames extracted successfully! Total frames: {}", result.frames_written);
//! # Ok::<(), framepick::FrameError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    config::ExtractOptions,
    decode::MediaOpener,
    error::FrameError,
    probe::probe_duration,
    sampler::{ExtractionResult, SamplingPlan, SamplingRequest, TimeRange, extract_frames},
    timecode::parse_time,
};

/// A single extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSession {
    video_path: PathBuf,
    request: SamplingRequest,
    output_folder: PathBuf,
}

impl ExtractionSession {
    /// Build a session from already-parsed values.
    pub fn new(
        video_path: impl Into<PathBuf>,
        range: TimeRange,
        output_folder: impl Into<PathBuf>,
        requested_count: u64,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            request: SamplingRequest::new(range, requested_count),
            output_folder: output_folder.into(),
        }
    }

    /// Build a session from user-typed values.
    ///
    /// # Errors
    ///
    /// [`FrameError::Format`] if either time is not `hh:mm:ss`.
    pub fn from_input(
        video_path: impl Into<PathBuf>,
        start_time: &str,
        end_time: &str,
        output_folder: impl Into<PathBuf>,
        requested_count: u64,
    ) -> Result<Self, FrameError> {
        let start_ms = parse_time(start_time)?;
        let end_ms = parse_time(end_time)?;
        Ok(Self::new(
            video_path,
            TimeRange::new(start_ms, end_ms),
            output_folder,
            requested_count,
        ))
    }

    /// The video to sample.
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Where frames are written.
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// The window and frame budget.
    pub fn request(&self) -> &SamplingRequest {
        &self.request
    }

    /// Check the output folder, probe the video, validate the window, and
    /// extract frames.
    ///
    /// The probe and the extraction each open and release their own decode
    /// source. The extraction source is only opened once every check has
    /// passed.
    ///
    /// # Errors
    ///
    /// - [`FrameError::OutputDirectoryMissing`] before the video is touched.
    /// - [`FrameError::UnreadableMedia`] from the probe.
    /// - [`FrameError::RangeExceeded`], [`FrameError::EmptyRange`] after the
    ///   probe, before the extraction source is opened.
    /// - Anything [`extract_frames`] returns.
    pub fn run<O>(&self, opener: &O, options: &ExtractOptions) -> Result<ExtractionResult, FrameError>
    where
        O: MediaOpener + ?Sized,
    {
        if !self.output_folder.is_dir() {
            return Err(FrameError::OutputDirectoryMissing(
                self.output_folder.clone(),
            ));
        }

        let duration_ms = probe_duration(opener, &self.video_path)?;
        self.request.range.ensure_within(duration_ms)?;
        SamplingPlan::new(&self.request)?;

        let mut source = opener.open(&self.video_path)?;
        let result = extract_frames(
            &mut source,
            &self.request,
            duration_ms,
            &self.output_folder,
            options,
        )?;

        log::info!(
            "Extracted {} frame(s) from {} into {}",
            result.frames_written,
            self.video_path.display(),
            self.output_folder.display(),
        );
        Ok(result)
    }
}
