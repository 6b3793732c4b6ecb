//! Evenly-spaced frame sampling.
//!
//! Given a time window and a frame budget, [`SamplingPlan`] works out how many
//! frames can actually be taken (one per whole second of window at most) and
//! how far apart they are. [`extract_frames`] then decodes forward from the
//! window start, keeps the frames the [`FrameGate`] admits, and writes them
//! as `frame_0.jpg`, `frame_1.jpg`, … in the output folder.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framepick::{
//!     ExtractOptions, FfmpegOpener, MediaOpener, SamplingRequest, TimeRange, extract_frames,
//!     probe_duration,
//! };
//!
//! let video = Path::new("input.mp4");
//! let duration_ms = probe_duration(&FfmpegOpener, video)?;
//! let request = SamplingRequest::new(TimeRange::new(113_000, 143_000), 10);
//!
//! let mut source = FfmpegOpener.open(video)?;
//! let result = extract_frames(
//!     &mut source,
//!     &request,
//!     duration_ms,
//!     Path::new("frames"),
//!     &ExtractOptions::new(),
//! )?;
//! println!("Total frames: {}", result.frames_written);
//! # Ok::<(), framepick::FrameError>(())
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::{
    config::{ExtractOptions, FrameGate},
    decode::DecodeSource,
    error::FrameError,
    progress::{OperationType, ProgressTracker},
};

const MILLISECONDS_PER_SECOND: u64 = 1_000;

/// A window of media time, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    /// Inclusive start.
    pub start_ms: u64,
    /// Exclusive end.
    pub end_ms: u64,
}

impl TimeRange {
    /// Create a range. No ordering is enforced here; an inverted range
    /// simply has a zero span.
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Length of the window, zero if `end_ms <= start_ms`.
    pub fn span_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Check the window against a probed media duration.
    ///
    /// # Errors
    ///
    /// [`FrameError::RangeExceeded`] if `start_ms >= duration_ms` or
    /// `end_ms > duration_ms`.
    pub fn ensure_within(&self, duration_ms: u64) -> Result<(), FrameError> {
        if self.start_ms >= duration_ms || self.end_ms > duration_ms {
            return Err(FrameError::RangeExceeded {
                start_ms: self.start_ms,
                end_ms: self.end_ms,
                duration_ms,
            });
        }
        Ok(())
    }
}

/// A window plus the number of frames the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingRequest {
    /// The window to sample.
    pub range: TimeRange,
    /// Frames requested. The plan may take fewer.
    pub requested_count: u64,
}

impl SamplingRequest {
    /// Create a request.
    pub fn new(range: TimeRange, requested_count: u64) -> Self {
        Self {
            range,
            requested_count,
        }
    }
}

/// How many frames to take and how far apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    /// `min(requested_count, floor(span_ms / 1000))`.
    pub effective_count: u64,
    /// Spacing between kept frames in milliseconds: the whole-second
    /// quotient `max(floor(span_ms / (effective_count * 1000)), 1)`
    /// multiplied by 1000.
    pub frame_interval_ms: u64,
}

impl SamplingPlan {
    /// Derive the plan for `request`.
    ///
    /// # Errors
    ///
    /// [`FrameError::EmptyRange`] when no frame fits: the window is shorter
    /// than one second, inverted, or zero frames were requested.
    pub fn new(request: &SamplingRequest) -> Result<Self, FrameError> {
        let span_ms = request.range.span_ms();
        let available = span_ms / MILLISECONDS_PER_SECOND;
        let effective_count = request.requested_count.min(available);

        if effective_count == 0 {
            return Err(FrameError::EmptyRange {
                start_ms: request.range.start_ms,
                end_ms: request.range.end_ms,
            });
        }

        let interval_seconds = (span_ms / (effective_count * MILLISECONDS_PER_SECOND)).max(1);

        Ok(Self {
            effective_count,
            frame_interval_ms: interval_seconds * MILLISECONDS_PER_SECOND,
        })
    }
}

/// Why an extraction stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The planned number of frames was written.
    CountReached,
    /// A decoded frame was at or past the end of the window.
    RangeEnd,
    /// The decoder ran out of frames.
    EndOfStream,
    /// The decoder failed; frames written before the failure are kept.
    DecodeFailure(String),
}

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExtractionResult {
    /// Number of images written.
    pub frames_written: u64,
    /// Written files, `frame_0.jpg` first, in increasing timestamp order.
    pub output_paths: Vec<PathBuf>,
    /// The clamped frame budget.
    pub effective_count: u64,
    /// Spacing used between kept frames, in milliseconds.
    pub frame_interval_ms: u64,
    /// Why the loop ended.
    pub stop_reason: StopReason,
}

impl ExtractionResult {
    /// `true` if a decode failure cut the extraction short.
    pub fn is_partial(&self) -> bool {
        matches!(self.stop_reason, StopReason::DecodeFailure(_))
    }
}

/// File name of the `index`-th written frame.
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index}.jpg")
}

/// Admission state for one extraction.
struct FrameSelector {
    gate: FrameGate,
    interval_ms: u64,
    next_due_ms: u64,
}

impl FrameSelector {
    fn new(gate: FrameGate, plan: &SamplingPlan, start_ms: u64) -> Self {
        Self {
            gate,
            interval_ms: plan.frame_interval_ms,
            next_due_ms: start_ms,
        }
    }

    fn admit(&mut self, position_ms: u64) -> bool {
        match self.gate {
            FrameGate::Modulo => position_ms % self.interval_ms == 0,
            FrameGate::NextDue => {
                if position_ms < self.next_due_ms {
                    return false;
                }
                // Skip every boundary this frame already covers.
                let missed = (position_ms - self.next_due_ms) / self.interval_ms;
                self.next_due_ms += (missed + 1) * self.interval_ms;
                true
            }
        }
    }
}

/// Extract up to `effective_count` evenly-spaced frames from `source`.
///
/// Frames are written to `output_folder/frame_{i}.jpg` with `i` counting up
/// from zero without gaps. Progress is reported through the options'
/// callback after each write.
///
/// The loop stops when the planned count is written, when a decoded frame
/// is at or past `range.end_ms`, at end of stream, or when the decoder
/// fails. A decode failure is not an error: the frames written so far are
/// returned with [`StopReason::DecodeFailure`].
///
/// # Errors
///
/// Nothing is decoded or written when validation fails:
///
/// - [`FrameError::RangeExceeded`] if the window is not inside
///   `duration_ms`.
/// - [`FrameError::EmptyRange`] if the plan has zero frames.
/// - [`FrameError::OutputDirectoryMissing`] if `output_folder` is not an
///   existing directory. It is never created here.
///
/// During the loop:
///
/// - [`FrameError::Cancelled`] if the cancellation token fires.
/// - [`FrameError::IoError`] / [`FrameError::ImageError`] if an image
///   cannot be written.
/// - Any error from the initial seek.
pub fn extract_frames<S>(
    source: &mut S,
    request: &SamplingRequest,
    duration_ms: u64,
    output_folder: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionResult, FrameError>
where
    S: DecodeSource + ?Sized,
{
    let range = request.range;
    range.ensure_within(duration_ms)?;
    let plan = SamplingPlan::new(request)?;

    if !output_folder.is_dir() {
        return Err(FrameError::OutputDirectoryMissing(
            output_folder.to_path_buf(),
        ));
    }

    log::debug!(
        "Sampling {} frame(s) every {} ms between {} ms and {} ms ({:?})",
        plan.effective_count,
        plan.frame_interval_ms,
        range.start_ms,
        range.end_ms,
        options.gate,
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameExtraction,
        Some(plan.effective_count),
        options.batch_size,
    );
    let mut selector = FrameSelector::new(options.gate, &plan, range.start_ms);
    let mut output_paths: Vec<PathBuf> = Vec::new();

    source.seek(range.start_ms)?;

    let stop_reason = loop {
        if output_paths.len() as u64 >= plan.effective_count {
            break StopReason::CountReached;
        }
        if options.is_cancelled() {
            return Err(FrameError::Cancelled);
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break StopReason::EndOfStream,
            Err(error) => {
                log::warn!(
                    "Decoding stopped after {} frame(s): {error}",
                    output_paths.len()
                );
                break StopReason::DecodeFailure(error.to_string());
            }
        };

        if frame.position_ms >= range.end_ms {
            break StopReason::RangeEnd;
        }
        if !selector.admit(frame.position_ms) {
            continue;
        }

        let path = output_folder.join(frame_file_name(output_paths.len() as u64));
        write_jpeg(&frame.image, &path, options.jpeg_quality)?;
        log::debug!("Saved frame at {} ms -> {}", frame.position_ms, path.display());

        tracker.advance(frame.position_ms, Some(path.clone()));
        output_paths.push(path);
    };

    tracker.finish();

    if output_paths.is_empty() {
        log::warn!("No decoded frame passed the {:?} gate", options.gate);
    }

    Ok(ExtractionResult {
        frames_written: output_paths.len() as u64,
        output_paths,
        effective_count: plan.effective_count,
        frame_interval_ms: plan.frame_interval_ms,
        stop_reason,
    })
}

fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), FrameError> {
    let mut writer = BufWriter::new(File::create(path)?);
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        match image {
            DynamicImage::ImageRgb8(rgb) => encoder.encode_image(rgb)?,
            DynamicImage::ImageLuma8(gray) => encoder.encode_image(gray)?,
            other => encoder.encode_image(&other.to_rgb8())?,
        }
    }
    writer.flush()?;
    Ok(())
}
