//! # framepick
//!
//! Pick a bounded number of evenly-spaced still frames out of a video time
//! window and save them as numbered JPEG images.
//!
//! The crate is built around three small pieces:
//!
//! - [`parse_time`] / [`format_milliseconds`] convert between `hh:mm:ss`
//!   and milliseconds.
//! - [`probe_duration`] reads a video's frame rate and frame count and turns
//!   them into a duration.
//! - [`extract_frames`] samples up to N frames across a window and writes
//!   `frame_0.jpg`, `frame_1.jpg`, …
//!
//! Decoding goes through the [`MediaOpener`] / [`DecodeSource`] traits.
//! [`FfmpegOpener`] is the FFmpeg implementation, powered by
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ```no_run
//! use framepick::{ExtractOptions, ExtractionSession, FfmpegOpener};
//!
//! let session = ExtractionSession::from_input("input.mp4", "0:1:53", "0:2:23", ".", 10)?;
//! let result = session.run(&FfmpegOpener, &ExtractOptions::new())?;
//! for path in &result.output_paths {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), framepick::FrameError>(())
//! ```
//!
//! ## How many frames?
//!
//! At most one frame per whole second of window:
//! `effective_count = min(requested, floor(span_ms / 1000))`. Kept frames are
//! `frame_interval_ms` apart, a whole number of seconds. See
//! [`SamplingPlan`].
//!
//! ```
//! use framepick::{SamplingPlan, SamplingRequest, TimeRange};
//!
//! let plan = SamplingPlan::new(&SamplingRequest::new(TimeRange::new(0, 30_000), 10))?;
//! assert_eq!(plan.effective_count, 10);
//! assert_eq!(plan.frame_interval_ms, 3_000);
//! # Ok::<(), framepick::FrameError>(())
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod decode;
pub mod error;
pub mod ffmpeg;
pub mod preview;
pub mod probe;
pub mod progress;
pub mod sampler;
pub mod session;
pub mod timecode;
mod utilities;

pub use config::{DEFAULT_JPEG_QUALITY, ExtractOptions, FrameGate};
pub use decode::{DecodeSource, DecodedFrame, MediaOpener};
pub use error::FrameError;
pub use ffmpeg::{FfmpegLogLevel, FfmpegOpener, FfmpegSource, set_ffmpeg_log_level};
pub use preview::{
    DEFAULT_POLL_INTERVAL, DisplaySurface, PlaybackStop, PlaybackSummary, PreviewOptions,
    SurfaceEvent, play,
};
pub use probe::{MediaSummary, duration_from_frames, probe_duration, probe_media};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{
    ExtractionResult, SamplingPlan, SamplingRequest, StopReason, TimeRange, extract_frames,
    frame_file_name,
};
pub use session::ExtractionSession;
pub use timecode::{format_milliseconds, parse_time};
