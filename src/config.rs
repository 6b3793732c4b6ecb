//! Extraction options.
//!
//! [`ExtractOptions`] is a builder that threads the progress callback,
//! cancellation token, frame gate, and JPEG quality through
//! [`extract_frames`](crate::extract_frames) without widening its signature.
//!
//! # Example
//!
//! ```
//! use framepick::{CancellationToken, ExtractOptions, FrameGate};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_gate(FrameGate::Modulo)
//!     .with_jpeg_quality(80)
//!     .with_cancellation(token.clone());
//! assert_eq!(options.gate(), FrameGate::Modulo);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Decides which decoded frames are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameGate {
    /// Keep a frame once its position reaches the next due position, then
    /// move the due position forward by whole intervals past it. Works for
    /// any frame rate. This is the default.
    #[default]
    NextDue,
    /// Keep a frame only when `position_ms % frame_interval_ms == 0`.
    ///
    /// Frames whose positions never land exactly on an interval boundary
    /// are never kept, so this can write nothing at all.
    Modulo,
}

impl FromStr for FrameGate {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "next-due" | "next_due" | "nextdue" => Ok(FrameGate::NextDue),
            "modulo" | "mod" => Ok(FrameGate::Modulo),
            other => Err(format!("unknown frame gate: {other} (expected next-due or modulo)")),
        }
    }
}

/// Options for [`extract_frames`](crate::extract_frames) and
/// [`ExtractionSession::run`](crate::ExtractionSession::run).
///
/// A default-constructed value reports nothing, never cancels, uses
/// [`FrameGate::NextDue`], and writes JPEGs at quality
/// [`DEFAULT_JPEG_QUALITY`].
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) gate: FrameGate,
    pub(crate) jpeg_quality: u8,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("gate", &self.gate)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            gate: FrameGate::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Attach a progress callback, invoked after every written frame (or
    /// every [`batch_size`](ExtractOptions::with_batch_size) frames).
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before each decode.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` frames. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Choose the frame gate.
    #[must_use]
    pub fn with_gate(mut self, gate: FrameGate) -> Self {
        self.gate = gate;
        self
    }

    /// Set the JPEG quality, clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// The configured frame gate.
    pub fn gate(&self) -> FrameGate {
        self.gate
    }

    /// The configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
