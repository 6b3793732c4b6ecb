//! Playback preview.
//!
//! [`play`] streams decoded frames to a [`DisplaySurface`] at a fixed polling
//! cadence until the stream ends or the surface asks to stop. Both the
//! decode source and the surface are owned by the call and released when it
//! returns, whichever way it returns.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
    sync::Arc,
    thread,
    time::Duration,
};

use crate::{
    decode::{DecodeSource, DecodedFrame, MediaOpener},
    error::FrameError,
    progress::{CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
};

/// Delay between frames when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// What the surface wants after showing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Keep playing.
    Continue,
    /// The user asked to quit.
    Quit,
    /// The surface was closed.
    Closed,
}

/// Somewhere to show frames.
///
/// The surface is released by dropping it.
pub trait DisplaySurface {
    /// Show one frame and report what the user did meanwhile.
    fn present(&mut self, frame: &DecodedFrame) -> Result<SurfaceEvent, FrameError>;
}

/// Why playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStop {
    /// No more frames.
    EndOfStream,
    /// The surface reported [`SurfaceEvent::Quit`].
    Quit,
    /// The surface reported [`SurfaceEvent::Closed`].
    Closed,
    /// The cancellation token fired.
    Cancelled,
    /// The decoder failed.
    DecodeFailure(String),
}

/// Outcome of a playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Frames handed to the surface.
    pub frames_shown: u64,
    /// Position of the last frame shown.
    pub last_position_ms: Option<u64>,
    /// Why playback ended.
    pub stop: PlaybackStop,
}

/// Options for [`play`].
#[derive(Clone)]
pub struct PreviewOptions {
    pub(crate) poll_interval: Duration,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for PreviewOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PreviewOptions")
            .field("poll_interval", &self.poll_interval)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewOptions {
    /// Poll every [`DEFAULT_POLL_INTERVAL`], no cancellation, no progress.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancellation: None,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Delay between frames. Zero disables the delay.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Stop playback when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report each shown frame.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Play the video at `path` on `surface`.
///
/// # Errors
///
/// Errors from opening the video or from the surface itself. A decode
/// failure mid-stream ends playback with [`PlaybackStop::DecodeFailure`]
/// instead.
pub fn play<O, P, D>(
    opener: &O,
    path: P,
    mut surface: D,
    options: &PreviewOptions,
) -> Result<PlaybackSummary, FrameError>
where
    O: MediaOpener + ?Sized,
    P: AsRef<Path>,
    D: DisplaySurface,
{
    let path = path.as_ref();
    let mut source = opener.open(path)?;
    log::debug!("Previewing {}", path.display());

    let total = Some(source.frame_count()).filter(|&count| count > 0);
    let mut tracker =
        ProgressTracker::new(options.progress.clone(), OperationType::Playback, total, 1);
    let mut frames_shown = 0_u64;
    let mut last_position_ms = None;

    let stop = loop {
        if options.is_cancelled() {
            break PlaybackStop::Cancelled;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break PlaybackStop::EndOfStream,
            Err(error) => {
                log::warn!("Preview decode failed: {error}");
                break PlaybackStop::DecodeFailure(error.to_string());
            }
        };

        let event = surface.present(&frame)?;
        frames_shown += 1;
        last_position_ms = Some(frame.position_ms);
        tracker.advance(frame.position_ms, None);

        match event {
            SurfaceEvent::Continue => {}
            SurfaceEvent::Quit => break PlaybackStop::Quit,
            SurfaceEvent::Closed => break PlaybackStop::Closed,
        }

        if !options.poll_interval.is_zero() {
            thread::sleep(options.poll_interval);
        }
    };

    tracker.finish();
    log::debug!("Preview stopped after {frames_shown} frame(s): {stop:?}");

    Ok(PlaybackSummary {
        frames_shown,
        last_position_ms,
        stop,
    })
}
