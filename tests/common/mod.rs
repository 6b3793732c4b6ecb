//! Scripted decode sources shared by the integration tests.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use framepick::{DecodeSource, DecodedFrame, FrameError, MediaOpener};
use image::{DynamicImage, Rgb, RgbImage};

/// Counters shared between an opener and every source it opens.
#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub next_frame_calls: AtomicUsize,
    pub seeks: Mutex<Vec<u64>>,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn next_frame_calls(&self) -> usize {
        self.next_frame_calls.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.seeks.lock().unwrap().clone()
    }
}

/// Opens [`ScriptedSource`]s that replay a fixed list of frame positions.
#[derive(Debug, Clone)]
pub struct ScriptedOpener {
    pub frame_rate: f64,
    pub frame_count: u64,
    pub positions_ms: Vec<u64>,
    /// Index into `positions_ms` at which `next_frame` fails instead.
    pub fail_at: Option<usize>,
    pub fail_open: bool,
    pub counters: Arc<Counters>,
}

impl ScriptedOpener {
    /// A source whose frames sit at exact multiples of `step_ms`.
    pub fn regular(frame_rate: f64, step_ms: u64, duration_ms: u64) -> Self {
        let positions_ms: Vec<u64> = (0..duration_ms).step_by(step_ms as usize).collect();
        let frame_count = (duration_ms as f64 / 1_000.0 * frame_rate).round() as u64;
        Self::with_positions(frame_rate, frame_count, positions_ms)
    }

    /// A source at 30000/1001 fps, positions rounded to whole milliseconds.
    pub fn ntsc(duration_ms: u64) -> Self {
        let frame_rate = 30_000.0 / 1_001.0;
        let frame_count = (duration_ms as f64 / 1_000.0 * frame_rate).floor() as u64;
        let positions_ms = (0..frame_count)
            .map(|index| (index as f64 * 1_000.0 / frame_rate).round() as u64)
            .collect();
        Self::with_positions(frame_rate, frame_count, positions_ms)
    }

    pub fn with_positions(frame_rate: f64, frame_count: u64, positions_ms: Vec<u64>) -> Self {
        Self {
            frame_rate,
            frame_count,
            positions_ms,
            fail_at: None,
            fail_open: false,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl MediaOpener for ScriptedOpener {
    type Source = ScriptedSource;

    fn open(&self, path: &Path) -> Result<ScriptedSource, FrameError> {
        if self.fail_open {
            return Err(FrameError::FileOpen {
                path: path.to_path_buf(),
                reason: "scripted open failure".to_string(),
            });
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSource {
            frame_rate: self.frame_rate,
            frame_count: self.frame_count,
            positions_ms: self.positions_ms.clone(),
            fail_at: self.fail_at,
            cursor: 0,
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Replays frame positions; counts its own release on drop.
#[derive(Debug)]
pub struct ScriptedSource {
    frame_rate: f64,
    frame_count: u64,
    positions_ms: Vec<u64>,
    fail_at: Option<usize>,
    cursor: usize,
    counters: Arc<Counters>,
}

impl DecodeSource for ScriptedSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), FrameError> {
        self.counters.seeks.lock().unwrap().push(position_ms);
        self.cursor = self
            .positions_ms
            .iter()
            .position(|&position| position >= position_ms)
            .unwrap_or(self.positions_ms.len());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FrameError> {
        self.counters.next_frame_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_at == Some(self.cursor) {
            return Err(FrameError::VideoDecodeError(
                "scripted decode failure".to_string(),
            ));
        }

        let Some(&position_ms) = self.positions_ms.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        Ok(Some(DecodedFrame {
            position_ms,
            image: tiny_image(position_ms),
        }))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A 2x2 image whose red channel encodes the position.
pub fn tiny_image(position_ms: u64) -> DynamicImage {
    let shade = (position_ms / 1_000 % 256) as u8;
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([shade, 64, 128])))
}

/// File names in `folder`, sorted.
pub fn written_files(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .expect("Failed to read output folder")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

pub fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}
