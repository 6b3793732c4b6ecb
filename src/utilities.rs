//! Internal utility functions.
//!
//! Pixel-buffer packing and timestamp conversion shared by the FFmpeg
//! backend.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg rows often carry padding (stride > width × 3). The padding is
/// stripped so the result can go straight into [`image::RgbImage::from_raw`].
pub fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Rescale a PTS value from the stream time base to whole milliseconds.
///
/// Negative timestamps (pre-roll) clamp to zero.
pub fn pts_to_milliseconds(pts: i64, time_base: Rational) -> u64 {
    if time_base.denominator() == 0 {
        return 0;
    }
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * 1_000.0).max(0.0).round() as u64
}

/// Convert milliseconds to a container seek timestamp in `AV_TIME_BASE`
/// (microseconds).
///
/// `Input::seek` with no stream selected expects `AV_TIME_BASE` units.
pub fn milliseconds_to_seek_timestamp(position_ms: u64) -> i64 {
    i64::try_from(position_ms.saturating_mul(1_000)).unwrap_or(i64::MAX)
}

/// Frames per second from a rational frame rate, or zero if it is undefined.
pub fn rational_to_frames_per_second(rate: Rational) -> f64 {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}
