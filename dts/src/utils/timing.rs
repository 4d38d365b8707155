//! Timing utilities for presentation timestamps.
//!
//! Timestamps are expressed in ticks of the 90 kHz system clock.

use crate::structs::header::StreamHeader;

/// Ticks per second of the presentation clock.
pub const CLOCK_RATE: u64 = 90_000;

/// Presentation timestamp of frame `frame_index`.
///
/// The product is formed in 128 bits so multi-hour streams at high
/// sample rates cannot overflow before the division.
pub fn compute_timestamp(frame_index: u64, samples_per_frame: u32, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }

    let ticks = frame_index as u128 * CLOCK_RATE as u128 * samples_per_frame as u128
        / sample_rate as u128;

    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Trait providing frame timing for CBR streams.
pub trait Timing {
    fn samples_per_frame(&self) -> u32;
    fn sample_rate(&self) -> u32;

    fn pts(&self, frame_index: u64) -> u64 {
        compute_timestamp(frame_index, self.samples_per_frame(), self.sample_rate())
    }

    /// Frame duration in clock ticks, rounded down.
    fn frame_duration(&self) -> u64 {
        self.pts(1)
    }
}

impl Timing for StreamHeader {
    fn samples_per_frame(&self) -> u32 {
        self.samples_per_frame
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[test]
fn timestamp_is_zero_at_stream_start() {
    for (spf, rate) in [(512, 44100), (256, 48000), (4096, 192000), (32, 8000)] {
        assert_eq!(compute_timestamp(0, spf, rate), 0);
    }
}

#[test]
fn timestamp_is_monotonic() {
    let mut prev = 0;
    for frame in 0..10_000u64 {
        let pts = compute_timestamp(frame, 512, 44100);
        assert!(pts >= prev);
        prev = pts;
    }
    // 512 samples at 48 kHz last exactly 960 ticks
    assert_eq!(compute_timestamp(3, 512, 48000), 2880);
}

#[test]
fn timestamp_does_not_overflow_long_streams() {
    // ten hours of 4096-sample frames at 8 kHz
    let frames = 10 * 3600 * 8000 / 4096;
    let pts = compute_timestamp(frames, 4096, 8000);
    assert_eq!(pts, frames * 4096 * 90_000 / 8000);

    assert_eq!(compute_timestamp(u64::MAX, 4096, 8000), u64::MAX);
}
