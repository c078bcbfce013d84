//! Playback counters exposed to telemetry collaborators.
//!
//! All fields are atomics so the decode thread can record without locking and
//! external reporters can read the state at any time through plain accessors.
//! The core owns no event or callback contract; reporting layers poll.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Read-only playback state shared with out-of-core consumers.
pub struct PlaybackStats {
    /// Video frames normalized and queued.
    video_frames: AtomicU64,

    /// Audio frames normalized and queued.
    audio_frames: AtomicU64,

    /// Soft per-unit failures (decode or convert) that were skipped.
    decode_failures: AtomicU64,

    /// Presentation timestamp of the most recent video frame, microseconds.
    last_video_pts_us: AtomicI64,
}

impl PlaybackStats {
    pub fn new() -> Self {
        Self {
            video_frames: AtomicU64::new(0),
            audio_frames: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            last_video_pts_us: AtomicI64::new(0),
        }
    }

    pub fn record_video_frame(&self, pts: f64) {
        self.video_frames.fetch_add(1, Ordering::Relaxed);
        self.last_video_pts_us
            .store((pts * 1_000_000.0) as i64, Ordering::Relaxed);
    }

    pub fn record_audio_frame(&self) {
        self.audio_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn video_frames(&self) -> u64 {
        self.video_frames.load(Ordering::Relaxed)
    }

    pub fn audio_frames(&self) -> u64 {
        self.audio_frames.load(Ordering::Relaxed)
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Current playback position in seconds, derived from the last emitted
    /// video frame.
    pub fn current_time(&self) -> f64 {
        self.last_video_pts_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Reset every counter, used when a session restarts.
    pub fn reset(&self) {
        self.video_frames.store(0, Ordering::Relaxed);
        self.audio_frames.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.last_video_pts_us.store(0, Ordering::Relaxed);
    }
}

impl Default for PlaybackStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = PlaybackStats::new();
        stats.record_video_frame(0.04);
        stats.record_video_frame(0.08);
        stats.record_audio_frame();
        stats.record_decode_failure();

        assert_eq!(stats.video_frames(), 2);
        assert_eq!(stats.audio_frames(), 1);
        assert_eq!(stats.decode_failures(), 1);
        assert!((stats.current_time() - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_state() {
        let stats = PlaybackStats::new();
        stats.record_video_frame(3.5);
        stats.record_audio_frame();
        stats.reset();

        assert_eq!(stats.video_frames(), 0);
        assert_eq!(stats.audio_frames(), 0);
        assert_eq!(stats.current_time(), 0.0);
    }
}
