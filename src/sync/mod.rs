//! Audio/video clock synchronization.
//!
//! [`ClockSyncEngine`] keeps a single video stream aligned to the audio
//! reference clock. Audio is the reference because audio glitches are more
//! perceptible than video glitches and audio playback advances at a constant,
//! sample-rate-driven pace. [`channel::ChannelSync`] extends the idea to
//! multiple video channels aligned against a master channel.

pub mod channel;

pub use channel::{ChannelSync, SyncedFrames};

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::media::VideoFrame;

/// Lifecycle of the sync engine as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No pts pair observed yet, every frame presents immediately.
    Uninitialized,
    /// First audio and video pts captured, no frame scheduled yet.
    Initialized,
    /// Actively pacing frames against the audio clock.
    Playing,
    /// Pacing suspended, frames pass through without delay or drop.
    Paused,
}

#[derive(Debug)]
struct EngineState {
    initialized: bool,
    paused: bool,
    presented: bool,
    first_video_pts: f64,
    first_audio_pts: f64,
    drop_count: u64,
}

impl EngineState {
    fn new() -> Self {
        Self {
            initialized: false,
            paused: false,
            presented: false,
            first_video_pts: -1.0,
            first_audio_pts: -1.0,
            drop_count: 0,
        }
    }
}

/// Per-frame present/delay/drop decisions against an atomic audio clock.
///
/// Incoming video pts are offset by the difference between the first audio
/// and first video pts captured at initialization, so streams whose timestamp
/// origins differ still align.
pub struct ClockSyncEngine {
    config: SyncConfig,
    /// Audio playback position in microseconds, updated by the audio consumer.
    audio_clock_us: AtomicI64,
    state: Mutex<EngineState>,
}

impl ClockSyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            audio_clock_us: AtomicI64::new(0),
            state: Mutex::new(EngineState::new()),
        }
    }

    /// Capture the first audio and video pts pair. Only the first call has
    /// any effect until the engine is reset.
    pub fn initialize(&self, video_pts: f64, audio_pts: f64) {
        let mut state = self.state.lock().unwrap();
        if !state.initialized {
            state.first_video_pts = video_pts;
            state.first_audio_pts = audio_pts;
            state.initialized = true;
            log::debug!(
                "sync initialized: first video pts {:.3}s, first audio pts {:.3}s",
                video_pts,
                audio_pts
            );
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    /// Advance the audio reference clock.
    pub fn set_audio_clock(&self, audio_pts: f64) {
        self.audio_clock_us
            .store((audio_pts * 1_000_000.0) as i64, Ordering::Relaxed);
    }

    pub fn audio_clock(&self) -> f64 {
        self.audio_clock_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Current adjusted video-minus-audio offset in seconds for the given
    /// pts. Read-only, used by telemetry reporters.
    pub fn offset(&self, video_pts: f64) -> f64 {
        let state = self.state.lock().unwrap();
        if !state.initialized {
            return 0.0;
        }
        video_pts + (state.first_audio_pts - state.first_video_pts) - self.audio_clock()
    }

    /// Decide whether `frame` should be presented. Returns `false` when the
    /// frame should be dropped. Sleeps briefly (bounded by the configured
    /// maximum) when the frame is slightly ahead of the audio clock.
    pub fn sync_video(&self, frame: &VideoFrame) -> bool {
        let sleep_for;
        {
            let mut state = self.state.lock().unwrap();
            if !state.initialized || state.paused {
                return true;
            }
            state.presented = true;

            let pts_offset = state.first_audio_pts - state.first_video_pts;
            let diff = frame.pts + pts_offset - self.audio_clock();

            if diff > self.config.sync_threshold && diff < self.config.max_delay {
                sleep_for = diff.min(self.config.max_sleep);
            } else if diff < -self.config.max_delay {
                state.drop_count += 1;
                if state.drop_count % self.config.drop_cadence == 0 {
                    log::warn!(
                        "dropping video frame: pts {:.3}s, audio clock {:.3}s, diff {:.3}s",
                        frame.pts,
                        self.audio_clock(),
                        diff
                    );
                    return false;
                }
                return true;
            } else {
                return true;
            }
        }
        // Lock released before sleeping.
        thread::sleep(Duration::from_secs_f64(sleep_for));
        true
    }

    /// Suspend pacing. Frames pass through undelayed while paused.
    pub fn pause(&self) {
        self.state.lock().unwrap().paused = true;
    }

    pub fn resume(&self) {
        self.state.lock().unwrap().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn state(&self) -> SyncState {
        let state = self.state.lock().unwrap();
        if !state.initialized {
            SyncState::Uninitialized
        } else if state.paused {
            SyncState::Paused
        } else if state.presented {
            SyncState::Playing
        } else {
            SyncState::Initialized
        }
    }

    /// Forget everything, returning to `Uninitialized`. Called on stop and
    /// after a seek so the next pts pair re-establishes the origin.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = EngineState::new();
        self.audio_clock_us.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts: f64) -> VideoFrame {
        VideoFrame::new(2, 2, pts, vec![0; 12])
    }

    fn engine() -> ClockSyncEngine {
        ClockSyncEngine::new(SyncConfig::default())
    }

    #[test]
    fn test_uninitialized_always_presents() {
        let sync = engine();
        assert_eq!(sync.state(), SyncState::Uninitialized);
        assert!(sync.sync_video(&frame(10.0)));
        assert_eq!(sync.state(), SyncState::Uninitialized);
    }

    #[test]
    fn test_state_progression() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        assert_eq!(sync.state(), SyncState::Initialized);
        sync.set_audio_clock(0.0);
        assert!(sync.sync_video(&frame(0.0)));
        assert_eq!(sync.state(), SyncState::Playing);
        sync.pause();
        assert_eq!(sync.state(), SyncState::Paused);
        sync.resume();
        assert_eq!(sync.state(), SyncState::Playing);
        sync.reset();
        assert_eq!(sync.state(), SyncState::Uninitialized);
    }

    #[test]
    fn test_in_window_frame_presents_immediately() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        sync.set_audio_clock(1.0);
        // Within +-20ms of the clock: no delay, no drop.
        assert!(sync.sync_video(&frame(1.01)));
        assert!(sync.sync_video(&frame(0.99)));
    }

    #[test]
    fn test_slightly_early_frame_sleeps_then_presents() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        sync.set_audio_clock(1.0);
        let start = std::time::Instant::now();
        assert!(sync.sync_video(&frame(1.1)));
        // Slept min(0.1, 0.05) seconds.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(45), "slept {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(150), "slept {:?}", elapsed);
    }

    #[test]
    fn test_sustained_lag_drops_every_fifth_frame() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        sync.set_audio_clock(10.0);
        // 25 frames all trailing the clock by far more than max_delay.
        let mut dropped = 0;
        for i in 0..25 {
            let pts = 0.1 * i as f64;
            if !sync.sync_video(&frame(pts)) {
                dropped += 1;
            }
        }
        assert_eq!(dropped, 5);
    }

    #[test]
    fn test_paused_engine_never_drops() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        sync.set_audio_clock(10.0);
        sync.pause();
        for i in 0..10 {
            assert!(sync.sync_video(&frame(0.1 * i as f64)));
        }
    }

    #[test]
    fn test_pts_origin_offset_applied() {
        let sync = engine();
        // Video stream starts at 100.0s, audio at 0.0s.
        sync.initialize(100.0, 0.0);
        sync.set_audio_clock(1.0);
        // Video pts 101.0 adjusts to 1.0, exactly on the clock.
        assert!((sync.offset(101.0)).abs() < 1e-9);
        assert!(sync.sync_video(&frame(101.0)));
    }

    #[test]
    fn test_reset_requires_reinitialization() {
        let sync = engine();
        sync.initialize(0.0, 0.0);
        sync.reset();
        assert!(!sync.is_initialized());
        assert_eq!(sync.audio_clock(), 0.0);
        // New origin pair takes effect after reset.
        sync.initialize(5.0, 2.0);
        let state = sync.state();
        assert_eq!(state, SyncState::Initialized);
    }
}
