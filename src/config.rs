//! Runtime configuration for the decode and synchronization pipeline.
//!
//! Every threshold here started life as a hard-coded constant in earlier
//! revisions of the pipeline. They are kept configurable with the historical
//! values as defaults, and round-trip through JSON so a config file can
//! override any subset of them.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decoder-side knobs: queue bounds, pacing limits and the hardware path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Try to bind a hardware decode device at open, falling back to
    /// software on any failure.
    pub use_hw_accel: bool,
    /// Frame queue capacity for sources up to 1080p.
    pub queue_capacity_hd: usize,
    /// Frame queue capacity for sources above 1080p.
    pub queue_capacity_4k: usize,
    /// Upper bound for a single video pacing sleep, in milliseconds.
    pub max_pacing_sleep_ms: u64,
    /// Quantum for interruptible sleeps, in milliseconds. Every blocking wait
    /// in the decode thread re-checks the running flag at this interval.
    pub sleep_quantum_ms: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            use_hw_accel: false,
            queue_capacity_hd: 50,
            queue_capacity_4k: 20,
            max_pacing_sleep_ms: 500,
            sleep_quantum_ms: 5,
        }
    }
}

impl DecoderConfig {
    /// Queue capacity for a source of the given dimensions.
    pub fn queue_capacity(&self, width: u32, height: u32) -> usize {
        if (width as u64) * (height as u64) > 1920 * 1080 {
            self.queue_capacity_4k
        } else {
            self.queue_capacity_hd
        }
    }
}

/// Single-stream audio/video alignment policy, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Below this lead the frame presents immediately.
    pub sync_threshold: f64,
    /// Lead/lag beyond this is treated as out of sync.
    pub max_delay: f64,
    /// Longest single pacing sleep taken while a frame is slightly early.
    pub max_sleep: f64,
    /// Drop every Nth frame that trails the clock by more than `max_delay`,
    /// so sustained lag sheds load without starving video entirely.
    pub drop_cadence: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_threshold: 0.02,
            max_delay: 0.15,
            max_sleep: 0.05,
            drop_cadence: 5,
        }
    }
}

/// Multi-channel alignment policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSyncConfig {
    /// Pairing tolerance against the master channel, in seconds. A candidate
    /// further than twice this value is dropped as unrecoverable.
    pub tolerance: f64,
    /// Per-channel queue depth, drop-oldest on overflow.
    pub queue_capacity: usize,
}

impl Default for ChannelSyncConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.002,
            queue_capacity: 3,
        }
    }
}

/// Top-level configuration bundle, loadable from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub decoder: DecoderConfig,
    pub sync: SyncConfig,
    pub channel_sync: ChannelSyncConfig,
}

impl PlayerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_historical_policy() {
        let decoder = DecoderConfig::default();
        assert_eq!(decoder.queue_capacity_hd, 50);
        assert_eq!(decoder.queue_capacity_4k, 20);
        assert_eq!(decoder.sleep_quantum_ms, 5);
        assert!(!decoder.use_hw_accel);

        let sync = SyncConfig::default();
        assert_eq!(sync.sync_threshold, 0.02);
        assert_eq!(sync.max_delay, 0.15);
        assert_eq!(sync.max_sleep, 0.05);
        assert_eq!(sync.drop_cadence, 5);

        let channels = ChannelSyncConfig::default();
        assert_eq!(channels.tolerance, 0.002);
        assert_eq!(channels.queue_capacity, 3);
    }

    #[test]
    fn test_queue_capacity_by_resolution() {
        let config = DecoderConfig::default();
        assert_eq!(config.queue_capacity(1280, 720), 50);
        assert_eq!(config.queue_capacity(1920, 1080), 50);
        assert_eq!(config.queue_capacity(3840, 2160), 20);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PlayerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PlayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decoder.queue_capacity_hd, 50);
        assert_eq!(back.sync.drop_cadence, 5);
        assert_eq!(back.channel_sync.tolerance, 0.002);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"sync": {"max_delay": 0.3}}"#).unwrap();
        assert_eq!(config.sync.max_delay, 0.3);
        assert_eq!(config.sync.drop_cadence, 5);
        assert_eq!(config.decoder.queue_capacity_hd, 50);
    }
}
