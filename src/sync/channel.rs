//! Multi-channel video alignment.
//!
//! Aligns N independently decoded video channels against a designated master
//! channel. Each channel feeds a small bounded queue; a background thread
//! repeatedly gathers one synchronized round and hands it to consumers
//! through a [`BoundedFrameQueue`].
//!
//! A channel that never produces frames blocks round gathering until
//! shutdown. Liveness monitoring is the caller's responsibility.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::ChannelSyncConfig;
use crate::media::{BoundedFrameQueue, VideoFrame};

/// One synchronized round: an entry per channel, `None` where the channel
/// had no frame pairable in this round.
#[derive(Debug, Clone)]
pub struct SyncedFrames {
    pub frames: Vec<Option<VideoFrame>>,
}

impl SyncedFrames {
    /// Number of channels that produced a frame this round.
    pub fn paired(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}

struct Shared {
    config: ChannelSyncConfig,
    master: usize,
    queues: Mutex<Vec<VecDeque<VideoFrame>>>,
    available: Condvar,
    shutdown: AtomicBool,
    drops: Vec<AtomicU64>,
}

impl Shared {
    /// Block until every channel has at least one frame queued, then pair one
    /// round against the master channel's front pts. Returns `None` once
    /// shutdown is requested.
    fn synchronized_frames(&self) -> Option<Vec<Option<VideoFrame>>> {
        let mut queues = self.queues.lock().unwrap();
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            if queues.iter().all(|q| !q.is_empty()) {
                break;
            }
            queues = self.available.wait(queues).unwrap();
        }

        let channel_count = queues.len();
        let reference = queues[self.master].front().map(|f| f.pts).unwrap_or(0.0);
        let mut round: Vec<Option<VideoFrame>> = (0..channel_count).map(|_| None).collect();
        round[self.master] = queues[self.master].pop_front();

        for channel in 0..channel_count {
            if channel == self.master {
                continue;
            }
            let queue = &mut queues[channel];
            let best = queue
                .iter()
                .enumerate()
                .map(|(i, f)| (i, (f.pts - reference).abs()))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let Some((best_idx, best_diff)) = best else {
                continue;
            };

            if best_diff <= self.config.tolerance {
                // Select the best match, discarding everything older.
                let mut selected = None;
                for _ in 0..=best_idx {
                    selected = queue.pop_front();
                }
                round[channel] = selected;
            } else if best_diff > 2.0 * self.config.tolerance {
                // Nothing close enough will ever arrive for this reference,
                // the front frame is unrecoverable.
                queue.pop_front();
                self.drops[channel].fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "channel {} frame unpairable against master pts {:.3}s (diff {:.4}s), dropped",
                    channel,
                    reference,
                    best_diff
                );
            }
            // Frames within 2x tolerance but unselected stay queued for a
            // future round.
        }

        Some(round)
    }
}

/// Aligns multiple video channels to a master clock channel.
pub struct ChannelSync {
    shared: Arc<Shared>,
    output: Arc<BoundedFrameQueue<SyncedFrames>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelSync {
    /// Create an engine for `channel_count` channels aligned against
    /// `master`. Panics if `master` is out of range or there are no channels.
    pub fn new(channel_count: usize, master: usize, config: ChannelSyncConfig) -> Self {
        assert!(channel_count > 0, "at least one channel required");
        assert!(master < channel_count, "master channel out of range");
        let output_capacity = config.queue_capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                config,
                master,
                queues: Mutex::new((0..channel_count).map(|_| VecDeque::new()).collect()),
                available: Condvar::new(),
                shutdown: AtomicBool::new(false),
                drops: (0..channel_count).map(|_| AtomicU64::new(0)).collect(),
            }),
            output: Arc::new(BoundedFrameQueue::new(output_capacity)),
            worker: Mutex::new(None),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.shared.drops.len()
    }

    pub fn master_channel(&self) -> usize {
        self.shared.master
    }

    /// Queue a frame on a channel, dropping that channel's oldest frame when
    /// its queue is full. Returns `false` for an unknown channel.
    pub fn add_frame(&self, frame: VideoFrame, channel: usize) -> bool {
        if channel >= self.channel_count() {
            log::warn!("add_frame on unknown channel {}", channel);
            return false;
        }
        let mut queues = self.shared.queues.lock().unwrap();
        let queue = &mut queues[channel];
        if queue.len() >= self.shared.config.queue_capacity {
            queue.pop_front();
        }
        queue.push_back(frame);
        self.shared.available.notify_all();
        true
    }

    /// Gather one synchronized round, blocking until every channel has a
    /// frame or the engine shuts down.
    pub fn synchronized_frames(&self) -> Option<Vec<Option<VideoFrame>>> {
        self.shared.synchronized_frames()
    }

    /// Spawn the background alignment thread. Rounds land on the output
    /// queue. Idempotent.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }
        self.shared.shutdown.store(false, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let output = Arc::clone(&self.output);
        *worker = Some(thread::spawn(move || {
            log::debug!("channel sync thread started");
            while let Some(frames) = shared.synchronized_frames() {
                output.push(SyncedFrames { frames });
            }
            log::debug!("channel sync thread exited");
        }));
    }

    /// Signal shutdown, wake the alignment thread and join it. Idempotent.
    pub fn stop(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        {
            // Lock briefly so a waiter past its shutdown check still sees the
            // notification.
            let _queues = self.shared.queues.lock().unwrap();
            self.shared.available.notify_all();
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Queue of completed rounds produced by the background thread.
    pub fn output(&self) -> Arc<BoundedFrameQueue<SyncedFrames>> {
        Arc::clone(&self.output)
    }

    /// Frames dropped as unrecoverable on a channel.
    pub fn drop_count(&self, channel: usize) -> u64 {
        self.shared
            .drops
            .get(channel)
            .map(|d| d.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Drop for ChannelSync {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(pts: f64) -> VideoFrame {
        VideoFrame::new(2, 2, pts, vec![0; 12])
    }

    #[test]
    fn test_paired_within_tolerance() {
        let sync = ChannelSync::new(2, 0, ChannelSyncConfig::default());
        // Channel 1 offset by +1ms, inside the 2ms tolerance.
        for i in 0..3 {
            let pts = 0.1 * i as f64;
            sync.add_frame(frame(pts), 0);
            sync.add_frame(frame(pts + 0.001), 1);
        }
        for i in 0..3 {
            let round = sync.synchronized_frames().unwrap();
            let master = round[0].as_ref().unwrap();
            let other = round[1].as_ref().unwrap();
            assert!((master.pts - 0.1 * i as f64).abs() < 1e-9);
            assert!((other.pts - master.pts - 0.001).abs() < 1e-9);
        }
        assert_eq!(sync.drop_count(1), 0);
    }

    #[test]
    fn test_far_offset_drops_every_round() {
        let sync = ChannelSync::new(2, 0, ChannelSyncConfig::default());
        // Channel 1 offset by +50ms, beyond twice the tolerance.
        for i in 0..3 {
            let pts = 0.1 * i as f64;
            sync.add_frame(frame(pts), 0);
            sync.add_frame(frame(pts + 0.05), 1);
        }
        for _ in 0..3 {
            let round = sync.synchronized_frames().unwrap();
            assert!(round[0].is_some());
            assert!(round[1].is_none());
        }
        assert_eq!(sync.drop_count(1), 3);
    }

    #[test]
    fn test_borderline_frame_stays_queued() {
        let config = ChannelSyncConfig::default();
        let sync = ChannelSync::new(2, 0, config.clone());
        sync.add_frame(frame(0.0), 0);
        // Between tolerance and 2x tolerance: neither paired nor dropped.
        sync.add_frame(frame(config.tolerance * 1.5), 1);

        let round = sync.synchronized_frames().unwrap();
        assert!(round[0].is_some());
        assert!(round[1].is_none());
        assert_eq!(sync.drop_count(1), 0);

        // The held frame pairs once the master catches up.
        sync.add_frame(frame(config.tolerance * 1.5), 0);
        let round = sync.synchronized_frames().unwrap();
        assert!(round[1].is_some());
    }

    #[test]
    fn test_selection_discards_older_entries() {
        let sync = ChannelSync::new(2, 0, ChannelSyncConfig::default());
        sync.add_frame(frame(0.2), 0);
        // Two stale frames ahead of the matching one.
        sync.add_frame(frame(0.14), 1);
        sync.add_frame(frame(0.17), 1);
        sync.add_frame(frame(0.2), 1);

        let round = sync.synchronized_frames().unwrap();
        let other = round[1].as_ref().unwrap();
        assert!((other.pts - 0.2).abs() < 1e-9);
        // Older entries were consumed along with the selection.
        sync.add_frame(frame(0.3), 0);
        sync.add_frame(frame(0.3), 1);
        let round = sync.synchronized_frames().unwrap();
        assert!((round[1].as_ref().unwrap().pts - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_channel_queue_drop_oldest() {
        let config = ChannelSyncConfig::default();
        let sync = ChannelSync::new(2, 0, config.clone());
        for i in 0..5 {
            sync.add_frame(frame(i as f64), 1);
        }
        sync.add_frame(frame(4.0), 0);
        // Only the newest `queue_capacity` frames remain on channel 1, so the
        // 4.0s frame is still pairable.
        let round = sync.synchronized_frames().unwrap();
        assert!((round[1].as_ref().unwrap().pts - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_unblocks_background_round() {
        let sync = Arc::new(ChannelSync::new(2, 0, ChannelSyncConfig::default()));
        let waiter = {
            let sync = Arc::clone(&sync);
            std::thread::spawn(move || sync.synchronized_frames())
        };
        // One channel stays empty forever; only stop can release the waiter.
        sync.add_frame(frame(0.0), 0);
        std::thread::sleep(Duration::from_millis(20));
        sync.stop();
        assert!(waiter.join().unwrap().is_none());
    }

    #[test]
    fn test_background_thread_delivers_rounds() {
        let sync = ChannelSync::new(2, 0, ChannelSyncConfig::default());
        sync.start();
        let output = sync.output();
        sync.add_frame(frame(0.0), 0);
        sync.add_frame(frame(0.0005), 1);
        let round = output.wait_pop(Duration::from_secs(2)).expect("round");
        assert_eq!(round.paired(), 2);
        sync.stop();
    }

    #[test]
    fn test_add_frame_rejects_unknown_channel() {
        let sync = ChannelSync::new(2, 0, ChannelSyncConfig::default());
        assert!(!sync.add_frame(frame(0.0), 7));
    }
}
