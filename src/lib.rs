//! playcore: media decode and synchronization core.
//!
//! Demultiplexes a container, decodes audio and video on a dedicated thread,
//! normalizes frames to RGB24 and stereo s16 PCM, paces emission against the
//! audio origin and aligns streams against a reference clock. Rendering,
//! recording and telemetry live outside the core and consume the frame
//! queues and read-only state exposed here.

pub mod config;
pub mod decoder;
pub mod media;
pub mod record;
pub mod source;
pub mod stats;
pub mod sync;

pub use config::{ChannelSyncConfig, DecoderConfig, PlayerConfig, SyncConfig};
pub use decoder::{DecodeError, Decoder};
pub use media::{AudioFrame, BoundedFrameQueue, CodecInfo, FrameIndex, VideoFrame};
pub use record::FrameSink;
pub use source::{FileSource, MediaSource, UriSource, open_source};
pub use stats::PlaybackStats;
pub use sync::{ChannelSync, ClockSyncEngine, SyncState, SyncedFrames};
