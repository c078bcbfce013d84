//! Media source abstraction.
//!
//! The playback orchestrator talks to a [`MediaSource`] and never to the
//! decoder directly. Both concrete sources delegate every operation to an
//! owned [`Decoder`]; the URI variant only adds one-time network
//! initialization before the container opens.

use std::sync::Arc;

use ffmpeg_next as ffmpeg;
use once_cell::sync::Lazy;

use crate::config::DecoderConfig;
use crate::decoder::{DecodeError, Decoder};
use crate::media::{AudioFrame, BoundedFrameQueue, CodecInfo, VideoFrame};
use crate::record::FrameSink;
use crate::stats::PlaybackStats;

/// Capability contract every playable source fulfills.
pub trait MediaSource: Send + Sync {
    fn start(&self);

    fn stop(&self);

    fn flush(&self);

    fn seek(&self, seconds: f64) -> bool;

    fn duration(&self) -> f64;

    fn codec_info(&self) -> CodecInfo;

    fn video_queue(&self) -> Arc<BoundedFrameQueue<VideoFrame>>;

    fn audio_queue(&self) -> Arc<BoundedFrameQueue<AudioFrame>>;

    /// Sorted keyframe timestamps for seek-bar markers.
    fn iframe_timestamps(&self) -> Vec<f64>;

    /// Sorted non-key picture timestamps for seek-bar markers.
    fn pframe_timestamps(&self) -> Vec<f64>;
}

/// Local file playback source.
pub struct FileSource {
    decoder: Decoder,
}

impl FileSource {
    pub fn open(path: &str, config: &DecoderConfig) -> Result<Self, DecodeError> {
        Ok(Self {
            decoder: Decoder::open(path, config)?,
        })
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        self.decoder.stats()
    }

    pub fn set_frame_sink(&self, sink: Option<Box<dyn FrameSink>>) {
        self.decoder.set_frame_sink(sink);
    }

    /// Recording pass-through, see [`Decoder::encode_frame`].
    pub fn encode_frame(&self, frame: &VideoFrame) {
        self.decoder.encode_frame(frame);
    }
}

impl MediaSource for FileSource {
    fn start(&self) {
        self.decoder.start();
    }

    fn stop(&self) {
        self.decoder.stop();
    }

    fn flush(&self) {
        self.decoder.flush();
    }

    fn seek(&self, seconds: f64) -> bool {
        self.decoder.seek(seconds)
    }

    fn duration(&self) -> f64 {
        self.decoder.duration()
    }

    fn codec_info(&self) -> CodecInfo {
        self.decoder.codec_info()
    }

    fn video_queue(&self) -> Arc<BoundedFrameQueue<VideoFrame>> {
        self.decoder.video_queue()
    }

    fn audio_queue(&self) -> Arc<BoundedFrameQueue<AudioFrame>> {
        self.decoder.audio_queue()
    }

    fn iframe_timestamps(&self) -> Vec<f64> {
        self.decoder.iframe_timestamps()
    }

    fn pframe_timestamps(&self) -> Vec<f64> {
        self.decoder.pframe_timestamps()
    }
}

/// Network stream playback source. Decode behavior is identical to
/// [`FileSource`], the container protocol handling lives inside FFmpeg.
pub struct UriSource {
    decoder: Decoder,
}

impl UriSource {
    pub fn open(uri: &str, config: &DecoderConfig) -> Result<Self, DecodeError> {
        ensure_network_init();
        Ok(Self {
            decoder: Decoder::open(uri, config)?,
        })
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        self.decoder.stats()
    }
}

impl MediaSource for UriSource {
    fn start(&self) {
        self.decoder.start();
    }

    fn stop(&self) {
        self.decoder.stop();
    }

    fn flush(&self) {
        self.decoder.flush();
    }

    fn seek(&self, seconds: f64) -> bool {
        self.decoder.seek(seconds)
    }

    fn duration(&self) -> f64 {
        self.decoder.duration()
    }

    fn codec_info(&self) -> CodecInfo {
        self.decoder.codec_info()
    }

    fn video_queue(&self) -> Arc<BoundedFrameQueue<VideoFrame>> {
        self.decoder.video_queue()
    }

    fn audio_queue(&self) -> Arc<BoundedFrameQueue<AudioFrame>> {
        self.decoder.audio_queue()
    }

    fn iframe_timestamps(&self) -> Vec<f64> {
        self.decoder.iframe_timestamps()
    }

    fn pframe_timestamps(&self) -> Vec<f64> {
        self.decoder.pframe_timestamps()
    }
}

fn ensure_network_init() {
    static INIT: Lazy<()> = Lazy::new(ffmpeg::format::network::init);
    let _ = &*INIT;
}

/// Open the right source for a location: URIs with a scheme get the network
/// variant, everything else is treated as a file path.
pub fn open_source(
    location: &str,
    config: &DecoderConfig,
) -> Result<Box<dyn MediaSource>, DecodeError> {
    if location.contains("://") {
        Ok(Box::new(UriSource::open(location, config)?))
    } else {
        Ok(Box::new(FileSource::open(location, config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails_construction() {
        let err = FileSource::open("/nonexistent/definitely-missing.mp4", &DecoderConfig::default())
            .err()
            .expect("open must fail");
        match err {
            DecodeError::Open { .. } => {}
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
