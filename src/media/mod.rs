//! Core media value types shared across the decode and sync pipeline.

pub mod frame_queue;

pub use frame_queue::BoundedFrameQueue;

/// Decoded video frame with raw interleaved RGB24 pixel data.
///
/// The buffer is tightly packed (`len == width * height * 3`, stride padding
/// stripped during normalization). Frames are immutable after construction
/// and move by ownership through the queues.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in seconds, normalized by the stream time base.
    pub pts: f64,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pts: f64, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pts,
            data,
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}

/// Number of output channels every audio frame carries after resampling.
pub const OUTPUT_CHANNELS: u16 = 2;

/// Decoded audio frame holding interleaved signed 16-bit PCM.
///
/// Audio is normalized to two channels at the source sample rate, so
/// `data.len() == samples * channels * 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel.
    pub samples: usize,
    pub pts: f64,
    pub data: Vec<u8>,
}

impl AudioFrame {
    pub fn new(sample_rate: u32, channels: u16, samples: usize, pts: f64, data: Vec<u8>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
            pts,
            data,
        }
    }

    /// Total interleaved sample count across all channels.
    pub fn total_samples(&self) -> usize {
        self.samples * self.channels as usize
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}

/// Immutable codec and container snapshot computed once when a source opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecInfo {
    pub video_codec: String,
    pub audio_codec: String,
    pub video_resolution: String,
    pub video_bitrate: String,
    pub audio_sample_rate: String,
    pub audio_bitrate: String,
    pub audio_channels: String,
    pub container_format: String,
    pub has_video: bool,
    pub has_audio: bool,
}

impl CodecInfo {
    pub fn is_empty(&self) -> bool {
        !self.has_video && !self.has_audio
    }

    pub fn format_bitrate(bitrate: i64) -> String {
        if bitrate <= 0 {
            return "Unknown".to_string();
        }
        if bitrate >= 1_000_000 {
            format!("{} Mbps", bitrate / 1_000_000)
        } else if bitrate >= 1_000 {
            format!("{} kbps", bitrate / 1_000)
        } else {
            format!("{} bps", bitrate)
        }
    }

    pub fn format_sample_rate(sample_rate: i32) -> String {
        if sample_rate >= 1_000 {
            format!("{} kHz", sample_rate / 1_000)
        } else {
            format!("{} Hz", sample_rate)
        }
    }

    pub fn format_channel_layout(channels: i32) -> String {
        match channels {
            1 => "Mono".to_string(),
            2 => "Stereo".to_string(),
            6 => "5.1".to_string(),
            8 => "7.1".to_string(),
            n => format!("{} channels", n),
        }
    }
}

/// Sorted key/non-key picture timestamps gathered by the one-time pre-scan.
///
/// Informational only (seek bar markers). Seek math never consults this.
#[derive(Debug, Clone, Default)]
pub struct FrameIndex {
    iframes: Vec<f64>,
    pframes: Vec<f64>,
}

impl FrameIndex {
    pub fn new(mut iframes: Vec<f64>, mut pframes: Vec<f64>) -> Self {
        iframes.sort_by(f64::total_cmp);
        pframes.sort_by(f64::total_cmp);
        Self { iframes, pframes }
    }

    pub fn iframe_timestamps(&self) -> &[f64] {
        &self.iframes
    }

    pub fn pframe_timestamps(&self) -> &[f64] {
        &self.pframes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_sizes() {
        let frame = AudioFrame::new(48_000, OUTPUT_CHANNELS, 1024, 0.5, vec![0u8; 1024 * 2 * 2]);
        assert_eq!(frame.total_samples(), 2048);
        assert_eq!(frame.data_size(), 4096);
    }

    #[test]
    fn test_bitrate_formatting() {
        assert_eq!(CodecInfo::format_bitrate(0), "Unknown");
        assert_eq!(CodecInfo::format_bitrate(-3), "Unknown");
        assert_eq!(CodecInfo::format_bitrate(800), "800 bps");
        assert_eq!(CodecInfo::format_bitrate(128_000), "128 kbps");
        assert_eq!(CodecInfo::format_bitrate(4_500_000), "4 Mbps");
    }

    #[test]
    fn test_sample_rate_and_channel_formatting() {
        assert_eq!(CodecInfo::format_sample_rate(44_100), "44 kHz");
        assert_eq!(CodecInfo::format_sample_rate(800), "800 Hz");
        assert_eq!(CodecInfo::format_channel_layout(1), "Mono");
        assert_eq!(CodecInfo::format_channel_layout(2), "Stereo");
        assert_eq!(CodecInfo::format_channel_layout(6), "5.1");
        assert_eq!(CodecInfo::format_channel_layout(3), "3 channels");
    }

    #[test]
    fn test_frame_index_sorts_timestamps() {
        let index = FrameIndex::new(vec![2.0, 0.0, 1.0], vec![0.5, 0.1]);
        assert_eq!(index.iframe_timestamps(), &[0.0, 1.0, 2.0]);
        assert_eq!(index.pframe_timestamps(), &[0.1, 0.5]);
    }
}
