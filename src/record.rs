//! Recording hook.
//!
//! The core does not encode. It exposes a pass-through that hands normalized
//! RGB24 frames to an externally supplied sink; the playback orchestrator
//! calls [`crate::decoder::Decoder::encode_frame`] only while its recording
//! flag is set. No assumption is made about the sink's output format.

use crate::media::VideoFrame;

/// Consumer for frames routed through the recording pass-through.
pub trait FrameSink: Send {
    fn encode_frame(&mut self, frame: &VideoFrame);
}

/// Sink that only counts frames, useful as a placeholder and in tests.
#[derive(Debug, Default)]
pub struct CountingSink {
    frames: u64,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for CountingSink {
    fn encode_frame(&mut self, _frame: &VideoFrame) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_sink() {
        let mut sink = CountingSink::new();
        let frame = VideoFrame::new(2, 2, 0.0, vec![0; 12]);
        sink.encode_frame(&frame);
        sink.encode_frame(&frame);
        assert_eq!(sink.frames(), 2);
    }
}
