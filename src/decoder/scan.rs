//! One-time keyframe pre-scan.
//!
//! Walks the video stream of a freshly opened demuxer from position zero and
//! classifies every coded picture as key or non-key with its timestamp. The
//! resulting index feeds seek-bar markers; playback and seek math never read
//! it.

use ffmpeg_next as ffmpeg;

use crate::media::FrameIndex;

/// Scan `path` and collect key/non-key timestamps for `stream_index`.
///
/// Opens its own demuxer so the playback demuxer's read position is left
/// untouched.
pub fn scan_frame_index(path: &str, stream_index: usize) -> Result<FrameIndex, ffmpeg::Error> {
    let mut input = ffmpeg::format::input(&path)?;
    let time_base = input
        .stream(stream_index)
        .map(|s| f64::from(s.time_base()))
        .unwrap_or(0.0);

    let mut iframes = Vec::new();
    let mut pframes = Vec::new();

    for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        // Coded pictures occasionally omit pts, fall back to dts.
        let Some(ts) = packet.pts().or_else(|| packet.dts()) else {
            continue;
        };
        let seconds = ts as f64 * time_base;
        if packet.is_key() {
            iframes.push(seconds);
        } else {
            pframes.push(seconds);
        }
    }

    log::debug!(
        "frame scan: {} keyframes, {} predicted frames",
        iframes.len(),
        pframes.len()
    );

    Ok(FrameIndex::new(iframes, pframes))
}
