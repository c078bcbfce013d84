//! Container demuxing and decoding.
//!
//! A [`Decoder`] owns the demuxer, the video and optional audio codec
//! contexts, the normalization stages and one dedicated decode thread. The
//! thread reads packets, services pending seek requests, throttles against
//! the frame queues and pushes normalized frames that consumers drain on
//! their own threads.

pub mod convert;
pub mod hw;
pub mod scan;

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;
use ffmpeg_next::codec::packet::Packet;
use ffmpeg_next::format;
use ffmpeg_next::media;
use ffmpeg_next::util::frame;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::config::DecoderConfig;
use crate::media::{
    AudioFrame, BoundedFrameQueue, CodecInfo, FrameIndex, OUTPUT_CHANNELS, VideoFrame,
};
use crate::record::FrameSink;
use crate::stats::PlaybackStats;
use convert::{PcmResampler, RgbScaler};
use hw::HwDevice;

/// Fatal open-time failures. Per-packet decode errors never surface here,
/// they are logged and skipped so one corrupt packet cannot end playback.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("ffmpeg initialization failed: {0}")]
    Init(String),
    #[error("failed to open input {path}: {source}")]
    Open {
        path: String,
        source: ffmpeg::Error,
    },
    #[error("no video stream found")]
    NoVideoStream,
    #[error("codec not found")]
    CodecNotFound,
    #[error("failed to open video decoder: {0}")]
    VideoDecoder(ffmpeg::Error),
    #[error("failed to open audio decoder: {0}")]
    AudioDecoder(ffmpeg::Error),
    #[error("failed to create scaler: {0}")]
    Scaler(ffmpeg::Error),
    #[error("failed to create resampler: {0}")]
    Resampler(ffmpeg::Error),
    #[error("stream pre-scan failed: {0}")]
    Scan(ffmpeg::Error),
}

fn ensure_ffmpeg_init() -> Result<(), DecodeError> {
    static INIT: Lazy<Option<String>> = Lazy::new(|| ffmpeg::init().err().map(|e| e.to_string()));
    match &*INIT {
        None => Ok(()),
        Some(message) => Err(DecodeError::Init(message.clone())),
    }
}

/// Single-slot pending seek command, last writer wins. The decode loop
/// consumes it at exactly one point per iteration so a request is never
/// partially observed.
pub(crate) struct SeekRequest {
    requested: AtomicBool,
    target_us: AtomicI64,
}

impl SeekRequest {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            target_us: AtomicI64::new(0),
        }
    }

    fn set(&self, seconds: f64) {
        self.target_us
            .store((seconds * 1_000_000.0) as i64, Ordering::Relaxed);
        self.requested.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<f64> {
        if self.requested.swap(false, Ordering::AcqRel) {
            Some(self.target_us.load(Ordering::Acquire) as f64 / 1_000_000.0)
        } else {
            None
        }
    }
}

/// Per-session playback origin. Reset on every seek and on (re)start.
struct DecodingState {
    is_first_audio_frame: bool,
    audio_start_pts: f64,
    playback_start: Instant,
}

impl DecodingState {
    fn new() -> Self {
        Self {
            is_first_audio_frame: true,
            audio_start_pts: 0.0,
            playback_start: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.is_first_audio_frame = true;
        self.audio_start_pts = 0.0;
        self.playback_start = Instant::now();
    }
}

struct Shared {
    running: AtomicBool,
    flush_requested: AtomicBool,
    seek: SeekRequest,
    video_queue: Arc<BoundedFrameQueue<VideoFrame>>,
    audio_queue: Arc<BoundedFrameQueue<AudioFrame>>,
    stats: Arc<PlaybackStats>,
    queue_capacity: usize,
    sleep_quantum: Duration,
    max_pacing_sleep: Duration,
}

struct VideoPath {
    decoder: codec::decoder::Video,
    stream_index: usize,
    time_base: f64,
    scaler: RgbScaler,
    // Keeps the hardware session alive for the lifetime of the decoder.
    _hw_device: Option<HwDevice>,
}

struct AudioPath {
    decoder: codec::decoder::Audio,
    stream_index: usize,
    time_base: f64,
    resampler: PcmResampler,
}

/// Everything the decode thread owns exclusively once started. Parked back
/// into the shared slot when the thread exits so the decoder can restart.
struct DecodeSession {
    input: format::context::Input,
    video: VideoPath,
    audio: Option<AudioPath>,
    state: DecodingState,
}

// The FFmpeg contexts are only ever touched from one thread at a time: the
// constructor, then the decode thread, then whoever joins it.
unsafe impl Send for DecodeSession {}

impl DecodeSession {
    fn flush_codecs(&mut self) {
        self.video.decoder.flush();
        if let Some(audio) = self.audio.as_mut() {
            audio.decoder.flush();
        }
    }

    /// Container-level timestamp seek. On failure the request is still gone,
    /// decoding resumes from the current position.
    fn apply_seek(&mut self, target: f64, shared: &Shared) {
        let ts = (target * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        match self.input.seek(ts, ..ts) {
            Ok(()) => {
                self.flush_codecs();
                shared.video_queue.clear();
                shared.audio_queue.clear();
                self.state.reset();
                log::info!("seeked to {:.3}s", target);
            }
            Err(err) => log::warn!("seek to {:.3}s failed: {err}", target),
        }
    }

    /// Producer-side throttle. Sleeps in short increments while either queue
    /// is full, re-checking the running flag so stop() is observed promptly.
    fn wait_for_queue_space(&self, shared: &Shared) {
        while shared.running.load(Ordering::Acquire)
            && (shared.video_queue.len() >= shared.queue_capacity
                || shared.audio_queue.len() >= shared.queue_capacity)
        {
            thread::sleep(shared.sleep_quantum);
        }
    }

    fn decode_audio_packet(&mut self, packet: &Packet, shared: &Shared) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        if let Err(err) = audio.decoder.send_packet(packet) {
            log::debug!("audio packet rejected: {err}");
            shared.stats.record_decode_failure();
            return;
        }
        receive_audio_frames(audio, &mut self.state, shared);
    }

    fn decode_video_packet(&mut self, packet: &Packet, shared: &Shared) {
        if let Err(err) = self.video.decoder.send_packet(packet) {
            log::debug!("video packet rejected: {err}");
            shared.stats.record_decode_failure();
            return;
        }
        receive_video_frames(&mut self.video, &self.state, shared);
    }

    /// End of stream: pull the frames still buffered inside both codecs
    /// through the normal emission paths.
    fn drain(&mut self, shared: &Shared) {
        log::debug!("end of stream, draining codec buffers");
        let _ = self.video.decoder.send_eof();
        receive_video_frames(&mut self.video, &self.state, shared);
        if let Some(audio) = self.audio.as_mut() {
            let _ = audio.decoder.send_eof();
            receive_audio_frames(audio, &mut self.state, shared);
        }
    }
}

fn decode_loop(shared: &Shared, session: &mut DecodeSession) {
    log::debug!("decode thread started");
    loop {
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        if shared.flush_requested.swap(false, Ordering::AcqRel) {
            session.flush_codecs();
        }

        let packet = session
            .input
            .packets()
            .next()
            .map(|(stream, packet)| (stream.index(), packet));

        if let Some(target) = shared.seek.take() {
            // The packet read above predates the seek, skip it undecoded.
            session.apply_seek(target, shared);
            continue;
        }

        let Some((stream_index, packet)) = packet else {
            session.drain(shared);
            break;
        };

        session.wait_for_queue_space(shared);
        if !shared.running.load(Ordering::Acquire) {
            break;
        }

        if session.audio.as_ref().map(|a| a.stream_index) == Some(stream_index) {
            session.decode_audio_packet(&packet, shared);
        } else if stream_index == session.video.stream_index {
            session.decode_video_packet(&packet, shared);
        }
        // Packets from any other stream are ignored.
    }
}

fn receive_audio_frames(audio: &mut AudioPath, state: &mut DecodingState, shared: &Shared) {
    let mut decoded = frame::Audio::empty();
    while audio.decoder.receive_frame(&mut decoded).is_ok() {
        let pts = best_effort_seconds(&decoded, audio.time_base);

        if state.is_first_audio_frame {
            state.audio_start_pts = pts;
            state.playback_start = Instant::now();
            state.is_first_audio_frame = false;
            log::debug!("audio origin captured at {:.3}s", pts);
        }

        match audio.resampler.resample(&decoded) {
            Ok(converted) => {
                let samples = converted.samples();
                if samples == 0 {
                    continue;
                }
                let bytes = samples * OUTPUT_CHANNELS as usize * 2;
                let plane = converted.data(0);
                if plane.len() < bytes {
                    log::debug!("resampled frame shorter than expected, skipped");
                    shared.stats.record_decode_failure();
                    continue;
                }
                let data = plane[..bytes].to_vec();
                shared.audio_queue.push(AudioFrame::new(
                    audio.resampler.output_rate(),
                    OUTPUT_CHANNELS,
                    samples,
                    pts,
                    data,
                ));
                shared.stats.record_audio_frame();
            }
            Err(err) => {
                log::debug!("audio conversion failed: {err}");
                shared.stats.record_decode_failure();
            }
        }
    }
}

fn receive_video_frames(video: &mut VideoPath, state: &DecodingState, shared: &Shared) {
    let mut decoded = frame::Video::empty();
    while video.decoder.receive_frame(&mut decoded).is_ok() {
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        let pts = best_effort_seconds(&decoded, video.time_base);
        match normalize_video_frame(&video.scaler, &decoded, pts) {
            Ok(normalized) => {
                pace_video_emission(state, pts, shared);
                shared.stats.record_video_frame(pts);
                shared.video_queue.push(normalized);
            }
            Err(err) => {
                log::debug!("video conversion failed: {err}");
                shared.stats.record_decode_failure();
            }
        }
    }
}

/// Hardware transfer if needed, then scale to RGB24 and pack tightly.
fn normalize_video_frame(
    scaler: &RgbScaler,
    decoded: &frame::Video,
    pts: f64,
) -> Result<VideoFrame, ffmpeg::Error> {
    let transferred;
    let source = if hw::is_hw_frame(decoded) {
        transferred = hw::transfer_to_system_memory(decoded)?;
        &transferred
    } else {
        decoded
    };

    let rgb = scaler.scale(source)?;
    let width = rgb.width();
    let height = rgb.height();
    let data = pack_rgb24(&rgb, width, height);
    Ok(VideoFrame::new(width, height, pts, data))
}

/// Copy RGB24 rows into a contiguous buffer, stripping stride padding.
fn pack_rgb24(rgb: &frame::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let row_bytes = width as usize * 3;
    let total = row_bytes * height as usize;
    let src = rgb.data(0);

    // Fast path: no padding, single copy.
    if stride == row_bytes && src.len() >= total {
        return src[..total].to_vec();
    }

    let mut packed = Vec::with_capacity(total);
    for row in 0..height as usize {
        let start = row * stride;
        if start + row_bytes > src.len() {
            break;
        }
        packed.extend_from_slice(&src[start..start + row_bytes]);
    }
    packed
}

/// Best-effort decode timestamp in seconds, 0.0 when the stream provides
/// none.
fn best_effort_seconds(decoded: &frame::Frame, time_base: f64) -> f64 {
    let ts = unsafe { (*decoded.as_ptr()).best_effort_timestamp };
    if ts == ffmpeg::ffi::AV_NOPTS_VALUE {
        0.0
    } else {
        ts as f64 * time_base
    }
}

/// Once the audio origin is known, hold a video frame back until its pts
/// catches up with elapsed wall time. The sleep is clamped and chopped so a
/// stop request is never delayed by more than one quantum.
fn pace_video_emission(state: &DecodingState, pts: f64, shared: &Shared) {
    if state.is_first_audio_frame {
        return;
    }
    let relative = pts - state.audio_start_pts;
    let elapsed = state.playback_start.elapsed().as_secs_f64();
    let delay = relative - elapsed;
    if delay <= 0.0 {
        return;
    }
    let clamped = Duration::from_secs_f64(delay).min(shared.max_pacing_sleep);
    interruptible_sleep(clamped, shared.sleep_quantum, &shared.running);
}

fn interruptible_sleep(total: Duration, quantum: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(quantum));
    }
}

/// Demuxing, decoding and normalization behind two frame queues.
pub struct Decoder {
    shared: Arc<Shared>,
    session: Arc<Mutex<Option<DecodeSession>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    sink: Mutex<Option<Box<dyn FrameSink>>>,
    codec_info: CodecInfo,
    duration: f64,
    frame_index: FrameIndex,
}

impl Decoder {
    /// Open a file path or URI. Missing video stream, unknown codec, codec
    /// open failure and scaler or resampler allocation failure all abort
    /// construction.
    pub fn open(path: &str, config: &DecoderConfig) -> Result<Self, DecodeError> {
        ensure_ffmpeg_init()?;

        let input = format::input(&path).map_err(|source| DecodeError::Open {
            path: path.to_string(),
            source,
        })?;

        let (video_index, video_time_base, video_params) = {
            let stream = input
                .streams()
                .best(media::Type::Video)
                .ok_or(DecodeError::NoVideoStream)?;
            (
                stream.index(),
                f64::from(stream.time_base()),
                stream.parameters(),
            )
        };
        let audio_stream = input.streams().best(media::Type::Audio).map(|stream| {
            (
                stream.index(),
                f64::from(stream.time_base()),
                stream.parameters(),
            )
        });

        let frame_index = scan::scan_frame_index(path, video_index).map_err(DecodeError::Scan)?;

        let (video_decoder, hw_device) =
            hw::open_video_decoder(&video_params, config.use_hw_accel)?;
        let width = video_decoder.width();
        let height = video_decoder.height();
        let scaler = RgbScaler::for_source(video_decoder.format(), width, height)
            .map_err(DecodeError::Scaler)?;

        let mut audio_params = None;
        let audio = match audio_stream {
            Some((stream_index, time_base, params)) => {
                let decoder = open_audio_decoder(&params)?;
                let resampler = PcmResampler::for_source(
                    decoder.format(),
                    decoder.channel_layout(),
                    decoder.rate(),
                )
                .map_err(DecodeError::Resampler)?;
                audio_params = Some(params);
                Some(AudioPath {
                    decoder,
                    stream_index,
                    time_base,
                    resampler,
                })
            }
            None => None,
        };

        let duration = container_duration(&input, video_index);
        let codec_info =
            build_codec_info(&input, &video_params, width, height, audio_params.as_ref());
        log::info!(
            "opened {}: {} {} ({}), duration {:.2}s, hw={}",
            path,
            codec_info.container_format,
            codec_info.video_codec,
            codec_info.video_resolution,
            duration,
            hw_device.is_some(),
        );

        let queue_capacity = config.queue_capacity(width, height);
        let shared = Arc::new(Shared {
            running: AtomicBool::new(false),
            flush_requested: AtomicBool::new(false),
            seek: SeekRequest::new(),
            video_queue: Arc::new(BoundedFrameQueue::new(queue_capacity)),
            audio_queue: Arc::new(BoundedFrameQueue::new(queue_capacity)),
            stats: Arc::new(PlaybackStats::new()),
            queue_capacity,
            sleep_quantum: Duration::from_millis(config.sleep_quantum_ms.max(1)),
            max_pacing_sleep: Duration::from_millis(config.max_pacing_sleep_ms),
        });

        let session = DecodeSession {
            input,
            video: VideoPath {
                decoder: video_decoder,
                stream_index: video_index,
                time_base: video_time_base,
                scaler,
                _hw_device: hw_device,
            },
            audio,
            state: DecodingState::new(),
        };

        Ok(Self {
            shared,
            session: Arc::new(Mutex::new(Some(session))),
            thread: Mutex::new(None),
            sink: Mutex::new(None),
            codec_info,
            duration,
            frame_index,
        })
    }

    /// Spawn the decode thread if absent. Idempotent.
    pub fn start(&self) {
        let mut thread_slot = self.thread.lock().unwrap();
        if thread_slot.is_some() {
            return;
        }
        let Some(mut session) = self.session.lock().unwrap().take() else {
            log::warn!("start called without a decode session");
            return;
        };
        self.shared.running.store(true, Ordering::Release);
        self.shared.stats.reset();
        session.state.reset();

        let shared = Arc::clone(&self.shared);
        let slot = Arc::clone(&self.session);
        *thread_slot = Some(thread::spawn(move || {
            decode_loop(&shared, &mut session);
            // Park the contexts so the decoder can restart.
            *slot.lock().unwrap() = Some(session);
            log::debug!("decode thread exited");
        }));
    }

    /// Signal the decode thread to exit, join it and flush codec buffers.
    /// Idempotent; also unblocks any backpressure or pacing sleep.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if let Some(session) = self.session.lock().unwrap().as_mut() {
            session.flush_codecs();
        }
    }

    /// Flush codec buffers without touching queues or session state. When
    /// the decode thread owns the contexts the flush is handed to it.
    pub fn flush(&self) {
        match self.session.lock().unwrap().as_mut() {
            Some(session) => session.flush_codecs(),
            None => self.shared.flush_requested.store(true, Ordering::Release),
        }
    }

    /// Request a seek. Only accepted while running; an unconsumed earlier
    /// request is replaced.
    pub fn seek(&self, seconds: f64) -> bool {
        if !self.shared.running.load(Ordering::Acquire) {
            return false;
        }
        self.shared.seek.set(seconds);
        true
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn codec_info(&self) -> CodecInfo {
        self.codec_info.clone()
    }

    pub fn video_queue(&self) -> Arc<BoundedFrameQueue<VideoFrame>> {
        Arc::clone(&self.shared.video_queue)
    }

    pub fn audio_queue(&self) -> Arc<BoundedFrameQueue<AudioFrame>> {
        Arc::clone(&self.shared.audio_queue)
    }

    pub fn iframe_timestamps(&self) -> Vec<f64> {
        self.frame_index.iframe_timestamps().to_vec()
    }

    pub fn pframe_timestamps(&self) -> Vec<f64> {
        self.frame_index.pframe_timestamps().to_vec()
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        Arc::clone(&self.shared.stats)
    }

    /// Install or remove the recording sink behind the pass-through hook.
    pub fn set_frame_sink(&self, sink: Option<Box<dyn FrameSink>>) {
        *self.sink.lock().unwrap() = sink;
    }

    /// Recording pass-through. The orchestrator calls this per presented
    /// frame while its recording flag is set.
    pub fn encode_frame(&self, video_frame: &VideoFrame) {
        if let Some(sink) = self.sink.lock().unwrap().as_mut() {
            sink.encode_frame(video_frame);
        }
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_audio_decoder(params: &codec::Parameters) -> Result<codec::decoder::Audio, DecodeError> {
    let context = codec::context::Context::from_parameters(params.clone())
        .map_err(DecodeError::AudioDecoder)?;
    context.decoder().audio().map_err(|err| match err {
        ffmpeg::Error::DecoderNotFound => DecodeError::CodecNotFound,
        other => DecodeError::AudioDecoder(other),
    })
}

fn container_duration(input: &format::context::Input, video_index: usize) -> f64 {
    let container = input.duration();
    if container > 0 {
        return container as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE);
    }
    input
        .stream(video_index)
        .map(|stream| {
            let duration = stream.duration();
            if duration > 0 {
                duration as f64 * f64::from(stream.time_base())
            } else {
                0.0
            }
        })
        .unwrap_or(0.0)
}

fn build_codec_info(
    input: &format::context::Input,
    video_params: &codec::Parameters,
    width: u32,
    height: u32,
    audio_params: Option<&codec::Parameters>,
) -> CodecInfo {
    let mut info = CodecInfo {
        has_video: true,
        ..CodecInfo::default()
    };
    info.container_format = input
        .format()
        .name()
        .split(',')
        .next()
        .unwrap_or("unknown")
        .to_string();
    info.video_codec = codec_display_name(video_params);
    info.video_resolution = format!("{}x{}", width, height);
    info.video_bitrate = CodecInfo::format_bitrate(unsafe { (*video_params.as_ptr()).bit_rate });

    if let Some(params) = audio_params {
        info.has_audio = true;
        info.audio_codec = codec_display_name(params);
        let (sample_rate, channels, bit_rate) = unsafe {
            let raw = params.as_ptr();
            (
                (*raw).sample_rate,
                (*raw).ch_layout.nb_channels,
                (*raw).bit_rate,
            )
        };
        info.audio_sample_rate = CodecInfo::format_sample_rate(sample_rate);
        info.audio_channels = CodecInfo::format_channel_layout(channels);
        info.audio_bitrate = CodecInfo::format_bitrate(bit_rate);
    }
    info
}

fn codec_display_name(params: &codec::Parameters) -> String {
    ffmpeg::decoder::find(params.id())
        .map(|codec| normalize_codec_name(codec.name()))
        .unwrap_or_else(|| format!("{:?}", params.id()))
}

fn normalize_codec_name(name: &str) -> String {
    match name {
        "h264" => "H.264".to_string(),
        "hevc" => "H.265/HEVC".to_string(),
        "mpeg4" => "MPEG-4".to_string(),
        "vp8" => "VP8".to_string(),
        "vp9" => "VP9".to_string(),
        "av1" => "AV1".to_string(),
        "aac" => "AAC".to_string(),
        "mp3" | "mp3float" => "MP3".to_string(),
        "ac3" => "AC-3".to_string(),
        "opus" => "Opus".to_string(),
        "vorbis" => "Vorbis".to_string(),
        "flac" => "FLAC".to_string(),
        other if other.starts_with("pcm_") => "PCM".to_string(),
        other => other.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::format::Pixel;

    #[test]
    fn test_seek_request_last_writer_wins() {
        let seek = SeekRequest::new();
        assert_eq!(seek.take(), None);

        seek.set(3.0);
        seek.set(7.5);
        assert_eq!(seek.take(), Some(7.5));
        // Consumed exactly once.
        assert_eq!(seek.take(), None);
    }

    #[test]
    fn test_decoding_state_reset() {
        let mut state = DecodingState::new();
        state.is_first_audio_frame = false;
        state.audio_start_pts = 12.5;
        state.reset();
        assert!(state.is_first_audio_frame);
        assert_eq!(state.audio_start_pts, 0.0);
    }

    #[test]
    fn test_interruptible_sleep_honors_cancellation() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        interruptible_sleep(
            Duration::from_millis(30),
            Duration::from_millis(5),
            &running,
        );
        assert!(start.elapsed() >= Duration::from_millis(25));

        running.store(false, Ordering::Release);
        let start = Instant::now();
        interruptible_sleep(Duration::from_secs(10), Duration::from_millis(5), &running);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_pack_rgb24_strips_stride_padding() {
        let mut rgb = frame::Video::new(Pixel::RGB24, 2, 2);
        let stride = rgb.stride(0);
        assert!(stride >= 6);
        {
            let data = rgb.data_mut(0);
            for row in 0..2 {
                for byte in 0..6 {
                    data[row * stride + byte] = (row * 6 + byte) as u8;
                }
            }
        }
        let packed = pack_rgb24(&rgb, 2, 2);
        assert_eq!(packed, (0u8..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_normalize_codec_name() {
        assert_eq!(normalize_codec_name("h264"), "H.264");
        assert_eq!(normalize_codec_name("aac"), "AAC");
        assert_eq!(normalize_codec_name("pcm_s16le"), "PCM");
        assert_eq!(normalize_codec_name("prores"), "PRORES");
    }
}
