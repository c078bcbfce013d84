//! Hardware decode strategy.
//!
//! The strategy is chosen once at open: probe for a CUDA decode device,
//! install the pixel-format negotiation callback on the codec context, and
//! fall back to plain software decoding on any failure. Downstream code sees
//! a uniform contract either way, because hardware frames are transferred to
//! system memory before they reach the scaler.
//!
//! The device context and negotiation callback go through the raw FFI layer;
//! everything else stays on the safe bindings.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;
use ffmpeg_next::codec::decoder;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::frame;

use crate::decoder::DecodeError;

/// Owned reference to an FFmpeg hardware device context.
pub struct HwDevice {
    buffer: *mut ffmpeg::ffi::AVBufferRef,
}

// The device context is only handed to FFmpeg, never dereferenced from Rust
// threads directly.
unsafe impl Send for HwDevice {}

impl HwDevice {
    /// Create a CUDA decode device. Fails where no device or driver exists.
    pub fn create_cuda() -> Result<Self, ffmpeg::Error> {
        let mut buffer: *mut ffmpeg::ffi::AVBufferRef = std::ptr::null_mut();
        let ret = unsafe {
            ffmpeg::ffi::av_hwdevice_ctx_create(
                &mut buffer,
                ffmpeg::ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_CUDA,
                std::ptr::null(),
                std::ptr::null_mut(),
                0,
            )
        };
        if ret < 0 {
            return Err(ffmpeg::Error::from(ret));
        }
        Ok(Self { buffer })
    }
}

impl Drop for HwDevice {
    fn drop(&mut self) {
        unsafe {
            ffmpeg::ffi::av_buffer_unref(&mut self.buffer);
        }
    }
}

/// Pixel-format negotiation callback installed on hardware-bound contexts.
/// Picks the CUDA surface format when the decoder offers it, otherwise the
/// decoder's first (software) choice.
unsafe extern "C" fn negotiate_pixel_format(
    _ctx: *mut ffmpeg::ffi::AVCodecContext,
    formats: *const ffmpeg::ffi::AVPixelFormat,
) -> ffmpeg::ffi::AVPixelFormat {
    unsafe {
        let mut cursor = formats;
        while *cursor != ffmpeg::ffi::AVPixelFormat::AV_PIX_FMT_NONE {
            if *cursor == ffmpeg::ffi::AVPixelFormat::AV_PIX_FMT_CUDA {
                return *cursor;
            }
            cursor = cursor.add(1);
        }
        *formats
    }
}

/// Open the video decoder for `params`, hardware-bound when requested and
/// possible. Returns the opened decoder plus the device keeping the hardware
/// session alive, `None` for the software path.
pub fn open_video_decoder(
    params: &codec::Parameters,
    use_hw_accel: bool,
) -> Result<(decoder::Video, Option<HwDevice>), DecodeError> {
    if use_hw_accel {
        match open_hw(params) {
            Ok(opened) => {
                log::info!("video decoder bound to CUDA device");
                return Ok(opened);
            }
            Err(err) => {
                log::warn!("hardware decode unavailable ({err}), falling back to software");
            }
        }
    }
    let opened = open_sw(params)?;
    Ok((opened, None))
}

fn open_hw(params: &codec::Parameters) -> Result<(decoder::Video, Option<HwDevice>), ffmpeg::Error> {
    let device = HwDevice::create_cuda()?;
    let codec = ffmpeg::decoder::find(params.id()).ok_or(ffmpeg::Error::DecoderNotFound)?;
    let mut context = codec::context::Context::new_with_codec(codec);
    context.set_parameters(params.clone())?;

    unsafe {
        let raw = context.as_mut_ptr();
        (*raw).get_format = Some(negotiate_pixel_format);
        (*raw).hw_device_ctx = ffmpeg::ffi::av_buffer_ref(device.buffer);
        if (*raw).hw_device_ctx.is_null() {
            return Err(ffmpeg::Error::Unknown);
        }
    }

    let opened = context.decoder().video()?;
    Ok((opened, Some(device)))
}

fn open_sw(params: &codec::Parameters) -> Result<decoder::Video, DecodeError> {
    let context =
        codec::context::Context::from_parameters(params.clone()).map_err(DecodeError::VideoDecoder)?;
    context.decoder().video().map_err(|err| match err {
        ffmpeg::Error::DecoderNotFound => DecodeError::CodecNotFound,
        other => DecodeError::VideoDecoder(other),
    })
}

/// Whether a decoded frame still lives in device memory.
pub fn is_hw_frame(frame: &frame::Video) -> bool {
    frame.format() == Pixel::CUDA
}

/// Copy a hardware frame into system memory, preserving its pts.
pub fn transfer_to_system_memory(source: &frame::Video) -> Result<frame::Video, ffmpeg::Error> {
    let mut transferred = frame::Video::empty();
    let ret = unsafe {
        ffmpeg::ffi::av_hwframe_transfer_data(transferred.as_mut_ptr(), source.as_ptr(), 0)
    };
    if ret < 0 {
        return Err(ffmpeg::Error::from(ret));
    }
    transferred.set_pts(source.pts());
    Ok(transferred)
}
