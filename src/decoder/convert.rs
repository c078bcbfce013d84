//! Pixel and sample format normalization.
//!
//! Wraps the FFmpeg scaler and resampler behind recreate-if-changed guards.
//! Both handles are mutable and reconfigured off the hot path when the
//! effective source parameters change, e.g. after the first frame of a
//! hardware decode session arrives in a different pixel format than the
//! stream parameters advertised.

use std::sync::Mutex;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::{Pixel, Sample};
use ffmpeg_next::software::{resampling, scaling};
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScaleParams {
    format: Pixel,
    width: u32,
    height: u32,
}

struct ScalerInner {
    context: scaling::Context,
    params: ScaleParams,
}

/// Converts decoded frames of any pixel format and size to packed RGB24.
pub struct RgbScaler {
    inner: Mutex<Option<ScalerInner>>,
}

impl RgbScaler {
    /// Eagerly create a scaler for the advertised source parameters so an
    /// unsupported format fails at open instead of mid-playback.
    pub fn for_source(format: Pixel, width: u32, height: u32) -> Result<Self, ffmpeg::Error> {
        let params = ScaleParams {
            format,
            width,
            height,
        };
        let context = Self::build(params)?;
        Ok(Self {
            inner: Mutex::new(Some(ScalerInner { context, params })),
        })
    }

    fn build(params: ScaleParams) -> Result<scaling::Context, ffmpeg::Error> {
        scaling::Context::get(
            params.format,
            params.width,
            params.height,
            Pixel::RGB24,
            params.width,
            params.height,
            scaling::Flags::BILINEAR,
        )
    }

    /// Scale a frame to RGB24, rebuilding the context first if the source
    /// format or dimensions changed since the last call.
    pub fn scale(&self, source: &frame::Video) -> Result<frame::Video, ffmpeg::Error> {
        let current = ScaleParams {
            format: source.format(),
            width: source.width(),
            height: source.height(),
        };

        let mut guard = self.inner.lock().unwrap();
        let needs_rebuild = guard.as_ref().map(|s| s.params != current).unwrap_or(true);
        if needs_rebuild {
            log::debug!(
                "recreating scaler for {:?} {}x{}",
                current.format,
                current.width,
                current.height
            );
            let context = Self::build(current)?;
            *guard = Some(ScalerInner {
                context,
                params: current,
            });
        }

        let mut rgb = frame::Video::empty();
        guard.as_mut().unwrap().context.run(source, &mut rgb)?;
        Ok(rgb)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResampleParams {
    format: Sample,
    layout: ChannelLayout,
    rate: u32,
}

struct ResamplerInner {
    context: resampling::Context,
    params: ResampleParams,
}

/// Converts decoded audio to packed signed 16-bit stereo at a fixed output
/// rate (the source rate, captured at open).
pub struct PcmResampler {
    inner: Mutex<Option<ResamplerInner>>,
    output_rate: u32,
}

impl PcmResampler {
    pub const OUTPUT_FORMAT: Sample = Sample::I16(SampleType::Packed);

    pub fn for_source(
        format: Sample,
        layout: ChannelLayout,
        rate: u32,
    ) -> Result<Self, ffmpeg::Error> {
        let params = ResampleParams {
            format,
            layout: normalize_layout(layout),
            rate,
        };
        let context = Self::build(&params, rate)?;
        Ok(Self {
            inner: Mutex::new(Some(ResamplerInner { context, params })),
            output_rate: rate,
        })
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn build(
        params: &ResampleParams,
        output_rate: u32,
    ) -> Result<resampling::Context, ffmpeg::Error> {
        resampling::Context::get(
            params.format,
            params.layout.clone(),
            params.rate,
            Self::OUTPUT_FORMAT,
            ChannelLayout::STEREO,
            output_rate,
        )
    }

    /// Resample one frame, rebuilding the context if the source parameters
    /// changed since the last call.
    pub fn resample(&self, source: &frame::Audio) -> Result<frame::Audio, ffmpeg::Error> {
        let current = ResampleParams {
            format: source.format(),
            layout: normalize_layout(source.channel_layout()),
            rate: source.rate(),
        };

        let mut guard = self.inner.lock().unwrap();
        let needs_rebuild = guard.as_ref().map(|s| s.params != current).unwrap_or(true);
        if needs_rebuild {
            log::debug!(
                "recreating resampler for {:?} rate {}",
                current.format,
                current.rate
            );
            let context = Self::build(&current, self.output_rate)?;
            *guard = Some(ResamplerInner {
                context,
                params: current,
            });
        }

        let mut converted = frame::Audio::empty();
        guard.as_mut().unwrap().context.run(source, &mut converted)?;
        Ok(converted)
    }
}

/// Streams occasionally carry an unset channel layout. Substitute the stereo
/// default so the resampler can still be configured.
fn normalize_layout(layout: ChannelLayout) -> ChannelLayout {
    if layout.channels() == 0 {
        ChannelLayout::STEREO
    } else {
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_params_change_detection() {
        let a = ScaleParams {
            format: Pixel::YUV420P,
            width: 1280,
            height: 720,
        };
        let b = ScaleParams {
            format: Pixel::NV12,
            width: 1280,
            height: 720,
        };
        let c = ScaleParams {
            format: Pixel::YUV420P,
            width: 1920,
            height: 1080,
        };
        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_normalize_layout_passthrough() {
        assert_eq!(normalize_layout(ChannelLayout::MONO), ChannelLayout::MONO);
        assert_eq!(
            normalize_layout(ChannelLayout::STEREO),
            ChannelLayout::STEREO
        );
    }

    #[test]
    fn test_resample_params_change_detection() {
        let a = ResampleParams {
            format: Sample::F32(SampleType::Planar),
            layout: ChannelLayout::STEREO,
            rate: 48_000,
        };
        let b = ResampleParams {
            rate: 44_100,
            ..a.clone()
        };
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
