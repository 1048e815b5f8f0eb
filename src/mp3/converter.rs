//! 解码帧格式转换.
//!
//! 解码器输出的非 S16 帧在写入作业输出前统一转换为交错 S16,
//! 采样率与声道布局保持不变.

use ajm_codec::AudioFrame;
use ajm_core::SampleFormat;
use ajm_resample::ResampleContext;
use tracing::debug;

use super::error::ConvertError;

/// 作业输出的采样格式
pub const OUTPUT_SAMPLE_FORMAT: SampleFormat = SampleFormat::S16;

/// 帧格式转换器
///
/// 每个解码会话持有一个实例. 重采样上下文按需创建,
/// 源参数与上次相同时直接复用.
#[derive(Debug, Default)]
pub struct FrameConverter {
    resampler: Option<ResampleContext>,
}

impl FrameConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已持有重采样上下文
    pub fn is_configured(&self) -> bool {
        self.resampler.is_some()
    }

    /// 将帧转换为交错 S16, 采样率与声道布局不变
    pub fn convert(&mut self, frame: AudioFrame) -> Result<AudioFrame, ConvertError> {
        if frame.sample_format == OUTPUT_SAMPLE_FORMAT {
            return Ok(frame);
        }

        let ctx = self.configure(&frame)?;
        let data = ctx.convert_planes(&frame.data, frame.nb_samples)?;

        let mut output = frame.clone_descriptor(OUTPUT_SAMPLE_FORMAT);
        output.data = vec![data];
        Ok(output)
    }

    /// 释放重采样上下文
    pub fn release(&mut self) {
        self.resampler = None;
    }

    /// 取得与帧参数匹配的重采样上下文
    ///
    /// 源参数不同时丢弃旧上下文并重建.
    fn configure(&mut self, frame: &AudioFrame) -> Result<&ResampleContext, ConvertError> {
        if let Some(ctx) = self.resampler.take() {
            if ctx.sample_rate == frame.sample_rate
                && ctx.src_sample_format == frame.sample_format
                && ctx.channel_layout == frame.channel_layout
            {
                return Ok(self.resampler.insert(ctx));
            }
        }

        debug!(
            "配置重采样上下文: {} {} {}Hz -> {OUTPUT_SAMPLE_FORMAT}",
            frame.sample_format, frame.channel_layout, frame.sample_rate
        );
        let ctx = ResampleContext::new(
            frame.sample_rate,
            frame.channel_layout,
            frame.sample_format,
            OUTPUT_SAMPLE_FORMAT,
        )?;
        Ok(self.resampler.insert(ctx))
    }
}
