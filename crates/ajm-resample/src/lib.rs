//! # ajm-resample
//!
//! AJM 音频作业适配层的音频转换库, 提供:
//! - 平面 → 交错排列
//! - 采样格式转换 (如 F32 -> S16)
//!
//! 每个 `ResampleContext` 都是独立的实例状态, 不存在进程级共享配置.

mod convert;

use ajm_core::{AjmError, AjmResult, ChannelLayout, SampleFormat};
use log::trace;

pub use convert::{convert_samples, interleave};

/// 重采样上下文
///
/// 按帧的采样率与声道布局配置一次后可多次复用; 参数变化时由持有者重新创建.
/// 转换只改变采样格式与排列, 采样率与声道布局保持不变.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleContext {
    /// 采样率
    pub sample_rate: u32,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 源采样格式
    pub src_sample_format: SampleFormat,
    /// 目标采样格式 (必须为交错格式)
    pub dst_sample_format: SampleFormat,
}

impl ResampleContext {
    /// 创建新的重采样上下文
    pub fn new(
        sample_rate: u32,
        channel_layout: ChannelLayout,
        src_sample_format: SampleFormat,
        dst_sample_format: SampleFormat,
    ) -> AjmResult<Self> {
        if sample_rate == 0 {
            return Err(AjmError::InvalidArgument("采样率为零".to_string()));
        }
        if channel_layout.channels == 0 {
            return Err(AjmError::InvalidArgument("声道数为零".to_string()));
        }
        if dst_sample_format.is_planar() {
            return Err(AjmError::Unsupported(format!(
                "目标格式必须为交错格式: {dst_sample_format}"
            )));
        }
        Ok(Self {
            sample_rate,
            channel_layout,
            src_sample_format,
            dst_sample_format,
        })
    }

    /// 转换平面或交错数据
    ///
    /// 平面格式时 `planes` 每个元素对应一个声道; 交错格式时只使用第一个元素.
    ///
    /// # 返回
    /// 转换后的交错格式字节数据
    pub fn convert_planes(&self, planes: &[Vec<u8>], nb_samples: u32) -> AjmResult<Vec<u8>> {
        let channels = self.channel_layout.channels as usize;
        let nb = nb_samples as usize;

        let packed = if self.src_sample_format.is_planar() {
            if planes.len() != channels {
                return Err(AjmError::InvalidArgument(format!(
                    "平面数 {} 与声道数 {channels} 不一致",
                    planes.len()
                )));
            }
            interleave(planes, self.src_sample_format, nb)?
        } else {
            planes
                .first()
                .ok_or_else(|| AjmError::InvalidArgument("缺少采样数据".to_string()))?
                .clone()
        };

        let src_format = self.src_sample_format.packed();
        let output = if src_format == self.dst_sample_format {
            let len = nb * channels * src_format.bytes_per_sample() as usize;
            if packed.len() < len {
                return Err(AjmError::InvalidArgument(format!(
                    "数据不足: 期望 {len} 字节, 实际 {} 字节",
                    packed.len()
                )));
            }
            packed[..len].to_vec()
        } else {
            convert_samples(&packed, src_format, self.dst_sample_format, nb, channels)?
        };

        trace!(
            "转换完成: {} -> {} {} {}Hz, {nb_samples} 采样",
            self.src_sample_format,
            self.dst_sample_format,
            self.channel_layout,
            self.sample_rate,
        );
        Ok(output)
    }
}
