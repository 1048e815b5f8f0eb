//! 解码后的音频帧.

use ajm_core::{ChannelLayout, NOPTS_VALUE, SampleFormat};

/// 音频帧
///
/// 平面格式: `data` 中每个 Vec 对应一个声道.
/// 交错格式: `data` 中只有一个 Vec, 所有声道交替排列.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// 音频采样数据
    pub data: Vec<Vec<u8>>,
    /// 本帧包含的采样数 (每声道)
    pub nb_samples: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 采样格式
    pub sample_format: SampleFormat,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 显示时间戳 (以采样数计)
    pub pts: i64,
    /// 帧时长 (每声道采样数)
    pub duration: i64,
}

impl AudioFrame {
    /// 创建空的音频帧
    pub fn new(
        nb_samples: u32,
        sample_rate: u32,
        sample_format: SampleFormat,
        channel_layout: ChannelLayout,
    ) -> Self {
        let plane_count = if sample_format.is_planar() {
            channel_layout.channels as usize
        } else {
            1
        };
        Self {
            data: vec![Vec::new(); plane_count],
            nb_samples,
            sample_rate,
            sample_format,
            channel_layout,
            pts: NOPTS_VALUE,
            duration: 0,
        }
    }

    /// 复制帧描述 (格式/布局/时间戳), 不复制采样数据
    pub fn clone_descriptor(&self, sample_format: SampleFormat) -> Self {
        let mut frame = Self::new(
            self.nb_samples,
            self.sample_rate,
            sample_format,
            self.channel_layout,
        );
        frame.pts = self.pts;
        frame.duration = self.duration;
        frame
    }

    /// 所有声道采样数据的总字节数
    pub fn data_size(&self) -> usize {
        self.nb_samples as usize
            * self.channel_layout.channels as usize
            * self.sample_format.bytes_per_sample() as usize
    }
}
