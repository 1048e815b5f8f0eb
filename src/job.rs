//! AJM 作业输出记录.
//!
//! 作业分发方为每次解码调用提供可选的边带结果槽位, 由解码会话填写.

use serde::Serialize;

/// 多帧边带结果
///
/// `num_frames` 为累加器: 每次解码调用加上本次产出的帧数, 调用方负责初值.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MultiFrameResult {
    pub num_frames: u32,
}

/// 流边带结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamResult {
    /// 本次调用消耗的输入字节数
    pub input_consumed: usize,
    /// 本次调用写入的输出字节数
    pub output_written: usize,
    /// 会话自上次重置以来解码的总采样数 (每声道)
    pub total_decoded_samples: u64,
}

/// 单次解码调用的作业输出
#[derive(Debug, Default)]
pub struct JobOutput<'a> {
    pub multi_frame: Option<&'a mut MultiFrameResult>,
    pub stream: Option<&'a mut StreamResult>,
}

impl<'a> JobOutput<'a> {
    /// 不带任何边带结果
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_multi_frame(mut self, result: &'a mut MultiFrameResult) -> Self {
        self.multi_frame = Some(result);
        self
    }

    pub fn with_stream(mut self, result: &'a mut StreamResult) -> Self {
        self.stream = Some(result);
        self
    }

    /// 累加本次调用产出的帧数
    pub(crate) fn add_frames(&mut self, frames: u32) {
        if let Some(multi_frame) = self.multi_frame.as_deref_mut() {
            multi_frame.num_frames = multi_frame.num_frames.wrapping_add(frames);
        }
    }

    pub(crate) fn record_stream(&mut self, consumed: usize, written: usize, total_samples: u64) {
        if let Some(stream) = self.stream.as_deref_mut() {
            *stream = StreamResult {
                input_consumed: consumed,
                output_written: written,
                total_decoded_samples: total_samples,
            };
        }
    }
}
