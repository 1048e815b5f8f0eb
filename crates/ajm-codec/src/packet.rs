//! 压缩数据包 (Packet).
//!
//! 由解析器从原始字节流中切分出的一帧完整压缩数据.

use ajm_core::NOPTS_VALUE;
use bytes::Bytes;

/// 压缩数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (以采样数计)
    pub pts: i64,
    /// 解码时间戳 (以采样数计)
    pub dts: i64,
    /// 数据包时长 (每声道采样数)
    pub duration: i64,
    /// 是否为关键帧
    pub is_keyframe: bool,
}

impl Packet {
    /// 创建不含数据的数据包
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            duration: 0,
            is_keyframe: false,
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
