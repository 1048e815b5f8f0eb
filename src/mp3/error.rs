//! MP3 适配层错误类型.

use ajm_core::AjmError;
use thiserror::Error;

/// 帧头解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// 帧头不足 4 字节
    #[error("帧头数据不足: 需要 4 字节, 实际 {len} 字节")]
    Truncated { len: usize },

    /// 提取出的索引超出常量表范围
    #[error("帧头字段 {field} 超出表范围: {value}")]
    IndexOutOfRange { field: &'static str, value: u8 },
}

/// 解码会话错误
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 未注册所需的解码器或解析器
    #[error("编解码器不可用: {0}")]
    CodecUnavailable(#[source] AjmError),

    /// 解码上下文无法打开
    #[error("无法打开解码上下文: {0}")]
    ContextOpen(#[source] AjmError),

    /// 码流损坏 (解析器返回非法的消耗量等)
    #[error("码流损坏: {0}")]
    CorruptStream(String),

    /// 解码引擎返回了 "需要更多数据" / "流结束" 以外的错误
    #[error("解码引擎错误: {0}")]
    Engine(#[source] AjmError),

    /// 已解码帧超出帧头推算的大小, 剩余输出放不下
    #[error("输出缓冲区溢出: 帧需要 {needed} 字节, 剩余 {available} 字节")]
    OutputOverflow { needed: usize, available: usize },
}

/// 帧格式转换错误
///
/// 可恢复: 会话记录日志后丢弃该帧.
#[derive(Debug, Error)]
#[error("帧格式转换失败: {0}")]
pub struct ConvertError(#[from] pub AjmError);
