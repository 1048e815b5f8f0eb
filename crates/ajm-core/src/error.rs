//! 统一错误类型定义.
//!
//! 解析器、解码器与重采样器共用的错误类型.

use thiserror::Error;

/// AJM 基础库统一错误类型
#[derive(Debug, Error)]
pub enum AjmError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作或格式
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 解码引擎错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到指定的编解码器或解析器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),
}

impl AjmError {
    /// 是否为 "暂无更多输出" 一类的正常退出信号
    ///
    /// `NeedMoreData` 与 `Eof` 在帧排空循环中不视为错误.
    pub fn is_drain_signal(&self) -> bool {
        matches!(self, Self::NeedMoreData | Self::Eof)
    }
}

/// AJM 基础库统一 Result 类型
pub type AjmResult<T> = Result<T, AjmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_排空信号判定() {
        assert!(AjmError::NeedMoreData.is_drain_signal());
        assert!(AjmError::Eof.is_drain_signal());
        assert!(!AjmError::Codec("boom".into()).is_drain_signal());
        assert!(!AjmError::CodecNotFound("mp3".into()).is_drain_signal());
    }

    #[test]
    fn test_错误信息格式() {
        let err = AjmError::CodecNotFound("mp3".into());
        assert_eq!(err.to_string(), "未找到编解码器: mp3");
    }
}
