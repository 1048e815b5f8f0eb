//! # ajm-core
//!
//! AJM 音频作业适配层的基础库, 提供采样格式、声道布局与统一错误类型.
//!
//! 上层的 `ajm-codec`, `ajm-resample` 与 `ajm` 均依赖本 crate.

pub mod channel_layout;
pub mod error;
pub mod sample_format;
pub mod timestamp;

// 重导出常用类型
pub use channel_layout::ChannelLayout;
pub use error::{AjmError, AjmResult};
pub use sample_format::SampleFormat;
pub use timestamp::NOPTS_VALUE;
