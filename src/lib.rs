//! # ajm
//!
//! AJM 音频作业接口的 MP3 解码适配层.
//!
//! 作业分发方把任意切分的 MP3 码流与输出缓冲区交给 [`mp3::DecodeSession`],
//! 会话增量解析、解码, 并输出交错 S16 PCM, 同时维护采样数与帧数统计.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use ajm::job::{JobOutput, MultiFrameResult};
//! use ajm::mp3::DecodeSession;
//!
//! let mut session = DecodeSession::with_defaults()?;
//! let input = std::fs::read("audio.mp3")?;
//! let mut pcm = vec![0u8; 64 * 1024];
//!
//! let mut multi = MultiFrameResult::default();
//! let mut job = JobOutput::new().with_multi_frame(&mut multi);
//! let (in_left, out_left) = session.decode(&input, &mut pcm, &mut job)?;
//! println!("剩余输入 {in_left} 字节, 剩余输出 {out_left} 字节");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `ajm-core` | 核心类型与错误 |
//! | `ajm-codec` | 码流解析器与解码器 |
//! | `ajm-resample` | 采样格式与声道转换 |

/// 核心类型与错误
pub use ajm_core as core;

/// 码流解析器与解码器
pub use ajm_codec as codec;

/// 采样格式转换与平面数据交错
pub use ajm_resample as resample;

pub mod config;
pub mod job;
pub mod logging;
pub mod mp3;

/// 获取 ajm 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解析器与解码器的注册表
pub fn default_codec_registry() -> ajm_codec::CodecRegistry {
    let mut registry = ajm_codec::CodecRegistry::new();
    ajm_codec::register_all(&mut registry);
    registry
}
