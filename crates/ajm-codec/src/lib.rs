//! # ajm-codec
//!
//! AJM 音频作业适配层的编解码原语, 提供 Packet/Frame 抽象、码流解析器与解码器.
//!
//! 解码流程:
//! 1. `CodecParser::parse()` 从原始字节流中切分出完整的压缩帧
//! 2. `Decoder::send_packet()` 送入压缩帧
//! 3. `Decoder::receive_frame()` 取出解码后的帧, 直到返回 `NeedMoreData`
//!
//! ## 使用示例
//!
//! ```rust
//! use ajm_codec::{CodecId, CodecRegistry};
//!
//! let mut reg = CodecRegistry::new();
//! ajm_codec::register_all(&mut reg);
//!
//! let parser = reg.create_parser(CodecId::Mp3).unwrap();
//! assert_eq!(parser.codec_id(), CodecId::Mp3);
//! ```

pub mod codec_id;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod parser;
pub mod parsers;
pub mod registry;

// 重导出常用类型
pub use codec_id::CodecId;
pub use decoder::Decoder;
pub use frame::AudioFrame;
pub use packet::Packet;
pub use parser::CodecParser;
pub use registry::CodecRegistry;

/// 注册所有内置解析器与解码器
pub fn register_all(registry: &mut CodecRegistry) {
    parsers::register_all_parsers(registry);
    decoders::register_all_decoders(registry);
}
