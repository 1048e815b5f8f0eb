//! 码流解析器实现模块.

pub mod mpegaudio;

use crate::codec_id::CodecId;
use crate::registry::CodecRegistry;

pub use mpegaudio::{MpegAudioHeader, MpegAudioParser, MpegVersion};

/// 注册所有内置解析器
pub fn register_all_parsers(registry: &mut CodecRegistry) {
    registry.register_parser(CodecId::Mp3, "mpegaudio", MpegAudioParser::create);
}
