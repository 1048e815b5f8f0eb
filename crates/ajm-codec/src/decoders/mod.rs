//! 解码器实现模块.

#[cfg(feature = "symphonia-backend")]
pub mod mp3;

use crate::registry::CodecRegistry;

/// 注册所有内置解码器
///
/// 未启用 `symphonia-backend` 时不注册 MP3 解码器, 会话创建时报告编解码器不可用.
pub fn register_all_decoders(registry: &mut CodecRegistry) {
    #[cfg(feature = "symphonia-backend")]
    registry.register_decoder(crate::CodecId::Mp3, "mp3", mp3::Mp3Decoder::create);
    #[cfg(not(feature = "symphonia-backend"))]
    let _ = registry;
}
