//! 解码会话配置.

use ajm_codec::CodecId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// 编解码器名称, 经 [`CodecId::from_name`] 解析
    #[serde(default = "default_codec")]
    pub codec: String,
    /// 帧头扩展解析模式
    #[serde(default)]
    pub extended_header_parse: bool,
}

fn default_codec() -> String {
    "mp3".to_string()
}

impl SessionConfig {
    /// 解析出的编解码器标识, 名称未知时返回 `None`
    pub fn codec_id(&self) -> Option<CodecId> {
        CodecId::from_name(&self.codec)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            extended_header_parse: false,
        }
    }
}
