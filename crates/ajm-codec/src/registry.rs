//! 编解码器注册表.
//!
//! 按 `CodecId` 查找并实例化解析器与解码器.

use std::collections::HashMap;

use ajm_core::{AjmError, AjmResult};
use log::debug;

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::parser::CodecParser;

/// 解码器工厂函数类型
pub type DecoderFactory = fn() -> AjmResult<Box<dyn Decoder>>;

/// 解析器工厂函数类型
pub type ParserFactory = fn() -> AjmResult<Box<dyn CodecParser>>;

/// 编解码器注册表
pub struct CodecRegistry {
    /// 解码器工厂映射
    decoders: HashMap<CodecId, Vec<Entry<DecoderFactory>>>,
    /// 解析器工厂映射
    parsers: HashMap<CodecId, Vec<Entry<ParserFactory>>>,
}

/// 注册条目
struct Entry<F> {
    /// 名称
    name: String,
    /// 工厂函数
    factory: F,
}

impl CodecRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            parsers: HashMap::new(),
        }
    }

    /// 注册一个解码器
    pub fn register_decoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: DecoderFactory,
    ) {
        self.decoders.entry(codec_id).or_default().push(Entry {
            name: name.into(),
            factory,
        });
    }

    /// 注册一个解析器
    pub fn register_parser(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: ParserFactory,
    ) {
        self.parsers.entry(codec_id).or_default().push(Entry {
            name: name.into(),
            factory,
        });
    }

    /// 创建指定编解码器 ID 的解码器实例
    pub fn create_decoder(&self, codec_id: CodecId) -> AjmResult<Box<dyn Decoder>> {
        let entry = self
            .decoders
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| AjmError::CodecNotFound(format!("未找到 {codec_id} 的解码器")))?;
        debug!("创建解码器: {} ({codec_id})", entry.name);
        (entry.factory)()
    }

    /// 创建指定编解码器 ID 的解析器实例
    pub fn create_parser(&self, codec_id: CodecId) -> AjmResult<Box<dyn CodecParser>> {
        let entry = self
            .parsers
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| AjmError::CodecNotFound(format!("未找到 {codec_id} 的解析器")))?;
        debug!("创建解析器: {} ({codec_id})", entry.name);
        (entry.factory)()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
