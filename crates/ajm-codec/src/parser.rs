//! 码流解析器 trait 定义.

use ajm_core::AjmResult;

use crate::codec_id::CodecId;
use crate::packet::Packet;

/// 码流解析器 trait
///
/// 从任意切分的原始字节流中增量组装完整的压缩帧.
/// 未组装完成的数据保留在解析器内部, 跨调用延续.
pub trait CodecParser: Send {
    /// 获取解析器对应的编解码器标识
    fn codec_id(&self) -> CodecId;

    /// 送入原始数据
    ///
    /// # 返回
    /// `(consumed, packet)`: 本次消耗的字节数, 以及组装完成的数据包 (如有).
    /// 返回数据包时可能只消耗了部分输入, 调用方应从 `consumed` 处继续送入.
    fn parse(&mut self, data: &[u8]) -> AjmResult<(usize, Option<Packet>)>;

    /// 退回刚由 `parse()` 返回、尚未使用的数据包
    ///
    /// `consumed` 为该次 `parse()` 报告的消耗字节数.
    ///
    /// # 返回
    /// 应视为未消耗的字节数 `n` (不超过 `consumed`): 调用方需从该次输入的
    /// `consumed - n` 处重新送入, 届时解析器产出相同的数据包.
    /// 包中来自此前调用的字节保留在解析器内部.
    fn push_back(&mut self, packet: Packet, consumed: usize) -> AjmResult<usize>;

    /// 丢弃内部缓存, 回到同步搜索状态
    fn reset(&mut self);
}
