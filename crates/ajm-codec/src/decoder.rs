//! 解码器 trait 定义.

use ajm_core::AjmResult;

use crate::codec_id::CodecId;
use crate::frame::AudioFrame;
use crate::packet::Packet;

/// 解码器 trait
///
/// 解码流程:
/// 1. 调用 `open()` 打开解码上下文
/// 2. 调用 `send_packet()` 送入压缩数据
/// 3. 调用 `receive_frame()` 取出解码后的帧, 直到返回 `NeedMoreData` 或 `Eof`
pub trait Decoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 打开解码上下文
    fn open(&mut self) -> AjmResult<()>;

    /// 送入一个压缩数据包
    fn send_packet(&mut self, packet: &Packet) -> AjmResult<()>;

    /// 取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(AjmError::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(AjmError::Eof)`: 码流已结束, 不会再产出帧
    fn receive_frame(&mut self) -> AjmResult<AudioFrame>;
}
