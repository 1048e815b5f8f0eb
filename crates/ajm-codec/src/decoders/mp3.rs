//! MP3 (MPEG-1/2/2.5 Layer III) 解码器.
//!
//! 位级解码由 symphonia 完成, 本模块负责数据包排队与帧格式包装.
//! 输出为平面 32 位浮点 (F32p), 由上层统一转换为 S16.

use std::collections::VecDeque;

use ajm_core::{AjmError, AjmResult, ChannelLayout, SampleFormat};
use log::{debug, warn};
use symphonia_bundle_mp3::MpaDecoder as SymMpaDecoder;
use symphonia_core::audio::SampleBuffer;
use symphonia_core::codecs::{
    CODEC_TYPE_MP3, CodecParameters as SymCodecParameters, Decoder as SymDecoderTrait,
    DecoderOptions as SymDecoderOptions,
};
use symphonia_core::errors::Error as SymError;
use symphonia_core::formats::Packet as SymPacket;

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::frame::AudioFrame;
use crate::packet::Packet;

/// MP3 解码器
pub struct Mp3Decoder {
    /// symphonia MP3 解码器, `open()` 后可用
    inner: Option<SymMpaDecoder>,
    /// 已送入但尚未解码的数据包
    queue: VecDeque<Packet>,
    /// 下一帧的 PTS (数据包未携带时间戳时使用)
    next_pts: i64,
}

impl Mp3Decoder {
    /// 创建 MP3 解码器 (工厂函数)
    pub fn create() -> AjmResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            inner: None,
            queue: VecDeque::new(),
            next_pts: 0,
        }))
    }

    /// 解码一个数据包, 不可解码的帧返回 `Ok(None)`
    fn decode_packet(&mut self, packet: &Packet) -> AjmResult<Option<AudioFrame>> {
        let decoder = self
            .inner
            .as_mut()
            .ok_or_else(|| AjmError::Codec("MP3 解码器未打开".into()))?;

        let pts = if ajm_core::timestamp::is_valid(packet.pts) {
            packet.pts
        } else {
            self.next_pts
        };
        let sym_pkt = SymPacket::new_from_slice(
            0,
            pts.max(0) as u64,
            packet.duration.max(0) as u64,
            &packet.data,
        );

        let decoded = match decoder.decode(&sym_pkt) {
            Ok(decoded) => decoded,
            Err(SymError::DecodeError(msg)) => {
                warn!("MP3 帧解码失败, 丢弃: {msg}");
                return Ok(None);
            }
            Err(SymError::IoError(err)) => {
                warn!("MP3 帧数据不完整, 丢弃: {err}");
                return Ok(None);
            }
            Err(err) => return Err(AjmError::Codec(format!("symphonia mp3 解码失败: {err}"))),
        };

        let spec = *decoded.spec();
        let nch = spec.channels.count();
        if nch == 0 {
            return Err(AjmError::Codec("MP3 帧声道数为零".into()));
        }
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_planar_ref(decoded);
        let samples = sample_buf.samples();
        let nb_samples = samples.len() / nch;
        if nb_samples == 0 {
            debug!("MP3 帧不含采样, 跳过");
            return Ok(None);
        }

        let mut frame = AudioFrame::new(
            nb_samples as u32,
            spec.rate,
            SampleFormat::F32p,
            ChannelLayout::from_channels(nch as u32),
        );
        frame.data = samples
            .chunks(nb_samples)
            .take(nch)
            .map(|plane| plane.iter().flat_map(|s| s.to_le_bytes()).collect())
            .collect();
        frame.pts = pts;
        frame.duration = nb_samples as i64;

        self.next_pts = pts + nb_samples as i64;
        Ok(Some(frame))
    }
}

impl Decoder for Mp3Decoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Mp3
    }

    fn name(&self) -> &str {
        "mp3"
    }

    fn open(&mut self) -> AjmResult<()> {
        let sym_params = SymCodecParameters {
            codec: CODEC_TYPE_MP3,
            ..Default::default()
        };
        self.inner = Some(
            SymMpaDecoder::try_new(&sym_params, &SymDecoderOptions::default())
                .map_err(|e| AjmError::Codec(format!("symphonia mp3 初始化失败: {e}")))?,
        );
        self.queue.clear();
        self.next_pts = 0;
        debug!("MP3 解码器已打开");
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> AjmResult<()> {
        if self.inner.is_none() {
            return Err(AjmError::Codec("MP3 解码器未打开".into()));
        }
        if packet.is_empty() {
            return Err(AjmError::InvalidArgument("MP3 数据包为空".into()));
        }
        self.queue.push_back(packet.clone());
        Ok(())
    }

    fn receive_frame(&mut self) -> AjmResult<AudioFrame> {
        while let Some(packet) = self.queue.pop_front() {
            if let Some(frame) = self.decode_packet(&packet)? {
                return Ok(frame);
            }
        }
        Err(AjmError::NeedMoreData)
    }
}
