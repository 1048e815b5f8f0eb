//! MP3 解码会话.
//!
//! 由作业分发方反复调用 [`DecodeSession::decode`], 每次给出剩余的输入与输出缓冲区.
//! 会话在调用之间只保留解析器中未组装完成的数据; 放不下的帧留在输入中.

use std::sync::Arc;

use ajm_codec::{AudioFrame, CodecId, CodecParser, CodecRegistry, Decoder, Packet};
use ajm_core::AjmError;
use tracing::{debug, trace, warn};

use super::converter::FrameConverter;
use super::error::DecodeError;
use super::header::{ParsedFrameHeader, parse_header};
use crate::config::SessionConfig;
use crate::job::JobOutput;

/// MP3 解码会话
///
/// 持有一个解码上下文、一个解析器与一个格式转换器.
/// 所有方法都需要 `&mut self`, 同一会话不会被并发调用.
pub struct DecodeSession {
    registry: Arc<CodecRegistry>,
    config: SessionConfig,
    codec_id: CodecId,
    parser: Box<dyn CodecParser>,
    decoder: Box<dyn Decoder>,
    converter: FrameConverter,
    decoded_samples: u64,
    num_frames: u32,
    last_header: Option<ParsedFrameHeader>,
}

impl DecodeSession {
    /// 从注册表创建会话
    pub fn new(registry: Arc<CodecRegistry>, config: SessionConfig) -> Result<Self, DecodeError> {
        let codec_id = config.codec_id().ok_or_else(|| {
            DecodeError::CodecUnavailable(AjmError::CodecNotFound(format!(
                "未知编解码器名称: {}",
                config.codec
            )))
        })?;
        let parser = registry
            .create_parser(codec_id)
            .map_err(DecodeError::CodecUnavailable)?;
        let decoder = open_decoder(&registry, codec_id)?;

        debug!("创建解码会话: codec={codec_id}, decoder={}", decoder.name());
        Ok(Self {
            registry,
            config,
            codec_id,
            parser,
            decoder,
            converter: FrameConverter::new(),
            decoded_samples: 0,
            num_frames: 0,
            last_header: None,
        })
    }

    /// 使用内置编解码器与默认配置创建会话
    pub fn with_defaults() -> Result<Self, DecodeError> {
        Self::new(
            Arc::new(crate::default_codec_registry()),
            SessionConfig::default(),
        )
    }

    /// 重建解码上下文并清零计数
    ///
    /// 解析器中未组装完成的数据一并丢弃.
    /// 新上下文打开成功后才替换旧上下文; 失败时会话保持原状.
    pub fn reset(&mut self) -> Result<(), DecodeError> {
        let decoder = open_decoder(&self.registry, self.codec_id)?;
        self.decoder = decoder;
        self.parser.reset();
        self.converter.release();
        self.decoded_samples = 0;
        self.num_frames = 0;
        self.last_header = None;
        debug!("解码会话已重置");
        Ok(())
    }

    /// 解码一段输入, 写入交错 S16 PCM
    ///
    /// # 返回
    /// `(input_remaining, output_remaining)`: 未消耗的输入字节数与未写入的输出字节数.
    ///
    /// 送入解码器前按帧头推算 PCM 大小; 剩余输出放不下时该帧不送入,
    /// 其字节计入 `input_remaining`, 由下次调用重新送入.
    /// 出错时本次已写出的帧仍计入作业输出.
    pub fn decode(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        job: &mut JobOutput<'_>,
    ) -> Result<(usize, usize), DecodeError> {
        let frames_before = self.num_frames;
        let mut in_pos = 0;
        let mut out_pos = 0;

        let result = self.decode_frames(input, output, &mut in_pos, &mut out_pos);

        let frames = self.num_frames - frames_before;
        job.add_frames(frames);
        job.record_stream(in_pos, out_pos, self.decoded_samples);

        trace!(
            "decode: 输入 {in_pos}/{} 字节, 输出 {out_pos}/{} 字节, {frames} 帧",
            input.len(),
            output.len()
        );
        result.map(|()| (input.len() - in_pos, output.len() - out_pos))
    }

    /// 自上次重置以来输出的每声道采样数
    pub fn decoded_samples(&self) -> u64 {
        self.decoded_samples
    }

    /// 自上次重置以来输出的帧数
    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }

    /// 最近一次送入解码器的数据包的帧头
    pub fn last_header(&self) -> Option<ParsedFrameHeader> {
        self.last_header
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn decode_frames(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        in_pos: &mut usize,
        out_pos: &mut usize,
    ) -> Result<(), DecodeError> {
        while *in_pos < input.len() && *out_pos < output.len() {
            let remaining = &input[*in_pos..];
            let (consumed, packet) = self
                .parser
                .parse(remaining)
                .map_err(|err| DecodeError::CorruptStream(err.to_string()))?;

            if consumed > remaining.len() {
                return Err(DecodeError::CorruptStream(format!(
                    "解析器消耗 {consumed} 字节, 超出剩余输入 {} 字节",
                    remaining.len()
                )));
            }
            let Some(packet) = packet else {
                if consumed == 0 {
                    return Err(DecodeError::CorruptStream(
                        "解析器未消耗任何输入".to_string(),
                    ));
                }
                *in_pos += consumed;
                continue;
            };

            let header = self.inspect(&packet);
            let available = output.len() - *out_pos;
            if let Some(needed) = header
                .map(|header| header.pcm_size())
                .filter(|&needed| needed > available)
            {
                let returned = self
                    .parser
                    .push_back(packet, consumed)
                    .map_err(|err| DecodeError::CorruptStream(err.to_string()))?;
                let kept = consumed.checked_sub(returned).ok_or_else(|| {
                    DecodeError::CorruptStream(format!(
                        "解析器退回 {returned} 字节, 超出本次消耗 {consumed} 字节"
                    ))
                })?;
                *in_pos += kept;
                debug!("输出空间不足, 帧留在输入中: 需要 {needed} 字节, 剩余 {available} 字节");
                break;
            }

            *in_pos += consumed;
            if header.is_some() {
                self.last_header = header;
            }
            self.decoder
                .send_packet(&packet)
                .map_err(DecodeError::Engine)?;
            self.drain(output, out_pos)?;
        }
        Ok(())
    }

    /// 解析数据包的帧头, 失败时只记录日志
    fn inspect(&self, packet: &Packet) -> Option<ParsedFrameHeader> {
        match parse_header(&packet.data, self.config.extended_header_parse) {
            Ok(header) => {
                trace!(
                    "数据包: pts={}, {} 字节, {}Hz {}bps {}ch frame_size={}",
                    packet.pts,
                    packet.size(),
                    header.sample_rate,
                    header.bitrate,
                    header.num_channels,
                    header.frame_size
                );
                Some(header)
            }
            Err(err) => {
                debug!("数据包帧头无法解析: {err}");
                None
            }
        }
    }

    /// 取出解码器中的全部帧并整帧写入输出
    fn drain(&mut self, output: &mut [u8], out_pos: &mut usize) -> Result<(), DecodeError> {
        loop {
            let frame = match self.decoder.receive_frame() {
                Ok(frame) => frame,
                Err(err) if err.is_drain_signal() => return Ok(()),
                Err(err) => return Err(DecodeError::Engine(err)),
            };

            let frame = match self.converter.convert(frame) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("丢弃无法转换的帧: {err}");
                    continue;
                }
            };

            let needed = frame_pcm(&frame).len();
            let available = output.len() - *out_pos;
            if needed > available {
                self.discard_frames();
                return Err(DecodeError::OutputOverflow { needed, available });
            }
            self.write_frame(&frame, output, out_pos);
        }
    }

    /// 丢弃解码器中剩余的帧, 使其不会出现在后续作业中
    fn discard_frames(&mut self) {
        let mut dropped = 0;
        while self.decoder.receive_frame().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!("丢弃解码器中剩余的 {dropped} 帧");
        }
    }

    fn write_frame(&mut self, frame: &AudioFrame, output: &mut [u8], out_pos: &mut usize) {
        let pcm = frame_pcm(frame);
        output[*out_pos..*out_pos + pcm.len()].copy_from_slice(pcm);
        *out_pos += pcm.len();
        self.decoded_samples += u64::from(frame.nb_samples);
        self.num_frames = self.num_frames.saturating_add(1);
    }
}

fn open_decoder(
    registry: &CodecRegistry,
    codec_id: CodecId,
) -> Result<Box<dyn Decoder>, DecodeError> {
    let mut decoder = registry
        .create_decoder(codec_id)
        .map_err(DecodeError::CodecUnavailable)?;
    decoder.open().map_err(DecodeError::ContextOpen)?;
    Ok(decoder)
}

/// 交错 S16 帧的 PCM 字节
fn frame_pcm(frame: &AudioFrame) -> &[u8] {
    frame.data.first().map(Vec::as_slice).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use ajm_core::{AjmResult, ChannelLayout, SampleFormat};

    use super::*;
    use crate::job::{MultiFrameResult, StreamResult};

    /// 版本 0, 单声道, 每帧 576 采样的逆向帧头
    const HEADER: [u8; 4] = [0xFF, 0xF3, 0x50, 0xC0];
    const PACKET_LEN: usize = 5;
    const FRAME_PCM: usize = 576 * 2;
    /// 解码器对该包返回引擎错误
    const ENGINE_FAILURE: u8 = 0xEE;
    /// 解码器对该包产出平面数与声道布局不符的帧
    const BROKEN_PLANES: u8 = 0xDD;
    /// 解码器对该包产出两倍于帧头推算的采样数
    const OVERSIZED: u8 = 0xCC;

    fn packets(values: &[u8]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|&value| HEADER.into_iter().chain([value]))
            .collect()
    }

    /// 每送入一个包产出一帧, 尺寸取自帧头, 采样值为包的末字节
    struct EchoDecoder {
        queue: VecDeque<Packet>,
    }

    impl EchoDecoder {
        fn create() -> AjmResult<Box<dyn Decoder>> {
            Ok(Box::new(Self {
                queue: VecDeque::new(),
            }))
        }
    }

    impl Decoder for EchoDecoder {
        fn codec_id(&self) -> CodecId {
            CodecId::Mp3
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn open(&mut self) -> AjmResult<()> {
            Ok(())
        }

        fn send_packet(&mut self, packet: &Packet) -> AjmResult<()> {
            self.queue.push_back(packet.clone());
            Ok(())
        }

        fn receive_frame(&mut self) -> AjmResult<AudioFrame> {
            let packet = self.queue.pop_front().ok_or(AjmError::NeedMoreData)?;
            let header = parse_header(&packet.data, false)
                .map_err(|err| AjmError::Codec(err.to_string()))?;
            let value = packet.data[PACKET_LEN - 1];

            match value {
                ENGINE_FAILURE => Err(AjmError::Codec("比特流校验失败".into())),
                BROKEN_PLANES => {
                    let mut frame = AudioFrame::new(
                        header.samples_per_channel,
                        header.sample_rate,
                        SampleFormat::F32p,
                        ChannelLayout::STEREO,
                    );
                    frame.data.truncate(1);
                    frame.data[0] = vec![0; header.samples_per_channel as usize * 4];
                    Ok(frame)
                }
                _ => {
                    let samples = if value == OVERSIZED {
                        header.samples_per_channel * 2
                    } else {
                        header.samples_per_channel
                    };
                    let mut frame = AudioFrame::new(
                        samples,
                        header.sample_rate,
                        SampleFormat::S16,
                        ChannelLayout::MONO,
                    );
                    frame.data[0] = (0..samples)
                        .flat_map(|_| i16::from(value).to_le_bytes())
                        .collect();
                    Ok(frame)
                }
            }
        }
    }

    /// 每 5 字节切出一个包, 不足一包的字节留在内部
    #[derive(Default)]
    struct FixedParser {
        buffer: Vec<u8>,
    }

    impl FixedParser {
        fn create() -> AjmResult<Box<dyn CodecParser>> {
            Ok(Box::new(Self::default()))
        }
    }

    impl CodecParser for FixedParser {
        fn codec_id(&self) -> CodecId {
            CodecId::Mp3
        }

        fn parse(&mut self, data: &[u8]) -> AjmResult<(usize, Option<Packet>)> {
            let take = (PACKET_LEN - self.buffer.len()).min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            if self.buffer.len() < PACKET_LEN {
                return Ok((take, None));
            }
            Ok((take, Some(Packet::from_data(std::mem::take(&mut self.buffer)))))
        }

        fn push_back(&mut self, packet: Packet, consumed: usize) -> AjmResult<usize> {
            let returned = consumed.min(packet.size());
            self.buffer = packet.data[..packet.size() - returned].to_vec();
            Ok(returned)
        }

        fn reset(&mut self) {
            self.buffer.clear();
        }
    }

    /// 声称消耗了超出输入的字节
    struct OverrunParser;

    impl OverrunParser {
        fn create() -> AjmResult<Box<dyn CodecParser>> {
            Ok(Box::new(Self))
        }
    }

    impl CodecParser for OverrunParser {
        fn codec_id(&self) -> CodecId {
            CodecId::Mp3
        }

        fn parse(&mut self, data: &[u8]) -> AjmResult<(usize, Option<Packet>)> {
            Ok((data.len() + 1, None))
        }

        fn push_back(&mut self, _packet: Packet, consumed: usize) -> AjmResult<usize> {
            Ok(consumed)
        }

        fn reset(&mut self) {}
    }

    /// 既不消耗输入也不产出数据包
    struct StalledParser;

    impl StalledParser {
        fn create() -> AjmResult<Box<dyn CodecParser>> {
            Ok(Box::new(Self))
        }
    }

    impl CodecParser for StalledParser {
        fn codec_id(&self) -> CodecId {
            CodecId::Mp3
        }

        fn parse(&mut self, _data: &[u8]) -> AjmResult<(usize, Option<Packet>)> {
            Ok((0, None))
        }

        fn push_back(&mut self, _packet: Packet, consumed: usize) -> AjmResult<usize> {
            Ok(consumed)
        }

        fn reset(&mut self) {}
    }

    struct FailingOpenDecoder;

    impl FailingOpenDecoder {
        fn create() -> AjmResult<Box<dyn Decoder>> {
            Ok(Box::new(Self))
        }
    }

    impl Decoder for FailingOpenDecoder {
        fn codec_id(&self) -> CodecId {
            CodecId::Mp3
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn open(&mut self) -> AjmResult<()> {
            Err(AjmError::Codec("无法分配上下文".into()))
        }

        fn send_packet(&mut self, _packet: &Packet) -> AjmResult<()> {
            Ok(())
        }

        fn receive_frame(&mut self) -> AjmResult<AudioFrame> {
            Err(AjmError::NeedMoreData)
        }
    }

    fn session_with_parser(create: fn() -> AjmResult<Box<dyn CodecParser>>) -> DecodeSession {
        let mut registry = CodecRegistry::new();
        registry.register_parser(CodecId::Mp3, "test", create);
        registry.register_decoder(CodecId::Mp3, "echo", EchoDecoder::create);
        DecodeSession::new(Arc::new(registry), SessionConfig::default()).unwrap()
    }

    fn echo_session() -> DecodeSession {
        session_with_parser(FixedParser::create)
    }

    #[test]
    fn test_逐包解码并计数() {
        let mut session = echo_session();
        let mut output = vec![0u8; 4 * FRAME_PCM];
        let (in_left, out_left) = session
            .decode(&packets(&[1, 2, 3]), &mut output, &mut JobOutput::new())
            .unwrap();

        assert_eq!(in_left, 0);
        assert_eq!(out_left, FRAME_PCM);
        assert_eq!(session.num_frames(), 3);
        assert_eq!(session.decoded_samples(), 3 * 576);
        assert_eq!(&output[..2], &1i16.to_le_bytes());
        assert_eq!(&output[2 * FRAME_PCM..2 * FRAME_PCM + 2], &3i16.to_le_bytes());
        assert_eq!(session.last_header().unwrap().pcm_size(), FRAME_PCM);
    }

    #[test]
    fn test_输出不足时帧留在输入中() {
        let mut session = echo_session();
        let mut output = vec![0u8; FRAME_PCM + 100];
        let input = packets(&[1, 2, 3]);
        let (in_left, out_left) = session
            .decode(&input, &mut output, &mut JobOutput::new())
            .unwrap();

        // 第一帧写入, 第二帧放不下, 不送入解码器也不计为已消耗
        assert_eq!(out_left, 100);
        assert_eq!(in_left, 2 * PACKET_LEN);
        assert_eq!(session.num_frames(), 1);
        assert!(output[FRAME_PCM..].iter().all(|&b| b == 0));

        let mut output = vec![0u8; 2 * FRAME_PCM];
        let mut multi = MultiFrameResult::default();
        let mut job = JobOutput::new().with_multi_frame(&mut multi);
        let (in_left, out_left) = session
            .decode(&input[input.len() - in_left..], &mut output, &mut job)
            .unwrap();
        drop(job);

        assert_eq!((in_left, out_left), (0, 0));
        assert_eq!(multi.num_frames, 2);
        assert_eq!(&output[..2], &2i16.to_le_bytes());
        assert_eq!(&output[FRAME_PCM..FRAME_PCM + 2], &3i16.to_le_bytes());
        assert_eq!(session.num_frames(), 3);
    }

    #[test]
    fn test_跨调用组装的帧放不下时保留已缓存部分() {
        let mut session = echo_session();
        let input = packets(&[7]);
        let mut output = vec![0u8; FRAME_PCM];

        // 前 3 字节留在解析器中
        let (in_left, _) = session
            .decode(&input[..3], &mut output, &mut JobOutput::new())
            .unwrap();
        assert_eq!(in_left, 0);

        let (in_left, out_left) = session
            .decode(&input[3..], &mut output[..10], &mut JobOutput::new())
            .unwrap();
        assert_eq!((in_left, out_left), (2, 10));
        assert_eq!(session.num_frames(), 0);

        let (in_left, out_left) = session
            .decode(&input[3..], &mut output, &mut JobOutput::new())
            .unwrap();
        assert_eq!((in_left, out_left), (0, 0));
        assert_eq!(&output[..2], &7i16.to_le_bytes());
    }

    #[test]
    fn test_多帧结果为累加值() {
        let mut session = echo_session();
        let mut multi = MultiFrameResult { num_frames: 10 };
        let mut output = vec![0u8; 4 * FRAME_PCM];
        {
            let mut job = JobOutput::new().with_multi_frame(&mut multi);
            session.decode(&packets(&[1, 2]), &mut output, &mut job).unwrap();
            session.decode(&packets(&[3]), &mut output, &mut job).unwrap();
        }
        assert_eq!(multi.num_frames, 13);
    }

    #[test]
    fn test_重置清零计数() {
        let mut session = echo_session();
        let mut output = vec![0u8; 2 * FRAME_PCM];
        session
            .decode(&packets(&[1, 2]), &mut output, &mut JobOutput::new())
            .unwrap();
        assert_eq!(session.num_frames(), 2);

        session.reset().unwrap();
        assert_eq!(session.num_frames(), 0);
        assert_eq!(session.decoded_samples(), 0);
        assert!(session.last_header().is_none());
    }

    #[test]
    fn test_重置丢弃解析器中的残余字节() {
        let mut session = echo_session();
        let mut output = vec![0u8; FRAME_PCM];
        session
            .decode(&packets(&[9])[..3], &mut output, &mut JobOutput::new())
            .unwrap();

        session.reset().unwrap();
        let (in_left, out_left) = session
            .decode(&packets(&[4]), &mut output, &mut JobOutput::new())
            .unwrap();
        assert_eq!((in_left, out_left), (0, 0));
        assert_eq!(&output[..2], &4i16.to_le_bytes());
        assert_eq!(session.num_frames(), 1);
    }

    #[test]
    fn test_引擎错误返回前记录已输出的帧() {
        let mut session = echo_session();
        let mut output = vec![0u8; 4 * FRAME_PCM];
        let mut multi = MultiFrameResult { num_frames: 5 };
        let mut stream = StreamResult::default();
        let mut job = JobOutput::new()
            .with_multi_frame(&mut multi)
            .with_stream(&mut stream);

        let err = session
            .decode(&packets(&[1, ENGINE_FAILURE, 3]), &mut output, &mut job)
            .unwrap_err();
        drop(job);

        assert!(matches!(err, DecodeError::Engine(AjmError::Codec(_))));
        assert_eq!(multi.num_frames, 6);
        assert_eq!(stream.input_consumed, 2 * PACKET_LEN);
        assert_eq!(stream.output_written, FRAME_PCM);
        assert_eq!(stream.total_decoded_samples, 576);
        assert_eq!(session.num_frames(), 1);
    }

    #[test]
    fn test_无法转换的帧被丢弃且不计数() {
        let mut session = echo_session();
        let mut output = vec![0u8; 4 * FRAME_PCM];
        let (in_left, out_left) = session
            .decode(&packets(&[1, BROKEN_PLANES, 2]), &mut output, &mut JobOutput::new())
            .unwrap();

        assert_eq!(in_left, 0);
        assert_eq!(out_left, 2 * FRAME_PCM);
        assert_eq!(session.num_frames(), 2);
        assert_eq!(session.decoded_samples(), 2 * 576);
        // 第三个包紧接第一帧写出
        assert_eq!(&output[FRAME_PCM..FRAME_PCM + 2], &2i16.to_le_bytes());
    }

    #[test]
    fn test_帧大于推算尺寸时报告溢出且不部分拷贝() {
        let mut session = echo_session();
        let mut output = vec![0xAAu8; FRAME_PCM + FRAME_PCM / 2];
        let mut stream = StreamResult::default();
        let mut job = JobOutput::new().with_stream(&mut stream);
        let err = session
            .decode(&packets(&[OVERSIZED]), &mut output, &mut job)
            .unwrap_err();
        drop(job);

        assert!(matches!(
            err,
            DecodeError::OutputOverflow { needed, available }
                if needed == 2 * FRAME_PCM && available == output.len()
        ));
        assert_eq!(stream.output_written, 0);
        assert_eq!(session.num_frames(), 0);
        assert!(output.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_解析器越界消耗视为码流损坏() {
        let mut session = session_with_parser(OverrunParser::create);
        let err = session
            .decode(&[1, 2, 3], &mut [0u8; 16], &mut JobOutput::new())
            .unwrap_err();
        assert!(matches!(err, DecodeError::CorruptStream(_)));
    }

    #[test]
    fn test_解析器无进展视为码流损坏() {
        let mut session = session_with_parser(StalledParser::create);
        let mut stream = StreamResult::default();
        let mut job = JobOutput::new().with_stream(&mut stream);
        let err = session
            .decode(&[1, 2, 3], &mut [0u8; 16], &mut job)
            .unwrap_err();
        drop(job);

        assert!(matches!(err, DecodeError::CorruptStream(_)));
        assert_eq!(stream.input_consumed, 0);
        assert_eq!(session.num_frames(), 0);
    }

    #[test]
    fn test_上下文打开失败() {
        let mut registry = CodecRegistry::new();
        registry.register_parser(CodecId::Mp3, "fixed", FixedParser::create);
        registry.register_decoder(CodecId::Mp3, "failing", FailingOpenDecoder::create);
        let result = DecodeSession::new(Arc::new(registry), SessionConfig::default());
        assert!(matches!(result, Err(DecodeError::ContextOpen(_))));
    }

    #[test]
    fn test_未知编解码器名称() {
        let config = SessionConfig {
            codec: "atrac9".into(),
            ..Default::default()
        };
        let result = DecodeSession::new(Arc::new(CodecRegistry::new()), config);
        assert!(matches!(result, Err(DecodeError::CodecUnavailable(_))));
    }
}
