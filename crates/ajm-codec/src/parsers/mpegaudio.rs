//! MPEG 音频 (Layer III) 码流解析器.
//!
//! 帧头结构 (32 位):
//! ```text
//! AAAA AAAA  AAAB BCCD  EEEE FFGH  IIJJ KLMM
//! A = 同步位 (11 bit, 全1)   B = MPEG 版本    C = 层
//! D = CRC 保护              E = 比特率索引    F = 采样率索引
//! G = 填充位                H = 私有位        I = 声道模式
//! J = 模式扩展              K = 版权         L = 原始/复制
//! M = 强调
//! ```
//!
//! 解析器按标准帧头定位帧边界, 与 AJM 自有的帧头字段推导相互独立.

use ajm_core::{AjmError, AjmResult};
use bytes::Bytes;
use log::debug;

use crate::codec_id::CodecId;
use crate::packet::Packet;
use crate::parser::CodecParser;

/// 帧头长度 (字节)
const HEADER_LEN: usize = 4;

/// ID3v2 标签头长度 (字节)
const ID3V2_HEADER_LEN: usize = 10;

/// MPEG-1 Layer III 比特率表 (kbps), 索引 1-14
const BITRATE_V1_L3: [u32; 15] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// MPEG-2/2.5 Layer III 比特率表 (kbps), 索引 1-14
const BITRATE_V2_L3: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// MPEG 音频版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    /// MPEG-1
    V1,
    /// MPEG-2
    V2,
    /// MPEG-2.5
    V25,
}

/// 标准 MPEG 音频帧头 (仅 Layer III)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegAudioHeader {
    /// MPEG 版本
    pub version: MpegVersion,
    /// 比特率 (bps)
    pub bitrate: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数
    pub channels: u32,
    /// 帧总字节数 (含头部)
    pub frame_size: usize,
    /// 每帧每声道采样数
    pub samples_per_frame: u32,
}

impl MpegAudioHeader {
    /// 解析 4 字节帧头, 不是有效的 Layer III 帧头时返回 `None`
    ///
    /// 自由格式 (比特率索引 0) 无法确定帧长, 同样视为无效.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = u32::from_be_bytes(bytes.get(..HEADER_LEN)?.try_into().ok()?);

        if (header >> 21) != 0x7FF {
            return None;
        }

        let version = match (header >> 19) & 0x03 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };

        // Layer III = 01
        if (header >> 17) & 0x03 != 1 {
            return None;
        }

        let br_idx = ((header >> 12) & 0x0F) as usize;
        if br_idx == 0 || br_idx == 15 {
            return None;
        }

        let sr_idx = ((header >> 10) & 0x03) as usize;
        if sr_idx == 3 {
            return None;
        }

        let padding = (header >> 9) & 0x01;
        let channel_mode = (header >> 6) & 0x03;

        let (bitrate_kbps, sample_rate, samples_per_frame, slot_factor) = match version {
            MpegVersion::V1 => (BITRATE_V1_L3[br_idx], [44100, 48000, 32000][sr_idx], 1152, 144),
            MpegVersion::V2 => (BITRATE_V2_L3[br_idx], [22050, 24000, 16000][sr_idx], 576, 72),
            MpegVersion::V25 => (BITRATE_V2_L3[br_idx], [11025, 12000, 8000][sr_idx], 576, 72),
        };
        let bitrate = bitrate_kbps * 1000;

        Some(Self {
            version,
            bitrate,
            sample_rate,
            channels: if channel_mode == 3 { 1 } else { 2 },
            frame_size: (slot_factor * bitrate / sample_rate + padding) as usize,
            samples_per_frame,
        })
    }
}

/// 解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// 搜索帧同步字
    Sync,
    /// 跳过 ID3v2 标签的剩余字节
    SkipTag(usize),
    /// 组装一帧, 记录帧长与每帧采样数
    Frame { size: usize, samples: u32 },
}

/// MPEG 音频码流解析器
pub struct MpegAudioParser {
    /// 当前帧已收集的字节
    buffer: Vec<u8>,
    /// 解析状态
    state: ParseState,
    /// 下一数据包的 PTS (以采样数计)
    next_pts: i64,
    /// 因失步而丢弃的累计字节数
    skipped: u64,
}

impl MpegAudioParser {
    /// 创建解析器 (工厂函数)
    pub fn create() -> AjmResult<Box<dyn CodecParser>> {
        Ok(Box::new(Self::new()))
    }

    /// 创建解析器
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(2048),
            state: ParseState::Sync,
            next_pts: 0,
            skipped: 0,
        }
    }

    /// 因失步而丢弃的累计字节数
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// 从 `data` 向缓冲区补齐到 `len` 字节, 返回消耗的字节数
    fn fill_to(&mut self, data: &[u8], len: usize) -> usize {
        let take = len.saturating_sub(self.buffer.len()).min(data.len());
        self.buffer.extend_from_slice(&data[..take]);
        take
    }

    /// 在同步状态下处理缓冲区头部, 返回消耗的字节数
    ///
    /// 可能切换到 `SkipTag` 或 `Frame` 状态, 也可能丢弃一个字节继续搜索.
    fn sync(&mut self, data: &[u8]) -> usize {
        let mut consumed = 0;

        // 缓冲区为空时直接跳到下一个候选同步字节
        if self.buffer.is_empty() {
            let skip = data
                .iter()
                .position(|&b| b == 0xFF || b == b'I')
                .unwrap_or(data.len());
            self.skipped += skip as u64;
            consumed += skip;
        }

        consumed += self.fill_to(&data[consumed..], HEADER_LEN);
        if self.buffer.len() < HEADER_LEN {
            return consumed;
        }

        if self.buffer.starts_with(b"ID3") {
            consumed += self.fill_to(&data[consumed..], ID3V2_HEADER_LEN);
            if self.buffer.len() < ID3V2_HEADER_LEN {
                return consumed;
            }
            let tag_size = id3v2_tag_size(&self.buffer);
            debug!("跳过 ID3v2 标签: {tag_size} 字节");
            self.state = ParseState::SkipTag(tag_size - ID3V2_HEADER_LEN);
            self.buffer.clear();
            return consumed;
        }

        match MpegAudioHeader::parse(&self.buffer) {
            Some(header) => {
                self.state = ParseState::Frame {
                    size: header.frame_size,
                    samples: header.samples_per_frame,
                };
            }
            None => {
                self.buffer.remove(0);
                self.skipped += 1;
            }
        }
        consumed
    }

    /// 取出已组装完成的帧
    fn take_packet(&mut self, samples: u32) -> Packet {
        let data = Bytes::from(std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(2048),
        ));
        let mut packet = Packet::from_data(data);
        packet.pts = self.next_pts;
        packet.dts = self.next_pts;
        packet.duration = i64::from(samples);
        // MPEG 音频帧均可独立解码
        packet.is_keyframe = true;
        self.next_pts += i64::from(samples);
        self.state = ParseState::Sync;
        packet
    }
}

impl Default for MpegAudioParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecParser for MpegAudioParser {
    fn codec_id(&self) -> CodecId {
        CodecId::Mp3
    }

    fn parse(&mut self, data: &[u8]) -> AjmResult<(usize, Option<Packet>)> {
        let mut consumed = 0;
        loop {
            match self.state {
                ParseState::Frame { size, samples } => {
                    consumed += self.fill_to(&data[consumed..], size);
                    if self.buffer.len() < size {
                        return Ok((consumed, None));
                    }
                    return Ok((consumed, Some(self.take_packet(samples))));
                }
                ParseState::SkipTag(remaining) => {
                    let take = remaining.min(data.len() - consumed);
                    consumed += take;
                    self.state = if take == remaining {
                        ParseState::Sync
                    } else {
                        ParseState::SkipTag(remaining - take)
                    };
                }
                ParseState::Sync => {
                    consumed += self.sync(&data[consumed..]);
                }
            }
            if consumed == data.len() && !matches!(self.state, ParseState::Frame { .. }) {
                return Ok((consumed, None));
            }
        }
    }

    fn push_back(&mut self, packet: Packet, consumed: usize) -> AjmResult<usize> {
        if self.state != ParseState::Sync || !self.buffer.is_empty() {
            return Err(AjmError::InvalidArgument(
                "解析器已继续解析, 无法退回数据包".into(),
            ));
        }
        // 帧的字节位于本次消耗的末尾; 之前的部分 (失步字节、标签) 仍视为已消耗
        let returned = consumed.min(packet.size());
        let carried = packet.size() - returned;

        // 保留的字节以帧头开头, 重新送入时经同步状态直接进入组帧
        self.buffer.extend_from_slice(&packet.data[..carried]);
        self.next_pts -= packet.duration;
        Ok(returned)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = ParseState::Sync;
        self.next_pts = 0;
        self.skipped = 0;
    }
}

/// 计算 ID3v2 标签总长度 (含 10 字节头部, 含可选的 10 字节尾部)
fn id3v2_tag_size(header: &[u8]) -> usize {
    // syncsafe integer, 每字节只用 7 位
    let size = header[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if header[5] & 0x10 != 0 { 10 } else { 0 };
    ID3V2_HEADER_LEN + size + footer
}
