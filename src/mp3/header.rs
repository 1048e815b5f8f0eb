//! AJM MP3 帧头解析.
//!
//! 位布局来自对 AJM 库的逆向, 并非标准 MPEG 音频帧头的字段含义:
//! ```text
//! byte 1: ...V VU..   U = unk_idx (bit 3), VV = 版本位 (bit 4-3), 取出后 XOR 2
//! byte 2: BBBB SSP.   B = br_idx, S = sr_idx, P = padding_bit
//! byte 3: < 0xC0 为双声道, 否则单声道
//! ```

use serde::Serialize;
use tracing::trace;

use super::error::ParseError;
use super::tables::{BITRATE_TABLE, BITRATE_UNIT, FRAME_SIZE_TABLE, SAMPLE_RATE_TABLE};

/// 帧头长度 (字节)
pub const HEADER_SIZE: usize = 4;

/// 版本位右移量 (byte 1)
const VERSION_SHIFT: u8 = 3;
/// 版本索引重映射异或值; 逆向结果, 将 MPEG-1 映射到表行 1
const VERSION_XOR: u8 = 2;
/// unk_idx 所在位 (byte 1)
const UNK_SHIFT: u8 = 3;
/// 采样率索引右移量 (byte 2)
const SAMPLE_RATE_SHIFT: u8 = 2;
/// 比特率索引右移量 (byte 2)
const BITRATE_SHIFT: u8 = 4;
/// 填充位右移量 (byte 2)
const PADDING_SHIFT: u8 = 1;
/// 声道判定阈值 (byte 3); 逆向结果, 低于阈值为双声道
const MONO_THRESHOLD: u8 = 0xC0;
/// 编码器延迟, 逆向结果中恒为 0
const ENCODER_DELAY: u32 = 0;

/// 解析出的帧头信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedFrameHeader {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 比特率 (bits/s)
    pub bitrate: u32,
    /// 声道数 (1 或 2)
    pub num_channels: u32,
    /// 帧长 (字节)
    pub frame_size: u32,
    /// 每声道采样数
    pub samples_per_channel: u32,
    /// 编码器延迟 (采样数)
    pub encoder_delay: u32,
}

impl ParsedFrameHeader {
    /// 本帧解码为交错 S16 PCM 后的字节数
    pub fn pcm_size(&self) -> usize {
        self.samples_per_channel as usize * self.num_channels as usize * size_of::<i16>()
    }
}

/// 从 4 字节帧头推导帧信息
///
/// `extended` 对应 AJM 的扩展解析模式, 目前不提取额外字段, 始终成功.
pub fn parse_header(header: &[u8], extended: bool) -> Result<ParsedFrameHeader, ParseError> {
    let &[_, b1, b2, b3, ..] = header else {
        return Err(ParseError::Truncated { len: header.len() });
    };

    let unk_idx = (b1 >> UNK_SHIFT) & 1;
    let version_idx = ((b1 >> VERSION_SHIFT) & 3) ^ VERSION_XOR;
    let sr_idx = (b2 >> SAMPLE_RATE_SHIFT) & 3;
    let br_idx = (b2 >> BITRATE_SHIFT) & 0xF;
    let padding_bit = u32::from((b2 >> PADDING_SHIFT) & 1);

    let sample_rate = *SAMPLE_RATE_TABLE
        .get(usize::from(version_idx))
        .ok_or(ParseError::IndexOutOfRange {
            field: "version_idx",
            value: version_idx,
        })?
        .get(usize::from(sr_idx))
        .ok_or(ParseError::IndexOutOfRange {
            field: "sr_idx",
            value: sr_idx,
        })?;

    let bitrate_row = &BITRATE_TABLE[usize::from(version_idx != 1)];
    let bitrate = bitrate_row
        .get(usize::from(br_idx))
        .ok_or(ParseError::IndexOutOfRange {
            field: "br_idx",
            value: br_idx,
        })?
        * BITRATE_UNIT;

    let frame_constant = FRAME_SIZE_TABLE[usize::from(unk_idx)];

    let parsed = ParsedFrameHeader {
        sample_rate,
        bitrate,
        num_channels: if b3 < MONO_THRESHOLD { 2 } else { 1 },
        frame_size: frame_constant * bitrate / sample_rate + padding_bit,
        samples_per_channel: frame_constant * 8,
        encoder_delay: ENCODER_DELAY,
    };

    if extended {
        // TODO: 扩展解析模式 (如 VBR 头信息) 待与真机库行为比对后补全
        trace!("扩展帧头解析: 无额外字段");
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 按逆向位布局拼出帧头字节; unk_idx 与版本位的低位重合
    fn make_header(version_bits: u8, br_idx: u8, sr_idx: u8, padding: u8, b3: u8) -> [u8; 4] {
        let b1 = 0xE2 | ((version_bits & 3) << 3);
        let b2 = (br_idx << 4) | (sr_idx << 2) | (padding << 1);
        [0xFF, b1, b2, b3]
    }

    #[test]
    fn test_版本索引异或重映射() {
        // 版本位 10 -> version_idx 0 (22050 行), unk_idx 0
        let h = parse_header(&make_header(0b10, 5, 0, 0, 0x00), false).unwrap();
        assert_eq!(h.sample_rate, 22050);
        // 版本位 11 -> version_idx 1 (44100 行), unk_idx 1
        let h = parse_header(&make_header(0b11, 5, 0, 0, 0x00), false).unwrap();
        assert_eq!(h.sample_rate, 44100);
        // 版本位 00 -> version_idx 2 (11025 行)
        let h = parse_header(&make_header(0b00, 5, 0, 0, 0x00), false).unwrap();
        assert_eq!(h.sample_rate, 11025);
    }

    #[test]
    fn test_version0_sr0_br5_场景() {
        // version_idx=0, sr_idx=0, br_idx=5, unk_idx=0, padding_bit=0
        let bytes = [0xFF, 0xF3, 0x50, 0x00];
        let h = parse_header(&bytes, false).unwrap();
        assert_eq!(h.sample_rate, 22050);
        // version_idx != 1 选中比特率表行 1
        assert_eq!(h.bitrate, 40_000);
        // 72 * 40000 / 22050 = 130
        assert_eq!(h.frame_size, 130);
        assert_eq!(h.samples_per_channel, 576);
        assert_eq!(h.num_channels, 2);
        assert_eq!(h.encoder_delay, 0);
    }

    #[test]
    fn test_mpeg1_128kbps_44100_与标准帧长一致() {
        let h = parse_header(&[0xFF, 0xFB, 0x90, 0x00], false).unwrap();
        assert_eq!(h.sample_rate, 44100);
        assert_eq!(h.bitrate, 128_000);
        assert_eq!(h.frame_size, 417);
        assert_eq!(h.samples_per_channel, 1152);
        assert_eq!(h.pcm_size(), 1152 * 2 * 2);
    }

    #[test]
    fn test_比特率取自行0() {
        // version_idx=1, br_idx=5 -> 64 kbps
        let h = parse_header(&make_header(0b11, 5, 1, 0, 0x00), false).unwrap();
        assert_eq!(h.bitrate, 64_000);
        assert_eq!(h.sample_rate, 48000);
        // 144 * 64000 / 48000 = 192
        assert_eq!(h.frame_size, 192);
    }

    #[test]
    fn test_填充位() {
        let h = parse_header(&make_header(0b11, 9, 0, 1, 0x00), false).unwrap();
        assert_eq!(h.frame_size, 418);
    }

    #[test]
    fn test_声道阈值() {
        let mono = parse_header(&[0xFF, 0xFB, 0x90, 0xFF], false).unwrap();
        assert_eq!(mono.num_channels, 1);
        let stereo = parse_header(&[0xFF, 0xFB, 0x90, 0x00], false).unwrap();
        assert_eq!(stereo.num_channels, 2);
        let edge = parse_header(&[0xFF, 0xFB, 0x90, 0xBF], false).unwrap();
        assert_eq!(edge.num_channels, 2);
        let edge = parse_header(&[0xFF, 0xFB, 0x90, 0xC0], false).unwrap();
        assert_eq!(edge.num_channels, 1);
    }

    #[test]
    fn test_帧头不足四字节() {
        assert_eq!(
            parse_header(&[0xFF, 0xFB, 0x90], false),
            Err(ParseError::Truncated { len: 3 })
        );
        assert_eq!(parse_header(&[], true), Err(ParseError::Truncated { len: 0 }));
    }

    #[test]
    fn test_越界索引被拒绝() {
        // 版本位 01 -> version_idx 3
        let err = parse_header(&make_header(0b01, 5, 0, 0, 0), false).unwrap_err();
        assert_eq!(
            err,
            ParseError::IndexOutOfRange {
                field: "version_idx",
                value: 3
            }
        );
        let err = parse_header(&make_header(0b11, 5, 3, 0, 0), false).unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfRange { field: "sr_idx", .. }));
        let err = parse_header(&make_header(0b11, 15, 0, 0, 0), false).unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfRange { field: "br_idx", .. }));
    }

    #[test]
    fn test_扩展解析模式结果一致() {
        let bytes = [0xFF, 0xFB, 0x90, 0x44];
        assert_eq!(
            parse_header(&bytes, true).unwrap(),
            parse_header(&bytes, false).unwrap()
        );
    }

    #[test]
    fn test_全部可推导组合的不变量() {
        for b1 in 0..=u8::MAX {
            for b2 in 0..=u8::MAX {
                for b3 in [0x00, 0xBF, 0xC0, 0xFF] {
                    let bytes = [0xFF, b1, b2, b3];
                    let Ok(h) = parse_header(&bytes, false) else {
                        continue;
                    };
                    // 纯函数
                    assert_eq!(parse_header(&bytes, false), Ok(h));
                    assert_eq!(h.bitrate % 1000, 0);
                    let version_idx = ((b1 >> 3) & 3) ^ 2;
                    let limit = if version_idx == 1 { 320_000 } else { 160_000 };
                    assert!(h.bitrate <= limit);
                    assert!(matches!(h.num_channels, 1 | 2));
                    assert!(h.frame_size <= 144 * 320_000 / 8000 + 1);
                }
            }
        }
    }
}
