//! 从 AJM 库逆向得到的常量表.
//!
//! 表的行列索引由 [`super::header`] 中的位提取规则给出, 与标准 MPEG 音频表的
//! 排列不同 (版本索引经过 XOR 2 重映射). 数值保持逆向结果的原样, 不做整理.

/// 采样率表 (Hz), `[version_idx][sr_idx]`
///
/// 行 0 对应 MPEG-2, 行 1 对应 MPEG-1, 行 2 对应 MPEG-2.5.
pub const SAMPLE_RATE_TABLE: [[u32; 3]; 3] = [
    [0x5622, 0x5DC0, 0x3E80], // 22050, 24000, 16000
    [0xAC44, 0xBB80, 0x7D00], // 44100, 48000, 32000
    [0x2B11, 0x2EE0, 0x1F40], // 11025, 12000, 8000
];

/// 比特率表 (kbps), `[(version_idx != 1) as usize][br_idx]`
pub const BITRATE_TABLE: [[u32; 15]; 2] = [
    [
        0, 0x20, 0x28, 0x30, 0x38, 0x40, 0x50, 0x60, 0x70, 0x80, 0xA0, 0xC0, 0xE0, 0x100, 0x140,
    ],
    [
        0, 0x8, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0x40, 0x50, 0x60, 0x70, 0x80, 0x90, 0xA0,
    ],
];

/// 帧长换算常数, `[unk_idx]`
///
/// 逆向时含义未确认, 同时用于帧长与每声道采样数 (乘 8) 的推导.
pub const FRAME_SIZE_TABLE: [u32; 2] = [0x48, 0x90];

/// 比特率表单位换算 (kbps -> bps)
pub const BITRATE_UNIT: u32 = 1000;
