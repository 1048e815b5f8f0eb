//! 时间戳常量.
//!
//! 数据包与音频帧的 PTS/DTS 以采样数为单位计数.

/// 表示"未定义"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 判断时间戳是否有效 (非 `NOPTS_VALUE`)
pub const fn is_valid(pts: i64) -> bool {
    pts != NOPTS_VALUE
}
