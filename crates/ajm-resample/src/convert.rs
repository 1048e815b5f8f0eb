//! 采样格式与平面/交错排列转换.

use ajm_core::{AjmError, AjmResult, SampleFormat};

/// 将平面数据交错排列
///
/// `planes` 中每个平面对应一个声道, 每个平面至少包含 `nb_samples` 个采样.
pub fn interleave(
    planes: &[Vec<u8>],
    format: SampleFormat,
    nb_samples: usize,
) -> AjmResult<Vec<u8>> {
    let bps = format.bytes_per_sample() as usize;
    if bps == 0 {
        return Err(AjmError::InvalidArgument("无效的采样格式".to_string()));
    }
    let plane_len = nb_samples * bps;
    if let Some(short) = planes.iter().position(|p| p.len() < plane_len) {
        return Err(AjmError::InvalidArgument(format!(
            "声道 {short} 数据不足: 期望 {plane_len} 字节"
        )));
    }

    let mut output = Vec::with_capacity(plane_len * planes.len());
    for s in 0..nb_samples {
        let offset = s * bps;
        for plane in planes {
            output.extend_from_slice(&plane[offset..offset + bps]);
        }
    }
    Ok(output)
}

/// 采样格式转换
///
/// 将交错格式的音频数据从一种采样格式转换为另一种.
/// 内部通过归一化的 f64 中间值完成转换.
pub fn convert_samples(
    input: &[u8],
    src_format: SampleFormat,
    dst_format: SampleFormat,
    nb_samples: usize,
    channels: usize,
) -> AjmResult<Vec<u8>> {
    let total = nb_samples * channels;
    let samples = decode_samples(input, src_format, total)?;
    encode_samples(&samples, dst_format)
}

/// 将原始字节解码为归一化 f64 样本 (-1.0 ~ 1.0)
fn decode_samples(
    data: &[u8],
    format: SampleFormat,
    total_samples: usize,
) -> AjmResult<Vec<f64>> {
    let bps = format.bytes_per_sample() as usize;
    if bps == 0 {
        return Err(AjmError::InvalidArgument("无效的采样格式".to_string()));
    }
    let expected_len = total_samples * bps;
    if data.len() < expected_len {
        return Err(AjmError::InvalidArgument(format!(
            "数据不足: 期望 {expected_len} 字节, 实际 {} 字节",
            data.len()
        )));
    }

    data[..expected_len]
        .chunks_exact(bps)
        .map(|b| match format.packed() {
            SampleFormat::U8 => Ok((f64::from(b[0]) - 128.0) / 128.0),
            SampleFormat::S16 => Ok(f64::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0),
            SampleFormat::S32 => {
                Ok(f64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])) / 2_147_483_648.0)
            }
            SampleFormat::F32 => Ok(f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))),
            _ => Err(AjmError::Unsupported(format!("不支持的采样格式: {format}"))),
        })
        .collect()
}

/// 将归一化 f64 样本编码为原始字节
fn encode_samples(samples: &[f64], format: SampleFormat) -> AjmResult<Vec<u8>> {
    let mut output = Vec::with_capacity(samples.len() * format.bytes_per_sample() as usize);
    for &value in samples {
        match format.packed() {
            SampleFormat::U8 => {
                output.push(((value * 128.0) + 128.0).round().clamp(0.0, 255.0) as u8);
            }
            SampleFormat::S16 => {
                let v = (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
                output.extend_from_slice(&v.to_le_bytes());
            }
            SampleFormat::S32 => {
                let v = (value * 2_147_483_648.0)
                    .round()
                    .clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
                output.extend_from_slice(&v.to_le_bytes());
            }
            SampleFormat::F32 => {
                output.extend_from_slice(&(value as f32).to_le_bytes());
            }
            _ => {
                return Err(AjmError::Unsupported(format!("不支持的采样格式: {format}")));
            }
        }
    }
    Ok(output)
}
