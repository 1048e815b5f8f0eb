//! ajm-cli - AJM MP3 解码适配层命令行工具
//!
//! 模拟作业分发方: 把输入文件按固定大小分块送入解码会话, 输出原始 S16LE PCM.

mod logging;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use ajm::config::SessionConfig;
use ajm::job::{JobOutput, MultiFrameResult, StreamResult};
use ajm::mp3::{DecodeSession, ParsedFrameHeader};

#[derive(Parser, Debug)]
#[command(name = "ajm-cli", version, about = "AJM MP3 解码适配层命令行工具")]
struct Cli {
    /// 输入 MP3 文件路径
    input: String,

    /// 输出 PCM 文件路径 (S16LE 交错)
    #[arg(short, long)]
    output: Option<String>,

    /// 每次送入的输入字节数
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,

    /// 每次调用提供的输出缓冲区字节数
    #[arg(long, default_value_t = 16384)]
    output_buffer: usize,

    /// 帧头扩展解析模式
    #[arg(long)]
    extended: bool,

    /// 以 JSON 输出解码统计
    #[arg(long)]
    json: bool,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: String,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 解码统计
#[derive(Serialize)]
struct DecodeSummary {
    input_bytes: usize,
    output_bytes: u64,
    num_frames: u32,
    decoded_samples: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_header: Option<ParsedFrameHeader>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(&cli.log_dir, cli.verbose) {
        eprintln!("日志初始化失败: {e:#}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.chunk_size == 0 || cli.output_buffer == 0 {
        bail!("--chunk-size 与 --output-buffer 必须大于 0");
    }

    let input = std::fs::read(&cli.input).with_context(|| format!("读取输入失败: {}", cli.input))?;
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("创建输出失败: {path}"))?,
        )),
        None => Box::new(std::io::sink()),
    };

    let config = SessionConfig {
        extended_header_parse: cli.extended,
        ..Default::default()
    };
    let mut session = DecodeSession::new(Arc::new(ajm::default_codec_registry()), config)?;
    info!("ajm {} 开始解码: {} ({} 字节)", ajm::version(), cli.input, input.len());

    let mut multi = MultiFrameResult::default();
    let mut stream = StreamResult::default();
    let mut pcm = vec![0u8; cli.output_buffer];
    let mut output_bytes = 0u64;

    for chunk in input.chunks(cli.chunk_size) {
        let mut pos = 0;
        loop {
            let mut job = JobOutput::new()
                .with_multi_frame(&mut multi)
                .with_stream(&mut stream);
            let (in_left, out_left) = session.decode(&chunk[pos..], &mut pcm, &mut job)?;
            let written = pcm.len() - out_left;
            writer.write_all(&pcm[..written])?;
            output_bytes += written as u64;
            pos = chunk.len() - in_left;

            if in_left == 0 {
                break;
            }
            if written == 0 {
                bail!("输出缓冲区 {} 字节不足以容纳一帧 PCM", pcm.len());
            }
        }
    }
    writer.flush()?;

    if multi.num_frames != session.num_frames() {
        warn!(
            "多帧结果 {} 与会话帧数 {} 不一致",
            multi.num_frames,
            session.num_frames()
        );
    }

    let summary = DecodeSummary {
        input_bytes: input.len(),
        output_bytes,
        num_frames: session.num_frames(),
        decoded_samples: stream.total_decoded_samples,
        last_header: session.last_header(),
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "解码完成: {} 帧, {} 采样/声道, 输出 {} 字节",
            summary.num_frames, summary.decoded_samples, summary.output_bytes
        );
        if let Some(header) = summary.last_header {
            println!(
                "最后帧头: {}Hz {}bps {} 声道, 帧长 {} 字节",
                header.sample_rate, header.bitrate, header.num_channels, header.frame_size
            );
        }
    }
    Ok(())
}
