//! 日志初始化模块.
//!
//! 文件级别默认 info, 可通过 -v/-vv 或 AJM_LOG 环境变量调整.
//! 日志文件输出到 `{log_dir}/ajm-cli.{date}.log`.

use ajm::logging::{self, LoggingConfig};

/// 按命令行冗余级别选择日志级别, AJM_LOG 优先
fn level_for(verbosity: u8, env_override: Option<String>) -> String {
    if let Some(level) = env_override.filter(|v| !v.trim().is_empty()) {
        return level;
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
    .to_string()
}

/// 初始化日志系统
pub fn init(log_dir: &str, verbosity: u8) -> anyhow::Result<()> {
    let config = LoggingConfig {
        level: level_for(verbosity, std::env::var("AJM_LOG").ok()),
        directory: log_dir.to_string(),
        file_prefix: "ajm-cli".to_string(),
        ..Default::default()
    };
    logging::init(config)
}
