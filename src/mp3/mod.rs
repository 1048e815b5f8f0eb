//! AJM MP3 解码适配.
//!
//! - [`header`]: 按逆向位布局解析帧头
//! - [`session`]: 跨调用的流式解码会话
//! - [`converter`]: 解码帧到交错 S16 的格式转换

pub mod converter;
pub mod error;
pub mod header;
pub mod session;
pub mod tables;

pub use converter::FrameConverter;
pub use error::{ConvertError, DecodeError, ParseError};
pub use header::{HEADER_SIZE, ParsedFrameHeader, parse_header};
pub use session::DecodeSession;
