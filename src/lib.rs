//! # xadpcm
//!
//! XA ADPCM 与 16 位 PCM WAVE 之间的离线转换库.
//!
//! XA 是一种按块组织的 ADPCM 音频流 (头部魔数 `KWD1`), 每块每声道 32 个采样,
//! 采样位深为 4、6 或 8 位, 解码时经由二阶线性预测滤波重建 16 位 PCM.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use xadpcm::convert::decode_stream;
//! use xadpcm::format::IoContext;
//!
//! let mut input = IoContext::open_read("voice.xa").unwrap();
//! let mut output = IoContext::open_write("voice.wav").unwrap();
//! let stats = decode_stream(&mut input, &mut output).unwrap();
//! println!("解码 {} 块, {} 字节 PCM", stats.blocks, stats.pcm_bytes);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `xadpcm-core` | 错误类型、字节编解码、格式描述 |
//! | `xadpcm-codec` | 块打包、预测滤波、XA 头部、解码器/编码器 |
//! | `xadpcm-format` | I/O 抽象、WAVE 头部、XA 头部流式读写 |

/// 核心类型与工具
pub use xadpcm_core as core;

/// XA 编解码器
pub use xadpcm_codec as codec;

/// 容器层
pub use xadpcm_format as format;

pub mod convert;

pub use convert::{ConvertStats, decode_stream, encode_stream};

/// 获取 xadpcm 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
