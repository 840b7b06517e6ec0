//! # xadpcm-core
//!
//! xadpcm 核心库, 提供错误类型、小端字节读写和格式描述.
//!
//! 编解码器 (`xadpcm-codec`) 与容器格式 (`xadpcm-format`) 都建立在本 crate 之上.

pub mod bytes;
pub mod descriptor;
pub mod error;

// 重导出常用类型
pub use bytes::{ByteReader, ByteWriter};
pub use descriptor::{BLOCK_SAMPLES, FormatDescriptor, PCM_SAMPLE_BITS};
pub use error::{XaError, XaResult};
