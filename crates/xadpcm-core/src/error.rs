//! 统一错误类型定义.
//!
//! 所有 xadpcm crate 共用的错误类型, 替代 errno 式的旁路错误通道.
//!
//! 错误分类:
//! - 用法错误 ([`XaError::InvalidArgument`]): 状态对象处于错误的生命周期阶段
//! - 缓冲区错误 ([`XaError::BufferTooSmall`]): 缓冲区不足一个块或头部大小
//! - 协议错误 ([`XaError::InvalidData`]): 头部字段非法、标签不匹配等
//!
//! 三类错误都不会修改调用对象的状态.

use thiserror::Error;

/// xadpcm 统一错误类型
#[derive(Debug, Error)]
pub enum XaError {
    /// 用法错误 (如尚未解析头部就请求解码)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 缓冲区过小
    #[error("缓冲区不足: {0}")]
    BufferTooSmall(String),

    /// 无效数据 (头部字段非法、profile 越界等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 声明的块数尚未处理完, 输入已结束
    #[error("输入提前结束: {0}")]
    Truncated(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl XaError {
    /// 是否为协议错误
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }

    /// 是否为缓冲区错误
    pub fn is_buffer(&self) -> bool {
        matches!(self, Self::BufferTooSmall(_))
    }

    /// 是否为用法错误
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// xadpcm 统一 Result 类型
pub type XaResult<T> = Result<T, XaError>;
