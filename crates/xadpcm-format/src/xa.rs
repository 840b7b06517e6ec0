//! XA 头部的流式读写.

use xadpcm_codec::{XA_HEADER_SIZE, XaDecoder, XaEncoder};
use xadpcm_core::XaResult;

use crate::io::IoContext;

/// 从 I/O 上下文读取 32 字节 XA 头部并交给解码器解析
///
/// 不足 32 字节时返回 [`XaError::Eof`](xadpcm_core::XaError::Eof).
pub fn read_xa_header(io: &mut IoContext, dec: &mut XaDecoder) -> XaResult<usize> {
    let mut buf = [0u8; XA_HEADER_SIZE];
    io.read_exact(&mut buf)?;
    dec.parse_header(&buf)
}

/// 向 I/O 上下文写出编码器的 XA 头部
pub fn write_xa_header(io: &mut IoContext, enc: &XaEncoder) -> XaResult<usize> {
    let mut buf = [0u8; XA_HEADER_SIZE];
    let n = enc.write_header(&mut buf)?;
    io.write_all(&buf[..n])?;
    Ok(n)
}
