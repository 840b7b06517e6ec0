//! 16 位 PCM 采样与小端字节之间的转换.
//!
//! 长度以字节计, 必须为非零偶数. 允许只转换缓冲区的前一部分,
//! 用于写出被截断的最后一个块.

use byteorder::{ByteOrder, LittleEndian};
use xadpcm_core::{XaError, XaResult};

fn check_len(len: usize, capacity: usize) -> XaResult<()> {
    if len == 0 || len % 2 != 0 {
        return Err(XaError::BufferTooSmall(format!(
            "PCM 字节数必须为非零偶数, 实际 {}",
            len
        )));
    }
    if len > capacity * 2 {
        return Err(XaError::BufferTooSmall(format!(
            "PCM 字节数 {} 超过 {} 个采样",
            len, capacity,
        )));
    }
    Ok(())
}

/// 将采样写为小端字节, 写满 `dst`
///
/// 返回写出的字节数.
pub fn samples_to_bytes(src: &[i16], dst: &mut [u8]) -> XaResult<usize> {
    check_len(dst.len(), src.len())?;
    LittleEndian::write_i16_into(&src[..dst.len() / 2], dst);
    Ok(dst.len())
}

/// 将 `src` 中的小端字节读为采样
///
/// 返回读取的采样数.
pub fn bytes_to_samples(src: &[u8], dst: &mut [i16]) -> XaResult<usize> {
    check_len(src.len(), dst.len())?;
    let count = src.len() / 2;
    LittleEndian::read_i16_into(src, &mut dst[..count]);
    Ok(count)
}
