//! 小端字节读写游标.
//!
//! 在平坦的字节缓冲区上按小端序读写 8/16/32 位整数, 以及匹配/写出固定的 ASCII 标签.
//! 两种容器头部 (XA 与 RIFF/WAVE) 的解析和生成都基于本模块.
//!
//! 本模块不做任何取值范围校验, 字段合法性由各头部协议负责.

use byteorder::{ByteOrder, LittleEndian};

use crate::{XaError, XaResult};

/// 字节读取游标
///
/// # 示例
/// ```
/// use xadpcm_core::ByteReader;
///
/// let data = [b'K', b'W', b'D', b'1', 0x22, 0x00, 0x00, 0x00];
/// let mut br = ByteReader::new(&data);
/// br.expect_tag(b"KWD1").unwrap();
/// assert_eq!(br.read_u32_le().unwrap(), 34);
/// assert_eq!(br.remaining(), 0);
/// ```
pub struct ByteReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前读取位置
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// 创建新的读取游标
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已读取的字节数
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可读字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 取出接下来的 `n` 个字节并前移游标
    fn take(&mut self, n: usize) -> XaResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(XaError::BufferTooSmall(format!(
                "需要 {} 字节, 剩余 {} 字节",
                n,
                self.remaining(),
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// 读取 u8
    pub fn read_u8(&mut self) -> XaResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// 读取 u16 小端
    pub fn read_u16_le(&mut self) -> XaResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    /// 读取 i16 小端
    pub fn read_i16_le(&mut self) -> XaResult<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    /// 读取 u32 小端
    pub fn read_u32_le(&mut self) -> XaResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// 匹配固定标签
    ///
    /// 标签不符属于协议错误, 此后游标视为失效, 调用方应立即放弃解析.
    pub fn expect_tag(&mut self, tag: &[u8]) -> XaResult<()> {
        let found = self.take(tag.len())?;
        if found != tag {
            return Err(XaError::InvalidData(format!(
                "标签不匹配: 期望 '{}', 实际 '{}'",
                String::from_utf8_lossy(tag),
                String::from_utf8_lossy(found),
            )));
        }
        Ok(())
    }
}

/// 字节写入游标
pub struct ByteWriter<'a> {
    /// 目标缓冲区
    data: &'a mut [u8],
    /// 当前写入位置
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// 创建新的写入游标
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已写入的字节数
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 预留接下来的 `n` 个字节并前移游标
    fn reserve(&mut self, n: usize) -> XaResult<&mut [u8]> {
        let left = self.data.len() - self.pos;
        if left < n {
            return Err(XaError::BufferTooSmall(format!(
                "需要写入 {} 字节, 剩余 {} 字节",
                n, left,
            )));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.data[start..start + n])
    }

    /// 写入 u8
    pub fn write_u8(&mut self, v: u8) -> XaResult<()> {
        self.reserve(1)?[0] = v;
        Ok(())
    }

    /// 写入 u16 小端
    pub fn write_u16_le(&mut self, v: u16) -> XaResult<()> {
        LittleEndian::write_u16(self.reserve(2)?, v);
        Ok(())
    }

    /// 写入 i16 小端
    pub fn write_i16_le(&mut self, v: i16) -> XaResult<()> {
        LittleEndian::write_i16(self.reserve(2)?, v);
        Ok(())
    }

    /// 写入 u32 小端
    pub fn write_u32_le(&mut self, v: u32) -> XaResult<()> {
        LittleEndian::write_u32(self.reserve(4)?, v);
        Ok(())
    }

    /// 写入固定标签
    pub fn put_tag(&mut self, tag: &[u8]) -> XaResult<()> {
        self.reserve(tag.len())?.copy_from_slice(tag);
        Ok(())
    }
}
