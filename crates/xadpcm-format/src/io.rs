//! I/O 抽象层.
//!
//! 为头部协议和转换循环提供统一的 "读满 N 字节 / 写满 N 字节" 接口,
//! 后端可以是文件、标准输入输出或内存缓冲区.

use std::io::{self, BufWriter, Read, Seek, Write};
use xadpcm_core::{XaError, XaResult};

/// I/O 上下文
///
/// 封装底层 I/O 操作, 为头部读写和块读写提供统一接口.
pub struct IoContext {
    /// 内部 I/O 实现
    inner: Box<dyn IoBackend>,
    /// 读缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的 I/O 来源 (文件、标准流、内存等).
pub trait IoBackend: Send {
    /// 读取数据到缓冲区
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 全部写入
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    /// 刷新写缓冲
    fn flush(&mut self) -> io::Result<()>;
    /// 定位 (seek)
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开 (只读)
    pub fn open_read(path: &str) -> XaResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 从文件路径打开 (写入, 截断已有内容)
    ///
    /// 写入经过缓冲, 调用 [`flush`](Self::flush) 后才保证落盘.
    pub fn open_write(path: &str) -> XaResult<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(FileWriteBackend::new(file))))
    }

    /// 从标准输入读取
    pub fn stdin() -> Self {
        Self::new(Box::new(StdinBackend))
    }

    /// 写入标准输出
    pub fn stdout() -> Self {
        Self::new(Box::new(StdoutBackend))
    }

    /// 从内存数据读取
    pub fn from_memory(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data)))
    }

    // ========================
    // 读取方法
    // ========================

    /// 读满 `buf`
    ///
    /// 数据不足时返回 [`XaError::Eof`], 此时 `buf` 的内容未定义.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> XaResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    return Err(XaError::Eof);
                }
            }
        }
        Ok(())
    }

    /// 读取剩余的全部数据
    pub fn read_to_end(&mut self) -> XaResult<Vec<u8>> {
        let mut out = self.buffer[self.buf_pos..self.buf_len].to_vec();
        self.buf_pos = self.buf_len;
        loop {
            let n = self.inner.read(&mut self.buffer)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&self.buffer[..n]);
        }
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(out)
    }

    // ========================
    // 写入方法
    // ========================

    /// 写入全部数据
    pub fn write_all(&mut self, buf: &[u8]) -> XaResult<()> {
        self.inner.write_all(buf)?;
        Ok(())
    }

    /// 刷新输出
    pub fn flush(&mut self) -> XaResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位 (seek)
    ///
    /// 注意: seek 会清空读缓冲区.
    pub fn seek(&mut self, pos: io::SeekFrom) -> XaResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }
}

/// 文件读取后端
struct FileBackend {
    file: std::fs::File,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        Self { file }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "文件以只读方式打开",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// 文件写入后端, 带写缓冲
struct FileWriteBackend {
    file: BufWriter<std::fs::File>,
}

impl FileWriteBackend {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
        }
    }
}

impl IoBackend for FileWriteBackend {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "文件以只写方式打开",
        ))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        // BufWriter 在 seek 前会先写出缓冲内容
        self.file.seek(pos)
    }
}

/// 标准输入后端
struct StdinBackend;

impl IoBackend for StdinBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }

    fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "标准输入不支持写入",
        ))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "标准输入不支持 seek",
        ))
    }
}

/// 标准输出后端
struct StdoutBackend;

impl IoBackend for StdoutBackend {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "标准输出不支持读取",
        ))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }

    fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "标准输出不支持 seek",
        ))
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建 (用于读取)
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// 创建空缓冲区 (用于写入)
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // 如果当前位置在数据末尾, 追加
        if self.pos >= self.data.len() {
            self.data.resize(self.pos, 0);
            self.data.extend_from_slice(buf);
        } else {
            // 覆盖已有数据
            let overlap = (self.data.len() - self.pos).min(buf.len());
            self.data[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
            if buf.len() > overlap {
                self.data.extend_from_slice(&buf[overlap..]);
            }
        }
        self.pos += buf.len();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }
}
