//! WAVE 头部协议.
//!
//! 只支持规范的 44 字节线性 PCM 头部:
//! `RIFF` + size + `WAVEfmt ` + 16 字节 fmt 子块 + `data` + data_len.
//! 写出时所有字段都由格式描述重新计算, 不信任输入中的字节率.

use log::{debug, warn};
use xadpcm_codec::XaDecoder;
use xadpcm_core::{ByteReader, ByteWriter, FormatDescriptor, PCM_SAMPLE_BITS, XaError, XaResult};

use crate::io::IoContext;

/// WAVE 头部大小
pub const WAV_HEADER_SIZE: usize = 44;

/// fmt 子块长度
const FMT_CHUNK_LEN: u32 = 16;

/// 线性 PCM 格式码
const WAVE_FORMAT_PCM: u16 = 1;

/// WAVE 头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// 声道数
    pub channels: u8,
    /// 采样率 (Hz)
    pub sample_rate: u16,
    /// PCM 数据字节数
    pub data_len: u32,
}

impl WavHeader {
    /// 解析并校验 44 字节头部
    pub fn parse(src: &[u8]) -> XaResult<Self> {
        if src.len() < WAV_HEADER_SIZE {
            return Err(XaError::BufferTooSmall(format!(
                "WAVE 头部需要 {} 字节, 实际 {} 字节",
                WAV_HEADER_SIZE,
                src.len(),
            )));
        }

        let mut br = ByteReader::new(&src[..WAV_HEADER_SIZE]);
        br.expect_tag(b"RIFF")?;
        let riff_size = br.read_u32_le()?;
        br.expect_tag(b"WAVEfmt ")?;

        let fmt_len = br.read_u32_le()?;
        if fmt_len != FMT_CHUNK_LEN {
            return Err(XaError::InvalidData(format!("fmt 子块长度 {} 不是 16", fmt_len)));
        }
        let format_code = br.read_u16_le()?;
        if format_code != WAVE_FORMAT_PCM {
            return Err(XaError::InvalidData(format!(
                "不支持的 WAVE 格式码: {}",
                format_code
            )));
        }
        let channels = br.read_u16_le()?;
        if channels != 1 && channels != 2 {
            return Err(XaError::InvalidData(format!("不支持的声道数: {}", channels)));
        }
        let sample_rate = br.read_u32_le()?;
        let sample_rate = u16::try_from(sample_rate)
            .ok()
            .filter(|&r| r > 0)
            .ok_or_else(|| XaError::InvalidData(format!("采样率超出范围: {}", sample_rate)))?;
        let byte_rate = br.read_u32_le()?;
        let block_align = br.read_u16_le()?;
        let expected_align = channels * u16::from(PCM_SAMPLE_BITS / 8);
        if block_align != expected_align {
            return Err(XaError::InvalidData(format!(
                "块对齐 {} 与声道数不符, 应为 {}",
                block_align, expected_align,
            )));
        }
        let expected_rate = u32::from(sample_rate) * u32::from(block_align);
        if byte_rate != expected_rate {
            return Err(XaError::InvalidData(format!(
                "字节率 {} 不一致, 应为 {}",
                byte_rate, expected_rate,
            )));
        }
        let bits = br.read_u16_le()?;
        if bits != u16::from(PCM_SAMPLE_BITS) {
            return Err(XaError::InvalidData(format!("不支持的采样位数: {}", bits)));
        }

        br.expect_tag(b"data")?;
        let data_len = br.read_u32_le()?;
        // RIFF 大小须覆盖头部其余部分与全部数据
        let min_size = u64::from(data_len) + (WAV_HEADER_SIZE as u64 - 8);
        if u64::from(riff_size) < min_size {
            return Err(XaError::InvalidData(format!(
                "RIFF 大小 {} 小于头部与数据所需的 {}",
                riff_size, min_size,
            )));
        }
        if data_len == 0 || data_len % u32::from(block_align) != 0 {
            return Err(XaError::InvalidData(format!(
                "data 长度 {} 不是块对齐 {} 的正整数倍",
                data_len, block_align,
            )));
        }

        debug!(
            "WAVE 头部: {} Hz, {} 声道, data_len={}",
            sample_rate, channels, data_len,
        );

        Ok(Self {
            // 已校验为 1 或 2
            channels: channels as u8,
            sample_rate,
            data_len,
        })
    }

    /// 由格式描述构造头部
    pub fn from_format(fmt: &FormatDescriptor) -> Self {
        Self {
            channels: fmt.channels,
            sample_rate: fmt.samples_rate,
            data_len: fmt.data_len_pcm,
        }
    }

    /// 转换为 PCM 侧格式描述
    pub fn to_format(&self) -> FormatDescriptor {
        FormatDescriptor::pcm(self.channels, self.sample_rate, self.data_len)
    }

    /// 写出 44 字节头部
    pub fn write(&self, dst: &mut [u8]) -> XaResult<usize> {
        write_format(&self.to_format(), dst)
    }
}

/// 按格式描述写出 44 字节头部
///
/// 字节率由采样率和每块 PCM 大小重新计算.
pub fn write_format(fmt: &FormatDescriptor, dst: &mut [u8]) -> XaResult<usize> {
    if dst.len() < WAV_HEADER_SIZE {
        return Err(XaError::BufferTooSmall(format!(
            "WAVE 头部需要 {} 字节, 实际 {} 字节",
            WAV_HEADER_SIZE,
            dst.len(),
        )));
    }
    let riff_size = fmt
        .data_len_pcm
        .checked_add(WAV_HEADER_SIZE as u32 - 8)
        .ok_or_else(|| XaError::InvalidData(format!("PCM 数据过长: {} 字节", fmt.data_len_pcm)))?;

    let mut bw = ByteWriter::new(&mut dst[..WAV_HEADER_SIZE]);
    bw.put_tag(b"RIFF")?;
    bw.write_u32_le(riff_size)?;
    bw.put_tag(b"WAVEfmt ")?;
    bw.write_u32_le(FMT_CHUNK_LEN)?;
    bw.write_u16_le(WAVE_FORMAT_PCM)?;
    bw.write_u16_le(u16::from(fmt.channels))?;
    bw.write_u32_le(u32::from(fmt.samples_rate))?;
    bw.write_u32_le(fmt.byte_rate())?;
    bw.write_u16_le(fmt.block_align())?;
    bw.write_u16_le(u16::from(fmt.sample_bits))?;
    bw.put_tag(b"data")?;
    bw.write_u32_le(fmt.data_len_pcm)?;
    debug_assert_eq!(bw.position(), WAV_HEADER_SIZE);

    Ok(WAV_HEADER_SIZE)
}

/// 按解码器的格式描述写出 WAVE 头部
pub fn write_riff_header(dec: &XaDecoder, dst: &mut [u8]) -> XaResult<usize> {
    write_format(&dec.format()?, dst)
}

/// 从 I/O 上下文读取并校验 WAVE 头部
pub fn read_wav_header(io: &mut IoContext) -> XaResult<WavHeader> {
    let mut buf = [0u8; WAV_HEADER_SIZE];
    io.read_exact(&mut buf)?;
    WavHeader::parse(&buf).inspect_err(|e| warn!("WAVE 头部无效: {}", e))
}

/// 向 I/O 上下文写出 WAVE 头部
pub fn write_wav_header(io: &mut IoContext, fmt: &FormatDescriptor) -> XaResult<()> {
    let mut buf = [0u8; WAV_HEADER_SIZE];
    write_format(fmt, &mut buf)?;
    io.write_all(&buf)
}
