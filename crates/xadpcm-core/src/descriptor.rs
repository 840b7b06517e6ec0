//! 格式描述.
//!
//! 由头部协议推导出的权威记录, 描述块大小、块数与 PCM 剩余长度, 驱动流式转换循环.

use std::fmt;

/// 每个块中每声道的采样数
pub const BLOCK_SAMPLES: u32 = 32;

/// PCM 侧每个采样的位数 (仅支持 16 位)
pub const PCM_SAMPLE_BITS: u8 = 16;

/// 格式描述
///
/// 不变量: `blocks * block_size_xa == data_len_xa()`. 最后一个块贡献的 PCM 字节数
/// 可以小于 `block_size_pcm`, 但所有块的贡献之和恰好等于 `data_len_pcm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatDescriptor {
    /// PCM 数据总字节数 (在转换循环中作为剩余长度递减)
    pub data_len_pcm: u32,
    /// XA 块数
    pub blocks: u32,
    /// 每块 PCM 字节数 (所有声道)
    pub block_size_pcm: u8,
    /// 每块 XA 字节数 (所有声道, 含 profile 字节)
    pub block_size_xa: u8,
    /// 采样率 (Hz)
    pub samples_rate: u16,
    /// PCM 采样位数, 恒为 16
    pub sample_bits: u8,
    /// 声道数 (1 或 2)
    pub channels: u8,
}

impl FormatDescriptor {
    /// 创建仅包含 PCM 侧信息的描述
    ///
    /// XA 侧字段 (`blocks`, `block_size_xa`) 为 0, 由编码器选定位深后补全.
    pub fn pcm(channels: u8, samples_rate: u16, data_len_pcm: u32) -> Self {
        Self {
            data_len_pcm,
            blocks: 0,
            block_size_pcm: pcm_block_size(channels),
            block_size_xa: 0,
            samples_rate,
            sample_bits: PCM_SAMPLE_BITS,
            channels,
        }
    }

    /// XA 数据总字节数
    pub fn data_len_xa(&self) -> u32 {
        self.blocks * u32::from(self.block_size_xa)
    }

    /// 每声道采样数
    pub fn samples(&self) -> u32 {
        let frame = u32::from(self.channels) * u32::from(self.sample_bits / 8);
        if frame == 0 {
            return 0;
        }
        self.data_len_pcm / frame
    }

    /// WAVE 块对齐 (每个采样帧的字节数)
    pub fn block_align(&self) -> u16 {
        u16::from(self.channels) * u16::from(self.sample_bits / 8)
    }

    /// WAVE 字节率, 由采样率和每块 PCM 大小重新计算
    pub fn byte_rate(&self) -> u32 {
        u32::from(self.samples_rate) * u32::from(self.block_size_pcm) / BLOCK_SAMPLES
    }

    /// 本块实际贡献的 PCM 字节数 (不超过剩余长度)
    pub fn pcm_block_len(&self, remaining: u32) -> u32 {
        remaining.min(u32::from(self.block_size_pcm))
    }

    /// 每块每声道采样数对应的交织采样总数
    pub fn block_samples(&self) -> usize {
        BLOCK_SAMPLES as usize * usize::from(self.channels)
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} 声道, {} 块, pcm={} 字节",
            self.samples_rate, self.channels, self.blocks, self.data_len_pcm,
        )
    }
}

/// 每块 PCM 字节数: 32 采样 × 声道数 × 2 字节
///
/// 声道数只能是 1 或 2, 超出 u8 范围时饱和.
pub fn pcm_block_size(channels: u8) -> u8 {
    let size = BLOCK_SAMPLES * u32::from(channels) * u32::from(PCM_SAMPLE_BITS / 8);
    u8::try_from(size).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_descriptor() {
        let fmt = FormatDescriptor::pcm(2, 22050, 1000);
        assert_eq!(fmt.block_size_pcm, 128);
        assert_eq!(fmt.block_align(), 4);
        assert_eq!(fmt.samples(), 250);
        assert_eq!(fmt.byte_rate(), 22050 * 4);
        assert_eq!(fmt.blocks, 0);
        assert_eq!(fmt.block_samples(), 64);
    }

    #[test]
    fn test_最后一块截断() {
        let fmt = FormatDescriptor::pcm(1, 32000, 100);
        assert_eq!(fmt.pcm_block_len(100), 64);
        assert_eq!(fmt.pcm_block_len(36), 36);
        assert_eq!(fmt.pcm_block_len(0), 0);
    }

    #[test]
    fn test_data_len_xa() {
        let fmt = FormatDescriptor {
            blocks: 3,
            block_size_xa: 34,
            ..FormatDescriptor::pcm(2, 44100, 384)
        };
        assert_eq!(fmt.data_len_xa(), 102);
    }
}
