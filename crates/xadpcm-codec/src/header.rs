//! XA 流头部.
//!
//! 固定 32 字节, 小端序:
//! ```text
//! 0   magic        "KWD1"
//! 4   data_len     u32  XA 数据字节数
//! 8   samples      u32  每声道采样数
//! 12  samples_rate u16
//! 14  bits         u8   4 / 6 / 8
//! 15  channels     u8   1 / 2
//! 16  loop_point   u32  (透传, 不解释)
//! 20  ch0 prev0/prev1  i16 × 2  初始预测历史
//! 24  ch1 prev0/prev1  i16 × 2
//! 28  pad          u32
//! ```

use log::debug;
use xadpcm_core::{BLOCK_SAMPLES, ByteReader, ByteWriter, XaError, XaResult};

use crate::block::BitDepth;

/// XA 头部大小
pub const XA_HEADER_SIZE: usize = 32;

/// XA 头部魔数
pub const XA_MAGIC: &[u8; 4] = b"KWD1";

/// 协议检查: 条件不成立时返回 `InvalidData`
macro_rules! proto_check {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return Err(XaError::InvalidData(format!($($arg)+)));
        }
    };
}

/// XA 头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XaHeader {
    /// XA 数据字节数 (所有块)
    pub data_len: u32,
    /// 每声道采样数
    pub samples: u32,
    /// 采样率 (Hz)
    pub samples_rate: u16,
    /// 采样位深
    pub depth: BitDepth,
    /// 声道数
    pub channels: u8,
    /// 循环点, 仅透传
    pub loop_point: u32,
    /// 每声道初始预测历史 `[prev0, prev1]`
    pub history: [[i16; 2]; 2],
}

impl XaHeader {
    /// 解析并校验 32 字节头部
    ///
    /// 按顺序校验, 遇到第一个违规即返回协议错误:
    /// 魔数、`data_len`、`samples`、`samples_rate`、位深、声道数,
    /// 再校验块数整除关系和采样数与块容量的一致性.
    pub fn parse(src: &[u8]) -> XaResult<Self> {
        if src.len() < XA_HEADER_SIZE {
            return Err(XaError::BufferTooSmall(format!(
                "XA 头部需要 {} 字节, 实际 {} 字节",
                XA_HEADER_SIZE,
                src.len(),
            )));
        }

        let mut br = ByteReader::new(&src[..XA_HEADER_SIZE]);
        br.expect_tag(XA_MAGIC)?;
        let data_len = br.read_u32_le()?;
        let samples = br.read_u32_le()?;
        let samples_rate = br.read_u16_le()?;
        let bits = br.read_u8()?;
        let channels = br.read_u8()?;
        let loop_point = br.read_u32_le()?;
        let mut history = [[0i16; 2]; 2];
        for ch in history.iter_mut() {
            ch[0] = br.read_i16_le()?;
            ch[1] = br.read_i16_le()?;
        }
        let _pad = br.read_u32_le()?;
        debug_assert_eq!(br.position(), XA_HEADER_SIZE);

        proto_check!(data_len > 0, "data_len 为 0");
        proto_check!(samples > 0, "samples 为 0");
        proto_check!(samples_rate > 0, "采样率为 0");
        let depth = BitDepth::from_bits(bits)
            .ok_or_else(|| XaError::InvalidData(format!("不支持的位深: {}", bits)))?;
        proto_check!(channels == 1 || channels == 2, "不支持的声道数: {}", channels);

        let header = Self {
            data_len,
            samples,
            samples_rate,
            depth,
            channels,
            loop_point,
            history,
        };
        header.validate_layout()?;

        debug!(
            "XA 头部: {} Hz, {} 声道, {}, data_len={}, samples={}",
            samples_rate, channels, depth, data_len, samples,
        );
        Ok(header)
    }

    /// 校验块整除关系与采样容量
    fn validate_layout(&self) -> XaResult<()> {
        let block_size = u64::from(self.depth.block_size());
        let channels = u64::from(self.channels);
        let data_len = u64::from(self.data_len);
        let samples = u64::from(self.samples);

        proto_check!(
            data_len % block_size == 0,
            "data_len {} 不是块大小 {} 的整数倍",
            data_len,
            block_size,
        );
        proto_check!(
            data_len % (block_size * channels) == 0,
            "data_len {} 不能均分给 {} 个声道",
            data_len,
            channels,
        );

        let max_samples = u64::from(BLOCK_SAMPLES) * data_len / (block_size * channels);
        proto_check!(
            max_samples >= samples,
            "samples {} 超过块容量 {}",
            samples,
            max_samples,
        );
        proto_check!(
            max_samples - samples < u64::from(BLOCK_SAMPLES),
            "samples {} 与块容量 {} 相差超过一个块",
            samples,
            max_samples,
        );
        // 解码后 PCM 长度连同 WAVE 头部须能用 u32 表示
        proto_check!(
            samples * channels * 2 + 36 <= u64::from(u32::MAX),
            "samples {} 对应的 PCM 数据过长",
            samples,
        );
        Ok(())
    }

    /// 单声道块字节数
    pub fn block_size(&self) -> u8 {
        self.depth.block_size()
    }

    /// 块数 (每块含所有声道)
    pub fn blocks(&self) -> u32 {
        self.data_len / (u32::from(self.block_size()) * u32::from(self.channels))
    }

    /// 写出 32 字节头部
    pub fn write(&self, dst: &mut [u8]) -> XaResult<usize> {
        if dst.len() < XA_HEADER_SIZE {
            return Err(XaError::BufferTooSmall(format!(
                "XA 头部需要 {} 字节, 实际 {} 字节",
                XA_HEADER_SIZE,
                dst.len(),
            )));
        }

        let mut bw = ByteWriter::new(&mut dst[..XA_HEADER_SIZE]);
        bw.put_tag(XA_MAGIC)?;
        bw.write_u32_le(self.data_len)?;
        bw.write_u32_le(self.samples)?;
        bw.write_u16_le(self.samples_rate)?;
        bw.write_u8(self.depth.bits())?;
        bw.write_u8(self.channels)?;
        bw.write_u32_le(self.loop_point)?;
        for ch in &self.history {
            bw.write_i16_le(ch[0])?;
            bw.write_i16_le(ch[1])?;
        }
        bw.write_u32_le(0)?;
        debug_assert_eq!(bw.position(), XA_HEADER_SIZE);

        Ok(XA_HEADER_SIZE)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构造原始头部字节
    pub(crate) fn raw_header(data_len: u32, samples: u32, rate: u16, bits: u8, ch: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(XA_HEADER_SIZE);
        buf.extend_from_slice(XA_MAGIC);
        buf.extend_from_slice(&data_len.to_le_bytes());
        buf.extend_from_slice(&samples.to_le_bytes());
        buf.extend_from_slice(&rate.to_le_bytes());
        buf.push(bits);
        buf.push(ch);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf
    }

    #[test]
    fn test_parse_mono_4bit() {
        let buf = raw_header(34, 64, 32000, 4, 1);
        let hdr = XaHeader::parse(&buf).unwrap();
        assert_eq!(hdr.depth, BitDepth::Four);
        assert_eq!(hdr.block_size(), 17);
        assert_eq!(hdr.blocks(), 2);
        assert_eq!(hdr.samples_rate, 32000);
    }

    #[test]
    fn test_parse_history_and_loop_point() {
        let mut buf = raw_header(50, 64, 22050, 6, 1);
        buf[16..20].copy_from_slice(&1234u32.to_le_bytes());
        buf[20..22].copy_from_slice(&(-5i16).to_le_bytes());
        buf[22..24].copy_from_slice(&7i16.to_le_bytes());
        buf[24..26].copy_from_slice(&100i16.to_le_bytes());
        buf[26..28].copy_from_slice(&(-100i16).to_le_bytes());
        let hdr = XaHeader::parse(&buf).unwrap();
        assert_eq!(hdr.loop_point, 1234);
        assert_eq!(hdr.history, [[-5, 7], [100, -100]]);
    }

    #[test]
    fn test_短缓冲区() {
        let buf = raw_header(34, 64, 32000, 4, 1);
        assert!(XaHeader::parse(&buf[..31]).unwrap_err().is_buffer());
    }

    #[test]
    fn test_rejects_bad_fields() {
        let cases = [
            raw_header(0, 64, 32000, 4, 1),
            raw_header(34, 0, 32000, 4, 1),
            raw_header(34, 64, 0, 4, 1),
            raw_header(34, 64, 32000, 5, 1),
            raw_header(34, 64, 32000, 4, 3),
            // 不能整除块大小
            raw_header(35, 64, 32000, 4, 1),
            // 采样数超出容量
            raw_header(34, 65, 32000, 4, 1),
            // 采样数比容量少一个块以上
            raw_header(34, 32, 32000, 4, 1),
            // 立体声时块数必须成对
            raw_header(51, 32, 32000, 4, 2),
        ];
        for buf in cases {
            let err = XaHeader::parse(&buf).unwrap_err();
            assert!(err.is_protocol(), "{err}");
        }
    }

    #[test]
    fn test_magic_mismatch() {
        let mut buf = raw_header(34, 64, 32000, 4, 1);
        buf[0] ^= 0xFF;
        assert!(XaHeader::parse(&buf).unwrap_err().is_protocol());
    }

    #[test]
    fn test_partial_last_block_accepted() {
        // 容量 64, 实际 33 采样 (差 31 < 32)
        let hdr = XaHeader::parse(&raw_header(34, 33, 8000, 4, 1)).unwrap();
        assert_eq!(hdr.blocks(), 2);
    }

    #[test]
    fn test_write_then_parse() {
        let hdr = XaHeader {
            data_len: 132,
            samples: 60,
            samples_rate: 44100,
            depth: BitDepth::Eight,
            channels: 2,
            loop_point: 0,
            history: [[0; 2]; 2],
        };
        let mut buf = [0u8; XA_HEADER_SIZE];
        assert_eq!(hdr.write(&mut buf).unwrap(), XA_HEADER_SIZE);
        assert_eq!(&buf[..4], b"KWD1");
        assert_eq!(XaHeader::parse(&buf).unwrap(), hdr);
        assert_eq!(hdr.blocks(), 2);
    }
}
