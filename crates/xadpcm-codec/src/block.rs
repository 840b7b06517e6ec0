//! XA 块的位打包与解包.
//!
//! 每个 XA 块由 1 个 profile 字节和 32 个打包采样组成, 采样位宽为 4/6/8 位,
//! 对应载荷 16/24/32 字节. 解包 (inflate) 将每个采样左移到 16 位的最高位,
//! 打包 (deflate) 是其镜像操作.
//!
//! 本模块只处理单个声道的 32 采样, 立体声交织由解码器/编码器负责.

use std::fmt;

use xadpcm_core::{BLOCK_SAMPLES, XaError, XaResult};

use crate::predictor::Profile;

/// 单声道一个块的采样
pub type BlockSamples = [i16; BLOCK_SAMPLES as usize];

/// 采样位深
///
/// 在头部解析时选定, 之后在状态对象的整个生命周期内保持不变.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 4 位, 每字节 2 个采样
    Four,
    /// 6 位, 每 3 字节 4 个采样
    Six,
    /// 8 位, 每字节 1 个采样
    Eight,
}

impl BitDepth {
    /// 从位数构造, 仅接受 4/6/8
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            4 => Some(Self::Four),
            6 => Some(Self::Six),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    /// 每采样位数
    pub fn bits(self) -> u8 {
        match self {
            Self::Four => 4,
            Self::Six => 6,
            Self::Eight => 8,
        }
    }

    /// 单声道载荷字节数 (不含 profile 字节)
    pub fn payload_size(self) -> usize {
        usize::from(self.bits()) * BLOCK_SAMPLES as usize / 8
    }

    /// 单声道块字节数: profile 字节 + 载荷
    pub fn block_size(self) -> u8 {
        self.bits() * 4 + 1
    }

    /// 解包后采样中有效位的掩码
    pub fn sample_mask(self) -> u16 {
        match self {
            Self::Four => 0xF000,
            Self::Six => 0xFC00,
            Self::Eight => 0xFF00,
        }
    }

    /// 将采样截断到本位深可表示的值
    pub fn quantize(self, sample: i16) -> i16 {
        (sample as u16 & self.sample_mask()) as i16
    }

    /// 解包一个单声道块
    ///
    /// 返回块的 profile 字节, 采样写入 `dst`, 尚未经过预测滤波.
    pub fn inflate(self, src: &[u8], dst: &mut BlockSamples) -> XaResult<Profile> {
        let size = usize::from(self.block_size());
        if src.len() < size {
            return Err(XaError::BufferTooSmall(format!(
                "XA 块需要 {} 字节, 实际 {} 字节",
                size,
                src.len(),
            )));
        }

        let profile = Profile::from(src[0]);
        let payload = &src[1..size];

        match self {
            Self::Four => {
                for (pair, &b) in dst.chunks_exact_mut(2).zip(payload) {
                    pair[0] = (u16::from(b & 0xF0) << 8) as i16;
                    pair[1] = (u16::from(b & 0x0F) << 12) as i16;
                }
            }
            Self::Six => {
                for (quad, b) in dst.chunks_exact_mut(4).zip(payload.chunks_exact(3)) {
                    let w = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
                    quad[0] = ((w & 0x00FC_0000) >> 8) as u16 as i16;
                    quad[1] = ((w & 0x0003_F000) >> 2) as u16 as i16;
                    quad[2] = ((w & 0x0000_0FC0) << 4) as u16 as i16;
                    quad[3] = ((w & 0x0000_003F) << 10) as u16 as i16;
                }
            }
            Self::Eight => {
                for (s, &b) in dst.iter_mut().zip(payload) {
                    *s = (u16::from(b) << 8) as i16;
                }
            }
        }

        Ok(profile)
    }

    /// 打包一个单声道块
    ///
    /// 将满幅 16 位采样右移回打包位宽, 低位被丢弃.
    pub fn deflate(self, profile: Profile, src: &BlockSamples, dst: &mut [u8]) -> XaResult<()> {
        let size = usize::from(self.block_size());
        if dst.len() < size {
            return Err(XaError::BufferTooSmall(format!(
                "XA 块需要 {} 字节, 实际 {} 字节",
                size,
                dst.len(),
            )));
        }

        dst[0] = profile.into();
        let payload = &mut dst[1..size];

        match self {
            Self::Four => {
                for (b, pair) in payload.iter_mut().zip(src.chunks_exact(2)) {
                    let hi = (pair[0] as u16 >> 8) & 0x00F0;
                    let lo = (pair[1] as u16 >> 12) & 0x000F;
                    *b = (hi | lo) as u8;
                }
            }
            Self::Six => {
                for (b, quad) in payload.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                    let s = |i: usize| u32::from(quad[i] as u16 & 0xFC00);
                    let w = (s(0) << 8) | (s(1) << 2) | (s(2) >> 4) | (s(3) >> 10);
                    b[0] = (w >> 16) as u8;
                    b[1] = (w >> 8) as u8;
                    b[2] = w as u8;
                }
            }
            Self::Eight => {
                for (b, &s) in payload.iter_mut().zip(src) {
                    *b = (s as u16 >> 8) as u8;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 位", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes() {
        assert_eq!(BitDepth::Four.block_size(), 17);
        assert_eq!(BitDepth::Six.block_size(), 25);
        assert_eq!(BitDepth::Eight.block_size(), 33);
        assert_eq!(BitDepth::Four.payload_size(), 16);
        assert_eq!(BitDepth::Six.payload_size(), 24);
        assert_eq!(BitDepth::Eight.payload_size(), 32);
        assert_eq!(BitDepth::from_bits(5), None);
    }

    #[test]
    fn test_inflate_4bit_nibble_order() {
        let mut src = [0u8; 17];
        src[0] = 0x12;
        src[1] = 0x7A;
        let mut dst = [0i16; 32];
        let profile = BitDepth::Four.inflate(&src, &mut dst).unwrap();
        assert_eq!(u8::from(profile), 0x12);
        // 高半字节在前
        assert_eq!(dst[0], 0x7000);
        assert_eq!(dst[1], 0xA000u16 as i16);
        assert!(dst[2..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_inflate_6bit_window() {
        let mut src = [0u8; 25];
        // 四个 6 位字段: 0b111111, 0b000001, 0b100000, 0b010101
        let w: u32 = (0b111111 << 18) | (0b000001 << 12) | (0b100000 << 6) | 0b010101;
        src[1] = (w >> 16) as u8;
        src[2] = (w >> 8) as u8;
        src[3] = w as u8;
        let mut dst = [0i16; 32];
        BitDepth::Six.inflate(&src, &mut dst).unwrap();
        assert_eq!(dst[0], 0xFC00u16 as i16);
        assert_eq!(dst[1], 0x0400);
        assert_eq!(dst[2], 0x8000u16 as i16);
        assert_eq!(dst[3], 0x5400);
    }

    #[test]
    fn test_inflate_8bit() {
        let mut src = [0u8; 33];
        src[1] = 0x80;
        src[32] = 0x7F;
        let mut dst = [0i16; 32];
        BitDepth::Eight.inflate(&src, &mut dst).unwrap();
        assert_eq!(dst[0], i16::MIN);
        assert_eq!(dst[31], 0x7F00);
    }

    #[test]
    fn test_deflate_keeps_top_bits() {
        let mut samples = [0i16; 32];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = (i as i16 - 16).wrapping_mul(1999);
        }
        for depth in [BitDepth::Four, BitDepth::Six, BitDepth::Eight] {
            let mut block = vec![0u8; usize::from(depth.block_size())];
            depth.deflate(Profile::FLAT, &samples, &mut block).unwrap();
            assert_eq!(block[0], 0);

            let mut unpacked = [0i16; 32];
            depth.inflate(&block, &mut unpacked).unwrap();
            for (&orig, &got) in samples.iter().zip(unpacked.iter()) {
                assert_eq!(got, depth.quantize(orig), "{depth}");
            }
        }
    }

    #[test]
    fn test_short_buffer() {
        let mut dst = [0i16; 32];
        let err = BitDepth::Six.inflate(&[0u8; 24], &mut dst).unwrap_err();
        assert!(err.is_buffer());

        let mut out = [0u8; 16];
        let err = BitDepth::Four.deflate(Profile::FLAT, &dst, &mut out).unwrap_err();
        assert!(err.is_buffer());
    }
}
