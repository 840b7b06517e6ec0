//! 线性预测滤波.
//!
//! 每声道维护两个历史采样, 解码时按下式逐采样重建:
//!
//! ```text
//! ranged    = raw >> range
//! predicted = (prev0 * k0 + prev1 * k1) / 256
//! sample    = clamp_i16(ranged + predicted)
//! prev1 = prev0; prev0 = sample
//! ```
//!
//! 其中 `(k0, k1)` 由 profile 高半字节从 5 组固定增益系数中选出,
//! `range` 为 profile 低半字节. 立体声的两个声道各自独立维护历史.

use std::fmt;

use xadpcm_core::{XaError, XaResult};

use crate::block::{BitDepth, BlockSamples};

/// 定点增益系数表 (除以 256)
pub const GAIN_FACTORS: [[i32; 2]; 5] = [[0, 0], [240, 0], [460, -208], [392, -220], [488, -240]];

/// 块 profile 字节
///
/// 高半字节为增益系数索引 (必须小于 5), 低半字节为采样右移量.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Profile(u8);

impl Profile {
    /// 平坦 profile: 无预测, 无移位
    pub const FLAT: Self = Self(0);

    /// 由增益索引和移位量构造
    pub fn new(factor: u8, range: u8) -> Self {
        Self((factor << 4) | (range & 0x0F))
    }

    /// 增益系数索引
    pub fn factor(self) -> u8 {
        self.0 >> 4
    }

    /// 采样右移量
    pub fn range(self) -> u8 {
        self.0 & 0x0F
    }

    /// 查找增益系数, 索引越界为协议错误
    pub fn gain(self) -> XaResult<[i32; 2]> {
        GAIN_FACTORS
            .get(usize::from(self.factor()))
            .copied()
            .ok_or_else(|| {
                XaError::InvalidData(format!(
                    "profile 0x{:02X} 的增益索引 {} 越界",
                    self.0,
                    self.factor(),
                ))
            })
    }
}

impl From<u8> for Profile {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

impl From<Profile> for u8 {
    fn from(p: Profile) -> Self {
        p.0
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// 重建单个采样
///
/// 纯函数: 相同的 `(raw, range, gain, prev)` 总是得到相同结果.
pub fn decode_sample(raw: i16, range: u8, gain: [i32; 2], prev: [i16; 2]) -> i16 {
    let ranged = i32::from(raw >> range);
    let predicted = (i32::from(prev[0]) * gain[0] + i32::from(prev[1]) * gain[1]) / 256;
    (ranged + predicted).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// 单声道预测器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PredictorState {
    /// 历史采样, 最近的在前
    pub prev: [i16; 2],
}

impl PredictorState {
    /// 以给定历史创建
    pub fn new(prev0: i16, prev1: i16) -> Self {
        Self {
            prev: [prev0, prev1],
        }
    }

    /// 推入一个新采样
    fn push(&mut self, sample: i16) {
        self.prev[1] = self.prev[0];
        self.prev[0] = sample;
    }

    /// 原地重建一个块的采样
    ///
    /// `samples` 为解包后尚未滤波的值. 若 profile 非法, 历史保持不变.
    pub fn decode_run(&mut self, profile: Profile, samples: &mut BlockSamples) -> XaResult<()> {
        let gain = profile.gain()?;
        let range = profile.range();

        for s in samples.iter_mut() {
            *s = decode_sample(*s, range, gain, self.prev);
            self.push(*s);
        }
        Ok(())
    }

    /// 为一个块选择 profile 并量化采样
    ///
    /// 目前总是使用平坦 profile: 采样仅按位深截断, 不做预测压缩.
    /// 历史按解码端将重建出的值推进, 与解码端保持一致.
    pub fn encode_run(&mut self, depth: BitDepth, samples: &mut BlockSamples) -> Profile {
        let profile = Profile::FLAT;
        for s in samples.iter_mut() {
            *s = depth.quantize(*s);
            self.push(*s);
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields() {
        let p = Profile::from(0x4C);
        assert_eq!(p.factor(), 4);
        assert_eq!(p.range(), 12);
        assert_eq!(p.gain().unwrap(), [488, -240]);
        assert_eq!(Profile::new(2, 3), Profile::from(0x23));
    }

    #[test]
    fn test_增益索引越界() {
        for v in [0x50u8, 0x9F, 0xF0] {
            assert!(Profile::from(v).gain().unwrap_err().is_protocol());
        }
    }

    #[test]
    fn test_decode_sample_is_pure() {
        let gain = GAIN_FACTORS[2];
        let a = decode_sample(0x1000, 4, gain, [1000, -500]);
        let b = decode_sample(0x1000, 4, gain, [1000, -500]);
        assert_eq!(a, b);
        // 0x1000 >> 4 = 256; (1000*460 + -500*-208) / 256 = 564000 / 256 = 2203
        assert_eq!(a, 256 + 2203);
    }

    #[test]
    fn test_arithmetic_shift_keeps_sign() {
        let v = decode_sample(0x8000u16 as i16, 12, [0, 0], [0, 0]);
        assert_eq!(v, -8);
    }

    #[test]
    fn test_truncating_division() {
        // -300 * 240 = -72000; -72000 / 256 = -281.25, 向零截断为 -281
        let v = decode_sample(0, 0, GAIN_FACTORS[1], [-300, 0]);
        assert_eq!(v, -281);
    }

    #[test]
    fn test_clamp_saturates() {
        let hi = decode_sample(0x7000, 0, GAIN_FACTORS[1], [32767, 0]);
        assert_eq!(hi, i16::MAX);
        let lo = decode_sample(0x8000u16 as i16, 0, GAIN_FACTORS[1], [-32768, 0]);
        assert_eq!(lo, i16::MIN);
    }

    #[test]
    fn test_decode_run_shifts_history() {
        let mut state = PredictorState::new(100, 50);
        let mut samples = [0i16; 32];
        samples[0] = 16;
        state.decode_run(Profile::new(1, 0), &mut samples).unwrap();
        // 第一个采样: 16 + 100*240/256 = 16 + 93
        assert_eq!(samples[0], 109);
        // 第二个采样: 0 + 109*240/256 = 102
        assert_eq!(samples[1], 102);
        assert_eq!(state.prev, [samples[31], samples[30]]);
    }

    #[test]
    fn test_invalid_profile_keeps_history() {
        let mut state = PredictorState::new(7, 9);
        let mut samples = [1i16; 32];
        assert!(state.decode_run(Profile::from(0x60), &mut samples).is_err());
        assert_eq!(state.prev, [7, 9]);
        assert!(samples.iter().all(|&s| s == 1));
    }

    #[test]
    fn test_encode_run_flat() {
        let mut state = PredictorState::default();
        let mut samples = [0x1234i16; 32];
        samples[31] = -1;
        let profile = state.encode_run(BitDepth::Four, &mut samples);
        assert_eq!(profile, Profile::FLAT);
        assert_eq!(samples[0], 0x1000);
        assert_eq!(samples[31], 0xF000u16 as i16);
        assert_eq!(state.prev, [samples[31], samples[30]]);
    }
}
