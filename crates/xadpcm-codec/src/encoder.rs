//! XA 编码器.
//!
//! 编码流程:
//! 1. `init()` 由 PCM 侧格式描述和目标位深计算 XA 流参数
//! 2. `format()` / `write_header()` 获取完整格式描述并写出 32 字节 XA 头部
//! 3. 反复调用 `encode()`, 每次处理缓冲区能容纳的整块
//!
//! 目前每个块都使用平坦 profile (无预测), 有损仅来自位深截断.
//! 写出的头部中循环点与初始预测历史恒为 0.

use log::{debug, warn};
use xadpcm_core::descriptor::pcm_block_size;
use xadpcm_core::{BLOCK_SAMPLES, FormatDescriptor, PCM_SAMPLE_BITS, XaError, XaResult};

use crate::block::{BitDepth, BlockSamples};
use crate::header::XaHeader;
use crate::predictor::PredictorState;

/// 已初始化的编码状态
#[derive(Debug, Clone)]
struct EncoderStream {
    /// 将要写出的头部
    header: XaHeader,
    /// 缓存的格式描述
    format: FormatDescriptor,
    /// 每声道预测器
    channel_state: [PredictorState; 2],
    /// 尚未编码的块数
    blocks_left: u32,
}

/// XA 编码器
#[derive(Debug, Clone, Default)]
pub struct XaEncoder {
    /// 未初始化时为 None
    stream: Option<EncoderStream>,
}

impl XaEncoder {
    /// 创建未初始化的编码器
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 PCM 格式和目标位深初始化
    ///
    /// `pcm` 只需提供声道数、采样率与 PCM 数据长度.
    /// 位深不是 4/6/8 时为用法错误, PCM 参数非法时为协议错误.
    pub fn init(&mut self, pcm: &FormatDescriptor, bits: u8) -> XaResult<()> {
        let depth = BitDepth::from_bits(bits)
            .ok_or_else(|| XaError::InvalidArgument(format!("不支持的位深: {}", bits)))?;

        let stream = build_stream(pcm, depth).inspect_err(|e| warn!("无法初始化 XA 编码器: {}", e))?;
        debug!("打开 XA 编码器: {}, {}", stream.format, depth);
        self.stream = Some(stream);
        Ok(())
    }

    fn stream(&self) -> XaResult<&EncoderStream> {
        self.stream
            .as_ref()
            .ok_or_else(|| XaError::InvalidArgument("编码器尚未初始化".into()))
    }

    /// 获取格式描述
    pub fn format(&self) -> XaResult<FormatDescriptor> {
        Ok(self.stream()?.format)
    }

    /// 获取将要写出的 XA 头部
    pub fn header(&self) -> XaResult<XaHeader> {
        Ok(self.stream()?.header)
    }

    /// 尚未编码的块数
    pub fn blocks_left(&self) -> XaResult<u32> {
        Ok(self.stream()?.blocks_left)
    }

    /// 写出 32 字节 XA 头部
    pub fn write_header(&self, dst: &mut [u8]) -> XaResult<usize> {
        self.stream()?.header.write(dst)
    }

    /// 编码尽可能多的整块
    ///
    /// `src` 为交织的 16 位 PCM 采样, 至少一个完整块 (最后一块需由调用方补零).
    /// `dst` 至少容纳一个 XA 块. 返回编码的块数.
    pub fn encode(&mut self, dst: &mut [u8], src: &[i16]) -> XaResult<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| XaError::InvalidArgument("编码器尚未初始化".into()))?;

        let fmt = stream.format;
        let pcm_block = fmt.block_samples();
        let xa_block = usize::from(fmt.block_size_xa);
        if src.len() < pcm_block {
            return Err(XaError::BufferTooSmall(format!(
                "PCM 缓冲区需要至少 {} 个采样, 实际 {} 个",
                pcm_block,
                src.len(),
            )));
        }
        if dst.len() < xa_block {
            return Err(XaError::BufferTooSmall(format!(
                "XA 缓冲区需要至少 {} 字节, 实际 {} 字节",
                xa_block,
                dst.len(),
            )));
        }
        if stream.blocks_left == 0 {
            return Err(XaError::InvalidData("已编码全部声明的块".into()));
        }

        let depth = stream.header.depth;
        let channels = usize::from(fmt.channels);
        let ch_block = usize::from(depth.block_size());
        let mut run: BlockSamples = [0; BLOCK_SAMPLES as usize];
        let mut channel_state = stream.channel_state;
        let mut blocks_left = stream.blocks_left;
        let mut blocks = 0;

        for (pcm, xa) in src
            .chunks_exact(pcm_block)
            .zip(dst.chunks_exact_mut(xa_block))
        {
            if blocks_left == 0 {
                break;
            }

            for (ch, state) in channel_state[..channels].iter_mut().enumerate() {
                for (s, &v) in run.iter_mut().zip(pcm[ch..].iter().step_by(channels)) {
                    *s = v;
                }
                let profile = state.encode_run(depth, &mut run);
                depth.deflate(profile, &run, &mut xa[ch * ch_block..])?;
            }

            blocks_left -= 1;
            blocks += 1;
        }

        stream.channel_state = channel_state;
        stream.blocks_left = blocks_left;
        Ok(blocks)
    }
}

/// 由 PCM 格式推导编码状态
fn build_stream(pcm: &FormatDescriptor, depth: BitDepth) -> XaResult<EncoderStream> {
    let channels = pcm.channels;
    if channels != 1 && channels != 2 {
        return Err(XaError::InvalidData(format!("不支持的声道数: {}", channels)));
    }
    if pcm.samples_rate == 0 {
        return Err(XaError::InvalidData("采样率为 0".into()));
    }
    if pcm.data_len_pcm == 0 {
        return Err(XaError::InvalidData("PCM 数据长度为 0".into()));
    }
    let frame = u32::from(channels) * u32::from(PCM_SAMPLE_BITS / 8);
    if pcm.data_len_pcm % frame != 0 {
        return Err(XaError::InvalidData(format!(
            "PCM 数据长度 {} 不是帧大小 {} 的整数倍",
            pcm.data_len_pcm, frame,
        )));
    }

    let block_size_pcm = pcm_block_size(channels);
    let block_size_xa = depth.block_size() * channels;
    let blocks = pcm.data_len_pcm.div_ceil(u32::from(block_size_pcm));
    let data_len = blocks
        .checked_mul(u32::from(block_size_xa))
        .ok_or_else(|| XaError::InvalidData(format!("PCM 数据过长: {} 字节", pcm.data_len_pcm)))?;

    let header = XaHeader {
        data_len,
        samples: pcm.data_len_pcm / frame,
        samples_rate: pcm.samples_rate,
        depth,
        channels,
        loop_point: 0,
        history: [[0; 2]; 2],
    };
    let format = FormatDescriptor {
        data_len_pcm: pcm.data_len_pcm,
        blocks,
        block_size_pcm,
        block_size_xa,
        samples_rate: pcm.samples_rate,
        sample_bits: PCM_SAMPLE_BITS,
        channels,
    };

    Ok(EncoderStream {
        header,
        format,
        channel_state: [PredictorState::default(); 2],
        blocks_left: blocks,
    })
}
