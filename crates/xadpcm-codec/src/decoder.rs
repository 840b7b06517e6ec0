//! XA 解码器.
//!
//! 解码流程:
//! 1. `parse_header()` 解析并校验 32 字节头部, 选定位深
//! 2. `format()` 获取格式描述, 据此分配一个块大小的缓冲区
//! 3. 反复调用 `decode()`, 每次处理缓冲区能容纳的整块
//!
//! 头部解析在候选值上完成全部校验后才整体替换解码器状态,
//! 失败时解码器保持上一次的有效状态.

use log::{debug, warn};
use xadpcm_core::{BLOCK_SAMPLES, FormatDescriptor, PCM_SAMPLE_BITS, XaError, XaResult};

use crate::block::{BitDepth, BlockSamples};
use crate::header::{XA_HEADER_SIZE, XaHeader};
use crate::predictor::PredictorState;

/// 已绑定头部的解码状态
#[derive(Debug, Clone)]
struct DecoderStream {
    /// 解析得到的头部
    header: XaHeader,
    /// 缓存的格式描述
    format: FormatDescriptor,
    /// 每声道预测器
    channel_state: [PredictorState; 2],
    /// 尚未解码的块数
    blocks_left: u32,
}

/// XA 解码器
#[derive(Debug, Clone, Default)]
pub struct XaDecoder {
    /// 未解析头部时为 None
    stream: Option<DecoderStream>,
}

impl XaDecoder {
    /// 创建尚未绑定头部的解码器
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 XA 头部, 返回消耗的字节数
    pub fn parse_header(&mut self, src: &[u8]) -> XaResult<usize> {
        let header = XaHeader::parse(src).inspect_err(|e| warn!("XA 头部无效: {}", e))?;

        let format = derive_format(&header);
        let [ch0, ch1] = header.history;
        let stream = DecoderStream {
            header,
            format,
            channel_state: [
                PredictorState::new(ch0[0], ch0[1]),
                PredictorState::new(ch1[0], ch1[1]),
            ],
            blocks_left: format.blocks,
        };

        debug!("打开 XA 解码器: {}", format);
        self.stream = Some(stream);
        Ok(XA_HEADER_SIZE)
    }

    fn stream(&self) -> XaResult<&DecoderStream> {
        self.stream
            .as_ref()
            .ok_or_else(|| XaError::InvalidArgument("解码器尚未解析 XA 头部".into()))
    }

    /// 获取格式描述
    pub fn format(&self) -> XaResult<FormatDescriptor> {
        Ok(self.stream()?.format)
    }

    /// 获取已解析的头部
    pub fn header(&self) -> XaResult<&XaHeader> {
        Ok(&self.stream()?.header)
    }

    /// 绑定的位深
    pub fn bit_depth(&self) -> XaResult<BitDepth> {
        Ok(self.stream()?.header.depth)
    }

    /// 头部中的循环点 (不参与解码)
    pub fn loop_point(&self) -> XaResult<u32> {
        Ok(self.stream()?.header.loop_point)
    }

    /// 尚未解码的块数
    pub fn blocks_left(&self) -> XaResult<u32> {
        Ok(self.stream()?.blocks_left)
    }

    /// 指定声道的预测器状态
    pub fn predictor(&self, channel: usize) -> XaResult<PredictorState> {
        let stream = self.stream()?;
        if channel >= usize::from(stream.header.channels) {
            return Err(XaError::InvalidArgument(format!("声道 {} 不存在", channel)));
        }
        Ok(stream.channel_state[channel])
    }

    /// 解码尽可能多的整块
    ///
    /// `dst` 接收交织的 16 位 PCM 采样, `src` 为连续的 XA 块.
    /// 两者至少要容纳一个块, 否则返回缓冲区错误且不消耗任何输入.
    /// 返回解码的块数.
    pub fn decode(&mut self, dst: &mut [i16], src: &[u8]) -> XaResult<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| XaError::InvalidArgument("解码器尚未解析 XA 头部".into()))?;

        let fmt = stream.format;
        let pcm_block = fmt.block_samples();
        let xa_block = usize::from(fmt.block_size_xa);
        if dst.len() < pcm_block {
            return Err(XaError::BufferTooSmall(format!(
                "PCM 缓冲区需要至少 {} 个采样, 实际 {} 个",
                pcm_block,
                dst.len(),
            )));
        }
        if src.len() < xa_block {
            return Err(XaError::BufferTooSmall(format!(
                "XA 缓冲区需要至少 {} 字节, 实际 {} 字节",
                xa_block,
                src.len(),
            )));
        }
        if stream.blocks_left == 0 {
            return Err(XaError::InvalidData("已解码全部声明的块".into()));
        }

        let depth = stream.header.depth;
        let channels = usize::from(fmt.channels);
        let ch_block = usize::from(depth.block_size());
        let mut run: BlockSamples = [0; BLOCK_SAMPLES as usize];
        // 在副本上推进预测器, 整个调用成功后才提交
        let mut channel_state = stream.channel_state;
        let mut blocks_left = stream.blocks_left;
        let mut blocks = 0;

        for (pcm, xa) in dst
            .chunks_exact_mut(pcm_block)
            .zip(src.chunks_exact(xa_block))
        {
            if blocks_left == 0 {
                break;
            }

            for (ch, state) in channel_state[..channels].iter_mut().enumerate() {
                let profile = depth.inflate(&xa[ch * ch_block..], &mut run)?;
                state.decode_run(profile, &mut run)?;
                for (out, &s) in pcm[ch..].iter_mut().step_by(channels).zip(run.iter()) {
                    *out = s;
                }
            }

            blocks_left -= 1;
            blocks += 1;
        }

        stream.channel_state = channel_state;
        stream.blocks_left = blocks_left;
        Ok(blocks)
    }
}

/// 由 XA 头部推导格式描述
fn derive_format(header: &XaHeader) -> FormatDescriptor {
    let channels = header.channels;
    let block_size_xa = header.block_size() * channels;
    FormatDescriptor {
        data_len_pcm: header.samples * u32::from(channels) * u32::from(PCM_SAMPLE_BITS / 8),
        blocks: header.data_len / u32::from(block_size_xa),
        block_size_pcm: xadpcm_core::descriptor::pcm_block_size(channels),
        block_size_xa,
        samples_rate: header.samples_rate,
        sample_bits: PCM_SAMPLE_BITS,
        channels,
    }
}
