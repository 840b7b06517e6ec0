//! 流式转换驱动.
//!
//! 两个方向都分为两个阶段:
//! 1. 头部阶段: 读取并校验源头部, 推导格式描述, 然后写出目标头部.
//!    源头部校验全部完成之前不会写出任何字节.
//! 2. 块阶段: 逐块读取、编解码、写出, 直到格式描述中的块数耗尽.
//!    最后一个块的 PCM 长度按剩余长度截断 (编码时补零).
//!
//! 块阶段中输入提前结束报告为 [`XaError::Truncated`], 与协议错误区分.

use log::debug;
use xadpcm_codec::pcm::{bytes_to_samples, samples_to_bytes};
use xadpcm_codec::{BitDepth, XaDecoder, XaEncoder};
use xadpcm_core::{FormatDescriptor, XaError, XaResult};
use xadpcm_format::{IoContext, read_wav_header, read_xa_header, write_wav_header, write_xa_header};

/// 一次转换的统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// 处理的块数
    pub blocks: u32,
    /// PCM 字节数 (不含 WAVE 头部)
    pub pcm_bytes: u64,
    /// XA 字节数 (不含 XA 头部)
    pub xa_bytes: u64,
}

/// 读满一个源块, 输入结束时报告截断
fn read_block(input: &mut IoContext, buf: &mut [u8], fmt: &FormatDescriptor) -> XaResult<()> {
    input.read_exact(buf).map_err(|e| match e {
        XaError::Eof => XaError::Truncated(format!("还剩 {} 块未读取", fmt.blocks)),
        other => other,
    })
}

/// 块阶段结束时的长度一致性检查
fn check_drained(fmt: &FormatDescriptor) -> XaResult<()> {
    if fmt.data_len_pcm != 0 {
        return Err(XaError::Internal(format!(
            "块已处理完, 仍剩余 {} 字节 PCM",
            fmt.data_len_pcm
        )));
    }
    Ok(())
}

/// 单次调用必须恰好处理一个块
fn check_one_block(n: usize) -> XaResult<()> {
    if n != 1 {
        return Err(XaError::Internal(format!("期望处理 1 个块, 实际 {} 个", n)));
    }
    Ok(())
}

/// XA → WAVE
pub fn decode_stream(input: &mut IoContext, output: &mut IoContext) -> XaResult<ConvertStats> {
    let mut dec = XaDecoder::new();
    read_xa_header(input, &mut dec)?;
    let mut fmt = dec.format()?;
    write_wav_header(output, &fmt)?;
    debug!("开始解码: {}", fmt);

    let mut xa = vec![0u8; usize::from(fmt.block_size_xa)];
    let mut pcm = vec![0i16; fmt.block_samples()];
    let mut bytes = vec![0u8; usize::from(fmt.block_size_pcm)];
    let mut stats = ConvertStats::default();

    while fmt.blocks > 0 {
        read_block(input, &mut xa, &fmt)?;
        check_one_block(dec.decode(&mut pcm, &xa)?)?;

        let len = fmt.pcm_block_len(fmt.data_len_pcm);
        let out = &mut bytes[..len as usize];
        samples_to_bytes(&pcm, out)?;
        output.write_all(out)?;

        fmt.data_len_pcm -= len;
        fmt.blocks -= 1;
        stats.blocks += 1;
        stats.pcm_bytes += u64::from(len);
        stats.xa_bytes += xa.len() as u64;
    }

    check_drained(&fmt)?;
    output.flush()?;
    debug!(
        "解码完成: {} 块, pcm={} 字节, xa={} 字节",
        stats.blocks, stats.pcm_bytes, stats.xa_bytes,
    );
    Ok(stats)
}

/// WAVE → XA
///
/// `bits` 为目标位深 (4, 6 或 8), 在读取输入之前校验.
pub fn encode_stream(
    input: &mut IoContext,
    output: &mut IoContext,
    bits: u8,
) -> XaResult<ConvertStats> {
    let depth = BitDepth::from_bits(bits)
        .ok_or_else(|| XaError::InvalidArgument(format!("不支持的位深: {}", bits)))?;

    let wav = read_wav_header(input)?;
    let mut enc = XaEncoder::new();
    enc.init(&wav.to_format(), depth.bits())?;
    let mut fmt = enc.format()?;
    write_xa_header(output, &enc)?;
    debug!("开始编码: {}, {}", fmt, depth);

    let mut bytes = vec![0u8; usize::from(fmt.block_size_pcm)];
    let mut pcm = vec![0i16; fmt.block_samples()];
    let mut xa = vec![0u8; usize::from(fmt.block_size_xa)];
    let mut stats = ConvertStats::default();

    while fmt.blocks > 0 {
        let len = fmt.pcm_block_len(fmt.data_len_pcm);
        let src = &mut bytes[..len as usize];
        read_block(input, src, &fmt)?;
        // 最后一块不足时补零
        pcm.fill(0);
        bytes_to_samples(src, &mut pcm)?;
        check_one_block(enc.encode(&mut xa, &pcm)?)?;
        output.write_all(&xa)?;

        fmt.data_len_pcm -= len;
        fmt.blocks -= 1;
        stats.blocks += 1;
        stats.pcm_bytes += u64::from(len);
        stats.xa_bytes += xa.len() as u64;
    }

    check_drained(&fmt)?;
    output.flush()?;
    debug!(
        "编码完成: {} 块, pcm={} 字节, xa={} 字节",
        stats.blocks, stats.pcm_bytes, stats.xa_bytes,
    );
    Ok(stats)
}
