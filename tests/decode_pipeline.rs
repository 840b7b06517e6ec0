//! 端到端集成测试: XA → WAVE 解码管线.
//!
//! 测试流程: 构造 XA 字节流 → decode_stream → 读回 WAVE 头部与 PCM → 验证

use std::io::SeekFrom;

use xadpcm::core::{XaError, XaResult};
use xadpcm::{ConvertStats, decode_stream};
use xadpcm::format::{IoContext, MemoryBackend, WAV_HEADER_SIZE, WavHeader};

/// 构造 32 字节 XA 头部
fn xa_header(data_len: u32, samples: u32, rate: u16, bits: u8, channels: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(b"KWD1");
    buf.extend_from_slice(&data_len.to_le_bytes());
    buf.extend_from_slice(&samples.to_le_bytes());
    buf.extend_from_slice(&rate.to_le_bytes());
    buf.push(bits);
    buf.push(channels);
    buf.extend_from_slice(&[0u8; 16]);
    buf
}

/// 运行解码, 返回结果和输出的全部字节
fn decode(input: Vec<u8>) -> (XaResult<ConvertStats>, Vec<u8>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut src = IoContext::from_memory(input);
    let mut dst = IoContext::new(Box::new(MemoryBackend::new()));
    let result = decode_stream(&mut src, &mut dst);
    dst.seek(SeekFrom::Start(0)).unwrap();
    (result, dst.read_to_end().unwrap())
}

fn pcm_at(out: &[u8], index: usize) -> i16 {
    let off = WAV_HEADER_SIZE + index * 2;
    i16::from_le_bytes([out[off], out[off + 1]])
}

#[test]
fn test_mono_4bit_32000_two_blocks() {
    let mut input = xa_header(34, 64, 32000, 4, 1);
    input.extend_from_slice(&[0u8; 34]);

    let (result, out) = decode(input);
    let stats = result.unwrap();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.pcm_bytes, 128);
    assert_eq!(stats.xa_bytes, 34);

    assert_eq!(out.len(), WAV_HEADER_SIZE + 128);
    let hdr = WavHeader::parse(&out).unwrap();
    assert_eq!(hdr.channels, 1);
    assert_eq!(hdr.sample_rate, 32000);
    assert_eq!(hdr.data_len, 128);
    assert_eq!(u32::from_le_bytes([out[4], out[5], out[6], out[7]]), 36 + 128);
    assert_eq!(u32::from_le_bytes([out[28], out[29], out[30], out[31]]), 64000);
}

#[test]
fn test_4bit_nibble_order() {
    let mut input = xa_header(17, 32, 8000, 4, 1);
    input.push(0x00);
    input.push(0x7F);
    input.extend_from_slice(&[0u8; 15]);

    let (result, out) = decode(input);
    result.unwrap();
    // 高半字节在前
    assert_eq!(pcm_at(&out, 0), 0x7000);
    assert_eq!(pcm_at(&out, 1), -0x1000);
    assert_eq!(pcm_at(&out, 2), 0);
}

#[test]
fn test_predictive_profile_8bit() {
    let mut input = xa_header(33, 32, 11025, 8, 1);
    // factor 1 (240, 0), range 0
    input.push(0x10);
    input.push(0x10);
    input.extend_from_slice(&[0u8; 31]);

    let (result, out) = decode(input);
    result.unwrap();
    assert_eq!(pcm_at(&out, 0), 4096);
    // 4096 * 240 / 256
    assert_eq!(pcm_at(&out, 1), 3840);
    // 3840 * 240 / 256
    assert_eq!(pcm_at(&out, 2), 3600);
}

#[test]
fn test_range_shift_is_arithmetic() {
    let mut input = xa_header(33, 32, 11025, 8, 1);
    // factor 0, range 4
    input.push(0x04);
    input.push(0x80);
    input.extend_from_slice(&[0u8; 31]);

    let (result, out) = decode(input);
    result.unwrap();
    assert_eq!(pcm_at(&out, 0), i16::MIN >> 4);
}

#[test]
fn test_stereo_6bit_partial_last_block() {
    // 2 块 × 2 声道 × 25 字节, 40 个采样 (容量 64)
    let mut input = xa_header(100, 40, 22050, 6, 2);
    let mut blocks = vec![0u8; 100];
    blocks[1] = 0x80;
    blocks[26] = 0x40;
    input.extend_from_slice(&blocks);

    let (result, out) = decode(input);
    let stats = result.unwrap();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.pcm_bytes, 40 * 2 * 2);
    assert_eq!(out.len(), WAV_HEADER_SIZE + 160);

    let hdr = WavHeader::parse(&out).unwrap();
    assert_eq!(hdr.channels, 2);
    assert_eq!(hdr.data_len, 160);
    // 左右声道交织
    assert_eq!(pcm_at(&out, 0), i16::MIN);
    assert_eq!(pcm_at(&out, 1), 0x4000);
}

#[test]
fn test_magic_flip_writes_nothing() {
    let mut input = xa_header(34, 64, 32000, 4, 1);
    input.extend_from_slice(&[0u8; 34]);
    input[0] ^= 0x01;

    let (result, out) = decode(input);
    assert!(result.unwrap_err().is_protocol());
    assert!(out.is_empty());
}

#[test]
fn test_inconsistent_samples_rejected() {
    // 容量 64, 声明 20 个采样, 多出一个块以上
    let mut input = xa_header(34, 20, 32000, 4, 1);
    input.extend_from_slice(&[0u8; 34]);
    let (result, out) = decode(input);
    assert!(result.unwrap_err().is_protocol());
    assert!(out.is_empty());
}

#[test]
fn test_truncated_block_data() {
    let mut input = xa_header(34, 64, 32000, 4, 1);
    input.extend_from_slice(&[0u8; 20]);

    let (result, out) = decode(input);
    assert!(matches!(result, Err(XaError::Truncated(_))));
    // 头部与第一个完整块已写出
    assert_eq!(out.len(), WAV_HEADER_SIZE + 64);
}

#[test]
fn test_invalid_profile_aborts() {
    let mut input = xa_header(34, 64, 32000, 4, 1);
    let mut blocks = vec![0u8; 34];
    blocks[17] = 0x50;
    input.extend_from_slice(&blocks);

    let (result, out) = decode(input);
    assert!(result.unwrap_err().is_protocol());
    assert_eq!(out.len(), WAV_HEADER_SIZE + 64);
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut input = xa_header(17, 32, 8000, 4, 1);
    input.extend_from_slice(&[0u8; 17 + 9]);
    let (result, out) = decode(input);
    assert_eq!(result.unwrap().blocks, 1);
    assert_eq!(out.len(), WAV_HEADER_SIZE + 64);
}
