//! # xadpcm-format
//!
//! 容器层: I/O 抽象、WAVE 头部协议以及 XA 头部的流式读写.

pub mod io;
pub mod wav;
pub mod xa;

pub use io::{IoBackend, IoContext, MemoryBackend};
pub use wav::{
    WAV_HEADER_SIZE, WavHeader, read_wav_header, write_format, write_riff_header,
    write_wav_header,
};
pub use xa::{read_xa_header, write_xa_header};
