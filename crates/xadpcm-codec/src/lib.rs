//! # xadpcm-codec
//!
//! XA ADPCM 编解码器库.
//!
//! - [`block`]: 4/6/8 位采样的块打包与解包
//! - [`predictor`]: 每声道线性预测滤波
//! - [`header`]: 32 字节 XA 流头部
//! - [`decoder`] / [`encoder`]: 持有预测器状态的解码器与编码器
//! - [`pcm`]: 16 位 PCM 采样与小端字节的转换

pub mod block;
pub mod decoder;
pub mod encoder;
pub mod header;
pub mod pcm;
pub mod predictor;

// 重导出常用类型
pub use block::BitDepth;
pub use decoder::XaDecoder;
pub use encoder::XaEncoder;
pub use header::{XA_HEADER_SIZE, XaHeader};
pub use predictor::{PredictorState, Profile};
