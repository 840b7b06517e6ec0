//! xadpcm - XA ADPCM 与 WAVE 互转命令行工具
//!
//! ```text
//! xadpcm decode [<xa file> [<wav file>]]
//! xadpcm encode [-b 4|6|8] [<wav file> [<xa file>]]
//! ```
//!
//! 省略文件或使用 `-` 时从标准输入读取、向标准输出写入.

mod logging;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error};

use xadpcm::format::IoContext;
use xadpcm::{ConvertStats, decode_stream, encode_stream};

#[derive(Parser, Debug)]
#[command(name = "xadpcm", version, about = "XA ADPCM 与 WAVE 互转工具")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 额外写入按天滚动的日志文件到该目录
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 读取 XA 文件并转换为 WAVE 文件
    Decode {
        /// XA 输入文件 (省略或 "-" 表示标准输入)
        input: Option<String>,
        /// WAVE 输出文件 (省略或 "-" 表示标准输出)
        output: Option<String>,
    },
    /// 读取 WAVE 文件并转换为 XA 文件
    Encode {
        /// 目标位深: 4, 6 或 8
        #[arg(short, long, default_value_t = 4)]
        bits: u8,
        /// WAVE 输入文件 (省略或 "-" 表示标准输入)
        input: Option<String>,
        /// XA 输出文件 (省略或 "-" 表示标准输出)
        output: Option<String>,
    },
}

/// "-" 与省略都表示标准流
fn file_path(path: Option<&str>) -> Option<&str> {
    path.filter(|p| *p != "-")
}

fn open_input(path: Option<&str>) -> Result<IoContext> {
    match file_path(path) {
        Some(p) => IoContext::open_read(p).with_context(|| format!("无法打开输入文件 {p}")),
        None => Ok(IoContext::stdin()),
    }
}

fn open_output(path: Option<&str>) -> Result<IoContext> {
    match file_path(path) {
        Some(p) => IoContext::open_write(p).with_context(|| format!("无法创建输出文件 {p}")),
        None => Ok(IoContext::stdout()),
    }
}

fn run(command: &Command) -> Result<ConvertStats> {
    match command {
        Command::Decode { input, output } => {
            let mut src = open_input(input.as_deref())?;
            let mut dst = open_output(output.as_deref())?;
            Ok(decode_stream(&mut src, &mut dst)?)
        }
        Command::Encode {
            bits,
            input,
            output,
        } => {
            let mut src = open_input(input.as_deref())?;
            let mut dst = open_output(output.as_deref())?;
            Ok(encode_stream(&mut src, &mut dst, *bits)?)
        }
    }
}

/// 解析命令行; 帮助与版本信息以 0 退出, 其余用法错误以 1 退出
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            process::exit(code);
        }
    }
}

fn main() {
    let cli = parse_cli();
    if let Err(e) = logging::init(cli.log_dir.as_deref(), cli.verbose) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }

    match run(&cli.command) {
        Ok(stats) => debug!(
            "完成: {} 块, pcm={} 字节, xa={} 字节",
            stats.blocks, stats.pcm_bytes, stats.xa_bytes,
        ),
        Err(e) => {
            error!("{e:#}");
            process::exit(1);
        }
    }
}
