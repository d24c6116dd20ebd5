//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// 将文本隐藏在无损图像 (如 PNG, BMP) 每个 RGB 通道最低 2 位中的命令行工具。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "将文本隐藏在无损图像 (如 PNG, BMP) 每个 RGB 通道最低 2 位中的命令行工具。\n每个像素承载 6 bits，前 4 个像素保存 24 位消息长度。"
)]
pub struct Cli {
    /// 提高日志级别 (-v: info, -vv: debug)。也可以通过 RUST_LOG 设置。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 在无损格式图像中隐藏文本文件内容。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的文本。
    Recover(RecoverArgs),

    /// 报告图像可容纳的字符数，以及指定文本能否放入。
    Capacity(CapacityArgs),

    /// 比较原文与恢复出的文本，给出校验结论。
    Verify(VerifyArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文本内容的文件路径。文本中每个字符必须在 U+0000..=U+00FF 范围内。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 输出图像路径。默认为输入图像同目录下的 `doctored_<文件名>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,

    /// 将准备与嵌入信息写入 JSON 文件。
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug, Default)]
pub struct RecoverArgs {
    /// 已隐藏文本数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复文本的保存路径。默认为图像同目录下的 `recovered_<文件名>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,

    /// 将提取信息写入 JSON 文件。
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 图像数据不足以恢复完整消息时报错，而不是保存截断的文本。
    #[arg(long)]
    pub strict: bool,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 要检查的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 可选：检查该文本能否放入图像。
    #[arg(short, long)]
    pub text: Option<PathBuf>,
}

/// 'verify' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// 原始文本文件路径。
    #[arg(short, long)]
    pub original: PathBuf,

    /// 恢复出的文本文件路径。省略时使用提取记录中的 `output_file`。
    #[arg(short, long)]
    pub extracted: Option<PathBuf>,

    /// 可选：`recover --report` 生成的提取记录。
    #[arg(long)]
    pub extraction: Option<PathBuf>,

    /// 将校验报告写入 JSON 文件。
    #[arg(long)]
    pub report: Option<PathBuf>,
}
