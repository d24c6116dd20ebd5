//! # 错误类型模块
//!
//! 隐写核心与 I/O 协作者返回的所有结构化错误。
//! 命令处理层 (`handler`) 在此基础上使用 `anyhow` 附加路径等上下文。

use std::path::PathBuf;
use thiserror::Error;

/// 隐写操作的错误分类。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 图像容量不足。在修改任何像素之前检测。
    #[error("insufficient capacity: {needed} pixels required, {available} available")]
    InsufficientCapacity { needed: usize, available: usize },

    /// 像素缓冲区不足以容纳 4 像素的长度头部。
    #[error("invalid header: buffer holds {pixels} pixels, at least {required} required")]
    InvalidHeader { pixels: usize, required: usize },

    /// 头部解码出的长度为 0 或超过上限，图像很可能不含隐藏信息。
    #[error("invalid message length {length} (expected 1..={max})")]
    InvalidLength { length: usize, max: usize },

    /// 像素在读满声明的比特数之前耗尽。
    #[error("truncated extraction: read {bits_read} of {bits_needed} bits")]
    TruncatedExtraction { bits_read: usize, bits_needed: usize },

    /// 长度无法用 24 位头部表示。
    #[error("length {length} does not fit in the {bits}-bit header")]
    HeaderOverflow { length: usize, bits: usize },

    #[error("message is empty")]
    EmptyMessage,

    #[error("message has {length} characters, the header can describe at most {max}")]
    MessageTooLong { length: usize, max: usize },

    /// 字符超出单字节编码范围 (U+0000..=U+00FF)。
    #[error("character {ch:?} at index {index} cannot be encoded in a single byte")]
    UnencodableCharacter { ch: char, index: usize },

    #[error("invalid pixel buffer dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("image I/O failed for {path}: {source}")]
    ImageIo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("text I/O failed for {path}: {source}")]
    TextIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StegoError>;
