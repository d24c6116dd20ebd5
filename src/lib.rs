//! # sixbit_hide 库
//!
//! 本库包含 6 bits/像素 LSB 隐写工具的核心逻辑：
//! 纯函数的编解码核心 (`steganography`, `capacity`, `message`, `pixel`)，
//! 以及围绕它的文件 I/O、记录与命令处理。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod constants;
pub mod error;
pub mod handler;
pub mod image_io;
pub mod message;
pub mod pixel;
pub mod report;
pub mod steganography;

pub use error::{Result, StegoError};
