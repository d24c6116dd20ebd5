//! # 图像与文本 I/O 模块
//!
//! 负责在文件与 `PixelBuffer` / `Message` 之间转换。
//! 只有无损格式才能保留像素低位，输出统一保存为 PNG。

use crate::error::{Result, StegoError};
use crate::message::Message;
use crate::pixel::PixelBuffer;
use image::ImageFormat;
use log::debug;
use std::fs;
use std::path::Path;

/// 读取图像并转换为 RGB8 像素缓冲区 (丢弃 alpha 通道)。
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path)
        .map_err(|source| StegoError::ImageIo {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    debug!("loaded {} ({}x{})", path.display(), image.width(), image.height());
    PixelBuffer::try_from(image)
}

/// 将像素缓冲区保存为 PNG。
pub fn save_image(buffer: PixelBuffer, path: &Path) -> Result<()> {
    buffer
        .into_image()?
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| StegoError::ImageIo {
            path: path.to_path_buf(),
            source,
        })
}

/// 读取 UTF-8 文本文件的原始内容。
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| StegoError::TextIo {
        path: path.to_path_buf(),
        source,
    })
}

/// 读取文本文件并编码为消息。
pub fn read_message(path: &Path) -> Result<Message> {
    Message::new(&read_text(path)?)
}

/// 以 UTF-8 写出消息。
pub fn write_message(path: &Path, message: &Message) -> Result<()> {
    fs::write(path, message.to_text()).map_err(|source| StegoError::TextIo {
        path: path.to_path_buf(),
        source,
    })
}
