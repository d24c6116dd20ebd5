//! # 容量计算模块
//!
//! 嵌入流程与预检使用同一套计算，避免两处结果不一致。

use crate::constants::{BITS_PER_PIXEL, HEADER_PIXELS, MAX_EXTRACT_LEN, MAX_MESSAGE_LEN};
use crate::message::{padding_for, payload_bits};
use serde::{Deserialize, Serialize};

/// 隐藏 `char_len` 个字符所需的像素数：`ceil(char_len * 8 / 6) + 4`。
pub fn pixels_needed(char_len: usize) -> usize {
    payload_bits(char_len).div_ceil(BITS_PER_PIXEL) + HEADER_PIXELS
}

/// 拥有 `pixels_available` 个像素的缓冲区能否容纳 `char_len` 个字符。
pub fn fits(pixels_available: usize, char_len: usize) -> bool {
    pixels_available >= pixels_needed(char_len)
}

/// 满足 `fits` 且之后仍能被提取的最大字符数。
///
/// 提取端拒绝超过 `MAX_EXTRACT_LEN` 的声明长度，因此大图的容量也以此为上限。
pub fn max_message_len(pixels_available: usize) -> usize {
    let payload_pixels = pixels_available.saturating_sub(HEADER_PIXELS);
    (payload_pixels * BITS_PER_PIXEL / 8).min(MAX_EXTRACT_LEN)
}

/// 嵌入前的预检结果。
///
/// 除容量外还检查提取端的长度上限；`embed` 本身只检查容量与 24 位头部。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedPlan {
    pub message_length: usize,
    pub payload_bits: usize,
    pub padding_bits: usize,
    pub pixels_needed: usize,
    pub pixels_available: usize,
    pub can_embed: bool,
    pub reason: Option<String>,
}

impl EmbedPlan {
    pub fn new(message_length: usize, pixels_available: usize) -> Self {
        let bits = payload_bits(message_length);
        let pixels_needed = pixels_needed(message_length);

        let reason = if message_length == 0 {
            Some("message is empty".to_string())
        } else if message_length > MAX_MESSAGE_LEN {
            Some(format!(
                "message has {message_length} characters, \
                 the header can describe at most {MAX_MESSAGE_LEN}"
            ))
        } else if message_length > MAX_EXTRACT_LEN {
            Some(format!(
                "message has {message_length} characters, \
                 at most {MAX_EXTRACT_LEN} can be recovered from an image"
            ))
        } else if !fits(pixels_available, message_length) {
            Some(format!(
                "image is too small: {pixels_needed} pixels required, \
                 {pixels_available} available"
            ))
        } else {
            None
        };

        Self {
            message_length,
            payload_bits: bits,
            padding_bits: padding_for(bits),
            pixels_needed,
            pixels_available,
            can_embed: reason.is_none(),
            reason,
        }
    }
}
