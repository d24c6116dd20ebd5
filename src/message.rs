//! # 消息与比特流模块
//!
//! `Message` 是单字节编码 (ISO-8859-1) 的文本，每个字符恰好对应 8 bits。
//! `BitStream` 是分布到像素中的线性比特序列：24 位大端长度头部，
//! 后接消息的每个字节 (高位在前)。

use crate::constants::{BITS_PER_CHAR, BITS_PER_PIXEL, LENGTH_FIELD_BITS, MAX_MESSAGE_LEN};
use crate::error::{Result, StegoError};
use std::fmt;

/// 待隐藏或已恢复的文本消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    bytes: Vec<u8>,
}

impl Message {
    /// 将文本编码为单字节字符序列。
    ///
    /// # Errors
    ///
    /// * 文本为空时返回 `EmptyMessage`。
    /// * 字符数超过 24 位头部可表示的范围时返回 `MessageTooLong`。
    /// * 任一字符超出 U+00FF 时返回 `UnencodableCharacter`。
    pub fn new(text: &str) -> Result<Self> {
        let bytes = text
            .chars()
            .enumerate()
            .map(|(index, ch)| {
                u8::try_from(ch).map_err(|_| StegoError::UnencodableCharacter { ch, index })
            })
            .collect::<Result<Vec<u8>>>()?;

        if bytes.is_empty() {
            return Err(StegoError::EmptyMessage);
        }
        if bytes.len() > MAX_MESSAGE_LEN {
            return Err(StegoError::MessageTooLong {
                length: bytes.len(),
                max: MAX_MESSAGE_LEN,
            });
        }
        Ok(Self { bytes })
    }

    /// 由提取得到的字节构造消息，不做长度校验 (可能为空或被截断)。
    pub(crate) fn from_decoded(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// 字符数 (即字节数)。
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 按码位逐字节还原为 Rust 字符串。
    pub fn to_text(&self) -> String {
        self.bytes.iter().map(|&b| char::from(b)).collect()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bytes.iter().try_for_each(|&b| write!(f, "{}", char::from(b)))
    }
}

/// 高位在前的比特序列，末尾不足一个字节的部分以 0 填充。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitStream {
    /// 头部 (24 位字符数) 加消息字节组成的完整比特流。
    pub fn for_message(message: &Message) -> Self {
        let length = message.len() as u32;
        let mut bytes = Vec::with_capacity(LENGTH_FIELD_BITS / 8 + message.len());
        bytes.extend_from_slice(&length.to_be_bytes()[1..]);
        bytes.extend_from_slice(message.as_bytes());
        let bit_len = bytes.len() * 8;
        Self { bytes, bit_len }
    }

    /// 将 6 位分组依次拼接，只保留前 `limit` 个比特。
    pub fn from_sextets(sextets: &[u8], limit: usize) -> Self {
        let bit_len = (sextets.len() * BITS_PER_PIXEL).min(limit);
        let mut bytes = vec![0u8; bit_len.div_ceil(8)];

        let bits = sextets
            .iter()
            .flat_map(|&s| (0..BITS_PER_PIXEL).rev().map(move |shift| (s >> shift) & 1));
        for (pos, bit) in bits.take(bit_len).enumerate() {
            bytes[pos / 8] |= bit << (7 - pos % 8);
        }

        Self { bytes, bit_len }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// 凑满 6 的倍数所需的填充位数。
    pub fn padding_bits(&self) -> usize {
        padding_for(self.bit_len)
    }

    fn bit(&self, pos: usize) -> u8 {
        if pos >= self.bit_len {
            return 0;
        }
        (self.bytes[pos / 8] >> (7 - pos % 8)) & 1
    }

    /// 以 6 位为一组切分整个比特流，最后一组在末尾补 0。
    pub fn sextets(&self) -> Vec<u8> {
        let count = self.bit_len.div_ceil(BITS_PER_PIXEL);
        (0..count)
            .map(|chunk| {
                (0..BITS_PER_PIXEL).fold(0u8, |acc, i| {
                    (acc << 1) | self.bit(chunk * BITS_PER_PIXEL + i)
                })
            })
            .collect()
    }

    /// 完整的字节；末尾不足 8 位的部分被丢弃。
    pub fn whole_bytes(&self) -> &[u8] {
        &self.bytes[..self.bit_len / 8]
    }

    /// `'0'`/`'1'` 字符串形式，包含末尾填充位。
    pub fn to_bit_string(&self) -> String {
        let padded = self.bit_len + self.padding_bits();
        (0..padded).map(|pos| if self.bit(pos) == 1 { '1' } else { '0' }).collect()
    }
}

/// 字符数对应的负载比特数 (不含头部与填充)。
pub fn payload_bits(char_len: usize) -> usize {
    char_len * BITS_PER_CHAR
}

pub fn padding_for(bits: usize) -> usize {
    (BITS_PER_PIXEL - bits % BITS_PER_PIXEL) % BITS_PER_PIXEL
}
