//! # 隐写核心模块
//!
//! 每个像素的 R, G, B 三个通道各保存 2 bits，一个像素承载 6 bits。
//! 像素 `[0, 4)` 保存 24 位消息长度，其后依次保存消息比特流。
//! 本模块只包含纯函数，不做任何 I/O。

use crate::capacity::{EmbedPlan, fits, pixels_needed};
use crate::constants::{
    BITS_PER_CHANNEL, CLEAR_MASK, HEADER_PIXELS, LENGTH_FIELD_BITS, LOW_BITS_MASK, MAX_EXTRACT_LEN,
    MAX_MESSAGE_LEN,
};
use crate::error::{Result, StegoError};
use crate::message::{BitStream, Message, payload_bits};
use crate::pixel::PixelBuffer;
use image::Rgb;
use log::{debug, warn};
use rayon::prelude::*;

/// 将 6 bits 写入一个像素：高 2 位进 R，中 2 位进 G，低 2 位进 B。
/// 每个通道的高 6 位保持不变。
pub fn pack6(pixel: &mut Rgb<u8>, six_bits: u8) {
    for (i, channel) in pixel.0.iter_mut().enumerate() {
        let shift = BITS_PER_CHANNEL * (2 - i as u32);
        *channel = (*channel & CLEAR_MASK) | ((six_bits >> shift) & LOW_BITS_MASK);
    }
}

/// `pack6` 的逆运算：按 R, G, B 顺序拼接三个通道的低 2 位。
pub fn unpack6(pixel: &Rgb<u8>) -> u8 {
    pixel
        .0
        .iter()
        .fold(0u8, |acc, &channel| (acc << BITS_PER_CHANNEL) | (channel & LOW_BITS_MASK))
}

fn ensure_header_room(buffer: &PixelBuffer) -> Result<()> {
    if buffer.len() < HEADER_PIXELS {
        return Err(StegoError::InvalidHeader {
            pixels: buffer.len(),
            required: HEADER_PIXELS,
        });
    }
    Ok(())
}

/// 将消息长度以 24 位大端序写入前 4 个像素。
///
/// # Errors
///
/// * `length ≥ 2^24` 时返回 `HeaderOverflow`。
/// * 缓冲区少于 4 个像素时返回 `InvalidHeader`。
pub fn encode_header(buffer: &mut PixelBuffer, length: usize) -> Result<()> {
    if length > MAX_MESSAGE_LEN {
        return Err(StegoError::HeaderOverflow {
            length,
            bits: LENGTH_FIELD_BITS,
        });
    }
    ensure_header_room(buffer)?;

    let header = &mut buffer.pixels_mut()[..HEADER_PIXELS];
    for (i, pixel) in header.iter_mut().enumerate() {
        let shift = LENGTH_FIELD_BITS - 6 * (i + 1);
        pack6(pixel, ((length >> shift) & 0x3F) as u8);
    }
    Ok(())
}

/// 从前 4 个像素读取 24 位消息长度。
pub fn decode_header(buffer: &PixelBuffer) -> Result<usize> {
    ensure_header_room(buffer)?;

    Ok(buffer.pixels()[..HEADER_PIXELS]
        .iter()
        .fold(0usize, |acc, pixel| (acc << 6) | unpack6(pixel) as usize))
}

/// 将消息嵌入像素缓冲区，返回本次嵌入的容量计划。
///
/// 所有检查都在修改像素之前完成；返回错误时缓冲区保持原样。
/// 这里只检查容量与 24 位头部，提取端的长度上限由调用方通过 `EmbedPlan::can_embed` 把关。
/// 只有 `[0, pixels_needed)` 范围内像素的低 2 位会被改写。
///
/// # Errors
///
/// 容量不足时返回 `InsufficientCapacity`。
pub fn embed(buffer: &mut PixelBuffer, message: &Message) -> Result<EmbedPlan> {
    let plan = EmbedPlan::new(message.len(), buffer.len());
    if message.is_empty() {
        return Err(StegoError::EmptyMessage);
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(StegoError::MessageTooLong {
            length: message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    if !fits(buffer.len(), message.len()) {
        return Err(StegoError::InsufficientCapacity {
            needed: plan.pixels_needed,
            available: plan.pixels_available,
        });
    }

    let stream = BitStream::for_message(message);
    let sextets = stream.sextets();
    let payload = &sextets[HEADER_PIXELS..];
    debug!(
        "embedding {} characters: {} payload bits, {} padding bits, {} pixels",
        plan.message_length, plan.payload_bits, plan.padding_bits, plan.pixels_needed
    );

    encode_header(buffer, message.len())?;

    // 每个像素只由一个任务写入，范围互不重叠
    buffer.pixels_mut()[HEADER_PIXELS..plan.pixels_needed]
        .par_iter_mut()
        .zip(payload.par_iter())
        .for_each(|(pixel, &six_bits)| pack6(pixel, six_bits));

    Ok(plan)
}

/// 提取结果及诊断信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub message: Message,
    pub declared_length: usize,
    pub bits_read: usize,
    pub bits_needed: usize,
}

impl Extraction {
    /// 像素在读满声明的比特数之前已耗尽。
    pub fn is_truncated(&self) -> bool {
        self.bits_read < self.bits_needed
    }

    /// 严格模式：截断的结果视为错误。
    pub fn into_complete(self) -> Result<Message> {
        if self.is_truncated() {
            return Err(StegoError::TruncatedExtraction {
                bits_read: self.bits_read,
                bits_needed: self.bits_needed,
            });
        }
        Ok(self.message)
    }
}

/// 从像素缓冲区恢复消息。
///
/// 像素不足以读满声明长度时不会失败，而是返回截断的消息，
/// 调用方通过 `Extraction::is_truncated` 判断。
///
/// # Errors
///
/// * 缓冲区少于 4 个像素时返回 `InvalidHeader`。
/// * 声明长度为 0 或超过 100000 时返回 `InvalidLength`。
pub fn extract(buffer: &PixelBuffer) -> Result<Extraction> {
    let declared_length = decode_header(buffer)?;
    if declared_length == 0 || declared_length > MAX_EXTRACT_LEN {
        return Err(StegoError::InvalidLength {
            length: declared_length,
            max: MAX_EXTRACT_LEN,
        });
    }

    let bits_needed = payload_bits(declared_length);
    let end = pixels_needed(declared_length).min(buffer.len());
    let sextets: Vec<u8> = buffer.pixels()[HEADER_PIXELS..end]
        .par_iter()
        .map(unpack6)
        .collect();

    let stream = BitStream::from_sextets(&sextets, bits_needed);
    let bits_read = stream.bit_len();
    if bits_read < bits_needed {
        warn!("image exhausted after {bits_read} of {bits_needed} bits, message is truncated");
    }

    Ok(Extraction {
        message: Message::from_decoded(stream.whole_bytes().to_vec()),
        declared_length,
        bits_read,
        bits_needed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: u32, fill: u8) -> PixelBuffer {
        PixelBuffer::filled(len, 1, Rgb([fill; 3])).unwrap()
    }

    #[test]
    fn pack6_only_touches_low_bits() {
        let mut pixel = Rgb([0xFF, 0x00, 0xA5]);
        pack6(&mut pixel, 0b10_01_11);
        assert_eq!(pixel, Rgb([0xFE, 0x01, 0xA7]));
        assert_eq!(unpack6(&pixel), 0b10_01_11);
    }

    #[test]
    fn unpack6_inverts_pack6_for_every_value() {
        let mut pixel = Rgb([0x5A, 0xC3, 0x3C]);
        for value in 0..64u8 {
            pack6(&mut pixel, value);
            assert_eq!(unpack6(&pixel), value);
            assert_eq!(pixel.0[0] & CLEAR_MASK, 0x58);
            assert_eq!(pixel.0[1] & CLEAR_MASK, 0xC0);
            assert_eq!(pixel.0[2] & CLEAR_MASK, 0x3C);
        }
    }

    #[test]
    fn header_round_trips_boundary_lengths() {
        let mut buf = buffer(4, 0x77);
        for length in [0, 1, 63, 64, 4095, 4096, 100_000, MAX_MESSAGE_LEN] {
            encode_header(&mut buf, length).unwrap();
            assert_eq!(decode_header(&buf).unwrap(), length);
        }
    }

    #[test]
    fn header_rejects_overflow_and_small_buffers() {
        let mut buf = buffer(4, 0);
        assert!(matches!(
            encode_header(&mut buf, MAX_MESSAGE_LEN + 1),
            Err(StegoError::HeaderOverflow { .. })
        ));

        let mut tiny = buffer(3, 0);
        assert!(matches!(
            encode_header(&mut tiny, 1),
            Err(StegoError::InvalidHeader { pixels: 3, required: 4 })
        ));
        assert!(matches!(decode_header(&tiny), Err(StegoError::InvalidHeader { .. })));
    }

    #[test]
    fn round_trip_restores_message() {
        let message =
            Message::new("The quick brown fox jumps over the lazy dog. Ça va?").unwrap();
        let mut buf = buffer(200, 0xC9);
        embed(&mut buf, &message).unwrap();

        let extraction = extract(&buf).unwrap();
        assert!(!extraction.is_truncated());
        assert_eq!(extraction.declared_length, message.len());
        assert_eq!(extraction.bits_read, extraction.bits_needed);
        assert_eq!(extraction.into_complete().unwrap(), message);
    }

    fn assert_round_trip(bytes: &[u8]) {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        let message = Message::new(&text).unwrap();
        let mut buf = buffer(pixels_needed(bytes.len()) as u32, 0x96);
        embed(&mut buf, &message).unwrap();

        let extraction = extract(&buf).unwrap();
        assert_eq!(extraction.bits_read, bytes.len() * 8, "length {}", bytes.len());
        assert_eq!(extraction.message.as_bytes(), bytes, "length {}", bytes.len());
    }

    #[test]
    fn round_trip_random_bytes_for_every_padding_remainder() {
        use rand::RngCore;

        let mut rng = rand::rng();
        for len in 1..=40 {
            let mut bytes = vec![0u8; len];
            rng.fill_bytes(&mut bytes);
            assert_round_trip(&bytes);
        }
    }

    #[test]
    fn round_trip_every_byte_value() {
        let all: Vec<u8> = (0..=255u8).collect();
        assert_round_trip(&all);
        assert_round_trip(&all[..255]);
        assert_round_trip(&all[..254]);
    }

    #[test]
    fn messages_past_the_extraction_limit_are_flagged_by_the_plan() {
        let message = Message::new(&"a".repeat(MAX_EXTRACT_LEN + 1)).unwrap();
        let mut buf = PixelBuffer::filled(400, 400, Rgb([0x80; 3])).unwrap();

        let plan = embed(&mut buf, &message).unwrap();
        assert!(!plan.can_embed);
        assert!(matches!(
            extract(&buf),
            Err(StegoError::InvalidLength { length, .. }) if length == MAX_EXTRACT_LEN + 1
        ));
    }

    #[test]
    fn exact_capacity_succeeds_and_one_less_fails_untouched() {
        let message = Message::new("Hi").unwrap();

        let mut exact = buffer(7, 0xFF);
        let plan = embed(&mut exact, &message).unwrap();
        assert_eq!(plan.pixels_needed, 7);
        assert_eq!(plan.padding_bits, 2);
        assert_eq!(extract(&exact).unwrap().message, message);

        let mut short = buffer(6, 0xFF);
        let before = short.clone();
        assert!(matches!(
            embed(&mut short, &message),
            Err(StegoError::InsufficientCapacity { needed: 7, available: 6 })
        ));
        assert_eq!(short, before);
    }

    #[test]
    fn pixels_past_the_payload_are_untouched() {
        let message = Message::new("isolation").unwrap();
        let original = buffer(64, 0xFF);
        let mut buf = original.clone();
        let plan = embed(&mut buf, &message).unwrap();

        assert_eq!(&buf.pixels()[plan.pixels_needed..], &original.pixels()[plan.pixels_needed..]);
        for (after, before) in buf.pixels().iter().zip(original.pixels()) {
            for (a, b) in after.0.iter().zip(before.0) {
                assert_eq!(a & CLEAR_MASK, b & CLEAR_MASK);
            }
        }
    }

    #[test]
    fn zero_length_header_is_invalid() {
        let buf = buffer(32, 0b1111_1100);
        assert!(matches!(
            extract(&buf),
            Err(StegoError::InvalidLength { length: 0, .. })
        ));
    }

    #[test]
    fn oversized_declared_length_is_invalid() {
        let mut buf = buffer(32, 0);
        encode_header(&mut buf, MAX_EXTRACT_LEN + 1).unwrap();
        assert!(matches!(extract(&buf), Err(StegoError::InvalidLength { .. })));
    }

    #[test]
    fn short_buffer_yields_truncated_extraction() {
        let message = Message::new("Hello").unwrap();
        let mut full = buffer(32, 0);
        embed(&mut full, &message).unwrap();

        // 只保留头部与前 3 个负载像素 (18 bits)
        let cropped = PixelBuffer::from_pixels(7, 1, full.pixels()[..7].to_vec()).unwrap();
        let extraction = extract(&cropped).unwrap();
        assert!(extraction.is_truncated());
        assert_eq!(extraction.bits_read, 18);
        assert_eq!(extraction.bits_needed, 40);
        assert_eq!(extraction.message.as_bytes(), b"He");
        assert!(matches!(
            extraction.into_complete(),
            Err(StegoError::TruncatedExtraction { bits_read: 18, bits_needed: 40 })
        ));
    }

    #[test]
    fn corrupted_payload_pixel_changes_content_not_length() {
        let message = Message::new("AB").unwrap();
        let mut buf = buffer(16, 0xFF);
        embed(&mut buf, &message).unwrap();

        if let Some(pixel) = buf.get_mut(5) {
            *pixel = Rgb([0, 0, 0]);
        }
        let extraction = extract(&buf).unwrap();
        assert!(!extraction.is_truncated());
        assert_eq!(extraction.message.len(), 2);
        assert_ne!(extraction.message, message);
        // 像素 5 承载第 6..=11 位 (从 0 计)：'A' 的低 2 位与 'B' 的高 4 位被清零
        assert_eq!(extraction.message.as_bytes(), &[0x40, 0x02]);
    }

    #[test]
    fn wide_image_rows_are_read_in_row_major_order() {
        let message = Message::new("row major").unwrap();
        let mut buf = PixelBuffer::filled(3, 7, Rgb([10, 20, 30])).unwrap();
        embed(&mut buf, &message).unwrap();
        assert_eq!(extract(&buf).unwrap().message, message);
    }
}
