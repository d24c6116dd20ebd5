//! # 像素缓冲区模块
//!
//! 以行优先顺序存放的固定尺寸 RGB 像素数组。
//! 通道顺序固定为逻辑上的 R, G, B，图像 I/O 负责按此顺序提供和接收像素。

use crate::error::{Result, StegoError};
use image::{Rgb, RgbImage};

/// `height × width` 个 RGB 像素，按行优先索引。
///
/// 构造时保证 `width ≥ 1`、`height ≥ 1` 且像素数恰好为 `width * height`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb<u8>>,
}

impl PixelBuffer {
    /// 由行优先的像素序列构造缓冲区。
    ///
    /// # Errors
    ///
    /// 宽或高为 0，或像素数与尺寸不符时返回 `InvalidDimensions`。
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb<u8>>) -> Result<Self> {
        let expected = (width as usize).checked_mul(height as usize);
        if width == 0 || height == 0 || expected != Some(pixels.len()) {
            return Err(StegoError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 所有通道均为 `fill` 的缓冲区。
    pub fn filled(width: u32, height: u32, fill: Rgb<u8>) -> Result<Self> {
        let len = (width as usize).saturating_mul(height as usize);
        Self::from_pixels(width, height, vec![fill; len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 像素总数。
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// 构造保证缓冲区非空，此方法恒为 `false`。
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rgb<u8>> {
        self.pixels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Rgb<u8>> {
        self.pixels.get_mut(index)
    }

    pub fn pixels(&self) -> &[Rgb<u8>] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb<u8>] {
        &mut self.pixels
    }

    /// 转换回 `image` 库的 RGB8 图像，用于编码输出。
    pub fn into_image(self) -> Result<RgbImage> {
        let (width, height) = (self.width, self.height);
        let raw: Vec<u8> = self.pixels.into_iter().flat_map(|p| p.0).collect();
        RgbImage::from_raw(width, height, raw)
            .ok_or(StegoError::InvalidDimensions { width, height })
    }
}

impl TryFrom<RgbImage> for PixelBuffer {
    type Error = StegoError;

    fn try_from(image: RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let pixels = image.pixels().copied().collect();
        Self::from_pixels(width, height, pixels)
    }
}
