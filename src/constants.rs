/// 每个颜色通道中用于隐写的低位数量。
pub const BITS_PER_CHANNEL: u32 = 2;

/// 每个像素 (R, G, B 三个通道) 可承载的比特数。
pub const BITS_PER_PIXEL: usize = 6;

/// 清除通道低 2 位的掩码。
pub const CLEAR_MASK: u8 = 0b1111_1100;

/// 提取通道低 2 位的掩码。
pub const LOW_BITS_MASK: u8 = 0b0000_0011;

/// 长度头部的比特数。消息长度以 24 位大端序存储。
pub const LENGTH_FIELD_BITS: usize = 24;

/// 长度头部占用的像素数：24 / 6 = 4。
pub const HEADER_PIXELS: usize = LENGTH_FIELD_BITS / BITS_PER_PIXEL;

/// 长度头部可以表示的最大字符数 (2^24 - 1)。
pub const MAX_MESSAGE_LEN: usize = (1 << LENGTH_FIELD_BITS) - 1;

/// 提取时接受的最大声明长度。
/// 对非隐写图像而言头部近似随机，超过该值即视为无效图像。
pub const MAX_EXTRACT_LEN: usize = 100_000;

/// 每个字符按单字节 (ISO-8859-1) 编码，占 8 bits。
pub const BITS_PER_CHAR: usize = 8;

/// 默认输出图像文件名前缀。
pub const HIDDEN_IMAGE_PREFIX: &str = "doctored_";

/// 默认恢复文本文件名前缀。
pub const RECOVERED_TEXT_PREFIX: &str = "recovered_";
