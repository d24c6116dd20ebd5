//! # 记录与校验报告模块
//!
//! 各阶段可选输出的 JSON 记录，以及比较原文与提取文本的校验逻辑。

use crate::capacity::EmbedPlan;
use crate::message::{BitStream, Message};
use crate::pixel::PixelBuffer;
use crate::steganography::Extraction;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 差异位置两侧展示的字符数。
const DIFF_CONTEXT: usize = 10;

/// 准备记录中消息预览的字符数。
const MESSAGE_PREVIEW_LEN: usize = 50;

/// 取前 `limit` 个字符，截断时追加 `...`。
pub fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// 载体图像的基本信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixel_count: usize,
}

impl ImageInfo {
    pub fn new(path: &Path, pixels: &PixelBuffer) -> Self {
        Self {
            path: path.to_path_buf(),
            width: pixels.width(),
            height: pixels.height(),
            pixel_count: pixels.len(),
        }
    }
}

/// 嵌入前的准备信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationRecord {
    pub message_length: usize,
    pub message_preview: String,
    /// 消息负载的比特串 (含末尾填充，不含头部)。
    pub binary_message: String,
    pub padding_bits: usize,
    pub pixels_needed: usize,
    pub can_embed: bool,
    pub reason: Option<String>,
}

impl PreparationRecord {
    pub fn new(message: &Message, plan: &EmbedPlan) -> Self {
        let bits = BitStream::for_message(message).to_bit_string();
        let header_len = bits.len() - plan.payload_bits - plan.padding_bits;
        Self {
            message_length: plan.message_length,
            message_preview: preview(&message.to_text(), MESSAGE_PREVIEW_LEN),
            binary_message: bits[header_len..].to_string(),
            padding_bits: plan.padding_bits,
            pixels_needed: plan.pixels_needed,
            can_embed: plan.can_embed,
            reason: plan.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRecord {
    pub image: ImageInfo,
    pub preparation: PreparationRecord,
    pub output_image: PathBuf,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub stego_image: PathBuf,
    pub message_length: usize,
    pub bits_read: usize,
    pub bits_needed: usize,
    pub extracted_length: usize,
    pub output_file: Option<PathBuf>,
}

impl ExtractionRecord {
    pub fn new(stego_image: &Path, extraction: &Extraction, output_file: Option<&Path>) -> Self {
        Self {
            stego_image: stego_image.to_path_buf(),
            message_length: extraction.declared_length,
            bits_read: extraction.bits_read,
            bits_needed: extraction.bits_needed,
            extracted_length: extraction.message.len(),
            output_file: output_file.map(Path::to_path_buf),
        }
    }
}

/// 整体结果分类：完全成功、部分成功 (内容不一致)、不完整、失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    PartialSuccess,
    Incomplete,
    Failed,
}

/// 第一个不同字符的位置及其上下文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstDiff {
    pub position: usize,
    pub original: String,
    pub extracted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub is_match: bool,
    pub original_length: usize,
    pub extracted_length: usize,
    /// 按位置对齐后相同字符所占比例 (以较长者为分母)。
    pub similarity: f64,
    pub first_diff: Option<FirstDiff>,
}

impl Comparison {
    pub fn new(original: &str, extracted: &str) -> Self {
        let a: Vec<char> = original.chars().collect();
        let b: Vec<char> = extracted.chars().collect();
        let longest = a.len().max(b.len());

        let agreeing = a.iter().zip(&b).filter(|(x, y)| x == y).count();
        let similarity = if longest == 0 {
            1.0
        } else {
            agreeing as f64 / longest as f64
        };

        let shortest = a.len().min(b.len());
        let first_diff = a.iter().zip(&b).position(|(x, y)| x != y).map(|position| {
            let start = position.saturating_sub(DIFF_CONTEXT);
            let end = (position + DIFF_CONTEXT).min(shortest);
            FirstDiff {
                position,
                original: a[start..end].iter().collect(),
                extracted: b[start..end].iter().collect(),
            }
        });

        Self {
            is_match: a == b,
            original_length: a.len(),
            extracted_length: b.len(),
            similarity,
            first_diff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub original_file: PathBuf,
    pub extracted_file: Option<PathBuf>,
    pub status: Status,
    pub comparison: Option<Comparison>,
    pub extraction: Option<ExtractionRecord>,
    pub error: Option<String>,
    /// 不影响结论但值得注意的差异，例如提取记录与文本文件长度不一致。
    pub notes: Vec<String>,
}

impl VerificationReport {
    /// 根据读取到的文本和提取记录给出结论。
    ///
    /// 提取记录无法读取为 `Failed`；任一文本缺失为 `Incomplete`；
    /// 内容一致为 `Success`，否则为 `PartialSuccess`。
    /// 提取记录中的字符数与提取文本不一致时记入 `notes`。
    pub fn classify(
        original_file: &Path,
        extracted_file: Option<&Path>,
        original: Option<&str>,
        extracted: Option<&str>,
        extraction: Option<Result<ExtractionRecord>>,
    ) -> Self {
        let mut report = Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            original_file: original_file.to_path_buf(),
            extracted_file: extracted_file.map(Path::to_path_buf),
            status: Status::Incomplete,
            comparison: None,
            extraction: None,
            error: None,
            notes: Vec::new(),
        };

        match extraction {
            Some(Err(e)) => {
                report.status = Status::Failed;
                report.error = Some(format!("{e:#}"));
                return report;
            }
            Some(Ok(record)) => report.extraction = Some(record),
            None => {}
        }

        match (original, extracted) {
            (Some(original), Some(extracted)) => {
                let comparison = Comparison::new(original, extracted);
                let recorded = report.extraction.as_ref().map(|r| r.extracted_length);
                if let Some(recorded) = recorded.filter(|&n| n != comparison.extracted_length) {
                    report.notes.push(format!(
                        "extraction record lists {recorded} characters, the extracted text has {}",
                        comparison.extracted_length
                    ));
                }
                report.status = if comparison.is_match {
                    Status::Success
                } else {
                    Status::PartialSuccess
                };
                report.comparison = Some(comparison);
            }
            (None, _) => report.error = Some("original text is unavailable".to_string()),
            (_, None) => report.error = Some("extracted text is unavailable".to_string()),
        }
        report
    }
}

/// 以缩进 JSON 写出记录。
pub fn write_json<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
    fs::write(path, json).with_context(|| format!("Unable to write report: {}", path.display()))
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Unable to read record: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed record: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_match() {
        let comparison = Comparison::new("hello", "hello");
        assert!(comparison.is_match);
        assert_eq!(comparison.similarity, 1.0);
        assert_eq!(comparison.first_diff, None);
    }

    #[test]
    fn first_diff_carries_context_window() {
        let original = "abcdefghijklmnopqrstuvwxyz";
        let extracted = "abcdefghijklmnopXrstuvwxyz";
        let comparison = Comparison::new(original, extracted);

        assert!(!comparison.is_match);
        assert_eq!(comparison.similarity, 25.0 / 26.0);
        let diff = comparison.first_diff.unwrap();
        assert_eq!(diff.position, 16);
        assert_eq!(diff.original, "ghijklmnopqrstuvwxyz");
        assert_eq!(diff.extracted, "ghijklmnopXrstuvwxyz");
    }

    #[test]
    fn length_mismatch_without_differing_prefix() {
        let comparison = Comparison::new("abc", "ab");
        assert!(!comparison.is_match);
        assert_eq!(comparison.first_diff, None);
        assert_eq!(comparison.extracted_length, 2);
    }

    #[test]
    fn classification_covers_every_status() {
        let (o, e) = (Path::new("o.txt"), Some(Path::new("e.txt")));
        let status = |orig, ext, rec| VerificationReport::classify(o, e, orig, ext, rec).status;

        assert_eq!(status(Some("x"), Some("x"), None), Status::Success);
        assert_eq!(status(Some("x"), Some("y"), None), Status::PartialSuccess);
        assert_eq!(status(None, Some("y"), None), Status::Incomplete);
        assert_eq!(
            status(Some("x"), Some("x"), Some(Err(anyhow::anyhow!("bad record")))),
            Status::Failed
        );
    }

    fn record(extracted_length: usize) -> ExtractionRecord {
        ExtractionRecord {
            stego_image: PathBuf::from("stego.png"),
            message_length: 5,
            bits_read: 40,
            bits_needed: 40,
            extracted_length,
            output_file: Some(PathBuf::from("e.txt")),
        }
    }

    #[test]
    fn record_length_mismatch_is_noted() {
        let path = Path::new("o.txt");
        let report = VerificationReport::classify(
            path,
            Some(Path::new("e.txt")),
            Some("hello"),
            Some("hell"),
            Some(Ok(record(5))),
        );
        assert_eq!(report.status, Status::PartialSuccess);
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("lists 5 characters"));

        let report = VerificationReport::classify(
            path,
            Some(Path::new("e.txt")),
            Some("hello"),
            Some("hello"),
            Some(Ok(record(5))),
        );
        assert_eq!(report.status, Status::Success);
        assert!(report.notes.is_empty());
    }

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exactly10!", 10), "exactly10!");
        assert_eq!(preview("ça dépasse la limite", 5), "ça dé...");
    }

    #[test]
    fn preparation_record_holds_padded_payload_bits() {
        let message = Message::new("Hi").unwrap();
        let plan = EmbedPlan::new(message.len(), 7);
        let record = PreparationRecord::new(&message, &plan);

        assert_eq!(record.binary_message, "010010000110100100");
        assert_eq!(record.message_preview, "Hi");
        assert_eq!(record.padding_bits, 2);
        assert_eq!(record.pixels_needed, 7);
        assert!(record.can_embed);
    }
}
