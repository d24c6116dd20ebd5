//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover`、`capacity` 和 `verify` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::capacity::{EmbedPlan, max_message_len};
use crate::cli::{CapacityArgs, HideArgs, RecoverArgs, VerifyArgs};
use crate::constants::{HIDDEN_IMAGE_PREFIX, MAX_EXTRACT_LEN, RECOVERED_TEXT_PREFIX};
use crate::image_io::{load_image, read_message, read_text, save_image, write_message};
use crate::report::{
    EmbedRecord, ExtractionRecord, ImageInfo, PreparationRecord, Status, VerificationReport,
    preview, read_json, write_json,
};
use crate::steganography::{embed, extract};
use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// 恢复后在终端展示的字符数。
const RECOVERED_PREVIEW_LEN: usize = 100;

/// 在输入文件同目录下生成 `<prefix><文件名><extension>`。
fn sibling_path(input: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{prefix}{stem}.{extension}"))
}

/// `hide` 未指定输出路径时使用的默认路径。
pub fn default_hidden_path(image: &Path) -> PathBuf {
    sibling_path(image, HIDDEN_IMAGE_PREFIX, "png")
}

/// `recover` 未指定输出路径时使用的默认路径。
pub fn default_recovered_path(image: &Path) -> PathBuf {
    sibling_path(image, RECOVERED_TEXT_PREFIX, "txt")
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和文本文件、检查隐写空间是否足够、调用隐写核心函数写入长度头部和消息，
/// 最后将结果保存为 PNG 图像。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或文本文件，或文本包含无法单字节编码的字符。
/// * 目标文件已存在且未指定 `--force`。
/// * 图像没有足够的像素来隐藏文本。此时不会写出任何文件。
/// * 无法写入目标图像或报告文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_hidden_path(&args.image));
    ensure_writable(&dest, args.force)?;

    let mut pixels = load_image(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let message = read_message(&args.text).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    let plan = EmbedPlan::new(message.len(), pixels.len());
    info!(
        "{} characters, {} payload bits (+{} padding), {} of {} pixels needed",
        plan.message_length,
        plan.payload_bits,
        plan.padding_bits,
        plan.pixels_needed,
        plan.pixels_available
    );

    anyhow::ensure!(
        plan.message_length <= MAX_EXTRACT_LEN,
        "The text has {} characters, but at most {} can be recovered from an image.",
        plan.message_length.to_string().red().bold(),
        MAX_EXTRACT_LEN.to_string().green().bold()
    );

    anyhow::ensure!(
        plan.can_embed,
        "Not enough space in the image to hide the text. \n\
         Required: {} pixels, Available: {} pixels",
        plan.pixels_needed.to_string().red().bold(),
        plan.pixels_available.to_string().green().bold()
    );

    let image_info = ImageInfo::new(&args.image, &pixels);

    embed(&mut pixels, &message).with_context(|| {
        format!(
            "Failed to hide the message in {}.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    save_image(pixels, &dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    if let Some(report) = &args.report {
        let record = EmbedRecord {
            image: image_info,
            preparation: PreparationRecord::new(&message, &plan),
            output_image: dest.clone(),
            status: Status::Success,
        };
        write_json(report, &record)?;
    }

    println!(
        "The text has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、解码长度头部并恢复文本，最后将文本写入目标文件。
/// 图像数据不足时默认保存截断的文本并给出警告；指定 `--strict` 时视为错误。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 长度头部无效 (图像很可能不含隐藏信息)。
/// * 以 `--strict` 运行且提取结果被截断。
/// * 目标文件已存在且未指定 `--force`，或无法写入。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let dest = args
        .text
        .clone()
        .unwrap_or_else(|| default_recovered_path(&args.image));
    ensure_writable(&dest, args.force)?;

    let pixels = load_image(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let extraction = extract(&pixels).with_context(|| {
        format!(
            "Failed to recover message length from '{}'. \n\
             The image may not contain a hidden message or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    info!(
        "declared length {}, read {}/{} bits",
        extraction.declared_length, extraction.bits_read, extraction.bits_needed
    );

    let record = ExtractionRecord::new(&args.image, &extraction, Some(&dest));
    let truncated = extraction.is_truncated();
    let message = if args.strict {
        extraction.into_complete().with_context(|| {
            format!(
                "The image {} is too small for the declared message.",
                args.image.to_string_lossy().red().bold()
            )
        })?
    } else {
        extraction.message
    };

    write_message(&dest, &message).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    if let Some(report) = &args.report {
        write_json(report, &record)?;
    }

    if truncated {
        warn!("recovered text is truncated");
        println!(
            "{} only {} of {} bits could be read, {} of {} characters recovered.",
            "Warning:".yellow().bold(),
            record.bits_read.to_string().yellow(),
            record.bits_needed,
            record.extracted_length.to_string().yellow(),
            record.message_length
        );
    }

    println!(
        "The text has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    println!("Preview: {}", preview(&message.to_text(), RECOVERED_PREVIEW_LEN).italic());
    Ok(())
}

/// 处理 'Capacity' 命令：报告图像容量，以及可选文本能否放入。
pub fn handle_capacity(args: CapacityArgs) -> Result<EmbedPlan> {
    let pixels = load_image(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "{}: {}x{} ({} pixels), room for {} characters",
        args.image.to_string_lossy().bold(),
        pixels.width(),
        pixels.height(),
        pixels.len(),
        max_message_len(pixels.len()).to_string().green().bold()
    );

    let length = match &args.text {
        Some(text) => read_message(text)
            .with_context(|| {
                format!(
                    "Unable to read text file: {}",
                    text.to_string_lossy().red().bold()
                )
            })?
            .len(),
        None => return Ok(EmbedPlan::new(max_message_len(pixels.len()), pixels.len())),
    };

    let plan = EmbedPlan::new(length, pixels.len());
    println!(
        "Text: {} characters, {} bits (+{} padding), {} pixels needed",
        plan.message_length, plan.payload_bits, plan.padding_bits, plan.pixels_needed
    );
    match &plan.reason {
        None => println!("{}", "The text fits.".green().bold()),
        Some(reason) => println!("{} {}", "The text does not fit:".red().bold(), reason),
    }
    Ok(plan)
}

/// 处理 'Verify' 命令：比较原文与恢复文本并给出结论。
///
/// 未指定 `--extracted` 时从提取记录的 `output_file` 定位恢复文本。
/// 文本缺失不会返回错误，而是体现在结论 (`Incomplete`) 中；
/// 只有写报告失败才返回错误。
pub fn handle_verify(args: VerifyArgs) -> Result<Status> {
    let load = |path: &Path| match read_text(path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("{e}");
            None
        }
    };
    let extraction = args
        .extraction
        .as_deref()
        .map(read_json::<ExtractionRecord>);

    // 未指定提取文本时，使用提取记录中保存的输出路径
    let recorded_output = extraction
        .as_ref()
        .and_then(|record| record.as_ref().ok())
        .and_then(|record| record.output_file.clone());
    let extracted_file = args.extracted.clone().or(recorded_output);

    let original = load(&args.original);
    let extracted = extracted_file.as_deref().and_then(load);

    let report = VerificationReport::classify(
        &args.original,
        extracted_file.as_deref(),
        original.as_deref(),
        extracted.as_deref(),
        extraction,
    );

    if let Some(comparison) = &report.comparison {
        println!(
            "Original: {} characters, extracted: {} characters, similarity {:.2}%",
            comparison.original_length,
            comparison.extracted_length,
            comparison.similarity * 100.0
        );
        if let Some(diff) = &comparison.first_diff {
            println!(
                "First difference at character {}:\n  original:  \"{}\"\n  extracted: \"{}\"",
                (diff.position + 1).to_string().red().bold(),
                diff.original,
                diff.extracted
            );
        }
    }
    if let Some(record) = &report.extraction {
        println!(
            "Extraction: {} declared characters, {}/{} bits read",
            record.message_length, record.bits_read, record.bits_needed
        );
    }

    for note in &report.notes {
        println!("{} {}", "Note:".yellow().bold(), note);
    }

    match report.status {
        Status::Success => println!(
            "{}",
            "The extracted text matches the original.".green().bold()
        ),
        Status::PartialSuccess => println!(
            "{}",
            "The extracted text differs from the original.".yellow().bold()
        ),
        Status::Incomplete | Status::Failed => println!(
            "{} {}",
            "Verification incomplete:".red().bold(),
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }

    if let Some(path) = &args.report {
        write_json(path, &report)?;
    }
    Ok(report.status)
}
