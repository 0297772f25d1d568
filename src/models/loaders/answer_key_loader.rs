//! 文本答案加载
//!
//! 格式与数据集标注一致：每题一个答案，题与题之间以逗号、分号或空白分隔，
//! 多选题以 `|` 连接（如 `A,B|C,X,D`）。答案文本原样保留，不做排序或大小写转换。

use crate::error::AppError;
use crate::models::record::AnswerToken;
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[,;\s]+").expect("分隔符正则有效"))
}

/// 解析答案文本
pub fn parse_answer_key(text: &str) -> Vec<AnswerToken> {
    separator()
        .split(text.trim())
        .filter(|token| !token.is_empty())
        .map(AnswerToken::from_text)
        .collect()
}

/// 从文件加载答案
pub async fn load_answer_key(path: &Path) -> Result<Vec<AnswerToken>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let tokens = parse_answer_key(&content);
    tracing::info!("✓ 已加载答案文件 {}: {} 题", path.display(), tokens.len());
    Ok(tokens)
}
