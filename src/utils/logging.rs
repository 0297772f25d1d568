//! 批量评分的日志输出
//!
//! 运行日志文件只写一个带时间戳的文件头；其余进度信息都走 `tracing`。

use anyhow::Result;
use std::fs;
use std::ops::RangeInclusive;
use tracing::info;

/// 一批（或整次运行）的评分计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 评分成功，包括试卷代码不符的卡
    pub graded: usize,
    pub failed: usize,
    /// 已评分但试卷代码与答案卡不同（记 0 分）
    pub mismatched: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.graded + self.failed
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.graded += other.graded;
        self.failed += other.failed;
        self.mismatched += other.mismatched;
    }
}

/// 覆盖写入运行日志文件头（`OUTPUT_LOG_FILE`），记下本次使用的答案来源
pub fn init_log_file(log_file_path: &str, answer_source: &str) -> Result<()> {
    let rule = "=".repeat(60);
    let log_header = format!(
        "{rule}\n答题卡评分日志 - {}\n答案来源: {answer_source}\n{rule}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

pub fn log_startup(student_path: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题卡批量评分模式");
    info!("📂 学生卡来源: {}", student_path);
    info!("📊 同时解码上限: {} 张", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 扫描到的学生卡数量（已排除答案卡本身）
pub fn log_sheets_loaded(total: usize, batch_size: usize) {
    info!(
        "✓ 找到 {} 张待评分的答题卡，分 {} 批处理",
        total,
        total.div_ceil(batch_size.max(1))
    );
}

/// `sheets` 是本批答题卡的序号（从 1 开始），与日志里 `[试卷 n]` 的 n 一致
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    sheets: RangeInclusive<usize>,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📦 第 {}/{} 批: 试卷 {}-{} / 共 {} 张",
        batch_num,
        total_batches,
        sheets.start(),
        sheets.end(),
        total
    );
    info!("{}", "=".repeat(60));
}

pub fn log_batch_complete(batch_num: usize, summary: &RunSummary) {
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}，其中试卷代码不符 {}",
        batch_num,
        summary.graded,
        summary.total(),
        summary.mismatched
    );
}

/// 全部评分结束后的汇总
pub fn print_final_stats(summary: &RunSummary, report_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📊 评分完成 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", summary.graded, summary.total());
    if summary.mismatched > 0 {
        info!("⚠️ 试卷代码不符: {}", summary.mismatched);
    }
    if summary.failed > 0 {
        info!("❌ 失败: {}（详见报告中 status 为 error 的条目）", summary.failed);
    }
    info!("📝 评分报告: {}", report_path);
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        init_log_file(path.to_str().unwrap(), "answer_key.png").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("答题卡评分日志"));
        assert!(content.contains("答案来源: answer_key.png"));
    }

    #[test]
    fn test_run_summary_merge() {
        let mut summary = RunSummary::default();
        summary.merge(RunSummary {
            graded: 2,
            failed: 1,
            mismatched: 1,
        });
        summary.merge(RunSummary {
            graded: 1,
            failed: 0,
            mismatched: 0,
        });
        assert_eq!(summary.graded, 3);
        assert_eq!(summary.mismatched, 1);
        assert_eq!(summary.total(), 4);
    }
}
