//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量答题卡的评分和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、加载模板、构造识别模型（失败即退出）
//! 2. **答案加载**：解码答案卡图像，或读取文本答案
//! 3. **批量加载**：扫描所有待评分的学生卡
//! 4. **并发控制**：使用 Semaphore 限制同时解码的答题卡数量
//! 5. **分批处理**：每批完成后再开始下一批
//! 6. **报告输出**：汇总所有结果写入 JSON 报告

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{FillRatioClassifier, MarkClassifier};
use crate::models::record::{AnswerToken, GradingReport, GradingResult, PaperRecord};
use crate::models::{load_answer_key, load_template_or_default};
use crate::orchestrator::grading::{file_label, read_sheet};
use crate::services::ScoringEngine;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_sheets_loaded, log_startup,
    print_final_stats, RunSummary,
};
use crate::workflow::{PaperReader, SheetCtx};

const SHEET_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// 标准答案来源
#[derive(Debug, Clone)]
pub enum AnswerKey {
    /// 从答案卡图像解码
    Sheet(PaperRecord),
    /// 文本答案
    Text {
        label: String,
        tokens: Vec<AnswerToken>,
    },
}

/// 应用主结构
pub struct App {
    config: Config,
    reader: PaperReader,
    engine: ScoringEngine,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let answer_source = config
            .answer_key_file
            .as_deref()
            .unwrap_or(&config.key_image);
        init_log_file(&config.output_log_file, answer_source)?;

        log_startup(&config.student_path, config.max_concurrent_sheets);

        let layout = load_template_or_default(config.template_file.as_deref()).await?;

        let policy = config.decode_policy();
        policy.validate()?;

        // 识别模型只构造一次，之后只读共享
        let classifier: Arc<dyn MarkClassifier> =
            Arc::new(FillRatioClassifier::with_ink_level(config.ink_level)?);

        let engine = ScoringEngine::new(layout.answers.num_questions);
        let reader = PaperReader::new(Arc::new(layout), policy, classifier);

        Ok(Self {
            config,
            reader,
            engine,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let key = Arc::new(self.prepare_answer_key().await?);

        // 文本答案模式下没有答案卡图像需要排除
        let key_image = match &*key {
            AnswerKey::Sheet(_) => Some(Path::new(&self.config.key_image)),
            AnswerKey::Text { .. } => None,
        };
        let sheets = collect_sheets(Path::new(&self.config.student_path), key_image).await?;
        if sheets.is_empty() {
            warn!("⚠️ 没有找到待评分的答题卡，程序结束");
            return Ok(());
        }

        log_sheets_loaded(sheets.len(), self.config.max_concurrent_sheets);

        let (outcomes, summary) = self.process_all_sheets(sheets, key).await?;

        self.write_report(&outcomes).await?;

        print_final_stats(&summary, &self.config.report_file);

        Ok(())
    }

    /// 加载标准答案
    async fn prepare_answer_key(&self) -> Result<AnswerKey> {
        if let Some(path) = &self.config.answer_key_file {
            let path = Path::new(path);
            let tokens = load_answer_key(path).await?;
            // 数量不符时不开始评分
            let expected = self.engine.expected_questions();
            if tokens.len() != expected {
                return Err(AppError::answer_key_length_mismatch(expected, tokens.len()).into());
            }
            return Ok(AnswerKey::Text {
                label: file_label(path),
                tokens,
            });
        }

        info!("\n🔑 正在读取答案卡: {}", self.config.key_image);
        let key_path = PathBuf::from(&self.config.key_image);
        let ctx = SheetCtx::key(file_label(&key_path));
        let record = read_sheet(&self.reader, key_path, ctx)
            .await
            .with_context(|| format!("无法读取答案卡: {}", self.config.key_image))?;
        Ok(AnswerKey::Sheet(record))
    }

    /// 分批处理所有学生卡
    async fn process_all_sheets(
        &self,
        sheets: Vec<PathBuf>,
        key: Arc<AnswerKey>,
    ) -> Result<(Vec<SheetOutcome>, RunSummary)> {
        let batch_size = self.config.max_concurrent_sheets;
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = sheets.len();
        let total_batches = total.div_ceil(batch_size);
        let mut outcomes = Vec::with_capacity(total);
        let mut summary = RunSummary::default();

        for (batch_idx, batch) in sheets.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            log_batch_start(
                batch_idx + 1,
                total_batches,
                batch_start + 1..=batch_start + batch.len(),
                total,
            );

            let batch_outcomes = self
                .process_batch(batch, batch_start, semaphore.clone(), key.clone())
                .await?;

            let batch_summary = summarize(&batch_outcomes);
            log_batch_complete(batch_idx + 1, &batch_summary);
            summary.merge(batch_summary);
            outcomes.extend(batch_outcomes);
        }

        Ok((outcomes, summary))
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[PathBuf],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
        key: Arc<AnswerKey>,
    ) -> Result<Vec<SheetOutcome>> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, path) in batch.iter().enumerate() {
            let sheet_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let reader = self.reader.clone();
            let engine = self.engine;
            let key = key.clone();
            let task_path = path.clone();
            let remove_after = self.config.remove_processed_sheets;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result =
                    grade_one(&reader, &engine, &key, task_path.clone(), sheet_index).await;
                if let Err(e) = &result {
                    error!("[试卷 {}] ❌ 评分失败: {}", sheet_index, e);
                }
                if remove_after {
                    cleanup_file(&task_path, sheet_index).await;
                }
                result
            });
            handles.push((path.clone(), handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("任务执行失败: {}", e)),
            };
            outcomes.push(SheetOutcome {
                source: file_label(&path),
                result,
            });
        }

        Ok(outcomes)
    }

    /// 写入 JSON 报告
    async fn write_report(&self, outcomes: &[SheetOutcome]) -> Result<()> {
        let entries: Vec<JsonValue> = outcomes.iter().map(SheetOutcome::to_json).collect();
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.config.report_file, content)
            .await
            .map_err(|e| AppError::file_write_failed(&self.config.report_file, e))?;
        Ok(())
    }
}

/// 单张学生卡的评分结果
#[derive(Debug)]
pub struct SheetOutcome {
    pub source: String,
    pub result: Result<GradingResult>,
}

impl SheetOutcome {
    fn to_json(&self) -> JsonValue {
        match &self.result {
            Ok(result) => json!(GradingReport::from(result)),
            Err(e) => json!({
                "status": "error",
                "source": self.source,
                "error": format!("{:#}", e),
            }),
        }
    }
}

fn summarize(outcomes: &[SheetOutcome]) -> RunSummary {
    outcomes
        .iter()
        .fold(RunSummary::default(), |mut summary, outcome| {
            match &outcome.result {
                Ok(result) => {
                    summary.graded += 1;
                    if result.variant_mismatch {
                        summary.mismatched += 1;
                    }
                }
                Err(_) => summary.failed += 1,
            }
            summary
        })
}

/// 读取一张学生卡并评分
async fn grade_one(
    reader: &PaperReader,
    engine: &ScoringEngine,
    key: &AnswerKey,
    path: PathBuf,
    sheet_index: usize,
) -> Result<GradingResult> {
    let ctx = SheetCtx::student(file_label(&path), sheet_index);
    let student = read_sheet(reader, path, ctx).await?;

    let result = match key {
        AnswerKey::Sheet(key) => engine.grade(key, &student)?,
        AnswerKey::Text { label, tokens } => engine.grade_against_key(tokens, label, &student)?,
    };
    Ok(result)
}

/// 收集待评分的答题卡：单个文件，或目录下所有图像（按文件名排序）
///
/// `key_image` 指向的答案卡即使放在同一目录下也不会被当作学生卡。
pub async fn collect_sheets(path: &Path, key_image: Option<&Path>) -> Result<Vec<PathBuf>> {
    info!("\n📁 正在扫描待评分的答题卡...");

    let metadata = fs::metadata(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    if metadata.is_file() {
        return Ok(exclude_key_image(vec![path.to_path_buf()], key_image).await);
    }

    let mut sheets = Vec::new();
    let mut entries = fs::read_dir(path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        let is_sheet = entry_path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| SHEET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_sheet {
            sheets.push(entry_path);
        }
    }

    sheets.sort();
    Ok(exclude_key_image(sheets, key_image).await)
}

/// 按规范化路径比较，去掉答案卡本身
async fn exclude_key_image(sheets: Vec<PathBuf>, key_image: Option<&Path>) -> Vec<PathBuf> {
    let Some(key) = key_image else {
        return sheets;
    };
    let Ok(key) = fs::canonicalize(key).await else {
        return sheets;
    };

    let mut kept = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        match fs::canonicalize(&sheet).await {
            Ok(resolved) if resolved == key => {
                info!("🔑 跳过答案卡: {}", file_label(&sheet));
            }
            _ => kept.push(sheet),
        }
    }
    kept
}

/// 删除已评分的学生卡
async fn cleanup_file(path: &Path, sheet_index: usize) {
    match fs::remove_file(path).await {
        Ok(()) => info!("[试卷 {}] 🗑️ 文件已删除: {}", sheet_index, file_label(path)),
        Err(e) => warn!(
            "[试卷 {}] ⚠️ {}",
            sheet_index,
            AppError::file_delete_failed(path.display().to_string(), e)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_sheets_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.bmp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let sheets = collect_sheets(dir.path(), None).await.unwrap();
        let names: Vec<String> = sheets.iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.bmp"]);
    }

    #[tokio::test]
    async fn test_collect_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.png");
        std::fs::write(&file, b"").unwrap();

        let sheets = collect_sheets(&file, None).await.unwrap();
        assert_eq!(sheets, vec![file]);
    }

    #[tokio::test]
    async fn test_collect_missing_path() {
        assert!(collect_sheets(Path::new("/no/such/dir"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_collect_skips_key_image_in_same_folder() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["key.png", "s1.png", "s2.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        // 用带 `..` 的写法指向答案卡，按规范化路径仍能识别
        let key = dir.path().join("sub").join("..").join("key.png");
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let sheets = collect_sheets(dir.path(), Some(&key)).await.unwrap();
        let names: Vec<String> = sheets.iter().map(|p| file_label(p)).collect();
        assert_eq!(names, vec!["s1.png", "s2.png"]);

        let single = collect_sheets(&dir.path().join("key.png"), Some(&key))
            .await
            .unwrap();
        assert!(single.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_graded_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("done.png");
        std::fs::write(&file, b"").unwrap();

        cleanup_file(&file, 1).await;
        assert!(!file.exists());

        // 文件已不存在时只记录警告
        cleanup_file(&file, 1).await;
    }

    #[test]
    fn test_summarize_counts_mismatches_as_graded() {
        use crate::models::record::{AnswerRecord, DecodedField};

        let sheet = |variant: &str| {
            PaperRecord::new(
                DecodedField::from(variant),
                DecodedField::from("000001"),
                AnswerRecord::from(vec!["A"]),
                "s.png",
            )
        };
        let engine = ScoringEngine::new(1);
        let key = sheet("101");
        let outcomes = vec![
            SheetOutcome {
                source: "a.png".to_string(),
                result: Ok(engine.grade(&key, &sheet("101")).unwrap()),
            },
            SheetOutcome {
                source: "b.png".to_string(),
                result: Ok(engine.grade(&key, &sheet("202")).unwrap()),
            },
            SheetOutcome {
                source: "c.png".to_string(),
                result: Err(anyhow::anyhow!("无法解码")),
            },
        ];

        let summary = summarize(&outcomes);
        assert_eq!(
            summary,
            RunSummary {
                graded: 2,
                failed: 1,
                mismatched: 1,
            }
        );
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn test_initialize_rejects_unusable_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_log_file: dir.path().join("out.txt").display().to_string(),
            ink_level: 0,
            ..Config::default()
        };

        let err = App::initialize(config).await.err().unwrap();
        let app_err = err.downcast_ref::<AppError>().unwrap();
        assert!(app_err.is_fatal());
    }

    #[tokio::test]
    async fn test_text_key_length_is_checked_before_grading() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("key.txt");
        std::fs::write(&key_file, "A,B,C").unwrap();

        let config = Config {
            output_log_file: dir.path().join("out.txt").display().to_string(),
            answer_key_file: Some(key_file.display().to_string()),
            ..Config::default()
        };

        let app = App::initialize(config).await.unwrap();
        let err = app.prepare_answer_key().await.unwrap_err();
        assert!(err.to_string().contains("60"));
    }
}
