//! # OMR Grader
//!
//! 一个用于答题卡（选择题涂卡）自动评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，数据单向流动：
//! 模板 → 坐标映射 → 数字区 / 答题区解码 → 整卡解码 → 评分
//!
//! ### ① 数据模型（Models）
//! - `models/` - 答题卡模板 `TemplateLayout`，解码结果 `PaperRecord`，评分结果 `GradingResult`
//!
//! ### ② 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（识别模型），只暴露能力
//! - `MarkClassifier` - 气泡识别能力，启动时构造一次，只读共享
//! - `sheet_image` - 图像读取、归一化、气泡裁剪
//!
//! ### ③ 业务能力层（Services）
//! - `CoordinateMapper` - 逻辑地址 → 像素矩形（纯函数）
//! - `GridDecoder` - SBD / 试卷代码，按置信度仲裁
//! - `AnswerGridReader` - 答题区，多选按选项顺序以 `|` 连接
//! - `ScoringEngine` - 试卷代码比较与计分
//!
//! ### ④ 流程层（Workflow）
//! - `PaperReader` - 一张卡的完整解码流程（试卷代码 → SBD → 答案）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/grading` - 一对答题卡的评分入口
//! - `orchestrator/batch_processor` - 批量评分，管理资源和并发
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FillRatioClassifier, MarkClassifier, MarkPrediction};
pub use models::{AnswerRecord, AnswerToken, DecodedField, GradingResult, PaperRecord, TemplateLayout};
pub use orchestrator::{grade_files, grade_sheets, App};
pub use services::{DecodePolicy, ScoringEngine};
pub use workflow::{PaperReader, SheetCtx};
