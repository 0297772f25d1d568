//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责评分入口和批量调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `grading` - 单次评分入口
//! - 两张已归一化的答题卡 → `GradingResult`
//! - 两个图像文件 → 并发解码 → `GradingResult`
//!
//! ### `batch_processor` - 批量评分处理器
//! - 管理应用生命周期（初始化、运行）
//! - 构造并持有唯一的识别模型
//! - 控制并发数量（Semaphore）
//! - 输出 JSON 报告和全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<学生卡>)
//!     ↓
//! grading (处理一对答题卡)
//!     ↓
//! workflow::PaperReader (处理单张答题卡)
//!     ↓
//! services (能力层：坐标 / 数字区 / 答题区 / 评分)
//!     ↓
//! infrastructure (基础设施：识别模型、图像)
//! ```

pub mod batch_processor;
pub mod grading;

// 重新导出主要类型
pub use batch_processor::{collect_sheets, AnswerKey, App, SheetOutcome};
pub use grading::{grade_files, grade_sheets, read_sheet};
