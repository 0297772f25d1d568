//! 答题卡处理上下文
//!
//! 封装"我正在读哪一张卡、它是答案卡还是学生卡"这一信息

use std::fmt::Display;

/// 答题卡在一次评分中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRole {
    /// 答案卡
    Key,
    /// 学生卡
    Student,
}

/// 答题卡处理上下文
#[derive(Debug, Clone)]
pub struct SheetCtx {
    /// 来源标识（文件名）
    pub label: String,

    /// 序号（仅用于日志显示）
    pub sheet_index: usize,

    pub role: SheetRole,
}

impl SheetCtx {
    pub fn new(label: impl Into<String>, sheet_index: usize, role: SheetRole) -> Self {
        Self {
            label: label.into(),
            sheet_index,
            role,
        }
    }

    pub fn key(label: impl Into<String>) -> Self {
        Self::new(label, 0, SheetRole::Key)
    }

    pub fn student(label: impl Into<String>, sheet_index: usize) -> Self {
        Self::new(label, sheet_index, SheetRole::Student)
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            SheetRole::Key => write!(f, "[答案卡 {}]", self.label),
            SheetRole::Student => write!(f, "[试卷 {} {}]", self.sheet_index, self.label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_prefix() {
        assert_eq!(SheetCtx::key("key.png").to_string(), "[答案卡 key.png]");
        assert_eq!(SheetCtx::student("s1.png", 3).to_string(), "[试卷 3 s1.png]");
    }
}
