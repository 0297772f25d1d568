use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 图像相关错误
    #[error("图像错误: {0}")]
    Image(#[from] ImageError),
    /// 识别模型相关错误
    #[error("识别模型错误: {0}")]
    Classifier(#[from] ClassifierError),
    /// 单个区域解码错误
    #[error("解码错误: {0}")]
    Decode(#[from] DecodeError),
    /// 评分错误
    #[error("评分错误: {0}")]
    Grading(#[from] GradingError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 图像相关错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 图像不存在或已损坏
    #[error("无法读取图像 ({path}): {source}")]
    Unreadable {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 缩放/归一化失败
    #[error("图像预处理失败 ({path}): {reason}")]
    PreprocessingFailure { path: String, reason: String },
}

/// 识别模型错误
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// 启动时模型初始化失败，进程不可用
    #[error("识别模型不可用: {reason}")]
    Unavailable { reason: String },
    /// 单次推理失败
    #[error("推理失败: {reason}")]
    InferenceFailed { reason: String },
    /// 输入块尺寸与模型期望不符
    #[error("输入尺寸 {actual:?} 与模型期望 {expected:?} 不符")]
    InputShape {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// 单个区域（SBD / 试卷代码 / 答题区）的解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 区域扫描过程中出错
    #[error("{field} 解码失败: {source}")]
    FieldDecodeFailure {
        field: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 严格几何模式下，气泡区域超出图像边界
    #[error("气泡区域 ({x}, {y}, {width}x{height}) 超出图像边界")]
    GeometryMismatch {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// 评分错误
#[derive(Debug, Error)]
pub enum GradingError {
    /// 答案数量与模板题目数量不符
    #[error("答案数量错误: 需要 {expected} 题，但答案有 {actual} 题")]
    AnswerKeyLengthMismatch { expected: usize, actual: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 删除文件失败
    #[error("删除文件失败 ({path}): {source}")]
    DeleteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 解析失败
    #[error("模板解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 模板内容不合法
    #[error("模板不合法: {reason}")]
    InvalidLayout { reason: String },
    /// 阈值不在 [0, 1] 区间
    #[error("阈值 {name} = {value} 不在 [0, 1] 区间")]
    InvalidThreshold { name: String, value: f32 },
}

// ========== 从常见错误类型转换 ==========

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建图像读取错误
    pub fn image_unreadable(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Image(ImageError::Unreadable {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建图像预处理错误
    pub fn preprocessing_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Image(ImageError::PreprocessingFailure {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// 创建模型不可用错误
    pub fn classifier_unavailable(reason: impl Into<String>) -> Self {
        AppError::Classifier(ClassifierError::Unavailable {
            reason: reason.into(),
        })
    }

    /// 创建区域解码错误
    pub fn field_decode_failed(
        field: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Decode(DecodeError::FieldDecodeFailure {
            field: field.into(),
            source: Box::new(source),
        })
    }

    /// 创建答案数量不符错误
    pub fn answer_key_length_mismatch(expected: usize, actual: usize) -> Self {
        AppError::Grading(GradingError::AnswerKeyLengthMismatch { expected, actual })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件删除错误
    pub fn file_delete_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::DeleteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建模板不合法错误
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidLayout {
            reason: reason.into(),
        })
    }

    /// 是否属于致命错误（进程不可继续服务）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Classifier(ClassifierError::Unavailable { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
