//! 错误类型
//!
//! 只用于加载期 / I/O 失败。核心算法（切图、组卷、评分、身份校正）永远返回结果，
//! 异常情况通过状态字段上报，不走错误通道。

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 数据校验错误（答案表 / 名单 / 检测框格式不对）
    #[error("数据错误: {0}")]
    Data(#[from] DataError),
    /// 图像读写错误
    #[error("图像错误: {0}")]
    Image(#[from] ImageError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 版式描述不合法
    #[error("答题卡版式不合法: {reason}")]
    InvalidLayout { reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed { path: String, source: BoxedSource },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed { path: String, source: BoxedSource },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed { path: String, source: BoxedSource },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 数据校验错误
///
/// 答案表、名单在加载时一次性校验，进入核心算法后不再检查形状。
#[derive(Debug, Error)]
pub enum DataError {
    /// 必填字段为空
    #[error("{record} 的字段 {field} 不能为空")]
    EmptyField {
        record: &'static str,
        field: &'static str,
    },
    /// 置信度不在 [0, 1]
    #[error("置信度 {value} 不在 [0, 1] 范围内")]
    InvalidConfidence { value: f32 },
    /// 检测框坐标不合法
    #[error("检测框坐标不合法: ({x1}, {y1}, {x2}, {y2})")]
    InvalidBoundingBox { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// 答案表为空
    #[error("答案表中没有任何试卷代码")]
    EmptyAnswerKey,
    /// 试卷代码重复
    #[error("试卷代码 {code} 重复出现")]
    DuplicateVariantCode { code: String },
    /// 各试卷题目数量不一致
    #[error("试卷代码 {code} 有 {actual} 道题，其他试卷为 {expected} 道")]
    InconsistentKeyLength {
        code: String,
        expected: usize,
        actual: usize,
    },
    /// 名单为空
    #[error("学生名单为空")]
    EmptyRoster,
}

/// 图像读写错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 解码失败
    #[error("无法读取图像 ({path}): {source}")]
    DecodeFailed { path: String, source: BoxedSource },
    /// 保存失败
    #[error("无法保存图像 ({path}): {source}")]
    EncodeFailed { path: String, source: BoxedSource },
}

// ========== 便捷构造函数 ==========

impl AppError {
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

    /// 创建图像解码错误
    pub fn image_decode_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Image(ImageError::DecodeFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建图像保存错误
    pub fn image_encode_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Image(ImageError::EncodeFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建版式错误
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidLayout {
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
