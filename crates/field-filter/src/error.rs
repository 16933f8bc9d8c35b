//! 过滤引擎错误类型
//!
//! 只描述调用方的配置错误。字段校验失败属于正常结果，写入错误表而不是返回 `Err`。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("未知的操作: {0}")]
    UnknownOperation(String),

    #[error("内置校验 {builtin} 只能用于 VALIDATE 规则")]
    BuiltinNotSanitizable { builtin: String },

    #[error("无效的规则选项: {operation} 需要 {expected}, 实际 {actual}")]
    InvalidOptions {
        operation: String,
        expected: String,
        actual: String,
    },

    #[error("无效的正则表达式 '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("无效的输入数据: {0}")]
    InvalidData(String),

    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::BuiltinNotSanitizable { .. } => "BUILTIN_NOT_SANITIZABLE",
            Self::InvalidOptions { .. } => "INVALID_OPTIONS",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}
