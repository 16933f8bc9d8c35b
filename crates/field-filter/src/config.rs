//! 配置管理模块
//!
//! 进程级的“多字段错误”开关，以及从配置文件和环境变量加载引擎配置。

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// 进程级开关：是否在字段首个校验失败后继续执行后续规则
static MULTIPLE_FIELD_ERRORS: AtomicBool = AtomicBool::new(false);

/// 设置进程级多字段错误开关
///
/// 引擎在执行时读取该开关，而不是在构造时，因此修改会影响所有尚未执行的引擎。
pub fn set_multiple_field_errors(enabled: bool) {
    MULTIPLE_FIELD_ERRORS.store(enabled, Ordering::SeqCst);
}

/// 读取进程级多字段错误开关
pub fn multiple_field_errors() -> bool {
    MULTIPLE_FIELD_ERRORS.load(Ordering::SeqCst)
}

/// 错误收集策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// 每个字段只保留第一条错误，并跳过剩余规则
    FirstError,
    /// 执行字段的全部规则并累积所有错误
    AllErrors,
}

impl ErrorPolicy {
    /// 当前进程级开关对应的策略
    pub fn global() -> Self {
        Self::from_switch(multiple_field_errors())
    }

    pub fn from_switch(multiple: bool) -> Self {
        if multiple {
            Self::AllErrors
        } else {
            Self::FirstError
        }
    }

    pub fn collects_all(&self) -> bool {
        matches!(self, Self::AllErrors)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 引擎配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub environment: String,
    pub multiple_field_errors: bool,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml
    /// 2. config/{environment}.toml
    /// 3. 环境变量（FIELD_FILTER_ 前缀，如 FIELD_FILTER_MULTIPLE_FIELD_ERRORS=true）
    pub fn load() -> Result<Self> {
        let env = std::env::var("FIELD_FILTER_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(Path::new(&config_dir), &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, env: &str) -> Result<Self> {
        let config = Config::builder()
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            // 单下划线分隔会拆开 multiple_field_errors，这里用双下划线表示嵌套
            .add_source(
                Environment::with_prefix("FIELD_FILTER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 将配置中的开关写入进程级状态
    pub fn apply(&self) {
        set_multiple_field_errors(self.multiple_field_errors);
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_switch(self.multiple_field_errors)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
