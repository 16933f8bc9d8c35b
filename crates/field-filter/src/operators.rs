//! 规则操作定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleKind {
    /// 结果替换字段当前值
    Sanitize,
    /// 结果为假时记录错误
    Validate,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sanitize => write!(f, "SANITIZE"),
            Self::Validate => write!(f, "VALIDATE"),
        }
    }
}

/// 内置校验谓词，仅用于 VALIDATE 规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    NotEmpty,
    MinLength,
    MaxLength,
    ExactLength,
    ValidEmail,
}

impl Builtin {
    /// 是否需要长度选项
    pub fn takes_length(&self) -> bool {
        matches!(self, Self::MinLength | Self::MaxLength | Self::ExactLength)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotEmpty => "not_empty",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::ExactLength => "exact_length",
            Self::ValidEmail => "valid_email",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Builtin {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_empty" => Ok(Self::NotEmpty),
            "min_length" => Ok(Self::MinLength),
            "max_length" => Ok(Self::MaxLength),
            "exact_length" => Ok(Self::ExactLength),
            "valid_email" => Ok(Self::ValidEmail),
            _ => Err(RuleError::UnknownOperation(s.to_string())),
        }
    }
}

/// 通用过滤器
///
/// `validate_*` 成功时返回转换后的值，失败时返回 `null`；
/// 其余过滤器总是返回字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    // 校验类
    ValidateInt,
    ValidateFloat,
    ValidateEmail,
    ValidateUrl,
    ValidateIp,

    // 清洗类
    SanitizeNumberInt,
    SanitizeNumberFloat,
    SanitizeEmail,
    SanitizeSpecialChars,

    // 文本变换
    Trim,
    Lowercase,
    Uppercase,
}

impl FilterKind {
    /// 是否接受 min_range / max_range 选项
    pub fn takes_range(&self) -> bool {
        matches!(self, Self::ValidateInt | Self::ValidateFloat)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValidateInt => "validate_int",
            Self::ValidateFloat => "validate_float",
            Self::ValidateEmail => "validate_email",
            Self::ValidateUrl => "validate_url",
            Self::ValidateIp => "validate_ip",
            Self::SanitizeNumberInt => "sanitize_number_int",
            Self::SanitizeNumberFloat => "sanitize_number_float",
            Self::SanitizeEmail => "sanitize_email",
            Self::SanitizeSpecialChars => "sanitize_special_chars",
            Self::Trim => "trim",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FilterKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validate_int" => Ok(Self::ValidateInt),
            "validate_float" => Ok(Self::ValidateFloat),
            "validate_email" => Ok(Self::ValidateEmail),
            "validate_url" => Ok(Self::ValidateUrl),
            "validate_ip" => Ok(Self::ValidateIp),
            "sanitize_number_int" => Ok(Self::SanitizeNumberInt),
            "sanitize_number_float" => Ok(Self::SanitizeNumberFloat),
            "sanitize_email" => Ok(Self::SanitizeEmail),
            "sanitize_special_chars" => Ok(Self::SanitizeSpecialChars),
            "trim" => Ok(Self::Trim),
            "lowercase" => Ok(Self::Lowercase),
            "uppercase" => Ok(Self::Uppercase),
            _ => Err(RuleError::UnknownOperation(s.to_string())),
        }
    }
}

/// 用户回调，接收字段当前值并返回结果
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// 规则操作
#[derive(Debug, Clone)]
pub enum Operation {
    Callback(Callback),
    /// 以选项中的字符串作为正则进行匹配
    Regex,
    /// 布尔词识别 (true/false/on/off/yes/no/1/0)
    Boolean,
    Builtin(Builtin),
    Filter(FilterKind),
}

impl Operation {
    /// 包装任意回调
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Callback(Callback::new(f))
    }

    /// 包装布尔谓词，常用于 VALIDATE
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::callback(move |v| Value::Bool(f(v)))
    }

    /// 包装文本变换，非字符串标量先转为文本
    pub fn map_str<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::callback(move |v| match crate::evaluator::as_text(v) {
            Some(text) => Value::String(f(&text)),
            None => v.clone(),
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => write!(f, "callback"),
            Self::Regex => write!(f, "regex"),
            Self::Boolean => write!(f, "boolean"),
            Self::Builtin(b) => write!(f, "{}", b),
            Self::Filter(k) => write!(f, "{}", k),
        }
    }
}

impl FromStr for Operation {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regex" => Ok(Self::Regex),
            "boolean" => Ok(Self::Boolean),
            _ => s
                .parse::<Builtin>()
                .map(Self::Builtin)
                .or_else(|_| s.parse::<FilterKind>().map(Self::Filter)),
        }
    }
}

impl From<Builtin> for Operation {
    fn from(b: Builtin) -> Self {
        Self::Builtin(b)
    }
}

impl From<FilterKind> for Operation {
    fn from(k: FilterKind) -> Self {
        Self::Filter(k)
    }
}
