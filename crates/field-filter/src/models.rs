//! 过滤引擎领域模型

use crate::operators::{Operation, RuleKind};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// 字段集合：字段名 -> 当前值，保持插入顺序
pub type FieldSet = IndexMap<String, Value>;

/// 错误表：字段名 -> 错误信息
pub type ErrorStore = IndexMap<String, FieldErrors>;

/// 未指定错误模板时使用的默认模板
pub const DEFAULT_ERROR_TEMPLATE: &str = "Invalid :field";

/// 模板中的字段占位符
pub const FIELD_TOKEN: &str = ":field";

/// 字段选择器
///
/// 在注册规则时解析，`All` 取注册那一刻数据中的全部字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    All,
    One(String),
    Many(Vec<String>),
}

impl FieldSelector {
    /// 解析为具体字段列表
    pub fn resolve(&self, data: &FieldSet) -> Vec<String> {
        match self {
            Self::All => data.keys().cloned().collect(),
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

impl From<bool> for FieldSelector {
    /// `true` 表示全部字段，`false` 不选择任何字段
    fn from(all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::Many(Vec::new())
        }
    }
}

impl From<&str> for FieldSelector {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for FieldSelector {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for FieldSelector {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for FieldSelector {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldSelector {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

/// 错误模板
///
/// 纯字符串，或模板加上字段显示名映射。模板中的 `:field` 会被替换。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorTemplate {
    Message(String),
    Labeled {
        template: String,
        labels: HashMap<String, String>,
    },
}

impl ErrorTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self::Message(template.into())
    }

    /// 带字段显示名的模板
    pub fn with_labels<I, K, V>(template: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Labeled {
            template: template.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 渲染指定字段的错误信息
    pub fn render(&self, field: &str) -> String {
        match self {
            Self::Message(template) => template.replace(FIELD_TOKEN, field),
            Self::Labeled { template, labels } => {
                let label = labels.get(field).map(String::as_str).unwrap_or(field);
                template.replace(FIELD_TOKEN, label)
            }
        }
    }
}

impl From<&str> for ErrorTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for ErrorTemplate {
    fn from(template: String) -> Self {
        Self::Message(template)
    }
}

/// 渲染错误信息，未提供模板时使用默认模板
pub fn render_error(template: Option<&ErrorTemplate>, field: &str) -> String {
    match template {
        Some(t) => t.render(field),
        None => DEFAULT_ERROR_TEMPLATE.replace(FIELD_TOKEN, field),
    }
}

/// 规则定义
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub operation: Operation,
    pub options: Value,
    pub error: Option<ErrorTemplate>,
}

impl Rule {
    pub fn sanitize(operation: Operation, options: Value) -> Self {
        Self {
            kind: RuleKind::Sanitize,
            operation,
            options,
            error: None,
        }
    }

    pub fn validate(operation: Operation, options: Value, error: Option<ErrorTemplate>) -> Self {
        Self {
            kind: RuleKind::Validate,
            operation,
            options,
            error,
        }
    }
}

/// 单个字段的错误
///
/// 默认策略下只保留第一条，多错误策略下按注册顺序累积。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldErrors {
    /// 所有错误信息
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Single(msg) => std::slice::from_ref(msg),
            Self::Multiple(msgs) => msgs,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.messages().first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

impl PartialEq<str> for FieldErrors {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::Single(msg) if msg == other)
    }
}

impl PartialEq<&str> for FieldErrors {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
