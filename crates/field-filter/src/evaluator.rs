//! 规则评估器
//!
//! 对单个字段值执行一条编译后的规则，返回规则结果。
//! SANITIZE 规则的结果替换字段值；VALIDATE 规则的结果为 `false` 或 `null` 时视为失败。

use crate::compiler::{CompiledRule, Range};
use crate::operators::{Builtin, FilterKind, Operation, RuleKind};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::net::IpAddr;
use validator::{ValidateEmail, ValidateUrl};

/// 规则评估器
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// 执行规则
    ///
    /// # Arguments
    /// * `rule` - 编译后的规则
    /// * `value` - 字段当前值（已应用此前的 SANITIZE 规则）
    pub fn apply(rule: &CompiledRule, value: &Value) -> Value {
        let kind = rule.kind();

        match rule.operation() {
            Operation::Callback(callback) => callback.call(value),
            Operation::Regex => Self::regex_match(rule, kind, value),
            Operation::Boolean => match (kind, parse_bool(value)) {
                (RuleKind::Validate, parsed) => Value::Bool(parsed.is_some()),
                (RuleKind::Sanitize, Some(b)) => Value::Bool(b),
                (RuleKind::Sanitize, None) => Value::Null,
            },
            Operation::Builtin(builtin) => {
                Value::Bool(Self::builtin(*builtin, rule.length.unwrap_or(0), value))
            }
            Operation::Filter(filter) => Self::filter(*filter, rule.range, value),
        }
    }

    /// 正则匹配
    ///
    /// VALIDATE 返回匹配结果；SANITIZE 匹配时保留原值，否则返回 `null`。
    fn regex_match(rule: &CompiledRule, kind: RuleKind, value: &Value) -> Value {
        let matched = match (&rule.regex, as_text(value)) {
            (Some(regex), Some(text)) => regex.is_match(&text),
            _ => false,
        };

        match kind {
            RuleKind::Validate => Value::Bool(matched),
            RuleKind::Sanitize if matched => value.clone(),
            RuleKind::Sanitize => Value::Null,
        }
    }

    /// 内置校验谓词
    fn builtin(builtin: Builtin, length: usize, value: &Value) -> bool {
        let Some(text) = as_text(value) else {
            return false;
        };

        match builtin {
            Builtin::NotEmpty => !text.trim().is_empty(),
            Builtin::MinLength => text_length(&text) >= length,
            Builtin::MaxLength => text_length(&text) <= length,
            Builtin::ExactLength => text_length(&text) == length,
            Builtin::ValidEmail => is_email(&text) && has_dot_after_at(&text),
        }
    }

    /// 通用过滤器
    fn filter(filter: FilterKind, range: Range, value: &Value) -> Value {
        let Some(text) = as_text(value) else {
            return Value::Null;
        };

        match filter {
            FilterKind::ValidateInt => Self::validate_int(value, &text, range),
            FilterKind::ValidateFloat => Self::validate_float(value, &text, range),
            FilterKind::ValidateEmail => keep_if(is_email(&text), &text),
            FilterKind::ValidateUrl => keep_if(is_url(&text), &text),
            FilterKind::ValidateIp => keep_if(text.trim().parse::<IpAddr>().is_ok(), &text),
            FilterKind::SanitizeNumberInt => {
                Value::String(retain(&text, |c| c.is_ascii_digit() || c == '+' || c == '-'))
            }
            FilterKind::SanitizeNumberFloat => Value::String(retain(&text, |c| {
                c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
            })),
            FilterKind::SanitizeEmail => Value::String(retain(&text, |c| {
                c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
            })),
            FilterKind::SanitizeSpecialChars => Value::String(escape_special_chars(&text)),
            FilterKind::Trim => Value::String(text.trim().to_string()),
            FilterKind::Lowercase => Value::String(text.to_lowercase()),
            FilterKind::Uppercase => Value::String(text.to_uppercase()),
        }
    }

    /// 整数校验，成功返回整数值
    fn validate_int(value: &Value, text: &str, range: Range) -> Value {
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => parse_int(text.trim()),
        };

        match parsed {
            Some(n) if range.contains(n as f64) => Value::from(n),
            _ => Value::Null,
        }
    }

    /// 浮点数校验，成功返回数值
    fn validate_float(value: &Value, text: &str, range: Range) -> Value {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            _ => text.trim().parse::<f64>().ok(),
        };

        parsed
            .filter(|f| f.is_finite() && range.contains(*f))
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// 将标量转换为文本
///
/// `true` -> "1"，`false` / `null` -> ""，数字取十进制表示；数组和对象返回 `None`。
pub fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(true) => Some(Cow::Borrowed("1")),
        Value::Bool(false) | Value::Null => Some(Cow::Borrowed("")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// 规则结果是否为假（`false` 或 `null`）
pub fn is_falsy(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// 解析布尔词，无法识别时返回 `None`
pub fn parse_bool(value: &Value) -> Option<bool> {
    if let Value::Bool(b) = value {
        return Some(*b);
    }

    let text = as_text(value)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// 获取值的类型名称
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 文本长度，按 Unicode 字符计数
fn text_length(text: &str) -> usize {
    text.chars().count()
}

fn is_email(text: &str) -> bool {
    text.validate_email()
}

fn is_url(text: &str) -> bool {
    text.validate_url()
}

/// 十进制整数：可带符号，不允许前导零（"0" 本身除外）
fn parse_int(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    text.parse().ok()
}

/// `@` 之后至少隔一个字符出现 `.`
fn has_dot_after_at(text: &str) -> bool {
    match text.find('@') {
        Some(at) => text[at + 1..]
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0),
        None => false,
    }
}

fn keep_if(ok: bool, text: &str) -> Value {
    if ok {
        Value::String(text.to_string())
    } else {
        Value::Null
    }
}

fn retain(text: &str, keep: impl Fn(char) -> bool) -> String {
    text.chars().filter(|c| keep(*c)).collect()
}

fn escape_special_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&#38;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&#60;"),
            '>' => out.push_str("&#62;"),
            _ => out.push(c),
        }
    }
    out
}
