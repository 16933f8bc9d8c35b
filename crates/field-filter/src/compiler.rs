//! 规则编译器
//!
//! 注册规则时校验操作和选项的兼容性，并预编译正则、长度、范围等参数，
//! 使配置错误在注册阶段暴露，而不是在执行阶段产生无意义的结果。

use crate::error::{Result, RuleError};
use crate::evaluator::type_name;
use crate::models::Rule;
use crate::operators::{Builtin, Operation, RuleKind};
use regex::Regex;
use serde_json::Value;

/// 数值范围（min_range / max_range）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn contains(&self, n: f64) -> bool {
        self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
    }
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    /// 预编译的正则（regex 操作）
    pub regex: Option<Regex>,
    /// 长度参数（长度类内置校验）
    pub length: Option<usize>,
    /// 数值范围（validate_int / validate_float）
    pub range: Range,
}

impl CompiledRule {
    pub fn kind(&self) -> RuleKind {
        self.rule.kind
    }

    pub fn operation(&self) -> &Operation {
        &self.rule.operation
    }
}

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则
    pub fn compile(rule: Rule) -> Result<CompiledRule> {
        let mut compiled = CompiledRule {
            regex: None,
            length: None,
            range: Range::default(),
            rule,
        };

        match &compiled.rule.operation {
            Operation::Callback(_) | Operation::Boolean => {}
            Operation::Regex => {
                compiled.regex = Some(Self::compile_pattern(&compiled.rule.options)?);
            }
            Operation::Builtin(builtin) => {
                if compiled.rule.kind == RuleKind::Sanitize {
                    return Err(RuleError::BuiltinNotSanitizable {
                        builtin: builtin.to_string(),
                    });
                }
                if builtin.takes_length() {
                    compiled.length = Some(Self::parse_length(*builtin, &compiled.rule.options)?);
                }
            }
            Operation::Filter(kind) => {
                let operation = kind.to_string();
                match &compiled.rule.options {
                    Value::Null => {}
                    Value::Object(_) if kind.takes_range() => {
                        compiled.range = Range {
                            min: Self::parse_bound(&operation, &compiled.rule.options, "min_range")?,
                            max: Self::parse_bound(&operation, &compiled.rule.options, "max_range")?,
                        };
                    }
                    Value::Object(_) => {
                        // 其余过滤器不读取选项
                    }
                    other => {
                        return Err(RuleError::InvalidOptions {
                            operation,
                            expected: "null or object".to_string(),
                            actual: type_name(other).to_string(),
                        });
                    }
                }
            }
        }

        Ok(compiled)
    }

    /// 预编译正则表达式
    fn compile_pattern(options: &Value) -> Result<Regex> {
        let pattern = options.as_str().ok_or_else(|| RuleError::InvalidOptions {
            operation: "regex".to_string(),
            expected: "string (regex pattern)".to_string(),
            actual: type_name(options).to_string(),
        })?;

        Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    /// 解析长度参数
    fn parse_length(builtin: Builtin, options: &Value) -> Result<usize> {
        options
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| RuleError::InvalidOptions {
                operation: builtin.to_string(),
                expected: "non-negative integer".to_string(),
                actual: type_name(options).to_string(),
            })
    }

    /// 解析范围边界
    fn parse_bound(operation: &str, options: &Value, key: &str) -> Result<Option<f64>> {
        match options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(RuleError::InvalidOptions {
                operation: format!("{}.{}", operation, key),
                expected: "number".to_string(),
                actual: type_name(other).to_string(),
            }),
        }
    }
}
