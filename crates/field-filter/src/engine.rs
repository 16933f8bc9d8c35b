//! 字段过滤引擎
//!
//! 按字段登记 SANITIZE / VALIDATE 规则，在首次读取结果时惰性执行：
//! - 同一字段的规则按注册顺序执行，SANITIZE 的结果对后续规则可见
//! - VALIDATE 失败时按错误模板记录错误，默认策略下立即跳过该字段剩余规则
//! - 每个数据集最多执行一次，`set_data` 重置规则、错误和执行标记

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::config::ErrorPolicy;
use crate::error::{Result, RuleError};
use crate::evaluator::{is_falsy, RuleEvaluator};
use crate::models::{render_error, ErrorStore, ErrorTemplate, FieldErrors, FieldSelector, FieldSet, Rule};
use crate::operators::{Operation, RuleKind};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// 字段过滤引擎
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    data: FieldSet,
    rules: IndexMap<String, Vec<CompiledRule>>,
    errors: ErrorStore,
    filtered: bool,
    /// 显式策略；为空时在执行时读取进程级开关
    policy: Option<ErrorPolicy>,
}

impl RuleEngine {
    pub fn new(data: FieldSet) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// 与 `new` 相同，便于链式调用
    pub fn factory(data: FieldSet) -> Self {
        Self::new(data)
    }

    /// 从 JSON 对象创建，保持对象中的字段顺序
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map.into_iter().collect())),
            other => Err(RuleError::InvalidData(format!(
                "需要 JSON 对象, 实际 {}",
                crate::evaluator::type_name(&other)
            ))),
        }
    }

    /// 为该实例指定错误策略，覆盖进程级开关
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// 登记 SANITIZE 规则
    pub fn sanitize(
        &mut self,
        fields: impl Into<FieldSelector>,
        operation: impl Into<Operation>,
        options: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.add(fields.into(), Rule::sanitize(operation.into(), options.into()))
    }

    /// 登记 VALIDATE 规则
    ///
    /// `error` 为空时使用默认模板 `Invalid :field`。
    pub fn validate(
        &mut self,
        fields: impl Into<FieldSelector>,
        operation: impl Into<Operation>,
        options: impl Into<Value>,
        error: Option<ErrorTemplate>,
    ) -> Result<&mut Self> {
        self.add(
            fields.into(),
            Rule::validate(operation.into(), options.into(), error),
        )
    }

    #[instrument(skip_all, fields(kind = %rule.kind, operation = %rule.operation))]
    fn add(&mut self, selector: FieldSelector, rule: Rule) -> Result<&mut Self> {
        let compiled = RuleCompiler::compile(rule).inspect_err(|e| {
            warn!(error = %e, code = e.code(), "规则注册失败");
        })?;

        let fields = selector.resolve(&self.data);
        debug!(fields = ?fields, "规则已注册");

        for field in fields {
            self.rules.entry(field).or_default().push(compiled.clone());
        }

        Ok(self)
    }

    /// 所有规则是否都通过
    pub fn ok(&mut self) -> bool {
        self.errors().is_empty()
    }

    /// 执行规则并返回错误表
    pub fn errors(&mut self) -> &ErrorStore {
        self.run();
        &self.errors
    }

    /// 执行规则并返回清洗后的数据，数据为空时返回 `None`
    pub fn data(&mut self) -> Option<&FieldSet> {
        if self.data.is_empty() {
            return None;
        }
        self.run();
        Some(&self.data)
    }

    /// 设置新数据并重置规则、错误和执行标记
    ///
    /// 空数据不做任何改变。
    pub fn set_data(&mut self, data: FieldSet) -> &mut Self {
        if data.is_empty() {
            return self;
        }

        self.data = data;
        self.rules.clear();
        self.errors.clear();
        self.filtered = false;
        self
    }

    /// 执行规则并取出数据
    pub fn into_data(mut self) -> Option<FieldSet> {
        if self.data.is_empty() {
            return None;
        }
        self.run();
        Some(self.data)
    }

    /// 已登记的规则总数（按字段展开）
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// 当前数据集是否已执行
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// 执行全部规则，每个数据集只执行一次
    #[instrument(skip_all, fields(fields = self.rules.len()))]
    fn run(&mut self) {
        if self.filtered || self.data.is_empty() || self.rules.is_empty() {
            return;
        }

        let policy = self.policy.unwrap_or_else(ErrorPolicy::global);

        for (field, rules) in &self.rules {
            let mut value = self.data.get(field).cloned().unwrap_or(Value::Null);

            for rule in rules {
                let result = RuleEvaluator::apply(rule, &value);

                match rule.kind() {
                    RuleKind::Sanitize => value = result,
                    RuleKind::Validate if is_falsy(&result) => {
                        let message = render_error(rule.rule.error.as_ref(), field);
                        debug!(field = %field, operation = %rule.operation(), "校验失败");
                        Self::record_error(&mut self.errors, policy, field, message);

                        if !policy.collects_all() {
                            break;
                        }
                    }
                    RuleKind::Validate => {}
                }
            }

            self.data.insert(field.clone(), value);
        }

        self.filtered = true;

        info!(
            error_fields = self.errors.len(),
            policy = ?policy,
            "规则执行完成"
        );
    }

    /// 按策略记录错误：首错覆盖，多错追加
    fn record_error(errors: &mut ErrorStore, policy: ErrorPolicy, field: &str, message: String) {
        match policy {
            ErrorPolicy::FirstError => {
                errors.insert(field.to_string(), FieldErrors::Single(message));
            }
            ErrorPolicy::AllErrors => {
                let entry = errors
                    .entry(field.to_string())
                    .or_insert_with(|| FieldErrors::Multiple(Vec::new()));
                match entry {
                    FieldErrors::Multiple(list) => list.push(message),
                    FieldErrors::Single(prev) => {
                        let prev = std::mem::take(prev);
                        *entry = FieldErrors::Multiple(vec![prev, message]);
                    }
                }
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RuleEngine
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
