//! 字段过滤引擎
//!
//! 对字段名到原始值的映射按字段执行有序的清洗和校验规则：
//! - 规则链式注册，注册时校验操作与选项
//! - 首次读取结果时惰性执行，每个数据集只执行一次
//! - 首错短路或多错累积两种错误策略
//! - 带 `:field` 占位符的错误模板

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod observability;
pub mod operators;

pub use compiler::{CompiledRule, RuleCompiler};
pub use config::{multiple_field_errors, set_multiple_field_errors, EngineConfig, ErrorPolicy};
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use models::{ErrorStore, ErrorTemplate, FieldErrors, FieldSelector, FieldSet, Rule};
pub use operators::{Builtin, Callback, FilterKind, Operation, RuleKind};
