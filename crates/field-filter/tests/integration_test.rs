//! 过滤引擎集成测试
//!
//! 测试完整的注册、惰性执行、错误收集工作流。

use field_filter::{
    Builtin, ErrorPolicy, ErrorTemplate, FieldErrors, FieldSet, FilterKind, Operation,
    RuleEngine, RuleError,
};
use serde_json::{json, Value};

/// 创建测试数据：模拟一个注册表单
fn create_signup_form() -> FieldSet {
    let form = json!({
        "username": "  alice_01  ",
        "email": " Alice@Example.COM ",
        "password": "secret",
        "age": "29",
        "newsletter": "Yes",
        "bio": "<b>hi</b>"
    });
    serde_json::from_value(form).unwrap()
}

fn trim() -> Operation {
    Operation::map_str(|s| s.trim().to_string())
}

// ==================== 完整工作流测试 ====================

#[test]
fn test_full_signup_workflow() {
    let mut engine =
        RuleEngine::new(create_signup_form()).with_error_policy(ErrorPolicy::FirstError);

    engine
        .sanitize(true, trim(), ())
        .unwrap()
        .sanitize("email", FilterKind::Lowercase, ())
        .unwrap()
        .sanitize("bio", FilterKind::SanitizeSpecialChars, ())
        .unwrap()
        .validate(["username", "email", "password"], Builtin::NotEmpty, (), None)
        .unwrap()
        .validate("username", Operation::Regex, r"^[a-z0-9_]+$", None)
        .unwrap()
        .validate("email", Builtin::ValidEmail, (), None)
        .unwrap()
        .validate(
            "password",
            Builtin::MinLength,
            8,
            Some(ErrorTemplate::with_labels(
                ":field must be at least 8 characters",
                [("password", "Password")],
            )),
        )
        .unwrap()
        .validate(
            "age",
            FilterKind::ValidateInt,
            json!({"min_range": 18, "max_range": 120}),
            None,
        )
        .unwrap()
        .validate("newsletter", Operation::Boolean, (), None)
        .unwrap();

    assert!(!engine.ok());

    let errors = engine.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["password"], "Password must be at least 8 characters");

    let data = engine.data().unwrap();
    assert_eq!(data["username"], json!("alice_01"));
    assert_eq!(data["email"], json!("alice@example.com"));
    assert_eq!(data["bio"], json!("&#60;b&#62;hi&#60;/b&#62;"));
    // VALIDATE 规则不修改字段值
    assert_eq!(data["age"], json!("29"));
}

#[test]
fn test_field_order_preserved() {
    let mut engine = RuleEngine::from_iter([("zeta", " z "), ("alpha", " a "), ("mid", " m ")]);
    engine.sanitize(true, trim(), ()).unwrap();

    let keys: Vec<&str> = engine
        .data()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
}

// ==================== 短路与多错误策略 ====================

#[test]
fn test_first_error_short_circuits() {
    let mut engine = RuleEngine::from_iter([("code", "ab")])
        .with_error_policy(ErrorPolicy::FirstError);
    engine
        .validate("code", Builtin::MinLength, 3, Some("first".into()))
        .unwrap()
        .validate("code", Builtin::ExactLength, 4, Some("second".into()))
        .unwrap()
        .sanitize("code", FilterKind::Uppercase, ())
        .unwrap();

    assert_eq!(engine.errors()["code"], FieldErrors::Single("first".to_string()));
    // 短路后的 SANITIZE 规则不会执行
    assert_eq!(engine.data().unwrap()["code"], json!("ab"));
}

#[test]
fn test_all_errors_accumulate_in_order() {
    let mut engine = RuleEngine::from_iter([("code", "ab"), ("ok", "fine")])
        .with_error_policy(ErrorPolicy::AllErrors);
    engine
        .validate("code", Builtin::MinLength, 3, Some("first".into()))
        .unwrap()
        .validate("code", Builtin::ExactLength, 4, Some("second".into()))
        .unwrap()
        .sanitize("code", FilterKind::Uppercase, ())
        .unwrap()
        .validate("ok", Builtin::NotEmpty, (), None)
        .unwrap();

    assert!(!engine.ok());
    let errors = engine.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["code"].messages(), ["first", "second"]);
    // 多错误策略下后续规则继续执行
    assert_eq!(engine.data().unwrap()["code"], json!("AB"));
}

#[test]
fn test_ok_when_every_rule_passes() {
    let mut engine = RuleEngine::from_iter([("ip", "10.0.0.1"), ("site", "https://a.io")])
        .with_error_policy(ErrorPolicy::AllErrors);
    engine
        .validate("ip", FilterKind::ValidateIp, (), None)
        .unwrap()
        .validate("site", FilterKind::ValidateUrl, (), None)
        .unwrap();

    assert!(engine.ok());
    assert!(engine.errors().is_empty());
}

// ==================== 数据重置 ====================

#[test]
fn test_reuse_engine_with_new_data() {
    let mut engine = RuleEngine::from_iter([("name", "")])
        .with_error_policy(ErrorPolicy::FirstError);
    engine.validate("name", Builtin::NotEmpty, (), None).unwrap();
    assert!(!engine.ok());

    let next: FieldSet = serde_json::from_value(json!({"name": "  Bob  "})).unwrap();
    engine
        .set_data(next)
        .sanitize("name", trim(), ())
        .unwrap();

    assert!(engine.ok());
    assert_eq!(engine.data().unwrap()["name"], json!("Bob"));
}

// ==================== 回调 ====================

#[test]
fn test_callback_sees_sanitized_value() {
    let mut engine = RuleEngine::from_iter([("qty", " 12 ")])
        .with_error_policy(ErrorPolicy::FirstError);
    engine
        .sanitize("qty", trim(), ())
        .unwrap()
        .sanitize(
            "qty",
            Operation::callback(|v| match v.as_str().and_then(|s| s.parse::<i64>().ok()) {
                Some(n) => json!(n * 2),
                None => Value::Null,
            }),
            (),
        )
        .unwrap()
        .validate("qty", Operation::predicate(|v| v.as_i64() == Some(24)), (), None)
        .unwrap();

    assert!(engine.ok());
    assert_eq!(engine.into_data().unwrap()["qty"], json!(24));
}

#[test]
fn test_operation_parsed_from_name() {
    let op: Operation = "exact_length".parse().unwrap();
    let mut engine = RuleEngine::from_iter([("pin", "1234")])
        .with_error_policy(ErrorPolicy::FirstError);
    engine.validate("pin", op, 4, None).unwrap();
    assert!(engine.ok());

    let err = "is_numeric".parse::<Operation>().unwrap_err();
    assert!(matches!(err, RuleError::UnknownOperation(_)));
}

// ==================== 配置错误 ====================

#[test]
fn test_configuration_errors() {
    let mut engine = RuleEngine::from_iter([("a", "x")]);

    assert!(matches!(
        engine.validate("a", Operation::Regex, "[", None),
        Err(RuleError::InvalidPattern { .. })
    ));
    assert!(matches!(
        engine.validate("a", Builtin::MinLength, "five", None),
        Err(RuleError::InvalidOptions { .. })
    ));
    assert!(matches!(
        engine.sanitize("a", Builtin::ValidEmail, ()),
        Err(RuleError::BuiltinNotSanitizable { .. })
    ));
    assert!(matches!(
        engine.validate("a", FilterKind::ValidateFloat, "x", None),
        Err(RuleError::InvalidOptions { .. })
    ));

    assert_eq!(engine.rule_count(), 0);
    assert!(engine.ok());
}

#[test]
fn test_errors_serialize_as_json() {
    let mut engine = RuleEngine::from_iter([("a", ""), ("b", "ok")])
        .with_error_policy(ErrorPolicy::AllErrors);
    engine.validate(true, Builtin::NotEmpty, (), None).unwrap();

    let json = serde_json::to_value(engine.errors()).unwrap();
    assert_eq!(json, json!({"a": ["Invalid a"]}));
}
