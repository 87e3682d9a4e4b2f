//! Integration tests for write-once members
//!
//! Tests cover:
//! - Writes during construction, rejection afterwards
//! - Internal and external write attempts
//! - Write-once members at every tier and across inheritance
//! - Disabling the lockdown through runtime options

use orange_engine::{ClassError, MemberSpec, Runtime, RuntimeOptions, Value};

fn value_holder() -> MemberSpec {
    MemberSpec::new()
        .member("public readonly value", Value::Null)
        .constructor(|rt, this, args| {
            rt.set(this, "value", args.first().cloned().unwrap_or_default())?;
            Ok(Value::Undefined)
        })
        .method("public change", |rt, this, args| {
            rt.set(this, "value", args[0].clone())?;
            Ok(Value::Undefined)
        })
}

// ============================================================================
// Public write-once members
// ============================================================================

#[test]
fn test_set_during_construction() {
    let rt = Runtime::new();
    let class = rt.class("X", &value_holder()).unwrap();
    let instance = rt.construct(&class, &[Value::from("start")]).unwrap();

    assert_eq!(rt.get(&instance, "value").unwrap(), Value::from("start"));
}

#[test]
fn test_external_write_after_construction_fails() {
    let rt = Runtime::new();
    let class = rt.class("X", &value_holder()).unwrap();
    let instance = rt.construct(&class, &[Value::from("start")]).unwrap();

    let err = rt.set(&instance, "value", Value::from("other")).unwrap_err();
    assert!(matches!(err, ClassError::Immutable { .. }));
    assert!(err.is_type_error());
    assert_eq!(rt.get(&instance, "value").unwrap(), Value::from("start"));
}

#[test]
fn test_internal_write_after_construction_fails() {
    let rt = Runtime::new();
    let class = rt.class("X", &value_holder()).unwrap();
    let instance = rt.construct(&class, &[Value::from("start")]).unwrap();

    let err = rt.call(&instance, "change", &[Value::from("other")]).unwrap_err();
    assert_eq!(err.code(), Some("E_IMMUTABLE"));
    assert_eq!(rt.get(&instance, "value").unwrap(), Value::from("start"));
}

#[test]
fn test_each_instance_gets_its_own_value() {
    let rt = Runtime::new();
    let class = rt.class("X", &value_holder()).unwrap();
    let first = rt.construct(&class, &[Value::from(1)]).unwrap();
    let second = rt.construct(&class, &[Value::from(2)]).unwrap();

    assert_eq!(rt.get(&first, "value").unwrap(), Value::from(1));
    assert_eq!(rt.get(&second, "value").unwrap(), Value::from(2));
}

#[test]
fn test_unset_member_keeps_default() {
    let rt = Runtime::new();
    let spec = MemberSpec::new().member("public readonly id", 7);
    let class = rt.class("Fixed", &spec).unwrap();
    let instance = rt.construct(&class, &[]).unwrap();

    assert_eq!(rt.get(&instance, "id").unwrap(), Value::from(7));
    assert!(rt.set(&instance, "id", Value::from(8)).is_err());
}

// ============================================================================
// Hidden tiers
// ============================================================================

#[test]
fn test_protected_and_private_write_once() {
    let rt = Runtime::new();
    let spec = MemberSpec::new()
        .member("protected readonly token", 0)
        .member("readonly seed", 0)
        .constructor(|rt, this, _| {
            rt.set(this, "token", Value::from(7))?;
            rt.set(this, "seed", Value::from(9))?;
            Ok(Value::Undefined)
        })
        .method("public read", |rt, this, _| {
            let token = rt.get(this, "token")?.as_number().unwrap_or(0.0);
            let seed = rt.get(this, "seed")?.as_number().unwrap_or(0.0);
            Ok(Value::from(token * 10.0 + seed))
        })
        .method("public rotate", |rt, this, _| {
            rt.set(this, "token", Value::from(8))?;
            Ok(Value::Undefined)
        })
        .method("public reseed", |rt, this, _| {
            rt.set(this, "seed", Value::from(1))?;
            Ok(Value::Undefined)
        });
    let class = rt.class("Vault", &spec).unwrap();
    let instance = rt.construct(&class, &[]).unwrap();

    assert_eq!(rt.call(&instance, "read", &[]).unwrap(), Value::from(79));
    assert!(rt.call(&instance, "rotate", &[]).unwrap_err().is_type_error());
    assert!(rt.call(&instance, "reseed", &[]).unwrap_err().is_type_error());
    assert_eq!(rt.call(&instance, "read", &[]).unwrap(), Value::from(79));
    assert!(rt.get(&instance, "token").unwrap().is_undefined());
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_inherited_public_write_once_locks_child_instances() {
    let rt = Runtime::new();
    let parent = rt.class("Parent", &value_holder()).unwrap();
    let child = rt.extend(&parent, "Child", &MemberSpec::new()).unwrap();
    let instance = rt.construct(&child, &[Value::from("c1")]).unwrap();

    assert_eq!(rt.get(&instance, "value").unwrap(), Value::from("c1"));
    assert!(rt.set(&instance, "value", Value::from("c2")).is_err());
    assert!(rt.call(&instance, "change", &[Value::from("c3")]).is_err());
}

#[test]
fn test_child_constructor_sets_parent_protected_write_once() {
    let rt = Runtime::new();
    let parent = rt
        .class("Parent", &MemberSpec::new().member("protected readonly secret", 0))
        .unwrap();
    let child_spec = MemberSpec::new()
        .constructor(|rt, this, _| {
            rt.set(this, "secret", Value::from(5))?;
            Ok(Value::Undefined)
        })
        .method("public reveal", |rt, this, _| rt.get(this, "secret"))
        .method("public tamper", |rt, this, _| {
            rt.set(this, "secret", Value::from(6))?;
            Ok(Value::Undefined)
        });
    let child = rt.extend(&parent, "Child", &child_spec).unwrap();
    let instance = rt.construct(&child, &[]).unwrap();

    assert_eq!(rt.call(&instance, "reveal", &[]).unwrap(), Value::from(5));
    assert!(rt.call(&instance, "tamper", &[]).is_err());
    assert_eq!(rt.call(&instance, "reveal", &[]).unwrap(), Value::from(5));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_lockdown_can_be_disabled() {
    let options = RuntimeOptions {
        lock_write_once: false,
        ..Default::default()
    };
    let rt = Runtime::with_options(options);
    let class = rt.class("X", &value_holder()).unwrap();
    let instance = rt.construct(&class, &[Value::from("start")]).unwrap();

    rt.set(&instance, "value", Value::from("other")).unwrap();
    assert_eq!(rt.get(&instance, "value").unwrap(), Value::from("other"));
}

#[test]
fn test_getter_only_accessor_is_never_writable() {
    let rt = Runtime::new();
    let spec = MemberSpec::new()
        .method("public get constant", |_, _, _| Ok(Value::from(3)))
        .constructor(|rt, this, _| {
            rt.set(this, "constant", Value::from(4))?;
            Ok(Value::Undefined)
        });
    let class = rt.class("Constant", &spec).unwrap();

    let err = rt.construct(&class, &[]).unwrap_err();
    assert!(matches!(err, ClassError::Immutable { .. }));
}
