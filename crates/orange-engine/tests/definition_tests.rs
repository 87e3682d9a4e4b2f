//! Integration tests for member definitions and definition lists
//!
//! Tests cover:
//! - Member key grammar through the public API
//! - Installing definition lists onto plain objects
//! - Read-only and fill-missing installation
//! - Per-object storage for objects inheriting installed members
//! - Deep cloning and tier projections

use std::rc::Rc;

use orange_engine::{
    parse_key, ApplyOptions, ClassError, DefinitionList, Descriptor, KindToken, MemberKind, MemberSpec, ObjectRef,
    Runtime, Value, Visibility,
};

// ============================================================================
// Key grammar
// ============================================================================

#[test]
fn test_key_grammar_table() {
    let cases = [
        ("x", Visibility::Private, KindToken::Data, "x"),
        ("public x", Visibility::Public, KindToken::Data, "x"),
        ("protected readonly x", Visibility::Protected, KindToken::ReadOnly, "x"),
        ("descriptor x", Visibility::Private, KindToken::Descriptor, "x"),
        ("public set x", Visibility::Public, KindToken::Set, "x"),
        ("public enum Mode", Visibility::Public, KindToken::Enum, "Mode"),
        ("public descriptor", Visibility::Public, KindToken::Data, "descriptor"),
        ("readonly", Visibility::Private, KindToken::Data, "readonly"),
        ("private private", Visibility::Private, KindToken::Data, "private"),
    ];

    for (key, visibility, kind, name) in cases {
        let parsed = parse_key(key).unwrap_or_else(|e| panic!("{:?} failed: {}", key, e));
        assert_eq!(parsed.visibility, visibility, "visibility of {:?}", key);
        assert_eq!(parsed.kind, kind, "kind of {:?}", key);
        assert_eq!(parsed.name, name, "name of {:?}", key);
    }
}

#[test]
fn test_malformed_key_reports_key() {
    let err = parse_key("one two three four").unwrap_err();
    assert_eq!(err.to_string(), "Invalid property definition: 'one two three four'");
    assert_eq!(err.code(), Some("E_MALFORMED_MEMBER"));
}

// ============================================================================
// Installation
// ============================================================================

fn sample_list() -> DefinitionList {
    let spec = MemberSpec::new()
        .member("hidden", 1)
        .member("protected shared", 2)
        .member("public open", 3)
        .member("public enum Level", ["LOW", "HIGH"]);
    DefinitionList::parse(&spec, None).unwrap()
}

#[test]
fn test_apply_to_installs_every_tier() {
    let rt = Runtime::new();
    let target = ObjectRef::plain();
    sample_list()
        .apply_to(&rt, &target, ApplyOptions::default())
        .unwrap();

    assert_eq!(rt.get(&target, "hidden").unwrap(), Value::from(1));
    assert_eq!(rt.get(&target, "shared").unwrap(), Value::from(2));
    assert_eq!(rt.get(&target, "open").unwrap(), Value::from(3));
    assert_eq!(rt.get(&target, "HIGH").unwrap(), Value::from(2));

    let keys: Vec<String> = rt.enumerable_keys(&target).iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["LOW", "HIGH", "Level"]);
}

#[test]
fn test_apply_read_only() {
    let rt = Runtime::new();
    let target = ObjectRef::plain();
    sample_list()
        .apply_to(&rt, &target, ApplyOptions::read_only())
        .unwrap();

    assert_eq!(rt.get(&target, "open").unwrap(), Value::from(3));
    let err = rt.set(&target, "open", Value::from(4)).unwrap_err();
    assert!(matches!(err, ClassError::Immutable { .. }));
}

#[test]
fn test_apply_fill_missing_keeps_existing_members() {
    let rt = Runtime::new();
    let target = ObjectRef::plain();
    let first = DefinitionList::parse(&MemberSpec::new().member("public open", "first"), None).unwrap();
    first.apply_to(&rt, &target, ApplyOptions::default()).unwrap();

    sample_list()
        .apply_to(&rt, &target, ApplyOptions::fill_missing())
        .unwrap();

    assert_eq!(rt.get(&target, "open").unwrap(), Value::from("first"));
    assert_eq!(rt.get(&target, "hidden").unwrap(), Value::from(1));
}

#[test]
fn test_apply_twice_keeps_written_values() {
    let rt = Runtime::new();
    let target = ObjectRef::plain();
    let list = sample_list();
    list.apply_to(&rt, &target, ApplyOptions::default()).unwrap();
    rt.set(&target, "open", Value::from(30)).unwrap();

    list.apply_to(&rt, &target, ApplyOptions::default()).unwrap();
    assert_eq!(rt.get(&target, "open").unwrap(), Value::from(30));
}

#[test]
fn test_inheriting_object_writes_its_own_slot() {
    let rt = Runtime::new();
    let base = ObjectRef::plain();
    DefinitionList::parse(&MemberSpec::new().member("public count", 1), None)
        .unwrap()
        .apply_to(&rt, &base, ApplyOptions::default())
        .unwrap();
    let derived = ObjectRef::with_parent(&base);

    assert_eq!(rt.get(&derived, "count").unwrap(), Value::from(1));
    rt.set(&derived, "count", Value::from(5)).unwrap();

    assert_eq!(rt.get(&derived, "count").unwrap(), Value::from(5));
    assert_eq!(rt.get(&base, "count").unwrap(), Value::from(1));
    assert!(!derived.has_own("count"));
}

#[test]
fn test_accessor_on_plain_object_runs_with_receiver() {
    let rt = Runtime::new();
    let target = ObjectRef::plain();
    let getter = orange_engine::Function::new("double", |rt, this, _| {
        let n = rt.get(this, "n")?.as_number().unwrap_or(0.0);
        Ok(Value::from(n * 2.0))
    });
    let spec = MemberSpec::new()
        .member("public n", 4)
        .member("public descriptor double", Descriptor::accessor(Some(getter), None));
    DefinitionList::parse(&spec, None)
        .unwrap()
        .apply_to(&rt, &target, ApplyOptions::default())
        .unwrap();

    assert_eq!(rt.get(&target, "double").unwrap(), Value::from(8));
}

// ============================================================================
// Projections and cloning
// ============================================================================

#[test]
fn test_tier_projections() {
    let list = sample_list();

    assert_eq!(list.len(), 4);
    assert_eq!(list.privates().len(), 1);
    assert_eq!(list.protecteds().len(), 1);
    assert_eq!(list.publics().len(), 2);
    assert!(list.read_onlys().is_empty());

    let names: Vec<&str> = list
        .definitions(Visibility::Public)
        .map(|d| d.name())
        .collect();
    assert_eq!(names, vec!["open", "Level"]);
}

#[test]
fn test_clone_deep_is_structurally_equal() {
    let list = sample_list();
    let copy = list.clone_deep();

    assert_eq!(copy.len(), list.len());
    for (a, b) in list.iter().zip(copy.iter()) {
        assert!(!Rc::ptr_eq(a, b));
        assert!(a.same_as(b));
    }
}

#[test]
fn test_publics_across_three_generations() {
    let base = Rc::new(
        DefinitionList::parse(
            &MemberSpec::new().member("public a", 1).member("public shared", "base"),
            None,
        )
        .unwrap(),
    );
    let middle = Rc::new(
        base.extend(&MemberSpec::new().member("public b", 2).member("public shared", "middle"))
            .unwrap(),
    );
    let leaf = middle.extend(&MemberSpec::new().member("public c", 3)).unwrap();

    let publics = leaf.publics();
    for name in ["a", "b", "c", "shared"] {
        assert!(publics.get(Visibility::Public, name).is_some(), "missing {}", name);
    }
    let shared = publics.get(Visibility::Public, "shared").unwrap();
    assert_eq!(shared.default_value(), Some(&Value::from("middle")));
}

#[test]
fn test_enum_definition_keeps_names() {
    let list = sample_list();
    match list.get(Visibility::Public, "Level").unwrap().kind() {
        MemberKind::Enumerated { names } => {
            let names: Vec<&str> = names.iter().map(|n| &**n).collect();
            assert_eq!(names, vec!["LOW", "HIGH"]);
        }
        other => panic!("Expected enumerated, got {:?}", other),
    }
}
