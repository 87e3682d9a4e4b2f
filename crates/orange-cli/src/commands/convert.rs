//! JSON to member specification conversion
//!
//! A specification file is a JSON object mapping member keys to values.
//! The value shape depends on the member kind:
//!
//! - data / readonly: any JSON value (objects become plain objects)
//! - enum: array of strings
//! - descriptor: `{"value": ..}` or `{"get": "name", "set": "name"}`
//! - get / set, and the constructor: a string naming the function
//!
//! Functions cannot be expressed in JSON; named stubs returning `undefined`
//! stand in for them.

use anyhow::{anyhow, bail};
use orange_engine::{
    parse_key, Descriptor, Function, KindToken, MemberSpec, MemberValue, ObjectRef, Property, Value,
};
use serde_json::Value as Json;

const CONSTRUCTOR: &str = "constructor";

/// Convert a JSON specification object into a [`MemberSpec`]
pub fn spec_from_json(json: &Json) -> anyhow::Result<MemberSpec> {
    let entries = json
        .as_object()
        .ok_or_else(|| anyhow!("Specification must be a JSON object, got {}", json_type(json)))?;

    let mut spec = MemberSpec::new();
    for (key, value) in entries {
        let parsed = parse_key(key)?;
        let member = match parsed.kind {
            KindToken::Data if parsed.name == CONSTRUCTOR => function_stub(key, &parsed.name, value)?,
            KindToken::Data | KindToken::ReadOnly => MemberValue::Value(to_value(value)),
            KindToken::Enum => {
                let names = value
                    .as_array()
                    .ok_or_else(|| anyhow!("'{}' must be an array of names", key))?
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| anyhow!("'{}' must contain only strings", key))
                    })
                    .collect::<anyhow::Result<Vec<&str>>>()?;
                MemberValue::names(names)
            }
            KindToken::Descriptor => MemberValue::Descriptor(descriptor(key, &parsed.name, value)?),
            KindToken::Get | KindToken::Set => function_stub(key, &parsed.name, value)?,
        };
        spec.push(key, member);
    }
    Ok(spec)
}

fn descriptor(key: &str, name: &str, value: &Json) -> anyhow::Result<Descriptor> {
    let fields = value
        .as_object()
        .ok_or_else(|| anyhow!("'{}' must be a descriptor object", key))?;

    if let Some(default) = fields.get("value") {
        return Ok(Descriptor::value(to_value(default)));
    }

    let field_stub = |field: &str| -> anyhow::Result<Option<Function>> {
        match fields.get(field) {
            None => Ok(None),
            Some(Json::String(label)) => Ok(Some(stub(label, name))),
            Some(other) => bail!(
                "'{}' descriptor field '{}' must be a function name, got {}",
                key,
                field,
                json_type(other)
            ),
        }
    };
    Ok(Descriptor::accessor(field_stub("get")?, field_stub("set")?))
}

fn function_stub(key: &str, name: &str, value: &Json) -> anyhow::Result<MemberValue> {
    match value {
        Json::String(label) => Ok(MemberValue::from(stub(label, name))),
        other => bail!("'{}' must be a function name, got {}", key, json_type(other)),
    }
}

fn stub(label: &str, fallback: &str) -> Function {
    let name = if label.is_empty() { fallback } else { label };
    Function::new(name, |_, _, _| Ok(Value::Undefined))
}

/// Convert a JSON value into a runtime value
pub fn to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::string(s),
        Json::Array(items) => {
            let obj = ObjectRef::plain();
            for (index, item) in items.iter().enumerate() {
                obj.define_own(&index.to_string(), Property::slot(to_value(item)));
            }
            obj.define_own("length", Property::slot(Value::from(items.len() as f64)));
            Value::Object(obj)
        }
        Json::Object(fields) => {
            let obj = ObjectRef::plain();
            for (name, field) in fields {
                obj.define_own(name, Property::slot(to_value(field)));
            }
            Value::Object(obj)
        }
    }
}

/// Convert a runtime value into JSON for display
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Undefined | Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Json::from(*n as i64),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.to_string()),
        other => Json::String(other.to_string()),
    }
}

fn json_type(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
