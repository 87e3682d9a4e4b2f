//! Declarative member specifications
//!
//! A [`MemberSpec`] is the ordered `key -> value` table handed to class
//! creation. Keys follow the `[visibility] [kind] name` grammar; values are
//! literal defaults, descriptors, functions or name lists depending on the
//! kind.
//!
//! ```rust,ignore
//! let spec = MemberSpec::new()
//!     .member("public readonly value", Value::Null)
//!     .constructor(|rt, this, args| {
//!         rt.set(this, "value", args.first().cloned().unwrap_or_default())?;
//!         Ok(Value::Undefined)
//!     });
//! ```

use std::rc::Rc;

use crate::class::Blueprint;
use crate::error::ClassResult;
use crate::object::ObjectRef;
use crate::runtime::Runtime;
use crate::value::{Function, Value};

/// Property descriptor given to `descriptor` members
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    /// Plain default value; when present the member is a data member
    pub value: Option<Value>,
    /// Getter
    pub get: Option<Function>,
    /// Setter
    pub set: Option<Function>,
}

impl Descriptor {
    /// Descriptor holding a plain value
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Descriptor with an optional getter and setter
    pub fn accessor(get: Option<Function>, set: Option<Function>) -> Self {
        Self {
            value: None,
            get,
            set,
        }
    }
}

/// Value position of a member specification entry
#[derive(Debug, Clone)]
pub enum MemberValue {
    /// Literal default, method or constructor
    Value(Value),
    /// `{value}` or `{get, set}` descriptor
    Descriptor(Descriptor),
    /// Ordered item names for `enum` members
    Names(Vec<Rc<str>>),
}

impl MemberValue {
    /// Name list for an `enum` member
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        MemberValue::Names(names.into_iter().map(|n| Rc::from(n.as_ref())).collect())
    }

    /// Short description of the value's shape, for diagnostics
    pub fn describe(&self) -> String {
        match self {
            MemberValue::Value(value) => value.type_name().to_string(),
            MemberValue::Descriptor(d) if d.value.is_some() => "value descriptor".to_string(),
            MemberValue::Descriptor(_) => "accessor descriptor".to_string(),
            MemberValue::Names(_) => "name list".to_string(),
        }
    }
}

impl From<Value> for MemberValue {
    fn from(value: Value) -> Self {
        MemberValue::Value(value)
    }
}

impl From<Function> for MemberValue {
    fn from(func: Function) -> Self {
        MemberValue::Value(Value::Function(func))
    }
}

impl From<Blueprint> for MemberValue {
    fn from(class: Blueprint) -> Self {
        MemberValue::Value(Value::Class(class))
    }
}

impl From<ObjectRef> for MemberValue {
    fn from(obj: ObjectRef) -> Self {
        MemberValue::Value(Value::Object(obj))
    }
}

impl From<Descriptor> for MemberValue {
    fn from(descriptor: Descriptor) -> Self {
        MemberValue::Descriptor(descriptor)
    }
}

impl From<bool> for MemberValue {
    fn from(b: bool) -> Self {
        MemberValue::Value(Value::Bool(b))
    }
}

impl From<i32> for MemberValue {
    fn from(n: i32) -> Self {
        MemberValue::Value(Value::from(n))
    }
}

impl From<f64> for MemberValue {
    fn from(n: f64) -> Self {
        MemberValue::Value(Value::Number(n))
    }
}

impl From<&str> for MemberValue {
    fn from(s: &str) -> Self {
        MemberValue::Value(Value::string(s))
    }
}

impl<const N: usize> From<[&str; N]> for MemberValue {
    fn from(names: [&str; N]) -> Self {
        MemberValue::names(names)
    }
}

impl From<Vec<&str>> for MemberValue {
    fn from(names: Vec<&str>) -> Self {
        MemberValue::names(names)
    }
}

/// Ordered member specification
#[derive(Debug, Clone, Default)]
pub struct MemberSpec {
    entries: Vec<(String, MemberValue)>,
}

impl MemberSpec {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn member(mut self, key: &str, value: impl Into<MemberValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Add a function-valued entry; the function is named after the last
    /// token of `key`
    pub fn method<F>(self, key: &str, body: F) -> Self
    where
        F: Fn(&Runtime, &ObjectRef, &[Value]) -> ClassResult<Value> + 'static,
    {
        let name = key.split_whitespace().last().unwrap_or(key);
        let func = Function::new(name, body);
        self.member(key, func)
    }

    /// Add the user constructor
    pub fn constructor<F>(self, body: F) -> Self
    where
        F: Fn(&Runtime, &ObjectRef, &[Value]) -> ClassResult<Value> + 'static,
    {
        self.method("public constructor", body)
    }

    /// Add an entry in place
    pub fn push(&mut self, key: &str, value: impl Into<MemberValue>) {
        self.entries.push((key.to_string(), value.into()));
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemberValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for MemberSpec
where
    K: Into<String>,
    V: Into<MemberValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
