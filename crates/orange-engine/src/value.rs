//! Runtime value representation
//!
//! Values are a closed sum over primitives and shared references. Reference
//! variants (objects, functions, blueprints, enumerations) carry a
//! [`HeapId`] so identity tables can key on them without looking at their
//! contents.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::class::Blueprint;
use crate::enumeration::Enumeration;
use crate::error::ClassResult;
use crate::object::ObjectRef;
use crate::runtime::Runtime;

/// Process-unique identity of a reference-typed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u64);

impl HeapId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        HeapId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Native function body: `(runtime, this, arguments) -> result`
pub type NativeFn = dyn Fn(&Runtime, &ObjectRef, &[Value]) -> ClassResult<Value>;

struct FunctionData {
    id: HeapId,
    name: Rc<str>,
    body: Box<NativeFn>,
}

/// Callable value.
///
/// A *rebound* function resolves its receiver to the owning instance's
/// private tier before its body runs. Rebinding does not change identity:
/// a rebound copy compares equal to the function it was made from.
#[derive(Clone)]
pub struct Function {
    data: Rc<FunctionData>,
    rebind: bool,
}

impl Function {
    /// Create a named native function
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Runtime, &ObjectRef, &[Value]) -> ClassResult<Value> + 'static,
    {
        Self {
            data: Rc::new(FunctionData {
                id: HeapId::next(),
                name: Rc::from(name),
                body: Box::new(body),
            }),
            rebind: false,
        }
    }

    /// Create an anonymous native function
    pub fn anonymous<F>(body: F) -> Self
    where
        F: Fn(&Runtime, &ObjectRef, &[Value]) -> ClassResult<Value> + 'static,
    {
        Self::new("", body)
    }

    /// Identity of the underlying function
    pub fn id(&self) -> HeapId {
        self.data.id
    }

    /// Declared name (empty for anonymous functions)
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Whether invocation rebinds `this` to the private tier
    pub fn is_rebound(&self) -> bool {
        self.rebind
    }

    /// Copy of this function that rebinds `this` to the private tier
    pub fn rebound(&self) -> Function {
        Function {
            data: Rc::clone(&self.data),
            rebind: true,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Any> {
        let weak: Weak<FunctionData> = Rc::downgrade(&self.data);
        weak
    }

    /// Run the body with `this` exactly as given
    pub(crate) fn call_raw(&self, rt: &Runtime, this: &ObjectRef, args: &[Value]) -> ClassResult<Value> {
        (self.data.body)(rt, this, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name().is_empty() { "anonymous" } else { self.name() };
        if self.rebind {
            write!(f, "[Function: {} (bound)]", name)
        } else {
            write!(f, "[Function: {}]", name)
        }
    }
}

/// Dynamic value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// IEEE-754 number
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Object reference
    Object(ObjectRef),
    /// Callable
    Function(Function),
    /// Class blueprint
    Class(Blueprint),
    /// Enumerated constant set
    Enum(Rc<Enumeration>),
}

impl Value {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    /// Check if this value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract numeric value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Extract function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Extract blueprint
    pub fn as_class(&self) -> Option<&Blueprint> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Extract enumeration
    pub fn as_enum(&self) -> Option<&Rc<Enumeration>> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Identity of a reference-typed value
    pub fn heap_id(&self) -> Option<HeapId> {
        match self {
            Value::Object(obj) => Some(obj.id()),
            Value::Function(func) => Some(func.id()),
            Value::Class(class) => Some(class.id()),
            Value::Enum(e) => Some(e.id()),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Enum(_) => "enum",
        }
    }

    /// SameValue equality: `NaN` equals itself, `0` and `-0` differ, and
    /// reference variants compare by identity.
    pub fn same_value(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => {
                if x.is_nan() && y.is_nan() {
                    true
                } else {
                    x.to_bits() == y.to_bits()
                }
            }
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
            (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
            (Value::Class(x), Value::Class(y)) => x.ptr_eq(y),
            (Value::Enum(x), Value::Enum(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Value::same_value(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "[object {}]", obj.id()),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Class(class) => write!(f, "[class {}]", class.name()),
            Value::Enum(e) => write!(f, "[enum {}]", e.name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<Blueprint> for Value {
    fn from(class: Blueprint) -> Self {
        Value::Class(class)
    }
}

impl From<Rc<Enumeration>> for Value {
    fn from(e: Rc<Enumeration>) -> Self {
        Value::Enum(e)
    }
}
