//! Identity-keyed maps
//!
//! [`IdentityMap`] associates hidden state with a value by *identity*:
//! reference-typed keys match only the exact same object, never a look-alike
//! built by cloning or extending it. Primitive keys are distinguished the way
//! SameValue does (`0` and `-0` are different keys, `NaN` is one key,
//! `null` and `undefined` are distinct).
//!
//! Reference keys hold a weak handle to their target so entries whose key has
//! become unreachable can be purged.

mod composite;

pub use composite::{CompositeKeyMap, Lookup, Slot};

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::enumeration::Enumeration;
use crate::object::ObjectRef;
use crate::value::{HeapId, Value};

/// Canonical bit pattern used for every NaN
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Identity of a reference-typed key
#[derive(Clone)]
pub struct RefKey {
    id: HeapId,
    target: Weak<dyn Any>,
}

impl RefKey {
    /// Identity of the referenced value
    pub fn id(&self) -> HeapId {
        self.id
    }

    /// Whether the referenced value is still reachable
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// A map key
#[derive(Clone)]
pub enum IdentityKey {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Number, by bit pattern (NaN canonicalized)
    Number(u64),
    /// String, by content
    String(Rc<str>),
    /// Reference, by identity
    Reference(RefKey),
}

impl IdentityKey {
    /// Key for an arbitrary value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => IdentityKey::Undefined,
            Value::Null => IdentityKey::Null,
            Value::Bool(b) => IdentityKey::Bool(*b),
            Value::Number(n) => IdentityKey::number(*n),
            Value::String(s) => IdentityKey::String(Rc::clone(s)),
            Value::Object(obj) => IdentityKey::object(obj),
            Value::Function(func) => IdentityKey::Reference(RefKey {
                id: func.id(),
                target: func.downgrade(),
            }),
            Value::Class(class) => IdentityKey::Reference(RefKey {
                id: class.id(),
                target: class.downgrade(),
            }),
            Value::Enum(e) => {
                let weak: Weak<Enumeration> = Rc::downgrade(e);
                IdentityKey::Reference(RefKey {
                    id: e.id(),
                    target: weak,
                })
            }
        }
    }

    /// Key for an object
    pub fn object(obj: &ObjectRef) -> Self {
        IdentityKey::Reference(RefKey {
            id: obj.id(),
            target: obj.downgrade_any(),
        })
    }

    /// Key for a number
    pub fn number(n: f64) -> Self {
        if n.is_nan() {
            IdentityKey::Number(CANONICAL_NAN)
        } else {
            IdentityKey::Number(n.to_bits())
        }
    }

    /// Key for a string
    pub fn string(s: &str) -> Self {
        IdentityKey::String(Rc::from(s))
    }

    /// Whether the key can still be matched by a live value.
    ///
    /// Primitive keys are always live.
    pub fn is_live(&self) -> bool {
        match self {
            IdentityKey::Reference(key) => key.is_live(),
            _ => true,
        }
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IdentityKey::Undefined, IdentityKey::Undefined) => true,
            (IdentityKey::Null, IdentityKey::Null) => true,
            (IdentityKey::Bool(a), IdentityKey::Bool(b)) => a == b,
            (IdentityKey::Number(a), IdentityKey::Number(b)) => a == b,
            (IdentityKey::String(a), IdentityKey::String(b)) => a == b,
            (IdentityKey::Reference(a), IdentityKey::Reference(b)) => a.id == b.id,
            _ => false,
        }
    }
}

impl Eq for IdentityKey {}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            IdentityKey::Undefined | IdentityKey::Null => {}
            IdentityKey::Bool(b) => b.hash(state),
            IdentityKey::Number(bits) => bits.hash(state),
            IdentityKey::String(s) => s.hash(state),
            IdentityKey::Reference(key) => key.id.hash(state),
        }
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Undefined => write!(f, "undefined"),
            IdentityKey::Null => write!(f, "null"),
            IdentityKey::Bool(b) => write!(f, "{}", b),
            IdentityKey::Number(bits) => write!(f, "{}", f64::from_bits(*bits)),
            IdentityKey::String(s) => write!(f, "{:?}", s),
            IdentityKey::Reference(key) => {
                if key.is_live() {
                    write!(f, "ref{}", key.id)
                } else {
                    write!(f, "ref{}(dead)", key.id)
                }
            }
        }
    }
}

impl From<&Value> for IdentityKey {
    fn from(value: &Value) -> Self {
        IdentityKey::of(value)
    }
}

impl From<&ObjectRef> for IdentityKey {
    fn from(obj: &ObjectRef) -> Self {
        IdentityKey::object(obj)
    }
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        IdentityKey::string(s)
    }
}

/// Mapping from key identity to an associated value
pub struct IdentityMap<V> {
    entries: FxHashMap<IdentityKey, V>,
}

impl<V> IdentityMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value associated with `key`
    pub fn get(&self, key: &IdentityKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Value associated with `key`, or `default` when absent
    pub fn get_or<'a>(&'a self, key: &IdentityKey, default: &'a V) -> &'a V {
        self.entries.get(key).unwrap_or(default)
    }

    /// Mutable value associated with `key`
    pub fn get_mut(&mut self, key: &IdentityKey) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Check for an entry
    pub fn has(&self, key: &IdentityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Associate `value` with `key`, returning the previous value
    pub fn set(&mut self, key: IdentityKey, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Remove an entry, returning whether one existed
    pub fn delete(&mut self, key: &IdentityKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove and return an entry
    pub fn take(&mut self, key: &IdentityKey) -> Option<V> {
        self.entries.remove(key)
    }

    /// Iterate over entries (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &V)> {
        self.entries.iter()
    }

    /// Drop entries whose key is no longer reachable.
    ///
    /// Returns the number of entries removed.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.is_live());
        before - self.entries.len()
    }

    pub(crate) fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&IdentityKey, &mut V) -> bool,
    {
        self.entries.retain(f);
    }
}

impl<V> Default for IdentityMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for IdentityMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
