//! Object model
//!
//! Objects are shared handles over an ordered table of own properties and an
//! optional fallback link. Property lookup walks own properties first, then
//! the fallback chain. Tier chains (private -> protected -> public) use weak
//! fallbacks so that only the public object keeps an instance alive;
//! prototype links are strong.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::definition::{MemberDefinition, Visibility};
use crate::value::{HeapId, Value};

/// What role an object plays in the class system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Ordinary object
    Plain,
    /// Shared per-blueprint prototype holding public members
    Prototype,
    /// One of an instance's three tier objects
    Tier(Visibility),
}

/// An own property
#[derive(Debug, Clone)]
pub enum Property {
    /// Plain value slot
    Slot {
        /// Stored value
        value: Value,
        /// Listed by `enumerable_keys`
        enumerable: bool,
        /// Accepts writes
        writable: bool,
    },
    /// Installed member definition
    Member {
        /// The definition backing this property
        definition: Rc<MemberDefinition>,
        /// Cleared by the write-once lockdown pass
        writable: bool,
    },
}

impl Property {
    /// Plain writable, enumerable slot
    pub fn slot(value: Value) -> Self {
        Property::Slot {
            value,
            enumerable: true,
            writable: true,
        }
    }

    /// Whether the property shows up in enumeration
    pub fn is_enumerable(&self) -> bool {
        match self {
            Property::Slot { enumerable, .. } => *enumerable,
            Property::Member { .. } => false,
        }
    }

    /// Whether two properties describe the same installation
    pub fn same_as(&self, other: &Property) -> bool {
        match (self, other) {
            (
                Property::Slot {
                    value: a,
                    enumerable: ea,
                    writable: wa,
                },
                Property::Slot {
                    value: b,
                    enumerable: eb,
                    writable: wb,
                },
            ) => Value::same_value(a, b) && ea == eb && wa == wb,
            (
                Property::Member {
                    definition: a,
                    writable: wa,
                },
                Property::Member {
                    definition: b,
                    writable: wb,
                },
            ) => wa == wb && (Rc::ptr_eq(a, b) || a.same_as(b)),
            _ => false,
        }
    }
}

/// Link to the object consulted when a name is not an own property
#[derive(Clone)]
pub enum Fallback {
    /// Keeps the target alive
    Strong(ObjectRef),
    /// Does not keep the target alive
    Weak(WeakObject),
}

impl Fallback {
    fn resolve(&self) -> Option<ObjectRef> {
        match self {
            Fallback::Strong(obj) => Some(obj.clone()),
            Fallback::Weak(weak) => weak.upgrade(),
        }
    }
}

/// Object storage
pub struct ObjectData {
    id: HeapId,
    kind: ObjectKind,
    properties: Vec<(Rc<str>, Property)>,
    index: FxHashMap<Rc<str>, usize>,
    fallback: Option<Fallback>,
}

/// Shared object handle
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

/// Non-owning object handle
#[derive(Clone)]
pub struct WeakObject(Weak<RefCell<ObjectData>>);

impl WeakObject {
    /// Upgrade to a strong handle if the object is still alive
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

impl ObjectRef {
    /// Create an object
    pub fn new(kind: ObjectKind, fallback: Option<Fallback>) -> Self {
        ObjectRef(Rc::new(RefCell::new(ObjectData {
            id: HeapId::next(),
            kind,
            properties: Vec::new(),
            index: FxHashMap::default(),
            fallback,
        })))
    }

    /// Create a plain object with no fallback
    pub fn plain() -> Self {
        Self::new(ObjectKind::Plain, None)
    }

    /// Create a plain object that falls back to `parent`
    pub fn with_parent(parent: &ObjectRef) -> Self {
        Self::new(ObjectKind::Plain, Some(Fallback::Strong(parent.clone())))
    }

    /// Object identity
    pub fn id(&self) -> HeapId {
        self.0.borrow().id
    }

    /// Role of this object
    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind
    }

    /// The visibility tier this object represents, if it is a tier object
    pub fn tier(&self) -> Option<Visibility> {
        match self.kind() {
            ObjectKind::Tier(visibility) => Some(visibility),
            _ => None,
        }
    }

    /// Next object in the lookup chain
    pub fn fallback(&self) -> Option<ObjectRef> {
        self.0.borrow().fallback.as_ref().and_then(Fallback::resolve)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }

    pub(crate) fn downgrade_any(&self) -> Weak<dyn Any> {
        let weak: Weak<RefCell<ObjectData>> = Rc::downgrade(&self.0);
        weak
    }

    /// Own property by name
    pub fn own_property(&self, name: &str) -> Option<Property> {
        let data = self.0.borrow();
        data.index
            .get(name)
            .map(|&slot| data.properties[slot].1.clone())
    }

    /// Check for an own property
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().index.contains_key(name)
    }

    /// Create or replace an own property, keeping its original position
    pub fn define_own(&self, name: &str, property: Property) {
        let mut data = self.0.borrow_mut();
        if let Some(&slot) = data.index.get(name) {
            data.properties[slot].1 = property;
        } else {
            let key: Rc<str> = Rc::from(name);
            let slot = data.properties.len();
            data.properties.push((Rc::clone(&key), property));
            data.index.insert(key, slot);
        }
    }

    /// Remove an own property
    pub fn remove_own(&self, name: &str) -> bool {
        let mut data = self.0.borrow_mut();
        let Some(slot) = data.index.remove(name) else {
            return false;
        };
        data.properties.remove(slot);
        for index in data.index.values_mut() {
            if *index > slot {
                *index -= 1;
            }
        }
        true
    }

    /// Own property names in definition order
    pub fn own_keys(&self) -> Vec<Rc<str>> {
        self.0
            .borrow()
            .properties
            .iter()
            .map(|(name, _)| Rc::clone(name))
            .collect()
    }

    /// Find a property along the fallback chain.
    ///
    /// Returns the object holding the property together with a copy of it.
    pub fn lookup(&self, name: &str) -> Option<(ObjectRef, Property)> {
        let mut current = Some(self.clone());
        while let Some(obj) = current {
            if let Some(property) = obj.own_property(name) {
                return Some((obj, property));
            }
            current = obj.fallback();
        }
        None
    }

    /// Whether `ancestor` appears on this object's fallback chain
    pub fn inherits_from(&self, ancestor: &ObjectRef) -> bool {
        let mut current = self.fallback();
        while let Some(obj) = current {
            if obj.ptr_eq(ancestor) {
                return true;
            }
            current = obj.fallback();
        }
        false
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Object")
            .field("id", &data.id)
            .field("kind", &data.kind)
            .field("keys", &data.properties.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(obj) => write!(f, "Weak({})", obj.id()),
            None => write!(f, "Weak(<dead>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup_own() {
        let obj = ObjectRef::plain();
        obj.define_own("x", Property::slot(Value::from(1)));
        obj.define_own("y", Property::slot(Value::from(2)));

        assert!(obj.has_own("x"));
        assert_eq!(obj.own_keys().len(), 2);
        match obj.own_property("y") {
            Some(Property::Slot { value, .. }) => assert_eq!(value, Value::from(2)),
            other => panic!("Expected slot, got {:?}", other),
        }
    }

    #[test]
    fn test_redefine_keeps_position() {
        let obj = ObjectRef::plain();
        obj.define_own("a", Property::slot(Value::from(1)));
        obj.define_own("b", Property::slot(Value::from(2)));
        obj.define_own("a", Property::slot(Value::from(3)));

        let keys: Vec<String> = obj.own_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let obj = ObjectRef::plain();
        obj.define_own("a", Property::slot(Value::from(1)));
        obj.define_own("b", Property::slot(Value::from(2)));
        obj.define_own("c", Property::slot(Value::from(3)));

        assert!(obj.remove_own("a"));
        assert!(!obj.remove_own("a"));
        match obj.own_property("c") {
            Some(Property::Slot { value, .. }) => assert_eq!(value, Value::from(3)),
            other => panic!("Expected slot, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_walks_fallback_chain() {
        let base = ObjectRef::plain();
        base.define_own("shared", Property::slot(Value::from("base")));
        let child = ObjectRef::with_parent(&base);

        let (holder, _) = child.lookup("shared").unwrap();
        assert!(holder.ptr_eq(&base));
        assert!(child.inherits_from(&base));
        assert!(!base.inherits_from(&child));
        assert!(child.lookup("missing").is_none());
    }

    #[test]
    fn test_weak_fallback_does_not_keep_target_alive() {
        let target = ObjectRef::plain();
        let follower = ObjectRef::new(
            ObjectKind::Plain,
            Some(Fallback::Weak(target.downgrade())),
        );
        assert!(follower.fallback().is_some());
        drop(target);
        assert!(follower.fallback().is_none());
    }
}
