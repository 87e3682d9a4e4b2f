//! Encapsulation runtime
//!
//! The [`Runtime`] owns the hidden state shared by every blueprint it
//! creates: the identity table mapping each instance's public object to its
//! private and protected tier objects, and the composite-key table holding
//! member values per `(tier object, name)`. It also implements the property
//! protocol (`get`, `set`, `call`) that routes accesses through installed
//! member definitions.
//!
//! All state sits behind `RefCell`s. No borrow is held while user code runs,
//! so constructors and methods may freely re-enter the runtime.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::class::Blueprint;
use crate::definition::Visibility;
use crate::error::{ClassError, ClassResult};
use crate::identity::{CompositeKeyMap, IdentityKey, IdentityMap};
use crate::object::{Fallback, ObjectKind, ObjectRef, Property};
use crate::options::RuntimeOptions;
use crate::value::{Function, HeapId, Value};

/// Hidden tiers of one instance, keyed by its public object
struct TierRecord {
    private: ObjectRef,
    protected: ObjectRef,
}

/// The three tier objects making up one instance
#[derive(Debug, Clone)]
pub struct InstanceTiers {
    /// Most privileged view; `this` inside constructors and methods
    pub private: ObjectRef,
    /// View shared with subclasses
    pub protected: ObjectRef,
    /// External view returned by construction
    pub public: ObjectRef,
}

impl InstanceTiers {
    /// Tier object for `visibility`
    pub fn get(&self, visibility: Visibility) -> &ObjectRef {
        match visibility {
            Visibility::Private => &self.private,
            Visibility::Protected => &self.protected,
            Visibility::Public => &self.public,
        }
    }
}

/// Encapsulation runtime
pub struct Runtime {
    id: HeapId,
    options: RuntimeOptions,
    tiers: RefCell<IdentityMap<TierRecord>>,
    values: RefCell<CompositeKeyMap<Value>>,
}

impl Runtime {
    /// Create a runtime with default options
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with the given options
    pub fn with_options(options: RuntimeOptions) -> Self {
        let id = HeapId::next();
        debug!("runtime {} created ({:?})", id, options);
        Self {
            id,
            options,
            tiers: RefCell::new(IdentityMap::new()),
            values: RefCell::new(CompositeKeyMap::new()),
        }
    }

    /// Identity of this runtime
    pub fn id(&self) -> HeapId {
        self.id
    }

    /// Active options
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    // ===== Property protocol =====

    /// Read `name` from `target`, walking the fallback chain.
    ///
    /// Absent names read as `Undefined`.
    pub fn get(&self, target: &ObjectRef, name: &str) -> ClassResult<Value> {
        match target.lookup(name) {
            None => Ok(Value::Undefined),
            Some((_, Property::Slot { value, .. })) => Ok(value),
            Some((holder, Property::Member { definition, .. })) => {
                definition.read(self, target, &holder)
            }
        }
    }

    /// Write `name` on `target`.
    ///
    /// Installed members handle the write themselves. A non-writable slot
    /// anywhere on the chain rejects it. Otherwise the value lands in an own
    /// slot of `target`, shadowing any inherited slot of the same name.
    pub fn set(&self, target: &ObjectRef, name: &str, value: Value) -> ClassResult<()> {
        match target.lookup(name) {
            Some((_, Property::Member { definition, writable })) => {
                definition.write(self, target, value, writable)
            }
            Some((_, Property::Slot { writable: false, .. })) => Err(ClassError::immutable(name)),
            Some((holder, Property::Slot { enumerable, .. })) if holder.ptr_eq(target) => {
                target.define_own(
                    name,
                    Property::Slot {
                        value,
                        enumerable,
                        writable: true,
                    },
                );
                Ok(())
            }
            _ => {
                target.define_own(name, Property::slot(value));
                Ok(())
            }
        }
    }

    /// Whether `name` resolves anywhere on `target`'s chain
    pub fn has(&self, target: &ObjectRef, name: &str) -> bool {
        target.lookup(name).is_some()
    }

    /// Own property names of `target`
    pub fn own_keys(&self, target: &ObjectRef) -> Vec<Rc<str>> {
        target.own_keys()
    }

    /// Own enumerable property names of `target`. Installed members are
    /// never enumerable.
    pub fn enumerable_keys(&self, target: &ObjectRef) -> Vec<Rc<str>> {
        target
            .own_keys()
            .into_iter()
            .filter(|name| {
                target
                    .own_property(name)
                    .map_or(false, |property| property.is_enumerable())
            })
            .collect()
    }

    /// Read `name` from `target` and call it with `target` as receiver
    pub fn call(&self, target: &ObjectRef, name: &str, args: &[Value]) -> ClassResult<Value> {
        let callee = self.get(target, name)?;
        match callee {
            Value::Function(func) => self.invoke(&func, target, args),
            Value::Class(class) => Err(not_constructible(&class)),
            _ => Err(ClassError::NotCallable {
                name: name.to_string(),
            }),
        }
    }

    /// Call an arbitrary value as a plain function
    pub fn call_value(&self, callee: &Value, this: &ObjectRef, args: &[Value]) -> ClassResult<Value> {
        match callee {
            Value::Function(func) => self.invoke(func, this, args),
            Value::Class(class) => Err(not_constructible(class)),
            other => Err(ClassError::NotCallable {
                name: other.to_string(),
            }),
        }
    }

    /// Run `func` against `receiver`. Rebound functions see the receiving
    /// instance's private tier as `this`.
    pub fn invoke(&self, func: &Function, receiver: &ObjectRef, args: &[Value]) -> ClassResult<Value> {
        if func.is_rebound() {
            if let Some(private) = self.tier_for(receiver, Visibility::Private) {
                return func.call_raw(self, &private, args);
            }
        }
        func.call_raw(self, receiver, args)
    }

    /// Whether `value` is an object whose chain reaches `class`'s prototype
    pub fn instance_of(&self, value: &Value, class: &Blueprint) -> bool {
        match value {
            Value::Object(obj) => obj.inherits_from(class.prototype()),
            _ => false,
        }
    }

    /// Tiers of the instance `obj` belongs to. Accepts any of the instance's
    /// three tier objects.
    pub fn tiers_of(&self, obj: &ObjectRef) -> Option<InstanceTiers> {
        let public = public_tier(obj)?;
        let tiers = self.tiers.borrow();
        let record = tiers.get(&IdentityKey::object(&public))?;
        Some(InstanceTiers {
            private: record.private.clone(),
            protected: record.protected.clone(),
            public,
        })
    }

    /// Number of instances with live hidden tiers
    pub fn instance_count(&self) -> usize {
        self.tiers.borrow().len()
    }

    /// Drop hidden state whose owning objects are unreachable.
    ///
    /// Returns the number of table entries removed.
    pub fn collect_garbage(&self) -> usize {
        // Tier records first: dropping them releases the private and
        // protected objects that key member values.
        let tiers = self.tiers.borrow_mut().purge();
        let values = self.values.borrow_mut().purge();
        debug!(
            "runtime {}: purged {} tier records and {} member values",
            self.id, tiers, values
        );
        tiers + values
    }

    // ===== Crate-internal state access =====

    /// Look up or create the hidden tiers for `public`. The flag is true
    /// when the tiers were created by this call.
    pub(crate) fn resolve_tiers(&self, public: &ObjectRef) -> (InstanceTiers, bool) {
        let key = IdentityKey::object(public);
        let existing = self
            .tiers
            .borrow()
            .get(&key)
            .map(|record| (record.private.clone(), record.protected.clone()));

        if let Some((private, protected)) = existing {
            let tiers = InstanceTiers {
                private,
                protected,
                public: public.clone(),
            };
            return (tiers, false);
        }

        let protected = ObjectRef::new(
            ObjectKind::Tier(Visibility::Protected),
            Some(Fallback::Weak(public.downgrade())),
        );
        let private = ObjectRef::new(
            ObjectKind::Tier(Visibility::Private),
            Some(Fallback::Weak(protected.downgrade())),
        );
        debug!(
            "created tiers for instance {} (private {}, protected {})",
            public.id(),
            private.id(),
            protected.id()
        );

        self.tiers.borrow_mut().set(
            key,
            TierRecord {
                private: private.clone(),
                protected: protected.clone(),
            },
        );
        let tiers = InstanceTiers {
            private,
            protected,
            public: public.clone(),
        };
        (tiers, true)
    }

    /// Tier object of `receiver`'s instance for `visibility`
    pub(crate) fn tier_for(&self, receiver: &ObjectRef, visibility: Visibility) -> Option<ObjectRef> {
        self.tiers_of(receiver)
            .map(|tiers| tiers.get(visibility).clone())
    }

    pub(crate) fn slot_value(&self, owner: &ObjectRef, name: &str) -> Option<Value> {
        self.values.borrow().get(&slot_key(owner, name)).cloned()
    }

    pub(crate) fn store_slot(&self, owner: &ObjectRef, name: &str, value: Value) {
        self.values.borrow_mut().set(&slot_key(owner, name), value);
    }

    /// Store `value` unless the slot already holds one
    pub(crate) fn seed_slot(&self, owner: &ObjectRef, name: &str, value: &Value) {
        let key = slot_key(owner, name);
        let mut values = self.values.borrow_mut();
        if values.get(&key).is_none() {
            values.set(&key, value.clone());
        }
    }

    /// Rebind function-valued member reads to the private tier
    pub(crate) fn wrap_member_value(&self, value: Value) -> Value {
        match value {
            Value::Function(func) if self.options.wrap_methods => Value::Function(func.rebound()),
            other => other,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("instances", &self.tiers.borrow().len())
            .field("values", &self.values.borrow().len())
            .finish()
    }
}

fn slot_key(owner: &ObjectRef, name: &str) -> [IdentityKey; 2] {
    [IdentityKey::object(owner), IdentityKey::string(name)]
}

/// Walk tier fallbacks up to the public tier object
fn public_tier(obj: &ObjectRef) -> Option<ObjectRef> {
    let mut current = obj.clone();
    loop {
        match current.tier()? {
            Visibility::Public => return Some(current),
            _ => current = current.fallback()?,
        }
    }
}

fn not_constructible(class: &Blueprint) -> ClassError {
    ClassError::Usage(format!(
        "Class constructor {} cannot be invoked without 'new'",
        class.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_object() -> ObjectRef {
        ObjectRef::new(ObjectKind::Tier(Visibility::Public), None)
    }

    #[test]
    fn test_get_missing_is_undefined() {
        let rt = Runtime::new();
        let obj = ObjectRef::plain();
        assert!(rt.get(&obj, "missing").unwrap().is_undefined());
        assert!(!rt.has(&obj, "missing"));
    }

    #[test]
    fn test_set_shadows_inherited_slot() {
        let rt = Runtime::new();
        let base = ObjectRef::plain();
        rt.set(&base, "x", Value::from(1)).unwrap();
        let child = ObjectRef::with_parent(&base);

        rt.set(&child, "x", Value::from(2)).unwrap();

        assert_eq!(rt.get(&child, "x").unwrap(), Value::from(2));
        assert_eq!(rt.get(&base, "x").unwrap(), Value::from(1));
    }

    #[test]
    fn test_non_writable_slot_rejects_writes() {
        let rt = Runtime::new();
        let obj = ObjectRef::plain();
        obj.define_own(
            "frozen",
            Property::Slot {
                value: Value::from(1),
                enumerable: false,
                writable: false,
            },
        );

        let err = rt.set(&obj, "frozen", Value::from(2)).unwrap_err();
        assert!(err.is_type_error());
        assert!(rt.enumerable_keys(&obj).is_empty());
        assert_eq!(rt.own_keys(&obj).len(), 1);
    }

    #[test]
    fn test_resolve_tiers_is_idempotent() {
        let rt = Runtime::new();
        let public = public_object();

        let (first, created) = rt.resolve_tiers(&public);
        assert!(created);
        let (second, created) = rt.resolve_tiers(&public);
        assert!(!created);

        assert!(first.private.ptr_eq(&second.private));
        assert!(first.protected.ptr_eq(&second.protected));
        assert_eq!(rt.instance_count(), 1);
    }

    #[test]
    fn test_tiers_of_accepts_any_tier() {
        let rt = Runtime::new();
        let public = public_object();
        let (tiers, _) = rt.resolve_tiers(&public);

        for obj in [&tiers.private, &tiers.protected, &tiers.public] {
            let found = rt.tiers_of(obj).unwrap();
            assert!(found.public.ptr_eq(&public));
            assert!(found.private.ptr_eq(&tiers.private));
        }
        assert!(rt.tiers_of(&ObjectRef::plain()).is_none());
    }

    #[test]
    fn test_tier_chain_falls_back_to_public() {
        let rt = Runtime::new();
        let public = public_object();
        rt.set(&public, "shared", Value::from("outside")).unwrap();
        let (tiers, _) = rt.resolve_tiers(&public);

        assert_eq!(rt.get(&tiers.private, "shared").unwrap(), Value::from("outside"));
        assert!(tiers.private.inherits_from(&public));
    }

    #[test]
    fn test_rebound_function_sees_private_tier() {
        let rt = Runtime::new();
        let public = public_object();
        let (tiers, _) = rt.resolve_tiers(&public);
        let private_id = tiers.private.id();

        let whoami = Function::new("whoami", |_, this, _| Ok(Value::from(this.id().as_u64() as f64)));

        let plain = rt.invoke(&whoami, &public, &[]).unwrap();
        let bound = rt.invoke(&whoami.rebound(), &public, &[]).unwrap();

        assert_eq!(plain, Value::from(public.id().as_u64() as f64));
        assert_eq!(bound, Value::from(private_id.as_u64() as f64));
    }

    #[test]
    fn test_call_non_function_fails() {
        let rt = Runtime::new();
        let obj = ObjectRef::plain();
        rt.set(&obj, "n", Value::from(1)).unwrap();

        let err = rt.call(&obj, "n", &[]).unwrap_err();
        assert_eq!(err.code(), Some("E_NOT_CALLABLE"));
    }

    #[test]
    fn test_collect_garbage_drops_dead_instances() {
        let rt = Runtime::new();
        let kept = public_object();
        let dropped = public_object();
        rt.resolve_tiers(&kept);
        let (tiers, _) = rt.resolve_tiers(&dropped);
        rt.store_slot(&tiers.private, "x", Value::from(1));
        rt.store_slot(&dropped, "y", Value::from(2));
        drop(tiers);
        drop(dropped);

        assert_eq!(rt.collect_garbage(), 3);
        assert_eq!(rt.instance_count(), 1);
        assert_eq!(rt.collect_garbage(), 0);
    }
}
