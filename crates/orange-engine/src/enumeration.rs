//! Enumerated constant sets
//!
//! An [`Enumeration`] assigns ordinals `1..=N` to an ordered list of names
//! and can expose them, plus itself, onto an object.

use std::fmt;
use std::rc::Rc;

use crate::object::{ObjectRef, Property};
use crate::value::{HeapId, Value};

/// Named set of ordinal constants
pub struct Enumeration {
    id: HeapId,
    name: Rc<str>,
    items: Vec<(Rc<str>, u32)>,
}

impl Enumeration {
    /// Build an enumeration, numbering `names` from 1 in order
    pub fn from_names<I, S>(name: &str, names: I) -> Rc<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = names
            .into_iter()
            .zip(1u32..)
            .map(|(item, ordinal)| (Rc::from(item.as_ref()), ordinal))
            .collect();

        Rc::new(Self {
            id: HeapId::next(),
            name: Rc::from(name),
            items,
        })
    }

    /// Identity of this enumeration
    pub fn id(&self) -> HeapId {
        self.id
    }

    /// Name the enumeration is exposed under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the enumeration has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ordinal of `item`
    pub fn ordinal(&self, item: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|(name, _)| &**name == item)
            .map(|(_, ordinal)| *ordinal)
    }

    /// Item carrying `ordinal`
    pub fn name_of(&self, ordinal: u32) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(name, _)| &**name)
    }

    /// Items in declaration order
    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(name, ordinal)| (&**name, *ordinal))
    }

    /// Write every item's ordinal onto `target`, then the enumeration itself
    /// under its own name.
    pub fn expose_in(self: &Rc<Self>, target: &ObjectRef) {
        for (name, ordinal) in &self.items {
            target.define_own(name, Property::slot(Value::from(*ordinal)));
        }
        target.define_own(&self.name, Property::slot(Value::Enum(Rc::clone(self))));
    }
}

impl fmt::Debug for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumeration")
            .field("name", &self.name)
            .field("items", &self.items)
            .finish()
    }
}
