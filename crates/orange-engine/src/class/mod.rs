//! Class blueprints
//!
//! A [`Blueprint`] is the reusable, immutable description of a class: its
//! display name, parsed definitions, parent, constructor and the shared
//! prototype object carrying its public members. Blueprints are created
//! through [`Runtime::class`](crate::Runtime::class) and friends (see
//! `builder`).

mod builder;

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::definition::{DefinitionList, MemberDefinition, Visibility};
use crate::object::ObjectRef;
use crate::value::{Function, HeapId};

struct BlueprintData {
    id: HeapId,
    runtime_id: HeapId,
    name: Rc<str>,
    definitions: Rc<DefinitionList>,
    parent: Option<Blueprint>,
    constructor: Option<Function>,
    prototype: ObjectRef,
}

/// Shared handle to a class blueprint
#[derive(Clone)]
pub struct Blueprint(Rc<BlueprintData>);

impl Blueprint {
    /// Identity of this blueprint
    pub fn id(&self) -> HeapId {
        self.0.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parsed member definitions
    pub fn definitions(&self) -> &Rc<DefinitionList> {
        &self.0.definitions
    }

    /// Parent blueprint, if this class extends one
    pub fn parent(&self) -> Option<&Blueprint> {
        self.0.parent.as_ref()
    }

    /// Shared prototype holding the public members
    pub fn prototype(&self) -> &ObjectRef {
        &self.0.prototype
    }

    /// Constructor declared on this blueprint
    pub fn constructor(&self) -> Option<&Function> {
        self.0.constructor.as_ref()
    }

    /// Most specific constructor along the parent chain
    pub fn effective_constructor(&self) -> Option<&Function> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(ctor) = class.constructor() {
                return Some(ctor);
            }
            current = class.parent();
        }
        None
    }

    /// Private definitions declared by ancestors, nearest ancestor first
    pub(crate) fn ancestor_privates(&self) -> impl Iterator<Item = &Rc<MemberDefinition>> {
        std::iter::successors(self.parent(), |class| class.parent())
            .flat_map(|class| class.definitions().definitions(Visibility::Private))
    }

    /// Whether `ancestor` is this blueprint or one of its ancestors
    pub fn is_subclass_of(&self, ancestor: &Blueprint) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.ptr_eq(ancestor) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Number of ancestors
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(class) = current {
            depth += 1;
            current = class.parent();
        }
        depth
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Blueprint) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn runtime_id(&self) -> HeapId {
        self.0.runtime_id
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Any> {
        let weak: Weak<BlueprintData> = Rc::downgrade(&self.0);
        weak
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .field("definitions", &self.0.definitions)
            .finish()
    }
}
