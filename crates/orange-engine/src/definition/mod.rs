//! Member definitions
//!
//! A [`MemberDefinition`] describes one declared member: its name, its
//! visibility tier and how it stores or computes its value. Definitions
//! install themselves onto tier objects as [`Property::Member`] entries;
//! reads and writes of those properties are routed back here.
//!
//! Data and write-once members keep their values outside the object, in the
//! runtime's composite-key table, under `(tier object, name)`. The tier
//! object is the receiving instance's object for the member's declared
//! visibility, so the same name declared at two tiers gets two independent
//! slots.

mod list;

pub use list::{parse_key, DefinitionList, KindToken, MemberKey};

use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::enumeration::Enumeration;
use crate::error::{ClassError, ClassResult};
use crate::object::{ObjectRef, Property};
use crate::runtime::Runtime;
use crate::value::{Function, Value};

/// Member visibility tier, most privileged first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    /// Visible only to the declaring class
    Private,
    /// Visible to the class and its subclasses
    Protected,
    /// Visible to everyone
    Public,
}

impl Visibility {
    /// All tiers, most privileged first
    pub const ALL: [Visibility; 3] = [Visibility::Private, Visibility::Protected, Visibility::Public];

    /// Parse a visibility keyword
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }

    /// Keyword for this tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }

    /// Whether code holding this tier's view can see members of `other`
    pub fn sees(self, other: Visibility) -> bool {
        self <= other
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage and behavior of a member
#[derive(Debug, Clone)]
pub enum MemberKind {
    /// Read/write slot with a default value
    Data {
        /// Value before the first write
        default: Value,
    },
    /// Computed property
    Accessor {
        /// Runs on read
        getter: Option<Function>,
        /// Runs on write
        setter: Option<Function>,
    },
    /// Closed set of named constants
    Enumerated {
        /// Item names, numbered from 1
        names: Vec<Rc<str>>,
    },
    /// Data slot writable only until construction completes
    WriteOnce {
        /// Value before the first write
        default: Value,
    },
}

impl MemberKind {
    /// Keyword for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Data { .. } => "data",
            MemberKind::Accessor { .. } => "accessor",
            MemberKind::Enumerated { .. } => "enum",
            MemberKind::WriteOnce { .. } => "readonly",
        }
    }
}

/// Options for installing definitions onto an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// When false, data and accessor members are installed read-only
    pub allow_writes: bool,
    /// When false, names the target already owns are left untouched
    pub overwrite: bool,
}

impl ApplyOptions {
    /// Install read-only, replacing existing properties
    pub fn read_only() -> Self {
        Self {
            allow_writes: false,
            overwrite: true,
        }
    }

    /// Install writable, only where the target has no own property
    pub fn fill_missing() -> Self {
        Self {
            allow_writes: true,
            overwrite: false,
        }
    }
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            allow_writes: true,
            overwrite: true,
        }
    }
}

/// One declared member
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    name: Rc<str>,
    visibility: Visibility,
    kind: MemberKind,
}

impl MemberDefinition {
    /// Create a definition
    pub fn new(name: &str, visibility: Visibility, kind: MemberKind) -> Self {
        Self {
            name: Rc::from(name),
            visibility,
            kind,
        }
    }

    /// Data member with a default value
    pub fn data(name: &str, visibility: Visibility, default: Value) -> Self {
        Self::new(name, visibility, MemberKind::Data { default })
    }

    /// Write-once member with a default value
    pub fn write_once(name: &str, visibility: Visibility, default: Value) -> Self {
        Self::new(name, visibility, MemberKind::WriteOnce { default })
    }

    /// Accessor member
    pub fn accessor(
        name: &str,
        visibility: Visibility,
        getter: Option<Function>,
        setter: Option<Function>,
    ) -> Self {
        Self::new(name, visibility, MemberKind::Accessor { getter, setter })
    }

    /// Enumerated member
    pub fn enumerated<I, S>(name: &str, visibility: Visibility, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names.into_iter().map(|n| Rc::from(n.as_ref())).collect();
        Self::new(name, visibility, MemberKind::Enumerated { names })
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Storage kind
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// Whether this is a write-once member
    pub fn is_write_once(&self) -> bool {
        matches!(self.kind, MemberKind::WriteOnce { .. })
    }

    /// Default value of a data or write-once member
    pub fn default_value(&self) -> Option<&Value> {
        match &self.kind {
            MemberKind::Data { default } | MemberKind::WriteOnce { default } => Some(default),
            _ => None,
        }
    }

    /// Set the getter, turning a non-accessor into a getter-only accessor
    pub(crate) fn define_getter(&mut self, getter: Function) {
        match &mut self.kind {
            MemberKind::Accessor { getter: slot, .. } => *slot = Some(getter),
            kind => {
                *kind = MemberKind::Accessor {
                    getter: Some(getter),
                    setter: None,
                }
            }
        }
    }

    /// Set the setter, turning a non-accessor into a setter-only accessor
    pub(crate) fn define_setter(&mut self, setter: Function) {
        match &mut self.kind {
            MemberKind::Accessor { setter: slot, .. } => *slot = Some(setter),
            kind => {
                *kind = MemberKind::Accessor {
                    getter: None,
                    setter: Some(setter),
                }
            }
        }
    }

    /// Structural equality (values by SameValue, functions by identity)
    pub fn same_as(&self, other: &MemberDefinition) -> bool {
        if self.name != other.name || self.visibility != other.visibility {
            return false;
        }
        match (&self.kind, &other.kind) {
            (MemberKind::Data { default: a }, MemberKind::Data { default: b })
            | (MemberKind::WriteOnce { default: a }, MemberKind::WriteOnce { default: b }) => {
                Value::same_value(a, b)
            }
            (
                MemberKind::Accessor {
                    getter: ga,
                    setter: sa,
                },
                MemberKind::Accessor {
                    getter: gb,
                    setter: sb,
                },
            ) => same_function(ga, gb) && same_function(sa, sb),
            (MemberKind::Enumerated { names: a }, MemberKind::Enumerated { names: b }) => a == b,
            _ => false,
        }
    }

    /// Install this member onto `target`.
    ///
    /// Enumerated members expose their items as plain slots. Every other kind
    /// becomes a [`Property::Member`]; data and write-once members also seed
    /// the `(target, name)` slot with their default unless one exists.
    /// Re-installing an identical definition is a no-op.
    pub fn install(self: &Rc<Self>, rt: &Runtime, target: &ObjectRef, options: ApplyOptions) -> ClassResult<()> {
        if !options.overwrite && target.has_own(&self.name) {
            trace!("keeping existing '{}' on {}", self.name, target.id());
            return Ok(());
        }

        if let MemberKind::Enumerated { names } = &self.kind {
            trace!("exposing enum '{}' ({} items) on {}", self.name, names.len(), target.id());
            Enumeration::from_names(&self.name, names.iter()).expose_in(target);
            return Ok(());
        }

        let property = Property::Member {
            definition: Rc::clone(self),
            writable: options.allow_writes,
        };
        if let Some(existing) = target.own_property(&self.name) {
            if existing.same_as(&property) {
                return Ok(());
            }
        }

        trace!(
            "installing {} {} '{}' on {} (writable: {})",
            self.visibility,
            self.kind.as_str(),
            self.name,
            target.id(),
            options.allow_writes
        );
        target.define_own(&self.name, property);
        if let Some(default) = self.default_value() {
            rt.seed_slot(target, &self.name, default);
        }
        Ok(())
    }

    /// Read through an installed property.
    ///
    /// `receiver` is the object the read started from; `holder` is the object
    /// the property was found on.
    pub(crate) fn read(&self, rt: &Runtime, receiver: &ObjectRef, holder: &ObjectRef) -> ClassResult<Value> {
        match &self.kind {
            MemberKind::Data { default } | MemberKind::WriteOnce { default } => {
                let owner = self.slot_owner(rt, receiver);
                let value = match rt.slot_value(&owner, &self.name) {
                    Some(value) => value,
                    None => {
                        let initial = rt.slot_value(holder, &self.name).unwrap_or_else(|| default.clone());
                        rt.store_slot(&owner, &self.name, initial.clone());
                        initial
                    }
                };
                Ok(rt.wrap_member_value(value))
            }
            MemberKind::Accessor { getter, .. } => match getter {
                Some(getter) => rt.invoke(&getter.rebound(), receiver, &[]),
                None => Ok(Value::Undefined),
            },
            MemberKind::Enumerated { .. } => Err(self.not_installable()),
        }
    }

    /// Write through an installed property
    pub(crate) fn write(
        &self,
        rt: &Runtime,
        receiver: &ObjectRef,
        value: Value,
        writable: bool,
    ) -> ClassResult<()> {
        if !writable {
            return Err(ClassError::immutable(&self.name));
        }
        match &self.kind {
            MemberKind::Data { .. } | MemberKind::WriteOnce { .. } => {
                let owner = self.slot_owner(rt, receiver);
                rt.store_slot(&owner, &self.name, value);
                Ok(())
            }
            MemberKind::Accessor { setter, .. } => match setter {
                Some(setter) => rt.invoke(&setter.rebound(), receiver, &[value]).map(|_| ()),
                None => Err(ClassError::immutable(&self.name)),
            },
            MemberKind::Enumerated { .. } => Err(self.not_installable()),
        }
    }

    /// Object whose slot stores this member's value for `receiver`: the
    /// receiving instance's tier object for the declared visibility, or the
    /// receiver itself when it is not part of an instance. The holder's slot
    /// only supplies the initial value.
    fn slot_owner(&self, rt: &Runtime, receiver: &ObjectRef) -> ObjectRef {
        rt.tier_for(receiver, self.visibility)
            .unwrap_or_else(|| receiver.clone())
    }

    fn not_installable(&self) -> ClassError {
        ClassError::InvalidKind {
            name: self.name.to_string(),
            expected: "an installable member",
            found: self.kind.as_str().to_string(),
        }
    }
}

fn same_function(a: &Option<Function>, b: &Option<Function>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}
