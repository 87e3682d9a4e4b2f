//! Definition lists
//!
//! Parses a [`MemberSpec`] into [`MemberDefinition`]s partitioned by
//! visibility tier, and provides the tier projections class construction
//! needs. Declaration order is preserved within each tier.

use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use super::{ApplyOptions, MemberDefinition, MemberKind, Visibility};
use crate::error::{ClassError, ClassResult};
use crate::object::ObjectRef;
use crate::runtime::Runtime;
use crate::spec::{MemberSpec, MemberValue};
use crate::value::{Function, Value};

/// One to three whitespace-separated tokens
static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\S+)(?:\s+(\S+))?(?:\s+(\S+))?$").expect("member key pattern is valid")
});

/// Name reserved for the user constructor
pub(crate) const CONSTRUCTOR: &str = "constructor";

/// Kind keyword of a member key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindToken {
    /// `data` (default)
    Data,
    /// `descriptor`
    Descriptor,
    /// `enum`
    Enum,
    /// `get`
    Get,
    /// `set`
    Set,
    /// `readonly`
    ReadOnly,
}

impl KindToken {
    /// Parse a kind keyword
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "data" => Some(KindToken::Data),
            "descriptor" => Some(KindToken::Descriptor),
            "enum" => Some(KindToken::Enum),
            "get" => Some(KindToken::Get),
            "set" => Some(KindToken::Set),
            "readonly" => Some(KindToken::ReadOnly),
            _ => None,
        }
    }

    /// Keyword for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            KindToken::Data => "data",
            KindToken::Descriptor => "descriptor",
            KindToken::Enum => "enum",
            KindToken::Get => "get",
            KindToken::Set => "set",
            KindToken::ReadOnly => "readonly",
        }
    }
}

/// A parsed member key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    /// Declared (or default) visibility
    pub visibility: Visibility,
    /// Declared (or default) kind
    pub kind: KindToken,
    /// Member name
    pub name: String,
}

/// Parse a `[visibility] [kind] name` member key.
///
/// Visibility defaults to `private` and kind to `data`. When the token in
/// kind position is not a kind keyword, or nothing follows it, that token is
/// the name of a data member and anything after it is ignored. Members may
/// therefore be literally named `data`, `get`, `set` and so on. Only keys
/// that are not one to three tokens, or a lone visibility, are malformed.
pub fn parse_key(key: &str) -> ClassResult<MemberKey> {
    let malformed = || ClassError::MalformedMember {
        key: key.to_string(),
    };

    let captures = KEY_PATTERN.captures(key).ok_or_else(malformed)?;
    let token = |group| captures.get(group).map(|m| m.as_str());
    let first = token(1).ok_or_else(malformed)?;

    let (visibility, kind_token, name_token) = match Visibility::from_token(first) {
        Some(visibility) => (visibility, token(2), token(3)),
        None => (Visibility::Private, Some(first), token(2)),
    };
    let kind_token = kind_token.ok_or_else(malformed)?;

    let (kind, name) = match (KindToken::from_token(kind_token), name_token) {
        (Some(kind), Some(name)) => (kind, name),
        _ => (KindToken::Data, kind_token),
    };

    Ok(MemberKey {
        visibility,
        kind,
        name: name.to_string(),
    })
}

#[derive(Clone, Default)]
struct TierTable {
    order: Vec<Rc<MemberDefinition>>,
    index: FxHashMap<Rc<str>, usize>,
}

impl TierTable {
    fn get(&self, name: &str) -> Option<&Rc<MemberDefinition>> {
        self.index.get(name).map(|&slot| &self.order[slot])
    }

    fn insert(&mut self, definition: Rc<MemberDefinition>) {
        match self.index.get(definition.name()) {
            Some(&slot) => self.order[slot] = definition,
            None => {
                self.index.insert(Rc::from(definition.name()), self.order.len());
                self.order.push(definition);
            }
        }
    }

    fn remove(&mut self, name: &str) -> Option<Rc<MemberDefinition>> {
        let slot = self.index.remove(name)?;
        let removed = self.order.remove(slot);
        for index in self.index.values_mut() {
            if *index > slot {
                *index -= 1;
            }
        }
        Some(removed)
    }

    fn iter(&self) -> impl Iterator<Item = &Rc<MemberDefinition>> {
        self.order.iter()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Member definitions partitioned by visibility tier
#[derive(Clone, Default)]
pub struct DefinitionList {
    tiers: [TierTable; 3],
    parent: Option<Rc<DefinitionList>>,
}

impl DefinitionList {
    /// Create an empty list
    pub fn new(parent: Option<Rc<DefinitionList>>) -> Self {
        Self {
            tiers: Default::default(),
            parent,
        }
    }

    /// Parse a member specification.
    ///
    /// Redeclaring a name at the same tier replaces the earlier definition,
    /// except that `get` and `set` declarations merge into one accessor.
    pub fn parse(members: &MemberSpec, parent: Option<Rc<DefinitionList>>) -> ClassResult<Self> {
        let mut list = Self::new(parent);

        for (key, value) in members.iter() {
            let MemberKey {
                visibility,
                kind,
                name,
            } = parse_key(key)?;
            let existing = list.tiers[visibility.index()].get(&name).cloned();

            let definition = match kind {
                KindToken::Data => MemberDefinition::data(&name, visibility, expect_value(&name, value)?),
                KindToken::ReadOnly => {
                    MemberDefinition::write_once(&name, visibility, expect_value(&name, value)?)
                }
                KindToken::Enum => match value {
                    MemberValue::Names(names) => MemberDefinition::enumerated(&name, visibility, names.iter()),
                    other => return Err(invalid_kind(&name, "a list of names", other)),
                },
                KindToken::Descriptor => match value {
                    MemberValue::Descriptor(descriptor) => match &descriptor.value {
                        Some(default) => MemberDefinition::data(&name, visibility, default.clone()),
                        None => MemberDefinition::accessor(
                            &name,
                            visibility,
                            descriptor.get.clone(),
                            descriptor.set.clone(),
                        ),
                    },
                    other => return Err(invalid_kind(&name, "a descriptor", other)),
                },
                KindToken::Get => {
                    let getter = expect_function(&name, value)?;
                    let mut definition = accessor_base(existing, &name, visibility);
                    definition.define_getter(getter);
                    definition
                }
                KindToken::Set => {
                    let setter = expect_function(&name, value)?;
                    let mut definition = accessor_base(existing, &name, visibility);
                    definition.define_setter(setter);
                    definition
                }
            };

            list.tiers[visibility.index()].insert(Rc::new(definition));
        }

        Ok(list)
    }

    /// The list this one was derived from
    pub fn parent(&self) -> Option<&Rc<DefinitionList>> {
        self.parent.as_ref()
    }

    /// Definition declared at `visibility` under `name`
    pub fn get(&self, visibility: Visibility, name: &str) -> Option<&Rc<MemberDefinition>> {
        self.tiers[visibility.index()].get(name)
    }

    /// Definitions of one tier in declaration order
    pub fn definitions(&self, visibility: Visibility) -> impl Iterator<Item = &Rc<MemberDefinition>> {
        self.tiers[visibility.index()].iter()
    }

    /// All definitions, most privileged tier first
    pub fn iter(&self) -> impl Iterator<Item = &Rc<MemberDefinition>> {
        self.tiers.iter().flat_map(TierTable::iter)
    }

    /// Number of definitions across all tiers
    pub fn len(&self) -> usize {
        self.tiers.iter().map(TierTable::len).sum()
    }

    /// Check if there are no definitions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Install every definition (all tiers) onto `target`
    pub fn apply_to(&self, rt: &Runtime, target: &ObjectRef, options: ApplyOptions) -> ClassResult<()> {
        for definition in self.iter() {
            definition.install(rt, target, options)?;
        }
        Ok(())
    }

    /// Copy with fresh definition instances, so later changes to one list
    /// cannot leak into the other
    pub fn clone_deep(&self) -> Self {
        let mut copy = Self::new(self.parent.clone());
        for (table, source) in copy.tiers.iter_mut().zip(self.tiers.iter()) {
            for definition in source.iter() {
                table.insert(Rc::new(MemberDefinition::clone(definition)));
            }
        }
        copy
    }

    /// Derive a subclass list: this list's protected definitions (copied)
    /// overlaid with the parsed child specification. Public members of this
    /// list stay reachable through [`DefinitionList::publics`].
    pub fn extend(self: &Rc<Self>, child: &MemberSpec) -> ClassResult<Self> {
        let child = Self::parse(child, Some(Rc::clone(self)))?;
        let mut list = self.protecteds().clone_deep();
        for (table, overlay) in list.tiers.iter_mut().zip(child.tiers.iter()) {
            for definition in overlay.iter() {
                table.insert(Rc::clone(definition));
            }
        }
        list.parent = Some(Rc::clone(self));
        Ok(list)
    }

    fn project(&self, visibility: Visibility) -> Self {
        let mut list = Self::new(self.parent.clone());
        list.tiers[visibility.index()] = self.tiers[visibility.index()].clone();
        list
    }

    /// Private definitions only
    pub fn privates(&self) -> Self {
        self.project(Visibility::Private)
    }

    /// Protected definitions only
    pub fn protecteds(&self) -> Self {
        self.project(Visibility::Protected)
    }

    /// Public definitions merged with every ancestor's; on a name clash the
    /// descendant's definition wins
    pub fn publics(&self) -> Self {
        let mut list = self.project(Visibility::Public);
        if let Some(parent) = &self.parent {
            let table = &mut list.tiers[Visibility::Public.index()];
            for inherited in parent.publics().definitions(Visibility::Public) {
                if table.get(inherited.name()).is_none() {
                    table.insert(Rc::clone(inherited));
                }
            }
        }
        list
    }

    /// Write-once definitions of every tier
    pub fn read_onlys(&self) -> Self {
        let mut list = Self::new(self.parent.clone());
        for (table, source) in list.tiers.iter_mut().zip(self.tiers.iter()) {
            for definition in source.iter().filter(|d| d.is_write_once()) {
                table.insert(Rc::clone(definition));
            }
        }
        list
    }

    /// Remove the `constructor` entries from every tier and return the
    /// user constructor. A public declaration takes precedence over a
    /// protected one, which takes precedence over a private one.
    pub(crate) fn take_constructor(&mut self) -> ClassResult<Option<Function>> {
        let mut constructor = None;
        for visibility in Visibility::ALL.iter().rev() {
            let Some(definition) = self.tiers[visibility.index()].remove(CONSTRUCTOR) else {
                continue;
            };
            if constructor.is_some() {
                continue;
            }
            match definition.kind() {
                MemberKind::Data {
                    default: Value::Function(func),
                } => constructor = Some(func.clone()),
                MemberKind::Data { default } => {
                    return Err(ClassError::InvalidKind {
                        name: CONSTRUCTOR.to_string(),
                        expected: "a function",
                        found: default.type_name().to_string(),
                    })
                }
                other => {
                    return Err(ClassError::InvalidKind {
                        name: CONSTRUCTOR.to_string(),
                        expected: "a data member",
                        found: other.as_str().to_string(),
                    })
                }
            }
        }
        Ok(constructor)
    }
}

impl fmt::Debug for DefinitionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for visibility in Visibility::ALL {
            let names: Vec<&str> = self.definitions(visibility).map(|d| d.name()).collect();
            map.entry(&visibility.as_str(), &names);
        }
        map.finish()
    }
}

fn accessor_base(
    existing: Option<Rc<MemberDefinition>>,
    name: &str,
    visibility: Visibility,
) -> MemberDefinition {
    match existing {
        Some(definition) if matches!(definition.kind(), MemberKind::Accessor { .. }) => {
            MemberDefinition::clone(&definition)
        }
        _ => MemberDefinition::accessor(name, visibility, None, None),
    }
}

fn expect_value(name: &str, value: &MemberValue) -> ClassResult<Value> {
    match value {
        MemberValue::Value(value) => Ok(value.clone()),
        other => Err(invalid_kind(name, "a plain value", other)),
    }
}

fn expect_function(name: &str, value: &MemberValue) -> ClassResult<Function> {
    match value {
        MemberValue::Value(Value::Function(func)) => Ok(func.clone()),
        other => Err(invalid_kind(name, "a function", other)),
    }
}

fn invalid_kind(name: &str, expected: &'static str, found: &MemberValue) -> ClassError {
    ClassError::InvalidKind {
        name: name.to_string(),
        expected,
        found: found.describe(),
    }
}
