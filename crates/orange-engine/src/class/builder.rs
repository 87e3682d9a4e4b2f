//! Blueprint creation and instantiation
//!
//! Construction of one instance runs these steps in order:
//!
//! 1. Resolve or create the instance's tiers (idempotent per public object).
//! 2. On first construction, install private definitions onto the private
//!    tier and protected definitions onto the protected tier, then fill in
//!    ancestors' private definitions the class does not redeclare so that
//!    inherited methods find their state.
//! 3. Run the most specific constructor with the private tier as `this`.
//! 4. On first construction, reinstall write-once definitions read-only onto
//!    each tier, which locks them.
//!
//! Public definitions are installed once, onto the blueprint's prototype,
//! when the blueprint is created.

use std::rc::Rc;

use log::{debug, trace, warn};

use super::{Blueprint, BlueprintData};
use crate::definition::{ApplyOptions, DefinitionList, MemberDefinition, Visibility};
use crate::error::{ClassError, ClassResult};
use crate::object::{Fallback, ObjectKind, ObjectRef, Property};
use crate::runtime::{InstanceTiers, Runtime};
use crate::spec::MemberSpec;
use crate::value::{Function, HeapId, Value};

impl Runtime {
    /// Create a class from a member specification.
    ///
    /// An empty `name` uses the configured default class name.
    pub fn class(&self, name: &str, members: &MemberSpec) -> ClassResult<Blueprint> {
        let mut definitions = DefinitionList::parse(members, None)?;
        let constructor = definitions.take_constructor()?;
        self.build(name, definitions, constructor, None)
    }

    /// Create a class whose prototype chain extends `parent`.
    ///
    /// `parent` must be a blueprint created by this runtime. Unlike
    /// [`Runtime::extend`], the parent's protected members are not
    /// re-applied to instances; only the public chain and the parent's
    /// constructor (when none is declared) are inherited.
    pub fn class_with_parent(&self, name: &str, members: &MemberSpec, parent: &Value) -> ClassResult<Blueprint> {
        let parent = self.own_blueprint(parent)?;
        let mut definitions = DefinitionList::parse(members, Some(Rc::clone(parent.definitions())))?;
        let constructor = definitions.take_constructor()?;
        self.build(name, definitions, constructor, Some(parent))
    }

    /// Derive a subclass of `parent`.
    ///
    /// The subclass list carries copies of the parent's protected
    /// definitions, so every instance gets them on its protected tier with
    /// the child's redeclarations taking precedence. When the child declares
    /// no constructor the nearest ancestor's runs.
    pub fn extend(&self, parent: &Blueprint, name: &str, members: &MemberSpec) -> ClassResult<Blueprint> {
        let parent = self.own_blueprint(&Value::Class(parent.clone()))?;
        let mut definitions = parent.definitions().extend(members)?;
        let constructor = definitions.take_constructor()?;
        self.build(name, definitions, constructor, Some(parent))
    }

    /// Instantiate `class`, returning the public object
    pub fn construct(&self, class: &Blueprint, args: &[Value]) -> ClassResult<ObjectRef> {
        if class.runtime_id() != self.id() {
            return Err(ClassError::Usage(format!(
                "class {} belongs to a different runtime",
                class.name()
            )));
        }
        let public = ObjectRef::new(
            ObjectKind::Tier(Visibility::Public),
            Some(Fallback::Strong(class.prototype().clone())),
        );
        self.initialize(class, &public, args)?;
        Ok(public)
    }

    /// Instantiate whatever `callee` holds, which must be a blueprint
    pub fn construct_value(&self, callee: &Value, args: &[Value]) -> ClassResult<ObjectRef> {
        match callee {
            Value::Class(class) => self.construct(class, args),
            other => Err(ClassError::Usage(format!("{} is not a constructor", other))),
        }
    }

    /// Run construction of `class` against an existing public object
    pub(crate) fn initialize(&self, class: &Blueprint, public: &ObjectRef, args: &[Value]) -> ClassResult<()> {
        let (tiers, created) = self.resolve_tiers(public);
        let definitions = class.definitions();

        if created {
            for visibility in [Visibility::Private, Visibility::Protected] {
                for definition in definitions.definitions(visibility) {
                    definition.install(self, tiers.get(visibility), ApplyOptions::default())?;
                }
            }
            for inherited in class.ancestor_privates() {
                inherited.install(self, &tiers.private, ApplyOptions::fill_missing())?;
            }
        }

        if let Some(ctor) = class.effective_constructor() {
            if let Err(err) = ctor.call_raw(self, &tiers.private, args) {
                if created {
                    warn!(
                        "construction of {} failed; tiers of instance {} are kept: {}",
                        class.name(),
                        public.id(),
                        err
                    );
                }
                return Err(err);
            }
        }

        if created && self.options().lock_write_once {
            self.lockdown(class, &tiers)?;
        }
        Ok(())
    }

    fn lockdown(&self, class: &Blueprint, tiers: &InstanceTiers) -> ClassResult<()> {
        let read_onlys = class.definitions().read_onlys();
        let public_read_onlys = class.definitions().publics().read_onlys();

        let passes = [
            (&read_onlys, Visibility::Private),
            (&read_onlys, Visibility::Protected),
            (&public_read_onlys, Visibility::Public),
        ];
        for (list, visibility) in passes {
            for definition in list.definitions(visibility) {
                definition.install(self, tiers.get(visibility), ApplyOptions::read_only())?;
            }
        }
        for inherited in class.ancestor_privates().filter(|d| d.is_write_once()) {
            if installed_on(&tiers.private, inherited) {
                inherited.install(self, &tiers.private, ApplyOptions::read_only())?;
            }
        }
        trace!("locked write-once members of instance {}", tiers.public.id());
        Ok(())
    }

    fn build(
        &self,
        name: &str,
        definitions: DefinitionList,
        constructor: Option<Function>,
        parent: Option<Blueprint>,
    ) -> ClassResult<Blueprint> {
        let name = if name.is_empty() {
            self.options().default_class_name.as_str()
        } else {
            name
        };
        let prototype = ObjectRef::new(
            ObjectKind::Prototype,
            parent
                .as_ref()
                .map(|p| Fallback::Strong(p.prototype().clone())),
        );
        for definition in definitions.definitions(Visibility::Public) {
            definition.install(self, &prototype, ApplyOptions::default())?;
        }

        debug!(
            "created class {} ({} members, parent: {})",
            name,
            definitions.len(),
            parent.as_ref().map_or("none", |p| p.name())
        );

        Ok(Blueprint(Rc::new(BlueprintData {
            id: HeapId::next(),
            runtime_id: self.id(),
            name: Rc::from(name),
            definitions: Rc::new(definitions),
            parent,
            constructor,
            prototype,
        })))
    }

    fn own_blueprint(&self, value: &Value) -> ClassResult<Blueprint> {
        match value {
            Value::Class(class) if class.runtime_id() == self.id() => Ok(class.clone()),
            Value::Class(class) => Err(ClassError::InvalidPrototype(format!(
                "class {} (created by another runtime)",
                class.name()
            ))),
            other => Err(ClassError::InvalidPrototype(other.to_string())),
        }
    }
}

/// Whether `target` carries `definition` itself rather than a redeclaration
fn installed_on(target: &ObjectRef, definition: &Rc<MemberDefinition>) -> bool {
    match target.own_property(definition.name()) {
        Some(Property::Member { definition: own, .. }) => Rc::ptr_eq(&own, definition),
        _ => false,
    }
}
