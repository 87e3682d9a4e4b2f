//! Orange Encapsulation Engine
//!
//! Classical private / protected / public member visibility and
//! single-parent inheritance over a dynamic object model:
//! - Identity-keyed hidden state (`IdentityMap`, `CompositeKeyMap`)
//! - Declarative member specifications with a `[visibility] [kind] name` grammar
//! - Member definitions (data, accessor, enumerated, write-once)
//! - Class blueprints building a three-tier object chain per instance
//!
//! ```rust,ignore
//! let rt = Runtime::new();
//! let counter = rt.class("Counter", &MemberSpec::new()
//!     .member("count", 0)
//!     .method("public increment", |rt, this, _| {
//!         let n = rt.get(this, "count")?.as_number().unwrap_or(0.0);
//!         rt.set(this, "count", Value::from(n + 1.0))?;
//!         Ok(Value::from(n + 1.0))
//!     }))?;
//! let c = rt.construct(&counter, &[])?;
//! rt.call(&c, "increment", &[])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod definition;
pub mod enumeration;
pub mod error;
pub mod identity;
pub mod object;
pub mod options;
pub mod runtime;
pub mod spec;
pub mod value;

pub use class::Blueprint;
pub use definition::{
    parse_key, ApplyOptions, DefinitionList, KindToken, MemberDefinition, MemberKey, MemberKind, Visibility,
};
pub use enumeration::Enumeration;
pub use error::{ClassError, ClassResult, Exception};
pub use identity::{CompositeKeyMap, IdentityKey, IdentityMap};
pub use object::{Fallback, ObjectKind, ObjectRef, Property};
pub use options::{ConfigError, RuntimeOptions};
pub use runtime::{InstanceTiers, Runtime};
pub use spec::{Descriptor, MemberSpec, MemberValue};
pub use value::{Function, HeapId, Value};
