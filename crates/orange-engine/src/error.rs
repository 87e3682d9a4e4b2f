//! Error types for the encapsulation engine
//!
//! Every failure surfaces synchronously as a [`ClassError`]. Definition
//! problems (malformed keys, kind mismatches) are distinct from the
//! type-level [`ClassError::Immutable`] raised by writes to locked members.

/// Result type for engine operations
pub type ClassResult<T> = Result<T, ClassError>;

/// Lightweight exception value carrying a message and an optional code.
///
/// User constructors and methods raise these to abort a call; they reach the
/// caller wrapped in [`ClassError::Thrown`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", code_suffix(.code))]
pub struct Exception {
    /// Human-readable message
    pub message: String,
    /// Optional machine-readable code
    pub code: Option<String>,
}

impl Exception {
    /// Create an exception without a code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create an exception with a code
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|code| format!(" [{}]", code)).unwrap_or_default()
}

/// Errors raised by member definition, class construction and property access
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassError {
    /// A member key does not match the `[visibility] [kind] name` grammar
    #[error("Invalid property definition: '{key}'")]
    MalformedMember {
        /// The offending key
        key: String,
    },

    /// A declared kind does not fit the value (or installer) it was given
    #[error("Invalid kind for member '{name}': expected {expected}, got {found}")]
    InvalidKind {
        /// Member name
        name: String,
        /// What the kind requires
        expected: &'static str,
        /// What was supplied
        found: String,
    },

    /// The construction protocol was not followed
    #[error("Usage error: {0}")]
    Usage(String),

    /// A parent passed to class creation is not a blueprint of this runtime
    #[error("Invalid prototype: {0} is not a class blueprint of this runtime")]
    InvalidPrototype(String),

    /// Write to a member that is read-only (write-once after construction,
    /// getter-only accessor, or non-writable slot)
    #[error("TypeError: Cannot assign to read only property '{name}'")]
    Immutable {
        /// Member name
        name: String,
    },

    /// Attempt to call a value that is not a function
    #[error("TypeError: {name} is not a function")]
    NotCallable {
        /// Member or value description
        name: String,
    },

    /// Exception raised by user code
    #[error("{0}")]
    Thrown(#[from] Exception),
}

impl ClassError {
    /// Stable code identifying the error category
    pub fn code(&self) -> Option<&str> {
        match self {
            ClassError::MalformedMember { .. } => Some("E_MALFORMED_MEMBER"),
            ClassError::InvalidKind { .. } => Some("E_INVALID_KIND"),
            ClassError::Usage(_) => Some("E_USAGE"),
            ClassError::InvalidPrototype(_) => Some("E_INVALID_PROTOTYPE"),
            ClassError::Immutable { .. } => Some("E_IMMUTABLE"),
            ClassError::NotCallable { .. } => Some("E_NOT_CALLABLE"),
            ClassError::Thrown(exception) => exception.code.as_deref(),
        }
    }

    /// Whether this is a type-level error (as opposed to a definition or
    /// usage error)
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            ClassError::Immutable { .. } | ClassError::NotCallable { .. }
        )
    }

    /// Whether this error was raised while parsing a member specification
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            ClassError::MalformedMember { .. } | ClassError::InvalidKind { .. }
        )
    }

    pub(crate) fn immutable(name: &str) -> Self {
        ClassError::Immutable {
            name: name.to_string(),
        }
    }
}
