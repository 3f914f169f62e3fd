use fathom_ir::{Clazz, Site};

/// Fatal analysis errors.
///
/// These indicate malformed input or a broken lattice invariant and stop
/// the run. Conditions the analysis can recover from are reported as
/// [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Debug, thiserror::Error)]
pub enum DfaError {
    /// The program has no entry point.
    #[error("program has no main clazz")]
    MissingMain,
    /// The IR violates a structural expectation.
    #[error("malformed IR at {site:?}: {reason}")]
    MalformedIr { site: Option<Site>, reason: String },
    /// An access whose target value has no clazz to dispatch on.
    #[error("no computable target for access at {site} on {target}")]
    NoAccessTarget { site: Site, target: String },
    /// A statement popped more operands than were pushed.
    #[error("operand stack underflow at {site}")]
    StackUnderflow { site: Site },
    /// A match subject contained a value that is not tagged.
    #[error("unexpected match subject at {site}: {value}")]
    UnexpectedMatchSubject { site: Site, value: String },
    /// Two tagged values of different choice clazzes met in a join.
    #[error("cannot join tagged values of clazz {left:?} and {right:?}")]
    TaggedClazzMismatch { left: Clazz, right: Clazz },
    /// A field was read from or written to a value that has no such field.
    #[error("invalid access to field {field:?} of {value}")]
    InvalidFieldAccess { field: Clazz, value: String },
    /// The iteration cap was hit before a fixpoint was reached.
    #[error("no fixpoint after {limit} iterations")]
    IterationLimit { limit: usize },
    /// Failure raised by a user-registered intrinsic.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl DfaError {
    /// Wrap an arbitrary error as [`DfaError::Custom`].
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        DfaError::Custom(Box::new(error))
    }

    pub(crate) fn malformed(site: impl Into<Option<Site>>, reason: impl Into<String>) -> Self {
        DfaError::MalformedIr {
            site: site.into(),
            reason: reason.into(),
        }
    }
}
