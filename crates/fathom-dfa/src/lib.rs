//! Whole-program data-flow analysis.
//!
//! [`Dfa`] abstractly interprets a program given through the
//! [`fathom_ir::Ir`] trait, starting at its main clazz, until it finds the
//! values every field may hold, the calls that may happen, and the effects
//! each call needs installed. The result is an [`AnalyzedIr`]: the same
//! program, with code that is never executed marked as not needing code and
//! dynamic accesses narrowed to the implementations actually reached.
//!
//! ```
//! use fathom_dfa::{Dfa, Diagnostic};
//!
//! let (program, _) = fathom_test_utils::programs::missing_effect();
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! Dfa::new(&program).run(&mut diagnostics)?;
//! for diagnostic in &diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! assert_eq!(diagnostics.len(), 1);
//! # Ok::<(), fathom_dfa::DfaError>(())
//! ```

mod call;
mod call_group;
mod context;
mod dfa;
mod diagnostics;
mod env;
mod error;
mod escape;
mod heap;
mod interp;
pub mod intrinsics;
mod options;
mod site;
pub mod value;
mod view;

pub use call::{Args, Call, CallId, CallKey};
pub use call_group::{CallGroupId, CallGroupKey, CallGroups, EffectSet};
pub use context::Context;
pub use dfa::Dfa;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, LogSink, Severity};
pub use env::{EffectTypes, Env, EnvId, EnvTable};
pub use error::DfaError;
pub use escape::{Escapes, LifeTime};
pub use intrinsics::{IntrinsicFn, IntrinsicRegistry};
pub use options::{
    DfaOptions, MAX_ITERATIONS_VAR, MAX_NEW_CALL_RECURSION_VAR, SITE_SENSITIVE_VAR,
};
pub use site::SiteInfo;
pub use value::{Value, ValueId, ValueTable};
pub use view::AnalyzedIr;

/// Target of all log records of the analysis.
pub(crate) const LOG_TARGET: &str = "fathom::dfa";
