pub use fathom_ir as ir;

#[cfg(feature = "dfa")]
pub use fathom_dfa as dfa;

pub mod prelude {
    pub use fathom_ir::*;

    #[cfg(feature = "dfa")]
    pub use fathom_dfa::{
        AnalyzedIr, Dfa, DfaError, DfaOptions, Diagnostic, DiagnosticKind, DiagnosticSink,
        IntrinsicRegistry, LogSink, Severity,
    };
}
