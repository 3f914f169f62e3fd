use std::fmt;

use fathom_ir::{Clazz, Ir, Site, SourcePos};

use crate::call::CallId;
use crate::dfa::Dfa;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Conditions the analysis recovers from but reports once the fixpoint is
/// reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A field is read but no write to it was ever observed.
    UninitializedField,
    /// An effect is read in an environment that does not install it.
    EffectNotInstalled,
    /// An intrinsic has no registered semantics.
    MissingIntrinsic,
    /// An abstract feature was reached.
    AbstractCalled,
    /// No implementation matches the target of a dynamic access.
    MissingImplementation,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::MissingIntrinsic => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A reported problem together with the calls that led to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub pos: Option<SourcePos>,
    pub message: String,
    /// Rendered causal chain, oldest call first.
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(pos) = &self.pos {
            write!(f, " at {pos}")?;
        }
        writeln!(f, ": {}", self.message)?;
        f.write_str(self.context.trim_end())
    }
}

/// Receiver of the diagnostics of a finished run.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!(target: crate::LOG_TARGET, "{diagnostic}"),
            Severity::Error => log::error!(target: crate::LOG_TARGET, "{diagnostic}"),
        }
    }
}

pub(crate) type ReportKey = (DiagnosticKind, Option<Site>, Clazz);

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// Diagnostics collected by the reporting pass so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Record a diagnostic, at most once per `(kind, site, subject)`.
    ///
    /// Outside the reporting pass this does nothing: a condition seen
    /// mid-fixpoint may still go away.
    pub(crate) fn report_diagnostic(
        &mut self,
        kind: DiagnosticKind,
        site: Option<Site>,
        subject: Clazz,
        build: impl FnOnce(&Self) -> (Option<SourcePos>, String, String),
    ) {
        if !self.reporting || !self.reported.insert((kind, site, subject)) {
            return;
        }
        let (pos, message, context) = build(self);
        self.diagnostics.push(Diagnostic {
            severity: kind.severity(),
            kind,
            pos,
            message,
            context,
        });
    }

    /// Source position of `site`, or of `fallback` when the site has none.
    pub(crate) fn pos_of(&self, site: Option<Site>, fallback: Clazz) -> Option<SourcePos> {
        let ir = self.ir();
        site.and_then(|s| ir.site_pos(s))
            .or_else(|| ir.clazz_pos(fallback))
            .cloned()
    }

    pub(crate) fn unknown_intrinsic(&mut self, id: CallId, name: &str) {
        if self.unknown_intrinsics.insert(name.to_string()) {
            log::warn!(target: crate::LOG_TARGET, "no semantics for intrinsic `{name}`");
        }
        let call = self.call(id);
        let (callee, site, context) = (call.callee(), call.site, call.context);
        self.report_diagnostic(DiagnosticKind::MissingIntrinsic, site, callee, |dfa| {
            (
                dfa.pos_of(site, callee),
                format!("no semantics for intrinsic `{name}`, assuming any result"),
                dfa.render_context(context),
            )
        });
    }
}
