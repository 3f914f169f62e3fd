use std::collections::BTreeSet;

use fathom_ir::{Arena, Clazz, ClazzKind, Id, Ir, Site};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::call::{Args, Call, CallId, CallKey};
use crate::call_group::CallGroups;
use crate::context::Context;
use crate::diagnostics::{Diagnostic, DiagnosticSink, ReportKey};
use crate::env::EnvTable;
use crate::error::DfaError;
use crate::escape::Escapes;
use crate::intrinsics::IntrinsicRegistry;
use crate::options::DfaOptions;
use crate::site::SiteInfo;
use crate::value::{ValueId, ValueTable};
use crate::view::AnalyzedIr;
use crate::LOG_TARGET;

/// Whole-program data-flow analysis over an [`Ir`].
///
/// Starting from a single call of the main clazz, the driver re-analyzes
/// every known call until an iteration discovers nothing new, then runs one
/// more iteration with diagnostics enabled. All tables only ever grow, and
/// every update is a join, so the iteration terminates for any program whose
/// clazz space is finite.
///
/// ```
/// use fathom_dfa::{Dfa, Diagnostic};
/// use fathom_ir::Ir;
///
/// let fx = fathom_test_utils::programs::identity_twice();
/// let mut diagnostics: Vec<Diagnostic> = Vec::new();
/// let analyzed = Dfa::new(&fx.program)
///     .with_max_iterations(100)
///     .run(&mut diagnostics)?;
/// assert!(analyzed.clazz_needs_code(fx.main));
/// # Ok::<(), fathom_dfa::DfaError>(())
/// ```
pub struct Dfa<'ir, I: ?Sized> {
    pub(crate) ir: &'ir I,
    pub(crate) options: DfaOptions,
    pub(crate) intrinsics: IntrinsicRegistry<I>,
    pub(crate) values: ValueTable,
    pub(crate) calls: Arena<CallId, Call>,
    pub(crate) call_index: FxHashMap<CallKey, CallId>,
    pub(crate) envs: EnvTable,
    pub(crate) default_effects: IndexMap<Clazz, ValueId>,
    pub(crate) sites: IndexMap<Site, SiteInfo>,
    pub(crate) groups: CallGroups,
    pub(crate) escapes: Escapes,
    /// Instance holding the fields of the universe.
    pub(crate) universe: ValueId,
    main: Option<CallId>,
    changed: bool,
    pub(crate) reporting: bool,
    iteration: usize,
    /// Callees of the calls currently analyzed eagerly, innermost last.
    new_call_stack: Vec<Clazz>,
    pub(crate) read_fields: FxHashSet<Clazz>,
    pub(crate) written_fields: FxHashSet<Clazz>,
    pub(crate) intrinsics_used: BTreeSet<String>,
    pub(crate) unknown_intrinsics: FxHashSet<String>,
    pub(crate) reported: FxHashSet<ReportKey>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

// -- Constructors -----------------------------------------------------------

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// An analysis of `ir` with default options and the standard intrinsics.
    pub fn new(ir: &'ir I) -> Self {
        let mut values = ValueTable::new();
        let universe = values.instance(ir.universe(), None, None, Context::EntryPoint);
        Self {
            ir,
            options: DfaOptions::default(),
            intrinsics: IntrinsicRegistry::standard(),
            values,
            calls: Arena::default(),
            call_index: FxHashMap::default(),
            envs: EnvTable::default(),
            default_effects: IndexMap::new(),
            sites: IndexMap::new(),
            groups: CallGroups::default(),
            escapes: Escapes::default(),
            universe,
            main: None,
            changed: false,
            reporting: false,
            iteration: 0,
            new_call_stack: Vec::new(),
            read_fields: FxHashSet::default(),
            written_fields: FxHashSet::default(),
            intrinsics_used: BTreeSet::new(),
            unknown_intrinsics: FxHashSet::default(),
            reported: FxHashSet::default(),
            diagnostics: Vec::new(),
        }
    }
}

// -- Builder methods --------------------------------------------------------

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn with_options(mut self, options: DfaOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the intrinsic table.
    pub fn with_intrinsics(mut self, intrinsics: IntrinsicRegistry<I>) -> Self {
        self.intrinsics = intrinsics;
        self
    }

    /// Fail with [`DfaError::IterationLimit`] instead of iterating further.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.options.max_iterations = Some(max);
        self
    }

    pub fn with_site_sensitivity(mut self, site_sensitive: bool) -> Self {
        self.options.site_sensitive = site_sensitive;
        self
    }
}

// -- Accessors --------------------------------------------------------------

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn ir(&self) -> &'ir I {
        self.ir
    }

    pub fn options(&self) -> &DfaOptions {
        &self.options
    }

    pub fn intrinsics(&self) -> &IntrinsicRegistry<I> {
        &self.intrinsics
    }

    pub fn intrinsics_mut(&mut self) -> &mut IntrinsicRegistry<I> {
        &mut self.intrinsics
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ValueTable {
        &mut self.values
    }

    /// The call of the main clazz, once seeded.
    pub fn main_call(&self) -> Option<CallId> {
        self.main
    }

    /// Number of iterations run so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_reporting(&self) -> bool {
        self.reporting
    }

    /// Intrinsic names looked up during the analysis.
    pub fn intrinsics_used(&self) -> &BTreeSet<String> {
        &self.intrinsics_used
    }

    pub fn field_is_read(&self, field: Clazz) -> bool {
        self.read_fields.contains(&field)
    }

    pub fn field_is_written(&self, field: Clazz) -> bool {
        self.written_fields.contains(&field)
    }

    /// Record that the current iteration learned something. `reason` is only
    /// rendered when trace logging is on.
    pub(crate) fn was_changed(&mut self, reason: impl FnOnce(&Self) -> String) {
        if log::log_enabled!(target: LOG_TARGET, log::Level::Trace) {
            log::trace!(target: LOG_TARGET, "changed: {}", reason(self));
        }
        self.changed = true;
    }
}

// -- Fixpoint ---------------------------------------------------------------

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    /// Create the call of the main clazz. Idempotent.
    pub fn seed(&mut self) -> Result<CallId, DfaError> {
        if let Some(main) = self.main {
            return Ok(main);
        }
        let main = self.ir.main_clazz().ok_or(DfaError::MissingMain)?;
        let id = self.new_call(
            main,
            false,
            None,
            ValueId::UNIT,
            Args::new(),
            None,
            Context::EntryPoint,
        )?;
        self.main = Some(id);
        Ok(id)
    }

    /// Run one iteration over all known calls, returning whether anything
    /// changed.
    pub fn step(&mut self) -> Result<bool, DfaError> {
        self.seed()?;
        self.iteration += 1;
        self.changed = false;
        let values = self.values.len();
        self.iterate()?;
        let changed = self.changed || self.values.len() != values;
        log::debug!(
            target: LOG_TARGET,
            "iteration {}: {} calls, {} values, {} environments{}",
            self.iteration,
            self.calls.len(),
            self.values.len(),
            self.envs.len(),
            if changed { "" } else { ", stable" }
        );
        Ok(changed)
    }

    /// Iterate until nothing changes. Returns the number of iterations run.
    pub fn find_fixpoint(&mut self) -> Result<usize, DfaError> {
        while self.step()? {
            if let Some(limit) = self.options.max_iterations {
                if self.iteration >= limit {
                    return Err(DfaError::IterationLimit { limit });
                }
            }
        }
        Ok(self.iteration)
    }

    /// Run the reporting pass over the stable state.
    pub fn report(&mut self) -> Result<(), DfaError> {
        self.reporting = true;
        self.iterate()?;
        log::debug!(
            target: LOG_TARGET,
            "reporting pass: {} diagnostic(s)",
            self.diagnostics.len()
        );
        Ok(())
    }

    /// Find the fixpoint and run the reporting pass.
    pub fn analyze(&mut self) -> Result<(), DfaError> {
        self.find_fixpoint()?;
        self.report()
    }

    /// Analyze the program, hand all diagnostics to `sink` and return the
    /// refined view of the program.
    pub fn run(mut self, sink: &mut impl DiagnosticSink) -> Result<AnalyzedIr<'ir, I>, DfaError> {
        self.analyze()?;
        for diagnostic in self.take_diagnostics() {
            sink.emit(diagnostic);
        }
        Ok(AnalyzedIr::new(self))
    }

    fn iterate(&mut self) -> Result<(), DfaError> {
        // calls created during the pass are visited in the same pass
        let mut next = 0;
        while next < self.calls.len() {
            self.analyze_call(CallId::from(Id::from_raw(next)))?;
            next += 1;
        }
        Ok(())
    }

    /// Interpret the code of a routine call once.
    pub(crate) fn analyze_call(&mut self, id: CallId) -> Result<(), DfaError> {
        let ir = self.ir;
        let call = &self.calls[id];
        let (callee, pre, target, instance) =
            (call.key.callee, call.key.pre, call.key.target, call.instance);
        if ir.clazz_kind(callee) != ClazzKind::Routine {
            return Ok(());
        }
        let args = call.key.args.clone();
        for (&field, &arg) in ir.clazz_args(callee).iter().zip(args.iter()) {
            if !ir.clazz_result_is_unit(field) {
                self.set_field(instance, field, arg)?;
            }
        }
        if let Some(outer_ref) = ir.clazz_outer_ref(callee) {
            self.set_field(instance, outer_ref, target)?;
            if self.escapes.contains(callee) {
                self.value_escapes(target);
            }
        }
        let code = if pre {
            ir.clazz_precondition(callee)
        } else {
            ir.clazz_code(callee)
        };
        let completes = match code {
            Some(block) => self.process_code(id, block)?,
            None => true,
        };
        if completes {
            self.mark_returns(id);
        }
        Ok(())
    }

    /// Analyze a call right after it was created, unless that would recurse
    /// too deep or into a callee already being analyzed this way. Skipped
    /// calls are picked up by the running iteration.
    pub(crate) fn analyze_new_call(&mut self, id: CallId) -> Result<(), DfaError> {
        let callee = self.calls[id].key.callee;
        if self.new_call_stack.len() >= self.options.max_new_call_recursion
            || self.new_call_stack.contains(&callee)
        {
            return Ok(());
        }
        self.new_call_stack.push(callee);
        let result = self.analyze_call(id);
        self.new_call_stack.pop();
        result
    }
}
