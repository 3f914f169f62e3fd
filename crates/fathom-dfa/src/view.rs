use std::borrow::Cow;
use std::collections::BTreeSet;

use fathom_ir::{
    Access, Clazz, ClazzKind, CodeBlock, Expr, Ir, Site, SourcePos, SpecialClazz,
};

use crate::call_group::EffectSet;
use crate::dfa::Dfa;
use crate::escape::LifeTime;

/// The analyzed program: the underlying [`Ir`], refined by what the analysis
/// observed.
///
/// Code generators consume this instead of the original IR.
/// [`clazz_needs_code`](Ir::clazz_needs_code) is false for routines that are
/// never called and fields that are never read, and
/// [`accessed_clazzes`](Ir::accessed_clazzes) lists only the callees actually
/// dispatched to.
pub struct AnalyzedIr<'ir, I: ?Sized> {
    ir: &'ir I,
    dfa: Dfa<'ir, I>,
    called: BTreeSet<Clazz>,
    instantiated: BTreeSet<Clazz>,
}

impl<'ir, I: Ir + ?Sized> AnalyzedIr<'ir, I> {
    pub(crate) fn new(dfa: Dfa<'ir, I>) -> Self {
        let called = dfa.calls().map(|(_, call)| call.callee()).collect();
        let instantiated = dfa
            .values()
            .iter()
            .filter_map(|(_, value)| value.clazz())
            .collect();
        Self {
            ir: dfa.ir(),
            dfa,
            called,
            instantiated,
        }
    }

    /// The finished analysis.
    pub fn dfa(&self) -> &Dfa<'ir, I> {
        &self.dfa
    }

    pub fn into_dfa(self) -> Dfa<'ir, I> {
        self.dfa
    }

    /// Clazzes of all calls, routines, intrinsics and fields alike.
    pub fn called_clazzes(&self) -> &BTreeSet<Clazz> {
        &self.called
    }

    /// Clazzes some value was created of.
    pub fn instantiated_clazzes(&self) -> &BTreeSet<Clazz> {
        &self.instantiated
    }

    /// The statement at `site` was reached but never produced a value.
    pub fn always_results_in_void(&self, site: Site) -> bool {
        self.dfa
            .site_info(site)
            .is_some_and(|info| info.reached && !info.completes)
    }

    pub fn is_intrinsic_used(&self, name: &str) -> bool {
        self.dfa.intrinsics_used().contains(name)
    }

    /// Effect types some call of `clazz` needs installed by its callers.
    pub fn effects_required_by(&self, clazz: Clazz) -> EffectSet {
        let groups = self.dfa.call_groups();
        groups
            .iter()
            .filter(|(_, key)| key.callee == clazz)
            .flat_map(|(id, _)| groups.used_effects(id).iter())
            .collect()
    }

    /// Some instance of the routine `clazz` may be reached after its call
    /// returned, so it cannot live on the stack.
    pub fn instance_escapes(&self, clazz: Clazz) -> bool {
        self.dfa.escapes().contains(clazz)
    }

    /// The object created by the call at `site` may outlive the routine
    /// containing the call.
    pub fn result_escapes(&self, site: Site) -> bool {
        self.dfa.escapes().contains_site(site)
    }

    pub fn life_time(&self, clazz: Clazz) -> LifeTime {
        self.dfa.life_time(clazz)
    }

    fn field_needs_code(&self, field: Clazz) -> bool {
        let ir = self.ir;
        if self.dfa.field_is_read(field) {
            return true;
        }
        let numeric_val = ir.clazz_name(field) == "val"
            && ir
                .clazz_outer(field)
                .is_some_and(|outer| ir.clazz_is_numeric(outer));
        let main_result = ir
            .main_clazz()
            .and_then(|main| ir.clazz_result_field(main))
            == Some(field);
        numeric_val || main_result
    }
}

impl<I: Ir + ?Sized> Ir for AnalyzedIr<'_, I> {
    fn universe(&self) -> Clazz {
        self.ir.universe()
    }

    fn main_clazz(&self) -> Option<Clazz> {
        self.ir.main_clazz()
    }

    fn clazz_name(&self, cl: Clazz) -> &str {
        self.ir.clazz_name(cl)
    }

    fn clazz_kind(&self, cl: Clazz) -> ClazzKind {
        self.ir.clazz_kind(cl)
    }

    fn clazz_outer(&self, cl: Clazz) -> Option<Clazz> {
        self.ir.clazz_outer(cl)
    }

    fn clazz_outer_ref(&self, cl: Clazz) -> Option<Clazz> {
        self.ir.clazz_outer_ref(cl)
    }

    fn clazz_args(&self, cl: Clazz) -> &[Clazz] {
        self.ir.clazz_args(cl)
    }

    fn clazz_result_clazz(&self, cl: Clazz) -> Clazz {
        self.ir.clazz_result_clazz(cl)
    }

    fn clazz_result_field(&self, cl: Clazz) -> Option<Clazz> {
        self.ir.clazz_result_field(cl)
    }

    fn clazz_is_ref(&self, cl: Clazz) -> bool {
        self.ir.clazz_is_ref(cl)
    }

    fn clazz_as_value(&self, cl: Clazz) -> Clazz {
        self.ir.clazz_as_value(cl)
    }

    fn clazz_is_unit_type(&self, cl: Clazz) -> bool {
        self.ir.clazz_is_unit_type(cl)
    }

    fn special_clazz(&self, cl: Clazz) -> Option<SpecialClazz> {
        self.ir.special_clazz(cl)
    }

    fn clazz_of(&self, special: SpecialClazz) -> Option<Clazz> {
        self.ir.clazz_of(special)
    }

    fn clazz_code(&self, cl: Clazz) -> Option<CodeBlock> {
        self.ir.clazz_code(cl)
    }

    fn clazz_precondition(&self, cl: Clazz) -> Option<CodeBlock> {
        self.ir.clazz_precondition(cl)
    }

    fn clazz_generics(&self, cl: Clazz) -> &[Clazz] {
        self.ir.clazz_generics(cl)
    }

    fn lookup_call(&self, cl: Clazz) -> Option<Clazz> {
        self.ir.lookup_call(cl)
    }

    fn effect_type(&self, cl: Clazz) -> Option<Clazz> {
        self.ir.effect_type(cl)
    }

    fn intrinsic_name(&self, cl: Clazz) -> Option<&str> {
        self.ir.intrinsic_name(cl)
    }

    fn clazz_pos(&self, cl: Clazz) -> Option<&SourcePos> {
        self.ir.clazz_pos(cl)
    }

    fn code_clazz(&self, block: CodeBlock) -> Clazz {
        self.ir.code_clazz(block)
    }

    fn code_len(&self, block: CodeBlock) -> usize {
        self.ir.code_len(block)
    }

    fn expr(&self, site: Site) -> Option<&Expr> {
        self.ir.expr(site)
    }

    fn site_pos(&self, site: Site) -> Option<&SourcePos> {
        self.ir.site_pos(site)
    }

    fn clazz_count(&self) -> usize {
        self.ir.clazz_count()
    }

    fn accessed_clazzes(&self, site: Site) -> Cow<'_, [Access]> {
        let Some(info) = self.dfa.site_info(site) else {
            return Cow::Owned(Vec::new());
        };
        self.ir
            .accessed_clazzes(site)
            .iter()
            .filter(|a| info.callees.contains(&a.callee))
            .copied()
            .collect()
    }

    fn clazz_needs_code(&self, cl: Clazz) -> bool {
        let ir = self.ir;
        if ir.clazz_is_ref(cl) {
            let value = ir.clazz_as_value(cl);
            if value != cl {
                return self.clazz_needs_code(value);
            }
        }
        match ir.clazz_kind(cl) {
            ClazzKind::Routine => self.called.contains(&cl) || self.instantiated.contains(&cl),
            ClazzKind::Intrinsic => self.called.contains(&cl),
            ClazzKind::Field => self.field_needs_code(cl),
            ClazzKind::Abstract | ClazzKind::Choice => true,
        }
    }
}
