use std::borrow::Cow;

use crate::{Access, Clazz, ClazzKind, CodeBlock, Expr, Site, SourcePos, SpecialClazz};

/// Read-only queries over a typed, monomorphized program.
///
/// The analysis never mutates the program it runs on; every fact it needs
/// about clazzes and code comes through this trait.
pub trait Ir {
    /// The universe: outermost clazz, holder of global fields.
    fn universe(&self) -> Clazz;

    /// The entry point, if the program has one.
    fn main_clazz(&self) -> Option<Clazz>;

    fn clazz_name(&self, cl: Clazz) -> &str;

    fn clazz_kind(&self, cl: Clazz) -> ClazzKind;

    fn clazz_outer(&self, cl: Clazz) -> Option<Clazz>;

    /// Field of `cl` that holds its outer instance.
    fn clazz_outer_ref(&self, cl: Clazz) -> Option<Clazz>;

    /// Argument fields of a routine or intrinsic, in order.
    fn clazz_args(&self, cl: Clazz) -> &[Clazz];

    /// Result type of a routine, or value type of a field.
    fn clazz_result_clazz(&self, cl: Clazz) -> Clazz;

    /// Field storing a routine's result, `None` for constructors and
    /// unit-returning routines.
    fn clazz_result_field(&self, cl: Clazz) -> Option<Clazz>;

    fn clazz_is_ref(&self, cl: Clazz) -> bool;

    /// Value counterpart of a reference clazz, `cl` itself otherwise.
    fn clazz_as_value(&self, cl: Clazz) -> Clazz;

    /// Whether values of `cl` carry no information (unit-like types).
    fn clazz_is_unit_type(&self, cl: Clazz) -> bool;

    fn special_clazz(&self, cl: Clazz) -> Option<SpecialClazz>;

    fn clazz_of(&self, special: SpecialClazz) -> Option<Clazz>;

    /// Body of a routine.
    fn clazz_code(&self, cl: Clazz) -> Option<CodeBlock>;

    fn clazz_precondition(&self, cl: Clazz) -> Option<CodeBlock>;

    fn clazz_generics(&self, cl: Clazz) -> &[Clazz];

    /// Routine run when a value of `cl` is called as a function.
    fn lookup_call(&self, cl: Clazz) -> Option<Clazz>;

    /// Effect type operated on by an effect intrinsic.
    fn effect_type(&self, cl: Clazz) -> Option<Clazz>;

    /// Name under which an intrinsic's semantics are registered.
    fn intrinsic_name(&self, cl: Clazz) -> Option<&str>;

    fn clazz_pos(&self, cl: Clazz) -> Option<&SourcePos>;

    /// Clazz owning a code block.
    fn code_clazz(&self, block: CodeBlock) -> Clazz;

    fn code_len(&self, block: CodeBlock) -> usize;

    fn expr(&self, site: Site) -> Option<&Expr>;

    fn site_pos(&self, site: Site) -> Option<&SourcePos>;

    /// Number of clazzes; handles are dense in `0..clazz_count()`.
    fn clazz_count(&self) -> usize;

    /// Possible (target, callee) pairs at an access.
    fn accessed_clazzes(&self, site: Site) -> Cow<'_, [Access]> {
        match self.expr(site) {
            Some(expr) => Cow::Borrowed(expr.accesses()),
            None => Cow::Borrowed(&[]),
        }
    }

    /// Whether code must be generated for `cl`.
    fn clazz_needs_code(&self, _cl: Clazz) -> bool {
        true
    }

    fn site_clazz(&self, site: Site) -> Clazz {
        self.code_clazz(site.block)
    }

    fn clazz_is_numeric(&self, cl: Clazz) -> bool {
        self.special_clazz(cl).is_some_and(SpecialClazz::is_numeric)
    }

    fn clazz_is_bool(&self, cl: Clazz) -> bool {
        self.special_clazz(cl) == Some(SpecialClazz::Bool)
    }

    fn clazz_result_is_unit(&self, cl: Clazz) -> bool {
        self.clazz_is_unit_type(self.clazz_result_clazz(cl))
    }
}
