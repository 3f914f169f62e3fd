//! Abstract semantics of intrinsics.
//!
//! The analysis knows nothing about any particular intrinsic: when a call to
//! an intrinsic clazz needs a result, its name is looked up in an
//! [`IntrinsicRegistry`]. [`IntrinsicRegistry::standard`] covers numeric
//! operators, effect operations and the runtime primitives; embedders add or
//! override entries with [`IntrinsicRegistry::register`].

mod effects;
mod numeric;
mod sys;

use rustc_hash::FxHashMap;

use fathom_ir::Ir;

use crate::call::CallId;
use crate::dfa::Dfa;
use crate::error::DfaError;
use crate::value::ValueId;

pub use numeric::{ARITHMETIC, COMPARISONS};

pub const EFFECT_DEFAULT: &str = "effect.default";
pub const EFFECT_REPLACE: &str = "effect.replace";
pub const EFFECT_ABORTABLE: &str = "effect.abortable";
pub const EFFECT_ABORT: &str = "effect.abort";
pub const EFFECT_IS_INSTALLED: &str = "effect.is_installed";

/// Semantics of one intrinsic: the result of `call`, or `None` if the call
/// does not return.
pub type IntrinsicFn<I> =
    for<'a, 'ir> fn(&'a mut Dfa<'ir, I>, CallId) -> Result<Option<ValueId>, DfaError>;

pub struct IntrinsicRegistry<I: ?Sized> {
    table: FxHashMap<String, IntrinsicFn<I>>,
}

impl<I: ?Sized> Default for IntrinsicRegistry<I> {
    fn default() -> Self {
        Self {
            table: FxHashMap::default(),
        }
    }
}

impl<I: ?Sized> Clone for IntrinsicRegistry<I> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<I: ?Sized> std::fmt::Debug for IntrinsicRegistry<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("IntrinsicRegistry")
            .field("names", &names)
            .finish()
    }
}

impl<I: ?Sized> IntrinsicRegistry<I> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the semantics of `name`, returning the ones it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        semantics: IntrinsicFn<I>,
    ) -> Option<IntrinsicFn<I>> {
        self.table.insert(name.into(), semantics)
    }

    pub fn get(&self, name: &str) -> Option<IntrinsicFn<I>> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<I: Ir + ?Sized> IntrinsicRegistry<I> {
    /// Numeric operators for every numeric type, effect operations and the
    /// runtime primitives.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        numeric::register(&mut registry);
        effects::register(&mut registry);
        sys::register(&mut registry);
        registry
    }
}

/// Any value of the callee's result clazz.
pub fn any_result<I: Ir + ?Sized>(
    dfa: &mut Dfa<'_, I>,
    call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    let result = dfa.ir().clazz_result_clazz(dfa.call(call).callee());
    dfa.any_value(result).map(Some)
}

/// Semantics of intrinsics that never return.
pub fn no_return<I: Ir + ?Sized>(
    _dfa: &mut Dfa<'_, I>,
    _call: CallId,
) -> Result<Option<ValueId>, DfaError> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use fathom_ir::Program;

    use super::*;

    #[test]
    fn standard_table() {
        let registry = IntrinsicRegistry::<Program>::standard();
        for name in [
            "i32.add",
            "u8.shr",
            "f64.lt",
            "i64.as_f32",
            EFFECT_ABORTABLE,
            EFFECT_IS_INSTALLED,
            "sys.array.get",
            "sys.thread.spawn",
            "debug_level",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert!(!registry.contains("i32.as_i32"));
    }

    #[test]
    fn register_replaces() {
        let mut registry = IntrinsicRegistry::<Program>::new();
        assert!(registry.register("x", any_result::<Program>).is_none());
        assert!(registry.register("x", no_return::<Program>).is_some());
        assert_eq!(registry.len(), 1);
    }
}
