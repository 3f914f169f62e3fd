//! The abstract value domain.
//!
//! Values are hash-consed into a [`ValueTable`]: two structurally equal
//! values share one [`ValueId`], so handle equality is the "no new
//! information" test the fixpoint relies on. Only two parts of a value are
//! mutable after creation, the field map of an [`Value::Instance`] and the
//! element slot of a [`Value::SysArray`]; both only ever grow by join.

mod render;
mod table;

pub use table::ValueTable;

use fathom_ir::arena::Id;
use fathom_ir::{Clazz, Site, identifier};
use smallvec::SmallVec;

use crate::env::EnvId;

identifier! {
    /// Handle to a hash-consed abstract value.
    struct ValueId
}

impl ValueId {
    pub const UNIT: ValueId = ValueId(Id::from_raw(0));
    pub const UNDEFINED: ValueId = ValueId(Id::from_raw(1));
}

/// Components of a [`Value::Set`], kept sorted and free of duplicates.
pub type Components = SmallVec<[ValueId; 4]>;

/// Structural identity of an abstract value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// The single value of unit-like types.
    Unit,
    /// No value yet: the bottom of the lattice.
    Undefined,
    /// A numeric value; `bits: None` stands for any value of `clazz`.
    Numeric { clazz: Clazz, bits: Option<i64> },
    /// A value-type object created at `site` in environment `env`.
    Instance {
        clazz: Clazz,
        site: Option<Site>,
        env: Option<EnvId>,
    },
    /// One arm of the choice `clazz`.
    Tagged {
        clazz: Clazz,
        tag: u32,
        original: ValueId,
    },
    /// A boxed value of reference clazz `clazz`.
    Ref { clazz: Clazz, original: ValueId },
    /// A raw array; all elements share one joined slot.
    SysArray {
        element: Clazz,
        origin: Option<Site>,
    },
    /// Join of two or more values that could not be merged.
    Set(Components),
}

impl Value {
    /// Clazz used to select implementations when the value is an access
    /// target.
    pub fn clazz(&self) -> Option<Clazz> {
        match self {
            Value::Numeric { clazz, .. }
            | Value::Instance { clazz, .. }
            | Value::Tagged { clazz, .. }
            | Value::Ref { clazz, .. } => Some(*clazz),
            Value::Unit | Value::Undefined | Value::SysArray { .. } | Value::Set(_) => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Value::Set(_))
    }
}
