use std::collections::BTreeMap;

use fathom_ir::{Arena, Clazz, InternTable, Site};
use rustc_hash::FxHashMap;

use super::{Components, Value, ValueId};
use crate::context::Context;
use crate::env::EnvId;
use crate::error::DfaError;

/// Mutable state attached to a hash-consed value.
#[derive(Clone, Debug)]
struct Slot {
    fields: BTreeMap<Clazz, ValueId>,
    elements: ValueId,
    context: Context,
}

/// Components of a set that collapse into one value when joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MergeKey {
    Numeric(Clazz),
    Tagged(Clazz, u32),
    Distinct(ValueId),
}

/// Canonical table of abstract values.
#[derive(Clone, Debug)]
pub struct ValueTable {
    values: InternTable<Value, ValueId>,
    slots: Arena<ValueId, Slot>,
    joins: FxHashMap<(ValueId, ValueId), ValueId>,
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTable {
    pub fn new() -> Self {
        let mut table = Self {
            values: InternTable::new(),
            slots: Arena::default(),
            joins: FxHashMap::default(),
        };
        let unit = table.intern(Value::Unit, Context::EntryPoint);
        let undefined = table.intern(Value::Undefined, Context::EntryPoint);
        debug_assert_eq!((unit, undefined), (ValueId::UNIT, ValueId::UNDEFINED));
        table
    }

    fn intern(&mut self, value: Value, context: Context) -> ValueId {
        let (id, fresh) = self.values.insert(value);
        if fresh {
            self.slots.alloc(Slot {
                fields: BTreeMap::new(),
                elements: ValueId::UNDEFINED,
                context,
            });
        }
        id
    }

    /// Number of distinct values created so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, id: ValueId) -> &Value {
        &self.values[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.slots.ids().map(|id| (id, &self.values[id]))
    }

    /// Context that first created `id`.
    pub fn context(&self, id: ValueId) -> Context {
        self.slots[id].context
    }

    pub fn numeric(&mut self, clazz: Clazz, bits: Option<i64>) -> ValueId {
        self.intern(Value::Numeric { clazz, bits }, Context::EntryPoint)
    }

    pub fn instance(
        &mut self,
        clazz: Clazz,
        site: Option<Site>,
        env: Option<EnvId>,
        context: Context,
    ) -> ValueId {
        self.intern(Value::Instance { clazz, site, env }, context)
    }

    pub fn tagged(&mut self, clazz: Clazz, tag: u32, original: ValueId) -> ValueId {
        let context = self.context(original);
        self.intern(
            Value::Tagged {
                clazz,
                tag,
                original,
            },
            context,
        )
    }

    pub fn reference(&mut self, clazz: Clazz, original: ValueId) -> ValueId {
        let context = self.context(original);
        self.intern(Value::Ref { clazz, original }, context)
    }

    pub fn sys_array(&mut self, element: Clazz, origin: Option<Site>, context: Context) -> ValueId {
        self.intern(Value::SysArray { element, origin }, context)
    }

    /// The values a set stands for; any other value stands for itself.
    pub fn components(&self, id: ValueId) -> Components {
        match self.get(id) {
            Value::Set(components) => components.clone(),
            _ => std::iter::once(id).collect(),
        }
    }

    /// Least upper bound of `a` and `b`.
    pub fn join(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, DfaError> {
        if a == b || b == ValueId::UNDEFINED {
            return Ok(a);
        }
        if a == ValueId::UNDEFINED {
            return Ok(b);
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&joined) = self.joins.get(&key) {
            return Ok(joined);
        }
        let mut parts = self.components(a);
        parts.extend(self.components(b));
        let joined = self.merge(parts)?;
        self.joins.insert(key, joined);
        Ok(joined)
    }

    pub fn join_all(
        &mut self,
        values: impl IntoIterator<Item = ValueId>,
    ) -> Result<ValueId, DfaError> {
        values
            .into_iter()
            .try_fold(ValueId::UNDEFINED, |acc, v| self.join(acc, v))
    }

    /// `a ⊑ b`, i.e. joining `a` into `b` adds nothing.
    pub fn is_subseteq(&mut self, a: ValueId, b: ValueId) -> Result<bool, DfaError> {
        Ok(self.join(a, b)? == b)
    }

    fn merge(&mut self, parts: Components) -> Result<ValueId, DfaError> {
        let mut merged: BTreeMap<MergeKey, ValueId> = BTreeMap::new();
        let mut choice: Option<Clazz> = None;
        for v in parts {
            let key = match self.get(v) {
                Value::Undefined => continue,
                Value::Numeric { clazz, .. } => MergeKey::Numeric(*clazz),
                Value::Tagged { clazz, tag, .. } => {
                    match choice {
                        Some(seen) if seen != *clazz => {
                            return Err(DfaError::TaggedClazzMismatch {
                                left: seen,
                                right: *clazz,
                            });
                        }
                        _ => choice = Some(*clazz),
                    }
                    MergeKey::Tagged(*clazz, *tag)
                }
                _ => MergeKey::Distinct(v),
            };
            let value = match merged.get(&key) {
                Some(&prev) => self.merge_pair(prev, v)?,
                None => v,
            };
            merged.insert(key, value);
        }
        let mut components: Components = merged.into_values().collect();
        components.sort_unstable();
        components.dedup();
        Ok(match components.len() {
            0 => ValueId::UNDEFINED,
            1 => components[0],
            _ => self.intern(Value::Set(components), Context::EntryPoint),
        })
    }

    /// Join two values sharing a merge key.
    fn merge_pair(&mut self, a: ValueId, b: ValueId) -> Result<ValueId, DfaError> {
        if a == b {
            return Ok(a);
        }
        match (self.get(a).clone(), self.get(b).clone()) {
            (Value::Numeric { clazz, .. }, Value::Numeric { .. }) => Ok(self.numeric(clazz, None)),
            (
                Value::Tagged {
                    clazz,
                    tag,
                    original: left,
                },
                Value::Tagged {
                    original: right, ..
                },
            ) => {
                let original = self.join(left, right)?;
                Ok(self.tagged(clazz, tag, original))
            }
            _ => Ok(a),
        }
    }

    /// Wrap `value` into reference clazz `ref_clazz`.
    ///
    /// Boxing unit creates an instance of `ref_clazz` so that it has an
    /// identity to dispatch on.
    pub fn box_value(
        &mut self,
        value: ValueId,
        ref_clazz: Clazz,
        env: Option<EnvId>,
        context: Context,
    ) -> Result<ValueId, DfaError> {
        match self.get(value) {
            Value::Undefined | Value::Ref { .. } => Ok(value),
            Value::Unit => Ok(self.instance(ref_clazz, None, env, context)),
            Value::Set(components) => {
                let components = components.clone();
                let mut boxed = ValueId::UNDEFINED;
                for c in components {
                    let b = self.box_value(c, ref_clazz, env, context)?;
                    boxed = self.join(boxed, b)?;
                }
                Ok(boxed)
            }
            _ => Ok(self.reference(ref_clazz, value)),
        }
    }

    /// Inverse of [`box_value`](Self::box_value) for references, identity for
    /// everything else.
    pub fn unbox(&mut self, value: ValueId) -> Result<ValueId, DfaError> {
        match self.get(value) {
            Value::Ref { original, .. } => Ok(*original),
            Value::Set(components) => {
                let components = components.clone();
                let mut unboxed = ValueId::UNDEFINED;
                for c in components {
                    let u = self.unbox(c)?;
                    unboxed = self.join(unboxed, u)?;
                }
                Ok(unboxed)
            }
            _ => Ok(value),
        }
    }

    pub fn fields(&self, id: ValueId) -> &BTreeMap<Clazz, ValueId> {
        &self.slots[id].fields
    }

    pub fn field(&self, id: ValueId, field: Clazz) -> Option<ValueId> {
        self.slots[id].fields.get(&field).copied()
    }

    /// Join `value` into `field` of `id`, returning whether it grew.
    pub(crate) fn join_field(
        &mut self,
        id: ValueId,
        field: Clazz,
        value: ValueId,
    ) -> Result<bool, DfaError> {
        let old = self.field(id, field).unwrap_or(ValueId::UNDEFINED);
        let new = self.join(old, value)?;
        if new == old {
            return Ok(false);
        }
        self.slots[id].fields.insert(field, new);
        Ok(true)
    }

    /// The joined element slot of a sys array.
    pub fn elements(&self, array: ValueId) -> ValueId {
        self.slots[array].elements
    }

    pub(crate) fn join_elements(&mut self, array: ValueId, value: ValueId) -> Result<bool, DfaError> {
        let old = self.elements(array);
        let new = self.join(old, value)?;
        if new == old {
            return Ok(false);
        }
        self.slots[array].elements = new;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use fathom_ir::arena::Id;

    use super::*;

    fn clazz(raw: usize) -> Clazz {
        Clazz::from(Id::from_raw(raw))
    }

    #[test]
    fn unit_and_undefined_are_reserved() {
        let table = ValueTable::new();
        assert_eq!(table.get(ValueId::UNIT), &Value::Unit);
        assert_eq!(table.get(ValueId::UNDEFINED), &Value::Undefined);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn equal_numerics_are_identical() {
        let mut table = ValueTable::new();
        let five = table.numeric(clazz(1), Some(5));
        assert_eq!(table.numeric(clazz(1), Some(5)), five);
        assert_eq!(table.join(five, five).unwrap(), five);
    }

    #[test]
    fn differing_numerics_widen() {
        let mut table = ValueTable::new();
        let five = table.numeric(clazz(1), Some(5));
        let seven = table.numeric(clazz(1), Some(7));
        let any = table.numeric(clazz(1), None);
        assert_eq!(table.join(five, seven).unwrap(), any);
        assert_eq!(table.join(any, seven).unwrap(), any);
    }

    #[test]
    fn tagged_merge_by_tag() {
        let mut table = ValueTable::new();
        let choice = clazz(3);
        let a = table.numeric(clazz(1), Some(1));
        let b = table.numeric(clazz(1), Some(2));
        let t0a = table.tagged(choice, 0, a);
        let t0b = table.tagged(choice, 0, b);
        let t1 = table.tagged(choice, 1, ValueId::UNIT);

        let set = table.join(t0a, t1).unwrap();
        assert!(table.get(set).is_set());
        let widened = table.join(set, t0b).unwrap();
        let any = table.numeric(clazz(1), None);
        let t0any = table.tagged(choice, 0, any);
        let expected = table.join(t0any, t1).unwrap();
        assert_eq!(widened, expected);
        assert_eq!(table.components(widened).len(), 2);
    }

    #[test]
    fn tagged_clazz_mismatch_is_fatal() {
        let mut table = ValueTable::new();
        let a = table.tagged(clazz(3), 0, ValueId::UNIT);
        let b = table.tagged(clazz(4), 0, ValueId::UNIT);
        assert!(matches!(
            table.join(a, b),
            Err(DfaError::TaggedClazzMismatch { .. })
        ));
    }

    #[test]
    fn field_writes_only_grow() {
        let mut table = ValueTable::new();
        let inst = table.instance(clazz(5), None, None, Context::EntryPoint);
        let f = clazz(6);
        let three = table.numeric(clazz(1), Some(3));
        let four = table.numeric(clazz(1), Some(4));
        assert!(table.join_field(inst, f, three).unwrap());
        assert!(!table.join_field(inst, f, three).unwrap());
        assert!(table.join_field(inst, f, four).unwrap());
        assert_eq!(table.field(inst, f), Some(table.numeric(clazz(1), None)));
        assert!(!table.join_field(inst, clazz(7), ValueId::UNDEFINED).unwrap());
        assert_eq!(table.field(inst, clazz(7)), None);
    }

    #[test]
    fn boxing_unit_creates_instance() {
        let mut table = ValueTable::new();
        let rc = clazz(8);
        let boxed = table
            .box_value(ValueId::UNIT, rc, None, Context::EntryPoint)
            .unwrap();
        assert!(matches!(table.get(boxed), Value::Instance { clazz, .. } if *clazz == rc));
    }
}
