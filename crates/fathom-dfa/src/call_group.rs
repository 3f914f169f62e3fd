use std::collections::BTreeSet;

use fathom_ir::{Arena, Clazz, HasBottom, InternTable, Ir, Lattice, Site, identifier};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;

use crate::dfa::Dfa;
use crate::intrinsics::EFFECT_ABORTABLE;
use crate::value::ValueId;

identifier! {
    /// Handle to a call group.
    struct CallGroupId
}

/// All calls of one callee on one target from one site, regardless of
/// arguments and environment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallGroupKey {
    pub callee: Clazz,
    pub target: ValueId,
    pub site: Option<Site>,
}

/// A set of effect types, ordered by inclusion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectSet(BTreeSet<Clazz>);

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, effect: Clazz) -> bool {
        self.0.insert(effect)
    }

    pub fn contains(&self, effect: Clazz) -> bool {
        self.0.contains(&effect)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Clazz> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Clazz> for EffectSet {
    fn from_iter<T: IntoIterator<Item = Clazz>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Lattice for EffectSet {
    fn join(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }

    fn meet(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl HasBottom for EffectSet {
    fn bottom() -> Self {
        Self::default()
    }
}

/// Call groups and the caller → callee graph between them.
#[derive(Clone, Debug, Default)]
pub struct CallGroups {
    keys: InternTable<CallGroupKey, CallGroupId>,
    effects: Arena<CallGroupId, EffectSet>,
    graph: DiGraphMap<CallGroupId, ()>,
}

impl CallGroups {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, id: CallGroupId) -> &CallGroupKey {
        &self.keys[id]
    }

    /// Effect types the group's code needs, directly or through callees.
    pub fn used_effects(&self, id: CallGroupId) -> &EffectSet {
        &self.effects[id]
    }

    pub fn callers(&self, id: CallGroupId) -> impl Iterator<Item = CallGroupId> + '_ {
        self.graph.neighbors_directed(id, Direction::Incoming)
    }

    pub fn callees(&self, id: CallGroupId) -> impl Iterator<Item = CallGroupId> + '_ {
        self.graph.neighbors_directed(id, Direction::Outgoing)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CallGroupId, &CallGroupKey)> {
        self.effects.ids().map(|id| (id, &self.keys[id]))
    }
}

impl<'ir, I: Ir + ?Sized> Dfa<'ir, I> {
    pub fn call_groups(&self) -> &CallGroups {
        &self.groups
    }

    pub(crate) fn call_group(
        &mut self,
        callee: Clazz,
        target: ValueId,
        site: Option<Site>,
    ) -> CallGroupId {
        let (id, fresh) = self.groups.keys.insert(CallGroupKey {
            callee,
            target,
            site,
        });
        if fresh {
            self.groups.effects.alloc(EffectSet::new());
            self.groups.graph.add_node(id);
        }
        id
    }

    pub(crate) fn add_call_edge(&mut self, from: CallGroupId, to: CallGroupId) {
        if self.groups.graph.contains_edge(from, to) {
            return;
        }
        self.groups.graph.add_edge(from, to, ());
        let inherited: Vec<Clazz> = self.groups.effects[to].iter().collect();
        for effect in inherited {
            self.needs_effect(from, effect);
        }
    }

    /// Record that `group` needs `effect`, and so do its callers up to the
    /// call that installs it.
    pub(crate) fn needs_effect(&mut self, group: CallGroupId, effect: Clazz) {
        let mut work = vec![group];
        while let Some(g) = work.pop() {
            if self.installs(g, effect) || !self.groups.effects[g].insert(effect) {
                continue;
            }
            self.was_changed(|dfa| {
                format!(
                    "{} needs effect {}",
                    dfa.ir().clazz_name(dfa.groups.keys[g].callee),
                    dfa.ir().clazz_name(effect)
                )
            });
            work.extend(self.groups.callers(g));
        }
    }

    fn installs(&self, group: CallGroupId, effect: Clazz) -> bool {
        let ir = self.ir();
        let callee = self.groups.keys[group].callee;
        ir.intrinsic_name(callee) == Some(EFFECT_ABORTABLE) && ir.effect_type(callee) == Some(effect)
    }
}

#[cfg(test)]
mod tests {
    use fathom_ir::arena::Id;

    use super::*;

    fn set(raw: &[usize]) -> EffectSet {
        raw.iter().map(|&r| Clazz::from(Id::from_raw(r))).collect()
    }

    #[test]
    fn effect_set_order() {
        assert!(set(&[1]).is_subseteq(&set(&[1, 2])));
        assert!(!set(&[3]).is_subseteq(&set(&[1, 2])));
        assert_eq!(set(&[1]).join(&set(&[2])), set(&[1, 2]));
        assert_eq!(set(&[1, 2]).meet(&set(&[2, 3])), set(&[2]));
        assert_eq!(EffectSet::bottom(), set(&[]));
    }
}
