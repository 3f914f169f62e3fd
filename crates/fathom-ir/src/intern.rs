use rustc_hash::FxHashMap;

use crate::arena::{Id, Identifier};

/// Hash-consing table: structurally equal items share one handle.
#[derive(Clone, Debug)]
pub struct InternTable<T: Clone + Eq + std::hash::Hash, Key: Identifier> {
    items: Vec<T>,
    item_map: FxHashMap<T, Key>,
}

impl<T, K> Default for InternTable<T, K>
where
    T: Clone + Eq + std::hash::Hash,
    K: Identifier,
{
    fn default() -> Self {
        Self {
            items: Vec::new(),
            item_map: FxHashMap::default(),
        }
    }
}

impl<T: Clone + Eq + std::hash::Hash, Key: Identifier> InternTable<T, Key> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, item: T) -> Key {
        self.insert(item).0
    }

    /// Intern `item`, also reporting whether it was new.
    pub fn insert(&mut self, item: T) -> (Key, bool) {
        if let Some(&idx) = self.item_map.get(&item) {
            return (idx, false);
        }
        let idx = Key::from(Id(self.items.len()));
        self.items.push(item.clone());
        self.item_map.insert(item, idx);
        (idx, true)
    }

    pub fn lookup(&self, item: &T) -> Option<Key> {
        self.item_map.get(item).copied()
    }

    pub fn resolve(&self, idx: Key) -> Option<&T> {
        self.items.get(idx.into().raw())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone + Eq + std::hash::Hash, Key: Identifier> std::ops::Index<Key> for InternTable<T, Key> {
    type Output = T;

    fn index(&self, index: Key) -> &Self::Output {
        &self.items[index.into().raw()]
    }
}
