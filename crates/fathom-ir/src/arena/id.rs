use std::hash::Hash;

/// Arena ID
/// an ID object is normally created by
/// `arena.next_id()` or `arena.alloc`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub(crate) usize);

impl Id {
    /// Wrap a raw index. Used for handles that are reserved up front
    /// (e.g. the pre-interned unit value).
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// return raw ID as usize
    pub fn raw(self) -> usize {
        self.0
    }
}

pub trait Identifier:
    Sized + Clone + Copy + Hash + Ord + std::fmt::Debug + PartialEq + Eq + From<Id> + Into<Id>
{
}

/// Declare a typed handle over [`Id`].
///
/// ```
/// fathom_ir::identifier! {
///     /// A handle into some table.
///     struct Node
/// }
/// let node = Node::from(fathom_ir::arena::Id::from_raw(3));
/// assert_eq!(node.raw(), 3);
/// ```
#[macro_export]
macro_rules! identifier {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name($crate::arena::Id);

        impl $name {
            /// return raw ID as usize
            pub fn raw(self) -> usize {
                self.0.raw()
            }
        }

        impl From<$crate::arena::Id> for $name {
            fn from(value: $crate::arena::Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $crate::arena::Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl $crate::arena::Identifier for $name {}
    };
}
