/// A join-semilattice with meet, ordered by `is_subseteq`.
pub trait Lattice {
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;
    fn is_subseteq(&self, other: &Self) -> bool;
}

/// A lattice with a least element, the starting point of every fixpoint.
pub trait HasBottom: Lattice {
    fn bottom() -> Self;
}
