//! Assertion helpers for lattice laws.
//!
//! Every helper checks all combinations of the given samples and panics once
//! with the full list of violations.
//!
//! ```
//! use fathom_test_utils::lattice::assert_join_laws_with;
//!
//! // max is a join over integers with 0 as bottom
//! assert_join_laws_with(&[0u8, 3, 7], |a, b| a.max(b), Some(0));
//! ```

use std::fmt::{Debug, Write};

use fathom_ir::{HasBottom, Lattice};

fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} lattice law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Join of a [`Lattice`] is commutative, associative and idempotent, and
/// `is_subseteq` agrees with it.
pub fn assert_join_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_join(elements, |a, b| a.join(b), &mut violations);
    for a in elements {
        for b in elements {
            let sub = a.is_subseteq(b);
            if sub != (a.join(b) == *b) {
                violations.push(format!(
                    "ordering inconsistent with join: {a:?}.is_subseteq({b:?}) = {sub}"
                ));
            }
        }
    }
    report(violations);
}

/// Join laws plus the laws of bottom: below everything and neutral for join.
pub fn assert_semilattice_laws<L: HasBottom + PartialEq + Debug>(elements: &[L]) {
    assert_join_laws(elements);
    let mut violations = Vec::new();
    let bot = L::bottom();
    for x in elements {
        if !bot.is_subseteq(x) {
            violations.push(format!("bottom not below {x:?}"));
        }
        if bot.join(x) != *x {
            violations.push(format!("bottom().join({x:?}) != {x:?}"));
        }
    }
    report(violations);
}

/// Join laws for a join given as a function, e.g. for values living in a
/// table. With `bottom`, also checks that it is neutral.
pub fn assert_join_laws_with<T: Clone + PartialEq + Debug>(
    elements: &[T],
    mut join: impl FnMut(T, T) -> T,
    bottom: Option<T>,
) {
    let mut violations = Vec::new();
    check_join(elements, |a, b| join(a.clone(), b.clone()), &mut violations);
    if let Some(bot) = bottom {
        for x in elements {
            let joined = join(x.clone(), bot.clone());
            if joined != *x {
                violations.push(format!("{x:?} join bottom = {joined:?}, expected {x:?}"));
            }
            let joined = join(bot.clone(), x.clone());
            if joined != *x {
                violations.push(format!("bottom join {x:?} = {joined:?}, expected {x:?}"));
            }
        }
    }
    report(violations);
}

fn check_join<T: PartialEq + Debug>(
    elements: &[T],
    mut join: impl FnMut(&T, &T) -> T,
    v: &mut Vec<String>,
) {
    for a in elements {
        let aa = join(a, a);
        if aa != *a {
            v.push(format!("join not idempotent: {a:?} join {a:?} = {aa:?}"));
        }
        for b in elements {
            let ab = join(a, b);
            let ba = join(b, a);
            if ab != ba {
                v.push(format!(
                    "join not commutative: {a:?} join {b:?} = {ab:?}, reversed {ba:?}"
                ));
            }
            for c in elements {
                let left = join(&ab, c);
                let bc = join(b, c);
                let right = join(a, &bc);
                if left != right {
                    v.push(format!(
                        "join not associative for {a:?}, {b:?}, {c:?}: {left:?} != {right:?}"
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_is_a_join() {
        assert_join_laws_with(&[0u32, 1, 5, 9], |a, b| a.max(b), Some(0));
    }

    #[test]
    #[should_panic(expected = "not commutative")]
    fn subtraction_is_not() {
        assert_join_laws_with(&[1i32, 2], |a, b| a - b, None);
    }
}
