//! Core lattice trait shared by the numeric and symbolic domains.

use std::fmt::Debug;

/// Lattice interface of an abstract value.
///
/// Abstract values here are plain immutable values: every operation returns
/// a fresh element and leaves its inputs untouched.
///
/// # Lattice Properties
///
/// An implementation must satisfy:
/// - Reflexivity: `∀a. a ⊑ a`
/// - Transitivity: `∀a,b,c. a ⊑ b ∧ b ⊑ c ⇒ a ⊑ c`
/// - Antisymmetry: `∀a,b. a ⊑ b ∧ b ⊑ a ⇒ a ≡ b`
/// - `⊥ ⊑ a ⊑ ⊤` for every `a`
pub trait Lattice: Clone + Debug + Sized {
    /// The bottom element (⊥): no concrete value.
    fn bottom() -> Self;

    /// The top element (⊤): every concrete value.
    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// Partial order: `self ⊑ other` (self is at least as precise as other).
    fn le(&self, other: &Self) -> bool;

    /// Join (`⊔`): least upper bound.
    fn join(&self, other: &Self) -> Self;

    /// Meet (`⊓`): greatest lower bound.
    fn meet(&self, other: &Self) -> Self;

    /// Widening (`∇`).
    ///
    /// Must satisfy `self ⊑ self ∇ other` and `other ⊑ self ∇ other`, and every
    /// ascending chain built with it must stabilize.
    fn widen(&self, other: &Self) -> Self;

    /// Narrowing (`∆`). Defaults to meet.
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }

    /// Lattice equivalence: `self ⊑ other ∧ other ⊑ self`.
    fn equivalent(&self, other: &Self) -> bool {
        self.le(other) && other.le(self)
    }

    /// Join of many elements, ⊥ for an empty input.
    fn join_many<I>(elems: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        elems.into_iter().fold(Self::bottom(), |acc, e| acc.join(&e))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Test helper: validate basic lattice axioms
    pub fn test_lattice_axioms<L: Lattice>(samples: &[L]) {
        let top = L::top();
        let bottom = L::bottom();

        assert!(top.is_top(), "Top is not top");
        assert!(bottom.is_bottom(), "Bottom is not bottom");

        for a in samples {
            // Reflexivity: a ⊑ a
            assert!(a.le(a), "Reflexivity failed for {:?}", a);

            // Bounds: ⊥ ⊑ a ⊑ ⊤
            assert!(bottom.le(a), "Bottom is not below {:?}", a);
            assert!(a.le(&top), "{:?} is not below top", a);

            // a ⊔ ⊤ = ⊤, a ⊔ ⊥ = a
            assert!(a.join(&top).is_top(), "Join with top failed for {:?}", a);
            assert!(a.equivalent(&a.join(&bottom)), "Join with bottom failed for {:?}", a);

            // a ⊓ ⊤ = a, a ⊓ ⊥ = ⊥
            assert!(a.equivalent(&a.meet(&top)), "Meet with top failed for {:?}", a);
            assert!(a.meet(&bottom).is_bottom(), "Meet with bottom failed for {:?}", a);

            for b in samples {
                // Widening is an upper bound of both arguments
                let widened = a.widen(b);
                assert!(a.le(&widened), "Widening does not preserve order: {:?} ∇ {:?}", a, b);
                assert!(b.le(&widened), "Widening does not cover {:?} ∇ {:?}", a, b);
            }
        }

        for a in samples {
            for b in samples {
                // Commutativity: a ⊔ b = b ⊔ a
                assert!(a.join(b).equivalent(&b.join(a)), "Join commutativity failed");

                // Commutativity: a ⊓ b = b ⊓ a
                assert!(a.meet(b).equivalent(&b.meet(a)), "Meet commutativity failed");

                // Join upper bound: a ⊑ (a ⊔ b)
                let joined = a.join(b);
                assert!(a.le(&joined), "Join is not upper bound for a");
                assert!(b.le(&joined), "Join is not upper bound for b");

                // Meet lower bound: (a ⊓ b) ⊑ a
                let met = a.meet(b);
                assert!(met.le(a), "Meet is not lower bound of a");
                assert!(met.le(b), "Meet is not lower bound of b");
            }
        }
    }
}
