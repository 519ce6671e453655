//! Flat lattice lifting of an arbitrary equality-comparable type.
//!
//! ```text
//!            ⊤ (Top)
//!        /   |   \
//!   ... Normal(x) ...
//!        \   |   /
//!            ⊥ (Bottom)
//! ```
//!
//! Two distinct `Normal` values are incomparable. Combining them has no
//! *trivial* answer: [`FlatDomain::try_trivial_join`] and
//! [`FlatDomain::try_trivial_meet`] report that with `None`, leaving the
//! caller free to apply a domain-specific combinator. The plain lattice
//! operations fall back to `Top` (join) and `Bottom` (meet).

use std::fmt;

use crate::domain::Lattice;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlatDomain<T> {
    Bottom,
    Normal(T),
    Top,
}

impl<T> FlatDomain<T> {
    pub fn is_normal(&self) -> bool {
        matches!(self, FlatDomain::Normal(_))
    }

    pub fn as_normal(&self) -> Option<&T> {
        match self {
            FlatDomain::Normal(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> FlatDomain<U> {
        match self {
            FlatDomain::Bottom => FlatDomain::Bottom,
            FlatDomain::Normal(value) => FlatDomain::Normal(f(value)),
            FlatDomain::Top => FlatDomain::Top,
        }
    }
}

impl<T: Clone + PartialEq> FlatDomain<T> {
    /// Join when it is determined by the lattice shape alone.
    pub fn try_trivial_join(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (FlatDomain::Top, _) | (_, FlatDomain::Top) => Some(FlatDomain::Top),
            (FlatDomain::Bottom, _) => Some(other.clone()),
            (_, FlatDomain::Bottom) => Some(self.clone()),
            (FlatDomain::Normal(a), FlatDomain::Normal(b)) if a == b => Some(self.clone()),
            _ => None,
        }
    }

    /// Meet when it is determined by the lattice shape alone.
    pub fn try_trivial_meet(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (FlatDomain::Bottom, _) | (_, FlatDomain::Bottom) => Some(FlatDomain::Bottom),
            (FlatDomain::Top, _) => Some(other.clone()),
            (_, FlatDomain::Top) => Some(self.clone()),
            (FlatDomain::Normal(a), FlatDomain::Normal(b)) if a == b => Some(self.clone()),
            _ => None,
        }
    }
}

impl<T: Clone + PartialEq + fmt::Debug> Lattice for FlatDomain<T> {
    fn bottom() -> Self {
        FlatDomain::Bottom
    }

    fn top() -> Self {
        FlatDomain::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, FlatDomain::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, FlatDomain::Top)
    }

    fn le(&self, other: &Self) -> bool {
        match (self, other) {
            (FlatDomain::Bottom, _) | (_, FlatDomain::Top) => true,
            (FlatDomain::Normal(a), FlatDomain::Normal(b)) => a == b,
            _ => false,
        }
    }

    fn join(&self, other: &Self) -> Self {
        self.try_trivial_join(other).unwrap_or(FlatDomain::Top)
    }

    fn meet(&self, other: &Self) -> Self {
        self.try_trivial_meet(other).unwrap_or(FlatDomain::Bottom)
    }

    /// The lattice has height 3, so join already stabilizes.
    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }
}

impl<T: fmt::Display> fmt::Display for FlatDomain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatDomain::Bottom => write!(f, "⊥"),
            FlatDomain::Normal(value) => write!(f, "{}", value),
            FlatDomain::Top => write!(f, "⊤"),
        }
    }
}
