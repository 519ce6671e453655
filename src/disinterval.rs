//! Disjoint unions of intervals.
//!
//! A [`DisInterval`] is a finite union of [`Interval`]s kept in normal form:
//! the pieces are sorted by lower bound and no two of them overlap or are
//! adjacent over the integers. This keeps holes that the plain interval
//! join would fill: `[0, 1] ⊔ [10, 11]` stays `[0, 1] ∪ [10, 11]`.
//!
//! # Normal form
//!
//! [`DisInterval::normalize`] drops empty pieces, sorts by lower bound and
//! merges touching pieces into their hull. An empty result is ⊥.
//!
//! # Size bound
//!
//! Arithmetic lifts interval arithmetic over the cross product of pieces,
//! which can grow quickly. Every constructed value is capped at
//! [`MAX_PIECES`] pieces: while there are too many, the two neighbours
//! with the smallest gap between them are merged. Merging only adds
//! numbers, so the cap loses precision but never soundness.
//!
//! ```
//! use absint_rs::disinterval::DisInterval;
//! use absint_rs::interval::Interval;
//!
//! let d = DisInterval::new(vec![Interval::of(1, 2), Interval::of(2, 4), Interval::of(10, 12)]);
//! assert_eq!(d.pieces(), &[Interval::of(1, 4), Interval::of(10, 12)]);
//! ```

use std::fmt;

use crate::domain::Lattice;
use crate::interval::Interval;
use crate::rational::Rational;
use crate::threshold::RationalThreshold;

/// Maximum number of pieces kept in a [`DisInterval`].
pub const MAX_PIECES: usize = 8;

/// Union of disjoint, non-adjacent intervals, or ⊥.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisInterval {
    Bottom,
    Pieces(Vec<Interval>),
}

impl DisInterval {
    /// Builds the normalized union of `intervals`.
    pub fn new(intervals: Vec<Interval>) -> Self {
        let (mut pieces, is_bottom) = DisInterval::normalize(intervals);
        if is_bottom {
            return DisInterval::Bottom;
        }
        DisInterval::enforce_cap(&mut pieces);
        debug_assert!(DisInterval::is_normalized(&pieces));
        DisInterval::Pieces(pieces)
    }

    pub fn for_interval(interval: Interval) -> Self {
        DisInterval::new(vec![interval])
    }

    /// Normalizes a list of intervals.
    ///
    /// Returns the sorted, merged pieces and whether the union is empty.
    pub fn normalize(intervals: Vec<Interval>) -> (Vec<Interval>, bool) {
        let mut intervals: Vec<Interval> = intervals.into_iter().filter(|i| !i.is_bottom()).collect();
        intervals.sort_by(|a, b| a.lower_bound().cmp(&b.lower_bound()));

        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            if let Some(last) = merged.last_mut() {
                if last.touches(&interval) {
                    *last = last.join(&interval);
                    continue;
                }
            }
            merged.push(interval);
        }

        let is_bottom = merged.is_empty();
        (merged, is_bottom)
    }

    fn is_normalized(pieces: &[Interval]) -> bool {
        !pieces.is_empty()
            && pieces.iter().all(|p| !p.is_bottom())
            && pieces
                .windows(2)
                .all(|w| !w[0].touches(&w[1]) && w[0].lower_bound() < w[1].lower_bound())
    }

    fn enforce_cap(pieces: &mut Vec<Interval>) {
        while pieces.len() > MAX_PIECES {
            let mut best = 0;
            let mut best_gap: Option<Rational> = None;
            for i in 0..pieces.len() - 1 {
                let gap = match (pieces[i].upper_bound(), pieces[i + 1].lower_bound()) {
                    (Some(hi), Some(lo)) => lo.sub(hi).unwrap_or(Rational::plus_infinity()),
                    _ => Rational::plus_infinity(),
                };
                if best_gap.as_ref().map_or(true, |b| gap < *b) {
                    best = i;
                    best_gap = Some(gap);
                }
            }
            let next = pieces.remove(best + 1);
            pieces[best] = pieces[best].join(&next);
        }
    }

    /// The pieces of the union; empty for ⊥.
    pub fn pieces(&self) -> &[Interval] {
        match self {
            DisInterval::Bottom => &[],
            DisInterval::Pieces(pieces) => pieces,
        }
    }

    pub fn len(&self) -> usize {
        self.pieces().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces().is_empty()
    }

    /// Single-interval view, available only when exactly one piece remains.
    pub fn as_interval(&self) -> Option<&Interval> {
        match self.pieces() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Convex hull of all pieces.
    pub fn hull(&self) -> Interval {
        self.pieces().iter().fold(Interval::bottom(), |acc, p| acc.join(p))
    }

    /// Hull of an arbitrary list of intervals, ⊤ for an empty list.
    pub fn join_all(intervals: &[Interval]) -> Interval {
        if intervals.is_empty() {
            return Interval::top();
        }
        intervals.iter().fold(Interval::bottom(), |acc, i| acc.join(i))
    }

    pub fn contains(&self, value: &Rational) -> bool {
        self.pieces().iter().any(|p| p.contains(value))
    }

    fn lift(&self, other: &DisInterval, op: impl Fn(&Interval, &Interval) -> Interval) -> DisInterval {
        let mut results = Vec::with_capacity(self.len() * other.len());
        for a in self.pieces() {
            for b in other.pieces() {
                results.push(op(a, b));
            }
        }
        DisInterval::new(results)
    }

    pub fn add(&self, other: &DisInterval) -> DisInterval {
        self.lift(other, Interval::add)
    }

    pub fn sub(&self, other: &DisInterval) -> DisInterval {
        self.lift(other, Interval::sub)
    }

    pub fn mul(&self, other: &DisInterval) -> DisInterval {
        self.lift(other, Interval::mul)
    }

    pub fn div(&self, other: &DisInterval) -> DisInterval {
        self.lift(other, Interval::div)
    }

    pub fn neg(&self) -> DisInterval {
        DisInterval::new(self.pieces().iter().map(Interval::neg).collect())
    }

    /// Widening: stable values are kept, otherwise the convex hulls are widened.
    pub fn widen_with(&self, other: &DisInterval, thresholds: &RationalThreshold) -> DisInterval {
        if other.le(self) {
            return self.clone();
        }
        if self.is_bottom() {
            return other.clone();
        }
        let widened = self.hull().widen_with(&self.join(other).hull(), thresholds);
        DisInterval::for_interval(widened)
    }
}

impl From<Interval> for DisInterval {
    fn from(interval: Interval) -> Self {
        DisInterval::for_interval(interval)
    }
}

impl Lattice for DisInterval {
    fn bottom() -> Self {
        DisInterval::Bottom
    }

    fn top() -> Self {
        DisInterval::Pieces(vec![Interval::top()])
    }

    fn is_bottom(&self) -> bool {
        matches!(self, DisInterval::Bottom)
    }

    fn is_top(&self) -> bool {
        self.as_interval().map_or(false, Interval::is_top)
    }

    fn le(&self, other: &Self) -> bool {
        self.pieces()
            .iter()
            .all(|p| other.pieces().iter().any(|q| p.le(q)))
    }

    fn join(&self, other: &Self) -> Self {
        let mut all = self.pieces().to_vec();
        all.extend_from_slice(other.pieces());
        DisInterval::new(all)
    }

    fn meet(&self, other: &Self) -> Self {
        self.lift(other, Interval::meet)
    }

    fn widen(&self, other: &Self) -> Self {
        self.widen_with(other, &RationalThreshold::default())
    }
}

impl fmt::Display for DisInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisInterval::Bottom => write!(f, "⊥"),
            DisInterval::Pieces(pieces) => {
                for (i, p) in pieces.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ∪ ")?;
                    }
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(ranges: &[(i64, i64)]) -> DisInterval {
        DisInterval::new(ranges.iter().map(|&(lo, hi)| Interval::of(lo, hi)).collect())
    }

    #[test]
    fn test_normalize_merges_touching() {
        let (pieces, is_bottom) = DisInterval::normalize(vec![Interval::of(1, 2), Interval::of(2, 4)]);
        assert!(!is_bottom);
        assert_eq!(pieces, vec![Interval::of(1, 4)]);

        let (pieces, _) = DisInterval::normalize(vec![Interval::of(1, 4), Interval::of(1, 2)]);
        assert_eq!(pieces, vec![Interval::of(1, 4)]);

        let (pieces, _) = DisInterval::normalize(vec![Interval::of(5, 6), Interval::of(1, 2), Interval::of(3, 3)]);
        assert_eq!(pieces, vec![Interval::of(1, 3), Interval::of(5, 6)]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(DisInterval::normalize(vec![]).1);
        assert!(DisInterval::normalize(vec![Interval::bottom(), Interval::bottom()]).1);
        assert!(DisInterval::new(vec![]).is_bottom());
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = vec![
            vec![Interval::of(7, 9), Interval::of(1, 2), Interval::of(2, 4), Interval::bottom()],
            vec![Interval::top(), Interval::of(0, 1)],
            vec![Interval::of(0, 0), Interval::of(2, 2), Interval::of(4, 4)],
        ];
        for input in inputs {
            let (once, _) = DisInterval::normalize(input);
            let (twice, _) = DisInterval::normalize(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_join_keeps_holes() {
        let a = d(&[(0, 1)]);
        let b = d(&[(10, 11)]);
        let joined = a.join(&b);
        assert_eq!(joined.len(), 2);
        assert!(!joined.contains(&Rational::from(5)));
        assert_eq!(joined.hull(), Interval::of(0, 11));
        assert_eq!(joined.as_interval(), None);
    }

    #[test]
    fn test_meet() {
        let a = d(&[(0, 5), (10, 15)]);
        let b = d(&[(3, 12)]);
        assert_eq!(a.meet(&b), d(&[(3, 5), (10, 12)]));
        assert!(d(&[(0, 1)]).meet(&d(&[(5, 6)])).is_bottom());
    }

    #[test]
    fn test_le() {
        let a = d(&[(0, 1), (10, 11)]);
        assert!(d(&[(0, 0)]).le(&a));
        assert!(!d(&[(0, 5)]).le(&a));
        assert!(a.le(&d(&[(0, 11)])));
    }

    #[test]
    fn test_arithmetic() {
        let a = d(&[(0, 1), (10, 11)]);
        let b = d(&[(100, 100)]);
        assert_eq!(a.add(&b), d(&[(100, 101), (110, 111)]));
        assert_eq!(a.sub(&b), d(&[(-100, -99), (-90, -89)]));
        assert_eq!(a.mul(&d(&[(2, 2)])), d(&[(0, 2), (20, 22)]));
        assert_eq!(a.neg(), d(&[(-11, -10), (-1, 0)]));
        assert!(a.div(&d(&[(-1, 1)])).is_top());
        assert!(DisInterval::bottom().add(&a).is_bottom());
    }

    #[test]
    fn test_piece_cap() {
        let many: Vec<Interval> = (0..20).map(|i| Interval::for_value(i * 10)).collect();
        let big = DisInterval::new(many);
        assert_eq!(big.len(), MAX_PIECES);
        for i in 0..20 {
            assert!(big.contains(&Rational::from(i * 10)));
        }
    }

    #[test]
    fn test_as_interval() {
        assert_eq!(d(&[(1, 3)]).as_interval(), Some(&Interval::of(1, 3)));
        assert_eq!(DisInterval::bottom().as_interval(), None);
        assert!(DisInterval::top().as_interval().unwrap().is_top());
    }

    #[test]
    fn test_join_all() {
        assert!(DisInterval::join_all(&[]).is_top());
        assert_eq!(
            DisInterval::join_all(&[Interval::of(0, 1), Interval::of(10, 11)]),
            Interval::of(0, 11)
        );
    }

    #[test]
    fn test_widen() {
        let a = d(&[(0, 1), (10, 11)]);
        assert_eq!(a.widen(&d(&[(0, 0)])), a);
        let widened = a.widen(&d(&[(0, 12)]));
        assert!(a.le(&widened));
        assert_eq!(widened.as_interval(), Some(&Interval::of(0, i64::from(i32::MAX))));
    }

    #[test]
    fn test_disinterval_lattice_axioms() {
        use crate::domain::tests::test_lattice_axioms;

        let samples = vec![
            DisInterval::bottom(),
            DisInterval::top(),
            d(&[(0, 0)]),
            d(&[(0, 1), (10, 11)]),
            d(&[(-5, 5)]),
            d(&[(3, 12)]),
            DisInterval::for_interval(Interval::non_negative()),
        ];
        test_lattice_axioms(&samples);
    }
}
