//! Interval abstract domain over [`Rational`] bounds.
//!
//! An interval `[lo, hi]` over-approximates a set of numbers by its convex
//! hull. The join of two intervals is their hull, so the domain cannot
//! represent holes: `[0, 1] ⊔ [10, 11] = [0, 11]`. See
//! [`DisInterval`][crate::disinterval::DisInterval] for unions of ranges.
//!
//! # Elements
//!
//! - ⊥ (Bottom): the empty set
//! - `[lo, hi]` with `lo ≤ hi`, `lo ≠ +∞`, `hi ≠ −∞`
//! - ⊤ (Top): `[−∞, +∞]`
//!
//! Arithmetic is strict in ⊥. Whenever a bound computation has no exact
//! answer (an [`ArithmeticError`]), the result is ⊤.

use std::cmp::{max, min};
use std::fmt;
use std::sync::OnceLock;

use crate::domain::Lattice;
use crate::error::ArithmeticError;
use crate::rational::Rational;
use crate::threshold::RationalThreshold;

/// Interval: ⊥ or `[lo, hi]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Interval {
    Bottom,
    Range(Rational, Rational),
}

fn default_thresholds() -> &'static RationalThreshold {
    static THRESHOLDS: OnceLock<RationalThreshold> = OnceLock::new();
    THRESHOLDS.get_or_init(RationalThreshold::default)
}

impl Interval {
    /// Creates `[lo, hi]`, or ⊥ if the range contains no number.
    pub fn new(lo: Rational, hi: Rational) -> Self {
        if lo > hi || lo.is_plus_infinity() || hi.is_minus_infinity() {
            Interval::Bottom
        } else {
            Interval::Range(lo, hi)
        }
    }

    pub fn of(lo: i64, hi: i64) -> Self {
        Interval::new(Rational::from(lo), Rational::from(hi))
    }

    /// Singleton `[v, v]`.
    pub fn for_value(v: impl Into<Rational>) -> Self {
        let v = v.into();
        Interval::new(v.clone(), v)
    }

    /// `[1, +∞]`.
    pub fn positive() -> Self {
        Interval::new(Rational::one(), Rational::plus_infinity())
    }

    /// `[0, +∞]`.
    pub fn non_negative() -> Self {
        Interval::new(Rational::zero(), Rational::plus_infinity())
    }

    /// `[0, 1]`, the range of a boolean.
    pub fn boolean() -> Self {
        Interval::of(0, 1)
    }

    pub fn lower_bound(&self) -> Option<&Rational> {
        match self {
            Interval::Range(lo, _) => Some(lo),
            Interval::Bottom => None,
        }
    }

    pub fn upper_bound(&self) -> Option<&Rational> {
        match self {
            Interval::Range(_, hi) => Some(hi),
            Interval::Bottom => None,
        }
    }

    pub fn contains(&self, value: &Rational) -> bool {
        match self {
            Interval::Range(lo, hi) => lo <= value && value <= hi,
            Interval::Bottom => false,
        }
    }

    pub fn contains_zero(&self) -> bool {
        self.contains(&Rational::zero())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Interval::Range(lo, hi) if lo.is_finite() && hi.is_finite())
    }

    pub fn is_singleton(&self) -> bool {
        self.as_singleton().is_some()
    }

    pub fn as_singleton(&self) -> Option<&Rational> {
        match self {
            Interval::Range(lo, hi) if lo == hi => Some(lo),
            _ => None,
        }
    }

    /// Both ranges share at least one number.
    pub fn overlaps(&self, other: &Interval) -> bool {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => lo1 <= hi2 && lo2 <= hi1,
            _ => false,
        }
    }

    /// Overlapping, or adjacent over the integers (`[1, 2]` and `[3, 4]`).
    pub fn touches(&self, other: &Interval) -> bool {
        if self.overlaps(other) {
            return true;
        }
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                Interval::integer_successor(hi1, lo2) || Interval::integer_successor(hi2, lo1)
            }
            _ => false,
        }
    }

    fn integer_successor(a: &Rational, b: &Rational) -> bool {
        a.is_integer() && b.is_integer() && a.add(&Rational::one()).as_ref() == Ok(b)
    }

    fn from_bounds(lo: Result<Rational, ArithmeticError>, hi: Result<Rational, ArithmeticError>) -> Interval {
        match (lo, hi) {
            (Ok(lo), Ok(hi)) => Interval::new(lo, hi),
            _ => Interval::Range(Rational::minus_infinity(), Rational::plus_infinity()),
        }
    }

    fn from_corners(corners: [Result<Rational, ArithmeticError>; 4]) -> Interval {
        let mut values = Vec::with_capacity(4);
        for corner in corners {
            match corner {
                Ok(v) => values.push(v),
                Err(_) => return Interval::top(),
            }
        }
        match (values.iter().min(), values.iter().max()) {
            (Some(lo), Some(hi)) => Interval::new(lo.clone(), hi.clone()),
            _ => Interval::top(),
        }
    }

    pub fn add(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                Interval::from_bounds(lo1.add(lo2), hi1.add(hi2))
            }
            _ => Interval::Bottom,
        }
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                Interval::from_bounds(lo1.sub(hi2), hi1.sub(lo2))
            }
            _ => Interval::Bottom,
        }
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => Interval::from_corners([
                lo1.mul(lo2),
                lo1.mul(hi2),
                hi1.mul(lo2),
                hi1.mul(hi2),
            ]),
            _ => Interval::Bottom,
        }
    }

    /// Division; ⊤ when the divisor may be zero.
    pub fn div(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Range(..), Interval::Range(..)) if other.contains_zero() => Interval::top(),
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => Interval::from_corners([
                lo1.div(lo2),
                lo1.div(hi2),
                hi1.div(lo2),
                hi1.div(hi2),
            ]),
            _ => Interval::Bottom,
        }
    }

    pub fn neg(&self) -> Interval {
        match self {
            Interval::Range(lo, hi) => Interval::new(-hi, -lo),
            Interval::Bottom => Interval::Bottom,
        }
    }

    /// Widening that moves unstable bounds to the next landmark of `thresholds`.
    pub fn widen_with(&self, other: &Interval, thresholds: &RationalThreshold) -> Interval {
        match (self, other) {
            (Interval::Bottom, _) => other.clone(),
            (_, Interval::Bottom) => self.clone(),
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                let lo = if lo2 < lo1 { thresholds.get_previous(lo2) } else { lo1.clone() };
                let hi = if hi2 > hi1 { thresholds.get_next(hi2) } else { hi1.clone() };
                Interval::new(lo, hi)
            }
        }
    }
}

impl Lattice for Interval {
    fn bottom() -> Self {
        Interval::Bottom
    }

    fn top() -> Self {
        Interval::Range(Rational::minus_infinity(), Rational::plus_infinity())
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Interval::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, Interval::Range(lo, hi) if lo.is_minus_infinity() && hi.is_plus_infinity())
    }

    fn le(&self, other: &Self) -> bool {
        match (self, other) {
            (Interval::Bottom, _) => true,
            (_, Interval::Bottom) => false,
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => lo2 <= lo1 && hi1 <= hi2,
        }
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, _) => other.clone(),
            (_, Interval::Bottom) => self.clone(),
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                Interval::Range(min(lo1, lo2).clone(), max(hi1, hi2).clone())
            }
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                Interval::new(max(lo1, lo2).clone(), min(hi1, hi2).clone())
            }
            _ => Interval::Bottom,
        }
    }

    fn widen(&self, other: &Self) -> Self {
        self.widen_with(other, default_thresholds())
    }

    /// Replaces the infinite bounds of `self` with the bounds of `other`.
    fn narrow(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Range(lo1, hi1), Interval::Range(lo2, hi2)) => {
                let lo = if lo1.is_minus_infinity() { lo2 } else { lo1 };
                let hi = if hi1.is_plus_infinity() { hi2 } else { hi1 };
                Interval::new(lo.clone(), hi.clone())
            }
            _ => Interval::Bottom,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Bottom => write!(f, "⊥"),
            Interval::Range(lo, hi) => write!(f, "[{}, {}]", lo, hi),
        }
    }
}
