//! Finite catalog of widening landmarks.
//!
//! Widening moves an unstable interval bound to the next landmark of the
//! catalog instead of jumping straight to infinity. Because the catalog is
//! finite, a bound can only be widened a bounded number of times.

use crate::rational::Rational;

/// Sorted, deduplicated set of landmarks, always containing `−∞`, `0`, `+∞`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalThreshold {
    landmarks: Vec<Rational>,
}

impl RationalThreshold {
    pub fn new(values: impl IntoIterator<Item = Rational>) -> Self {
        let mut landmarks: Vec<Rational> = values.into_iter().collect();
        landmarks.push(Rational::minus_infinity());
        landmarks.push(Rational::zero());
        landmarks.push(Rational::plus_infinity());
        landmarks.sort();
        landmarks.dedup();
        Self { landmarks }
    }

    /// Catalog built from constants appearing in the analyzed code.
    ///
    /// Each constant `c` contributes `c - 1`, `c` and `c + 1`, so that both
    /// strict and non-strict comparisons against it have a landmark.
    pub fn from_constants(constants: impl IntoIterator<Item = i64>) -> Self {
        Self::new(constants.into_iter().flat_map(|c| {
            [
                Rational::from(c.saturating_sub(1)),
                Rational::from(c),
                Rational::from(c.saturating_add(1)),
            ]
        }))
    }

    pub fn landmarks(&self) -> &[Rational] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// `v` itself if it is a landmark, otherwise the smallest landmark above `v`.
    pub fn get_next(&self, v: &Rational) -> Rational {
        debug_assert!(self.landmarks.windows(2).all(|w| w[0] < w[1]));
        let i = self.landmarks.partition_point(|x| x < v);
        // `+∞` terminates the catalog, so `i` is always in range.
        self.landmarks[i.min(self.landmarks.len() - 1)].clone()
    }

    /// `v` itself if it is a landmark, otherwise the largest landmark below `v`.
    pub fn get_previous(&self, v: &Rational) -> Rational {
        debug_assert!(self.landmarks.windows(2).all(|w| w[0] < w[1]));
        let i = self.landmarks.partition_point(|x| x <= v);
        // `−∞` starts the catalog, so `i >= 1`.
        self.landmarks[i.max(1) - 1].clone()
    }
}

impl Default for RationalThreshold {
    fn default() -> Self {
        Self::new([
            Rational::from(i32::MIN),
            Rational::from(-1),
            Rational::from(1),
            Rational::from(i32::MAX),
        ])
    }
}
