//! Exact rational numbers extended with `+∞` and `−∞`.
//!
//! Finite values are kept as a [`BigInt`] numerator/denominator pair in lowest
//! terms with a strictly positive denominator, so structural equality is value
//! equality (`6/8 == 3/4`) and no operation can overflow.
//!
//! Operations that have no meaningful result (`+∞ + −∞`, `∞ / ∞`, `x / 0`)
//! return an [`ArithmeticError`] instead of a silently wrong value.
//!
//! ```
//! use absint_rs::rational::Rational;
//!
//! let a = Rational::new(6, 8).unwrap();
//! let b = Rational::new(3, 4).unwrap();
//! assert_eq!(a, b);
//! assert!(Rational::minus_infinity() < Rational::zero());
//! assert_eq!(a.add(&b).unwrap(), Rational::new(3, 2).unwrap());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::domain::Lattice;
use crate::error::ArithmeticError;

/// Finite fraction in lowest terms, `den > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: BigInt,
    den: BigInt,
}

impl Fraction {
    /// Reduces `num/den`. The denominator must be non-zero.
    fn reduced(num: BigInt, den: BigInt) -> Self {
        debug_assert!(!den.is_zero(), "zero denominator");
        let g = num.gcd(&den);
        let (mut num, mut den) = if g.is_zero() || g.is_one() { (num, den) } else { (num / &g, den / &g) };
        if den.is_negative() {
            num = -num;
            den = -den;
        }
        Fraction { num, den }
    }

    pub fn numerator(&self) -> &BigInt {
        &self.num
    }

    pub fn denominator(&self) -> &BigInt {
        &self.den
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.num * &other.den).cmp(&(&other.num * &self.den))
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rational number or one of the two infinities.
///
/// The derived order relies on the variant order: `−∞ < finite < +∞`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rational {
    MinusInfinity,
    Finite(Fraction),
    PlusInfinity,
}

impl Rational {
    /// Creates `num/den` in lowest terms.
    pub fn new(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Result<Self, ArithmeticError> {
        let den = den.into();
        if den.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Rational::Finite(Fraction::reduced(num.into(), den)))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Rational::Finite(Fraction {
            num: value.into(),
            den: BigInt::one(),
        })
    }

    pub fn zero() -> Self {
        Rational::integer(0)
    }

    pub fn one() -> Self {
        Rational::integer(1)
    }

    pub fn plus_infinity() -> Self {
        Rational::PlusInfinity
    }

    pub fn minus_infinity() -> Self {
        Rational::MinusInfinity
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Rational::Finite(_))
    }

    pub fn is_infinity(&self) -> bool {
        !self.is_finite()
    }

    pub fn is_plus_infinity(&self) -> bool {
        matches!(self, Rational::PlusInfinity)
    }

    pub fn is_minus_infinity(&self) -> bool {
        matches!(self, Rational::MinusInfinity)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Rational::Finite(f) if f.num.is_zero())
    }

    /// Finite values with denominator one.
    pub fn is_integer(&self) -> bool {
        matches!(self, Rational::Finite(f) if f.den.is_one())
    }

    /// Sign of the value: `-1`, `0` or `1`.
    pub fn signum(&self) -> i8 {
        match self {
            Rational::MinusInfinity => -1,
            Rational::PlusInfinity => 1,
            Rational::Finite(f) => {
                if f.num.is_zero() {
                    0
                } else if f.num.is_negative() {
                    -1
                } else {
                    1
                }
            }
        }
    }

    fn infinity_with_sign(sign: i8) -> Self {
        if sign < 0 {
            Rational::MinusInfinity
        } else {
            Rational::PlusInfinity
        }
    }

    pub fn as_fraction(&self) -> Option<&Fraction> {
        match self {
            Rational::Finite(f) => Some(f),
            _ => None,
        }
    }

    /// The value as `i64`, if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Rational::Finite(f) if f.den.is_one() => f.num.to_i64(),
            _ => None,
        }
    }

    pub fn add(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        match (self, other) {
            (Rational::Finite(a), Rational::Finite(b)) => {
                let num = &a.num * &b.den + &b.num * &a.den;
                let den = &a.den * &b.den;
                Ok(Rational::Finite(Fraction::reduced(num, den)))
            }
            (Rational::PlusInfinity, Rational::MinusInfinity) | (Rational::MinusInfinity, Rational::PlusInfinity) => {
                Err(ArithmeticError::IndeterminateForm)
            }
            (Rational::PlusInfinity, _) | (_, Rational::PlusInfinity) => Ok(Rational::PlusInfinity),
            (Rational::MinusInfinity, _) | (_, Rational::MinusInfinity) => Ok(Rational::MinusInfinity),
        }
    }

    pub fn sub(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        self.add(&-other)
    }

    /// Multiplication; `0 × ±∞ = 0`.
    pub fn mul(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        match (self, other) {
            (Rational::Finite(a), Rational::Finite(b)) => {
                let num = &a.num * &b.num;
                let den = &a.den * &b.den;
                Ok(Rational::Finite(Fraction::reduced(num, den)))
            }
            _ if self.is_zero() || other.is_zero() => Ok(Rational::zero()),
            _ => Ok(Rational::infinity_with_sign(self.signum() * other.signum())),
        }
    }

    /// Division; `finite / ±∞ = 0`.
    pub fn div(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        match (self, other) {
            (Rational::Finite(a), Rational::Finite(b)) => {
                let num = &a.num * &b.den;
                let den = &a.den * &b.num;
                Ok(Rational::Finite(Fraction::reduced(num, den)))
            }
            (Rational::Finite(_), _) => Ok(Rational::zero()),
            (_, Rational::Finite(_)) => Ok(Rational::infinity_with_sign(self.signum() * other.signum())),
            _ => Err(ArithmeticError::IndeterminateForm),
        }
    }

    pub fn abs(&self) -> Rational {
        if self.signum() < 0 {
            -self
        } else {
            self.clone()
        }
    }

    /// Smallest integer not below `self`; infinities are kept.
    pub fn ceil(&self) -> Rational {
        match self {
            Rational::Finite(f) => {
                let (floor, rem) = f.num.div_mod_floor(&f.den);
                Rational::integer(if rem.is_zero() { floor } else { floor + 1 })
            }
            _ => self.clone(),
        }
    }

    /// Largest integer not above `self`; infinities are kept.
    pub fn floor(&self) -> Rational {
        match self {
            Rational::Finite(f) => Rational::integer(f.num.div_floor(&f.den)),
            _ => self.clone(),
        }
    }

    /// Ceiling to an integer, saturating to `±∞` outside the `i32` range.
    pub fn next_int32(&self) -> Rational {
        Rational::saturate_int32(self.ceil())
    }

    /// Floor to an integer, saturating to `±∞` outside the `i32` range.
    pub fn previous_int32(&self) -> Rational {
        Rational::saturate_int32(self.floor())
    }

    fn saturate_int32(value: Rational) -> Rational {
        if value > Rational::from(i64::from(i32::MAX)) {
            Rational::PlusInfinity
        } else if value < Rational::from(i64::from(i32::MIN)) {
            Rational::MinusInfinity
        } else {
            value
        }
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match self {
            Rational::MinusInfinity => Rational::PlusInfinity,
            Rational::PlusInfinity => Rational::MinusInfinity,
            Rational::Finite(f) => Rational::Finite(Fraction {
                num: -&f.num,
                den: f.den.clone(),
            }),
        }
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -&self
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Rational::integer(value)
    }
}

impl From<i32> for Rational {
    fn from(value: i32) -> Self {
        Rational::integer(value)
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Rational::integer(value)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rational::MinusInfinity => write!(f, "-oo"),
            Rational::PlusInfinity => write!(f, "+oo"),
            Rational::Finite(r) if r.den.is_one() => write!(f, "{}", r.num),
            Rational::Finite(r) => write!(f, "{}/{}", r.num, r.den),
        }
    }
}

/// Rationals as a chain lattice: `⊥ = −∞`, `⊤ = +∞`, join is `max`.
impl Lattice for Rational {
    fn bottom() -> Self {
        Rational::MinusInfinity
    }

    fn top() -> Self {
        Rational::PlusInfinity
    }

    fn is_bottom(&self) -> bool {
        self.is_minus_infinity()
    }

    fn is_top(&self) -> bool {
        self.is_plus_infinity()
    }

    fn le(&self, other: &Self) -> bool {
        self <= other
    }

    fn join(&self, other: &Self) -> Self {
        std::cmp::max(self, other).clone()
    }

    fn meet(&self, other: &Self) -> Self {
        std::cmp::min(self, other).clone()
    }

    fn widen(&self, other: &Self) -> Self {
        if other > self {
            Rational::PlusInfinity
        } else {
            self.clone()
        }
    }
}
