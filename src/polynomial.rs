//! Linear (and polynomial) constraints over symbolic variables.
//!
//! A [`Polynomial`] is a relation between two sums of [`Monomial`]s:
//!
//! ```text
//! 2·x + 1  <  y        left = [2·x, 1], relation = <, right = [y]
//! ```
//!
//! [`Polynomial::canonical`] moves everything to the left-hand side and merges like
//! terms, which is the form used by the queries and by
//! [`Polynomial::as_interval_constraint`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ArithmeticError;
use crate::expr::{BinaryOperator, Expr, SymbolicValue, UnaryOperator};
use crate::expr_domain::ExprDomain;
use crate::interval::Interval;
use crate::rational::Rational;

/// Unfolding bound used when linearizing a condition.
const MAX_LINEARIZE_DEPTH: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl Relation {
    /// `!(l ⋈ r)` is `l ⋈' r`.
    pub fn negate(self) -> Relation {
        match self {
            Relation::Lt => Relation::Ge,
            Relation::Le => Relation::Gt,
            Relation::Eq => Relation::Ne,
            Relation::Ge => Relation::Lt,
            Relation::Gt => Relation::Le,
            Relation::Ne => Relation::Eq,
        }
    }

    /// `l ⋈ r` is `r ⋈' l`.
    pub fn swap(self) -> Relation {
        match self {
            Relation::Lt => Relation::Gt,
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Gt => Relation::Lt,
            r => r,
        }
    }

    /// Relation of a signed comparison operator.
    ///
    /// Unsigned orderings are not mapped since they do not agree with the
    /// signed reading of negative values.
    pub fn from_operator(op: BinaryOperator) -> Option<Relation> {
        use BinaryOperator::*;
        let relation = match op {
            Ceq | Cobjeq => Relation::Eq,
            CneUn => Relation::Ne,
            Clt => Relation::Lt,
            Cle => Relation::Le,
            Cgt => Relation::Gt,
            Cge => Relation::Ge,
            _ => return None,
        };
        Some(relation)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Eq => "==",
            Relation::Ge => ">=",
            Relation::Gt => ">",
            Relation::Ne => "!=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `coefficient · v1 · v2 · ...`, variables kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Monomial<V> {
    coefficient: Rational,
    variables: Vec<V>,
}

impl<V: Clone + Ord> Monomial<V> {
    pub fn new(coefficient: Rational, mut variables: Vec<V>) -> Self {
        variables.sort();
        Monomial {
            coefficient,
            variables,
        }
    }

    pub fn constant(c: impl Into<Rational>) -> Self {
        Monomial {
            coefficient: c.into(),
            variables: Vec::new(),
        }
    }

    /// `1 · v`.
    pub fn var(v: V) -> Self {
        Monomial {
            coefficient: Rational::one(),
            variables: vec![v],
        }
    }

    pub fn coefficient(&self) -> &Rational {
        &self.coefficient
    }

    pub fn variables(&self) -> &[V] {
        &self.variables
    }

    pub fn is_constant(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.variables.len()
    }

    pub fn same_variables(&self, other: &Monomial<V>) -> bool {
        self.variables == other.variables
    }

    pub fn scale(&self, k: &Rational) -> Result<Monomial<V>, ArithmeticError> {
        Ok(Monomial {
            coefficient: self.coefficient.mul(k)?,
            variables: self.variables.clone(),
        })
    }

    pub fn negate(&self) -> Monomial<V> {
        Monomial {
            coefficient: -&self.coefficient,
            variables: self.variables.clone(),
        }
    }

    fn rename<W: Clone + Ord>(&self, mut f: impl FnMut(&V) -> Option<W>) -> Option<Monomial<W>> {
        let variables = self.variables.iter().map(&mut f).collect::<Option<Vec<W>>>()?;
        Some(Monomial::new(self.coefficient.clone(), variables))
    }

    fn evaluate(&self, env: &mut impl FnMut(&V) -> Interval) -> Interval {
        self.variables
            .iter()
            .fold(Interval::for_value(self.coefficient.clone()), |acc, v| acc.mul(&env(v)))
    }
}

impl<V: fmt::Display> fmt::Display for Monomial<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variables.is_empty() {
            return write!(f, "{}", self.coefficient);
        }
        if self.coefficient != Rational::one() {
            write!(f, "{}·", self.coefficient)?;
        }
        for (i, v) in self.variables.iter().enumerate() {
            if i > 0 {
                write!(f, "·")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// `left ⋈ right` over sums of monomials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial<V> {
    relation: Relation,
    left: Vec<Monomial<V>>,
    right: Vec<Monomial<V>>,
}

impl<V: Clone + Ord> Polynomial<V> {
    pub fn new(relation: Relation, left: Vec<Monomial<V>>, right: Vec<Monomial<V>>) -> Self {
        Polynomial { relation, left, right }
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn left(&self) -> &[Monomial<V>] {
        &self.left
    }

    pub fn right(&self) -> &[Monomial<V>] {
        &self.right
    }

    /// `left − right ⋈ 0` with like terms merged and zero terms dropped.
    ///
    /// Monomials are ordered by their variables; the constant term comes first.
    pub fn canonical(&self) -> Result<Polynomial<V>, ArithmeticError> {
        let mut terms: BTreeMap<Vec<V>, Rational> = BTreeMap::new();
        let negated = self.right.iter().map(Monomial::negate);
        for m in self.left.iter().cloned().chain(negated) {
            let entry = terms.entry(m.variables).or_insert_with(Rational::zero);
            *entry = entry.add(&m.coefficient)?;
        }
        let left = terms
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(variables, coefficient)| Monomial {
                coefficient,
                variables,
            })
            .collect();
        Ok(Polynomial {
            relation: self.relation,
            left,
            right: vec![Monomial::constant(Rational::zero())],
        })
    }

    /// Every monomial has degree at most one.
    pub fn is_linear(&self) -> bool {
        self.left.iter().chain(&self.right).all(|m| m.degree() <= 1)
    }

    pub fn variables(&self) -> BTreeSet<V> {
        self.left
            .iter()
            .chain(&self.right)
            .flat_map(|m| m.variables.iter().cloned())
            .collect()
    }

    /// The complementary constraint.
    pub fn negate(&self) -> Polynomial<V> {
        Polynomial {
            relation: self.relation.negate(),
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }

    /// Renames every variable through `f`; `None` if some variable has no image.
    pub fn rename<W: Clone + Ord>(&self, mut f: impl FnMut(&V) -> Option<W>) -> Option<Polynomial<W>> {
        let left = self.left.iter().map(|m| m.rename(&mut f)).collect::<Option<Vec<_>>>()?;
        let right = self.right.iter().map(|m| m.rename(&mut f)).collect::<Option<Vec<_>>>()?;
        Some(Polynomial {
            relation: self.relation,
            left,
            right,
        })
    }

    /// Range of `left − right` when each variable ranges over `env(v)`.
    pub fn evaluate(&self, mut env: impl FnMut(&V) -> Interval) -> Interval {
        let mut range = Interval::for_value(0);
        for m in &self.left {
            range = range.add(&m.evaluate(&mut env));
        }
        for m in &self.right {
            range = range.sub(&m.evaluate(&mut env));
        }
        range
    }

    /// Whether the constraint certainly holds (`Some(true)`), certainly fails
    /// (`Some(false)`), or may go either way under `env`.
    pub fn truth(&self, env: impl FnMut(&V) -> Interval) -> Option<bool> {
        let (lo, hi) = match self.evaluate(env) {
            Interval::Range(lo, hi) => (lo, hi),
            Interval::Bottom => return None,
        };
        let zero = Rational::zero();
        match self.relation {
            Relation::Lt if hi < zero => Some(true),
            Relation::Lt if lo >= zero => Some(false),
            Relation::Le if hi <= zero => Some(true),
            Relation::Le if lo > zero => Some(false),
            Relation::Gt if lo > zero => Some(true),
            Relation::Gt if hi <= zero => Some(false),
            Relation::Ge if lo >= zero => Some(true),
            Relation::Ge if hi < zero => Some(false),
            Relation::Eq | Relation::Ne if lo == zero && hi == zero => Some(self.relation == Relation::Eq),
            Relation::Eq | Relation::Ne if lo > zero || hi < zero => Some(self.relation == Relation::Ne),
            _ => None,
        }
    }

    /// Reads `a·x + c ⋈ 0` as a range for the integer variable `x`.
    ///
    /// Strict bounds are tightened to the closest integer. `!=` and
    /// constraints over several variables have no interval form.
    pub fn as_interval_constraint(&self) -> Option<(V, Interval)> {
        let canonical = self.canonical().ok()?;
        if !canonical.is_linear() {
            return None;
        }

        let mut constant = Rational::zero();
        let mut term: Option<(V, Rational)> = None;
        for m in &canonical.left {
            match m.variables.first() {
                None => constant = constant.add(&m.coefficient).ok()?,
                Some(v) if term.is_none() => term = Some((v.clone(), m.coefficient.clone())),
                Some(_) => return None,
            }
        }
        let (var, a) = term?;
        if !a.is_finite() {
            return None;
        }

        // a·x ⋈ −c, so x ⋈' −c / a with the relation mirrored when a < 0
        let bound = (-&constant).div(&a).ok()?;
        let relation = if a.signum() < 0 {
            canonical.relation.swap()
        } else {
            canonical.relation
        };
        let minus_inf = Rational::minus_infinity();
        let plus_inf = Rational::plus_infinity();
        let one = Rational::one();

        let interval = match relation {
            Relation::Eq => {
                if bound.is_integer() {
                    Interval::for_value(bound)
                } else {
                    Interval::Bottom
                }
            }
            Relation::Le => Interval::new(minus_inf, bound.floor()),
            Relation::Lt => Interval::new(minus_inf, bound.ceil().sub(&one).ok()?),
            Relation::Ge => Interval::new(bound.ceil(), plus_inf),
            Relation::Gt => Interval::new(bound.floor().add(&one).ok()?, plus_inf),
            Relation::Ne => return None,
        };
        Some((var, interval))
    }
}

impl Polynomial<SymbolicValue> {
    /// Linear reading of the comparison bound to `cond` in `domain`.
    ///
    /// Operands are unfolded through `+`, `−`, negation and multiplication
    /// by a constant; any other value stays a variable.
    pub fn from_condition(domain: &ExprDomain, cond: SymbolicValue) -> Option<Polynomial<SymbolicValue>> {
        let Some(Expr::Binary { op, left, right }) = domain.expr(&cond) else {
            return None;
        };
        let relation = Relation::from_operator(*op)?;
        let left = linearize(domain, *left, MAX_LINEARIZE_DEPTH).ok()?;
        let right = linearize(domain, *right, MAX_LINEARIZE_DEPTH).ok()?;
        Some(Polynomial::new(relation, left, right))
    }
}

fn linearize(
    domain: &ExprDomain,
    v: SymbolicValue,
    depth: usize,
) -> Result<Vec<Monomial<SymbolicValue>>, ArithmeticError> {
    use BinaryOperator::*;

    let expr = match domain.expr(&v) {
        Some(expr) if depth > 0 => expr,
        _ => return Ok(vec![Monomial::var(v)]),
    };

    let terms = match expr {
        Expr::Const { literal, .. } => match literal.as_i64() {
            Some(n) => vec![Monomial::constant(n)],
            None => vec![Monomial::var(v)],
        },
        Expr::Binary {
            op: Add | AddOvf,
            left,
            right,
        } => {
            let mut terms = linearize(domain, *left, depth - 1)?;
            terms.extend(linearize(domain, *right, depth - 1)?);
            terms
        }
        Expr::Binary {
            op: Sub | SubOvf,
            left,
            right,
        } => {
            let mut terms = linearize(domain, *left, depth - 1)?;
            terms.extend(linearize(domain, *right, depth - 1)?.iter().map(Monomial::negate));
            terms
        }
        Expr::Binary {
            op: Mul | MulOvf,
            left,
            right,
        } => {
            let l = linearize(domain, *left, depth - 1)?;
            let r = linearize(domain, *right, depth - 1)?;
            match (constant_of(&l)?, constant_of(&r)?) {
                (Some(k), _) => r.iter().map(|m| m.scale(&k)).collect::<Result<Vec<_>, _>>()?,
                (_, Some(k)) => l.iter().map(|m| m.scale(&k)).collect::<Result<Vec<_>, _>>()?,
                (None, None) => vec![Monomial::var(v)],
            }
        }
        Expr::Unary {
            op: UnaryOperator::Neg,
            operand,
            ..
        } => linearize(domain, *operand, depth - 1)?
            .iter()
            .map(Monomial::negate)
            .collect(),
        _ => vec![Monomial::var(v)],
    };
    Ok(terms)
}

/// Sum of `terms` when none of them has variables.
fn constant_of(terms: &[Monomial<SymbolicValue>]) -> Result<Option<Rational>, ArithmeticError> {
    if !terms.iter().all(Monomial::is_constant) {
        return Ok(None);
    }
    let mut sum = Rational::zero();
    for m in terms {
        sum = sum.add(&m.coefficient)?;
    }
    Ok(Some(sum))
}

impl<V: fmt::Display> fmt::Display for Polynomial<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side<V: fmt::Display>(f: &mut fmt::Formatter<'_>, ms: &[Monomial<V>]) -> fmt::Result {
            if ms.is_empty() {
                return write!(f, "0");
            }
            for (i, m) in ms.iter().enumerate() {
                if i > 0 {
                    write!(f, " + ")?;
                }
                write!(f, "{}", m)?;
            }
            Ok(())
        }
        side(f, &self.left)?;
        write!(f, " {} ", self.relation)?;
        side(f, &self.right)
    }
}
