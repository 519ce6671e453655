//! Numeric ranges of symbolic values.
//!
//! [`NumericEvaluator`] unfolds the facts of an [`ExprDomain`] into a
//! [`DisInterval`]: constants are exact, arithmetic is lifted piecewise,
//! comparisons are booleans and anything else is ⊤.

use log::trace;

use crate::config::AnalysisConfig;
use crate::disinterval::DisInterval;
use crate::domain::Lattice;
use crate::expr::{BinaryOperator, Expr, SymbolicValue, UnaryOperator};
use crate::expr_domain::ExprDomain;
use crate::interval::Interval;

pub const DEFAULT_MAX_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub struct NumericEvaluator {
    max_depth: usize,
}

impl Default for NumericEvaluator {
    fn default() -> Self {
        NumericEvaluator {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&AnalysisConfig> for NumericEvaluator {
    fn from(config: &AnalysisConfig) -> Self {
        NumericEvaluator::new(config.max_depth)
    }
}

impl NumericEvaluator {
    pub fn new(max_depth: usize) -> Self {
        NumericEvaluator { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Range of `value` in `domain`, ⊥ when the domain is infeasible.
    pub fn range_of(&self, domain: &ExprDomain, value: SymbolicValue) -> DisInterval {
        if domain.is_bottom() {
            return DisInterval::bottom();
        }
        let range = self.eval(domain, value, self.max_depth);
        trace!("range of {} = {}", value, range);
        range
    }

    /// Convex view of [`NumericEvaluator::range_of`].
    pub fn interval_of(&self, domain: &ExprDomain, value: SymbolicValue) -> Interval {
        let range = self.range_of(domain, value);
        match range.as_interval() {
            Some(interval) => interval.clone(),
            None => range.hull(),
        }
    }

    fn eval(&self, domain: &ExprDomain, value: SymbolicValue, depth: usize) -> DisInterval {
        use BinaryOperator::*;

        let expr = match domain.expr(&value) {
            Some(expr) if depth > 0 => expr,
            _ => return DisInterval::top(),
        };
        let operand = |v: &SymbolicValue| self.eval(domain, *v, depth - 1);

        match expr {
            Expr::Const { literal, .. } => match literal.as_i64() {
                Some(n) => DisInterval::for_interval(Interval::for_value(n)),
                None => DisInterval::top(),
            },
            Expr::Binary { op, left, right } => match op {
                Add | AddOvf => operand(left).add(&operand(right)),
                Sub | SubOvf => operand(left).sub(&operand(right)),
                Mul | MulOvf => operand(left).mul(&operand(right)),
                Div => {
                    let quotient = operand(left).div(&operand(right));
                    DisInterval::new(quotient.pieces().iter().map(round_out).collect())
                }
                op if op.is_comparison() => DisInterval::for_interval(Interval::boolean()),
                LogicalAnd | LogicalOr => DisInterval::for_interval(Interval::boolean()),
                _ => DisInterval::top(),
            },
            Expr::Unary {
                op: UnaryOperator::Neg,
                operand: v,
                ..
            } => operand(v).neg(),
            Expr::Unary {
                op: UnaryOperator::ConvI8,
                operand: v,
                ..
            } => operand(v),
            Expr::SizeOf { .. } => DisInterval::for_interval(Interval::non_negative()),
            _ => DisInterval::top(),
        }
    }
}

/// Smallest integer-bounded interval containing `piece`, so that truncated
/// integer quotients stay inside.
fn round_out(piece: &Interval) -> Interval {
    match piece {
        Interval::Range(lo, hi) => Interval::new(lo.floor(), hi.ceil()),
        Interval::Bottom => Interval::Bottom,
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::{Literal, TypeRef};

    fn s(id: u32) -> SymbolicValue {
        SymbolicValue::new(id)
    }

    #[test]
    fn test_constants_and_arithmetic() {
        let d = ExprDomain::top()
            .add(s(1), Expr::int(3))
            .add(s(2), Expr::int(4))
            .add(s(3), Expr::binary(BinaryOperator::Add, s(1), s(2)))
            .add(s(4), Expr::binary(BinaryOperator::Mul, s(3), s(3)))
            .add(s(5), Expr::unary(UnaryOperator::Neg, false, s(4)));
        let eval = NumericEvaluator::default();
        assert_eq!(eval.interval_of(&d, s(3)), Interval::of(7, 7));
        assert_eq!(eval.interval_of(&d, s(4)), Interval::of(49, 49));
        assert_eq!(eval.interval_of(&d, s(5)), Interval::of(-49, -49));
    }

    #[test]
    fn test_unknown_values_are_top() {
        let d = ExprDomain::top().add(s(2), Expr::binary(BinaryOperator::Xor, s(1), s(1)));
        let eval = NumericEvaluator::default();
        assert!(eval.range_of(&d, s(1)).is_top());
        assert!(eval.range_of(&d, s(2)).is_top());
        let str_const = Expr::constant(TypeRef::new("string"), Literal::Str("a".into()));
        assert!(eval.range_of(&d.add(s(3), str_const), s(3)).is_top());
    }

    #[test]
    fn test_comparisons_are_boolean() {
        let d = ExprDomain::top().add(s(3), Expr::binary(BinaryOperator::Clt, s(1), s(2)));
        assert_eq!(NumericEvaluator::default().interval_of(&d, s(3)), Interval::boolean());
    }

    #[test]
    fn test_division_rounds_to_integers() {
        let d = ExprDomain::top()
            .add(s(1), Expr::int(7))
            .add(s(2), Expr::int(2))
            .add(s(3), Expr::binary(BinaryOperator::Div, s(1), s(2)));
        assert_eq!(NumericEvaluator::default().interval_of(&d, s(3)), Interval::of(3, 4));

        // Divisor may be zero
        let d = d.add(s(4), Expr::binary(BinaryOperator::Div, s(1), s(5)));
        assert!(NumericEvaluator::default().range_of(&d, s(4)).is_top());
    }

    #[test]
    fn test_depth_bound() {
        let d = ExprDomain::top()
            .add(s(1), Expr::int(1))
            .add(s(2), Expr::unary(UnaryOperator::Neg, false, s(1)));
        assert!(NumericEvaluator::new(1).range_of(&d, s(2)).is_top());
        assert_eq!(NumericEvaluator::new(2).interval_of(&d, s(2)), Interval::of(-1, -1));

        let shallow = NumericEvaluator::from(&AnalysisConfig::default().with_max_depth(1));
        assert_eq!(shallow.max_depth(), 1);
        assert!(shallow.range_of(&d, s(2)).is_top());
    }

    #[test]
    fn test_bottom_domain() {
        assert!(NumericEvaluator::default().range_of(&ExprDomain::bottom(), s(1)).is_bottom());
    }
}
