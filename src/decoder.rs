//! Abstract semantics of primitive operations over [`ExprDomain`].

use std::fmt;

use log::trace;

use crate::expr::{BinaryOperator, Expr, Literal, SymbolicValue, TypeRef, UnaryOperator};
use crate::expr_domain::ExprDomain;

/// Nesting bound for `Not`/`&&`/`||` chains inside assumed conditions.
pub const MAX_CONDITION_DEPTH: usize = 16;

/// Polarity of an assumption.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AssumeTag {
    True,
    False,
}

/// A primitive operation at one program point, as produced by the front-end.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Op {
    Binary {
        op: BinaryOperator,
        dest: SymbolicValue,
        left: SymbolicValue,
        right: SymbolicValue,
    },
    Unary {
        op: UnaryOperator,
        unsigned: bool,
        dest: SymbolicValue,
        operand: SymbolicValue,
    },
    LoadConst {
        dest: SymbolicValue,
        ty: TypeRef,
        literal: Literal,
    },
    LoadNull {
        dest: SymbolicValue,
    },
    IsInst {
        dest: SymbolicValue,
        ty: TypeRef,
        operand: SymbolicValue,
    },
    SizeOf {
        dest: SymbolicValue,
        ty: TypeRef,
    },
    Assume {
        tag: AssumeTag,
        cond: SymbolicValue,
    },
    Assert {
        cond: SymbolicValue,
    },
    /// `dest` takes whatever is known about `source`.
    Copy {
        dest: SymbolicValue,
        source: SymbolicValue,
    },
    /// `dest` receives an unknown value.
    Havoc {
        dest: SymbolicValue,
    },
    Nop,
}

impl Op {
    /// Integer load `dest := value` of type `int64`.
    pub fn load_int(dest: SymbolicValue, value: i64) -> Self {
        Op::LoadConst {
            dest,
            ty: TypeRef::new("int64"),
            literal: Literal::Int(value),
        }
    }

    pub fn binary(op: BinaryOperator, dest: SymbolicValue, left: SymbolicValue, right: SymbolicValue) -> Self {
        Op::Binary { op, dest, left, right }
    }

    /// The value written by this operation.
    pub fn dest(&self) -> Option<SymbolicValue> {
        match self {
            Op::Binary { dest, .. }
            | Op::Unary { dest, .. }
            | Op::LoadConst { dest, .. }
            | Op::LoadNull { dest }
            | Op::IsInst { dest, .. }
            | Op::SizeOf { dest, .. }
            | Op::Copy { dest, .. }
            | Op::Havoc { dest } => Some(*dest),
            Op::Assume { .. } | Op::Assert { .. } | Op::Nop => None,
        }
    }

    /// Integer literal loaded by this operation.
    pub fn int_constant(&self) -> Option<i64> {
        match self {
            Op::LoadConst {
                literal: Literal::Int(n),
                ..
            } => Some(*n),
            _ => None,
        }
    }

    /// Expression installed at the destination by a strong update.
    fn definition(&self) -> Option<Expr> {
        let expr = match self {
            Op::Binary { op, left, right, .. } => Expr::binary(*op, *left, *right),
            Op::Unary {
                op, unsigned, operand, ..
            } => Expr::unary(*op, *unsigned, *operand),
            Op::LoadConst { ty, literal, .. } => Expr::constant(ty.clone(), literal.clone()),
            Op::LoadNull { .. } => Expr::Null,
            Op::IsInst { ty, operand, .. } => Expr::IsInst {
                ty: ty.clone(),
                operand: *operand,
            },
            Op::SizeOf { ty, .. } => Expr::SizeOf { ty: ty.clone() },
            _ => return None,
        };
        Some(expr)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Binary { op, dest, left, right } => write!(f, "{} := {} {} {}", dest, left, op, right),
            Op::Unary {
                op,
                unsigned,
                dest,
                operand,
            } => write!(f, "{} := {}{} {}", dest, op, if *unsigned { ".un" } else { "" }, operand),
            Op::LoadConst { dest, ty, literal } => write!(f, "{} := {}:{}", dest, literal, ty),
            Op::LoadNull { dest } => write!(f, "{} := null", dest),
            Op::IsInst { dest, ty, operand } => write!(f, "{} := isinst {} {}", dest, ty, operand),
            Op::SizeOf { dest, ty } => write!(f, "{} := sizeof({})", dest, ty),
            Op::Assume { tag, cond } => match tag {
                AssumeTag::True => write!(f, "assume {}", cond),
                AssumeTag::False => write!(f, "assume !{}", cond),
            },
            Op::Assert { cond } => write!(f, "assert {}", cond),
            Op::Copy { dest, source } => write!(f, "{} := {}", dest, source),
            Op::Havoc { dest } => write!(f, "havoc {}", dest),
            Op::Nop => write!(f, "nop"),
        }
    }
}

/// Abstract transfer function: ⟦op⟧♯: State → State
pub trait TransferFunction<S> {
    type Op;

    fn apply(&self, state: &S, op: &Self::Op) -> S;
}

/// Transfer function tracking how each symbolic value was computed.
#[derive(Debug, Clone)]
pub struct ExprDecoder {
    max_condition_depth: usize,
}

impl Default for ExprDecoder {
    fn default() -> Self {
        ExprDecoder {
            max_condition_depth: MAX_CONDITION_DEPTH,
        }
    }
}

impl ExprDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_condition_depth(mut self, depth: usize) -> Self {
        self.max_condition_depth = depth;
        self
    }

    /// Strong update of `dest`: the old value and every fact reading it are
    /// killed before `expr` is bound.
    fn assign(&self, state: &ExprDomain, dest: SymbolicValue, expr: Option<Expr>) -> ExprDomain {
        let killed = state.kill(&dest);
        match expr {
            // A fact reading `dest` itself would describe the old value.
            Some(expr) if !expr.reads(&dest) => killed.add(dest, expr),
            _ => killed,
        }
    }

    /// Refines `state` with the knowledge that `cond` evaluates to `truth`.
    pub fn assume(&self, state: &ExprDomain, cond: SymbolicValue, truth: bool) -> ExprDomain {
        self.assume_at_depth(state, cond, truth, 0)
    }

    fn assume_at_depth(&self, state: &ExprDomain, cond: SymbolicValue, truth: bool, depth: usize) -> ExprDomain {
        if state.is_bottom() || depth > self.max_condition_depth {
            return state.clone();
        }
        let Some(expr) = state.expr(&cond) else {
            return state.clone();
        };

        match expr {
            Expr::Binary { op, left, right }
                if (op.is_equality() && truth) || (*op == BinaryOperator::CneUn && !truth) =>
            {
                self.refine(state, *left, *right)
            }
            Expr::Binary {
                op: BinaryOperator::LogicalAnd,
                left,
                right,
            } if truth => {
                let (left, right) = (*left, *right);
                let refined = self.assume_at_depth(state, left, true, depth + 1);
                self.assume_at_depth(&refined, right, true, depth + 1)
            }
            Expr::Binary {
                op: BinaryOperator::LogicalOr,
                left,
                right,
            } if !truth => {
                let (left, right) = (*left, *right);
                let refined = self.assume_at_depth(state, left, false, depth + 1);
                self.assume_at_depth(&refined, right, false, depth + 1)
            }
            Expr::Unary {
                op: UnaryOperator::Not,
                operand,
                ..
            } => self.assume_at_depth(state, *operand, !truth, depth + 1),
            Expr::Const { literal, .. } => match literal.as_i64() {
                Some(n) if (n != 0) != truth => {
                    trace!("assume {} = {}: constant condition is {}", cond, truth, n != 0);
                    ExprDomain::bottom()
                }
                _ => state.clone(),
            },
            _ => state.clone(),
        }
    }

    /// Propagates the equality `s1 == s2`.
    ///
    /// An unrefined side receives the expression of the other side, `s1`
    /// first, unless that expression transitively reads the receiving value.
    pub fn refine(&self, state: &ExprDomain, s1: SymbolicValue, s2: SymbolicValue) -> ExprDomain {
        if let (Some(a), Some(b)) = (state.as_constant(&s1), state.as_constant(&s2)) {
            if a != b {
                trace!("refine {} == {}: constants {} and {} disagree", s1, s2, a, b);
                return ExprDomain::bottom();
            }
        }

        for (to, from) in [(s1, s2), (s2, s1)] {
            if state.has_refinement(&to) {
                continue;
            }
            if let Some(expr) = state.expr(&from) {
                if !state.is_reachable_from(from, &to) {
                    trace!("refine {} := {} (from {})", to, expr, from);
                    return state.add(to, expr.clone());
                }
            }
        }

        state.clone()
    }
}

impl TransferFunction<ExprDomain> for ExprDecoder {
    type Op = Op;

    fn apply(&self, state: &ExprDomain, op: &Op) -> ExprDomain {
        if state.is_bottom() {
            return state.clone();
        }

        let result = match op {
            Op::Assume { tag, cond } => self.assume(state, *cond, *tag == AssumeTag::True),
            Op::Assert { cond } => self.assume(state, *cond, true),
            Op::Copy { dest, source } => {
                let expr = state.expr(source).cloned();
                self.assign(state, *dest, expr)
            }
            Op::Havoc { dest } => self.assign(state, *dest, None),
            Op::Nop => state.clone(),
            _ => match op.dest() {
                Some(dest) => self.assign(state, dest, op.definition()),
                None => state.clone(),
            },
        };

        trace!("{}: {} -> {}", op, state, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::flat::FlatDomain;

    fn s(id: u32) -> SymbolicValue {
        SymbolicValue::new(id)
    }

    fn run(ops: &[Op]) -> ExprDomain {
        let decoder = ExprDecoder::new();
        ops.iter()
            .fold(ExprDomain::top(), |state, op| decoder.apply(&state, op))
    }

    #[test]
    fn test_strong_update_overwrites() {
        let state = run(&[Op::load_int(s(1), 5), Op::load_int(s(1), 6)]);
        assert_eq!(state.as_constant(&s(1)), Some(6));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_strong_update_kills_readers() {
        let state = run(&[
            Op::load_int(s(1), 5),
            Op::binary(BinaryOperator::Add, s(2), s(1), s(1)),
            Op::load_int(s(1), 6),
        ]);
        assert_eq!(state.get(&s(2)), FlatDomain::Top);
        assert_eq!(state.as_constant(&s(1)), Some(6));
    }

    #[test]
    fn test_self_reading_update_forgets() {
        let state = run(&[Op::load_int(s(1), 5), Op::binary(BinaryOperator::Add, s(1), s(1), s(2))]);
        assert_eq!(state.get(&s(1)), FlatDomain::Top);
    }

    #[test]
    fn test_definitions() {
        let ty = TypeRef::new("Foo");
        let state = run(&[
            Op::LoadNull { dest: s(1) },
            Op::IsInst {
                dest: s(2),
                ty: ty.clone(),
                operand: s(1),
            },
            Op::SizeOf {
                dest: s(3),
                ty: ty.clone(),
            },
            Op::Unary {
                op: UnaryOperator::Neg,
                unsigned: false,
                dest: s(4),
                operand: s(3),
            },
        ]);
        assert_eq!(state.get(&s(1)), FlatDomain::Normal(Expr::Null));
        assert_eq!(
            state.get(&s(2)),
            FlatDomain::Normal(Expr::IsInst {
                ty: ty.clone(),
                operand: s(1)
            })
        );
        assert_eq!(state.get(&s(3)), FlatDomain::Normal(Expr::SizeOf { ty }));
        assert_eq!(
            state.get(&s(4)),
            FlatDomain::Normal(Expr::unary(UnaryOperator::Neg, false, s(3)))
        );
    }

    #[test]
    fn test_copy_and_havoc() {
        let state = run(&[Op::load_int(s(1), 5), Op::Copy { dest: s(2), source: s(1) }]);
        assert_eq!(state.as_constant(&s(2)), Some(5));

        let state = run(&[
            Op::load_int(s(2), 5),
            Op::Copy { dest: s(2), source: s(9) },
        ]);
        assert_eq!(state.get(&s(2)), FlatDomain::Top);

        let state = run(&[Op::load_int(s(1), 5), Op::Havoc { dest: s(1) }, Op::Nop]);
        assert!(state.is_top());
    }

    #[test]
    fn test_assume_does_not_bind_condition() {
        let state = run(&[
            Op::load_int(s(2), 7),
            Op::binary(BinaryOperator::Ceq, s(3), s(1), s(2)),
            Op::Assume {
                tag: AssumeTag::True,
                cond: s(3),
            },
        ]);
        assert_eq!(state.as_constant(&s(1)), Some(7));
        assert_eq!(state.get(&s(3)), FlatDomain::Normal(Expr::binary(BinaryOperator::Ceq, s(1), s(2))));
    }

    #[test]
    fn test_refine_tries_left_first() {
        let decoder = ExprDecoder::new();
        let state = ExprDomain::top();
        let refined = decoder.refine(&state.add(s(2), Expr::int(3)), s(1), s(2));
        assert_eq!(refined.as_constant(&s(1)), Some(3));

        let refined = decoder.refine(&state.add(s(1), Expr::int(4)), s(1), s(2));
        assert_eq!(refined.as_constant(&s(2)), Some(4));

        // Both unrefined: nothing to copy
        assert_eq!(decoder.refine(&state, s(1), s(2)), state);
    }

    #[test]
    fn test_refine_cycle_guard() {
        // s2 = s1 + s3; assuming s1 == s2 must not bind s1 to an expression over s1
        let decoder = ExprDecoder::new();
        let state = ExprDomain::top().add(s(2), Expr::binary(BinaryOperator::Add, s(1), s(3)));
        let refined = decoder.refine(&state, s(1), s(2));
        assert_eq!(refined, state);
        assert!(!refined.has_refinement(&s(1)));
    }

    #[test]
    fn test_refine_contradicting_constants() {
        let decoder = ExprDecoder::new();
        let state = ExprDomain::top().add(s(1), Expr::int(5)).add(s(2), Expr::int(7));
        assert!(decoder.refine(&state, s(1), s(2)).is_bottom());

        let same = ExprDomain::top().add(s(1), Expr::int(5)).add(s(2), Expr::int(5));
        assert_eq!(decoder.refine(&same, s(1), s(2)), same);
    }

    #[test]
    fn test_assume_false_inequality() {
        let state = run(&[
            Op::load_int(s(2), 0),
            Op::binary(BinaryOperator::CneUn, s(3), s(1), s(2)),
            Op::Assume {
                tag: AssumeTag::False,
                cond: s(3),
            },
        ]);
        assert_eq!(state.as_constant(&s(1)), Some(0));

        // `!=` assumed true carries no equality
        let state = run(&[
            Op::load_int(s(2), 0),
            Op::binary(BinaryOperator::CneUn, s(3), s(1), s(2)),
            Op::Assume {
                tag: AssumeTag::True,
                cond: s(3),
            },
        ]);
        assert!(!state.has_refinement(&s(1)));
    }

    #[test]
    fn test_assert_refines() {
        let state = run(&[
            Op::load_int(s(2), 1),
            Op::binary(BinaryOperator::Cobjeq, s(3), s(1), s(2)),
            Op::Assert { cond: s(3) },
        ]);
        assert_eq!(state.as_constant(&s(1)), Some(1));
    }

    #[test]
    fn test_assume_negation_and_conjunction() {
        let state = run(&[
            Op::load_int(s(10), 1),
            Op::load_int(s(11), 2),
            Op::binary(BinaryOperator::Ceq, s(20), s(1), s(10)),
            Op::binary(BinaryOperator::CneUn, s(21), s(2), s(11)),
            Op::Unary {
                op: UnaryOperator::Not,
                unsigned: false,
                dest: s(22),
                operand: s(21),
            },
            Op::binary(BinaryOperator::LogicalAnd, s(23), s(20), s(22)),
            Op::Assume {
                tag: AssumeTag::True,
                cond: s(23),
            },
        ]);
        assert_eq!(state.as_constant(&s(1)), Some(1));
        assert_eq!(state.as_constant(&s(2)), Some(2));
    }

    #[test]
    fn test_assume_constant_condition() {
        let state = run(&[
            Op::load_int(s(1), 0),
            Op::Assume {
                tag: AssumeTag::True,
                cond: s(1),
            },
        ]);
        assert!(state.is_bottom());

        let state = run(&[
            Op::load_int(s(1), 0),
            Op::Assume {
                tag: AssumeTag::False,
                cond: s(1),
            },
        ]);
        assert!(!state.is_bottom());
    }

    #[test]
    fn test_condition_depth_bound() {
        let decoder = ExprDecoder::new().with_max_condition_depth(1);
        let mut state = ExprDomain::top()
            .add(s(10), Expr::int(4))
            .add(s(20), Expr::binary(BinaryOperator::Ceq, s(1), s(10)));
        // s21 = !s20, s22 = !s21, s23 = !s22
        for id in 21..=23 {
            state = state.add(s(id), Expr::unary(UnaryOperator::Not, false, s(id - 1)));
        }
        let refined = decoder.assume(&state, s(23), false);
        assert!(!refined.has_refinement(&s(1)));

        let refined = ExprDecoder::new().assume(&state, s(23), false);
        assert_eq!(refined.as_constant(&s(1)), Some(4));
    }

    #[test]
    fn test_bottom_is_preserved() {
        let decoder = ExprDecoder::new();
        let state = decoder.apply(&ExprDomain::bottom(), &Op::load_int(s(1), 1));
        assert!(state.is_bottom());
    }

    #[test]
    fn test_op_display() {
        assert_eq!(Op::load_int(s(1), 5).to_string(), "s1 := 5:int64");
        assert_eq!(Op::binary(BinaryOperator::Clt, s(3), s(1), s(2)).to_string(), "s3 := s1 < s2");
        assert_eq!(
            Op::Assume {
                tag: AssumeTag::False,
                cond: s(3)
            }
            .to_string(),
            "assume !s3"
        );
    }
}
