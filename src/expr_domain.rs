//! Environment of symbolic facts: which expression computed each value.
//!
//! An [`ExprDomain`] maps symbolic values to `FlatDomain<Expr>`. Values that
//! are not bound are implicitly `Top` (nothing is known about them), and the
//! whole environment may be `Bottom` when its program point is infeasible.
//!
//! The environment is persistent: [`ExprDomain::add`], [`ExprDomain::remove`]
//! and every other operation return a new environment and leave the original
//! untouched. Facts live in an [`OrdMap`], so snapshots share structure and
//! an update only copies the path to the changed key.
//!
//! # Join
//!
//! The join is pointwise and keeps only the facts both sides agree on:
//!
//! ```text
//! {a = (b + c), d = 5}  ⊔  {a = (b + c), d = 6}  =  {a = (b + c)}
//! ```
//!
//! A fact missing on one side meets the implicit `Top` and is lost.

use std::fmt;

use im::OrdMap;
use log::trace;

use crate::domain::Lattice;
use crate::expr::{Expr, SymbolicValue};
use crate::flat::FlatDomain;
use crate::graph::{self, Successors};
use crate::rename::Renaming;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprDomain {
    // Only `Normal` facts are stored; absent keys are `Top`.
    facts: OrdMap<SymbolicValue, Expr>,
    is_bottom: bool,
}

impl ExprDomain {
    /// The environment with no facts.
    pub fn top() -> Self {
        ExprDomain {
            facts: OrdMap::new(),
            is_bottom: false,
        }
    }

    /// The infeasible environment.
    pub fn bottom() -> Self {
        ExprDomain {
            facts: OrdMap::new(),
            is_bottom: true,
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    pub fn is_top(&self) -> bool {
        !self.is_bottom && self.facts.is_empty()
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// What is known about `value`.
    pub fn get(&self, value: &SymbolicValue) -> FlatDomain<Expr> {
        if self.is_bottom {
            return FlatDomain::Bottom;
        }
        match self.facts.get(value) {
            Some(expr) => FlatDomain::Normal(expr.clone()),
            None => FlatDomain::Top,
        }
    }

    /// The expression bound to `value`, if any.
    pub fn expr(&self, value: &SymbolicValue) -> Option<&Expr> {
        self.facts.get(value)
    }

    /// Whether `value` already has a bound expression.
    pub fn has_refinement(&self, value: &SymbolicValue) -> bool {
        self.facts.contains_key(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolicValue, &Expr)> {
        self.facts.iter()
    }

    /// Binds `value` to `expr`, replacing any previous fact.
    pub fn add(&self, value: SymbolicValue, expr: Expr) -> Self {
        if self.is_bottom {
            return self.clone();
        }
        ExprDomain {
            facts: self.facts.update(value, expr),
            is_bottom: false,
        }
    }

    /// Forgets everything about `value`.
    pub fn remove(&self, value: &SymbolicValue) -> Self {
        if self.is_bottom || !self.facts.contains_key(value) {
            return self.clone();
        }
        ExprDomain {
            facts: self.facts.without(value),
            is_bottom: false,
        }
    }

    /// Forgets `value` together with every fact that reads it.
    pub fn kill(&self, value: &SymbolicValue) -> Self {
        if self.is_bottom {
            return self.clone();
        }
        let stale: Vec<SymbolicValue> = self
            .facts
            .iter()
            .filter(|(k, e)| *k == value || e.reads(value))
            .map(|(k, _)| *k)
            .collect();
        if stale.is_empty() {
            return self.clone();
        }
        let mut facts = self.facts.clone();
        for k in &stale {
            facts.remove(k);
        }
        ExprDomain {
            facts,
            is_bottom: false,
        }
    }

    /// Sets the lattice value of `value`; a `Bottom` fact makes the whole
    /// environment infeasible.
    pub fn set(&self, value: SymbolicValue, fact: FlatDomain<Expr>) -> Self {
        match fact {
            FlatDomain::Bottom => ExprDomain::bottom(),
            FlatDomain::Normal(expr) => self.add(value, expr),
            FlatDomain::Top => self.remove(&value),
        }
    }

    /// Whether `target` occurs in the transitive unfolding of `source`.
    ///
    /// Nodes are symbolic values; `v` has an edge to every operand of the
    /// expression bound to `v`.
    pub fn is_reachable_from(&self, source: SymbolicValue, target: &SymbolicValue) -> bool {
        graph::is_reachable(self, source, target)
    }

    /// Pointwise join.
    ///
    /// Returns the joined environment and whether it is strictly weaker than
    /// `self`. With `widen` set the result is the same: distinct expressions
    /// already go to `Top`, and the flat lattice has finite height.
    pub fn join(&self, other: &ExprDomain, widen: bool) -> (ExprDomain, bool) {
        if self.is_bottom {
            return (other.clone(), !other.is_bottom);
        }
        if other.is_bottom || self.facts.ptr_eq(&other.facts) {
            return (self.clone(), false);
        }

        let kept: OrdMap<SymbolicValue, Expr> = self
            .facts
            .iter()
            .filter(|(k, e)| other.facts.get(k) == Some(e))
            .map(|(k, e)| (*k, e.clone()))
            .collect();

        if kept.len() == self.facts.len() {
            return (self.clone(), false);
        }

        trace!(
            "join{}: dropped {} of {} facts",
            if widen { " (widen)" } else { "" },
            self.facts.len() - kept.len(),
            self.facts.len()
        );
        let result = ExprDomain {
            facts: kept,
            is_bottom: false,
        };
        (result, true)
    }

    /// `self ⊑ other`: every fact of `other` is also a fact of `self`.
    pub fn le(&self, other: &ExprDomain) -> bool {
        if self.is_bottom {
            return true;
        }
        if other.is_bottom {
            return false;
        }
        other.facts.iter().all(|(k, e)| self.facts.get(k) == Some(e))
    }

    /// Union of the facts of both sides.
    ///
    /// Binding one value to two different expressions has no common
    /// refinement in the flat lattice, so such a conflict is ⊥.
    pub fn meet(&self, other: &ExprDomain) -> ExprDomain {
        if self.is_bottom || other.is_bottom {
            return ExprDomain::bottom();
        }
        let mut facts = self.facts.clone();
        for (k, e) in other.facts.iter() {
            match facts.get(k) {
                Some(mine) if mine != e => return ExprDomain::bottom(),
                Some(_) => {}
                None => {
                    facts.insert(*k, e.clone());
                }
            }
        }
        ExprDomain {
            facts,
            is_bottom: false,
        }
    }

    /// Applies the parallel assignment of a control-flow edge.
    ///
    /// First every operand of every fact is replaced through the whole
    /// renaming at once; a fact reading a value that does not survive the
    /// edge is dropped. Then each surviving fact of a renamed key is copied
    /// to every new name of that key. Keys that are not renamed do not
    /// survive the edge.
    pub fn rename(&self, renaming: &Renaming) -> ExprDomain {
        if self.is_bottom {
            return self.clone();
        }

        let substituted: OrdMap<SymbolicValue, Expr> = self
            .facts
            .iter()
            .filter_map(|(k, e)| {
                let renamed = e.substitute(|operand| renaming.representative(operand));
                if renamed.is_none() {
                    trace!("rename: dropping {} = {}", k, e);
                }
                renamed.map(|r| (*k, r))
            })
            .collect();

        let mut facts = OrdMap::new();
        for (old, targets) in renaming.iter() {
            if let Some(expr) = substituted.get(old) {
                for new in targets {
                    facts.insert(*new, expr.clone());
                }
            }
        }

        ExprDomain {
            facts,
            is_bottom: false,
        }
    }

    /// Unfolds the facts about `value` into a tree, at most `max_depth` levels deep.
    pub fn resolve(&self, value: SymbolicValue, max_depth: usize) -> ExprTree {
        match self.facts.get(&value) {
            Some(expr) if max_depth > 0 => {
                match expr.substitute(|operand| Some(self.resolve(*operand, max_depth - 1))) {
                    Some(tree) => ExprTree::Node(Box::new(tree)),
                    None => ExprTree::Leaf(value),
                }
            }
            _ => ExprTree::Leaf(value),
        }
    }

    /// Integer constant bound to `value`, if any.
    pub fn as_constant(&self, value: &SymbolicValue) -> Option<i64> {
        self.expr(value).and_then(Expr::as_i64)
    }
}

impl Default for ExprDomain {
    fn default() -> Self {
        ExprDomain::top()
    }
}

impl Lattice for ExprDomain {
    fn bottom() -> Self {
        ExprDomain::bottom()
    }

    fn top() -> Self {
        ExprDomain::top()
    }

    fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    fn is_top(&self) -> bool {
        ExprDomain::is_top(self)
    }

    fn le(&self, other: &Self) -> bool {
        ExprDomain::le(self, other)
    }

    fn join(&self, other: &Self) -> Self {
        ExprDomain::join(self, other, false).0
    }

    fn meet(&self, other: &Self) -> Self {
        ExprDomain::meet(self, other)
    }

    fn widen(&self, other: &Self) -> Self {
        ExprDomain::join(self, other, true).0
    }
}

impl Successors<SymbolicValue> for ExprDomain {
    fn successors(&self, node: &SymbolicValue) -> Vec<SymbolicValue> {
        match self.facts.get(node) {
            Some(expr) => expr.operands().into_iter().copied().collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for ExprDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom {
            return write!(f, "⊥");
        }
        write!(f, "{{")?;
        for (i, (k, e)) in self.facts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", k, e)?;
        }
        write!(f, "}}")
    }
}

/// A symbolic value with its facts unfolded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprTree {
    /// A value with no fact (or beyond the unfolding depth).
    Leaf(SymbolicValue),
    Node(Box<Expr<ExprTree>>),
}

impl ExprTree {
    pub fn as_expr(&self) -> Option<&Expr<ExprTree>> {
        match self {
            ExprTree::Node(expr) => Some(expr),
            ExprTree::Leaf(_) => None,
        }
    }
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprTree::Leaf(v) => write!(f, "{}", v),
            ExprTree::Node(expr) => write!(f, "{}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expr::BinaryOperator;

    fn s(id: u32) -> SymbolicValue {
        SymbolicValue::new(id)
    }

    fn add(a: u32, b: u32) -> Expr {
        Expr::binary(BinaryOperator::Add, s(a), s(b))
    }

    #[test]
    fn test_absent_is_top() {
        let d = ExprDomain::top();
        assert_eq!(d.get(&s(1)), FlatDomain::Top);
        assert!(d.is_top());
        assert_eq!(ExprDomain::bottom().get(&s(1)), FlatDomain::Bottom);
    }

    #[test]
    fn test_persistent_updates() {
        let d0 = ExprDomain::top();
        let d1 = d0.add(s(1), Expr::int(5));
        let d2 = d1.add(s(1), Expr::int(6));
        let d3 = d2.remove(&s(1));

        assert!(d0.is_top());
        assert_eq!(d1.get(&s(1)), FlatDomain::Normal(Expr::int(5)));
        assert_eq!(d2.get(&s(1)), FlatDomain::Normal(Expr::int(6)));
        assert_eq!(d3.get(&s(1)), FlatDomain::Top);
    }

    #[test]
    fn test_branches_from_shared_snapshot() {
        let base = (1..=100).fold(ExprDomain::top(), |d, i| d.add(s(i), Expr::int(i as i64)));
        let left = base.kill(&s(1)).add(s(200), Expr::int(0));
        let right = base.add(s(1), Expr::int(-1));

        assert_eq!(base.len(), 100);
        assert_eq!(base.as_constant(&s(1)), Some(1));
        assert_eq!(left.len(), 100);
        assert_eq!(left.get(&s(1)), FlatDomain::Top);
        assert_eq!(right.as_constant(&s(1)), Some(-1));
        assert_eq!(right.as_constant(&s(50)), Some(50));

        // An unchanged snapshot joins without dropping anything
        let copy = base.clone();
        assert_eq!(base.join(&copy, false), (base.clone(), false));
        let (joined, changed) = left.join(&right, false);
        assert!(changed);
        assert_eq!(joined.len(), 99);
    }

    #[test]
    fn test_kill_drops_readers() {
        let d = ExprDomain::top()
            .add(s(1), Expr::int(1))
            .add(s(2), add(1, 3))
            .add(s(4), Expr::int(4));
        let killed = d.kill(&s(1));
        assert_eq!(killed.get(&s(1)), FlatDomain::Top);
        assert_eq!(killed.get(&s(2)), FlatDomain::Top);
        assert_eq!(killed.as_constant(&s(4)), Some(4));
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn test_set_bottom_fact() {
        let d = ExprDomain::top().add(s(1), Expr::int(5));
        assert!(d.set(s(2), FlatDomain::Bottom).is_bottom());
        assert_eq!(d.set(s(1), FlatDomain::Top).get(&s(1)), FlatDomain::Top);
    }

    #[test]
    fn test_bottom_absorbs_updates() {
        let d = ExprDomain::bottom().add(s(1), Expr::int(5));
        assert!(d.is_bottom());
        assert!(d.is_empty());
    }

    #[test]
    fn test_join_keeps_common_facts() {
        let a = ExprDomain::top().add(s(1), add(2, 3)).add(s(4), Expr::int(5));
        let b = ExprDomain::top().add(s(1), add(2, 3)).add(s(4), Expr::int(6));

        let (joined, weaker) = a.join(&b, false);
        assert!(weaker);
        assert_eq!(joined.get(&s(1)), FlatDomain::Normal(add(2, 3)));
        assert_eq!(joined.get(&s(4)), FlatDomain::Top);

        let (again, weaker) = joined.join(&b, false);
        assert!(!weaker);
        assert_eq!(again, joined);
    }

    #[test]
    fn test_join_one_sided_fact_is_lost() {
        let a = ExprDomain::top().add(s(1), Expr::int(1));
        let b = ExprDomain::top();
        let (joined, weaker) = a.join(&b, true);
        assert!(weaker);
        assert!(joined.is_top());
    }

    #[test]
    fn test_join_with_bottom() {
        let a = ExprDomain::top().add(s(1), Expr::int(1));
        let (joined, weaker) = ExprDomain::bottom().join(&a, false);
        assert!(weaker);
        assert_eq!(joined, a);

        let (joined, weaker) = a.join(&ExprDomain::bottom(), false);
        assert!(!weaker);
        assert_eq!(joined, a);
    }

    #[test]
    fn test_order() {
        let a = ExprDomain::top().add(s(1), Expr::int(1)).add(s(2), Expr::int(2));
        let b = ExprDomain::top().add(s(1), Expr::int(1));
        assert!(a.le(&b));
        assert!(!b.le(&a));
        assert!(ExprDomain::bottom().le(&b));
        assert!(a.le(&ExprDomain::top()));
        assert_eq!(b.meet(&a), a);
        assert!(a.meet(&ExprDomain::bottom()).is_bottom());

        let conflicting = ExprDomain::top().add(s(1), Expr::int(9));
        assert!(a.meet(&conflicting).is_bottom());
    }

    #[test]
    fn test_expr_domain_lattice_axioms() {
        use crate::domain::tests::test_lattice_axioms;

        let samples = vec![
            ExprDomain::bottom(),
            ExprDomain::top(),
            ExprDomain::top().add(s(1), Expr::int(1)),
            ExprDomain::top().add(s(1), Expr::int(2)),
            ExprDomain::top().add(s(1), Expr::int(1)).add(s(2), add(1, 3)),
            ExprDomain::top().add(s(2), add(1, 3)),
        ];
        test_lattice_axioms(&samples);
    }

    #[test]
    fn test_reachability() {
        // s1 = s2 + s3, s2 = s4 + s5
        let d = ExprDomain::top().add(s(1), add(2, 3)).add(s(2), add(4, 5));
        assert!(d.is_reachable_from(s(1), &s(4)));
        assert!(!d.is_reachable_from(s(2), &s(3)));
        assert!(!d.is_reachable_from(s(4), &s(1)));
    }

    #[test]
    fn test_rename_swap() {
        // s3 = s1 - s2; swap s1 and s2 across the edge
        let d = ExprDomain::top().add(s(3), Expr::binary(BinaryOperator::Sub, s(1), s(2)));
        let renaming = Renaming::new().with(s(1), s(2)).with(s(2), s(1)).with(s(3), s(3));
        let renamed = d.rename(&renaming);
        assert_eq!(
            renamed.get(&s(3)),
            FlatDomain::Normal(Expr::binary(BinaryOperator::Sub, s(2), s(1)))
        );
    }

    #[test]
    fn test_rename_fan_out() {
        let d = ExprDomain::top().add(s(1), Expr::int(7));
        let renaming = Renaming::new().with(s(1), s(10)).with(s(1), s(11));
        let renamed = d.rename(&renaming);
        assert_eq!(renamed.as_constant(&s(10)), Some(7));
        assert_eq!(renamed.as_constant(&s(11)), Some(7));
        assert_eq!(renamed.get(&s(1)), FlatDomain::Top);
    }

    #[test]
    fn test_rename_drops_dead_operands() {
        // s2 = s1 + s1, but s1 does not survive the edge
        let d = ExprDomain::top().add(s(2), add(1, 1)).add(s(3), Expr::int(1));
        let renaming = Renaming::new().with(s(2), s(20)).with(s(3), s(30));
        let renamed = d.rename(&renaming);
        assert_eq!(renamed.get(&s(20)), FlatDomain::Top);
        assert_eq!(renamed.as_constant(&s(30)), Some(1));
    }

    #[test]
    fn test_resolve() {
        let d = ExprDomain::top()
            .add(s(1), add(2, 3))
            .add(s(2), Expr::int(4))
            .add(s(3), Expr::int(5));
        assert_eq!(d.resolve(s(1), 8).to_string(), "(4:int64 + 5:int64)");
        assert_eq!(d.resolve(s(1), 1).to_string(), "(s2 + s3)");
        assert_eq!(d.resolve(s(1), 0), ExprTree::Leaf(s(1)));
        assert_eq!(d.resolve(s(9), 3), ExprTree::Leaf(s(9)));
    }

    #[test]
    fn test_display() {
        let d = ExprDomain::top().add(s(1), add(2, 3));
        assert_eq!(d.to_string(), "{s1 = (s2 + s3)}");
        assert_eq!(ExprDomain::bottom().to_string(), "⊥");
    }
}
