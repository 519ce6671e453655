//! Worklist fixpoint computation with widening at loop heads.
//!
//! The driver is generic over the control-flow graph ([`ControlFlowGraph`])
//! and over the analysis ([`Analysis`]). Points are visited in reverse
//! postorder. The state before each point accumulates the joins of the
//! converted post-states of its predecessors; at loop heads (targets of
//! back-edges of a depth-first traversal) the first `widening_delay`
//! updates are plain joins and later updates widen. Iteration stops when
//! no pre-state changes any more.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, warn};

use crate::cfg::{ControlFlowGraph, Program};
use crate::config::AnalysisConfig;
use crate::decoder::{ExprDecoder, TransferFunction};
use crate::error::FixpointError;
use crate::expr_domain::ExprDomain;
use crate::graph::descendants;
use crate::threshold::RationalThreshold;

/// Forward dataflow analysis over points of type `P`.
pub trait Analysis<P> {
    type State: Clone + Debug;

    /// State at the entry point.
    fn entry_state(&self) -> Self::State;

    fn bottom(&self) -> Self::State;

    fn is_bottom(&self, state: &Self::State) -> bool;

    /// Post-state of `point` given its pre-state.
    fn transfer(&self, point: P, pre: &Self::State) -> Self::State;

    /// State flowing along the edge `from → to`.
    fn convert_edge(&self, from: P, to: P, post: &Self::State) -> Self::State;

    /// `acc ⊔ incoming` (or `acc ∇ incoming` when `widen` is set), and
    /// whether the result is strictly weaker than `acc`.
    fn join(&self, acc: &Self::State, incoming: &Self::State, widen: bool) -> (Self::State, bool);

    /// Widening step at a loop head, given the engine's landmark catalog.
    ///
    /// Defaults to `join` with `widen` set, ignoring the landmarks.
    fn widen_with(
        &self,
        acc: &Self::State,
        incoming: &Self::State,
        _thresholds: &RationalThreshold,
    ) -> (Self::State, bool) {
        self.join(acc, incoming, true)
    }
}

/// Pre- and post-states of every visited point.
#[derive(Debug, Clone)]
pub struct FixpointResult<P, S> {
    pre: HashMap<P, S>,
    post: HashMap<P, S>,
    iterations: usize,
}

impl<P: Eq + Hash, S> FixpointResult<P, S> {
    pub fn pre_state(&self, point: &P) -> Option<&S> {
        self.pre.get(point)
    }

    pub fn post_state(&self, point: &P) -> Option<&S> {
        self.post.get(point)
    }

    /// Number of point visits until stabilization.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn points(&self) -> impl Iterator<Item = &P> {
        self.pre.keys()
    }
}

/// Depth-first numbering of the points reachable from the entry.
struct Ordering<P> {
    /// Reverse-postorder index of each point.
    rpo: HashMap<P, usize>,
    /// Points in reverse postorder.
    points: Vec<P>,
    loop_heads: HashSet<P>,
    /// Points flagged unreachable anywhere below the entry.
    unreachable: Vec<P>,
}

impl<P: Copy + Eq + Hash> Ordering<P> {
    fn compute<G>(graph: &G) -> Self
    where
        G: ControlFlowGraph<Point = P>,
    {
        let entry = graph.entry();
        let mut postorder = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut loop_heads = HashSet::new();

        // Explicit stack of (point, successors, next successor index)
        let mut stack = vec![(entry, graph.successors(entry), 0)];
        visited.insert(entry);
        on_stack.insert(entry);

        while let Some((point, successors, index)) = stack.last_mut() {
            if let Some(&next) = successors.get(*index) {
                *index += 1;
                if graph.is_unreachable(next) {
                    continue;
                }
                if on_stack.contains(&next) {
                    loop_heads.insert(next);
                } else if visited.insert(next) {
                    on_stack.insert(next);
                    let next_successors = graph.successors(next);
                    stack.push((next, next_successors, 0));
                }
            } else {
                let point = *point;
                on_stack.remove(&point);
                postorder.push(point);
                stack.pop();
            }
        }

        postorder.reverse();
        let rpo = postorder.iter().enumerate().map(|(i, p)| (*p, i)).collect();

        // The walk above stops at unreachable points; look past them on the raw graph
        let raw = |p: &P| graph.successors(*p);
        let unreachable = descendants(&raw, [entry])
            .into_iter()
            .filter(|p| graph.is_unreachable(*p))
            .collect();

        Ordering {
            rpo,
            points: postorder,
            loop_heads,
            unreachable,
        }
    }
}

/// Fixpoint engine over control-flow graphs.
#[derive(Debug, Clone)]
pub struct FixpointEngine {
    pub widening_delay: usize,
    pub max_iterations: usize,
    /// Landmarks handed to [`Analysis::widen_with`].
    pub thresholds: RationalThreshold,
}

impl Default for FixpointEngine {
    fn default() -> Self {
        FixpointEngine::new(&AnalysisConfig::default())
    }
}

impl FixpointEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            widening_delay: config.widening_delay,
            max_iterations: config.max_iterations,
            thresholds: config.thresholds.clone(),
        }
    }

    /// Runs `analysis` over `graph` until every pre-state is stable.
    pub fn run<G, A>(&self, graph: &G, analysis: &A) -> Result<FixpointResult<G::Point, A::State>, FixpointError>
    where
        G: ControlFlowGraph,
        A: Analysis<G::Point>,
    {
        let entry = graph.entry();
        let mut pre: HashMap<G::Point, A::State> = HashMap::new();
        let mut post: HashMap<G::Point, A::State> = HashMap::new();

        if graph.is_unreachable(entry) {
            debug!("Entry point {:?} is unreachable", entry);
            pre.insert(entry, analysis.bottom());
            post.insert(entry, analysis.bottom());
            return Ok(FixpointResult {
                pre,
                post,
                iterations: 0,
            });
        }

        let order = Ordering::compute(graph);
        debug!(
            "Fixpoint over {} points, {} loop heads, {} unreachable",
            order.points.len(),
            order.loop_heads.len(),
            order.unreachable.len()
        );
        for &point in &order.unreachable {
            pre.insert(point, analysis.bottom());
            post.insert(point, analysis.bottom());
        }

        let mut updates: HashMap<G::Point, usize> = HashMap::new();
        let mut worklist = BTreeSet::new();
        pre.insert(entry, analysis.entry_state());
        worklist.insert(0);

        let mut iterations = 0;
        while let Some(index) = worklist.pop_first() {
            iterations += 1;
            if iterations > self.max_iterations {
                warn!(
                    "Fixpoint computation did not converge after {} iterations",
                    self.max_iterations
                );
                return Err(FixpointError::IterationLimit {
                    limit: self.max_iterations,
                });
            }

            let point = order.points[index];
            let Some(state) = pre.get(&point) else {
                continue;
            };
            let out = analysis.transfer(point, state);

            if !analysis.is_bottom(&out) {
                for next in graph.successors(point) {
                    if graph.is_unreachable(next) {
                        continue;
                    }
                    let incoming = analysis.convert_edge(point, next, &out);
                    if analysis.is_bottom(&incoming) {
                        continue;
                    }

                    let changed = match pre.get(&next) {
                        None => {
                            pre.insert(next, incoming);
                            true
                        }
                        Some(acc) => {
                            let count = updates.entry(next).or_insert(0);
                            let widen = order.loop_heads.contains(&next) && *count >= self.widening_delay;
                            if widen && *count == self.widening_delay {
                                debug!("Widening at {:?}", next);
                            }
                            let (joined, changed) = if widen {
                                analysis.widen_with(acc, &incoming, &self.thresholds)
                            } else {
                                analysis.join(acc, &incoming, false)
                            };
                            if changed {
                                *count += 1;
                                pre.insert(next, joined);
                            }
                            changed
                        }
                    };

                    if changed {
                        if let Some(&i) = order.rpo.get(&next) {
                            worklist.insert(i);
                        }
                    }
                }
            }

            post.insert(point, out);
        }

        debug!("Fixpoint converged after {} iterations", iterations);
        Ok(FixpointResult { pre, post, iterations })
    }
}

/// Symbolic-expression analysis of a [`Program`].
pub struct ExprAnalysis<'a, P> {
    program: &'a P,
    decoder: ExprDecoder,
}

impl<'a, P: Program> ExprAnalysis<'a, P> {
    pub fn new(program: &'a P) -> Self {
        ExprAnalysis {
            program,
            decoder: ExprDecoder::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: ExprDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Runs the analysis with `engine`.
    pub fn run(&self, engine: &FixpointEngine) -> Result<FixpointResult<P::Point, ExprDomain>, FixpointError> {
        engine.run(self.program, self)
    }
}

impl<'a, P: Program> Analysis<P::Point> for ExprAnalysis<'a, P> {
    type State = ExprDomain;

    fn entry_state(&self) -> ExprDomain {
        ExprDomain::top()
    }

    fn bottom(&self) -> ExprDomain {
        ExprDomain::bottom()
    }

    fn is_bottom(&self, state: &ExprDomain) -> bool {
        state.is_bottom()
    }

    fn transfer(&self, point: P::Point, pre: &ExprDomain) -> ExprDomain {
        self.program
            .ops(point)
            .iter()
            .fold(pre.clone(), |state, op| self.decoder.apply(&state, op))
    }

    fn convert_edge(&self, from: P::Point, to: P::Point, post: &ExprDomain) -> ExprDomain {
        match self.program.renaming(from, to) {
            Some(renaming) => post.rename(renaming),
            None => post.clone(),
        }
    }

    fn join(&self, acc: &ExprDomain, incoming: &ExprDomain, widen: bool) -> (ExprDomain, bool) {
        acc.join(incoming, widen)
    }
}
