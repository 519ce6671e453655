//! # absint-rs: symbolic abstract interpretation in Rust
//!
//! **`absint-rs`** is an abstract-interpretation core for inferring program
//! invariants. For every program point it tracks *how* each symbolic value
//! was computed, and it ships a family of exact numeric domains for
//! reasoning about ranges.
//!
//! ## Key Features
//!
//! - **Symbolic environments**: [`ExprDomain`][crate::expr_domain::ExprDomain] maps
//!   symbolic values to single-level expressions. Environments are persistent
//!   and share storage between snapshots.
//! - **Congruence refinement**: assumed and asserted equalities copy known
//!   facts across, guarded against cyclic substitutions
//!   (see [`decoder`]).
//! - **Generic fixpoint driver**: [`FixpointEngine`][crate::fixpoint::FixpointEngine]
//!   iterates any [`Analysis`][crate::fixpoint::Analysis] over any
//!   [`ControlFlowGraph`][crate::cfg::ControlFlowGraph], widening at loop heads.
//! - **Exact numerics**: [`Rational`][crate::rational::Rational] with `±∞`,
//!   [`Interval`][crate::interval::Interval], [`DisInterval`][crate::disinterval::DisInterval],
//!   linear [`Polynomial`][crate::polynomial::Polynomial] constraints and widening thresholds.
//!
//! ## Basic Usage
//!
//! ```rust
//! use absint_rs::decoder::{AssumeTag, ExprDecoder, Op, TransferFunction};
//! use absint_rs::expr::{BinaryOperator, SymbolicValue};
//! use absint_rs::expr_domain::ExprDomain;
//!
//! let (x, c7, cond) = (SymbolicValue::new(1), SymbolicValue::new(2), SymbolicValue::new(3));
//! let decoder = ExprDecoder::new();
//!
//! // c7 := 7; cond := x == c7; assume cond
//! let ops = [
//!     Op::load_int(c7, 7),
//!     Op::binary(BinaryOperator::Ceq, cond, x, c7),
//!     Op::Assume { tag: AssumeTag::True, cond },
//! ];
//! let state = ops.iter().fold(ExprDomain::top(), |s, op| decoder.apply(&s, op));
//!
//! // The equality taught us the value of x
//! assert_eq!(state.as_constant(&x), Some(7));
//! ```
//!
//! ## Core Components
//!
//! - **[`expr`]** and **[`expr_domain`]**: symbolic expressions and their environment.
//! - **[`decoder`]**: abstract semantics of primitive operations.
//! - **[`fixpoint`]** and **[`cfg`]**: the worklist driver and its graph interface.
//! - **[`rational`]**, **[`interval`]**, **[`disinterval`]**, **[`threshold`]**,
//!   **[`polynomial`]**, **[`numeric`]**: numeric domains and evaluation.

pub mod cfg;
pub mod config;
pub mod decoder;
pub mod disinterval;
pub mod domain;
pub mod error;
pub mod expr;
pub mod expr_domain;
pub mod fixpoint;
pub mod flat;
pub mod graph;
pub mod interval;
pub mod numeric;
pub mod polynomial;
pub mod rational;
pub mod rename;
pub mod threshold;
