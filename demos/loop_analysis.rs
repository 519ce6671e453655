use clap::Parser;

use absint_rs::cfg::{ControlFlowGraph, MethodBody};
use absint_rs::config::AnalysisConfig;
use absint_rs::decoder::{AssumeTag, Op};
use absint_rs::domain::Lattice;
use absint_rs::expr::{BinaryOperator, SymbolicValue};
use absint_rs::fixpoint::{Analysis, ExprAnalysis, FixpointEngine};
use absint_rs::interval::Interval;
use absint_rs::numeric::NumericEvaluator;
use absint_rs::polynomial::Polynomial;
use absint_rs::rational::Rational;
use absint_rs::rename::Renaming;
use absint_rs::threshold::RationalThreshold;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Loop bound `n` in `while i < n`.
    #[arg(value_name = "INT", default_value = "10")]
    bound: i64,

    /// Plain joins at the loop head before widening.
    #[clap(long, value_name = "INT", default_value = "3")]
    widening_delay: usize,

    /// Give up after this many point visits.
    #[clap(long, value_name = "INT", default_value = "1000")]
    max_iterations: usize,

    /// Widen with landmarks collected from the program constants.
    #[clap(long)]
    thresholds: bool,

    /// Log fixpoint progress.
    #[clap(long)]
    verbose: bool,
}

const I0: SymbolicValue = SymbolicValue::new(1);
const N: SymbolicValue = SymbolicValue::new(2);
const I: SymbolicValue = SymbolicValue::new(3);
const COND: SymbolicValue = SymbolicValue::new(4);
const ONE: SymbolicValue = SymbolicValue::new(5);
const I2: SymbolicValue = SymbolicValue::new(6);

/// `i := 0; n := bound; while i < n { i := i + 1 }`
fn build(bound: i64) -> MethodBody {
    let mut body = MethodBody::new();
    let init = body.add_block(vec![Op::load_int(I0, 0), Op::load_int(N, bound)]);
    let head = body.add_block(vec![Op::binary(BinaryOperator::Clt, COND, I, N)]);
    let step = body.add_block(vec![
        Op::Assume {
            tag: AssumeTag::True,
            cond: COND,
        },
        Op::load_int(ONE, 1),
        Op::binary(BinaryOperator::Add, I2, I, ONE),
    ]);
    let exit = body.add_block(vec![Op::Assume {
        tag: AssumeTag::False,
        cond: COND,
    }]);

    body.add_edge_with(init, head, Renaming::new().with(I0, I).with(N, N));
    body.add_edge_with(head, step, Renaming::identity([I, N, COND]));
    body.add_edge_with(step, head, Renaming::new().with(I2, I).with(N, N));
    body.add_edge_with(head, exit, Renaming::identity([I, N, COND]));
    body
}

/// Range of the loop counter, with the guard applied inside the blocks.
struct CounterRange {
    bound: i64,
}

impl Analysis<usize> for CounterRange {
    type State = Interval;

    fn entry_state(&self) -> Interval {
        Interval::top()
    }

    fn bottom(&self) -> Interval {
        Interval::bottom()
    }

    fn is_bottom(&self, state: &Interval) -> bool {
        state.is_bottom()
    }

    fn transfer(&self, point: usize, pre: &Interval) -> Interval {
        let below = Interval::new(Rational::minus_infinity(), Rational::from(self.bound.saturating_sub(1)));
        let above = Interval::new(Rational::from(self.bound), Rational::plus_infinity());
        match point {
            0 => Interval::of(0, 0),
            2 => pre.meet(&below).add(&Interval::of(1, 1)),
            3 => pre.meet(&above),
            _ => pre.clone(),
        }
    }

    fn convert_edge(&self, _from: usize, _to: usize, post: &Interval) -> Interval {
        post.clone()
    }

    fn join(&self, acc: &Interval, incoming: &Interval, widen: bool) -> (Interval, bool) {
        let joined = if widen { acc.widen(incoming) } else { acc.join(incoming) };
        let changed = !joined.le(acc);
        (joined, changed)
    }

    fn widen_with(&self, acc: &Interval, incoming: &Interval, thresholds: &RationalThreshold) -> (Interval, bool) {
        let widened = acc.widen_with(incoming, thresholds);
        let changed = !widened.le(acc);
        (widened, changed)
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();
    println!("args = {:?}", args);

    let body = build(args.bound);
    let mut config = AnalysisConfig::default()
        .with_widening_delay(args.widening_delay)
        .with_max_iterations(args.max_iterations);
    if args.thresholds {
        config = config.with_thresholds(RationalThreshold::from_constants(body.int_constants()));
    }
    let engine = FixpointEngine::new(&config);

    println!("\n=== Symbolic facts ===");
    let result = ExprAnalysis::new(&body).run(&engine)?;
    println!("converged after {} iterations", result.iterations());
    let evaluator = NumericEvaluator::from(&config);
    for point in 0..body.len() {
        if let Some(state) = result.pre_state(&point) {
            println!("block {} pre:  {}", point, state);
        }
        if let Some(state) = result.post_state(&point) {
            println!("block {} post: {}", point, state);
        }
    }

    let exit = 3;
    if let Some(state) = result.pre_state(&exit) {
        println!("n at exit = {}", evaluator.interval_of(state, N));
        if let Some(guard) = Polynomial::from_condition(state, COND) {
            println!("guard: {}", guard);
            if let Some((v, range)) = guard.as_interval_constraint() {
                println!("guard holds when {} in {}", v, range);
            }
        }
    }

    println!("\n=== Counter range ===");
    let counter = CounterRange { bound: args.bound };
    let ranges = engine.run(&body, &counter)?;
    println!("converged after {} iterations", ranges.iterations());
    let head = 1;
    for point in [body.entry(), head, exit] {
        if let Some(range) = ranges.pre_state(&point) {
            println!("i before block {} in {}", point, range);
        }
    }
    if let Some(range) = ranges.post_state(&exit) {
        println!("i after the loop in {}", range);
    }

    println!("\nTotal time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
