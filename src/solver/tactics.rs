//! Scheduling tactics for the deferred phase.
//!
//! A tactic receives the deferred constraints in assertion order and decides
//! when each one is handed to the evaluator. Evaluating a constraint may
//! raise further deferred constraints (a conditional nested in a branch);
//! those join the tactic's work queue for the current run only.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::error::{SolverError, SolverResult};
use crate::expr::Expr;
use crate::sat::Satisfiability;

use super::eval::Evaluator;
use super::types::TacticKind;

/// A deferred-phase scheduling strategy
pub trait Tactic {
    /// Evaluate `constraints`, stopping at the first `Unsat`.
    fn run(&mut self, eval: &mut Evaluator<'_>, constraints: &[Expr]) -> SolverResult<Satisfiability>;

    /// Human-readable name for this tactic
    fn name(&self) -> &str;
}

/// Build the tactic for `kind`.
pub fn tactic_for(kind: TacticKind) -> Box<dyn Tactic> {
    match kind {
        TacticKind::Simple => Box::new(SimpleTactic),
        TacticKind::SimpleTwoPass => Box::new(TwoPassTactic),
        TacticKind::WithReorder => Box::new(ReorderTactic),
    }
}

// ============================================================================
// BUILT-IN TACTICS
// ============================================================================

/// One pass in assertion order.
pub struct SimpleTactic;

impl SimpleTactic {
    fn pass(
        eval: &mut Evaluator<'_>,
        constraints: &[Expr],
        reject_conditionals: bool,
    ) -> SolverResult<Satisfiability> {
        let mut queue: VecDeque<Expr> = constraints.iter().cloned().collect();
        while let Some(item) = queue.pop_front() {
            if reject_conditionals && matches!(item, Expr::Ite(..)) {
                return Err(SolverError::UnhandledCase(format!(
                    "conditional {} is not supported by the two-pass tactic",
                    item
                )));
            }
            if eval.evaluate_deferred(&item)?.is_unsat() {
                return Ok(Satisfiability::Unsat);
            }
            queue.extend(eval.take_raised());
        }
        Ok(Satisfiability::Sat)
    }
}

impl Tactic for SimpleTactic {
    fn run(&mut self, eval: &mut Evaluator<'_>, constraints: &[Expr]) -> SolverResult<Satisfiability> {
        Self::pass(eval, constraints, false)
    }

    fn name(&self) -> &str {
        "simple"
    }
}

/// Two simple passes. The second pass picks up antecedents established by
/// constraints that come later in assertion order.
///
/// Re-running a conditional could apply a different branch the second time,
/// so conditionals are rejected outright.
pub struct TwoPassTactic;

impl Tactic for TwoPassTactic {
    fn run(&mut self, eval: &mut Evaluator<'_>, constraints: &[Expr]) -> SolverResult<Satisfiability> {
        for pass in 1..=2 {
            trace!(pass, "two-pass tactic");
            if SimpleTactic::pass(eval, constraints, true)?.is_unsat() {
                return Ok(Satisfiability::Unsat);
            }
        }
        Ok(Satisfiability::Sat)
    }

    fn name(&self) -> &str {
        "two-pass"
    }
}

/// Evaluate constraints once their condition variables are settled.
///
/// Unconditional constraints go first. The rest cycle through a queue: a
/// constraint whose condition variables have all been visited is
/// evaluated, anything else goes to the back. After a full round without
/// progress the remaining constraints are forced in queue order, so the
/// phase always terminates.
pub struct ReorderTactic;

impl Tactic for ReorderTactic {
    fn run(&mut self, eval: &mut Evaluator<'_>, constraints: &[Expr]) -> SolverResult<Satisfiability> {
        let mut queue = VecDeque::new();
        for item in constraints {
            if item.condition_variables().is_empty() {
                if eval.evaluate_deferred(item)?.is_unsat() {
                    return Ok(Satisfiability::Unsat);
                }
                queue.extend(eval.take_raised());
            } else {
                queue.push_back(item.clone());
            }
        }

        let mut budget = queue.len();
        while let Some(item) = queue.pop_front() {
            if eval.is_ready(&item)? {
                if eval.evaluate_deferred(&item)?.is_unsat() {
                    return Ok(Satisfiability::Unsat);
                }
                queue.extend(eval.take_raised());
                budget = queue.len();
            } else if budget > 0 {
                budget -= 1;
                eval.stats().reorder_skips += 1;
                queue.push_back(item);
            } else {
                queue.push_front(item);
                debug!(remaining = queue.len(), "reorder: no progress, forcing remaining constraints");
                return Self::force(eval, queue);
            }
        }
        Ok(Satisfiability::Sat)
    }

    fn name(&self) -> &str {
        "reorder"
    }
}

impl ReorderTactic {
    fn force(eval: &mut Evaluator<'_>, mut queue: VecDeque<Expr>) -> SolverResult<Satisfiability> {
        while let Some(item) = queue.pop_front() {
            eval.stats().forced += 1;
            if eval.evaluate_deferred(&item)?.is_unsat() {
                return Ok(Satisfiability::Unsat);
            }
            queue.extend(eval.take_raised());
        }
        Ok(Satisfiability::Sat)
    }
}
