//! Solving sessions
//!
//! A [`Solver`] owns everything one constraint problem needs: the domain
//! store (variable arena, candidate sets, alias map), the asserted
//! constraints, and the deferred constraints collected from them.
//!
//! # Evaluation
//!
//! [`Solver::check`] runs two phases:
//!
//! 1. **Eager**: constraints asserted since the last check are evaluated in
//!    order. Equalities, negations, conjunctions and disjunctions narrow the
//!    store immediately. Conditionals and implications are set aside.
//! 2. **Deferred**: the set-aside constraints (plus any sort restrictions
//!    created by declarations) are scheduled by the configured
//!    [`Tactic`]. This phase is re-run in full on every check.
//!
//! An `Unsat` outcome is sticky: the store may have been partially narrowed
//! by the failing constraint, so the session keeps answering `Unsat`.
//!
//! Sessions are single-threaded and independent of each other. Scoped
//! save/restore (`push`/`pop`) is not supported.

mod eval;
mod tactics;
mod types;

pub use eval::{Evaluator, Mode};
pub use tactics::{tactic_for, ReorderTactic, SimpleTactic, Tactic, TwoPassTactic};
pub use types::{SolverOptions, SolverStats, TacticKind};

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{SolverError, SolverResult};
use crate::expr::{Expr, Sort, Value, Variable};
use crate::id::VarId;
use crate::model::Model;
use crate::sat::Satisfiability;
use crate::store::DomainStore;

pub struct Solver {
    options: SolverOptions,
    store: DomainStore,
    /// User constraints in assertion order
    constraints: Vec<Expr>,
    /// Index of the first constraint not yet evaluated eagerly
    eager_cursor: usize,
    /// Constraints for the deferred phase
    deferred: Vec<Expr>,
    /// Variables (and representatives) narrowed by an evaluated constraint
    visited: HashSet<VarId>,
    result: Satisfiability,
    failed: bool,
    stats: SolverStats,
}

macro_rules! phase {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

impl Solver {
    pub fn new(domain: Rc<Sort>) -> Self {
        Self::with_options(domain, SolverOptions::default())
    }

    pub fn with_options(domain: Rc<Sort>, options: SolverOptions) -> Self {
        Self {
            options,
            store: DomainStore::new(domain),
            constraints: Vec::new(),
            eager_cursor: 0,
            deferred: Vec::new(),
            visited: HashSet::new(),
            result: Satisfiability::Unknown,
            failed: false,
            stats: SolverStats::default(),
        }
    }

    pub fn domain(&self) -> &Rc<Sort> {
        self.store.domain()
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn constraints(&self) -> &[Expr] {
        &self.constraints
    }

    /// Switch the deferred-phase tactic. The next check re-runs that phase.
    pub fn set_tactic(&mut self, tactic: TacticKind) {
        self.options.tactic = tactic;
        if !self.failed {
            self.result = Satisfiability::Unknown;
        }
    }

    /// Declare a variable. Idempotent.
    ///
    /// A variable whose sort lacks some Domain values gets a deferred
    /// constraint excluding them.
    pub fn declare(&mut self, var: &Variable) {
        let declared = self.store.declare(var);
        if let Some(exclusion) = declared.sort_exclusion {
            debug!(var = %var, sort = %var.sort(), "restricting variable to its sort");
            self.deferred.push(exclusion);
            if !self.failed {
                self.result = Satisfiability::Unknown;
            }
        }
    }

    /// Append a constraint, declaring any new variables it mentions.
    pub fn assert(&mut self, expr: Expr) {
        for var in expr.variables() {
            self.declare(&var);
        }
        debug!(constraint = %expr, "assert");
        self.constraints.push(expr);
        if !self.failed {
            self.result = Satisfiability::Unknown;
        }
    }

    pub fn assert_all(&mut self, exprs: impl IntoIterator<Item = Expr>) {
        for expr in exprs {
            self.assert(expr);
        }
    }

    /// Evaluate pending constraints and report satisfiability.
    ///
    /// Cached until the next assertion.
    pub fn check(&mut self) -> SolverResult<Satisfiability> {
        if self.failed {
            return Ok(Satisfiability::Unsat);
        }
        if self.result != Satisfiability::Unknown {
            return Ok(self.result);
        }
        self.stats.checks += 1;
        let debug_flag = self.options.debug;

        let mut eval = Evaluator::new(&mut self.store, &mut self.visited, &mut self.stats);

        let pending = self.constraints.len() - self.eager_cursor;
        phase!(debug_flag, pending, "eager phase");
        while self.eager_cursor < self.constraints.len() {
            let constraint = &self.constraints[self.eager_cursor];
            let res = eval.evaluate(constraint)?;
            eval.stats().eager_evaluated += 1;
            self.deferred.extend(eval.take_raised());
            self.eager_cursor += 1;
            if res.is_unsat() {
                phase!(debug_flag, constraint = %constraint, "eager phase: unsat");
                self.failed = true;
                self.result = Satisfiability::Unsat;
                return Ok(Satisfiability::Unsat);
            }
        }

        let mut tactic = tactic_for(self.options.tactic);
        phase!(
            debug_flag,
            deferred = self.deferred.len(),
            tactic = tactic.name(),
            "deferred phase"
        );
        let res = tactic.run(&mut eval, &self.deferred)?;
        if res.is_unsat() {
            self.failed = true;
        }
        self.result = res;
        phase!(debug_flag, result = %res, "check finished");
        Ok(res)
    }

    /// Evaluate if needed and snapshot the candidate values of every
    /// declared variable.
    pub fn model(&mut self) -> SolverResult<Model> {
        let sat = self.check()?;
        let vars: Vec<Variable> = self.store.variables().cloned().collect();
        let mut entries = IndexMap::with_capacity(vars.len());
        for var in vars {
            let values = self.store.values_of(&var)?;
            entries.insert(var, values);
        }
        Ok(Model::new(sat, entries))
    }

    /// Candidate values of one variable, or `None` if undeclared.
    pub fn values_of(&mut self, var: &Variable) -> SolverResult<Option<BTreeSet<Value>>> {
        if self.store.id_of(var).is_none() {
            return Ok(None);
        }
        self.check()?;
        self.store.values_of(var).map(Some)
    }

    /// One s-expression per asserted constraint, newline separated.
    pub fn serialize(&self) -> String {
        self.constraints
            .iter()
            .map(crate::pretty::to_smt2)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A complete script that recreates this session.
    pub fn to_script(&self) -> String {
        crate::pretty::script(self.domain(), self.store.variables(), &self.constraints)
    }

    pub fn push(&mut self) -> SolverResult<()> {
        Err(SolverError::UnsupportedOperation("push"))
    }

    pub fn pop(&mut self) -> SolverResult<()> {
        Err(SolverError::UnsupportedOperation("pop"))
    }

    pub fn dump_constraints(&self) -> String {
        self.constraints.iter().map(|c| format!("{}\n", c)).collect()
    }

    pub fn dump_deferred(&self) -> String {
        self.deferred.iter().map(|c| format!("{}\n", c)).collect()
    }

    pub fn dump_aliases(&self) -> String {
        self.store.dump_aliases()
    }

    pub fn dump_variables(&self) -> String {
        self.store.dump_variables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any() -> Rc<Sort> {
        Rc::new(Sort::new("Any", ["Int", "Pointer", "PointerOffset"].map(Value::new)))
    }

    fn names(solver: &mut Solver, var: &Variable) -> Vec<String> {
        solver
            .values_of(var)
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    #[test]
    fn test_check_caches_until_assert() {
        let domain = any();
        let x = Variable::new("x", domain.clone());
        let mut solver = Solver::new(domain);
        solver.assert(Expr::eq(&x, Value::new("Int")));
        assert_eq!(solver.check().unwrap(), Satisfiability::Sat);
        assert_eq!(solver.stats().checks, 1);
        assert_eq!(solver.check().unwrap(), Satisfiability::Sat);
        assert_eq!(solver.stats().checks, 1);

        solver.assert(Expr::neq(&x, Value::new("Pointer")));
        assert_eq!(solver.check().unwrap(), Satisfiability::Sat);
        assert_eq!(solver.stats().checks, 2);
        // Only the new constraint ran eagerly
        assert_eq!(solver.stats().eager_evaluated, 2);
    }

    #[test]
    fn test_unsat_is_sticky() {
        let domain = any();
        let x = Variable::new("x", domain.clone());
        let mut solver = Solver::new(domain);
        solver.assert(Expr::eq(&x, Value::new("Int")));
        solver.assert(Expr::eq(&x, Value::new("Pointer")));
        assert_eq!(solver.check().unwrap(), Satisfiability::Unsat);
        solver.assert(Expr::True);
        assert_eq!(solver.check().unwrap(), Satisfiability::Unsat);
        assert_eq!(solver.stats().checks, 1);
    }

    #[test]
    fn test_sort_restriction_is_deferred() {
        let domain = any();
        let ints = Rc::new(Sort::new("Ints", [Value::new("Int")]));
        let w = Variable::new("w", ints);
        let mut solver = Solver::new(domain);
        solver.declare(&w);
        assert_eq!(solver.dump_deferred(), "And(Not(Eq(w, Pointer)), Not(Eq(w, PointerOffset)))\n");
        assert_eq!(names(&mut solver, &w), vec!["Int"]);
    }

    #[test]
    fn test_push_pop_unsupported() {
        let mut solver = Solver::new(any());
        assert_eq!(solver.push(), Err(SolverError::UnsupportedOperation("push")));
        assert_eq!(solver.pop(), Err(SolverError::UnsupportedOperation("pop")));
    }

    #[test]
    fn test_two_pass_rejects_conditional() {
        let domain = any();
        let x = Variable::new("x", domain.clone());
        let opts = SolverOptions::new().with_tactic(TacticKind::SimpleTwoPass);
        let mut solver = Solver::with_options(domain, opts);
        solver.assert(Expr::ite(
            Expr::eq(&x, Value::new("Int")),
            Expr::True,
            Expr::Terminate,
        ));
        assert!(matches!(solver.check(), Err(SolverError::UnhandledCase(_))));
    }

    #[test]
    fn test_nested_conditional_is_raised_during_deferred_phase() {
        let domain = any();
        let x = Variable::new("x", domain.clone());
        let y = Variable::new("y", domain.clone());
        let mut solver = Solver::new(domain);
        solver.assert(Expr::eq(&x, Value::new("Int")));
        solver.assert(Expr::implies(
            Expr::eq(&x, Value::new("Int")),
            Expr::ite(Expr::eq(&x, Value::new("Int")), Expr::eq(&y, Value::new("Pointer")), Expr::Terminate),
        ));
        assert_eq!(solver.check().unwrap(), Satisfiability::Sat);
        assert_eq!(names(&mut solver, &y), vec!["Pointer"]);
        // Nested conditionals are not persisted
        assert_eq!(solver.dump_deferred().lines().count(), 1);
    }
}
