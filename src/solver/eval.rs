//! Expression evaluation against the domain store.
//!
//! Eager evaluation maps each expression kind onto store operations. The
//! deferred forms (`ite`, `=>`) are collected instead of evaluated; a
//! [`Tactic`](super::Tactic) later hands them back through
//! [`Evaluator::evaluate_deferred`].
//!
//! Conditions are decided without touching the store, in one of two modes:
//!
//! - [`Mode::Possible`]: the condition is consistent with the candidates
//! - [`Mode::Certain`]: every remaining assignment satisfies the condition
//!
//! `x != c` holds in both modes exactly when `c` is no longer a candidate
//! of `x`. In `Certain` mode a conjunction or disjunction over a single
//! class is decided on that class's whole candidate set, so `x = a or x = b`
//! is certain once `x` is narrowed to `{a, b}`.
//!
//! `ite` selects its branch with `Possible`. An implication only fires when
//! its antecedent is `Certain`; otherwise it is vacuously satisfied and
//! applies nothing.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{SolverError, SolverResult};
use crate::expr::{Expr, Term, Variable};
use crate::id::VarId;
use crate::sat::Satisfiability;
use crate::store::DomainStore;

use super::types::SolverStats;

/// How a condition is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Possible,
    Certain,
}

pub struct Evaluator<'s> {
    store: &'s mut DomainStore,
    visited: &'s mut HashSet<VarId>,
    stats: &'s mut SolverStats,
    /// Deferred constraints met while evaluating, not yet scheduled
    raised: Vec<Expr>,
}

impl<'s> Evaluator<'s> {
    pub fn new(
        store: &'s mut DomainStore,
        visited: &'s mut HashSet<VarId>,
        stats: &'s mut SolverStats,
    ) -> Self {
        Self {
            store,
            visited,
            stats,
            raised: Vec::new(),
        }
    }

    pub fn store(&mut self) -> &mut DomainStore {
        &mut *self.store
    }

    pub fn stats(&mut self) -> &mut SolverStats {
        &mut *self.stats
    }

    /// Drain the deferred constraints raised since the last call.
    pub fn take_raised(&mut self) -> Vec<Expr> {
        std::mem::take(&mut self.raised)
    }

    fn mark(&mut self, var: &Variable) -> SolverResult<()> {
        let id = self.store.require(var)?;
        let rep = self.store.resolve(id)?;
        self.visited.insert(id);
        self.visited.insert(rep);
        Ok(())
    }

    fn mark_all(&mut self, expr: &Expr) -> SolverResult<()> {
        for var in expr.variables() {
            self.mark(&var)?;
        }
        Ok(())
    }

    /// Whether `var`'s class has been narrowed by an evaluated constraint.
    pub fn is_visited(&mut self, var: &Variable) -> SolverResult<bool> {
        let id = self.store.require(var)?;
        if self.visited.contains(&id) {
            return Ok(true);
        }
        let rep = self.store.resolve(id)?;
        Ok(self.visited.contains(&rep))
    }

    /// A deferred constraint is ready once all its condition variables are
    /// visited.
    pub fn is_ready(&mut self, expr: &Expr) -> SolverResult<bool> {
        for var in expr.condition_variables() {
            if !self.is_visited(&var)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Eager evaluation. Deferred forms are queued and reported `Sat`.
    pub fn evaluate(&mut self, expr: &Expr) -> SolverResult<Satisfiability> {
        let res = match expr {
            Expr::True | Expr::Terminate => Satisfiability::Sat,
            Expr::False => Satisfiability::Unsat,
            Expr::Eq(lhs, rhs) => {
                self.mark_all(expr)?;
                let left = self.store.require(lhs)?;
                match rhs {
                    Term::Value(value) => self.store.assign_value(left, value)?,
                    Term::Var(var) => {
                        let right = self.store.require(var)?;
                        let before = self.store.aliases().merge_count();
                        let res = self.store.assign_variable(left, right)?;
                        self.stats.alias_merges += self.store.aliases().merge_count() - before;
                        res
                    }
                }
            }
            Expr::Not(inner) => self.evaluate_negation(inner)?,
            Expr::And(items) => {
                self.mark_all(expr)?;
                let mut res = Satisfiability::Sat;
                for item in items {
                    res &= self.evaluate(item)?;
                }
                res
            }
            Expr::Or(items) => self.evaluate_disjunction(expr, items)?,
            Expr::Ite(..) | Expr::Implies(..) => {
                trace!(constraint = %expr, "deferring");
                self.raised.push(expr.clone());
                Satisfiability::Sat
            }
        };
        trace!(constraint = %expr, result = %res, "evaluated");
        Ok(res)
    }

    fn evaluate_negation(&mut self, inner: &Expr) -> SolverResult<Satisfiability> {
        match inner {
            Expr::True => Ok(Satisfiability::Unsat),
            Expr::False | Expr::Terminate => Ok(Satisfiability::Sat),
            Expr::Eq(lhs, rhs) => {
                self.mark_all(inner)?;
                let left = self.store.require(lhs)?;
                match rhs {
                    Term::Value(value) => self.store.exclude_value(left, value),
                    Term::Var(var) => {
                        let right = self.store.require(var)?;
                        self.store.exclude_variable(left, right)
                    }
                }
            }
            Expr::Not(e) => self.evaluate(e),
            Expr::And(_) | Expr::Or(_) => self.evaluate(&inner.negated()),
            Expr::Ite(..) | Expr::Implies(..) => Err(SolverError::UnhandledCase(format!(
                "negation of deferred constraint {}",
                inner
            ))),
        }
    }

    /// Narrow every variable of the disjunction independently.
    ///
    /// Each variable keeps only the values admitted by the disjuncts that
    /// mention it. The outcomes are or-ed: the disjunction fails only when
    /// no variable could be narrowed.
    fn evaluate_disjunction(&mut self, expr: &Expr, items: &[Expr]) -> SolverResult<Satisfiability> {
        if items.is_empty() {
            return Ok(Satisfiability::Unsat);
        }
        // A trivially true disjunct satisfies the whole disjunction
        if items.iter().any(|e| matches!(e, Expr::True | Expr::Terminate)) {
            return Ok(Satisfiability::Sat);
        }

        let vars = expr.variables();
        if vars.is_empty() {
            return Ok(Satisfiability::from_bool(items.iter().any(constant_truth)));
        }

        self.mark_all(expr)?;
        let mut res = Satisfiability::Unknown;
        for var in &vars {
            let id = self.store.require(var)?;
            res |= self.store.narrow_on_variable(items, id)?;
        }
        Ok(res)
    }

    /// Decide the condition `expr` against the store without mutating it.
    ///
    /// Conditions are equalities, negated equalities, constants, and
    /// conjunctions or disjunctions of those. Any other shape is an
    /// [`SolverError::UnhandledCase`].
    pub fn holds(&mut self, expr: &Expr, mode: Mode) -> SolverResult<bool> {
        check_condition(expr)?;
        self.decide(expr, mode)
    }

    fn decide(&mut self, expr: &Expr, mode: Mode) -> SolverResult<bool> {
        Ok(match expr {
            Expr::True | Expr::Terminate => true,
            Expr::False => false,
            Expr::Eq(lhs, Term::Value(value)) => {
                let rep = self.store.class_of(lhs)?;
                let set = self.store.set_of(rep);
                match self.store.value_id(value) {
                    None => false,
                    Some(vid) => match mode {
                        Mode::Possible => set.contains(vid),
                        Mode::Certain => set.len() == 1 && set.contains(vid),
                    },
                }
            }
            Expr::Eq(lhs, Term::Var(rhs)) => {
                let a = self.store.class_of(lhs)?;
                let b = self.store.class_of(rhs)?;
                if a == b {
                    true
                } else {
                    let (sa, sb) = (self.store.set_of(a), self.store.set_of(b));
                    match mode {
                        Mode::Possible => !sa.is_disjoint(sb),
                        Mode::Certain => sa.len() == 1 && sa == sb,
                    }
                }
            }
            // `x != c` holds iff `c` is no longer a candidate, in either mode
            Expr::Not(inner) => !self.decide(inner, Mode::Possible)?,
            Expr::And(_) | Expr::Or(_) if mode == Mode::Certain => match self.single_class(expr)? {
                Some(rep) => self.store.entails(expr, rep)?,
                None => self.fold(expr, mode)?,
            },
            Expr::And(_) | Expr::Or(_) => self.fold(expr, mode)?,
            Expr::Ite(..) | Expr::Implies(..) => {
                return Err(SolverError::UnhandledCase(format!(
                    "cannot decide condition {}",
                    expr
                )))
            }
        })
    }

    /// `and` as all, `or` as any, over the items decided one by one.
    fn fold(&mut self, expr: &Expr, mode: Mode) -> SolverResult<bool> {
        match expr {
            Expr::And(items) => {
                for item in items {
                    if !self.decide(item, mode)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Or(items) => {
                for item in items {
                    if self.decide(item, mode)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            other => self.decide(other, mode),
        }
    }

    /// The class every variable of `expr` belongs to, if there is exactly one.
    fn single_class(&mut self, expr: &Expr) -> SolverResult<Option<VarId>> {
        let mut class = None;
        for var in expr.variables() {
            let rep = self.store.class_of(&var)?;
            match class {
                None => class = Some(rep),
                Some(seen) if seen != rep => return Ok(None),
                Some(_) => {}
            }
        }
        Ok(class)
    }

    /// Evaluate one constraint of the deferred phase and mark its variables.
    pub fn evaluate_deferred(&mut self, expr: &Expr) -> SolverResult<Satisfiability> {
        self.stats.deferred_evaluated += 1;
        let res = match expr {
            Expr::Ite(cond, then, otherwise) => self.evaluate_conditional(cond, then, otherwise)?,
            Expr::Implies(left, right) => self.evaluate_implication(left, right)?,
            other => self.evaluate(other)?,
        };
        self.mark_all(expr)?;
        debug!(constraint = %expr, result = %res, "deferred constraint");
        Ok(res)
    }

    fn evaluate_conditional(
        &mut self,
        cond: &Expr,
        then: &Expr,
        otherwise: &Expr,
    ) -> SolverResult<Satisfiability> {
        let (mut cond, mut then, mut otherwise) = (cond, then, otherwise);
        while let Expr::Not(inner) = cond {
            cond = &**inner;
            std::mem::swap(&mut then, &mut otherwise);
        }

        if self.holds(cond, Mode::Possible)? {
            trace!(condition = %cond, "conditional: then branch");
            let res = self.evaluate(cond)?;
            Ok(res & self.evaluate(then)?)
        } else if matches!(otherwise, Expr::Terminate) {
            Ok(Satisfiability::Sat)
        } else {
            trace!(condition = %cond, "conditional: else branch");
            let res = self.evaluate(&cond.negated())?;
            Ok(res & self.evaluate(otherwise)?)
        }
    }

    fn evaluate_implication(&mut self, left: &Expr, right: &Expr) -> SolverResult<Satisfiability> {
        if self.holds(left, Mode::Certain)? {
            self.evaluate_conditional(left, right, &Expr::Terminate)
        } else {
            trace!(antecedent = %left, "implication: antecedent not established");
            Ok(Satisfiability::Sat)
        }
    }
}

/// Reject condition shapes that cannot be decided against the store.
fn check_condition(expr: &Expr) -> SolverResult<()> {
    match expr {
        Expr::True | Expr::False | Expr::Terminate | Expr::Eq(..) => Ok(()),
        Expr::Not(inner) => match &**inner {
            Expr::True | Expr::False | Expr::Terminate | Expr::Eq(..) => Ok(()),
            other => Err(SolverError::UnhandledCase(format!(
                "negation of compound condition {}",
                other
            ))),
        },
        Expr::And(items) | Expr::Or(items) => items.iter().try_for_each(check_condition),
        Expr::Ite(..) | Expr::Implies(..) => Err(SolverError::UnhandledCase(format!(
            "cannot decide condition {}",
            expr
        ))),
    }
}

/// Truth value of a formula without variables.
fn constant_truth(expr: &Expr) -> bool {
    match expr {
        Expr::True | Expr::Terminate => true,
        Expr::False => false,
        Expr::Eq(..) => false,
        Expr::Not(inner) => !constant_truth(inner),
        Expr::And(items) => items.iter().all(constant_truth),
        Expr::Or(items) => items.iter().any(constant_truth),
        Expr::Ite(c, t, e) => {
            if constant_truth(c) {
                constant_truth(t)
            } else {
                constant_truth(e)
            }
        }
        Expr::Implies(l, r) => !constant_truth(l) || constant_truth(r),
    }
}
