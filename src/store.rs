//! Domain store: candidate values per equivalence class.
//!
//! Variables live in an arena indexed by [`VarId`]. Each record holds
//! either the candidate bitmap of its class (when it is the class
//! representative) or an alias marker naming the representative it was
//! merged into. The marker is informational; [`AliasMap`] is authoritative
//! for resolution.
//!
//! Every narrowing operation is all-or-nothing: when the result would be an
//! empty candidate set the operation returns `Unsat` and leaves the store
//! exactly as it was.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexSet;
use roaring::RoaringBitmap;
use tracing::trace;

use crate::alias::AliasMap;
use crate::error::SolverError;
use crate::expr::{Expr, Sort, Term, Value, Variable};
use crate::id::{ValueId, VarId};
use crate::sat::Satisfiability;

/// Per-variable record contents.
#[derive(Clone, Debug, PartialEq)]
pub enum Candidates {
    /// Values the class may still take. Never empty once committed.
    Values(RoaringBitmap),
    /// This variable was merged into the class of the given variable.
    Aliased(VarId),
}

/// Result of declaring a variable.
#[derive(Clone, Debug)]
pub struct Declared {
    pub id: VarId,
    /// False if the variable was already known.
    pub fresh: bool,
    /// For a fresh variable whose sort lacks some Domain values: the
    /// conjunction excluding exactly those values.
    pub sort_exclusion: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct DomainStore {
    domain: Rc<Sort>,
    /// Every Domain value, as a bitmap
    full: RoaringBitmap,
    /// Variable arena; the index is the `VarId`
    variables: IndexSet<Variable>,
    entries: Vec<Candidates>,
    aliases: AliasMap,
}

impl DomainStore {
    pub fn new(domain: Rc<Sort>) -> Self {
        let full = (0..domain.len() as ValueId).collect();
        Self {
            domain,
            full,
            variables: IndexSet::new(),
            entries: Vec::new(),
            aliases: AliasMap::new(),
        }
    }

    pub fn domain(&self) -> &Rc<Sort> {
        &self.domain
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn id_of(&self, var: &Variable) -> Option<VarId> {
        self.variables.get_index_of(var)
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.iter()
    }

    pub fn entry(&self, id: VarId) -> &Candidates {
        &self.entries[id]
    }

    pub fn value_id(&self, value: &Value) -> Option<ValueId> {
        self.domain
            .values()
            .get_index_of(value)
            .map(|i| i as ValueId)
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.domain.values()[id as usize]
    }

    /// Decode a candidate bitmap into values.
    pub fn decode(&self, set: &RoaringBitmap) -> BTreeSet<Value> {
        set.iter().map(|id| self.value(id).clone()).collect()
    }

    /// Register `var` with every Domain value as candidate. Idempotent.
    pub fn declare(&mut self, var: &Variable) -> Declared {
        if let Some(id) = self.id_of(var) {
            return Declared {
                id,
                fresh: false,
                sort_exclusion: None,
            };
        }

        let (id, _) = self.variables.insert_full(var.clone());
        let alias_id = self.aliases.push();
        debug_assert_eq!(id, alias_id);
        self.entries.push(Candidates::Values(self.full.clone()));

        let excluded: Vec<Expr> = var
            .sort()
            .missing_from(&self.domain)
            .map(|value| Expr::neq(var, value))
            .collect();
        let sort_exclusion = (!excluded.is_empty()).then(|| Expr::And(excluded));

        Declared {
            id,
            fresh: true,
            sort_exclusion,
        }
    }

    /// Id of a variable that must already be declared.
    pub fn require(&self, var: &Variable) -> Result<VarId, SolverError> {
        self.id_of(var)
            .ok_or_else(|| SolverError::UnhandledCase(format!("undeclared variable {}", var)))
    }

    pub fn resolve(&mut self, id: VarId) -> Result<VarId, SolverError> {
        self.aliases.resolve(id)
    }

    /// Representative of a declared variable.
    pub fn class_of(&mut self, var: &Variable) -> Result<VarId, SolverError> {
        let id = self.require(var)?;
        self.resolve(id)
    }

    /// Candidate set owned by a representative.
    ///
    /// A representative always owns a set; an alias marker found here is
    /// treated as an unconstrained class.
    pub fn set_of(&self, rep: VarId) -> &RoaringBitmap {
        match &self.entries[rep] {
            Candidates::Values(set) => set,
            Candidates::Aliased(_) => &self.full,
        }
    }

    /// Candidate values of `var`'s class.
    pub fn values_of(&mut self, var: &Variable) -> Result<BTreeSet<Value>, SolverError> {
        let rep = self.class_of(var)?;
        Ok(self.decode(self.set_of(rep)))
    }

    fn commit(&mut self, rep: VarId, set: RoaringBitmap) -> Satisfiability {
        if set.is_empty() {
            return Satisfiability::Unsat;
        }
        self.entries[rep] = Candidates::Values(set);
        Satisfiability::Sat
    }

    /// `var = value`: shrink the class to `{value}` if it is still a candidate.
    pub fn assign_value(&mut self, var: VarId, value: &Value) -> Result<Satisfiability, SolverError> {
        let rep = self.resolve(var)?;
        let Some(vid) = self.value_id(value).filter(|v| self.set_of(rep).contains(*v)) else {
            trace!(var = %self.variables[var], %value, "assign_value: not a candidate");
            return Ok(Satisfiability::Unsat);
        };
        let mut single = RoaringBitmap::new();
        single.insert(vid);
        Ok(self.commit(rep, single))
    }

    /// `left = right` between variables: merge the classes and intersect
    /// their candidate sets into the surviving representative.
    pub fn assign_variable(&mut self, left: VarId, right: VarId) -> Result<Satisfiability, SolverError> {
        let rl = self.resolve(left)?;
        let rr = self.resolve(right)?;
        if rl == rr {
            return Ok(Satisfiability::Sat);
        }

        let merged = self.set_of(rl) & self.set_of(rr);
        if merged.is_empty() {
            trace!(
                left = %self.variables[left],
                right = %self.variables[right],
                "assign_variable: disjoint candidates"
            );
            return Ok(Satisfiability::Unsat);
        }

        let rep = self.aliases.union(left, right)?;
        let absorbed = if rep == rl { rr } else { rl };
        self.entries[rep] = Candidates::Values(merged);
        self.entries[absorbed] = Candidates::Aliased(rep);
        Ok(Satisfiability::Sat)
    }

    /// `var != value`: drop `value` from the class.
    pub fn exclude_value(&mut self, var: VarId, value: &Value) -> Result<Satisfiability, SolverError> {
        let rep = self.resolve(var)?;
        let Some(vid) = self.value_id(value) else {
            return Ok(Satisfiability::Sat);
        };
        let set = self.set_of(rep);
        if !set.contains(vid) {
            return Ok(Satisfiability::Sat);
        }
        let mut next = set.clone();
        next.remove(vid);
        let res = self.commit(rep, next);
        if res.is_unsat() {
            trace!(var = %self.variables[var], %value, "exclude_value: class would be empty");
        }
        Ok(res)
    }

    /// `left != right` between variables.
    ///
    /// Unsat when both are in one class. When one side is pinned to a
    /// single value that value is excluded from the other side; otherwise
    /// nothing can be narrowed.
    pub fn exclude_variable(&mut self, left: VarId, right: VarId) -> Result<Satisfiability, SolverError> {
        let rl = self.resolve(left)?;
        let rr = self.resolve(right)?;
        if rl == rr {
            return Ok(Satisfiability::Unsat);
        }
        if let Some(v) = singleton(self.set_of(rr)) {
            let value = self.value(v).clone();
            return self.exclude_value(rl, &value);
        }
        if let Some(v) = singleton(self.set_of(rl)) {
            let value = self.value(v).clone();
            return self.exclude_value(rr, &value);
        }
        Ok(Satisfiability::Sat)
    }

    /// Narrow `var`'s class to the values admitted by at least one of the
    /// `disjuncts` that mention it. Disjuncts not mentioning the class are
    /// ignored. On an empty result the prior set is kept and `Unsat`
    /// returned.
    pub fn narrow_on_variable(&mut self, disjuncts: &[Expr], var: VarId) -> Result<Satisfiability, SolverError> {
        let rep = self.resolve(var)?;
        let prior = self.set_of(rep).clone();

        let mut admitted = RoaringBitmap::new();
        for d in disjuncts {
            if self.mentions_class(d, rep)? {
                admitted |= self.admissible(d, rep, &prior)?;
            }
        }

        let next = &prior & &admitted;
        trace!(
            var = %self.variables[var],
            prior = ?self.decode(&prior),
            next = ?self.decode(&next),
            "narrow_on_variable"
        );
        Ok(self.commit(rep, next))
    }

    /// Whether any variable of `expr` belongs to the class `rep`.
    pub fn mentions_class(&mut self, expr: &Expr, rep: VarId) -> Result<bool, SolverError> {
        for var in expr.variables() {
            if self.class_of(&var)? == rep {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `expr` holds for every remaining candidate of class `rep`.
    /// Only exact when every variable of `expr` belongs to `rep`.
    pub fn entails(&mut self, expr: &Expr, rep: VarId) -> Result<bool, SolverError> {
        let set = self.set_of(rep).clone();
        Ok(set.is_subset(&self.admissible(expr, rep, &set)?))
    }

    /// Values of class `rep` under which `expr` can hold, given the current
    /// store. Side-effect free apart from alias memoization.
    fn admissible(&mut self, expr: &Expr, rep: VarId, prior: &RoaringBitmap) -> Result<RoaringBitmap, SolverError> {
        Ok(match expr {
            Expr::True | Expr::Terminate => prior.clone(),
            Expr::False => RoaringBitmap::new(),
            Expr::Eq(lhs, Term::Value(value)) => {
                if self.class_of(lhs)? != rep {
                    prior.clone()
                } else {
                    let mut only = RoaringBitmap::new();
                    if let Some(vid) = self.value_id(value) {
                        only.insert(vid);
                    }
                    only
                }
            }
            Expr::Eq(lhs, Term::Var(rhs)) => {
                let a = self.class_of(lhs)?;
                let b = self.class_of(rhs)?;
                match (a == rep, b == rep) {
                    (true, false) => self.set_of(b).clone(),
                    (false, true) => self.set_of(a).clone(),
                    _ => prior.clone(),
                }
            }
            Expr::Not(inner) => self.admissible_negated(inner, rep, prior)?,
            Expr::And(items) => {
                let mut acc = prior.clone();
                for item in items {
                    if matches!(item, Expr::False) {
                        return Ok(RoaringBitmap::new());
                    }
                    if self.mentions_class(item, rep)? {
                        acc &= self.admissible(item, rep, prior)?;
                    }
                }
                acc
            }
            Expr::Or(items) => {
                let mut acc = RoaringBitmap::new();
                let mut constrained = false;
                for item in items {
                    if self.mentions_class(item, rep)? {
                        constrained = true;
                        acc |= self.admissible(item, rep, prior)?;
                    }
                }
                if constrained { acc } else { prior.clone() }
            }
            // Deferred forms do not restrict the class inside a disjunction
            Expr::Ite(..) | Expr::Implies(..) => prior.clone(),
        })
    }

    fn admissible_negated(&mut self, inner: &Expr, rep: VarId, prior: &RoaringBitmap) -> Result<RoaringBitmap, SolverError> {
        Ok(match inner {
            Expr::True => RoaringBitmap::new(),
            Expr::False | Expr::Terminate => prior.clone(),
            Expr::Eq(lhs, Term::Value(value)) => {
                let mut rest = prior.clone();
                if self.class_of(lhs)? == rep {
                    if let Some(vid) = self.value_id(value) {
                        rest.remove(vid);
                    }
                }
                rest
            }
            Expr::Eq(lhs, Term::Var(rhs)) => {
                let a = self.class_of(lhs)?;
                let b = self.class_of(rhs)?;
                let other = match (a == rep, b == rep) {
                    (true, true) => return Ok(RoaringBitmap::new()),
                    (true, false) => b,
                    (false, true) => a,
                    (false, false) => return Ok(prior.clone()),
                };
                let mut rest = prior.clone();
                if let Some(v) = singleton(self.set_of(other)) {
                    rest.remove(v);
                }
                rest
            }
            Expr::Not(e) => self.admissible(e, rep, prior)?,
            Expr::And(_) | Expr::Or(_) => self.admissible(&inner.negated(), rep, prior)?,
            Expr::Ite(..) | Expr::Implies(..) => prior.clone(),
        })
    }

    /// `child -> parent` per alias link, or `()` when nothing is aliased.
    pub fn dump_aliases(&self) -> String {
        let mut out = String::new();
        for (child, parent) in self.aliases.links() {
            let _ = writeln!(out, "{} -> {}", self.variables[child], self.variables[parent]);
        }
        if out.is_empty() {
            out.push_str("()");
        }
        out
    }

    /// One `name = {values}` or `name = Ref(rep)` line per variable.
    pub fn dump_variables(&self) -> String {
        let mut out = String::new();
        for (id, var) in self.variables.iter().enumerate() {
            match &self.entries[id] {
                Candidates::Values(set) => {
                    let values: Vec<String> = self.decode(set).iter().map(|v| v.to_string()).collect();
                    let _ = writeln!(out, "{} = {{{}}}", var, values.join(", "));
                }
                Candidates::Aliased(rep) => {
                    let _ = writeln!(out, "{} = Ref({})", var, self.variables[*rep]);
                }
            }
        }
        out
    }
}

fn singleton(set: &RoaringBitmap) -> Option<ValueId> {
    if set.len() == 1 { set.min() } else { None }
}
