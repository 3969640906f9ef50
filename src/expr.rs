//! Expression model for finite-domain equality constraints
//!
//! Formulas are immutable trees over three kinds of atoms:
//! - [`Value`]: an opaque symbol, equal to another value iff the names match
//! - [`Sort`]: a named, ordered enumeration of values
//! - [`Variable`]: a named unknown ranging over a sort
//!
//! The only atomic formula is equality between a variable and either a
//! value or another variable ([`Expr::Eq`]). Everything else is built from
//! the propositional connectives plus `ite` ([`Expr::Ite`]) and implication
//! ([`Expr::Implies`]). The latter two are the *deferred* forms: the solver
//! postpones them until the variables in their condition position have
//! been narrowed (see [`Expr::condition_variables`]).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexSet;

/// An atomic domain value. Identity is the name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value {
    name: String,
}

impl Value {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named finite enumeration of values.
///
/// `Eq`/`Hash` go by name only. Two differently named sorts with the same
/// members are *not* equal; use [`Sort::same_values`] for that comparison.
/// Values keep their declaration order.
#[derive(Clone, Debug)]
pub struct Sort {
    name: String,
    values: IndexSet<Value>,
}

impl Sort {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Build a sort holding every value of `sorts`, in first-seen order.
    /// This is how a Domain is assembled from the declared component sorts.
    pub fn union<'a>(name: impl Into<String>, sorts: impl IntoIterator<Item = &'a Sort>) -> Self {
        let values = sorts
            .into_iter()
            .flat_map(|s| s.values.iter().cloned())
            .collect();
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &IndexSet<Value> {
        &self.values
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether both sorts enumerate exactly the same values (order ignored).
    pub fn same_values(&self, other: &Sort) -> bool {
        self.values.len() == other.values.len() && self.values.iter().all(|v| other.contains(v))
    }

    /// Values of `other` that are not members of `self`, in `other`'s order.
    pub fn missing_from<'a>(&'a self, other: &'a Sort) -> impl Iterator<Item = &'a Value> + 'a {
        other.values.iter().filter(move |v| !self.contains(v))
    }
}

impl PartialEq for Sort {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Sort {}

impl Hash for Sort {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A symbolic unknown bound to a sort.
///
/// Identity is the pair (name, sort name): `x : A` and `x : B` are distinct
/// variables.
#[derive(Clone, Debug)]
pub struct Variable {
    name: String,
    sort: Rc<Sort>,
}

impl Variable {
    pub fn new(name: impl Into<String>, sort: Rc<Sort>) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Rc<Sort> {
        &self.sort
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sort.name == other.sort.name
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.sort.name.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Right-hand side of an equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Variable),
    Value(Value),
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Var(v)
    }
}

impl From<&Variable> for Term {
    fn from(v: &Variable) -> Self {
        Term::Var(v.clone())
    }
}

impl From<Value> for Term {
    fn from(v: Value) -> Self {
        Term::Value(v)
    }
}

impl From<&Value> for Term {
    fn from(v: &Value) -> Self {
        Term::Value(v.clone())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => v.fmt(f),
            Term::Value(v) => v.fmt(f),
        }
    }
}

/// A constraint formula.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    True,
    False,
    /// No-op truth, used as the absent else-branch of an `ite`.
    Terminate,
    Eq(Variable, Term),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// `ite(cond, then, else)`
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `left => right`
    Implies(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eq(var: &Variable, rhs: impl Into<Term>) -> Self {
        Expr::Eq(var.clone(), rhs.into())
    }

    pub fn neq(var: &Variable, rhs: impl Into<Term>) -> Self {
        Expr::not(Expr::eq(var, rhs))
    }

    pub fn not(e: Expr) -> Self {
        Expr::Not(Box::new(e))
    }

    pub fn and(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::And(items.into_iter().collect())
    }

    pub fn or(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Or(items.into_iter().collect())
    }

    pub fn ite(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Ite(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    pub fn implies(left: Expr, right: Expr) -> Self {
        Expr::Implies(Box::new(left), Box::new(right))
    }

    /// Every variable mentioned anywhere in the tree, in first-seen order.
    pub fn variables(&self) -> IndexSet<Variable> {
        let mut out = IndexSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut IndexSet<Variable>) {
        match self {
            Expr::True | Expr::False | Expr::Terminate => {}
            Expr::Eq(lhs, rhs) => {
                out.insert(lhs.clone());
                if let Term::Var(v) = rhs {
                    out.insert(v.clone());
                }
            }
            Expr::Not(e) => e.collect_variables(out),
            Expr::And(items) | Expr::Or(items) => {
                for e in items {
                    e.collect_variables(out);
                }
            }
            Expr::Ite(c, t, e) => {
                c.collect_variables(out);
                t.collect_variables(out);
                e.collect_variables(out);
            }
            Expr::Implies(l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
        }
    }

    /// Variables occurring in the condition position of an `ite` or the
    /// antecedent of an implication. Branches and consequents contribute
    /// nothing, even if they nest further conditionals.
    pub fn condition_variables(&self) -> IndexSet<Variable> {
        let mut out = IndexSet::new();
        self.collect_condition_variables(false, &mut out);
        out
    }

    fn collect_condition_variables(&self, in_condition: bool, out: &mut IndexSet<Variable>) {
        match self {
            Expr::True | Expr::False | Expr::Terminate => {}
            Expr::Eq(..) => {
                if in_condition {
                    self.collect_variables(out);
                }
            }
            Expr::Not(e) => e.collect_condition_variables(in_condition, out),
            Expr::And(items) | Expr::Or(items) => {
                for e in items {
                    e.collect_condition_variables(in_condition, out);
                }
            }
            Expr::Ite(c, _, _) => c.collect_condition_variables(true, out),
            Expr::Implies(l, _) => l.collect_condition_variables(true, out),
        }
    }

    /// Push one negation inward.
    ///
    /// `not(and(..))` and `not(or(..))` are rewritten by De Morgan's law,
    /// double negation is removed, constants flip. Anything else is
    /// wrapped in a plain `Not`.
    pub fn negated(&self) -> Expr {
        match self {
            Expr::True => Expr::False,
            Expr::False => Expr::True,
            Expr::Not(inner) => (**inner).clone(),
            Expr::And(items) => Expr::Or(items.iter().map(|e| Expr::not(e.clone())).collect()),
            Expr::Or(items) => Expr::And(items.iter().map(|e| Expr::not(e.clone())).collect()),
            other => Expr::not(other.clone()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, items: &[Expr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, e) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", e)?;
    }
    f.write_str(")")
}

/// Debug-oriented rendering, e.g. `And(Eq(x, Int), Not(Eq(y, x)))`.
/// See [`crate::pretty`] for the s-expression form.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::True => f.write_str("True()"),
            Expr::False => f.write_str("False()"),
            Expr::Terminate => f.write_str("Terminate()"),
            Expr::Eq(lhs, rhs) => write!(f, "Eq({}, {})", lhs, rhs),
            Expr::Not(e) => write!(f, "Not({})", e),
            Expr::And(items) => write_list(f, "And", items),
            Expr::Or(items) => write_list(f, "Or", items),
            Expr::Ite(c, t, e) => write!(f, "If({}, {}, {})", c, t, e),
            Expr::Implies(l, r) => write!(f, "Implies({}, {})", l, r),
        }
    }
}
