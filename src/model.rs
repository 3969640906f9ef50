//! All-sat models.
//!
//! A [`Model`] is an owned snapshot taken after evaluation: for every
//! declared variable, the full set of values its class may still take.
//! Later assertions on the session do not affect an existing model.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use crate::expr::{Value, Variable};
use crate::sat::Satisfiability;

#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    satisfiability: Satisfiability,
    entries: IndexMap<Variable, BTreeSet<Value>>,
}

impl Model {
    pub fn new(satisfiability: Satisfiability, entries: IndexMap<Variable, BTreeSet<Value>>) -> Self {
        Self {
            satisfiability,
            entries,
        }
    }

    pub fn satisfiability(&self) -> Satisfiability {
        self.satisfiability
    }

    pub fn is_sat(&self) -> bool {
        self.satisfiability.is_sat()
    }

    /// Remaining values of `var`, or `None` if it was never declared.
    pub fn get(&self, var: &Variable) -> Option<&BTreeSet<Value>> {
        self.entries.get(var)
    }

    /// Look a variable up by name, ignoring its sort. Returns the first
    /// declared match.
    pub fn get_by_name(&self, name: &str) -> Option<(&Variable, &BTreeSet<Value>)> {
        self.entries.iter().find(|(v, _)| v.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &BTreeSet<Value>)> {
        self.entries.iter()
    }
}

/// `get-model` response: one `(name value...)` line per variable.
impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(")?;
        for (var, values) in &self.entries {
            write!(f, "  ({}", crate::pretty::symbol(var.name()))?;
            for value in values {
                write!(f, " {}", crate::pretty::symbol(value.name()))?;
            }
            writeln!(f, ")")?;
        }
        write!(f, ")")
    }
}
