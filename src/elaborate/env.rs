//! Elaboration environment: the sorts, values and variables declared so far.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Span;
use crate::error::{ElabError, ElabResult};
use crate::expr::{Sort, Value, Variable};

/// Name of the sort every session ranges over.
pub const DOMAIN_SORT: &str = "Domain";

/// Symbols in scope for one script.
///
/// Passed explicitly through every elaboration call; two scripts never
/// share a registry.
#[derive(Clone, Debug, Default)]
pub struct SortRegistry {
    sorts: IndexMap<String, Rc<Sort>>,
    /// Value name to the first sort that declared it
    values: IndexMap<String, Rc<Sort>>,
    variables: IndexMap<String, Variable>,
}

impl SortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_sort(&mut self, sort: Sort, span: Span) -> ElabResult<Rc<Sort>> {
        if self.sorts.contains_key(sort.name()) {
            return Err(ElabError::malformed(
                format!("sort '{}' is already declared", sort.name()),
                span,
            ));
        }
        let sort = Rc::new(sort);
        for value in sort.values() {
            self.values
                .entry(value.name().to_string())
                .or_insert_with(|| sort.clone());
        }
        self.sorts.insert(sort.name().to_string(), sort.clone());
        Ok(sort)
    }

    pub fn declare_variable(&mut self, name: &str, sort_name: &str, span: Span) -> ElabResult<Variable> {
        if self.variables.contains_key(name) {
            return Err(ElabError::malformed(
                format!("'{}' is already declared", name),
                span,
            ));
        }
        if self.values.contains_key(name) {
            return Err(ElabError::malformed(
                format!("'{}' is already a value", name),
                span,
            ));
        }
        let sort = self.sort(sort_name).ok_or_else(|| ElabError::UnknownSort {
            name: sort_name.to_string(),
            span,
        })?;
        let var = Variable::new(name, sort.clone());
        self.variables.insert(name.to_string(), var.clone());
        Ok(var)
    }

    pub fn sort(&self, name: &str) -> Option<&Rc<Sort>> {
        self.sorts.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// The value named `name`, if some sort declares it.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.values.get(name).map(|_| Value::new(name))
    }

    pub fn sorts(&self) -> impl Iterator<Item = &Rc<Sort>> {
        self.sorts.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn sort_count(&self) -> usize {
        self.sorts.len()
    }

    /// Union of every declared sort, in declaration order.
    pub fn domain(&self) -> Rc<Sort> {
        Rc::new(Sort::union(DOMAIN_SORT, self.sorts.values().map(|s| s.as_ref())))
    }
}
