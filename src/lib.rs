//! finsat: an all-sat solver for finite-domain equality constraints
//!
//! Variables range over enumerated sorts. Constraints are equalities
//! between variables and values, combined with the usual connectives plus
//! `ite` and implication. Instead of a single witness, a model reports for
//! every variable the full set of values it may still take.
//!
//! The core ([`solver::Solver`]) is driven either directly through its API
//! or from SMT-LIB 2 style scripts via [`load`] and [`repl::ReplState`].

pub mod alias;
pub mod ast;
pub mod elaborate;
pub mod error;
pub mod expr;
pub mod id;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod pretty;
pub mod repl;
pub mod sat;
pub mod solver;
pub mod store;

use std::rc::Rc;

pub use ast::{SExpr, Script, Span, Spanned};
pub use elaborate::{Command, SortRegistry};
pub use error::{ElabError, ElabResult, SolverError, SolverResult};
pub use expr::{Expr, Sort, Term, Value, Variable};
pub use lexer::lexer;
pub use model::Model;
pub use parser::parser;
pub use sat::Satisfiability;
pub use solver::{Solver, SolverOptions, TacticKind};

/// Parse a script into s-expressions
pub fn parse(input: &str) -> ElabResult<Script> {
    use chumsky::prelude::*;

    let tokens = lexer::lexer()
        .parse(input)
        .map_err(|errs| ElabError::Lex(error::format_lexer_errors(input, errs)))?;

    let len = input.len();
    parser::parser()
        .parse(chumsky::Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errs| ElabError::Parse(error::format_parser_errors(input, errs)))
}

/// The constraint problem described by a script.
#[derive(Clone, Debug)]
pub struct Problem {
    pub registry: SortRegistry,
    /// Union of all declared sorts
    pub domain: Rc<Sort>,
    /// Asserted formulas in order
    pub constraints: Vec<Expr>,
}

impl Problem {
    /// A fresh session holding every constraint of the script.
    pub fn solver(&self, options: SolverOptions) -> Solver {
        let mut solver = Solver::with_options(self.domain.clone(), options);
        for var in self.registry.variables() {
            solver.declare(var);
        }
        solver.assert_all(self.constraints.iter().cloned());
        solver
    }
}

/// Parse and elaborate a script, collecting its declarations and
/// assertions. Other commands are ignored.
pub fn load(input: &str) -> ElabResult<Problem> {
    let script = parse(input)?;
    let mut registry = SortRegistry::new();
    let mut constraints = Vec::new();
    for cmd in elaborate::elaborate_script(&mut registry, &script)? {
        if let Command::Assert(expr) = cmd.node {
            constraints.push(expr);
        }
    }
    let domain = registry.domain();
    Ok(Problem {
        registry,
        domain,
        constraints,
    })
}
