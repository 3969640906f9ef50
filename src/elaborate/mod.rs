//! Elaboration: s-expressions to solver commands.
//!
//! Recognizes the SMT-LIB 2 subset that describes finite-domain equality
//! problems:
//!
//! - enumerated sorts: `declare-datatypes` (both the 2.5 form
//!   `(declare-datatypes () ((S a b)))` and the 2.6 form
//!   `(declare-datatypes ((S 0)) (((a) (b))))`) and `declare-datatype`
//! - variables: `declare-fun` with no parameters, `declare-const`
//! - `assert`, `check-sat`, `get-model`, `push`, `pop`, `exit`
//! - `set-info`, `set-logic`, `set-option` and `get-info`, which are
//!   accepted and ignored
//!
//! Every symbol in a formula is resolved against the [`SortRegistry`] to a
//! declared variable or a declared value.

mod env;
mod formula;

pub use env::{SortRegistry, DOMAIN_SORT};
pub use formula::elaborate_formula;

use std::rc::Rc;

use crate::ast::{SExpr, Script, Span, Spanned};
use crate::error::{ElabError, ElabResult};
use crate::expr::{Expr, Sort, Value, Variable};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    DeclareSort(Rc<Sort>),
    DeclareVar(Variable),
    Assert(Expr),
    CheckSat,
    GetModel,
    Push(u32),
    Pop(u32),
    /// Accepted but without effect, e.g. `set-logic`
    Ignored(String),
    Exit,
}

fn symbol_at<'a>(args: &'a [Spanned<SExpr>], i: usize, what: &str, span: Span) -> ElabResult<&'a str> {
    let Some(arg) = args.get(i) else {
        return Err(ElabError::malformed(format!("missing {}", what), span));
    };
    arg.node
        .as_symbol()
        .ok_or_else(|| ElabError::malformed(format!("expected {}, found {}", what, arg.node), arg.span))
}

fn list_at<'a>(args: &'a [Spanned<SExpr>], i: usize, what: &str, span: Span) -> ElabResult<&'a [Spanned<SExpr>]> {
    let Some(arg) = args.get(i) else {
        return Err(ElabError::malformed(format!("missing {}", what), span));
    };
    arg.node
        .as_list()
        .ok_or_else(|| ElabError::malformed(format!("expected {}, found {}", what, arg.node), arg.span))
}

/// A nullary constructor, written `a` or `(a)`.
fn constructor(sexpr: &Spanned<SExpr>) -> ElabResult<Value> {
    match &sexpr.node {
        SExpr::Symbol(name) => Ok(Value::new(name.as_str())),
        SExpr::List(items) if items.len() == 1 => match &items[0].node {
            SExpr::Symbol(name) => Ok(Value::new(name.as_str())),
            other => Err(ElabError::malformed(
                format!("expected a constructor name, found {}", other),
                items[0].span,
            )),
        },
        SExpr::List(_) => Err(ElabError::malformed(
            "constructors with fields are not supported",
            sexpr.span,
        )),
        other => Err(ElabError::malformed(
            format!("expected a constructor, found {}", other),
            sexpr.span,
        )),
    }
}

fn constructors(items: &[Spanned<SExpr>]) -> ElabResult<Vec<Value>> {
    items.iter().map(constructor).collect()
}

/// Sorts declared by one `declare-datatypes` command.
fn datatypes(args: &[Spanned<SExpr>], span: Span) -> ElabResult<Vec<(Sort, Span)>> {
    let heads = list_at(args, 0, "sort declarations", span)?;
    let bodies = list_at(args, 1, "datatype definitions", span)?;

    let is_26 = heads.iter().any(|h| h.node.as_list().is_some());
    if !is_26 {
        // 2.5: `(declare-datatypes () ((S a b) (T c)))`
        if let Some(param) = heads.first() {
            return Err(ElabError::malformed("parametric datatypes are not supported", param.span));
        }
        return bodies
            .iter()
            .map(|body| {
                let items = body.node.as_list().unwrap_or(&[]);
                let name = symbol_at(items, 0, "sort name", body.span)?;
                Ok((Sort::new(name, constructors(&items[1..])?), body.span))
            })
            .collect();
    }

    // 2.6: `(declare-datatypes ((S 0) (T 0)) (((a) (b)) ((c))))`
    if heads.len() != bodies.len() {
        return Err(ElabError::malformed(
            format!(
                "{} sorts declared but {} definitions given",
                heads.len(),
                bodies.len()
            ),
            span,
        ));
    }
    heads
        .iter()
        .zip(bodies)
        .map(|(head, body)| {
            let parts = head.node.as_list().unwrap_or(&[]);
            let name = symbol_at(parts, 0, "sort name", head.span)?;
            match parts.get(1).map(|p| &p.node) {
                Some(SExpr::Numeral(n)) if n == "0" => {}
                Some(_) => {
                    return Err(ElabError::malformed("parametric datatypes are not supported", head.span))
                }
                None => {}
            }
            let ctors = body.node.as_list().ok_or_else(|| {
                ElabError::malformed(format!("expected constructor list, found {}", body.node), body.span)
            })?;
            Ok((Sort::new(name, constructors(ctors)?), head.span))
        })
        .collect()
}

fn level(args: &[Spanned<SExpr>]) -> ElabResult<u32> {
    match args.first() {
        None => Ok(1),
        Some(arg) => match &arg.node {
            SExpr::Numeral(n) => n
                .parse()
                .map_err(|_| ElabError::malformed(format!("invalid level {}", n), arg.span)),
            other => Err(ElabError::malformed(format!("expected a numeral, found {}", other), arg.span)),
        },
    }
}

/// Elaborate one top-level form. Declarations are recorded in `env`.
///
/// `declare-datatypes` can declare several sorts; they are returned in
/// order.
pub fn elaborate_command(env: &mut SortRegistry, form: &Spanned<SExpr>) -> ElabResult<Vec<Command>> {
    let span = form.span;
    let Some(items) = form.node.as_list().filter(|items| !items.is_empty()) else {
        return Err(ElabError::malformed(format!("expected a command, found {}", form.node), span));
    };
    let Some(name) = items[0].node.as_symbol() else {
        return Err(ElabError::malformed("expected a command name", items[0].span));
    };
    let args = &items[1..];

    let cmd = match name {
        "declare-datatypes" => {
            let mut out = Vec::new();
            for (sort, sort_span) in datatypes(args, span)? {
                out.push(Command::DeclareSort(env.declare_sort(sort, sort_span)?));
            }
            return Ok(out);
        }
        "declare-datatype" => {
            let sort_name = symbol_at(args, 0, "sort name", span)?;
            let ctors = list_at(args, 1, "constructor list", span)?;
            let sort = Sort::new(sort_name, constructors(ctors)?);
            Command::DeclareSort(env.declare_sort(sort, span)?)
        }
        "declare-fun" => {
            let var_name = symbol_at(args, 0, "function name", span)?;
            let params = list_at(args, 1, "parameter list", span)?;
            if !params.is_empty() {
                return Err(ElabError::malformed("functions with parameters are not supported", args[1].span));
            }
            let sort_name = symbol_at(args, 2, "sort name", span)?;
            Command::DeclareVar(env.declare_variable(var_name, sort_name, args[2].span)?)
        }
        "declare-const" => {
            let var_name = symbol_at(args, 0, "constant name", span)?;
            let sort_name = symbol_at(args, 1, "sort name", span)?;
            Command::DeclareVar(env.declare_variable(var_name, sort_name, args[1].span)?)
        }
        "assert" => {
            let Some(body) = args.first() else {
                return Err(ElabError::malformed("missing formula", span));
            };
            Command::Assert(elaborate_formula(env, body)?)
        }
        "check-sat" => Command::CheckSat,
        "get-model" => Command::GetModel,
        "push" => Command::Push(level(args)?),
        "pop" => Command::Pop(level(args)?),
        "exit" => Command::Exit,
        "set-info" | "set-logic" | "set-option" | "get-info" => Command::Ignored(name.to_string()),
        _ => {
            return Err(ElabError::UnsupportedCommand {
                name: name.to_string(),
                span: items[0].span,
            })
        }
    };
    Ok(vec![cmd])
}

/// Elaborate a whole script, stopping at the first error.
pub fn elaborate_script(env: &mut SortRegistry, script: &Script) -> ElabResult<Vec<Spanned<Command>>> {
    let mut out = Vec::new();
    for form in &script.forms {
        for cmd in elaborate_command(env, form)? {
            out.push(Spanned::new(cmd, form.span));
        }
    }
    Ok(out)
}
