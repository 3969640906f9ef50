//! Formula elaboration: s-expressions to [`Expr`] trees.

use crate::ast::{SExpr, Span, Spanned};
use crate::error::{ElabError, ElabResult};
use crate::expr::{Expr, Term, Value, Variable};

use super::env::SortRegistry;

/// An equality operand after symbol resolution
#[derive(Clone)]
enum Operand {
    Var(Variable),
    Value(Value),
}

fn operand(env: &SortRegistry, sexpr: &Spanned<SExpr>) -> ElabResult<Operand> {
    let Some(name) = sexpr.node.as_symbol() else {
        return Err(ElabError::malformed(
            format!("expected a variable or value, found {}", sexpr.node),
            sexpr.span,
        ));
    };
    if let Some(var) = env.variable(name) {
        Ok(Operand::Var(var.clone()))
    } else if let Some(value) = env.value(name) {
        Ok(Operand::Value(value))
    } else {
        Err(ElabError::UnknownSymbol {
            name: name.to_string(),
            span: sexpr.span,
        })
    }
}

/// `a = b`, oriented so a variable is on the left. Two values fold to a
/// constant.
fn equality(a: Operand, b: Operand) -> Expr {
    match (a, b) {
        (Operand::Var(x), Operand::Var(y)) => Expr::Eq(x, Term::Var(y)),
        (Operand::Var(x), Operand::Value(v)) | (Operand::Value(v), Operand::Var(x)) => {
            Expr::Eq(x, Term::Value(v))
        }
        (Operand::Value(u), Operand::Value(v)) => {
            if u == v {
                Expr::True
            } else {
                Expr::False
            }
        }
    }
}

fn operands(env: &SortRegistry, args: &[Spanned<SExpr>]) -> ElabResult<Vec<Operand>> {
    args.iter().map(|a| operand(env, a)).collect()
}

fn formulas(env: &SortRegistry, args: &[Spanned<SExpr>]) -> ElabResult<Vec<Expr>> {
    args.iter().map(|a| elaborate_formula(env, a)).collect()
}

fn arity(op: &str, args: &[Spanned<SExpr>], min: usize, max: Option<usize>, span: Span) -> ElabResult<()> {
    let n = args.len();
    if n < min || max.is_some_and(|m| n > m) {
        let expected = match max {
            Some(m) if m == min => format!("{}", min),
            Some(m) => format!("{} to {}", min, m),
            None => format!("at least {}", min),
        };
        return Err(ElabError::malformed(
            format!("'{}' expects {} arguments, got {}", op, expected, n),
            span,
        ));
    }
    Ok(())
}

/// A single formula, or the conjunction of several.
fn conjoin(mut items: Vec<Expr>) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Expr::And(items)
    }
}

/// Elaborate a boolean formula.
pub fn elaborate_formula(env: &SortRegistry, sexpr: &Spanned<SExpr>) -> ElabResult<Expr> {
    let span = sexpr.span;
    let items = match &sexpr.node {
        SExpr::Symbol(name) => {
            return match name.as_str() {
                "true" => Ok(Expr::True),
                "false" => Ok(Expr::False),
                _ if env.variable(name).is_some() || env.value(name).is_some() => {
                    Err(ElabError::malformed(
                        format!("'{}' is not a boolean formula", name),
                        span,
                    ))
                }
                _ => Err(ElabError::UnknownSymbol {
                    name: name.clone(),
                    span,
                }),
            };
        }
        SExpr::List(items) if !items.is_empty() => items,
        other => {
            return Err(ElabError::malformed(
                format!("expected a formula, found {}", other),
                span,
            ))
        }
    };

    let Some(op) = items[0].node.as_symbol() else {
        return Err(ElabError::malformed("expected an operator", items[0].span));
    };
    let args = &items[1..];

    match op {
        "and" => Ok(Expr::And(formulas(env, args)?)),
        "or" => Ok(Expr::Or(formulas(env, args)?)),
        "not" => {
            arity(op, args, 1, Some(1), span)?;
            Ok(Expr::not(elaborate_formula(env, &args[0])?))
        }
        "=>" => {
            arity(op, args, 2, None, span)?;
            let mut parts = formulas(env, args)?;
            let mut acc = parts.pop().unwrap_or(Expr::True);
            while let Some(left) = parts.pop() {
                acc = Expr::implies(left, acc);
            }
            Ok(acc)
        }
        "ite" => {
            arity(op, args, 3, Some(3), span)?;
            Ok(Expr::ite(
                elaborate_formula(env, &args[0])?,
                elaborate_formula(env, &args[1])?,
                elaborate_formula(env, &args[2])?,
            ))
        }
        "=" => {
            arity(op, args, 2, None, span)?;
            let ops = operands(env, args)?;
            let chain = ops
                .windows(2)
                .map(|pair| equality(pair[0].clone(), pair[1].clone()))
                .collect();
            Ok(conjoin(chain))
        }
        "distinct" => {
            arity(op, args, 2, None, span)?;
            let mut pairs = Vec::new();
            for (i, a) in args.iter().enumerate() {
                for b in &args[i + 1..] {
                    pairs.push(Expr::not(equality(operand(env, a)?, operand(env, b)?)));
                }
            }
            Ok(conjoin(pairs))
        }
        // Annotations such as `:named` carry no meaning here
        "!" => {
            arity(op, args, 1, None, span)?;
            elaborate_formula(env, &args[0])
        }
        _ => Err(ElabError::UnknownSymbol {
            name: op.to_string(),
            span: items[0].span,
        }),
    }
}
