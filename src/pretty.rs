//! S-expression rendering
//!
//! Renders expressions in the constraint-exchange (SMT-LIB 2) syntax that
//! the parser reads, so output can be fed back in.

use std::fmt::Write as _;

use indexmap::IndexSet;

use crate::expr::{Expr, Sort, Term, Variable};

/// Characters allowed in an unquoted symbol besides ASCII alphanumerics
const SYMBOL_PUNCT: &str = "~!@$%^&*_-+=<>.?/";

pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_PUNCT.contains(c)
}

/// Render a name as a symbol, quoting it with `|...|` when needed.
pub fn symbol(name: &str) -> String {
    let simple = name.chars().next().is_some_and(|c| !c.is_ascii_digit())
        && name.chars().all(is_symbol_char);
    if simple {
        name.to_string()
    } else {
        format!("|{}|", name)
    }
}

/// An s-expression writer
pub struct Pretty {
    output: String,
}

impl Default for Pretty {
    fn default() -> Self {
        Self::new()
    }
}

impl Pretty {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn list(&mut self, op: &str, items: &[&Expr]) {
        self.write("(");
        self.write(op);
        for item in items {
            self.write(" ");
            self.expr(item);
        }
        self.write(")");
    }

    pub fn term(&mut self, t: &Term) {
        match t {
            Term::Var(v) => self.write(&symbol(v.name())),
            Term::Value(v) => self.write(&symbol(v.name())),
        }
    }

    /// `Terminate` has no surface syntax and renders as `true`, as do empty
    /// conjunctions. Empty disjunctions render as `false`.
    pub fn expr(&mut self, e: &Expr) {
        match e {
            Expr::True | Expr::Terminate => self.write("true"),
            Expr::False => self.write("false"),
            Expr::Eq(lhs, rhs) => {
                self.write("(= ");
                self.write(&symbol(lhs.name()));
                self.write(" ");
                self.term(rhs);
                self.write(")");
            }
            Expr::Not(inner) => self.list("not", &[&**inner]),
            Expr::And(items) if items.is_empty() => self.write("true"),
            Expr::Or(items) if items.is_empty() => self.write("false"),
            Expr::And(items) => self.list("and", &items.iter().collect::<Vec<_>>()),
            Expr::Or(items) => self.list("or", &items.iter().collect::<Vec<_>>()),
            Expr::Implies(l, r) => self.list("=>", &[&**l, &**r]),
            Expr::Ite(c, t, f) => self.list("ite", &[&**c, &**t, &**f]),
        }
    }

    /// `(declare-datatypes ((S 0)) (((a) (b))))`
    pub fn sort_decl(&mut self, sort: &Sort) {
        let ctors: Vec<String> = sort
            .values()
            .iter()
            .map(|v| format!("({})", symbol(v.name())))
            .collect();
        let _ = writeln!(
            self.output,
            "(declare-datatypes (({} 0)) (({})))",
            symbol(sort.name()),
            ctors.join(" ")
        );
    }

    /// `(declare-fun x () S)`
    pub fn var_decl(&mut self, var: &Variable) {
        let _ = writeln!(
            self.output,
            "(declare-fun {} () {})",
            symbol(var.name()),
            symbol(var.sort().name())
        );
    }

    pub fn assertion(&mut self, e: &Expr) {
        self.write("(assert ");
        self.expr(e);
        self.writeln(")");
    }
}

/// Render one expression as a single-line s-expression.
pub fn to_smt2(e: &Expr) -> String {
    let mut p = Pretty::new();
    p.expr(e);
    p.finish()
}

/// Render a complete script: sort declarations, variable declarations and
/// one `assert` per constraint.
///
/// Every sort a variable ranges over is declared, followed by the domain
/// itself if no variable uses it.
pub fn script<'a>(
    domain: &Sort,
    variables: impl IntoIterator<Item = &'a Variable>,
    constraints: &[Expr],
) -> String {
    let variables: Vec<&Variable> = variables.into_iter().collect();
    let mut sorts: IndexSet<&Sort> = variables.iter().map(|v| v.sort().as_ref()).collect();
    sorts.insert(domain);

    let mut p = Pretty::new();
    for sort in &sorts {
        p.sort_decl(sort);
    }
    for var in variables {
        p.var_decl(var);
    }
    for c in constraints {
        p.assertion(c);
    }
    p.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Value;
    use std::rc::Rc;

    fn setup() -> (Rc<Sort>, Variable, Variable) {
        let any = Rc::new(Sort::new("Any", ["Int", "Pointer"].map(Value::new)));
        let x = Variable::new("x", any.clone());
        let y = Variable::new("y", any.clone());
        (any, x, y)
    }

    #[test]
    fn test_symbol_quoting() {
        assert_eq!(symbol("x"), "x");
        assert_eq!(symbol("a.b-c"), "a.b-c");
        assert_eq!(symbol("has space"), "|has space|");
        assert_eq!(symbol("1st"), "|1st|");
        assert_eq!(symbol(""), "||");
    }

    #[test]
    fn test_expr_forms() {
        let (_, x, y) = setup();
        let int = Value::new("Int");
        let e = Expr::ite(
            Expr::eq(&x, &y),
            Expr::implies(Expr::neq(&x, &int), Expr::or([Expr::eq(&y, &int), Expr::False])),
            Expr::Terminate,
        );
        assert_eq!(
            to_smt2(&e),
            "(ite (= x y) (=> (not (= x Int)) (or (= y Int) false)) true)"
        );
        assert_eq!(to_smt2(&Expr::and([])), "true");
        assert_eq!(to_smt2(&Expr::or([])), "false");
    }

    #[test]
    fn test_script() {
        let (any, x, y) = setup();
        let ints = Rc::new(Sort::new("Ints", [Value::new("Int")]));
        let w = Variable::new("w", ints);
        let out = script(&any, [&x, &y, &w], &[Expr::eq(&x, &y)]);
        assert_eq!(
            out,
            "(declare-datatypes ((Any 0)) (((Int) (Pointer))))\n\
             (declare-datatypes ((Ints 0)) (((Int))))\n\
             (declare-fun x () Any)\n\
             (declare-fun y () Any)\n\
             (declare-fun w () Ints)\n\
             (assert (= x y))\n"
        );
    }
}
