//! Unit tests for lexer, parser and script loading

use chumsky::Parser;
use finsat::ast::SExpr;
use finsat::lexer::{lexer, Token};
use finsat::{load, parse, ElabError, Expr, Satisfiability, SolverOptions, Term};

// ============================================================================
// Lexer tests
// ============================================================================

fn tokens(input: &str) -> Vec<Token> {
    lexer()
        .parse(input)
        .unwrap()
        .into_iter()
        .map(|(t, _)| t)
        .collect()
}

#[test]
fn test_lex_command() {
    assert_eq!(
        tokens("(declare-fun x () Kind)"),
        vec![
            Token::LParen,
            Token::Symbol("declare-fun".to_string()),
            Token::Symbol("x".to_string()),
            Token::LParen,
            Token::RParen,
            Token::Symbol("Kind".to_string()),
            Token::RParen,
        ]
    );
}

#[test]
fn test_lex_atoms() {
    assert_eq!(
        tokens(":named |a b| \"text\" 42 =>"),
        vec![
            Token::Keyword("named".to_string()),
            Token::Symbol("a b".to_string()),
            Token::Str("text".to_string()),
            Token::Numeral("42".to_string()),
            Token::Symbol("=>".to_string()),
        ]
    );
}

#[test]
fn test_lex_skips_comments() {
    let input = "; header\n(check-sat) ; trailing\n; last line without newline";
    assert_eq!(
        tokens(input),
        vec![
            Token::LParen,
            Token::Symbol("check-sat".to_string()),
            Token::RParen,
        ]
    );
}

#[test]
fn test_lex_spans() {
    let spans: Vec<_> = lexer()
        .parse("(assert p)")
        .unwrap()
        .into_iter()
        .map(|(_, s)| s)
        .collect();
    assert_eq!(spans, vec![0..1, 1..7, 8..9, 9..10]);
}

#[test]
fn test_lex_rejects_unterminated_string() {
    assert!(lexer().parse("(set-info :source \"oops)").is_err());
}

// ============================================================================
// Parser tests
// ============================================================================

#[test]
fn test_parse_nested_lists() {
    let script = parse("(assert (and (= x y) (not (= y Int))))").unwrap();
    assert_eq!(script.forms.len(), 1);
    let form = &script.forms[0];
    assert_eq!(form.node.head(), Some("assert"));
    let args = form.node.as_list().unwrap();
    assert_eq!(args[1].node.head(), Some("and"));
    assert_eq!(form.span.start, 0);
    assert_eq!(form.span.end, 38);
}

#[test]
fn test_parse_display_roundtrip() {
    let src = "(declare-datatypes () ((Kind Int |Weird Name|)))\n(check-sat)\n";
    let script = parse(src).unwrap();
    assert_eq!(script.to_string(), src);
}

#[test]
fn test_parse_empty_script() {
    assert!(parse("").unwrap().forms.is_empty());
    assert!(parse("; only a comment\n").unwrap().forms.is_empty());
}

#[test]
fn test_parse_unbalanced_parens() {
    assert!(matches!(parse("(assert (= x y)"), Err(ElabError::Parse(_))));
    assert!(matches!(parse("(check-sat))"), Err(ElabError::Parse(_))));
}

#[test]
fn test_parse_atoms_at_top_level() {
    let script = parse("check-sat 7").unwrap();
    assert_eq!(script.forms[0].node, SExpr::Symbol("check-sat".to_string()));
    assert_eq!(script.forms[1].node, SExpr::Numeral("7".to_string()));
}

// ============================================================================
// Loading tests
// ============================================================================

const KINDS: &str = "
(set-logic QF_DT)
(declare-datatypes () ((Kind Int Pointer PointerOffset)))
(declare-datatypes ((Ref 0)) (((Pointer) (PointerOffset))))
(declare-fun x () Kind)
(declare-const r Ref)
(assert (or (= x Pointer) (= x PointerOffset)))
(assert (= r x))
(check-sat)
(get-model)
";

#[test]
fn test_load_collects_sorts_variables_and_assertions() {
    let problem = load(KINDS).unwrap();
    assert_eq!(problem.registry.sort_count(), 2);
    let names: Vec<_> = problem.domain.values().iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["Int", "Pointer", "PointerOffset"]);
    assert_eq!(problem.constraints.len(), 2);

    let x = problem.registry.variable("x").unwrap();
    let r = problem.registry.variable("r").unwrap();
    assert_eq!(x.sort().name(), "Kind");
    assert_eq!(r.sort().name(), "Ref");
    // Variables are oriented to the left of an equality
    assert_eq!(problem.constraints[1], Expr::Eq(r.clone(), Term::Var(x.clone())));
}

#[test]
fn test_load_then_solve() {
    let problem = load(KINDS).unwrap();
    let mut solver = problem.solver(SolverOptions::default());
    assert_eq!(solver.check().unwrap(), Satisfiability::Sat);
    let model = solver.model().unwrap();
    let (_, xs) = model.get_by_name("x").unwrap();
    let names: Vec<_> = xs.iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["Pointer", "PointerOffset"]);
}

#[test]
fn test_load_unknown_symbol() {
    let src = "(declare-datatypes () ((Kind A B)))\n(assert (= y A))";
    match load(src) {
        Err(ElabError::UnknownSymbol { name, span }) => {
            assert_eq!(name, "y");
            assert_eq!(&src[span.range()], "y");
        }
        other => panic!("expected unknown symbol, got {:?}", other),
    }
}

#[test]
fn test_load_unknown_sort() {
    let err = load("(declare-fun x () Nope)").unwrap_err();
    assert!(matches!(err, ElabError::UnknownSort { ref name, .. } if name == "Nope"));
}

#[test]
fn test_load_unsupported_command() {
    let err = load("(define-fun f () Bool true)").unwrap_err();
    assert!(matches!(err, ElabError::UnsupportedCommand { ref name, .. } if name == "define-fun"));
}

#[test]
fn test_load_rejects_functions_with_parameters() {
    let src = "(declare-datatypes () ((Kind A B)))\n(declare-fun f (Kind) Kind)";
    assert!(matches!(load(src), Err(ElabError::Malformed { .. })));
}

#[test]
fn test_load_distinct_and_chained_equality() {
    let src = "
        (declare-datatypes () ((Kind A B C)))
        (declare-fun x () Kind)
        (declare-fun y () Kind)
        (declare-fun z () Kind)
        (assert (distinct x y))
        (assert (= x y z))
    ";
    let problem = load(src).unwrap();
    let x = problem.registry.variable("x").unwrap();
    let y = problem.registry.variable("y").unwrap();
    let z = problem.registry.variable("z").unwrap();
    assert_eq!(problem.constraints[0], Expr::neq(x, y));
    assert_eq!(
        problem.constraints[1],
        Expr::and([Expr::eq(x, y), Expr::eq(y, z)])
    );
}
