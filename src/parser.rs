//! Parser for constraint scripts
//!
//! Parses token streams into spanned s-expressions. Commands and formulas
//! are recognized later, during elaboration.

use chumsky::prelude::*;

use crate::ast::{SExpr, Script, Span, Spanned};
use crate::lexer::Token;

/// Create a parser for a complete script
pub fn parser() -> impl Parser<Token, Script, Error = Simple<Token>> + Clone {
    sexpr()
        .repeated()
        .then_ignore(end())
        .map(|forms| Script { forms })
}

fn to_span(span: crate::lexer::Span) -> Span {
    Span::new(span.start, span.end)
}

/// A single s-expression
pub fn sexpr() -> impl Parser<Token, Spanned<SExpr>, Error = Simple<Token>> + Clone {
    recursive(|sexpr| {
        let atom = select! {
            Token::Symbol(s) => SExpr::Symbol(s),
            Token::Keyword(k) => SExpr::Keyword(k),
            Token::Numeral(n) => SExpr::Numeral(n),
            Token::Str(s) => SExpr::Str(s),
        };

        let list = sexpr
            .repeated()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(SExpr::List);

        atom.or(list)
            .map_with_span(|node, span| Spanned::new(node, to_span(span)))
            .labelled("s-expression")
    })
}
