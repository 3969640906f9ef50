//! Lexer for constraint scripts
//!
//! Tokenizes SMT-LIB 2 style source into a stream for the parser.

use chumsky::prelude::*;
use std::ops::Range;

use crate::pretty::is_symbol_char;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    LParen,
    RParen,
    Symbol(String),
    Keyword(String),
    Numeral(String),
    Str(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Symbol(s) => write!(f, "{}", s),
            Token::Keyword(k) => write!(f, ":{}", k),
            Token::Numeral(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Character span of a token
pub type Span = Range<usize>;

pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let numeral = text::int(10).map(Token::Numeral);

    let simple_symbol = filter(|c: &char| is_symbol_char(*c) && !c.is_ascii_digit())
        .then(filter(|c: &char| is_symbol_char(*c)).repeated())
        .map(|(first, rest)| std::iter::once(first).chain(rest).collect::<String>());

    let quoted_symbol = none_of('|')
        .repeated()
        .delimited_by(just('|'), just('|'))
        .collect::<String>();

    let symbol = simple_symbol.or(quoted_symbol).map(Token::Symbol);

    let keyword = just(':')
        .ignore_then(filter(|c: &char| is_symbol_char(*c)).repeated().at_least(1))
        .collect::<String>()
        .map(Token::Keyword);

    let string = none_of('"')
        .repeated()
        .delimited_by(just('"'), just('"'))
        .collect::<String>()
        .map(Token::Str);

    let punctuation = just('(').to(Token::LParen).or(just(')').to(Token::RParen));

    // `;` to end of line
    let comment = just(';')
        .then(none_of('\n').repeated())
        .then(just('\n').or_not())
        .ignored();

    let token_or_skip = comment
        .to(None)
        .or(choice((punctuation, keyword, string, numeral, symbol)).map(Some));

    token_or_skip
        .map_with_span(|opt_tok, span| opt_tok.map(|tok| (tok, span)))
        .padded()
        .repeated()
        .then_ignore(end())
        .map(|items| items.into_iter().flatten().collect())
}
