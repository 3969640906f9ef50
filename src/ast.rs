//! Syntax tree for constraint scripts
//!
//! Scripts are sequences of s-expressions. The tree keeps source spans on
//! every node so elaboration errors can point at the offending text.

use std::fmt;

/// A span in the source code, for error reporting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// A node with source location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SExpr {
    /// Plain or `|quoted|` symbol, stored unquoted
    Symbol(String),
    /// `:name`, stored without the colon
    Keyword(String),
    Numeral(String),
    /// String literal, stored without the quotes
    Str(String),
    List(Vec<Spanned<SExpr>>),
}

impl SExpr {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Spanned<SExpr>]> {
        match self {
            SExpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading symbol of a list, e.g. `assert` in `(assert ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.node.as_symbol()
    }
}

/// A parsed script
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub forms: Vec<Spanned<SExpr>>,
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Symbol(s) => f.write_str(&crate::pretty::symbol(s)),
            SExpr::Keyword(k) => write!(f, ":{}", k),
            SExpr::Numeral(n) => f.write_str(n),
            SExpr::Str(s) => write!(f, "\"{}\"", s),
            SExpr::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item.node)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for form in &self.forms {
            writeln!(f, "{}", form.node)?;
        }
        Ok(())
    }
}
