//! Module for parsing arithmetic expression strings into expression trees

use indexmap::IndexSet;
use thiserror::Error;

use crate::io::expr_parse::lexer::LexerError;
use crate::io::expr_parse::parser::ParseError;
use crate::optimize::expression::Expr;

mod lexer;
pub mod parser;
mod token;

/// Parse an arithmetic expression string into an expression tree
///
/// Identifiers are validated against `variables`, the set of declared
/// decision-variable names; nothing outside that set can be referenced.
///
/// # Parameters
/// - `input`: &str holding the arithmetic expression
/// - `variables`: the declared variable names the expression may use
///
/// # Returns
/// Parse result which is
/// - `Ok`: the root node of the expression tree
/// - `Err`: the [`ExprParseError`] describing the issue with the
///     expression which was being parsed
///
/// # Examples
/// ```rust
/// use indexmap::IndexSet;
/// use mathprog_core::io::expr_parse::parse_expression;
/// let variables: IndexSet<String> =
///     ["x", "y"].iter().map(|name| name.to_string()).collect();
/// let expr = parse_expression("80*x - 3*x**2 + y", &variables).unwrap();
/// ```
pub fn parse_expression(input: &str, variables: &IndexSet<String>) -> Result<Expr, ExprParseError> {
    // Start by creating a lexer
    let mut lexer = lexer::Lexer::new(input);
    // Convert the expression string into tokens
    let tokens = lexer.lex()?;

    // Now parse those tokens into an expression tree
    let mut parser = parser::ExprParser::new(tokens, variables);
    let expr = parser.parse()?;
    Ok(expr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprParseError {
    /// Lexing Error
    #[error("error during lexing of the expression: {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("error during parsing of the expression: {0}")]
    ParsingError(#[from] ParseError),
}
