//! Module providing Token struct for lexing

/// Represents tokens of the arithmetic expression grammar
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    /// The exponentiation operator, written `**`
    Pow,
    LeftParen,
    RightParen,
    Eof,
}
