use indexmap::IndexSet;
use thiserror::Error;

use crate::io::expr_parse::token::Token;
use crate::optimize::expression::{BinaryOp, Expr, UnaryOp};

/*
Expression Grammar:
expression -> term (("+" | "-") term)* ;
term -> unary (("*" | "/") unary)* ;
unary -> "-" unary | power ;
power -> primary ("**" unary)? ;
primary -> NUMBER | IDENTIFIER | "(" expression ")" ;

`**` is right associative and binds tighter than unary minus, so
-x**2 parses as -(x**2) and 2**-1 is legal.
*/

/// Arithmetic expression parser
///
/// Identifiers resolve strictly against the supplied declared-variable
/// set; any other name is an error, never a lookup anywhere else.
pub struct ExprParser<'v> {
    /// Vector of tokens from the expression string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// The declared variable names identifiers may reference
    variables: &'v IndexSet<String>,
}

impl<'v> ExprParser<'v> {
    /// Create a new ExprParser
    pub fn new(tokens: Vec<Token>, variables: &'v IndexSet<String>) -> ExprParser<'v> {
        ExprParser {
            tokens,
            current: 0,
            variables,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into an expression tree
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.expression()?;
        if !self.is_at_end() {
            // If the entire input has not been parsed, an error has occurred
            return Err(ParseError::EarlyTermination);
        }
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;

        while self.match_token(&[Token::Plus, Token::Minus]) {
            let op = match self.previous() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Err(ParseError::InvalidOperator),
            };
            let right = self.term()?;
            expr = Expr::new_binary(expr, op, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;

        while self.match_token(&[Token::Star, Token::Slash]) {
            let op = match self.previous() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Err(ParseError::InvalidOperator),
            };
            let right = self.unary()?;
            expr = Expr::new_binary(expr, op, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&[Token::Minus]) {
            let operand = self.unary()?;
            return Ok(Expr::new_unary(UnaryOp::Neg, operand));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if self.match_token(&[Token::Pow]) {
            // Recursing through unary makes ** right associative and lets
            // the exponent carry its own sign
            let exponent = self.unary()?;
            return Ok(Expr::new_binary(base, BinaryOp::Pow, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if let Some(value) = self.match_number() {
            return Ok(Expr::new_number(value));
        }

        if let Some(name) = self.match_identifier() {
            if !self.variables.contains(&name) {
                return Err(ParseError::UnboundVariable { name });
            }
            return Ok(Expr::new_variable(&name));
        }

        if self.match_token(&[Token::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches one of the
    /// provided `tokens`, if it does advance and return true, otherwise
    /// return false
    fn match_token(&mut self, tokens: &[Token]) -> bool {
        for t in tokens {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Similar to [`Self::match_token`], but for matching a numeric literal
    fn match_number(&mut self) -> Option<f64> {
        if self.is_at_end() {
            return None;
        }
        if let Token::Number(value) = self.peek() {
            self.advance();
            return Some(value);
        }
        None
    }

    /// Similar to [`Self::match_token`], but for matching an identifier
    /// token. If the current token is an identifier return its name,
    /// otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if self.is_at_end() {
            return None;
        }
        if let Token::Identifier(name) = self.peek() {
            self.advance();
            return Some(name);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek() == *token
    }

    /// Advance one position unless at the end of the token vector, then
    /// return the previous token
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Check whether the parser is at the end of the token vector
    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    /// Get a copy of the previous token
    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    /// Check whether the current token matches an input token, if it
    /// matches advance to the next token, and if it doesn't return an
    /// error. Used for matching closing parentheses.
    fn consume(&mut self, token: Token, msg: &str) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Token was expected to be an arithmetic operator but was not
    #[error("invalid operator encountered, expected one of `+ - * / **`")]
    InvalidOperator,
    /// Missing expected token (e.g. a right parenthesis)
    #[error("missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("no expression found, check that the expression string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("parsing terminated early, check for two adjacent terms with no operator between them")]
    EarlyTermination,
    /// The expression references a name outside the declared variables
    #[error("expression references unbound variable `{name}`")]
    UnboundVariable { name: String },
}
