//! Provides structs for representing constraints in an assembled program
use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::optimize::expression::Expr;

/// The six canonical relational operators
///
/// User input carries the symbols `≤ ≥ = < > ≠`; canonicalization maps them
/// 1:1 onto this enum and [`ComparisonOp::symbol`] inverts the mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `!=`
    Ne,
}

impl ComparisonOp {
    /// Canonicalize an operator symbol as entered by the user
    ///
    /// # Examples
    /// ```rust
    /// use mathprog_core::optimize::constraint::ComparisonOp;
    /// assert_eq!(ComparisonOp::from_symbol("≤").unwrap(), ComparisonOp::Le);
    /// assert!(ComparisonOp::from_symbol("=<").is_err());
    /// ```
    pub fn from_symbol(symbol: &str) -> Result<ComparisonOp, OperatorError> {
        match symbol {
            "≤" => Ok(ComparisonOp::Le),
            "≥" => Ok(ComparisonOp::Ge),
            "=" => Ok(ComparisonOp::Eq),
            "<" => Ok(ComparisonOp::Lt),
            ">" => Ok(ComparisonOp::Gt),
            "≠" => Ok(ComparisonOp::Ne),
            _ => Err(OperatorError {
                symbol: symbol.to_string(),
            }),
        }
    }

    /// Canonicalize a comparison tag (the form rows carry after entry-time
    /// canonicalization in the expression classes)
    pub fn from_tag(tag: &str) -> Result<ComparisonOp, OperatorError> {
        match tag {
            "<=" => Ok(ComparisonOp::Le),
            ">=" => Ok(ComparisonOp::Ge),
            "==" => Ok(ComparisonOp::Eq),
            "<" => Ok(ComparisonOp::Lt),
            ">" => Ok(ComparisonOp::Gt),
            "!=" => Ok(ComparisonOp::Ne),
            _ => Err(OperatorError {
                symbol: tag.to_string(),
            }),
        }
    }

    /// The user-facing symbol of this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Le => "≤",
            ComparisonOp::Ge => "≥",
            ComparisonOp::Eq => "=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ne => "≠",
        }
    }

    /// The canonical comparison tag of this operator
    pub fn tag(&self) -> &'static str {
        match self {
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Eq => "==",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ne => "!=",
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Error produced when an operator symbol is not one of the six known ones
#[derive(Clone, Debug, Error, PartialEq)]
#[error("unrecognized relational operator `{symbol}`")]
pub struct OperatorError {
    /// The symbol that failed to canonicalize
    pub symbol: String,
}

/// A single `coefficient * variable` term of a flat linear combination
#[derive(Clone, Debug, PartialEq)]
pub struct LinearTerm {
    /// Id of the referenced [`crate::optimize::variable::Variable`]
    pub variable: String,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for LinearTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}

/// Left-hand side of a constraint
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintExpr {
    /// A flat linear combination, built from parameter tables
    Linear(Vec<LinearTerm>),
    /// An arbitrary arithmetic term, built by the expression parser
    Expression(Expr),
}

/// A constraint of an assembled program: `lhs <op> rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Identifier of the constraint, unique within one program
    pub id: String,
    /// Left-hand side term
    pub lhs: ConstraintExpr,
    /// Canonical relational operator
    pub op: ComparisonOp,
    /// Numeric right-hand side
    pub rhs: f64,
}

impl Constraint {
    /// Create a new constraint over a flat linear combination
    pub fn new_linear(id: &str, terms: Vec<LinearTerm>, op: ComparisonOp, rhs: f64) -> Self {
        Constraint {
            id: id.to_string(),
            lhs: ConstraintExpr::Linear(terms),
            op,
            rhs,
        }
    }

    /// Create a new constraint over an expression tree
    pub fn new_expression(id: &str, expr: Expr, op: ComparisonOp, rhs: f64) -> Self {
        Constraint {
            id: id.to_string(),
            lhs: ConstraintExpr::Expression(expr),
            op,
            rhs,
        }
    }

    /// Ids of the variables referenced by the left-hand side
    pub fn variables(&self) -> Vec<String> {
        match &self.lhs {
            ConstraintExpr::Linear(terms) => {
                terms.iter().map(|term| term.variable.clone()).collect()
            }
            ConstraintExpr::Expression(expr) => expr.variables(),
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.lhs {
            ConstraintExpr::Linear(terms) => {
                let joined = terms
                    .iter()
                    .map(|term| term.to_string())
                    .collect::<Vec<_>>()
                    .join(" + ");
                write!(f, "{} {} {}", joined, self.op, self.rhs)
            }
            ConstraintExpr::Expression(expr) => {
                write!(f, "{} {} {}", expr, self.op, self.rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYMBOLS: [&str; 6] = ["≤", "≥", "=", "<", ">", "≠"];
    const TAGS: [&str; 6] = ["<=", ">=", "==", "<", ">", "!="];

    #[test]
    fn canonicalization_is_a_bijection() {
        let mut seen = Vec::new();
        for symbol in SYMBOLS {
            let op = ComparisonOp::from_symbol(symbol).unwrap();
            assert!(!seen.contains(&op), "two symbols map to {:?}", op);
            seen.push(op);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn symbol_round_trips() {
        for symbol in SYMBOLS {
            let op = ComparisonOp::from_symbol(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
    }

    #[test]
    fn tag_round_trips() {
        for tag in TAGS {
            let op = ComparisonOp::from_tag(tag).unwrap();
            assert_eq!(op.tag(), tag);
        }
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        for bad in ["=<", "<<", "", "<=>"] {
            match ComparisonOp::from_symbol(bad) {
                Err(OperatorError { symbol }) => assert_eq!(symbol, bad),
                Ok(op) => panic!("`{}` unexpectedly canonicalized to {:?}", bad, op),
            }
        }
    }

    #[test]
    fn linear_constraint_display() {
        let constraint = Constraint::new_linear(
            "c1",
            vec![
                LinearTerm {
                    variable: "Desk".to_string(),
                    coefficient: 8.0,
                },
                LinearTerm {
                    variable: "Table".to_string(),
                    coefficient: 6.0,
                },
            ],
            ComparisonOp::Le,
            48.0,
        );
        assert_eq!(format!("{}", constraint), "8*Desk + 6*Table <= 48");
    }
}
