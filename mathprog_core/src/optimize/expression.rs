//! Arithmetic expression trees over named decision variables
//!
//! Objective and constraint terms of the nonlinear problem classes are held
//! as [`Expr`] trees built by [`crate::io::expr_parse`]. A tree can be
//! evaluated numerically against a binding of names to values, or lowered
//! into an
//! [`AffineForm`] when a linear backend needs per-variable coefficients.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use thiserror::Error;

/// An arithmetic expression over numeric literals and named variables
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Number(f64),
    /// A reference to a declared decision variable
    Variable(String),
    /// A unary operation (see [`UnaryOp`])
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// A binary operation (see [`BinaryOp`])
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Unary operators of the expression grammar
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
}

/// Binary operators of the expression grammar
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Exponentiation, written `**`
    Pow,
}

impl BinaryOp {
    fn glyph(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

impl Expr {
    /// Create a new numeric literal node
    pub fn new_number(value: f64) -> Expr {
        Expr::Number(value)
    }

    /// Create a new variable reference node
    pub fn new_variable(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    /// Create a new unary operation node
    pub fn new_unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a new binary operation node
    pub fn new_binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate the expression against a binding of variable names to values
    ///
    /// Only names present in `bindings` resolve; anything else is an
    /// [`ExpressionError::UnboundVariable`]. Nothing outside the binding is
    /// ever consulted.
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use mathprog_core::optimize::expression::{BinaryOp, Expr};
    /// // x + 2 * y
    /// let expr = Expr::new_binary(
    ///     Expr::new_variable("x"),
    ///     BinaryOp::Add,
    ///     Expr::new_binary(Expr::new_number(2.0), BinaryOp::Mul, Expr::new_variable("y")),
    /// );
    /// let mut bindings = IndexMap::new();
    /// bindings.insert("x".to_string(), 1.0);
    /// bindings.insert("y".to_string(), 3.0);
    /// assert_eq!(expr.evaluate(&bindings).unwrap(), 7.0);
    /// ```
    pub fn evaluate(&self, bindings: &IndexMap<String, f64>) -> Result<f64, ExpressionError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => match bindings.get(name) {
                Some(value) => Ok(*value),
                None => Err(ExpressionError::UnboundVariable { name: name.clone() }),
            },
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => Ok(-operand.evaluate(bindings)?),
            },
            Expr::Binary { op, left, right } => {
                let l = left.evaluate(bindings)?;
                let r = right.evaluate(bindings)?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(ExpressionError::DivisionByZero {
                                text: self.to_string(),
                            });
                        }
                        Ok(l / r)
                    }
                    BinaryOp::Pow => Ok(l.powf(r)),
                }
            }
        }
    }

    /// Names of the variables referenced anywhere in the expression, in
    /// first-appearance order (duplicates included)
    pub fn variables(&self) -> Vec<String> {
        match self {
            Expr::Number(_) => Vec::new(),
            Expr::Variable(name) => vec![name.clone()],
            Expr::Unary { operand, .. } => operand.variables(),
            Expr::Binary { left, right, .. } => {
                let mut names = left.variables();
                names.extend(right.variables());
                names
            }
        }
    }

    /// Lower the expression into an affine form (coefficients plus constant)
    ///
    /// Fails with [`ExpressionError::NonlinearTerm`] on any shape a linear
    /// backend cannot express: a product of two variable-carrying terms, a
    /// variable in a divisor, or a variable raised to an exponent other
    /// than 0 or 1.
    pub fn affine_form(&self) -> Result<AffineForm, ExpressionError> {
        match self {
            Expr::Number(value) => Ok(AffineForm::constant(*value)),
            Expr::Variable(name) => Ok(AffineForm::variable(name)),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => Ok(operand.affine_form()?.negate()),
            },
            Expr::Binary { op, left, right } => {
                let l = left.affine_form()?;
                let r = right.affine_form()?;
                match op {
                    BinaryOp::Add => Ok(l.add(r)),
                    BinaryOp::Sub => Ok(l.add(r.negate())),
                    BinaryOp::Mul => {
                        if l.is_constant() {
                            Ok(r.scale(l.constant))
                        } else if r.is_constant() {
                            Ok(l.scale(r.constant))
                        } else {
                            Err(ExpressionError::NonlinearTerm {
                                text: self.to_string(),
                            })
                        }
                    }
                    BinaryOp::Div => {
                        if !r.is_constant() {
                            return Err(ExpressionError::NonlinearTerm {
                                text: self.to_string(),
                            });
                        }
                        if r.constant == 0.0 {
                            return Err(ExpressionError::DivisionByZero {
                                text: self.to_string(),
                            });
                        }
                        Ok(l.scale(1.0 / r.constant))
                    }
                    BinaryOp::Pow => {
                        if !r.is_constant() {
                            return Err(ExpressionError::NonlinearTerm {
                                text: self.to_string(),
                            });
                        }
                        if l.is_constant() {
                            Ok(AffineForm::constant(l.constant.powf(r.constant)))
                        } else if r.constant == 1.0 {
                            Ok(l)
                        } else if r.constant == 0.0 {
                            Ok(AffineForm::constant(1.0))
                        } else {
                            Err(ExpressionError::NonlinearTerm {
                                text: self.to_string(),
                            })
                        }
                    }
                }
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{})", operand),
            },
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.glyph(), right)
            }
        }
    }
}

/// An expression reduced to `sum(coefficient * variable) + constant`
#[derive(Clone, Debug, PartialEq)]
pub struct AffineForm {
    /// Per-variable coefficients, keyed by variable id
    pub coefficients: IndexMap<String, f64>,
    /// Constant term
    pub constant: f64,
}

impl AffineForm {
    /// An affine form holding only a constant
    pub fn constant(value: f64) -> Self {
        AffineForm {
            coefficients: IndexMap::new(),
            constant: value,
        }
    }

    /// The affine form of a single variable with coefficient one
    pub fn variable(name: &str) -> Self {
        let mut coefficients = IndexMap::new();
        coefficients.insert(name.to_string(), 1.0);
        AffineForm {
            coefficients,
            constant: 0.0,
        }
    }

    /// Whether the form carries no variables
    pub fn is_constant(&self) -> bool {
        self.coefficients.is_empty()
    }

    fn add(mut self, other: AffineForm) -> Self {
        for (name, coefficient) in other.coefficients {
            *self.coefficients.entry(name).or_insert(0.0) += coefficient;
        }
        self.constant += other.constant;
        self
    }

    fn negate(self) -> Self {
        self.scale(-1.0)
    }

    fn scale(mut self, factor: f64) -> Self {
        for coefficient in self.coefficients.values_mut() {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

/// Errors from evaluating or lowering an expression
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExpressionError {
    /// The expression references a name outside the supplied binding
    #[error("expression references unbound variable `{name}`")]
    UnboundVariable { name: String },
    /// A division by a zero value or zero constant
    #[error("division by zero in `{text}`")]
    DivisionByZero { text: String },
    /// The expression cannot be reduced to a linear combination
    #[error("term `{text}` is not linear")]
    NonlinearTerm { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn evaluate_linear_combination() {
        // x + 2 * y with x = 1, y = 3
        let expr = Expr::new_binary(
            Expr::new_variable("x"),
            BinaryOp::Add,
            Expr::new_binary(Expr::new_number(2.0), BinaryOp::Mul, Expr::new_variable("y")),
        );
        let result = expr.evaluate(&bindings(&[("x", 1.0), ("y", 3.0)])).unwrap();
        assert_eq!(result, 7.0);
    }

    #[test]
    fn evaluate_unbound_variable() {
        let expr = Expr::new_binary(
            Expr::new_variable("x"),
            BinaryOp::Add,
            Expr::new_variable("z"),
        );
        match expr.evaluate(&bindings(&[("x", 1.0), ("y", 3.0)])) {
            Err(ExpressionError::UnboundVariable { name }) => assert_eq!(name, "z"),
            other => panic!("expected unbound variable error, got {:?}", other),
        }
    }

    #[test]
    fn evaluate_power_and_negation() {
        // -x**2 evaluates as -(x**2)
        let expr = Expr::new_unary(
            UnaryOp::Neg,
            Expr::new_binary(Expr::new_variable("x"), BinaryOp::Pow, Expr::new_number(2.0)),
        );
        let result = expr.evaluate(&bindings(&[("x", 3.0)])).unwrap();
        assert_eq!(result, -9.0);
    }

    #[test]
    fn evaluate_division_by_zero() {
        let expr = Expr::new_binary(Expr::new_variable("x"), BinaryOp::Div, Expr::new_number(0.0));
        match expr.evaluate(&bindings(&[("x", 1.0)])) {
            Err(ExpressionError::DivisionByZero { .. }) => {}
            other => panic!("expected division by zero, got {:?}", other),
        }
    }

    #[test]
    fn affine_form_of_linear_expression() {
        // x + 2*y + 3*z - 4
        let expr = Expr::new_binary(
            Expr::new_binary(
                Expr::new_binary(
                    Expr::new_variable("x"),
                    BinaryOp::Add,
                    Expr::new_binary(
                        Expr::new_number(2.0),
                        BinaryOp::Mul,
                        Expr::new_variable("y"),
                    ),
                ),
                BinaryOp::Add,
                Expr::new_binary(Expr::new_number(3.0), BinaryOp::Mul, Expr::new_variable("z")),
            ),
            BinaryOp::Sub,
            Expr::new_number(4.0),
        );
        let affine = expr.affine_form().unwrap();
        assert_eq!(affine.coefficients.get("x"), Some(&1.0));
        assert_eq!(affine.coefficients.get("y"), Some(&2.0));
        assert_eq!(affine.coefficients.get("z"), Some(&3.0));
        assert_eq!(affine.constant, -4.0);
    }

    #[test]
    fn affine_form_rejects_products_of_variables() {
        let expr = Expr::new_binary(
            Expr::new_variable("x"),
            BinaryOp::Mul,
            Expr::new_variable("y"),
        );
        match expr.affine_form() {
            Err(ExpressionError::NonlinearTerm { .. }) => {}
            other => panic!("expected nonlinear term error, got {:?}", other),
        }
    }

    #[test]
    fn affine_form_power_rules() {
        // x**1 is linear, x**2 is not
        let linear = Expr::new_binary(Expr::new_variable("x"), BinaryOp::Pow, Expr::new_number(1.0));
        assert_eq!(
            linear.affine_form().unwrap().coefficients.get("x"),
            Some(&1.0)
        );

        let quadratic =
            Expr::new_binary(Expr::new_variable("x"), BinaryOp::Pow, Expr::new_number(2.0));
        assert!(quadratic.affine_form().is_err());
    }

    #[test]
    fn affine_form_merges_repeated_variables() {
        // x + x collapses to a single coefficient of 2
        let expr = Expr::new_binary(
            Expr::new_variable("x"),
            BinaryOp::Add,
            Expr::new_variable("x"),
        );
        let affine = expr.affine_form().unwrap();
        assert_eq!(affine.coefficients.len(), 1);
        assert_eq!(affine.coefficients.get("x"), Some(&2.0));
    }

    #[test]
    fn display_is_fully_parenthesized() {
        let expr = Expr::new_binary(
            Expr::new_variable("x"),
            BinaryOp::Add,
            Expr::new_binary(Expr::new_number(2.0), BinaryOp::Mul, Expr::new_variable("y")),
        );
        assert_eq!(format!("{}", expr), "(x + (2 * y))");
    }
}
