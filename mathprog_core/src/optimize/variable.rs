//! Module providing representation of decision variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A decision variable of an assembled program
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(setter(into))]
pub struct Variable {
    /// Used to identify the variable; element name for the element-indexed
    /// classes, user-declared scalar name otherwise
    pub id: String,
    /// Domain of the variable (see [`VariableType`])
    #[builder(default = "VariableType::Continuous")]
    pub variable_type: VariableType,
    /// Lowest value the variable may take
    #[builder(default = "f64::NEG_INFINITY")]
    pub lower_bound: f64,
    /// Highest value the variable may take
    #[builder(default = "f64::INFINITY")]
    pub upper_bound: f64,
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.variable_type)
    }
}

/// Represents the domain of a variable in an assembled program
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
        }
    }
}
