//! Parsing and validation of raw user input
//!
//! Row validation follows a skip-and-continue policy: a malformed row is
//! reported with its 1-based index and dropped, and the remaining rows are
//! still processed. Whole-model preconditions (parameter coverage) are
//! handled by the caller instead.
use indexmap::{IndexMap, IndexSet};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::optimize::constraint::ComparisonOp;
use crate::program::Diagnostic;

/// Split comma-separated text into clean identifiers
///
/// Each segment is trimmed, interior spaces become underscores and empty
/// segments are silently dropped. Duplicates are not detected here; they
/// surface later as model-assembly conflicts.
///
/// # Examples
/// ```rust
/// use mathprog_core::program::input::parse_identifier_list;
/// let identifiers = parse_identifier_list(" Desk, Dining Table ,, Chairs ");
/// assert_eq!(identifiers, vec!["Desk", "Dining_Table", "Chairs"]);
/// ```
pub fn parse_identifier_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|item| item.trim().replace(' ', "_"))
        .filter(|item| !item.is_empty())
        .collect()
}

/// One constraint row of the linear classes, as entered
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearConstraintRow {
    /// Name of the parameter whose table forms the left-hand side
    pub parameter: String,
    /// Relational operator symbol, e.g. `≤`
    pub operator: String,
    /// Right-hand side as entered, coerced to a float during validation
    pub value: String,
}

/// One constraint row of the expression classes, as entered
///
/// The operator arrives as a canonical comparison tag (`<=`, `>=`, ...)
/// because the entry form canonicalizes the symbol before handing rows over.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ExpressionConstraintRow {
    /// Left-hand side arithmetic expression text
    pub expression: String,
    /// Canonical comparison tag
    pub operator: String,
    /// Numeric right-hand side
    pub value: f64,
}

/// A linear-mode row that survived validation
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedLinearRow {
    /// 1-based index of the row as entered
    pub row: usize,
    pub parameter: String,
    pub op: ComparisonOp,
    pub value: f64,
}

/// An expression-mode row that survived validation
///
/// The expression text is still unparsed here; expression failures are
/// fatal to the whole solve and are raised during model assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedExpressionRow {
    /// 1-based index of the row as entered
    pub row: usize,
    pub expression: String,
    pub op: ComparisonOp,
    pub value: f64,
}

/// Validate linear-mode rows against the declared parameter set
///
/// Returns the surviving rows plus one diagnostic per skipped row.
pub fn normalize_linear_rows(
    rows: &[LinearConstraintRow],
    parameter_names: &IndexSet<String>,
) -> (Vec<NormalizedLinearRow>, Vec<Diagnostic>) {
    let mut normalized = Vec::new();
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        if !parameter_names.contains(&row.parameter) {
            warn!(
                "constraint {}: parameter `{}` not recognized, row skipped",
                row_number, row.parameter
            );
            skipped.push(Diagnostic::UnknownParameter {
                row: row_number,
                name: row.parameter.clone(),
            });
            continue;
        }
        let op = match ComparisonOp::from_symbol(&row.operator) {
            Ok(op) => op,
            Err(error) => {
                warn!("constraint {}: {}, row skipped", row_number, error);
                skipped.push(Diagnostic::Operator {
                    row: row_number,
                    symbol: error.symbol,
                });
                continue;
            }
        };
        let value = match row.value.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "constraint {}: value `{}` is not numeric, row skipped",
                    row_number, row.value
                );
                skipped.push(Diagnostic::ValueCoercion {
                    row: row_number,
                    text: row.value.clone(),
                });
                continue;
            }
        };
        normalized.push(NormalizedLinearRow {
            row: row_number,
            parameter: row.parameter.clone(),
            op,
            value,
        });
    }
    (normalized, skipped)
}

/// Validate expression-mode rows
///
/// Only the operator tag is checked here; bad tags skip the row like any
/// other row-syntax error.
pub fn normalize_expression_rows(
    rows: &[ExpressionConstraintRow],
) -> (Vec<NormalizedExpressionRow>, Vec<Diagnostic>) {
    let mut normalized = Vec::new();
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let op = match ComparisonOp::from_tag(&row.operator) {
            Ok(op) => op,
            Err(error) => {
                warn!("constraint {}: {}, row skipped", row_number, error);
                skipped.push(Diagnostic::Operator {
                    row: row_number,
                    symbol: error.symbol,
                });
                continue;
            }
        };
        normalized.push(NormalizedExpressionRow {
            row: row_number,
            expression: row.expression.clone(),
            op,
            value: row.value,
        });
    }
    (normalized, skipped)
}

/// Check that every declared parameter has a value for exactly the declared
/// elements
///
/// Returns one diagnostic per violating parameter; an empty vector means
/// model assembly may proceed.
pub fn validate_parameters(
    parameters: &IndexMap<String, IndexMap<String, f64>>,
    elements: &[String],
) -> Vec<Diagnostic> {
    let declared: IndexSet<&String> = elements.iter().collect();
    let mut diagnostics = Vec::new();
    for (name, values) in parameters {
        let missing: Vec<String> = elements
            .iter()
            .filter(|element| !values.contains_key(*element))
            .cloned()
            .collect();
        let extra: Vec<String> = values
            .keys()
            .filter(|key| !declared.contains(key))
            .cloned()
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            diagnostics.push(Diagnostic::ParameterCoverage {
                name: name.clone(),
                missing,
                extra,
            });
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_list_cleans_segments() {
        let identifiers = parse_identifier_list("Desk, Table , Chairs");
        assert_eq!(identifiers, vec!["Desk", "Table", "Chairs"]);
    }

    #[test]
    fn identifier_list_never_emits_interior_whitespace() {
        let identifiers = parse_identifier_list("  Dining Table , a b c ,x");
        for identifier in &identifiers {
            assert!(!identifier.contains(' '), "`{}` has whitespace", identifier);
        }
        assert_eq!(identifiers, vec!["Dining_Table", "a_b_c", "x"]);
    }

    #[test]
    fn identifier_count_is_bounded_by_segment_count() {
        for text in ["a,b,c", ",,,", "a,,b", "", " , a , "] {
            let segments = text.split(',').count();
            assert!(parse_identifier_list(text).len() <= segments);
        }
    }

    #[test]
    fn identifier_list_drops_empty_segments() {
        assert_eq!(parse_identifier_list(",, ,"), Vec::<String>::new());
        assert_eq!(parse_identifier_list("a,,b"), vec!["a", "b"]);
    }

    fn parameter_names(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn linear_rows_skip_and_continue() {
        let rows = vec![
            LinearConstraintRow {
                parameter: "L".to_string(),
                operator: "≤".to_string(),
                value: "48".to_string(),
            },
            LinearConstraintRow {
                parameter: "Ghost".to_string(),
                operator: "≤".to_string(),
                value: "20".to_string(),
            },
            LinearConstraintRow {
                parameter: "F".to_string(),
                operator: "=<".to_string(),
                value: "20".to_string(),
            },
            LinearConstraintRow {
                parameter: "C".to_string(),
                operator: "≥".to_string(),
                value: "eight".to_string(),
            },
            LinearConstraintRow {
                parameter: "C".to_string(),
                operator: "≤".to_string(),
                value: " 8 ".to_string(),
            },
        ];
        let (normalized, skipped) =
            normalize_linear_rows(&rows, &parameter_names(&["L", "F", "C"]));

        // Rows 1 and 5 survive; 2, 3 and 4 are skipped for their own reasons
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].row, 1);
        assert_eq!(normalized[0].op, ComparisonOp::Le);
        assert_eq!(normalized[0].value, 48.0);
        assert_eq!(normalized[1].row, 5);
        assert_eq!(normalized[1].value, 8.0);

        assert_eq!(
            skipped,
            vec![
                Diagnostic::UnknownParameter {
                    row: 2,
                    name: "Ghost".to_string()
                },
                Diagnostic::Operator {
                    row: 3,
                    symbol: "=<".to_string()
                },
                Diagnostic::ValueCoercion {
                    row: 4,
                    text: "eight".to_string()
                },
            ]
        );
    }

    #[test]
    fn expression_rows_skip_bad_tags() {
        let rows = vec![
            ExpressionConstraintRow {
                expression: "x + y".to_string(),
                operator: "<=".to_string(),
                value: 10.0,
            },
            ExpressionConstraintRow {
                expression: "x".to_string(),
                operator: "=<".to_string(),
                value: 1.0,
            },
        ];
        let (normalized, skipped) = normalize_expression_rows(&rows);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].op, ComparisonOp::Le);
        assert_eq!(
            skipped,
            vec![Diagnostic::Operator {
                row: 2,
                symbol: "=<".to_string()
            }]
        );
    }

    #[test]
    fn parameter_coverage_reports_missing_and_extra() {
        let elements = vec!["Desk".to_string(), "Table".to_string()];
        let mut parameters: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();

        let mut complete = IndexMap::new();
        complete.insert("Desk".to_string(), 8.0);
        complete.insert("Table".to_string(), 6.0);
        parameters.insert("L".to_string(), complete);

        let mut partial = IndexMap::new();
        partial.insert("Desk".to_string(), 4.0);
        partial.insert("Bench".to_string(), 1.0);
        parameters.insert("F".to_string(), partial);

        let diagnostics = validate_parameters(&parameters, &elements);
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics[0] {
            Diagnostic::ParameterCoverage { name, missing, extra } => {
                assert_eq!(name, "F");
                assert_eq!(missing, &vec!["Table".to_string()]);
                assert_eq!(extra, &vec!["Bench".to_string()]);
            }
            other => panic!("expected coverage diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn full_coverage_passes() {
        let elements = vec!["Desk".to_string()];
        let mut parameters: IndexMap<String, IndexMap<String, f64>> = IndexMap::new();
        let mut table = IndexMap::new();
        table.insert("Desk".to_string(), 8.0);
        parameters.insert("L".to_string(), table);
        assert!(validate_parameters(&parameters, &elements).is_empty());
    }
}
