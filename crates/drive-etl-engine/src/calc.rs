//! The calculation engine
//!
//! Applies named registry functions to derive new columns. Required-value
//! validation is exhaustive: every violating row of every calculation in a
//! dataset is collected before one aggregated error is raised.

use drive_etl_core::{Table, Value};

use crate::error::{Error, Result, Violation};
use crate::functions::{CalcInput, Registry};
use crate::settings::{CalcSpec, ColumnRef};

/// A column reference resolved against a concrete table
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// One column position
    Single(usize),
    /// Several positions; the function runs row-wise over the slice
    Multi(Vec<usize>),
}

/// Resolve a column reference against a table
pub fn resolve_ref(table: &Table, column_ref: &ColumnRef) -> Result<Selection> {
    match column_ref {
        ColumnRef::First => {
            if table.column_count() == 0 {
                return Err(drive_etl_core::Error::ColumnOutOfBounds(0, 0).into());
            }
            Ok(Selection::Single(0))
        }
        ColumnRef::Index(i) => {
            if *i >= table.column_count() {
                return Err(
                    drive_etl_core::Error::ColumnOutOfBounds(*i, table.column_count()).into(),
                );
            }
            Ok(Selection::Single(*i))
        }
        ColumnRef::Name(name) => Ok(Selection::Single(table.column_index(name)?)),
        ColumnRef::Many(refs) => {
            let mut indices = Vec::with_capacity(refs.len());
            for inner in refs {
                match resolve_ref(table, inner)? {
                    Selection::Single(i) => indices.push(i),
                    Selection::Multi(_) => {
                        return Err(Error::Resolution(
                            "column reference lists cannot nest".to_string(),
                        ))
                    }
                }
            }
            Ok(Selection::Multi(indices))
        }
    }
}

/// Apply one calculation to every row, returning the derived column
pub fn apply(table: &Table, calc: &CalcSpec, registry: &Registry) -> Result<Vec<Value>> {
    let function = registry.bind(&calc.function, &calc.args, &calc.kwargs)?;
    let selection = resolve_ref(table, &calc.input)?;

    let mut values = Vec::with_capacity(table.len());
    match selection {
        Selection::Single(index) => {
            for row in table.rows() {
                values.push(function.call(&CalcInput::Scalar(&row[index]))?);
            }
        }
        Selection::Multi(indices) => {
            let mut slice = Vec::with_capacity(indices.len());
            for row in table.rows() {
                slice.clear();
                slice.extend(indices.iter().map(|i| row[*i].clone()));
                values.push(function.call(&CalcInput::Row(&slice))?);
            }
        }
    }
    Ok(values)
}

/// Run a dataset's calculations, appending each derived column.
///
/// `origins` maps row positions back to 1-based source sheet rows for
/// violation reporting. Violations across all calculations merge into one
/// [`Error::Validation`].
pub fn run_calculations(
    table: &mut Table,
    calcs: &[CalcSpec],
    registry: &Registry,
    origins: &[usize],
) -> Result<()> {
    let mut violations = Vec::new();
    for calc in calcs {
        let values = apply(table, calc, registry)?;
        if let Some(required) = &calc.required_values {
            let rows: Vec<usize> = values
                .iter()
                .enumerate()
                .filter(|(_, value)| !required.iter().any(|r| *r == value.to_string()))
                .map(|(i, _)| origins.get(i).copied().unwrap_or(i + 1))
                .collect();
            if !rows.is_empty() {
                violations.push(Violation {
                    calculation: calc.name.clone(),
                    rows,
                });
            }
        }
        table.add_column(calc.name.clone(), values)?;
    }
    if !violations.is_empty() {
        return Err(Error::Validation(violations));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(cols: &[&str], rows: &[&[&str]]) -> Table {
        let mut grid = vec![cols.iter().map(|c| c.to_string()).collect::<Vec<_>>()];
        grid.extend(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>()),
        );
        Table::from_grid(&grid, 0, 1, None).unwrap()
    }

    fn calc(doc: serde_json::Value) -> CalcSpec {
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn test_apply_by_name_and_by_position() {
        let t = table(&["A", "B"], &[&[" x ", "1"], &[" y ", "2"]]);
        let registry = Registry::builtin();

        let by_name = apply(
            &t,
            &calc(serde_json::json!({"name": "N", "function": "strip_upper", "input": "A"})),
            &registry,
        )
        .unwrap();
        assert_eq!(by_name, vec![Value::str("X"), Value::str("Y")]);

        let by_position = apply(
            &t,
            &calc(serde_json::json!({"name": "P", "function": "identity", "input": 1})),
            &registry,
        )
        .unwrap();
        assert_eq!(by_position, vec![Value::str("1"), Value::str("2")]);

        // Null input defaults to the first column
        let first = apply(
            &t,
            &calc(serde_json::json!({"name": "F", "function": "identity", "input": null})),
            &registry,
        )
        .unwrap();
        assert_eq!(first, vec![Value::str(" x "), Value::str(" y ")]);
    }

    #[test]
    fn test_apply_row_wise_over_list_reference() {
        let t = table(&["FIRST", "LAST"], &[&["Maynard", "Keenan"], &["", "Carey"]]);
        let registry = Registry::builtin();
        let joined = apply(
            &t,
            &calc(serde_json::json!({
                "name": "FULL", "function": "concat", "input": ["FIRST", "LAST"]
            })),
            &registry,
        )
        .unwrap();
        assert_eq!(joined, vec![Value::str("Maynard Keenan"), Value::str("Carey")]);
    }

    #[test]
    fn test_unknown_function_fails_the_run() {
        let t = table(&["A"], &[&["x"]]);
        let registry = Registry::builtin();
        let result = apply(
            &t,
            &calc(serde_json::json!({"name": "N", "function": "missing", "input": "A"})),
            &registry,
        );
        assert!(matches!(result, Err(Error::UnknownFunction(_))));
    }

    #[test]
    fn test_validation_is_exhaustive_across_rows_and_calcs() {
        let mut t = table(&["A", "B"], &[&["ok", "b"], &["bad1", "b"], &["bad2", "g"], &["ok", "b"]]);
        let registry = Registry::builtin();
        let calcs = vec![
            calc(serde_json::json!({
                "name": "CHECKED", "function": "identity", "input": "A",
                "required_values": ["ok"]
            })),
            calc(serde_json::json!({
                "name": "OTHER", "function": "identity", "input": "B",
                "required_values": ["b"]
            })),
        ];
        // Data starts at sheet row 2 (start=1, 1-based reporting)
        let origins = vec![2, 3, 4, 5];
        let err = run_calculations(&mut t, &calcs, &registry, &origins).unwrap_err();
        match err {
            Error::Validation(violations) => {
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[0].calculation, "CHECKED");
                assert_eq!(violations[0].rows, vec![3, 4]);
                assert_eq!(violations[1].calculation, "OTHER");
                assert_eq!(violations[1].rows, vec![4]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_calculations_append_columns_in_order() {
        let mut t = table(&["A"], &[&["x"]]);
        let registry = Registry::builtin();
        let calcs = vec![
            calc(serde_json::json!({"name": "B", "function": "constant", "args": ["1"]})),
            calc(serde_json::json!({"name": "C", "function": "strip_upper", "input": "A"})),
        ];
        run_calculations(&mut t, &calcs, &registry, &[2]).unwrap();
        assert_eq!(t.columns(), &["A", "B", "C"]);
        assert_eq!(
            t.row(0).unwrap(),
            &[Value::str("x"), Value::str("1"), Value::str("X")]
        );
    }
}
