//! Table type
//!
//! The exchange currency between every pipeline stage: an ordered list of
//! uniquely named columns and an ordered list of rows. Stages never mutate
//! a caller's table in place; every transformation builds a new one.

use crate::error::{Error, Result};
use crate::value::Value;

/// An ordered, column-named table of [`Value`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a table with the given columns and no rows
    pub fn new(columns: Vec<String>) -> Result<Self> {
        check_unique(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table from a raw worksheet grid.
    ///
    /// `headers` selects the header row, `start` the first data row, and
    /// `end` (exclusive, clamped to the grid) the last. Cells are kept as
    /// strings; rows shorter than the header are padded with empty strings
    /// and longer rows are truncated to the header width.
    pub fn from_grid(
        grid: &[Vec<String>],
        headers: usize,
        start: usize,
        end: Option<usize>,
    ) -> Result<Self> {
        if grid.is_empty() {
            return Ok(Self::empty());
        }
        let header_row = grid
            .get(headers)
            .ok_or(Error::HeaderOutOfBounds(headers, grid.len()))?;
        let columns: Vec<String> = header_row.to_vec();
        check_unique(&columns)?;

        let stop = end.unwrap_or(grid.len()).min(grid.len());
        let mut rows = Vec::new();
        if start < stop {
            for raw in &grid[start..stop] {
                let mut row: Vec<Value> =
                    raw.iter().take(columns.len()).map(Value::str).collect();
                row.resize(columns.len(), Value::str(""));
                rows.push(row);
            }
        }

        Ok(Self { columns, rows })
    }

    /// Get the column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Iterate over rows
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Find a column's position by name
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Get all values of the column at `index`, top to bottom
    pub fn column(&self, index: usize) -> Result<Vec<&Value>> {
        if index >= self.columns.len() {
            return Err(Error::ColumnOutOfBounds(index, self.columns.len()));
        }
        Ok(self.rows.iter().map(|r| &r[index]).collect())
    }

    /// Append a row; its length must match the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::LengthMismatch {
                column: String::from("<row>"),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a computed column; one value per existing row
    pub fn add_column<S: Into<String>>(&mut self, name: S, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.columns.iter().any(|c| *c == name) {
            return Err(Error::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(Error::LengthMismatch {
                column: name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Remove a column by name
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(())
    }

    /// Build a new table from `(source index, new name)` picks.
    ///
    /// Row order and count are preserved; column order follows the picks.
    pub fn project(&self, picks: &[(usize, String)]) -> Result<Table> {
        for (index, _) in picks {
            if *index >= self.columns.len() {
                return Err(Error::ColumnOutOfBounds(*index, self.columns.len()));
            }
        }
        let mut table = Table::new(picks.iter().map(|(_, name)| name.clone()).collect())?;
        for row in &self.rows {
            table
                .rows
                .push(picks.iter().map(|(index, _)| row[*index].clone()).collect());
        }
        Ok(table)
    }

    /// Keep only the rows for which `keep` returns true.
    ///
    /// The predicate receives the original row index. Relative order of
    /// surviving rows is preserved.
    pub fn retain_rows<F: FnMut(usize, &[Value]) -> bool>(&mut self, mut keep: F) {
        let mut index = 0;
        self.rows.retain(|row| {
            let keep_it = keep(index, row);
            index += 1;
            keep_it
        });
    }

    /// Concatenate tables by column name.
    ///
    /// Columns keep first-seen order; rows from tables missing a column
    /// get [`Value::Null`] for it. Empty tables contribute nothing.
    pub fn concat<I: IntoIterator<Item = Table>>(tables: I) -> Result<Table> {
        let tables: Vec<Table> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let mut out = Table::new(columns)?;
        for table in tables {
            let mapping: Vec<Option<usize>> = out
                .columns
                .iter()
                .map(|c| table.columns.iter().position(|tc| tc == c))
                .collect();
            for row in table.rows {
                out.rows.push(
                    mapping
                        .iter()
                        .map(|source| match source {
                            Some(i) => row[*i].clone(),
                            None => Value::Null,
                        })
                        .collect(),
                );
            }
        }
        Ok(out)
    }

    /// Render every row as display strings (no header row)
    pub fn rows_to_strings(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }
}

fn check_unique(columns: &[String]) -> Result<()> {
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].contains(column) {
            return Err(Error::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}
