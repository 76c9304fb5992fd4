//! Column-oriented record table
//!
//! Records are stored as columns (field -> all values) plus a parallel
//! index of row labels. Matching reads a handful of fields across many
//! rows, which is the access pattern this layout favours.

use ahash::{AHashMap, AHashSet};
use thiserror::Error;

use super::value::{DType, Value};

/// Errors from building or reshaping a [`Table`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// Column name appears more than once
    #[error("Column names are not unique: '{0}'")]
    DuplicateColumn(String),

    /// Row has the wrong number of cells
    #[error("Row has {found} value(s) but the table has {expected} column(s)")]
    RowLength { expected: usize, found: usize },

    /// Column or index has the wrong number of entries
    #[error("Expected {expected} entries to match the row count, found {found}")]
    IndexLength { expected: usize, found: usize },
}

/// An in-memory table of records with named columns and row labels.
///
/// Labels default to the row position (`Value::Int(0..n)`); use
/// [`Table::with_index`] for explicit identifiers.
///
/// # Example
///
/// ```rust
/// use heatmatch::table::{Table, Value};
///
/// let table = Table::from_rows(
///     ["Full Name", "Postcode"],
///     vec![
///         vec![Value::from("Jane Doe"), Value::from("AA1 1AA")],
///         vec![Value::from("Mike Jones"), Value::Null],
///     ],
/// )
/// .unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get(0, "Postcode"), Some(&Value::from("AA1 1AA")));
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    /// Column name -> position
    column_indices: AHashMap<String, usize>,

    /// Column names in display order
    column_names: Vec<String>,

    /// One vector of cells per column
    columns: Vec<Vec<Value>>,

    /// Row labels (parallel to every column)
    index: Vec<Value>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names
            && self.columns == other.columns
            && self.index == other.index
    }
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self {
            column_indices: AHashMap::new(),
            column_names: Vec::new(),
            columns: Vec::new(),
            index: Vec::new(),
        };
        for name in columns {
            let name = name.into();
            if table.column_indices.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.column_indices.insert(name.clone(), table.column_names.len());
            table.column_names.push(name);
            table.columns.push(Vec::new());
        }
        Ok(table)
    }

    /// Build a table from row-major data with positional labels.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for (pos, row) in rows.into_iter().enumerate() {
            table.push_row(Value::Int(pos as i64), row)?;
        }
        Ok(table)
    }

    /// Replace the row labels.
    pub fn with_index(mut self, labels: Vec<Value>) -> Result<Self, TableError> {
        if labels.len() != self.len() {
            return Err(TableError::IndexLength {
                expected: self.len(),
                found: labels.len(),
            });
        }
        self.index = labels;
        Ok(self)
    }

    /// Append a row with the given label.
    pub fn push_row(&mut self, label: Value, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
        self.index.push(label);
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    /// All values of a column.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        let idx = self.column_indices.get(name)?;
        self.columns.get(*idx).map(Vec::as_slice)
    }

    /// Value at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name)?.get(row)
    }

    /// Cells of one row in column order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Value> + '_ {
        self.columns.iter().map(move |column| &column[row])
    }

    pub fn label(&self, row: usize) -> Option<&Value> {
        self.index.get(row)
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    /// True when no two rows share a label.
    pub fn has_unique_index(&self) -> bool {
        let mut seen = AHashSet::with_capacity(self.index.len());
        self.index.iter().all(|label| seen.insert(label))
    }

    /// Inferred type of a column from its non-null values.
    pub fn column_dtype(&self, name: &str) -> Option<DType> {
        let mut dtype = DType::Empty;
        for value in self.column(name)? {
            match (dtype, value.dtype()) {
                (_, None) => {}
                (DType::Empty, Some(t)) => dtype = t,
                (current, Some(t)) if current == t => {}
                _ => return Some(DType::Mixed),
            }
        }
        Some(dtype)
    }

    /// New table holding the rows at `positions`, in that order, labels kept.
    pub fn select_rows(&self, positions: &[usize]) -> Table {
        Table {
            column_indices: self.column_indices.clone(),
            column_names: self.column_names.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| positions.iter().map(|&p| column[p].clone()).collect())
                .collect(),
            index: positions.iter().map(|&p| self.index[p].clone()).collect(),
        }
    }

    /// Replace a column's values, or append it if it does not exist.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), TableError> {
        if values.len() != self.len() {
            return Err(TableError::IndexLength {
                expected: self.len(),
                found: values.len(),
            });
        }
        let name = name.into();
        match self.column_indices.get(&name) {
            Some(&idx) => self.columns[idx] = values,
            None => {
                self.column_indices.insert(name.clone(), self.column_names.len());
                self.column_names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Stack `other` under `self`.
    ///
    /// Columns are the union of both tables in first-seen order; cells for a
    /// column a table does not have are null. Used to join the matched
    /// outputs of several waterfall stages.
    pub fn concat(&self, other: &Table) -> Table {
        let mut names = self.column_names.clone();
        for name in &other.column_names {
            if !self.has_column(name) {
                names.push(name.clone());
            }
        }

        let column_indices = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let columns = names
            .iter()
            .map(|name| {
                let mut values = Vec::with_capacity(self.len() + other.len());
                for part in [self, other] {
                    match part.column(name) {
                        Some(column) => values.extend_from_slice(column),
                        None => values.extend(std::iter::repeat(Value::Null).take(part.len())),
                    }
                }
                values
            })
            .collect();
        let mut index = self.index.clone();
        index.extend_from_slice(&other.index);

        Table {
            column_indices,
            column_names: names,
            columns,
            index,
        }
    }
}
