//! Waterfall matching stages
//!
//! Each stage takes the records still unmatched and a target table and
//! returns a [`MatchOutcome`]: the matched rows, the rows left over for the
//! next stage, and any advisories raised on the way. Stages never chain
//! themselves; the caller feeds `unmatched` into the next stage and stacks
//! the matched tables with [`Table::concat`].

pub mod age_range;
pub(crate) mod blocking;
pub mod exact;
pub mod fuzzy;
pub mod outcome;

pub use age_range::{age_range_fuzzy_match, age_range_fuzzy_match_with};
pub use exact::exact_match;
pub use fuzzy::{fuzzy_match, fuzzy_match_with_scorer};
pub use outcome::{Advisory, MatchOutcome};

use ahash::AHashSet;

use crate::error::{MatchError, Result};
use crate::table::{Table, TableError, Value};

/// Column holding the caller's label for the stage that matched a row.
pub const MATCH_TYPE_COLUMN: &str = "Match Type";

/// Column holding the similarity score of fuzzy matches.
pub const FUZZY_SCORE_COLUMN: &str = "Fuzzy Score";

/// Prefix applied to target columns carried into matched output.
pub const PROVENANCE_PREFIX: &str = "HEAT: ";

/// Suffix used for target columns by older exports.
pub const LEGACY_PROVENANCE_SUFFIX: &str = "_HEAT";

/// Default identifier column of the target table.
pub const DEFAULT_ID_FIELD: &str = "Student HEAT ID";

/// Default column written by the duplicate clusterer.
pub const DUPLICATES_COLUMN: &str = "Potential Duplicates";

/// Name of a target column once carried into matched output.
pub fn provenance_name(column: &str) -> String {
    format!("{PROVENANCE_PREFIX}{column}")
}

/// Fail with `ColumnDoesNotExist` for the first field missing from `table`.
pub(crate) fn require_columns<'a, I>(table: &Table, fields: I, which: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for field in fields {
        if !table.has_column(field) {
            return Err(MatchError::missing(field, which));
        }
    }
    Ok(())
}

/// Fuzzy stages address unmatched rows by label.
pub(crate) fn require_unique_index(table: &Table, which: &str) -> Result<()> {
    if table.has_unique_index() {
        Ok(())
    } else {
        Err(MatchError::FuzzyMatchIndex(which.to_string()))
    }
}

/// Source columns that look like carried target columns.
pub(crate) fn provenance_like_columns(source: &Table) -> Vec<String> {
    source
        .column_names()
        .iter()
        .filter(|name| {
            name.ends_with(LEGACY_PROVENANCE_SUFFIX) || name.starts_with(PROVENANCE_PREFIX)
        })
        .cloned()
        .collect()
}

/// Allocates output column names, renaming on collision.
///
/// A name already taken gets a ` (2)`, ` (3)`... suffix; every collision is
/// remembered so the stage can report it.
#[derive(Debug, Default)]
pub(crate) struct OutputColumns {
    names: Vec<String>,
    taken: AHashSet<String>,
    collisions: Vec<String>,
}

impl OutputColumns {
    pub(crate) fn starting_with(table: &Table) -> Self {
        let mut columns = Self::default();
        for name in table.column_names() {
            columns.push(name.clone());
        }
        columns
    }

    pub(crate) fn push(&mut self, name: String) -> String {
        let mut resolved = name.clone();
        let mut n = 2;
        while self.taken.contains(&resolved) {
            resolved = format!("{name} ({n})");
            n += 1;
        }
        if resolved != name {
            self.collisions.push(name);
        }
        self.taken.insert(resolved.clone());
        self.names.push(resolved.clone());
        resolved
    }

    pub(crate) fn collisions(&self) -> &[String] {
        &self.collisions
    }

    pub(crate) fn into_table(self) -> std::result::Result<Table, TableError> {
        Table::new(self.names)
    }
}

/// Output layout of the fuzzy stages: source columns, every target column
/// as `HEAT: <column>`, `Fuzzy Score`, `Match Type`.
pub(crate) fn fuzzy_output_columns<'t>(
    source: &Table,
    target: &'t Table,
) -> (OutputColumns, Vec<&'t [Value]>) {
    let mut columns = OutputColumns::starting_with(source);
    let mut carried = Vec::with_capacity(target.column_names().len());
    for name in target.column_names() {
        if let Some(column) = target.column(name) {
            columns.push(provenance_name(name));
            carried.push(column);
        }
    }
    columns.push(FUZZY_SCORE_COLUMN.to_string());
    columns.push(MATCH_TYPE_COLUMN.to_string());
    (columns, carried)
}

/// One matched source row: its target row and, for fuzzy stages, the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MatchedPair {
    pub source_row: usize,
    pub target_row: usize,
    pub score: Option<f64>,
}

/// Assemble a matched table: source cells, the chosen target cells, the
/// score when present, then the stage label. Rows keep their source label.
pub(crate) fn build_matched(
    source: &Table,
    columns: OutputColumns,
    target_columns: &[&[Value]],
    pairs: &[MatchedPair],
    label: &str,
) -> Result<Table> {
    let mut matched = columns.into_table()?;
    for pair in pairs {
        let mut row: Vec<Value> = source.row(pair.source_row).cloned().collect();
        row.extend(target_columns.iter().map(|c| c[pair.target_row].clone()));
        if let Some(score) = pair.score {
            row.push(Value::Float(score));
        }
        row.push(Value::from(label));
        let row_label = source.label(pair.source_row).cloned().unwrap_or_default();
        matched.push_row(row_label, row)?;
    }
    Ok(matched)
}
