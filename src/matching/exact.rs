//! Exact matching: a left join of the source onto the target's key fields.

use std::iter;

use tracing::{info, warn};

use super::blocking::{build_blocks, key_columns, row_key};
use super::{
    build_matched, provenance_name, require_columns, Advisory, MatchOutcome, MatchedPair,
    OutputColumns, MATCH_TYPE_COLUMN,
};
use crate::config::ExactMatchConfig;
use crate::error::{MatchError, Result};
use crate::table::{Table, Value};

/// Match source rows to target rows whose key fields are all equal.
///
/// Every source row whose key appears in the target is matched once per
/// target hit, in target order; the rest are returned unmatched with their
/// labels. Target rows with a null identifier never join. When the target
/// repeats a key, the matched table carries more rows than matched records
/// and [`Advisory::DuplicateTargetKeys`] says by how many.
///
/// # Example
///
/// ```rust
/// use heatmatch::config::ExactMatchConfig;
/// use heatmatch::matching::exact_match;
/// use heatmatch::table::{Table, Value};
///
/// let source = Table::from_rows(
///     ["Name", "DOB"],
///     vec![
///         vec![Value::from("Jane Doe"), Value::from("2008-09-02")],
///         vec![Value::from("Mike Jones"), Value::from("2009-01-15")],
///     ],
/// )
/// .unwrap();
/// let target = Table::from_rows(
///     ["Student Name", "Date of Birth", "Student HEAT ID"],
///     vec![vec![Value::from("Jane Doe"), Value::from("2008-09-02"), Value::Int(101)]],
/// )
/// .unwrap();
///
/// let config = ExactMatchConfig::new(["Name", "DOB"], ["Student Name", "Date of Birth"], "Exact");
/// let outcome = exact_match(&source, &target, &config).unwrap();
/// assert_eq!(outcome.matched.len(), 1);
/// assert_eq!(outcome.unmatched.len(), 1);
/// ```
pub fn exact_match(
    source: &Table,
    target: &Table,
    config: &ExactMatchConfig,
) -> Result<MatchOutcome> {
    config.validate()?;
    require_columns(source, &config.source_fields, "source")?;
    require_columns(
        target,
        config.target_fields.iter().chain(iter::once(&config.id_field)),
        "target",
    )?;

    info!(label = %config.label, rows = source.len(), "Attempting match");
    if source.is_empty() {
        return Ok(MatchOutcome::nothing_to_match(source, &config.label));
    }

    let ids = target
        .column(&config.id_field)
        .ok_or_else(|| MatchError::missing(&config.id_field, "target"))?;
    let joinable = (0..target.len()).filter(|&row| !ids[row].is_null());
    let target_keys = key_columns(target, &config.target_fields);
    let blocks = build_blocks(&target_keys, joinable, config.null_keys);

    let source_keys = key_columns(source, &config.source_fields);
    let mut pairs = Vec::new();
    let mut unmatched_rows = Vec::new();
    let mut matched_records = 0usize;
    for row in 0..source.len() {
        let hits = row_key(&source_keys, row, config.null_keys).and_then(|key| blocks.get(&key));
        match hits {
            Some(hits) => {
                matched_records += 1;
                pairs.extend(hits.iter().map(|&target_row| MatchedPair {
                    source_row: row,
                    target_row,
                    score: None,
                }));
            }
            None => unmatched_rows.push(row),
        }
    }

    let mut advisories = Vec::new();
    let mut columns = OutputColumns::starting_with(source);
    let mut clashes = Vec::new();
    let mut carried: Vec<&[Value]> = vec![ids];
    if source.has_column(&config.id_field) {
        clashes.push(config.id_field.clone());
        columns.push(provenance_name(&config.id_field));
    } else {
        columns.push(config.id_field.clone());
    }
    if config.verify {
        for name in target.column_names().iter().filter(|n| **n != config.id_field) {
            if let Some(column) = target.column(name) {
                columns.push(provenance_name(name));
                carried.push(column);
            }
        }
    }
    columns.push(MATCH_TYPE_COLUMN.to_string());
    clashes.extend(columns.collisions().iter().cloned());
    if !clashes.is_empty() {
        warn!(label = %config.label, columns = ?clashes, "source columns clash with target columns");
        advisories.push(Advisory::ProvenanceCollision { columns: clashes });
    }

    let extra = pairs.len() - matched_records;
    if extra > 0 {
        warn!(
            label = %config.label,
            extra,
            "{extra} extra record(s) created; target keys are not unique"
        );
        advisories.push(Advisory::DuplicateTargetKeys { extra });
    }

    info!(
        label = %config.label,
        matched = matched_records,
        remaining = unmatched_rows.len(),
        "Match complete"
    );

    Ok(MatchOutcome {
        matched: build_matched(source, columns, &carried, &pairs, &config.label)?,
        unmatched: source.select_rows(&unmatched_rows),
        advisories,
    })
}
