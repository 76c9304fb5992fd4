//! Age-range blocked fuzzy matching
//!
//! For sources that only know a pupil's year group, not their date of
//! birth. The year group is turned into a date-of-birth window and only
//! target records born inside it (and sharing the exact filter fields, e.g.
//! school) are scored.

use ahash::AHashMap;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use super::blocking::{build_blocks, key_columns, name_column, row_key, BlockKey, Candidates};
use super::{
    build_matched, fuzzy_output_columns, provenance_like_columns, require_columns,
    require_unique_index, Advisory, MatchOutcome, MatchedPair,
};
use crate::algorithms::{round_score, Scorer, TokenSortRatio};
use crate::config::AgeRangeMatchConfig;
use crate::error::{MatchError, Result};
use crate::table::{Table, Value};
use crate::yeargroup::{DobWindow, EligibilityWindow, EnglishSchoolYear};

/// Text date formats accepted in the target date-of-birth field.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Timestamp format accepted in the target date-of-birth field.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Read every value of `field` as an optional date.
///
/// Nulls and blank text are `None`; anything else that is not a date fails
/// the whole column.
pub fn coerce_dates(table: &Table, field: &str) -> Result<Vec<Option<NaiveDate>>> {
    let column = table
        .column(field)
        .ok_or_else(|| MatchError::missing(field, "target"))?;
    column
        .iter()
        .map(|value| match value {
            Value::Date(date) => Ok(Some(*date)),
            v if v.is_blank() => Ok(None),
            Value::Text(text) => parse_date(text.trim()).map(Some).ok_or_else(|| {
                MatchError::DateCoercion {
                    field: field.to_string(),
                    value: text.clone(),
                }
            }),
            other => Err(MatchError::DateCoercion {
                field: field.to_string(),
                value: other.to_string(),
            }),
        })
        .collect()
}

/// [`age_range_fuzzy_match_with`] using `token_sort_ratio` and the English
/// school year.
pub fn age_range_fuzzy_match(
    source: &Table,
    target: &Table,
    config: &AgeRangeMatchConfig,
) -> Result<MatchOutcome> {
    age_range_fuzzy_match_with(source, target, config, &TokenSortRatio, &EnglishSchoolYear)
}

/// Fuzzy match names among target records born inside the window implied
/// by each source row's year group.
///
/// Windows are computed once per distinct year-group value; a value whose
/// window cannot be computed leaves its rows unmatched and raises
/// [`Advisory::SkippedGroup`]. When several source rows claim the same
/// target identifier only the best score keeps it (ties go to the earlier
/// row); the rest return to unmatched.
pub fn age_range_fuzzy_match_with(
    source: &Table,
    target: &Table,
    config: &AgeRangeMatchConfig,
    scorer: &dyn Scorer,
    eligibility: &dyn EligibilityWindow,
) -> Result<MatchOutcome> {
    config.validate()?;
    require_columns(
        source,
        config
            .source_filters
            .iter()
            .chain([&config.source_group, &config.source_name]),
        "source",
    )?;
    require_columns(
        target,
        config
            .target_filters
            .iter()
            .chain([&config.target_name, &config.target_dob, &config.target_id]),
        "target",
    )?;
    require_unique_index(source, "source")?;
    let dobs = coerce_dates(target, &config.target_dob)?;

    let mut advisories = Vec::new();
    let suspicious = provenance_like_columns(source);
    if !suspicious.is_empty() {
        warn!(
            label = %config.label,
            columns = ?suspicious,
            "source already has target-style columns; matched output may be confusing"
        );
        advisories.push(Advisory::ProvenanceCollision {
            columns: suspicious,
        });
    }

    info!(
        label = %config.label,
        rows = source.len(),
        academic_year = config.academic_year,
        scorer = scorer.name(),
        "Attempting match"
    );
    if source.is_empty() {
        let mut outcome = MatchOutcome::nothing_to_match(source, &config.label);
        advisories.append(&mut outcome.advisories);
        outcome.advisories = advisories;
        return Ok(outcome);
    }

    let groups = source
        .column(&config.source_group)
        .ok_or_else(|| MatchError::missing(&config.source_group, "source"))?;
    let mut windows: AHashMap<&Value, Option<DobWindow>> = AHashMap::new();
    for group in groups {
        if windows.contains_key(group) {
            continue;
        }
        let window = match eligibility.window(group, config.academic_year) {
            Ok(window) => {
                debug!(group = %group, start = %window.start, end = %window.end, "eligibility window");
                Some(window)
            }
            Err(err) => {
                warn!(label = %config.label, group = %group, error = %err, "skipping group");
                advisories.push(Advisory::SkippedGroup {
                    group: group.to_string(),
                    reason: err.to_string(),
                });
                None
            }
        };
        windows.insert(group, window);
    }

    let target_keys = key_columns(target, &config.target_filters);
    let target_names = name_column(target, &config.target_name);
    let dated = (0..target.len()).filter(|&row| dobs[row].is_some());
    let blocks = build_blocks(&target_keys, dated, config.null_keys);

    let source_keys = key_columns(source, &config.source_filters);
    let source_names = name_column(source, &config.source_name);
    // Eligible candidates, built once per (window, block)
    let mut eligible: AHashMap<(DobWindow, BlockKey), Candidates<'_>> = AHashMap::new();
    let mut pairs = Vec::new();
    for row in 0..source.len() {
        let Some(window) = windows.get(&groups[row]).copied().flatten() else {
            continue;
        };
        let Some(name) = source_names[row].as_deref() else {
            continue;
        };
        let Some(key) = row_key(&source_keys, row, config.null_keys) else {
            continue;
        };
        let Some(block) = blocks.get(&key) else {
            continue;
        };
        let candidates = eligible.entry((window, key)).or_insert_with(|| {
            let born_in_window = block
                .iter()
                .copied()
                .filter(|&t| dobs[t].is_some_and(|dob| window.contains(dob)));
            Candidates::collect(born_in_window, &target_names)
        });
        if let Some((pos, score)) = scorer.best_match(name, &candidates.names, config.threshold) {
            pairs.push(MatchedPair {
                source_row: row,
                target_row: candidates.rows[pos],
                score: Some(round_score(score)),
            });
        }
    }

    let ids = target
        .column(&config.target_id)
        .ok_or_else(|| MatchError::missing(&config.target_id, "target"))?;
    let (mut pairs, demoted) = resolve_conflicts(pairs, ids);
    if demoted > 0 {
        warn!(label = %config.label, demoted, "several records matched one target; keeping the best");
        advisories.push(Advisory::ConflictsDemoted { count: demoted });
    }
    pairs.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));

    let mut is_matched = vec![false; source.len()];
    for pair in &pairs {
        is_matched[pair.source_row] = true;
    }
    let unmatched_rows: Vec<usize> = (0..source.len()).filter(|&r| !is_matched[r]).collect();

    let (columns, carried) = fuzzy_output_columns(source, target);
    if !columns.collisions().is_empty() {
        advisories.push(Advisory::ProvenanceCollision {
            columns: columns.collisions().to_vec(),
        });
    }

    info!(
        label = %config.label,
        matched = pairs.len(),
        remaining = unmatched_rows.len(),
        "Match complete"
    );

    Ok(MatchOutcome {
        matched: build_matched(source, columns, &carried, &pairs, &config.label)?,
        unmatched: source.select_rows(&unmatched_rows),
        advisories,
    })
}

/// Keep one match per target identifier: the highest score, earliest source
/// row on ties. Null identifiers never conflict. Returns the survivors in
/// source order and how many were dropped.
fn resolve_conflicts(pairs: Vec<MatchedPair>, ids: &[Value]) -> (Vec<MatchedPair>, usize) {
    let mut winner: AHashMap<&Value, usize> = AHashMap::new();
    let mut keep = vec![true; pairs.len()];
    for (i, pair) in pairs.iter().enumerate() {
        let id = &ids[pair.target_row];
        if id.is_null() {
            continue;
        }
        match winner.get(id).copied() {
            None => {
                winner.insert(id, i);
            }
            Some(current) => {
                if pair.score > pairs[current].score {
                    keep[current] = false;
                    winner.insert(id, i);
                } else {
                    keep[i] = false;
                }
            }
        }
    }

    let demoted = keep.iter().filter(|k| !**k).count();
    let survivors = pairs
        .into_iter()
        .zip(keep)
        .filter_map(|(pair, keep)| keep.then_some(pair))
        .collect();
    (survivors, demoted)
}
