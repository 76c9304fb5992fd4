//! Blocked fuzzy matching
//!
//! Target rows are grouped by exact filter fields (date of birth,
//! postcode...). A source row is only ever scored against the names in its
//! own block; a source row whose key has no block stays unmatched.

use ahash::AHashMap;
use tracing::{debug, info, warn};

use super::blocking::{build_blocks, key_columns, name_column, row_key, BlockKey, Candidates};
use super::{
    build_matched, fuzzy_output_columns, provenance_like_columns, require_columns,
    require_unique_index, Advisory, MatchOutcome, MatchedPair,
};
use crate::algorithms::{round_score, Scorer, TokenSortRatio};
use crate::config::FuzzyMatchConfig;
use crate::error::Result;
use crate::table::Table;

/// [`fuzzy_match_with_scorer`] with the default `token_sort_ratio` scorer.
pub fn fuzzy_match(
    source: &Table,
    target: &Table,
    config: &FuzzyMatchConfig,
) -> Result<MatchOutcome> {
    fuzzy_match_with_scorer(source, target, config, &TokenSortRatio)
}

/// Match each source row to the best scoring target name in its block.
///
/// The best candidate must score at least `config.threshold`; exact ties
/// keep the first candidate in target order. Matched rows carry every target
/// column as `HEAT: <column>` plus `Fuzzy Score` and `Match Type`, sorted by
/// score, best first.
pub fn fuzzy_match_with_scorer(
    source: &Table,
    target: &Table,
    config: &FuzzyMatchConfig,
    scorer: &dyn Scorer,
) -> Result<MatchOutcome> {
    config.validate()?;
    require_columns(
        source,
        config.source_filters.iter().chain([&config.source_name]),
        "source",
    )?;
    require_columns(
        target,
        config.target_filters.iter().chain([&config.target_name]),
        "target",
    )?;
    require_unique_index(source, "source")?;

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

    info!(label = %config.label, rows = source.len(), scorer = scorer.name(), "Attempting match");
    if source.is_empty() {
        let mut outcome = MatchOutcome::nothing_to_match(source, &config.label);
        advisories.append(&mut outcome.advisories);
        outcome.advisories = advisories;
        return Ok(outcome);
    }

    let target_keys = key_columns(target, &config.target_filters);
    let target_names = name_column(target, &config.target_name);
    let blocks: AHashMap<BlockKey, Candidates<'_>> =
        build_blocks(&target_keys, 0..target.len(), config.null_keys)
            .into_iter()
            .map(|(key, rows)| (key, Candidates::collect(rows, &target_names)))
            .collect();
    debug!(label = %config.label, blocks = blocks.len(), "target blocked");

    let source_keys = key_columns(source, &config.source_filters);
    let source_names = name_column(source, &config.source_name);
    let mut pairs = Vec::new();
    let mut unmatched_rows = Vec::new();
    for row in 0..source.len() {
        let best = source_names[row].as_deref().and_then(|name| {
            let key = row_key(&source_keys, row, config.null_keys)?;
            let block = blocks.get(&key)?;
            let (pos, score) = scorer.best_match(name, &block.names, config.threshold)?;
            Some((block.rows[pos], score))
        });
        match best {
            Some((target_row, score)) => pairs.push(MatchedPair {
                source_row: row,
                target_row,
                score: Some(round_score(score)),
            }),
            None => unmatched_rows.push(row),
        }
    }
    // Stable: equal scores keep source order
    pairs.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));

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
