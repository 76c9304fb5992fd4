//! Duplicate detection within one collection
//!
//! Records are blocked on date of birth (and postcode in strict mode),
//! names are compared pairwise inside each block, and similar pairs are
//! merged into groups with a union-find so that A~B and B~C puts A, B and C
//! in one group even when A and C are not similar.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::algorithms::normalize::normalize_string;
use crate::algorithms::{Scorer, TokenSortRatio};
use crate::config::{DuplicateConfig, FuzzyType, NullKeyPolicy};
use crate::error::{MatchError, Result};
use crate::matching::blocking::{build_blocks, key_columns};
use crate::table::{Table, Value};

/// Union-Find data structure for clustering
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x != root_y {
            // Union by rank
            match self.rank[root_x].cmp(&self.rank[root_y]) {
                std::cmp::Ordering::Less => {
                    self.parent[root_x] = root_y;
                }
                std::cmp::Ordering::Greater => {
                    self.parent[root_y] = root_x;
                }
                std::cmp::Ordering::Equal => {
                    self.parent[root_y] = root_x;
                    self.rank[root_x] = self.rank[root_x].saturating_add(1);
                }
            }
        }
    }

    /// Components with at least two members. Members ascend; groups are
    /// ordered by their first member.
    fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }

        let mut groups: Vec<Vec<usize>> = by_root
            .into_values()
            .filter(|members| members.len() > 1)
            .collect();
        groups.sort_unstable_by_key(|members| members[0]);
        groups
    }
}

/// Result of a duplicate search.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroups {
    /// Row positions of each group, ascending
    pub groups: Vec<Vec<usize>>,
    /// Per row: the members of its group joined with `", "`, or null
    pub labels: Vec<Value>,
}

impl DuplicateGroups {
    /// Number of rows that belong to some group.
    pub fn flagged(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Normalized name parts of one record.
struct NameParts {
    full: String,
    first: String,
    last: String,
}

fn name_parts(table: &Table, row: usize, config: &DuplicateConfig) -> Option<NameParts> {
    let normalize = |value: Option<&Value>| {
        value
            .and_then(Value::as_text)
            .map(|text| normalize_string(&text, config.normalization))
            .unwrap_or_default()
    };
    let parts: Vec<String> = config
        .name_fields
        .iter()
        .map(|field| normalize(table.get(row, field)))
        .collect();
    let full = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if full.trim().is_empty() {
        return None;
    }

    let (first, last) = if parts.len() > 1 {
        (parts[0].clone(), parts[parts.len() - 1].clone())
    } else {
        let mut tokens = full.split_whitespace();
        let first = tokens.next().unwrap_or_default().to_string();
        let last = tokens.last().map_or_else(|| first.clone(), str::to_string);
        (first, last)
    };
    Some(NameParts { full, first, last })
}

/// [`find_duplicate_groups_with_scorer`] with the default `token_sort_ratio`.
pub fn find_duplicate_groups(table: &Table, config: &DuplicateConfig) -> Result<DuplicateGroups> {
    find_duplicate_groups_with_scorer(table, config, &TokenSortRatio)
}

/// Group records that are probably the same person.
///
/// Two records in the same block are linked when their names score at least
/// `config.threshold`. With twin protection on, records that share surname,
/// date of birth and postcode must also have first names scoring at least
/// the twin threshold. Records with a null blocking value or no name are
/// never grouped.
pub fn find_duplicate_groups_with_scorer(
    table: &Table,
    config: &DuplicateConfig,
    scorer: &dyn Scorer,
) -> Result<DuplicateGroups> {
    config.validate()?;
    let mut required: Vec<&String> = config.name_fields.iter().collect();
    required.push(&config.dob_field);
    required.push(&config.postcode_field);
    required.extend(config.id_field.as_ref());
    for field in required {
        if !table.has_column(field) {
            return Err(MatchError::missing(field, "table"));
        }
    }

    let names: Vec<Option<NameParts>> = (0..table.len())
        .map(|row| name_parts(table, row, config))
        .collect();

    let block_fields = match config.fuzzy_type {
        FuzzyType::Strict => vec![config.dob_field.clone(), config.postcode_field.clone()],
        FuzzyType::Permissive => vec![config.dob_field.clone()],
    };
    let keys = key_columns(table, &block_fields);
    let named = (0..table.len()).filter(|&row| names[row].is_some());
    let blocks: Vec<Vec<usize>> = build_blocks(&keys, named, NullKeyPolicy::Exclude)
        .into_values()
        .filter(|rows| rows.len() > 1)
        .collect();
    debug!(blocks = blocks.len(), fuzzy_type = %config.fuzzy_type, "records blocked");

    let postcodes = table.column(&config.postcode_field).unwrap_or_default();
    let twin_threshold = config.effective_twin_threshold();
    let is_link = |i: usize, j: usize| -> bool {
        let (Some(a), Some(b)) = (&names[i], &names[j]) else {
            return false;
        };
        if scorer.score(&a.full, &b.full) < config.threshold {
            return false;
        }
        let twins = config.twin_protection
            && !a.last.is_empty()
            && a.last == b.last
            && !postcodes[i].is_null()
            && postcodes[i] == postcodes[j];
        !twins || scorer.score(&a.first, &b.first) >= twin_threshold
    };

    let edges: Vec<(usize, usize)> = blocks
        .par_iter()
        .flat_map_iter(|rows| {
            let is_link = &is_link;
            rows.iter().enumerate().flat_map(move |(k, &i)| {
                rows[k + 1..]
                    .iter()
                    .filter(move |&&j| is_link(i, j))
                    .map(move |&j| (i, j))
            })
        })
        .collect();

    let mut uf = UnionFind::new(table.len());
    for (i, j) in edges {
        uf.union(i, j);
    }
    let groups = uf.groups();

    let ids = match &config.id_field {
        Some(field) => table.column(field),
        None => None,
    };
    let mut labels = vec![Value::Null; table.len()];
    for members in &groups {
        let label = render_group(members, ids);
        for &row in members {
            labels[row] = Value::Text(label.clone());
        }
    }

    let result = DuplicateGroups { groups, labels };
    info!(
        rows = table.len(),
        groups = result.groups.len(),
        flagged = result.flagged(),
        scorer = scorer.name(),
        "Duplicate search complete"
    );
    Ok(result)
}

/// Members as `#<row number>` (1-based), or their identifiers in ascending
/// order. A null identifier falls back to the row number.
fn render_group(members: &[usize], ids: Option<&[Value]>) -> String {
    let Some(ids) = ids else {
        return members
            .iter()
            .map(|row| format!("#{}", row + 1))
            .collect::<Vec<_>>()
            .join(", ");
    };

    let mut identities: Vec<(&Value, usize)> = members.iter().map(|&row| (&ids[row], row)).collect();
    identities.sort_by(|(a, ra), (b, rb)| a.sort_cmp(b).then(ra.cmp(rb)));
    identities
        .into_iter()
        .map(|(id, row)| match id {
            Value::Null => format!("#{}", row + 1),
            id => id.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Copy of `table` with the group labels in `config.output_column`.
pub fn find_duplicates(table: &Table, config: &DuplicateConfig) -> Result<Table> {
    find_duplicates_with_scorer(table, config, &TokenSortRatio)
}

/// [`find_duplicates`] with an injected scorer.
pub fn find_duplicates_with_scorer(
    table: &Table,
    config: &DuplicateConfig,
    scorer: &dyn Scorer,
) -> Result<Table> {
    let groups = find_duplicate_groups_with_scorer(table, config, scorer)?;
    let mut out = table.clone();
    out.set_column(config.output_column.as_str(), groups.labels)?;
    Ok(out)
}
