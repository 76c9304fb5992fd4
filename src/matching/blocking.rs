//! Exact blocking keys
//!
//! Rows are grouped by the tuple of their blocking field values; fuzzy
//! scoring only ever happens inside one group.

use std::borrow::Cow;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::config::NullKeyPolicy;
use crate::table::{Table, Value};

/// Values of the blocking fields for one row.
pub(crate) type BlockKey = SmallVec<[Value; 4]>;

/// Columns of `fields`, in order. Fields must already be validated.
pub(crate) fn key_columns<'t>(table: &'t Table, fields: &[String]) -> Vec<&'t [Value]> {
    fields.iter().filter_map(|f| table.column(f)).collect()
}

/// Integral floats join integers, as in a numeric equi-join. NaN keys
/// block with nulls.
fn key_value(value: &Value) -> Value {
    match value {
        Value::Float(f) if f.is_nan() => Value::Null,
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Value::Int(*f as i64),
        other => other.clone(),
    }
}

/// Key of `row`, or `None` when the policy excludes it. Under
/// [`NullKeyPolicy::Exclude`] null, blank text and NaN all count as missing.
pub(crate) fn row_key(columns: &[&[Value]], row: usize, policy: NullKeyPolicy) -> Option<BlockKey> {
    let mut key = BlockKey::with_capacity(columns.len());
    for column in columns {
        let value = &column[row];
        if policy == NullKeyPolicy::Exclude && value.is_missing() {
            return None;
        }
        key.push(key_value(value));
    }
    Some(key)
}

/// Group rows by key. Rows inside a block stay in table order.
pub(crate) fn build_blocks(
    columns: &[&[Value]],
    rows: impl IntoIterator<Item = usize>,
    policy: NullKeyPolicy,
) -> AHashMap<BlockKey, Vec<usize>> {
    let mut blocks: AHashMap<BlockKey, Vec<usize>> = AHashMap::new();
    for row in rows {
        if let Some(key) = row_key(columns, row, policy) {
            blocks.entry(key).or_default().push(row);
        }
    }
    blocks
}

/// Names of a column as text, `None` for null or blank cells.
pub(crate) fn name_column<'t>(table: &'t Table, field: &str) -> Vec<Option<Cow<'t, str>>> {
    table
        .column(field)
        .map(|column| {
            column
                .iter()
                .map(|v| if v.is_blank() { None } else { v.as_text() })
                .collect()
        })
        .unwrap_or_default()
}

/// Candidate rows of one block with their names, ready for
/// [`Scorer::best_match`](crate::algorithms::Scorer::best_match).
#[derive(Debug, Default)]
pub(crate) struct Candidates<'n> {
    pub rows: Vec<usize>,
    pub names: Vec<&'n str>,
}

impl<'n> Candidates<'n> {
    pub(crate) fn collect(
        rows: impl IntoIterator<Item = usize>,
        names: &'n [Option<Cow<'_, str>>],
    ) -> Self {
        let mut candidates = Candidates::default();
        for row in rows {
            if let Some(name) = names[row].as_deref() {
                candidates.rows.push(row);
                candidates.names.push(name);
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            ["School", "Name"],
            vec![
                vec![Value::from("A"), Value::from("Jane")],
                vec![Value::Null, Value::from("Mike")],
                vec![Value::from("A"), Value::from("  ")],
                vec![Value::Null, Value::from("Sam")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_blocks_keep_table_order() {
        let table = table();
        let fields = vec!["School".to_string()];
        let columns = key_columns(&table, &fields);
        let blocks = build_blocks(&columns, 0..table.len(), NullKeyPolicy::Match);
        let key: BlockKey = SmallVec::from_vec(vec![Value::from("A")]);
        assert_eq!(blocks[&key], vec![0, 2]);
        let null_key: BlockKey = SmallVec::from_vec(vec![Value::Null]);
        assert_eq!(blocks[&null_key], vec![1, 3]);
    }

    #[test]
    fn test_exclude_policy_drops_null_keys() {
        let table = table();
        let fields = vec!["School".to_string()];
        let columns = key_columns(&table, &fields);
        let blocks = build_blocks(&columns, 0..table.len(), NullKeyPolicy::Exclude);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_exclude_policy_drops_nan_and_blank_keys() {
        let keys = [Value::Float(f64::NAN), Value::from("  "), Value::Float(f64::NAN)];
        for row in 0..keys.len() {
            assert_eq!(row_key(&[&keys[..]], row, NullKeyPolicy::Exclude), None);
        }
        let blocks = build_blocks(&[&keys[..]], 0..keys.len(), NullKeyPolicy::Exclude);
        assert!(blocks.is_empty());

        // under Match a NaN is just another null
        let nan = row_key(&[&keys[..]], 0, NullKeyPolicy::Match);
        let null = row_key(&[&[Value::Null][..]], 0, NullKeyPolicy::Match);
        assert_eq!(nan, null);
    }

    #[test]
    fn test_integral_float_joins_int() {
        let floats = [Value::Float(3.0)];
        let ints = [Value::Int(3)];
        let a = row_key(&[&floats[..]], 0, NullKeyPolicy::Match);
        let b = row_key(&[&ints[..]], 0, NullKeyPolicy::Match);
        assert_eq!(a, b);
    }

    #[test]
    fn test_candidates_skip_blank_names() {
        let table = table();
        let names = name_column(&table, "Name");
        let candidates = Candidates::collect([0, 2], &names);
        assert_eq!(candidates.rows, vec![0]);
        assert_eq!(candidates.names, vec!["Jane"]);
    }

    #[test]
    fn test_no_fields_is_one_block() {
        let table = table();
        let blocks = build_blocks(&[], 0..table.len(), NullKeyPolicy::Exclude);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks.values().next().unwrap().len(), 4);
    }
}
