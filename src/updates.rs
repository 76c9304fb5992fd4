//! Update detection between fresh data and existing records
//!
//! Given a table where a new value and the existing value of the same
//! attribute sit side by side (e.g. after a match), produce the column of
//! values that need writing back: the new value where it differs, null
//! where nothing should change.

use ahash::AHashSet;
use tracing::warn;

use crate::error::{MatchError, Result};
use crate::matching::Advisory;
use crate::table::{DType, Table, Value};

fn columns<'t>(
    table: &'t Table,
    new_field: &str,
    existing_field: &str,
) -> Result<(&'t [Value], &'t [Value])> {
    let new = table
        .column(new_field)
        .ok_or_else(|| MatchError::missing(new_field, "table"))?;
    let existing = table
        .column(existing_field)
        .ok_or_else(|| MatchError::missing(existing_field, "table"))?;
    Ok((new, existing))
}

/// Report when the two columns hold different kinds of values.
///
/// All-null columns have no type and never mismatch.
pub fn check_types(
    table: &Table,
    new_field: &str,
    existing_field: &str,
) -> Result<Option<Advisory>> {
    let dtype = |field: &str| {
        table
            .column_dtype(field)
            .ok_or_else(|| MatchError::missing(field, "table"))
    };
    let (new_type, existing_type) = (dtype(new_field)?, dtype(existing_field)?);
    if new_type == existing_type || new_type == DType::Empty || existing_type == DType::Empty {
        return Ok(None);
    }

    warn!(
        new_field,
        existing_field,
        %new_type,
        %existing_type,
        "Type mismatch: {new_field} is {new_type}, but {existing_field} is {existing_type}"
    );
    Ok(Some(Advisory::TypeMismatch {
        new_field: new_field.to_string(),
        existing_field: existing_field.to_string(),
        new_type,
        existing_type,
    }))
}

/// Values to write back, one per row, plus anything worth flagging.
#[derive(Debug, Clone, PartialEq)]
pub struct Updates {
    /// The new value where it differs, null where nothing should change
    pub values: Vec<Value>,
    /// [`Advisory::TypeMismatch`] when the two columns disagree on type
    pub advisories: Vec<Advisory>,
}

static NULL: Value = Value::Null;

/// Blank text counts as missing.
fn clean(value: &Value) -> &Value {
    if value.is_blank() {
        &NULL
    } else {
        value
    }
}

fn differs(new: &Value, existing: &Value) -> bool {
    !new.loose_eq(existing)
}

/// Values of `new_field` that differ from `existing_field`, row by row.
///
/// Rows where both are null, or both are equal, yield null. Blank text in
/// the new field is treated as null first, so it never overwrites data.
pub fn get_updates(table: &Table, new_field: &str, existing_field: &str) -> Result<Updates> {
    let (new, existing) = columns(table, new_field, existing_field)?;
    let advisories = check_types(table, new_field, existing_field)?.into_iter().collect();

    let values = new
        .iter()
        .zip(existing)
        .map(|(n, e)| {
            let n = clean(n);
            if differs(n, e) {
                n.clone()
            } else {
                Value::Null
            }
        })
        .collect();
    Ok(Updates { values, advisories })
}

/// Like [`get_updates`], but a new value listed in `bad_values` (e.g.
/// "Unknown", "Not available") is never emitted.
pub fn get_contextual_updates<I, V>(
    table: &Table,
    new_field: &str,
    existing_field: &str,
    bad_values: I,
) -> Result<Updates>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let (new, existing) = columns(table, new_field, existing_field)?;
    let advisories = check_types(table, new_field, existing_field)?.into_iter().collect();
    let bad: AHashSet<Value> = bad_values.into_iter().map(Into::into).collect();

    let values = new
        .iter()
        .zip(existing)
        .map(|(n, e)| {
            let n = clean(n);
            if !n.is_null() && !bad.contains(n) && differs(n, e) {
                n.clone()
            } else {
                Value::Null
            }
        })
        .collect();
    Ok(Updates { values, advisories })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<(Value, Value)>) -> Table {
        Table::from_rows(
            ["Postcode", "HEAT: Postcode"],
            rows.into_iter().map(|(a, b)| vec![a, b]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_get_updates_null_handling() {
        let table = table(vec![
            ("AA1 1AA".into(), "AA1 1AA".into()),
            ("BB1 1BB".into(), "CC1 1CC".into()),
            (Value::Null, Value::Null),
            ("DD1 1DD".into(), Value::Null),
            (Value::Null, "EE1 1EE".into()),
            ("   ".into(), "FF1 1FF".into()),
            ("".into(), Value::Null),
        ]);
        let updates = get_updates(&table, "Postcode", "HEAT: Postcode").unwrap();
        assert!(updates.advisories.is_empty());
        assert_eq!(
            updates.values,
            vec![
                Value::Null,
                Value::from("BB1 1BB"),
                Value::Null,
                Value::from("DD1 1DD"),
                Value::Null,
                Value::Null,
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let table = table(vec![
            (Value::Int(3), Value::Float(3.0)),
            (Value::Int(4), Value::Float(3.0)),
        ]);
        let updates = get_updates(&table, "Postcode", "HEAT: Postcode").unwrap();
        assert_eq!(updates.values, vec![Value::Null, Value::Int(4)]);
    }

    #[test]
    fn test_contextual_suppresses_bad_values() {
        let table = table(vec![
            ("Unknown".into(), "Free School Meals".into()),
            ("Not available".into(), Value::Null),
            ("No FSM".into(), "Free School Meals".into()),
            (Value::Null, "Free School Meals".into()),
        ]);
        let updates =
            get_contextual_updates(&table, "Postcode", "HEAT: Postcode", ["Unknown", "Not available"])
                .unwrap();
        assert_eq!(
            updates.values,
            vec![Value::Null, Value::Null, Value::from("No FSM"), Value::Null]
        );
    }

    #[test]
    fn test_missing_column() {
        let table = table(vec![]);
        assert_eq!(
            get_updates(&table, "Postcode", "Wrong").unwrap_err(),
            MatchError::missing("Wrong", "table")
        );
    }

    #[test]
    fn test_type_mismatch_is_advisory() {
        let table = table(vec![(Value::Int(1), "1".into())]);
        let mismatch = Advisory::TypeMismatch {
            new_field: "Postcode".into(),
            existing_field: "HEAT: Postcode".into(),
            new_type: DType::Int,
            existing_type: DType::Text,
        };
        let advisory = check_types(&table, "Postcode", "HEAT: Postcode").unwrap();
        assert_eq!(advisory, Some(mismatch.clone()));

        // still produces updates, and reports the mismatch with them
        let updates = get_updates(&table, "Postcode", "HEAT: Postcode").unwrap();
        assert_eq!(updates.values, vec![Value::Int(1)]);
        assert_eq!(updates.advisories, vec![mismatch.clone()]);
        let contextual =
            get_contextual_updates(&table, "Postcode", "HEAT: Postcode", ["Unknown"]).unwrap();
        assert_eq!(contextual.advisories, vec![mismatch]);
    }
}
