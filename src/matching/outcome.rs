//! Stage results

use std::fmt;

use tracing::warn;

use crate::table::{DType, Table};

/// A non-fatal condition raised while matching.
///
/// Every advisory is also logged through `tracing`; the list on
/// [`MatchOutcome`] lets callers act on them without reading logs.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// Target keys were not unique, so some source rows matched more than
    /// once and the matched table has `extra` more rows than matched records.
    DuplicateTargetKeys { extra: usize },
    /// Source columns that clash with, or look like, carried target columns.
    ProvenanceCollision { columns: Vec<String> },
    /// The source was empty; the stage did nothing.
    NoRowsToMatch { label: String },
    /// The compared columns hold different types of values.
    TypeMismatch {
        new_field: String,
        existing_field: String,
        new_type: DType,
        existing_type: DType,
    },
    /// Rows in this group were left unmatched because their eligibility
    /// window could not be computed.
    SkippedGroup { group: String, reason: String },
    /// Weaker matches to an already-claimed target returned to unmatched.
    ConflictsDemoted { count: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::DuplicateTargetKeys { extra } => {
                write!(f, "{extra} extra record(s) created by duplicate target keys")
            }
            Advisory::ProvenanceCollision { columns } => {
                write!(f, "columns clash with target provenance: {}", columns.join(", "))
            }
            Advisory::NoRowsToMatch { label } => {
                write!(f, "skipping match type: {label}")
            }
            Advisory::TypeMismatch {
                new_field,
                existing_field,
                new_type,
                existing_type,
            } => write!(
                f,
                "'{new_field}' is {new_type} but '{existing_field}' is {existing_type}"
            ),
            Advisory::SkippedGroup { group, reason } => {
                write!(f, "skipped group '{group}': {reason}")
            }
            Advisory::ConflictsDemoted { count } => {
                write!(f, "{count} weaker match(es) to a claimed target returned to unmatched")
            }
        }
    }
}

/// Result of one waterfall stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Source rows joined to their target record
    pub matched: Table,
    /// Source rows left for the next stage, with their original labels
    pub unmatched: Table,
    pub advisories: Vec<Advisory>,
}

impl MatchOutcome {
    /// Outcome of a stage given no rows: both sides are empty copies of the
    /// source.
    pub(crate) fn nothing_to_match(source: &Table, label: &str) -> Self {
        let advisory = Advisory::NoRowsToMatch {
            label: label.to_string(),
        };
        warn!(label, "{advisory}");
        Self {
            matched: source.select_rows(&[]),
            unmatched: source.select_rows(&[]),
            advisories: vec![advisory],
        }
    }

    /// True if any advisory satisfies `pred`.
    pub fn has_advisory(&self, pred: impl Fn(&Advisory) -> bool) -> bool {
        self.advisories.iter().any(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_match_keeps_columns() {
        let source = Table::new(["Name", "DOB"]).unwrap();
        let outcome = MatchOutcome::nothing_to_match(&source, "Exact");
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched.column_names(), source.column_names());
        assert!(outcome.has_advisory(|a| matches!(a, Advisory::NoRowsToMatch { .. })));
    }

    #[test]
    fn test_display() {
        let advisory = Advisory::DuplicateTargetKeys { extra: 2 };
        assert_eq!(
            advisory.to_string(),
            "2 extra record(s) created by duplicate target keys"
        );
    }
}
