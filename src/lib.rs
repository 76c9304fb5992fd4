//! heatmatch - Student record linkage for HEAT
//!
//! Links externally supplied student records (school or event lists) to the
//! records already held in a HEAT export, finds likely duplicates within a
//! collection, and works out which fields need updating.
//!
//! # Features
//! - Waterfall matching stages: exact, blocked fuzzy, age-range fuzzy
//! - Duplicate clustering with blocking, twin protection and union-find
//! - Update detection with placeholder suppression
//! - Pluggable similarity via the [`Scorer`] trait (RapidFuzz-compatible
//!   scorers included)
//! - Year-group eligibility for the English school system
//!
//! # Example
//!
//! ```rust
//! use heatmatch::prelude::*;
//!
//! let source = Table::from_rows(
//!     ["Full Name", "DOB"],
//!     vec![vec![Value::from("Jane Doe"), Value::from("2008-09-02")]],
//! )
//! .unwrap();
//! let heat = Table::from_rows(
//!     ["Student Name", "Date of Birth", "Student HEAT ID"],
//!     vec![vec![Value::from("Jane  Doe"), Value::from("2008-09-02"), Value::Int(7)]],
//! )
//! .unwrap();
//!
//! let exact = exact_match(
//!     &source,
//!     &heat,
//!     &ExactMatchConfig::new(["Full Name", "DOB"], ["Student Name", "Date of Birth"], "Exact"),
//! )
//! .unwrap();
//! assert!(exact.matched.is_empty());
//!
//! let fuzzy = fuzzy_match(
//!     &exact.unmatched,
//!     &heat,
//!     &FuzzyMatchConfig::new(["DOB"], ["Date of Birth"], "Full Name", "Student Name", "Fuzzy"),
//! )
//! .unwrap();
//! assert_eq!(fuzzy.matched.len(), 1);
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod algorithms;
pub mod config;
pub mod dedup;
pub mod error;
pub mod matching;
pub mod table;
pub mod updates;
pub mod yeargroup;

pub use algorithms::Scorer;
pub use config::{
    AgeRangeMatchConfig, DuplicateConfig, ExactMatchConfig, FuzzyMatchConfig, FuzzyType,
    NullKeyPolicy,
};
pub use dedup::{
    find_duplicate_groups, find_duplicate_groups_with_scorer, find_duplicates,
    find_duplicates_with_scorer, DuplicateGroups,
};
pub use error::{MatchError, Result};
pub use matching::{
    age_range_fuzzy_match, age_range_fuzzy_match_with, exact_match, fuzzy_match,
    fuzzy_match_with_scorer, Advisory, MatchOutcome,
};
pub use table::{DType, Table, TableError, Value};
pub use updates::{check_types, get_contextual_updates, get_updates, Updates};
pub use yeargroup::{
    clean_year_group, dob_range_from_year_group, parse_year_group, year_group_from_date,
    DobWindow, EligibilityWindow, EnglishSchoolYear, YearGroup,
};

/// Everything needed to build a waterfall.
pub mod prelude {
    pub use crate::algorithms::{Scorer, TokenSortRatio};
    pub use crate::config::{
        AgeRangeMatchConfig, DuplicateConfig, ExactMatchConfig, FuzzyMatchConfig, FuzzyType,
        NullKeyPolicy,
    };
    pub use crate::dedup::find_duplicates;
    pub use crate::matching::{
        age_range_fuzzy_match, exact_match, fuzzy_match, Advisory, MatchOutcome,
    };
    pub use crate::table::{Table, Value};
    pub use crate::updates::{get_contextual_updates, get_updates, Updates};
}
