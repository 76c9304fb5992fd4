//! Matcher configuration
//!
//! Every matcher takes a serde-friendly config struct so a waterfall can be
//! described in JSON or TOML and loaded by the caller. Optional settings
//! carry `#[serde(default)]` values; `validate()` checks what can be checked
//! without seeing the tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithms::normalize::NormalizationMode;
use crate::error::{MatchError, Result};
use crate::matching::{DEFAULT_ID_FIELD, DUPLICATES_COLUMN};

/// Default similarity threshold (percentage).
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// How null values behave inside exact or blocking keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullKeyPolicy {
    /// Null equals null: rows with null keys join each other.
    #[default]
    Match,
    /// A key containing a null never matches anything.
    Exclude,
}

/// Blocking mode of the duplicate clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyType {
    /// Block on date of birth and postcode
    #[default]
    Strict,
    /// Block on date of birth only
    Permissive,
}

impl FromStr for FuzzyType {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(FuzzyType::Strict),
            "permissive" => Ok(FuzzyType::Permissive),
            _ => Err(MatchError::InvalidFuzzyType(s.to_string())),
        }
    }
}

impl fmt::Display for FuzzyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuzzyType::Strict => f.write_str("strict"),
            FuzzyType::Permissive => f.write_str("permissive"),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

fn default_duplicates_column() -> String {
    DUPLICATES_COLUMN.to_string()
}

fn default_true() -> bool {
    true
}

fn strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

pub(crate) fn check_threshold(threshold: f64) -> Result<()> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold(threshold))
    }
}

fn check_pairs(left: &[String], right: &[String]) -> Result<()> {
    if left.len() == right.len() {
        Ok(())
    } else {
        Err(MatchError::FilterColumnMismatch {
            left: left.len(),
            right: right.len(),
        })
    }
}

/// Configuration for [`exact_match`](crate::matching::exact_match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactMatchConfig {
    /// Join fields of the source table
    pub source_fields: Vec<String>,
    /// Join fields of the target table, paired positionally
    pub target_fields: Vec<String>,
    /// Written to the `Match Type` column
    pub label: String,
    /// Identifier column of the target
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Carry every target column for manual checking
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub null_keys: NullKeyPolicy,
}

impl ExactMatchConfig {
    pub fn new<I, J, S, T>(source_fields: I, target_fields: J, label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            source_fields: strings(source_fields),
            target_fields: strings(target_fields),
            label: label.into(),
            id_field: default_id_field(),
            verify: false,
            null_keys: NullKeyPolicy::default(),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_null_keys(mut self, policy: NullKeyPolicy) -> Self {
        self.null_keys = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_pairs(&self.source_fields, &self.target_fields)
    }
}

/// Configuration for [`fuzzy_match`](crate::matching::fuzzy_match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatchConfig {
    /// Exact blocking fields of the source table
    pub source_filters: Vec<String>,
    /// Exact blocking fields of the target table, paired positionally
    pub target_filters: Vec<String>,
    /// Name field scored in the source
    pub source_name: String,
    /// Name field scored in the target
    pub target_name: String,
    pub label: String,
    /// Minimum score (0-100) for a match
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub null_keys: NullKeyPolicy,
}

impl FuzzyMatchConfig {
    pub fn new<I, J, S, T>(
        source_filters: I,
        target_filters: J,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        label: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            source_filters: strings(source_filters),
            target_filters: strings(target_filters),
            source_name: source_name.into(),
            target_name: target_name.into(),
            label: label.into(),
            threshold: DEFAULT_THRESHOLD,
            null_keys: NullKeyPolicy::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_null_keys(mut self, policy: NullKeyPolicy) -> Self {
        self.null_keys = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_pairs(&self.source_filters, &self.target_filters)?;
        check_threshold(self.threshold)
    }
}

/// Configuration for
/// [`age_range_fuzzy_match`](crate::matching::age_range_fuzzy_match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRangeMatchConfig {
    /// Year group field of the source
    pub source_group: String,
    /// Exact blocking fields of the source, e.g. school
    #[serde(default)]
    pub source_filters: Vec<String>,
    #[serde(default)]
    pub target_filters: Vec<String>,
    pub source_name: String,
    pub target_name: String,
    /// Date of birth field of the target
    pub target_dob: String,
    /// Identifier used to resolve conflicting matches
    #[serde(default = "default_id_field")]
    pub target_id: String,
    /// First calendar year of the academic year, e.g. 2024 for 2024/25
    pub academic_year: i32,
    pub label: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub null_keys: NullKeyPolicy,
}

impl AgeRangeMatchConfig {
    pub fn new(
        source_group: impl Into<String>,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        target_dob: impl Into<String>,
        academic_year: i32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source_group: source_group.into(),
            source_filters: Vec::new(),
            target_filters: Vec::new(),
            source_name: source_name.into(),
            target_name: target_name.into(),
            target_dob: target_dob.into(),
            target_id: default_id_field(),
            academic_year,
            label: label.into(),
            threshold: DEFAULT_THRESHOLD,
            null_keys: NullKeyPolicy::default(),
        }
    }

    pub fn with_filters<I, J, S, T>(mut self, source_filters: I, target_filters: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        self.source_filters = strings(source_filters);
        self.target_filters = strings(target_filters);
        self
    }

    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = target_id.into();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_null_keys(mut self, policy: NullKeyPolicy) -> Self {
        self.null_keys = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_pairs(&self.source_filters, &self.target_filters)?;
        check_threshold(self.threshold)
    }
}

/// Configuration for the duplicate clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// One full-name field, or several parts (first, middle, last)
    pub name_fields: Vec<String>,
    pub dob_field: String,
    pub postcode_field: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub fuzzy_type: FuzzyType,
    /// Require first names to agree when surname, dob and postcode do
    #[serde(default = "default_true")]
    pub twin_protection: bool,
    /// First-name threshold for twin protection; `threshold` when unset
    #[serde(default)]
    pub twin_threshold: Option<f64>,
    /// Field used to render group members; row numbers when unset
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default = "default_duplicates_column")]
    pub output_column: String,
    #[serde(default)]
    pub normalization: NormalizationMode,
}

impl DuplicateConfig {
    pub fn new<I, S>(
        name_fields: I,
        dob_field: impl Into<String>,
        postcode_field: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name_fields: strings(name_fields),
            dob_field: dob_field.into(),
            postcode_field: postcode_field.into(),
            threshold: DEFAULT_THRESHOLD,
            fuzzy_type: FuzzyType::default(),
            twin_protection: true,
            twin_threshold: None,
            id_field: None,
            output_column: default_duplicates_column(),
            normalization: NormalizationMode::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fuzzy_type(mut self, fuzzy_type: FuzzyType) -> Self {
        self.fuzzy_type = fuzzy_type;
        self
    }

    pub fn with_twin_protection(mut self, enabled: bool) -> Self {
        self.twin_protection = enabled;
        self
    }

    pub fn with_twin_threshold(mut self, threshold: f64) -> Self {
        self.twin_threshold = Some(threshold);
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }

    pub fn with_output_column(mut self, column: impl Into<String>) -> Self {
        self.output_column = column.into();
        self
    }

    pub fn with_normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    /// Effective first-name threshold for twin protection.
    pub fn effective_twin_threshold(&self) -> f64 {
        self.twin_threshold.unwrap_or(self.threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name_fields.is_empty() {
            return Err(MatchError::NoNameFields);
        }
        check_threshold(self.threshold)?;
        check_threshold(self.effective_twin_threshold())?;

        let output = &self.output_column;
        let clashes = self
            .name_fields
            .iter()
            .chain([&self.dob_field, &self.postcode_field])
            .chain(self.id_field.as_ref())
            .any(|field| field == output);
        if clashes {
            return Err(MatchError::OutputColumnClash(output.clone()));
        }
        Ok(())
    }
}
