//! Eligibility rules: which hospitals a community may be assigned to.

use care_map_facility_models::Facility;
use care_map_loader::schema::{NOTE_COLUMNS, resolve_column};
use care_map_loader::truthy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::ViewError;

/// Eligibility rule as written in a view definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EligibilityRule {
    /// Every hospital is eligible.
    #[default]
    Any,
    /// Hospitals that accept a benefit scheme, read from a flag column.
    Accepts {
        /// Candidate flag column names, in priority order.
        columns: Vec<String>,
        /// Keywords searched in free-text note/type columns when no flag
        /// column exists.
        #[serde(default)]
        keywords: Vec<String>,
    },
    /// Hospitals whose ownership type equals a value.
    FacilityType {
        /// Expected type (compared after trimming).
        equals: String,
    },
}

impl EligibilityRule {
    /// Resolves the rule against the hospital table's header row.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidKeywords`] if the keyword list cannot be
    /// compiled into a pattern.
    pub fn compile(&self, columns: &[String]) -> Result<EligibilityPredicate, ViewError> {
        match self {
            Self::Any => Ok(EligibilityPredicate::Any),
            Self::FacilityType { equals } => {
                Ok(EligibilityPredicate::FacilityType(equals.trim().to_owned()))
            }
            Self::Accepts {
                columns: candidates,
                keywords,
            } => {
                if let Some(idx) = resolve_column(columns, candidates) {
                    log::info!("Eligibility column: {:?}", columns[idx]);
                    return Ok(EligibilityPredicate::Flag(columns[idx].clone()));
                }

                let note_columns: Vec<String> = columns
                    .iter()
                    .filter(|c| NOTE_COLUMNS.contains(&c.to_lowercase().as_str()))
                    .cloned()
                    .collect();

                if keywords.is_empty() || note_columns.is_empty() {
                    log::warn!(
                        "No eligibility column among {candidates:?} and no note columns to \
                         search; no hospital is eligible"
                    );
                    return Ok(EligibilityPredicate::Nothing);
                }

                log::info!(
                    "No eligibility column among {candidates:?}; searching {note_columns:?} \
                     for {keywords:?}"
                );
                let pattern = keywords
                    .iter()
                    .map(|k| regex::escape(k))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ViewError::InvalidKeywords(e.to_string()))?;

                Ok(EligibilityPredicate::Keywords {
                    columns: note_columns,
                    pattern,
                })
            }
        }
    }
}

/// An [`EligibilityRule`] bound to concrete columns.
#[derive(Debug, Clone)]
pub enum EligibilityPredicate {
    /// Every hospital.
    Any,
    /// No hospital (the rule's column does not exist).
    Nothing,
    /// Hospitals whose value in this column is truthy.
    Flag(String),
    /// Hospitals whose note columns mention any keyword.
    Keywords {
        /// Columns searched.
        columns: Vec<String>,
        /// Case-insensitive alternation of the keywords.
        pattern: Regex,
    },
    /// Hospitals of this ownership type.
    FacilityType(String),
}

impl EligibilityPredicate {
    /// Whether a hospital passes.
    #[must_use]
    pub fn is_eligible(&self, facility: &Facility) -> bool {
        match self {
            Self::Any => true,
            Self::Nothing => false,
            Self::Flag(column) => truthy(facility.attribute(column)),
            Self::Keywords { columns, pattern } => columns
                .iter()
                .filter_map(|c| facility.attribute(c))
                .any(|value| pattern.is_match(value)),
            Self::FacilityType(expected) => facility.facility_type.trim() == expected,
        }
    }
}
