//! # Core Type Definitions
//!
//! This module contains the record types shared by every store and query:
//! - Person identifier (`PersonId`)
//! - Records (`Person`, `PersonDraft`, `Gender`)
//! - Aggregates (`GenderCounts`)
//! - Error types (`LineageError`)
//!
//! ## Ordering Guarantees
//!
//! `PersonId` implements `Ord` so stores and traversals can keep results in
//! `BTreeMap`/`BTreeSet` and return them in ascending id order.

use crate::primitives::{MAX_FULL_NAME_LENGTH, MAX_GENDER_LABEL_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a person record.
///
/// Assigned by the store on insert and never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// GENDER
// =============================================================================

/// Gender label of a person. An absent label means unknown.
///
/// `Male` and `Female` are the labels the counting queries look for. Any
/// other label is kept verbatim in `Other`; it is part of the family but
/// never matches either count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    /// The exact label used on the wire and in storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other(label) => label,
        }
    }

    fn check_label(label: &str) -> Result<(), LineageError> {
        if label.trim().is_empty() {
            return Err(LineageError::InvalidInput(
                "gender label must not be blank".to_string(),
            ));
        }
        if label.len() > MAX_GENDER_LABEL_LENGTH {
            return Err(LineageError::InvalidInput(format!(
                "gender label length {} exceeds maximum {} bytes",
                label.len(),
                MAX_GENDER_LABEL_LENGTH
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = LineageError;

    /// Labels match exactly; `"male"` is kept as `Other("male")`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::check_label(s)?;
        Ok(match s {
            "Male" => Self::Male,
            "Female" => Self::Female,
            other => Self::Other(other.to_string()),
        })
    }
}

// =============================================================================
// PERSON
// =============================================================================

/// One individual in the registry.
///
/// `father_id` and `mother_id` point from child to parent. Once stored, a
/// parent reference may dangle (the parent was deleted); readers must
/// resolve it and treat a miss as "no such ancestor".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    pub gender: Option<Gender>,
    pub father_id: Option<PersonId>,
    pub mother_id: Option<PersonId>,
}

impl Person {
    /// Materialize a draft under an assigned id.
    #[must_use]
    pub fn from_draft(id: PersonId, draft: PersonDraft) -> Self {
        Self {
            id,
            full_name: draft.full_name,
            gender: draft.gender,
            father_id: draft.father_id,
            mother_id: draft.mother_id,
        }
    }

    /// Check whether `parent` is this person's father or mother.
    #[must_use]
    pub fn is_child_of(&self, parent: PersonId) -> bool {
        self.father_id == Some(parent) || self.mother_id == Some(parent)
    }
}

/// A person that has not been stored yet (no id).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonDraft {
    pub full_name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub father_id: Option<PersonId>,
    #[serde(default)]
    pub mother_id: Option<PersonId>,
}

impl PersonDraft {
    /// Create a draft with only a name.
    #[must_use]
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// Set the gender label.
    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Set the father reference.
    #[must_use]
    pub fn with_father(mut self, father: PersonId) -> Self {
        self.father_id = Some(father);
        self
    }

    /// Set the mother reference.
    #[must_use]
    pub fn with_mother(mut self, mother: PersonId) -> Self {
        self.mother_id = Some(mother);
        self
    }

    /// Validate the fields that do not need the store.
    ///
    /// Parent existence is checked by the store on insert.
    pub fn validate(&self) -> Result<(), LineageError> {
        if self.full_name.trim().is_empty() {
            return Err(LineageError::InvalidInput(
                "full_name must not be empty".to_string(),
            ));
        }
        if self.full_name.len() > MAX_FULL_NAME_LENGTH {
            return Err(LineageError::InvalidInput(format!(
                "full_name length {} exceeds maximum {} bytes",
                self.full_name.len(),
                MAX_FULL_NAME_LENGTH
            )));
        }
        if let Some(Gender::Other(label)) = &self.gender {
            Gender::check_label(label)?;
        }
        if self.father_id.is_some() && self.father_id == self.mother_id {
            return Err(LineageError::InvalidInput(
                "father_id and mother_id must differ".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Gender counts over one immediate family.
///
/// `male + female + other + unknown == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenderCounts {
    pub male: usize,
    pub female: usize,
    /// Members with a label other than `Male`/`Female`.
    pub other: usize,
    /// Members with no label.
    pub unknown: usize,
    pub total: usize,
}

impl GenderCounts {
    /// Count one member.
    pub fn record(&mut self, gender: Option<&Gender>) {
        match gender {
            Some(Gender::Male) => self.male += 1,
            Some(Gender::Female) => self.female += 1,
            Some(Gender::Other(_)) => self.other += 1,
            None => self.unknown += 1,
        }
        self.total += 1;
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the lineage system.
///
/// Absence is only an error where a caller needs an anchor record
/// (generation depth, delete). Everywhere else a missing person or a
/// dangling parent reference yields an empty result.
#[derive(Debug, Error)]
pub enum LineageError {
    /// The requested person does not exist.
    #[error("Person not found: {0}")]
    NotFound(PersonId),

    /// A draft or query argument is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or database error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// No id is left to assign after the given one.
    #[error("Id space exhausted: no id follows {0}")]
    IdSpaceExhausted(i64),
}

// =============================================================================
// TESTS
// =============================================================================
