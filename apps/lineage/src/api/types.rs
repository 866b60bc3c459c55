//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use lineage_core::{Gender, GenderCounts, LineageError, Person, PersonDraft, PersonId};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Registry status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub person_count: usize,
    pub next_id: i64,
    pub backend: String,
}

// =============================================================================
// PERSON JSON
// =============================================================================

/// Wire representation of a stored person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonJson {
    pub id: i64,
    pub full_name: String,
    pub gender: Option<String>,
    pub father_id: Option<i64>,
    pub mother_id: Option<i64>,
}

impl From<&Person> for PersonJson {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.0,
            full_name: person.full_name.clone(),
            gender: person.gender.as_ref().map(|g| g.as_str().to_string()),
            father_id: person.father_id.map(|p| p.0),
            mother_id: person.mother_id.map(|p| p.0),
        }
    }
}

// =============================================================================
// CREATE REQUEST/RESPONSE
// =============================================================================

/// Person creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePersonRequest {
    pub full_name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub father_id: Option<i64>,
    #[serde(default)]
    pub mother_id: Option<i64>,
}

impl CreatePersonRequest {
    /// Convert to a draft, validating the gender label and name.
    ///
    /// Parent existence is checked by the store.
    pub fn to_draft(&self) -> Result<PersonDraft, LineageError> {
        let gender = self
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()?;

        let draft = PersonDraft {
            full_name: self.full_name.clone(),
            gender,
            father_id: self.father_id.map(PersonId),
            mother_id: self.mother_id.map(PersonId),
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Single-person response (create and lookup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonResponse {
    pub success: bool,
    pub person: Option<PersonJson>,
    pub error: Option<String>,
}

impl PersonResponse {
    pub fn success(person: &Person) -> Self {
        Self {
            success: true,
            person: Some(PersonJson::from(person)),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            person: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// DELETE RESPONSE
// =============================================================================

/// Delete response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl DeleteResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// RELATIONSHIP QUERIES
// =============================================================================

/// `?person_id=` query string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersonQuery {
    pub person_id: i64,
}

/// Count response (family size, male count, female count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub person_id: i64,
    pub count: usize,
}

/// Paternal-line generation count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationsResponse {
    pub person_id: i64,
    pub generations: usize,
}

/// Immediate-family response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyResponse {
    pub person_id: i64,
    pub found: bool,
    pub members: Vec<PersonJson>,
    pub male: usize,
    pub female: usize,
    pub other: usize,
    pub unknown: usize,
}

impl FamilyResponse {
    pub fn new(person_id: PersonId, members: &[Person]) -> Self {
        let mut counts = GenderCounts::default();
        for member in members {
            counts.record(member.gender.as_ref());
        }
        Self {
            person_id: person_id.0,
            found: !members.is_empty(),
            members: members.iter().map(PersonJson::from).collect(),
            male: counts.male,
            female: counts.female,
            other: counts.other,
            unknown: counts.unknown,
        }
    }
}

/// Generic failure body for endpoints whose success shape has no error slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Snapshot export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    /// Base64-encoded binary snapshot.
    pub data: Option<String>,
    pub person_count: usize,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: &[u8], person_count: usize) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                data,
            )),
            person_count,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            person_count: 0,
            error: Some(msg.into()),
        }
    }
}
