//! # Person Registry
//!
//! The `PersonStore` trait and its in-memory implementation.
//!
//! All data structures use `BTreeMap` so listings come back in ascending
//! id order, which is also insertion order since ids only grow.

use crate::primitives::FIRST_PERSON_ID;
use crate::{LineageError, Person, PersonDraft, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PERSONSTORE TRAIT
// =============================================================================

/// Key-indexed store of person records.
///
/// All operations return `Result<T, LineageError>` so in-memory and
/// persistent backends share one signature. Deletes never cascade: children
/// of a deleted person keep their (now dangling) parent reference.
pub trait PersonStore {
    /// Point lookup. A missing id is `Ok(None)`, not an error.
    fn get_by_id(&self, id: PersonId) -> Result<Option<Person>, LineageError>;

    /// Every record matching `predicate`, in ascending id order.
    fn find_where(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> Result<Vec<Person>, LineageError>;

    /// Validate the draft, assign the next id, and store it.
    fn insert(&mut self, draft: PersonDraft) -> Result<Person, LineageError>;

    /// Remove a record. Returns the removed record or `NotFound`.
    fn delete_by_id(&mut self, id: PersonId) -> Result<Person, LineageError>;

    /// All records in ascending id order.
    fn list_all(&self) -> Result<Vec<Person>, LineageError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, LineageError>;

    /// Check whether the store holds no records.
    fn is_empty(&self) -> Result<bool, LineageError> {
        Ok(self.len()? == 0)
    }

    /// Check whether a record exists.
    fn contains(&self, id: PersonId) -> Result<bool, LineageError> {
        Ok(self.get_by_id(id)?.is_some())
    }

    /// Every record whose father or mother is `parent`.
    fn children_of(&self, parent: PersonId) -> Result<Vec<Person>, LineageError> {
        self.find_where(&|p: &Person| p.is_child_of(parent))
    }
}

/// The id that follows `id`.
///
/// # Errors
///
/// `LineageError::IdSpaceExhausted` when `id` is already `i64::MAX`.
pub fn id_after(id: i64) -> Result<i64, LineageError> {
    id.checked_add(1).ok_or(LineageError::IdSpaceExhausted(id))
}

/// Validate a draft against the store before it is inserted.
///
/// Parents must exist at insert time; they may dangle later.
pub fn check_draft<S: PersonStore + ?Sized>(
    store: &S,
    draft: &PersonDraft,
) -> Result<(), LineageError> {
    draft.validate()?;
    for (role, parent) in [("father_id", draft.father_id), ("mother_id", draft.mother_id)] {
        if let Some(parent) = parent
            && !store.contains(parent)?
        {
            return Err(LineageError::InvalidInput(format!(
                "{} {} does not reference an existing person",
                role, parent
            )));
        }
    }
    Ok(())
}

// =============================================================================
// REGISTRY IMPLEMENTATION
// =============================================================================

/// In-memory person store.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Person storage: PersonId -> Person
    persons: BTreeMap<PersonId, Person>,

    /// Next id to hand out. Never decreases.
    next_id: i64,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            persons: BTreeMap::new(),
            next_id: FIRST_PERSON_ID,
        }
    }
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id the next insert will receive.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Iterate over all records in ascending id order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> {
        self.persons.values()
    }

    /// Put a record back under its original id (snapshot import).
    ///
    /// Does not check parent references; a snapshot may legitimately
    /// contain dangling ones. Refuses an id with no successor, since the
    /// counter could not move past it.
    pub fn restore(&mut self, person: Person) -> Result<(), LineageError> {
        let after = id_after(person.id.0)?;
        if person.id.0 >= self.next_id {
            self.next_id = after;
        }
        self.persons.insert(person.id, person);
        Ok(())
    }
}

impl PersonStore for Registry {
    fn get_by_id(&self, id: PersonId) -> Result<Option<Person>, LineageError> {
        Ok(self.persons.get(&id).cloned())
    }

    fn find_where(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> Result<Vec<Person>, LineageError> {
        Ok(self
            .persons
            .values()
            .filter(|p| predicate(p))
            .cloned()
            .collect())
    }

    fn insert(&mut self, draft: PersonDraft) -> Result<Person, LineageError> {
        check_draft(self, &draft)?;

        let id = PersonId(self.next_id);
        self.next_id = id_after(self.next_id)?;

        let person = Person::from_draft(id, draft);
        self.persons.insert(id, person.clone());
        Ok(person)
    }

    fn delete_by_id(&mut self, id: PersonId) -> Result<Person, LineageError> {
        self.persons.remove(&id).ok_or(LineageError::NotFound(id))
    }

    fn list_all(&self) -> Result<Vec<Person>, LineageError> {
        Ok(self.persons.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, LineageError> {
        Ok(self.persons.len())
    }

    fn contains(&self, id: PersonId) -> Result<bool, LineageError> {
        Ok(self.persons.contains_key(&id))
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Serializable view of a registry: every record plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub next_id: i64,
    pub persons: Vec<Person>,
}

impl From<&Registry> for RegistrySnapshot {
    fn from(registry: &Registry) -> Self {
        Self {
            next_id: registry.next_id,
            persons: registry.persons.values().cloned().collect(),
        }
    }
}

impl TryFrom<RegistrySnapshot> for Registry {
    type Error = LineageError;

    fn try_from(snapshot: RegistrySnapshot) -> Result<Self, Self::Error> {
        id_after(snapshot.next_id)?;
        let mut registry = Self::new();
        for person in snapshot.persons {
            registry.restore(person)?;
        }
        // A snapshot taken after deletes may carry a counter above max(id).
        registry.next_id = registry.next_id.max(snapshot.next_id);
        Ok(registry)
    }
}

// =============================================================================
// TESTS
// =============================================================================
