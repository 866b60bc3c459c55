//! # Storage Backend
//!
//! One owned store handle that the app layer can share, regardless of
//! where records live:
//! - `InMemory`: a `Registry` (fast, volatile unless saved as a snapshot file)
//! - `Persistent`: a `RedbRegistry` (disk-backed ACID storage)

use crate::registry::{PersonStore, Registry, RegistrySnapshot};
use crate::storage::RedbRegistry;
use crate::{FamilyGraph, LineageError, Person, PersonDraft, PersonId};
use std::path::Path;

/// Storage backend for the service.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory registry (fast, volatile).
    InMemory(Registry),
    /// Disk-backed registry using redb (ACID, persistent).
    Persistent(RedbRegistry),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Registry::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbRegistry (database handle) cannot be safely cloned.

impl StorageBackend {
    /// Create an empty in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open or create a redb database at the given path.
    pub fn open_redb(path: impl AsRef<Path>) -> Result<Self, LineageError> {
        Ok(Self::Persistent(RedbRegistry::open(path)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    /// Short backend name for status output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InMemory(_) => "memory",
            Self::Persistent(_) => "redb",
        }
    }

    /// Get the id the next insert will receive.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        match self {
            Self::InMemory(r) => r.next_id(),
            Self::Persistent(r) => r.next_id(),
        }
    }

    /// Capture every record and the id counter (works with both backends).
    pub fn snapshot(&self) -> Result<RegistrySnapshot, LineageError> {
        match self {
            Self::InMemory(r) => Ok(RegistrySnapshot::from(r)),
            Self::Persistent(r) => r.snapshot(),
        }
    }

    /// Replace all records with the snapshot's contents.
    pub fn load_snapshot(&mut self, snapshot: RegistrySnapshot) -> Result<(), LineageError> {
        match self {
            Self::InMemory(r) => {
                *r = Registry::try_from(snapshot)?;
                Ok(())
            }
            Self::Persistent(r) => r.load_snapshot(&snapshot),
        }
    }

    /// Relationship queries over this backend.
    #[must_use]
    pub fn family(&self) -> FamilyGraph<'_, Self> {
        FamilyGraph::new(self)
    }
}

impl PersonStore for StorageBackend {
    fn get_by_id(&self, id: PersonId) -> Result<Option<Person>, LineageError> {
        match self {
            Self::InMemory(r) => r.get_by_id(id),
            Self::Persistent(r) => r.get_by_id(id),
        }
    }

    fn find_where(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> Result<Vec<Person>, LineageError> {
        match self {
            Self::InMemory(r) => r.find_where(predicate),
            Self::Persistent(r) => r.find_where(predicate),
        }
    }

    fn insert(&mut self, draft: PersonDraft) -> Result<Person, LineageError> {
        match self {
            Self::InMemory(r) => r.insert(draft),
            Self::Persistent(r) => r.insert(draft),
        }
    }

    fn delete_by_id(&mut self, id: PersonId) -> Result<Person, LineageError> {
        match self {
            Self::InMemory(r) => r.delete_by_id(id),
            Self::Persistent(r) => r.delete_by_id(id),
        }
    }

    fn list_all(&self) -> Result<Vec<Person>, LineageError> {
        match self {
            Self::InMemory(r) => r.list_all(),
            Self::Persistent(r) => r.list_all(),
        }
    }

    fn len(&self) -> Result<usize, LineageError> {
        match self {
            Self::InMemory(r) => r.len(),
            Self::Persistent(r) => r.len(),
        }
    }

    fn contains(&self, id: PersonId) -> Result<bool, LineageError> {
        match self {
            Self::InMemory(r) => r.contains(id),
            Self::Persistent(r) => r.contains(id),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
