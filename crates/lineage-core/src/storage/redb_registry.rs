//! # redb-backed Person Storage
//!
//! A disk-backed person store using the redb embedded database, providing:
//! - ACID transactions (one write transaction per insert or delete)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded under their id. The id counter lives in a
//! metadata table so ids are never reused across restarts.

use crate::primitives::FIRST_PERSON_ID;
use crate::registry::{PersonStore, RegistrySnapshot, id_after};
use crate::{LineageError, Person, PersonDraft, PersonId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for persons: PersonId(i64) -> serialized Person bytes
const PERSONS: TableDefinition<i64, &[u8]> = TableDefinition::new("persons");

/// Table for metadata: key string -> value i64
const METADATA: TableDefinition<&str, i64> = TableDefinition::new("metadata");

/// Metadata key holding the next id to assign.
const NEXT_ID_KEY: &str = "next_person_id";

fn io_error(e: impl std::fmt::Display) -> LineageError {
    LineageError::IoError(e.to_string())
}

fn encode(person: &Person) -> Result<Vec<u8>, LineageError> {
    postcard::to_allocvec(person).map_err(|e| LineageError::SerializationError(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Person, LineageError> {
    postcard::from_bytes(bytes).map_err(|e| LineageError::DeserializationError(e.to_string()))
}

/// A disk-backed person store using redb.
pub struct RedbRegistry {
    /// The redb database handle.
    db: Database,
    /// Next available id, mirrored from the metadata table.
    next_id: i64,
}

impl std::fmt::Debug for RedbRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRegistry")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl RedbRegistry {
    /// Open or create a person database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LineageError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(PERSONS).map_err(io_error)?;
            let _ = write_txn.open_table(METADATA).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        let next_id = {
            let read_txn = db.begin_read().map_err(io_error)?;
            let table = read_txn.open_table(METADATA).map_err(io_error)?;
            table
                .get(NEXT_ID_KEY)
                .map_err(io_error)?
                .map(|v| v.value())
                .unwrap_or(FIRST_PERSON_ID)
        };

        Ok(Self { db, next_id })
    }

    /// Get the id the next insert will receive.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Capture every record and the id counter for export.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, LineageError> {
        Ok(RegistrySnapshot {
            next_id: self.next_id,
            persons: self.list_all()?,
        })
    }

    /// Replace the database contents with a snapshot in one transaction.
    ///
    /// Ids are preserved. The counter ends at the larger of the snapshot's
    /// counter and `max(id) + 1`. A snapshot whose counter or ids leave no
    /// successor is refused before anything is written.
    pub fn load_snapshot(&mut self, snapshot: &RegistrySnapshot) -> Result<(), LineageError> {
        id_after(snapshot.next_id)?;
        let mut next_id = snapshot.next_id.max(FIRST_PERSON_ID);
        for person in &snapshot.persons {
            next_id = next_id.max(id_after(person.id.0)?);
        }

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut persons = write_txn.open_table(PERSONS).map_err(io_error)?;
            persons.retain(|_, _| false).map_err(io_error)?;
            for person in &snapshot.persons {
                let bytes = encode(person)?;
                persons
                    .insert(person.id.0, bytes.as_slice())
                    .map_err(io_error)?;
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;
            meta.insert(NEXT_ID_KEY, next_id).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;

        self.next_id = next_id;
        Ok(())
    }
}

// =============================================================================
// PERSONSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl PersonStore for RedbRegistry {
    fn get_by_id(&self, id: PersonId) -> Result<Option<Person>, LineageError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let persons = read_txn.open_table(PERSONS).map_err(io_error)?;

        match persons.get(id.0).map_err(io_error)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn find_where(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> Result<Vec<Person>, LineageError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let persons = read_txn.open_table(PERSONS).map_err(io_error)?;

        let mut matches = Vec::new();
        for entry in persons.iter().map_err(io_error)? {
            let (_, value) = entry.map_err(io_error)?;
            let person = decode(value.value())?;
            if predicate(&person) {
                matches.push(person);
            }
        }
        Ok(matches)
    }

    fn insert(&mut self, draft: PersonDraft) -> Result<Person, LineageError> {
        draft.validate()?;

        let id = PersonId(self.next_id);
        let next_id = id_after(self.next_id)?;

        let write_txn = self.db.begin_write().map_err(io_error)?;
        let person = {
            let mut persons = write_txn.open_table(PERSONS).map_err(io_error)?;

            // Parents are checked inside the same write transaction.
            for (role, parent) in [("father_id", draft.father_id), ("mother_id", draft.mother_id)]
            {
                if let Some(parent) = parent
                    && persons.get(parent.0).map_err(io_error)?.is_none()
                {
                    return Err(LineageError::InvalidInput(format!(
                        "{} {} does not reference an existing person",
                        role, parent
                    )));
                }
            }

            let person = Person::from_draft(id, draft);
            let bytes = encode(&person)?;
            persons.insert(id.0, bytes.as_slice()).map_err(io_error)?;

            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;
            meta.insert(NEXT_ID_KEY, next_id).map_err(io_error)?;
            person
        };
        write_txn.commit().map_err(io_error)?;

        // Update in-memory counter only after successful commit.
        self.next_id = next_id;
        Ok(person)
    }

    fn delete_by_id(&mut self, id: PersonId) -> Result<Person, LineageError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        let removed = {
            let mut persons = write_txn.open_table(PERSONS).map_err(io_error)?;
            let removed = persons.remove(id.0).map_err(io_error)?;
            match removed {
                Some(data) => decode(data.value())?,
                None => return Err(LineageError::NotFound(id)),
            }
        };
        write_txn.commit().map_err(io_error)?;
        Ok(removed)
    }

    fn list_all(&self) -> Result<Vec<Person>, LineageError> {
        self.find_where(&|_: &Person| true)
    }

    fn len(&self) -> Result<usize, LineageError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let persons = read_txn.open_table(PERSONS).map_err(io_error)?;
        let count = persons.len().map_err(io_error)?;
        Ok(count as usize)
    }

    fn contains(&self, id: PersonId) -> Result<bool, LineageError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let persons = read_txn.open_table(PERSONS).map_err(io_error)?;
        Ok(persons.get(id.0).map_err(io_error)?.is_some())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FamilyGraph, Gender};
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");

        let a = store.insert(PersonDraft::new("Ada")).expect("insert");
        let b = store.insert(PersonDraft::new("Ben")).expect("insert");

        assert_eq!(a.id, PersonId(1));
        assert_eq!(b.id, PersonId(2));
        assert_eq!(store.len().expect("len"), 2);
        assert_eq!(store.get_by_id(a.id).expect("get"), Some(a));
    }

    #[test]
    fn persistence_across_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbRegistry::open(&db_path).expect("open db");
            let dad = store
                .insert(PersonDraft::new("Dad").with_gender(Gender::Male))
                .expect("insert");
            store
                .insert(PersonDraft::new("Kid").with_father(dad.id))
                .expect("insert");
        }

        {
            let mut store = RedbRegistry::open(&db_path).expect("open db");
            assert_eq!(store.len().expect("len"), 2);
            assert_eq!(store.next_id(), 3);
            let next = store.insert(PersonDraft::new("Next")).expect("insert");
            assert_eq!(next.id, PersonId(3));
        }
    }

    #[test]
    fn unknown_parent_rejected_without_consuming_id() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");

        let result = store.insert(PersonDraft::new("Orphan").with_mother(PersonId(9)));
        assert!(matches!(result, Err(LineageError::InvalidInput(_))));
        assert_eq!(store.next_id(), 1);
        assert!(store.is_empty().expect("empty"));
    }

    #[test]
    fn delete_keeps_dangling_children() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");

        let dad = store.insert(PersonDraft::new("Dad")).expect("insert");
        let kid = store
            .insert(PersonDraft::new("Kid").with_father(dad.id))
            .expect("insert");

        let removed = store.delete_by_id(dad.id).expect("delete");
        assert_eq!(removed.id, dad.id);
        assert!(matches!(
            store.delete_by_id(dad.id),
            Err(LineageError::NotFound(_))
        ));

        let graph = FamilyGraph::new(&store);
        let family = graph.immediate_family(kid.id).expect("family");
        assert_eq!(family.len(), 1);
        assert_eq!(graph.generation_depth(kid.id).expect("depth"), 1);
    }

    #[test]
    fn snapshot_load_replaces_contents() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");
        store.insert(PersonDraft::new("Old")).expect("insert");

        let snapshot = RegistrySnapshot {
            next_id: 10,
            persons: vec![Person::from_draft(PersonId(4), PersonDraft::new("Restored"))],
        };
        store.load_snapshot(&snapshot).expect("load");

        assert_eq!(store.len().expect("len"), 1);
        assert!(store.contains(PersonId(4)).expect("contains"));
        assert!(!store.contains(PersonId(1)).expect("contains"));
        assert_eq!(store.next_id(), 10);
    }

    #[test]
    fn insert_at_last_id_fails_without_overwriting() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");
        store
            .load_snapshot(&RegistrySnapshot {
                next_id: i64::MAX - 1,
                persons: Vec::new(),
            })
            .expect("load");

        let a = store.insert(PersonDraft::new("A")).expect("insert");
        assert_eq!(a.id, PersonId(i64::MAX - 1));

        let b = store.insert(PersonDraft::new("B"));
        assert!(matches!(b, Err(LineageError::IdSpaceExhausted(_))));
        assert_eq!(store.len().expect("len"), 1);
        let stored = store.get_by_id(a.id).expect("get").expect("a");
        assert_eq!(stored.full_name, "A");
    }

    #[test]
    fn snapshot_without_id_successor_is_refused() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbRegistry::open(temp.path().join("test.redb")).expect("open db");
        store.insert(PersonDraft::new("Kept")).expect("insert");

        let exhausted_counter = RegistrySnapshot {
            next_id: i64::MAX,
            persons: Vec::new(),
        };
        let exhausted_id = RegistrySnapshot {
            next_id: 1,
            persons: vec![Person::from_draft(PersonId(i64::MAX), PersonDraft::new("Last"))],
        };

        assert!(store.load_snapshot(&exhausted_counter).is_err());
        assert!(store.load_snapshot(&exhausted_id).is_err());
        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(store.next_id(), 2);
    }
}
