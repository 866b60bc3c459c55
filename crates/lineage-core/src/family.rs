//! # Family Graph
//!
//! Relationship queries over the child→parent graph formed by
//! `father_id`/`mother_id`.
//!
//! The graph is not assumed to be consistent:
//! - a parent id may dangle (the parent was deleted), which ends that branch
//! - corrupted data may contain a cycle, so every walk tracks visited ids
//!   and is bounded by the store's record count
//!
//! `FamilyGraph` borrows a store handle and keeps no state of its own.

use crate::registry::PersonStore;
use crate::{Gender, GenderCounts, LineageError, Person, PersonId};
use std::collections::{BTreeMap, BTreeSet};

/// Read-only relationship queries against a borrowed store.
#[derive(Debug)]
pub struct FamilyGraph<'a, S: PersonStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PersonStore + ?Sized> FamilyGraph<'a, S> {
    /// Create a query view over `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve a reference, treating a dangling id as absent.
    fn resolve(&self, id: Option<PersonId>) -> Result<Option<Person>, LineageError> {
        match id {
            Some(id) => self.store.get_by_id(id),
            None => Ok(None),
        }
    }

    /// Self, resolvable parents, and children, without duplicates.
    ///
    /// An unknown `person_id` yields an empty list. Siblings are not
    /// included. Ordered by ascending id.
    pub fn immediate_family(&self, person_id: PersonId) -> Result<Vec<Person>, LineageError> {
        let Some(person) = self.store.get_by_id(person_id)? else {
            return Ok(Vec::new());
        };

        let mut members = BTreeMap::new();
        for parent in [person.father_id, person.mother_id] {
            if let Some(parent) = self.resolve(parent)? {
                members.insert(parent.id, parent);
            }
        }
        for child in self.store.children_of(person_id)? {
            members.insert(child.id, child);
        }
        members.insert(person.id, person);

        Ok(members.into_values().collect())
    }

    /// Number of immediate-family members whose label equals `gender`
    /// exactly. Unlabeled members never match.
    pub fn count_by_gender(
        &self,
        person_id: PersonId,
        gender: &Gender,
    ) -> Result<usize, LineageError> {
        Ok(self
            .immediate_family(person_id)?
            .iter()
            .filter(|member| member.gender.as_ref() == Some(gender))
            .count())
    }

    /// Gender counts over the immediate family in a single traversal.
    pub fn gender_breakdown(&self, person_id: PersonId) -> Result<GenderCounts, LineageError> {
        let mut counts = GenderCounts::default();
        for member in self.immediate_family(person_id)? {
            counts.record(member.gender.as_ref());
        }
        Ok(counts)
    }

    /// Number of generations along the paternal line, counting the anchor.
    ///
    /// Follows `father_id` until it is unset, dangles, or revisits a person.
    /// Returns `1 + hops`, never more than the store's record count.
    ///
    /// # Errors
    ///
    /// `LineageError::NotFound` if `person_id` itself does not exist.
    pub fn generation_depth(&self, person_id: PersonId) -> Result<usize, LineageError> {
        let anchor = self
            .store
            .get_by_id(person_id)?
            .ok_or(LineageError::NotFound(person_id))?;

        let limit = self.store.len()?;
        let mut visited = BTreeSet::from([anchor.id]);
        let mut current = anchor;

        while visited.len() < limit {
            let Some(father_id) = current.father_id else {
                break;
            };
            if visited.contains(&father_id) {
                tracing::warn!(
                    person = person_id.0,
                    revisited = father_id.0,
                    "Paternal line contains a cycle; stopping"
                );
                break;
            }
            let Some(father) = self.store.get_by_id(father_id)? else {
                tracing::debug!(
                    person = current.id.0,
                    father = father_id.0,
                    "Dangling father reference ends paternal line"
                );
                break;
            };
            visited.insert(father.id);
            current = father;
        }

        Ok(visited.len())
    }

    /// Number of records that are `person_id` or name it as a parent.
    ///
    /// This counts self plus children only. Parents are not included, and a
    /// deleted person's dangling children still count.
    pub fn family_size(&self, person_id: PersonId) -> Result<usize, LineageError> {
        Ok(self
            .store
            .find_where(&|p: &Person| p.id == person_id || p.is_child_of(person_id))?
            .len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
