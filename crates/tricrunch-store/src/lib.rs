use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use thiserror::Error;
use tricrunch_core::{Interest, Knows, Person, PersonId, TagId};

mod loader;

pub use loader::load_dataset;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("no {kind} files matching '{prefix}*.csv' in {dir}")]
    MissingFiles {
        kind: &'static str,
        prefix: String,
        dir: PathBuf,
    },
    #[error("{path}: only gzip-compressed record files are supported")]
    Compressed { path: PathBuf },
    #[error("{path}: header has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("duplicate person id {0}")]
    DuplicatePerson(PersonId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub persons: usize,
    pub interest_rows: usize,
    pub dropped_interest_rows: usize,
    pub knows_rows: usize,
    pub dropped_knows_rows: usize,
    pub self_loops: usize,
}

/// Read-only people/interest/knows graph. `GraphStore::new` is the only way
/// to populate it.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    persons: BTreeMap<PersonId, Person>,
    interests: HashMap<PersonId, Vec<TagId>>,
    acquaintances: HashMap<PersonId, Vec<PersonId>>,
    knows: Vec<Knows>,
    stats: StoreStats,
}

impl GraphStore {
    /// Interest rows naming an unknown person and knows rows with an
    /// unresolved endpoint are dropped, matching join semantics. A repeated
    /// person id is fatal.
    pub fn new(
        persons: impl IntoIterator<Item = Person>,
        interests: impl IntoIterator<Item = Interest>,
        knows: impl IntoIterator<Item = Knows>,
    ) -> Result<Self, StoreError> {
        let mut by_id = BTreeMap::new();
        for person in persons {
            if by_id.insert(person.id, person).is_some() {
                return Err(StoreError::DuplicatePerson(person.id));
            }
        }

        let mut stats = StoreStats {
            persons: by_id.len(),
            ..StoreStats::default()
        };

        let mut interests_by_person: HashMap<PersonId, Vec<TagId>> = HashMap::new();
        for interest in interests {
            if !by_id.contains_key(&interest.person) {
                stats.dropped_interest_rows += 1;
                continue;
            }
            stats.interest_rows += 1;
            interests_by_person
                .entry(interest.person)
                .or_default()
                .push(interest.tag);
        }
        for tags in interests_by_person.values_mut() {
            tags.sort_unstable();
            tags.dedup();
        }

        let mut resolved = Vec::new();
        let mut acquaintances: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        for row in knows {
            if !by_id.contains_key(&row.person) || !by_id.contains_key(&row.friend) {
                stats.dropped_knows_rows += 1;
                continue;
            }
            if row.is_self_loop() {
                stats.self_loops += 1;
            }
            acquaintances.entry(row.person).or_default().push(row.friend);
            resolved.push(row);
        }
        stats.knows_rows = resolved.len();

        if stats.dropped_interest_rows > 0 || stats.dropped_knows_rows > 0 {
            tracing::debug!(
                dropped_interest_rows = stats.dropped_interest_rows,
                dropped_knows_rows = stats.dropped_knows_rows,
                "dropped rows referencing unknown persons"
            );
        }

        Ok(Self {
            persons: by_id,
            interests: interests_by_person,
            acquaintances,
            knows: resolved,
            stats,
        })
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    /// All persons in ascending id order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> + '_ {
        self.persons.values()
    }

    /// Distinct tags held by `id`, ascending.
    pub fn interests(&self, id: PersonId) -> &[TagId] {
        self.interests.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Friends recorded with `id` in the `person` column, in input order.
    pub fn acquaintances(&self, id: PersonId) -> &[PersonId] {
        self.acquaintances
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn knows_rows(&self) -> &[Knows] {
        &self.knows
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn person(id: PersonId, city: u64) -> Person {
        Person {
            id,
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1),
            city: Some(city),
        }
    }

    fn interest(person: PersonId, tag: TagId) -> Interest {
        Interest { person, tag }
    }

    fn knows(person: PersonId, friend: PersonId) -> Knows {
        Knows { person, friend }
    }

    #[test]
    fn store_exposes_records_through_accessors() {
        let store = GraphStore::new(
            [person(2, 1), person(1, 1)],
            [interest(1, 30), interest(1, 10), interest(1, 30)],
            [knows(1, 2)],
        )
        .expect("build store");

        assert_eq!(store.len(), 2);
        assert_eq!(store.person(1).map(|p| p.city), Some(Some(1)));
        assert!(store.person(3).is_none());

        let ids: Vec<_> = store.persons().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(store.interests(1), &[10, 30]);
        assert!(store.interests(2).is_empty());

        assert_eq!(store.acquaintances(1), &[2]);
        assert!(store.acquaintances(2).is_empty());
    }

    #[test]
    fn duplicate_person_id_is_fatal() {
        let err = GraphStore::new([person(1, 1), person(1, 2)], [], [])
            .expect_err("duplicate id must fail");
        assert!(matches!(err, StoreError::DuplicatePerson(1)));
        assert_eq!(err.to_string(), "duplicate person id 1");
    }

    #[test]
    fn rows_referencing_unknown_persons_are_dropped() {
        let store = GraphStore::new(
            [person(1, 1), person(2, 1)],
            [interest(1, 10), interest(9, 10)],
            [knows(1, 2), knows(1, 9), knows(9, 2)],
        )
        .expect("build store");

        let stats = store.stats();
        assert_eq!(stats.interest_rows, 1);
        assert_eq!(stats.dropped_interest_rows, 1);
        assert_eq!(stats.knows_rows, 1);
        assert_eq!(stats.dropped_knows_rows, 2);
        assert_eq!(store.knows_rows(), &[knows(1, 2)]);
        assert!(store.interests(9).is_empty());
    }

    #[test]
    fn self_loops_are_kept() {
        let store = GraphStore::new([person(1, 1)], [], [knows(1, 1)]).expect("build store");

        assert_eq!(store.stats().self_loops, 1);
        assert_eq!(store.acquaintances(1), &[1]);
        assert_eq!(store.knows_rows().len(), 1);
    }
}
