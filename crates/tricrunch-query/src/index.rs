use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tricrunch_core::{MonthDayKey, PersonId, TagId};
use tricrunch_store::GraphStore;

static NO_PEOPLE: BTreeSet<PersonId> = BTreeSet::new();

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("person {0} has no city")]
    MissingCity(PersonId),
    #[error("person {0} has no birthday")]
    MissingBirthday(PersonId),
}

/// Query-independent lookups derived from a [`GraphStore`]. Built once per
/// dataset and shared read-only by every query in a batch.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    by_tag: HashMap<TagId, BTreeSet<PersonId>>,
    same_city: HashMap<PersonId, BTreeSet<PersonId>>,
    birthday_keys: HashMap<PersonId, MonthDayKey>,
}

impl CandidateIndex {
    pub fn build(store: &GraphStore) -> Result<Self, IndexError> {
        let mut cities = HashMap::with_capacity(store.len());
        let mut birthday_keys = HashMap::with_capacity(store.len());
        for person in store.persons() {
            let city = person.city.ok_or(IndexError::MissingCity(person.id))?;
            let key = person
                .birthday_key()
                .ok_or(IndexError::MissingBirthday(person.id))?;
            cities.insert(person.id, city);
            birthday_keys.insert(person.id, key);
        }

        let mut by_tag: HashMap<TagId, BTreeSet<PersonId>> = HashMap::new();
        for person in store.persons() {
            for &tag in store.interests(person.id) {
                by_tag.entry(tag).or_default().insert(person.id);
            }
        }

        // Knows rows are directional; adjacency is inserted both ways so the
        // index stays symmetric.
        let mut same_city: HashMap<PersonId, BTreeSet<PersonId>> = HashMap::new();
        for row in store.knows_rows() {
            let (Some(a), Some(b)) = (cities.get(&row.person), cities.get(&row.friend)) else {
                continue;
            };
            if a != b {
                continue;
            }
            same_city.entry(row.person).or_default().insert(row.friend);
            same_city.entry(row.friend).or_default().insert(row.person);
        }

        let index = Self {
            by_tag,
            same_city,
            birthday_keys,
        };
        tracing::debug!(
            tags = index.by_tag.len(),
            people_with_links = index.same_city.len(),
            links = index.same_city_link_count(),
            "built candidate index"
        );
        Ok(index)
    }

    /// People holding `tag`, ascending.
    pub fn holders(&self, tag: TagId) -> &BTreeSet<PersonId> {
        self.by_tag.get(&tag).unwrap_or(&NO_PEOPLE)
    }

    pub fn holds(&self, person: PersonId, tag: TagId) -> bool {
        self.holders(tag).contains(&person)
    }

    pub fn same_city_acquaintances(&self, person: PersonId) -> &BTreeSet<PersonId> {
        self.same_city.get(&person).unwrap_or(&NO_PEOPLE)
    }

    pub fn are_same_city_acquaintances(&self, a: PersonId, b: PersonId) -> bool {
        self.same_city_acquaintances(a).contains(&b)
    }

    pub fn birthday_key(&self, person: PersonId) -> Option<MonthDayKey> {
        self.birthday_keys.get(&person).copied()
    }

    /// Directed adjacency entries: every unordered pair counts twice, a
    /// self-loop once.
    pub fn same_city_link_count(&self) -> usize {
        self.same_city.values().map(BTreeSet::len).sum()
    }

    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn person_count(&self) -> usize {
        self.birthday_keys.len()
    }
}
