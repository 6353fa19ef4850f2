use std::collections::HashMap;

use tricrunch_core::{PersonId, QuerySpec, TagId};

use crate::index::CandidateIndex;

/// Minimum number of scoring tags a person must hold to take the p2/p3 role.
pub const MIN_POOL_SCORE: u32 = 2;

/// Per-query scores for the p2/p3 role. Rebuilt for every query because the
/// scoring tags change; never shared between queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScorePool {
    scores: HashMap<PersonId, u32>,
}

impl ScorePool {
    pub fn build(index: &CandidateIndex, anchor_tag: TagId, score_tags: &[TagId]) -> Self {
        let mut tags = score_tags.to_vec();
        tags.sort_unstable();
        tags.dedup();

        let mut scores: HashMap<PersonId, u32> = HashMap::new();
        for tag in tags {
            for &person in index.holders(tag) {
                *scores.entry(person).or_default() += 1;
            }
        }

        let anchors = index.holders(anchor_tag);
        scores.retain(|person, score| *score >= MIN_POOL_SCORE && !anchors.contains(person));

        Self { scores }
    }

    pub fn for_query(index: &CandidateIndex, spec: &QuerySpec) -> Self {
        Self::build(index, spec.anchor_tag, &spec.score_tags)
    }

    /// Score of a pool member; `None` for everyone outside the pool.
    pub fn score(&self, person: PersonId) -> Option<u32> {
        self.scores.get(&person).copied()
    }

    pub fn contains(&self, person: PersonId) -> bool {
        self.scores.contains_key(&person)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
