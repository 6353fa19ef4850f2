use std::ops::Bound;

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tricrunch_config::EvaluationMode;
use tricrunch_core::{PersonId, QueryId, QuerySpec, ResultRow};

use crate::index::CandidateIndex;
use crate::ranker::rank;
use crate::score::ScorePool;

/// A p1 candidate linked to a scored p2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub p1: PersonId,
    pub p2: PersonId,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub p1: PersonId,
    pub p2: PersonId,
    pub p3: PersonId,
    pub score: u32,
}

impl Triangle {
    pub fn into_row(self, query_id: QueryId) -> ResultRow {
        ResultRow {
            query_id,
            score: self.score,
            p1: self.p1,
            p2: self.p2,
            p3: self.p3,
        }
    }
}

/// Evaluates one query against a shared [`CandidateIndex`].
pub struct QueryEvaluator<'a> {
    index: &'a CandidateIndex,
    spec: &'a QuerySpec,
    pool: ScorePool,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(index: &'a CandidateIndex, spec: &'a QuerySpec) -> Self {
        let pool = ScorePool::for_query(index, spec);
        Self { index, spec, pool }
    }

    /// Holders of the anchor tag whose birthday falls inside the window,
    /// ascending.
    pub fn p1_candidates(&self) -> impl Iterator<Item = PersonId> + '_ {
        let window = self.spec.window;
        self.index
            .holders(self.spec.anchor_tag)
            .iter()
            .copied()
            .filter(move |&person| {
                self.index
                    .birthday_key(person)
                    .is_some_and(|key| window.contains(key))
            })
    }

    pub fn pairs(&self) -> impl Iterator<Item = CandidatePair> + '_ {
        self.p1_candidates().flat_map(move |p1| self.pairs_from(p1))
    }

    pub fn pairs_from(&self, p1: PersonId) -> impl Iterator<Item = CandidatePair> + '_ {
        self.index
            .same_city_acquaintances(p1)
            .iter()
            .filter_map(move |&p2| {
                let score = self.pool.score(p2)?;
                Some(CandidatePair { p1, p2, score })
            })
    }

    /// Every closed triangle for this query, unsorted.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.p1_candidates().flat_map(move |p1| self.triangles_from(p1))
    }

    /// Triangles rooted at `p1`. Only `p3 > p2` is visited so each unordered
    /// `{p2, p3}` pair is produced once per root.
    pub fn triangles_from(&self, p1: PersonId) -> impl Iterator<Item = Triangle> + '_ {
        self.pairs_from(p1).flat_map(move |pair| {
            self.index
                .same_city_acquaintances(pair.p2)
                .range((Bound::Excluded(pair.p2), Bound::Unbounded))
                .filter_map(move |&p3| {
                    let p3_score = self.pool.score(p3)?;
                    self.index
                        .are_same_city_acquaintances(pair.p1, p3)
                        .then_some(Triangle {
                            p1: pair.p1,
                            p2: pair.p2,
                            p3,
                            score: pair.score + p3_score,
                        })
                })
        })
    }

    /// Ranked result rows. Parallel mode splits the p1 candidates across the
    /// current rayon pool; the ranked output is the same in both modes.
    pub fn evaluate(&self, mode: EvaluationMode) -> Vec<ResultRow> {
        let query_id = self.spec.id;
        let mut rows: Vec<ResultRow> = match mode {
            EvaluationMode::Sequential => self
                .triangles()
                .map(|triangle| triangle.into_row(query_id))
                .collect(),
            EvaluationMode::Parallel => {
                let candidates: Vec<PersonId> = self.p1_candidates().collect();
                candidates
                    .par_iter()
                    .flat_map_iter(|&p1| self.triangles_from(p1))
                    .map(|triangle| triangle.into_row(query_id))
                    .collect()
            }
        };
        rank(&mut rows);
        rows
    }
}
