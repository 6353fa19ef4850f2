use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use tricrunch_config::EvaluationMode;
use tricrunch_core::{
    BirthdayWindow, Interest, Knows, Person, PersonId, QuerySpec, ResultRow, TagId,
};
use tricrunch_query::{CandidateIndex, QueryEvaluator, is_ranked};
use tricrunch_store::GraphStore;

const MAX_PEOPLE: u64 = 12;
const MAX_TAG: TagId = 5;
const MAX_CITY: u64 = 2;

#[derive(Debug, Clone)]
struct Dataset {
    persons: Vec<Person>,
    interests: Vec<Interest>,
    knows: Vec<Knows>,
}

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    (2u64..=MAX_PEOPLE).prop_flat_map(|count| {
        (
            prop::collection::vec((0u64..MAX_CITY, 1u32..=12, 1u32..=28), count as usize),
            prop::collection::vec((1..=count, 1..=MAX_TAG), 0..(count as usize * 4)),
            prop::collection::vec((1..=count, 1..=count), 0..(count as usize * 4)),
        )
            .prop_map(|(people, interests, knows)| Dataset {
                persons: people
                    .into_iter()
                    .enumerate()
                    .map(|(offset, (city, month, day))| Person {
                        id: offset as u64 + 1,
                        birthday: NaiveDate::from_ymd_opt(1990, month, day),
                        city: Some(city),
                    })
                    .collect(),
                interests: interests
                    .into_iter()
                    .map(|(person, tag)| Interest { person, tag })
                    .collect(),
                knows: knows
                    .into_iter()
                    .map(|(person, friend)| Knows { person, friend })
                    .collect(),
            })
    })
}

fn query_strategy() -> impl Strategy<Value = QuerySpec> {
    (
        1..=MAX_TAG,
        prop::array::uniform3(1..=MAX_TAG),
        101u16..=1231,
        101u16..=1231,
    )
        .prop_map(|(anchor_tag, score_tags, a, b)| QuerySpec {
            id: 1,
            anchor_tag,
            score_tags,
            window: BirthdayWindow::new(a.min(b), a.max(b)),
        })
}

/// Straightforward cubic enumeration over the raw records.
fn brute_force(data: &Dataset, spec: &QuerySpec) -> BTreeSet<ResultRow> {
    let holds = |person: PersonId, tag: TagId| {
        data.interests
            .iter()
            .any(|interest| interest.person == person && interest.tag == tag)
    };
    let same_city = |a: &Person, b: &Person| {
        a.city == b.city
            && data.knows.iter().any(|row| {
                (row.person == a.id && row.friend == b.id)
                    || (row.person == b.id && row.friend == a.id)
            })
    };
    let score = |person: PersonId| -> Option<u32> {
        if holds(person, spec.anchor_tag) {
            return None;
        }
        let score = spec
            .distinct_score_tags()
            .into_iter()
            .filter(|&tag| holds(person, tag))
            .count() as u32;
        (score >= 2).then_some(score)
    };

    let mut rows = BTreeSet::new();
    for p1 in &data.persons {
        let in_window = p1
            .birthday_key()
            .is_some_and(|key| spec.window.contains(key));
        if !holds(p1.id, spec.anchor_tag) || !in_window {
            continue;
        }
        for p2 in &data.persons {
            let Some(s2) = score(p2.id) else { continue };
            if !same_city(p1, p2) {
                continue;
            }
            for p3 in &data.persons {
                if p3.id <= p2.id {
                    continue;
                }
                let Some(s3) = score(p3.id) else { continue };
                if same_city(p2, p3) && same_city(p1, p3) {
                    rows.insert(ResultRow {
                        query_id: spec.id,
                        score: s2 + s3,
                        p1: p1.id,
                        p2: p2.id,
                        p3: p3.id,
                    });
                }
            }
        }
    }
    rows
}

fn build_index(data: &Dataset) -> CandidateIndex {
    let store = GraphStore::new(
        data.persons.clone(),
        data.interests.clone(),
        data.knows.clone(),
    )
    .expect("build store");
    CandidateIndex::build(&store).expect("build index")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn evaluator_matches_brute_force(data in dataset_strategy(), spec in query_strategy()) {
        let index = build_index(&data);
        let rows = QueryEvaluator::new(&index, &spec).evaluate(EvaluationMode::Sequential);

        let produced: BTreeSet<ResultRow> = rows.iter().copied().collect();
        prop_assert_eq!(produced.len(), rows.len());
        prop_assert_eq!(produced, brute_force(&data, &spec));
    }

    #[test]
    fn output_is_ranked_and_parallel_agrees(data in dataset_strategy(), spec in query_strategy()) {
        let index = build_index(&data);
        let evaluator = QueryEvaluator::new(&index, &spec);

        let sequential = evaluator.evaluate(EvaluationMode::Sequential);
        let parallel = evaluator.evaluate(EvaluationMode::Parallel);

        prop_assert!(is_ranked(&sequential));
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn adjacency_is_symmetric(data in dataset_strategy()) {
        let index = build_index(&data);

        for person in &data.persons {
            for &other in index.same_city_acquaintances(person.id) {
                prop_assert!(index.are_same_city_acquaintances(other, person.id));
            }
        }
    }
}
