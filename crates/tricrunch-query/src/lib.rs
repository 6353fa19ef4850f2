mod evaluator;
mod index;
mod ranker;
mod score;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tricrunch_config::EvaluationMode;
use tricrunch_core::{QuerySpec, ResultRow};

pub use evaluator::{CandidatePair, QueryEvaluator, Triangle};
pub use index::{CandidateIndex, IndexError};
pub use ranker::{compare_rows, is_ranked, rank};
pub use score::{MIN_POOL_SCORE, ScorePool};

/// Runs [`QueryEvaluator`] in a fixed mode, optionally inside a dedicated
/// rayon pool sized by the caller.
pub struct Executor {
    mode: EvaluationMode,
    pool: Option<ThreadPool>,
}

impl Executor {
    /// `threads == 0` keeps rayon's global pool. Sequential executors never
    /// build a pool.
    pub fn new(mode: EvaluationMode, threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = match mode {
            EvaluationMode::Parallel if threads > 0 => {
                Some(ThreadPoolBuilder::new().num_threads(threads).build()?)
            }
            _ => None,
        };
        Ok(Self { mode, pool })
    }

    /// Runs on rayon's global pool; never fails.
    pub fn global(mode: EvaluationMode) -> Self {
        Self { mode, pool: None }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn evaluate(&self, index: &CandidateIndex, spec: &QuerySpec) -> Vec<ResultRow> {
        let evaluator = QueryEvaluator::new(index, spec);
        match &self.pool {
            Some(pool) => pool.install(|| evaluator.evaluate(self.mode)),
            None => evaluator.evaluate(self.mode),
        }
    }
}
