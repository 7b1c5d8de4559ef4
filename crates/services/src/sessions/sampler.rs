use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use quiz_core::model::Question;

/// Draws the question list for one session from a course's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSampler {
    target_size: usize,
}

impl QuestionSampler {
    #[must_use]
    pub fn new(target_size: usize) -> Self {
        Self { target_size }
    }

    #[must_use]
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Sample using the thread-local RNG.
    #[must_use]
    pub fn sample(&self, pool: Vec<Question>) -> Vec<Question> {
        self.sample_with(pool, &mut rng())
    }

    /// Uniformly shuffle the pool and keep the first `min(target_size, pool.len())`.
    ///
    /// Repeated question ids are dropped first (first occurrence wins), so the
    /// result never contains the same question twice. An empty pool yields an
    /// empty list.
    pub fn sample_with<R: Rng + ?Sized>(&self, pool: Vec<Question>, rng: &mut R) -> Vec<Question> {
        let mut seen = HashSet::with_capacity(pool.len());
        let mut candidates: Vec<Question> =
            pool.into_iter().filter(|q| seen.insert(q.id())).collect();

        candidates.as_mut_slice().shuffle(rng);
        candidates.truncate(self.target_size);
        candidates
    }
}
