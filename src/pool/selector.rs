//! Backend selection for new sessions

use rand::seq::SliceRandom;

/// Picks one backend out of the pool for a new session
pub trait BackendSelector: Send + Sync {
    /// Returns `None` only for an empty pool
    fn select<'a>(&self, pool: &'a [String]) -> Option<&'a str>;
}

/// Uniform random choice: no weighting, no health awareness
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl BackendSelector for RandomSelector {
    fn select<'a>(&self, pool: &'a [String]) -> Option<&'a str> {
        pool.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}
