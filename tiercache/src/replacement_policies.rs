use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::cache::CacheSet;
use crate::config::ReplacementPolicyConfig;

/// A generic trait for implementing replacement policies. Can be used to parameterise a Cache.
///
/// The cache fills invalid lines itself, lowest index first, so a policy is only consulted once
/// every line of the set is valid
pub trait ReplacementPolicy {
    /// The configuration value this policy was built from, used for logging and reporting
    fn kind(&self) -> ReplacementPolicyConfig;

    /// Picks the line of a full set which will be overwritten
    ///
    /// # Arguments
    ///
    /// * `set`: The set being filled. Every block in it is valid
    ///
    /// returns: usize, an index in `0..set.len()`
    fn choose_victim(&mut self, set: &CacheSet) -> usize;
}

/// Least Recently Used replacement policy
///
/// The recency of each block is the cache clock value of its last hit or fill, so the victim is
/// the block with the smallest recency. Ties go to the lowest index
#[derive(Debug, Default)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn kind(&self) -> ReplacementPolicyConfig {
        ReplacementPolicyConfig::LeastRecentlyUsed
    }

    fn choose_victim(&mut self, set: &CacheSet) -> usize {
        let blocks = set.blocks();
        let mut min_value = u64::MAX;
        let mut min_index = 0;
        // Strict comparison keeps the first of equal recencies
        for (index, block) in blocks.iter().enumerate() {
            if block.recency() < min_value {
                min_value = block.recency();
                min_index = index;
            }
        }
        min_index
    }
}

/// First In First Out, as the simulator has always modelled it: the victim of a full set is
/// slot 0, no matter when the lines were inserted
///
/// This isn't a real insertion order queue. Once a set is full the other slots are never replaced
/// again, only slot 0 keeps turning over. Changing that would change every FIFO result reported
/// so far, so it stays
#[derive(Debug, Default)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    fn kind(&self) -> ReplacementPolicyConfig {
        ReplacementPolicyConfig::FirstInFirstOut
    }

    fn choose_victim(&mut self, _set: &CacheSet) -> usize {
        0
    }
}

/// Picks a uniformly random line of the set
///
/// The generator is injected so runs can be reproduced from a seed
#[derive(Debug)]
pub struct RandomReplacement<R: Rng = StdRng> {
    rng: R,
}

impl RandomReplacement<StdRng> {
    /// Creates a random policy seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Creates a random policy with a fixed seed, every run with the same seed and trace picks the
    /// same victims
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomReplacement<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ReplacementPolicy for RandomReplacement<R> {
    fn kind(&self) -> ReplacementPolicyConfig {
        ReplacementPolicyConfig::Random
    }

    fn choose_victim(&mut self, set: &CacheSet) -> usize {
        self.rng.gen_range(0..set.len())
    }
}
