use std::time::{Duration, Instant};
use log::{debug, trace, warn};
use crate::address::{AddressLayout, ADDRESS_LIMIT, ADDRESS_WIDTH};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, RandomReplacement, ReplacementPolicy};

/// One storage line
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CacheBlock {
    tag: Option<u64>,
    valid: bool,
    recency: u64,
}

impl CacheBlock {
    pub fn tag(&self) -> Option<u64> {
        self.tag
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Clock value of the last hit or fill of this line
    pub fn recency(&self) -> u64 {
        self.recency
    }

    fn holds(&self, tag: u64) -> bool {
        self.valid && self.tag == Some(tag)
    }

    fn fill(&mut self, tag: u64, clock: u64) {
        self.tag = Some(tag);
        self.valid = true;
        self.recency = clock;
    }
}

/// The blocks sharing one index. The length is the associativity and never changes
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheSet {
    blocks: Vec<CacheBlock>,
}

impl CacheSet {
    fn new(associativity: usize) -> Self {
        Self {
            blocks: vec![CacheBlock::default(); associativity],
        }
    }

    pub fn blocks(&self) -> &[CacheBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Index of the valid block holding `tag`. Tags are unique among the valid blocks of a set
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.blocks.iter().position(|block| block.holds(tag))
    }

    /// Lowest index of an invalid block
    pub fn first_invalid(&self) -> Option<usize> {
        self.blocks.iter().position(|block| !block.valid)
    }
}

/// The result of a single probe of one cache
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AccessOutcome {
    pub hit: bool,
    /// `Some` only when a full set had to replace a line, `Some(true)` if that line was valid
    pub evicted_valid_line: Option<bool>,
    pub index: usize,
    pub tag: u64,
    /// Wall-clock time of the probe, including the fill on a miss
    pub elapsed: Duration,
}

impl AccessOutcome {
    pub fn miss(&self) -> bool {
        !self.hit
    }

    /// True if the probe overwrote a previously valid line
    pub fn evicted(&self) -> bool {
        self.evicted_valid_line == Some(true)
    }
}

/// Running totals for one cache instance
///
/// Unlike the aggregate counters of a simulation, these count evictions on every level
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LevelStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A generic trait for caches
///
/// Implemented by the generic cache for every replacement policy, and by `GenericCache` which
/// dispatches to whichever policy the configuration picked
pub trait CacheTrait {
    /// Converts an address into a set index and a tag
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64);

    /// Probes the cache for an address, filling a line on a miss
    ///
    /// The clock advances once per call, hit or miss, before the set is searched. Hits refresh
    /// the recency of the line. Misses fill the lowest invalid line of the set, or the line the
    /// replacement policy picks if the set is full
    ///
    /// # Arguments
    ///
    /// * `address`: The address being read. Must be below `2^ADDRESS_WIDTH`, traces are
    /// validated before they get here
    ///
    /// returns: AccessOutcome
    fn access(&mut self, address: u64) -> AccessOutcome;

    fn name(&self) -> &'static str;

    fn num_sets(&self) -> u64;

    fn associativity(&self) -> u64;

    /// The number of probes made so far
    fn clock(&self) -> u64;

    fn stats(&self) -> LevelStats;

    fn policy(&self) -> ReplacementPolicyConfig;

    fn set(&self, index: usize) -> Option<&CacheSet>;

    /// Gets the number of lines never filled. Useful for analysing cache performance or debugging
    fn invalid_line_count(&self) -> usize;
}

/// A set associative cache, parameterised by a replacement policy
pub struct Cache<P: ReplacementPolicy> {
    name: &'static str,
    capacity: u64,
    block_size: u64,
    associativity: u64,
    num_sets: u64,
    layout: AddressLayout,
    sets: Vec<CacheSet>,
    policy: P,
    clock: u64,
    stats: LevelStats,
}

impl<P: ReplacementPolicy> Cache<P> {
    /// Creates an empty cache, every line invalid and the clock at zero
    ///
    /// # Arguments
    ///
    /// * `name`: Used in logs and reports, e.g. "L1"
    /// * `capacity`: Total size in bytes
    /// * `block_size`: Line size in bytes
    /// * `associativity`: Lines per set
    /// * `policy`: Replacement policy for full sets
    ///
    /// returns: Result<Cache<P>, ConfigError>
    pub fn new(name: &'static str, capacity: u64, block_size: u64, associativity: u64, policy: P) -> Result<Self, ConfigError> {
        for (field, value) in [("capacity", capacity), ("block size", block_size), ("associativity", associativity)] {
            if value == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }
        // Bounds the line count, so the sets below are always allocatable
        if capacity > ADDRESS_LIMIT {
            return Err(ConfigError::LargerThanAddressSpace {
                capacity,
                address_space: ADDRESS_LIMIT,
            });
        }
        let set_bytes = block_size.checked_mul(associativity).ok_or(ConfigError::Indivisible {
            capacity,
            block_size,
            associativity,
        })?;
        if capacity % set_bytes != 0 {
            return Err(ConfigError::Indivisible {
                capacity,
                block_size,
                associativity,
            });
        }
        let num_sets = capacity / set_bytes;
        let layout = AddressLayout::new(block_size, num_sets)?;
        if !num_sets.is_power_of_two() {
            warn!("{name}: {num_sets} sets is not a power of two, indices wrap modulo the set count");
        }
        debug!(
            "{name}: {capacity}B, {block_size}B lines, {associativity}-way, {num_sets} sets, {} policy, tag/index/offset bits {}/{}/{} of {ADDRESS_WIDTH}",
            policy.kind(),
            layout.tag_bits(),
            layout.index_bits(),
            layout.offset_bits(),
        );
        Ok(Self {
            name,
            capacity,
            block_size,
            associativity,
            num_sets,
            layout,
            sets: (0..num_sets).map(|_| CacheSet::new(associativity as usize)).collect(),
            policy,
            clock: 0,
            stats: LevelStats::default(),
        })
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }
}

impl<P: ReplacementPolicy> CacheTrait for Cache<P> {
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64) {
        self.layout.split(address)
    }

    fn access(&mut self, address: u64) -> AccessOutcome {
        let start = Instant::now();
        let (index, tag) = self.layout.split(address);
        self.clock += 1;
        let clock = self.clock;
        let set = &mut self.sets[index];

        if let Some(way) = set.find(tag) {
            set.blocks[way].recency = clock;
            self.stats.hits += 1;
            trace!("{}: {address:#06x} hit, set {index} way {way} tag {tag:#x}", self.name);
            return AccessOutcome {
                hit: true,
                evicted_valid_line: None,
                index,
                tag,
                elapsed: start.elapsed(),
            };
        }

        let (way, evicted_valid_line) = match set.first_invalid() {
            Some(way) => (way, None),
            None => {
                let way = self.policy.choose_victim(set);
                (way, Some(set.blocks[way].valid))
            }
        };
        set.blocks[way].fill(tag, clock);
        self.stats.misses += 1;
        if evicted_valid_line == Some(true) {
            self.stats.evictions += 1;
        }
        trace!(
            "{}: {address:#06x} miss, set {index} way {way} tag {tag:#x}{}",
            self.name,
            if evicted_valid_line == Some(true) { ", evicted" } else { "" }
        );
        AccessOutcome {
            hit: false,
            evicted_valid_line,
            index,
            tag,
            elapsed: start.elapsed(),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn num_sets(&self) -> u64 {
        self.num_sets
    }

    fn associativity(&self) -> u64 {
        self.associativity
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn stats(&self) -> LevelStats {
        self.stats
    }

    fn policy(&self) -> ReplacementPolicyConfig {
        self.policy.kind()
    }

    fn set(&self, index: usize) -> Option<&CacheSet> {
        self.sets.get(index)
    }

    fn invalid_line_count(&self) -> usize {
        self.sets.iter().flat_map(|set| set.blocks.iter()).filter(|block| !block.valid).count()
    }
}

/// Enum for the three replacement policies provided by the library
///
/// Explicitly branching on the policies keeps the concrete types visible to the compiler, so the
/// policy calls can be inlined into the probe loop. It also lets a configuration pick the policy
/// at runtime
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
    Random(Cache<RandomReplacement>),
}

impl GenericCache {
    /// Creates a new cache from a cache configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let CacheConfig { name, size, block_size, associativity, .. } = *config;
        Ok(match config.replacement_policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                Cache::new(name, size, block_size, associativity, LeastRecentlyUsed)?.into()
            }
            ReplacementPolicyConfig::FirstInFirstOut => {
                Cache::new(name, size, block_size, associativity, FirstInFirstOut)?.into()
            }
            ReplacementPolicyConfig::Random => {
                let policy = match config.seed {
                    Some(seed) => RandomReplacement::seeded(seed),
                    None => RandomReplacement::from_entropy(),
                };
                Cache::new(name, size, block_size, associativity, policy)?.into()
            }
        })
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Cache<RandomReplacement>> for GenericCache {
    fn from(value: Cache<RandomReplacement>) -> Self {
        Self::Random(value)
    }
}

impl CacheTrait for GenericCache {
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64) {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.address_to_set_and_tag(address),
            GenericCache::FirstInFirstOut(c) => c.address_to_set_and_tag(address),
            GenericCache::Random(c) => c.address_to_set_and_tag(address),
        }
    }

    fn access(&mut self, address: u64) -> AccessOutcome {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.access(address),
            GenericCache::FirstInFirstOut(c) => c.access(address),
            GenericCache::Random(c) => c.access(address),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.name(),
            GenericCache::FirstInFirstOut(c) => c.name(),
            GenericCache::Random(c) => c.name(),
        }
    }

    fn num_sets(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.num_sets(),
            GenericCache::FirstInFirstOut(c) => c.num_sets(),
            GenericCache::Random(c) => c.num_sets(),
        }
    }

    fn associativity(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.associativity(),
            GenericCache::FirstInFirstOut(c) => c.associativity(),
            GenericCache::Random(c) => c.associativity(),
        }
    }

    fn clock(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.clock(),
            GenericCache::FirstInFirstOut(c) => c.clock(),
            GenericCache::Random(c) => c.clock(),
        }
    }

    fn stats(&self) -> LevelStats {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.stats(),
            GenericCache::FirstInFirstOut(c) => c.stats(),
            GenericCache::Random(c) => c.stats(),
        }
    }

    fn policy(&self) -> ReplacementPolicyConfig {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.policy(),
            GenericCache::FirstInFirstOut(c) => c.policy(),
            GenericCache::Random(c) => c.policy(),
        }
    }

    fn set(&self, index: usize) -> Option<&CacheSet> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.set(index),
            GenericCache::FirstInFirstOut(c) => c.set(index),
            GenericCache::Random(c) => c.set(index),
        }
    }

    fn invalid_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.invalid_line_count(),
            GenericCache::FirstInFirstOut(c) => c.invalid_line_count(),
            GenericCache::Random(c) => c.invalid_line_count(),
        }
    }
}
