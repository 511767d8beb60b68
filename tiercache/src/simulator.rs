use std::time::{Duration, Instant};
use log::info;
use serde::{Deserialize, Serialize};
use crate::cache::{AccessOutcome, CacheTrait, GenericCache};
use crate::config::HierarchyConfig;
use crate::error::ConfigError;
use crate::trace::Trace;

/// The totals of a simulation run, plus the elapsed time of every probe in completion order.
/// Serialises to the output format, timings excluded
///
/// Only evictions caused by the L2 probe are counted here. The per level totals on each cache
/// count both levels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateCounters {
    pub accesses: u64,
    pub hits_l1: u64,
    pub misses_l1: u64,
    pub hits_l2: u64,
    pub misses_l2: u64,
    pub evictions: u64,
    #[serde(skip)]
    pub access_times: Vec<Duration>,
}

impl AggregateCounters {
    /// Adds one trace address to the totals
    ///
    /// # Arguments
    ///
    /// * `l1`: The outcome of the L1 probe
    /// * `l2`: The outcome of the L2 probe, present exactly when L1 missed
    pub fn record(&mut self, l1: &AccessOutcome, l2: Option<&AccessOutcome>) {
        debug_assert_eq!(l1.miss(), l2.is_some());
        self.accesses += 1;
        self.access_times.push(l1.elapsed);
        if l1.hit {
            self.hits_l1 += 1;
            return;
        }
        self.misses_l1 += 1;
        if let Some(l2) = l2 {
            self.access_times.push(l2.elapsed);
            if l2.hit {
                self.hits_l2 += 1;
            } else {
                self.misses_l2 += 1;
            }
            if l2.evicted() {
                self.evictions += 1;
            }
        }
    }

    /// Mean elapsed time of all probes, zero if nothing was probed
    pub fn mean_access_time(&self) -> Duration {
        if self.access_times.is_empty() {
            return Duration::ZERO;
        }
        mean_duration(self.access_times.iter().sum(), self.access_times.len())
    }

    /// L1 hits as a percentage of all accesses
    pub fn hit_rate_l1(&self) -> f64 {
        percentage(self.hits_l1, self.accesses)
    }

    /// L2 hits as a percentage of the accesses which reached L2
    pub fn hit_rate_l2(&self) -> f64 {
        percentage(self.hits_l2, self.misses_l1)
    }

    /// The five counters shown on the chart, in display order
    pub fn chart_values(&self) -> [(&'static str, u64); 5] {
        [
            ("L1 Hits", self.hits_l1),
            ("L1 Misses", self.misses_l1),
            ("L2 Hits", self.hits_l2),
            ("L2 Misses", self.misses_l2),
            ("Evictions", self.evictions),
        ]
    }

    /// Compares the six counters, ignoring timings
    pub fn same_counts(&self, other: &Self) -> bool {
        (self.accesses, self.hits_l1, self.misses_l1, self.hits_l2, self.misses_l2, self.evictions)
            == (other.accesses, other.hits_l1, other.misses_l1, other.hits_l2, other.misses_l2, other.evictions)
    }
}

/// `total / count` in whole nanoseconds, without narrowing the count
pub(crate) fn mean_duration(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / count as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// The sequential simulator. Trace addresses are processed one at a time in trace order, so
/// results are reproducible for the LRU and FIFO policies, and for RANDOM with a seed.
///
/// It supports calling simulate multiple times, the caches stay warm and the counters and time
/// taken to simulate accumulate
pub struct Simulator {
    l1: GenericCache,
    l2: GenericCache,
    result: AggregateCounters,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, ConfigError>
    pub fn new(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_caches(
            GenericCache::from_config(&config.l1())?,
            GenericCache::from_config(&config.l2())?,
        ))
    }

    /// Creates a simulator around caches built by the caller, e.g. with a custom random source
    pub fn with_caches(l1: GenericCache, l2: GenericCache) -> Self {
        Self {
            l1,
            l2,
            result: AggregateCounters::default(),
            simulation_time: Duration::ZERO,
        }
    }

    /// Reads one address: L1 first, L2 only if L1 missed
    ///
    /// returns: (AccessOutcome, Option<AccessOutcome>), the L1 and L2 outcomes
    pub fn read(&mut self, address: u64) -> (AccessOutcome, Option<AccessOutcome>) {
        let l1 = self.l1.access(address);
        let l2 = if l1.miss() { Some(self.l2.access(address)) } else { None };
        self.result.record(&l1, l2.as_ref());
        (l1, l2)
    }

    /// Simulates every address of a trace in order
    ///
    /// # Arguments
    ///
    /// * `trace`: A validated trace
    ///
    /// returns: &AggregateCounters, the totals so far
    pub fn simulate(&mut self, trace: &Trace) -> &AggregateCounters {
        info!("Simulating {} addresses sequentially", trace.len());
        let start = Instant::now();
        for address in trace.iter() {
            self.read(address);
        }
        self.simulation_time += start.elapsed();
        info!(
            "Done: {} accesses, L1 {}/{} hit/miss, L2 {}/{} hit/miss, {} evictions",
            self.result.accesses,
            self.result.hits_l1,
            self.result.misses_l1,
            self.result.hits_l2,
            self.result.misses_l2,
            self.result.evictions
        );
        &self.result
    }

    pub fn result(&self) -> &AggregateCounters {
        &self.result
    }

    pub fn into_result(self) -> AggregateCounters {
        self.result
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines never filled, L1 then L2
    pub fn get_invalid_line_counts(&self) -> [usize; 2] {
        [self.l1.invalid_line_count(), self.l2.invalid_line_count()]
    }

    pub fn l1(&self) -> &GenericCache {
        &self.l1
    }

    pub fn l2(&self) -> &GenericCache {
        &self.l2
    }
}
