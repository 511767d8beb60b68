use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, info};
use crate::cache::{AccessOutcome, CacheTrait, GenericCache};
use crate::config::HierarchyConfig;
use crate::error::{ConfigError, SimError};
use crate::simulator::AggregateCounters;
use crate::trace::Trace;

pub(crate) struct ProbeRequest {
    pub(crate) address: u64,
    pub(crate) reply: Sender<AccessOutcome>,
}

/// Owns one cache on a dedicated thread. Every probe goes through the owner's queue, so the clock
/// increment, the set search and the fill of one probe happen as a unit no matter how many
/// threads are asking
pub struct CacheOwner {
    name: &'static str,
    requests: Sender<ProbeRequest>,
    thread: JoinHandle<GenericCache>,
}

impl CacheOwner {
    pub fn spawn(cache: GenericCache) -> Self {
        let name = cache.name();
        let (requests, receiver) = mpsc::channel::<ProbeRequest>();
        let thread = thread::spawn(move || {
            let mut cache = cache;
            for request in receiver {
                // The asker may have given up, the probe still counts on this level
                let _ = request.reply.send(cache.access(request.address));
            }
            cache
        });
        Self { name, requests, thread }
    }

    /// A new handle queueing probes on this cache
    pub fn handle(&self) -> LevelHandle {
        LevelHandle {
            name: self.name,
            requests: self.requests.clone(),
        }
    }

    /// Stops the owner thread once every handle has been dropped, and hands the cache back
    pub fn shutdown(self) -> Result<GenericCache, SimError> {
        let Self { name, requests, thread } = self;
        drop(requests);
        thread.join().map_err(|_| SimError::OwnerDisconnected(name))
    }
}

/// A synchronous view of a cache owned by another thread
pub struct LevelHandle {
    pub(crate) name: &'static str,
    pub(crate) requests: Sender<ProbeRequest>,
}

impl LevelHandle {
    /// Queues a probe and waits for its outcome. The only sender of the reply channel travels with
    /// the request, so a request dropped unanswered fails here instead of blocking
    pub fn probe(&self, address: u64) -> Result<AccessOutcome, SimError> {
        let (reply, replies) = mpsc::channel();
        self.requests
            .send(ProbeRequest { address, reply })
            .map_err(|_| SimError::OwnerDisconnected(self.name))?;
        replies.recv().map_err(|_| SimError::OwnerDisconnected(self.name))
    }
}

/// What a concurrent run leaves behind: the totals, the caches, and how long it took
pub struct ParallelRun {
    pub result: AggregateCounters,
    pub l1: GenericCache,
    pub l2: GenericCache,
    pub simulation_time: Duration,
}

impl ParallelRun {
    /// Gets the number of lines never filled, L1 then L2
    pub fn get_invalid_line_counts(&self) -> [usize; 2] {
        [self.l1.invalid_line_count(), self.l2.invalid_line_count()]
    }
}

/// Runs a trace on a pool of worker threads
///
/// Each worker takes the next unclaimed address, probes L1 and, on a miss, L2, then records both
/// outcomes. Which worker gets which address, and therefore the order addresses reach a cache, is
/// up to the scheduler, so only the counter identities are reproducible: L1 hits and misses add up
/// to the accesses, L2 hits and misses add up to the L1 misses
pub struct ParallelSimulator {
    l1: GenericCache,
    l2: GenericCache,
    workers: usize,
}

impl ParallelSimulator {
    pub fn new(config: &HierarchyConfig, workers: usize) -> Result<Self, ConfigError> {
        Ok(Self::with_caches(
            GenericCache::from_config(&config.l1())?,
            GenericCache::from_config(&config.l2())?,
            workers,
        ))
    }

    pub fn with_caches(l1: GenericCache, l2: GenericCache, workers: usize) -> Self {
        Self { l1, l2, workers }
    }

    pub fn simulate(self, trace: &Trace) -> Result<ParallelRun, SimError> {
        let start = Instant::now();
        let addresses = trace.addresses();
        let workers = self.workers.clamp(1, addresses.len().max(1));
        info!("Simulating {} addresses on {workers} workers", addresses.len());

        let l1 = CacheOwner::spawn(self.l1);
        let l2 = CacheOwner::spawn(self.l2);
        let next = AtomicUsize::new(0);
        let result = Mutex::new(AggregateCounters::default());

        thread::scope(|scope| {
            let tasks: Vec<_> = (0..workers)
                .map(|worker| {
                    let (l1, l2) = (l1.handle(), l2.handle());
                    let (next, result) = (&next, &result);
                    scope.spawn(move || -> Result<(), SimError> {
                        let mut processed = 0usize;
                        while let Some(&address) = addresses.get(next.fetch_add(1, Ordering::Relaxed)) {
                            let first = l1.probe(address)?;
                            let second = if first.miss() { Some(l2.probe(address)?) } else { None };
                            result
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .record(&first, second.as_ref());
                            processed += 1;
                        }
                        debug!("Worker {worker} processed {processed} addresses");
                        Ok(())
                    })
                })
                .collect();
            tasks
                .into_iter()
                .map(|task| task.join().unwrap_or(Err(SimError::WorkerPanicked)))
                .collect::<Result<(), SimError>>()
        })?;

        let result = result.into_inner().unwrap_or_else(PoisonError::into_inner);
        let run = ParallelRun {
            l1: l1.shutdown()?,
            l2: l2.shutdown()?,
            simulation_time: start.elapsed(),
            result,
        };
        info!(
            "Done: {} accesses, L1 {}/{} hit/miss, L2 {}/{} hit/miss, {} evictions",
            run.result.accesses,
            run.result.hits_l1,
            run.result.misses_l1,
            run.result.hits_l2,
            run.result.misses_l2,
            run.result.evictions
        );
        Ok(run)
    }
}
