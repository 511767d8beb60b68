//! # TierCache
//!
//! TierCache simulates a two level (L1/L2) set associative cache to study hit and miss behaviour
//! under different replacement policies
//!
//! It provides a generic cache implementation parameterised by a replacement policy, a sequential
//! simulator and a concurrent one which feed a trace of addresses through L1 and, on a miss, L2,
//! and a reporter for the resulting counters
//!
//! The core (address decomposition, caches, policies and simulators) never touches files, stdin
//! or global randomness. Traces and random sources are handed to it

/// Contains the fixed address width and the split of an address into tag, index and offset
pub mod address;

/// Contains the implementation of the cache, its blocks and sets, and an enum over the provided
/// replacement policies
pub mod cache;

/// Contains definitions for the JSON input format and the replacement policy names
pub mod config;

/// Contains the error types of the library
pub mod error;

/// Contains helpers to read trace files
pub mod io;

/// Contains the concurrent simulator, where each cache level is owned by its own thread
pub mod parallel_sim;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the text summary and chart rendering of simulation results
pub mod report;

/// Contains the sequential simulator and the aggregate counters of a run
pub mod simulator;

/// Contains the validated address trace and its sources
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
