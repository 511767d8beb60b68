use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a cache from its geometry or reading a configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("capacity {capacity} is not divisible by block size {block_size} * associativity {associativity}")]
    Indivisible {
        capacity: u64,
        block_size: u64,
        associativity: u64,
    },

    #[error("capacity {capacity} is larger than the {address_space} byte address space")]
    LargerThanAddressSpace { capacity: u64, address_space: u64 },

    #[error("{index_bits} index bits and {offset_bits} offset bits do not fit in a {address_width} bit address")]
    AddressTooNarrow {
        index_bits: u32,
        offset_bits: u32,
        address_width: u32,
    },

    #[error("unknown replacement policy {0:?}, expected one of LRU, FIFO or RANDOM")]
    UnknownPolicy(String),

    #[error("couldn't read the config file at path {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("couldn't parse the config: {0}")]
    Parse(String),

    #[error("missing configuration value: {0}")]
    Missing(&'static str),
}

/// Errors raised while building a trace. A trace is rejected as a whole, nothing is masked
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("address {address:#x} at position {position} does not fit in {address_width} bits")]
    OutOfRange {
        position: usize,
        address: u64,
        address_width: u32,
    },

    #[error("address {address:#x} on line {line} does not fit in {address_width} bits")]
    LineOutOfRange {
        line: usize,
        address: u64,
        address_width: u32,
    },

    #[error("line {line} of the trace is not a hexadecimal address: {text:?}")]
    Malformed { line: usize, text: String },

    #[error("couldn't read the trace file at path {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Errors raised while persisting a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("couldn't write the report to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any error the library can surface
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("the owner thread of cache {0} stopped before answering")]
    OwnerDisconnected(&'static str),

    #[error("a simulation worker panicked")]
    WorkerPanicked,
}
