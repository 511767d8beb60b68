use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::address::{ceil_log2, AddressLayout};
use crate::cache::{Cache, CacheTrait, GenericCache};
use crate::config::{HierarchyConfig, ReplacementPolicyConfig};
use crate::error::{ConfigError, SimError, TraceError};
use crate::io::read_trace;
use crate::parallel_sim::{CacheOwner, LevelHandle, ParallelSimulator, ProbeRequest};
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, RandomReplacement};
use crate::report::{render_chart, render_summary, write_report};
use crate::simulator::{mean_duration, AggregateCounters, Simulator};
use crate::trace::Trace;
use crate::util::get_configs;

fn hierarchy(l1_size: u64, l2_size: u64, block_size: u64, associativity: u64, policy: ReplacementPolicyConfig) -> HierarchyConfig {
    HierarchyConfig {
        l1_size,
        l2_size,
        block_size,
        associativity,
        replacement_policy: policy,
        seed: Some(42),
    }
}

fn tags_of(cache: &impl CacheTrait, index: usize) -> Vec<Option<u64>> {
    cache.set(index).unwrap().blocks().iter().map(|block| block.tag()).collect()
}

fn assert_identities(result: &AggregateCounters) {
    assert_eq!(result.hits_l1 + result.misses_l1, result.accesses);
    assert_eq!(result.hits_l2 + result.misses_l2, result.misses_l1);
    assert_eq!(result.access_times.len() as u64, result.accesses + result.misses_l1);
    assert!(result.evictions <= result.misses_l2);
}

#[test]
fn run_all_samples() -> Result<(), Box<dyn Error>> {
    let cases = get_configs()?;
    assert!(!cases.is_empty());
    for test in cases {
        println!("Running test for {}", test.output.display());
        let expected: AggregateCounters = serde_json::from_reader(BufReader::new(File::open(&test.output)?))?;
        let config = HierarchyConfig::from_file(&test.config)?;
        let trace = read_trace(&test.trace)?;
        let mut simulator = Simulator::new(&config)?;
        let result = simulator.simulate(&trace);
        assert!(result.same_counts(&expected), "{}: got {result:?}, expected {expected:?}", test.output.display());
        assert_identities(result);
    }
    Ok(())
}

#[test]
fn ceil_log2_rounds_up() {
    assert_eq!(ceil_log2(1), 0);
    assert_eq!(ceil_log2(2), 1);
    assert_eq!(ceil_log2(3), 2);
    assert_eq!(ceil_log2(16), 4);
    assert_eq!(ceil_log2(17), 5);
}

#[test]
fn layout_splits_direct_mapped_addresses() -> Result<(), Box<dyn Error>> {
    // 64B direct mapped with 16B lines: 4 sets
    let layout = AddressLayout::new(16, 4)?;
    assert_eq!(layout.split(0x00), (0, 0));
    assert_eq!(layout.split(0x10), (1, 0));
    assert_eq!(layout.split(0x20), (2, 0));
    assert_eq!(layout.split(0x4F), (0, 1));
    assert_eq!(layout.split(0xFFFF), (3, 0x3FF));
    Ok(())
}

#[test]
fn layout_rejects_geometry_wider_than_the_address() {
    assert_eq!(
        AddressLayout::new(4096, 64),
        Err(ConfigError::AddressTooNarrow {
            index_bits: 6,
            offset_bits: 12,
            address_width: 16,
        })
    );
    // Exactly filling the address leaves no tag bits, every line has tag 0
    let layout = AddressLayout::new(256, 256).unwrap();
    assert_eq!(layout.tag_bits(), 0);
    assert_eq!(layout.split(0xFFFF), (255, 0));
}

#[test]
fn modulo_indexing_aliases_addresses_when_sets_are_not_a_power_of_two() -> Result<(), Box<dyn Error>> {
    // 3 sets need 2 index bits, so set 3 wraps onto set 0 with the same tag
    let layout = AddressLayout::new(16, 3)?;
    assert_eq!(layout.split(0x00), (0, 0));
    assert_eq!(layout.split(0x30), (0, 0));
    let mut cache = Cache::new("L1", 96, 16, 2, LeastRecentlyUsed)?;
    assert!(cache.access(0x00).miss());
    assert!(cache.access(0x30).hit);
    Ok(())
}

#[test]
fn construction_validates_geometry() {
    assert_eq!(
        Cache::new("L1", 100, 16, 2, LeastRecentlyUsed).err(),
        Some(ConfigError::Indivisible {
            capacity: 100,
            block_size: 16,
            associativity: 2,
        })
    );
    assert_eq!(
        Cache::new("L1", 16, 16, 2, FirstInFirstOut).err(),
        Some(ConfigError::Indivisible {
            capacity: 16,
            block_size: 16,
            associativity: 2,
        })
    );
    assert_eq!(Cache::new("L1", 0, 16, 1, LeastRecentlyUsed).err(), Some(ConfigError::NonPositive { field: "capacity" }));
    assert_eq!(Cache::new("L1", 64, 0, 1, LeastRecentlyUsed).err(), Some(ConfigError::NonPositive { field: "block size" }));
    assert_eq!(Cache::new("L1", 64, 16, 0, LeastRecentlyUsed).err(), Some(ConfigError::NonPositive { field: "associativity" }));
    // One set of 2^34 one-byte lines fits the address split but can never be filled
    assert_eq!(
        Cache::new("L1", 1 << 34, 1, 1 << 34, LeastRecentlyUsed).err(),
        Some(ConfigError::LargerThanAddressSpace {
            capacity: 1 << 34,
            address_space: 1 << 16,
        })
    );
    // A cache covering the whole address space is still allowed
    let whole = Cache::new("L2", 1 << 16, 16, 4, LeastRecentlyUsed).unwrap();
    assert_eq!(whole.num_sets(), 1024);
}

#[test]
fn new_cache_is_empty() -> Result<(), Box<dyn Error>> {
    let cache = Cache::new("L2", 1024, 16, 4, LeastRecentlyUsed)?;
    assert_eq!(cache.num_sets(), 16);
    assert_eq!(cache.associativity(), 4);
    assert_eq!(cache.clock(), 0);
    assert_eq!(cache.invalid_line_count(), 64);
    for index in 0..16 {
        let set = cache.set(index).unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.blocks().iter().all(|block| !block.is_valid() && block.tag().is_none()));
    }
    assert!(cache.set(16).is_none());
    Ok(())
}

#[test]
fn repeated_probes_hit() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 256, 16, 2, LeastRecentlyUsed)?;
    let first = cache.access(0x1234);
    assert!(first.miss());
    assert_eq!(first.evicted_valid_line, None);
    for _ in 0..5 {
        let again = cache.access(0x1234);
        assert!(again.hit);
        assert!(!again.evicted());
    }
    // Same line, different offset
    assert!(cache.access(0x123F).hit);
    assert_eq!(cache.stats().hits, 6);
    assert_eq!(cache.stats().misses, 1);
    Ok(())
}

#[test]
fn clock_ticks_once_per_probe() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 1, LeastRecentlyUsed)?;
    cache.access(0x00);
    cache.access(0x00);
    cache.access(0x40);
    assert_eq!(cache.clock(), 3);
    // The refill of set 0 carries the clock of the probe that made it
    assert_eq!(cache.set(0).unwrap().blocks()[0].recency(), 3);
    Ok(())
}

#[test]
fn hits_refresh_recency() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 4, LeastRecentlyUsed)?;
    cache.access(0x00);
    cache.access(0x10);
    cache.access(0x00);
    let blocks = cache.set(0).unwrap().blocks();
    assert_eq!(blocks[0].recency(), 3);
    assert_eq!(blocks[1].recency(), 2);
    Ok(())
}

#[test]
fn misses_fill_lowest_invalid_block_first() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 4, FirstInFirstOut)?;
    for (expected, address) in [0x00, 0x10, 0x20, 0x30].into_iter().enumerate() {
        let outcome = cache.access(address);
        assert!(outcome.miss());
        assert_eq!(outcome.evicted_valid_line, None);
        assert_eq!(cache.set(0).unwrap().first_invalid(), if expected < 3 { Some(expected + 1) } else { None });
    }
    assert_eq!(tags_of(&cache, 0), vec![Some(0), Some(1), Some(2), Some(3)]);
    Ok(())
}

#[test]
fn full_set_evicts_exactly_one_block() -> Result<(), Box<dyn Error>> {
    // One set of four lines
    let mut cache = Cache::new("L1", 64, 16, 4, LeastRecentlyUsed)?;
    for address in [0x00, 0x10, 0x20, 0x30] {
        assert!(!cache.access(address).evicted());
    }
    let outcome = cache.access(0x40);
    assert!(outcome.miss());
    assert_eq!(outcome.evicted_valid_line, Some(true));
    assert_eq!(cache.stats().evictions, 1);
    let tags = tags_of(&cache, 0);
    assert_eq!(tags.iter().filter(|tag| tag.is_some()).count(), 4);
    assert!(tags.contains(&Some(4)));
    assert!(!tags.contains(&Some(0)));
    Ok(())
}

#[test]
fn lru_evicts_the_least_recently_touched_block() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 4, LeastRecentlyUsed)?;
    for address in [0x00, 0x10, 0x20, 0x30] {
        cache.access(address);
    }
    // Touch every block but the last
    for address in [0x00, 0x10, 0x20] {
        assert!(cache.access(address).hit);
    }
    assert!(cache.access(0x40).evicted());
    assert_eq!(tags_of(&cache, 0), vec![Some(0), Some(1), Some(2), Some(4)]);
    // Now block 0 is the oldest
    assert!(cache.access(0x50).evicted());
    assert_eq!(tags_of(&cache, 0), vec![Some(5), Some(1), Some(2), Some(4)]);
    Ok(())
}

#[test]
fn fifo_always_replaces_slot_zero() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 4, FirstInFirstOut)?;
    for address in [0x00, 0x10, 0x20, 0x30] {
        cache.access(address);
    }
    // Recency makes no difference
    cache.access(0x10);
    cache.access(0x20);
    cache.access(0x30);
    for (address, tag) in [(0x40, 4), (0x50, 5), (0x00, 0), (0x60, 6)] {
        let outcome = cache.access(address);
        assert_eq!(outcome.evicted_valid_line, Some(true));
        assert_eq!(tags_of(&cache, 0), vec![Some(tag), Some(1), Some(2), Some(3)]);
    }
    assert_eq!(cache.stats().evictions, 4);
    Ok(())
}

#[test]
fn random_replacement_is_reproducible_from_a_seed() -> Result<(), Box<dyn Error>> {
    let mut first = Cache::new("L1", 64, 16, 4, RandomReplacement::new(StdRng::seed_from_u64(7)))?;
    let mut second = Cache::new("L1", 64, 16, 4, RandomReplacement::seeded(7))?;
    let trace: Vec<u64> = (0..64).map(|i| (i * 0x50) % 0x400).collect();
    for address in trace {
        let a = first.access(address);
        let b = second.access(address);
        assert_eq!((a.hit, a.evicted_valid_line), (b.hit, b.evicted_valid_line));
        assert_eq!(tags_of(&first, 0), tags_of(&second, 0));
    }
    Ok(())
}

#[test]
fn random_replacement_evicts_one_block_of_a_full_set() -> Result<(), Box<dyn Error>> {
    let mut cache = Cache::new("L1", 64, 16, 4, RandomReplacement::seeded(1))?;
    for address in [0x00, 0x10, 0x20, 0x30] {
        cache.access(address);
    }
    for round in 0..20u64 {
        let before = tags_of(&cache, 0);
        let address = 0x100 + round * 0x10;
        assert!(cache.access(address).evicted());
        let after = tags_of(&cache, 0);
        let changed = before.iter().zip(&after).filter(|(a, b)| a != b).count();
        assert_eq!(changed, 1);
        assert!(after.contains(&Some(address >> 4)));
    }
    Ok(())
}

#[test]
fn generic_cache_follows_the_configured_policy() -> Result<(), Box<dyn Error>> {
    let config = hierarchy(64, 256, 16, 4, ReplacementPolicyConfig::FirstInFirstOut);
    let mut cache = GenericCache::from_config(&config.l1())?;
    assert!(matches!(cache, GenericCache::FirstInFirstOut(_)));
    assert_eq!(cache.policy(), ReplacementPolicyConfig::FirstInFirstOut);
    assert_eq!(cache.name(), "L1");
    for address in [0x00, 0x10, 0x20, 0x30, 0x10, 0x40] {
        cache.access(address);
    }
    assert_eq!(tags_of(&cache, 0), vec![Some(4), Some(1), Some(2), Some(3)]);

    let config = hierarchy(64, 256, 16, 4, ReplacementPolicyConfig::Random);
    assert!(matches!(GenericCache::from_config(&config.l2())?, GenericCache::Random(_)));
    Ok(())
}

#[test]
fn direct_mapped_scenario_ends_on_a_hit() -> Result<(), Box<dyn Error>> {
    let config = hierarchy(64, 256, 16, 1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = Simulator::new(&config)?;
    let trace = Trace::from_addresses([0x0, 0x10, 0x20, 0x0])?;
    let result = simulator.simulate(&trace);
    assert_eq!(result.accesses, 4);
    assert_eq!(result.hits_l1, 1);
    assert_eq!(result.misses_l1, 3);
    assert_eq!(result.hits_l2, 0);
    assert_eq!(result.misses_l2, 3);
    assert_eq!(result.evictions, 0);
    assert_eq!(result.access_times.len(), 7);
    Ok(())
}

#[test]
fn single_set_scenario_evicts_once() -> Result<(), Box<dyn Error>> {
    // Two lines of 16B in 32B: a single set on both levels
    let config = hierarchy(32, 32, 16, 2, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = Simulator::new(&config)?;
    assert_eq!(simulator.l1().num_sets(), 1);
    let mut evictions = Vec::new();
    for address in [0x00, 0x10, 0x20] {
        simulator.read(address);
        evictions.push(simulator.result().evictions);
    }
    assert_eq!(evictions, vec![0, 0, 1]);
    Ok(())
}

#[test]
fn l1_evictions_are_not_aggregated() -> Result<(), Box<dyn Error>> {
    // 0x00 and 0x40 share set 0 of L1 but not of L2
    let config = hierarchy(64, 256, 16, 1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = Simulator::new(&config)?;
    let (l1, l2) = simulator.read(0x00);
    assert!(l1.miss() && l2.is_some());
    let (l1, l2) = simulator.read(0x40);
    assert!(l1.evicted());
    assert!(!l2.unwrap().evicted());
    assert_eq!(simulator.result().evictions, 0);
    assert_eq!(simulator.l1().stats().evictions, 1);
    assert_eq!(simulator.get_invalid_line_counts(), [3, 14]);
    Ok(())
}

#[test]
fn l2_is_only_probed_on_l1_misses() -> Result<(), Box<dyn Error>> {
    let config = hierarchy(64, 256, 16, 1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = Simulator::new(&config)?;
    let (_, l2) = simulator.read(0x00);
    assert!(l2.is_some());
    let (l1, l2) = simulator.read(0x00);
    assert!(l1.hit);
    assert!(l2.is_none());
    assert_eq!(simulator.l1().clock(), 2);
    assert_eq!(simulator.l2().clock(), 1);
    Ok(())
}

#[test]
fn counter_identities_hold_for_every_policy() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(4202);
    let trace = Trace::random(2000, &mut rng);
    for policy in [ReplacementPolicyConfig::LeastRecentlyUsed, ReplacementPolicyConfig::FirstInFirstOut, ReplacementPolicyConfig::Random] {
        for associativity in [1, 2, 4, 8] {
            let config = hierarchy(512, 4096, 16, associativity, policy);
            let mut simulator = Simulator::new(&config)?;
            let result = simulator.simulate(&trace);
            assert_eq!(result.accesses, 2000);
            assert_identities(result);
        }
    }
    Ok(())
}

#[test]
fn simulate_accumulates_across_calls() -> Result<(), Box<dyn Error>> {
    let config = hierarchy(64, 256, 16, 1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut simulator = Simulator::new(&config)?;
    let trace = Trace::from_addresses([0x0, 0x10])?;
    simulator.simulate(&trace);
    let result = simulator.simulate(&trace);
    assert_eq!(result.accesses, 4);
    assert_eq!(result.hits_l1, 2);
    Ok(())
}

#[test]
fn parallel_run_keeps_counter_identities() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(99);
    let trace = Trace::random(3000, &mut rng);
    for policy in [ReplacementPolicyConfig::LeastRecentlyUsed, ReplacementPolicyConfig::FirstInFirstOut, ReplacementPolicyConfig::Random] {
        let config = hierarchy(256, 1024, 16, 2, policy);
        let run = ParallelSimulator::new(&config, 8)?.simulate(&trace)?;
        assert_eq!(run.result.accesses, 3000);
        assert_identities(&run.result);
        assert_eq!(run.l1.clock(), 3000);
        assert_eq!(run.l2.clock(), run.result.misses_l1);
        assert_eq!(run.l2.stats().evictions, run.result.evictions);
    }
    Ok(())
}

#[test]
fn parallel_run_with_one_worker_matches_sequential() -> Result<(), Box<dyn Error>> {
    for test in get_configs()? {
        let config = HierarchyConfig::from_file(&test.config)?;
        let trace = read_trace(&test.trace)?;
        let sequential = Simulator::new(&config)?.simulate(&trace).clone();
        let run = ParallelSimulator::new(&config, 1)?.simulate(&trace)?;
        assert!(run.result.same_counts(&sequential));
        assert_eq!(run.get_invalid_line_counts(), {
            let mut simulator = Simulator::new(&config)?;
            simulator.simulate(&trace);
            simulator.get_invalid_line_counts()
        });
    }
    Ok(())
}

#[test]
fn level_handles_probe_the_owned_cache() -> Result<(), Box<dyn Error>> {
    let owner = CacheOwner::spawn(Cache::new("L1", 64, 16, 1, LeastRecentlyUsed)?.into());
    let handle = owner.handle();
    assert!(handle.probe(0x10)?.miss());
    assert!(handle.probe(0x10)?.hit);
    drop(handle);
    let cache = owner.shutdown()?;
    assert_eq!(cache.clock(), 2);
    Ok(())
}

#[test]
fn unanswered_probe_fails_instead_of_blocking() {
    let (requests, receiver) = mpsc::channel::<ProbeRequest>();
    let owner = thread::spawn(move || receiver.into_iter().for_each(drop));
    let handle = LevelHandle { name: "L2", requests };
    assert!(matches!(handle.probe(0x20), Err(SimError::OwnerDisconnected("L2"))));
    drop(handle);
    owner.join().unwrap();
}

#[test]
fn parallel_run_of_empty_trace() -> Result<(), Box<dyn Error>> {
    let config = hierarchy(64, 256, 16, 1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let run = ParallelSimulator::new(&config, 4)?.simulate(&Trace::default())?;
    assert!(run.result.same_counts(&AggregateCounters::default()));
    assert_eq!(run.get_invalid_line_counts(), [4, 16]);
    Ok(())
}

#[test]
fn traces_reject_out_of_range_addresses() {
    assert_eq!(
        Trace::from_addresses([0x1, 0x10000, 0x2]),
        Err(TraceError::OutOfRange {
            position: 1,
            address: 0x10000,
            address_width: 16,
        })
    );
    // Parsed traces report the file line, like malformed lines do
    assert_eq!(
        Trace::parse(b"# header\n0x1\n\n1ffff\n"),
        Err(TraceError::LineOutOfRange {
            line: 4,
            address: 0x1ffff,
            address_width: 16,
        })
    );
    assert!(matches!(Trace::parse(b"0xFFFFFFFFFFFFFFFFFFFF\n"), Err(TraceError::LineOutOfRange { line: 1, .. })));
}

#[test]
fn traces_reject_malformed_lines() {
    assert_eq!(
        Trace::parse(b"0x1\nnot an address\n"),
        Err(TraceError::Malformed {
            line: 2,
            text: "not an address".to_string(),
        })
    );
    assert!(Trace::parse(b"0x\n").is_err());
}

#[test]
fn random_traces_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(1);
    let trace = Trace::random(5000, &mut rng);
    assert_eq!(trace.len(), 5000);
    assert!(trace.iter().all(|address| address <= 0xFFFF));
    let mut again = StdRng::seed_from_u64(1);
    assert_eq!(Trace::random(5000, &mut again), trace);
}

#[test]
fn trace_files_are_read() -> Result<(), Box<dyn Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "# header")?;
    writeln!(file, "0x0010")?;
    writeln!(file, "  20  ")?;
    let trace = read_trace(file.path())?;
    assert_eq!(trace.addresses(), &[0x10, 0x20]);

    let empty = tempfile::NamedTempFile::new()?;
    assert!(read_trace(empty.path())?.is_empty());

    let missing = empty.path().with_extension("missing");
    assert!(matches!(read_trace(&missing), Err(TraceError::Unreadable { .. })));
    Ok(())
}

#[test]
fn config_parsing() -> Result<(), Box<dyn Error>> {
    let config = HierarchyConfig::from_json_str(r#"{"l1_size": 64, "l2_size": 256, "block_size": 16, "associativity": 1}"#)?;
    assert_eq!(config.replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert_eq!(config.seed, None);
    assert_eq!(config.l1().size, 64);
    assert_eq!(config.l2().size, 256);

    let config = HierarchyConfig::from_json_str(
        r#"{"l1_size": 64, "l2_size": 256, "block_size": 16, "associativity": 1, "replacement_policy": "RANDOM", "seed": 3}"#,
    )?;
    assert_eq!(config.replacement_policy, ReplacementPolicyConfig::Random);
    assert_eq!(config.l1().seed, Some(3));
    assert_eq!(config.l2().seed, Some(4));

    let unknown = HierarchyConfig::from_json_str(
        r#"{"l1_size": 64, "l2_size": 256, "block_size": 16, "associativity": 1, "replacement_policy": "MRU"}"#,
    );
    assert!(matches!(unknown, Err(ConfigError::Parse(_))));
    // Same spellings as the --policy flag
    for (name, expected) in [
        ("Fifo", ReplacementPolicyConfig::FirstInFirstOut),
        (" lru ", ReplacementPolicyConfig::LeastRecentlyUsed),
        ("rAnDoM", ReplacementPolicyConfig::Random),
    ] {
        let json = format!(r#"{{"l1_size": 64, "l2_size": 256, "block_size": 16, "associativity": 1, "replacement_policy": "{name}"}}"#);
        assert_eq!(HierarchyConfig::from_json_str(&json)?.replacement_policy, expected);
    }
    assert_eq!(serde_json::to_string(&ReplacementPolicyConfig::FirstInFirstOut)?, r#""FIFO""#);
    let negative = HierarchyConfig::from_json_str(r#"{"l1_size": -64, "l2_size": 256, "block_size": 16, "associativity": 1}"#);
    assert!(matches!(negative, Err(ConfigError::Parse(_))));
    Ok(())
}

#[test]
fn policy_names() {
    assert_eq!("lru".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::LeastRecentlyUsed));
    assert_eq!("FIFO".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::FirstInFirstOut));
    assert_eq!("Random".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::Random));
    assert_eq!("plru".parse::<ReplacementPolicyConfig>(), Err(ConfigError::UnknownPolicy("plru".to_string())));
    assert_eq!(ReplacementPolicyConfig::FirstInFirstOut.to_string(), "FIFO");
}

#[test]
fn simulator_rejects_bad_geometry() {
    let config = hierarchy(64, 250, 16, 2, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert!(matches!(Simulator::new(&config), Err(ConfigError::Indivisible { capacity: 250, .. })));
    assert!(ParallelSimulator::new(&config, 2).is_err());
}

#[test]
fn mean_access_time() {
    let mut counters = AggregateCounters::default();
    assert_eq!(counters.mean_access_time(), Duration::ZERO);
    counters.access_times = vec![Duration::from_micros(2), Duration::from_micros(4)];
    assert_eq!(counters.mean_access_time(), Duration::from_micros(3));
}

#[test]
#[cfg(target_pointer_width = "64")]
fn mean_duration_keeps_counts_above_u32() {
    let count = (u32::MAX as usize) + 2;
    assert_eq!(mean_duration(Duration::from_nanos(2 * count as u64), count), Duration::from_nanos(2));
    assert_eq!(mean_duration(Duration::from_secs(1), 0), Duration::ZERO);
}

fn scenario_counters() -> AggregateCounters {
    AggregateCounters {
        accesses: 4,
        hits_l1: 1,
        misses_l1: 3,
        hits_l2: 0,
        misses_l2: 3,
        evictions: 0,
        access_times: vec![Duration::from_micros(1); 7],
    }
}

#[test]
fn summary_lists_every_counter() {
    let summary = render_summary(&scenario_counters());
    for line in [
        "Cache Simulation Results",
        "Total Accesses: 4",
        "L1 Hits: 1",
        "L1 Misses: 3",
        "L2 Hits: 0",
        "L2 Misses: 3",
        "Evictions: 0",
        "L1 Hit Rate: 25.00%",
        "L2 Hit Rate: 0.00%",
        "Average Access Time: 0.000001 seconds",
    ] {
        assert!(summary.lines().any(|l| l == line), "missing {line:?} in\n{summary}");
    }
}

#[test]
fn chart_scales_to_the_largest_counter() {
    let chart = render_chart(&scenario_counters(), 6);
    let lines: Vec<&str> = chart.lines().collect();
    assert_eq!(lines[0], "Cache Performance");
    assert_eq!(lines[1], "  L1 Hits | ## 1");
    assert_eq!(lines[2], "L1 Misses | ###### 3");
    assert_eq!(lines[3], "  L2 Hits |  0");
    assert_eq!(lines[4], "L2 Misses | ###### 3");
    assert_eq!(lines[5], "Evictions |  0");

    let empty = render_chart(&AggregateCounters::default(), 6);
    assert!(!empty.contains('#'));
}

#[test]
fn report_is_written_and_failures_are_surfaced() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let counters = scenario_counters();
    let path = dir.path().join("results.txt");
    write_report(&path, &counters)?;
    let written = std::fs::read_to_string(&path)?;
    assert!(written.starts_with("Cache Simulation Results\n"));
    assert!(written.contains("Cache Performance"));

    let unwritable = dir.path().join("missing").join("results.txt");
    assert!(write_report(&unwritable, &counters).is_err());
    assert!(counters.same_counts(&scenario_counters()));
    assert_eq!(counters.access_times.len(), 7);
    Ok(())
}
