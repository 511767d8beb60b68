use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// A two level cache configuration. Both levels share the block size, associativity and
/// replacement policy, only their capacities differ
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub l1_size: u64,
    pub l2_size: u64,
    pub block_size: u64,
    pub associativity: u64,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
    /// Seed for the random replacement policy. Without one the generator is seeded from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

impl HierarchyConfig {
    /// Reads a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parses a configuration from a JSON string
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::config::{HierarchyConfig, ReplacementPolicyConfig};
    /// let config = HierarchyConfig::from_json_str(
    ///     r#"{"l1_size": 64, "l2_size": 256, "block_size": 16, "associativity": 1, "replacement_policy": "fifo"}"#
    /// ).unwrap();
    /// assert_eq!(config.replacement_policy, ReplacementPolicyConfig::FirstInFirstOut);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The configuration of the first level
    pub fn l1(&self) -> CacheConfig {
        self.level("L1", self.l1_size, self.seed)
    }

    /// The configuration of the second level. Its random stream is offset from L1's so the two
    /// levels don't pick the same victims in lockstep
    pub fn l2(&self) -> CacheConfig {
        self.level("L2", self.l2_size, self.seed.map(|seed| seed.wrapping_add(1)))
    }

    fn level(&self, name: &'static str, size: u64, seed: Option<u64>) -> CacheConfig {
        CacheConfig {
            name,
            size,
            block_size: self.block_size,
            associativity: self.associativity,
            replacement_policy: self.replacement_policy,
            seed,
        }
    }
}

/// A configuration for a single cache level
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheConfig {
    pub name: &'static str,
    pub size: u64,
    pub block_size: u64,
    pub associativity: u64,
    pub replacement_policy: ReplacementPolicyConfig,
    pub seed: Option<u64>,
}

/// The replacement policy - lru, fifo, or random. Defaults to lru.
///
/// Names are read through `FromStr` in JSON as on the command line, so both accept the same
/// spellings
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(rename = "LRU")]
    LeastRecentlyUsed,
    #[serde(rename = "FIFO")]
    FirstInFirstOut,
    #[serde(rename = "RANDOM")]
    Random,
}

impl TryFrom<String> for ReplacementPolicyConfig {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl FromStr for ReplacementPolicyConfig {
    type Err = ConfigError;

    /// Case insensitive, surrounding whitespace is ignored
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::config::ReplacementPolicyConfig;
    /// assert_eq!(" Random ".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::Random));
    /// assert!("mru".parse::<ReplacementPolicyConfig>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LRU" => Ok(Self::LeastRecentlyUsed),
            "FIFO" => Ok(Self::FirstInFirstOut),
            "RANDOM" => Ok(Self::Random),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeastRecentlyUsed => f.write_str("LRU"),
            Self::FirstInFirstOut => f.write_str("FIFO"),
            Self::Random => f.write_str("RANDOM"),
        }
    }
}
