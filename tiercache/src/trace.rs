use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use crate::address::{ADDRESS_LIMIT, ADDRESS_WIDTH};
use crate::error::TraceError;

lazy_static! {
    static ref TRACE_LINE: Regex =
        Regex::new(r"^\s*(?:(?:0[xX])?(?P<address>[0-9a-fA-F]+))?\s*(?:#.*)?$").unwrap();
}

/// Length of a generated trace when none is given
pub const DEFAULT_RANDOM_TRACE_LEN: usize = 1000;

/// An ordered, finite sequence of addresses, every one of them inside the address space
///
/// Validation happens once, when the trace is built. A single bad address rejects the whole
/// trace, so the simulator never sees an address it would have to mask
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Trace {
    addresses: Vec<u64>,
}

impl Trace {
    /// Builds a trace from any sequence of addresses
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::trace::Trace;
    /// assert_eq!(Trace::from_addresses([0x0, 0x10, 0xFFFF]).unwrap().len(), 3);
    /// assert!(Trace::from_addresses([0x10000]).is_err());
    /// ```
    pub fn from_addresses<I: IntoIterator<Item = u64>>(addresses: I) -> Result<Self, TraceError> {
        let addresses = addresses
            .into_iter()
            .enumerate()
            .map(|(position, address)| {
                if address < ADDRESS_LIMIT {
                    Ok(address)
                } else {
                    Err(TraceError::OutOfRange {
                        position,
                        address,
                        address_width: ADDRESS_WIDTH,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { addresses })
    }

    /// Generates `len` addresses drawn uniformly from the whole address space
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        Self {
            addresses: (0..len).map(|_| rng.gen_range(0..ADDRESS_LIMIT)).collect(),
        }
    }

    /// Parses a textual trace: one hexadecimal address per line, with an optional `0x` prefix.
    /// Blank lines and `#` comments are skipped
    ///
    /// # Arguments
    ///
    /// * `bytes`: The trace file contents
    ///
    /// returns: Result<Trace, TraceError>
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::trace::Trace;
    /// let trace = Trace::parse(b"# warm up\n0x0\n10\n\n0X20 # third\n").unwrap();
    /// assert_eq!(trace.addresses(), &[0x0, 0x10, 0x20]);
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self, TraceError> {
        let text = String::from_utf8_lossy(bytes);
        let mut addresses = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let captures = TRACE_LINE.captures(line).ok_or_else(|| TraceError::Malformed {
                line: number + 1,
                text: line.to_string(),
            })?;
            let Some(digits) = captures.name("address") else {
                continue;
            };
            // Anything too long for a u64 is out of range anyway
            let address = u64::from_str_radix(digits.as_str(), 16).unwrap_or(u64::MAX);
            if address >= ADDRESS_LIMIT {
                return Err(TraceError::LineOutOfRange {
                    line: number + 1,
                    address,
                    address_width: ADDRESS_WIDTH,
                });
            }
            addresses.push(address);
        }
        Ok(Self { addresses })
    }

    pub fn addresses(&self) -> &[u64] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.addresses.iter().copied()
    }
}
