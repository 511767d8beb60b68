use crate::error::ConfigError;

/// Width of every simulated address, in bits. Traces are validated against this, it is never
/// derived from the addresses themselves
pub const ADDRESS_WIDTH: u32 = 16;

/// Exclusive upper bound of the address space
pub const ADDRESS_LIMIT: u64 = 1 << ADDRESS_WIDTH;

/// How an address splits into tag, index and offset for one cache geometry
///
/// The index is `(address >> offset_bits) % num_sets` rather than a bit mask, so caches with a
/// set count which isn't a power of two still map every address to a valid set. Sets collide by
/// the modulo rule in that case
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AddressLayout {
    offset_bits: u32,
    index_bits: u32,
    tag_bits: u32,
    num_sets: u64,
}

impl AddressLayout {
    /// Computes the bit split for a cache with the given block size and number of sets
    ///
    /// # Arguments
    ///
    /// * `block_size`: The size of a line in bytes
    /// * `num_sets`: The number of sets in the cache
    ///
    /// returns: Result<AddressLayout, ConfigError>
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::address::AddressLayout;
    /// let layout = AddressLayout::new(16, 4).unwrap();
    /// assert_eq!((layout.offset_bits(), layout.index_bits(), layout.tag_bits()), (4, 2, 10));
    /// ```
    pub fn new(block_size: u64, num_sets: u64) -> Result<Self, ConfigError> {
        if block_size == 0 {
            return Err(ConfigError::NonPositive { field: "block size" });
        }
        if num_sets == 0 {
            return Err(ConfigError::NonPositive { field: "number of sets" });
        }
        let offset_bits = ceil_log2(block_size);
        let index_bits = ceil_log2(num_sets);
        let tag_bits = ADDRESS_WIDTH
            .checked_sub(index_bits + offset_bits)
            .ok_or(ConfigError::AddressTooNarrow {
                index_bits,
                offset_bits,
                address_width: ADDRESS_WIDTH,
            })?;
        Ok(Self {
            offset_bits,
            index_bits,
            tag_bits,
            num_sets,
        })
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Converts an address into a set index and a tag
    ///
    /// # Examples
    ///
    /// ```
    /// use tiercache::address::AddressLayout;
    /// let layout = AddressLayout::new(16, 4).unwrap();
    /// assert_eq!(layout.split(0x0123), (2, 0x004));
    /// ```
    pub fn split(&self, address: u64) -> (usize, u64) {
        let index = (address >> self.offset_bits) % self.num_sets;
        let tag_mask = (1u64 << self.tag_bits) - 1;
        let tag = (address >> (self.index_bits + self.offset_bits)) & tag_mask;
        (index as usize, tag)
    }
}

/// Number of bits needed to distinguish `value` items, `ceil(log2(value))`. Zero for one item
pub fn ceil_log2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        u64::BITS - (value - 1).leading_zeros()
    }
}
