//! Sample RAM arena
//!
//! Encoded samples are appended at 16-byte aligned offsets until the budget
//! runs out. A sample that does not fit is rejected, but its size (and its
//! alignment padding) is still charged so the final deficit says exactly how
//! many bytes have to go. Once the budget is negative nothing else fits.

/// Sample data alignment in the arena
pub const ARENA_ALIGN: usize = 16;

/// Usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Samples stored
    pub committed: usize,
    /// Samples charged but not stored
    pub rejected: usize,
    /// Bytes of stored sample data
    pub payload_bytes: u64,
    /// Bytes charged for alignment
    pub padding_bytes: u64,
    /// Cursor after the last charged sample
    pub peak_cursor: u64,
}

#[derive(Debug)]
pub struct SampleArena {
    capacity: u64,
    data: Vec<u8>,
    cursor: u64,
    remaining: i64,
    stats: ArenaStats,
}

impl SampleArena {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            data: Vec::new(),
            cursor: 0,
            remaining: capacity as i64,
            stats: ArenaStats::default(),
        }
    }

    /// Charge `bytes` at the next aligned offset; store them if they fit
    ///
    /// Returns the offset from the arena start on success.
    pub fn commit(&mut self, bytes: &[u8]) -> Option<u32> {
        let padding = self.cursor.next_multiple_of(ARENA_ALIGN as u64) - self.cursor;
        self.cursor += padding;
        self.remaining -= padding as i64;
        self.stats.padding_bytes += padding;

        let len = bytes.len() as u64;
        let offset = self.cursor;
        let fits = len as i64 <= self.remaining;

        self.cursor += len;
        self.remaining -= len as i64;
        self.stats.peak_cursor = self.cursor;

        if !fits {
            self.stats.rejected += 1;
            return None;
        }

        self.data.resize(offset as usize, 0);
        self.data.extend_from_slice(bytes);
        self.stats.committed += 1;
        self.stats.payload_bytes += len;
        Some(offset as u32)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Budget left; negative once anything was rejected
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Bytes over budget, if any
    pub fn overflow_bytes(&self) -> Option<u64> {
        (self.remaining < 0).then(|| self.remaining.unsigned_abs())
    }

    /// Bytes charged so far (stored, rejected and padding)
    pub fn used(&self) -> u64 {
        self.cursor
    }

    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Stored sample data, from offset 0 to the end of the last stored sample
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
