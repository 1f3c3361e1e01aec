use xxhash_rust::xxh3::xxh3_64;

/// Accumulates the canonical bytes of one row across the grouping columns and hashes them.
///
/// Columns append through [crate::column::Comparable::hash_bytes]. Nothing is ever hashed from
/// reinterpreted memory, values are written as explicit little-endian bytes.
#[derive(Debug, Default)]
pub struct RowHasher {
    buf: Vec<u8>,
}

impl RowHasher {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends eight random bytes, scattering a null value into its own bucket.
    pub fn write_random(&mut self) {
        self.write_u64(rand::random::<u64>());
    }

    pub fn finish(&self) -> u64 {
        xxh3_64(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        let mut a = RowHasher::new();
        let mut b = RowHasher::new();
        a.write_u64(42);
        a.write(b"abc");
        b.write_u64(42);
        b.write(b"abc");

        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_reset_clears_accumulator() {
        let mut h = RowHasher::new();
        let empty = h.finish();
        h.write_u8(1);
        assert_ne!(h.finish(), empty);

        h.reset();
        assert_eq!(h.finish(), empty);
    }

    #[test]
    fn test_random_bytes_differ() {
        let mut a = RowHasher::new();
        let mut b = RowHasher::new();
        a.write_random();
        b.write_random();

        // 2^-64 chance of a false failure
        assert_ne!(a.finish(), b.finish());
    }
}
