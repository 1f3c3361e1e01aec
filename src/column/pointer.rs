use allocative::Allocative;

const LENGTH_BITS: u32 = 28;
const LENGTH_MASK: u64 = (1 << LENGTH_BITS) - 1;
const OFFSET_MASK: u64 = (1 << 35) - 1;
const NULL_BIT: u64 = 1 << 63;

/// Largest string, in bytes, a pointer can address.
pub(crate) const MAX_STRING_LEN: usize = LENGTH_MASK as usize;
/// Largest blob offset a pointer can address.
pub(crate) const MAX_OFFSET: usize = OFFSET_MASK as usize;

/// Location of one string inside a column's byte blob.
///
/// Packed into a `u64`: bit 63 marks null, bits 28..63 hold the offset and bits 0..28 the
/// length. A null pointer is distinct from a pointer to an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Allocative)]
pub(crate) struct Pointer(u64);

impl Pointer {
    pub const NULL: Pointer = Pointer(NULL_BIT);

    /// # Panics
    ///
    /// Debug builds assert that `offset` and `len` fit the packed layout. Callers check
    /// [MAX_OFFSET] and [MAX_STRING_LEN] first.
    pub fn new(offset: usize, len: usize) -> Self {
        debug_assert!(offset <= MAX_OFFSET && len <= MAX_STRING_LEN);
        Self(((offset as u64 & OFFSET_MASK) << LENGTH_BITS) | (len as u64 & LENGTH_MASK))
    }

    pub fn is_null(self) -> bool {
        self.0 & NULL_BIT != 0
    }

    pub fn offset(self) -> usize {
        ((self.0 >> LENGTH_BITS) & OFFSET_MASK) as usize
    }

    pub fn len(self) -> usize {
        (self.0 & LENGTH_MASK) as usize
    }

    /// Byte range of the string in the blob, `None` for null.
    pub fn range(self) -> Option<std::ops::Range<usize>> {
        if self.is_null() {
            None
        } else {
            Some(self.offset()..self.offset() + self.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_and_unpack() {
        let p = Pointer::new(1234, 56);
        assert_eq!(p.offset(), 1234);
        assert_eq!(p.len(), 56);
        assert!(!p.is_null());
        assert_eq!(p.range(), Some(1234..1290));
    }

    #[test]
    fn test_null_is_not_empty() {
        let empty = Pointer::new(0, 0);
        assert!(!empty.is_null());
        assert_eq!(empty.range(), Some(0..0));

        assert!(Pointer::NULL.is_null());
        assert_eq!(Pointer::NULL.range(), None);
        assert_ne!(empty, Pointer::NULL);
    }

    #[test]
    fn test_limits() {
        let p = Pointer::new(MAX_OFFSET, MAX_STRING_LEN);
        assert_eq!(p.offset(), MAX_OFFSET);
        assert_eq!(p.len(), MAX_STRING_LEN);
        assert!(!p.is_null());
    }
}
