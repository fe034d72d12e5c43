//! Staging Buffer for a Single Line

/// Fixed-capacity buffer holding exactly one extracted line, terminator included.
///
/// Allocated once; every extraction zeroes it before filling.
#[derive(Debug, Clone)]
pub struct StagingLine {
    buf: Box<[u8]>,
    len: usize,
}

impl StagingLine {
    /// Create a staging buffer able to hold `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Zero the whole buffer and reset the length
    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.len = 0;
    }

    /// Append a byte, returning false once the buffer is full
    pub fn try_push(&mut self, byte: u8) -> bool {
        if self.len == self.buf.len() {
            return false;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        true
    }

    /// Bytes of the current line
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Mutable bytes of the current line (for in-place field splitting)
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Default for StagingLine {
    fn default() -> Self {
        Self::with_capacity(crate::DEFAULT_STAGING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut line = StagingLine::with_capacity(3);
        assert!(line.try_push(b'a'));
        assert!(line.try_push(b'b'));
        assert!(line.try_push(b'c'));
        assert!(!line.try_push(b'd'));
        assert_eq!(line.as_bytes(), b"abc");
    }

    #[test]
    fn test_clear_zeroes_storage() {
        let mut line = StagingLine::with_capacity(4);
        line.try_push(b'x');
        line.try_push(b'y');
        line.clear();
        assert!(line.is_empty());
        assert!(line.buf.iter().all(|&b| b == 0));
    }
}
