//! # ByteCursor - Bounds-Checked Forward Reader
//!
//! A forward-only reader over a borrowed byte slice. Every read is checked
//! against the remaining length before anything is consumed, so a failed read
//! leaves the cursor exactly where it was.
//!
//! Positions are reported as absolute offsets into the caller's original
//! buffer: a cursor over a sub-slice (e.g. the user data of a long frame)
//! is created with [`ByteCursor::with_base`] so that error offsets stay
//! meaningful to the caller.
//!
//! ```rust
//! use mbus_telegram::util::ByteCursor;
//!
//! let mut cursor = ByteCursor::new(&[0x68, 0x03, 0x03]);
//! assert_eq!(cursor.peek(1).unwrap(), 0x03);
//! assert_eq!(cursor.take(2).unwrap(), &[0x68, 0x03]);
//! assert_eq!(cursor.remaining(), 1);
//! assert!(cursor.take(2).is_err());
//! assert_eq!(cursor.remaining(), 1);
//! ```

use crate::error::CursorError;

/// Bounds-checked forward-only reader.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Create a cursor whose first byte sits at absolute offset `base`.
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread bytes, without consuming them.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    /// Read the byte `offset` positions ahead of the current one without consuming.
    pub fn peek(&self, offset: usize) -> Result<u8, CursorError> {
        self.pos
            .checked_add(offset)
            .and_then(|idx| self.data.get(idx))
            .copied()
            .ok_or_else(|| self.out_of_bounds(offset.saturating_add(1)))
    }

    /// Consume exactly `n` bytes, or nothing at all.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    /// Consume a single byte.
    pub fn take_u8(&mut self) -> Result<u8, CursorError> {
        let byte = self.peek(0)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consume everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = self.as_slice();
        self.pos = self.data.len();
        rest
    }

    fn out_of_bounds(&self, requested: usize) -> CursorError {
        CursorError::OutOfBounds {
            offset: self.position(),
            requested,
            remaining: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_take_and_remaining() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.remaining(), 5);
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.take_u8().unwrap(), 3);
        assert_eq!(cursor.take_rest(), &[4, 5]);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_failed_take_consumes_nothing() {
        let data = [0xAA, 0xBB];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.take(3).unwrap_err();
        assert_eq!(
            err,
            CursorError::OutOfBounds {
                offset: 0,
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.take(2).unwrap(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = [0x10, 0x20];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek(0).unwrap(), 0x10);
        assert_eq!(cursor.peek(1).unwrap(), 0x20);
        assert!(cursor.peek(2).is_err());
        assert!(cursor.peek(usize::MAX).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_base_offset_is_reported() {
        let data = [0x01];
        let mut cursor = ByteCursor::with_base(&data, 19);
        assert_eq!(cursor.position(), 19);
        cursor.take_u8().unwrap();
        let err = cursor.take_u8().unwrap_err();
        assert_eq!(
            err,
            CursorError::OutOfBounds {
                offset: 20,
                requested: 1,
                remaining: 0
            }
        );
    }

    proptest! {
        #[test]
        fn prop_take_never_overreads(data in proptest::collection::vec(any::<u8>(), 0..64), n in 0usize..80) {
            let mut cursor = ByteCursor::new(&data);
            match cursor.take(n) {
                Ok(slice) => {
                    prop_assert_eq!(slice.len(), n);
                    prop_assert_eq!(cursor.remaining(), data.len() - n);
                }
                Err(_) => {
                    prop_assert!(n > data.len());
                    prop_assert_eq!(cursor.remaining(), data.len());
                }
            }
        }
    }
}
