use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3};

use crate::error::{Error, Result};

/// Forward reader over a borrowed byte slice.
///
/// Every read checks the remaining length first, so a corrupt size field
/// turns into [`Error::TruncatedData`] instead of garbage.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Fail unless at least `needed` bytes remain.
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Like [`ensure`](Self::ensure) for sizes computed from untrusted
    /// counts, where the product itself may not fit in `usize`.
    pub fn ensure_u64(&self, needed: u64) -> Result<()> {
        let needed = usize::try_from(needed).map_err(|_| Error::TruncatedData {
            offset: self.pos,
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        self.ensure(needed)
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: pos.saturating_sub(self.pos),
                available: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.pos += count;
        Ok(())
    }

    pub fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Split off the next `count` bytes as an independent cursor.
    pub fn sub_cursor(&mut self, count: usize) -> Result<ByteCursor<'a>> {
        self.take(count).map(ByteCursor::new)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take(2).map(LittleEndian::read_i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take(4).map(LittleEndian::read_i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.take(4).map(LittleEndian::read_f32)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read a fixed-width, NUL-padded string field.
    pub fn read_fixed_str(&mut self, width: usize) -> Result<String> {
        let raw = self.take(width)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// Read a NUL-terminated string starting at an absolute offset
    /// without moving the cursor.
    pub fn c_str_at(&self, offset: usize) -> Option<String> {
        let tail = self.data.get(offset..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        Some(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0xff, 0xff];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(cursor.read_i16().unwrap(), -1);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_short_read_is_truncation() {
        let bytes = [0u8; 3];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.read_u8().unwrap();
        match cursor.read_u32() {
            Err(Error::TruncatedData {
                offset,
                needed,
                available,
            }) => {
                assert_eq!((offset, needed, available), (1, 4, 2));
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        // Failed reads leave the position untouched
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_fixed_str_stops_at_nul() {
        let mut bytes = *b"Bip01 Pelvis\0\0\0\0\0\0\0\0\0\0\0\0";
        bytes[20] = b'x';
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_fixed_str(24).unwrap(), "Bip01 Pelvis");
        assert_eq!(cursor.position(), 24);
    }

    #[test]
    fn test_ensure_u64_overflow() {
        let cursor = ByteCursor::new(&[]);
        assert!(matches!(
            cursor.ensure_u64(u64::MAX),
            Err(Error::TruncatedData { .. })
        ));
    }
}
