//! Little-endian positionable reader over a file or an in-memory buffer.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::BmpError;

/// Integers that can be read from the stream in little-endian order.
pub(crate) trait LeInt: Sized {
    const SIZE: usize;
    fn from_le(bytes: &[u8]) -> Self;
}

macro_rules! le_int {
    ($($t:ty),*) => {$(
        impl LeInt for $t {
            const SIZE: usize = core::mem::size_of::<$t>();
            #[inline]
            fn from_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

le_int!(u8, u16, u32, u64, i16, i32);

/// Binary reader that tracks its position and the total stream length.
///
/// Short reads are [`BmpError::EndOfFile`], other I/O failures are
/// [`BmpError::Io`], and positioning outside the stream is
/// [`BmpError::StreamCorrupted`].
pub(crate) struct ByteStream<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<'a> ByteStream<Cursor<&'a [u8]>> {
    pub(crate) fn from_bytes(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
            pos: 0,
            len: data.len() as u64,
        }
    }
}

impl ByteStream<BufReader<File>> {
    pub(crate) fn open(path: &Path) -> Result<Self, BmpError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BmpError::FileNotFound(path.to_path_buf()),
            _ => BmpError::from(e),
        })?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ByteStream<R> {
    pub(crate) fn new(mut inner: R) -> Result<Self, BmpError> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, pos: 0, len })
    }

    /// Total stream length in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes between the current position and the end of the stream.
    pub(crate) fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    pub(crate) fn seek_to(&mut self, pos: u64) -> Result<(), BmpError> {
        if pos > self.len {
            return Err(BmpError::StreamCorrupted(pos));
        }
        if pos != self.pos {
            self.inner.seek(SeekFrom::Start(pos))?;
            self.pos = pos;
        }
        Ok(())
    }

    pub(crate) fn skip(&mut self, n: u64) -> Result<(), BmpError> {
        let target = self.pos.checked_add(n).ok_or(BmpError::EndOfFile)?;
        if target > self.len {
            return Err(BmpError::EndOfFile);
        }
        self.seek_to(target)
    }

    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpError> {
        if (buf.len() as u64) > self.remaining() {
            return Err(BmpError::EndOfFile);
        }
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Read `n` bytes into a fresh buffer.
    pub(crate) fn read_vec(&mut self, n: usize) -> Result<Vec<u8>, BmpError> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read the next `size_of::<T>()` bytes as a little-endian `T`.
    pub(crate) fn read_le<T: LeInt>(&mut self) -> Result<T, BmpError> {
        let mut raw = [0u8; 8];
        self.read_exact(&mut raw[..T::SIZE])?;
        Ok(T::from_le(&raw))
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, BmpError> {
        self.read_le()
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, BmpError> {
        self.read_le()
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, BmpError> {
        self.read_le()
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, BmpError> {
        self.read_le()
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, BmpError> {
        self.read_le()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x42, 0x4d, 0x78, 0x56, 0x34, 0x12, 0xff, 0xff];
        let mut s = ByteStream::from_bytes(&data);
        assert_eq!(s.read_u16().unwrap(), 0x4d42);
        assert_eq!(s.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(s.read_i16().unwrap(), -1);
        assert_eq!(s.position(), 8);
    }

    #[test]
    fn short_read_is_end_of_file() {
        let data = [1, 2, 3];
        let mut s = ByteStream::from_bytes(&data);
        assert!(matches!(s.read_u32(), Err(BmpError::EndOfFile)));
        // A failed read does not consume anything.
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn seeking_past_end_is_corruption() {
        let data = [0u8; 4];
        let mut s = ByteStream::from_bytes(&data);
        assert!(s.seek_to(4).is_ok());
        assert!(matches!(s.seek_to(5), Err(BmpError::StreamCorrupted(5))));
    }
}
