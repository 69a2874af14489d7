//! Positioned binary readers with latched end-of-stream state.
//!
//! [`StreamReader`] is the contract every reader implements: a handful of
//! required primitives (`tell`, `seek`, `read`) plus derived decoders for
//! fixed-width integers, floats and strings. Two sources implement it
//! ([`DataReader`] over a byte buffer, [`FileReader`] over any
//! `Read + Seek` handle) and [`Window`] carves a bounded region out of
//! either, or out of another window.
//!
//! ## EOF semantics
//! * `read(Some(n))` returns exactly `n` bytes or fails with
//!   [`ReadError::EndOfStream`] without consuming anything.
//! * A failed read latches the EOF flag; all later reads fail until the
//!   next `seek`, whatever its destination.
//! * `read(Some(0))` succeeds with an empty result, even past the end,
//!   unless EOF is already latched.

mod data;
mod file;
mod window;

pub use data::DataReader;
pub use file::FileReader;
pub use window::Window;

use thiserror::Error;

/// Errors produced by stream readers.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("End of stream: more bytes requested than available")]
    EndOfStream,

    #[error("Invalid position: {0} is before the start of the stream")]
    InvalidPosition(i128),

    #[error("Invalid text: bytes are not valid {0}")]
    InvalidText(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReadError>;

/// Reference point for [`StreamReader::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Text encodings accepted by the string readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| ReadError::InvalidText("UTF-8")),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Resolve `offset` against `whence` into an absolute position.
///
/// `end` is only consulted for [`Whence::End`].
pub(crate) fn resolve_seek(
    offset: i64,
    whence: Whence,
    current: u64,
    end: impl FnOnce() -> Result<u64>,
) -> Result<u64> {
    let base = match whence {
        Whence::Start => 0,
        Whence::Current => current as i128,
        Whence::End => end()? as i128,
    };
    let target = base + offset as i128;
    if target < 0 {
        return Err(ReadError::InvalidPosition(target));
    }
    Ok(target as u64)
}

/// A positioned byte source with latched EOF state.
pub trait StreamReader {
    /// Whether the last read ran out of data. Cleared by [`seek`](Self::seek).
    fn is_eof(&self) -> bool;

    /// Current position.
    fn tell(&self) -> u64;

    /// Reposition the stream and clear the EOF state. Returns the new
    /// absolute position.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

    /// Read all remaining bytes (`None`) or exactly `n` bytes.
    fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>>;

    /// Total size of the source, if it can be determined.
    fn size(&mut self) -> Option<u64>;

    /// Read one byte.
    fn read_byte(&mut self) -> Result<u8> {
        let data = self.read(Some(1))?;
        data.first().copied().ok_or(ReadError::EndOfStream)
    }

    /// Skip forward (or backward, for negative `count`).
    fn skip(&mut self, count: i64) -> Result<u64> {
        self.seek(count, Whence::Current)
    }

    /// Read exactly `n` bytes, rejecting the short result a bounded
    /// [`Window`] may return. The position is restored on failure.
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let pos = self.tell();
        let data = self.read(Some(n))?;
        if data.len() < n {
            self.seek(pos as i64, Whence::Start)?;
            return Err(ReadError::EndOfStream);
        }
        Ok(data)
    }

    /// Read exactly `N` bytes into an array.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]>
    where
        Self: Sized,
    {
        let data = self.read_exact(N)?;
        data.try_into().map_err(|_| ReadError::EndOfStream)
    }

    fn read_u16_le(&mut self) -> Result<u16>
    where
        Self: Sized,
    {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_i16_le(&mut self) -> Result<i16>
    where
        Self: Sized,
    {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// 16-bit low word followed by an 8-bit high byte.
    fn read_u24_le(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        let b: [u8; 3] = self.read_array()?;
        let low = u16::from_le_bytes([b[0], b[1]]) as u32;
        let high = b[2] as u32;
        Ok((high << 16) | low)
    }

    fn read_u32_le(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// 32-bit low word followed by a 16-bit high word.
    fn read_u48_le(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        let b: [u8; 6] = self.read_array()?;
        let low = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64;
        let high = u16::from_le_bytes([b[4], b[5]]) as u64;
        Ok((high << 32) | low)
    }

    fn read_u64_le(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// 64-bit low word followed by a 32-bit high word.
    fn read_u96_le(&mut self) -> Result<u128>
    where
        Self: Sized,
    {
        let b: [u8; 12] = self.read_array()?;
        let mut low = [0u8; 8];
        low.copy_from_slice(&b[..8]);
        let high = u32::from_le_bytes([b[8], b[9], b[10], b[11]]) as u128;
        Ok((high << 64) | u64::from_le_bytes(low) as u128)
    }

    fn read_u128_le(&mut self) -> Result<u128>
    where
        Self: Sized,
    {
        Ok(u128::from_le_bytes(self.read_array()?))
    }

    fn read_u16_be(&mut self) -> Result<u16>
    where
        Self: Sized,
    {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// 8-bit high byte followed by a 16-bit low word.
    fn read_u24_be(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        let b: [u8; 3] = self.read_array()?;
        let high = b[0] as u32;
        let low = u16::from_be_bytes([b[1], b[2]]) as u32;
        Ok((high << 16) | low)
    }

    fn read_u32_be(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// 16-bit high word followed by a 32-bit low word.
    fn read_u48_be(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        let b: [u8; 6] = self.read_array()?;
        let high = u16::from_be_bytes([b[0], b[1]]) as u64;
        let low = u32::from_be_bytes([b[2], b[3], b[4], b[5]]) as u64;
        Ok((high << 32) | low)
    }

    fn read_u64_be(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// 32-bit high word followed by a 64-bit low word.
    fn read_u96_be(&mut self) -> Result<u128>
    where
        Self: Sized,
    {
        let b: [u8; 12] = self.read_array()?;
        let high = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u128;
        let mut low = [0u8; 8];
        low.copy_from_slice(&b[4..]);
        Ok((high << 64) | u64::from_be_bytes(low) as u128)
    }

    fn read_u128_be(&mut self) -> Result<u128>
    where
        Self: Sized,
    {
        Ok(u128::from_be_bytes(self.read_array()?))
    }

    fn read_f64_le(&mut self) -> Result<f64>
    where
        Self: Sized,
    {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    fn read_f64_be(&mut self) -> Result<f64>
    where
        Self: Sized,
    {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Read an `n`-byte text field. Trailing NULs are always removed;
    /// trailing whitespace only when `trim` is set.
    fn read_fixed_string(&mut self, n: usize, encoding: TextEncoding, trim: bool) -> Result<String> {
        let data = self.read_exact(n)?;
        let text = encoding.decode(&data)?;
        let text = text.trim_end_matches('\0');
        let text = if trim { text.trim_end() } else { text };
        Ok(text.to_string())
    }

    /// Read a NUL-terminated string.
    ///
    /// Running out of data after at least one byte yields the partial
    /// string; running out before any byte yields `None`.
    fn read_nul_terminated_string(&mut self, encoding: TextEncoding) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            match self.read_byte() {
                Ok(0) => break,
                Ok(b) => bytes.push(b),
                Err(ReadError::EndOfStream) if bytes.is_empty() => return Ok(None),
                Err(ReadError::EndOfStream) => break,
                Err(e) => return Err(e),
            }
        }
        encoding.decode(&bytes).map(Some)
    }
}

impl<T: StreamReader + ?Sized> StreamReader for &mut T {
    fn is_eof(&self) -> bool {
        (**self).is_eof()
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        (**self).seek(offset, whence)
    }

    fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        (**self).read(n)
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_exact(n)
    }

    fn size(&mut self) -> Option<u64> {
        (**self).size()
    }
}
