//! In-memory reader.

use super::{resolve_seek, ReadError, Result, StreamReader, Whence};

/// [`StreamReader`] over a byte buffer, owned or borrowed.
#[derive(Debug, Clone)]
pub struct DataReader<B> {
    data: B,
    pos: u64,
    eof: bool,
}

impl<B: AsRef<[u8]>> DataReader<B> {
    pub fn new(data: B) -> Self {
        Self {
            data,
            pos: 0,
            eof: false,
        }
    }

    /// Bytes left between the current position and the end of the buffer.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.pos)
    }

    pub fn into_inner(self) -> B {
        self.data
    }

    fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }
}

impl<B: AsRef<[u8]>> StreamReader for DataReader<B> {
    fn is_eof(&self) -> bool {
        self.eof
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.eof = false;
        let len = self.len();
        self.pos = resolve_seek(offset, whence, self.pos, || Ok(len))?;
        Ok(self.pos)
    }

    fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if self.eof {
            return Err(ReadError::EndOfStream);
        }
        let n = match n {
            Some(0) => return Ok(Vec::new()),
            Some(n) => n as u64,
            None => self.remaining(),
        };
        if n > self.remaining() {
            self.eof = true;
            return Err(ReadError::EndOfStream);
        }
        // position may be past the end
        if n == 0 {
            return Ok(Vec::new());
        }
        let start = self.pos as usize;
        let end = start + n as usize;
        self.pos += n;
        Ok(self.data.as_ref()[start..end].to_vec())
    }

    fn size(&mut self) -> Option<u64> {
        Some(self.len())
    }
}
