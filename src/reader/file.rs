//! Reader over a seekable handle.

use std::io::{Read, Seek, SeekFrom};

use super::{resolve_seek, ReadError, Result, StreamReader, Whence};

/// [`StreamReader`] over any `Read + Seek` handle: a [`std::fs::File`]
/// (preferably behind a [`std::io::BufReader`]), a [`std::io::Cursor`], ...
///
/// The position is mirrored locally so [`tell`](StreamReader::tell) never
/// touches the handle.
#[derive(Debug)]
pub struct FileReader<R> {
    inner: R,
    pos: u64,
    eof: bool,
}

impl<R: Read + Seek> FileReader<R> {
    /// Wrap `inner`, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self {
            inner,
            pos,
            eof: false,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn end(&mut self) -> Result<u64> {
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(end)
    }
}

impl<R: Read + Seek> StreamReader for FileReader<R> {
    fn is_eof(&self) -> bool {
        self.eof
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.eof = false;
        let target = match whence {
            Whence::End => {
                let end = self.end()?;
                resolve_seek(offset, whence, self.pos, || Ok(end))?
            }
            _ => resolve_seek(offset, whence, self.pos, || Ok(0))?,
        };
        self.pos = self.inner.seek(SeekFrom::Start(target))?;
        Ok(self.pos)
    }

    fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if self.eof {
            return Err(ReadError::EndOfStream);
        }
        let mut data = Vec::new();
        match n {
            Some(0) => return Ok(data),
            Some(n) => {
                data.reserve(n.min(0x10000));
                (&mut self.inner).take(n as u64).read_to_end(&mut data)?;
                if data.len() < n {
                    self.inner.seek(SeekFrom::Start(self.pos))?;
                    self.eof = true;
                    return Err(ReadError::EndOfStream);
                }
            }
            None => {
                self.inner.read_to_end(&mut data)?;
            }
        }
        self.pos += data.len() as u64;
        Ok(data)
    }

    fn size(&mut self) -> Option<u64> {
        self.end().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::contract;
    use std::io::Cursor;

    fn reader(data: impl Into<Vec<u8>>) -> FileReader<Cursor<Vec<u8>>> {
        FileReader::new(Cursor::new(data.into())).unwrap()
    }

    #[test]
    fn test_contract() {
        contract::check_read(&mut reader(&b"abcdefghijklmnopqrstu\0\0xy"[..]));
        contract::check_read_rest(&mut reader((0..16).collect::<Vec<u8>>()));
        contract::check_seek_tell(&mut reader((0..=255).collect::<Vec<u8>>()));
        contract::check_int_reads(&mut reader((0..=255).collect::<Vec<u8>>()));
        contract::check_eof(|| reader((0..16).collect::<Vec<u8>>()));
        contract::check_strings(|data| reader(data));
    }

    #[test]
    fn test_starts_at_handle_position() {
        let mut cursor = Cursor::new(vec![0u8, 1, 2, 3]);
        cursor.set_position(2);
        let mut r = FileReader::new(cursor).unwrap();
        assert_eq!(r.tell(), 2);
        assert_eq!(r.read_byte().unwrap(), 2);
        assert_eq!(r.size(), Some(4));
        assert_eq!(r.tell(), 3);
        assert_eq!(r.read_byte().unwrap(), 3);
    }
}
