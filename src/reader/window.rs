//! Bounded sub-views onto a parent reader.

use super::{resolve_seek, ReadError, Result, StreamReader, Whence};

/// Read-only window onto a parent [`StreamReader`].
///
/// Positions are window-local: local `0` is parent offset `start`. A
/// window with a length clamps every read at its end, so `read(Some(n))`
/// past the end returns the bytes that remain instead of failing. A window
/// without a length extends to the parent's end and passes reads through
/// unchanged, keeping the parent's strict short-read behaviour.
///
/// [`read_exact`](StreamReader::read_exact) stays strict: asking for more
/// than the window holds latches EOF on the window and consumes nothing.
///
/// The window borrows its parent mutably and moves the parent's position;
/// callers that hold several regions of one file keep offsets and create a
/// window per use.
#[derive(Debug)]
pub struct Window<'a, P: ?Sized> {
    parent: &'a mut P,
    start: u64,
    end: Option<u64>,
    eof: bool,
}

impl<'a, P: StreamReader + ?Sized> Window<'a, P> {
    /// Open a window at the parent's current position.
    pub fn new(parent: &'a mut P, len: Option<u64>) -> Self {
        let start = parent.tell();
        Self {
            parent,
            start,
            end: len.map(|len| start + len),
            eof: false,
        }
    }

    /// Open a window at parent offset `start`, positioned at local `0`.
    pub fn at(parent: &'a mut P, start: u64, len: Option<u64>) -> Result<Self> {
        parent.seek(start as i64, Whence::Start)?;
        Ok(Self::new(parent, len))
    }

    /// Parent offset of local position `0`.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Fixed length, or `None` when the window extends to the parent's end.
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end - self.start)
    }

    /// Bytes between the current position and the window end.
    pub fn remaining(&self) -> Option<u64> {
        self.len().map(|len| len.saturating_sub(self.tell()))
    }
}

impl<P: StreamReader + ?Sized> StreamReader for Window<'_, P> {
    fn is_eof(&self) -> bool {
        self.eof || self.parent.is_eof()
    }

    fn tell(&self) -> u64 {
        self.parent.tell().saturating_sub(self.start)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.eof = false;
        if let (Whence::End, None) = (whence, self.end) {
            let previous = self.parent.tell();
            let absolute = self.parent.seek(offset, Whence::End)?;
            if absolute < self.start {
                self.parent.seek(previous as i64, Whence::Start)?;
                return Err(ReadError::InvalidPosition(
                    absolute as i128 - self.start as i128,
                ));
            }
            return Ok(absolute - self.start);
        }

        let len = self.len().unwrap_or(0);
        match resolve_seek(offset, whence, self.tell(), || Ok(len)) {
            Ok(local) => {
                self.parent.seek((self.start + local) as i64, Whence::Start)?;
                Ok(local)
            }
            Err(e) => {
                // still clears EOF
                self.parent.skip(0)?;
                Err(e)
            }
        }
    }

    fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        if self.eof {
            return Err(ReadError::EndOfStream);
        }
        match self.remaining() {
            Some(remaining) => {
                let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
                let n = n.map_or(remaining, |n| n.min(remaining));
                self.parent.read(Some(n))
            }
            None => self.parent.read(n),
        }
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.eof {
            return Err(ReadError::EndOfStream);
        }
        if let Some(remaining) = self.remaining() {
            if n as u64 > remaining {
                self.eof = true;
                return Err(ReadError::EndOfStream);
            }
        }
        self.parent.read_exact(n)
    }

    fn size(&mut self) -> Option<u64> {
        match self.len() {
            Some(len) => Some(len),
            None => {
                let start = self.start;
                self.parent.size().map(|size| size.saturating_sub(start))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{contract, DataReader};

    fn source() -> DataReader<Vec<u8>> {
        DataReader::new((0..32).collect())
    }

    #[test]
    fn test_bounded_read_clamps() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 4, Some(8)).unwrap();
        assert_eq!(w.tell(), 0);
        assert_eq!(w.read(Some(100)).unwrap(), (4..12).collect::<Vec<u8>>());
        assert_eq!(w.tell(), 8);
        assert_eq!(w.read(Some(1)).unwrap(), Vec::<u8>::new());
        assert!(!w.is_eof());

        w.seek(2, Whence::Start).unwrap();
        assert_eq!(w.read(None).unwrap(), (6..12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_bounded_seek_is_local() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 4, Some(8)).unwrap();
        assert_eq!(w.seek(-2, Whence::End).unwrap(), 6);
        assert_eq!(w.read(None).unwrap(), [10, 11]);
        assert_eq!(w.seek(-3, Whence::Current).unwrap(), 5);
        assert_eq!(w.read_byte().unwrap(), 9);
        assert!(matches!(
            w.seek(-1, Whence::Start),
            Err(ReadError::InvalidPosition(-1))
        ));
        assert_eq!(w.tell(), 6);

        // past the end: position accepted, reads yield nothing
        assert_eq!(w.seek(20, Whence::Start).unwrap(), 20);
        assert_eq!(w.read(Some(4)).unwrap(), Vec::<u8>::new());
        drop(w);
        assert_eq!(parent.tell(), 24);
    }

    #[test]
    fn test_read_exact_rejects_short_window_read() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 28, Some(3)).unwrap();
        assert!(matches!(w.read_u32_le(), Err(ReadError::EndOfStream)));
        assert_eq!(w.tell(), 0);
        assert!(w.is_eof());
        assert!(matches!(w.read_u24_le(), Err(ReadError::EndOfStream)));

        w.seek(0, Whence::Start).unwrap();
        assert!(!w.is_eof());
        assert_eq!(w.read_u24_le().unwrap(), 0x1e1d1c);

        // the parent's latch is untouched and reads through it still work
        drop(w);
        assert!(!parent.is_eof());
        assert_eq!(parent.read_byte().unwrap(), 31);
    }

    #[test]
    fn test_unbounded_keeps_strict_reads() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 8, None).unwrap();
        assert!(matches!(w.read(Some(100)), Err(ReadError::EndOfStream)));
        assert_eq!(w.tell(), 0);
        assert!(w.is_eof());

        assert_eq!(w.seek(-4, Whence::End).unwrap(), 20);
        assert!(!w.is_eof());
        assert_eq!(w.read(None).unwrap(), [28, 29, 30, 31]);
        assert_eq!(w.size(), Some(24));

        assert!(matches!(
            w.seek(-30, Whence::End),
            Err(ReadError::InvalidPosition(-6))
        ));
        assert_eq!(w.tell(), 24);
    }

    #[test]
    fn test_seek_clears_eof_on_invalid_target() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 30, None).unwrap();
        assert!(w.read(Some(4)).is_err());
        assert!(w.is_eof());
        assert!(w.seek(-1, Whence::Start).is_err());
        assert!(!w.is_eof());
    }

    #[test]
    fn test_unbounded_read_rest_past_parent_end() {
        let mut parent = source();
        let mut w = Window::at(&mut parent, 8, None).unwrap();
        assert_eq!(w.seek(40, Whence::Start).unwrap(), 40);
        assert_eq!(w.read(None).unwrap(), Vec::<u8>::new());
        assert_eq!(w.read(Some(0)).unwrap(), Vec::<u8>::new());
        assert!(!w.is_eof());
    }

    #[test]
    fn test_nested_read_exact_latches_inner_window() {
        let mut parent = source();
        let mut outer = Window::at(&mut parent, 8, Some(4)).unwrap();
        let mut inner = Window::new(&mut outer, None);
        assert!(matches!(inner.read_u64_le(), Err(ReadError::EndOfStream)));
        assert!(inner.is_eof());
        assert_eq!(inner.tell(), 0);
        inner.seek(0, Whence::Start).unwrap();
        assert_eq!(inner.read_u32_le().unwrap(), 0x0b0a0908);
    }

    #[test]
    fn test_nested_windows() {
        let mut parent = source();
        let mut outer = Window::at(&mut parent, 8, Some(16)).unwrap();
        outer.skip(4).unwrap();
        let mut inner = Window::new(&mut outer, None);
        assert_eq!(inner.start(), 4);
        assert_eq!(inner.size(), Some(12));
        // inner is unbounded but its parent clamps
        assert_eq!(inner.read(Some(100)).unwrap(), (12..24).collect::<Vec<u8>>());

        inner.seek(0, Whence::Start).unwrap();
        let mut innermost = Window::new(&mut inner, Some(2));
        assert_eq!(innermost.read(None).unwrap(), [12, 13]);
    }

    #[test]
    fn test_contract_through_windows() {
        let mut parent = DataReader::new((0..=255).collect::<Vec<u8>>());
        contract::check_seek_tell(&mut Window::at(&mut parent, 0, None).unwrap());

        let mut parent = DataReader::new((0..=255).collect::<Vec<u8>>());
        contract::check_int_reads(&mut Window::at(&mut parent, 0, Some(256)).unwrap());

        let mut padded = vec![0xaa; 4];
        padded.extend(0..16u8);
        let mut parent = DataReader::new(padded);
        let mut w = Window::at(&mut parent, 4, None).unwrap();
        contract::check_read_rest(&mut w);
    }
}
