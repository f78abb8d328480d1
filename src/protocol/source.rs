use std::io::{self, Read};

use crate::error::DecodeError;

/// Blocking supplier of raw sensor bytes.
///
/// `read_byte` blocks until a byte is available. An `Err` means the
/// connection is gone (or the read was cancelled) and ends the current
/// decode call.
pub trait ByteSource {
    fn read_byte(&mut self) -> Result<u8, DecodeError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        (**self).read_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        (**self).read_byte()
    }
}

/// Byte source over any iterator; exhaustion reads as a closed connection.
pub struct IterSource<I> {
    bytes: I,
    consumed: usize,
}

impl<I: Iterator<Item = u8>> IterSource<I> {
    pub fn new(bytes: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            bytes: bytes.into_iter(),
            consumed: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl<I: Iterator<Item = u8>> ByteSource for IterSource<I> {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self
            .bytes
            .next()
            .ok_or_else(|| DecodeError::closed("byte stream exhausted"))?;
        self.consumed += 1;
        Ok(byte)
    }
}

pub fn bytes(data: &[u8]) -> IterSource<std::iter::Copied<std::slice::Iter<'_, u8>>> {
    IterSource::new(data.iter().copied())
}

/// Byte source over a reader such as a capture file.
pub struct ReadSource<R> {
    reader: R,
    buf: [u8; 256],
    pos: usize,
    len: usize,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: [0; 256],
            pos: 0,
            len: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        while self.pos >= self.len {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Err(DecodeError::closed("reader reached end of stream")),
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(DecodeError::ConnectionClosed(err)),
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }
}
