//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of email-parse.
//
// email-parse is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// email-parse is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// email-parse. If not, see <http://www.gnu.org/licenses/>.

use std::io::{self, Read};

/// Wraps a reader and counts the bytes that pass through it.
#[derive(Debug, Clone)]
pub struct CountingReader<R> {
    reader: R,
    count: u64,
}

impl<R> CountingReader<R> {
    pub fn new(reader: R) -> Self {
        CountingReader { reader, count: 0 }
    }

    /// The number of bytes consumed from the inner reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(dst)?;
        self.count += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn counts_read_to_end() {
        let mut reader = CountingReader::new(Cursor::new(vec![42u8; 10_000]));
        let mut dst = Vec::new();
        reader.read_to_end(&mut dst).unwrap();
        assert_eq!(10_000, dst.len());
        assert_eq!(10_000, reader.bytes_read());
    }

    #[test]
    fn errors_pass_through() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken"))
            }
        }

        let mut reader = CountingReader::new(Broken);
        let mut dst = Vec::new();
        assert!(reader.read_to_end(&mut dst).is_err());
        assert_eq!(0, reader.bytes_read());
    }
}
