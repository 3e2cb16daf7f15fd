//! Finding GRIB messages in a stream that may contain other data.
//!
//! Both GRIB edition 1 and edition 2 messages are located, although only
//! edition 2 messages can be read by the rest of this crate.

use std::io::{self, Read, Seek, SeekFrom};

use crate::{
    datatypes::{SECT0_IS_MAGIC, SECT8_ES_MAGIC},
    error::ParseError,
    reader::read_up_to,
};

/// Octets needed after `GRIB` to read the edition and the length of any
/// edition.
const HEADER_SIZE: usize = 16;
const EDITION1_IS_SIZE: usize = 8;

/// Where a confirmed message lies in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageLocation {
    /// Byte offset of `GRIB` from the beginning of the stream.
    pub offset: u64,
    /// Total length of the message in octets.
    pub length: u64,
}

impl MessageLocation {
    /// Offset just past the end of the message.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Searches `reader` for the first GRIB message starting at or after byte
/// offset `start`, reading `chunk_len` octets at a time.
///
/// A message is confirmed only when `7777` is found where its declared
/// length says it ends. Returns `Ok(None)` when the stream ends without a
/// confirmed message.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
///
/// use grib_codec::locator::{MessageLocation, seek_message};
///
/// let mut data = b"garbage".to_vec();
/// data.extend(b"GRIB\0\0\0\x02");
/// data.extend(20_u64.to_be_bytes());
/// data.extend(b"7777");
///
/// let mut reader = Cursor::new(data);
/// assert_eq!(
///     seek_message(&mut reader, 0, 32).unwrap(),
///     Some(MessageLocation { offset: 7, length: 20 })
/// );
/// assert_eq!(seek_message(&mut reader, 8, 32).unwrap(), None);
/// ```
pub fn seek_message<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    chunk_len: usize,
) -> Result<Option<MessageLocation>, ParseError> {
    let chunk_len = chunk_len.max(HEADER_SIZE);
    let mut buf = vec![0; chunk_len];
    let mut pos = start;

    loop {
        reader.seek(SeekFrom::Start(pos))?;
        let nread = read_up_to(reader, &mut buf)?;
        let lim = nread.saturating_sub(SECT8_ES_MAGIC.len() + 4);

        for k in 0..lim {
            if &buf[k..k + SECT0_IS_MAGIC.len()] != SECT0_IS_MAGIC {
                continue;
            }
            let offset = pos + k as u64;
            if let Some(length) = confirm_message(reader, offset)? {
                log::debug!("found message of {length} octets at {offset}");
                return Ok(Some(MessageLocation { offset, length }));
            }
        }

        if nread < chunk_len {
            return Ok(None);
        }
        pos += lim as u64;
    }
}

/// Reads the header of a candidate message at `offset` and checks its end
/// marker.
fn confirm_message<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Option<u64>, ParseError> {
    let mut header = [0; HEADER_SIZE];
    reader.seek(SeekFrom::Start(offset))?;
    if read_up_to(reader, &mut header)? < header.len() {
        return Ok(None);
    }
    let (length, min_length) = match header[7] {
        1 => (
            u64::from_be_bytes([0, 0, 0, 0, 0, header[4], header[5], header[6]]),
            EDITION1_IS_SIZE,
        ),
        2 => (
            u64::from_be_bytes([
                header[8], header[9], header[10], header[11], header[12], header[13], header[14],
                header[15],
            ]),
            HEADER_SIZE,
        ),
        _ => return Ok(None),
    };
    if length < (min_length + SECT8_ES_MAGIC.len()) as u64 {
        return Ok(None);
    }

    let Some(end_offset) = offset.checked_add(length - SECT8_ES_MAGIC.len() as u64) else {
        return Ok(None);
    };
    let mut end = [0; 4];
    reader.seek(SeekFrom::Start(end_offset))?;
    match reader.read_exact(&mut end) {
        Ok(()) if end[..] == SECT8_ES_MAGIC[..] => Ok(Some(length)),
        Ok(()) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// An iterator over all messages found in a stream.
///
/// Scanning resumes just past the end of each message found. Iteration ends
/// after the last message or after the first error.
pub struct MessageLocations<R> {
    reader: R,
    pos: u64,
    chunk_len: usize,
    finished: bool,
}

impl<R> MessageLocations<R> {
    pub fn new(reader: R, chunk_len: usize) -> Self {
        Self {
            reader,
            pos: 0,
            chunk_len,
            finished: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> Iterator for MessageLocations<R> {
    type Item = Result<MessageLocation, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match seek_message(&mut self.reader, self.pos, self.chunk_len) {
            Ok(Some(location)) => {
                self.pos = location.end();
                Some(Ok(location))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn message(edition: u8, body_len: usize) -> Vec<u8> {
        let mut buf = b"GRIB".to_vec();
        match edition {
            1 => {
                let len = (8 + body_len + 4) as u32;
                buf.extend(&len.to_be_bytes()[1..]);
                buf.push(1);
            }
            _ => {
                let len = (16 + body_len + 4) as u64;
                buf.extend([0, 0, 0, 2]);
                buf.extend(len.to_be_bytes());
            }
        }
        buf.extend(vec![0xaa; body_len]);
        buf.extend(b"7777");
        buf
    }

    fn locate_all(data: Vec<u8>, chunk_len: usize) -> Vec<MessageLocation> {
        MessageLocations::new(Cursor::new(data), chunk_len)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    macro_rules! test_locations {
        ($(($name:ident, $chunk_len:expr),)*) => ($(
            #[test]
            fn $name() {
                let mut data = vec![0x55; 37];
                data.extend(message(2, 10));
                data.extend(b"GRIB but not a message");
                data.extend(message(1, 20));
                data.extend(vec![0x55; 5]);
                data.extend(message(2, 100));

                assert_eq!(
                    locate_all(data, $chunk_len),
                    vec![
                        MessageLocation { offset: 37, length: 30 },
                        MessageLocation { offset: 89, length: 32 },
                        MessageLocation { offset: 126, length: 120 },
                    ]
                );
            }
        )*);
    }

    test_locations! {
        (locate_with_tiny_chunks, 1),
        (locate_with_chunks_smaller_than_messages, 24),
        (locate_with_chunks_of_odd_size, 33),
        (locate_with_large_chunks, 4096),
    }

    #[test]
    fn start_past_a_message() {
        let mut data = vec![0; 10];
        data.extend(message(2, 0));
        let mut reader = Cursor::new(data);
        assert_eq!(
            seek_message(&mut reader, 0, 64).unwrap(),
            Some(MessageLocation {
                offset: 10,
                length: 20
            })
        );
        assert_eq!(seek_message(&mut reader, 11, 64).unwrap(), None);
    }

    #[test]
    fn end_marker_past_end_of_stream() {
        let mut data = message(2, 50);
        data.truncate(40);
        assert_eq!(locate_all(data, 16), Vec::new());
    }

    #[test]
    fn empty_stream() {
        assert_eq!(locate_all(Vec::new(), 16), Vec::new());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device error"))
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn io_error_is_reported() {
        let mut iter = MessageLocations::new(FailingReader, 16);
        assert_eq!(
            iter.next(),
            Some(Err(ParseError::ReadError("device error".to_owned())))
        );
        assert_eq!(iter.next(), None);
    }
}
