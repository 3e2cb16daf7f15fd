use std::io::{self, Read, Seek, SeekFrom};

use crate::{datatypes::*, error::*, helpers::read_as, template::TemplateInfo};

/// Location and content of one section found in a GRIB2 stream.
///
/// `offset` is the byte offset of the section from the beginning of the
/// stream. Section 7 is never read while scanning, so its `body` only marks
/// its presence.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SectionInfo {
    pub num: u8,
    pub offset: usize,
    pub size: usize,
    pub body: Option<SectionBody>,
}

impl SectionInfo {
    pub fn template_info(&self) -> Option<TemplateInfo> {
        let num = self.body.as_ref()?.template_num()?;
        Some(TemplateInfo(self.num, num))
    }

    pub(crate) fn new_8(offset: usize) -> Self {
        Self {
            num: 8,
            offset,
            size: SECT8_ES_SIZE,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Section0(Indicator),
    Section1(Identification),
    Section2(LocalUse),
    Section3(GridDefinition),
    Section4(ProdDefinition),
    Section5(ReprDefinition),
    /// Only the indicator is kept; the bit-map itself is read on decoding.
    Section6 {
        bitmap_indicator: u8,
    },
    Section7,
}

impl SectionBody {
    fn template_num(&self) -> Option<u16> {
        match self {
            Self::Section3(s) => Some(s.template_num),
            Self::Section4(s) => Some(s.template_num),
            Self::Section5(s) => Some(s.template_num),
            _ => None,
        }
    }
}

pub trait Grib2Read: Read + Seek {
    /// Reads Section 0 at the current position. `Ok(None)` means the stream
    /// ended cleanly before it.
    fn read_sect0(&mut self) -> Result<Option<Indicator>, ParseError> {
        let mut buf = [0; SECT0_IS_SIZE];
        let nread = read_up_to(self, &mut buf)?;
        if nread == 0 {
            return Ok(None);
        }
        if nread < SECT0_IS_SIZE {
            return Err(ParseError::UnexpectedEndOfData(nread));
        }
        Ok(Some(Indicator::from_slice(&buf)?))
    }

    fn read_sect8(&mut self) -> Result<(), ParseError> {
        let mut buf = [0; SECT8_ES_SIZE];
        self.read_exact(&mut buf[..])?;
        if buf[..] != SECT8_ES_MAGIC[..] {
            return Err(ParseError::EndSectionMismatch);
        }
        Ok(())
    }

    /// Reads the common header of sections 1-7 and returns the section number
    /// and size.
    fn read_sect_header(&mut self) -> Result<(u8, usize), ParseError> {
        let mut buf = [0; SECT_HEADER_SIZE];
        self.read_exact(&mut buf[..])?;
        let size = read_as!(u32, buf, 0) as usize;
        if size < SECT_HEADER_SIZE {
            return Err(ParseError::SectionSizeTooSmall(size));
        }
        Ok((buf[4], size))
    }

    /// Reads the rest of a section whose header has just been read.
    fn read_sect_body(&mut self, num: u8, size: usize) -> Result<SectionBody, ParseError> {
        let body_size = size - SECT_HEADER_SIZE;
        if num == 7 {
            self.seek(SeekFrom::Current(body_size as i64))?;
            return Ok(SectionBody::Section7);
        }

        let mut buf = vec![0; body_size];
        self.read_exact(&mut buf[..])?;
        let body = match num {
            1 => SectionBody::Section1(Identification::from_body(&buf)?),
            2 => SectionBody::Section2(LocalUse::new(&buf)),
            3 => SectionBody::Section3(GridDefinition::from_body(&buf)?),
            4 => SectionBody::Section4(ProdDefinition::from_body(&buf)?),
            5 => SectionBody::Section5(ReprDefinition::from_body(&buf)?),
            6 => SectionBody::Section6 {
                bitmap_indicator: *buf
                    .first()
                    .ok_or(ParseError::SectionSizeTooSmall(size))?,
            },
            _ => return Err(ParseError::UnknownSectionNumber(num)),
        };
        Ok(body)
    }

    /// Reads the body (everything after the 5-octet header) of `sect`.
    fn read_body_bytes(&mut self, sect: &SectionInfo) -> Result<Vec<u8>, ParseError> {
        let body_size = sect.size.saturating_sub(SECT_HEADER_SIZE);
        let mut buf = Vec::new();
        buf.try_reserve_exact(body_size)
            .map_err(|_| ParseError::ReadError(format!("cannot allocate {body_size} octets")))?;
        buf.resize(body_size, 0);
        self.seek(SeekFrom::Start((sect.offset + SECT_HEADER_SIZE) as u64))?;
        self.read_exact(&mut buf[..])?;
        Ok(buf)
    }
}

/// Reads as many bytes as available up to the length of `buf`.
pub(crate) fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut nread = 0;
    while nread < buf.len() {
        match reader.read(&mut buf[nread..]) {
            Ok(0) => break,
            Ok(n) => nread += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(nread)
}

pub struct SeekableGrib2Reader<R> {
    reader: R,
}

impl<R> SeekableGrib2Reader<R> {
    pub fn new(r: R) -> Self {
        Self { reader: r }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Read for SeekableGrib2Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.reader.read_exact(buf)
    }
}

impl<S: Seek> Seek for SeekableGrib2Reader<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }
}

impl<R: Read + Seek> Grib2Read for SeekableGrib2Reader<R> {}

/// An iterator over the sections of one or more GRIB2 messages stored back to
/// back.
///
/// Iteration stops after the first error. The total length in Section 0 is
/// checked against the sizes of the sections actually found.
pub struct Grib2SectionStream<R> {
    reader: R,
    whole_size: usize,
    rest_size: usize,
    message_offset: usize,
    finished: bool,
}

impl<R> Grib2SectionStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            whole_size: 0,
            rest_size: 0,
            message_offset: 0,
            finished: false,
        }
    }

    pub fn into_reader(self) -> R {
        self.reader
    }

    fn offset(&self) -> usize {
        self.message_offset + self.whole_size - self.rest_size
    }
}

impl<R: Grib2Read> Grib2SectionStream<R> {
    fn next_sect0(&mut self) -> Result<Option<SectionInfo>, ParseError> {
        self.message_offset += self.whole_size;
        let Some(indicator) = self.reader.read_sect0()? else {
            return Ok(None);
        };
        let whole_size = usize::try_from(indicator.total_length).map_err(|_| {
            ParseError::LengthMismatch {
                declared: indicator.total_length,
                actual: 0,
            }
        })?;
        if whole_size < SECT0_IS_SIZE + SECT8_ES_SIZE {
            return Err(ParseError::LengthMismatch {
                declared: indicator.total_length,
                actual: (SECT0_IS_SIZE + SECT8_ES_SIZE) as u64,
            });
        }
        self.whole_size = whole_size;
        self.rest_size = whole_size - SECT0_IS_SIZE;
        Ok(Some(SectionInfo {
            num: 0,
            offset: self.message_offset,
            size: SECT0_IS_SIZE,
            body: Some(SectionBody::Section0(indicator)),
        }))
    }

    fn next_sect(&mut self) -> Result<SectionInfo, ParseError> {
        let offset = self.offset();
        if self.rest_size == SECT8_ES_SIZE {
            self.reader.read_sect8()?;
            self.rest_size = 0;
            return Ok(SectionInfo::new_8(offset));
        }

        let (num, size) = self.reader.read_sect_header()?;
        if size + SECT8_ES_SIZE > self.rest_size {
            return Err(ParseError::LengthMismatch {
                declared: self.whole_size as u64,
                actual: (self.whole_size - self.rest_size + size + SECT8_ES_SIZE) as u64,
            });
        }
        let body = self.reader.read_sect_body(num, size)?;
        self.rest_size -= size;
        Ok(SectionInfo {
            num,
            offset,
            size,
            body: Some(body),
        })
    }
}

impl<R: Grib2Read> Iterator for Grib2SectionStream<R> {
    type Item = Result<SectionInfo, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = if self.rest_size == 0 {
            self.next_sect0().transpose()?
        } else {
            self.next_sect()
        };
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample_message() -> Vec<u8> {
        let mut buf = Vec::new();
        let mut sect0 = Indicator::new(0);
        sect0.total_length = 16 + 21 + 5 + 4;
        sect0.pack(&mut buf).unwrap();
        Identification::from_list(&[34, 0, 5, 1, 0, 2016, 8, 22, 2, 0, 0, 0, 2])
            .unwrap()
            .pack(&mut buf)
            .unwrap();
        LocalUse::new(&[]).pack(&mut buf).unwrap();
        EndSection.pack(&mut buf);
        buf
    }

    fn scan(bytes: Vec<u8>) -> Vec<Result<(u8, usize, usize), ParseError>> {
        let reader = SeekableGrib2Reader::new(Cursor::new(bytes));
        Grib2SectionStream::new(reader)
            .map(|r| r.map(|s| (s.num, s.offset, s.size)))
            .collect()
    }

    #[test]
    fn scan_sections_of_two_messages() {
        let mut bytes = sample_message();
        bytes.extend(sample_message());
        assert_eq!(
            scan(bytes),
            vec![
                Ok((0, 0, 16)),
                Ok((1, 16, 21)),
                Ok((2, 37, 5)),
                Ok((8, 42, 4)),
                Ok((0, 46, 16)),
                Ok((1, 62, 21)),
                Ok((2, 83, 5)),
                Ok((8, 88, 4)),
            ]
        );
    }

    #[test]
    fn scan_empty_stream() {
        assert_eq!(scan(Vec::new()), Vec::new());
    }

    #[test]
    fn scan_stops_at_wrong_total_length() {
        let mut bytes = sample_message();
        bytes[15] -= 1;
        let result = scan(bytes);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result[2],
            Err(ParseError::LengthMismatch {
                declared: 45,
                actual: 46
            })
        );
    }

    #[test]
    fn scan_stops_at_broken_end_section() {
        let mut bytes = sample_message();
        let len = bytes.len();
        bytes[len - 1] = b'6';
        let result = scan(bytes);
        assert_eq!(result.last(), Some(&Err(ParseError::EndSectionMismatch)));
    }

    #[test]
    fn scan_truncated_indicator() {
        assert_eq!(
            scan(b"GRIB\0\0".to_vec()),
            vec![Err(ParseError::UnexpectedEndOfData(6))]
        );
    }
}
