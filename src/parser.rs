use std::iter::{Enumerate, Peekable};

use crate::{datatypes::Grib2SubmessageIndex, error::ParseError, reader::SectionInfo};

/// Groups validated sections into submessages, each made of the sections 0-8
/// that apply to one field. Items hold indices into the section list, which
/// is collected into `sect_cacher` when one is given.
pub(crate) struct Grib2SubmessageIndexStream<'cacher, I>
where
    I: Iterator,
{
    iter: Grib2SubmessageValidator<I>,
    sect_cacher: Option<&'cacher mut Vec<SectionInfo>>,
    sect0: usize,
    sect1: usize,
    sect2: Option<usize>,
    sect3: usize,
}

impl<'cacher, I> Grib2SubmessageIndexStream<'cacher, I>
where
    I: Iterator,
{
    pub(crate) fn new(iter: I) -> Self {
        Self {
            iter: Grib2SubmessageValidator::new(iter),
            sect_cacher: None,
            sect0: Default::default(),
            sect1: Default::default(),
            sect2: Default::default(),
            sect3: Default::default(),
        }
    }

    pub(crate) fn with_cacher(mut self, cacher: &'cacher mut Vec<SectionInfo>) -> Self {
        self.sect_cacher = Some(cacher);
        self
    }

    fn cache_sect(&mut self, sect: SectionInfo) {
        if let Some(cacher) = self.sect_cacher.as_mut() {
            cacher.push(sect);
        }
    }

    fn clear_message_cache(&mut self) {
        self.sect0 = Default::default();
        self.sect1 = Default::default();
        self.sect2 = Default::default();
        self.sect3 = Default::default();
    }
}

impl<I> Iterator for Grib2SubmessageIndexStream<'_, I>
where
    I: Iterator<Item = Result<SectionInfo, ParseError>>,
{
    type Item = Result<Grib2SubmessageIndex, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut sect4 = Default::default();
        let mut sect5 = Default::default();
        let mut sect6 = Default::default();
        loop {
            let item = match self.iter.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };
            let Validated {
                pos,
                message,
                submessage,
                sect,
            } = item;
            match sect.num {
                0 => self.sect0 = pos,
                1 => self.sect1 = pos,
                2 => self.sect2 = Some(pos),
                3 => self.sect3 = pos,
                4 => sect4 = pos,
                5 => sect5 = pos,
                6 => sect6 = pos,
                7 => {
                    self.cache_sect(sect);
                    let mut index = Grib2SubmessageIndex {
                        message_index: (message, submessage),
                        sect0: self.sect0,
                        sect1: self.sect1,
                        sect2: self.sect2,
                        sect3: self.sect3,
                        sect4,
                        sect5,
                        sect6,
                        sect7: pos,
                        sect8: None,
                    };
                    match self.iter.next_is_end() {
                        Some(Ok(end)) => {
                            index.sect8 = Some(end.pos);
                            self.cache_sect(end.sect);
                            self.clear_message_cache();
                        }
                        Some(Err(e)) => return Some(Err(e)),
                        None => {}
                    }
                    return Some(Ok(index));
                }
                _ => unreachable!(),
            }
            self.cache_sect(sect);
        }
    }
}

/// A section accepted by the validator together with its position in the
/// section list and the indices of the message and submessage it belongs to.
pub(crate) struct Validated {
    pub(crate) pos: usize,
    pub(crate) message: usize,
    pub(crate) submessage: usize,
    pub(crate) sect: SectionInfo,
}

/// Checks that sections come in the order
/// `0 1 (2* 3+ 4 5 6 7)+ 8`, where a submessage may restart at Section 2, 3
/// or 4 and Section 4 needs a Section 3 earlier in the message.
struct Grib2SubmessageValidator<I>
where
    I: Iterator,
{
    iter: Peekable<Enumerate<I>>,
    pos: usize,
    message_count: usize,
    submessage_count: usize,
    state: ValidatorState,
    has_sect3: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidatorState {
    StartOfMessage,
    StartOfSubmessage,
    EndOfSect(u8),
    EndOfStream,
}

impl<I> Grib2SubmessageValidator<I>
where
    I: Iterator,
{
    fn new(iter: I) -> Self {
        Self {
            iter: iter.enumerate().peekable(),
            pos: 0,
            message_count: 0,
            submessage_count: 0,
            state: ValidatorState::StartOfMessage,
            has_sect3: false,
        }
    }

    fn accept(&mut self, pos: usize, sect: SectionInfo) -> Option<Result<Validated, ParseError>> {
        self.pos = pos;
        if sect.num == 3 {
            self.has_sect3 = true;
        }
        self.state = ValidatorState::EndOfSect(sect.num);
        Some(Ok(Validated {
            pos,
            message: self.message_count,
            submessage: self.submessage_count,
            sect,
        }))
    }

    fn fail(&mut self, e: ParseError) -> Option<Result<Validated, ParseError>> {
        self.state = ValidatorState::EndOfStream;
        Some(Err(e))
    }
}

impl<I> Grib2SubmessageValidator<I>
where
    I: Iterator<Item = Result<SectionInfo, ParseError>>,
{
    fn expect(&mut self, allowed: &[u8]) -> Option<Result<Validated, ParseError>> {
        let at_start = self.state == ValidatorState::StartOfMessage;
        match self.iter.next() {
            Some((pos, Ok(sect))) => {
                if sect.num == 4 && !self.has_sect3 {
                    return self.fail(ParseError::NoGridDefinition(pos));
                }
                if allowed.contains(&sect.num) {
                    self.accept(pos, sect)
                } else {
                    self.fail(ParseError::InvalidSectionOrder(pos))
                }
            }
            Some((_, Err(e))) => self.fail(e),
            // a stream may end between messages
            None if at_start => {
                self.state = ValidatorState::EndOfStream;
                None
            }
            None => self.fail(ParseError::UnexpectedEndOfData(self.pos)),
        }
    }

    /// Called after Section 7. Consumes Section 8 if it follows, or prepares
    /// for the next submessage of the same message otherwise.
    fn next_is_end(&mut self) -> Option<Result<Validated, ParseError>> {
        match self.iter.peek() {
            Some((_, Ok(SectionInfo { num: 8, .. }))) => {
                let (pos, sect) = match self.iter.next() {
                    Some((pos, Ok(sect))) => (pos, sect),
                    _ => return self.fail(ParseError::UnexpectedEndOfData(self.pos)),
                };
                let ret = self.accept(pos, sect);
                self.message_count += 1;
                self.submessage_count = 0;
                self.has_sect3 = false;
                self.state = ValidatorState::StartOfMessage;
                ret
            }
            Some((_, Ok(_))) => {
                self.submessage_count += 1;
                self.state = ValidatorState::StartOfSubmessage;
                None
            }
            Some((_, Err(_))) => match self.iter.next() {
                Some((_, Err(e))) => self.fail(e),
                _ => self.fail(ParseError::UnexpectedEndOfData(self.pos)),
            },
            None => self.fail(ParseError::UnexpectedEndOfData(self.pos)),
        }
    }
}

impl<I> Iterator for Grib2SubmessageValidator<I>
where
    I: Iterator<Item = Result<SectionInfo, ParseError>>,
{
    type Item = Result<Validated, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ValidatorState::EndOfStream => None,
            ValidatorState::StartOfMessage => self.expect(&[0]),
            ValidatorState::EndOfSect(0) => self.expect(&[1]),
            ValidatorState::EndOfSect(1) | ValidatorState::StartOfSubmessage => {
                self.expect(&[2, 3, 4])
            }
            ValidatorState::EndOfSect(2) => self.expect(&[2, 3]),
            ValidatorState::EndOfSect(3) => self.expect(&[3, 4]),
            ValidatorState::EndOfSect(n @ 4..=6) => self.expect(&[n + 1]),
            ValidatorState::EndOfSect(_) => self.fail(ParseError::InvalidSectionOrder(self.pos)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_sect_vec_with_dummy_offset(nums: Vec<u8>) -> Vec<Result<SectionInfo, ParseError>> {
        nums.iter()
            .enumerate()
            .map(|(index, num)| {
                Ok(SectionInfo {
                    num: *num,
                    offset: index,
                    ..Default::default()
                })
            })
            .collect()
    }

    type SubmessageDigest = (
        (usize, usize),
        usize,
        usize,
        Option<usize>,
        usize,
        usize,
        usize,
        usize,
        usize,
        Option<usize>,
    );

    fn digest(index: Grib2SubmessageIndex) -> SubmessageDigest {
        (
            index.message_index,
            index.sect0,
            index.sect1,
            index.sect2,
            index.sect3,
            index.sect4,
            index.sect5,
            index.sect6,
            index.sect7,
            index.sect8,
        )
    }

    fn parse(nums: Vec<u8>) -> Vec<Result<SubmessageDigest, ParseError>> {
        let sects = new_sect_vec_with_dummy_offset(nums);
        Grib2SubmessageIndexStream::new(sects.into_iter())
            .map(|result| result.map(digest))
            .collect()
    }

    macro_rules! test_submessage_index_stream {
        ($(($name:ident, $input:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!(parse($input), $expected);
            }
        )*);
    }

    test_submessage_index_stream! {
        (
            single_message,
            vec![0, 1, 2, 3, 4, 5, 6, 7, 8],
            vec![Ok(((0, 0), 0, 1, Some(2), 3, 4, 5, 6, 7, Some(8)))]
        ),
        (
            multiple_messages_without_sect2,
            vec![0, 1, 3, 4, 5, 6, 7, 8, 0, 1, 3, 4, 5, 6, 7, 8],
            vec![
                Ok(((0, 0), 0, 1, None, 2, 3, 4, 5, 6, Some(7))),
                Ok(((1, 0), 8, 9, None, 10, 11, 12, 13, 14, Some(15))),
            ]
        ),
        (
            submessages_from_sect2,
            vec![0, 1, 3, 4, 5, 6, 7, 2, 3, 4, 5, 6, 7, 8],
            vec![
                Ok(((0, 0), 0, 1, None, 2, 3, 4, 5, 6, None)),
                Ok(((0, 1), 0, 1, Some(7), 8, 9, 10, 11, 12, Some(13))),
            ]
        ),
        (
            submessages_from_sect3,
            vec![0, 1, 2, 3, 4, 5, 6, 7, 3, 4, 5, 6, 7, 8],
            vec![
                Ok(((0, 0), 0, 1, Some(2), 3, 4, 5, 6, 7, None)),
                Ok(((0, 1), 0, 1, Some(2), 8, 9, 10, 11, 12, Some(13))),
            ]
        ),
        (
            submessages_from_sect4,
            vec![0, 1, 2, 3, 4, 5, 6, 7, 4, 5, 6, 7, 8],
            vec![
                Ok(((0, 0), 0, 1, Some(2), 3, 4, 5, 6, 7, None)),
                Ok(((0, 1), 0, 1, Some(2), 3, 8, 9, 10, 11, Some(12))),
            ]
        ),
        (
            repeated_grid_definitions,
            vec![0, 1, 3, 3, 4, 5, 6, 7, 8],
            vec![Ok(((0, 0), 0, 1, None, 3, 4, 5, 6, 7, Some(8)))]
        ),
        (
            empty_stream,
            vec![],
            vec![]
        ),
        (
            no_grid_definition,
            vec![0, 1, 4, 5, 6, 7, 8],
            vec![Err(ParseError::NoGridDefinition(2))]
        ),
        (
            no_grid_definition_after_sect2,
            vec![0, 1, 2, 4, 5, 6, 7, 8],
            vec![Err(ParseError::NoGridDefinition(3))]
        ),
        (
            wrong_order,
            vec![0, 1, 3, 5, 4, 6, 7, 8],
            vec![Err(ParseError::InvalidSectionOrder(3))]
        ),
        (
            not_starting_with_sect0,
            vec![1, 3, 4, 5, 6, 7, 8],
            vec![Err(ParseError::InvalidSectionOrder(0))]
        ),
        (
            unexpected_end,
            vec![0, 1, 3, 4, 5],
            vec![Err(ParseError::UnexpectedEndOfData(4))]
        ),
        (
            unexpected_end_after_sect7,
            vec![0, 1, 3, 4, 5, 6, 7],
            vec![Err(ParseError::UnexpectedEndOfData(6))]
        ),
    }

    #[test]
    fn sections_are_cached_in_order() {
        let sects = new_sect_vec_with_dummy_offset(vec![0, 1, 3, 4, 5, 6, 7, 4, 5, 6, 7, 8]);
        let mut cacher = Vec::new();
        let stream = Grib2SubmessageIndexStream::new(sects.into_iter()).with_cacher(&mut cacher);
        assert_eq!(stream.count(), 2);
        let offsets = cacher.iter().map(|s| s.offset).collect::<Vec<_>>();
        assert_eq!(offsets, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn error_from_section_stream_is_passed_through() {
        let mut sects = new_sect_vec_with_dummy_offset(vec![0, 1, 3]);
        sects.push(Err(ParseError::EndSectionMismatch));
        let actual = Grib2SubmessageIndexStream::new(sects.into_iter()).collect::<Vec<_>>();
        assert_eq!(actual.len(), 1);
        assert!(matches!(actual[0], Err(ParseError::EndSectionMismatch)));
    }
}
