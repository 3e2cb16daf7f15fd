use std::{
    cell::RefCell,
    collections::HashSet,
    io::{Cursor, Read, Seek},
};

use crate::{
    config::CodecConfig,
    datatypes::*,
    decoder::{self, expand_with_bitmap},
    error::*,
    parser::Grib2SubmessageIndexStream,
    reader::{Grib2Read, Grib2SectionStream, SectionBody, SectionInfo, SeekableGrib2Reader},
    template::TemplateInfo,
};

/// Reads a [`Grib2`] instance from an I/O stream of GRIB2.
///
/// The stream must start with a message; use [`crate::locator`] to skip
/// leading garbage.
pub fn from_reader<SR: Read + Seek>(
    reader: SR,
) -> Result<Grib2<SeekableGrib2Reader<SR>>, GribError> {
    Grib2::read(SeekableGrib2Reader::new(reader))
}

/// Reads a [`Grib2`] instance from bytes of GRIB2.
///
/// # Examples
///
/// ```
/// use grib_codec::{
///     BitmapSpec, CodecConfig, GridDefinition, Identification, Indicator, MessageBuilder,
///     ProdDefinition,
/// };
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = CodecConfig::default();
///     let ident = Identification::from_list(&[0, 0, 0, 0, 0, 2021, 9, 22, 0, 0, 0, 0, 0])?;
///     let prod = ProdDefinition::new(0, vec![0, 0, 2, 0, 96, 0, 0, 1, 0, 1, 0, 2, 255, 0, 0]);
///     let mut builder = MessageBuilder::new();
///     builder.create(&Indicator::new(0), &ident)?;
///     builder.add_grid(&GridDefinition::new(3, 65535, Vec::new()))?;
///     builder.add_field(&prod, 0, &[0; 5], &[1.0, 2.0, 3.0], &BitmapSpec::None, &config)?;
///     let bytes = builder.end()?;
///
///     let grib2 = grib_codec::from_slice(&bytes)?;
///     let (_, submessage) = grib2.iter().next().ok_or("no field")?;
///     assert_eq!(submessage.decode(&config)?.values(), &[1.0, 2.0, 3.0]);
///     Ok(())
/// }
/// ```
pub fn from_slice(bytes: &[u8]) -> Result<Grib2<SeekableGrib2Reader<Cursor<&[u8]>>>, GribError> {
    Grib2::read(SeekableGrib2Reader::new(Cursor::new(bytes)))
}

/// Sections of the GRIB2 messages in a stream, grouped into submessages.
pub struct Grib2<R> {
    reader: RefCell<R>,
    sections: Box<[SectionInfo]>,
    submessages: Vec<Grib2SubmessageIndex>,
}

impl<R> Grib2<R> {
    /// Returns the number of submessages in the data.
    pub fn len(&self) -> usize {
        self.submessages.len()
    }

    /// Returns `true` if `self` has zero submessages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over submessages in the data.
    #[inline]
    pub fn iter(&self) -> SubmessageIterator<'_, R> {
        self.into_iter()
    }

    /// Returns an iterator over submessages in the data.
    ///
    /// This is an alias to [`Grib2::iter()`].
    pub fn submessages(&self) -> SubmessageIterator<'_, R> {
        self.into_iter()
    }

    /// Returns an iterator over sections in the data.
    pub fn sections(&self) -> std::slice::Iter<'_, SectionInfo> {
        self.sections.iter()
    }

    /// Lists the distinct templates used in the data.
    pub fn list_templates(&self) -> Vec<TemplateInfo> {
        get_templates(&self.sections)
    }

    /// Summarizes each message in the data.
    pub fn info(&self) -> Vec<MessageInfo> {
        let mut messages: Vec<MessageInfo> = Vec::new();
        for sect in self.sections.iter() {
            match (&sect.body, messages.last_mut()) {
                (Some(SectionBody::Section0(indicator)), _) => messages.push(MessageInfo {
                    offset: sect.offset,
                    length: indicator.total_length,
                    discipline: indicator.discipline,
                    ..Default::default()
                }),
                (Some(SectionBody::Section1(ident)), Some(info)) => {
                    info.identification = ident.clone()
                }
                (Some(SectionBody::Section2(_)), Some(info)) => info.num_local_use += 1,
                (Some(SectionBody::Section7), Some(info)) => info.num_fields += 1,
                _ => {}
            }
        }
        messages
    }
}

impl<R: Grib2Read> Grib2<R> {
    pub fn read(r: R) -> Result<Self, GribError> {
        let mut sect_stream = Grib2SectionStream::new(r);
        let mut cacher = Vec::new();
        let parser = Grib2SubmessageIndexStream::new(sect_stream.by_ref()).with_cacher(&mut cacher);
        let submessages = parser.collect::<Result<Vec<_>, _>>()?;
        if submessages.is_empty() {
            log::warn!("no submessage found");
        }
        Ok(Self {
            reader: RefCell::new(sect_stream.into_reader()),
            sections: cacher.into_boxed_slice(),
            submessages,
        })
    }
}

impl<'a, R: 'a> IntoIterator for &'a Grib2<R> {
    type Item = (MessageIndex, SubMessage<'a, R>);
    type IntoIter = SubmessageIterator<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter::new(self)
    }
}

fn get_templates(sects: &[SectionInfo]) -> Vec<TemplateInfo> {
    let uniq: HashSet<_> = sects.iter().filter_map(|s| s.template_info()).collect();
    let mut vec: Vec<_> = uniq.into_iter().collect();
    vec.sort_unstable();
    vec
}

/// Summary of one message, as returned by [`Grib2::info`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    /// Byte offset of the message in the stream
    pub offset: usize,
    /// Total length of the message in octets
    pub length: u64,
    pub discipline: u8,
    pub identification: Identification,
    /// Number of Local Use Sections
    pub num_local_use: usize,
    /// Number of fields, i.e. Data Sections
    pub num_fields: usize,
}

/// An iterator over submessages in the GRIB data.
///
/// This `struct` is created by the [`iter`] method on [`Grib2`]. See its
/// documentation for more.
///
/// [`iter`]: Grib2::iter
#[derive(Clone)]
pub struct SubmessageIterator<'a, R> {
    context: &'a Grib2<R>,
    pos: usize,
}

impl<'a, R> SubmessageIterator<'a, R> {
    fn new(context: &'a Grib2<R>) -> Self {
        Self { context, pos: 0 }
    }
}

impl<'a, R> Iterator for SubmessageIterator<'a, R> {
    type Item = (MessageIndex, SubMessage<'a, R>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.context.submessages.get(self.pos)?;
        self.pos += 1;
        let submessage = SubMessage::new(self.context, index)?;
        Some((index.message_index, submessage))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.context.submessages.len().saturating_sub(self.pos);
        (size, Some(size))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.pos = self.pos.saturating_add(n);
        self.next()
    }
}

/// The sections that apply to one field.
pub struct SubMessage<'a, R> {
    context: &'a Grib2<R>,
    sect0_pos: usize,
    sect6_pos: usize,
    indicator: &'a Indicator,
    identification: &'a Identification,
    local_use: Option<&'a LocalUse>,
    grid_def: &'a GridDefinition,
    prod_def: &'a ProdDefinition,
    repr_def: &'a ReprDefinition,
    bitmap_indicator: u8,
    sect7: &'a SectionInfo,
}

impl<'a, R> SubMessage<'a, R> {
    fn new(context: &'a Grib2<R>, index: &Grib2SubmessageIndex) -> Option<Self> {
        let body = |pos: usize| context.sections.get(pos)?.body.as_ref();
        macro_rules! section {
            ($pos:expr, $variant:ident) => {
                match body($pos)? {
                    SectionBody::$variant(s) => s,
                    _ => return None,
                }
            };
        }

        let local_use = match index.sect2 {
            Some(pos) => Some(section!(pos, Section2)),
            None => None,
        };
        let bitmap_indicator = match body(index.sect6)? {
            SectionBody::Section6 { bitmap_indicator } => *bitmap_indicator,
            _ => return None,
        };
        Some(Self {
            context,
            sect0_pos: index.sect0,
            sect6_pos: index.sect6,
            indicator: section!(index.sect0, Section0),
            identification: section!(index.sect1, Section1),
            local_use,
            grid_def: section!(index.sect3, Section3),
            prod_def: section!(index.sect4, Section4),
            repr_def: section!(index.sect5, Section5),
            bitmap_indicator,
            sect7: context.sections.get(index.sect7)?,
        })
    }

    pub fn indicator(&self) -> &'a Indicator {
        self.indicator
    }

    pub fn identification(&self) -> &'a Identification {
        self.identification
    }

    pub fn local_use(&self) -> Option<&'a LocalUse> {
        self.local_use
    }

    pub fn grid_def(&self) -> &'a GridDefinition {
        self.grid_def
    }

    pub fn prod_def(&self) -> &'a ProdDefinition {
        self.prod_def
    }

    pub fn repr_def(&self) -> &'a ReprDefinition {
        self.repr_def
    }

    pub fn bitmap_indicator(&self) -> u8 {
        self.bitmap_indicator
    }

    /// The latest Section 6 with an actual bit-map before this submessage's
    /// one, within the same message.
    fn previous_bitmap_section(&self) -> Option<&'a SectionInfo> {
        self.context
            .sections
            .get(self.sect0_pos..self.sect6_pos)?
            .iter()
            .rev()
            .find(|s| {
                matches!(
                    s.body,
                    Some(SectionBody::Section6 {
                        bitmap_indicator: 0
                    })
                )
            })
    }
}

impl<R: Grib2Read> SubMessage<'_, R> {
    /// Unpacks the bit-map and the values of the field.
    ///
    /// Bit-map indicator 254 is resolved to the most recent bit-map defined
    /// earlier in the same message.
    pub fn decode(&self, config: &CodecConfig) -> Result<DecodedField, GribError> {
        let mut reader = self
            .context
            .reader
            .try_borrow_mut()
            .map_err(|_| GribError::InternalDataError)?;
        let num_points = self.grid_def.num_points as usize;

        let bitmap_sect = match self.bitmap_indicator {
            BITMAP_NONE => None,
            BITMAP_PREVIOUS => Some(
                self.previous_bitmap_section()
                    .ok_or(DecodeError::NoPreviousBitmap)?,
            ),
            _ => self.context.sections.get(self.sect6_pos),
        };
        let bitmap = match bitmap_sect {
            Some(sect) => {
                let body = reader.read_body_bytes(sect)?;
                let sect = BitMap::from_body(&body, num_points)?;
                Some(sect.bitmap.ok_or(GribError::InternalDataError)?)
            }
            None => None,
        };

        let payload = reader.read_body_bytes(self.sect7)?;
        let values = decoder::decode(self.repr_def, &payload, self.grid_def, config)?;
        if let Some(bitmap) = &bitmap {
            let num_present = bitmap.iter().filter(|f| **f).count();
            if num_present != values.len() {
                log::warn!(
                    "bit-map has {num_present} points present but {} values are encoded",
                    values.len()
                );
            }
        }

        Ok(DecodedField {
            discipline: self.indicator.discipline,
            identification: self.identification.clone(),
            grid_def: self.grid_def.clone(),
            prod_def: self.prod_def.clone(),
            repr_def: self.repr_def.clone(),
            bitmap,
            values,
        })
    }
}

/// A fully unpacked field.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub discipline: u8,
    pub identification: Identification,
    pub grid_def: GridDefinition,
    pub prod_def: ProdDefinition,
    pub repr_def: ReprDefinition,
    bitmap: Option<Vec<bool>>,
    values: Vec<f32>,
}

impl DecodedField {
    /// Values of the points encoded in Section 7. Points masked out by the
    /// bit-map are not included.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn bitmap(&self) -> Option<&[bool]> {
        self.bitmap.as_deref()
    }

    /// Values of all grid points, with NaN at points masked out by the
    /// bit-map.
    pub fn expanded_values(&self) -> Result<Vec<f32>, DecodeError> {
        match &self.bitmap {
            Some(bitmap) => expand_with_bitmap(&self.values, bitmap),
            None => Ok(self.values.clone()),
        }
    }
}
