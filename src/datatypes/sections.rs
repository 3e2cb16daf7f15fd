use crate::{
    bits::{get_bits, pack_bits},
    error::*,
    helpers::{push_uint, read_as, uint_from_bytes},
    ieee,
    template::{TemplateInfo, TemplateValues},
};

pub(crate) const SECT0_IS_MAGIC: &[u8] = b"GRIB";
pub(crate) const SECT0_IS_MAGIC_SIZE: usize = SECT0_IS_MAGIC.len();
pub(crate) const SECT0_IS_SIZE: usize = 16;
pub(crate) const SECT_HEADER_SIZE: usize = 5;
pub(crate) const SECT8_ES_MAGIC: &[u8] = b"7777";
pub(crate) const SECT8_ES_SIZE: usize = SECT8_ES_MAGIC.len();

const SECT1_BODY_SIZE: usize = 16;
const SECT3_HEADER_SIZE: usize = 9;
const SECT4_HEADER_SIZE: usize = 4;
const SECT5_HEADER_SIZE: usize = 6;

/// Bit-map indicator meaning that no bit-map applies.
pub const BITMAP_NONE: u8 = 255;
/// Bit-map indicator meaning that a bit-map defined earlier in the same message
/// applies.
pub const BITMAP_PREVIOUS: u8 = 254;

/// Reads the `(length, number)` header of sections 1-7 at `*pos`, moves `pos`
/// to the start of the body and returns the offset just past the section.
pub(crate) fn read_section_header(
    buf: &[u8],
    pos: &mut usize,
    expected: u8,
) -> Result<usize, ParseError> {
    let start = *pos;
    if start + SECT_HEADER_SIZE > buf.len() {
        return Err(ParseError::UnexpectedEndOfData(start));
    }
    let size = read_as!(u32, buf, start) as usize;
    let num = buf[start + 4];
    if num != expected {
        return Err(ParseError::UnexpectedSectionNumber {
            expected,
            actual: num,
        });
    }
    if size < SECT_HEADER_SIZE {
        return Err(ParseError::SectionSizeTooSmall(size));
    }
    let end = start + size;
    if end > buf.len() {
        return Err(ParseError::UnexpectedEndOfData(buf.len()));
    }
    *pos = start + SECT_HEADER_SIZE;
    Ok(end)
}

/// Appends a section with number `num` whose body is written by `body`. On
/// failure `out` is truncated back to its length before the call.
pub(crate) fn write_section<F>(out: &mut Vec<u8>, num: u8, body: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), EncodeError>,
{
    let start = out.len();
    out.extend_from_slice(&[0, 0, 0, 0, num]);
    let result = body(out).and_then(|_| {
        let size = out.len() - start;
        u32::try_from(size).map_err(|_| {
            EncodeError::ValueOutOfRange(format!("section {num} is too large: {size} octets"))
        })
    });
    match result {
        Ok(size) => {
            out[start..start + 4].copy_from_slice(&size.to_be_bytes());
            Ok(())
        }
        Err(e) => {
            out.truncate(start);
            Err(e)
        }
    }
}

fn list_value(list: &[i64], index: usize) -> Result<i64, EncodeError> {
    list.get(index).copied().ok_or(EncodeError::TemplateLengthMismatch {
        expected: index + 1,
        actual: list.len(),
    })
}

fn narrow<T: TryFrom<i64>>(list: &[i64], index: usize) -> Result<T, EncodeError> {
    let value = list_value(list, index)?;
    T::try_from(value)
        .map_err(|_| EncodeError::ValueOutOfRange(format!("entry {index}: {value}")))
}

/// Section 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB edition number
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

impl Indicator {
    pub fn new(discipline: u8) -> Self {
        Self {
            discipline,
            edition: 2,
            total_length: 0,
        }
    }

    /// Builds the indicator from `[discipline, edition]`.
    pub fn from_list(list: &[i64]) -> Result<Self, EncodeError> {
        Ok(Self {
            discipline: narrow(list, 0)?,
            edition: narrow(list, 1)?,
            total_length: 0,
        })
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let start = *pos;
        let slice = buf
            .get(start..start + SECT0_IS_SIZE)
            .ok_or(ParseError::UnexpectedEndOfData(start))?;
        let indicator = Self::from_slice(slice)?;
        *pos = start + SECT0_IS_SIZE;
        Ok(indicator)
    }

    pub(crate) fn from_slice(slice: &[u8]) -> Result<Self, ParseError> {
        if slice.len() < SECT0_IS_SIZE {
            return Err(ParseError::UnexpectedEndOfData(slice.len()));
        }
        if &slice[0..SECT0_IS_MAGIC_SIZE] != SECT0_IS_MAGIC {
            return Err(ParseError::NotGRIB);
        }
        let edition = slice[7];
        if edition != 2 {
            return Err(ParseError::GRIBVersionMismatch(edition));
        }

        Ok(Self {
            discipline: slice[6],
            edition,
            total_length: read_as!(u64, slice, 8),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        if self.edition != 2 {
            return Err(EncodeError::EditionMismatch(self.edition));
        }
        out.extend_from_slice(SECT0_IS_MAGIC);
        out.extend_from_slice(&[0, 0, self.discipline, self.edition]);
        out.extend_from_slice(&self.total_length.to_be_bytes());
        Ok(())
    }
}

/// Reference time of data (octets 13-19 of Section 1).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RefTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Converts into a validated UTC date and time.
    #[cfg(feature = "time-calculation")]
    pub fn to_datetime(&self) -> Result<chrono::DateTime<chrono::Utc>, GribError> {
        use chrono::{LocalResult, TimeZone, Utc};

        let result = Utc.with_ymd_and_hms(
            self.year.into(),
            self.month.into(),
            self.day.into(),
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
        );
        match result {
            LocalResult::Single(dt) => Ok(dt),
            _ => Err(GribError::InvalidValueError(format!(
                "invalid date time: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            ))),
        }
    }
}

/// Section 1.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code Table
    /// C-1)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre (allocated by
    /// originating/ generating centre)
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    pub ref_time: RefTime,
    /// Production status of processed data in this GRIB message
    /// (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data in this GRIB message (see Code Table 1.4)
    pub data_type: u8,
    /// Octets following octet 21, kept as they are.
    pub reserved: Box<[u8]>,
}

impl Identification {
    /// Builds the identification from the 13 entries in octet order: centre,
    /// sub-centre, master and local table versions, significance of reference
    /// time, year, month, day, hour, minute, second, production status and
    /// data type.
    pub fn from_list(list: &[i64]) -> Result<Self, EncodeError> {
        Ok(Self {
            centre_id: narrow(list, 0)?,
            subcentre_id: narrow(list, 1)?,
            master_table_version: narrow(list, 2)?,
            local_table_version: narrow(list, 3)?,
            ref_time_significance: narrow(list, 4)?,
            ref_time: RefTime::new(
                narrow(list, 5)?,
                narrow(list, 6)?,
                narrow(list, 7)?,
                narrow(list, 8)?,
                narrow(list, 9)?,
                narrow(list, 10)?,
            ),
            prod_status: narrow(list, 11)?,
            data_type: narrow(list, 12)?,
            reserved: Box::default(),
        })
    }

    /// Inverse of [`Identification::from_list`].
    pub fn to_list(&self) -> [i64; 13] {
        let t = &self.ref_time;
        [
            self.centre_id.into(),
            self.subcentre_id.into(),
            self.master_table_version.into(),
            self.local_table_version.into(),
            self.ref_time_significance.into(),
            t.year.into(),
            t.month.into(),
            t.day.into(),
            t.hour.into(),
            t.minute.into(),
            t.second.into(),
            self.prod_status.into(),
            self.data_type.into(),
        ]
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 1)?;
        let sect = Self::from_body(&buf[*pos..end])?;
        *pos = end;
        Ok(sect)
    }

    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < SECT1_BODY_SIZE {
            return Err(ParseError::SectionSizeTooSmall(
                body.len() + SECT_HEADER_SIZE,
            ));
        }
        Ok(Self {
            centre_id: read_as!(u16, body, 0),
            subcentre_id: read_as!(u16, body, 2),
            master_table_version: body[4],
            local_table_version: body[5],
            ref_time_significance: body[6],
            ref_time: RefTime::new(
                read_as!(u16, body, 7),
                body[9],
                body[10],
                body[11],
                body[12],
                body[13],
            ),
            prod_status: body[14],
            data_type: body[15],
            reserved: body[SECT1_BODY_SIZE..].into(),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_section(out, 1, |out| {
            let t = &self.ref_time;
            out.extend_from_slice(&self.centre_id.to_be_bytes());
            out.extend_from_slice(&self.subcentre_id.to_be_bytes());
            out.extend_from_slice(&[
                self.master_table_version,
                self.local_table_version,
                self.ref_time_significance,
            ]);
            out.extend_from_slice(&t.year.to_be_bytes());
            out.extend_from_slice(&[t.month, t.day, t.hour, t.minute, t.second]);
            out.extend_from_slice(&[self.prod_status, self.data_type]);
            out.extend_from_slice(&self.reserved);
            Ok(())
        })
    }
}

/// Section 2. Contents are centre-specific and not interpreted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalUse {
    pub payload: Box<[u8]>,
}

impl LocalUse {
    pub fn new(payload: &[u8]) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 2)?;
        let sect = Self::new(&buf[*pos..end]);
        *pos = end;
        Ok(sect)
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_section(out, 2, |out| {
            out.extend_from_slice(&self.payload);
            Ok(())
        })
    }
}

/// Section 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDefinition {
    /// Source of grid definition (see Code Table 3.0)
    pub source: u8,
    /// Number of data points
    pub num_points: u32,
    /// Number of octets for optional list of numbers defining number of points
    pub num_octets_for_optional_list: u8,
    /// Interpretation of list of numbers defining number of points (see Code
    /// Table 3.11)
    pub optional_list_interpretation: u8,
    /// Grid definition template number (see Code Table 3.1)
    pub template_num: u16,
    pub template: TemplateValues,
    /// Number of points along each row or column of a quasi-regular grid
    pub optional_list: Vec<u32>,
}

/// Template number meaning that no grid definition template follows.
const GRID_TEMPLATE_MISSING: u16 = 65535;

impl GridDefinition {
    pub fn new(num_points: u32, template_num: u16, template: Vec<i64>) -> Self {
        Self {
            source: 0,
            num_points,
            num_octets_for_optional_list: 0,
            optional_list_interpretation: 0,
            template_num,
            template: TemplateValues::Decoded(template),
            optional_list: Vec::new(),
        }
    }

    pub fn template_info(&self) -> TemplateInfo {
        TemplateInfo(3, self.template_num)
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 3)?;
        let sect = Self::from_body(&buf[*pos..end])?;
        *pos = end;
        Ok(sect)
    }

    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < SECT3_HEADER_SIZE {
            return Err(ParseError::SectionSizeTooSmall(
                body.len() + SECT_HEADER_SIZE,
            ));
        }
        let source = body[0];
        let num_points = read_as!(u32, body, 1);
        let num_octets_for_optional_list = body[5];
        let optional_list_interpretation = body[6];
        let template_num = read_as!(u16, body, 7);

        let mut pos = SECT3_HEADER_SIZE;
        let template = if template_num == GRID_TEMPLATE_MISSING {
            TemplateValues::default()
        } else {
            TemplateValues::unpack(TemplateInfo(3, template_num), body, &mut pos, body.len())?
        };

        let optional_list = match (num_octets_for_optional_list, &template) {
            (0, _) => Vec::new(),
            (_, TemplateValues::Opaque(_)) => {
                log::warn!("optional list of grid template 3.{template_num} is left in the template octets");
                Vec::new()
            }
            (n, _) => body[pos..]
                .chunks_exact(usize::from(n))
                .map(|chunk| uint_from_bytes(chunk) as u32)
                .collect(),
        };

        Ok(Self {
            source,
            num_points,
            num_octets_for_optional_list,
            optional_list_interpretation,
            template_num,
            template,
            optional_list,
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        if !self.optional_list.is_empty() && !(1..=4).contains(&self.num_octets_for_optional_list)
        {
            return Err(EncodeError::ValueOutOfRange(format!(
                "optional list entries cannot be {} octets wide",
                self.num_octets_for_optional_list
            )));
        }
        write_section(out, 3, |out| {
            out.push(self.source);
            out.extend_from_slice(&self.num_points.to_be_bytes());
            out.extend_from_slice(&[
                self.num_octets_for_optional_list,
                self.optional_list_interpretation,
            ]);
            out.extend_from_slice(&self.template_num.to_be_bytes());
            if self.template_num != GRID_TEMPLATE_MISSING {
                self.template.pack(self.template_info(), out)?;
            }
            let width = usize::from(self.num_octets_for_optional_list);
            for n in &self.optional_list {
                push_uint(out, u64::from(*n), width)?;
            }
            Ok(())
        })
    }

    /// Returns the number of points along a parallel and along a meridian and
    /// the scanning mode, for the templates that define a rectangular grid.
    pub fn dimensions(&self) -> Result<GridDimensions, DecodeError> {
        let info = self.template_info();
        let scanning_mode_index = match self.template_num {
            0..=3 | 40..=43 => 18,
            10 | 110 => 15,
            20 | 30 | 31 => 17,
            90 | 140 => 16,
            _ => return Err(DecodeError::UnrecognizedTemplate(info)),
        };
        let values = self.template.values(info)?;
        let get = |i: usize| values.get(i).copied().ok_or(DecodeError::LengthMismatch);
        Ok(GridDimensions {
            width: get(7)? as u32,
            height: get(8)? as u32,
            scanning_mode: get(scanning_mode_index)? as u8,
        })
    }

    /// Returns the pentagonal resolution parameters `J`, `K` and `M` of
    /// spherical harmonic coefficient grids.
    pub fn spectral_truncation(&self) -> Result<SpectralTruncation, DecodeError> {
        let info = self.template_info();
        if !(50..=53).contains(&self.template_num) {
            return Err(DecodeError::UnrecognizedTemplate(info));
        }
        let values = self.template.values(info)?;
        match values {
            [j, k, m, ..] => Ok(SpectralTruncation {
                j: *j as u32,
                k: *k as u32,
                m: *m as u32,
            }),
            _ => Err(DecodeError::LengthMismatch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    /// Number of points along a parallel (Ni or Nx)
    pub width: u32,
    /// Number of points along a meridian (Nj or Ny)
    pub height: u32,
    /// Scanning mode flags (see Flag Table 3.4)
    pub scanning_mode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpectralTruncation {
    pub j: u32,
    pub k: u32,
    pub m: u32,
}

/// Section 4.
#[derive(Debug, Clone, PartialEq)]
pub struct ProdDefinition {
    /// Product definition template number (see Code Table 4.0)
    pub template_num: u16,
    pub template: TemplateValues,
    /// Coordinate values documenting hybrid vertical levels
    pub coordinates: Vec<f32>,
}

impl ProdDefinition {
    pub fn new(template_num: u16, template: Vec<i64>) -> Self {
        Self {
            template_num,
            template: TemplateValues::Decoded(template),
            coordinates: Vec::new(),
        }
    }

    pub fn template_info(&self) -> TemplateInfo {
        TemplateInfo(4, self.template_num)
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 4)?;
        let sect = Self::from_body(&buf[*pos..end])?;
        *pos = end;
        Ok(sect)
    }

    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < SECT4_HEADER_SIZE {
            return Err(ParseError::SectionSizeTooSmall(
                body.len() + SECT_HEADER_SIZE,
            ));
        }
        let num_coordinates = usize::from(read_as!(u16, body, 0));
        let template_num = read_as!(u16, body, 2);

        let coords_size = num_coordinates * 4;
        if SECT4_HEADER_SIZE + coords_size > body.len() {
            return Err(ParseError::UnexpectedEndOfData(body.len() + SECT_HEADER_SIZE));
        }
        let template_end = body.len() - coords_size;
        let mut pos = SECT4_HEADER_SIZE;
        let template = TemplateValues::unpack(
            TemplateInfo(4, template_num),
            body,
            &mut pos,
            template_end,
        )?;

        Ok(Self {
            template_num,
            template,
            coordinates: ieee::read_f32s(&body[template_end..]),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let num_coordinates = u16::try_from(self.coordinates.len()).map_err(|_| {
            EncodeError::ValueOutOfRange(format!(
                "too many coordinate values: {}",
                self.coordinates.len()
            ))
        })?;
        write_section(out, 4, |out| {
            out.extend_from_slice(&num_coordinates.to_be_bytes());
            out.extend_from_slice(&self.template_num.to_be_bytes());
            self.template.pack(self.template_info(), out)?;
            ieee::write_f32s(&self.coordinates, out);
            Ok(())
        })
    }
}

/// Section 5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprDefinition {
    /// Number of data points where one or more values are specified in Section
    /// 7
    pub num_encoded_points: u32,
    /// Data representation template number (see Code Table 5.0)
    pub template_num: u16,
    pub template: TemplateValues,
}

impl ReprDefinition {
    pub fn new(num_encoded_points: u32, template_num: u16, template: Vec<i64>) -> Self {
        Self {
            num_encoded_points,
            template_num,
            template: TemplateValues::Decoded(template),
        }
    }

    pub fn template_info(&self) -> TemplateInfo {
        TemplateInfo(5, self.template_num)
    }

    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 5)?;
        let sect = Self::from_body(&buf[*pos..end])?;
        *pos = end;
        Ok(sect)
    }

    pub(crate) fn from_body(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < SECT5_HEADER_SIZE {
            return Err(ParseError::SectionSizeTooSmall(
                body.len() + SECT_HEADER_SIZE,
            ));
        }
        let num_encoded_points = read_as!(u32, body, 0);
        let template_num = read_as!(u16, body, 4);
        let mut pos = SECT5_HEADER_SIZE;
        let template =
            TemplateValues::unpack(TemplateInfo(5, template_num), body, &mut pos, body.len())?;

        Ok(Self {
            num_encoded_points,
            template_num,
            template,
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_section(out, 5, |out| {
            out.extend_from_slice(&self.num_encoded_points.to_be_bytes());
            out.extend_from_slice(&self.template_num.to_be_bytes());
            self.template.pack(self.template_info(), out)
        })
    }
}

/// Section 6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMap {
    /// Bit-map indicator (see Code Table 6.0)
    pub indicator: u8,
    /// Presence flag of each grid point, only for indicator 0
    pub bitmap: Option<Vec<bool>>,
}

impl BitMap {
    pub fn none() -> Self {
        Self {
            indicator: BITMAP_NONE,
            bitmap: None,
        }
    }

    pub fn previous() -> Self {
        Self {
            indicator: BITMAP_PREVIOUS,
            bitmap: None,
        }
    }

    pub fn with_flags(flags: Vec<bool>) -> Self {
        Self {
            indicator: 0,
            bitmap: Some(flags),
        }
    }

    /// Reads the bit-map of a grid with `num_points` points.
    ///
    /// Indicator 254 yields no bit-map here; resolving it against the bit-map
    /// defined previously in the message is up to the caller.
    pub fn unpack(buf: &[u8], pos: &mut usize, num_points: usize) -> Result<Self, GribError> {
        let end = read_section_header(buf, pos, 6)?;
        let sect = Self::from_body(&buf[*pos..end], num_points)?;
        *pos = end;
        Ok(sect)
    }

    pub(crate) fn from_body(body: &[u8], num_points: usize) -> Result<Self, GribError> {
        let Some((indicator, bits)) = body.split_first() else {
            return Err(ParseError::SectionSizeTooSmall(SECT_HEADER_SIZE).into());
        };
        let indicator = *indicator;
        let bitmap = match indicator {
            0 => {
                if bits.len() * 8 < num_points {
                    return Err(ParseError::UnexpectedEndOfData(bits.len() + 6).into());
                }
                let mut flags = Vec::new();
                flags
                    .try_reserve_exact(num_points)
                    .map_err(|_| DecodeError::AllocationFailed(num_points))?;
                flags.extend((0..num_points).map(|i| get_bits(bits, i, 1) == 1));
                Some(flags)
            }
            BITMAP_PREVIOUS | BITMAP_NONE => None,
            i => return Err(DecodeError::PredefinedBitmapUnsupported(i).into()),
        };
        Ok(Self { indicator, bitmap })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let flags = match (self.indicator, &self.bitmap) {
            (0, Some(flags)) => Some(flags),
            (0, None) => {
                return Err(EncodeError::BitmapLengthMismatch {
                    expected: 1,
                    actual: 0,
                });
            }
            _ => None,
        };
        write_section(out, 6, |out| {
            out.push(self.indicator);
            if let Some(flags) = flags {
                out.extend(pack_bits(flags.iter().map(|f| u64::from(*f)), 1));
            }
            Ok(())
        })
    }

    /// Number of points flagged present, or `None` when no bit-map is held.
    pub fn num_present(&self) -> Option<usize> {
        self.bitmap
            .as_ref()
            .map(|flags| flags.iter().filter(|f| **f).count())
    }
}

/// Section 7. The payload is interpreted by the codec selected in Section 5.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DataSection {
    pub payload: Box<[u8]>,
}

impl DataSection {
    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let end = read_section_header(buf, pos, 7)?;
        let sect = Self {
            payload: buf[*pos..end].into(),
        };
        *pos = end;
        Ok(sect)
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_section(out, 7, |out| {
            out.extend_from_slice(&self.payload);
            Ok(())
        })
    }
}

/// Section 8.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EndSection;

impl EndSection {
    pub fn unpack(buf: &[u8], pos: &mut usize) -> Result<Self, ParseError> {
        let start = *pos;
        let slice = buf
            .get(start..start + SECT8_ES_SIZE)
            .ok_or(ParseError::UnexpectedEndOfData(start))?;
        if slice != SECT8_ES_MAGIC {
            return Err(ParseError::EndSectionMismatch);
        }
        *pos = start + SECT8_ES_SIZE;
        Ok(Self)
    }

    pub fn pack(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(SECT8_ES_MAGIC);
    }
}
