use std::mem;

use crate::{
    config::CodecConfig,
    datatypes::*,
    encoder,
    error::EncodeError,
    helpers::read_as,
    template::{TemplateInfo, TemplateValues},
};

/// Bit-map to apply to a field added with [`MessageBuilder::add_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitmapSpec {
    /// Every grid point has a value (indicator 255).
    None,
    /// Presence flag of each grid point (indicator 0).
    Bitmap(Vec<bool>),
    /// The bit-map of an earlier field of the same message (indicator 254).
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Uninitialized,
    Identified,
    HasLocal,
    HasGrid,
    HasFields,
    Finalized,
}

impl BuilderState {
    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Identified => "Identified",
            Self::HasLocal => "HasLocal",
            Self::HasGrid => "HasGrid",
            Self::HasFields => "HasFields",
            Self::Finalized => "Finalized",
        }
    }

    fn after_section(num: u8) -> Self {
        match num {
            1 => Self::Identified,
            2 => Self::HasLocal,
            3 => Self::HasGrid,
            _ => Self::HasFields,
        }
    }
}

/// Assembles one GRIB2 message section by section.
///
/// Sections must be added in the order `create`, optional `add_local`,
/// `add_grid` and one or more `add_field`, after which `end` completes the
/// message. Local Use and Grid Definition Sections may be repeated after a
/// field to change what the following fields refer to.
///
/// The total length in Section 0 is kept up to date after every step, so
/// [`as_bytes`] always returns a consistent, if incomplete, message.
///
/// # Examples
///
/// ```
/// use grib_codec::{Identification, Indicator, MessageBuilder};
///
/// let ident = Identification::from_list(&[0, 0, 0, 0, 0, 2021, 9, 22, 0, 0, 0, 0, 0]).unwrap();
/// let mut builder = MessageBuilder::new();
/// builder.create(&Indicator::new(0), &ident).unwrap();
/// assert_eq!(builder.as_bytes().len(), 37);
/// assert_eq!(builder.as_bytes()[15], 37);
/// ```
///
/// [`as_bytes`]: MessageBuilder::as_bytes
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    state: BuilderState,
    num_points: Option<usize>,
    previous_bitmap: Option<Vec<bool>>,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: BuilderState::Uninitialized,
            num_points: None,
            previous_bitmap: None,
        }
    }

    /// Restarts assembly from a message built earlier, possibly incomplete.
    ///
    /// Sections are walked as far as Section 0's total length and the buffer
    /// allow. Inconsistent section lengths are left for [`end`] to report.
    ///
    /// [`end`]: MessageBuilder::end
    pub fn resume(buf: Vec<u8>) -> Result<Self, EncodeError> {
        if buf.len() < SECT0_IS_SIZE || &buf[..SECT0_IS_MAGIC_SIZE] != SECT0_IS_MAGIC {
            return Err(EncodeError::MessageNotCreated);
        }
        if buf[7] != 2 {
            return Err(EncodeError::EditionMismatch(buf[7]));
        }
        let declared = read_as!(u64, buf, 8);

        let mut builder = Self {
            buf,
            state: BuilderState::Uninitialized,
            num_points: None,
            previous_bitmap: None,
        };
        let mut pos = SECT0_IS_SIZE;
        for (num, start, end) in SectionWalk::new(&builder.buf, declared) {
            if num == 8 {
                builder.state = BuilderState::Finalized;
                break;
            }
            let body = &builder.buf[start + SECT_HEADER_SIZE..end];
            match num {
                3 => match GridDefinition::from_body(body) {
                    Ok(grid) => builder.num_points = Some(grid.num_points as usize),
                    Err(e) => log::warn!("Grid Definition Section at {start} is unreadable: {e}"),
                },
                6 if body.first() == Some(&0) => {
                    let num_points = builder.num_points.unwrap_or_default();
                    match BitMap::from_body(body, num_points) {
                        Ok(bitmap) => builder.previous_bitmap = bitmap.bitmap,
                        Err(e) => log::warn!("Bit-map Section at {start} is unreadable: {e}"),
                    }
                }
                _ => {}
            }
            builder.state = BuilderState::after_section(num);
            pos = end;
        }
        if builder.state == BuilderState::Uninitialized {
            return Err(EncodeError::MessageNotCreated);
        }
        log::debug!(
            "resumed message in state {} after {pos} octets",
            builder.state.name()
        );
        Ok(builder)
    }

    /// Octets assembled so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Starts a message with Sections 0 and 1.
    pub fn create(
        &mut self,
        indicator: &Indicator,
        identification: &Identification,
    ) -> Result<(), EncodeError> {
        self.check_state(0, &[BuilderState::Uninitialized])?;
        let mut buf = Vec::new();
        indicator.pack(&mut buf)?;
        identification.pack(&mut buf)?;
        self.buf = buf;
        self.finish_step(BuilderState::Identified)
    }

    /// Appends a Local Use Section.
    pub fn add_local(&mut self, payload: &[u8]) -> Result<(), EncodeError> {
        self.check_state(
            2,
            &[
                BuilderState::Identified,
                BuilderState::HasLocal,
                BuilderState::HasFields,
            ],
        )?;
        LocalUse::new(payload).pack(&mut self.buf)?;
        self.finish_step(BuilderState::HasLocal)
    }

    /// Appends a Grid Definition Section that applies to the fields added
    /// after it.
    pub fn add_grid(&mut self, grid: &GridDefinition) -> Result<(), EncodeError> {
        self.check_state(
            3,
            &[
                BuilderState::Identified,
                BuilderState::HasLocal,
                BuilderState::HasGrid,
                BuilderState::HasFields,
            ],
        )?;
        grid.pack(&mut self.buf)?;
        self.num_points = Some(grid.num_points as usize);
        self.finish_step(BuilderState::HasGrid)
    }

    /// Packs one field and appends Sections 4 to 7.
    ///
    /// `values` holds a value for every grid point; only the points flagged
    /// present by `bitmap` are packed. `repr_template` is the Data
    /// Representation template to start from (see [`encoder::encode`]).
    /// Returns the template as completed by the encoder.
    pub fn add_field(
        &mut self,
        prod_def: &ProdDefinition,
        repr_template_num: u16,
        repr_template: &[i64],
        values: &[f32],
        bitmap: &BitmapSpec,
        config: &CodecConfig,
    ) -> Result<Vec<i64>, EncodeError> {
        self.check_state(4, &[BuilderState::HasGrid, BuilderState::HasFields])?;
        let num_points = self.num_points.unwrap_or_default();
        if values.len() != num_points {
            return Err(EncodeError::ValueOutOfRange(format!(
                "{} values given for a grid of {num_points} points",
                values.len()
            )));
        }

        let (sect6, flags) = match bitmap {
            BitmapSpec::None => (BitMap::none(), None),
            BitmapSpec::Bitmap(flags) => (BitMap::with_flags(flags.clone()), Some(flags)),
            BitmapSpec::Previous => (
                BitMap::previous(),
                Some(
                    self.previous_bitmap
                        .as_ref()
                        .ok_or(EncodeError::NoPreviousBitmap)?,
                ),
            ),
        };
        if let Some(flags) = flags
            && flags.len() != num_points
        {
            return Err(EncodeError::BitmapLengthMismatch {
                expected: num_points,
                actual: flags.len(),
            });
        }
        let present: Vec<f32> = match flags {
            Some(flags) => values
                .iter()
                .zip(flags)
                .filter_map(|(v, f)| f.then_some(*v))
                .collect(),
            None => values.to_vec(),
        };

        let field = encoder::encode(repr_template_num, repr_template, &present, config)?;
        let num_encoded_points = u32::try_from(present.len()).map_err(|_| {
            EncodeError::ValueOutOfRange(format!("too many values: {}", present.len()))
        })?;
        let repr_def = ReprDefinition::new(num_encoded_points, repr_template_num, field.template);
        let data = DataSection {
            payload: field.payload.into(),
        };

        let start = self.buf.len();
        let result = prod_def
            .pack(&mut self.buf)
            .and_then(|_| repr_def.pack(&mut self.buf))
            .and_then(|_| sect6.pack(&mut self.buf))
            .and_then(|_| data.pack(&mut self.buf));
        if let Err(e) = result {
            self.buf.truncate(start);
            return Err(e);
        }

        if let BitmapSpec::Bitmap(flags) = bitmap {
            self.previous_bitmap = Some(flags.clone());
        }
        self.finish_step(BuilderState::HasFields)?;
        match repr_def.template {
            TemplateValues::Decoded(values) => Ok(values),
            TemplateValues::Opaque(_) => Err(EncodeError::UnrecognizedTemplate(TemplateInfo(
                5,
                repr_template_num,
            ))),
        }
    }

    /// Appends the End Section and returns the complete message.
    ///
    /// Before that, the sections are walked from Section 1 to check that
    /// their lengths add up to the total length in Section 0 and that the
    /// last one is a Data Section.
    pub fn end(&mut self) -> Result<Vec<u8>, EncodeError> {
        match self.state {
            BuilderState::Uninitialized => return Err(EncodeError::MessageNotCreated),
            BuilderState::Finalized => return Err(EncodeError::MessageFinalized),
            _ => {}
        }

        check_length_sum(&self.buf)?;
        EndSection.pack(&mut self.buf);
        self.write_total_length()?;
        self.state = BuilderState::Finalized;
        Ok(mem::take(&mut self.buf))
    }

    fn check_state(&self, section: u8, allowed: &[BuilderState]) -> Result<(), EncodeError> {
        match self.state {
            s if allowed.contains(&s) => Ok(()),
            BuilderState::Uninitialized => Err(EncodeError::MessageNotCreated),
            BuilderState::Finalized => Err(EncodeError::MessageFinalized),
            s => Err(EncodeError::InvalidTransition {
                state: s.name(),
                section,
            }),
        }
    }

    fn finish_step(&mut self, state: BuilderState) -> Result<(), EncodeError> {
        self.write_total_length()?;
        self.state = state;
        Ok(())
    }

    fn write_total_length(&mut self) -> Result<(), EncodeError> {
        let len = (self.buf.len() as u64).to_be_bytes();
        let field = self
            .buf
            .get_mut(8..SECT0_IS_SIZE)
            .ok_or(EncodeError::MessageNotCreated)?;
        field.copy_from_slice(&len);
        Ok(())
    }
}

/// Walks the sections after Section 0 until their lengths add up to the total
/// length in Section 0.
fn check_length_sum(buf: &[u8]) -> Result<(), EncodeError> {
    let declared = read_as!(u64, buf, 8);
    let mut sum = SECT0_IS_SIZE as u64;
    let mut last = 0;
    while sum < declared {
        let pos = sum as usize;
        if pos + SECT_HEADER_SIZE > buf.len() {
            break;
        }
        let size = read_as!(u32, buf, pos);
        if (size as usize) < SECT_HEADER_SIZE {
            break;
        }
        last = buf[pos + 4];
        sum += u64::from(size);
    }
    if sum != declared {
        return Err(EncodeError::SectionLengthMismatch { sum, declared });
    }
    if last != 7 {
        return Err(EncodeError::LastSectionNotData(last));
    }
    Ok(())
}

/// Iterates `(number, start, end)` of sections that lie within both the
/// buffer and the declared total length. Section 8 is reported with number 8.
struct SectionWalk<'a> {
    buf: &'a [u8],
    limit: usize,
    pos: usize,
}

impl<'a> SectionWalk<'a> {
    fn new(buf: &'a [u8], declared: u64) -> Self {
        let limit = usize::try_from(declared).map_or(buf.len(), |d| d.min(buf.len()));
        Self {
            buf,
            limit,
            pos: SECT0_IS_SIZE,
        }
    }
}

impl Iterator for SectionWalk<'_> {
    type Item = (u8, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (buf, start) = (self.buf, self.pos);
        if start + SECT8_ES_SIZE == self.limit && &buf[start..self.limit] == SECT8_ES_MAGIC {
            self.pos = self.limit;
            return Some((8, start, self.limit));
        }
        if start + SECT_HEADER_SIZE > self.limit {
            return None;
        }
        let size = read_as!(u32, buf, start) as usize;
        let end = start.checked_add(size)?;
        if size < SECT_HEADER_SIZE || end > self.limit {
            return None;
        }
        self.pos = end;
        Some((buf[start + 4], start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: [u8; 37] = [
        0x47, 0x52, 0x49, 0x42, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x25, 0x00, 0x00, 0x00, 0x15, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0xe5,
        0x09, 0x16, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn identification() -> Identification {
        Identification::from_list(&[0, 0, 0, 0, 0, 2021, 9, 22, 0, 0, 0, 0, 0]).unwrap()
    }

    fn product() -> ProdDefinition {
        ProdDefinition::new(0, vec![0, 0, 2, 0, 96, 0, 0, 1, 0, 1, 0, 2, 255, 0, 0])
    }

    fn created() -> MessageBuilder {
        let mut builder = MessageBuilder::new();
        builder
            .create(&Indicator::new(0), &identification())
            .unwrap();
        builder
    }

    fn with_field() -> MessageBuilder {
        let mut builder = created();
        builder
            .add_grid(&GridDefinition::new(3, 65535, Vec::new()))
            .unwrap();
        builder
            .add_field(
                &product(),
                0,
                &[0; 5],
                &[1.0, 2.0, 3.0],
                &BitmapSpec::None,
                &CodecConfig::default(),
            )
            .unwrap();
        builder
    }

    #[test]
    fn create_fixture() {
        let builder = created();
        assert_eq!(builder.as_bytes(), &FIXTURE[..]);
    }

    #[test]
    fn create_with_edition_1() {
        let mut builder = MessageBuilder::new();
        let indicator = Indicator::from_list(&[0, 1]).unwrap();
        assert_eq!(
            builder.create(&indicator, &identification()),
            Err(EncodeError::EditionMismatch(1))
        );
        assert!(builder.as_bytes().is_empty());
        assert_eq!(builder.end(), Err(EncodeError::MessageNotCreated));
    }

    macro_rules! test_transition_errors {
        ($(($name:ident, $builder:expr, $step:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                let mut builder = $builder;
                let step: fn(&mut MessageBuilder) -> Result<(), EncodeError> = $step;
                let before = builder.as_bytes().to_vec();
                assert_eq!(step(&mut builder), Err($expected));
                assert_eq!(builder.as_bytes(), &before[..]);
            }
        )*);
    }

    test_transition_errors! {
        (
            local_before_create,
            MessageBuilder::new(),
            |b| b.add_local(b"x"),
            EncodeError::MessageNotCreated
        ),
        (
            create_twice,
            created(),
            |b| b.create(&Indicator::new(0), &identification()),
            EncodeError::InvalidTransition { state: "Identified", section: 0 }
        ),
        (
            local_after_grid,
            {
                let mut b = created();
                b.add_grid(&GridDefinition::new(3, 65535, Vec::new())).unwrap();
                b
            },
            |b| b.add_local(b"x"),
            EncodeError::InvalidTransition { state: "HasGrid", section: 2 }
        ),
        (
            field_without_grid,
            created(),
            |b| b
                .add_field(&product(), 0, &[0; 5], &[1.0], &BitmapSpec::None, &CodecConfig::default())
                .map(|_| ()),
            EncodeError::InvalidTransition { state: "Identified", section: 4 }
        ),
        (
            wrong_number_of_values,
            {
                let mut b = created();
                b.add_grid(&GridDefinition::new(3, 65535, Vec::new())).unwrap();
                b
            },
            |b| b
                .add_field(&product(), 0, &[0; 5], &[1.0], &BitmapSpec::None, &CodecConfig::default())
                .map(|_| ()),
            EncodeError::ValueOutOfRange("1 values given for a grid of 3 points".to_owned())
        ),
        (
            previous_bitmap_missing,
            with_field(),
            |b| b
                .add_field(
                    &product(),
                    0,
                    &[0; 5],
                    &[1.0, 2.0, 3.0],
                    &BitmapSpec::Previous,
                    &CodecConfig::default(),
                )
                .map(|_| ()),
            EncodeError::NoPreviousBitmap
        ),
        (
            bitmap_of_wrong_length,
            with_field(),
            |b| b
                .add_field(
                    &product(),
                    0,
                    &[0; 5],
                    &[1.0, 2.0, 3.0],
                    &BitmapSpec::Bitmap(vec![true, true]),
                    &CodecConfig::default(),
                )
                .map(|_| ()),
            EncodeError::BitmapLengthMismatch { expected: 3, actual: 2 }
        ),
        (
            failed_packing_leaves_no_section,
            with_field(),
            |b| b
                .add_field(
                    &product(),
                    0,
                    &[0; 3],
                    &[1.0, 2.0, 3.0],
                    &BitmapSpec::None,
                    &CodecConfig::default(),
                )
                .map(|_| ()),
            EncodeError::TemplateLengthMismatch { expected: 5, actual: 3 }
        ),
        (
            end_without_field,
            created(),
            |b| b.end().map(|_| ()),
            EncodeError::LastSectionNotData(1)
        ),
    }

    #[test]
    fn total_length_follows_every_step() {
        let mut builder = created();
        builder.add_local(&[1, 2, 3]).unwrap();
        let bytes = builder.as_bytes();
        assert_eq!(bytes.len(), 37 + 8);
        assert_eq!(read_as!(u64, bytes, 8), 45);

        builder
            .add_grid(&GridDefinition::new(3, 65535, Vec::new()))
            .unwrap();
        let bytes = builder.as_bytes();
        assert_eq!(read_as!(u64, bytes, 8), bytes.len() as u64);
    }

    #[test]
    fn end_completes_message() {
        let mut builder = with_field();
        let bytes = builder.end().unwrap();
        assert_eq!(read_as!(u64, bytes, 8), bytes.len() as u64);
        assert_eq!(&bytes[bytes.len() - 4..], b"7777");
        assert_eq!(builder.end(), Err(EncodeError::MessageFinalized));
        assert_eq!(builder.add_local(b"x"), Err(EncodeError::MessageFinalized));
    }

    #[test]
    fn add_field_returns_completed_template() {
        let mut builder = created();
        builder
            .add_grid(&GridDefinition::new(4, 65535, Vec::new()))
            .unwrap();
        let template = builder
            .add_field(
                &product(),
                0,
                &[0, 0, 1, 0, 0],
                &[1.0, -9999.0, 1.5, 2.0],
                &BitmapSpec::Bitmap(vec![true, false, true, true]),
                &CodecConfig::default(),
            )
            .unwrap();
        assert_eq!(template[1..], [0, 1, 4, 0]);
        let template = builder
            .add_field(
                &product(),
                0,
                &[0, 0, 0, 0, 0],
                &[7.0, 7.0, 7.0, 7.0],
                &BitmapSpec::Previous,
                &CodecConfig::default(),
            )
            .unwrap();
        assert_eq!(template[3], 0);
        assert!(builder.end().is_ok());
    }

    #[test]
    fn resume_and_continue() {
        let partial = with_field().as_bytes().to_vec();
        let mut builder = MessageBuilder::resume(partial).unwrap();
        builder
            .add_field(
                &product(),
                0,
                &[0; 5],
                &[4.0, 5.0, 6.0],
                &BitmapSpec::None,
                &CodecConfig::default(),
            )
            .unwrap();
        let bytes = builder.end().unwrap();
        assert_eq!(read_as!(u64, bytes, 8), bytes.len() as u64);

        assert_eq!(
            MessageBuilder::resume(bytes).map(|b| b.state),
            Ok(BuilderState::Finalized)
        );
    }

    #[test]
    fn resume_rejects_non_grib() {
        assert_eq!(
            MessageBuilder::resume(b"GRIB".to_vec()).map(|b| b.state),
            Err(EncodeError::MessageNotCreated)
        );
        let mut bytes = FIXTURE.to_vec();
        bytes[7] = 1;
        assert_eq!(
            MessageBuilder::resume(bytes).map(|b| b.state),
            Err(EncodeError::EditionMismatch(1))
        );
    }

    #[test]
    fn end_detects_corrupted_total_length() {
        let mut bytes = with_field().as_bytes().to_vec();
        let actual = bytes.len() as u64;
        bytes[15] -= 1;
        let mut builder = MessageBuilder::resume(bytes).unwrap();
        assert_eq!(
            builder.end(),
            Err(EncodeError::SectionLengthMismatch {
                sum: actual,
                declared: actual - 1
            })
        );
    }
}
