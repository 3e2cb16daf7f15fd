use grib_codec::{
    BITMAP_NONE, BitMap, EncodeError, ErrorCategory, GribError, Identification, Indicator,
    MessageBuilder, ParseError,
};

mod utils;
use utils::*;

const CREATE_FIXTURE: [u8; 37] = [
    0x47, 0x52, 0x49, 0x42, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x25,
    0x00, 0x00, 0x00, 0x15, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0xe5, 0x09, 0x16,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

fn fixture_identification() -> Identification {
    Identification::from_list(&[0, 0, 0, 0, 0, 2021, 9, 22, 0, 0, 0, 0, 0]).unwrap()
}

#[test]
fn create_produces_fixture() {
    let indicator = Indicator::from_list(&[0, 2]).unwrap();
    let mut builder = MessageBuilder::new();
    builder
        .create(&indicator, &fixture_identification())
        .unwrap();
    assert_eq!(builder.as_bytes(), &CREATE_FIXTURE[..]);
}

#[test]
fn fixture_unpacks_to_the_packed_sections() {
    let file = write_to_tempfile(&CREATE_FIXTURE).unwrap();
    let bytes = std::fs::read(file.path()).unwrap();

    let mut pos = 0;
    let indicator = Indicator::unpack(&bytes, &mut pos).unwrap();
    let identification = Identification::unpack(&bytes, &mut pos).unwrap();
    assert_eq!(pos, bytes.len());
    assert_eq!(indicator.discipline, 0);
    assert_eq!(indicator.edition, 2);
    assert_eq!(indicator.total_length, 37);
    assert_eq!(identification, fixture_identification());
    assert_eq!(
        identification.to_list(),
        [0, 0, 0, 0, 0, 2021, 9, 22, 0, 0, 0, 0, 0]
    );
}

#[test]
fn create_rejects_edition_1() {
    let indicator = Indicator::from_list(&[0, 1]).unwrap();
    let mut builder = MessageBuilder::new();
    let err = builder
        .create(&indicator, &fixture_identification())
        .unwrap_err();
    assert_eq!(err, EncodeError::EditionMismatch(1));
    assert_eq!(
        GribError::from(err).category(),
        ErrorCategory::Structural
    );
    assert!(builder.as_bytes().is_empty());
}

#[test]
fn edition_1_is_not_read() {
    let mut bytes = CREATE_FIXTURE.to_vec();
    bytes[7] = 1;
    let mut pos = 0;
    assert_eq!(
        Indicator::unpack(&bytes, &mut pos),
        Err(ParseError::GRIBVersionMismatch(1))
    );
    assert!(matches!(
        grib_codec::from_slice(&bytes),
        Err(GribError::ParseError(ParseError::GRIBVersionMismatch(1)))
    ));
}

#[test]
fn message_without_fields_is_rejected_by_reader() {
    assert!(matches!(
        grib_codec::from_slice(&CREATE_FIXTURE),
        Err(GribError::ParseError(_))
    ));
}

#[test]
fn bitmap_section_without_bitmap() {
    let bytes = [0x00, 0x00, 0x00, 0x06, 0x06, BITMAP_NONE];
    let mut pos = 0;
    let sect = BitMap::unpack(&bytes, &mut pos, 1000).unwrap();
    assert_eq!(pos, 6);
    assert_eq!(sect.indicator, BITMAP_NONE);
    assert_eq!(sect.bitmap, None);
    assert_eq!(sect.num_present(), None);
}

#[test]
fn end_reports_missing_data_section() {
    let mut builder = MessageBuilder::new();
    builder
        .create(&Indicator::new(0), &identification())
        .unwrap();
    builder.add_grid(&latlon_grid()).unwrap();
    assert_eq!(builder.end(), Err(EncodeError::LastSectionNotData(3)));
}

#[test]
fn end_reports_corrupted_section_length() {
    let mut builder = MessageBuilder::new();
    builder
        .create(&Indicator::new(0), &identification())
        .unwrap();
    builder.add_local(&[0; 10]).unwrap();
    let mut bytes = builder.as_bytes().to_vec();
    // Section 2 claims one octet more than it has
    bytes[40] += 1;

    let mut builder = MessageBuilder::resume(bytes).unwrap();
    assert_eq!(
        builder.end(),
        Err(EncodeError::SectionLengthMismatch {
            sum: 53,
            declared: 52
        })
    );
}

#[test]
fn finalized_message_is_immutable() {
    let bytes = build_message(&[Field::new(0, vec![0, 0, 1, 0, 0], sample_values())]).unwrap();
    let mut builder = MessageBuilder::resume(bytes.clone()).unwrap();
    assert_eq!(builder.add_grid(&latlon_grid()), Err(EncodeError::MessageFinalized));
    assert_eq!(builder.end(), Err(EncodeError::MessageFinalized));
    assert_eq!(builder.as_bytes(), &bytes[..]);
}
