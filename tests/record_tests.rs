use chrono::NaiveDate;
use mbus_telegram::mbus::pack::FrameBuilder;
use mbus_telegram::payload::{
    DataFieldCoding, DataInformationBlock, FunctionField, LongHeader, ManufacturerCode,
    MBusUserData, StatusField, ValueInformationBlock,
};
use mbus_telegram::{parse_telegram, MBusError, MBusRecord, MBusRecordValue, Quantity};

fn record(coding: DataFieldCoding, vib: &[u8], value: MBusRecordValue) -> MBusRecord {
    let dib = DataInformationBlock::new(FunctionField::Instantaneous, coding, 0, 0, 0).unwrap();
    MBusRecord::new(dib, ValueInformationBlock::decode(vib).unwrap(), value)
}

#[test]
fn test_single_record_long_frame() {
    let bytes = FrameBuilder::long(0x08, 0x01, 0x78)
        .payload(&[0x01, 0x13, 0x2A])
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();

    assert_eq!(telegram.records.len(), 1);
    let record = &telegram.records[0];
    assert_eq!(record.value, MBusRecordValue::Integer(42));
    assert_eq!(record.unit_label(), "litre");
    assert_eq!(record.quantity(), Quantity::Volume);
    assert_eq!(record.header.dib.dif, 0x01);
    assert_eq!(record.header.vib.vif, 0x13);
}

#[test]
fn test_records_keep_encounter_order() {
    let records = vec![
        record(DataFieldCoding::Bcd(4), &[0x06], MBusRecordValue::Bcd(1234)),
        record(DataFieldCoding::Integer(2), &[0x5B], MBusRecordValue::Integer(-5)),
        record(
            DataFieldCoding::Integer(2),
            &[0x6C],
            MBusRecordValue::Date(NaiveDate::from_ymd_opt(2023, 11, 30).unwrap()),
        ),
        record(DataFieldCoding::Real32, &[0x2B], MBusRecordValue::Real(1.5)),
        record(DataFieldCoding::NoData, &[0x13], MBusRecordValue::NoData),
    ];
    let header = LongHeader {
        identification: [0x78, 0x56, 0x34, 0x12],
        manufacturer: ManufacturerCode::from_code("KAM").unwrap(),
        version: 1,
        medium: 0x07,
        access_number: 0x10,
        status: StatusField::empty(),
        signature: 0,
    };

    let bytes = FrameBuilder::long(0x08, 0x05, 0x72)
        .long_header(&header)
        .records(&records)
        .unwrap()
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();

    assert!(telegram.is_complete());
    assert_eq!(telegram.records.len(), records.len());
    for (decoded, expected) in telegram.records.iter().zip(&records) {
        assert_eq!(decoded.header, expected.header);
        assert_eq!(decoded.value, expected.value);
    }
    let offsets: Vec<usize> = telegram.records.iter().map(|r| r.offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_storage_tariff_sub_unit_round_trip() {
    let dib = DataInformationBlock::new(
        FunctionField::Minimum,
        DataFieldCoding::Integer(4),
        37,
        5,
        2,
    )
    .unwrap();
    let rec = MBusRecord::new(
        dib,
        ValueInformationBlock::decode(&[0x03]).unwrap(),
        MBusRecordValue::Integer(1_000_000),
    );
    let bytes = FrameBuilder::long(0x08, 0x05, 0x78).record(&rec).unwrap().build().unwrap();
    let telegram = parse_telegram(&bytes).unwrap();
    let decoded = &telegram.records[0];

    assert_eq!(decoded.function(), FunctionField::Minimum);
    assert_eq!(decoded.storage_number(), 37);
    assert_eq!(decoded.tariff(), 5);
    assert_eq!(decoded.sub_unit(), 2);
    assert_eq!(decoded.unit_label(), "Wh");
}

#[test]
fn test_truncated_record_returns_partial() {
    let data = MBusUserData::decode(&[0x01, 0x13, 0x2A, 0x0C, 0x06, 0x78, 0x56]).unwrap();
    assert_eq!(data.records.len(), 1);
    assert!(matches!(
        data.error,
        Some(MBusError::TruncatedRecord { offset: 3, .. })
    ));
}

#[test]
fn test_wide_integers_consume_exact_width() {
    // DIF 0x06 (6 bytes), DIF 0x07 (8 bytes), then a 1-byte record
    let mut bytes = vec![0x06, 0x13];
    bytes.extend([0xFF; 6]);
    bytes.extend([0x07, 0x13, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80]);
    bytes.extend([0x01, 0x13, 0x2A]);
    let data = MBusUserData::decode(&bytes).unwrap();

    assert!(data.is_complete());
    let decoded: Vec<(MBusRecordValue, usize)> = data
        .records
        .iter()
        .map(|r| (r.value.clone(), r.offset))
        .collect();
    assert_eq!(
        decoded,
        vec![
            (MBusRecordValue::Integer(-1), 0),
            (MBusRecordValue::Integer(i64::MIN + 1), 8),
            (MBusRecordValue::Integer(42), 18),
        ]
    );
    assert_eq!(data.records[0].header.dib.coding, DataFieldCoding::Integer(6));
    assert_eq!(data.records[1].header.dib.coding, DataFieldCoding::Integer(8));
}

#[test]
fn test_wide_integer_round_trip() {
    let records = vec![
        record(DataFieldCoding::Integer(6), &[0x13], MBusRecordValue::Integer(0x7FFF_FFFF_FFFF)),
        record(DataFieldCoding::Integer(8), &[0x13], MBusRecordValue::Integer(i64::MIN)),
        record(DataFieldCoding::Bcd(6), &[0x03], MBusRecordValue::Bcd(-12_345_678_901)),
        record(DataFieldCoding::Integer(1), &[0x13], MBusRecordValue::Integer(-128)),
    ];
    let bytes = FrameBuilder::long(0x08, 0x05, 0x78)
        .records(&records)
        .unwrap()
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();

    assert!(telegram.is_complete());
    let offsets: Vec<usize> = telegram.records.iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![7, 15, 25, 33]);
    for (decoded, expected) in telegram.records.iter().zip(&records) {
        assert_eq!(decoded.value, expected.value);
    }
}

#[test]
fn test_unsupported_lvar_is_recoverable() {
    let bytes = FrameBuilder::long(0x08, 0x05, 0x78)
        .payload(&[0x01, 0x13, 0x2A, 0x0D, 0xFD, 0x11, 0xF8, 0x00])
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();

    assert_eq!(telegram.records.len(), 1);
    assert_eq!(
        telegram.error,
        Some(MBusError::UnsupportedLvar {
            offset: 13,
            lvar: 0xF8
        })
    );
    assert_eq!(telegram.unparsed, vec![0x0D, 0xFD, 0x11, 0xF8, 0x00]);
}

#[test]
fn test_more_records_follow() {
    let bytes = FrameBuilder::long(0x08, 0x05, 0x78)
        .payload(&[0x01, 0x13, 0x2A, 0x1F])
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();
    assert!(telegram.more_records_follow);
    assert_eq!(telegram.manufacturer_data, Some(Vec::new()));
    assert!(telegram.is_complete());
}

#[test]
fn test_msb_first_response() {
    // CI 0x76: header and numeric values most significant byte first
    let payload = [
        0x12, 0x34, 0x56, 0x78, 0x2C, 0x2D, 0x01, 0x07, 0x2A, 0x00, 0x00, 0x00, 0x02, 0x13,
        0x01, 0x00,
    ];
    let bytes = FrameBuilder::long(0x08, 0x05, 0x76)
        .payload(&payload)
        .build()
        .unwrap();
    let telegram = parse_telegram(&bytes).unwrap();

    match &telegram.header {
        Some(mbus_telegram::DataHeader::Long(header)) => {
            assert_eq!(header.identification_number(), Some(12345678));
            assert_eq!(header.manufacturer.to_string(), "KAM");
        }
        other => panic!("unexpected header {other:?}"),
    }
    assert_eq!(telegram.records[0].value, MBusRecordValue::Integer(256));
}

#[test]
fn test_record_serializes() {
    let rec = record(DataFieldCoding::Integer(1), &[0x13], MBusRecordValue::Integer(42));
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["value"]["Integer"], 42);
    assert_eq!(json["header"]["vib"]["quantity"], "Volume");
    assert_eq!(json["header"]["dib"]["function"], "Instantaneous");
}
