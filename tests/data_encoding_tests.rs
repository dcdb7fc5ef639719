use chrono::NaiveDate;
use mbus_telegram::payload::data_encoding::*;

#[test]
fn test_decode_bcd_valid() {
    // Least significant byte first: 0x12 0x34 0x56 0x78 reads as 78563412
    let input = &[0x12, 0x34, 0x56, 0x78];
    let (remaining, value) = decode_bcd(input, 4).unwrap();
    assert_eq!(value, 78563412);
    assert!(remaining.is_empty());
}

#[test]
fn test_decode_bcd_negative() {
    let (_, value) = decode_bcd(&[0x34, 0xF2], 2).unwrap();
    assert_eq!(value, -234);
}

#[test]
fn test_decode_bcd_with_remainder() {
    let (remaining, value) = decode_bcd(&[0x99, 0x01, 0xAA], 2).unwrap();
    assert_eq!(value, 199);
    assert_eq!(remaining, &[0xAA]);
}

#[test]
fn test_decode_bcd_rejects_hex_digits() {
    assert!(decode_bcd(&[0x1A, 0x00], 2).is_err());
    // F is only a sign in the top nibble of the last byte
    assert!(decode_bcd(&[0xF1, 0x00], 2).is_err());
}

#[test]
fn test_decode_int_sign_extension() {
    assert_eq!(decode_int(&[0xFF], 1).unwrap().1, -1);
    assert_eq!(decode_int(&[0x00, 0x80], 2).unwrap().1, -32768);
    assert_eq!(decode_int(&[0xFF, 0xFF, 0x7F], 3).unwrap().1, 0x7FFFFF);
    assert_eq!(decode_int(&[0xFF; 6], 6).unwrap().1, -1);
    assert_eq!(decode_int(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x80], 6).unwrap().1, -(1 << 47));
    assert_eq!(
        decode_int(&[0x01, 0, 0, 0, 0, 0, 0, 0x80, 0xAA], 8).unwrap(),
        (&[0xAA][..], i64::MIN + 1)
    );
    assert_eq!(decode_uint(&[0xFF, 0xFF], 2).unwrap().1, 0xFFFF);
    assert!(decode_int(&[0x01], 2).is_err());
}

#[test]
fn test_decode_real() {
    let (_, value) = decode_real(&[0x00, 0x00, 0xB8, 0x42]).unwrap();
    assert_eq!(value, 92.0);
}

#[test]
fn test_decode_dates() {
    let (_, date) = decode_date(&[0xBF, 0x1C]).unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2013, 12, 31).unwrap());

    let (_, datetime) = decode_datetime_cp32(&[0x17, 0x2E, 0xCC, 0x13]).unwrap();
    assert_eq!(
        datetime,
        NaiveDate::from_ymd_opt(2014, 3, 12)
            .unwrap()
            .and_hms_opt(14, 23, 0)
            .unwrap()
    );

    // IV flag set
    assert!(decode_datetime_cp32(&[0x97, 0x2E, 0xCC, 0x13]).is_err());
    // 31 February
    assert!(decode_date(&[0x3F, 0x32]).is_err());
}

#[test]
fn test_decode_cp48() {
    let bytes = encode_datetime_cp48(
        NaiveDate::from_ymd_opt(1999, 6, 1)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap(),
    )
    .unwrap();
    let (_, datetime) = decode_datetime_cp48(&bytes).unwrap();
    assert_eq!(datetime.to_string(), "1999-06-01 23:59:58");
}

#[test]
fn test_text_is_reversed() {
    let (_, text) = decode_text(b"RETEM", 5).unwrap();
    assert_eq!(text, "METER");
    assert_eq!(encode_text("METER").unwrap(), b"RETEM".to_vec());
}

#[test]
fn test_manufacturer_codes() {
    assert_eq!(manufacturer_code(0x2C2D), "KAM");
    assert_eq!(decode_manufacturer(&[0x93, 0x15]).unwrap().1, "ELS");
    assert_eq!(encode_manufacturer("EFE").unwrap(), [0xC5, 0x14]);
    assert!(encode_manufacturer("kam").is_err());
    assert!(encode_manufacturer("KAMS").is_err());
}

#[test]
fn test_encoders_reject_out_of_range() {
    assert_eq!(
        encode_int(128, 1),
        Err(MBusEncodeError::ValueOutOfRange { value: 128, width: 1 })
    );
    assert_eq!(encode_int(1, 9), Err(MBusEncodeError::InvalidWidth(9)));
    assert!(encode_bcd(-1000, 2).is_err());
    assert_eq!(encode_bcd(-999, 2).unwrap(), vec![0x99, 0xF9]);
    assert_eq!(
        encode_date(NaiveDate::from_ymd_opt(2081, 1, 1).unwrap()),
        Err(MBusEncodeError::DateOutOfRange)
    );
}
