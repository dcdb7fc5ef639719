use mbus_telegram::mbus::frame::{calculate_checksum, classify_frame, parse_frame, read_frame};
use mbus_telegram::mbus::pack::{pack_frame, FrameBuilder};
use mbus_telegram::util::ByteCursor;
use mbus_telegram::{parse_telegram, Address, Function, MBusError, MBusFrameType};

#[test]
fn test_ack_frame() {
    let telegram = parse_telegram(&[0xE5]).unwrap();
    assert_eq!(telegram.frame_type, MBusFrameType::Ack);
    assert_eq!(telegram.frame_len, 1);
    assert!(telegram.records.is_empty());
}

#[test]
fn test_short_frame() {
    let data = [0x10, 0x7B, 0x8B, 0x06, 0x16];
    let telegram = parse_telegram(&data).unwrap();
    assert_eq!(telegram.frame_type, MBusFrameType::Short);
    assert_eq!(telegram.control, 0x7B);
    assert_eq!(telegram.address, 0x8B);
    assert_eq!(telegram.addressing, Some(Address::Primary(0x8B)));
    assert!(telegram.records.is_empty());
}

#[test]
fn test_short_frame_checksum_before_stop() {
    // Both checksum and stop byte are wrong; the checksum is reported.
    let data = [0x10, 0x5B, 0x01, 0x00, 0x00];
    assert_eq!(
        parse_frame(&data).unwrap_err(),
        MBusError::ChecksumMismatch {
            offset: 3,
            expected: 0x00,
            calculated: 0x5C
        }
    );

    let data = [0x10, 0x5B, 0x01, 0x5C, 0x17];
    assert_eq!(
        parse_frame(&data).unwrap_err(),
        MBusError::BadDelimiter {
            offset: 4,
            expected: 0x16,
            found: 0x17
        }
    );
}

#[test]
fn test_length_field_mismatch() {
    let data = [0x68, 0x06, 0x07, 0x68, 0x08, 0x01, 0x78, 0x01, 0x13, 0x2A, 0xBF, 0x16];
    let err = parse_telegram(&data).unwrap_err();
    assert_eq!(
        err,
        MBusError::LengthFieldMismatch {
            offset: 1,
            first: 0x06,
            second: 0x07
        }
    );
    assert!(err.is_frame_error());
}

#[test]
fn test_incomplete_frame() {
    let data = [0x68, 0x06, 0x06, 0x68, 0x08, 0x01, 0x78, 0x01];
    assert_eq!(
        parse_frame(&data).unwrap_err(),
        MBusError::IncompleteFrame {
            offset: 0,
            needed: 12,
            available: 8
        }
    );

    assert!(matches!(
        parse_frame(&[0x10, 0x7B]),
        Err(MBusError::IncompleteFrame { needed: 5, available: 2, .. })
    ));
}

#[test]
fn test_bad_second_start_byte() {
    let data = [0x68, 0x03, 0x03, 0x69, 0x53, 0xFE, 0x51, 0xA2, 0x16];
    assert_eq!(
        parse_frame(&data).unwrap_err(),
        MBusError::BadDelimiter {
            offset: 3,
            expected: 0x68,
            found: 0x69
        }
    );
}

#[test]
fn test_long_frame_checksum() {
    let mut data = vec![0x68, 0x06, 0x06, 0x68, 0x08, 0x01, 0x78, 0x01, 0x13, 0x2A, 0xBF, 0x16];
    assert!(parse_frame(&data).is_ok());
    data[9] = 0x2B;
    assert_eq!(
        parse_frame(&data).unwrap_err(),
        MBusError::ChecksumMismatch {
            offset: 10,
            expected: 0xBF,
            calculated: 0xC0
        }
    );
}

#[test]
fn test_unknown_start() {
    assert_eq!(
        classify_frame(&[0x00, 0x01]).unwrap_err(),
        MBusError::UnknownFrameStart {
            offset: 0,
            byte: 0x00
        }
    );
}

#[test]
fn test_read_frame_advances_over_back_to_back_frames() {
    let mut data = vec![0xE5];
    data.extend_from_slice(&[0x10, 0x40, 0xFE, 0x3E, 0x16]);
    let mut cursor = ByteCursor::new(&data);

    let ack = read_frame(&mut cursor).unwrap();
    assert_eq!(ack.frame_type, MBusFrameType::Ack);
    assert_eq!(cursor.position(), 1);

    let reset = read_frame(&mut cursor).unwrap();
    assert_eq!(reset.offset, 1);
    assert_eq!(reset.function(), Some(Function::SndNke));
    assert_eq!(reset.address(), Some(Address::Broadcast { reply_required: true }));
    assert!(cursor.is_empty());
}

#[test]
fn test_builder_matches_parser() {
    let bytes = FrameBuilder::long(0x53, 0x05, 0x51)
        .payload(&[0x01, 0xFD, 0x1B, 0x00])
        .build()
        .unwrap();
    let (rest, frame) = parse_frame(&bytes).unwrap();
    assert!(rest.is_empty());
    assert_eq!(frame.declared_length, Some(7));
    assert_eq!(frame.payload, &[0x01, 0xFD, 0x1B, 0x00]);
    assert_eq!(frame.checksum, calculate_checksum(&bytes[4..11]));
    assert_eq!(pack_frame(&frame), bytes);
}
