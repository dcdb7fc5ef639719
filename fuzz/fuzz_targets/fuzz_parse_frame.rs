#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_telegram::mbus::frame::parse_frame;
use mbus_telegram::mbus::pack::pack_frame;
use mbus_telegram::{parse_telegram, MBusError};

fuzz_target!(|data: &[u8]| {
    match parse_frame(data) {
        Ok((rest, frame)) => {
            // A frame that parsed re-encodes to the bytes it came from.
            let consumed = &data[..data.len() - rest.len()];
            assert_eq!(frame.len(), consumed.len());
            assert_eq!(&pack_frame(&frame)[..], consumed);
        }
        Err(err) => assert!(err.is_frame_error()),
    }

    if let Ok(telegram) = parse_telegram(data) {
        assert!(telegram.frame_len <= data.len());
        if let Some(err) = &telegram.error {
            assert!(err.is_recoverable());
        }
    }

    // Force consistent length fields so the checks past the header run too.
    if data.len() >= 6 && data[0] == 0x68 {
        let mut mutated = data.to_vec();
        let l = (data.len() as u8).wrapping_sub(6);
        mutated[1] = l;
        mutated[2] = l;
        if let Err(err) = parse_frame(&mutated) {
            assert!(!matches!(err, MBusError::LengthFieldMismatch { .. }));
        }
    }
});
