#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_telegram::{FrameBuilder, MBusError, TelegramIter};

fuzz_target!(|data: &[u8]| {
    // Valid long frames built from the input, each followed by an ACK, then
    // the raw input appended as garbage.
    let mut stream = Vec::new();
    for chunk in data.chunks(64) {
        let ci = chunk.first().copied().unwrap_or(0x72);
        if let Ok(bytes) = FrameBuilder::long(0x08, 0x01, ci).payload(chunk).build() {
            stream.extend_from_slice(&bytes);
            stream.push(0xE5);
        }
    }
    stream.extend_from_slice(data);

    let mut iter = TelegramIter::new(&stream);
    while let Some(result) = iter.next() {
        if let Err(err) = result {
            // Inside the well-framed prefix only the application layer can fail.
            if iter.remaining().len() > data.len() {
                assert!(matches!(err, MBusError::MalformedDifChain { .. }));
            }
            break;
        }
    }
    assert!(iter.next().is_none());
});
