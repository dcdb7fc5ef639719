#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_telegram::payload::vif::parse_vib;
use mbus_telegram::payload::ValueInformationBlock;
use mbus_telegram::util::ByteCursor;

fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);
    if let Ok(vib) = parse_vib(&mut cursor, 0) {
        // Encoding a decoded block yields exactly the bytes that were read.
        let read = &data[..cursor.position()];
        assert_eq!(vib.to_bytes(), read);
        assert_eq!(ValueInformationBlock::decode(read), Ok(vib));
    }
});
