#![no_main]

use libfuzzer_sys::fuzz_target;
use testrig::SymbolIndex;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic
    if let Ok(index) = SymbolIndex::from_json_slice(data) {
        // Names are unique and sorted
        let names: Vec<&str> = index.names().collect();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.iter().all(|n| !n.is_empty()));
    }
});
