#![no_main]

use libfuzzer_sys::fuzz_target;
use testrig::TestOnly;
use testrig::select::NamePattern;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let parsed = TestOnly::parse(s);
        // The scope is a suffix of the selector
        if let Some(hint) = &parsed.hint {
            assert!(s.ends_with(hint.as_str()));
        }
        // Invalid patterns are errors, not panics
        if let Some(pattern) = parsed.pattern.as_deref() {
            let _ = NamePattern::new(pattern);
        }
    }
});
