#![no_main]

use libfuzzer_sys::fuzz_target;
use motoko::api;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        let strict = api::parse(s, false);
        assert!(strict.code.is_some() || !strict.diagnostics.is_empty());
        let _ = api::parse(s, true);
    }
});
