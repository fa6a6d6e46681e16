#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the line-oriented yarn.lock reader, including the v2 YAML form.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = depbom::parsers::parse_yarn_lock(s);
    }
});
