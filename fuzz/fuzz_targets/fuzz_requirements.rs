#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = depbom::parsers::parse_requirements(s);
        let _ = depbom::parsers::parse_setup_py(s);
    }
});
