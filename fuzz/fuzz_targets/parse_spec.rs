#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(spec) = golocate::Spec::parse(input) {
            assert!(!spec.module_path.is_empty());
        }
    }
});
