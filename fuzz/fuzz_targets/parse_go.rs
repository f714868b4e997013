#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Errors are fine; panics are not.
        if let Ok(file) = golocate::parse_source(Path::new("fuzz.go"), input) {
            for group in &file.comment_groups {
                let _ = group.text();
                let _ = file.comment_anchor(group).map(|span| file.position(span.offset));
            }
            let _ = file.import_block().map(|(start, end)| (file.position(start), file.position(end)));
        }
    }
});
