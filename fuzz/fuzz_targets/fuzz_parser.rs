//! Fuzz the script front end
//!
//! Exercises the lexer, parser and elaboration. Malformed input must come
//! back as an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = finsat::load(input);
    }
});
