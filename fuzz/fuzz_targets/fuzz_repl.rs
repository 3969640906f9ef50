//! Fuzz script replay
//!
//! Runs the whole pipeline, including `check-sat` and `get-model`, on a
//! fresh session per input. Solver errors are responses, not panics.

#![no_main]

use finsat::repl::ReplState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut state = ReplState::new();
        let _ = state.execute_script(input);
        let _ = state.model_text();
    }
});
