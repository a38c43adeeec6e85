#![no_main]

use augmented_avl::model::CursorEquivalenceInput;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    augmented_avl::model::run_cursor_equivalence(input.values, input.ops);
});
