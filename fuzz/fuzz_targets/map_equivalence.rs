#![no_main]
use libfuzzer_sys::fuzz_target;

use augmented_avl::model::{run_sorted_equivalence, MapOp};

fuzz_target!(|ops: Vec<MapOp>| { run_sorted_equivalence(ops) });
