#![no_main]
use libfuzzer_sys::fuzz_target;

use augmented_avl::model::{run_vec_equivalence, ListOp};

fuzz_target!(|ops: Vec<ListOp>| { run_vec_equivalence(ops) });
