//! Concurrency tests for the shared logical buffer map.
//!
//! Several parameter sets of one program resolve logical indices at the same
//! time. Every index must end up with exactly one region, regions must not
//! overlap and offsets must never change after first assignment.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rstest::rstest;

use common::init_logging;
use redlilium_params::{CompiledProgram, LogicalBufferMap, Variability};

#[rstest]
#[case::two_threads(2)]
#[case::eight_threads(8)]
fn test_concurrent_use_is_consistent(#[case] threads: usize) {
    init_logging();
    let map = Arc::new(LogicalBufferMap::new());
    let indices: Vec<usize> = (0..64).map(|i| i * 4).collect();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let map = Arc::clone(&map);
            let indices = indices.clone();
            thread::spawn(move || {
                let mut seen = HashMap::new();
                // Each thread walks the indices in a different order.
                for step in 0..indices.len() {
                    let logical = indices[(step * (t + 1)) % indices.len()];
                    let index_use = map.use_index(logical, 4, Variability::GLOBAL).unwrap();
                    seen.insert(logical, index_use.physical_index);
                }
                seen
            })
        })
        .collect();

    let results: Vec<HashMap<usize, usize>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    for logical in &indices {
        let physical = map.get(*logical).unwrap().physical_index;
        for seen in &results {
            if let Some(observed) = seen.get(logical) {
                assert_eq!(*observed, physical, "logical {logical} moved");
            }
        }
    }

    let mut starts: Vec<usize> = indices
        .iter()
        .map(|logical| map.get(*logical).unwrap().physical_index)
        .collect();
    starts.sort_unstable();
    starts.dedup();
    assert_eq!(starts.len(), indices.len());
    assert_eq!(map.buffer_size(), indices.len() * 4);
}

#[test]
fn test_parameter_sets_share_offsets() {
    let program = CompiledProgram::low_level("asm");
    let mut first = program.create_parameters();
    let mut second = program.create_parameters();

    first.set_constant_floats(10, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    second.set_constant_floats(20, &[5.0, 6.0, 7.0, 8.0]).unwrap();
    second.set_constant_floats(10, &[9.0, 9.0, 9.0, 9.0]).unwrap();

    let map = program.float_logical_buffer();
    assert_eq!(map.get(10).unwrap().physical_index, 0);
    assert_eq!(map.get(20).unwrap().physical_index, 4);

    assert_eq!(&second.float_constants()[..4], &[9.0; 4]);
    assert_eq!(&second.float_constants()[4..8], &[5.0, 6.0, 7.0, 8.0]);
    assert_eq!(&first.float_constants()[..4], &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_growth_never_relocates() {
    let map = LogicalBufferMap::new();
    let first = map.use_index(0, 4, Variability::GLOBAL).unwrap();
    map.use_index(1, 4, Variability::GLOBAL).unwrap();

    let after = map.use_index(0, 32, Variability::GLOBAL).unwrap();
    assert_eq!(after.physical_index, first.physical_index);
    assert_eq!(map.get(1).unwrap().physical_index, 4);
}
