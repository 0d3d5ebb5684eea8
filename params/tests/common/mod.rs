//! Shared test utilities for parameter integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use redlilium_params::{
    ConstantDefinition, ConstantType, NamedConstantTable, ParameterSet, SharedParameterBlock,
    SharedParameterBlockRef,
};

/// Install a test logger once. Repeated calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A single named definition used to build target tables by hand.
pub struct TargetConstant {
    pub name: &'static str,
    pub constant_type: ConstantType,
    pub physical_index: usize,
    pub element_size: usize,
    pub array_size: usize,
}

impl TargetConstant {
    pub fn new(
        name: &'static str,
        constant_type: ConstantType,
        physical_index: usize,
        element_size: usize,
        array_size: usize,
    ) -> Self {
        Self {
            name,
            constant_type,
            physical_index,
            element_size,
            array_size,
        }
    }
}

/// Build a parameter set whose named table holds exactly `constants`.
///
/// Buffer sizes are computed from the furthest extent of each buffer.
pub fn target_set(constants: &[TargetConstant], transpose: bool) -> ParameterSet {
    let mut table = NamedConstantTable::new();
    let mut float_size = 0;
    let mut int_size = 0;
    for c in constants {
        let def = ConstantDefinition::new(c.constant_type, c.physical_index, c.element_size, c.array_size);
        let end = c.physical_index + c.element_size * c.array_size;
        if def.is_float() {
            float_size = float_size.max(end);
        } else {
            int_size = int_size.max(end);
        }
        table.insert(c.name, def);
    }
    table.set_float_buffer_size(float_size);
    table.set_int_buffer_size(int_size);

    let mut params = ParameterSet::default();
    params.set_transpose_matrices(transpose);
    params.set_named_constants(Arc::new(table));
    params
}

/// Build a shared block with the given `(name, type, array_size)` definitions.
pub fn shared_block(name: &str, constants: &[(&str, ConstantType, usize)]) -> SharedParameterBlockRef {
    let mut block = SharedParameterBlock::new(name);
    for (constant, constant_type, array_size) in constants {
        block
            .add_constant_definition(constant, *constant_type, *array_size)
            .expect("valid shared definition");
    }
    block.into_shared()
}

/// Values `start, start + 1, ...` of the given length.
pub fn ramp(start: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| start + i as f32).collect()
}
