//! Per-draw GPU program parameter sets.
//!
//! A [`ParameterSet`] owns the float and int values one draw call binds. Its
//! layout comes from the compiled program: the named constant table for
//! high-level programs, the logical buffer maps for register-addressed
//! programs, or both. Values arrive from three places:
//!
//! - direct writes, by name, logical index or physical offset
//! - auto constants, filled in by the render loop via [`AutoConstantSource`]
//! - shared parameter blocks, copied in by [`ParameterSet::copy_shared_params`]
//!
//! # Example
//!
//! ```ignore
//! let program = ProgramCompiler::new("lit")
//!     .with_constant(ReflectedConstant::new("worldViewProj", ConstantType::Matrix4x4, 1, 16))
//!     .with_constant(ReflectedConstant::new("lightPos", ConstantType::Float4, 1, 4))
//!     .compile()?;
//!
//! let mut params = program.create_parameters();
//! params.set_named_auto_constant("worldViewProj", AutoConstantType::WorldViewProjMatrix, AutoConstantPayload::Int(0))?;
//! params.set_named_floats("lightPos", &[0.0, 10.0, 0.0, 1.0])?;
//! params.update_auto_constants(&render_state, Variability::ALL);
//! ```

use std::sync::Arc;

use crate::auto::{
    AutoConstantEntry, AutoConstantPayload, AutoConstantRegistry, AutoConstantSource,
    AutoConstantType,
};
use crate::error::{ParamsError, ParamsResult};
use crate::logical::{LogicalBufferMap, LogicalIndexUse};
use crate::named::{ConstantDefinition, NamedConstantTable, split_array_subscript};
use crate::shared::{
    CopyTarget, SharedParameterBlockRef, SharedParameterRegistry, SharedParameterUsage,
};
use crate::storage::{FloatConstantStorage, IntConstantStorage};
use crate::types::Variability;

/// Behaviour switches for a [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterSetConfig {
    /// Transpose 4x4 matrices when writing them (column-major GPU layouts).
    pub transpose_matrices: bool,
    /// Silently ignore named writes to parameters the program does not have.
    pub ignore_missing_parameters: bool,
    /// Instances drawn per step of instance data. Must be positive.
    pub instance_data_step_rate: u32,
}

impl Default for ParameterSetConfig {
    fn default() -> Self {
        Self {
            transpose_matrices: false,
            ignore_missing_parameters: false,
            instance_data_step_rate: 1,
        }
    }
}

impl ParameterSetConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable matrix transposition.
    pub fn with_transpose_matrices(mut self, transpose: bool) -> Self {
        self.transpose_matrices = transpose;
        self
    }

    /// Enable or disable ignoring missing named parameters.
    pub fn with_ignore_missing_parameters(mut self, ignore: bool) -> Self {
        self.ignore_missing_parameters = ignore;
        self
    }

    /// Set the instance data step rate.
    pub fn with_instance_data_step_rate(mut self, rate: u32) -> Self {
        self.instance_data_step_rate = rate;
        self
    }

    /// Check the configuration for out-of-range values.
    pub fn validate(&self) -> ParamsResult<()> {
        if self.instance_data_step_rate == 0 {
            return Err(ParamsError::InvalidArgument(
                "instance data step rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameter values for one use of a GPU program.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    config: ParameterSetConfig,
    floats: FloatConstantStorage,
    ints: IntConstantStorage,
    named: Option<Arc<NamedConstantTable>>,
    float_logical: Option<Arc<LogicalBufferMap>>,
    int_logical: Option<Arc<LogicalBufferMap>>,
    autos: AutoConstantRegistry,
    shared: Vec<SharedParameterUsage>,
    pass_iteration_index: Option<usize>,
}

impl ParameterSet {
    /// Create an empty parameter set with no layout attached.
    pub fn new(config: ParameterSetConfig) -> ParamsResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current configuration.
    pub fn config(&self) -> &ParameterSetConfig {
        &self.config
    }

    /// Whether 4x4 matrices are transposed on write.
    pub fn transpose_matrices(&self) -> bool {
        self.config.transpose_matrices
    }

    /// Set whether 4x4 matrices are transposed on write.
    pub fn set_transpose_matrices(&mut self, transpose: bool) {
        self.config.transpose_matrices = transpose;
    }

    /// Whether named writes to missing parameters are ignored.
    pub fn ignore_missing_parameters(&self) -> bool {
        self.config.ignore_missing_parameters
    }

    /// Set whether named writes to missing parameters are ignored.
    pub fn set_ignore_missing_parameters(&mut self, ignore: bool) {
        self.config.ignore_missing_parameters = ignore;
    }

    /// Instance data step rate.
    pub fn instance_data_step_rate(&self) -> u32 {
        self.config.instance_data_step_rate
    }

    /// Set the instance data step rate. Values below 1 are rejected.
    pub fn set_instance_data_step_rate(&mut self, rate: i64) -> ParamsResult<()> {
        let rate = u32::try_from(rate)
            .ok()
            .filter(|rate| *rate > 0)
            .ok_or_else(|| {
                ParamsError::InvalidArgument(format!(
                    "instance data step rate must be positive, got {rate}"
                ))
            })?;
        self.config.instance_data_step_rate = rate;
        Ok(())
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Attach a named constant table, growing storage to fit it.
    ///
    /// Shared usages drop their copy plans, since destination offsets come
    /// from the table.
    pub fn set_named_constants(&mut self, named: Arc<NamedConstantTable>) {
        self.floats.resize(named.float_buffer_size());
        self.ints.resize(named.int_buffer_size());
        self.named = Some(named);
        for usage in &mut self.shared {
            usage.invalidate();
        }
    }

    /// Attach logical buffer maps, growing storage to fit them.
    pub fn set_logical_indexes(
        &mut self,
        float_map: Arc<LogicalBufferMap>,
        int_map: Arc<LogicalBufferMap>,
    ) {
        self.floats.resize(float_map.buffer_size());
        self.ints.resize(int_map.buffer_size());
        self.float_logical = Some(float_map);
        self.int_logical = Some(int_map);
    }

    /// Returns true if a named constant table is attached.
    pub fn has_named_constants(&self) -> bool {
        self.named.is_some()
    }

    /// Returns true if logical buffer maps are attached.
    pub fn has_logical_indexed_constants(&self) -> bool {
        self.float_logical.is_some()
    }

    /// The attached named constant table.
    pub fn named_constants(&self) -> Option<&NamedConstantTable> {
        self.named.as_deref()
    }

    /// The attached float logical buffer map.
    pub fn float_logical_buffer(&self) -> Option<&Arc<LogicalBufferMap>> {
        self.float_logical.as_ref()
    }

    /// The attached int logical buffer map.
    pub fn int_logical_buffer(&self) -> Option<&Arc<LogicalBufferMap>> {
        self.int_logical.as_ref()
    }

    /// Float values, ready for upload.
    pub fn float_constants(&self) -> &[f32] {
        self.floats.as_slice()
    }

    /// Int values, ready for upload.
    pub fn int_constants(&self) -> &[i32] {
        self.ints.as_slice()
    }

    /// Float storage.
    pub fn float_storage(&self) -> &FloatConstantStorage {
        &self.floats
    }

    /// Int storage.
    pub fn int_storage(&self) -> &IntConstantStorage {
        &self.ints
    }

    // ========================================================================
    // Named constants
    // ========================================================================

    /// Look up a named constant.
    ///
    /// With `fail_if_missing`, a set without a named table fails with
    /// [`ParamsError::NotInitialized`] and an absent name with
    /// [`ParamsError::NotFound`]. Otherwise both cases return `Ok(None)`.
    pub fn find_named_constant_definition(
        &self,
        name: &str,
        fail_if_missing: bool,
    ) -> ParamsResult<Option<&ConstantDefinition>> {
        match &self.named {
            Some(named) => named.find(name, fail_if_missing),
            None if fail_if_missing => Err(ParamsError::NotInitialized {
                name: name.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Definition for a named write, honouring `ignore_missing_parameters`.
    fn named_target(&self, name: &str, want_float: bool) -> ParamsResult<Option<ConstantDefinition>> {
        let strict = !self.config.ignore_missing_parameters;
        let Some(def) = self.find_named_constant_definition(name, strict)? else {
            return Ok(None);
        };
        if def.is_float() != want_float {
            return Err(ParamsError::InvalidArgument(format!(
                "parameter '{name}' is {:?}",
                def.constant_type
            )));
        }
        Ok(Some(def.clone()))
    }

    /// Write float values to a named constant.
    ///
    /// At most `element_size * array_size` values are written.
    pub fn set_named_floats(&mut self, name: &str, values: &[f32]) -> ParamsResult<()> {
        if let Some(def) = self.named_target(name, true)? {
            let count = values.len().min(def.total_size());
            self.floats.write(def.physical_index, &values[..count]);
        }
        Ok(())
    }

    /// Write int values to a named constant.
    pub fn set_named_ints(&mut self, name: &str, values: &[i32]) -> ParamsResult<()> {
        if let Some(def) = self.named_target(name, false)? {
            let count = values.len().min(def.total_size());
            self.ints.write(def.physical_index, &values[..count]);
        }
        Ok(())
    }

    /// Write one float value to a named constant.
    pub fn set_named_float(&mut self, name: &str, value: f32) -> ParamsResult<()> {
        self.set_named_floats(name, &[value])
    }

    /// Write one int value to a named constant.
    pub fn set_named_int(&mut self, name: &str, value: i32) -> ParamsResult<()> {
        self.set_named_ints(name, &[value])
    }

    /// Write a row-major 4x4 matrix to a named constant, transposing it if
    /// the set is configured to.
    pub fn set_named_matrix4(&mut self, name: &str, matrix: &[f32; 16]) -> ParamsResult<()> {
        if self.config.transpose_matrices {
            self.set_named_floats(name, &transpose4(matrix))
        } else {
            self.set_named_floats(name, matrix)
        }
    }

    /// Read the values of a named float constant.
    pub fn named_floats(&self, name: &str) -> ParamsResult<&[f32]> {
        let def = self.required_definition(name)?;
        self.floats
            .read(def.physical_index, def.total_size())
            .ok_or_else(|| out_of_range(name))
    }

    /// Read the values of a named int constant.
    pub fn named_ints(&self, name: &str) -> ParamsResult<&[i32]> {
        let def = self.required_definition(name)?;
        self.ints
            .read(def.physical_index, def.total_size())
            .ok_or_else(|| out_of_range(name))
    }

    fn required_definition(&self, name: &str) -> ParamsResult<&ConstantDefinition> {
        self.find_named_constant_definition(name, true)?
            .ok_or_else(|| ParamsError::NotFound {
                name: name.to_string(),
            })
    }

    // ========================================================================
    // Raw (physical) access
    // ========================================================================

    /// Write floats at a physical offset. Returns the number written.
    pub fn write_raw_floats(&mut self, physical_index: usize, values: &[f32]) -> usize {
        self.floats.write(physical_index, values)
    }

    /// Write ints at a physical offset. Returns the number written.
    pub fn write_raw_ints(&mut self, physical_index: usize, values: &[i32]) -> usize {
        self.ints.write(physical_index, values)
    }

    /// Read floats at a physical offset.
    pub fn read_raw_floats(&self, physical_index: usize, count: usize) -> Option<&[f32]> {
        self.floats.read(physical_index, count)
    }

    /// Read ints at a physical offset.
    pub fn read_raw_ints(&self, physical_index: usize, count: usize) -> Option<&[i32]> {
        self.ints.read(physical_index, count)
    }

    // ========================================================================
    // Logical (register) access
    // ========================================================================

    fn float_map(&self) -> ParamsResult<&Arc<LogicalBufferMap>> {
        self.float_logical.as_ref().ok_or_else(|| {
            ParamsError::UnsupportedOperation(
                "parameter set has no logical float constants".to_string(),
            )
        })
    }

    fn int_map(&self) -> ParamsResult<&Arc<LogicalBufferMap>> {
        self.int_logical.as_ref().ok_or_else(|| {
            ParamsError::UnsupportedOperation(
                "parameter set has no logical int constants".to_string(),
            )
        })
    }

    /// Resolve (allocating if needed) the float region for a logical index
    /// and grow storage to cover it.
    pub fn float_logical_index_use(
        &mut self,
        logical_index: usize,
        requested_size: usize,
        variability: Variability,
    ) -> ParamsResult<Option<LogicalIndexUse>> {
        let map = Arc::clone(self.float_map()?);
        let index_use = map.use_index(logical_index, requested_size, variability);
        self.floats.resize(map.buffer_size());
        Ok(index_use)
    }

    /// Resolve (allocating if needed) the int region for a logical index
    /// and grow storage to cover it.
    pub fn int_logical_index_use(
        &mut self,
        logical_index: usize,
        requested_size: usize,
        variability: Variability,
    ) -> ParamsResult<Option<LogicalIndexUse>> {
        let map = Arc::clone(self.int_map()?);
        let index_use = map.use_index(logical_index, requested_size, variability);
        self.ints.resize(map.buffer_size());
        Ok(index_use)
    }

    /// Write floats at a logical index. The request is rounded up to whole
    /// 4-component registers.
    pub fn set_constant_floats(&mut self, logical_index: usize, values: &[f32]) -> ParamsResult<()> {
        let requested = values.len().div_ceil(4) * 4;
        if let Some(index_use) =
            self.float_logical_index_use(logical_index, requested, Variability::GLOBAL)?
        {
            let count = values.len().min(index_use.current_size);
            self.floats.write(index_use.physical_index, &values[..count]);
        }
        Ok(())
    }

    /// Write ints at a logical index.
    pub fn set_constant_ints(&mut self, logical_index: usize, values: &[i32]) -> ParamsResult<()> {
        let requested = values.len().div_ceil(4) * 4;
        if let Some(index_use) =
            self.int_logical_index_use(logical_index, requested, Variability::GLOBAL)?
        {
            let count = values.len().min(index_use.current_size);
            self.ints.write(index_use.physical_index, &values[..count]);
        }
        Ok(())
    }

    /// Logical index whose region starts at a physical offset.
    pub fn logical_index_for_physical(&self, physical_index: usize, is_float: bool) -> Option<usize> {
        let map = if is_float {
            self.float_logical.as_ref()
        } else {
            self.int_logical.as_ref()
        };
        map.and_then(|map| map.logical_for_physical(physical_index))
    }

    // ========================================================================
    // Auto constants
    // ========================================================================

    /// Register an auto constant at a raw physical offset.
    ///
    /// Replaces any auto constant already bound there.
    pub fn set_raw_auto_constant(
        &mut self,
        physical_index: usize,
        constant_type: AutoConstantType,
        payload: AutoConstantPayload,
        variability: Variability,
        element_count: usize,
    ) {
        let entry = AutoConstantEntry::new(constant_type, physical_index, payload, variability)
            .with_element_count(element_count);
        self.autos.register(entry);
        self.floats.resize(physical_index + element_count);

        if constant_type == AutoConstantType::PassIterationNumber {
            self.pass_iteration_index = Some(physical_index);
        }
    }

    /// Bind an auto constant to a logical index.
    ///
    /// The region is sized to the type's element count rounded up to whole
    /// registers.
    pub fn set_auto_constant(
        &mut self,
        logical_index: usize,
        constant_type: AutoConstantType,
        payload: AutoConstantPayload,
    ) -> ParamsResult<()> {
        let definition = constant_type.definition();
        let size = definition.element_count.div_ceil(4) * 4;
        let variability = definition.variability;

        let Some(index_use) = self.float_logical_index_use(logical_index, size, variability)?
        else {
            return Ok(());
        };
        self.float_map()?.set_variability(logical_index, variability);
        self.set_raw_auto_constant(
            index_use.physical_index,
            constant_type,
            payload,
            variability,
            size,
        );
        Ok(())
    }

    /// Bind an auto constant with real extra data to a logical index.
    pub fn set_auto_constant_real(
        &mut self,
        logical_index: usize,
        constant_type: AutoConstantType,
        data: f32,
    ) -> ParamsResult<()> {
        self.set_auto_constant(logical_index, constant_type, AutoConstantPayload::Real(data))
    }

    /// Bind an auto constant to a named parameter.
    pub fn set_named_auto_constant(
        &mut self,
        name: &str,
        constant_type: AutoConstantType,
        payload: AutoConstantPayload,
    ) -> ParamsResult<()> {
        if let Some(def) = self.named_target(name, true)? {
            self.set_raw_auto_constant(
                def.physical_index,
                constant_type,
                payload,
                constant_type.derive_variability(),
                def.element_size,
            );
        }
        Ok(())
    }

    /// Bind an auto constant with real extra data to a named parameter.
    pub fn set_named_auto_constant_real(
        &mut self,
        name: &str,
        constant_type: AutoConstantType,
        data: f32,
    ) -> ParamsResult<()> {
        self.set_named_auto_constant(name, constant_type, AutoConstantPayload::Real(data))
    }

    fn forget_auto_at(&mut self, physical_index: usize) {
        if self.autos.remove_for_physical(physical_index).is_some()
            && self.pass_iteration_index == Some(physical_index)
        {
            self.pass_iteration_index = None;
        }
    }

    /// Unbind the auto constant at a logical index.
    pub fn clear_auto_constant(&mut self, logical_index: usize) {
        let Some(map) = self.float_logical.clone() else {
            return;
        };
        if let Some(index_use) = map.get(logical_index) {
            map.set_variability(logical_index, Variability::GLOBAL);
            self.forget_auto_at(index_use.physical_index);
        }
    }

    /// Unbind the auto constant on a named parameter.
    pub fn clear_named_auto_constant(&mut self, name: &str) {
        let physical_index = self
            .named
            .as_ref()
            .and_then(|named| named.get(name))
            .map(|def| def.physical_index);
        if let Some(physical_index) = physical_index {
            self.forget_auto_at(physical_index);
        }
    }

    /// Unbind every auto constant.
    pub fn clear_auto_constants(&mut self) {
        self.autos.clear();
        self.pass_iteration_index = None;
    }

    /// Registered auto constants.
    pub fn auto_constants(&self) -> &AutoConstantRegistry {
        &self.autos
    }

    /// Returns true if any auto constant is registered.
    pub fn has_auto_constants(&self) -> bool {
        !self.autos.is_empty()
    }

    /// Union of the variability of all auto constants.
    pub fn combined_variability(&self) -> Variability {
        self.autos.combined_variability()
    }

    /// Auto constant bound at a physical offset.
    pub fn find_auto_constant_for_physical(&self, physical_index: usize) -> Option<&AutoConstantEntry> {
        self.autos.find_for_physical(physical_index)
    }

    /// Auto constant bound at a logical index.
    pub fn find_auto_constant(&self, logical_index: usize) -> Option<&AutoConstantEntry> {
        let index_use = self.float_logical.as_ref()?.get(logical_index)?;
        self.autos.find_for_physical(index_use.physical_index)
    }

    /// Auto constant bound to a named parameter.
    pub fn find_named_auto_constant(&self, name: &str) -> Option<&AutoConstantEntry> {
        let def = self.named.as_ref()?.get(name)?;
        self.autos.find_for_physical(def.physical_index)
    }

    /// Refresh every auto constant whose variability intersects `mask`.
    pub fn update_auto_constants(&mut self, source: &dyn AutoConstantSource, mask: Variability) {
        crate::profile_scope!("update_auto_constants");

        let transpose = self.config.transpose_matrices;
        let floats = self.floats.as_mut_slice();
        for entry in self.autos.iter() {
            if !entry.variability.intersects(mask) {
                continue;
            }
            let start = entry.physical_index.min(floats.len());
            let end = (entry.physical_index + entry.element_count).min(floats.len());
            let dest = &mut floats[start..end];
            source.write_auto_constant(entry, dest);

            if transpose && entry.constant_type.is_matrix4() && dest.len() >= 16 {
                transpose4_in_place(&mut dest[..16]);
            }
        }
    }

    /// Physical offset of the pass iteration number, if one is bound.
    pub fn pass_iteration_number_index(&self) -> Option<usize> {
        self.pass_iteration_index
    }

    /// Returns true if a pass iteration number auto constant is bound.
    pub fn has_pass_iteration_number(&self) -> bool {
        self.pass_iteration_index.is_some()
    }

    /// Increment the pass iteration number in place.
    pub fn inc_pass_iteration_number(&mut self) {
        let Some(index) = self.pass_iteration_index else {
            return;
        };
        if let Some(value) = self.floats.as_mut_slice().get_mut(index) {
            *value += 1.0;
        }
    }

    // ========================================================================
    // Shared parameters
    // ========================================================================

    /// Start consuming a shared block. Adding the same block twice is a no-op.
    pub fn add_shared_parameters(&mut self, block: SharedParameterBlockRef) {
        let name = block.read().name().to_string();
        if self.is_using_shared_parameters(&name) {
            return;
        }
        let usage = SharedParameterUsage::new(block, self.named.as_deref());
        self.shared.push(usage);
    }

    /// Start consuming a shared block looked up by name.
    pub fn add_shared_parameters_by_name(
        &mut self,
        registry: &SharedParameterRegistry,
        name: &str,
    ) -> ParamsResult<()> {
        let block = registry.find(name)?;
        self.add_shared_parameters(block);
        Ok(())
    }

    /// Returns true if this set consumes the named shared block.
    pub fn is_using_shared_parameters(&self, name: &str) -> bool {
        self.shared.iter().any(|usage| usage.name() == name)
    }

    /// Stop consuming the named shared block.
    pub fn remove_shared_parameters(&mut self, name: &str) {
        self.shared.retain(|usage| usage.name() != name);
    }

    /// Stop consuming every shared block.
    pub fn remove_all_shared_parameters(&mut self) {
        self.shared.clear();
    }

    /// Shared blocks this set consumes.
    pub fn shared_parameters(&self) -> &[SharedParameterUsage] {
        &self.shared
    }

    /// Copy all shared block values into this set.
    pub fn copy_shared_params(&mut self) -> ParamsResult<()> {
        crate::profile_scope!("copy_shared_params");

        for usage in &mut self.shared {
            usage.copy_shared_to_target(CopyTarget {
                named: self.named.as_deref(),
                floats: &mut self.floats,
                ints: &mut self.ints,
                transpose_matrices: self.config.transpose_matrices,
            })?;
        }
        Ok(())
    }

    // ========================================================================
    // Copying between sets
    // ========================================================================

    /// Copy all values, auto constants and shared usages from another set
    /// created from the same program.
    pub fn copy_constants_from(&mut self, other: &ParameterSet) {
        self.floats = other.floats.clone();
        self.ints = other.ints.clone();
        self.autos = other.autos.clone();
        self.pass_iteration_index = other.pass_iteration_index;
        let named = self.named.as_deref();
        self.shared = other
            .shared
            .iter()
            .map(|usage| SharedParameterUsage::new(Arc::clone(usage.block()), named))
            .collect();
    }

    /// Copy values of every named parameter both sets have, possibly across
    /// different programs.
    ///
    /// Each value is copied up to the smaller of the two sizes. Auto
    /// constants are re-bound at the new offsets and shared usages merged.
    pub fn copy_matching_named_constants_from(&mut self, other: &ParameterSet) {
        let (Some(ours), Some(theirs)) = (self.named.clone(), other.named.as_ref()) else {
            return;
        };

        for (name, source) in theirs.iter() {
            let Some(dest) = ours.get(name) else {
                continue;
            };
            if dest.is_float() != source.is_float() {
                continue;
            }
            let count = source.total_size().min(dest.total_size());
            if dest.is_float() {
                if let Some(values) = other.floats.read(source.physical_index, count) {
                    self.floats.write(dest.physical_index, values);
                }
            } else if let Some(values) = other.ints.read(source.physical_index, count) {
                self.ints.write(dest.physical_index, values);
            }

            // Array element entries alias their base entry.
            if split_array_subscript(name).is_some() {
                continue;
            }
            if let Some(auto) = other.autos.find_for_physical(source.physical_index) {
                self.set_raw_auto_constant(
                    dest.physical_index,
                    auto.constant_type,
                    auto.payload,
                    auto.variability,
                    auto.element_count,
                );
            }
        }

        for usage in &other.shared {
            if !self.is_using_shared_parameters(usage.name()) {
                let usage = SharedParameterUsage::new(Arc::clone(usage.block()), Some(&*ours));
                self.shared.push(usage);
            }
        }
    }
}

fn out_of_range(name: &str) -> ParamsError {
    ParamsError::InvalidArgument(format!("parameter '{name}' lies outside the buffer"))
}

fn transpose4(matrix: &[f32; 16]) -> [f32; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = matrix[col * 4 + row];
        }
    }
    out
}

fn transpose4_in_place(matrix: &mut [f32]) {
    for row in 0..4 {
        for col in (row + 1)..4 {
            matrix.swap(row * 4 + col, col * 4 + row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto::AutoConstantValues;
    use crate::shared::SharedParameterBlock;
    use crate::types::ConstantType;

    fn table() -> Arc<NamedConstantTable> {
        let mut table = NamedConstantTable::new();
        table.insert(
            "colour",
            ConstantDefinition::new(ConstantType::Float4, 0, 4, 1),
        );
        table.insert(
            "world",
            ConstantDefinition::new(ConstantType::Matrix4x4, 4, 16, 1),
        );
        table.insert("mode", ConstantDefinition::new(ConstantType::Int1, 0, 4, 1));
        table.set_float_buffer_size(20);
        table.set_int_buffer_size(4);
        Arc::new(table)
    }

    fn named_set() -> ParameterSet {
        let mut params = ParameterSet::default();
        params.set_named_constants(table());
        params
    }

    #[test]
    fn test_config_validation() {
        assert!(ParameterSetConfig::default().validate().is_ok());
        let bad = ParameterSetConfig::new().with_instance_data_step_rate(0);
        assert!(matches!(
            ParameterSet::new(bad),
            Err(ParamsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_step_rate_rejects_non_positive() {
        let mut params = ParameterSet::default();
        assert!(params.set_instance_data_step_rate(0).is_err());
        assert!(params.set_instance_data_step_rate(-3).is_err());
        assert_eq!(params.instance_data_step_rate(), 1);
        params.set_instance_data_step_rate(4).unwrap();
        assert_eq!(params.instance_data_step_rate(), 4);
    }

    #[test]
    fn test_storage_sized_from_table() {
        let params = named_set();
        assert_eq!(params.float_constants().len(), 20);
        assert_eq!(params.int_constants().len(), 4);
    }

    #[test]
    fn test_strict_lookup_without_table() {
        let params = ParameterSet::default();
        assert_eq!(
            params.find_named_constant_definition("x", true),
            Err(ParamsError::NotInitialized {
                name: "x".to_string()
            })
        );
        assert_eq!(params.find_named_constant_definition("x", false), Ok(None));
    }

    #[test]
    fn test_named_writes() {
        let mut params = named_set();
        params
            .set_named_floats("colour", &[1.0, 0.5, 0.25, 1.0, 9.0])
            .unwrap();
        assert_eq!(params.named_floats("colour").unwrap(), &[1.0, 0.5, 0.25, 1.0]);
        assert_eq!(params.float_constants()[4], 0.0);

        params.set_named_int("mode", 3).unwrap();
        assert_eq!(params.named_ints("mode").unwrap()[0], 3);

        assert!(matches!(
            params.set_named_ints("colour", &[1]),
            Err(ParamsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_name_policy() {
        let mut params = named_set();
        assert!(matches!(
            params.set_named_float("missing", 1.0),
            Err(ParamsError::NotFound { .. })
        ));
        params.set_ignore_missing_parameters(true);
        assert!(params.set_named_float("missing", 1.0).is_ok());
    }

    #[test]
    fn test_named_matrix_transpose() {
        let matrix: [f32; 16] = std::array::from_fn(|i| i as f32);
        let mut params = named_set();
        params.set_transpose_matrices(true);
        params.set_named_matrix4("world", &matrix).unwrap();
        let written = params.named_floats("world").unwrap();
        assert_eq!(written[1], 4.0);
        assert_eq!(written[4], 1.0);
    }

    #[test]
    fn test_logical_writes_require_map() {
        let mut params = ParameterSet::default();
        assert!(matches!(
            params.set_constant_floats(0, &[1.0]),
            Err(ParamsError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_logical_writes() {
        let mut params = ParameterSet::default();
        params.set_logical_indexes(
            Arc::new(LogicalBufferMap::new()),
            Arc::new(LogicalBufferMap::new()),
        );
        params.set_constant_floats(3, &[1.0, 2.0]).unwrap();
        params.set_constant_floats(7, &[5.0, 6.0, 7.0, 8.0]).unwrap();

        assert_eq!(params.float_constants().len(), 8);
        assert_eq!(&params.float_constants()[..2], &[1.0, 2.0]);
        assert_eq!(&params.float_constants()[4..], &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(params.logical_index_for_physical(4, true), Some(7));
    }

    #[test]
    fn test_logical_auto_constant() {
        let mut params = ParameterSet::default();
        params.set_logical_indexes(
            Arc::new(LogicalBufferMap::new()),
            Arc::new(LogicalBufferMap::new()),
        );
        params
            .set_auto_constant_real(0, AutoConstantType::Time, 2.0)
            .unwrap();

        let entry = params.find_auto_constant(0).unwrap();
        assert_eq!(entry.element_count, 4);
        assert_eq!(entry.payload, AutoConstantPayload::Real(2.0));
        assert_eq!(params.combined_variability(), Variability::GLOBAL);

        params.clear_auto_constant(0);
        assert!(!params.has_auto_constants());
    }

    #[test]
    fn test_update_auto_constants_by_mask() {
        let mut params = named_set();
        params
            .set_named_auto_constant(
                "colour",
                AutoConstantType::AmbientLightColor,
                AutoConstantPayload::default(),
            )
            .unwrap();
        params
            .set_named_auto_constant(
                "world",
                AutoConstantType::WorldMatrix,
                AutoConstantPayload::default(),
            )
            .unwrap();

        let identity: Vec<f32> = (0..16).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect();
        let source = AutoConstantValues::new()
            .with_value(AutoConstantType::AmbientLightColor, &[0.1, 0.2, 0.3, 1.0])
            .with_value(AutoConstantType::WorldMatrix, &identity);

        params.update_auto_constants(&source, Variability::GLOBAL);
        assert_eq!(params.named_floats("colour").unwrap(), &[0.1, 0.2, 0.3, 1.0]);
        assert_eq!(params.named_floats("world").unwrap()[0], 0.0);

        params.update_auto_constants(&source, Variability::PER_OBJECT);
        assert_eq!(params.named_floats("world").unwrap(), identity.as_slice());
    }

    #[test]
    fn test_pass_iteration_number() {
        let mut params = named_set();
        params.set_ignore_missing_parameters(true);
        params
            .set_named_auto_constant(
                "colour",
                AutoConstantType::PassIterationNumber,
                AutoConstantPayload::default(),
            )
            .unwrap();
        assert_eq!(params.pass_iteration_number_index(), Some(0));

        params.inc_pass_iteration_number();
        params.inc_pass_iteration_number();
        assert_eq!(params.float_constants()[0], 2.0);

        params.clear_named_auto_constant("colour");
        assert!(!params.has_pass_iteration_number());
    }

    #[test]
    fn test_shared_usage_dedup_by_name() {
        let block = SharedParameterBlock::new("frame").into_shared();
        let mut params = named_set();
        params.add_shared_parameters(Arc::clone(&block));
        params.add_shared_parameters(block);
        assert_eq!(params.shared_parameters().len(), 1);
        assert!(params.is_using_shared_parameters("frame"));

        params.remove_shared_parameters("frame");
        assert!(!params.is_using_shared_parameters("frame"));
    }

    #[test]
    fn test_copy_matching_named_constants() {
        let mut source = named_set();
        source
            .set_named_floats("colour", &[1.0, 2.0, 3.0, 4.0])
            .unwrap();
        source
            .set_named_auto_constant(
                "world",
                AutoConstantType::ViewMatrix,
                AutoConstantPayload::default(),
            )
            .unwrap();

        let mut other_table = NamedConstantTable::new();
        other_table.insert(
            "world",
            ConstantDefinition::new(ConstantType::Matrix4x4, 0, 16, 1),
        );
        other_table.insert(
            "colour",
            ConstantDefinition::new(ConstantType::Float3, 16, 3, 1),
        );
        other_table.set_float_buffer_size(19);

        let mut dest = ParameterSet::default();
        dest.set_named_constants(Arc::new(other_table));
        dest.copy_matching_named_constants_from(&source);

        assert_eq!(dest.named_floats("colour").unwrap(), &[1.0, 2.0, 3.0]);
        let auto = dest.find_named_auto_constant("world").unwrap();
        assert_eq!(auto.constant_type, AutoConstantType::ViewMatrix);
        assert_eq!(auto.physical_index, 0);
    }
}
