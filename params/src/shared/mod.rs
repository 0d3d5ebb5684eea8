//! Shared parameter blocks.
//!
//! A [`SharedParameterBlock`] is a named set of values that many parameter
//! sets consume, such as per-frame lighting or fog settings. Consumers hold a
//! [`SharedParameterUsage`] that copies matching values into their own
//! storage. Every definition or value change bumps the block's version, and
//! usages rebuild their copy plan when they see a new version.
//!
//! ```ignore
//! let registry = SharedParameterRegistry::new();
//! let block = registry.create("lighting")?;
//! block.write().add_constant_definition("lightPos", ConstantType::Float4, 1)?;
//! block.write().set_named_floats("lightPos", &[1.0, 2.0, 3.0, 1.0])?;
//!
//! params.add_shared_parameters(block);
//! params.copy_shared_params()?;
//! ```

mod usage;

pub use usage::{CopyPlanEntry, CopyTarget, SharedParameterUsage, UsageState};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ParamsError, ParamsResult};
use crate::named::{ConstantDefinition, NamedConstantTable};
use crate::storage::{FloatConstantStorage, IntConstantStorage};
use crate::types::{ConstantType, Variability};

/// Shared handle to a block.
pub type SharedParameterBlockRef = Arc<RwLock<SharedParameterBlock>>;

/// A named, versioned set of parameter values shared between parameter sets.
#[derive(Debug, Clone)]
pub struct SharedParameterBlock {
    name: String,
    named: NamedConstantTable,
    floats: FloatConstantStorage,
    ints: IntConstantStorage,
    version: u64,
}

impl SharedParameterBlock {
    /// Create an empty block.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            named: NamedConstantTable::new(),
            floats: FloatConstantStorage::new(),
            ints: IntConstantStorage::new(),
            version: 0,
        }
    }

    /// Wrap the block in a shared handle.
    pub fn into_shared(self) -> SharedParameterBlockRef {
        Arc::new(RwLock::new(self))
    }

    /// Name of the block.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version counter, incremented on every definition or value change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Definitions held by this block.
    pub fn named_constants(&self) -> &NamedConstantTable {
        &self.named
    }

    /// Float values.
    pub fn float_constants(&self) -> &[f32] {
        self.floats.as_slice()
    }

    /// Int values.
    pub fn int_constants(&self) -> &[i32] {
        self.ints.as_slice()
    }

    /// Look up a definition by name.
    pub fn find_constant_definition(&self, name: &str) -> Option<&ConstantDefinition> {
        self.named.get(name)
    }

    /// Add a new constant. Values are tightly packed and zero-initialized.
    pub fn add_constant_definition(
        &mut self,
        name: &str,
        constant_type: ConstantType,
        array_size: usize,
    ) -> ParamsResult<()> {
        if self.named.contains(name) {
            return Err(ParamsError::DuplicateName {
                name: name.to_string(),
            });
        }
        if array_size == 0 {
            return Err(ParamsError::InvalidArgument(format!(
                "shared constant '{name}' must have a non-zero array size"
            )));
        }

        let element_size = constant_type.element_size(false);
        let total = element_size * array_size;
        let physical_index = if constant_type.is_float() {
            let index = self.floats.len();
            self.floats.resize(index + total);
            self.named
                .set_float_buffer_size(self.named.float_buffer_size() + total);
            index
        } else {
            let index = self.ints.len();
            self.ints.resize(index + total);
            self.named
                .set_int_buffer_size(self.named.int_buffer_size() + total);
            index
        };

        let def = ConstantDefinition::new(constant_type, physical_index, element_size, array_size)
            .with_variability(Variability::GLOBAL);
        self.named.insert(name, def);
        self.version += 1;

        log::debug!(
            "Shared block '{}': added '{}' ({:?}[{}]) at {}",
            self.name,
            name,
            constant_type,
            array_size,
            physical_index
        );
        Ok(())
    }

    /// Remove a constant, compacting the storage behind it.
    ///
    /// Returns false if no such constant exists.
    pub fn remove_constant_definition(&mut self, name: &str) -> bool {
        let Some(def) = self.named.remove(name) else {
            return false;
        };
        let total = def.total_size();
        let is_float = def.is_float();

        for (_, other) in self.named.iter_mut() {
            if other.is_float() == is_float && other.physical_index > def.physical_index {
                other.physical_index -= total;
            }
        }

        if is_float {
            self.floats.remove_range(def.physical_index, total);
            self.named
                .set_float_buffer_size(self.named.float_buffer_size().saturating_sub(total));
        } else {
            self.ints.remove_range(def.physical_index, total);
            self.named
                .set_int_buffer_size(self.named.int_buffer_size().saturating_sub(total));
        }
        self.version += 1;

        log::debug!("Shared block '{}': removed '{}'", self.name, name);
        true
    }

    /// Remove every constant.
    pub fn remove_all_constant_definitions(&mut self) {
        self.named.clear();
        self.floats.clear();
        self.ints.clear();
        self.version += 1;
    }

    fn resolve(&self, name: &str, want_float: bool) -> ParamsResult<ConstantDefinition> {
        let def = self
            .named
            .get(name)
            .ok_or_else(|| ParamsError::NotFound {
                name: name.to_string(),
            })?;
        if def.is_float() != want_float {
            return Err(ParamsError::InvalidArgument(format!(
                "shared constant '{name}' is {:?}",
                def.constant_type
            )));
        }
        Ok(def.clone())
    }

    /// Write float values into a named constant.
    ///
    /// At most `element_size * array_size` values are written.
    pub fn set_named_floats(&mut self, name: &str, values: &[f32]) -> ParamsResult<()> {
        let def = self.resolve(name, true)?;
        let count = values.len().min(def.total_size());
        self.floats.write(def.physical_index, &values[..count]);
        self.mark_dirty();
        Ok(())
    }

    /// Write int values into a named constant.
    pub fn set_named_ints(&mut self, name: &str, values: &[i32]) -> ParamsResult<()> {
        let def = self.resolve(name, false)?;
        let count = values.len().min(def.total_size());
        self.ints.write(def.physical_index, &values[..count]);
        self.mark_dirty();
        Ok(())
    }

    /// Write a single float value.
    pub fn set_named_float(&mut self, name: &str, value: f32) -> ParamsResult<()> {
        self.set_named_floats(name, &[value])
    }

    /// Force consumers to resynchronize.
    pub fn mark_dirty(&mut self) {
        self.version += 1;
    }
}

/// Registry of shared parameter blocks, addressed by name.
#[derive(Debug, Default)]
pub struct SharedParameterRegistry {
    blocks: RwLock<HashMap<String, SharedParameterBlockRef>>,
}

static_assertions::assert_impl_all!(SharedParameterRegistry: Send, Sync);

impl SharedParameterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new empty block.
    pub fn create(&self, name: &str) -> ParamsResult<SharedParameterBlockRef> {
        let mut blocks = self.blocks.write();
        if blocks.contains_key(name) {
            return Err(ParamsError::DuplicateName {
                name: name.to_string(),
            });
        }
        let block = SharedParameterBlock::new(name).into_shared();
        blocks.insert(name.to_string(), Arc::clone(&block));
        log::debug!("Created shared parameter block '{}'", name);
        Ok(block)
    }

    /// Get a block by name.
    pub fn get(&self, name: &str) -> Option<SharedParameterBlockRef> {
        self.blocks.read().get(name).cloned()
    }

    /// Get a block by name, failing with [`ParamsError::NotFound`].
    pub fn find(&self, name: &str) -> ParamsResult<SharedParameterBlockRef> {
        self.get(name).ok_or_else(|| ParamsError::NotFound {
            name: name.to_string(),
        })
    }

    /// Unregister a block. Existing usages keep it alive.
    pub fn remove(&self, name: &str) -> Option<SharedParameterBlockRef> {
        self.blocks.write().remove(name)
    }

    /// Unregister every block.
    pub fn remove_all(&self) {
        self.blocks.write().clear();
    }

    /// Names of all registered blocks, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.blocks.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Returns true if no blocks are registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}
