//! Named constant definitions.
//!
//! A [`NamedConstantTable`] maps the names a shader declares to the layout of
//! each constant inside the float or int buffer. The table is built once when
//! a program is compiled and shared read-only by every parameter set created
//! from that program.
//!
//! # Array entries
//!
//! An array constant `lights` with `array_size = 4` is also reachable as
//! `lights[0]` through `lights[3]`. These entries alias the base entry's
//! region and never grow the buffers:
//!
//! ```ignore
//! let base = ConstantDefinition::new(ConstantType::Float4, 0, 4, 4);
//! table.insert("lights", base.clone());
//! table.generate_array_entries("lights", &base);
//! assert_eq!(table.get("lights[2]").unwrap().physical_index, 8);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, ParamsResult};
use crate::types::{ConstantType, Variability};

/// Number of `name[i]` entries generated for an array under [`ArrayEntryPolicy::Capped`].
pub const MAX_GENERATED_ARRAY_ENTRIES: usize = 16;

/// How many per-element entries to generate for array constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArrayEntryPolicy {
    /// Generate at most [`MAX_GENERATED_ARRAY_ENTRIES`] entries.
    #[default]
    Capped,
    /// Generate an entry for every array element.
    All,
}

/// Layout information for a single named constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstantDefinition {
    /// Data type of one element.
    pub constant_type: ConstantType,
    /// Offset into the float or int buffer.
    pub physical_index: usize,
    /// Logical (register) index, used by low-level assembler programs.
    pub logical_index: usize,
    /// Number of scalar slots per element, padded or packed depending on the program.
    pub element_size: usize,
    /// Number of array elements, 1 for non-arrays.
    pub array_size: usize,
    /// How frequently this parameter changes.
    pub variability: Variability,
}

impl ConstantDefinition {
    /// Create a definition with logical index 0 and global variability.
    pub fn new(
        constant_type: ConstantType,
        physical_index: usize,
        element_size: usize,
        array_size: usize,
    ) -> Self {
        Self {
            constant_type,
            physical_index,
            logical_index: 0,
            element_size,
            array_size,
            variability: Variability::GLOBAL,
        }
    }

    /// Set the logical index.
    pub fn with_logical_index(mut self, logical_index: usize) -> Self {
        self.logical_index = logical_index;
        self
    }

    /// Set the variability.
    pub fn with_variability(mut self, variability: Variability) -> Self {
        self.variability = variability;
        self
    }

    /// Returns true if the values are stored in the float buffer.
    pub fn is_float(&self) -> bool {
        self.constant_type.is_float()
    }

    /// Returns true if this is a sampler.
    pub fn is_sampler(&self) -> bool {
        self.constant_type.is_sampler()
    }

    /// Total number of scalar slots covered by this definition.
    pub fn total_size(&self) -> usize {
        self.element_size * self.array_size
    }
}

/// Map from constant name to its definition, plus buffer size totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedConstantTable {
    map: BTreeMap<String, ConstantDefinition>,
    float_buffer_size: usize,
    int_buffer_size: usize,
    array_policy: ArrayEntryPolicy,
}

impl NamedConstantTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the array entry generation policy.
    pub fn with_array_policy(mut self, policy: ArrayEntryPolicy) -> Self {
        self.array_policy = policy;
        self
    }

    /// Array entry generation policy.
    pub fn array_policy(&self) -> ArrayEntryPolicy {
        self.array_policy
    }

    /// Total number of float slots required by all definitions.
    pub fn float_buffer_size(&self) -> usize {
        self.float_buffer_size
    }

    /// Total number of int slots required by all definitions.
    pub fn int_buffer_size(&self) -> usize {
        self.int_buffer_size
    }

    /// Buffer size for the float or int side.
    pub fn buffer_size(&self, is_float: bool) -> usize {
        if is_float {
            self.float_buffer_size
        } else {
            self.int_buffer_size
        }
    }

    /// Set the float buffer size.
    pub fn set_float_buffer_size(&mut self, size: usize) {
        self.float_buffer_size = size;
    }

    /// Set the int buffer size.
    pub fn set_int_buffer_size(&mut self, size: usize) {
        self.int_buffer_size = size;
    }

    /// Number of entries, including generated array entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns true if a definition with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&ConstantDefinition> {
        self.map.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ConstantDefinition> {
        self.map.get_mut(name)
    }

    /// Look up a definition, failing with [`ParamsError::NotFound`] when
    /// `fail_if_missing` is set and the name is absent.
    pub fn find(
        &self,
        name: &str,
        fail_if_missing: bool,
    ) -> ParamsResult<Option<&ConstantDefinition>> {
        match self.map.get(name) {
            Some(def) => Ok(Some(def)),
            None if fail_if_missing => Err(ParamsError::NotFound {
                name: name.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Insert or replace a definition. Buffer sizes are not changed.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        def: ConstantDefinition,
    ) -> Option<ConstantDefinition> {
        self.map.insert(name.into(), def)
    }

    /// Remove a definition by name. Buffer sizes are not changed.
    pub fn remove(&mut self, name: &str) -> Option<ConstantDefinition> {
        self.map.remove(name)
    }

    /// Remove every definition and reset buffer sizes.
    pub fn clear(&mut self) {
        self.map.clear();
        self.float_buffer_size = 0;
        self.int_buffer_size = 0;
    }

    /// Iterate over all `(name, definition)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstantDefinition)> {
        self.map.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ConstantDefinition)> {
        self.map.iter_mut().map(|(name, def)| (name.as_str(), def))
    }

    /// Add `name[i]` entries for the elements of an array constant.
    ///
    /// Each entry shares the base entry's buffer region: element `i` starts at
    /// `base.physical_index + i * base.element_size` and has `array_size = 1`.
    /// `name[0]` is always generated.
    pub fn generate_array_entries(&mut self, name: &str, base: &ConstantDefinition) {
        let count = match self.array_policy {
            ArrayEntryPolicy::Capped => base.array_size.min(MAX_GENERATED_ARRAY_ENTRIES),
            ArrayEntryPolicy::All => base.array_size,
        }
        .max(1);

        let mut element = base.clone();
        element.array_size = 1;
        for i in 0..count {
            self.map.insert(format!("{name}[{i}]"), element.clone());
            element.physical_index += base.element_size;
        }
    }
}

/// Strip a trailing `[N]` subscript from a constant name.
///
/// Returns the base name and the index, or `None` when the name has no subscript.
pub fn split_array_subscript(name: &str) -> Option<(&str, usize)> {
    let open = name.rfind('[')?;
    let inner = name[open + 1..].strip_suffix(']')?;
    let index = inner.parse().ok()?;
    Some((&name[..open], index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float4_array(array_size: usize) -> ConstantDefinition {
        ConstantDefinition::new(ConstantType::Float4, 8, 4, array_size)
    }

    #[test]
    fn test_generate_array_entries() {
        let mut table = NamedConstantTable::new();
        table.set_float_buffer_size(20);
        let base = float4_array(3);
        table.insert("lights", base.clone());
        table.generate_array_entries("lights", &base);

        assert_eq!(table.len(), 4);
        for i in 0..3 {
            let entry = table.get(&format!("lights[{i}]")).unwrap();
            assert_eq!(entry.physical_index, 8 + i * 4);
            assert_eq!(entry.array_size, 1);
            assert_eq!(entry.constant_type, ConstantType::Float4);
        }
        assert!(table.get("lights[3]").is_none());
        assert_eq!(table.float_buffer_size(), 20);
    }

    #[test]
    fn test_generate_array_entries_capped() {
        let mut table = NamedConstantTable::new();
        let base = float4_array(40);
        table.generate_array_entries("bones", &base);
        assert_eq!(table.len(), MAX_GENERATED_ARRAY_ENTRIES);
        assert!(table.contains("bones[15]"));
        assert!(!table.contains("bones[16]"));
    }

    #[test]
    fn test_generate_array_entries_all() {
        let mut table = NamedConstantTable::new().with_array_policy(ArrayEntryPolicy::All);
        let base = float4_array(40);
        table.generate_array_entries("bones", &base);
        assert_eq!(table.len(), 40);
        assert_eq!(table.get("bones[39]").unwrap().physical_index, 8 + 39 * 4);
    }

    #[test]
    fn test_single_element_gets_zero_entry() {
        let mut table = NamedConstantTable::new();
        let base = ConstantDefinition::new(ConstantType::Float1, 3, 1, 1);
        table.generate_array_entries("scale", &base);
        assert_eq!(table.get("scale[0]").unwrap().physical_index, 3);
    }

    #[test]
    fn test_find_strict_and_lenient() {
        let mut table = NamedConstantTable::new();
        table.insert("a", float4_array(1));
        assert!(table.find("a", true).unwrap().is_some());
        assert_eq!(table.find("b", false), Ok(None));
        assert_eq!(
            table.find("b", true),
            Err(ParamsError::NotFound {
                name: "b".to_string()
            })
        );
    }

    #[test]
    fn test_split_array_subscript() {
        assert_eq!(split_array_subscript("lights[3]"), Some(("lights", 3)));
        assert_eq!(split_array_subscript("lights"), None);
        assert_eq!(split_array_subscript("lights[x]"), None);
    }
}
