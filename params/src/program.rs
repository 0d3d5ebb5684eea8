//! Program compilation: turning reflected constants into a shared layout.
//!
//! The shader compiler reports each uniform as a [`ReflectedConstant`].
//! [`ProgramCompiler`] lays them out in the float and int buffers and
//! produces a [`CompiledProgram`], whose named table and logical maps are
//! wrapped in `Arc` and shared by every [`ParameterSet`] it creates.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ParamsError, ParamsResult};
use crate::logical::LogicalBufferMap;
use crate::named::{ArrayEntryPolicy, ConstantDefinition, NamedConstantTable};
use crate::parameters::{ParameterSet, ParameterSetConfig};
use crate::types::{ConstantType, Variability};

/// One constant as reported by shader reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedConstant {
    /// Uniform name.
    pub name: String,
    /// Data type of one element.
    pub constant_type: ConstantType,
    /// Number of array elements.
    pub array_size: usize,
    /// Scalar slots per element, as the target register layout needs it.
    pub element_size: usize,
    /// Whether the values belong in the float buffer.
    pub is_float: bool,
}

impl ReflectedConstant {
    /// Create a reflected constant, deriving `is_float` from the type.
    pub fn new(
        name: impl Into<String>,
        constant_type: ConstantType,
        array_size: usize,
        element_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            constant_type,
            array_size,
            element_size,
            is_float: constant_type.is_float(),
        }
    }

    /// Create a reflected constant with the type's packed element size.
    pub fn packed(name: impl Into<String>, constant_type: ConstantType, array_size: usize) -> Self {
        Self::new(name, constant_type, array_size, constant_type.element_size(false))
    }

    /// Create a reflected constant with the type's register-padded element size.
    pub fn padded(name: impl Into<String>, constant_type: ConstantType, array_size: usize) -> Self {
        Self::new(name, constant_type, array_size, constant_type.element_size(true))
    }
}

/// Builds a [`CompiledProgram`] from reflected constants.
#[derive(Debug, Clone)]
pub struct ProgramCompiler {
    name: String,
    array_policy: ArrayEntryPolicy,
    constants: Vec<ReflectedConstant>,
}

impl ProgramCompiler {
    /// Create a compiler for the named program.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array_policy: ArrayEntryPolicy::default(),
            constants: Vec::new(),
        }
    }

    /// Set the array entry generation policy.
    pub fn with_array_policy(mut self, policy: ArrayEntryPolicy) -> Self {
        self.array_policy = policy;
        self
    }

    /// Add a reflected constant.
    pub fn with_constant(mut self, constant: ReflectedConstant) -> Self {
        self.constants.push(constant);
        self
    }

    /// Add a reflected constant.
    pub fn add_constant(&mut self, constant: ReflectedConstant) -> &mut Self {
        self.constants.push(constant);
        self
    }

    /// Lay out every constant and produce the compiled program.
    ///
    /// Constants are placed in reflection order, each in the float or int
    /// buffer right after the previous one. Logical indices count 4-component
    /// registers, so a constant covering `n` slots advances the next logical
    /// index by `ceil(n / 4)`.
    pub fn compile(self) -> ParamsResult<CompiledProgram> {
        crate::profile_function!();

        let mut named = NamedConstantTable::new().with_array_policy(self.array_policy);
        let float_logical = LogicalBufferMap::new();
        let int_logical = LogicalBufferMap::new();
        let mut next_float_logical = 0;
        let mut next_int_logical = 0;
        let mut seen = HashSet::new();

        for constant in &self.constants {
            validate(constant)?;
            if !seen.insert(constant.name.as_str()) {
                return Err(ParamsError::DuplicateName {
                    name: constant.name.clone(),
                });
            }

            let total = constant.element_size * constant.array_size;
            let (map, next_logical) = if constant.is_float {
                (&float_logical, &mut next_float_logical)
            } else {
                (&int_logical, &mut next_int_logical)
            };
            let logical_index = *next_logical;
            let index_use = map
                .use_index(logical_index, total, Variability::GLOBAL)
                .ok_or_else(|| {
                    ParamsError::InvalidArgument(format!(
                        "constant '{}' occupies no slots",
                        constant.name
                    ))
                })?;
            *next_logical += total.div_ceil(4);

            let def = ConstantDefinition::new(
                constant.constant_type,
                index_use.physical_index,
                constant.element_size,
                constant.array_size,
            )
            .with_logical_index(logical_index);
            named.insert(constant.name.as_str(), def.clone());
            named.generate_array_entries(&constant.name, &def);
        }

        named.set_float_buffer_size(float_logical.buffer_size());
        named.set_int_buffer_size(int_logical.buffer_size());

        log::debug!(
            "Compiled program '{}': {} constants, {} float slots, {} int slots",
            self.name,
            self.constants.len(),
            named.float_buffer_size(),
            named.int_buffer_size()
        );

        Ok(CompiledProgram {
            name: self.name,
            named: Some(Arc::new(named)),
            float_logical: Arc::new(float_logical),
            int_logical: Arc::new(int_logical),
        })
    }
}

fn validate(constant: &ReflectedConstant) -> ParamsResult<()> {
    if constant.array_size == 0 || constant.element_size == 0 {
        return Err(ParamsError::InvalidArgument(format!(
            "constant '{}' has array size {} and element size {}",
            constant.name, constant.array_size, constant.element_size
        )));
    }
    if constant.is_float != constant.constant_type.is_float() {
        return Err(ParamsError::InvalidArgument(format!(
            "constant '{}' of type {:?} reported with is_float = {}",
            constant.name, constant.constant_type, constant.is_float
        )));
    }
    Ok(())
}

/// Layout shared by every parameter set of one program.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    name: String,
    named: Option<Arc<NamedConstantTable>>,
    float_logical: Arc<LogicalBufferMap>,
    int_logical: Arc<LogicalBufferMap>,
}

impl CompiledProgram {
    /// A register-addressed program with no named constants.
    ///
    /// Its logical maps start empty and grow as parameter sets write to
    /// logical indices.
    pub fn low_level(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            named: None,
            float_logical: Arc::new(LogicalBufferMap::new()),
            int_logical: Arc::new(LogicalBufferMap::new()),
        }
    }

    /// A program whose named table was loaded rather than compiled.
    pub fn from_named_constants(name: impl Into<String>, named: NamedConstantTable) -> Self {
        Self {
            name: name.into(),
            named: Some(Arc::new(named)),
            float_logical: Arc::new(LogicalBufferMap::new()),
            int_logical: Arc::new(LogicalBufferMap::new()),
        }
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Named constant table, if the program has one.
    pub fn named_constants(&self) -> Option<&Arc<NamedConstantTable>> {
        self.named.as_ref()
    }

    /// Float logical buffer map.
    pub fn float_logical_buffer(&self) -> &Arc<LogicalBufferMap> {
        &self.float_logical
    }

    /// Int logical buffer map.
    pub fn int_logical_buffer(&self) -> &Arc<LogicalBufferMap> {
        &self.int_logical
    }

    /// Create a parameter set with the default configuration.
    pub fn create_parameters(&self) -> ParameterSet {
        let mut params = ParameterSet::default();
        self.link(&mut params);
        params
    }

    /// Create a parameter set with a custom configuration.
    pub fn create_parameters_with(&self, config: ParameterSetConfig) -> ParamsResult<ParameterSet> {
        let mut params = ParameterSet::new(config)?;
        self.link(&mut params);
        Ok(params)
    }

    fn link(&self, params: &mut ParameterSet) {
        params.set_logical_indexes(Arc::clone(&self.float_logical), Arc::clone(&self.int_logical));
        if let Some(named) = &self.named {
            params.set_named_constants(Arc::clone(named));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_layout() {
        let program = ProgramCompiler::new("basic")
            .with_constant(ReflectedConstant::padded("world", ConstantType::Matrix4x4, 1))
            .with_constant(ReflectedConstant::padded("tint", ConstantType::Float3, 1))
            .with_constant(ReflectedConstant::padded("diffuseMap", ConstantType::Sampler2D, 1))
            .compile()
            .unwrap();

        let named = program.named_constants().unwrap();
        let world = named.get("world").unwrap();
        let tint = named.get("tint").unwrap();
        let sampler = named.get("diffuseMap").unwrap();

        assert_eq!(world.physical_index, 0);
        assert_eq!(world.logical_index, 0);
        assert_eq!(tint.physical_index, 16);
        assert_eq!(tint.logical_index, 4);
        assert_eq!(sampler.physical_index, 0);
        assert!(!sampler.is_float());
        assert_eq!(named.float_buffer_size(), 20);
        assert_eq!(named.int_buffer_size(), 4);
        assert!(named.contains("world[0]"));
    }

    #[test]
    fn test_duplicate_reflection_rejected() {
        let result = ProgramCompiler::new("dup")
            .with_constant(ReflectedConstant::packed("a", ConstantType::Float1, 1))
            .with_constant(ReflectedConstant::packed("a", ConstantType::Float2, 1))
            .compile();
        assert!(matches!(result, Err(ParamsError::DuplicateName { .. })));
    }

    #[test]
    fn test_inconsistent_float_flag_rejected() {
        let mut constant = ReflectedConstant::packed("a", ConstantType::Int2, 1);
        constant.is_float = true;
        let result = ProgramCompiler::new("bad").with_constant(constant).compile();
        assert!(matches!(result, Err(ParamsError::InvalidArgument(_))));
    }

    #[test]
    fn test_parameters_share_layout() {
        let program = ProgramCompiler::new("shared")
            .with_constant(ReflectedConstant::packed("bones", ConstantType::Matrix3x4, 4))
            .compile()
            .unwrap();

        let a = program.create_parameters();
        let b = program.create_parameters();
        assert_eq!(a.float_constants().len(), 48);
        assert!(std::ptr::eq(
            a.named_constants().unwrap(),
            b.named_constants().unwrap()
        ));
        assert_eq!(
            a.find_named_constant_definition("bones[2]", true)
                .unwrap()
                .unwrap()
                .physical_index,
            24
        );
    }

    #[test]
    fn test_low_level_program_has_no_names() {
        let program = CompiledProgram::low_level("asm");
        let params = program.create_parameters();
        assert!(!params.has_named_constants());
        assert!(params.has_logical_indexed_constants());
        assert!(matches!(
            params.find_named_constant_definition("x", true),
            Err(ParamsError::NotInitialized { .. })
        ));
    }
}
