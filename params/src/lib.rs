//! # RedLilium Params
//!
//! GPU program parameter management for RedLilium Engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ConstantStorage`] - Growable, zero-padded float/int value arrays
//! - [`NamedConstantTable`] - Name to buffer layout lookup, with array element entries
//! - [`LogicalBufferMap`] - Stable, thread-safe register to buffer offset mapping
//! - [`AutoConstantRegistry`] - Values the render loop supplies automatically
//! - [`SharedParameterBlock`] - Versioned parameter sets shared between programs
//! - [`ProgramCompiler`] / [`ParameterSet`] - Layout compilation and per-draw values
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_params::{ConstantType, ProgramCompiler, ReflectedConstant, SharedParameterRegistry};
//!
//! let program = ProgramCompiler::new("lit")
//!     .with_constant(ReflectedConstant::padded("lightPos", ConstantType::Float4, 1))
//!     .compile()?;
//!
//! let registry = SharedParameterRegistry::new();
//! let lighting = registry.create("lighting")?;
//! lighting.write().add_constant_definition("lightPos", ConstantType::Float4, 1)?;
//! lighting.write().set_named_floats("lightPos", &[0.0, 10.0, 0.0, 1.0])?;
//!
//! let mut params = program.create_parameters();
//! params.add_shared_parameters_by_name(&registry, "lighting")?;
//! params.copy_shared_params()?;
//! ```

pub mod auto;
pub mod error;
pub mod logical;
pub mod named;
pub mod parameters;
pub mod persistence;
pub mod profiling;
pub mod program;
pub mod shared;
pub mod storage;
pub mod types;

// Re-export main types for convenience
pub use auto::{
    AutoConstantDefinition, AutoConstantEntry, AutoConstantPayload, AutoConstantRegistry,
    AutoConstantSource, AutoConstantType, AutoConstantValues, ExtraDataKind,
};
pub use error::{ParamsError, ParamsResult};
pub use logical::{LogicalBufferMap, LogicalIndexUse, UNUSED_PHYSICAL_INDEX};
pub use named::{
    ArrayEntryPolicy, ConstantDefinition, MAX_GENERATED_ARRAY_ENTRIES, NamedConstantTable,
};
pub use parameters::{ParameterSet, ParameterSetConfig};
pub use program::{CompiledProgram, ProgramCompiler, ReflectedConstant};
pub use shared::{
    CopyPlanEntry, CopyTarget, SharedParameterBlock, SharedParameterBlockRef,
    SharedParameterRegistry, SharedParameterUsage, UsageState,
};
pub use storage::{ConstantStorage, FloatConstantStorage, IntConstantStorage};
pub use types::{ConstantType, Variability};

/// Params library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the parameter subsystem.
///
/// Only logs the version; safe to call more than once.
pub fn init() {
    log::info!("RedLilium Params v{} initialized", VERSION);
}
