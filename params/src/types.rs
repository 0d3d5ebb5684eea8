//! Constant type catalogue and variability flags.
//!
//! [`ConstantType`] describes the shape of one shader constant as reported by
//! the program compiler. Element sizes come in two flavours: packed (the
//! exact number of scalar slots) and padded (each row rounded up to a
//! 4-component register).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Data type of a single GPU program constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ConstantType {
    // Float vectors
    Float1 = 1,
    Float2 = 2,
    Float3 = 3,
    Float4 = 4,

    // Samplers
    Sampler1D = 5,
    Sampler2D = 6,
    Sampler3D = 7,
    SamplerCube = 8,
    Sampler1DShadow = 9,
    Sampler2DShadow = 10,

    // Float matrices, rows x columns
    Matrix2x2 = 11,
    Matrix2x3 = 12,
    Matrix2x4 = 13,
    Matrix3x2 = 14,
    Matrix3x3 = 15,
    Matrix3x4 = 16,
    Matrix4x2 = 17,
    Matrix4x3 = 18,
    Matrix4x4 = 19,

    // Integer vectors
    Int1 = 20,
    Int2 = 21,
    Int3 = 22,
    Int4 = 23,

    /// Type could not be determined by reflection.
    #[default]
    Unknown = 99,
}

impl ConstantType {
    /// Returns true if values of this type live in the float buffer.
    ///
    /// Samplers and integer vectors are stored in the int buffer.
    pub fn is_float(&self) -> bool {
        !(self.is_sampler() || self.is_int())
    }

    /// Returns true if this is an integer vector type.
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int1 | Self::Int2 | Self::Int3 | Self::Int4)
    }

    /// Returns true if this is a sampler type.
    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            Self::Sampler1D
                | Self::Sampler2D
                | Self::Sampler3D
                | Self::SamplerCube
                | Self::Sampler1DShadow
                | Self::Sampler2DShadow
        )
    }

    /// Returns true if this is a matrix type.
    pub fn is_matrix(&self) -> bool {
        matches!(
            self,
            Self::Matrix2x2
                | Self::Matrix2x3
                | Self::Matrix2x4
                | Self::Matrix3x2
                | Self::Matrix3x3
                | Self::Matrix3x4
                | Self::Matrix4x2
                | Self::Matrix4x3
                | Self::Matrix4x4
        )
    }

    /// Number of scalar slots one element of this type occupies.
    ///
    /// With `pad_to_multiples_of_4` every row is rounded up to a full
    /// 4-component register, which is how most GPU constant registers are laid out.
    pub fn element_size(&self, pad_to_multiples_of_4: bool) -> usize {
        if pad_to_multiples_of_4 {
            match self {
                Self::Matrix2x2 | Self::Matrix2x3 | Self::Matrix2x4 => 8,
                Self::Matrix3x2 | Self::Matrix3x3 | Self::Matrix3x4 => 12,
                Self::Matrix4x2 | Self::Matrix4x3 | Self::Matrix4x4 => 16,
                _ => 4,
            }
        } else {
            match self {
                Self::Float1 | Self::Int1 => 1,
                Self::Float2 | Self::Int2 => 2,
                Self::Float3 | Self::Int3 => 3,
                Self::Float4 | Self::Int4 => 4,
                Self::Sampler1D
                | Self::Sampler2D
                | Self::Sampler3D
                | Self::SamplerCube
                | Self::Sampler1DShadow
                | Self::Sampler2DShadow => 1,
                Self::Matrix2x2 => 4,
                Self::Matrix2x3 | Self::Matrix3x2 => 6,
                Self::Matrix2x4 | Self::Matrix4x2 => 8,
                Self::Matrix3x3 => 9,
                Self::Matrix3x4 | Self::Matrix4x3 => 12,
                Self::Matrix4x4 => 16,
                Self::Unknown => 4,
            }
        }
    }
}

bitflags! {
    /// How often a parameter value changes during rendering.
    ///
    /// The render loop uses this mask to decide which auto constants need
    /// refreshing at each stage (once per frame, per object, per light pass).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Variability: u16 {
        /// No variation except by manual setting.
        const GLOBAL = 1 << 0;
        /// Varies per object.
        const PER_OBJECT = 1 << 1;
        /// Varies with the set of lights.
        const LIGHTS = 1 << 2;
        /// Varies with pass iteration number.
        const PASS_ITERATION_NUMBER = 1 << 3;
        /// Full mask.
        const ALL = 0xFFFF;
    }
}

impl Default for Variability {
    fn default() -> Self {
        Self::GLOBAL
    }
}
