//! Auto constants: parameter values the render loop supplies automatically.
//!
//! A shader that wants the current world matrix or light position does not set
//! it by hand. Instead the parameter set records an [`AutoConstantEntry`]
//! saying "physical slot N holds the world matrix", and once per update the
//! render loop fills those slots through an [`AutoConstantSource`].
//!
//! Every [`AutoConstantType`] carries a fixed catalogue definition: the script
//! name, the number of floats it produces, the kind of extra data it takes
//! (e.g. a light index) and how often it changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Variability;

/// Default element count of a registered auto constant (one 4-component register).
pub const DEFAULT_AUTO_ELEMENT_COUNT: usize = 4;

/// Kind of extra data an auto constant takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraDataKind {
    /// No extra data.
    None,
    /// An integer, typically a light or texture unit index.
    Int,
    /// A real number, typically a time factor.
    Real,
}

/// Catalogue entry describing one auto constant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConstantDefinition {
    /// The type this definition describes.
    pub constant_type: AutoConstantType,
    /// Name used in material scripts.
    pub name: &'static str,
    /// Number of floats produced.
    pub element_count: usize,
    /// Kind of extra data accepted.
    pub data_kind: ExtraDataKind,
    /// How often the value changes.
    pub variability: Variability,
}

const GLOBAL: Variability = Variability::GLOBAL;
const OBJECT: Variability = Variability::PER_OBJECT;
const LIGHTS: Variability = Variability::LIGHTS;
const OBJECT_LIGHTS: Variability = Variability::PER_OBJECT.union(Variability::LIGHTS);
const GLOBAL_LIGHTS: Variability = Variability::GLOBAL.union(Variability::LIGHTS);
const PASS: Variability = Variability::PASS_ITERATION_NUMBER;

macro_rules! auto_constant_types {
    ($($variant:ident => ($name:literal, $count:literal, $data:ident, $variability:ident)),* $(,)?) => {
        /// Value kinds the render loop can supply automatically.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum AutoConstantType {
            $($variant,)*
        }

        impl AutoConstantType {
            /// Every auto constant type, in catalogue order.
            pub const ALL: &'static [AutoConstantType] = &[$(Self::$variant,)*];

            /// Catalogue definition of this type.
            pub fn definition(&self) -> AutoConstantDefinition {
                match self {
                    $(Self::$variant => AutoConstantDefinition {
                        constant_type: Self::$variant,
                        name: $name,
                        element_count: $count,
                        data_kind: ExtraDataKind::$data,
                        variability: $variability,
                    },)*
                }
            }
        }
    };
}

auto_constant_types! {
    WorldMatrix => ("world_matrix", 16, None, OBJECT),
    InverseWorldMatrix => ("inverse_world_matrix", 16, None, OBJECT),
    TransposeWorldMatrix => ("transpose_world_matrix", 16, None, OBJECT),
    InverseTransposeWorldMatrix => ("inverse_transpose_world_matrix", 16, None, OBJECT),
    WorldMatrixArray3x4 => ("world_matrix_array_3x4", 12, None, OBJECT),
    WorldMatrixArray => ("world_matrix_array", 16, None, OBJECT),

    ViewMatrix => ("view_matrix", 16, None, GLOBAL),
    InverseViewMatrix => ("inverse_view_matrix", 16, None, GLOBAL),
    TransposeViewMatrix => ("transpose_view_matrix", 16, None, GLOBAL),
    InverseTransposeViewMatrix => ("inverse_transpose_view_matrix", 16, None, GLOBAL),

    ProjectionMatrix => ("projection_matrix", 16, None, GLOBAL),
    InverseProjectionMatrix => ("inverse_projection_matrix", 16, None, GLOBAL),
    TransposeProjectionMatrix => ("transpose_projection_matrix", 16, None, GLOBAL),
    InverseTransposeProjectionMatrix => ("inverse_transpose_projection_matrix", 16, None, GLOBAL),

    ViewProjMatrix => ("viewproj_matrix", 16, None, GLOBAL),
    InverseViewProjMatrix => ("inverse_viewproj_matrix", 16, None, GLOBAL),
    TransposeViewProjMatrix => ("transpose_viewproj_matrix", 16, None, GLOBAL),
    InverseTransposeViewProjMatrix => ("inverse_transpose_viewproj_matrix", 16, None, GLOBAL),

    WorldViewMatrix => ("worldview_matrix", 16, None, OBJECT),
    InverseWorldViewMatrix => ("inverse_worldview_matrix", 16, None, OBJECT),
    TransposeWorldViewMatrix => ("transpose_worldview_matrix", 16, None, OBJECT),
    InverseTransposeWorldViewMatrix => ("inverse_transpose_worldview_matrix", 16, None, OBJECT),

    WorldViewProjMatrix => ("worldviewproj_matrix", 16, None, OBJECT),
    InverseWorldViewProjMatrix => ("inverse_worldviewproj_matrix", 16, None, OBJECT),
    TransposeWorldViewProjMatrix => ("transpose_worldviewproj_matrix", 16, None, OBJECT),
    InverseTransposeWorldViewProjMatrix => ("inverse_transpose_worldviewproj_matrix", 16, None, OBJECT),

    RenderTargetFlipping => ("render_target_flipping", 1, None, GLOBAL),
    VertexWinding => ("vertex_winding", 1, None, GLOBAL),

    FogColor => ("fog_colour", 4, None, GLOBAL),
    FogParams => ("fog_params", 4, None, GLOBAL),

    SurfaceAmbientColor => ("surface_ambient_colour", 4, None, GLOBAL),
    SurfaceDiffuseColor => ("surface_diffuse_colour", 4, None, GLOBAL),
    SurfaceSpecularColor => ("surface_specular_colour", 4, None, GLOBAL),
    SurfaceEmissiveColor => ("surface_emissive_colour", 4, None, GLOBAL),
    SurfaceShininess => ("surface_shininess", 1, None, GLOBAL),

    LightCount => ("light_count", 1, None, LIGHTS),
    AmbientLightColor => ("ambient_light_colour", 4, None, GLOBAL),
    LightDiffuseColor => ("light_diffuse_colour", 4, Int, LIGHTS),
    LightSpecularColor => ("light_specular_colour", 4, Int, LIGHTS),
    LightAttenuation => ("light_attenuation", 4, Int, LIGHTS),
    SpotLightParams => ("spotlight_params", 4, Int, LIGHTS),
    LightPosition => ("light_position", 4, Int, LIGHTS),
    LightPositionObjectSpace => ("light_position_object_space", 4, Int, OBJECT_LIGHTS),
    LightPositionViewSpace => ("light_position_view_space", 4, Int, LIGHTS),
    LightDirection => ("light_direction", 4, Int, LIGHTS),
    LightDirectionObjectSpace => ("light_direction_object_space", 4, Int, OBJECT_LIGHTS),
    LightDirectionViewSpace => ("light_direction_view_space", 4, Int, LIGHTS),
    LightDistanceObjectSpace => ("light_distance_object_space", 1, Int, OBJECT_LIGHTS),
    LightPowerScale => ("light_power", 1, Int, LIGHTS),
    LightDiffuseColorPowerScaled => ("light_diffuse_colour_power_scaled", 4, Int, LIGHTS),
    LightSpecularColorPowerScaled => ("light_specular_colour_power_scaled", 4, Int, LIGHTS),
    LightDiffuseColorArray => ("light_diffuse_colour_array", 4, Int, LIGHTS),
    LightSpecularColorArray => ("light_specular_colour_array", 4, Int, LIGHTS),
    LightDiffuseColorPowerScaledArray => ("light_diffuse_colour_power_scaled_array", 4, Int, LIGHTS),
    LightSpecularColorPowerScaledArray => ("light_specular_colour_power_scaled_array", 4, Int, LIGHTS),
    LightAttenuationArray => ("light_attenuation_array", 4, Int, LIGHTS),
    LightPositionArray => ("light_position_array", 4, Int, LIGHTS),
    LightPositionObjectSpaceArray => ("light_position_object_space_array", 4, Int, OBJECT_LIGHTS),
    LightPositionViewSpaceArray => ("light_position_view_space_array", 4, Int, LIGHTS),
    LightDirectionArray => ("light_direction_array", 4, Int, LIGHTS),
    LightDirectionObjectSpaceArray => ("light_direction_object_space_array", 4, Int, OBJECT_LIGHTS),
    LightDirectionViewSpaceArray => ("light_direction_view_space_array", 4, Int, LIGHTS),
    LightDistanceObjectSpaceArray => ("light_distance_object_space_array", 1, Int, OBJECT_LIGHTS),
    LightPowerScaleArray => ("light_power_array", 1, Int, LIGHTS),
    SpotLightParamsArray => ("spotlight_params_array", 4, Int, LIGHTS),

    DerivedAmbientLightColor => ("derived_ambient_light_colour", 4, None, GLOBAL),
    DerivedSceneColor => ("derived_scene_colour", 4, None, GLOBAL),
    DerivedLightDiffuseColor => ("derived_light_diffuse_colour", 4, Int, GLOBAL_LIGHTS),
    DerivedLightSpecularColor => ("derived_light_specular_colour", 4, Int, GLOBAL_LIGHTS),
    DerivedLightDiffuseColorArray => ("derived_light_diffuse_colour_array", 4, Int, GLOBAL_LIGHTS),
    DerivedLightSpecularColorArray => ("derived_light_specular_colour_array", 4, Int, GLOBAL_LIGHTS),

    LightNumber => ("light_number", 1, Int, LIGHTS),
    LightCastsShadows => ("light_casts_shadows", 1, Int, LIGHTS),
    ShadowExtrusionDistance => ("shadow_extrusion_distance", 1, Int, LIGHTS),
    CameraPosition => ("camera_position", 3, None, GLOBAL),
    CameraPositionObjectSpace => ("camera_position_object_space", 3, None, OBJECT),
    TextureViewProjMatrix => ("texture_viewproj_matrix", 16, Int, LIGHTS),
    TextureViewProjMatrixArray => ("texture_viewproj_matrix_array", 16, Int, LIGHTS),
    TextureWorldViewProjMatrix => ("texture_worldviewproj_matrix", 16, Int, OBJECT_LIGHTS),
    TextureWorldViewProjMatrixArray => ("texture_worldviewproj_matrix_array", 16, Int, OBJECT_LIGHTS),
    SpotLightViewProjMatrix => ("spotlight_viewproj_matrix", 16, Int, LIGHTS),
    SpotLightWorldViewProjMatrix => ("spotlight_worldviewproj_matrix", 16, Int, OBJECT_LIGHTS),
    Custom => ("custom", 4, Int, OBJECT),

    Time => ("time", 1, Real, GLOBAL),
    Time0X => ("time_0_x", 4, Real, GLOBAL),
    CosTime0X => ("costime_0_x", 4, Real, GLOBAL),
    SinTime0X => ("sintime_0_x", 4, Real, GLOBAL),
    TanTime0X => ("tantime_0_x", 4, Real, GLOBAL),
    Time0XPacked => ("time_0_x_packed", 4, Real, GLOBAL),
    Time01 => ("time_0_1", 4, Real, GLOBAL),
    CosTime01 => ("costime_0_1", 4, Real, GLOBAL),
    SinTime01 => ("sintime_0_1", 4, Real, GLOBAL),
    TanTime01 => ("tantime_0_1", 4, Real, GLOBAL),
    Time01Packed => ("time_0_1_packed", 4, Real, GLOBAL),
    Time02Pi => ("time_0_2pi", 4, Real, GLOBAL),
    CosTime02Pi => ("costime_0_2pi", 4, Real, GLOBAL),
    SinTime02Pi => ("sintime_0_2pi", 4, Real, GLOBAL),
    TanTime02Pi => ("tantime_0_2pi", 4, Real, GLOBAL),
    Time02PiPacked => ("time_0_2pi_packed", 4, Real, GLOBAL),
    FrameTime => ("frame_time", 1, Real, GLOBAL),
    Fps => ("fps", 1, None, GLOBAL),

    ViewportWidth => ("viewport_width", 1, None, GLOBAL),
    ViewportHeight => ("viewport_height", 1, None, GLOBAL),
    InverseViewportWidth => ("inverse_viewport_width", 1, None, GLOBAL),
    InverseViewportHeight => ("inverse_viewport_height", 1, None, GLOBAL),
    ViewportSize => ("viewport_size", 4, None, GLOBAL),
    ViewDirection => ("view_direction", 3, None, GLOBAL),
    ViewSideVector => ("view_side_vector", 3, None, GLOBAL),
    ViewUpVector => ("view_up_vector", 3, None, GLOBAL),
    Fov => ("fov", 1, None, GLOBAL),
    NearClipDistance => ("near_clip_distance", 1, None, GLOBAL),
    FarClipDistance => ("far_clip_distance", 1, None, GLOBAL),

    PassNumber => ("pass_number", 1, None, GLOBAL),
    PassIterationNumber => ("pass_iteration_number", 1, None, PASS),
    AnimationParametric => ("animation_parametric", 4, Int, OBJECT),
    TexelOffsets => ("texel_offsets", 4, None, GLOBAL),
    SceneDepthRange => ("scene_depth_range", 4, None, GLOBAL),
    ShadowSceneDepthRange => ("shadow_scene_depth_range", 4, Int, LIGHTS),
    ShadowColor => ("shadow_colour", 4, None, LIGHTS),
    TextureSize => ("texture_size", 4, Int, GLOBAL),
    InverseTextureSize => ("inverse_texture_size", 4, Int, GLOBAL),
    PackedTextureSize => ("packed_texture_size", 4, Int, GLOBAL),
    TextureMatrix => ("texture_matrix", 16, Int, GLOBAL),
    LodCameraPosition => ("lod_camera_position", 3, None, GLOBAL),
    LodCameraPositionObjectSpace => ("lod_camera_position_object_space", 3, None, OBJECT),
    LightCustom => ("light_custom", 4, Int, LIGHTS),
}

impl AutoConstantType {
    /// Look up an auto constant type by its script name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.definition().name == name)
    }

    /// Script name of this type.
    pub fn name(&self) -> &'static str {
        self.definition().name
    }

    /// Number of floats this type produces.
    pub fn element_count(&self) -> usize {
        self.definition().element_count
    }

    /// How often values of this type change.
    pub fn derive_variability(&self) -> Variability {
        self.definition().variability
    }

    /// Returns true if this type produces a full 4x4 matrix.
    pub fn is_matrix4(&self) -> bool {
        self.element_count() == 16
    }
}

/// Extra data attached to an auto constant entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoConstantPayload {
    /// Integer data, e.g. the light index for light parameters.
    Int(u32),
    /// Real data, e.g. the time scale factor for time parameters.
    Real(f32),
}

impl Default for AutoConstantPayload {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl AutoConstantPayload {
    /// Payload as an integer, truncating real data.
    pub fn as_int(&self) -> u32 {
        match *self {
            Self::Int(value) => value,
            Self::Real(value) => value as u32,
        }
    }

    /// Payload as a real number.
    pub fn as_real(&self) -> f32 {
        match *self {
            Self::Int(value) => value as f32,
            Self::Real(value) => value,
        }
    }
}

/// One registered auto constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoConstantEntry {
    /// Which value the render loop should supply.
    pub constant_type: AutoConstantType,
    /// Offset of the value in the float buffer.
    pub physical_index: usize,
    /// Number of floats reserved for the value.
    pub element_count: usize,
    /// How often the value changes.
    pub variability: Variability,
    /// Extra data, e.g. a light index.
    pub payload: AutoConstantPayload,
}

impl AutoConstantEntry {
    /// Create an entry with the default element count.
    ///
    /// `SinTime0X` predates integer payloads and must always carry real data.
    pub fn new(
        constant_type: AutoConstantType,
        physical_index: usize,
        payload: AutoConstantPayload,
        variability: Variability,
    ) -> Self {
        debug_assert!(
            !(constant_type == AutoConstantType::SinTime0X
                && matches!(payload, AutoConstantPayload::Int(_))),
            "sintime_0_x requires a real payload"
        );
        Self {
            constant_type,
            physical_index,
            element_count: DEFAULT_AUTO_ELEMENT_COUNT,
            variability,
            payload,
        }
    }

    /// Set the element count.
    pub fn with_element_count(mut self, element_count: usize) -> Self {
        self.element_count = element_count;
        self
    }
}

/// Per-parameter-set list of auto constants.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoConstantRegistry {
    entries: Vec<AutoConstantEntry>,
    combined_variability: Variability,
}

impl Default for AutoConstantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoConstantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            combined_variability: Variability::empty(),
        }
    }

    /// Register an auto constant.
    ///
    /// An existing entry at the same physical index is replaced, otherwise
    /// the entry is appended.
    pub fn register(&mut self, entry: AutoConstantEntry) {
        self.combined_variability |= entry.variability;
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.physical_index == entry.physical_index)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the entry at a physical index. Returns the removed entry.
    pub fn remove_for_physical(&mut self, physical_index: usize) -> Option<AutoConstantEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.physical_index == physical_index)?;
        let removed = self.entries.remove(position);
        self.recompute_variability();
        Some(removed)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.combined_variability = Variability::empty();
    }

    fn recompute_variability(&mut self) {
        self.combined_variability = self
            .entries
            .iter()
            .fold(Variability::empty(), |acc, entry| acc | entry.variability);
    }

    /// Find the entry registered at a physical index.
    pub fn find_for_physical(&self, physical_index: usize) -> Option<&AutoConstantEntry> {
        self.entries
            .iter()
            .find(|entry| entry.physical_index == physical_index)
    }

    /// Union of the variability of every entry.
    pub fn combined_variability(&self) -> Variability {
        self.combined_variability
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[AutoConstantEntry] {
        &self.entries
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &AutoConstantEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no auto constants are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Supplies the current value of auto constants.
///
/// Implemented by the render loop, which knows the camera, the object being
/// drawn and the active lights.
pub trait AutoConstantSource {
    /// Write the current value of `entry` into `dest`.
    ///
    /// `dest` is at most `entry.element_count` long. Matrices are written row-major.
    fn write_auto_constant(&self, entry: &AutoConstantEntry, dest: &mut [f32]);
}

/// Auto constant source backed by a fixed table of values.
///
/// Useful for tools and tests. Light-indexed types are looked up by
/// `(type, light index)`; everything else uses index 0.
#[derive(Debug, Clone, Default)]
pub struct AutoConstantValues {
    values: HashMap<(AutoConstantType, u32), Vec<f32>>,
}

impl AutoConstantValues {
    /// Create an empty value table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a type.
    pub fn with_value(mut self, constant_type: AutoConstantType, values: &[f32]) -> Self {
        self.set(constant_type, 0, values);
        self
    }

    /// Set the value for a type and extra-data index.
    pub fn set(&mut self, constant_type: AutoConstantType, index: u32, values: &[f32]) {
        self.values.insert((constant_type, index), values.to_vec());
    }
}

impl AutoConstantSource for AutoConstantValues {
    fn write_auto_constant(&self, entry: &AutoConstantEntry, dest: &mut [f32]) {
        let index = match entry.constant_type.definition().data_kind {
            ExtraDataKind::Int => entry.payload.as_int(),
            _ => 0,
        };
        if let Some(values) = self.values.get(&(entry.constant_type, index)) {
            let count = values.len().min(dest.len());
            dest[..count].copy_from_slice(&values[..count]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup_by_name() {
        assert_eq!(
            AutoConstantType::from_name("world_matrix"),
            Some(AutoConstantType::WorldMatrix)
        );
        assert_eq!(
            AutoConstantType::from_name("sintime_0_x"),
            Some(AutoConstantType::SinTime0X)
        );
        assert_eq!(AutoConstantType::from_name("no_such_thing"), None);
    }

    #[test]
    fn test_catalogue_names_unique() {
        let mut names: Vec<_> = AutoConstantType::ALL.iter().map(|ty| ty.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AutoConstantType::ALL.len());
    }

    #[test]
    fn test_derived_variability() {
        assert_eq!(
            AutoConstantType::ViewMatrix.derive_variability(),
            Variability::GLOBAL
        );
        assert_eq!(
            AutoConstantType::WorldMatrix.derive_variability(),
            Variability::PER_OBJECT
        );
        assert_eq!(
            AutoConstantType::LightPositionObjectSpace.derive_variability(),
            Variability::PER_OBJECT | Variability::LIGHTS
        );
        assert_eq!(
            AutoConstantType::DerivedLightDiffuseColor.derive_variability(),
            Variability::GLOBAL | Variability::LIGHTS
        );
        assert_eq!(
            AutoConstantType::PassIterationNumber.derive_variability(),
            Variability::PASS_ITERATION_NUMBER
        );
    }

    #[test]
    fn test_register_replaces_same_physical() {
        let mut registry = AutoConstantRegistry::new();
        registry.register(AutoConstantEntry::new(
            AutoConstantType::WorldMatrix,
            0,
            AutoConstantPayload::Int(0),
            Variability::PER_OBJECT,
        ));
        registry.register(AutoConstantEntry::new(
            AutoConstantType::LightPosition,
            0,
            AutoConstantPayload::Int(2),
            Variability::LIGHTS,
        ));

        assert_eq!(registry.len(), 1);
        let entry = registry.find_for_physical(0).unwrap();
        assert_eq!(entry.constant_type, AutoConstantType::LightPosition);
        assert_eq!(entry.element_count, DEFAULT_AUTO_ELEMENT_COUNT);
        assert_eq!(
            registry.combined_variability(),
            Variability::PER_OBJECT | Variability::LIGHTS
        );
    }

    #[test]
    fn test_remove_recomputes_variability() {
        let mut registry = AutoConstantRegistry::new();
        registry.register(AutoConstantEntry::new(
            AutoConstantType::WorldMatrix,
            0,
            AutoConstantPayload::default(),
            Variability::PER_OBJECT,
        ));
        registry.register(AutoConstantEntry::new(
            AutoConstantType::Time,
            16,
            AutoConstantPayload::Real(1.0),
            Variability::GLOBAL,
        ));

        assert!(registry.remove_for_physical(0).is_some());
        assert!(registry.remove_for_physical(0).is_none());
        assert_eq!(registry.combined_variability(), Variability::GLOBAL);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.combined_variability().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sintime_0_x requires a real payload")]
    fn test_sintime_int_payload_rejected() {
        let _ = AutoConstantEntry::new(
            AutoConstantType::SinTime0X,
            0,
            AutoConstantPayload::Int(1),
            Variability::GLOBAL,
        );
    }

    #[test]
    fn test_value_table_source() {
        let mut values = AutoConstantValues::new();
        values.set(AutoConstantType::LightPosition, 1, &[1.0, 2.0, 3.0, 1.0]);
        let entry = AutoConstantEntry::new(
            AutoConstantType::LightPosition,
            0,
            AutoConstantPayload::Int(1),
            Variability::LIGHTS,
        );
        let mut dest = [0.0; 4];
        values.write_auto_constant(&entry, &mut dest);
        assert_eq!(dest, [1.0, 2.0, 3.0, 1.0]);
    }
}
