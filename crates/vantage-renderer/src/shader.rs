//! Shader Interface
//!
//! Uniforms and vertex attribute bindings shared with the compiled shader
//! program.

use glam::{Mat3, Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use vantage_assets::{SceneTextures, TextureHandle, VertexLayout};

use crate::camera::FrameTransforms;
use crate::lod::DetailLevel;

/// Vertex attribute locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttrib {
    Position = 0,
    Normal = 1,
    TexCoord = 2,
    Tangent = 3,
}

impl VertexAttrib {
    /// Attribute name in the shader source
    pub fn name(&self) -> &'static str {
        match self {
            Self::Position => "inVertex",
            Self::Normal => "inNormal",
            Self::TexCoord => "inTexCoord",
            Self::Tangent => "inTangent",
        }
    }

    /// Shader location
    pub fn location(&self) -> u32 {
        *self as u32
    }

    fn format(&self) -> wgpu::VertexFormat {
        match self {
            Self::TexCoord => wgpu::VertexFormat::Float32x2,
            _ => wgpu::VertexFormat::Float32x3,
        }
    }
}

/// Texture units sampled by the fragment program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Reflection = 0,
    NormalMap = 1,
}

impl TextureUnit {
    pub const ALL: [TextureUnit; 2] = [TextureUnit::Reflection, TextureUnit::NormalMap];

    /// Unit index the sampler uniform is set to
    pub fn index(&self) -> u32 {
        *self as u32
    }

    /// Sampler uniform bound to this unit
    pub fn slot(&self) -> UniformSlot {
        match self {
            Self::Reflection => UniformSlot::ReflectionSampler,
            Self::NormalMap => UniformSlot::NormalMapSampler,
        }
    }

    /// Sampler assignment written once when the program is set up
    pub fn sampler_uniform(&self) -> (UniformSlot, UniformValue) {
        (self.slot(), UniformValue::Sampler(self.index()))
    }
}

/// A texture bound to a unit for the frame's draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub unit: TextureUnit,
    pub texture: TextureHandle,
}

/// Unit bindings for a scene's textures, in unit order. Missing textures
/// leave their unit unbound.
pub fn texture_bindings(textures: &SceneTextures) -> SmallVec<[TextureBinding; 2]> {
    [
        (TextureUnit::Reflection, textures.reflection),
        (TextureUnit::NormalMap, textures.normal_map),
    ]
    .into_iter()
    .filter_map(|(unit, texture)| texture.map(|texture| TextureBinding { unit, texture }))
    .collect()
}

/// Uniform slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    MvpMatrix,
    ModelWorld,
    EyePosModel,
    HighDetail,
    ReflectionSampler,
    NormalMapSampler,
}

impl UniformSlot {
    pub const ALL: [UniformSlot; 6] = [
        UniformSlot::MvpMatrix,
        UniformSlot::ModelWorld,
        UniformSlot::EyePosModel,
        UniformSlot::HighDetail,
        UniformSlot::ReflectionSampler,
        UniformSlot::NormalMapSampler,
    ];

    /// Uniform name in the shader source
    pub fn name(&self) -> &'static str {
        match self {
            Self::MvpMatrix => "MVPMatrix",
            Self::ModelWorld => "ModelWorld",
            Self::EyePosModel => "EyePosModel",
            Self::HighDetail => "bHighDetail",
            Self::ReflectionSampler => "sReflectTex",
            Self::NormalMapSampler => "sNormalMap",
        }
    }
}

/// Value written to a uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Vec3(Vec3),
    Bool(bool),
    /// Texture unit index for a sampler uniform
    Sampler(u32),
}

/// Uniform values written once per frame before the draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub mvp: Mat4,
    /// Rotation/scale part of the model matrix
    pub model_world: Mat3,
    /// Eye position expressed in model space
    pub eye_pos_model: Vec3,
    /// Detail flag; the fragment program skips the normal-map sample when false
    pub high_detail: bool,
}

impl FrameUniforms {
    /// Build the uniforms for a frame
    pub fn new(transforms: &FrameTransforms, shading: DetailLevel) -> Self {
        let eye = transforms.model_view.inverse() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        Self {
            mvp: transforms.mvp,
            model_world: Mat3::from_mat4(transforms.model),
            eye_pos_model: eye.truncate(),
            high_detail: shading.is_high(),
        }
    }

    /// Every uniform with its slot, in upload order
    pub fn entries(&self) -> [(UniformSlot, UniformValue); 4] {
        [
            (UniformSlot::MvpMatrix, UniformValue::Mat4(self.mvp)),
            (UniformSlot::ModelWorld, UniformValue::Mat3(self.model_world)),
            (UniformSlot::EyePosModel, UniformValue::Vec3(self.eye_pos_model)),
            (UniformSlot::HighDetail, UniformValue::Bool(self.high_detail)),
        ]
    }
}

/// Vertex attributes present in a layout, at their shader locations
pub fn vertex_attributes(layout: &VertexLayout) -> Vec<wgpu::VertexAttribute> {
    [
        (VertexAttrib::Position, layout.position),
        (VertexAttrib::Normal, layout.normal),
        (VertexAttrib::TexCoord, layout.texcoord),
        (VertexAttrib::Tangent, layout.tangent),
    ]
    .into_iter()
    .filter_map(|(attrib, offset)| {
        offset.map(|offset| wgpu::VertexAttribute {
            format: attrib.format(),
            offset: offset as wgpu::BufferAddress,
            shader_location: attrib.location(),
        })
    })
    .collect()
}
