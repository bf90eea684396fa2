//! Render Backend
//!
//! The seam between the LOD core and the graphics API. Buffer lifetime is
//! tied to the rendering context: buffers are created when a view is
//! initialised and destroyed when it is released.

use vantage_assets::Mesh;

use crate::dispatch::DrawCall;
use crate::shader::{FrameUniforms, TextureBinding, TextureUnit, UniformSlot, UniformValue};
use crate::RendererResult;

/// Opaque GPU buffer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// GPU buffers backing one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex: BufferHandle,
    /// Present only when the mesh carries index data
    pub index: Option<BufferHandle>,
}

/// Graphics operations the renderer needs
pub trait RenderBackend {
    /// Upload a mesh's vertex and index data
    fn create_mesh_buffers(&mut self, mesh: &Mesh) -> RendererResult<MeshBuffers>;

    /// Release buffers created by [`RenderBackend::create_mesh_buffers`]
    fn destroy_mesh_buffers(&mut self, buffers: MeshBuffers);

    /// Point each sampler uniform at its texture unit
    fn assign_samplers(&mut self, units: &[TextureUnit]);

    /// Clear the frame
    fn begin_frame(&mut self, clear: wgpu::Color);

    /// Write every per-frame uniform
    fn write_uniforms(&mut self, uniforms: &FrameUniforms);

    /// Bind textures to their units for the next draw
    fn bind_textures(&mut self, bindings: &[TextureBinding]);

    /// Bind a mesh's buffers with the given vertex layout
    fn bind_mesh(&mut self, buffers: &MeshBuffers, attributes: &[wgpu::VertexAttribute], stride: wgpu::BufferAddress);

    /// Issue one draw against the bound buffers
    fn draw(&mut self, call: DrawCall);

    /// Unbind buffers after drawing
    fn unbind(&mut self);
}

/// Command captured by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateBuffers { mesh: String, buffers: MeshBuffers },
    DestroyBuffers(MeshBuffers),
    BeginFrame(wgpu::Color),
    WriteUniform(UniformSlot, UniformValue),
    BindTextures(Vec<TextureBinding>),
    Bind { buffers: MeshBuffers, attribute_count: usize, stride: wgpu::BufferAddress },
    Draw(DrawCall),
    Unbind,
}

/// Backend that records every command instead of talking to a GPU.
///
/// Drives the headless simulation and the tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<BackendCommand>,
    next_handle: u32,
    live_buffers: usize,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the recorded commands
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded draw calls, in order
    pub fn draws(&self) -> Vec<DrawCall> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                BackendCommand::Draw(call) => Some(*call),
                _ => None,
            })
            .collect()
    }

    /// Most recent value written to a uniform slot
    pub fn last_uniform(&self, slot: UniformSlot) -> Option<UniformValue> {
        self.commands.iter().rev().find_map(|c| match c {
            BackendCommand::WriteUniform(s, value) if *s == slot => Some(*value),
            _ => None,
        })
    }

    /// Most recent set of texture bindings
    pub fn last_textures(&self) -> Option<&[TextureBinding]> {
        self.commands.iter().rev().find_map(|c| match c {
            BackendCommand::BindTextures(bindings) => Some(bindings.as_slice()),
            _ => None,
        })
    }

    /// Number of buffer sets created and not yet destroyed
    pub fn live_buffers(&self) -> usize {
        self.live_buffers
    }

    fn allocate(&mut self) -> BufferHandle {
        self.next_handle += 1;
        BufferHandle(self.next_handle)
    }
}

impl RenderBackend for RecordingBackend {
    fn create_mesh_buffers(&mut self, mesh: &Mesh) -> RendererResult<MeshBuffers> {
        let vertex = self.allocate();
        let index = match mesh.indices {
            Some(_) => Some(self.allocate()),
            None => None,
        };
        let buffers = MeshBuffers { vertex, index };
        self.live_buffers += 1;
        self.commands.push(BackendCommand::CreateBuffers {
            mesh: mesh.name.clone(),
            buffers,
        });
        Ok(buffers)
    }

    fn destroy_mesh_buffers(&mut self, buffers: MeshBuffers) {
        self.live_buffers = self.live_buffers.saturating_sub(1);
        self.commands.push(BackendCommand::DestroyBuffers(buffers));
    }

    fn assign_samplers(&mut self, units: &[TextureUnit]) {
        for unit in units {
            let (slot, value) = unit.sampler_uniform();
            self.commands.push(BackendCommand::WriteUniform(slot, value));
        }
    }

    fn begin_frame(&mut self, clear: wgpu::Color) {
        self.commands.push(BackendCommand::BeginFrame(clear));
    }

    fn write_uniforms(&mut self, uniforms: &FrameUniforms) {
        for (slot, value) in uniforms.entries() {
            self.commands.push(BackendCommand::WriteUniform(slot, value));
        }
    }

    fn bind_textures(&mut self, bindings: &[TextureBinding]) {
        self.commands.push(BackendCommand::BindTextures(bindings.to_vec()));
    }

    fn bind_mesh(&mut self, buffers: &MeshBuffers, attributes: &[wgpu::VertexAttribute], stride: wgpu::BufferAddress) {
        self.commands.push(BackendCommand::Bind {
            buffers: *buffers,
            attribute_count: attributes.len(),
            stride,
        });
    }

    fn draw(&mut self, call: DrawCall) {
        self.commands.push(BackendCommand::Draw(call));
    }

    fn unbind(&mut self) {
        self.commands.push(BackendCommand::Unbind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_assets::primitives::tessellated_box;
    use vantage_assets::{TextureHandle, Topology};

    #[test]
    fn test_buffers_follow_index_data() {
        let mut backend = RecordingBackend::new();
        let indexed = backend
            .create_mesh_buffers(&tessellated_box("a", 1.0, 1, Topology::IndexedList))
            .unwrap();
        let plain = backend
            .create_mesh_buffers(&tessellated_box("b", 1.0, 1, Topology::List))
            .unwrap();

        assert!(indexed.index.is_some());
        assert!(plain.index.is_none());
        assert_ne!(indexed.vertex, plain.vertex);
        assert_eq!(backend.live_buffers(), 2);

        backend.destroy_mesh_buffers(indexed);
        assert_eq!(backend.live_buffers(), 1);
    }

    #[test]
    fn test_take_commands() {
        let mut backend = RecordingBackend::new();
        backend.begin_frame(wgpu::Color::BLACK);
        backend.unbind();
        assert_eq!(backend.take_commands().len(), 2);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_sampler_assignment_and_texture_binding() {
        let mut backend = RecordingBackend::new();
        backend.assign_samplers(&TextureUnit::ALL);
        assert_eq!(backend.last_uniform(UniformSlot::ReflectionSampler), Some(UniformValue::Sampler(0)));
        assert_eq!(backend.last_uniform(UniformSlot::NormalMapSampler), Some(UniformValue::Sampler(1)));
        assert!(backend.last_textures().is_none());

        let binding = TextureBinding {
            unit: TextureUnit::Reflection,
            texture: TextureHandle(3),
        };
        backend.bind_textures(&[binding]);
        assert_eq!(backend.last_textures(), Some(&[binding][..]));
    }
}
