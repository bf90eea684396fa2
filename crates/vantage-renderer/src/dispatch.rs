//! Render Dispatch
//!
//! Binds the node chosen for the frame's detail level and issues the draws
//! for its mesh topology.

use smallvec::SmallVec;
use vantage_assets::{AssetError, Mesh, Scene, Topology};

use crate::backend::{MeshBuffers, RenderBackend};
use crate::lod::{DetailLevel, DetailTable};
use crate::shader::{FrameUniforms, TextureBinding, texture_bindings, vertex_attributes};
use crate::{RendererError, RendererResult};

/// Index element format of every mesh
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

/// One draw against the currently bound buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub topology: wgpu::PrimitiveTopology,
    /// `Some` for draws that read through the index buffer
    pub index_format: Option<wgpu::IndexFormat>,
    /// First index (indexed) or first vertex (non-indexed)
    pub first: u32,
    /// Number of indices or vertices
    pub count: u32,
}

impl DrawCall {
    /// Whether the draw reads through the index buffer
    pub fn is_indexed(&self) -> bool {
        self.index_format.is_some()
    }
}

/// Draw calls for a mesh of the given topology.
///
/// Lists produce a single call of `face_count * 3` elements. Strips produce
/// one call of `len + 2` elements per strip, at an offset that starts from
/// zero for this mesh and accumulates only across its own strips. Counts
/// saturate at `u32::MAX`; [`Mesh::topology`] rejects meshes whose counts
/// overflow before they reach a draw.
pub fn draw_calls(topology: Topology, face_count: u32, strips: &[u32]) -> Vec<DrawCall> {
    let index_format = topology.is_indexed().then_some(INDEX_FORMAT);

    if !topology.is_strip() {
        return vec![DrawCall {
            topology: wgpu::PrimitiveTopology::TriangleList,
            index_format,
            first: 0,
            count: face_count.saturating_mul(3),
        }];
    }

    let mut offset = 0u32;
    strips
        .iter()
        .map(|&length| {
            let count = length.saturating_add(2);
            let call = DrawCall {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                index_format,
                first: offset,
                count,
            };
            offset = offset.saturating_add(count);
            call
        })
        .collect()
}

/// Work issued for one mesh draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub triangles: u32,
}

/// Everything needed to draw one mesh, resolved at view initialisation
#[derive(Debug, Clone)]
pub struct MeshDispatch {
    name: String,
    topology: Topology,
    face_count: u32,
    strips: Vec<u32>,
    buffers: MeshBuffers,
    attributes: Vec<wgpu::VertexAttribute>,
    stride: wgpu::BufferAddress,
}

impl MeshDispatch {
    /// Resolve a mesh's topology and vertex layout against its buffers
    pub fn new(mesh: &Mesh, buffers: MeshBuffers) -> RendererResult<Self> {
        let topology = mesh.topology()?;
        let layout = mesh.vertices.layout();
        Ok(Self {
            name: mesh.name.clone(),
            topology,
            face_count: mesh.face_count,
            strips: mesh.strips().to_vec(),
            buffers,
            attributes: vertex_attributes(layout),
            stride: layout.stride as wgpu::BufferAddress,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn buffers(&self) -> MeshBuffers {
        self.buffers
    }

    /// Triangles rasterised by one draw of this mesh
    pub fn triangles(&self) -> u32 {
        if self.topology.is_strip() {
            self.strips.iter().fold(0u32, |total, len| total.saturating_add(*len))
        } else {
            self.face_count
        }
    }

    /// Draw calls for this mesh
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        draw_calls(self.topology, self.face_count, &self.strips)
    }

    /// Bind, draw and unbind
    pub fn draw<B: RenderBackend>(&self, backend: &mut B) -> DrawStats {
        backend.bind_mesh(&self.buffers, &self.attributes, self.stride);
        let calls = self.draw_calls();
        for call in &calls {
            backend.draw(*call);
        }
        backend.unbind();

        DrawStats {
            draw_calls: calls.len() as u32,
            triangles: self.triangles(),
        }
    }
}

/// Node and mesh resolved for a detail level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawTarget {
    pub level: DetailLevel,
    pub node: usize,
    pub mesh: usize,
}

/// Result of dispatching one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Node drawn
    pub node: usize,
    /// Mesh drawn by that node
    pub mesh: usize,
    pub draw_calls: u32,
    pub triangles: u32,
}

/// Maps detail levels to nodes and draws them
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: DetailTable,
    node_meshes: Vec<usize>,
    meshes: Vec<MeshDispatch>,
    textures: SmallVec<[TextureBinding; 2]>,
}

impl Dispatcher {
    /// Resolve every mesh of `scene` against its buffers.
    ///
    /// `buffers` is indexed like `scene.meshes`. Fails when a detail level
    /// has no node, or when the table maps a level to a node or mesh the
    /// scene does not have.
    pub fn new(scene: &Scene, table: DetailTable, buffers: &[MeshBuffers]) -> RendererResult<Self> {
        for level in DetailLevel::ALL {
            if table.node_for(level).is_none() {
                return Err(RendererError::UnmappedLevel(level));
            }
        }

        for mapping in table.entries() {
            let node = scene.nodes.get(mapping.node).ok_or(RendererError::MissingNode {
                level: mapping.level,
                node: mapping.node,
            })?;
            if node.mesh_index >= scene.meshes.len() {
                return Err(AssetError::InvalidNode {
                    node: mapping.node,
                    mesh_index: node.mesh_index,
                }
                .into());
            }
        }

        if buffers.len() != scene.meshes.len() {
            return Err(RendererError::BufferCreation(format!(
                "{} buffer sets for {} meshes",
                buffers.len(),
                scene.meshes.len()
            )));
        }

        let meshes = scene
            .meshes
            .iter()
            .zip(buffers)
            .map(|(mesh, buffers)| MeshDispatch::new(mesh, *buffers))
            .collect::<RendererResult<Vec<_>>>()?;

        Ok(Self {
            table,
            node_meshes: scene.nodes.iter().map(|n| n.mesh_index).collect(),
            meshes,
            textures: texture_bindings(&scene.textures),
        })
    }

    /// Level to node mapping
    pub fn table(&self) -> &DetailTable {
        &self.table
    }

    /// Resolved meshes, in scene order
    pub fn meshes(&self) -> &[MeshDispatch] {
        &self.meshes
    }

    /// Texture bindings issued before every draw
    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    /// Node drawn for a level
    pub fn node_for(&self, level: DetailLevel) -> RendererResult<usize> {
        self.table
            .node_for(level)
            .ok_or(RendererError::UnmappedLevel(level))
    }

    /// Resolve the node and mesh drawn for `geometry` without touching the
    /// backend
    pub fn resolve(&self, geometry: DetailLevel) -> RendererResult<DrawTarget> {
        let node = self.node_for(geometry)?;
        let mesh = *self
            .node_meshes
            .get(node)
            .ok_or(RendererError::MissingNode { level: geometry, node })?;
        if mesh >= self.meshes.len() {
            return Err(AssetError::InvalidNode { node, mesh_index: mesh }.into());
        }
        Ok(DrawTarget {
            level: geometry,
            node,
            mesh,
        })
    }

    /// Write the frame uniforms, bind the textures and draw a resolved target
    pub fn submit<B: RenderBackend>(
        &self,
        backend: &mut B,
        uniforms: &FrameUniforms,
        target: DrawTarget,
    ) -> DispatchStats {
        backend.write_uniforms(uniforms);
        backend.bind_textures(&self.textures);

        let stats = match self.meshes.get(target.mesh) {
            Some(mesh) => mesh.draw(backend),
            None => DrawStats::default(),
        };
        DispatchStats {
            node: target.node,
            mesh: target.mesh,
            draw_calls: stats.draw_calls,
            triangles: stats.triangles,
        }
    }

    /// Resolve `geometry`, then write the frame uniforms and draw its node.
    ///
    /// The shader flag travels in `uniforms` and is independent of
    /// `geometry`; the renderer normally passes the same level to both.
    /// Nothing reaches the backend when resolution fails.
    pub fn dispatch<B: RenderBackend>(
        &self,
        backend: &mut B,
        uniforms: &FrameUniforms,
        geometry: DetailLevel,
    ) -> RendererResult<DispatchStats> {
        let target = self.resolve(geometry)?;
        Ok(self.submit(backend, uniforms, target))
    }
}
