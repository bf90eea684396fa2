//! Mesh Data
//!
//! Interleaved vertex streams, optional 16-bit index data and the strip
//! layout exported with each mesh.

use vantage_core::math::{Vec2, Vec3};

use crate::{AssetError, AssetResult};

/// Size of one `f32` component in bytes
const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Byte offsets of the attributes inside one interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Distance in bytes between consecutive vertices
    pub stride: usize,
    /// Position (3 x f32)
    pub position: Option<usize>,
    /// Normal (3 x f32)
    pub normal: Option<usize>,
    /// First texture coordinate set (2 x f32)
    pub texcoord: Option<usize>,
    /// Tangent (3 x f32)
    pub tangent: Option<usize>,
}

impl VertexLayout {
    /// Position, normal, texcoord and tangent packed in that order
    pub const fn interleaved() -> Self {
        Self {
            stride: 11 * F32_SIZE,
            position: Some(0),
            normal: Some(3 * F32_SIZE),
            texcoord: Some(6 * F32_SIZE),
            tangent: Some(8 * F32_SIZE),
        }
    }

    /// Tightly packed positions only
    pub const fn positions_only() -> Self {
        Self {
            stride: 3 * F32_SIZE,
            position: Some(0),
            normal: None,
            texcoord: None,
            tangent: None,
        }
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::interleaved()
    }
}

/// Typed access to vertex positions, independent of buffer layout
pub trait PositionSource {
    /// Number of vertices available
    fn vertex_count(&self) -> usize;

    /// Position of a vertex, or `None` when it cannot be read
    fn position_at(&self, index: usize) -> Option<Vec3>;

    /// Whether the backing data holds every declared vertex in full
    fn is_complete(&self) -> bool;
}

/// Interleaved vertex data as exported by the content pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStream {
    data: Vec<u8>,
    layout: VertexLayout,
    vertex_count: usize,
}

impl VertexStream {
    /// Wrap raw interleaved bytes
    pub fn new(data: Vec<u8>, layout: VertexLayout, vertex_count: usize) -> Self {
        Self {
            data,
            layout,
            vertex_count,
        }
    }

    /// Pack vertices into the [`VertexLayout::interleaved`] layout
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let layout = VertexLayout::interleaved();
        let mut data = Vec::with_capacity(vertices.len() * layout.stride);
        for vertex in vertices {
            for value in vertex.to_array() {
                data.extend_from_slice(&value.to_ne_bytes());
            }
        }
        Self::new(data, layout, vertices.len())
    }

    /// Pack bare positions into the [`VertexLayout::positions_only`] layout
    pub fn from_positions(positions: &[Vec3]) -> Self {
        let layout = VertexLayout::positions_only();
        let mut data = Vec::with_capacity(positions.len() * layout.stride);
        for position in positions {
            for value in position.to_array() {
                data.extend_from_slice(&value.to_ne_bytes());
            }
        }
        Self::new(data, layout, positions.len())
    }

    /// Raw interleaved bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Attribute layout
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    fn read_f32(&self, offset: usize) -> Option<f32> {
        let bytes = self.data.get(offset..offset + F32_SIZE)?;
        Some(f32::from_ne_bytes(bytes.try_into().ok()?))
    }
}

impl PositionSource for VertexStream {
    fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn position_at(&self, index: usize) -> Option<Vec3> {
        if index >= self.vertex_count {
            return None;
        }
        let base = index * self.layout.stride + self.layout.position?;
        Some(Vec3::new(
            self.read_f32(base)?,
            self.read_f32(base + F32_SIZE)?,
            self.read_f32(base + 2 * F32_SIZE)?,
        ))
    }

    fn is_complete(&self) -> bool {
        self.vertex_count
            .checked_mul(self.layout.stride)
            .is_some_and(|len| len <= self.data.len())
    }
}

/// A single interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
    pub tangent: Vec3,
}

impl Vertex {
    fn to_array(self) -> [f32; 11] {
        let [px, py, pz] = self.position.to_array();
        let [nx, ny, nz] = self.normal.to_array();
        let [u, v] = self.texcoord.to_array();
        let [tx, ty, tz] = self.tangent.to_array();
        [px, py, pz, nx, ny, nz, u, v, tx, ty, tz]
    }
}

/// How a mesh's triangles are laid out.
///
/// Fixed when the mesh is exported; never re-evaluated per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Triangle list drawn through the index buffer
    IndexedList,
    /// Triangle list drawn straight from the vertex buffer
    List,
    /// Triangle strips drawn through the index buffer
    IndexedStrips,
    /// Triangle strips drawn straight from the vertex buffer
    Strips,
}

impl Topology {
    /// Whether draws read through an index buffer
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::IndexedList | Self::IndexedStrips)
    }

    /// Whether the mesh is made of strips
    pub fn is_strip(&self) -> bool {
        matches!(self, Self::IndexedStrips | Self::Strips)
    }
}

/// Mesh as delivered by the asset loader
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Interleaved vertex data
    pub vertices: VertexStream,
    /// Number of triangles
    pub face_count: u32,
    /// Number of strips the exporter declared (0 for triangle lists)
    pub strip_count: u32,
    /// Triangles per strip; a strip of length `n` spans `n + 2` vertices
    pub strip_lengths: Option<Vec<u32>>,
    /// Whether the exporter declared an index buffer
    pub indexed: bool,
    /// 16-bit index data
    pub indices: Option<Vec<u16>>,
}

impl Mesh {
    /// Non-indexed triangle list
    pub fn triangle_list(name: impl Into<String>, vertices: VertexStream, face_count: u32) -> Self {
        Self {
            name: name.into(),
            vertices,
            face_count,
            strip_count: 0,
            strip_lengths: None,
            indexed: false,
            indices: None,
        }
    }

    /// Indexed triangle list
    pub fn indexed_triangle_list(name: impl Into<String>, vertices: VertexStream, indices: Vec<u16>) -> Self {
        let face_count = (indices.len() / 3) as u32;
        Self {
            name: name.into(),
            vertices,
            face_count,
            strip_count: 0,
            strip_lengths: None,
            indexed: true,
            indices: Some(indices),
        }
    }

    /// Triangle strips, optionally indexed
    pub fn triangle_strips(
        name: impl Into<String>,
        vertices: VertexStream,
        strip_lengths: Vec<u32>,
        indices: Option<Vec<u16>>,
    ) -> Self {
        let face_count = strip_lengths.iter().fold(0u32, |total, len| total.saturating_add(*len));
        Self {
            name: name.into(),
            vertices,
            face_count,
            strip_count: strip_lengths.len() as u32,
            strip_lengths: Some(strip_lengths),
            indexed: indices.is_some(),
            indices,
        }
    }

    /// Number of vertices in the stream
    pub fn vertex_count(&self) -> usize {
        self.vertices.vertex_count()
    }

    /// Number of indices (or vertices, when not indexed) the draw consumes.
    ///
    /// `None` when the exported counts overflow `u32`.
    pub fn element_count(&self) -> Option<u32> {
        match &self.strip_lengths {
            Some(lengths) if self.strip_count > 0 => lengths
                .iter()
                .take(self.strip_count as usize)
                .try_fold(0u32, |total, len| total.checked_add(len.checked_add(2)?)),
            _ => self.face_count.checked_mul(3),
        }
    }

    /// Strip lengths actually used for drawing
    pub fn strips(&self) -> &[u32] {
        match &self.strip_lengths {
            Some(lengths) => &lengths[..lengths.len().min(self.strip_count as usize)],
            None => &[],
        }
    }

    /// Check the exported topology data and classify the mesh.
    ///
    /// Fails with [`AssetError::MissingTopologyData`] when the mesh declares
    /// strips or an index buffer without supplying the data for them, or when
    /// its counts overflow.
    pub fn topology(&self) -> AssetResult<Topology> {
        let strips = self.strip_count > 0;

        if strips {
            let available = self.strip_lengths.as_ref().map_or(0, Vec::len);
            if available < self.strip_count as usize {
                return Err(AssetError::MissingTopologyData {
                    mesh: self.name.clone(),
                    reason: format!(
                        "{} strips declared but {} strip lengths present",
                        self.strip_count, available
                    ),
                });
            }
        }

        let Some(needed) = self.element_count() else {
            return Err(AssetError::MissingTopologyData {
                mesh: self.name.clone(),
                reason: format!(
                    "element count overflows with {} faces and {} strips",
                    self.face_count, self.strip_count
                ),
            });
        };

        if self.indexed {
            let Some(indices) = &self.indices else {
                return Err(AssetError::MissingTopologyData {
                    mesh: self.name.clone(),
                    reason: "index buffer declared without index data".to_string(),
                });
            };
            if indices.len() < needed as usize {
                return Err(AssetError::MissingTopologyData {
                    mesh: self.name.clone(),
                    reason: format!("{} indices present, {} required", indices.len(), needed),
                });
            }
        }

        Ok(match (strips, self.indexed) {
            (false, true) => Topology::IndexedList,
            (false, false) => Topology::List,
            (true, true) => Topology::IndexedStrips,
            (true, false) => Topology::Strips,
        })
    }
}
