//! # Vantage Assets
//!
//! Mesh and scene data handed to the renderer by the asset loader.
//!
//! ## Features
//! - Interleaved vertex streams behind a typed position accessor
//! - Load-time topology validation (lists, strips, indexed or not)
//! - Bounding box extraction for the reference mesh
//! - Procedural tessellated boxes for headless runs

pub mod bounds;
pub mod mesh;
pub mod primitives;

pub use bounds::extract_bounding_box;
pub use mesh::{Mesh, PositionSource, Topology, Vertex, VertexLayout, VertexStream};

use thiserror::Error;

/// Asset errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Invalid mesh '{mesh}': {reason}")]
    InvalidMesh { mesh: String, reason: String },

    #[error("Missing topology data in mesh '{mesh}': {reason}")]
    MissingTopologyData { mesh: String, reason: String },

    #[error("Node {node} references missing mesh {mesh_index}")]
    InvalidNode { node: usize, mesh_index: usize },
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Scene node placing a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node name
    pub name: String,
    /// Index into [`Scene::meshes`]
    pub mesh_index: usize,
}

impl Node {
    /// Create a node referencing a mesh
    pub fn new(name: impl Into<String>, mesh_index: usize) -> Self {
        Self {
            name: name.into(),
            mesh_index,
        }
    }
}

/// Texture created by the asset loader and owned by it; the renderer only
/// binds it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Textures sampled by the object's material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneTextures {
    /// Environment reflection map
    pub reflection: Option<TextureHandle>,
    /// Tangent-space normal map, sampled only at high detail
    pub normal_map: Option<TextureHandle>,
}

/// Meshes and the nodes that draw them.
///
/// Mesh 0 is the reference mesh: its bounds drive the LOD decision for every
/// node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub textures: SceneTextures,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-node scene: node 0 draws `high`, node 1 draws `low`
    pub fn with_detail_pair(high: Mesh, low: Mesh) -> Self {
        let nodes = vec![Node::new(high.name.clone(), 0), Node::new(low.name.clone(), 1)];
        Self {
            meshes: vec![high, low],
            nodes,
            textures: SceneTextures::default(),
        }
    }

    /// Builder form for attaching the material textures
    pub fn with_textures(mut self, textures: SceneTextures) -> Self {
        self.textures = textures;
        self
    }

    /// Add a mesh and return its index
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Add a node and return its index
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// The mesh whose bounds drive LOD decisions
    pub fn reference_mesh(&self) -> AssetResult<&Mesh> {
        self.meshes.first().ok_or_else(|| AssetError::InvalidMesh {
            mesh: "<none>".to_string(),
            reason: "scene has no meshes".to_string(),
        })
    }

    /// Mesh drawn by a node
    pub fn node_mesh(&self, node: usize) -> Option<&Mesh> {
        self.nodes.get(node).and_then(|n| self.meshes.get(n.mesh_index))
    }

    /// Validate node references, vertex data lengths and every mesh's
    /// topology data.
    ///
    /// Returns the topology of each mesh, in mesh order.
    pub fn validate(&self) -> AssetResult<Vec<Topology>> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.mesh_index >= self.meshes.len() {
                return Err(AssetError::InvalidNode {
                    node: index,
                    mesh_index: node.mesh_index,
                });
            }
        }
        for mesh in &self.meshes {
            if !mesh.vertices.is_complete() {
                return Err(AssetError::InvalidMesh {
                    mesh: mesh.name.clone(),
                    reason: format!("vertex data shorter than {} vertices", mesh.vertex_count()),
                });
            }
        }
        self.meshes.iter().map(Mesh::topology).collect()
    }
}
