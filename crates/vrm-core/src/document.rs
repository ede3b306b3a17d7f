//! glTF JSON schema for the subset avatar exports use.
//!
//! Only fields the loader reads are modelled; everything else in the JSON
//! chunk is ignored by serde. Indices stay as raw `usize` and are checked at
//! the point of use so that errors can name the component that failed.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;

/// Root of a glTF document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub asset: Asset,
    #[serde(default)]
    pub accessors: Vec<Accessor>,
    #[serde(default)]
    pub buffer_views: Vec<BufferView>,
    #[serde(default)]
    pub buffers: Vec<Buffer>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub skins: Vec<Skin>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub textures: Vec<Texture>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Default scene index (if present).
    pub scene: Option<usize>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
    /// Root-level extensions (`VRM`, `VRMC_vrm`, ...), kept untyped.
    #[serde(default)]
    pub extensions: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: Option<String>,
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub accessor_type: String,
    #[serde(default)]
    pub normalized: bool,
    /// Present only on sparse accessors, which are rejected.
    pub sparse: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: usize,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    #[serde(default)]
    pub attributes: HashMap<String, usize>,
    pub indices: Option<usize>,
    pub mode: Option<u32>,
    pub material: Option<usize>,
    /// Morph targets: attribute name -> accessor index.
    #[serde(default)]
    pub targets: Vec<HashMap<String, usize>>,
    /// Non-standard placement some exporters use instead of `extras`.
    pub target_names: Option<Vec<String>>,
    pub extras: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: Option<String>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    /// 4x4 transformation matrix (column-major).
    pub matrix: Option<[f32; 16]>,
    pub translation: Option<[f32; 3]>,
    /// Rotation quaternion `[x, y, z, w]`.
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    pub name: Option<String>,
    pub inverse_bind_matrices: Option<usize>,
    pub joints: Vec<usize>,
    pub skeleton: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub base_color_factor: Option<[f32; 4]>,
    pub base_color_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub source: Option<usize>,
    pub sampler: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: Option<String>,
    pub buffer_view: Option<usize>,
    pub mime_type: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

impl Document {
    /// Parse a document from raw JSON bytes.
    pub fn from_slice(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Checks the single-buffer assumption avatar exports satisfy.
    pub fn validate_single_buffer(&self) -> Result<(), ValidationError> {
        if self.buffers.len() != 1 {
            return Err(ValidationError::BufferCount(self.buffers.len()));
        }
        Ok(())
    }

    pub fn accessor(&self, index: usize) -> Result<&Accessor, ValidationError> {
        lookup(&self.accessors, "accessor", index)
    }

    pub fn buffer_view(&self, index: usize) -> Result<&BufferView, ValidationError> {
        lookup(&self.buffer_views, "buffer view", index)
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh, ValidationError> {
        lookup(&self.meshes, "mesh", index)
    }

    pub fn node(&self, index: usize) -> Result<&Node, ValidationError> {
        lookup(&self.nodes, "node", index)
    }

    pub fn skin(&self, index: usize) -> Result<&Skin, ValidationError> {
        lookup(&self.skins, "skin", index)
    }

    pub fn material(&self, index: usize) -> Result<&Material, ValidationError> {
        lookup(&self.materials, "material", index)
    }

    pub fn texture(&self, index: usize) -> Result<&Texture, ValidationError> {
        lookup(&self.textures, "texture", index)
    }

    pub fn image(&self, index: usize) -> Result<&Image, ValidationError> {
        lookup(&self.images, "image", index)
    }
}

fn lookup<'a, T>(items: &'a [T], kind: &'static str, index: usize) -> Result<&'a T, ValidationError> {
    items
        .get(index)
        .ok_or(ValidationError::MissingReference { kind, index })
}
