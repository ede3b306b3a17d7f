//! Synthetic GLB assets for integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use vrm_core::write_glb;

/// Builds a single-buffer GLB in memory, appending data to one BIN chunk.
#[derive(Default)]
pub struct GlbBuilder {
    pub bin: Vec<u8>,
    pub buffer_views: Vec<Value>,
    pub accessors: Vec<Value>,
    pub meshes: Vec<Value>,
    pub nodes: Vec<Value>,
    pub skins: Vec<Value>,
    pub materials: Vec<Value>,
    pub textures: Vec<Value>,
    pub images: Vec<Value>,
    pub extensions: Option<Value>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` as a new buffer view (4-byte aligned) and return its index.
    pub fn view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    pub fn accessor(&mut self, view: usize, component_type: u32, count: usize, ty: &str) -> usize {
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": ty,
        }));
        self.accessors.len() - 1
    }

    pub fn f32_accessor(&mut self, values: &[f32], ty: &str) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 5126, values.len() / components(ty), ty)
    }

    pub fn u32_accessor(&mut self, values: &[u32], ty: &str) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 5125, values.len() / components(ty), ty)
    }

    pub fn u16_accessor(&mut self, values: &[u16], ty: &str) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 5123, values.len() / components(ty), ty)
    }

    pub fn u8_accessor(&mut self, values: &[u8], ty: &str) -> usize {
        let view = self.view(values, None);
        self.accessor(view, 5121, values.len() / components(ty), ty)
    }

    pub fn mat4_accessor(&mut self, matrices: &[[f32; 16]]) -> usize {
        let flat: Vec<f32> = matrices.iter().flatten().copied().collect();
        self.f32_accessor(&flat, "MAT4")
    }

    pub fn push(list: &mut Vec<Value>, value: Value) -> usize {
        list.push(value);
        list.len() - 1
    }

    pub fn mesh(&mut self, value: Value) -> usize {
        Self::push(&mut self.meshes, value)
    }

    pub fn node(&mut self, value: Value) -> usize {
        Self::push(&mut self.nodes, value)
    }

    pub fn skin(&mut self, value: Value) -> usize {
        Self::push(&mut self.skins, value)
    }

    pub fn material(&mut self, value: Value) -> usize {
        Self::push(&mut self.materials, value)
    }

    pub fn texture(&mut self, value: Value) -> usize {
        Self::push(&mut self.textures, value)
    }

    pub fn image(&mut self, value: Value) -> usize {
        Self::push(&mut self.images, value)
    }

    pub fn json(&self) -> Value {
        let mut root = json!({
            "asset": {"version": "2.0", "generator": "vrm-core tests"},
            "buffers": [{"byteLength": self.bin.len()}],
            "bufferViews": self.buffer_views,
            "accessors": self.accessors,
            "meshes": self.meshes,
            "nodes": self.nodes,
            "skins": self.skins,
            "materials": self.materials,
            "textures": self.textures,
            "images": self.images,
        });
        if let Some(ext) = &self.extensions {
            root["extensions"] = ext.clone();
        }
        root
    }

    pub fn build(&self) -> Vec<u8> {
        let json = serde_json::to_vec(&self.json()).unwrap();
        write_glb(&json, Some(self.bin.as_slice()))
    }
}

fn components(ty: &str) -> usize {
    match ty {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        "MAT4" => 16,
        other => panic!("unknown accessor type {}", other),
    }
}

pub const QUAD_POSITIONS: [f32; 12] = [
    0.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, //
    1.0, 1.0, 0.0, //
    0.0, 1.0, 0.0,
];
pub const QUAD_NORMALS: [f32; 12] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
pub const QUAD_UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Accessor indices of a quad added by [`quad_attributes`].
pub struct Quad {
    pub position: usize,
    pub normal: usize,
    pub uv: usize,
    pub indices: usize,
}

pub fn quad_attributes(builder: &mut GlbBuilder) -> Quad {
    Quad {
        position: builder.f32_accessor(&QUAD_POSITIONS, "VEC3"),
        normal: builder.f32_accessor(&QUAD_NORMALS, "VEC3"),
        uv: builder.f32_accessor(&QUAD_UVS, "VEC2"),
        indices: builder.u16_accessor(&QUAD_INDICES, "SCALAR"),
    }
}

/// One quad, no material, no skin.
pub fn quad_glb() -> Vec<u8> {
    let mut builder = GlbBuilder::new();
    let quad = quad_attributes(&mut builder);
    builder.mesh(json!({
        "name": "Quad",
        "primitives": [{
            "attributes": {"POSITION": quad.position, "NORMAL": quad.normal, "TEXCOORD_0": quad.uv},
            "indices": quad.indices,
        }]
    }));
    builder.build()
}

/// Column-major translation matrix.
pub fn translation_cols(x: f32, y: f32, z: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        x, y, z, 1.0,
    ]
}

/// Root at the origin, each further joint one unit up the Y axis from its
/// parent. Inverse binds are identity.
pub fn joint_chain(builder: &mut GlbBuilder, len: usize) -> usize {
    let first = builder.nodes.len();
    for i in 0..len {
        let translation = if i == 0 { [0.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
        let mut node = json!({
            "name": format!("bone{}", i),
            "translation": translation,
        });
        if i + 1 < len {
            node["children"] = json!([first + i + 1]);
        }
        builder.node(node);
    }
    let identity = translation_cols(0.0, 0.0, 0.0);
    let ibm = builder.mat4_accessor(&vec![identity; len]);
    let joints: Vec<usize> = (first..first + len).collect();
    builder.skin(json!({"joints": joints, "inverseBindMatrices": ibm}))
}
