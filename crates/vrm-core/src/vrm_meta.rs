//! VRM extension metadata.
//!
//! Reads the avatar-level parts of the `VRM` (0.x) and `VRMC_vrm` (1.x)
//! extensions: authoring info and the facial expression tables that bind
//! expression names to morph targets. Values are exposed as stored; VRM 0.x
//! bind weights are on a 0..100 scale, VRM 1.x weights on 0..1.

use serde::Deserialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::FormatError;

pub const VRM0_EXTENSION: &str = "VRM";
pub const VRM1_EXTENSION: &str = "VRMC_vrm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrmVersion {
    /// Plain glTF without a VRM extension.
    None,
    V0,
    V1,
}

impl VrmVersion {
    pub fn detect(doc: &Document) -> Self {
        if doc.extensions.contains_key(VRM1_EXTENSION) {
            VrmVersion::V1
        } else if doc.extensions.contains_key(VRM0_EXTENSION) {
            VrmVersion::V0
        } else {
            VrmVersion::None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VrmVersion::None => "glTF",
            VrmVersion::V0 => "VRM 0.x",
            VrmVersion::V1 => "VRM 1.x",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetInfo {
    pub generator: Option<String>,
    pub gltf_version: Option<String>,
    pub extensions_used: Vec<String>,
}

/// A morph target driven by an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphBind {
    /// Mesh index (VRM 0.x) or node index (VRM 1.x), see [`BindTarget`].
    pub target: BindTarget,
    /// Morph target index within the primitive's `targets`.
    pub index: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    Mesh(usize),
    Node(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub name: String,
    /// VRM 0.x `presetName`, or the key of a VRM 1.x preset expression.
    pub preset: Option<String>,
    pub is_binary: bool,
    pub binds: Vec<MorphBind>,
}

/// Avatar-level VRM metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VrmMeta {
    pub version: VrmVersion,
    pub asset: AssetInfo,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub expressions: Vec<Expression>,
}

impl VrmMeta {
    pub fn from_document(doc: &Document) -> Result<Self, FormatError> {
        let version = VrmVersion::detect(doc);
        let asset = AssetInfo {
            generator: doc.asset.generator.clone(),
            gltf_version: doc.asset.version.clone(),
            extensions_used: doc.extensions_used.clone(),
        };

        let (title, authors, expressions) = if let Some(ext) = doc.extensions.get(VRM1_EXTENSION) {
            vrm1(ext)?
        } else if let Some(ext) = doc.extensions.get(VRM0_EXTENSION) {
            vrm0(ext)?
        } else {
            (None, Vec::new(), Vec::new())
        };

        tracing::debug!(
            "{} asset from {:?}: {} expressions",
            version.name(),
            asset.generator.as_deref().unwrap_or("unknown generator"),
            expressions.len()
        );

        Ok(Self {
            version,
            asset,
            title,
            authors,
            expressions,
        })
    }

    pub fn expression(&self, name: &str) -> Option<&Expression> {
        self.expressions.iter().find(|e| e.name == name)
    }
}

type Parsed = (Option<String>, Vec<String>, Vec<Expression>);

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Vrm0 {
    #[serde(default)]
    meta: Vrm0Meta,
    #[serde(default)]
    blend_shape_master: Vrm0BlendShapeMaster,
}

#[derive(Deserialize, Default)]
struct Vrm0Meta {
    title: Option<String>,
    author: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Vrm0BlendShapeMaster {
    #[serde(default)]
    blend_shape_groups: Vec<Vrm0BlendShapeGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vrm0BlendShapeGroup {
    #[serde(default)]
    name: String,
    preset_name: Option<String>,
    #[serde(default)]
    is_binary: bool,
    #[serde(default)]
    binds: Vec<Vrm0Bind>,
}

#[derive(Deserialize)]
struct Vrm0Bind {
    mesh: usize,
    index: usize,
    #[serde(default)]
    weight: f32,
}

fn vrm0(ext: &Value) -> Result<Parsed, FormatError> {
    let vrm: Vrm0 = Vrm0::deserialize(ext)?;
    let expressions = vrm
        .blend_shape_master
        .blend_shape_groups
        .into_iter()
        .map(|group| Expression {
            name: group.name,
            preset: group.preset_name.filter(|p| p != "unknown"),
            is_binary: group.is_binary,
            binds: group
                .binds
                .into_iter()
                .map(|b| MorphBind {
                    target: BindTarget::Mesh(b.mesh),
                    index: b.index,
                    weight: b.weight,
                })
                .collect(),
        })
        .collect();
    Ok((vrm.meta.title, vrm.meta.author.into_iter().collect(), expressions))
}

#[derive(Deserialize, Default)]
struct Vrm1 {
    #[serde(default)]
    meta: Vrm1Meta,
    #[serde(default)]
    expressions: Vrm1Expressions,
}

#[derive(Deserialize, Default)]
struct Vrm1Meta {
    name: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
}

#[derive(Deserialize, Default)]
struct Vrm1Expressions {
    #[serde(default)]
    preset: serde_json::Map<String, Value>,
    #[serde(default)]
    custom: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vrm1Expression {
    #[serde(default)]
    morph_target_binds: Vec<Vrm1Bind>,
    #[serde(default)]
    is_binary: bool,
}

#[derive(Deserialize)]
struct Vrm1Bind {
    node: usize,
    index: usize,
    #[serde(default)]
    weight: f32,
}

fn vrm1(ext: &Value) -> Result<Parsed, FormatError> {
    let vrm: Vrm1 = Vrm1::deserialize(ext)?;
    let mut expressions = Vec::new();

    let tables = [(true, vrm.expressions.preset), (false, vrm.expressions.custom)];
    for (is_preset, table) in tables {
        for (name, value) in table {
            let expr = Vrm1Expression::deserialize(&value)?;
            expressions.push(Expression {
                preset: is_preset.then(|| name.clone()),
                name,
                is_binary: expr.is_binary,
                binds: expr
                    .morph_target_binds
                    .into_iter()
                    .map(|b| MorphBind {
                        target: BindTarget::Node(b.node),
                        index: b.index,
                        weight: b.weight,
                    })
                    .collect(),
            });
        }
    }

    Ok((vrm.meta.name, vrm.meta.authors, expressions))
}
