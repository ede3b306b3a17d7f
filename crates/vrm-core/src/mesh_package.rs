//! Assembly of renderer-ready primitive packages.
//!
//! A package gathers everything one draw of a glTF primitive needs:
//! positions, normals, UVs, skin weights, indices, morph-target deltas and
//! the base-colour texture bytes. All arrays are freshly allocated copies,
//! so a package outlives the container it was decoded from.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::accessor::{buffer_view_slice, read_accessor};
use crate::document::{Document, Mesh, Primitive};
use crate::error::{LoadError, Result, ValidationError};
use crate::math::{UVec4, Vec2, Vec3, Vec4};
use crate::uri::{decode_data_uri, is_data_uri, percent_decode};

/// Base colour used when a primitive has no material.
pub const DEFAULT_BASE_COLOR: Vec4 = [1.0, 1.0, 1.0, 1.0];

/// Normal synthesized for every vertex of a primitive without `NORMAL`.
pub const UP_NORMAL: Vec3 = [0.0, 1.0, 0.0];

const MODE_TRIANGLES: u32 = 4;

/// Decoded geometry, skinning and material data for one primitive.
///
/// Every per-vertex array has `positions.len()` rows. `joint_indices` and
/// `joint_weights` are both empty when the primitive is not skinned.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitivePackage {
    pub mesh_index: usize,
    pub primitive_index: usize,
    pub mesh_name: Option<String>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub joint_indices: Vec<UVec4>,
    pub joint_weights: Vec<Vec4>,
    pub indices: Vec<u32>,
    /// Morph target name -> per-vertex position deltas.
    pub morph_targets: HashMap<String, Vec<Vec3>>,
    /// Encoded image bytes (PNG, JPEG, ...) of the base-colour texture.
    pub texture_bytes: Option<Vec<u8>>,
    pub base_color_factor: Vec4,
}

impl PrimitivePackage {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_skinned(&self) -> bool {
        !self.joint_indices.is_empty()
    }

    pub fn morph_target(&self, name: &str) -> Option<&[Vec3]> {
        self.morph_targets.get(name).map(Vec::as_slice)
    }
}

/// Packages primitives from one parsed document.
///
/// ```ignore
/// let packager = MeshPackager::new(doc, bin).with_base_dir(dir);
/// let body = packager.package_mesh(0)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MeshPackager<'a> {
    doc: &'a Document,
    bin: Option<&'a [u8]>,
    base_dir: Option<&'a Path>,
    load_external_images: bool,
}

impl<'a> MeshPackager<'a> {
    pub fn new(doc: &'a Document, bin: Option<&'a [u8]>) -> Self {
        Self {
            doc,
            bin,
            base_dir: None,
            load_external_images: true,
        }
    }

    /// Directory that relative image URIs are resolved against.
    pub fn with_base_dir(mut self, base_dir: &'a Path) -> Self {
        self.base_dir = Some(base_dir);
        self
    }

    /// Whether images referenced by relative URI are read from disk.
    pub fn load_external_images(mut self, enabled: bool) -> Self {
        self.load_external_images = enabled;
        self
    }

    /// Package every primitive of every mesh, in document order.
    pub fn package_all(&self) -> Result<Vec<PrimitivePackage>> {
        let mut result = Vec::new();
        for mesh_index in 0..self.doc.meshes.len() {
            result.extend(self.package_mesh(mesh_index)?);
        }
        Ok(result)
    }

    pub fn package_mesh(&self, mesh_index: usize) -> Result<Vec<PrimitivePackage>> {
        let mesh = self.doc.mesh(mesh_index)?;
        (0..mesh.primitives.len())
            .map(|primitive_index| self.package_primitive(mesh_index, primitive_index))
            .collect()
    }

    /// First primitive carrying morph targets, optionally limited to the mesh
    /// called `mesh_name` (the face mesh of an avatar).
    pub fn find_morph_primitive(&self, mesh_name: Option<&str>) -> Result<PrimitivePackage> {
        for (mesh_index, mesh) in self.doc.meshes.iter().enumerate() {
            if mesh_name.is_some() && mesh.name.as_deref() != mesh_name {
                continue;
            }
            if let Some(primitive_index) = mesh.primitives.iter().position(|p| !p.targets.is_empty()) {
                return self.package_primitive(mesh_index, primitive_index);
            }
        }
        Err(ValidationError::NoMorphPrimitive {
            mesh_name: mesh_name.map(str::to_owned),
        }
        .into())
    }

    pub fn package_primitive(&self, mesh_index: usize, primitive_index: usize) -> Result<PrimitivePackage> {
        let mesh = self.doc.mesh(mesh_index)?;
        let primitive = mesh.primitives.get(primitive_index).ok_or(ValidationError::MissingReference {
            kind: "primitive",
            index: primitive_index,
        })?;
        let ctx = PrimitiveContext {
            mesh: mesh_index,
            primitive: primitive_index,
        };

        let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
        if mode != MODE_TRIANGLES {
            return Err(ValidationError::UnsupportedPrimitiveMode {
                mesh: mesh_index,
                primitive: primitive_index,
                mode,
            }
            .into());
        }

        let position_idx = ctx.required(primitive, "POSITION")?;
        let positions = read_accessor(self.doc, self.bin, position_idx)?.to_vec3()?;
        let vertex_count = positions.len();

        let normals = match primitive.attributes.get("NORMAL") {
            Some(&idx) => ctx.check_rows("NORMAL", vertex_count, read_accessor(self.doc, self.bin, idx)?.to_vec3()?)?,
            None => {
                tracing::debug!("mesh {} primitive {} has no normals, using up vector", mesh_index, primitive_index);
                vec![UP_NORMAL; vertex_count]
            }
        };

        let uv_idx = ctx.required(primitive, "TEXCOORD_0")?;
        let uvs = ctx.check_rows("TEXCOORD_0", vertex_count, read_accessor(self.doc, self.bin, uv_idx)?.to_vec2()?)?;

        let (joint_indices, joint_weights) = self.read_skin_attributes(&ctx, primitive, vertex_count)?;
        let indices = self.read_indices(&ctx, primitive, vertex_count)?;
        let morph_targets = self.read_morph_targets(&ctx, mesh, primitive, vertex_count)?;
        let (texture_bytes, base_color_factor) = self.base_color_texture(primitive)?;

        tracing::debug!(
            "packaged mesh {} primitive {}: {} vertices, {} indices, {} morph targets, texture {}",
            mesh_index,
            primitive_index,
            vertex_count,
            indices.len(),
            morph_targets.len(),
            texture_bytes.as_ref().map_or(0, Vec::len)
        );

        Ok(PrimitivePackage {
            mesh_index,
            primitive_index,
            mesh_name: mesh.name.clone(),
            positions,
            normals,
            uvs,
            joint_indices,
            joint_weights,
            indices,
            morph_targets,
            texture_bytes,
            base_color_factor,
        })
    }

    fn read_skin_attributes(
        &self,
        ctx: &PrimitiveContext,
        primitive: &Primitive,
        vertex_count: usize,
    ) -> Result<(Vec<UVec4>, Vec<Vec4>)> {
        let joints = primitive.attributes.get("JOINTS_0");
        let weights = primitive.attributes.get("WEIGHTS_0");
        match (joints, weights) {
            (Some(&j), Some(&w)) => {
                let joint_indices = read_accessor(self.doc, self.bin, j)?.to_uvec4()?;
                let joint_weights = read_accessor(self.doc, self.bin, w)?.to_vec4()?;
                Ok((
                    ctx.check_rows("JOINTS_0", vertex_count, joint_indices)?,
                    ctx.check_rows("WEIGHTS_0", vertex_count, joint_weights)?,
                ))
            }
            (None, None) => Ok((Vec::new(), Vec::new())),
            (Some(_), None) => Err(ctx.unpaired("JOINTS_0", "WEIGHTS_0").into()),
            (None, Some(_)) => Err(ctx.unpaired("WEIGHTS_0", "JOINTS_0").into()),
        }
    }

    fn read_indices(&self, ctx: &PrimitiveContext, primitive: &Primitive, vertex_count: usize) -> Result<Vec<u32>> {
        let indices = match primitive.indices {
            Some(idx) => read_accessor(self.doc, self.bin, idx)?.to_u32_scalars()?,
            // Non-indexed: every vertex is used once, in order.
            None => (0..vertex_count as u32).collect(),
        };

        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ValidationError::IndexOutOfRange {
                mesh: ctx.mesh,
                primitive: ctx.primitive,
                index,
                vertex_count,
            }
            .into());
        }
        Ok(indices)
    }

    fn read_morph_targets(
        &self,
        ctx: &PrimitiveContext,
        mesh: &Mesh,
        primitive: &Primitive,
        vertex_count: usize,
    ) -> Result<HashMap<String, Vec<Vec3>>> {
        let names = target_names(mesh, primitive);
        let mut targets = HashMap::with_capacity(primitive.targets.len());

        for (i, target) in primitive.targets.iter().enumerate() {
            let name = names.get(i).cloned().unwrap_or_else(|| format!("morph_{}", i));
            let Some(&delta_idx) = target.get("POSITION") else {
                tracing::warn!(
                    "mesh {} primitive {} morph target {:?} has no POSITION deltas, skipping",
                    ctx.mesh,
                    ctx.primitive,
                    name
                );
                continue;
            };

            let deltas = read_accessor(self.doc, self.bin, delta_idx)?.to_vec3()?;
            if deltas.len() != vertex_count {
                return Err(ValidationError::MorphTargetCountMismatch {
                    mesh: ctx.mesh,
                    primitive: ctx.primitive,
                    target: name,
                    expected: vertex_count,
                    found: deltas.len(),
                }
                .into());
            }
            if targets.contains_key(&name) {
                return Err(ValidationError::DuplicateMorphTarget {
                    mesh: ctx.mesh,
                    primitive: ctx.primitive,
                    name,
                }
                .into());
            }
            targets.insert(name, deltas);
        }

        Ok(targets)
    }

    /// Follows `material -> pbrMetallicRoughness -> baseColorTexture ->
    /// texture -> image`. A missing link yields no texture; a dangling index
    /// is an error.
    fn base_color_texture(&self, primitive: &Primitive) -> Result<(Option<Vec<u8>>, Vec4)> {
        let Some(material_idx) = primitive.material else {
            return Ok((None, DEFAULT_BASE_COLOR));
        };
        let Some(pbr) = &self.doc.material(material_idx)?.pbr_metallic_roughness else {
            return Ok((None, DEFAULT_BASE_COLOR));
        };
        let factor = pbr.base_color_factor.unwrap_or(DEFAULT_BASE_COLOR);
        let Some(tex_info) = &pbr.base_color_texture else {
            return Ok((None, factor));
        };

        let texture = self.doc.texture(tex_info.index)?;
        let image_idx = texture
            .source
            .ok_or(ValidationError::TextureWithoutSource(tex_info.index))?;
        let image = self.doc.image(image_idx)?;

        let bytes = match (image.buffer_view, image.uri.as_deref()) {
            (Some(view), _) => Some(buffer_view_slice(self.doc, self.bin, view)?.to_vec()),
            (None, Some(uri)) if is_data_uri(uri) => Some(decode_data_uri(uri)?),
            (None, Some(uri)) => self.read_external_image(image_idx, uri)?,
            (None, None) => return Err(ValidationError::ImageWithoutData(image_idx).into()),
        };
        Ok((bytes, factor))
    }

    fn read_external_image(&self, image: usize, uri: &str) -> Result<Option<Vec<u8>>> {
        if !self.load_external_images {
            tracing::debug!("external image {:?} not loaded (disabled)", uri);
            return Ok(None);
        }
        let relative = relative_image_path(image, uri)?;
        let path = match self.base_dir {
            Some(base) => base.join(relative),
            None => relative,
        };
        std::fs::read(&path)
            .map(Some)
            .map_err(|source| LoadError::ExternalImage { path, source })
    }
}

/// Percent-decodes an image URI into a path that stays below the asset
/// directory.
fn relative_image_path(image: usize, uri: &str) -> std::result::Result<PathBuf, ValidationError> {
    let invalid = |reason| ValidationError::InvalidImageUri {
        image,
        uri: uri.to_string(),
        reason,
    };
    let decoded = String::from_utf8(percent_decode(uri)).map_err(|_| invalid("is not UTF-8 once decoded"))?;
    let path = PathBuf::from(decoded);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("leaves the asset directory")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("is an absolute path")),
        }
    }
    if path.as_os_str().is_empty() {
        return Err(invalid("is empty"));
    }
    Ok(path)
}

/// Package one primitive; relative image URIs resolve against `base_dir`.
pub fn package_primitive(
    doc: &Document,
    bin: Option<&[u8]>,
    mesh_index: usize,
    primitive_index: usize,
    base_dir: Option<&Path>,
) -> Result<PrimitivePackage> {
    let packager = MeshPackager::new(doc, bin);
    match base_dir {
        Some(dir) => packager.with_base_dir(dir),
        None => packager,
    }
    .package_primitive(mesh_index, primitive_index)
}

struct PrimitiveContext {
    mesh: usize,
    primitive: usize,
}

impl PrimitiveContext {
    fn required(&self, primitive: &Primitive, attribute: &'static str) -> std::result::Result<usize, ValidationError> {
        primitive
            .attributes
            .get(attribute)
            .copied()
            .ok_or(ValidationError::MissingAttribute {
                mesh: self.mesh,
                primitive: self.primitive,
                attribute,
            })
    }

    fn check_rows<T>(&self, attribute: &str, expected: usize, rows: Vec<T>) -> std::result::Result<Vec<T>, ValidationError> {
        if rows.len() != expected {
            return Err(ValidationError::AttributeCountMismatch {
                mesh: self.mesh,
                primitive: self.primitive,
                attribute: attribute.to_string(),
                expected,
                found: rows.len(),
            });
        }
        Ok(rows)
    }

    fn unpaired(&self, present: &'static str, missing: &'static str) -> ValidationError {
        ValidationError::UnpairedSkinAttributes {
            mesh: self.mesh,
            primitive: self.primitive,
            present,
            missing,
        }
    }
}

/// Morph target names: primitive `extras.targetNames`, then mesh
/// `extras.targetNames`, then a bare primitive-level `targetNames`.
fn target_names(mesh: &Mesh, primitive: &Primitive) -> Vec<String> {
    names_from_extras(primitive.extras.as_ref())
        .or_else(|| names_from_extras(mesh.extras.as_ref()))
        .or_else(|| primitive.target_names.clone())
        .unwrap_or_default()
}

fn names_from_extras(extras: Option<&Value>) -> Option<Vec<String>> {
    extras?
        .get("targetNames")?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}
