//! Whole-file avatar loading.
//!
//! ```ignore
//! use vrm_io::{AvatarReader, LoadOptions};
//!
//! let avatar = AvatarReader::open("avatar.vrm")?
//!     .with_options(LoadOptions::new().with_external_images(false))
//!     .read_avatar()?;
//! println!("{} primitives, {} joints", avatar.meshes.len(), avatar.joint_count());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use vrm_core::{
    build_skeleton, compute_skinning_matrices, Document, GlbContainer, MeshPackager, PrimitivePackage, Skeleton,
    SkinningMatrices, ValidationError, VrmMeta,
};

use crate::error::{ReadError, Result};
use crate::options::LoadOptions;
use crate::traits::{Reader, SkeletonReader};

/// Everything decoded from one avatar file.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub meta: VrmMeta,
    /// Every primitive of every mesh, in document order.
    pub meshes: Vec<PrimitivePackage>,
    pub skeleton: Option<Skeleton>,
    /// Bind-pose skinning matrices, indexed like the skeleton's joints.
    pub skinning: Option<SkinningMatrices>,
    options: LoadOptions,
}

impl Avatar {
    pub fn joint_count(&self) -> usize {
        self.skeleton.as_ref().map_or(0, Skeleton::len)
    }

    /// Skinning matrices flattened in the configured layout; empty when the
    /// avatar has no skin.
    pub fn skinning_flat(&self) -> Vec<f32> {
        self.skinning
            .as_ref()
            .map(|m| m.to_flat(self.options.matrix_layout))
            .unwrap_or_default()
    }

    /// First primitive carrying a morph target called `name`.
    pub fn find_morph_target(&self, name: &str) -> Option<&PrimitivePackage> {
        self.meshes.iter().find(|p| p.morph_targets.contains_key(name))
    }
}

/// Reader for `.vrm` / `.glb` avatar files.
pub struct AvatarReader {
    data: Vec<u8>,
    base_dir: Option<PathBuf>,
    options: LoadOptions,
}

impl AvatarReader {
    /// Read a file fully into memory. Relative image URIs resolve against the
    /// file's directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("read {} bytes from {}", data.len(), path.display());
        Ok(Self {
            data,
            base_dir: path.parent().map(Path::to_path_buf),
            options: LoadOptions::default(),
        })
    }

    /// Wrap bytes already in memory. External images resolve against the
    /// working directory unless [`with_base_dir`](Self::with_base_dir) is set.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            base_dir: None,
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_base_dir<P: Into<PathBuf>>(mut self, base_dir: P) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Parse the container without decoding any accessor.
    pub fn container(&self) -> Result<GlbContainer<'_>> {
        Ok(GlbContainer::parse(&self.data)?)
    }

    pub fn read_meta(&self) -> Result<VrmMeta> {
        let container = self.container()?;
        Ok(VrmMeta::from_document(container.document())?)
    }

    /// Decode meshes, skeleton, skinning matrices and metadata.
    pub fn read_avatar(&self) -> Result<Avatar> {
        let (doc, bin) = self.container()?.into_parts();
        let meta = VrmMeta::from_document(&doc)?;
        let meshes = self.packager(&doc, bin).package_all()?;
        let skeleton = self.skeleton(&doc, bin)?;
        let skinning = skeleton.as_ref().map(compute_skinning_matrices).transpose()?;

        tracing::info!(
            "loaded {} avatar: {} primitives, {} joints",
            meta.version.name(),
            meshes.len(),
            skeleton.as_ref().map_or(0, Skeleton::len)
        );

        Ok(Avatar {
            meta,
            meshes,
            skeleton,
            skinning,
            options: self.options.clone(),
        })
    }

    fn packager<'a>(&'a self, doc: &'a Document, bin: Option<&'a [u8]>) -> MeshPackager<'a> {
        let packager = MeshPackager::new(doc, bin).load_external_images(self.options.load_external_images);
        match &self.base_dir {
            Some(dir) => packager.with_base_dir(dir),
            None => packager,
        }
    }

    fn skeleton(&self, doc: &Document, bin: Option<&[u8]>) -> Result<Option<Skeleton>> {
        let skin = match (self.options.skin, doc.skins.len()) {
            (Some(skin), _) => skin,
            (None, 0) => return Ok(None),
            (None, 1) => 0,
            (None, n) => return Err(ValidationError::MultipleSkins(n).into()),
        };
        Ok(Some(build_skeleton(doc, bin, skin)?))
    }
}

impl Reader for AvatarReader {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        AvatarReader::open(path)
    }

    fn read_meshes(&mut self) -> Result<Vec<PrimitivePackage>> {
        let (doc, bin) = self.container()?.into_parts();
        Ok(self.packager(&doc, bin).package_all()?)
    }
}

impl SkeletonReader for AvatarReader {
    fn read_skeleton(&mut self) -> Result<Option<Skeleton>> {
        let (doc, bin) = self.container()?.into_parts();
        self.skeleton(&doc, bin)
    }
}
