//! Core decoding for VRM avatars.
//!
//! A VRM file is a GLB container with a glTF 2.0 document and a single binary
//! buffer. This crate turns that container into engine-agnostic data:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Container parsing | [`container`] | [`Document`] + borrowed BIN chunk |
//! | Accessor decoding | [`accessor`] | typed element arrays |
//! | Mesh packaging | [`mesh_package`] | [`PrimitivePackage`] per primitive |
//! | Skeleton building | [`skeleton`] | [`Skeleton`] joint arena |
//! | Skinning | [`skinning`] | [`SkinningMatrices`] per joint |
//! | Metadata | [`vrm_meta`] | [`VrmMeta`] (version, expressions) |
//!
//! ```ignore
//! use vrm_core::{build_skeleton, compute_skinning_matrices, GlbContainer, MeshPackager};
//!
//! let bytes = std::fs::read("avatar.vrm")?;
//! let container = GlbContainer::parse(&bytes)?;
//! let (doc, bin) = container.into_parts();
//!
//! let packages = MeshPackager::new(&doc, bin).package_all()?;
//! let skeleton = build_skeleton(&doc, bin, 0)?;
//! let matrices = compute_skinning_matrices(&skeleton)?;
//! ```

pub mod accessor;
pub mod container;
pub mod document;
pub mod error;
pub mod math;
pub mod mesh_package;
pub mod skeleton;
pub mod skinning;
pub mod uri;
pub mod vrm_meta;

pub use accessor::{read_accessor, Component, ComponentType, DecodedAccessor, Element, ElementShape};
pub use container::{write_glb, Chunk, ChunkKind, GlbContainer};
pub use document::Document;
pub use error::{FormatError, LoadError, Result, ValidationError};
pub use math::{Mat4, Quat, UVec4, Vec2, Vec3, Vec4};
pub use mesh_package::{package_primitive, MeshPackager, PrimitivePackage};
pub use skeleton::{build_skeleton, Joint, Skeleton};
pub use skinning::{compute_skinning_matrices, MatrixLayout, SkinningMatrices};
pub use vrm_meta::{VrmMeta, VrmVersion};
