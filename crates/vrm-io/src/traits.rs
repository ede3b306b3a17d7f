//! Common traits for avatar readers.
//!
//! ```ignore
//! use vrm_io::{AvatarReader, Reader, SkeletonReader};
//!
//! fn load<R: SkeletonReader>(path: &str) -> vrm_io::Result<usize> {
//!     let mut reader = R::open(path)?;
//!     let meshes = reader.read_meshes()?;
//!     let joints = reader.read_skeleton()?.map_or(0, |s| s.len());
//!     Ok(meshes.len() + joints)
//! }
//! ```

use std::path::Path;

use vrm_core::{PrimitivePackage, Skeleton, ValidationError};

use crate::error::Result;

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Package every primitive of every mesh in the file.
    fn read_meshes(&mut self) -> Result<Vec<PrimitivePackage>>;

    /// First primitive of the file.
    ///
    /// Default implementation returns the first entry of `read_meshes()`.
    fn read_mesh(&mut self) -> Result<PrimitivePackage> {
        self.read_meshes()?
            .into_iter()
            .next()
            .ok_or_else(|| ValidationError::MissingReference { kind: "mesh", index: 0 }.into())
    }
}

/// Readers that also expose a joint hierarchy.
pub trait SkeletonReader: Reader {
    /// Skeleton of the selected skin, or `None` for unskinned files.
    fn read_skeleton(&mut self) -> Result<Option<Skeleton>>;
}
