//! File loading for VRM avatars.
//!
//! [`AvatarReader`] drives the [`vrm_core`] stages over a whole file and
//! returns an [`Avatar`]: every primitive package, the skeleton of the
//! selected skin, its bind-pose skinning matrices and the VRM metadata.
//!
//! | Option | Default |
//! |--------|---------|
//! | [`LoadOptions::skin`] | the only skin; error if several |
//! | [`LoadOptions::matrix_layout`] | column-major |
//! | [`LoadOptions::load_external_images`] | `true` |
//!
//! Readers also implement the [`Reader`] and [`SkeletonReader`] traits, so
//! generic code can stay independent of the concrete reader.

pub mod avatar_reader;
pub mod error;
pub mod options;
pub mod traits;

pub use avatar_reader::{Avatar, AvatarReader};
pub use error::{ReadError, Result};
pub use options::LoadOptions;
pub use traits::{Reader, SkeletonReader};

pub use vrm_core::MatrixLayout;
