use vrm_core::MatrixLayout;

/// Options for [`AvatarReader`](crate::AvatarReader).
///
/// ```ignore
/// let options = LoadOptions::new()
///     .with_skin(1)
///     .with_matrix_layout(MatrixLayout::RowMajor)
///     .with_external_images(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skin to build the skeleton from. `None` picks the only skin, if any.
    pub skin: Option<usize>,
    /// Layout of [`Avatar::skinning_flat`](crate::Avatar::skinning_flat).
    pub matrix_layout: MatrixLayout,
    /// Read images referenced by relative URI from disk.
    pub load_external_images: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skin: None,
            matrix_layout: MatrixLayout::ColumnMajor,
            load_external_images: true,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skin(mut self, skin: usize) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn with_matrix_layout(mut self, layout: MatrixLayout) -> Self {
        self.matrix_layout = layout;
        self
    }

    pub fn with_external_images(mut self, enabled: bool) -> Self {
        self.load_external_images = enabled;
        self
    }
}
