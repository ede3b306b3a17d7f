//! Skinning matrices for GPU upload.
//!
//! `skinning[j] = global[j] * inverse_bind[j]`, where `global` is resolved by
//! memoized recursion so parents are always computed before their children,
//! whatever order the skin declares its joints in.

use crate::error::ValidationError;
use crate::math::Mat4;
use crate::skeleton::{Joint, Skeleton};

/// Element order of flattened matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixLayout {
    /// `m[col * 4 + row]`: glTF, OpenGL and WGSL `mat4x4<f32>`.
    #[default]
    ColumnMajor,
    /// `m[row * 4 + col]`.
    RowMajor,
}

impl MatrixLayout {
    pub fn flatten(self, m: &Mat4) -> [f32; 16] {
        match self {
            MatrixLayout::ColumnMajor => m.to_cols_array(),
            MatrixLayout::RowMajor => m.to_rows_array(),
        }
    }
}

/// One matrix per joint, indexed like the skin's joint list.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinningMatrices {
    matrices: Vec<Mat4>,
}

impl SkinningMatrices {
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn get(&self, joint: usize) -> Option<&Mat4> {
        self.matrices.get(joint)
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mat4> {
        self.matrices.iter()
    }

    pub fn into_inner(self) -> Vec<Mat4> {
        self.matrices
    }

    /// `16 * len()` floats, one matrix after another.
    pub fn to_flat(&self, layout: MatrixLayout) -> Vec<f32> {
        self.matrices.iter().flat_map(|m| layout.flatten(m)).collect()
    }
}

impl<'a> IntoIterator for &'a SkinningMatrices {
    type Item = &'a Mat4;
    type IntoIter = std::slice::Iter<'a, Mat4>;

    fn into_iter(self) -> Self::IntoIter {
        self.matrices.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum ResolveState {
    Pending,
    Visiting,
    Resolved(Mat4),
}

/// Global transform of every joint from the joints' local transforms.
pub fn resolve_global_transforms(skin: usize, joints: &[Joint]) -> Result<Vec<Mat4>, ValidationError> {
    let mut states = vec![ResolveState::Pending; joints.len()];
    for index in 0..joints.len() {
        resolve(skin, joints, &mut states, index)?;
    }

    Ok(states
        .into_iter()
        .map(|state| match state {
            ResolveState::Resolved(m) => m,
            // Every slot was resolved by the loop above.
            ResolveState::Pending | ResolveState::Visiting => Mat4::IDENTITY,
        })
        .collect())
}

fn resolve(
    skin: usize,
    joints: &[Joint],
    states: &mut [ResolveState],
    index: usize,
) -> Result<Mat4, ValidationError> {
    let joint = joints.get(index).ok_or(ValidationError::JointOutOfRange {
        joint: index,
        len: joints.len(),
    })?;

    match states[index] {
        ResolveState::Resolved(global) => return Ok(global),
        ResolveState::Visiting => {
            return Err(ValidationError::JointCycle {
                skin,
                node: joint.node_index,
            })
        }
        ResolveState::Pending => {}
    }

    states[index] = ResolveState::Visiting;
    let global = match joint.parent {
        Some(parent) => resolve(skin, joints, states, parent)? * joint.local_transform,
        None => joint.local_transform,
    };
    states[index] = ResolveState::Resolved(global);
    Ok(global)
}

/// Compute `global * inverse_bind` for every joint of `skeleton`.
///
/// Globals are re-resolved from the local transforms, so the result reflects
/// any edits made through [`Skeleton::set_local_transform`].
pub fn compute_skinning_matrices(skeleton: &Skeleton) -> Result<SkinningMatrices, ValidationError> {
    let globals = resolve_global_transforms(skeleton.skin_index(), skeleton.joints())?;
    let matrices = globals
        .iter()
        .zip(skeleton.joints())
        .map(|(global, joint)| global * &joint.inverse_bind)
        .collect();
    Ok(SkinningMatrices { matrices })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joint(node_index: usize, parent: Option<usize>, local: Mat4) -> Joint {
        Joint {
            node_index,
            name: format!("j{}", node_index),
            parent,
            local_transform: local,
            global_transform: Mat4::IDENTITY,
            inverse_bind: Mat4::IDENTITY,
        }
    }

    #[test]
    fn test_child_declared_before_parent() {
        let up = Mat4::from_translation([0.0, 1.0, 0.0]);
        // joints[0] is the child of joints[1].
        let joints = vec![joint(1, Some(1), up), joint(0, None, up)];
        let globals = resolve_global_transforms(0, &joints).unwrap();
        assert_eq!(globals[0].translation(), [0.0, 2.0, 0.0]);
        assert_eq!(globals[1].translation(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_cycle_detected() {
        let joints = vec![
            joint(3, Some(1), Mat4::IDENTITY),
            joint(4, Some(0), Mat4::IDENTITY),
        ];
        assert!(matches!(
            resolve_global_transforms(2, &joints),
            Err(ValidationError::JointCycle { skin: 2, .. })
        ));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let joints = vec![joint(0, Some(0), Mat4::IDENTITY)];
        assert!(resolve_global_transforms(0, &joints).is_err());
    }

    #[test]
    fn test_dangling_parent() {
        let joints = vec![joint(0, Some(5), Mat4::IDENTITY)];
        assert!(matches!(
            resolve_global_transforms(0, &joints),
            Err(ValidationError::JointOutOfRange { joint: 5, len: 1 })
        ));
    }

    #[test]
    fn test_flat_layouts() {
        let m = Mat4::from_translation([1.0, 2.0, 3.0]);
        let col = MatrixLayout::ColumnMajor.flatten(&m);
        let row = MatrixLayout::RowMajor.flatten(&m);
        assert_eq!(&col[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!([row[3], row[7], row[11]], [1.0, 2.0, 3.0]);
        assert_eq!(MatrixLayout::default(), MatrixLayout::ColumnMajor);
    }
}
