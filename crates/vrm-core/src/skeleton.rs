//! Joint hierarchy of one glTF skin.
//!
//! Joints live in a flat arena indexed like `skin.joints`; each joint records
//! the arena index of its parent joint, if any. A joint whose parent node is
//! not itself a joint of the skin is a root.

use std::collections::HashMap;

use crate::accessor::read_accessor;
use crate::document::{Document, Node};
use crate::error::ValidationError;
use crate::math::{Mat4, Quat};
use crate::skinning::resolve_global_transforms;

/// One joint of a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Index of the scene node this joint animates.
    pub node_index: usize,
    pub name: String,
    /// Arena index of the parent joint.
    pub parent: Option<usize>,
    pub local_transform: Mat4,
    /// `global(parent) * local`, or `local` for roots.
    pub global_transform: Mat4,
    pub inverse_bind: Mat4,
}

impl Joint {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Joints of one skin with resolved global transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    skin_index: usize,
    joints: Vec<Joint>,
}

impl Skeleton {
    pub fn skin_index(&self) -> usize {
        self.skin_index
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    pub fn find_by_node(&self, node_index: usize) -> Option<usize> {
        self.joints.iter().position(|j| j.node_index == node_index)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_root())
            .map(|(i, _)| i)
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Replace a joint's local transform and recompute every global.
    pub fn set_local_transform(&mut self, index: usize, local: Mat4) -> Result<(), ValidationError> {
        let len = self.joints.len();
        let joint = self
            .joints
            .get_mut(index)
            .ok_or(ValidationError::JointOutOfRange { joint: index, len })?;
        joint.local_transform = local;
        self.recompute_globals()
    }

    /// Re-resolve global transforms from the current local transforms.
    pub fn recompute_globals(&mut self) -> Result<(), ValidationError> {
        let globals = resolve_global_transforms(self.skin_index, &self.joints)?;
        for (joint, global) in self.joints.iter_mut().zip(globals) {
            joint.global_transform = global;
        }
        Ok(())
    }
}

/// Local transform of a node: its `matrix` when present, else `T * R * S`
/// with glTF defaults for absent components.
pub fn node_local_transform(node: &Node) -> Mat4 {
    if let Some(matrix) = &node.matrix {
        return Mat4::from_cols_array(matrix);
    }
    let translation = node.translation.unwrap_or([0.0; 3]);
    let rotation = node.rotation.map_or(Quat::IDENTITY, Quat::from_array);
    let scale = node.scale.unwrap_or([1.0; 3]);
    Mat4::from_trs(translation, rotation, scale)
}

/// Maps every node to the node listing it in `children`.
pub fn parent_map(doc: &Document) -> Result<HashMap<usize, usize>, ValidationError> {
    let mut parents = HashMap::new();
    for (parent, node) in doc.nodes.iter().enumerate() {
        for &child in &node.children {
            doc.node(child)?;
            if let Some(first) = parents.insert(child, parent) {
                return Err(ValidationError::NodeHasMultipleParents {
                    node: child,
                    first,
                    second: parent,
                });
            }
        }
    }
    Ok(parents)
}

/// Build the skeleton of skin `skin_index`.
pub fn build_skeleton(doc: &Document, bin: Option<&[u8]>, skin_index: usize) -> Result<Skeleton, ValidationError> {
    let skin = doc.skin(skin_index)?;
    if skin.joints.is_empty() {
        return Err(ValidationError::EmptySkin(skin_index));
    }

    let inverse_binds = match skin.inverse_bind_matrices {
        Some(accessor) => {
            let matrices = read_accessor(doc, bin, accessor)?.to_mat4()?;
            if matrices.len() != skin.joints.len() {
                return Err(ValidationError::InverseBindCount {
                    skin: skin_index,
                    expected: skin.joints.len(),
                    found: matrices.len(),
                });
            }
            matrices
        }
        None => vec![Mat4::IDENTITY; skin.joints.len()],
    };

    let parents = parent_map(doc)?;

    // First occurrence wins if a node is listed twice.
    let mut joint_of_node = HashMap::with_capacity(skin.joints.len());
    for (joint, &node) in skin.joints.iter().enumerate() {
        joint_of_node.entry(node).or_insert(joint);
    }

    let mut joints = Vec::with_capacity(skin.joints.len());
    for (&node_index, inverse_bind) in skin.joints.iter().zip(inverse_binds) {
        let node = doc.node(node_index)?;
        let local = node_local_transform(node);
        joints.push(Joint {
            node_index,
            name: node
                .name
                .clone()
                .unwrap_or_else(|| format!("Joint_{}", node_index)),
            parent: parents
                .get(&node_index)
                .and_then(|parent_node| joint_of_node.get(parent_node).copied()),
            local_transform: local,
            global_transform: local,
            inverse_bind,
        });
    }

    let mut skeleton = Skeleton { skin_index, joints };
    skeleton.recompute_globals()?;

    tracing::debug!(
        "built skeleton for skin {}: {} joints, {} roots",
        skin_index,
        skeleton.len(),
        skeleton.roots().count()
    );
    Ok(skeleton)
}
