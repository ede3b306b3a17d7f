//! Skeleton building and skinning matrices from GLB skins.

mod common;

use common::{joint_chain, translation_cols, GlbBuilder};
use serde_json::json;
use vrm_core::{build_skeleton, compute_skinning_matrices, GlbContainer, Mat4, MatrixLayout, ValidationError};

fn skeleton_of(glb: &[u8], skin: usize) -> Result<vrm_core::Skeleton, ValidationError> {
    let (doc, bin) = GlbContainer::parse(glb).unwrap().into_parts();
    build_skeleton(&doc, bin, skin)
}

#[test]
fn test_three_joint_chain() {
    let mut builder = GlbBuilder::new();
    joint_chain(&mut builder, 3);
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();

    assert_eq!(skeleton.len(), 3);
    let root = skeleton.joint(0).unwrap();
    assert!(root.is_root());
    assert_eq!(root.global_transform, root.local_transform);

    assert_eq!(skeleton.joint(1).unwrap().parent, Some(0));
    assert_eq!(skeleton.joint(2).unwrap().parent, Some(1));

    let tip = skeleton.joint(2).unwrap();
    assert!(tip
        .global_transform
        .abs_diff_eq(&Mat4::from_translation([0.0, 2.0, 0.0]), 1e-6));

    // Identity inverse binds: skinning equals the global transforms.
    let skinning = compute_skinning_matrices(&skeleton).unwrap();
    assert_eq!(skinning.len(), 3);
    for (matrix, joint) in skinning.iter().zip(skeleton.joints()) {
        assert_eq!(*matrix, joint.global_transform);
    }
}

#[test]
fn test_child_relation_holds_for_every_joint() {
    let mut builder = GlbBuilder::new();
    joint_chain(&mut builder, 5);
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();
    for joint in skeleton.joints() {
        if let Some(parent) = joint.parent {
            let expected = skeleton.joint(parent).unwrap().global_transform * joint.local_transform;
            assert!(joint.global_transform.abs_diff_eq(&expected, 1e-6));
        }
    }
}

#[test]
fn test_two_joints_with_inverse_bind() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({"name": "Hips", "children": [1], "translation": [0.0, 1.0, 0.0]}));
    builder.node(json!({"name": "Spine", "translation": [0.0, 0.5, 0.0]}));
    let ibm = builder.mat4_accessor(&[
        translation_cols(0.0, -1.0, 0.0),
        translation_cols(0.0, -1.5, 0.0),
    ]);
    builder.skin(json!({"joints": [0, 1], "inverseBindMatrices": ibm}));
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();

    // In bind pose, global * inverse bind is exactly identity.
    let skinning = compute_skinning_matrices(&skeleton).unwrap();
    assert_eq!(skinning.get(0), Some(&Mat4::IDENTITY));
    assert_eq!(skinning.get(1), Some(&Mat4::IDENTITY));
    assert_eq!(skinning.to_flat(MatrixLayout::ColumnMajor).len(), 32);
}

#[test]
fn test_joints_declared_child_first() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({"name": "Root", "children": [1], "translation": [1.0, 0.0, 0.0]}));
    builder.node(json!({"name": "Mid", "children": [2], "translation": [1.0, 0.0, 0.0]}));
    builder.node(json!({"name": "Tip", "translation": [1.0, 0.0, 0.0]}));
    builder.skin(json!({"joints": [2, 1, 0]}));
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();

    assert_eq!(skeleton.joint(0).unwrap().name, "Tip");
    assert_eq!(skeleton.joint(0).unwrap().parent, Some(1));
    assert_eq!(skeleton.joint(0).unwrap().global_transform.translation(), [3.0, 0.0, 0.0]);
    assert_eq!(skeleton.roots().collect::<Vec<_>>(), vec![2]);

    let skinning = compute_skinning_matrices(&skeleton).unwrap();
    assert_eq!(skinning.get(0).unwrap().translation(), [3.0, 0.0, 0.0]);
    assert_eq!(skinning.get(2).unwrap().translation(), [1.0, 0.0, 0.0]);
}

#[test]
fn test_rotation_then_translation() {
    let half = std::f32::consts::FRAC_1_SQRT_2;
    let mut builder = GlbBuilder::new();
    // Root rotated 90 degrees about Z; child one unit along X ends up on +Y.
    builder.node(json!({"children": [1], "rotation": [0.0, 0.0, half, half]}));
    builder.node(json!({"translation": [1.0, 0.0, 0.0]}));
    builder.skin(json!({"joints": [0, 1]}));
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();

    let p = skeleton.joint(1).unwrap().global_transform.translation();
    assert!(p[0].abs() < 1e-6);
    assert!((p[1] - 1.0).abs() < 1e-6);
}

#[test]
fn test_node_with_two_parents() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({"children": [2]}));
    builder.node(json!({"children": [2]}));
    builder.node(json!({}));
    builder.skin(json!({"joints": [0, 1, 2]}));
    assert!(matches!(
        skeleton_of(&builder.build(), 0),
        Err(ValidationError::NodeHasMultipleParents { node: 2, .. })
    ));
}

#[test]
fn test_joint_cycle() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({"children": [1]}));
    builder.node(json!({"children": [0]}));
    builder.skin(json!({"joints": [0, 1]}));
    assert!(matches!(
        skeleton_of(&builder.build(), 0),
        Err(ValidationError::JointCycle { skin: 0, .. })
    ));
}

#[test]
fn test_inverse_bind_count_mismatch() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({}));
    builder.node(json!({}));
    let ibm = builder.mat4_accessor(&[translation_cols(0.0, 0.0, 0.0)]);
    builder.skin(json!({"joints": [0, 1], "inverseBindMatrices": ibm}));
    assert!(matches!(
        skeleton_of(&builder.build(), 0),
        Err(ValidationError::InverseBindCount { expected: 2, found: 1, .. })
    ));
}

#[test]
fn test_missing_skin_and_joint_node() {
    let mut builder = GlbBuilder::new();
    builder.node(json!({}));
    builder.skin(json!({"joints": [0, 7]}));
    let glb = builder.build();
    assert!(matches!(
        skeleton_of(&glb, 1),
        Err(ValidationError::MissingReference { kind: "skin", index: 1 })
    ));
    assert!(matches!(
        skeleton_of(&glb, 0),
        Err(ValidationError::MissingReference { kind: "node", index: 7 })
    ));
}

#[test]
fn test_set_local_transform_recomputes_descendants() {
    let mut builder = GlbBuilder::new();
    joint_chain(&mut builder, 3);
    let mut skeleton = skeleton_of(&builder.build(), 0).unwrap();

    skeleton
        .set_local_transform(0, Mat4::from_translation([5.0, 0.0, 0.0]))
        .unwrap();

    assert_eq!(skeleton.joint(0).unwrap().global_transform.translation(), [5.0, 0.0, 0.0]);
    assert_eq!(skeleton.joint(2).unwrap().global_transform.translation(), [5.0, 2.0, 0.0]);
    let skinning = compute_skinning_matrices(&skeleton).unwrap();
    assert_eq!(skinning.get(2).unwrap().translation(), [5.0, 2.0, 0.0]);
}

#[test]
fn test_flat_layouts_are_transposes() {
    let mut builder = GlbBuilder::new();
    joint_chain(&mut builder, 2);
    let skeleton = skeleton_of(&builder.build(), 0).unwrap();
    let skinning = compute_skinning_matrices(&skeleton).unwrap();

    let cols = skinning.to_flat(MatrixLayout::ColumnMajor);
    let rows = skinning.to_flat(MatrixLayout::RowMajor);
    // Joint 1 sits one unit up: translation in the last column.
    assert_eq!(cols[16 + 13], 1.0);
    assert_eq!(rows[16 + 7], 1.0);
}
