//! Small linear-algebra toolkit for skeleton and skinning math.
//!
//! Vectors are plain arrays so decoded attributes can be handed to an upload
//! layer without conversion. [`Mat4`] is stored row-major and multiplies
//! column vectors (`M * v`), so products read in the same order as the
//! transform chain: `global(child) = global(parent) * local(child)`.

use std::ops::Mul;

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];
pub type UVec4 = [u32; 4];

/// Unit quaternion in glTF component order `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Builds a quaternion from a glTF `rotation` array `[x, y, z, w]`.
    pub const fn from_array(q: [f32; 4]) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }

    /// Rotation part as a 4x4 matrix.
    ///
    /// Uses the standard expansion
    /// `[1-2y²-2z², 2xy-2zw, 2xz+2yw; 2xy+2zw, 1-2x²-2z², 2yz-2xw; 2xz-2yw, 2yz+2xw, 1-2x²-2y²]`.
    pub fn to_mat4(self) -> Mat4 {
        let Quat { x, y, z, w } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Mat4::from_rows([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy), 0.0],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx), 0.0],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 4x4 affine transform, row-major storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    rows: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Builds a matrix from 16 floats in column-major order, the layout glTF
    /// uses for `node.matrix` and inverse bind matrices.
    pub fn from_cols_array(m: &[f32; 16]) -> Self {
        Self::from_rows([
            [m[0], m[4], m[8], m[12]],
            [m[1], m[5], m[9], m[13]],
            [m[2], m[6], m[10], m[14]],
            [m[3], m[7], m[11], m[15]],
        ])
    }

    /// Column-major flattening (`out[col * 4 + row]`).
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (col, chunk) in out.chunks_exact_mut(4).enumerate() {
            for (row, value) in chunk.iter_mut().enumerate() {
                *value = self.rows[row][col];
            }
        }
        out
    }

    /// Row-major flattening (`out[row * 4 + col]`).
    pub fn to_rows_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (row, chunk) in out.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&self.rows[row]);
        }
        out
    }

    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][3] = t[0];
        m.rows[1][3] = t[1];
        m.rows[2][3] = t[2];
        m
    }

    pub fn from_scale(s: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][0] = s[0];
        m.rows[1][1] = s[1];
        m.rows[2][2] = s[2];
        m
    }

    pub fn from_rotation(q: Quat) -> Self {
        q.to_mat4()
    }

    /// Composes `T * R * S`.
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::from_translation(translation) * Self::from_rotation(rotation) * Self::from_scale(scale)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.rows[row][col]
    }

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.rows
    }

    pub fn translation(&self) -> Vec3 {
        [self.rows[0][3], self.rows[1][3], self.rows[2][3]]
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.rows[c][r];
            }
        }
        Self::from_rows(out)
    }

    /// Applies the transform to a point (`w = 1`).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let mut out = [0.0; 3];
        for (r, value) in out.iter_mut().enumerate() {
            let row = &self.rows[r];
            *value = row[0] * p[0] + row[1] * p[1] + row[2] * p[2] + row[3];
        }
        out
    }

    /// Returns true if every element differs from `other` by at most `epsilon`.
    pub fn abs_diff_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.rows[r][0] * rhs.rows[0][c]
                    + self.rows[r][1] * rhs.rows[1][c]
                    + self.rows[r][2] * rhs.rows[2][c]
                    + self.rows[r][3] * rhs.rows[3][c];
            }
        }
        Mat4::from_rows(out)
    }
}

impl Mul for &Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: &Mat4) -> Mat4 {
        *self * *rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_major_roundtrip() {
        let cols: [f32; 16] = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ];
        let m = Mat4::from_cols_array(&cols);
        // Translation sits in the last column.
        assert_eq!(m.translation(), [13.0, 14.0, 15.0]);
        assert_eq!(m.to_cols_array(), cols);
        assert_eq!(m.to_rows_array(), m.transpose().to_cols_array());
    }

    #[test]
    fn test_identity_rotation() {
        assert_eq!(Quat::IDENTITY.to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let m = Quat::new(0.0, 0.0, half, half).to_mat4();
        let p = m.transform_point([1.0, 0.0, 0.0]);
        assert!((p[0] - 0.0).abs() < 1e-6);
        assert!((p[1] - 1.0).abs() < 1e-6);
        assert!((p[2] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_trs_order() {
        // Scale first, then translate: a unit offset scaled by 2 lands at 2 + t.
        let m = Mat4::from_trs([1.0, 0.0, 0.0], Quat::IDENTITY, [2.0, 2.0, 2.0]);
        assert_eq!(m.transform_point([1.0, 0.0, 0.0]), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_translation_composition() {
        let a = Mat4::from_translation([0.0, 1.0, 0.0]);
        let b = Mat4::from_translation([0.0, 1.0, 0.0]);
        assert_eq!(a * b, Mat4::from_translation([0.0, 2.0, 0.0]));
    }
}
