//! Homogeneous 2D affine transforms.

use crate::{common::*, Point, Polygon};

/// A 3x3 affine matrix acting on homogeneous `[x, y, 1]` column vectors.
///
/// The last row is always `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    mat: [[f64; 3]; 3],
}

impl Affine {
    pub fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    /// Builds the transform from the first two rows of the matrix.
    pub fn from_rows(rows: [[f64; 3]; 2]) -> Self {
        let [row1, row2] = rows;
        Self {
            mat: [row1, row2, [0.0, 0.0, 1.0]],
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::from_rows([[1.0, 0.0, tx], [0.0, 1.0, ty]])
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::from_rows([[sx, 0.0, 0.0], [0.0, sy, 0.0]])
    }

    /// Counter-clockwise rotation in image coordinates where y points down.
    pub fn rotation(radians: f64) -> Self {
        let cos = radians.cos();
        let sin = radians.sin();
        Self::from_rows([[cos, sin, 0.0], [-sin, cos, 0.0]])
    }

    /// Shear along x and y by the given angles in radians.
    pub fn shear(x_radians: f64, y_radians: f64) -> Self {
        Self::from_rows([[1.0, x_radians.tan(), 0.0], [y_radians.tan(), 1.0, 0.0]])
    }

    /// Mirror over the vertical line `x = width / 2`.
    pub fn horizontal_flip(width: f64) -> Self {
        Self::from_rows([[-1.0, 0.0, width], [0.0, 1.0, 0.0]])
    }

    /// Mirror over the horizontal line `y = height / 2`.
    pub fn vertical_flip(height: f64) -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, -1.0, height]])
    }

    /// Swap the x and y axes.
    pub fn transpose() -> Self {
        Self::from_rows([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]])
    }

    /// Conjugates the transform so that it pivots around `(cx, cy)`.
    pub fn about(&self, cx: f64, cy: f64) -> Self {
        Self::translation(-cx, -cy)
            .then(self)
            .then(&Self::translation(cx, cy))
    }

    /// Returns the transform that applies `self` first and `next` afterwards.
    pub fn then(&self, next: &Affine) -> Self {
        next.matmul(self)
    }

    pub fn matmul(&self, rhs: &Affine) -> Self {
        let mut mat = [[0.0; 3]; 3];
        for (row, out_row) in mat.iter_mut().enumerate() {
            for (col, out) in out_row.iter_mut().enumerate() {
                *out = (0..3).map(|k| self.mat[row][k] * rhs.mat[k][col]).sum();
            }
        }
        Self { mat }
    }

    pub fn determinant(&self) -> f64 {
        let [[a, b, _], [c, d, _], _] = self.mat;
        a * d - b * c
    }

    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        ensure!(
            det.is_normal(),
            "the affine transform is singular (determinant {})",
            det
        );
        let [[a, b, tx], [c, d, ty], _] = self.mat;
        let ia = d / det;
        let ib = -b / det;
        let ic = -c / det;
        let id = a / det;
        Ok(Self::from_rows([
            [ia, ib, -(ia * tx + ib * ty)],
            [ic, id, -(ic * tx + id * ty)],
        ]))
    }

    pub fn apply_xy(&self, x: f64, y: f64) -> [f64; 2] {
        let [[a, b, tx], [c, d, ty], _] = self.mat;
        [a * x + b * y + tx, c * x + d * y + ty]
    }

    pub fn apply(&self, point: &Point<f64>) -> Point<f64> {
        self.apply_xy(point.x, point.y).into()
    }

    pub fn apply_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.iter().map(|point| self.apply(point)).collect()
    }
}
