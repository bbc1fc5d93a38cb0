use super::mat3::Mat3;
use super::vec3::Vec3;
use super::vec4::Vec4;
use core::ops::Mul;

/// A 4x4 matrix, stored column-major: `cols[c][r]` is row `r` of column `c`.
///
/// Matrix-vector multiplication treats the vector as a column, and concatenation of
/// transforms reads right-to-left: `mvp = projection * view * model`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat4 {
    cols: [Vec4; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Maps clip-space NDC (-1..1, -1..1, -1..1) to texel space (0..1, 1..0, 0..1): a Y-flip
    /// plus a halving and re-centering of each axis.
    pub const VIEWPORT: Self = Self {
        cols: [
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -0.5, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 0.5, 0.0),
            Vec4::new(0.5, 0.5, 0.5, 1.0),
        ],
    };

    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self { cols: [c0, c1, c2, c3] }
    }

    #[inline]
    pub fn col(&self, c: usize) -> Vec4 {
        self.cols[c]
    }

    /// Element at row `r`, column `c`.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.cols[c][r]
    }

    pub fn translation(t: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(t.x, t.y, t.z, 1.0),
        )
    }

    pub fn scale(s: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(s.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, s.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, s.z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// `Rz(rz) * Ry(ry) * Rx(rx)`, matching [`Mat3::rotation`].
    pub fn rotation(rx: f32, ry: f32, rz: f32) -> Self {
        Mat3::rotation(rx, ry, rz).into()
    }

    /// Asymmetric-frustum perspective projection. Maps `-z` forward to clip space with `-w`
    /// in row 4, column 3 (so points further from the camera get a larger `w`).
    pub fn perspective(n: f32, f: f32, l: f32, r: f32, t: f32, b: f32) -> Self {
        Self::from_cols(
            Vec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
            Vec4::new((r + l) / (r - l), (t + b) / (t - b), -(f + n) / (f - n), -1.0),
            Vec4::new(0.0, 0.0, -2.0 * n * f / (f - n), 0.0),
        )
    }

    /// Orthographic box-to-cube projection, mapping `[l,r]x[b,t]x[-f,-n]` to `[-1,1]^3`.
    pub fn orthographic(n: f32, f: f32, l: f32, r: f32, t: f32, b: f32) -> Self {
        Self::from_cols(
            Vec4::new(2.0 / (r - l), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / (t - b), 0.0, 0.0),
            Vec4::new(0.0, 0.0, -2.0 / (f - n), 0.0),
            Vec4::new(-(r + l) / (r - l), -(t + b) / (t - b), -(f + n) / (f - n), 1.0),
        )
    }

    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec4::new(self.get(0, 0), self.get(0, 1), self.get(0, 2), self.get(0, 3)),
            Vec4::new(self.get(1, 0), self.get(1, 1), self.get(1, 2), self.get(1, 3)),
            Vec4::new(self.get(2, 0), self.get(2, 1), self.get(2, 2), self.get(2, 3)),
            Vec4::new(self.get(3, 0), self.get(3, 1), self.get(3, 2), self.get(3, 3)),
        )
    }

    /// Drops the translation column and the bottom row/right column, keeping the
    /// upper-left 3x3 (for transforming normals, for example).
    pub fn truncate(&self) -> Mat3 {
        Mat3::from_cols(self.cols[0].xyz(), self.cols[1].xyz(), self.cols[2].xyz())
    }

    /// Gauss-Jordan elimination with partial pivoting on the leading column of each step.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is singular; it is the caller's responsibility to avoid this
    /// (e.g. never build a scale matrix with a zero component).
    pub fn inverse(&self) -> Self {
        // Work with rows so that pivoting is a plain row swap.
        let mut rows = [
            [self.get(0, 0), self.get(0, 1), self.get(0, 2), self.get(0, 3)],
            [self.get(1, 0), self.get(1, 1), self.get(1, 2), self.get(1, 3)],
            [self.get(2, 0), self.get(2, 1), self.get(2, 2), self.get(2, 3)],
            [self.get(3, 0), self.get(3, 1), self.get(3, 2), self.get(3, 3)],
        ];
        let mut inv = [
            [1.0f32, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        for pivot in 0..4 {
            // Partial pivoting: bring the largest-magnitude entry in this column to the
            // pivot row.
            let mut best = pivot;
            for row in (pivot + 1)..4 {
                if rows[row][pivot].abs() > rows[best][pivot].abs() {
                    best = row;
                }
            }
            if best != pivot {
                rows.swap(pivot, best);
                inv.swap(pivot, best);
            }

            let leading = rows[pivot][pivot];
            assert!(leading != 0.0, "Mat4::inverse called on a singular matrix");
            for col in 0..4 {
                rows[pivot][col] /= leading;
                inv[pivot][col] /= leading;
            }

            for row in 0..4 {
                if row == pivot {
                    continue;
                }
                let factor = rows[row][pivot];
                if factor == 0.0 {
                    continue;
                }
                for col in 0..4 {
                    rows[row][col] -= factor * rows[pivot][col];
                    inv[row][col] -= factor * inv[pivot][col];
                }
            }
        }

        Self::from_cols(
            Vec4::new(inv[0][0], inv[1][0], inv[2][0], inv[3][0]),
            Vec4::new(inv[0][1], inv[1][1], inv[2][1], inv[3][1]),
            Vec4::new(inv[0][2], inv[1][2], inv[2][2], inv[3][2]),
            Vec4::new(inv[0][3], inv[1][3], inv[2][3], inv[3][3]),
        )
    }
}

impl From<Mat3> for Mat4 {
    fn from(m: Mat3) -> Self {
        let c0 = m.col(0);
        let c1 = m.col(1);
        let c2 = m.col(2);
        Self::from_cols(
            Vec4::new(c0.x, c0.y, c0.z, 0.0),
            Vec4::new(c1.x, c1.y, c1.z, 0.0),
            Vec4::new(c2.x, c2.y, c2.z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}

impl Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}
