//! Small dense linear algebra kernels for the eigenvector-centrality fallback.
//!
//! Matrices here are at most V x V and only built when power iteration fails,
//! so the O(n^3) routines are acceptable.

/// Square row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }

    pub fn add_to(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] += value;
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.n).map(|row| self.get(row, col)).collect()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        (0..self.n)
            .map(|row| {
                self.data[row * self.n..(row + 1) * self.n]
                    .iter()
                    .zip(x)
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect()
    }

    fn off_diagonal_norm(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.n {
            for j in 0..self.n {
                if i != j {
                    sum += self.get(i, j) * self.get(i, j);
                }
            }
        }
        sum.sqrt()
    }

    /// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
    ///
    /// Returns the eigenvalues and a matrix whose column k is the unit
    /// eigenvector for eigenvalue k.
    pub fn symmetric_eigen(&self) -> (Vec<f64>, DenseMatrix) {
        const MAX_SWEEPS: usize = 100;

        let n = self.n;
        let mut a = self.clone();
        let mut v = DenseMatrix::identity(n);
        let scale = self.data.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

        for _ in 0..MAX_SWEEPS {
            if a.off_diagonal_norm() <= 1e-12 * scale {
                break;
            }
            for p in 0..n {
                for q in p + 1..n {
                    let apq = a.get(p, q);
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a.get(q, q) - a.get(p, p)) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    // signum(0.0) is 1.0, so theta == 0 gives t == 1 (a 45 degree turn).
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;

                    for k in 0..n {
                        let akp = a.get(k, p);
                        let akq = a.get(k, q);
                        a.set(k, p, c * akp - s * akq);
                        a.set(k, q, s * akp + c * akq);
                    }
                    for k in 0..n {
                        let apk = a.get(p, k);
                        let aqk = a.get(q, k);
                        a.set(p, k, c * apk - s * aqk);
                        a.set(q, k, s * apk + c * aqk);
                    }
                    for k in 0..n {
                        let vkp = v.get(k, p);
                        let vkq = v.get(k, q);
                        v.set(k, p, c * vkp - s * vkq);
                        v.set(k, q, s * vkp + c * vkq);
                    }
                }
            }
        }

        let values = (0..n).map(|i| a.get(i, i)).collect();
        (values, v)
    }

    /// LU factorisation with partial pivoting. None if the matrix is singular.
    pub fn lu(&self) -> Option<LuDecomposition> {
        let n = self.n;
        let mut lu = self.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for col in 0..n {
            let pivot_row = (col..n).max_by(|&a, &b| {
                lu.get(a, col)
                    .abs()
                    .partial_cmp(&lu.get(b, col).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            let pivot = lu.get(pivot_row, col);
            if pivot == 0.0 || !pivot.is_finite() {
                return None;
            }
            if pivot_row != col {
                for k in 0..n {
                    let tmp = lu.get(col, k);
                    lu.set(col, k, lu.get(pivot_row, k));
                    lu.set(pivot_row, k, tmp);
                }
                perm.swap(col, pivot_row);
            }
            for row in col + 1..n {
                let factor = lu.get(row, col) / pivot;
                lu.set(row, col, factor);
                for k in col + 1..n {
                    lu.add_to(row, k, -factor * lu.get(col, k));
                }
            }
        }

        Some(LuDecomposition { lu, perm })
    }
}

/// Packed L (unit diagonal, below) and U (on and above) factors with the row
/// permutation applied during pivoting.
#[derive(Debug, Clone)]
pub(crate) struct LuDecomposition {
    lu: DenseMatrix,
    perm: Vec<usize>,
}

impl LuDecomposition {
    /// Solve `A x = b`.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.lu.size();
        let mut x: Vec<f64> = self.perm.iter().map(|&p| b[p]).collect();

        for i in 0..n {
            for k in 0..i {
                x[i] -= self.lu.get(i, k) * x[k];
            }
        }
        for i in (0..n).rev() {
            for k in i + 1..n {
                x[i] -= self.lu.get(i, k) * x[k];
            }
            x[i] /= self.lu.get(i, i);
        }
        x
    }
}

pub(crate) fn l2_norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[&[f64]]) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(rows.len());
        for (i, row) in rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                m.set(i, j, *v);
            }
        }
        m
    }

    #[test]
    fn test_jacobi_diagonalises_symmetric() {
        let m = from_rows(&[&[2.0, 1.0], &[1.0, 2.0]]);
        let (mut values, vectors) = m.symmetric_eigen();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((values[0] - 1.0).abs() < 1e-10);
        assert!((values[1] - 3.0).abs() < 1e-10);

        for k in 0..2 {
            let v = vectors.column(k);
            assert!((l2_norm(&v) - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_jacobi_eigenpairs_satisfy_av_eq_lv() {
        let m = from_rows(&[&[0.0, 1.0, 1.0], &[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]]);
        let (values, vectors) = m.symmetric_eigen();
        for (k, lambda) in values.iter().enumerate() {
            let v = vectors.column(k);
            let av = m.mul_vec(&v);
            for i in 0..3 {
                assert!((av[i] - lambda * v[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_lu_solve() {
        let m = from_rows(&[&[0.0, 2.0, 1.0], &[1.0, 1.0, 0.0], &[3.0, 0.0, 1.0]]);
        let lu = m.lu().unwrap();
        let x = lu.solve(&[5.0, 3.0, 6.0]);
        let back = m.mul_vec(&x);
        for (got, want) in back.iter().zip([5.0, 3.0, 6.0]) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let m = from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(m.lu().is_none());
    }

    #[test]
    fn test_symmetry_check() {
        assert!(from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]).is_symmetric());
        assert!(!from_rows(&[&[0.0, 1.0], &[0.0, 0.0]]).is_symmetric());
    }
}
