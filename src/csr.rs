//! Compressed sparse row matrices and row normalization.

use crate::{Error, Result};

/// A sparse matrix of non-negative edge weights in compressed-row form.
///
/// `values[row_ptr[i]..row_ptr[i + 1]]` holds the non-zero weights of row
/// `i`, and `col_idx` holds the destination column of each entry. The three
/// arrays are validated once at construction; accessors can then slice
/// without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f32>,
}

impl CsrMatrix {
    /// Build a matrix from raw CSR arrays, validating structural consistency.
    ///
    /// Weights are expected to be non-negative; negative weights produce
    /// meaningless transition distributions downstream.
    pub fn new(
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f32>,
    ) -> Result<Self> {
        if row_ptr.len() < 2 {
            return Err(Error::Shape(format!(
                "row_ptr must have at least 2 entries, got {}",
                row_ptr.len()
            )));
        }
        if row_ptr[0] != 0 {
            return Err(Error::Shape(format!(
                "row_ptr must start at 0, got {}",
                row_ptr[0]
            )));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Shape("row_ptr is not non-decreasing".into()));
        }
        if *row_ptr.last().unwrap() != values.len() {
            return Err(Error::Shape(format!(
                "row_ptr ends at {} but there are {} values",
                row_ptr.last().unwrap(),
                values.len()
            )));
        }
        if col_idx.len() != values.len() {
            return Err(Error::Shape(format!(
                "col_idx has {} entries but values has {}",
                col_idx.len(),
                values.len()
            )));
        }
        if let Some(&bad) = col_idx.iter().find(|&&c| c >= n_cols) {
            return Err(Error::Shape(format!(
                "column index {bad} out of range for {n_cols} columns"
            )));
        }
        Ok(Self { n_cols, row_ptr, col_idx, values })
    }

    /// Build from a dense row-major table, keeping only non-zero entries.
    /// All rows must have the same width.
    pub fn from_dense(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Shape("matrix must have at least one row".into()));
        }
        let n_cols = rows[0].len();
        if n_cols == 0 {
            return Err(Error::Shape("matrix must have at least one column".into()));
        }
        let mut row_ptr = Vec::with_capacity(rows.len() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::Shape(format!(
                    "row {i} has {} entries, expected {n_cols}",
                    row.len()
                )));
            }
            for (j, &w) in row.iter().enumerate() {
                if w != 0.0 {
                    col_idx.push(j);
                    values.push(w);
                }
            }
            row_ptr.push(values.len());
        }
        Ok(Self { n_cols, row_ptr, col_idx, values })
    }

    pub fn n_rows(&self) -> usize {
        self.row_ptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_square(&self) -> bool {
        self.n_rows() == self.n_cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Return `(columns, weights)` for row `i` as parallel slices.
    pub fn row(&self, i: usize) -> (&[usize], &[f32]) {
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        (&self.col_idx[start..end], &self.values[start..end])
    }

    /// Expand to a dense row-major table. Intended for small matrices
    /// (tests, debugging); duplicated entries accumulate.
    pub fn to_dense(&self) -> Vec<Vec<f32>> {
        let mut out = vec![vec![0.0; self.n_cols]; self.n_rows()];
        for i in 0..self.n_rows() {
            let (cols, wts) = self.row(i);
            for (&j, &w) in cols.iter().zip(wts) {
                out[i][j] += w;
            }
        }
        out
    }

    /// Divide every row by its sum, producing a row-stochastic matrix.
    ///
    /// Fails with [`Error::InvalidRow`] on the first row whose sum is zero
    /// (including rows with no stored entries): such a row cannot define a
    /// probability distribution. Sparse structure is preserved exactly —
    /// `row_ptr` and `col_idx` of the output are identical to the input's.
    ///
    /// Scaling the whole input by any positive constant yields the same
    /// output (up to float rounding).
    pub fn normalize_rows(&self) -> Result<TransitionMatrix> {
        let mut values = self.values.clone();
        for i in 0..self.n_rows() {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            let sum: f32 = values[start..end].iter().sum();
            if !(sum > 0.0) {
                return Err(Error::InvalidRow(i));
            }
            for v in &mut values[start..end] {
                *v /= sum;
            }
            debug_assert!(
                (values[start..end].iter().sum::<f32>() - 1.0).abs() < 1e-3,
                "row {i} does not sum to 1 after normalization"
            );
        }
        Ok(TransitionMatrix(Self {
            n_cols: self.n_cols,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values,
        }))
    }

    /// Statically reweight edges for return/neighbor biasing.
    ///
    /// An edge `u -> v` whose reverse edge `v -> u` also exists (the only
    /// edges a backtracking step could use) is scaled by `1/return_weight`;
    /// every other edge is scaled by `1/neighbor_weight`. Applied before
    /// [`Self::normalize_rows`], so only the ratio of the two matters.
    ///
    /// With both weights at `1.0` the matrix is returned unchanged. This is
    /// a first-order approximation of walk biasing: the sampler itself keeps
    /// no history, so the bias is baked into the edge weights up front.
    pub fn reweight(&self, return_weight: f32, neighbor_weight: f32) -> CsrMatrix {
        if return_weight == 1.0 && neighbor_weight == 1.0 {
            return self.clone();
        }
        let mut out = self.clone();
        for u in 0..self.n_rows() {
            let start = self.row_ptr[u];
            let end = self.row_ptr[u + 1];
            for k in start..end {
                let v = self.col_idx[k];
                let reciprocal = v < self.n_rows() && self.row(v).0.contains(&u);
                out.values[k] /= if reciprocal { return_weight } else { neighbor_weight };
            }
        }
        out
    }
}

/// A row-stochastic matrix: every row's stored weights sum to 1.
///
/// Only obtainable through [`CsrMatrix::normalize_rows`], so holding one is
/// proof the degenerate-row check already ran.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix(CsrMatrix);

impl TransitionMatrix {
    pub fn n_nodes(&self) -> usize {
        self.0.n_rows()
    }

    pub fn is_square(&self) -> bool {
        self.0.is_square()
    }

    /// Return `(columns, probabilities)` for node `i` as parallel slices.
    pub fn row(&self, i: usize) -> (&[usize], &[f32]) {
        self.0.row(i)
    }

    pub fn as_csr(&self) -> &CsrMatrix {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inconsistent_arrays() {
        // row_ptr too short
        assert!(matches!(
            CsrMatrix::new(2, vec![0], vec![], vec![]),
            Err(Error::Shape(_))
        ));
        // row_ptr not starting at 0
        assert!(matches!(
            CsrMatrix::new(2, vec![1, 2], vec![0], vec![1.0]),
            Err(Error::Shape(_))
        ));
        // row_ptr decreasing
        assert!(matches!(
            CsrMatrix::new(2, vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0]),
            Err(Error::Shape(_))
        ));
        // row_ptr not ending at values.len()
        assert!(matches!(
            CsrMatrix::new(2, vec![0, 1], vec![0, 1], vec![1.0, 1.0]),
            Err(Error::Shape(_))
        ));
        // col_idx / values length mismatch
        assert!(matches!(
            CsrMatrix::new(2, vec![0, 2], vec![0], vec![1.0, 1.0]),
            Err(Error::Shape(_))
        ));
        // column out of range
        assert!(matches!(
            CsrMatrix::new(2, vec![0, 1], vec![2], vec![1.0]),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn from_dense_keeps_only_nonzeros() {
        let m = CsrMatrix::from_dense(&[
            vec![0.0, 2.0, 0.0],
            vec![1.0, 0.0, 3.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row(0), (&[1usize][..], &[2.0f32][..]));
        assert_eq!(m.row(1), (&[0usize, 2][..], &[1.0f32, 3.0][..]));
        assert_eq!(m.row(2), (&[][..], &[][..]));
        assert_eq!(
            m.to_dense(),
            vec![
                vec![0.0, 2.0, 0.0],
                vec![1.0, 0.0, 3.0],
                vec![0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn from_dense_rejects_ragged_rows() {
        let err = CsrMatrix::from_dense(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn normalize_preserves_structure() {
        let m = CsrMatrix::from_dense(&[vec![2.0, 6.0], vec![0.0, 5.0]]).unwrap();
        let t = m.normalize_rows().unwrap();
        assert_eq!(t.as_csr().row_ptr(), m.row_ptr());
        assert_eq!(t.as_csr().col_idx(), m.col_idx());
        assert_eq!(t.row(0).1, &[0.25, 0.75]);
        assert_eq!(t.row(1).1, &[1.0]);
    }

    #[test]
    fn normalize_rejects_zero_row_and_names_it() {
        let m = CsrMatrix::from_dense(&[vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap();
        match m.normalize_rows() {
            Err(Error::InvalidRow(i)) => assert_eq!(i, 1),
            other => panic!("expected InvalidRow(1), got {other:?}"),
        }
    }

    #[test]
    fn normalize_rejects_explicit_zero_weights_summing_to_zero() {
        // A row can carry stored entries that are all exactly zero.
        let m = CsrMatrix::new(2, vec![0, 1, 2], vec![0, 1], vec![1.0, 0.0]).unwrap();
        assert!(matches!(m.normalize_rows(), Err(Error::InvalidRow(1))));
    }

    #[test]
    fn reweight_unit_weights_is_identity() {
        let m = CsrMatrix::from_dense(&[vec![1.0, 2.0], vec![3.0, 0.0]]).unwrap();
        assert_eq!(m.reweight(1.0, 1.0), m);
    }

    #[test]
    fn reweight_scales_reciprocal_edges_by_return_weight() {
        // 0 <-> 1 reciprocal, 0 -> 2 one-way.
        let m = CsrMatrix::from_dense(&[
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let r = m.reweight(2.0, 0.5);
        // edge 0->1 is reciprocal: 1/2; edge 0->2 is not: 1/0.5 = 2.
        assert_eq!(r.row(0).1, &[0.5, 2.0]);
        // edge 1->0 is reciprocal: 1/2.
        assert_eq!(r.row(1).1, &[0.5]);
        // self-loop 2->2 counts as reciprocal.
        assert_eq!(r.row(2).1, &[0.5]);
    }
}
